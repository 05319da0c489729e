// DLC Core Library: lifecycle management & settlement of discreet log contracts
// Written in 2020 by
//     DLC Core Library contributors
//
// To the extent possible under law, the author(s) have dedicated all
// copyright and related and neighboring rights to this software to
// the public domain worldwide. This software is distributed without
// any warranty.
//
// You should have received a copy of the MIT License
// along with this software.
// If not, see <https://opensource.org/licenses/MIT>.

//! Messages exchanged between the two parties and the boundaries with the
//! peer transport and funding layers. Delivery is not a concern of this
//! library: a party hands messages to a [`PeerTransport`] and is told about
//! the peer's messages by the embedding application.

use std::error::Error as StdError;

use crate::attestation::{parse_compressed_point, OracleValue};
use crate::contract::{ContractId, ContractIdx, ContractTerms, Field};
use crate::payout::{Division, Sats};
use crate::{CoinType, Error, Timestamp};

/// Contract offer as it travels over the wire. Points are kept serialized so
/// that the receiving side validates them itself.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", rename_all = "camelCase")
)]
pub struct Offer {
    /// Contract index at the offering party
    pub offerer_idx: ContractIdx,
    pub oracle_key: Vec<u8>,
    pub commitment_point: Vec<u8>,
    pub settlement_time: Timestamp,
    pub coin_type: CoinType,
    pub funding_offerer: Sats,
    pub funding_acceptor: Sats,
    pub division_high: OracleValue,
    pub division_low: OracleValue,
}

impl Offer {
    pub fn with(offerer_idx: ContractIdx, terms: &ContractTerms) -> Offer {
        Offer {
            offerer_idx,
            oracle_key: terms.oracle_key.serialize().to_vec(),
            commitment_point: terms.commitment_point.serialize().to_vec(),
            settlement_time: terms.settlement_time,
            coin_type: terms.coin_type,
            funding_offerer: terms.funding_offerer,
            funding_acceptor: terms.funding_acceptor,
            division_high: terms.division.high(),
            division_low: terms.division.low(),
        }
    }

    /// Parses and validates the received fields. Checks which depend on the
    /// local party (settlement time, coin types) are done by
    /// [`crate::Party::receive_offer`].
    pub fn terms(&self) -> Result<ContractTerms, Error> {
        // Errors refer to the offerer's contract index and point of view
        if self.funding_offerer == 0 {
            return Err(Error::IncompleteContract(self.offerer_idx, Field::FundingOwn));
        }
        if self.funding_acceptor == 0 {
            return Err(Error::IncompleteContract(self.offerer_idx, Field::FundingCounterparty));
        }
        let oracle_key = parse_compressed_point(&self.oracle_key)?;
        let commitment_point = parse_compressed_point(&self.commitment_point)?;
        let division = Division::new(self.division_high, self.division_low)
            .map_err(|issue| Error::InvalidConfiguration(self.offerer_idx, issue))?;
        let terms = ContractTerms {
            oracle_key,
            commitment_point,
            settlement_time: self.settlement_time,
            coin_type: self.coin_type,
            division,
            funding_offerer: self.funding_offerer,
            funding_acceptor: self.funding_acceptor,
        };
        terms
            .validate()
            .map_err(|issue| Error::InvalidConfiguration(self.offerer_idx, issue))?;
        Ok(terms)
    }

    /// Negotiated id of the offered contract
    pub fn contract_id(&self) -> Result<ContractId, Error> {
        Ok(self.terms()?.contract_id(self.offerer_idx))
    }
}

/// Notification that the acceptor has accepted the offer
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Display)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", rename_all = "camelCase")
)]
#[display("accept({id})")]
pub struct Accept {
    pub id: ContractId,
}

/// Notification that the acceptor has declined the offer
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Display)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", rename_all = "camelCase")
)]
#[display("decline({id})")]
pub struct Decline {
    pub id: ContractId,
}

/// Peer-to-peer layer carrying negotiation messages. A successful return
/// means the message was handed over to the peer; local state transitions
/// happen only after that.
pub trait PeerTransport {
    type Error: StdError;

    fn send_offer(&mut self, offer: &Offer) -> Result<(), Self::Error>;
    fn send_accept(&mut self, accept: &Accept) -> Result<(), Self::Error>;
    fn send_decline(&mut self, decline: &Decline) -> Result<(), Self::Error>;
}

/// Wallet layer reporting whether on-chain funding of a contract is
/// confirmed
pub trait FundingMonitor {
    fn is_confirmed(&self, idx: ContractIdx) -> bool;
}

impl<F> FundingMonitor for F
where
    F: Fn(ContractIdx) -> bool,
{
    fn is_confirmed(&self, idx: ContractIdx) -> bool {
        self(idx)
    }
}
