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

//! Contract record and its state machine.
//!
//! ```text
//!   Draft ──offer──> OfferedByMe ──peer accepted──> Accepted ──funded──> Active ──settle──> Settled
//!                         └──────peer declined────> Declined
//!   (received) OfferedToMe ──accept──> Accepted
//!                  └───────decline──> Declined
//! ```
//!
//! Every transition method here either applies completely or returns an error
//! without touching the record.

use std::fmt;

use amplify::hex::ToHex;
use amplify::{Bytes32, Wrapper};
use bitcoin::hashes::{sha256, Hash, HashEngine};
use bitcoin::secp256k1::PublicKey;

use crate::attestation::{OracleSignature, OracleValue};
use crate::error::ConfigurationIssue;
use crate::payout::{compute_payout, Division, Funding, Payout, Sats};
use crate::{CoinType, Error, Oracle, OracleIdx, Timestamp};

/// Locally assigned contract index, unique within the store of a party
#[derive(Wrapper, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Display, From)]
#[display(inner)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", transparent)
)]
pub struct ContractIdx(#[from] u32);

lazy_static! {
    static ref CONTRACT_ID_TAG: sha256::Hash = sha256::Hash::hash(b"dlc:contract-id");
}

/// Negotiated contract identifier correlating the records of both parties.
/// Equals tagged SHA256 commitment to the offered terms and the offerer's
/// local contract index.
#[derive(Wrapper, Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, Display, From)]
#[wrapper(Deref, BorrowSlice, Hex, Index, RangeOps)]
#[display(Self::to_hex)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", transparent)
)]
pub struct ContractId(
    #[from]
    #[from([u8; 32])]
    Bytes32,
);

/// Which side of the negotiation the party is on
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Display)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", rename_all = "camelCase")
)]
pub enum Role {
    /// Party which has created the draft and offered it
    #[display("offerer")]
    Offerer,

    /// Party which has received the offer
    #[display("acceptor")]
    Acceptor,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Display)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", rename_all = "camelCase")
)]
#[repr(u8)]
pub enum ContractStatus {
    #[display("draft")]
    Draft = 0,

    #[display("offered-by-me")]
    OfferedByMe = 1,

    #[display("offered-to-me")]
    OfferedToMe = 2,

    #[display("declined")]
    Declined = 3,

    #[display("accepted")]
    Accepted = 4,

    #[display("active")]
    Active = 5,

    #[display("settled")]
    Settled = 6,
}

impl ContractStatus {
    /// Whether no further transitions are possible
    pub fn is_terminal(self) -> bool {
        matches!(self, ContractStatus::Settled | ContractStatus::Declined)
    }
}

/// Contract configuration fields
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Display)]
pub enum Field {
    #[display("oracle")]
    Oracle,

    #[display("commitment point")]
    CommitmentPoint,

    #[display("settlement time")]
    SettlementTime,

    #[display("coin type")]
    CoinType,

    #[display("own funding")]
    FundingOwn,

    #[display("counterparty funding")]
    FundingCounterparty,

    #[display("division")]
    Division,
}

/// Operations subject to the state machine guards
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Display)]
pub enum Action {
    #[display("configure {0}")]
    Configure(Field),

    #[display("offer")]
    Offer,

    #[display("accept")]
    Accept,

    #[display("decline")]
    Decline,

    #[display("register acceptance by the peer")]
    ObserveAccept,

    #[display("register decline by the peer")]
    ObserveDecline,

    #[display("activate")]
    Activate,

    #[display("settle")]
    Settle,
}

/// Public contract parameters in the orientation of the offering party; this
/// is what gets sent to the counterparty.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct ContractTerms {
    pub oracle_key: PublicKey,
    pub commitment_point: PublicKey,
    pub settlement_time: Timestamp,
    pub coin_type: CoinType,
    pub division: Division,
    pub funding_offerer: Sats,
    pub funding_acceptor: Sats,
}

impl ContractTerms {
    pub(crate) fn validate(&self) -> Result<Funding, ConfigurationIssue> {
        Division::new(self.division.high(), self.division.low())?;
        Funding::new(self.funding_offerer, self.funding_acceptor)
    }

    /// Deterministic commitment to the terms and offerer contract index
    pub fn contract_id(&self, offerer_idx: ContractIdx) -> ContractId {
        let mut engine = sha256::Hash::engine();
        engine.input(&CONTRACT_ID_TAG[..]);
        engine.input(&CONTRACT_ID_TAG[..]);
        engine.input(&self.oracle_key.serialize());
        engine.input(&self.commitment_point.serialize());
        engine.input(&self.settlement_time.to_be_bytes());
        engine.input(&self.coin_type.as_u32().to_be_bytes());
        engine.input(&self.division.high().to_be_bytes());
        engine.input(&self.division.low().to_be_bytes());
        engine.input(&self.funding_offerer.to_be_bytes());
        engine.input(&self.funding_acceptor.to_be_bytes());
        engine.input(&offerer_idx.into_inner().to_be_bytes());
        ContractId::from(sha256::Hash::from_engine(engine).to_byte_array())
    }
}

/// Result of a successful settlement
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", rename_all = "camelCase")
)]
pub struct Settlement {
    pub value: OracleValue,
    pub signature: OracleSignature,
    /// Split from the point of view of the party owning the record
    pub payout: Payout,
}

#[derive(Getters, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", rename_all = "camelCase")
)]
pub struct Contract {
    #[getter(as_copy)]
    idx: ContractIdx,

    /// Assigned when the contract is offered or received
    #[getter(as_copy)]
    id: Option<ContractId>,

    #[getter(as_copy)]
    role: Role,

    #[getter(as_copy)]
    status: ContractStatus,

    #[getter(as_copy)]
    oracle_idx: Option<OracleIdx>,

    /// Copied from the registry when the oracle is assigned
    #[getter(as_copy)]
    oracle_key: Option<PublicKey>,

    #[getter(as_copy)]
    commitment_point: Option<PublicKey>,

    #[getter(as_copy)]
    settlement_time: Option<Timestamp>,

    #[getter(as_copy)]
    coin_type: Option<CoinType>,

    #[getter(as_copy)]
    funding_own: Sats,

    #[getter(as_copy)]
    funding_counterparty: Sats,

    /// Value at or beyond which the offering party takes the whole pot
    #[getter(as_copy)]
    division_high: Option<OracleValue>,

    /// Value at or beyond which the offering party gets nothing
    #[getter(as_copy)]
    division_low: Option<OracleValue>,

    #[getter(as_copy)]
    settlement: Option<Settlement>,
}

impl fmt::Display for Contract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} ({}, {})", self.idx, self.role, self.status)
    }
}

impl Contract {
    pub(crate) fn draft(idx: ContractIdx) -> Contract {
        Contract {
            idx,
            id: None,
            role: Role::Offerer,
            status: ContractStatus::Draft,
            oracle_idx: None,
            oracle_key: None,
            commitment_point: None,
            settlement_time: None,
            coin_type: None,
            funding_own: 0,
            funding_counterparty: 0,
            division_high: None,
            division_low: None,
            settlement: None,
        }
    }

    /// Constructs mirrored record for a received offer, which must be
    /// validated beforehand
    pub(crate) fn offered_to_me(
        idx: ContractIdx,
        id: ContractId,
        oracle_idx: OracleIdx,
        terms: &ContractTerms,
    ) -> Contract {
        Contract {
            idx,
            id: Some(id),
            role: Role::Acceptor,
            status: ContractStatus::OfferedToMe,
            oracle_idx: Some(oracle_idx),
            oracle_key: Some(terms.oracle_key),
            commitment_point: Some(terms.commitment_point),
            settlement_time: Some(terms.settlement_time),
            coin_type: Some(terms.coin_type),
            funding_own: terms.funding_acceptor,
            funding_counterparty: terms.funding_offerer,
            division_high: Some(terms.division.high()),
            division_low: Some(terms.division.low()),
            settlement: None,
        }
    }

    pub fn settled_value(&self) -> Option<OracleValue> {
        self.settlement.map(|s| s.value)
    }

    pub fn settled_signature(&self) -> Option<OracleSignature> {
        self.settlement.map(|s| s.signature)
    }

    pub(crate) fn negotiated_id(&self) -> Result<ContractId, Error> {
        self.id.ok_or(Error::UnknownContract(self.idx))
    }

    /// Total amount distributed at settlement, if representable
    pub fn pot(&self) -> Option<Sats> {
        self.funding_own.checked_add(self.funding_counterparty)
    }

    fn guard(&self, expected: ContractStatus, action: Action) -> Result<(), Error> {
        if self.status == ContractStatus::Settled && action == Action::Settle {
            return Err(Error::AlreadySettled(self.idx));
        }
        if self.status != expected {
            return Err(Error::InvalidTransition(self.idx, self.status, action));
        }
        Ok(())
    }

    fn guard_draft(&self, field: Field) -> Result<(), Error> {
        self.guard(ContractStatus::Draft, Action::Configure(field))
    }

    pub(crate) fn set_oracle(&mut self, oracle: &Oracle) -> Result<(), Error> {
        self.guard_draft(Field::Oracle)?;
        self.oracle_idx = Some(oracle.idx());
        self.oracle_key = Some(oracle.pubkey());
        Ok(())
    }

    /// Commitment point can be set only once
    pub(crate) fn set_commitment_point(&mut self, point: PublicKey) -> Result<(), Error> {
        self.guard_draft(Field::CommitmentPoint)?;
        if self.commitment_point.is_some() {
            return Err(Error::InvalidTransition(
                self.idx,
                self.status,
                Action::Configure(Field::CommitmentPoint),
            ));
        }
        self.commitment_point = Some(point);
        Ok(())
    }

    pub(crate) fn set_settlement_time(&mut self, time: Timestamp) -> Result<(), Error> {
        self.guard_draft(Field::SettlementTime)?;
        self.settlement_time = Some(time);
        Ok(())
    }

    pub(crate) fn set_coin_type(&mut self, coin_type: CoinType) -> Result<(), Error> {
        self.guard_draft(Field::CoinType)?;
        self.coin_type = Some(coin_type);
        Ok(())
    }

    pub(crate) fn set_funding(&mut self, own: Sats, counterparty: Sats) -> Result<(), Error> {
        self.guard_draft(Field::FundingOwn)?;
        self.funding_own = own;
        self.funding_counterparty = counterparty;
        Ok(())
    }

    pub(crate) fn set_division(&mut self, high: OracleValue, low: OracleValue) -> Result<(), Error> {
        self.guard_draft(Field::Division)?;
        self.division_high = Some(high);
        self.division_low = Some(low);
        Ok(())
    }

    /// Public terms in the offerer orientation; fails if any of the required
    /// fields is missing or the configuration is inconsistent
    pub fn terms(&self) -> Result<ContractTerms, Error> {
        let missing = |field| Error::IncompleteContract(self.idx, field);
        let invalid = |issue| Error::InvalidConfiguration(self.idx, issue);

        let oracle_key = self
            .oracle_idx
            .and(self.oracle_key)
            .ok_or_else(|| missing(Field::Oracle))?;
        let commitment_point = self.commitment_point.ok_or_else(|| missing(Field::CommitmentPoint))?;
        let settlement_time = self.settlement_time.ok_or_else(|| missing(Field::SettlementTime))?;
        let coin_type = self.coin_type.ok_or_else(|| missing(Field::CoinType))?;
        if self.funding_own == 0 {
            return Err(missing(Field::FundingOwn));
        }
        if self.funding_counterparty == 0 {
            return Err(missing(Field::FundingCounterparty));
        }
        let (high, low) = self
            .division_high
            .zip(self.division_low)
            .ok_or_else(|| missing(Field::Division))?;
        let division = Division::new(high, low).map_err(invalid)?;

        let (funding_offerer, funding_acceptor) = match self.role {
            Role::Offerer => (self.funding_own, self.funding_counterparty),
            Role::Acceptor => (self.funding_counterparty, self.funding_own),
        };
        Funding::new(funding_offerer, funding_acceptor).map_err(invalid)?;

        Ok(ContractTerms {
            oracle_key,
            commitment_point,
            settlement_time,
            coin_type,
            division,
            funding_offerer,
            funding_acceptor,
        })
    }

    /// Split the given oracle value would produce, from the point of view of
    /// this record owner
    pub fn payout_for(&self, value: OracleValue) -> Result<Payout, Error> {
        let terms = self.terms()?;
        let funding = Funding::new(terms.funding_offerer, terms.funding_acceptor)
            .map_err(|issue| Error::InvalidConfiguration(self.idx, issue))?;
        let payout = compute_payout(value, &terms.division, &funding);
        Ok(match self.role {
            Role::Offerer => payout,
            Role::Acceptor => payout.mirrored(),
        })
    }

    /// Validates the draft and moves it to `OfferedByMe`
    pub(crate) fn offer(&mut self) -> Result<ContractTerms, Error> {
        self.guard(ContractStatus::Draft, Action::Offer)?;
        let terms = self.terms()?;
        self.id = Some(terms.contract_id(self.idx));
        self.status = ContractStatus::OfferedByMe;
        Ok(terms)
    }

    pub(crate) fn accept(&mut self) -> Result<(), Error> {
        self.guard(ContractStatus::OfferedToMe, Action::Accept)?;
        self.status = ContractStatus::Accepted;
        Ok(())
    }

    pub(crate) fn decline(&mut self) -> Result<(), Error> {
        self.guard(ContractStatus::OfferedToMe, Action::Decline)?;
        self.status = ContractStatus::Declined;
        Ok(())
    }

    pub(crate) fn observe_accept(&mut self) -> Result<(), Error> {
        self.guard(ContractStatus::OfferedByMe, Action::ObserveAccept)?;
        self.status = ContractStatus::Accepted;
        Ok(())
    }

    pub(crate) fn observe_decline(&mut self) -> Result<(), Error> {
        self.guard(ContractStatus::OfferedByMe, Action::ObserveDecline)?;
        self.status = ContractStatus::Declined;
        Ok(())
    }

    pub(crate) fn activate(&mut self) -> Result<(), Error> {
        self.guard(ContractStatus::Accepted, Action::Activate)?;
        self.status = ContractStatus::Active;
        Ok(())
    }

    /// Checks that settlement may be attempted at `now`. Signature is not
    /// checked here.
    pub(crate) fn check_settleable(&self, now: Timestamp) -> Result<(), Error> {
        self.guard(ContractStatus::Active, Action::Settle)?;
        let settlement_time = self
            .settlement_time
            .ok_or(Error::IncompleteContract(self.idx, Field::SettlementTime))?;
        if now < settlement_time {
            return Err(Error::SettlementTimeNotReached(self.idx, settlement_time));
        }
        Ok(())
    }

    /// Moves the contract to `Settled` with an attestation which must be
    /// already verified
    pub(crate) fn settle_verified(
        &mut self,
        value: OracleValue,
        signature: OracleSignature,
        now: Timestamp,
    ) -> Result<Settlement, Error> {
        self.check_settleable(now)?;
        let payout = self.payout_for(value)?;
        let settlement = Settlement {
            value,
            signature,
            payout,
        };
        self.settlement = Some(settlement);
        self.status = ContractStatus::Settled;
        Ok(settlement)
    }
}
