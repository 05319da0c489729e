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

//! Party context: everything a single participant of DLC negotiations owns.
//! Each party is an explicit value passed around by the application; there
//! is no process-wide state, so several parties may live in one process.

use std::sync::Arc;

use crate::attestation::{parse_compressed_point, OracleValue};
use crate::contract::{Contract, ContractIdx, ContractStatus};
use crate::negotiation::{Accept, Decline, FundingMonitor, Offer, PeerTransport};
use crate::payout::{Payout, Sats};
use crate::{
    Clock, CoinType, ContractStore, Error, Oracle, OracleIdx, OracleRegistry, PartyConfig,
    Settlement, Timestamp,
};

/// Persistence records of a party
#[derive(Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", rename_all = "camelCase")
)]
pub struct PartyRecords {
    pub oracles: Vec<Oracle>,
    pub contracts: Vec<Contract>,
}

pub struct Party {
    config: PartyConfig,
    oracles: OracleRegistry,
    contracts: ContractStore,
    clock: Arc<dyn Clock>,
}

impl Party {
    pub fn new(config: PartyConfig, clock: Arc<dyn Clock>) -> Party {
        Party {
            config,
            oracles: OracleRegistry::new(),
            contracts: ContractStore::new(),
            clock,
        }
    }

    pub fn with_records(
        config: PartyConfig,
        clock: Arc<dyn Clock>,
        records: PartyRecords,
    ) -> Result<Party, Error> {
        let oracles = OracleRegistry::from_records(records.oracles)?;
        for contract in &records.contracts {
            if let Some(oracle_idx) = contract.oracle_idx() {
                if oracles.get(oracle_idx).map(|oracle| oracle.pubkey()) != contract.oracle_key() {
                    return Err(Error::InconsistentRecords(format!(
                        "contract {} refers to oracle {} which is not in the registry",
                        contract.idx(),
                        oracle_idx
                    )));
                }
            }
        }
        Ok(Party {
            config,
            oracles,
            contracts: ContractStore::from_records(records.contracts)?,
            clock,
        })
    }

    pub fn to_records(&self) -> PartyRecords {
        PartyRecords {
            oracles: self.oracles.to_records(),
            contracts: self.contracts.to_records(),
        }
    }

    #[inline]
    pub fn config(&self) -> &PartyConfig {
        &self.config
    }

    #[inline]
    pub fn oracles(&self) -> &OracleRegistry {
        &self.oracles
    }

    #[inline]
    pub fn contracts(&self) -> &ContractStore {
        &self.contracts
    }

    #[inline]
    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// Lookup-or-register oracle by its public key
    pub fn add_oracle(&self, pubkey: &[u8], name: &str) -> Result<OracleIdx, Error> {
        self.oracles.register_or_lookup(pubkey, name)
    }

    pub fn new_contract(&self) -> ContractIdx {
        self.contracts.create()
    }

    pub fn contract(&self, idx: ContractIdx) -> Result<Contract, Error> {
        self.contracts.get(idx)
    }

    pub fn set_contract_oracle(&self, idx: ContractIdx, oracle_idx: OracleIdx) -> Result<(), Error> {
        let oracle = self.oracles.get(oracle_idx).ok_or(Error::UnknownOracle(oracle_idx))?;
        self.contracts.update(idx, |contract| contract.set_oracle(&oracle))
    }

    pub fn set_contract_commitment_point(&self, idx: ContractIdx, point: &[u8]) -> Result<(), Error> {
        let point = parse_compressed_point(point)?;
        self.contracts
            .update(idx, |contract| contract.set_commitment_point(point))
    }

    pub fn set_contract_settlement_time(&self, idx: ContractIdx, time: Timestamp) -> Result<(), Error> {
        self.contracts
            .update(idx, |contract| contract.set_settlement_time(time))
    }

    pub fn set_contract_coin_type(&self, idx: ContractIdx, coin_type: CoinType) -> Result<(), Error> {
        if !self.config.supports(coin_type) {
            return Err(Error::UnsupportedCoinType(coin_type));
        }
        self.contracts
            .update(idx, |contract| contract.set_coin_type(coin_type))
    }

    pub fn set_contract_funding(&self, idx: ContractIdx, own: Sats, counterparty: Sats) -> Result<(), Error> {
        self.contracts
            .update(idx, |contract| contract.set_funding(own, counterparty))
    }

    pub fn set_contract_division(
        &self,
        idx: ContractIdx,
        high: OracleValue,
        low: OracleValue,
    ) -> Result<(), Error> {
        self.contracts
            .update(idx, |contract| contract.set_division(high, low))
    }

    /// Validates the draft, hands the offer to the transport and marks the
    /// contract as offered. If the transport fails the draft stays intact.
    pub fn offer_contract<T>(&self, idx: ContractIdx, transport: &mut T) -> Result<Offer, Error>
    where
        T: PeerTransport,
    {
        let offer = self.contracts.update_indexed(idx, |contract| {
            let terms = contract.offer()?;
            if !self.config.supports(terms.coin_type) {
                return Err(Error::UnsupportedCoinType(terms.coin_type));
            }
            let offer = Offer::with(idx, &terms);
            transport
                .send_offer(&offer)
                .map_err(|err| Error::Transport(err.to_string()))?;
            Ok(offer)
        })?;
        debug!("Contract {} offered to the peer", idx);
        Ok(offer)
    }

    /// Registers contract offered by the peer. All received fields are
    /// validated before anything is stored; on any failure the offer is
    /// rejected as a whole.
    pub fn receive_offer(&self, offer: &Offer) -> Result<ContractIdx, Error> {
        let terms = offer.terms()?;
        if terms.settlement_time <= self.now() {
            return Err(Error::SettlementTimePassed(terms.settlement_time));
        }
        if !self.config.supports(terms.coin_type) {
            return Err(Error::UnsupportedCoinType(terms.coin_type));
        }
        let id = terms.contract_id(offer.offerer_idx);
        if self.contracts.find(id).is_some() {
            return Err(Error::DuplicateOffer(id));
        }
        let oracle_idx = self.oracles.register_key(terms.oracle_key, "");
        self.contracts.insert_offered(id, oracle_idx, &terms)
    }

    pub fn accept_contract<T>(&self, idx: ContractIdx, transport: &mut T) -> Result<(), Error>
    where
        T: PeerTransport,
    {
        self.contracts.update(idx, |contract| {
            contract.accept()?;
            let accept = Accept {
                id: contract.negotiated_id()?,
            };
            transport
                .send_accept(&accept)
                .map_err(|err| Error::Transport(err.to_string()))
        })
    }

    pub fn decline_contract<T>(&self, idx: ContractIdx, transport: &mut T) -> Result<(), Error>
    where
        T: PeerTransport,
    {
        self.contracts.update(idx, |contract| {
            contract.decline()?;
            let decline = Decline {
                id: contract.negotiated_id()?,
            };
            transport
                .send_decline(&decline)
                .map_err(|err| Error::Transport(err.to_string()))
        })
    }

    /// Processes peer acceptance of a contract we have offered
    pub fn peer_accepted(&self, accept: &Accept) -> Result<ContractIdx, Error> {
        let idx = self
            .contracts
            .find(accept.id)
            .ok_or(Error::UnknownContractId(accept.id))?;
        self.contracts.update(idx, Contract::observe_accept)?;
        Ok(idx)
    }

    /// Processes peer decline of a contract we have offered
    pub fn peer_declined(&self, decline: &Decline) -> Result<ContractIdx, Error> {
        let idx = self
            .contracts
            .find(decline.id)
            .ok_or(Error::UnknownContractId(decline.id))?;
        self.contracts.update(idx, Contract::observe_decline)?;
        Ok(idx)
    }

    /// Activation signal from the funding layer
    pub fn funding_confirmed(&self, idx: ContractIdx) -> Result<(), Error> {
        self.contracts.update(idx, Contract::activate)
    }

    /// Asks funding layer about all accepted contracts and activates the
    /// confirmed ones. Returns indexes of the activated contracts.
    pub fn sync_funding(&self, monitor: &impl FundingMonitor) -> Vec<ContractIdx> {
        self.contracts
            .list_with_status(ContractStatus::Accepted)
            .into_iter()
            .map(|contract| contract.idx())
            .filter(|idx| monitor.is_confirmed(*idx))
            .filter(|idx| match self.funding_confirmed(*idx) {
                Ok(()) => true,
                Err(err) => {
                    // Contract status changed after the listing
                    debug!("Contract {} was not activated: {}", idx, err);
                    false
                }
            })
            .collect()
    }

    /// Settles an active contract with the oracle attestation for `value`
    pub fn settle_contract(
        &self,
        idx: ContractIdx,
        value: OracleValue,
        signature: &[u8],
    ) -> Result<Settlement, Error> {
        let settlement = self.contracts.settle(idx, value, signature, self.now())?;
        info!(
            "Contract {} settled at value {} with payout {}",
            idx, value, settlement.payout
        );
        Ok(settlement)
    }

    /// Split the contract would have if settled with `value` now
    pub fn preview_payout(&self, idx: ContractIdx, value: OracleValue) -> Result<Payout, Error> {
        self.contracts.get(idx)?.payout_for(value)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::contract::{Action, Field, Role};
    use crate::ManualClock;
    use crate::test_helpers::*;

    #[test]
    fn test_tutorial_flow() {
        let (alice, bob, clock) = party_pair(1_000);
        let oracle = TestOracle::new(1);
        let (nonce, r_point) = oracle.nonce(1);
        let mut to_bob = Channel::default();
        let mut to_alice = Channel::default();

        let oracle_idx = alice.add_oracle(&oracle.pubkey().serialize(), "Tutorial").unwrap();
        let idx = alice.new_contract();
        alice.set_contract_oracle(idx, oracle_idx).unwrap();
        alice.set_contract_settlement_time(idx, 2_000).unwrap();
        alice.set_contract_coin_type(idx, CoinType::REGTEST).unwrap();
        alice.set_contract_commitment_point(idx, &r_point.serialize()).unwrap();
        alice.set_contract_funding(idx, 100_000_000, 100_000_000).unwrap();
        alice.set_contract_division(idx, 20000, 10000).unwrap();
        alice.offer_contract(idx, &mut to_bob).unwrap();
        assert_eq!(alice.contract(idx).unwrap().status(), ContractStatus::OfferedByMe);

        let bob_idx = bob.receive_offer(&to_bob.offers[0]).unwrap();
        let mirrored = bob.contract(bob_idx).unwrap();
        assert_eq!(mirrored.status(), ContractStatus::OfferedToMe);
        assert_eq!(mirrored.role(), Role::Acceptor);
        assert_eq!(mirrored.id(), alice.contract(idx).unwrap().id());
        assert_eq!(bob.oracles().find(&oracle.pubkey()).unwrap().idx(), mirrored.oracle_idx().unwrap());

        bob.accept_contract(bob_idx, &mut to_alice).unwrap();
        assert_eq!(bob.contract(bob_idx).unwrap().status(), ContractStatus::Accepted);
        assert_eq!(alice.peer_accepted(&to_alice.accepts[0]), Ok(idx));
        assert_eq!(alice.contract(idx).unwrap().status(), ContractStatus::Accepted);

        assert_eq!(alice.sync_funding(&|_: ContractIdx| false), vec![]);
        assert_eq!(alice.sync_funding(&|_: ContractIdx| true), vec![idx]);
        bob.funding_confirmed(bob_idx).unwrap();

        let sig = oracle.attest(&nonce, 15161);
        assert_eq!(
            alice.settle_contract(idx, 15161, &sig[..]),
            Err(Error::SettlementTimeNotReached(idx, 2_000))
        );
        clock.set(2_000);
        let alice_settlement = alice.settle_contract(idx, 15161, &sig[..]).unwrap();
        let bob_settlement = bob.settle_contract(bob_idx, 15161, &sig[..]).unwrap();
        assert_eq!(alice_settlement.payout, Payout {
            own: 103_220_000,
            counterparty: 96_780_000
        });
        assert_eq!(bob_settlement.payout, alice_settlement.payout.mirrored());
    }

    #[test]
    fn test_decline_flow() {
        let (alice, bob, _clock) = party_pair(0);
        let mut to_bob = Channel::default();
        let mut to_alice = Channel::default();
        let idx = tutorial_contract(&alice);
        alice.offer_contract(idx, &mut to_bob).unwrap();
        let bob_idx = bob.receive_offer(&to_bob.offers[0]).unwrap();

        bob.decline_contract(bob_idx, &mut to_alice).unwrap();
        assert_eq!(
            bob.accept_contract(bob_idx, &mut to_alice),
            Err(Error::InvalidTransition(bob_idx, ContractStatus::Declined, Action::Accept))
        );
        alice.peer_declined(&to_alice.declines[0]).unwrap();
        assert_eq!(alice.contract(idx).unwrap().status(), ContractStatus::Declined);
        assert!(to_alice.accepts.is_empty());
    }

    #[test]
    fn test_offer_validation_at_counterparty() {
        let (alice, bob, clock) = party_pair(0);
        let mut to_bob = Channel::default();
        let idx = tutorial_contract(&alice);
        let offer = alice.offer_contract(idx, &mut to_bob).unwrap();

        clock.set(TUTORIAL_SETTLEMENT_TIME);
        assert_eq!(
            bob.receive_offer(&offer),
            Err(Error::SettlementTimePassed(TUTORIAL_SETTLEMENT_TIME))
        );
        assert!(bob.contracts().is_empty());
        assert!(bob.oracles().is_empty());
        clock.set(0);

        let mut bad = offer.clone();
        bad.commitment_point = vec![0x02; 32];
        assert_eq!(bob.receive_offer(&bad), Err(Error::InvalidKey));

        let mut bad = offer.clone();
        bad.coin_type = CoinType::from(28);
        assert_eq!(bob.receive_offer(&bad), Err(Error::UnsupportedCoinType(CoinType::from(28))));
        assert!(bob.contracts().is_empty());

        let bob_idx = bob.receive_offer(&offer).unwrap();
        let id = bob.contract(bob_idx).unwrap().id().unwrap();
        assert_eq!(bob.receive_offer(&offer), Err(Error::DuplicateOffer(id)));
        assert_eq!(bob.contracts().len(), 1);
    }

    #[test]
    fn test_transport_failure_keeps_state() {
        let (alice, bob, _clock) = party_pair(0);
        let idx = tutorial_contract(&alice);
        let mut broken = Channel::broken();
        assert!(matches!(alice.offer_contract(idx, &mut broken), Err(Error::Transport(_))));
        assert_eq!(alice.contract(idx).unwrap().status(), ContractStatus::Draft);
        assert_eq!(alice.contract(idx).unwrap().id(), None);

        let mut to_bob = Channel::default();
        alice.offer_contract(idx, &mut to_bob).unwrap();
        let bob_idx = bob.receive_offer(&to_bob.offers[0]).unwrap();
        assert!(matches!(bob.accept_contract(bob_idx, &mut broken), Err(Error::Transport(_))));
        assert_eq!(bob.contract(bob_idx).unwrap().status(), ContractStatus::OfferedToMe);
    }

    #[test]
    fn test_unsupported_coin_type() {
        let (alice, _, _clock) = party_pair(0);
        let idx = alice.new_contract();
        assert_eq!(
            alice.set_contract_coin_type(idx, CoinType::from(65537)),
            Err(Error::UnsupportedCoinType(CoinType::from(65537)))
        );
        assert_eq!(alice.contract(idx).unwrap().coin_type(), None);
    }

    #[test]
    fn test_incomplete_offer_keeps_draft() {
        let (alice, _, _clock) = party_pair(0);
        let mut to_bob = Channel::default();
        let idx = alice.new_contract();
        alice.set_contract_funding(idx, 1, 1).unwrap();
        assert_eq!(
            alice.offer_contract(idx, &mut to_bob),
            Err(Error::IncompleteContract(idx, Field::Oracle))
        );
        assert_eq!(alice.contract(idx).unwrap().status(), ContractStatus::Draft);
        assert!(to_bob.offers.is_empty());
    }

    #[test]
    fn test_unknown_references() {
        let (alice, bob, _clock) = party_pair(0);
        let idx = alice.new_contract();
        assert_eq!(
            alice.set_contract_oracle(idx, OracleIdx::from(3)),
            Err(Error::UnknownOracle(OracleIdx::from(3)))
        );
        let mut to_bob = Channel::default();
        let other = tutorial_contract(&alice);
        alice.offer_contract(other, &mut to_bob).unwrap();
        let id = alice.contract(other).unwrap().id().unwrap();
        assert_eq!(bob.peer_accepted(&Accept { id }), Err(Error::UnknownContractId(id)));
        assert_eq!(
            alice.funding_confirmed(other),
            Err(Error::InvalidTransition(other, ContractStatus::OfferedByMe, Action::Activate))
        );
    }

    #[test]
    #[cfg(feature = "serde")]
    fn test_records_round_trip() {
        let (alice, bob, _clock) = party_pair(0);
        let mut to_bob = Channel::default();
        let idx = tutorial_contract(&alice);
        alice.offer_contract(idx, &mut to_bob).unwrap();
        bob.receive_offer(&to_bob.offers[0]).unwrap();

        let json = serde_json::to_string(&bob.to_records()).unwrap();
        let records: PartyRecords = serde_json::from_str(&json).unwrap();
        let restored = Party::with_records(PartyConfig::default(), Arc::new(ManualClock::new(0)), records).unwrap();
        assert_eq!(restored.to_records(), bob.to_records());

        let mut records = alice.to_records();
        records.oracles.clear();
        assert!(matches!(
            Party::with_records(PartyConfig::default(), Arc::new(ManualClock::new(0)), records),
            Err(Error::InconsistentRecords(_))
        ));
    }
}
