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

use std::sync::Arc;

use bitcoin::hashes::{sha256, Hash};
use bitcoin::secp256k1::{PublicKey, SecretKey};

use crate::attestation::{self, OracleSignature, OracleValue};
use crate::negotiation::{Accept, Decline, Offer, PeerTransport};
use crate::{
    CoinType, Contract, ContractIdx, ManualClock, Oracle, OracleIdx, Party, PartyConfig,
    Timestamp, SECP256K1,
};

pub const TUTORIAL_SETTLEMENT_TIME: Timestamp = 1528848000;

pub fn gen_secp_pubkeys(n: usize) -> Vec<PublicKey> {
    let mut ret = Vec::with_capacity(n);
    let mut sk = [0; 32];

    for i in 1..n + 1 {
        sk[0] = i as u8;
        sk[1] = (i >> 8) as u8;
        sk[2] = (i >> 16) as u8;

        ret.push(PublicKey::from_secret_key(
            &SECP256K1,
            &SecretKey::from_slice(&sk[..]).unwrap(),
        ));
    }
    ret
}

/// Oracle with deterministic keys
pub struct TestOracle {
    seed: u8,
    secret: SecretKey,
}

impl TestOracle {
    pub fn new(seed: u8) -> Self {
        TestOracle {
            seed,
            secret: SecretKey::from_slice(&[seed; 32]).unwrap(),
        }
    }

    pub fn pubkey(&self) -> PublicKey {
        PublicKey::from_secret_key(&SECP256K1, &self.secret)
    }

    /// One-time nonce number `n` and its commitment point
    pub fn nonce(&self, n: u8) -> (SecretKey, PublicKey) {
        let k = sha256::Hash::hash(&[self.seed, n]).to_byte_array();
        let k = SecretKey::from_slice(&k).unwrap();
        (k, PublicKey::from_secret_key(&SECP256K1, &k))
    }

    pub fn attest(&self, nonce: &SecretKey, value: OracleValue) -> OracleSignature {
        attestation::attest(&self.secret, nonce, value).unwrap()
    }

    pub fn record(&self, idx: u32) -> Oracle {
        Oracle::new(OracleIdx::from(idx), self.pubkey(), "Tutorial")
    }
}

/// Configures the draft with the tutorial contract terms: both parties fund
/// 1 BTC, the offerer takes everything at 20000 and nothing at 10000.
pub fn configure_tutorial(contract: &mut Contract, oracle: &TestOracle, settlement_time: Timestamp) {
    contract.set_oracle(&oracle.record(1)).unwrap();
    contract.set_commitment_point(oracle.nonce(1).1).unwrap();
    contract.set_settlement_time(settlement_time).unwrap();
    contract.set_coin_type(CoinType::REGTEST).unwrap();
    contract.set_funding(100_000_000, 100_000_000).unwrap();
    contract.set_division(20000, 10000).unwrap();
}

pub fn tutorial_draft(idx: ContractIdx) -> Contract {
    let mut contract = Contract::draft(idx);
    configure_tutorial(&mut contract, &TestOracle::new(1), TUTORIAL_SETTLEMENT_TIME);
    contract
}

/// Two parties sharing the same manual clock
pub fn party_pair(now: Timestamp) -> (Party, Party, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(now));
    let alice = Party::new(PartyConfig::default(), clock.clone());
    let bob = Party::new(PartyConfig::default(), clock.clone());
    (alice, bob, clock)
}

/// Drafts the tutorial contract through the public party interface
pub fn tutorial_contract(party: &Party) -> ContractIdx {
    let oracle = TestOracle::new(1);
    let oracle_idx = party
        .add_oracle(&oracle.pubkey().serialize(), "Tutorial")
        .unwrap();
    let idx = party.new_contract();
    party.set_contract_oracle(idx, oracle_idx).unwrap();
    party
        .set_contract_commitment_point(idx, &oracle.nonce(1).1.serialize())
        .unwrap();
    party
        .set_contract_settlement_time(idx, TUTORIAL_SETTLEMENT_TIME)
        .unwrap();
    party.set_contract_coin_type(idx, CoinType::REGTEST).unwrap();
    party
        .set_contract_funding(idx, 100_000_000, 100_000_000)
        .unwrap();
    party.set_contract_division(idx, 20000, 10000).unwrap();
    idx
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Display, Error)]
#[display("peer is unreachable")]
pub struct Unreachable;

/// In-memory transport collecting the sent messages
#[derive(Clone, Debug, Default)]
pub struct Channel {
    pub offers: Vec<Offer>,
    pub accepts: Vec<Accept>,
    pub declines: Vec<Decline>,
    broken: bool,
}

impl Channel {
    pub fn broken() -> Self {
        Channel {
            broken: true,
            ..Channel::default()
        }
    }

    fn check(&self) -> Result<(), Unreachable> {
        if self.broken {
            Err(Unreachable)
        } else {
            Ok(())
        }
    }
}

impl PeerTransport for Channel {
    type Error = Unreachable;

    fn send_offer(&mut self, offer: &Offer) -> Result<(), Self::Error> {
        self.check()?;
        self.offers.push(offer.clone());
        Ok(())
    }

    fn send_accept(&mut self, accept: &Accept) -> Result<(), Self::Error> {
        self.check()?;
        self.accepts.push(*accept);
        Ok(())
    }

    fn send_decline(&mut self, decline: &Decline) -> Result<(), Self::Error> {
        self.check()?;
        self.declines.push(*decline);
        Ok(())
    }
}
