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

//! Registry of the oracles known to a party. Oracles are identified by their
//! long-term public key and receive a local index on first registration.

use std::collections::{BTreeMap, HashMap};

use amplify::Wrapper;
use bitcoin::secp256k1::PublicKey;
use parking_lot::RwLock;

use crate::attestation::parse_compressed_point;
use crate::Error;

/// Locally assigned oracle index; stable for the lifetime of the registry
#[derive(Wrapper, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Display, From)]
#[display(inner)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", transparent)
)]
pub struct OracleIdx(#[from] u32);

#[derive(Getters, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", rename_all = "camelCase")
)]
pub struct Oracle {
    #[getter(as_copy)]
    idx: OracleIdx,

    /// Long-term oracle key `A`
    #[getter(as_copy)]
    pubkey: PublicKey,

    /// Display label, has no meaning for the protocol
    name: String,
}

#[derive(Debug, Default)]
struct Oracles {
    by_idx: BTreeMap<OracleIdx, Oracle>,
    by_key: HashMap<PublicKey, OracleIdx>,
    last_idx: u32,
}

#[derive(Debug, Default)]
pub struct OracleRegistry {
    oracles: RwLock<Oracles>,
}

impl Oracle {
    pub fn new(idx: OracleIdx, pubkey: PublicKey, name: impl ToString) -> Oracle {
        Oracle {
            idx,
            pubkey,
            name: name.to_string(),
        }
    }
}

impl OracleRegistry {
    pub fn new() -> Self {
        OracleRegistry::default()
    }

    /// Returns index of the oracle with the given key, registering it under
    /// `name` if it is not known yet. The name of an already known oracle is
    /// left untouched.
    pub fn register_or_lookup(&self, pubkey: &[u8], name: &str) -> Result<OracleIdx, Error> {
        let pubkey = parse_compressed_point(pubkey)?;
        Ok(self.register_key(pubkey, name))
    }

    pub(crate) fn register_key(&self, pubkey: PublicKey, name: &str) -> OracleIdx {
        let mut oracles = self.oracles.write();
        if let Some(idx) = oracles.by_key.get(&pubkey) {
            trace!("Oracle {} is already known as {}", pubkey, idx);
            return *idx;
        }
        oracles.last_idx += 1;
        let idx = OracleIdx(oracles.last_idx);
        oracles.by_key.insert(pubkey, idx);
        oracles.by_idx.insert(idx, Oracle::new(idx, pubkey, name));
        debug!("Registered oracle {} `{}` under index {}", pubkey, name, idx);
        idx
    }

    pub fn get(&self, idx: OracleIdx) -> Option<Oracle> {
        self.oracles.read().by_idx.get(&idx).cloned()
    }

    pub fn find(&self, pubkey: &PublicKey) -> Option<Oracle> {
        let oracles = self.oracles.read();
        oracles
            .by_key
            .get(pubkey)
            .and_then(|idx| oracles.by_idx.get(idx))
            .cloned()
    }

    pub fn list(&self) -> Vec<Oracle> {
        self.oracles.read().by_idx.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.oracles.read().by_idx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn rename(&self, idx: OracleIdx, name: &str) -> Result<(), Error> {
        let mut oracles = self.oracles.write();
        let oracle = oracles.by_idx.get_mut(&idx).ok_or(Error::UnknownOracle(idx))?;
        oracle.name = name.to_owned();
        Ok(())
    }

    /// Persistence records, one per oracle, ordered by index
    pub fn to_records(&self) -> Vec<Oracle> {
        self.list()
    }

    /// Reconstructs registry from persistence records. Index allocation
    /// continues after the largest restored index.
    pub fn from_records(records: impl IntoIterator<Item = Oracle>) -> Result<Self, Error> {
        let mut oracles = Oracles::default();
        for oracle in records {
            if oracles.by_key.contains_key(&oracle.pubkey) {
                return Err(Error::InconsistentRecords(format!(
                    "oracle key {} is listed twice",
                    oracle.pubkey
                )));
            }
            if oracles.by_idx.contains_key(&oracle.idx) {
                return Err(Error::InconsistentRecords(format!(
                    "oracle index {} is listed twice",
                    oracle.idx
                )));
            }
            oracles.last_idx = oracles.last_idx.max(oracle.idx.into_inner());
            oracles.by_key.insert(oracle.pubkey, oracle.idx);
            oracles.by_idx.insert(oracle.idx, oracle);
        }
        Ok(OracleRegistry {
            oracles: RwLock::new(oracles),
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_helpers::*;

    #[test]
    fn test_register_or_lookup() {
        let registry = OracleRegistry::new();
        let key = gen_secp_pubkeys(1)[0].serialize();

        let idx = registry.register_or_lookup(&key, "Tutorial").unwrap();
        assert_eq!(idx, OracleIdx::from(1));
        assert_eq!(registry.register_or_lookup(&key, "Other").unwrap(), idx);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(idx).unwrap().name(), "Tutorial");
    }

    #[test]
    fn test_monotonic_indexes() {
        let registry = OracleRegistry::new();
        let idxs = gen_secp_pubkeys(4)
            .iter()
            .map(|key| registry.register_or_lookup(&key.serialize(), "").unwrap())
            .collect::<Vec<_>>();
        assert_eq!(idxs, (1..=4u32).map(OracleIdx::from).collect::<Vec<_>>());
    }

    #[test]
    fn test_invalid_keys() {
        let registry = OracleRegistry::new();
        let key = gen_secp_pubkeys(1)[0];
        assert_eq!(
            registry.register_or_lookup(&key.serialize_uncompressed(), "x"),
            Err(Error::InvalidKey)
        );
        assert_eq!(registry.register_or_lookup(&[0x05; 33], "x"), Err(Error::InvalidKey));
        assert_eq!(registry.register_or_lookup(&[], "x"), Err(Error::InvalidKey));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_rename() {
        let registry = OracleRegistry::new();
        let key = gen_secp_pubkeys(1)[0];
        let idx = registry.register_or_lookup(&key.serialize(), "old").unwrap();
        registry.rename(idx, "new").unwrap();
        assert_eq!(registry.find(&key).unwrap().name(), "new");
        assert_eq!(registry.rename(7u32.into(), "x"), Err(Error::UnknownOracle(7u32.into())));
    }

    #[test]
    fn test_records() {
        let registry = OracleRegistry::new();
        for key in gen_secp_pubkeys(3) {
            registry.register_or_lookup(&key.serialize(), "o").unwrap();
        }
        let restored = OracleRegistry::from_records(registry.to_records()).unwrap();
        assert_eq!(restored.list(), registry.list());

        let extra = gen_secp_pubkeys(4)[3];
        assert_eq!(restored.register_or_lookup(&extra.serialize(), "o").unwrap(), OracleIdx::from(4));

        let mut records = registry.to_records();
        records.push(records[0].clone());
        assert!(matches!(
            OracleRegistry::from_records(records),
            Err(Error::InconsistentRecords(_))
        ));
    }
}
