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

//! Store of the contracts known to a single party.
//!
//! Each contract sits behind its own lock. Transitions take the lock
//! exclusively for their whole duration and are applied to a copy of the
//! record, which replaces the stored one only on success. Readers receive
//! cloned snapshots, so they never observe a partially applied transition.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use amplify::Wrapper;
use parking_lot::RwLock;

use crate::attestation::{self, OracleSignature, OracleValue};
use crate::contract::{Contract, ContractId, ContractIdx, ContractStatus, ContractTerms};
use crate::{Error, OracleIdx, Settlement, Timestamp};

#[derive(Debug, Default)]
struct Index {
    contracts: BTreeMap<ContractIdx, Arc<RwLock<Contract>>>,
    ids: HashMap<ContractId, ContractIdx>,
    last_idx: u32,
}

impl Index {
    fn allocate(&mut self) -> ContractIdx {
        self.last_idx += 1;
        ContractIdx::from(self.last_idx)
    }
}

#[derive(Debug, Default)]
pub struct ContractStore {
    index: RwLock<Index>,
}

impl ContractStore {
    pub fn new() -> Self {
        ContractStore::default()
    }

    fn entry(&self, idx: ContractIdx) -> Result<Arc<RwLock<Contract>>, Error> {
        self.index
            .read()
            .contracts
            .get(&idx)
            .cloned()
            .ok_or(Error::UnknownContract(idx))
    }

    /// Creates new empty draft
    pub fn create(&self) -> ContractIdx {
        let mut index = self.index.write();
        let idx = index.allocate();
        index
            .contracts
            .insert(idx, Arc::new(RwLock::new(Contract::draft(idx))));
        debug!("Created draft contract {}", idx);
        idx
    }

    /// Consistent snapshot of a contract
    pub fn get(&self, idx: ContractIdx) -> Result<Contract, Error> {
        Ok(self.entry(idx)?.read().clone())
    }

    pub fn status(&self, idx: ContractIdx) -> Result<ContractStatus, Error> {
        Ok(self.entry(idx)?.read().status())
    }

    pub fn find(&self, id: ContractId) -> Option<ContractIdx> {
        self.index.read().ids.get(&id).copied()
    }

    pub fn list(&self) -> Vec<Contract> {
        let entries = self.index.read().contracts.values().cloned().collect::<Vec<_>>();
        entries.into_iter().map(|entry| entry.read().clone()).collect()
    }

    pub fn list_with_status(&self, status: ContractStatus) -> Vec<Contract> {
        self.list()
            .into_iter()
            .filter(|contract| contract.status() == status)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.index.read().contracts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Runs `f` over a copy of the contract under its exclusive lock, and
    /// stores the copy only if `f` succeeds.
    pub(crate) fn update<T>(
        &self,
        idx: ContractIdx,
        f: impl FnOnce(&mut Contract) -> Result<T, Error>,
    ) -> Result<T, Error> {
        let entry = self.entry(idx)?;
        let mut guard = entry.write();
        let mut contract = guard.clone();
        let res = f(&mut contract)?;
        if contract.status() != guard.status() {
            info!("Contract {} moved from {} to {}", idx, guard.status(), contract.status());
        }
        *guard = contract;
        Ok(res)
    }

    /// Same as [`ContractStore::update`], but also indexes the contract id
    /// assigned by `f`
    pub(crate) fn update_indexed<T>(
        &self,
        idx: ContractIdx,
        f: impl FnOnce(&mut Contract) -> Result<T, Error>,
    ) -> Result<T, Error> {
        let res = self.update(idx, f)?;
        if let Some(id) = self.get(idx)?.id() {
            self.index.write().ids.insert(id, idx);
        }
        Ok(res)
    }

    /// Registers mirrored copy of an offer received from the peer
    pub(crate) fn insert_offered(
        &self,
        id: ContractId,
        oracle_idx: OracleIdx,
        terms: &ContractTerms,
    ) -> Result<ContractIdx, Error> {
        let mut index = self.index.write();
        if index.ids.contains_key(&id) {
            return Err(Error::DuplicateOffer(id));
        }
        let idx = index.allocate();
        let contract = Contract::offered_to_me(idx, id, oracle_idx, terms);
        index.contracts.insert(idx, Arc::new(RwLock::new(contract)));
        index.ids.insert(id, idx);
        info!("Contract {} offered to us registered under index {}", id, idx);
        Ok(idx)
    }

    /// Settles active contract with an oracle attestation.
    ///
    /// The attestation is verified against a snapshot without holding the
    /// contract lock; the lock is taken only to re-check the state and apply
    /// the settlement.
    pub fn settle(
        &self,
        idx: ContractIdx,
        value: OracleValue,
        signature: &[u8],
        now: Timestamp,
    ) -> Result<Settlement, Error> {
        let snapshot = self.get(idx)?;
        snapshot.check_settleable(now)?;
        let terms = snapshot.terms()?;

        if !attestation::verify(&terms.oracle_key, &terms.commitment_point, value, signature) {
            warn!("Rejected attestation for value {} on contract {}", value, idx);
            return Err(Error::InvalidAttestation(idx));
        }
        let signature = OracleSignature::from_slice(signature).ok_or(Error::InvalidAttestation(idx))?;

        self.update(idx, |contract| {
            // The record could have changed while we were verifying
            if contract.commitment_point() != Some(terms.commitment_point) ||
                contract.oracle_key() != Some(terms.oracle_key)
            {
                return Err(Error::InvalidAttestation(idx));
            }
            contract.settle_verified(value, signature, now)
        })
    }

    /// Persistence records, one per contract, ordered by index
    pub fn to_records(&self) -> Vec<Contract> {
        self.list()
    }

    pub fn from_records(records: impl IntoIterator<Item = Contract>) -> Result<Self, Error> {
        let mut index = Index::default();
        for contract in records {
            let idx = contract.idx();
            if index.contracts.contains_key(&idx) {
                return Err(Error::InconsistentRecords(format!("contract index {} is listed twice", idx)));
            }
            if let Some(id) = contract.id() {
                if index.ids.insert(id, idx).is_some() {
                    return Err(Error::InconsistentRecords(format!("contract id {} is listed twice", id)));
                }
            }
            index.last_idx = index.last_idx.max(idx.into_inner());
            index.contracts.insert(idx, Arc::new(RwLock::new(contract)));
        }
        Ok(ContractStore {
            index: RwLock::new(index),
        })
    }
}
