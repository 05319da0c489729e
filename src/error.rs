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

use crate::contract::{Action, ContractId, ContractIdx, ContractStatus, Field};
use crate::{CoinType, OracleIdx, Timestamp};

/// Errors returned by contract store, oracle registry and negotiation
/// operations. None of them are retried internally; a failed operation
/// leaves the affected contract exactly as it was before the call.
#[derive(Clone, PartialEq, Eq, Debug, Display, Error)]
#[display(doc_comments)]
pub enum Error {
    /// public key is not a valid 33-byte compressed secp256k1 point
    InvalidKey,

    /// oracle with index {0} is not known
    UnknownOracle(OracleIdx),

    /// contract with index {0} is not known
    UnknownContract(ContractIdx),

    /// no contract is negotiated under id {0}
    UnknownContractId(ContractId),

    /// contract {0} can't be offered since its {1} is not set
    IncompleteContract(ContractIdx, Field),

    /// contract {0} in {1} state does not allow to {2}
    InvalidTransition(ContractIdx, ContractStatus, Action),

    /// oracle attestation provided for contract {0} does not verify against
    /// the contract commitment point
    InvalidAttestation(ContractIdx),

    /// contract {0} is already settled
    AlreadySettled(ContractIdx),

    /// coin type {0} is not supported
    UnsupportedCoinType(CoinType),

    /// contract {0} has invalid configuration: {1}
    InvalidConfiguration(ContractIdx, ConfigurationIssue),

    /// offer for contract {0} was already received
    DuplicateOffer(ContractId),

    /// contract {0} can't be settled before {1}
    SettlementTimeNotReached(ContractIdx, Timestamp),

    /// offered settlement time {0} is not in the future
    SettlementTimePassed(Timestamp),

    /// persisted records are inconsistent: {0}
    InconsistentRecords(String),

    /// peer transport has failed to deliver the message: {0}
    Transport(String),
}

/// Specific configuration problem reported by [`Error::InvalidConfiguration`]
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Display)]
#[display(doc_comments)]
pub enum ConfigurationIssue {
    /// both division points have the same value
    DivisionCollapse,

    /// sum of the funding amounts overflows 64-bit integer
    FundingOverflow,
}
