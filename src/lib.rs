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

// Coding conventions
#![deny(
    non_upper_case_globals,
    non_camel_case_types,
    non_snake_case,
    unused_mut,
    unused_imports,
    dead_code,
    //missing_docs
)]

#[macro_use]
extern crate amplify;
#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate log;

#[cfg(feature = "serde")]
#[macro_use]
extern crate serde_crate as serde;

pub mod attestation;
mod clock;
mod coin;
mod config;
pub mod contract;
mod error;
pub mod negotiation;
mod oracle;
mod party;
pub mod payout;
mod store;

#[cfg(test)]
pub(crate) mod test_helpers;

use bitcoin::secp256k1::{All, Secp256k1};

pub use attestation::{OracleSignature, OracleValue};
pub use clock::{Clock, ManualClock, SystemClock, Timestamp};
pub use coin::{CoinType, CoinTypeParseError};
pub use config::PartyConfig;
pub use contract::{
    Action, Contract, ContractId, ContractIdx, ContractStatus, ContractTerms, Field, Role,
    Settlement,
};
pub use error::{ConfigurationIssue, Error};
pub use negotiation::{Accept, Decline, FundingMonitor, Offer, PeerTransport};
pub use oracle::{Oracle, OracleIdx, OracleRegistry};
pub use party::{Party, PartyRecords};
pub use payout::{compute_payout, Division, Funding, Payout, Sats};
pub use store::ContractStore;

lazy_static! {
    /// Global Secp256k1 context
    pub static ref SECP256K1: Secp256k1<All> = Secp256k1::new();
}
