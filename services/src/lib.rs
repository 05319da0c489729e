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

//! Support crate for applications embedding DLC parties: configuration
//! files, logging setup and asynchronous waiting for contract status changes

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
extern crate log;
#[macro_use]
extern crate serde_crate as serde;

pub mod config;
pub mod error;
pub mod poll;
pub mod shell;

pub use config::Config;
pub use error::{ConfigError, WaitError};
pub use poll::{wait_for_activation, wait_for_status, PollPolicy};
pub use shell::LogLevel;
