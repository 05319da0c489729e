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

//! Caller-side waiting for contract status changes. The core never blocks;
//! applications that need to wait for a peer or the funding layer poll the
//! party with an exponential backoff until the awaited status is reached,
//! the contract ends up in a different terminal status or the wait is
//! cancelled.

use std::time::Duration;

use dlc_core::{Contract, ContractIdx, ContractStatus, FundingMonitor, Party};
use tokio::sync::watch;

use crate::WaitError;

/// Backoff parameters used when polling contract status
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(crate = "serde_crate", default)]
pub struct PollPolicy {
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_factor: u32,
    /// Unlimited if not set
    pub max_attempts: Option<u32>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        PollPolicy {
            initial_delay_ms: 250,
            max_delay_ms: 30_000,
            backoff_factor: 2,
            max_attempts: None,
        }
    }
}

impl PollPolicy {
    /// Shortest delay between two checks
    pub const MIN_DELAY: Duration = Duration::from_millis(1);

    fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms).max(Self::MIN_DELAY)
    }

    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
            .max(Self::MIN_DELAY)
            .min(self.max_delay())
    }

    pub fn next_delay(&self, delay: Duration) -> Duration {
        delay
            .max(Self::MIN_DELAY)
            .saturating_mul(self.backoff_factor.max(1))
            .min(self.max_delay())
    }
}

/// Waits until contract `idx` reaches `target` status and returns its
/// snapshot.
///
/// Setting the value behind `cancel` to `true`, or dropping its sender,
/// stops the wait with [`WaitError::Cancelled`].
pub async fn wait_for_status(
    party: &Party,
    idx: ContractIdx,
    target: ContractStatus,
    policy: &PollPolicy,
    cancel: watch::Receiver<bool>,
) -> Result<Contract, WaitError> {
    poll(party, idx, target, policy, cancel, || {}).await
}

/// Same as [`wait_for_status`] with `Active` target, but asks the funding
/// layer about confirmations before each check.
pub async fn wait_for_activation(
    party: &Party,
    idx: ContractIdx,
    monitor: &impl FundingMonitor,
    policy: &PollPolicy,
    cancel: watch::Receiver<bool>,
) -> Result<Contract, WaitError> {
    poll(party, idx, ContractStatus::Active, policy, cancel, || {
        party.sync_funding(monitor);
    })
    .await
}

async fn poll(
    party: &Party,
    idx: ContractIdx,
    target: ContractStatus,
    policy: &PollPolicy,
    mut cancel: watch::Receiver<bool>,
    before_check: impl Fn(),
) -> Result<Contract, WaitError> {
    let mut delay = policy.initial_delay();
    let mut attempts = 0u32;
    loop {
        if *cancel.borrow() {
            return Err(WaitError::Cancelled(idx));
        }
        before_check();
        let contract = party.contract(idx)?;
        let status = contract.status();
        attempts += 1;
        if status == target {
            debug!("Contract {} has reached {} after {} checks", idx, target, attempts);
            return Ok(contract);
        }
        if status.is_terminal() {
            return Err(WaitError::UnexpectedStatus(idx, status));
        }
        if policy.max_attempts.map(|max| attempts >= max).unwrap_or_default() {
            return Err(WaitError::AttemptsExhausted(idx, status, attempts));
        }
        trace!("Contract {} is {}, next check in {:?}", idx, status, delay);

        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            changed = cancel.changed() => {
                if changed.is_err() {
                    return Err(WaitError::Cancelled(idx));
                }
            }
        }
        delay = policy.next_delay(delay);
    }
}
