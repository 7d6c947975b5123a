//! Condition polling for integration test steps.
//!
//! Most checks against a cloud are of the form "this resource reaches this state within that
//! time". [`Waiter`] runs such a check repeatedly until it holds, the time budget is exhausted
//! or the check fails in an unexpected way.
//!
//! ```ignore
//! use stepwait::{wait, WaitConfig};
//! use std::time::Duration;
//!
//! let config = WaitConfig::new()
//!     .timeout(Duration::from_secs(300))
//!     .name("_check_volume_status");
//! wait(&config, || {
//!     let status = volume_status(&volume_id);
//!     (status == "available", format!("volume status={}", status))
//! })?;
//! ```

pub mod attempt;
pub mod clock;
pub mod config;
pub mod expect;
pub mod logger;
pub mod status;
#[cfg(test)]
mod testutils;
mod waiter;

pub use crate::{
    attempt::{Attempt, IntoAttempt},
    clock::{Clock, SystemClock},
    config::{Config, ConfigError},
    waiter::{
        try_wait, wait, TimeoutError, WaitConfig, WaitError, Waiter, DEFAULT_POLLING_INTERVAL,
    },
};
