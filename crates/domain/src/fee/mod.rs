//! Fee policy: default hourly rate and overstay penalty.

mod money;
mod policy;
mod service;

pub use money::{Money, ceil_hours};
pub use policy::{FeeDefaults, FeePolicy, FeePolicyEvent, FeePolicyUpdatedData};
pub use service::FeePolicyService;

use thiserror::Error;

use crate::error::ErrorKind;

/// Errors that can occur when changing the fee policy.
#[derive(Debug, Error)]
pub enum FeePolicyError {
    #[error("Invalid {field}: {amount} (must not be negative)")]
    NegativeAmount { field: &'static str, amount: Money },
}

impl FeePolicyError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Validation
    }
}
