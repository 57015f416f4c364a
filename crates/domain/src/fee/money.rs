use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

const SECONDS_PER_HOUR: i64 = 3600;

/// Money amount in cents to avoid floating point drift in charges.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Creates an amount from whole currency units (`10` is `10.00`).
    pub fn from_units(units: i64) -> Self {
        Self(units * 100)
    }

    pub fn zero() -> Self {
        Self(0)
    }

    pub fn cents(&self) -> i64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Charge for a number of billed hours at this hourly rate, or None if
    /// it does not fit.
    pub fn checked_multiply(&self, hours: i64) -> Option<Money> {
        self.0.checked_mul(hours).map(Money)
    }

    pub fn checked_add(&self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{sign}{}.{:02}", (self.0 / 100).abs(), (self.0 % 100).abs())
    }
}

/// Whole hours in `delta`, rounded up on any remainder.
///
/// Zero and negative durations bill zero hours.
pub fn ceil_hours(delta: TimeDelta) -> i64 {
    if delta <= TimeDelta::zero() {
        return 0;
    }
    let seconds = delta.num_seconds();
    let hours = seconds / SECONDS_PER_HOUR;
    if seconds % SECONDS_PER_HOUR != 0 || delta.subsec_nanos() != 0 {
        hours + 1
    } else {
        hours
    }
}
