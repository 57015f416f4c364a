use chrono::{DateTime, Utc};
use common::AggregateId;
use event_store::Version;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::aggregate::{Aggregate, DomainEvent};

use super::{FeePolicyError, Money};

/// Well-known stream of the process-wide fee policy.
const POLICY_STREAM: Uuid = Uuid::from_u128(0x6665_6570_6f6c_6963_7900_0000_0000_0001);

/// Amounts used until an administrator records a policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeDefaults {
    pub hourly_rate: Money,
    pub penalty: Money,
}

impl Default for FeeDefaults {
    fn default() -> Self {
        Self {
            hourly_rate: Money::from_units(10),
            penalty: Money::from_units(50),
        }
    }
}

/// Events recorded on the fee policy stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum FeePolicyEvent {
    FeePolicyUpdated(FeePolicyUpdatedData),
}

impl DomainEvent for FeePolicyEvent {
    fn event_type(&self) -> &'static str {
        match self {
            FeePolicyEvent::FeePolicyUpdated(_) => "FeePolicyUpdated",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeePolicyUpdatedData {
    pub policy_id: AggregateId,
    pub default_hourly_rate: Money,
    pub default_penalty: Money,
    pub updated_at: DateTime<Utc>,
}

/// Default hourly rate and overstay penalty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeePolicy {
    id: Option<AggregateId>,
    #[serde(default)]
    version: Version,
    default_hourly_rate: Money,
    default_penalty: Money,
    updated_at: Option<DateTime<Utc>>,
}

impl Aggregate for FeePolicy {
    type Event = FeePolicyEvent;
    type Error = FeePolicyError;

    fn aggregate_type() -> &'static str {
        "FeePolicy"
    }

    fn id(&self) -> Option<AggregateId> {
        self.id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    fn apply(&mut self, event: Self::Event) {
        match event {
            FeePolicyEvent::FeePolicyUpdated(data) => {
                self.id = Some(data.policy_id);
                self.default_hourly_rate = data.default_hourly_rate;
                self.default_penalty = data.default_penalty;
                self.updated_at = Some(data.updated_at);
            }
        }
    }
}

impl FeePolicy {
    /// Id of the single fee policy record.
    pub fn policy_id() -> AggregateId {
        AggregateId::from_uuid(POLICY_STREAM)
    }

    /// A policy that was never recorded, carrying the configured defaults.
    pub fn from_defaults(defaults: FeeDefaults) -> Self {
        Self {
            default_hourly_rate: defaults.hourly_rate,
            default_penalty: defaults.penalty,
            ..Default::default()
        }
    }

    pub fn default_hourly_rate(&self) -> Money {
        self.default_hourly_rate
    }

    pub fn default_penalty(&self) -> Money {
        self.default_penalty
    }

    /// When the policy was last recorded; None while running on defaults.
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    /// Rate to bill for a slot. A zero slot rate means "use the default".
    pub fn resolve_rate(&self, slot_rate: Money) -> Money {
        if slot_rate.is_zero() {
            self.default_hourly_rate
        } else {
            slot_rate
        }
    }

    pub fn update(
        &self,
        default_hourly_rate: Money,
        default_penalty: Money,
        now: DateTime<Utc>,
    ) -> Result<Vec<FeePolicyEvent>, FeePolicyError> {
        if default_hourly_rate.is_negative() {
            return Err(FeePolicyError::NegativeAmount {
                field: "default hourly rate",
                amount: default_hourly_rate,
            });
        }
        if default_penalty.is_negative() {
            return Err(FeePolicyError::NegativeAmount {
                field: "default penalty",
                amount: default_penalty,
            });
        }

        Ok(vec![FeePolicyEvent::FeePolicyUpdated(FeePolicyUpdatedData {
            policy_id: Self::policy_id(),
            default_hourly_rate,
            default_penalty,
            updated_at: now,
        })])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_slot_rate_falls_back_to_default() {
        let policy = FeePolicy::from_defaults(FeeDefaults::default());
        assert_eq!(policy.resolve_rate(Money::zero()), Money::from_units(10));
        assert_eq!(policy.resolve_rate(Money::from_units(25)), Money::from_units(25));
    }

    #[test]
    fn update_records_both_amounts() {
        let policy = FeePolicy::default();
        let now = Utc::now();
        let events = policy
            .update(Money::from_units(12), Money::from_units(40), now)
            .unwrap();

        let mut updated = FeePolicy::default();
        updated.apply_events(events);
        assert_eq!(updated.id(), Some(FeePolicy::policy_id()));
        assert_eq!(updated.default_hourly_rate(), Money::from_units(12));
        assert_eq!(updated.default_penalty(), Money::from_units(40));
        assert_eq!(updated.updated_at(), Some(now));
    }

    #[test]
    fn negative_amounts_are_rejected() {
        let policy = FeePolicy::default();
        assert!(matches!(
            policy.update(Money::from_cents(-1), Money::zero(), Utc::now()),
            Err(FeePolicyError::NegativeAmount { field: "default hourly rate", .. })
        ));
        assert!(matches!(
            policy.update(Money::zero(), Money::from_cents(-1), Utc::now()),
            Err(FeePolicyError::NegativeAmount { field: "default penalty", .. })
        ));
    }
}
