use crate::EventEnvelope;

/// Filter over the whole event log.
///
/// Unset fields match everything. Results come back in append order.
#[derive(Debug, Clone, Default)]
pub struct EventQuery {
    pub aggregate_type: Option<String>,

    /// Any of these event types.
    pub event_types: Option<Vec<String>>,

    pub limit: Option<usize>,
}

impl EventQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Query every event of one aggregate type.
    pub fn for_aggregate_type(aggregate_type: impl Into<String>) -> Self {
        Self {
            aggregate_type: Some(aggregate_type.into()),
            ..Default::default()
        }
    }

    pub fn event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_types = Some(vec![event_type.into()]);
        self
    }

    pub fn event_types<I, T>(mut self, event_types: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.event_types = Some(event_types.into_iter().map(Into::into).collect());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Returns true if the envelope passes every filter.
    pub fn matches(&self, envelope: &EventEnvelope) -> bool {
        if let Some(ref aggregate_type) = self.aggregate_type
            && &envelope.aggregate_type != aggregate_type
        {
            return false;
        }
        if let Some(ref types) = self.event_types
            && !types.contains(&envelope.event_type)
        {
            return false;
        }
        true
    }
}
