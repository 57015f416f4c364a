//! Identifier types shared by every crate in the reservation engine.

mod types;

pub use types::{AggregateId, UserId};
