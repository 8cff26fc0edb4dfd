//! Aggregate contract for event-sourced entities.

use crate::error::{DomainError, DomainResult};
use crate::id::Id;

/// An entity whose state is derived by replaying its events.
///
/// Aggregates are plain values: a creation event produces one and each
/// transformation event maps one version to the next. `KIND` names the stream
/// family the aggregate's events are stored under and must be unique per type.
pub trait Aggregate: Clone + core::fmt::Debug + Send + Sync + 'static {
    const KIND: &'static str;

    fn id(&self) -> &Id<Self>;

    /// Number of events folded into this state (1 after creation).
    fn version(&self) -> u64;
}

/// Optimistic concurrency expectation for an aggregate.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum ExpectedVersion {
    /// Skip version checking.
    #[default]
    Any,
    /// Require the stream to be at an exact version (0 = no events yet).
    Exact(u64),
}

impl ExpectedVersion {
    pub fn matches(self, actual: u64) -> bool {
        match self {
            ExpectedVersion::Any => true,
            ExpectedVersion::Exact(v) => v == actual,
        }
    }

    pub fn check(self, actual: u64) -> DomainResult<()> {
        if self.matches(actual) {
            Ok(())
        } else {
            Err(DomainError::conflict(format!("expected {self:?}, found {actual}")))
        }
    }
}
