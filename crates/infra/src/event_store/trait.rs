use std::sync::Arc;

use strata_codec::DecodeError;
use strata_core::{Aggregate, DomainError, EventId, ExpectedVersion, Id};
use strata_events::{Envelope, Event, EventData, Hydrated};
use thiserror::Error;

/// A request to append one event.
///
/// Omitted ids are filled in by the store:
/// - `event_id`: a fresh random id
/// - `correlation_id` and `causation_id`: the new event's own id, i.e. the event
///   starts a new logical operation
#[derive(Debug, Clone)]
pub struct Emit<E> {
    pub event: E,
    pub event_id: Option<EventId>,
    pub correlation_id: Option<EventId>,
    pub causation_id: Option<EventId>,
    pub expected_version: ExpectedVersion,
}

impl<E> Emit<E> {
    pub fn new(event: E) -> Self {
        Self {
            event,
            event_id: None,
            correlation_id: None,
            causation_id: None,
            expected_version: ExpectedVersion::Any,
        }
    }

    pub fn with_event_id(mut self, event_id: EventId) -> Self {
        self.event_id = Some(event_id);
        self
    }

    pub fn correlated_with(mut self, correlation_id: EventId) -> Self {
        self.correlation_id = Some(correlation_id);
        self
    }

    pub fn caused_by(mut self, causation_id: EventId) -> Self {
        self.causation_id = Some(causation_id);
        self
    }

    pub fn expecting(mut self, expected_version: ExpectedVersion) -> Self {
        self.expected_version = expected_version;
        self
    }

    /// Continue the operation `envelope` belongs to, as a consequence of that event.
    pub fn following(self, envelope: &Envelope) -> Self {
        self.correlated_with(envelope.correlation_id().clone())
            .caused_by(envelope.event_id().clone())
    }
}

/// Event store operation error.
///
/// Infrastructure failures and stream-state conflicts. Decode failures of stored
/// records surface as [`EventStoreError::Decode`] with the record index in the path.
#[derive(Debug, Error)]
pub enum EventStoreError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("stored records failed to decode: {0}")]
    Decode(#[from] DecodeError),

    #[error("optimistic concurrency check failed: {0}")]
    Concurrency(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("event already recorded: {0}")]
    DuplicateEvent(String),

    #[error("storage failure: {0}")]
    Storage(String),
}

impl From<DomainError> for EventStoreError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Conflict(msg) => EventStoreError::Concurrency(msg),
        }
    }
}

/// Append-only event store, one stream per aggregate.
///
/// ## Emit semantics
///
/// `emit()`:
/// - rejects an `event_id` that was already recorded
/// - checks `expected_version` against the current stream version
/// - accepts a creation event only on an empty stream, and a transformation event
///   only on an existing one
/// - assigns `aggregate_version = current + 1`
///
/// ## Load semantics
///
/// Streams are replayed in append order. `find` fails for a missing aggregate;
/// `try_find` reports it as `None`.
pub trait EventStore: Send + Sync {
    fn find_hydrated<A: Aggregate>(
        &self,
        id: &Id<A>,
    ) -> Result<Option<Hydrated<A>>, EventStoreError>;

    fn emit<E: Event>(&self, emit: Emit<E>) -> Result<EventData<E>, EventStoreError>;

    fn does_event_already_exist(&self, event_id: &EventId) -> Result<bool, EventStoreError>;

    fn try_find<A: Aggregate>(&self, id: &Id<A>) -> Result<Option<A>, EventStoreError> {
        Ok(self.find_hydrated(id)?.map(|hydrated| hydrated.aggregate))
    }

    fn find<A: Aggregate>(&self, id: &Id<A>) -> Result<A, EventStoreError> {
        self.try_find(id)?
            .ok_or_else(|| EventStoreError::NotFound(format!("{} {id}", A::KIND)))
    }
}

impl<S> EventStore for Arc<S>
where
    S: EventStore,
{
    fn find_hydrated<A: Aggregate>(
        &self,
        id: &Id<A>,
    ) -> Result<Option<Hydrated<A>>, EventStoreError> {
        (**self).find_hydrated(id)
    }

    fn emit<E: Event>(&self, emit: Emit<E>) -> Result<EventData<E>, EventStoreError> {
        (**self).emit(emit)
    }

    fn does_event_already_exist(&self, event_id: &EventId) -> Result<bool, EventStoreError> {
        (**self).does_event_already_exist(event_id)
    }
}
