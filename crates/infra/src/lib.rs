//! Infrastructure layer: the event store boundary.

pub mod event_store;

pub use event_store::{Emit, EventStore, EventStoreError, InMemoryEventStore};
