//! Event store boundary.
//!
//! The store appends encoded records per aggregate stream and replays them through
//! the [`SchemaRegistry`](strata_events::SchemaRegistry). It is the one place where
//! concurrent writers meet, so it is responsible for giving every event of a stream
//! a distinct, gap-free `aggregate_version`.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::InMemoryEventStore;
pub use r#trait::{Emit, EventStore, EventStoreError};
