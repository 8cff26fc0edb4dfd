//! `strata-events`: event primitives, persisted record codecs and replay.
//!
//! - [`Event`], [`CreationEvent`], [`TransformationEvent`]: what an event is
//! - [`Envelope`], [`EventData`], [`event_data`]: the persisted record shape
//! - [`SchemaRegistry`]: encode-by-tag and hydration
//! - [`projection`]: filters for consumers that only want some event types

pub mod envelope;
pub mod error;
pub mod event;
pub mod payload;
pub mod projection;
pub mod registry;
pub mod time;

pub use envelope::{Envelope, EventData, PAYLOAD_FIELD, event_data, event_data_decoder};
pub use error::RegistryError;
pub use event::{
    BoxedCreation, BoxedTransformation, CreationEvent, Event, EventVariant, TransformationEvent,
};
pub use projection::{Filtered, Interest, accept, accept_record};
pub use registry::{Hydrated, Registration, SchemaRegistry};
