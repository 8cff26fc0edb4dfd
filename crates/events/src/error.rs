use thiserror::Error;

/// Registry misconfiguration.
///
/// These are programming errors: the infallible registry entry points panic with
/// the rendered message. The `try_` variants return them for callers that build
/// registrations from dynamic input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Duplicate entry for {0}")]
    DuplicateEventType(String),

    #[error("Duplicate aggregate kind {0}")]
    DuplicateAggregateKind(String),

    #[error("Unknown event type {0}")]
    UnknownEventType(String),

    /// The event reports a tag other than the one it was registered under.
    #[error("Event {reported} is registered as {registered}")]
    EventTypeMismatch { registered: String, reported: String },

    /// One Rust event type registered under two tags.
    #[error("{event} is registered as both {first} and {second}")]
    ConflictingTags {
        event: String,
        first: String,
        second: String,
    },

    #[error("Unknown aggregate {0}")]
    UnknownAggregate(String),
}
