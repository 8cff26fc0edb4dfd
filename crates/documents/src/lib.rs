//! `strata-documents`: the document aggregate.
//!
//! A document is created with its content, then embedded (or fails to embed) by an
//! external worker; editing the content resets it to `Pending`.

pub mod document;
pub mod events;

pub use document::{Document, DocumentData, DocumentId, DocumentStatus};
pub use events::{
    DocumentContentUpdated, DocumentCreated, DocumentEmbedded, DocumentEmbeddingFailed,
    registrations,
};
