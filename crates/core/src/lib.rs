//! `strata-core`: identifiers and the aggregate contract.
//!
//! Pure domain primitives shared by every other crate. No infrastructure concerns.

pub mod aggregate;
pub mod error;
pub mod id;

pub use aggregate::{Aggregate, ExpectedVersion};
pub use error::{DomainError, DomainResult, IdError};
pub use id::{AnyAggregate, AnyEvent, EventId, Id};
