//! Bidirectional JSON codecs.
//!
//! A [`Decoder`] turns an untyped [`serde_json::Value`] into a typed value or a
//! path-tagged [`DecodeError`]. An [`Encoder`] goes the other way. A [`Schema`]
//! pairs the two so persisted data can be validated on read and written back in
//! the same shape.
//!
//! The free functions in [`decoder`], [`encoder`] and [`schema`] share names, so
//! callers normally import the module they need and qualify (`schema::string()`).

pub mod decoder;
pub mod encoder;
pub mod error;
pub mod path;
pub mod schema;

pub use decoder::{AsDecoder, Decoder, Fields};
pub use encoder::{AsEncoder, Encoder, FieldWriter};
pub use error::{DecodeError, DecodeResult};
pub use path::{Path, Segment};
pub use schema::Schema;
