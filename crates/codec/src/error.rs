//! Decode failure model.

use crate::path::{Path, Segment};

/// Result of running a decoder.
pub type DecodeResult<T> = Result<T, DecodeError>;

/// A recoverable decode failure: where it happened and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeError {
    path: Path,
    message: String,
}

impl DecodeError {
    /// Failure at the current position (empty path).
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            path: Path::root(),
            message: message.into(),
        }
    }

    /// Prefix `segment` onto the failure path.
    pub fn at(self, segment: Segment) -> Self {
        Self {
            path: self.path.prepend(segment),
            message: self.message,
        }
    }

    pub fn at_key(self, key: &str) -> Self {
        self.at(Segment::key(key))
    }

    pub fn at_index(self, index: usize) -> Self {
        self.at(Segment::Index(index))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl core::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        if self.path.is_root() {
            f.write_str(&self.message)
        } else {
            write!(f, "{}. When parsing: {}", self.message, self.path)
        }
    }
}

impl std::error::Error for DecodeError {}
