//! Phantom-typed identifiers.
//!
//! `Id<K>` is a plain string at runtime; `K` names the kind of thing it identifies
//! so that, say, a document id cannot be passed where an event id is expected.

use core::cmp::Ordering;
use core::hash::{Hash, Hasher};
use core::marker::PhantomData;
use core::str::FromStr;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use rand::RngCore;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::{Digest, Sha256};
use strata_codec::{Schema, schema};
use uuid::Uuid;

use crate::error::IdError;

const ALPHABET: &[u8; 62] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Length of generated identifiers.
pub const ID_LENGTH: usize = 56;

/// Kind marker for the kind-erased aggregate id carried by envelopes.
#[derive(Debug)]
pub enum AnyAggregate {}

/// Kind marker for event ids.
#[derive(Debug)]
pub enum AnyEvent {}

pub type EventId = Id<AnyEvent>;

#[derive(Serialize, Deserialize)]
#[serde(transparent, bound = "")]
pub struct Id<K> {
    value: String,
    #[serde(skip)]
    kind: PhantomData<fn() -> K>,
}

impl<K> Id<K> {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            kind: PhantomData,
        }
    }

    /// 56 characters drawn from `[0-9A-Za-z]` using OS randomness.
    pub fn random() -> Self {
        let mut bytes = [0u8; ID_LENGTH];
        OsRng.fill_bytes(&mut bytes);
        let value = bytes
            .iter()
            .map(|b| ALPHABET[usize::from(*b) % ALPHABET.len()] as char)
            .collect::<String>();
        Self::new(value)
    }

    /// Derive an id from `seed`; the same seed always yields the same id.
    ///
    /// # Panics
    ///
    /// Panics if `seed` is empty or whitespace. Use [`Id::try_deterministic`] when
    /// the seed comes from input.
    pub fn deterministic(seed: &str) -> Self {
        match Self::try_deterministic(seed) {
            Ok(id) => id,
            Err(e) => panic!("{e}"),
        }
    }

    pub fn try_deterministic(seed: &str) -> Result<Self, IdError> {
        if seed.trim().is_empty() {
            return Err(IdError::EmptySeed);
        }

        let first = Sha256::digest(seed.as_bytes());
        let second = Sha256::digest(first);
        let mut combined = Vec::with_capacity(first.len() + second.len());
        combined.extend_from_slice(&first);
        combined.extend_from_slice(&second);

        let value = STANDARD
            .encode(&combined)
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .take(ID_LENGTH)
            .collect::<String>();
        Ok(Self::new(value))
    }

    /// Name-based UUID (version 5 layout) derived from the SHA-1 of the value.
    pub fn to_uuid(&self) -> Uuid {
        let digest = Sha1::digest(self.value.as_bytes());
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&digest[..16]);
        uuid::Builder::from_sha1_bytes(bytes).into_uuid()
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn into_string(self) -> String {
        self.value
    }

    /// Re-label the id with another kind. Only the envelope boundary needs this.
    pub fn cast<L>(&self) -> Id<L> {
        Id::new(self.value.clone())
    }
}

impl<K: 'static> Id<K> {
    pub fn schema() -> Schema<Id<K>> {
        schema::string().dimap(Id::from, |id: &Id<K>| id.value.clone())
    }
}

impl<K> From<String> for Id<K> {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl<K> FromStr for Id<K> {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(IdError::Empty);
        }
        Ok(Self::new(s))
    }
}

impl<K> Clone for Id<K> {
    fn clone(&self) -> Self {
        Self::new(self.value.clone())
    }
}

impl<K> PartialEq for Id<K> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<K> Eq for Id<K> {}

impl<K> PartialOrd for Id<K> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Lexicographic on the underlying string.
impl<K> Ord for Id<K> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value.cmp(&other.value)
    }
}

impl<K> Hash for Id<K> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl<K> core::fmt::Debug for Id<K> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("Id").field(&self.value).finish()
    }
}

impl<K> core::fmt::Display for Id<K> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.value)
    }
}
