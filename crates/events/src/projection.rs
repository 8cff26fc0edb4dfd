//! Permissive decoding for read-model consumers.
//!
//! A projection usually cares about a handful of event types and must ignore the
//! rest. [`accept`] builds a decoder that reads the payload's `type` tag and either
//! decodes the full payload ([`Filtered::Matched`]) or, for tags outside the
//! interest set, succeeds with [`Filtered::Skip`]. A matched tag whose payload does
//! not decode is still a failure.

use std::collections::HashMap;
use std::sync::Arc;

use strata_codec::{AsDecoder, Decoder, decoder};

use crate::envelope::{EventData, event_data_decoder};

#[derive(Debug, Clone, PartialEq)]
pub enum Filtered<T> {
    Matched(T),
    Skip,
}

impl<T> Filtered<T> {
    pub fn matched(self) -> Option<T> {
        match self {
            Filtered::Matched(value) => Some(value),
            Filtered::Skip => None,
        }
    }

    pub fn is_skip(&self) -> bool {
        matches!(self, Filtered::Skip)
    }
}

/// One event type a projection wants, decoded into the projection's own type.
pub struct Interest<T> {
    event_type: &'static str,
    decoder: Decoder<T>,
}

impl<T: 'static> Interest<T> {
    pub fn new(event_type: &'static str, decoder: &impl AsDecoder<T>) -> Self {
        Self {
            event_type,
            decoder: decoder.as_decoder().clone(),
        }
    }

    /// Interest in `event_type`, converting the decoded event with `f`.
    pub fn map<E: 'static, F>(event_type: &'static str, decoder: &impl AsDecoder<E>, f: F) -> Self
    where
        F: Fn(E) -> T + Send + Sync + 'static,
    {
        Self {
            event_type,
            decoder: decoder.as_decoder().map(f),
        }
    }

    pub fn event_type(&self) -> &'static str {
        self.event_type
    }
}

/// Payload-level filter. When several interests name the same type, the first wins.
pub fn accept<T: 'static>(interests: Vec<Interest<T>>) -> Decoder<Filtered<T>> {
    let mut table: HashMap<&'static str, Decoder<T>> = HashMap::new();
    for interest in interests {
        table.entry(interest.event_type).or_insert(interest.decoder);
    }
    let table = Arc::new(table);
    decoder::field("type", decoder::string()).then(move |tag| match table.get(tag.as_str()) {
        Some(found) => found.map(Filtered::Matched),
        None => Decoder::new(|_| Ok(Filtered::Skip)),
    })
}

/// Record-level filter: the envelope must decode, the payload may be skipped.
pub fn accept_record<T: 'static>(interests: Vec<Interest<T>>) -> Decoder<Filtered<EventData<T>>> {
    event_data_decoder(accept(interests)).map(|data| match data.event {
        Filtered::Matched(event) => Filtered::Matched(EventData::new(data.envelope, event)),
        Filtered::Skip => Filtered::Skip,
    })
}
