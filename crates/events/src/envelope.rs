use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strata_codec::{DecodeResult, Decoder, FieldWriter, Fields, Schema, decoder, schema};
use strata_core::{AnyAggregate, EventId, Id};

use crate::payload::{stringified, stringified_decoder};
use crate::time;

/// Name of the persisted payload field.
pub const PAYLOAD_FIELD: &str = "json_payload";

/// Provenance metadata recorded alongside every event.
///
/// Notes:
/// - `aggregate_version` increases by one per event of the same aggregate.
/// - `correlation_id` is shared by every event of one logical operation.
/// - `causation_id` is the id of the event that triggered this one.
///
/// Envelopes are created once by the store and never modified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    event_id: EventId,
    aggregate_id: Id<AnyAggregate>,
    aggregate_version: u64,
    correlation_id: EventId,
    causation_id: EventId,
    recorded_on: DateTime<Utc>,
}

impl Envelope {
    pub fn new(
        event_id: EventId,
        aggregate_id: Id<AnyAggregate>,
        aggregate_version: u64,
        correlation_id: EventId,
        causation_id: EventId,
        recorded_on: DateTime<Utc>,
    ) -> Self {
        Self {
            event_id,
            aggregate_id,
            aggregate_version,
            correlation_id,
            causation_id,
            recorded_on,
        }
    }

    pub fn event_id(&self) -> &EventId {
        &self.event_id
    }

    pub fn aggregate_id(&self) -> &Id<AnyAggregate> {
        &self.aggregate_id
    }

    pub fn aggregate_version(&self) -> u64 {
        self.aggregate_version
    }

    pub fn correlation_id(&self) -> &EventId {
        &self.correlation_id
    }

    pub fn causation_id(&self) -> &EventId {
        &self.causation_id
    }

    pub fn recorded_on(&self) -> DateTime<Utc> {
        self.recorded_on
    }

    /// Schema for the six envelope fields of a persisted record.
    pub fn schema() -> Schema<Envelope> {
        let codec = EnvelopeCodec::new();
        let reader = codec.clone();
        schema::record(
            move |r| reader.read(r),
            move |w, envelope: &Envelope| codec.write(w, envelope),
        )
    }
}

/// One persisted event: its envelope plus the typed payload.
#[derive(Debug, Clone, PartialEq)]
pub struct EventData<E> {
    pub envelope: Envelope,
    pub event: E,
}

impl<E> EventData<E> {
    pub fn new(envelope: Envelope, event: E) -> Self {
        Self { envelope, event }
    }

    pub fn map<F, U>(self, f: F) -> EventData<U>
    where
        F: FnOnce(E) -> U,
    {
        EventData {
            envelope: self.envelope,
            event: f(self.event),
        }
    }
}

#[derive(Clone)]
struct EnvelopeCodec {
    event_id: Schema<EventId>,
    aggregate_id: Schema<Id<AnyAggregate>>,
    version: Schema<u64>,
    recorded_on: Schema<DateTime<Utc>>,
}

impl EnvelopeCodec {
    fn new() -> Self {
        Self {
            event_id: EventId::schema(),
            aggregate_id: Id::<AnyAggregate>::schema(),
            version: schema::unsigned(),
            recorded_on: time::utc(),
        }
    }

    fn read(&self, r: &Fields<'_>) -> DecodeResult<Envelope> {
        Ok(Envelope {
            event_id: r.field("event_id", &self.event_id)?,
            aggregate_id: r.field("aggregate_id", &self.aggregate_id)?,
            aggregate_version: r.field("aggregate_version", &self.version)?,
            correlation_id: r.field("correlation_id", &self.event_id)?,
            causation_id: r.field("causation_id", &self.event_id)?,
            recorded_on: r.field("recorded_on", &self.recorded_on)?,
        })
    }

    fn write(&self, w: &mut FieldWriter, envelope: &Envelope) {
        w.field("event_id", &self.event_id, &envelope.event_id)
            .field("aggregate_id", &self.aggregate_id, &envelope.aggregate_id)
            .field("aggregate_version", &self.version, &envelope.aggregate_version)
            .field("correlation_id", &self.event_id, &envelope.correlation_id)
            .field("causation_id", &self.event_id, &envelope.causation_id)
            .field("recorded_on", &self.recorded_on, &envelope.recorded_on);
    }
}

/// Persisted record schema: envelope fields plus `json_payload`.
pub fn event_data<E: 'static>(payload: Schema<E>) -> Schema<EventData<E>> {
    let codec = EnvelopeCodec::new();
    let payload = stringified(payload);
    let (reader, payload_reader) = (codec.clone(), payload.clone());
    schema::record(
        move |r| {
            Ok(EventData {
                envelope: reader.read(r)?,
                event: r.field(PAYLOAD_FIELD, &payload_reader)?,
            })
        },
        move |w, data: &EventData<E>| {
            codec.write(w, &data.envelope);
            w.field(PAYLOAD_FIELD, &payload, &data.event);
        },
    )
}

/// Decode-only form of [`event_data`], for payload decoders with no encoder
/// (per-kind unions, projection filters).
pub fn event_data_decoder<E: 'static>(payload: Decoder<E>) -> Decoder<EventData<E>> {
    let codec = EnvelopeCodec::new();
    let payload = stringified_decoder(payload);
    decoder::record(move |r| {
        Ok(EventData {
            envelope: codec.read(r)?,
            event: r.field(PAYLOAD_FIELD, &payload)?,
        })
    })
}
