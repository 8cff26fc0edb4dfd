//! Schema registry and hydration.
//!
//! The registry is built once from a flat list of [`Registration`]s and is read-only
//! afterwards, so it can be shared (`Arc<SchemaRegistry>`) and used from any thread
//! without locking. It owns:
//!
//! - one encoder per event type tag, spanning every aggregate kind
//! - per aggregate kind, a creation union decoder and a transformation union
//!   decoder, each dispatching on the payload's `type` field
//!
//! ## Hydration ordering
//!
//! [`SchemaRegistry::hydrate`] folds records in the order it is given. It neither
//! sorts nor validates `aggregate_version`. Supplying records in increasing version
//! order is the caller's obligation; out-of-order input produces a different
//! aggregate rather than an error.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use serde_json::Value;
use strata_codec::{DecodeError, DecodeResult, Decoder, Schema, decoder};
use strata_core::Aggregate;
use tracing::{debug, instrument};

use crate::envelope::{Envelope, EventData, event_data, event_data_decoder};
use crate::error::RegistryError;
use crate::event::{
    BoxedCreation, BoxedTransformation, CreationEvent, Event, EventVariant, TransformationEvent,
};

type ErasedEncoder = Arc<dyn Fn(&dyn Any) -> Option<Value> + Send + Sync>;
type Tables = HashMap<TypeId, Box<dyn KindTable>>;
type Install = Box<dyn FnOnce(&mut Tables) + Send>;

/// One event type known to the registry: its tag, payload schema and variant.
pub struct Registration {
    event_type: &'static str,
    event: TypeId,
    event_name: &'static str,
    kind: &'static str,
    aggregate: TypeId,
    variant: EventVariant,
    encode: ErasedEncoder,
    install: Install,
}

impl Registration {
    pub fn creation<E: CreationEvent>(event_type: &'static str, schema: Schema<E>) -> Self {
        let payload = schema
            .decoder()
            .map(|event: E| -> BoxedCreation<E::Aggregate> { Box::new(event) });
        Self::build(event_type, EventVariant::Creation, &schema, move |tables| {
            kind_events::<E::Aggregate>(tables)
                .creation
                .push((event_type, payload));
        })
    }

    pub fn transformation<E: TransformationEvent>(
        event_type: &'static str,
        schema: Schema<E>,
    ) -> Self {
        let payload = schema
            .decoder()
            .map(|event: E| -> BoxedTransformation<E::Aggregate> { Box::new(event) });
        Self::build(event_type, EventVariant::Transformation, &schema, move |tables| {
            kind_events::<E::Aggregate>(tables)
                .transformation
                .push((event_type, payload));
        })
    }

    fn build<E, F>(
        event_type: &'static str,
        variant: EventVariant,
        schema: &Schema<E>,
        install: F,
    ) -> Self
    where
        E: Event,
        F: FnOnce(&mut Tables) + Send + 'static,
    {
        let (_, encoder) = event_data(schema.clone()).into_parts();
        Self {
            event_type,
            event: TypeId::of::<E>(),
            event_name: std::any::type_name::<E>(),
            kind: <E::Aggregate as Aggregate>::KIND,
            aggregate: TypeId::of::<E::Aggregate>(),
            variant,
            encode: Arc::new(move |value: &dyn Any| {
                value
                    .downcast_ref::<EventData<E>>()
                    .map(|data| encoder.run(data))
            }),
            install: Box::new(install),
        }
    }

    pub fn event_type(&self) -> &'static str {
        self.event_type
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    pub fn variant(&self) -> EventVariant {
        self.variant
    }
}

impl core::fmt::Debug for Registration {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Registration")
            .field("event_type", &self.event_type)
            .field("kind", &self.kind)
            .field("variant", &self.variant)
            .finish()
    }
}

/// Registrations of one aggregate kind, collected during construction.
trait KindTable: Send {
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn seal(self: Box<Self>) -> Box<dyn Any + Send + Sync>;
}

struct KindEvents<A: Aggregate> {
    creation: Vec<(&'static str, Decoder<BoxedCreation<A>>)>,
    transformation: Vec<(&'static str, Decoder<BoxedTransformation<A>>)>,
}

impl<A: Aggregate> Default for KindEvents<A> {
    fn default() -> Self {
        Self {
            creation: Vec::new(),
            transformation: Vec::new(),
        }
    }
}

impl<A: Aggregate> KindTable for KindEvents<A> {
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn seal(self: Box<Self>) -> Box<dyn Any + Send + Sync> {
        let KindEvents {
            creation,
            transformation,
        } = *self;
        Box::new(KindDecoders::<A> {
            creation: event_data_decoder(dispatch(creation)),
            transformation: event_data_decoder(dispatch(transformation)),
        })
    }
}

fn kind_events<A: Aggregate>(tables: &mut Tables) -> &mut KindEvents<A> {
    let table = tables
        .entry(TypeId::of::<A>())
        .or_insert_with(|| Box::new(KindEvents::<A>::default()));
    match table.as_any_mut().downcast_mut::<KindEvents<A>>() {
        Some(events) => events,
        None => unreachable!("kind tables are keyed by the aggregate's TypeId"),
    }
}

/// Discriminated union over the payload's `type` field.
fn dispatch<T: 'static>(alternatives: Vec<(&'static str, Decoder<T>)>) -> Decoder<T> {
    let table: HashMap<&'static str, Decoder<T>> = alternatives.into_iter().collect();
    decoder::field("type", decoder::string()).then(move |tag| match table.get(tag.as_str()) {
        Some(found) => found.clone(),
        None => decoder::fail(format!("Unknown event type: {tag}")),
    })
}

struct KindDecoders<A: Aggregate> {
    creation: Decoder<EventData<BoxedCreation<A>>>,
    transformation: Decoder<EventData<BoxedTransformation<A>>>,
}

struct EncoderEntry {
    kind: &'static str,
    variant: EventVariant,
    encode: ErasedEncoder,
}

/// Result of replaying one aggregate's records.
#[derive(Debug, Clone, PartialEq)]
pub struct Hydrated<A> {
    pub aggregate: A,
    /// Envelope of the last record folded.
    pub last_event: Envelope,
}

pub struct SchemaRegistry {
    encoders: HashMap<&'static str, EncoderEntry>,
    tags: HashMap<TypeId, &'static str>,
    kinds: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl SchemaRegistry {
    /// # Panics
    ///
    /// Panics on a duplicate event type tag or a reused aggregate kind name.
    pub fn new(registrations: impl IntoIterator<Item = Registration>) -> Self {
        match Self::try_new(registrations) {
            Ok(registry) => registry,
            Err(e) => panic!("{e}"),
        }
    }

    pub fn try_new(
        registrations: impl IntoIterator<Item = Registration>,
    ) -> Result<Self, RegistryError> {
        let mut encoders = HashMap::new();
        let mut tags: HashMap<TypeId, &'static str> = HashMap::new();
        let mut kind_names: HashMap<&'static str, TypeId> = HashMap::new();
        let mut tables: Tables = HashMap::new();

        for registration in registrations {
            let Registration {
                event_type,
                event,
                event_name,
                kind,
                aggregate,
                variant,
                encode,
                install,
            } = registration;

            if encoders.contains_key(event_type) {
                return Err(RegistryError::DuplicateEventType(event_type.to_string()));
            }
            if let Some(first) = tags.insert(event, event_type) {
                return Err(RegistryError::ConflictingTags {
                    event: event_name.to_string(),
                    first: first.to_string(),
                    second: event_type.to_string(),
                });
            }
            match kind_names.entry(kind) {
                Entry::Occupied(existing) if *existing.get() != aggregate => {
                    return Err(RegistryError::DuplicateAggregateKind(kind.to_string()));
                }
                Entry::Occupied(_) => {}
                Entry::Vacant(slot) => {
                    slot.insert(aggregate);
                }
            }

            encoders.insert(
                event_type,
                EncoderEntry {
                    kind,
                    variant,
                    encode,
                },
            );
            install(&mut tables);
        }

        let kinds = tables
            .into_iter()
            .map(|(aggregate, table)| (aggregate, table.seal()))
            .collect();

        debug!(
            event_types = encoders.len(),
            aggregate_kinds = kind_names.len(),
            "schema registry built"
        );

        Ok(Self {
            encoders,
            tags,
            kinds,
        })
    }

    /// Encode an event into its persisted record form.
    ///
    /// # Panics
    ///
    /// Panics if the event's tag is not registered, or is registered for another type.
    pub fn encode<E: Event>(&self, data: &EventData<E>) -> Value {
        match self.try_encode(data) {
            Ok(record) => record,
            Err(e) => panic!("{e}"),
        }
    }

    pub fn try_encode<E: Event>(&self, data: &EventData<E>) -> Result<Value, RegistryError> {
        let (event_type, entry) = self.entry_for(&data.event)?;
        (entry.encode)(data as &dyn Any)
            .ok_or_else(|| RegistryError::UnknownEventType(event_type.to_string()))
    }

    /// The variant `event` was registered as, checking that the tag it reports is
    /// the one it was registered under.
    pub fn resolve<E: Event>(&self, event: &E) -> Result<EventVariant, RegistryError> {
        self.entry_for(event).map(|(_, entry)| entry.variant)
    }

    fn entry_for<E: Event>(
        &self,
        event: &E,
    ) -> Result<(&'static str, &EncoderEntry), RegistryError> {
        let reported = event.event_type();
        let Some(&registered) = self.tags.get(&TypeId::of::<E>()) else {
            return Err(RegistryError::UnknownEventType(reported.to_string()));
        };
        if registered != reported {
            return Err(RegistryError::EventTypeMismatch {
                registered: registered.to_string(),
                reported: reported.to_string(),
            });
        }
        self.encoders
            .get(registered)
            .map(|entry| (registered, entry))
            .ok_or_else(|| RegistryError::UnknownEventType(registered.to_string()))
    }

    /// Replay `records` (ordered by increasing version) into the current aggregate.
    ///
    /// Failure paths start with the index of the offending record.
    ///
    /// # Panics
    ///
    /// Panics if no event of aggregate kind `A` was registered.
    #[instrument(level = "debug", skip_all, fields(kind = A::KIND, records = records.len()))]
    pub fn hydrate<A: Aggregate>(&self, records: &[Value]) -> DecodeResult<Hydrated<A>> {
        let decoders = self.decoders::<A>();

        let Some((first, rest)) = records.split_first() else {
            return Err(DecodeError::new("No events"));
        };

        let created = decoders.creation.run(first).map_err(|e| e.at_index(0))?;
        let transformations = rest
            .iter()
            .enumerate()
            .map(|(idx, record)| {
                decoders
                    .transformation
                    .run(record)
                    .map_err(|e| e.at_index(idx + 1))
            })
            .collect::<DecodeResult<Vec<_>>>()?;

        let mut aggregate = created.event.create_aggregate();
        let mut last_event = created.envelope;
        for transformation in transformations {
            aggregate = transformation.event.transform_aggregate(aggregate);
            last_event = transformation.envelope;
        }

        Ok(Hydrated {
            aggregate,
            last_event,
        })
    }

    /// Decode one record against kind `A`'s creation union.
    pub fn decode_creation<A: Aggregate>(
        &self,
        record: &Value,
    ) -> DecodeResult<EventData<BoxedCreation<A>>> {
        self.decoders::<A>().creation.run(record)
    }

    /// Decode one record against kind `A`'s transformation union.
    pub fn decode_transformation<A: Aggregate>(
        &self,
        record: &Value,
    ) -> DecodeResult<EventData<BoxedTransformation<A>>> {
        self.decoders::<A>().transformation.run(record)
    }

    pub fn knows<A: Aggregate>(&self) -> bool {
        self.kinds.contains_key(&TypeId::of::<A>())
    }

    pub fn variant_of(&self, event_type: &str) -> Option<EventVariant> {
        self.encoders.get(event_type).map(|entry| entry.variant)
    }

    pub fn kind_of(&self, event_type: &str) -> Option<&'static str> {
        self.encoders.get(event_type).map(|entry| entry.kind)
    }

    /// Every registered tag, sorted.
    pub fn event_types(&self) -> Vec<&'static str> {
        let mut tags: Vec<&'static str> = self.encoders.keys().copied().collect();
        tags.sort_unstable();
        tags
    }

    fn decoders<A: Aggregate>(&self) -> &KindDecoders<A> {
        match self
            .kinds
            .get(&TypeId::of::<A>())
            .and_then(|decoders| decoders.downcast_ref::<KindDecoders<A>>())
        {
            Some(decoders) => decoders,
            None => panic!("{}", RegistryError::UnknownAggregate(A::KIND.to_string())),
        }
    }
}

impl core::fmt::Debug for SchemaRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SchemaRegistry")
            .field("event_types", &self.event_types())
            .field("aggregate_kinds", &self.kinds.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use strata_codec::schema;
    use strata_core::Id;

    #[derive(Debug, Clone, PartialEq)]
    struct Counter {
        id: Id<Counter>,
        version: u64,
        total: i64,
    }

    impl Aggregate for Counter {
        const KIND: &'static str = "Counter";

        fn id(&self) -> &Id<Self> {
            &self.id
        }

        fn version(&self) -> u64 {
            self.version
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Opened {
        aggregate_id: Id<Counter>,
        start: i64,
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Added {
        aggregate_id: Id<Counter>,
        amount: i64,
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Doubled {
        aggregate_id: Id<Counter>,
    }

    impl Event for Opened {
        type Aggregate = Counter;
        fn event_type(&self) -> &'static str {
            "CounterOpened"
        }
        fn aggregate_id(&self) -> &Id<Counter> {
            &self.aggregate_id
        }
    }

    impl CreationEvent for Opened {
        fn create_aggregate(&self) -> Counter {
            Counter {
                id: self.aggregate_id.clone(),
                version: 1,
                total: self.start,
            }
        }
    }

    impl Event for Added {
        type Aggregate = Counter;
        fn event_type(&self) -> &'static str {
            "CounterAdded"
        }
        fn aggregate_id(&self) -> &Id<Counter> {
            &self.aggregate_id
        }
    }

    impl TransformationEvent for Added {
        fn transform_aggregate(&self, counter: Counter) -> Counter {
            Counter {
                version: counter.version + 1,
                total: counter.total + self.amount,
                ..counter
            }
        }
    }

    impl Event for Doubled {
        type Aggregate = Counter;
        fn event_type(&self) -> &'static str {
            "CounterDoubled"
        }
        fn aggregate_id(&self) -> &Id<Counter> {
            &self.aggregate_id
        }
    }

    impl TransformationEvent for Doubled {
        fn transform_aggregate(&self, counter: Counter) -> Counter {
            Counter {
                version: counter.version + 1,
                total: counter.total * 2,
                ..counter
            }
        }
    }

    fn opened() -> Schema<Opened> {
        schema::record(
            |r| {
                Ok(Opened {
                    aggregate_id: r.field("aggregate_id", &Id::schema())?,
                    start: r.field("start", &schema::integer())?,
                })
            },
            |w, e: &Opened| {
                w.field("type", &schema::literal("CounterOpened"), &"CounterOpened")
                    .field("aggregate_id", &Id::schema(), &e.aggregate_id)
                    .field("start", &schema::integer(), &e.start);
            },
        )
    }

    fn added() -> Schema<Added> {
        schema::record(
            |r| {
                Ok(Added {
                    aggregate_id: r.field("aggregate_id", &Id::schema())?,
                    amount: r.field("amount", &schema::integer())?,
                })
            },
            |w, e: &Added| {
                w.field("type", &schema::literal("CounterAdded"), &"CounterAdded")
                    .field("aggregate_id", &Id::schema(), &e.aggregate_id)
                    .field("amount", &schema::integer(), &e.amount);
            },
        )
    }

    fn doubled() -> Schema<Doubled> {
        schema::record(
            |r| {
                Ok(Doubled {
                    aggregate_id: r.field("aggregate_id", &Id::schema())?,
                })
            },
            |w, e: &Doubled| {
                w.field("type", &schema::literal("CounterDoubled"), &"CounterDoubled")
                    .field("aggregate_id", &Id::schema(), &e.aggregate_id);
            },
        )
    }

    fn registry() -> SchemaRegistry {
        SchemaRegistry::new([
            Registration::creation("CounterOpened", opened()),
            Registration::transformation("CounterAdded", added()),
            Registration::transformation("CounterDoubled", doubled()),
        ])
    }

    fn record(version: u64, payload: Value) -> Value {
        json!({
            "event_id": format!("evt-{version}"),
            "aggregate_id": "c-1",
            "aggregate_version": version,
            "correlation_id": "evt-1",
            "causation_id": format!("evt-{}", version.saturating_sub(1).max(1)),
            "recorded_on": "2025-10-25T20:55:11.880Z",
            "json_payload": payload.to_string()
        })
    }

    fn history() -> Vec<Value> {
        vec![
            record(1, json!({ "type": "CounterOpened", "aggregate_id": "c-1", "start": 1 })),
            record(2, json!({ "type": "CounterAdded", "aggregate_id": "c-1", "amount": 5 })),
            record(3, json!({ "type": "CounterDoubled", "aggregate_id": "c-1" })),
        ]
    }

    #[test]
    fn hydrate_folds_in_order() {
        let hydrated = registry().hydrate::<Counter>(&history()).unwrap();
        assert_eq!(hydrated.aggregate.total, 12);
        assert_eq!(hydrated.aggregate.version, 3);
        assert_eq!(hydrated.last_event.aggregate_version(), 3);
        assert_eq!(hydrated.last_event.event_id().as_str(), "evt-3");
    }

    #[test]
    fn hydrate_is_deterministic() {
        let registry = registry();
        let a = registry.hydrate::<Counter>(&history()).unwrap();
        let b = registry.hydrate::<Counter>(&history()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn hydrate_trusts_caller_order() {
        let mut records = history();
        records.swap(1, 2);
        let hydrated = registry().hydrate::<Counter>(&records).unwrap();
        assert_eq!(hydrated.aggregate.total, 7);
        assert_eq!(hydrated.last_event.aggregate_version(), 2);
        assert_eq!(hydrated.aggregate.version, 3);
    }

    #[test]
    fn hydrate_rejects_empty_input() {
        let err = registry().hydrate::<Counter>(&[]).unwrap_err();
        assert_eq!(err.message(), "No events");
        assert!(err.path().is_root());
    }

    #[test]
    fn hydrate_reports_the_failing_record() {
        let mut records = history();
        records[2] = record(3, json!({ "type": "CounterHalved", "aggregate_id": "c-1" }));
        let err = registry().hydrate::<Counter>(&records).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unknown event type: CounterHalved. When parsing: 2.json_payload"
        );

        let mut records = history();
        records[1] = record(2, json!({ "type": "CounterAdded", "aggregate_id": "c-1", "amount": "5" }));
        let err = registry().hydrate::<Counter>(&records).unwrap_err();
        assert_eq!(err.path().to_string(), "1.json_payload.amount");
    }

    #[test]
    fn first_record_must_be_a_creation() {
        let records = vec![history().remove(1)];
        let err = registry().hydrate::<Counter>(&records).unwrap_err();
        assert_eq!(err.message(), "Unknown event type: CounterAdded");

        let mut records = history();
        records.push(history().remove(0));
        let err = registry().hydrate::<Counter>(&records).unwrap_err();
        assert_eq!(err.path().to_string(), "3.json_payload");
    }

    #[test]
    fn duplicate_tags_are_rejected() {
        let err = SchemaRegistry::try_new([
            Registration::creation("CounterOpened", opened()),
            Registration::transformation("CounterOpened", added()),
        ])
        .unwrap_err();
        assert_eq!(err, RegistryError::DuplicateEventType("CounterOpened".into()));
    }

    #[test]
    #[should_panic(expected = "Duplicate entry for CounterAdded")]
    fn duplicate_tags_panic_at_construction() {
        let _ = SchemaRegistry::new([
            Registration::transformation("CounterAdded", added()),
            Registration::transformation("CounterAdded", added()),
        ]);
    }

    fn envelope(version: u64) -> Envelope {
        Envelope::new(
            Id::new(format!("evt-{version}")),
            Id::new("c-1"),
            version,
            Id::new("evt-1"),
            Id::new("evt-1"),
            crate::time::parse_utc("2025-10-25T20:55:11.880Z").unwrap(),
        )
    }

    #[test]
    fn encoded_records_hydrate() {
        let registry = registry();
        let id: Id<Counter> = Id::new("c-1");
        let records = vec![
            registry.encode(&EventData::new(
                envelope(1),
                Opened {
                    aggregate_id: id.clone(),
                    start: 2,
                },
            )),
            registry.encode(&EventData::new(
                envelope(2),
                Added {
                    aggregate_id: id.clone(),
                    amount: 3,
                },
            )),
        ];
        assert!(records[0]["json_payload"].is_string());
        let hydrated = registry.hydrate::<Counter>(&records).unwrap();
        assert_eq!(hydrated.aggregate.total, 5);
        assert_eq!(hydrated.last_event, envelope(2));
    }

    #[test]
    #[should_panic(expected = "Unknown event type CounterDoubled")]
    fn encoding_an_unregistered_tag_panics() {
        let registry = SchemaRegistry::new([Registration::creation("CounterOpened", opened())]);
        registry.encode(&EventData::new(
            envelope(2),
            Doubled {
                aggregate_id: Id::new("c-1"),
            },
        ));
    }

    #[test]
    fn try_encode_reports_unknown_tags() {
        let registry = SchemaRegistry::new([Registration::creation("CounterOpened", opened())]);
        let err = registry
            .try_encode(&EventData::new(
                envelope(2),
                Doubled {
                    aggregate_id: Id::new("c-1"),
                },
            ))
            .unwrap_err();
        assert_eq!(err, RegistryError::UnknownEventType("CounterDoubled".into()));
    }

    /// Reports a tag other than the one it is registered under below.
    #[derive(Debug, Clone, PartialEq)]
    struct Mislabelled {
        aggregate_id: Id<Counter>,
    }

    impl Event for Mislabelled {
        type Aggregate = Counter;
        fn event_type(&self) -> &'static str {
            "CounterReset"
        }
        fn aggregate_id(&self) -> &Id<Counter> {
            &self.aggregate_id
        }
    }

    impl TransformationEvent for Mislabelled {
        fn transform_aggregate(&self, counter: Counter) -> Counter {
            counter
        }
    }

    fn mislabelled() -> Schema<Mislabelled> {
        schema::record(
            |r| {
                Ok(Mislabelled {
                    aggregate_id: r.field("aggregate_id", &Id::schema())?,
                })
            },
            |w, e: &Mislabelled| {
                w.field("aggregate_id", &Id::schema(), &e.aggregate_id);
            },
        )
    }

    #[test]
    fn reported_tag_must_match_the_registered_one() {
        let registry = SchemaRegistry::new([
            Registration::creation("CounterOpened", opened()),
            Registration::transformation("CounterCleared", mislabelled()),
        ]);
        let event = Mislabelled {
            aggregate_id: Id::new("c-1"),
        };
        let expected = RegistryError::EventTypeMismatch {
            registered: "CounterCleared".into(),
            reported: "CounterReset".into(),
        };
        assert_eq!(registry.resolve(&event).unwrap_err(), expected);
        assert_eq!(
            registry.try_encode(&EventData::new(envelope(2), event)).unwrap_err(),
            expected
        );
        assert_eq!(
            registry
                .resolve(&Added {
                    aggregate_id: Id::new("c-1"),
                    amount: 1,
                })
                .unwrap_err(),
            RegistryError::UnknownEventType("CounterAdded".into())
        );
    }

    #[test]
    fn one_event_type_cannot_take_two_tags() {
        let err = SchemaRegistry::try_new([
            Registration::transformation("CounterAdded", added()),
            Registration::transformation("CounterIncremented", added()),
        ])
        .unwrap_err();
        assert!(matches!(
            err,
            RegistryError::ConflictingTags { ref first, ref second, .. }
                if first == "CounterAdded" && second == "CounterIncremented"
        ));
    }

    #[test]
    fn decodes_single_records_by_variant() {
        let registry = registry();
        let records = history();

        let created = registry.decode_creation::<Counter>(&records[0]).unwrap();
        assert_eq!(created.envelope.aggregate_version(), 1);
        assert_eq!(created.event.create_aggregate().total, 1);

        let added = registry.decode_transformation::<Counter>(&records[1]).unwrap();
        assert_eq!(added.envelope.event_id().as_str(), "evt-2");
        let counter = added.event.transform_aggregate(created.event.create_aggregate());
        assert_eq!((counter.total, counter.version), (6, 2));

        let err = registry.decode_creation::<Counter>(&records[1]).unwrap_err();
        assert_eq!(err.to_string(), "Unknown event type: CounterAdded. When parsing: json_payload");
        assert!(registry.decode_transformation::<Counter>(&records[0]).is_err());
    }

    #[derive(Debug, Clone)]
    struct Other {
        id: Id<Other>,
    }

    impl Aggregate for Other {
        const KIND: &'static str = "Other";

        fn id(&self) -> &Id<Self> {
            &self.id
        }

        fn version(&self) -> u64 {
            0
        }
    }

    #[test]
    #[should_panic(expected = "Unknown aggregate Other")]
    fn hydrating_an_unregistered_kind_panics() {
        let _ = registry().hydrate::<Other>(&history());
    }

    #[test]
    fn describes_registered_types() {
        let registry = registry();
        assert_eq!(
            registry.event_types(),
            vec!["CounterAdded", "CounterDoubled", "CounterOpened"]
        );
        assert_eq!(registry.variant_of("CounterOpened"), Some(EventVariant::Creation));
        assert_eq!(registry.variant_of("CounterAdded"), Some(EventVariant::Transformation));
        assert_eq!(registry.variant_of("Nope"), None);
        assert_eq!(registry.kind_of("CounterDoubled"), Some("Counter"));
        assert!(registry.knows::<Counter>());
        assert!(!registry.knows::<Other>());
    }

    #[test]
    fn shared_registry_hydrates_from_many_threads() {
        let registry = Arc::new(registry());
        let records = history();
        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| scope.spawn(|| registry.hydrate::<Counter>(&records).unwrap()))
                .collect();
            for handle in handles {
                assert_eq!(handle.join().unwrap().aggregate.total, 12);
            }
        });
    }
}
