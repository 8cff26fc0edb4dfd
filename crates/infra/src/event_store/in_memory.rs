use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, SubsecRound, Utc};
use serde_json::Value;
use strata_core::{Aggregate, EventId, Id};
use strata_events::{
    Envelope, Event, EventData, EventVariant, Hydrated, RegistryError, SchemaRegistry,
};
use tracing::{info, instrument, warn};

use super::r#trait::{Emit, EventStore, EventStoreError};

type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct StreamKey {
    kind: &'static str,
    aggregate_id: String,
}

impl StreamKey {
    fn of<A: Aggregate>(id: &Id<A>) -> Self {
        Self {
            kind: A::KIND,
            aggregate_id: id.as_str().to_string(),
        }
    }
}

#[derive(Debug, Default)]
struct State {
    streams: HashMap<StreamKey, Vec<Value>>,
    event_ids: HashSet<String>,
}

/// In-memory event store.
///
/// Intended for tests/dev. Records are kept in their persisted (encoded) form
/// and every read goes through the registry, so the full codec path is exercised.
/// `emit` holds the write lock from version lookup to append, which serialises
/// concurrent writers.
pub struct InMemoryEventStore {
    registry: Arc<SchemaRegistry>,
    clock: Clock,
    state: RwLock<State>,
}

impl InMemoryEventStore {
    pub fn new(registry: Arc<SchemaRegistry>) -> Self {
        Self {
            registry,
            clock: Arc::new(Utc::now),
            state: RwLock::new(State::default()),
        }
    }

    /// Replace the `recorded_on` source.
    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> DateTime<Utc> + Send + Sync + 'static,
    {
        self.clock = Arc::new(clock);
        self
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Encoded records of one stream, in append order.
    pub fn records<A: Aggregate>(&self, id: &Id<A>) -> Result<Vec<Value>, EventStoreError> {
        let state = self.read()?;
        Ok(state
            .streams
            .get(&StreamKey::of(id))
            .cloned()
            .unwrap_or_default())
    }

    /// Number of events recorded for `id` (0 if the stream does not exist).
    pub fn stream_version<A: Aggregate>(&self, id: &Id<A>) -> Result<u64, EventStoreError> {
        let state = self.read()?;
        Ok(state
            .streams
            .get(&StreamKey::of(id))
            .map_or(0, |stream| stream.len() as u64))
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, State>, EventStoreError> {
        self.state
            .read()
            .map_err(|_| EventStoreError::Storage("lock poisoned".to_string()))
    }

    fn assert_known<A: Aggregate>(&self) {
        if !self.registry.knows::<A>() {
            panic!("{}", RegistryError::UnknownAggregate(A::KIND.to_string()));
        }
    }
}

impl core::fmt::Debug for InMemoryEventStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("InMemoryEventStore")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl EventStore for InMemoryEventStore {
    fn find_hydrated<A: Aggregate>(
        &self,
        id: &Id<A>,
    ) -> Result<Option<Hydrated<A>>, EventStoreError> {
        self.assert_known::<A>();
        let records = {
            let state = self.read()?;
            state.streams.get(&StreamKey::of(id)).cloned()
        };
        match records {
            Some(records) => Ok(Some(self.registry.hydrate::<A>(&records)?)),
            None => Ok(None),
        }
    }

    #[instrument(
        level = "debug",
        skip_all,
        fields(event_type = emit.event.event_type(), aggregate_id = %emit.event.aggregate_id())
    )]
    fn emit<E: Event>(&self, emit: Emit<E>) -> Result<EventData<E>, EventStoreError> {
        let Emit {
            event,
            event_id,
            correlation_id,
            causation_id,
            expected_version,
        } = emit;
        let event_type = event.event_type();
        let kind = <E::Aggregate as Aggregate>::KIND;

        let variant = match self.registry.resolve(&event) {
            Ok(variant) => variant,
            Err(e) => panic!("{e}"),
        };

        let event_id: EventId = event_id.unwrap_or_else(Id::random);
        let correlation_id = correlation_id.unwrap_or_else(|| event_id.clone());
        let causation_id = causation_id.unwrap_or_else(|| event_id.clone());
        let key = StreamKey::of(event.aggregate_id());

        let mut state = self
            .state
            .write()
            .map_err(|_| EventStoreError::Storage("lock poisoned".to_string()))?;

        if state.event_ids.contains(event_id.as_str()) {
            warn!(%event_id, "rejected duplicate event id");
            return Err(EventStoreError::DuplicateEvent(event_id.into_string()));
        }

        let current = state.streams.get(&key).map_or(0, |stream| stream.len() as u64);

        expected_version.check(current).inspect_err(|_| {
            warn!(?expected_version, current, "rejected stale emit");
        })?;

        match variant {
            EventVariant::Creation if current > 0 => {
                warn!(kind, current, "rejected creation on existing stream");
                return Err(EventStoreError::AlreadyExists(format!(
                    "{kind} {}",
                    key.aggregate_id
                )));
            }
            EventVariant::Transformation if current == 0 => {
                warn!(kind, "rejected transformation on missing stream");
                return Err(EventStoreError::NotFound(format!("{kind} {}", key.aggregate_id)));
            }
            _ => {}
        }

        let envelope = Envelope::new(
            event_id.clone(),
            event.aggregate_id().cast(),
            current + 1,
            correlation_id,
            causation_id,
            (self.clock)().trunc_subsecs(3),
        );
        let data = EventData::new(envelope, event);

        let record = match self.registry.try_encode(&data) {
            Ok(record) => record,
            Err(e) => {
                drop(state);
                panic!("{e}");
            }
        };

        state.streams.entry(key).or_default().push(record);
        state.event_ids.insert(event_id.into_string());
        drop(state);

        info!(
            event_type,
            kind,
            version = data.envelope.aggregate_version(),
            "event emitted"
        );
        Ok(data)
    }

    fn does_event_already_exist(&self, event_id: &EventId) -> Result<bool, EventStoreError> {
        Ok(self.read()?.event_ids.contains(event_id.as_str()))
    }
}
