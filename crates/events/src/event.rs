use strata_core::{Aggregate, Id};

/// A recorded fact about one aggregate.
///
/// Events are:
/// - **immutable** (treat them as facts)
/// - **tagged**: `event_type` is the persisted discriminant and must be unique
///   across every registered event
/// - one of two variants, see [`CreationEvent`] and [`TransformationEvent`]
pub trait Event: core::fmt::Debug + Send + Sync + 'static {
    type Aggregate: Aggregate;

    /// Stable type tag (e.g. `"DocumentCreated"`), stored in the payload's `type` field.
    fn event_type(&self) -> &'static str;

    fn aggregate_id(&self) -> &Id<Self::Aggregate>;
}

/// The first event of a stream: produces the aggregate from nothing.
pub trait CreationEvent: Event {
    fn create_aggregate(&self) -> Self::Aggregate;
}

/// Any later event: maps the current aggregate to its next version.
pub trait TransformationEvent: Event {
    fn transform_aggregate(&self, aggregate: Self::Aggregate) -> Self::Aggregate;
}

/// Kind-erased creation event, as produced by per-kind union decoders.
pub type BoxedCreation<A> = Box<dyn CreationEvent<Aggregate = A>>;

/// Kind-erased transformation event.
pub type BoxedTransformation<A> = Box<dyn TransformationEvent<Aggregate = A>>;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum EventVariant {
    Creation,
    Transformation,
}
