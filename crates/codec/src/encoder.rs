//! Encoders: serialize typed values back into untyped JSON.
//!
//! An encoder may produce "absent" (`None` from [`Encoder::run_field`]). Record and
//! object-map encoders omit absent fields; every other context renders absence as
//! `null`.

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use serde_json::{Map, Number, Value};

type Run<T> = dyn Fn(&T) -> Option<Value> + Send + Sync;

/// A pure function from a typed value to an untyped value.
pub struct Encoder<T> {
    run: Arc<Run<T>>,
}

impl<T> Clone for Encoder<T> {
    fn clone(&self) -> Self {
        Self {
            run: Arc::clone(&self.run),
        }
    }
}

impl<T> core::fmt::Debug for Encoder<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("Encoder")
    }
}

impl<T: 'static> Encoder<T> {
    pub fn new<F>(run: F) -> Self
    where
        F: Fn(&T) -> Value + Send + Sync + 'static,
    {
        Self::from_optional(move |value| Some(run(value)))
    }

    /// Encoder that may report the value as absent (`None`).
    pub fn from_optional<F>(run: F) -> Self
    where
        F: Fn(&T) -> Option<Value> + Send + Sync + 'static,
    {
        Self { run: Arc::new(run) }
    }

    pub fn run(&self, value: &T) -> Value {
        self.run_field(value).unwrap_or(Value::Null)
    }

    pub fn run_field(&self, value: &T) -> Option<Value> {
        (self.run)(value)
    }

    /// Adapt the input type: `f` runs first, then `self`.
    pub fn contramap<W, F>(&self, f: F) -> Encoder<W>
    where
        W: 'static,
        F: Fn(&W) -> T + Send + Sync + 'static,
    {
        let inner = self.clone();
        Encoder::from_optional(move |value| inner.run_field(&f(value)))
    }

    /// Self-referential encoder, bound the same way as [`Decoder::recursive`](crate::Decoder::recursive).
    ///
    /// # Panics
    ///
    /// The placeholder panics if it is invoked before `build` has returned.
    pub fn recursive<F>(build: F) -> Encoder<T>
    where
        F: FnOnce(Encoder<T>) -> Encoder<T>,
    {
        let cell: Arc<OnceLock<Encoder<T>>> = Arc::new(OnceLock::new());
        let weak = Arc::downgrade(&cell);
        let placeholder = Encoder::from_optional(move |value| {
            match weak.upgrade().as_deref().and_then(OnceLock::get) {
                Some(real) => real.run_field(value),
                None => panic!("{UNBOUND_RECURSION}"),
            }
        });

        let real = build(placeholder);
        let _ = cell.set(real);

        Encoder::from_optional(move |value| match cell.get() {
            Some(real) => real.run_field(value),
            None => panic!("{UNBOUND_RECURSION}"),
        })
    }
}

pub(crate) const UNBOUND_RECURSION: &str = "A recursive encoder cannot immediately call itself.";

/// Anything that can lend an encoder (plain encoders and schemas).
pub trait AsEncoder<T> {
    fn as_encoder(&self) -> &Encoder<T>;
}

impl<T> AsEncoder<T> for Encoder<T> {
    fn as_encoder(&self) -> &Encoder<T> {
        self
    }
}

pub fn json() -> Encoder<Value> {
    Encoder::new(Value::clone)
}

pub fn string() -> Encoder<String> {
    Encoder::new(|s: &String| Value::String(s.clone()))
}

/// Non-finite numbers have no JSON form and encode as `null`.
pub fn number() -> Encoder<f64> {
    Encoder::new(|n: &f64| Number::from_f64(*n).map(Value::Number).unwrap_or(Value::Null))
}

pub fn integer() -> Encoder<i64> {
    Encoder::new(|n: &i64| Value::from(*n))
}

pub fn unsigned() -> Encoder<u64> {
    Encoder::new(|n: &u64| Value::from(*n))
}

pub fn string_number() -> Encoder<i64> {
    Encoder::new(|n: &i64| Value::String(n.to_string()))
}

pub fn boolean() -> Encoder<bool> {
    Encoder::new(|b: &bool| Value::Bool(*b))
}

pub fn null() -> Encoder<()> {
    Encoder::new(|_: &()| Value::Null)
}

pub fn undefined() -> Encoder<()> {
    Encoder::from_optional(|_: &()| None)
}

/// # Panics
///
/// Panics when asked to encode anything other than `expected`.
pub fn literal(expected: &'static str) -> Encoder<&'static str> {
    Encoder::new(move |value: &&'static str| {
        if *value != expected {
            panic!("Cannot encode '{value}'. Expected literal '{expected}'");
        }
        Value::String(expected.to_string())
    })
}

/// # Panics
///
/// Panics when asked to encode a string outside `allowed`.
pub fn string_enum(allowed: &'static [&'static str]) -> Encoder<&'static str> {
    Encoder::new(move |value: &&'static str| {
        if !allowed.contains(value) {
            panic!(
                "Cannot encode '{value}'. Expected one of '{}'",
                allowed.join(", ")
            );
        }
        Value::String((*value).to_string())
    })
}

/// Write access to the object being built by [`record`].
#[derive(Debug, Default)]
pub struct FieldWriter {
    object: Map<String, Value>,
}

impl FieldWriter {
    /// Encode `value` under `name`. Absent values leave the key out.
    pub fn field<T: 'static>(
        &mut self,
        name: &str,
        encoder: &impl AsEncoder<T>,
        value: &T,
    ) -> &mut Self {
        if let Some(encoded) = encoder.as_encoder().run_field(value) {
            self.object.insert(name.to_string(), encoded);
        }
        self
    }

    pub fn into_object(self) -> Map<String, Value> {
        self.object
    }
}

pub fn record<T, F>(write: F) -> Encoder<T>
where
    T: 'static,
    F: Fn(&mut FieldWriter, &T) + Send + Sync + 'static,
{
    Encoder::new(move |value| {
        let mut writer = FieldWriter::default();
        write(&mut writer, value);
        Value::Object(writer.into_object())
    })
}

pub fn object_map<T: 'static>(values: Encoder<T>) -> Encoder<BTreeMap<String, T>> {
    Encoder::new(move |map: &BTreeMap<String, T>| {
        Value::Object(
            map.iter()
                .filter_map(|(key, value)| values.run_field(value).map(|v| (key.clone(), v)))
                .collect(),
        )
    })
}

pub fn array<T: 'static>(items: Encoder<T>) -> Encoder<Vec<T>> {
    Encoder::new(move |elements: &Vec<T>| Value::Array(elements.iter().map(|e| items.run(e)).collect()))
}

pub fn pair<A, B>(first: Encoder<A>, second: Encoder<B>) -> Encoder<(A, B)>
where
    A: 'static,
    B: 'static,
{
    Encoder::new(move |(a, b): &(A, B)| Value::Array(vec![first.run(a), second.run(b)]))
}

pub fn triple<A, B, C>(first: Encoder<A>, second: Encoder<B>, third: Encoder<C>) -> Encoder<(A, B, C)>
where
    A: 'static,
    B: 'static,
    C: 'static,
{
    Encoder::new(move |(a, b, c): &(A, B, C)| {
        Value::Array(vec![first.run(a), second.run(b), third.run(c)])
    })
}

/// `None` is absent.
pub fn optional<T: 'static>(encoder: Encoder<T>) -> Encoder<Option<T>> {
    Encoder::from_optional(move |value: &Option<T>| value.as_ref().and_then(|v| encoder.run_field(v)))
}

/// `None` is `null`.
pub fn nullable<T: 'static>(encoder: Encoder<T>) -> Encoder<Option<T>> {
    Encoder::new(move |value: &Option<T>| match value {
        Some(v) => encoder.run(v),
        None => Value::Null,
    })
}

/// `None` is `null`.
pub fn maybe<T: 'static>(encoder: Encoder<T>) -> Encoder<Option<T>> {
    nullable(encoder)
}

/// Merge the objects produced by both encoders; keys from `right` win.
pub fn both<A, B>(left: Encoder<A>, right: Encoder<B>) -> Encoder<(A, B)>
where
    A: 'static,
    B: 'static,
{
    Encoder::new(move |(a, b): &(A, B)| {
        let mut merged = Map::new();
        for encoded in [left.run_field(a), right.run_field(b)] {
            if let Some(Value::Object(fields)) = encoded {
                merged.extend(fields);
            }
        }
        Value::Object(merged)
    })
}

/// Encode with whichever encoder `select` picks for the value.
pub fn one_of<T, F>(select: F) -> Encoder<T>
where
    T: 'static,
    F: Fn(&T) -> Encoder<T> + Send + Sync + 'static,
{
    Encoder::from_optional(move |value| select(value).run_field(value))
}
