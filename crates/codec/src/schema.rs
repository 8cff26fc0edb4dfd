//! Schemas: a decoder and its inverse encoder for one type.
//!
//! Every schema obeys the round-trip law: for any `v` produced by `decode`,
//! `decode(encode(v))` succeeds and yields a value equal to `v`.

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use serde_json::Value;

use crate::decoder::{self, AsDecoder, Decoder, Fields};
use crate::encoder::{self, AsEncoder, Encoder, FieldWriter};
use crate::error::{DecodeError, DecodeResult};

pub struct Schema<T> {
    decoder: Decoder<T>,
    encoder: Encoder<T>,
}

impl<T> Clone for Schema<T> {
    fn clone(&self) -> Self {
        Self {
            decoder: self.decoder.clone(),
            encoder: self.encoder.clone(),
        }
    }
}

impl<T> core::fmt::Debug for Schema<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("Schema")
    }
}

impl<T: 'static> Schema<T> {
    pub fn new(decoder: Decoder<T>, encoder: Encoder<T>) -> Self {
        Self { decoder, encoder }
    }

    pub fn decoder(&self) -> &Decoder<T> {
        &self.decoder
    }

    pub fn encoder(&self) -> &Encoder<T> {
        &self.encoder
    }

    pub fn into_parts(self) -> (Decoder<T>, Encoder<T>) {
        (self.decoder, self.encoder)
    }

    pub fn decode(&self, input: &Value) -> DecodeResult<T> {
        self.decoder.run(input)
    }

    pub fn encode(&self, value: &T) -> Value {
        self.encoder.run(value)
    }

    /// Independent transforms in both directions, typically wrapping and
    /// unwrapping a newtype.
    pub fn dimap<W, F, B>(&self, forward: F, backward: B) -> Schema<W>
    where
        W: 'static,
        F: Fn(T) -> W + Send + Sync + 'static,
        B: Fn(&W) -> T + Send + Sync + 'static,
    {
        Schema::new(self.decoder.map(forward), self.encoder.contramap(backward))
    }

    /// Decode-then-dispatch paired with a fixed backward transform.
    pub fn then<W, F, B>(&self, forward: F, backward: B) -> Schema<W>
    where
        W: 'static,
        F: Fn(T) -> Decoder<W> + Send + Sync + 'static,
        B: Fn(&W) -> T + Send + Sync + 'static,
    {
        Schema::new(self.decoder.then(forward), self.encoder.contramap(backward))
    }

    /// Self-referential schema; see [`Decoder::recursive`].
    pub fn recursive<F>(build: F) -> Schema<T>
    where
        F: FnOnce(Schema<T>) -> Schema<T>,
    {
        let cell: Arc<OnceLock<Schema<T>>> = Arc::new(OnceLock::new());

        let weak = Arc::downgrade(&cell);
        let placeholder_decoder = Decoder::new(move |input| {
            match weak.upgrade().as_deref().and_then(OnceLock::get) {
                Some(real) => real.decoder.run_field(input),
                None => Err(DecodeError::new(decoder::UNBOUND_RECURSION)),
            }
        });
        let weak = Arc::downgrade(&cell);
        let placeholder_encoder = Encoder::from_optional(move |value| {
            match weak.upgrade().as_deref().and_then(OnceLock::get) {
                Some(real) => real.encoder.run_field(value),
                None => panic!("{}", encoder::UNBOUND_RECURSION),
            }
        });

        let real = build(Schema::new(placeholder_decoder, placeholder_encoder));
        let _ = cell.set(real);

        let decoding = Arc::clone(&cell);
        Schema::new(
            Decoder::new(move |input| match decoding.get() {
                Some(real) => real.decoder.run_field(input),
                None => Err(DecodeError::new(decoder::UNBOUND_RECURSION)),
            }),
            Encoder::from_optional(move |value| match cell.get() {
                Some(real) => real.encoder.run_field(value),
                None => panic!("{}", encoder::UNBOUND_RECURSION),
            }),
        )
    }
}

impl<T> AsDecoder<T> for Schema<T> {
    fn as_decoder(&self) -> &Decoder<T> {
        &self.decoder
    }
}

impl<T> AsEncoder<T> for Schema<T> {
    fn as_encoder(&self) -> &Encoder<T> {
        &self.encoder
    }
}

/// Accepts anything; encodes the value unchanged.
pub fn any() -> Schema<Value> {
    Schema::new(decoder::any(), encoder::json())
}

pub fn json() -> Schema<Value> {
    Schema::new(decoder::json(), encoder::json())
}

pub fn string() -> Schema<String> {
    Schema::new(decoder::string(), encoder::string())
}

pub fn number() -> Schema<f64> {
    Schema::new(decoder::number(), encoder::number())
}

pub fn integer() -> Schema<i64> {
    Schema::new(decoder::integer(), encoder::integer())
}

pub fn unsigned() -> Schema<u64> {
    Schema::new(decoder::unsigned(), encoder::unsigned())
}

pub fn string_number() -> Schema<i64> {
    Schema::new(decoder::string_number(), encoder::string_number())
}

pub fn boolean() -> Schema<bool> {
    Schema::new(decoder::boolean(), encoder::boolean())
}

pub fn null() -> Schema<()> {
    Schema::new(decoder::null(), encoder::null())
}

pub fn literal(expected: &'static str) -> Schema<&'static str> {
    Schema::new(decoder::literal(expected), encoder::literal(expected))
}

pub fn string_enum(allowed: &'static [&'static str]) -> Schema<&'static str> {
    Schema::new(decoder::string_enum(allowed), encoder::string_enum(allowed))
}

/// Fixed-shape record from a field reader and a field writer.
///
/// ```ignore
/// let point = schema::record(
///     |r| Ok(Point { x: r.field("x", &schema::number())?, y: r.field("y", &schema::number())? }),
///     |w, p: &Point| {
///         w.field("x", &schema::number(), &p.x).field("y", &schema::number(), &p.y);
///     },
/// );
/// ```
pub fn record<T, D, E>(read: D, write: E) -> Schema<T>
where
    T: 'static,
    D: Fn(&Fields<'_>) -> DecodeResult<T> + Send + Sync + 'static,
    E: Fn(&mut FieldWriter, &T) + Send + Sync + 'static,
{
    Schema::new(decoder::record(read), encoder::record(write))
}

pub fn array<T: 'static>(items: Schema<T>) -> Schema<Vec<T>> {
    let (d, e) = items.into_parts();
    Schema::new(decoder::array(d), encoder::array(e))
}

pub fn object_map<T: 'static>(values: Schema<T>) -> Schema<BTreeMap<String, T>> {
    let (d, e) = values.into_parts();
    Schema::new(decoder::object_map(d), encoder::object_map(e))
}

/// A string-keyed map persisted as an array of `[key, value]` pairs.
pub fn map<T: Clone + 'static>(values: Schema<T>) -> Schema<BTreeMap<String, T>> {
    array(pair(string(), values)).dimap(
        |entries| entries.into_iter().collect(),
        |map: &BTreeMap<String, T>| map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
    )
}

pub fn pair<A: 'static, B: 'static>(first: Schema<A>, second: Schema<B>) -> Schema<(A, B)> {
    let (da, ea) = first.into_parts();
    let (db, eb) = second.into_parts();
    Schema::new(decoder::pair(da, db), encoder::pair(ea, eb))
}

pub fn triple<A: 'static, B: 'static, C: 'static>(
    first: Schema<A>,
    second: Schema<B>,
    third: Schema<C>,
) -> Schema<(A, B, C)> {
    let (da, ea) = first.into_parts();
    let (db, eb) = second.into_parts();
    let (dc, ec) = third.into_parts();
    Schema::new(decoder::triple(da, db, dc), encoder::triple(ea, eb, ec))
}

pub fn optional<T: 'static>(inner: Schema<T>) -> Schema<Option<T>> {
    let (d, e) = inner.into_parts();
    Schema::new(decoder::optional(d), encoder::optional(e))
}

pub fn nullable<T: 'static>(inner: Schema<T>) -> Schema<Option<T>> {
    let (d, e) = inner.into_parts();
    Schema::new(decoder::nullable(d), encoder::nullable(e))
}

pub fn maybe<T: 'static>(inner: Schema<T>) -> Schema<Option<T>> {
    let (d, e) = inner.into_parts();
    Schema::new(decoder::maybe(d), encoder::maybe(e))
}

pub fn both<A: 'static, B: 'static>(left: Schema<A>, right: Schema<B>) -> Schema<(A, B)> {
    let (dl, el) = left.into_parts();
    let (dr, er) = right.into_parts();
    Schema::new(decoder::both(dl, dr), encoder::both(el, er))
}

/// Ordered union on decode; on encode, `select` names the alternative for a value.
pub fn one_of<T, F>(select: F, alternatives: Vec<Schema<T>>) -> Schema<T>
where
    T: 'static,
    F: Fn(&T) -> Schema<T> + Send + Sync + 'static,
{
    let decoders = alternatives.into_iter().map(|s| s.decoder).collect();
    Schema::new(
        decoder::one_of(decoders),
        encoder::one_of(move |value| select(value).encoder),
    )
}
