//! Decoders: validate untyped JSON values into typed Rust values.
//!
//! A decoder sees `Option<&Value>`. `None` stands for the *undefined* marker, which is
//! what a record decoder hands to a field decoder when the key is missing. Failures
//! carry a [`Path`](crate::Path) that every enclosing combinator extends with its own
//! key or index before re-raising.

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use serde_json::{Map, Value};

use crate::error::{DecodeError, DecodeResult};

type Run<T> = dyn Fn(Option<&Value>) -> DecodeResult<T> + Send + Sync;

pub(crate) const UNBOUND_RECURSION: &str = "A recursive decoder cannot immediately call itself.";

/// A pure function from an untyped value to a decode outcome.
///
/// Cloning is cheap (shared function pointer), so complex decoders can be assembled
/// once and reused from many places and threads.
pub struct Decoder<T> {
    run: Arc<Run<T>>,
}

impl<T> Clone for Decoder<T> {
    fn clone(&self) -> Self {
        Self {
            run: Arc::clone(&self.run),
        }
    }
}

impl<T> core::fmt::Debug for Decoder<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("Decoder")
    }
}

impl<T: 'static> Decoder<T> {
    pub fn new<F>(run: F) -> Self
    where
        F: Fn(Option<&Value>) -> DecodeResult<T> + Send + Sync + 'static,
    {
        Self { run: Arc::new(run) }
    }

    pub fn run(&self, input: &Value) -> DecodeResult<T> {
        (self.run)(Some(input))
    }

    /// Run against a possibly-missing value (`None` = undefined).
    pub fn run_field(&self, input: Option<&Value>) -> DecodeResult<T> {
        (self.run)(input)
    }

    /// Run and render any failure as `"<message>. When parsing: <path>"`.
    pub fn decode(&self, input: &Value) -> Result<T, String> {
        self.run(input).map_err(|e| e.to_string())
    }

    pub fn map<U, F>(&self, f: F) -> Decoder<U>
    where
        U: 'static,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        let inner = self.clone();
        Decoder::new(move |input| inner.run_field(input).map(&f))
    }

    /// Dependent decoding: decode `self`, then pick the next decoder from the result
    /// and run it against the *same* input.
    pub fn then<U, F>(&self, f: F) -> Decoder<U>
    where
        U: 'static,
        F: Fn(T) -> Decoder<U> + Send + Sync + 'static,
    {
        let inner = self.clone();
        Decoder::new(move |input| {
            let decoded = inner.run_field(input)?;
            f(decoded).run_field(input)
        })
    }

    /// Define a self-referential decoder.
    ///
    /// `build` receives a placeholder that fails if invoked while the definition is
    /// still being built. Once `build` returns, the placeholder is rebound to delegate
    /// to the finished decoder, so recursion only happens at run time.
    pub fn recursive<F>(build: F) -> Decoder<T>
    where
        F: FnOnce(Decoder<T>) -> Decoder<T>,
    {
        let cell: Arc<OnceLock<Decoder<T>>> = Arc::new(OnceLock::new());

        // The placeholder only holds a weak handle so that the finished decoder does
        // not own itself.
        let weak = Arc::downgrade(&cell);
        let placeholder = Decoder::new(move |input| {
            match weak.upgrade().as_deref().and_then(OnceLock::get) {
                Some(real) => real.run_field(input),
                None => Err(DecodeError::new(UNBOUND_RECURSION)),
            }
        });

        let real = build(placeholder);
        let _ = cell.set(real);

        Decoder::new(move |input| match cell.get() {
            Some(real) => real.run_field(input),
            None => Err(DecodeError::new(UNBOUND_RECURSION)),
        })
    }
}

/// Anything that can lend a decoder (plain decoders and schemas).
pub trait AsDecoder<T> {
    fn as_decoder(&self) -> &Decoder<T>;
}

impl<T> AsDecoder<T> for Decoder<T> {
    fn as_decoder(&self) -> &Decoder<T> {
        self
    }
}

pub(crate) fn kind_of(input: Option<&Value>) -> &'static str {
    match input {
        None => "undefined",
        Some(Value::Null) => "null",
        Some(Value::Bool(_)) => "boolean",
        Some(Value::Number(_)) => "number",
        Some(Value::String(_)) => "string",
        Some(Value::Array(_)) => "array",
        Some(Value::Object(_)) => "object",
    }
}

fn mismatch(expected: &str, input: Option<&Value>) -> DecodeError {
    DecodeError::new(format!("expected {expected} but found {}", kind_of(input)))
}

fn describe(input: Option<&Value>) -> String {
    match input {
        None => "undefined".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

pub fn succeed<T>(value: T) -> Decoder<T>
where
    T: Clone + Send + Sync + 'static,
{
    Decoder::new(move |_| Ok(value.clone()))
}

pub fn fail<T: 'static>(message: impl Into<String>) -> Decoder<T> {
    let message = message.into();
    Decoder::new(move |_| Err(DecodeError::new(message.clone())))
}

/// Accepts anything. A missing value is reported as `null`.
pub fn any() -> Decoder<Value> {
    Decoder::new(|input| Ok(input.cloned().unwrap_or(Value::Null)))
}

pub fn string() -> Decoder<String> {
    Decoder::new(|input| match input {
        Some(Value::String(s)) => Ok(s.clone()),
        other => Err(mismatch("string", other)),
    })
}

pub fn number() -> Decoder<f64> {
    Decoder::new(|input| match input {
        Some(Value::Number(n)) => n.as_f64().ok_or_else(|| mismatch("number", input)),
        other => Err(mismatch("number", other)),
    })
}

pub fn integer() -> Decoder<i64> {
    Decoder::new(|input| match input {
        Some(Value::Number(n)) => n
            .as_i64()
            .ok_or_else(|| DecodeError::new(format!("expected integer but found {n}"))),
        other => Err(mismatch("integer", other)),
    })
}

pub fn unsigned() -> Decoder<u64> {
    Decoder::new(|input| match input {
        Some(Value::Number(n)) => n.as_u64().ok_or_else(|| {
            DecodeError::new(format!("expected non-negative integer but found {n}"))
        }),
        other => Err(mismatch("non-negative integer", other)),
    })
}

/// A string holding a base-10 integer, e.g. `"42"`.
pub fn string_number() -> Decoder<i64> {
    string().then(|s| match s.parse::<i64>() {
        Ok(v) => succeed(v),
        Err(_) => fail(format!("not a valid number: {s}")),
    })
}

pub fn boolean() -> Decoder<bool> {
    Decoder::new(|input| match input {
        Some(Value::Bool(b)) => Ok(*b),
        other => Err(mismatch("boolean", other)),
    })
}

pub fn null() -> Decoder<()> {
    Decoder::new(|input| match input {
        Some(Value::Null) => Ok(()),
        other => Err(mismatch("null", other)),
    })
}

pub fn undefined() -> Decoder<()> {
    Decoder::new(|input| match input {
        None => Ok(()),
        other => Err(mismatch("undefined", other)),
    })
}

/// Exact string match.
pub fn literal(expected: &'static str) -> Decoder<&'static str> {
    Decoder::new(move |input| match input {
        Some(Value::String(s)) if s == expected => Ok(expected),
        other => Err(DecodeError::new(format!(
            "expected '{expected}' but found '{}'",
            describe(other)
        ))),
    })
}

/// Exact match against one of `allowed`, tried in order.
pub fn string_enum(allowed: &'static [&'static str]) -> Decoder<&'static str> {
    one_of(allowed.iter().copied().map(literal).collect())
}

/// Any JSON value, validated structurally all the way down.
pub fn json() -> Decoder<Value> {
    Decoder::recursive(|json| {
        one_of(vec![
            null().map(|()| Value::Null),
            string().map(Value::String),
            Decoder::new(|input| match input {
                Some(Value::Number(n)) => Ok(Value::Number(n.clone())),
                other => Err(mismatch("number", other)),
            }),
            boolean().map(Value::Bool),
            array(json.clone()).map(Value::Array),
            object_map(json).map(|fields| Value::Object(fields.into_iter().collect())),
        ])
    })
}

/// Read access to the fields of an object, used by [`record`].
pub struct Fields<'a> {
    object: &'a Map<String, Value>,
}

impl<'a> Fields<'a> {
    /// Decode the required field `name`; failures are prefixed with `name`.
    pub fn field<T: 'static>(&self, name: &str, decoder: &impl AsDecoder<T>) -> DecodeResult<T> {
        decoder
            .as_decoder()
            .run_field(self.object.get(name))
            .map_err(|e| e.at_key(name))
    }

    pub fn raw(&self, name: &str) -> Option<&'a Value> {
        self.object.get(name)
    }
}

/// Fixed-shape record. `build` reads each field in turn; the first failing field
/// short-circuits (use `?`). Unknown keys are ignored.
pub fn record<T, F>(build: F) -> Decoder<T>
where
    T: 'static,
    F: Fn(&Fields<'_>) -> DecodeResult<T> + Send + Sync + 'static,
{
    Decoder::new(move |input| match input {
        Some(Value::Object(object)) => build(&Fields { object }),
        other => Err(mismatch("object", other)),
    })
}

/// Single required field of an object.
pub fn field<T: 'static>(name: &'static str, decoder: Decoder<T>) -> Decoder<T> {
    record(move |fields| fields.field(name, &decoder))
}

/// Object with arbitrary keys, every value decoded with `values`.
pub fn object_map<T: 'static>(values: Decoder<T>) -> Decoder<BTreeMap<String, T>> {
    Decoder::new(move |input| match input {
        Some(Value::Object(object)) => object
            .iter()
            .map(|(key, value)| {
                values
                    .run(value)
                    .map(|decoded| (key.clone(), decoded))
                    .map_err(|e| e.at_key(key))
            })
            .collect(),
        other => Err(mismatch("object", other)),
    })
}

pub fn array<T: 'static>(items: Decoder<T>) -> Decoder<Vec<T>> {
    Decoder::new(move |input| match input {
        Some(Value::Array(elements)) => elements
            .iter()
            .enumerate()
            .map(|(idx, element)| items.run(element).map_err(|e| e.at_index(idx)))
            .collect(),
        other => Err(mismatch("array", other)),
    })
}

fn exact_array(input: Option<&Value>, arity: usize) -> DecodeResult<&Vec<Value>> {
    match input {
        Some(Value::Array(elements)) if elements.len() == arity => Ok(elements),
        Some(Value::Array(elements)) => Err(DecodeError::new(format!(
            "expected array with {arity} elements but found {}",
            elements.len()
        ))),
        other => Err(mismatch("array", other)),
    }
}

pub fn pair<A, B>(first: Decoder<A>, second: Decoder<B>) -> Decoder<(A, B)>
where
    A: 'static,
    B: 'static,
{
    Decoder::new(move |input| {
        let elements = exact_array(input, 2)?;
        let a = first.run(&elements[0]).map_err(|e| e.at_index(0))?;
        let b = second.run(&elements[1]).map_err(|e| e.at_index(1))?;
        Ok((a, b))
    })
}

pub fn triple<A, B, C>(first: Decoder<A>, second: Decoder<B>, third: Decoder<C>) -> Decoder<(A, B, C)>
where
    A: 'static,
    B: 'static,
    C: 'static,
{
    Decoder::new(move |input| {
        let elements = exact_array(input, 3)?;
        let a = first.run(&elements[0]).map_err(|e| e.at_index(0))?;
        let b = second.run(&elements[1]).map_err(|e| e.at_index(1))?;
        let c = third.run(&elements[2]).map_err(|e| e.at_index(2))?;
        Ok((a, b, c))
    })
}

/// Ordered union: the first alternative that succeeds wins.
///
/// When every alternative fails, the error message is each alternative's rendered
/// failure (path and message), newline-joined in declaration order.
pub fn one_of<T: 'static>(alternatives: Vec<Decoder<T>>) -> Decoder<T> {
    Decoder::new(move |input| {
        let mut failures = Vec::with_capacity(alternatives.len());
        for alternative in &alternatives {
            match alternative.run_field(input) {
                Ok(decoded) => return Ok(decoded),
                Err(e) => failures.push(e.to_string()),
            }
        }
        if failures.is_empty() {
            return Err(DecodeError::new("no decoders"));
        }
        Err(DecodeError::new(failures.join("\n")))
    })
}

/// Undefined or `T`.
pub fn optional<T: 'static>(decoder: Decoder<T>) -> Decoder<Option<T>> {
    one_of(vec![decoder.map(Some), undefined().map(|()| None)])
}

/// Null or `T`.
pub fn nullable<T: 'static>(decoder: Decoder<T>) -> Decoder<Option<T>> {
    one_of(vec![null().map(|()| None), decoder.map(Some)])
}

/// Null, undefined, or `T`.
pub fn maybe<T: 'static>(decoder: Decoder<T>) -> Decoder<Option<T>> {
    one_of(vec![
        null().map(|()| None),
        undefined().map(|()| None),
        decoder.map(Some),
    ])
}

/// Run both decoders against the same input.
pub fn both<A, B>(left: Decoder<A>, right: Decoder<B>) -> Decoder<(A, B)>
where
    A: 'static,
    B: 'static,
{
    Decoder::new(move |input| {
        let a = left.run_field(input)?;
        let b = right.run_field(input)?;
        Ok((a, b))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, PartialEq)]
    struct Note {
        title: String,
        stars: i64,
    }

    fn note() -> Decoder<Note> {
        record(|r| {
            Ok(Note {
                title: r.field("title", &string())?,
                stars: r.field("stars", &integer())?,
            })
        })
    }

    #[test]
    fn primitives_report_type_mismatch() {
        let err = string().run(&json!(123)).unwrap_err();
        assert_eq!(err.message(), "expected string but found number");

        let err = boolean().run(&json!("yes")).unwrap_err();
        assert_eq!(err.message(), "expected boolean but found string");

        let err = null().run(&json!([])).unwrap_err();
        assert_eq!(err.message(), "expected null but found array");
    }

    #[test]
    fn integer_rejects_fractions() {
        assert_eq!(integer().run(&json!(-4)).unwrap(), -4);
        assert!(integer().run(&json!(1.5)).is_err());
        assert!(unsigned().run(&json!(-1)).is_err());
        assert_eq!(unsigned().run(&json!(7)).unwrap(), 7);
    }

    #[test]
    fn string_number_parses_base_ten() {
        assert_eq!(string_number().run(&json!("42")).unwrap(), 42);
        let err = string_number().run(&json!("forty")).unwrap_err();
        assert_eq!(err.message(), "not a valid number: forty");
        assert_eq!(string_number().run(&json!("-7")).unwrap(), -7);
    }

    #[test]
    fn string_number_rejects_padding_and_fractions() {
        for raw in [" 42 ", "42\n", "4.2", ""] {
            assert!(string_number().run(&json!(raw)).is_err(), "{raw:?} should be rejected");
        }
    }

    #[test]
    fn record_prefixes_failing_field() {
        let err = note().run(&json!({ "title": "a", "stars": "five" })).unwrap_err();
        assert_eq!(err.path().to_string(), "stars");
        assert_eq!(err.to_string(), "expected integer but found string. When parsing: stars");
    }

    #[test]
    fn record_short_circuits_on_first_field() {
        let err = note().run(&json!({ "title": 1, "stars": "five" })).unwrap_err();
        assert_eq!(err.path().to_string(), "title");
    }

    #[test]
    fn record_reports_missing_field_as_undefined() {
        let err = note().run(&json!({ "title": "a" })).unwrap_err();
        assert_eq!(err.message(), "expected integer but found undefined");
    }

    #[test]
    fn record_rejects_non_objects() {
        let err = note().run(&json!([1, 2])).unwrap_err();
        assert_eq!(err.message(), "expected object but found array");
    }

    #[test]
    fn nested_paths_read_outermost_first() {
        let outer = record(|r| r.field("notes", &array(note())));
        let err = outer
            .run(&json!({ "notes": [{ "title": "a", "stars": 1 }, { "title": 2, "stars": 1 }] }))
            .unwrap_err();
        assert_eq!(err.path().to_string(), "notes.1.title");
    }

    #[test]
    fn array_preserves_order_and_rejects_non_arrays() {
        assert_eq!(array(integer()).run(&json!([3, 1, 2])).unwrap(), vec![3, 1, 2]);
        let err = array(integer()).run(&json!({})).unwrap_err();
        assert_eq!(err.message(), "expected array but found object");
    }

    #[test]
    fn object_map_keeps_keys() {
        let decoded = object_map(boolean()).run(&json!({ "b": true, "a": false })).unwrap();
        assert_eq!(decoded.get("a"), Some(&false));
        assert_eq!(decoded.get("b"), Some(&true));

        let err = object_map(boolean()).run(&json!({ "a": 1 })).unwrap_err();
        assert_eq!(err.path().to_string(), "a");
    }

    #[test]
    fn tuples_require_exact_arity() {
        let p = pair(string(), integer());
        assert_eq!(p.run(&json!(["x", 1])).unwrap(), ("x".to_string(), 1));
        let err = p.run(&json!(["x", 1, 2])).unwrap_err();
        assert_eq!(err.message(), "expected array with 2 elements but found 3");

        let t = triple(boolean(), boolean(), string());
        let err = t.run(&json!([true, false, 3])).unwrap_err();
        assert_eq!(err.path().to_string(), "2");
    }

    #[test]
    fn one_of_prefers_first_match() {
        let d = one_of(vec![
            any().map(|_| "first"),
            string().map(|_| "second"),
        ]);
        assert_eq!(d.run(&json!("both match")).unwrap(), "first");
    }

    #[test]
    fn one_of_joins_every_failure_in_order() {
        let d = one_of(vec![
            string().map(|_| ()),
            number().map(|_| ()),
            boolean().map(|_| ()),
        ]);
        let err = d.run(&json!(null)).unwrap_err();
        assert_eq!(
            err.message(),
            "expected string but found null\nexpected number but found null\nexpected boolean but found null"
        );
    }

    #[test]
    fn one_of_failures_keep_inner_paths() {
        let d = one_of(vec![note().map(|_| ()), string().map(|_| ())]);
        let err = d.run(&json!({ "title": 1 })).unwrap_err();
        let lines: Vec<&str> = err.message().lines().collect();
        assert_eq!(
            lines,
            vec![
                "expected string but found number. When parsing: title",
                "expected string but found object",
            ]
        );
    }

    #[test]
    fn absent_markers() {
        let opt = record(|r| r.field("x", &optional(string())));
        assert_eq!(opt.run(&json!({})).unwrap(), None);
        assert_eq!(opt.run(&json!({ "x": "a" })).unwrap(), Some("a".to_string()));
        assert!(opt.run(&json!({ "x": null })).is_err());

        let nul = record(|r| r.field("x", &nullable(string())));
        assert_eq!(nul.run(&json!({ "x": null })).unwrap(), None);
        assert!(nul.run(&json!({})).is_err());

        let may = record(|r| r.field("x", &maybe(string())));
        assert_eq!(may.run(&json!({})).unwrap(), None);
        assert_eq!(may.run(&json!({ "x": null })).unwrap(), None);
    }

    #[test]
    fn literal_and_enum_match_exactly() {
        assert_eq!(literal("Pending").run(&json!("Pending")).unwrap(), "Pending");
        let err = literal("Pending").run(&json!("pending")).unwrap_err();
        assert_eq!(err.message(), "expected 'Pending' but found 'pending'");

        static STATES: &[&str] = &["Pending", "Embedded", "Failed"];
        assert_eq!(string_enum(STATES).run(&json!("Failed")).unwrap(), "Failed");
        let err = string_enum(STATES).run(&json!("Done")).unwrap_err();
        assert_eq!(err.message().lines().count(), 3);
    }

    #[test]
    fn then_dispatches_on_decoded_value() {
        let d = field("kind", string()).then(|kind| match kind.as_str() {
            "n" => field("value", integer()).map(|v| v.to_string()),
            "s" => field("value", string()),
            other => fail(format!("Unknown kind: {other}")),
        });
        assert_eq!(d.run(&json!({ "kind": "n", "value": 5 })).unwrap(), "5");
        assert_eq!(d.run(&json!({ "kind": "s", "value": "x" })).unwrap(), "x");
        assert_eq!(
            d.run(&json!({ "kind": "z" })).unwrap_err().message(),
            "Unknown kind: z"
        );
    }

    #[test]
    fn both_reads_the_same_input() {
        let d = both(field("a", integer()), field("b", string()));
        assert_eq!(
            d.run(&json!({ "a": 1, "b": "two" })).unwrap(),
            (1, "two".to_string())
        );
    }

    #[derive(Debug, PartialEq)]
    struct Tree {
        label: String,
        children: Vec<Tree>,
    }

    #[test]
    fn recursive_decoder_descends_at_run_time() {
        let tree = Decoder::recursive(|tree| {
            record(move |r| {
                Ok(Tree {
                    label: r.field("label", &string())?,
                    children: r.field("children", &array(tree.clone()))?,
                })
            })
        });

        let decoded = tree
            .run(&json!({
                "label": "root",
                "children": [
                    { "label": "leaf", "children": [] },
                    { "label": "branch", "children": [{ "label": "deep", "children": [] }] }
                ]
            }))
            .unwrap();
        assert_eq!(decoded.children.len(), 2);
        assert_eq!(decoded.children[1].children[0].label, "deep");

        let err = tree
            .run(&json!({ "label": "root", "children": [{ "label": 3, "children": [] }] }))
            .unwrap_err();
        assert_eq!(err.path().to_string(), "children.0.label");
    }

    #[test]
    fn recursive_placeholder_fails_when_called_during_definition() {
        let d: Decoder<Value> = Decoder::recursive(|this| {
            let early = this.run(&json!(1));
            assert_eq!(early.unwrap_err().message(), UNBOUND_RECURSION);
            any()
        });
        assert_eq!(d.run(&json!(1)).unwrap(), json!(1));
    }

    #[test]
    fn json_accepts_any_json_document() {
        let doc = json!({ "a": [1, 2.5, "x", null, { "b": false }] });
        assert_eq!(json().run(&doc).unwrap(), doc);
        assert!(json().run_field(None).is_err());
    }

    #[test]
    fn decode_renders_failures() {
        let err = note().decode(&json!({ "title": true })).unwrap_err();
        assert_eq!(err, "expected string but found boolean. When parsing: title");
    }
}
