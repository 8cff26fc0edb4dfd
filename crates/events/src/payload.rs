//! Event payload codec.
//!
//! A payload read straight from the datastore arrives as a string holding JSON;
//! one pushed by change-data-capture arrives already structured. Both decode to the
//! same value. Encoding always produces the string form.

use serde_json::Value;
use strata_codec::{DecodeError, Decoder, Encoder, Schema};

pub fn stringified<T: 'static>(inner: Schema<T>) -> Schema<T> {
    let (decoder, encoder) = inner.into_parts();
    Schema::new(stringified_decoder(decoder), stringified_encoder(encoder))
}

pub fn stringified_decoder<T: 'static>(inner: Decoder<T>) -> Decoder<T> {
    Decoder::new(move |input| match input {
        Some(Value::String(raw)) => {
            let parsed: Value = serde_json::from_str(raw)
                .map_err(|e| DecodeError::new(format!("invalid JSON payload: {e}")))?;
            inner.run(&parsed)
        }
        other => inner.run_field(other),
    })
}

pub fn stringified_encoder<T: 'static>(inner: Encoder<T>) -> Encoder<T> {
    Encoder::new(move |value| Value::String(inner.run(value).to_string()))
}
