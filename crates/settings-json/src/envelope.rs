//! JSON envelope for a persisted mapping.
//!
//! ```text
//! {
//!   "width": { "type": "u32", "value": 1280 },
//!   "title": { "type": "string", "value": "Main" },
//!   "ratio": { "type": "null", "value": null }
//! }
//! ```
//!
//! Entries keep mapping order in both directions. Non-finite floats are
//! written as the strings `"NaN"`, `"inf"` and `"-inf"`.

use std::fmt;

use serde::de::{self, MapAccess, Visitor};
use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value as Json;

use settings_core::{PersistedMapping, TypeTag, Value};

const NULL_TAG: &str = "null";

/// Serializes a mapping as the envelope object.
pub(crate) struct Envelope<'a>(pub &'a PersistedMapping);

impl Serialize for Envelope<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, value) in self.0.iter() {
            map.serialize_entry(name, &Tagged(value))?;
        }
        map.end()
    }
}

struct Tagged<'a>(&'a Value);

impl Serialize for Tagged<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut entry = serializer.serialize_struct("Tagged", 2)?;
        entry.serialize_field("type", self.0.type_name())?;
        entry.serialize_field("value", &Payload(self.0))?;
        entry.end()
    }
}

struct Payload<'a>(&'a Value);

impl Serialize for Payload<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            Value::Null => serializer.serialize_none(),
            Value::Bool(v) => serializer.serialize_bool(*v),
            Value::I8(v) => serializer.serialize_i8(*v),
            Value::I16(v) => serializer.serialize_i16(*v),
            Value::I32(v) => serializer.serialize_i32(*v),
            Value::I64(v) => serializer.serialize_i64(*v),
            Value::U8(v) => serializer.serialize_u8(*v),
            Value::U16(v) => serializer.serialize_u16(*v),
            Value::U32(v) => serializer.serialize_u32(*v),
            Value::U64(v) => serializer.serialize_u64(*v),
            Value::F32(v) if v.is_finite() => serializer.serialize_f32(*v),
            Value::F64(v) if v.is_finite() => serializer.serialize_f64(*v),
            Value::F32(v) => serializer.serialize_str(non_finite_name(f64::from(*v))),
            Value::F64(v) => serializer.serialize_str(non_finite_name(*v)),
            Value::Char(v) => serializer.serialize_char(*v),
            Value::String(v) => serializer.serialize_str(v),
        }
    }
}

fn non_finite_name(v: f64) -> &'static str {
    if v.is_nan() {
        "NaN"
    } else if v.is_sign_negative() {
        "-inf"
    } else {
        "inf"
    }
}

fn non_finite_value(text: &str) -> Option<f64> {
    match text {
        "NaN" => Some(f64::NAN),
        "inf" => Some(f64::INFINITY),
        "-inf" => Some(f64::NEG_INFINITY),
        _ => None,
    }
}

/// A decoded envelope, in file order.
pub(crate) struct DecodedMapping(pub PersistedMapping);

impl<'de> Deserialize<'de> for DecodedMapping {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(EnvelopeVisitor)
    }
}

struct EnvelopeVisitor;

impl<'de> Visitor<'de> for EnvelopeVisitor {
    type Value = DecodedMapping;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an object of settings entries")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut mapping = PersistedMapping::new();
        while let Some((name, raw)) = access.next_entry::<String, Json>()? {
            let value = entry_value(&name, raw).map_err(de::Error::custom)?;
            if mapping.insert(name.as_str(), value).is_some() {
                tracing::warn!(entry = %name, "Duplicate settings entry, keeping the last one");
            }
        }
        Ok(DecodedMapping(mapping))
    }
}

/// Turn one envelope entry into a value.
fn entry_value(name: &str, raw: Json) -> Result<Value, String> {
    match raw {
        Json::Object(mut entry) => {
            let tag = match entry.remove("type") {
                Some(Json::String(tag)) => tag,
                _ => return Err(format!("entry '{name}' has no \"type\" tag")),
            };
            let payload = entry.remove("value").unwrap_or(Json::Null);
            if tag != NULL_TAG && TypeTag::from_name(&tag).is_none() {
                return Err(format!("entry '{name}' has unknown type tag '{tag}'"));
            }
            match tagged_value(&tag, &payload) {
                Ok(value) => Ok(value),
                Err(reason) if is_scalar(&payload) => {
                    tracing::debug!(
                        entry = %name,
                        %reason,
                        "Payload does not fit its tag, reading it untagged"
                    );
                    Ok(untagged_value(payload))
                }
                Err(reason) => Err(format!("entry '{name}': {reason}")),
            }
        }
        Json::Array(_) => Err(format!("entry '{name}' is an untagged array")),
        scalar => Ok(untagged_value(scalar)),
    }
}

fn is_scalar(raw: &Json) -> bool {
    !matches!(raw, Json::Array(_) | Json::Object(_))
}

/// Interpret a hand-written scalar by its JSON shape.
fn untagged_value(raw: Json) -> Value {
    match raw {
        Json::Bool(v) => Value::Bool(v),
        Json::Number(n) => {
            if let Some(v) = n.as_i64() {
                Value::I64(v)
            } else if let Some(v) = n.as_u64() {
                Value::U64(v)
            } else {
                Value::F64(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        Json::String(v) => Value::String(v),
        Json::Null | Json::Array(_) | Json::Object(_) => Value::Null,
    }
}

fn tagged_value(tag: &str, payload: &Json) -> Result<Value, String> {
    if tag == NULL_TAG {
        return match payload {
            Json::Null => Ok(Value::Null),
            other => Err(format!("null entry carries a value: {other}")),
        };
    }
    let tag = TypeTag::from_name(tag).ok_or_else(|| format!("unknown type tag '{tag}'"))?;
    if payload.is_null() {
        return Ok(Value::Null);
    }

    let mismatch = || format!("value {payload} is not a valid {tag}");
    let value = match tag {
        TypeTag::Bool => payload.as_bool().map(Value::Bool),
        TypeTag::I8 => signed(payload).map(Value::I8),
        TypeTag::I16 => signed(payload).map(Value::I16),
        TypeTag::I32 => signed(payload).map(Value::I32),
        TypeTag::I64 => payload.as_i64().map(Value::I64),
        TypeTag::U8 => unsigned(payload).map(Value::U8),
        TypeTag::U16 => unsigned(payload).map(Value::U16),
        TypeTag::U32 => unsigned(payload).map(Value::U32),
        TypeTag::U64 => payload.as_u64().map(Value::U64),
        TypeTag::F32 => float(payload).and_then(narrow).map(Value::F32),
        TypeTag::F64 => float(payload).map(Value::F64),
        TypeTag::Char => payload.as_str().and_then(single_char).map(Value::Char),
        TypeTag::String => payload.as_str().map(|s| Value::String(s.to_string())),
    };
    value.ok_or_else(mismatch)
}

fn signed<N: TryFrom<i64>>(payload: &Json) -> Option<N> {
    payload.as_i64().and_then(|v| N::try_from(v).ok())
}

fn unsigned<N: TryFrom<u64>>(payload: &Json) -> Option<N> {
    payload.as_u64().and_then(|v| N::try_from(v).ok())
}

fn float(payload: &Json) -> Option<f64> {
    match payload {
        Json::Number(n) => n.as_f64(),
        Json::String(s) => non_finite_value(s),
        _ => None,
    }
}

/// `None` when a finite value is out of `f32` range.
fn narrow(v: f64) -> Option<f32> {
    let narrowed = v as f32;
    (narrowed.is_finite() || !v.is_finite()).then_some(narrowed)
}

fn single_char(text: &str) -> Option<char> {
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}
