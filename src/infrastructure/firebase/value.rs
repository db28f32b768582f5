//! Firestore typed-value codec
//!
//! Firestore's REST API wraps every field in a one-key object naming its
//! type (`{"integerValue": "42"}`). Documents inside this crate are plain
//! JSON maps, so values are converted at the adapter boundary.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::domain::ports::Document;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FirestoreValue {
    #[serde(rename = "nullValue")]
    Null(()),
    #[serde(rename = "booleanValue")]
    Boolean(bool),
    /// int64 travels as a decimal string.
    #[serde(rename = "integerValue")]
    Integer(String),
    #[serde(rename = "doubleValue")]
    Double(f64),
    #[serde(rename = "timestampValue")]
    Timestamp(String),
    #[serde(rename = "stringValue")]
    String(String),
    #[serde(rename = "bytesValue")]
    Bytes(String),
    #[serde(rename = "referenceValue")]
    Reference(String),
    #[serde(rename = "geoPointValue")]
    GeoPoint(GeoPoint),
    #[serde(rename = "arrayValue")]
    Array(ArrayValue),
    #[serde(rename = "mapValue")]
    Map(MapValue),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArrayValue {
    #[serde(default)]
    pub values: Vec<FirestoreValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapValue {
    #[serde(default)]
    pub fields: BTreeMap<String, FirestoreValue>,
}

pub type Fields = BTreeMap<String, FirestoreValue>;

impl From<&Value> for FirestoreValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => FirestoreValue::Null(()),
            Value::Bool(b) => FirestoreValue::Boolean(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => FirestoreValue::Integer(i.to_string()),
                None => FirestoreValue::Double(n.as_f64().unwrap_or_default()),
            },
            Value::String(s) => FirestoreValue::String(s.clone()),
            Value::Array(items) => FirestoreValue::Array(ArrayValue {
                values: items.iter().map(FirestoreValue::from).collect(),
            }),
            Value::Object(map) => FirestoreValue::Map(MapValue {
                fields: map
                    .iter()
                    .map(|(k, v)| (k.clone(), FirestoreValue::from(v)))
                    .collect(),
            }),
        }
    }
}

impl From<FirestoreValue> for Value {
    fn from(value: FirestoreValue) -> Self {
        match value {
            FirestoreValue::Null(()) => Value::Null,
            FirestoreValue::Boolean(b) => Value::Bool(b),
            FirestoreValue::Integer(raw) => match raw.parse::<i64>() {
                Ok(i) => Value::from(i),
                Err(_) => Value::String(raw),
            },
            FirestoreValue::Double(f) => Number::from_f64(f).map_or(Value::Null, Value::Number),
            FirestoreValue::Timestamp(s)
            | FirestoreValue::String(s)
            | FirestoreValue::Bytes(s)
            | FirestoreValue::Reference(s) => Value::String(s),
            FirestoreValue::GeoPoint(point) => {
                let mut map = Map::new();
                map.insert("latitude".into(), Value::from(point.latitude));
                map.insert("longitude".into(), Value::from(point.longitude));
                Value::Object(map)
            }
            FirestoreValue::Array(array) => {
                Value::Array(array.values.into_iter().map(Value::from).collect())
            }
            FirestoreValue::Map(map) => Value::Object(decode_fields(map.fields)),
        }
    }
}

pub fn encode_fields(doc: &Document) -> Fields {
    doc.iter()
        .map(|(k, v)| (k.clone(), FirestoreValue::from(v)))
        .collect()
}

pub fn decode_fields(fields: Fields) -> Document {
    fields
        .into_iter()
        .map(|(k, v)| (k, Value::from(v)))
        .collect()
}
