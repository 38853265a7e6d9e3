//! Conversion between [`Value`] and the Firestore REST value encoding.

use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::{json, Map, Value as Json};

use crate::{Document, Fields, Result, StoreError, Timestamp, Value};

/// A document as returned by the REST API.
#[derive(Debug, Deserialize)]
pub(crate) struct RawDocument {
    /// Full resource name, ending in the document id.
    pub name: String,
    /// Field values; absent for empty documents.
    #[serde(default)]
    pub fields: Map<String, Json>,
}

impl RawDocument {
    pub(crate) fn into_document(self) -> Result<Document> {
        let id = self
            .name
            .rsplit('/')
            .next()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| StoreError::Decode(format!("bad document name: {}", self.name)))?
            .to_string();

        Ok(Document::new(id, decode_fields(&self.fields)?))
    }
}

pub(crate) fn encode_fields(fields: &Fields) -> Result<Json> {
    let mut encoded = Map::new();
    for (name, value) in fields {
        encoded.insert(name.clone(), encode_value(value)?);
    }
    Ok(Json::Object(encoded))
}

pub(crate) fn encode_value(value: &Value) -> Result<Json> {
    Ok(match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Boolean(b) => json!({ "booleanValue": b }),
        Value::Integer(i) => json!({ "integerValue": i.to_string() }),
        Value::Double(d) => json!({ "doubleValue": encode_double(*d) }),
        Value::Timestamp(ts) => json!({ "timestampValue": encode_timestamp(*ts)? }),
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => {
            let values = items.iter().map(encode_value).collect::<Result<Vec<_>>>()?;
            json!({ "arrayValue": { "values": values } })
        }
        Value::Map(fields) => json!({ "mapValue": { "fields": encode_fields(fields)? } }),
    })
}

fn encode_double(d: f64) -> Json {
    if d.is_nan() {
        json!("NaN")
    } else if d.is_infinite() {
        json!(if d > 0.0 { "Infinity" } else { "-Infinity" })
    } else {
        json!(d)
    }
}

fn encode_timestamp(ts: Timestamp) -> Result<String> {
    DateTime::<Utc>::from_timestamp(ts.seconds, ts.nanos)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Nanos, true))
        .ok_or_else(|| StoreError::Decode(format!("timestamp out of range: {ts:?}")))
}

pub(crate) fn decode_fields(fields: &Map<String, Json>) -> Result<Fields> {
    fields
        .iter()
        .map(|(name, value)| Ok((name.clone(), decode_value(value)?)))
        .collect()
}

pub(crate) fn decode_value(json: &Json) -> Result<Value> {
    let (kind, inner) = json
        .as_object()
        .and_then(|object| object.iter().next())
        .ok_or_else(|| StoreError::Decode(format!("not a typed value: {json}")))?;

    let bad = || StoreError::Decode(format!("malformed {kind}: {inner}"));

    Ok(match kind.as_str() {
        "nullValue" => Value::Null,
        "booleanValue" => Value::Boolean(inner.as_bool().ok_or_else(bad)?),
        "integerValue" => Value::Integer(
            inner
                .as_str()
                .and_then(|s| s.parse().ok())
                .or_else(|| inner.as_i64())
                .ok_or_else(bad)?,
        ),
        "doubleValue" => Value::Double(decode_double(inner).ok_or_else(bad)?),
        "timestampValue" => {
            let text = inner.as_str().ok_or_else(bad)?;
            let parsed = DateTime::<FixedOffset>::parse_from_rfc3339(text).map_err(|_| bad())?;
            Value::Timestamp(Timestamp::new(
                parsed.timestamp(),
                parsed.timestamp_subsec_nanos(),
            ))
        }
        "stringValue" | "referenceValue" | "bytesValue" => {
            Value::String(inner.as_str().ok_or_else(bad)?.to_string())
        }
        "geoPointValue" => {
            let mut point = Fields::new();
            for axis in ["latitude", "longitude"] {
                let coordinate = inner.get(axis).and_then(Json::as_f64).unwrap_or(0.0);
                point.insert(axis.to_string(), Value::Double(coordinate));
            }
            Value::Map(point)
        }
        "arrayValue" => {
            let values = match inner.get("values") {
                Some(Json::Array(values)) => values
                    .iter()
                    .map(decode_value)
                    .collect::<Result<Vec<_>>>()?,
                Some(_) => return Err(bad()),
                None => Vec::new(),
            };
            Value::Array(values)
        }
        "mapValue" => match inner.get("fields") {
            Some(Json::Object(fields)) => Value::Map(decode_fields(fields)?),
            Some(_) => return Err(bad()),
            None => Value::Map(Fields::new()),
        },
        other => return Err(StoreError::Decode(format!("unsupported value kind: {other}"))),
    })
}

fn decode_double(inner: &Json) -> Option<f64> {
    match inner {
        Json::Number(n) => n.as_f64(),
        Json::String(s) => match s.as_str() {
            "NaN" => Some(f64::NAN),
            "Infinity" => Some(f64::INFINITY),
            "-Infinity" => Some(f64::NEG_INFINITY),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integers_travel_as_strings() {
        assert_eq!(
            encode_value(&Value::Integer(42)).unwrap(),
            json!({"integerValue": "42"})
        );
        assert_eq!(
            decode_value(&json!({"integerValue": "-7"})).unwrap(),
            Value::Integer(-7)
        );
    }

    #[test]
    fn test_timestamp_keeps_nanoseconds() {
        let ts = Timestamp::new(1_700_000_000, 123_456_789);
        let encoded = encode_value(&Value::Timestamp(ts)).unwrap();
        assert_eq!(
            encoded,
            json!({"timestampValue": "2023-11-14T22:13:20.123456789Z"})
        );

        let decoded = decode_value(&json!({"timestampValue": "2023-11-14T22:13:20.123456Z"}))
            .unwrap();
        assert_eq!(
            decoded,
            Value::Timestamp(Timestamp::new(1_700_000_000, 123_456_000))
        );
    }

    #[test]
    fn test_empty_containers_decode() {
        assert_eq!(
            decode_value(&json!({"arrayValue": {}})).unwrap(),
            Value::Array(vec![])
        );
        assert_eq!(
            decode_value(&json!({"mapValue": {}})).unwrap(),
            Value::Map(Fields::new())
        );
    }

    #[test]
    fn test_nested_map_encoding() {
        let mut inner = Fields::new();
        inner.insert("likes".into(), Value::Integer(1));
        let mut fields = Fields::new();
        fields.insert("meta".into(), Value::Map(inner));
        fields.insert("tags".into(), Value::Array(vec![Value::from("rust")]));

        let encoded = encode_fields(&fields).unwrap();
        assert_eq!(
            encoded,
            json!({
                "meta": {"mapValue": {"fields": {"likes": {"integerValue": "1"}}}},
                "tags": {"arrayValue": {"values": [{"stringValue": "rust"}]}}
            })
        );
    }

    #[test]
    fn test_special_doubles() {
        assert_eq!(encode_double(f64::INFINITY), json!("Infinity"));
        let Value::Double(d) = decode_value(&json!({"doubleValue": "NaN"})).unwrap() else {
            panic!("expected double");
        };
        assert!(d.is_nan());
    }

    #[test]
    fn test_geo_point_decodes_to_map() {
        let decoded =
            decode_value(&json!({"geoPointValue": {"latitude": 37.5, "longitude": 127.0}}))
                .unwrap();
        let Value::Map(point) = decoded else {
            panic!("expected map");
        };
        assert_eq!(point["latitude"], Value::Double(37.5));
    }

    #[test]
    fn test_unknown_kind_is_an_error() {
        assert!(decode_value(&json!({"vectorValue": {}})).is_err());
        assert!(decode_value(&json!("bare")).is_err());
        assert!(decode_value(&json!({"booleanValue": "yes"})).is_err());
    }

    #[test]
    fn test_raw_document_id_from_name() {
        let raw: RawDocument = serde_json::from_value(json!({
            "name": "projects/p/databases/(default)/documents/qna/abc",
            "createTime": "2024-01-01T00:00:00Z"
        }))
        .unwrap();
        let doc = raw.into_document().unwrap();
        assert_eq!(doc.id, "abc");
        assert!(doc.fields.is_empty());
    }
}
