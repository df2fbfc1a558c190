//! Conversion between [`MetadataValue`] and Qdrant payload values.
//!
//! Qdrant stores payload as typed JSON values. The four supported scalar kinds
//! map one-to-one and round-trip with their kind intact. Non-finite floats
//! cannot be represented in JSON and are written as their text rendering;
//! payload values that only other writers produce (null, lists, nested
//! objects) are read back as their JSON text.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use grextor_core::{Metadata, MetadataValue};

/// A Qdrant payload value as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PayloadValue {
    Null,
    Bool(bool),
    Integer(i64),
    Double(f64),
    String(String),
    List(Vec<PayloadValue>),
    Struct(BTreeMap<String, PayloadValue>),
}

pub type Payload = BTreeMap<String, PayloadValue>;

pub fn encode_value(value: &MetadataValue) -> PayloadValue {
    match value {
        MetadataValue::Text(s) => PayloadValue::String(s.clone()),
        MetadataValue::Integer(i) => PayloadValue::Integer(*i),
        MetadataValue::Float(f) if f.is_finite() => PayloadValue::Double(*f),
        MetadataValue::Float(f) => PayloadValue::String(f.to_string()),
        MetadataValue::Bool(b) => PayloadValue::Bool(*b),
    }
}

pub fn decode_value(value: PayloadValue) -> MetadataValue {
    match value {
        PayloadValue::String(s) => MetadataValue::Text(s),
        PayloadValue::Integer(i) => MetadataValue::Integer(i),
        PayloadValue::Double(f) => MetadataValue::Float(f),
        PayloadValue::Bool(b) => MetadataValue::Bool(b),
        other => MetadataValue::Text(serde_json::to_string(&other).unwrap_or_default()),
    }
}

/// Encode an arbitrary caller-supplied JSON value, coercing kinds outside
/// the scalar set to text first.
pub fn encode_json(value: serde_json::Value) -> PayloadValue {
    encode_value(&MetadataValue::coerce(value))
}

pub fn encode_payload(metadata: &Metadata) -> Payload {
    metadata
        .iter()
        .map(|(k, v)| (k.clone(), encode_value(v)))
        .collect()
}

pub fn decode_payload(payload: Payload) -> Metadata {
    payload
        .into_iter()
        .map(|(k, v)| (k, decode_value(v)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use grextor_core::ValueKind;
    use proptest::prelude::*;
    use serde_json::json;

    /// Encode, send through JSON as the REST API would, and decode.
    fn through_wire(metadata: &Metadata) -> Metadata {
        let wire = serde_json::to_string(&encode_payload(metadata)).unwrap();
        let payload: Payload = serde_json::from_str(&wire).unwrap();
        decode_payload(payload)
    }

    fn scalar() -> impl Strategy<Value = MetadataValue> {
        prop_oneof![
            ".*".prop_map(MetadataValue::Text),
            any::<i64>().prop_map(MetadataValue::Integer),
            any::<f64>()
                .prop_filter("finite", |f| f.is_finite())
                .prop_map(MetadataValue::Float),
            any::<bool>().prop_map(MetadataValue::Bool),
        ]
    }

    fn composite_json() -> impl Strategy<Value = serde_json::Value> {
        prop_oneof![
            Just(serde_json::Value::Null),
            prop::collection::vec(any::<i32>(), 0..4).prop_map(|v| json!(v)),
            prop::collection::btree_map("[a-z]{1,4}", any::<bool>(), 0..4)
                .prop_map(|m| json!(m)),
        ]
    }

    proptest! {
        #[test]
        fn supported_kinds_roundtrip(meta in prop::collection::btree_map("[a-z_]{1,8}", scalar(), 0..8)) {
            let decoded = through_wire(&meta);
            prop_assert_eq!(&decoded, &meta);
            for (k, v) in &meta {
                prop_assert_eq!(decoded[k].kind(), v.kind());
            }
        }

        #[test]
        fn unsupported_kinds_keep_text_rendering_only(value in composite_json()) {
            let rendering = value.to_string();
            let mut meta = Metadata::new();
            meta.insert("v".into(), MetadataValue::coerce(value));

            let decoded = through_wire(&meta);
            prop_assert_eq!(decoded["v"].kind(), ValueKind::Text);
            prop_assert_eq!(decoded["v"].as_str(), Some(rendering.as_str()));
        }
    }

    #[test]
    fn test_encode_scalar_kinds() {
        assert_eq!(encode_value(&"a".into()), PayloadValue::String("a".into()));
        assert_eq!(encode_value(&5i64.into()), PayloadValue::Integer(5));
        assert_eq!(encode_value(&0.5f64.into()), PayloadValue::Double(0.5));
        assert_eq!(encode_value(&true.into()), PayloadValue::Bool(true));
    }

    #[test]
    fn test_extreme_integers_roundtrip() {
        let mut meta = Metadata::new();
        meta.insert("min".into(), MetadataValue::Integer(i64::MIN));
        meta.insert("max".into(), MetadataValue::Integer(i64::MAX));
        assert_eq!(through_wire(&meta), meta);
    }

    #[test]
    fn test_whole_float_stays_float() {
        let mut meta = Metadata::new();
        meta.insert("f".into(), MetadataValue::Float(3.0));
        assert_eq!(through_wire(&meta)["f"].kind(), ValueKind::Float);
    }

    #[test]
    fn test_non_finite_float_written_as_text() {
        assert_eq!(
            encode_value(&MetadataValue::Float(f64::NAN)),
            PayloadValue::String("NaN".into())
        );
        assert_eq!(
            encode_value(&MetadataValue::Float(f64::INFINITY)),
            PayloadValue::String("inf".into())
        );
    }

    #[test]
    fn test_encode_json_coerces_unsupported() {
        assert_eq!(
            encode_json(json!(["a", 1])),
            PayloadValue::String(r#"["a",1]"#.into())
        );
        assert_eq!(encode_json(json!(12)), PayloadValue::Integer(12));
    }

    #[test]
    fn test_decode_foreign_payload_values() {
        let payload: Payload =
            serde_json::from_str(r#"{"n": null, "l": [1, "x"], "o": {"k": true}}"#).unwrap();
        let meta = decode_payload(payload);
        assert_eq!(meta["n"], MetadataValue::Text("null".into()));
        assert_eq!(meta["l"], MetadataValue::Text(r#"[1,"x"]"#.into()));
        assert_eq!(meta["o"], MetadataValue::Text(r#"{"k":true}"#.into()));
    }
}
