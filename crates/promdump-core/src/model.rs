//! Sample model matching the Prometheus HTTP API encoding
//!
//! Series are written to snapshot files exactly as Prometheus returns them
//! (`{"metric": {...}, "values": [[<unix seconds>, "<value>"], ...]}`) so the
//! replay side can decode them with any Prometheus client library.

use serde::de::{self, SeqAccess, Visitor};
use serde::ser::SerializeTuple;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Label set of a series. Ordered so encoded output is stable.
pub type Labels = BTreeMap<String, String>;

/// One timestamped value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplePair {
    /// Milliseconds since the Unix epoch
    pub timestamp_ms: i64,
    pub value: f64,
}

impl SamplePair {
    pub fn new(timestamp_ms: i64, value: f64) -> Self {
        Self {
            timestamp_ms,
            value,
        }
    }
}

/// A labelled series with its points in timestamp order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleSeries {
    #[serde(rename = "metric")]
    pub labels: Labels,
    #[serde(rename = "values")]
    pub points: Vec<SamplePair>,
}

impl SampleSeries {
    pub fn new(labels: Labels, points: Vec<SamplePair>) -> Self {
        Self { labels, points }
    }
}

/// Element of an instant vector result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstantSample {
    pub metric: Labels,
    pub value: SamplePair,
}

/// Scalar-like string result.
#[derive(Debug, Clone, PartialEq)]
pub struct StringSample {
    pub timestamp_ms: i64,
    pub value: String,
}

impl<'de> Deserialize<'de> for StringSample {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (secs, value): (f64, String) = Deserialize::deserialize(deserializer)?;
        Ok(Self {
            timestamp_ms: secs_to_millis(secs),
            value,
        })
    }
}

/// Result shape reported by the backend (`resultType`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Matrix,
    Vector,
    Scalar,
    String,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Matrix => write!(f, "matrix"),
            ValueType::Vector => write!(f, "vector"),
            ValueType::Scalar => write!(f, "scalar"),
            ValueType::String => write!(f, "string"),
        }
    }
}

/// Typed result of an instant query.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryValue {
    Matrix(Vec<SampleSeries>),
    Vector(Vec<InstantSample>),
    Scalar(SamplePair),
    String(StringSample),
}

impl QueryValue {
    pub fn value_type(&self) -> ValueType {
        match self {
            QueryValue::Matrix(_) => ValueType::Matrix,
            QueryValue::Vector(_) => ValueType::Vector,
            QueryValue::Scalar(_) => ValueType::Scalar,
            QueryValue::String(_) => ValueType::String,
        }
    }

    /// Decode a `result` payload according to its declared `resultType`.
    pub fn from_json(
        value_type: ValueType,
        result: serde_json::Value,
    ) -> Result<Self, serde_json::Error> {
        Ok(match value_type {
            ValueType::Matrix => QueryValue::Matrix(serde_json::from_value(result)?),
            ValueType::Vector => QueryValue::Vector(serde_json::from_value(result)?),
            ValueType::Scalar => QueryValue::Scalar(serde_json::from_value(result)?),
            ValueType::String => QueryValue::String(serde_json::from_value(result)?),
        })
    }
}

fn secs_to_millis(secs: f64) -> i64 {
    (secs * 1000.0).round() as i64
}

fn millis_to_secs(millis: i64) -> f64 {
    millis as f64 / 1000.0
}

/// Format a sample value the way Prometheus does on the wire.
pub fn format_value(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value == f64::INFINITY {
        "+Inf".to_string()
    } else if value == f64::NEG_INFINITY {
        "-Inf".to_string()
    } else {
        value.to_string()
    }
}

/// Parse a sample value from its wire form.
pub fn parse_value(raw: &str) -> Option<f64> {
    match raw {
        "NaN" => Some(f64::NAN),
        "+Inf" | "Inf" => Some(f64::INFINITY),
        "-Inf" => Some(f64::NEG_INFINITY),
        _ => raw.parse().ok(),
    }
}

impl Serialize for SamplePair {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(2)?;
        tuple.serialize_element(&millis_to_secs(self.timestamp_ms))?;
        tuple.serialize_element(&format_value(self.value))?;
        tuple.end()
    }
}

impl<'de> Deserialize<'de> for SamplePair {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_tuple(2, SamplePairVisitor)
    }
}

struct SamplePairVisitor;

impl<'de> Visitor<'de> for SamplePairVisitor {
    type Value = SamplePair;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a [timestamp, \"value\"] pair")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<SamplePair, A::Error> {
        let secs: f64 = seq
            .next_element()?
            .ok_or_else(|| de::Error::invalid_length(0, &self))?;
        let raw: String = seq
            .next_element()?
            .ok_or_else(|| de::Error::invalid_length(1, &self))?;
        let value = parse_value(&raw)
            .ok_or_else(|| de::Error::custom(format!("invalid sample value '{}'", raw)))?;

        Ok(SamplePair {
            timestamp_ms: secs_to_millis(secs),
            value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(pairs: &[(&str, &str)]) -> Labels {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn sample_pair_uses_prometheus_encoding() {
        let pair = SamplePair::new(1_435_781_430_781, 1.5);
        let json = serde_json::to_string(&pair).unwrap();
        assert_eq!(json, r#"[1435781430.781,"1.5"]"#);
    }

    #[test]
    fn special_values_round_trip() {
        let json = r#"[[1,"NaN"],[2,"+Inf"],[3,"-Inf"],[4.5,"42"]]"#;
        let pairs: Vec<SamplePair> = serde_json::from_str(json).unwrap();

        assert!(pairs[0].value.is_nan());
        assert_eq!(pairs[1].value, f64::INFINITY);
        assert_eq!(pairs[2].value, f64::NEG_INFINITY);
        assert_eq!(pairs[3], SamplePair::new(4_500, 42.0));

        let encoded = serde_json::to_string(&pairs[1..3]).unwrap();
        assert_eq!(encoded, r#"[[2.0,"+Inf"],[3.0,"-Inf"]]"#);
    }

    #[test]
    fn rejects_garbage_values() {
        let result: Result<SamplePair, _> = serde_json::from_str(r#"[1,"abc"]"#);
        assert!(result.is_err());
    }

    #[test]
    fn series_uses_metric_and_values_keys() {
        let series = SampleSeries::new(
            labels(&[("__name__", "up"), ("job", "node")]),
            vec![SamplePair::new(1_000, 1.0)],
        );
        let json = serde_json::to_value(&series).unwrap();

        assert_eq!(json["metric"]["__name__"], "up");
        assert_eq!(json["metric"]["job"], "node");
        assert_eq!(json["values"][0][1], "1");
    }

    #[test]
    fn decodes_each_result_type() {
        let matrix = serde_json::json!([
            {"metric": {"job": "a"}, "values": [[10, "1"], [20, "2"]]}
        ]);
        let value = QueryValue::from_json(ValueType::Matrix, matrix).unwrap();
        assert_eq!(value.value_type(), ValueType::Matrix);

        let vector = serde_json::json!([{"metric": {}, "value": [10, "1"]}]);
        let value = QueryValue::from_json(ValueType::Vector, vector).unwrap();
        assert_eq!(value.value_type(), ValueType::Vector);

        let scalar = serde_json::json!([10, "3"]);
        let value = QueryValue::from_json(ValueType::Scalar, scalar).unwrap();
        assert_eq!(value, QueryValue::Scalar(SamplePair::new(10_000, 3.0)));

        let string = serde_json::json!([10, "hello"]);
        let value = QueryValue::from_json(ValueType::String, string).unwrap();
        assert_eq!(value.value_type(), ValueType::String);
    }
}
