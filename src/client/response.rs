//! Wire format of the Prometheus HTTP API
//!
//! Every endpoint answers with the same envelope:
//! `{"status": "success"|"error", "data": ..., "errorType": ..., "error": ...}`.
//! Instant queries put `{"resultType": ..., "result": ...}` in `data`.

use serde::Deserialize;
use std::collections::HashMap;

use crate::error::{PromError, Result};

/// The only result type the client decodes into samples
pub const RESULT_TYPE_VECTOR: &str = "vector";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Error,
}

/// Top-level response envelope, generic over the payload in `data`
#[derive(Debug, Deserialize)]
pub struct QueryEnvelope<T> {
    pub status: ResponseStatus,
    pub data: Option<T>,
    #[serde(rename = "errorType")]
    pub error_type: Option<String>,
    pub error: Option<String>,
}

impl<T> QueryEnvelope<T> {
    /// Fail with the server-supplied message when `status == "error"`
    pub fn into_data(self) -> Result<Option<T>> {
        match self.status {
            ResponseStatus::Success => Ok(self.data),
            ResponseStatus::Error => Err(PromError::Server {
                error_type: self.error_type,
                message: self.error.unwrap_or_default(),
            }),
        }
    }
}

/// Payload of an instant query: the result type and its still-encoded body
#[derive(Debug, Clone, Deserialize)]
pub struct QueryData {
    #[serde(rename = "resultType")]
    pub result_type: String,
    pub result: serde_json::Value,
}

impl QueryData {
    pub fn is_vector(&self) -> bool {
        self.result_type == RESULT_TYPE_VECTOR
    }

    /// Decode the body of a `vector` result
    pub fn samples(&self) -> Result<Vec<RawSample>> {
        if !self.is_vector() {
            return Err(PromError::UnsupportedResultType(self.result_type.clone()));
        }
        Vec::<RawSample>::deserialize(&self.result).map_err(|e| PromError::decode("vector result", e))
    }
}

/// `[<unix timestamp>, "<value>"]` as sent by Prometheus
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SamplePair(pub f64, pub String);

/// One element of an instant vector
#[derive(Debug, Clone, Deserialize)]
pub struct RawSample {
    /// Label key-value pairs of the series
    #[serde(rename = "metric", default)]
    pub labels: HashMap<String, String>,
    pub value: SamplePair,
}

impl RawSample {
    pub fn new(labels: HashMap<String, String>, timestamp: f64, value: impl Into<String>) -> Self {
        RawSample {
            labels,
            value: SamplePair(timestamp, value.into()),
        }
    }

    /// Unix timestamp of the sample in seconds
    pub fn timestamp(&self) -> f64 {
        self.value.0
    }

    /// Numeric value of the sample
    ///
    /// Prometheus encodes values as strings so that `NaN` and `+Inf` survive
    /// JSON. Only those spellings and plain decimal numbers are accepted.
    /// `NaN` parses successfully here; rejecting it is up to the record.
    pub fn value(&self) -> Result<f64> {
        let raw = self.value.1.as_str();
        match raw {
            "NaN" => Ok(f64::NAN),
            "+Inf" | "Inf" => Ok(f64::INFINITY),
            "-Inf" => Ok(f64::NEG_INFINITY),
            _ if raw.bytes().all(|b| b.is_ascii_digit() || b"+-.eE".contains(&b)) => raw
                .parse::<f64>()
                .map_err(|e| PromError::InvalidValue(format!("{}: {}", raw, e))),
            _ => Err(PromError::InvalidValue(format!("{}: not a number", raw))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::de::IgnoredAny;

    #[test]
    fn test_decode_vector_envelope() {
        let body = r#"{
            "status": "success",
            "data": {
                "resultType": "vector",
                "result": [
                    {"metric": {"__name__": "up", "job": "prometheus"}, "value": [1435781451.781, "1"]},
                    {"metric": {"job": "node"}, "value": [1435781451.781, "0.25"]}
                ]
            }
        }"#;

        let envelope: QueryEnvelope<QueryData> = serde_json::from_str(body).unwrap();
        let data = envelope.into_data().unwrap().unwrap();
        assert!(data.is_vector());

        let samples = data.samples().unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].labels.get("job").unwrap(), "prometheus");
        assert_eq!(samples[0].value().unwrap(), 1.0);
        assert_eq!(samples[0].timestamp(), 1435781451.781);
        assert_eq!(samples[1].value().unwrap(), 0.25);
    }

    #[test]
    fn test_decode_error_envelope() {
        let body = r#"{"status":"error","errorType":"bad_data","error":"bad query"}"#;
        let envelope: QueryEnvelope<QueryData> = serde_json::from_str(body).unwrap();
        let err = envelope.into_data().unwrap_err();
        match err {
            PromError::Server {
                error_type,
                message,
            } => {
                assert_eq!(error_type.as_deref(), Some("bad_data"));
                assert_eq!(message, "bad query");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_decode_label_values_envelope() {
        let body = r#"{"status":"success","data":["node","prometheus"]}"#;
        let envelope: QueryEnvelope<IgnoredAny> = serde_json::from_str(body).unwrap();
        assert_eq!(envelope.status, ResponseStatus::Success);
        assert!(envelope.into_data().is_ok());
    }

    #[test]
    fn test_samples_rejects_non_vector() {
        let data = QueryData {
            result_type: "matrix".to_string(),
            result: serde_json::json!([]),
        };
        assert!(matches!(
            data.samples(),
            Err(PromError::UnsupportedResultType(t)) if t == "matrix"
        ));
    }

    #[test]
    fn test_samples_rejects_malformed_body() {
        let data = QueryData {
            result_type: "vector".to_string(),
            result: serde_json::json!([{"metric": {}, "value": "oops"}]),
        };
        assert!(matches!(data.samples(), Err(PromError::Decode { .. })));
    }

    #[test]
    fn test_special_values() {
        let nan = RawSample::new(HashMap::new(), 0.0, "NaN");
        assert!(nan.value().unwrap().is_nan());

        let inf = RawSample::new(HashMap::new(), 0.0, "+Inf");
        assert_eq!(inf.value().unwrap(), f64::INFINITY);

        let neg_inf = RawSample::new(HashMap::new(), 0.0, "-Inf");
        assert_eq!(neg_inf.value().unwrap(), f64::NEG_INFINITY);

        let small = RawSample::new(HashMap::new(), 0.0, "-1.5e-3");
        assert_eq!(small.value().unwrap(), -0.0015);
    }

    #[test]
    fn test_non_canonical_values_rejected() {
        for raw in ["abc", "", " 1 ", "1\n", "infinity", "inf", "nan", "1.2.3"] {
            let sample = RawSample::new(HashMap::new(), 0.0, raw);
            assert!(
                matches!(sample.value(), Err(PromError::InvalidValue(_))),
                "{:?} should be rejected",
                raw
            );
        }
    }
}
