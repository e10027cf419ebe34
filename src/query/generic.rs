//! Passthrough strategy for arbitrary PromQL expressions

use std::collections::BTreeMap;

use crate::client::response::RawSample;
use crate::error::Result;
use crate::query::record::MetricRecord;
use crate::query::MetricQuery;

/// Runs a caller-supplied expression and keeps every label of each sample
#[derive(Debug, Clone, Default)]
pub struct GenericQuery {
    query: String,
}

impl GenericQuery {
    pub fn new(query: impl Into<String>) -> Self {
        GenericQuery {
            query: query.into(),
        }
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }
}

impl MetricQuery for GenericQuery {
    fn query(&self) -> &str {
        &self.query
    }

    fn parse(&self, sample: &RawSample) -> Result<MetricRecord> {
        let labels: BTreeMap<String, String> = sample
            .labels
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        MetricRecord::new(sample.value()?, labels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PromError;
    use std::collections::HashMap;

    fn sample(value: &str) -> RawSample {
        let labels = HashMap::from([
            ("__name__".to_string(), "istio_request_count".to_string()),
            ("destination_service".to_string(), "reviews.default.svc.cluster.local".to_string()),
        ]);
        RawSample::new(labels, 1_700_000_000.0, value)
    }

    #[test]
    fn test_query_roundtrip() {
        let mut query = GenericQuery::new("up");
        assert_eq!(query.query(), "up");

        query.set_query("rate(istio_request_count[3m])");
        assert_eq!(query.query(), "rate(istio_request_count[3m])");
    }

    #[test]
    fn test_parse_copies_all_labels() {
        let query = GenericQuery::new("istio_request_count");
        let record = query.parse(&sample("12.5")).unwrap();

        assert_eq!(record.value(), 12.5);
        assert_eq!(record.labels().len(), 2);
        assert_eq!(record.label("__name__"), Some("istio_request_count"));
        assert_eq!(record.entity_id().unwrap(), "");
    }

    #[test]
    fn test_parse_rejects_nan() {
        let query = GenericQuery::new("istio_request_count");
        assert!(matches!(
            query.parse(&sample("NaN")),
            Err(PromError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_single_query_type() {
        let mut query = GenericQuery::new("up");
        assert_eq!(query.query_type_count(), 1);
        assert!(query.set_query_type(0).is_ok());
        assert!(matches!(
            query.set_query_type(1),
            Err(PromError::InvalidQueryType { index: 1, count: 1 })
        ));
    }
}
