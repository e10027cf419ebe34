//! Istio request-rate and latency queries
//!
//! Builds PromQL for the `turbo_*` metrics exported by the Istio mixer adapter
//! and maps each sample to the pod or service it was recorded for.
//!
//! Query types are indexes into the families of the active profile:
//!
//! | profile           | 0           | 1               | 2           | 3               |
//! |-------------------|-------------|-----------------|-------------|-----------------|
//! | `PodAndService`   | Pod QPS     | Pod Latency     | Service QPS | Service Latency |
//! | `ServiceOnly`     | Service QPS | Service Latency |             |                 |

use std::collections::BTreeMap;
use std::fmt;

use crate::client::response::RawSample;
use crate::error::{PromError, Result};
use crate::query::record::{EntityRef, MetricRecord};
use crate::query::MetricQuery;
use crate::utils::uid::UidKind;

/// Prefix of the Istio 1.x metric names; Istio 2.x drops it
pub const DEFAULT_METRIC_PREFIX: &str = "istio_";

/// Window of every `rate()` expression
pub const RATE_WINDOW: &str = "3m";

const RESPONSE_CODE_OK: &str = "200";

const POD_REQUEST_COUNT: &str = "turbo_pod_request_count";
const POD_LATENCY_SUM: &str = "turbo_pod_latency_time_ms_sum";
const POD_LATENCY_COUNT: &str = "turbo_pod_latency_time_ms_count";

const SVC_REQUEST_COUNT: &str = "turbo_service_request_count";
const SVC_LATENCY_SUM: &str = "turbo_service_latency_time_ms_sum";
const SVC_LATENCY_COUNT: &str = "turbo_service_latency_time_ms_count";

const DESTINATION_UID: &str = "destination_uid";
const DESTINATION_SERVICE: &str = "destination_service";

/// One kind of Istio measurement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryFamily {
    PodRequestRate,
    PodLatency,
    ServiceRequestRate,
    ServiceLatency,
}

impl QueryFamily {
    pub fn description(self) -> &'static str {
        match self {
            QueryFamily::PodRequestRate => "Pod QPS",
            QueryFamily::PodLatency => "Pod Latency",
            QueryFamily::ServiceRequestRate => "Service QPS",
            QueryFamily::ServiceLatency => "Service Latency",
        }
    }

    /// UID format of the destination label for this family
    pub fn uid_kind(self) -> UidKind {
        match self {
            QueryFamily::PodRequestRate | QueryFamily::PodLatency => UidKind::Pod,
            QueryFamily::ServiceRequestRate | QueryFamily::ServiceLatency => UidKind::Service,
        }
    }

    /// PromQL for this family, with `prefix` in front of every metric name
    pub fn expression(self, prefix: &str) -> String {
        match self {
            QueryFamily::PodRequestRate => rate_expr(prefix, POD_REQUEST_COUNT),
            QueryFamily::PodLatency => latency_expr(prefix, POD_LATENCY_SUM, POD_LATENCY_COUNT),
            QueryFamily::ServiceRequestRate => rate_expr(prefix, SVC_REQUEST_COUNT),
            QueryFamily::ServiceLatency => latency_expr(prefix, SVC_LATENCY_SUM, SVC_LATENCY_COUNT),
        }
    }
}

// rate(<metric>{response_code="200"}[3m])
fn rate_expr(prefix: &str, metric: &str) -> String {
    format!(
        "rate({}{}{{response_code=\"{}\"}}[{}])",
        prefix, metric, RESPONSE_CODE_OK, RATE_WINDOW
    )
}

// average latency = rate(sum) / rate(count)
fn latency_expr(prefix: &str, sum: &str, count: &str) -> String {
    format!("{}/{}", rate_expr(prefix, sum), rate_expr(prefix, count))
}

/// Set of query families a deployment exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IstioProfile {
    /// Pod and service metrics, keyed by `destination_uid`
    #[default]
    PodAndService,
    /// Service metrics only, keyed by `destination_service`
    ServiceOnly,
}

impl IstioProfile {
    pub fn families(self) -> &'static [QueryFamily] {
        match self {
            IstioProfile::PodAndService => &[
                QueryFamily::PodRequestRate,
                QueryFamily::PodLatency,
                QueryFamily::ServiceRequestRate,
                QueryFamily::ServiceLatency,
            ],
            IstioProfile::ServiceOnly => {
                &[QueryFamily::ServiceRequestRate, QueryFamily::ServiceLatency]
            }
        }
    }

    /// Label carrying the destination UID
    pub fn uid_label(self) -> &'static str {
        match self {
            IstioProfile::PodAndService => DESTINATION_UID,
            IstioProfile::ServiceOnly => DESTINATION_SERVICE,
        }
    }
}

/// Configuration for [`IstioQuery`]
#[derive(Debug, Clone)]
pub struct IstioQueryConfig {
    pub profile: IstioProfile,

    /// Prepended to every metric name, `istio_` by default
    pub metric_prefix: String,
}

impl Default for IstioQueryConfig {
    fn default() -> Self {
        IstioQueryConfig {
            profile: IstioProfile::PodAndService,
            metric_prefix: DEFAULT_METRIC_PREFIX.to_string(),
        }
    }
}

/// Istio query strategy
///
/// All expressions are built once at construction; selecting a query type
/// only moves an index.
#[derive(Debug, Clone)]
pub struct IstioQuery {
    profile: IstioProfile,
    queries: Vec<(QueryFamily, String)>,
    qtype: usize,
}

impl IstioQuery {
    pub fn new(config: IstioQueryConfig) -> Self {
        let queries = config
            .profile
            .families()
            .iter()
            .map(|family| (*family, family.expression(&config.metric_prefix)))
            .collect();

        IstioQuery {
            profile: config.profile,
            queries,
            qtype: 0,
        }
    }

    pub fn profile(&self) -> IstioProfile {
        self.profile
    }

    /// Family of the active query type
    pub fn family(&self) -> QueryFamily {
        self.queries[self.qtype].0
    }

    fn entity(&self) -> EntityRef {
        EntityRef {
            label: self.profile.uid_label(),
            kind: self.family().uid_kind(),
        }
    }
}

impl Default for IstioQuery {
    fn default() -> Self {
        IstioQuery::new(IstioQueryConfig::default())
    }
}

impl MetricQuery for IstioQuery {
    fn query(&self) -> &str {
        &self.queries[self.qtype].1
    }

    fn query_type_count(&self) -> usize {
        self.queries.len()
    }

    fn query_type(&self) -> usize {
        self.qtype
    }

    fn set_query_type(&mut self, index: usize) -> Result<()> {
        if index >= self.queries.len() {
            return Err(PromError::InvalidQueryType {
                index,
                count: self.queries.len(),
            });
        }
        self.qtype = index;
        Ok(())
    }

    fn parse(&self, sample: &RawSample) -> Result<MetricRecord> {
        let value = sample.value()?;
        let entity = self.entity();

        let uid = sample
            .labels
            .get(entity.label)
            .ok_or_else(|| PromError::MissingLabel(entity.label.to_string()))?;

        let labels = BTreeMap::from([(entity.label.to_string(), uid.clone())]);
        Ok(MetricRecord::new(value, labels)?.with_entity(entity))
    }
}

impl fmt::Display for IstioQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (_, query)) in self.queries.iter().enumerate() {
            writeln!(f, "qtype:{}, query={}", i, query)?;
        }
        Ok(())
    }
}
