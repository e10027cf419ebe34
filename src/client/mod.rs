//! Prometheus REST client
//!
//! Issues instant queries against `<host>/api/v1/query`, decodes the response
//! envelope and drives a [`MetricQuery`] over the returned vector.
//! Every call is a single HTTP round trip; nothing is retried or cached.

pub mod response;

use std::fmt;
use std::sync::Arc;

use reqwest::header::ACCEPT;
use reqwest::{StatusCode, Url};
use serde::de::{DeserializeOwned, IgnoredAny};
use tracing::{debug, info, warn};

use crate::config::{label_values_path, ClientConfig, API_QUERY_PATH};
use crate::error::{PromError, Result};
use crate::observer::{QueryObserver, TracingObserver};
use crate::query::{MetricQuery, MetricRecord};
use response::{QueryData, QueryEnvelope};

/// REST client for a Prometheus-compatible server
///
/// Holds only immutable configuration plus the connection pool of the
/// underlying HTTP client, so it can be cloned and shared freely.
#[derive(Clone)]
pub struct MetricRestClient {
    config: ClientConfig,
    // host without trailing slash; API paths are appended verbatim
    base: String,
    http: reqwest::Client,
    observer: Arc<dyn QueryObserver>,
}

impl fmt::Debug for MetricRestClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetricRestClient")
            .field("config", &self.config)
            .field("base", &self.base)
            .finish()
    }
}

impl MetricRestClient {
    /// Create a client for the configured host
    ///
    /// Fails with `InvalidUrl` unless the host is an absolute `http` or
    /// `https` URL.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let url = Url::parse(&config.host).map_err(|e| PromError::InvalidUrl {
            url: config.host.clone(),
            reason: e.to_string(),
        })?;

        let scheme = url.scheme();
        if scheme != "http" && scheme != "https" {
            return Err(PromError::InvalidUrl {
                url: config.host.clone(),
                reason: format!("unsupported scheme {}", scheme),
            });
        }

        let mut builder = reqwest::Client::builder().timeout(config.timeout);
        if skips_tls_verification(scheme, &config) {
            warn!(host = %config.host, "TLS certificate verification is disabled");
            builder = builder.danger_accept_invalid_certs(true);
        }
        let http = builder.build()?;

        info!(
            host = %config.host,
            timeout_ms = config.timeout.as_millis(),
            basic_auth = config.credentials.is_some(),
            "Prometheus server address configured"
        );

        Ok(MetricRestClient {
            base: config.host.trim_end_matches('/').to_string(),
            config,
            http,
            observer: Arc::new(TracingObserver),
        })
    }

    /// Replace the observer that receives per-sample outcomes
    pub fn with_observer(mut self, observer: Arc<dyn QueryObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Run an instant query and return the decoded `data` section
    pub async fn query(&self, query: &str) -> Result<QueryData> {
        let (status, body) = self.get(API_QUERY_PATH, &[("query", query)]).await?;

        // `data` stays raw until the status is known; error envelopes may
        // carry a payload of any shape.
        let envelope: QueryEnvelope<serde_json::Value> = decode_envelope(status, &body)?;
        let raw = envelope
            .into_data()?
            .ok_or_else(|| PromError::decode("query response", "missing data"))?;
        let data: QueryData =
            serde_json::from_value(raw).map_err(|e| PromError::decode("query data", e))?;

        debug!(
            query = %query,
            result_type = %data.result_type,
            "Query succeeded"
        );
        Ok(data)
    }

    /// Run the strategy's query and parse every sample of the result
    ///
    /// Samples the strategy rejects are reported to the observer and left out;
    /// the remaining records are returned in response order.
    pub async fn get_metrics<Q>(&self, input: &Q) -> Result<Vec<MetricRecord>>
    where
        Q: MetricQuery + ?Sized,
    {
        let query = input.query();
        let data = self.query(query).await?;
        let samples = data.samples()?;

        let mut records = Vec::with_capacity(samples.len());
        let mut failure_count = 0;
        for (index, sample) in samples.iter().enumerate() {
            match input.parse(sample) {
                Ok(record) => records.push(record),
                Err(e) => {
                    failure_count += 1;
                    self.observer.sample_rejected(query, index, &e);
                }
            }
        }

        self.observer
            .collection_finished(query, records.len(), failure_count);
        Ok(records)
    }

    /// Raw response listing every value of `label`
    ///
    /// Only the envelope status is inspected; the body is returned as-is.
    pub async fn label_values(&self, label: &str) -> Result<String> {
        let (status, body) = self.get(&label_values_path(label), &[]).await?;

        match serde_json::from_str::<QueryEnvelope<IgnoredAny>>(&body) {
            Ok(envelope) => {
                envelope.into_data()?;
            }
            Err(_) if !status.is_success() => {
                return Err(PromError::HttpStatus {
                    status: status.as_u16(),
                    body,
                });
            }
            Err(e) => {
                warn!(label = %label, error = %e, "Label values response is not a JSON envelope");
            }
        }

        Ok(body)
    }

    /// Raw listing of the `job` label values
    pub async fn jobs(&self) -> Result<String> {
        self.label_values("job").await
    }

    async fn get(&self, path: &str, params: &[(&str, &str)]) -> Result<(StatusCode, String)> {
        let url = format!("{}{}", self.base, path);
        debug!(path = %url, "Sending request to Prometheus");

        let mut request = self.http.get(&url).header(ACCEPT, "application/json");
        if !params.is_empty() {
            request = request.query(params);
        }
        if let Some(creds) = &self.config.credentials {
            request = request.basic_auth(&creds.username, Some(&creds.password));
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        debug!(path = %url, status = status.as_u16(), body_size = body.len(), "Received response");
        Ok((status, body))
    }
}

// Plain http hosts have no certificate to skip.
fn skips_tls_verification(scheme: &str, config: &ClientConfig) -> bool {
    scheme == "https" && config.insecure_skip_tls_verify
}

// Prometheus sends error envelopes with 4xx/5xx codes, so the body is decoded
// first and the status only matters when that fails.
fn decode_envelope<T: DeserializeOwned>(status: StatusCode, body: &str) -> Result<QueryEnvelope<T>> {
    serde_json::from_str(body).map_err(|e| {
        if status.is_success() {
            PromError::decode("response envelope", e)
        } else {
            PromError::HttpStatus {
                status: status.as_u16(),
                body: body.to_string(),
            }
        }
    })
}
