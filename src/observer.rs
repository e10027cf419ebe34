//! Observability hooks for metric collection
//!
//! The client reports per-sample outcomes through an injected [`QueryObserver`]
//! instead of logging directly, so callers decide where rejected samples go.

use tracing::{debug, warn};

use crate::error::PromError;

/// Receives the outcome of each `get_metrics` call
pub trait QueryObserver: Send + Sync {
    /// A vector element could not be turned into a record and was dropped
    fn sample_rejected(&self, query: &str, index: usize, error: &PromError);

    /// All elements of a response have been processed
    fn collection_finished(&self, _query: &str, _success: usize, _failure: usize) {}
}

/// Default observer forwarding everything to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl QueryObserver for TracingObserver {
    fn sample_rejected(&self, query: &str, index: usize, error: &PromError) {
        warn!(query = %query, index = index, error = %error, "Failed to parse sample");
    }

    fn collection_finished(&self, query: &str, success: usize, failure: usize) {
        debug!(
            query = %query,
            success = success,
            failure = failure,
            total = success + failure,
            "Metrics collection completed"
        );
    }
}
