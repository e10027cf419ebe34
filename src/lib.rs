//! Prometheus instant-query client with entity mapping
//!
//! [`MetricRestClient`] runs PromQL instant queries and hands each sample of
//! the returned vector to a [`MetricQuery`] strategy, which turns it into a
//! [`MetricRecord`]. Strategies for Istio traffic metrics derive a
//! `namespace/name` entity ID from the destination UID of each sample.
//!
//! ```no_run
//! use prom_query::{ClientConfig, IstioQuery, MetricQuery, MetricRestClient};
//!
//! # async fn run() -> prom_query::Result<()> {
//! let client = MetricRestClient::new(ClientConfig::new("http://localhost:19090"))?;
//! let mut query = IstioQuery::default();
//! query.set_query_type(1)?;
//! for record in client.get_metrics(&query).await? {
//!     println!("{}", record);
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod observer;
pub mod query;
pub mod utils;

pub use client::response::{QueryData, RawSample};
pub use client::MetricRestClient;
pub use config::{ClientConfig, Credentials};
pub use error::{PromError, Result};
pub use observer::{QueryObserver, TracingObserver};
pub use query::{
    create_query, GenericQuery, IstioProfile, IstioQuery, IstioQueryConfig, MetricQuery,
    MetricRecord, QueryFamily, QueryKind,
};
pub use utils::uid::{normalize_pod_uid, normalize_service_uid, UidKind};
