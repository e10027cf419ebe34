//! Query strategies: what to ask Prometheus and how to read the answer
//!
//! A strategy produces the PromQL expression for the client to run and turns
//! each sample of the returned instant vector into a [`MetricRecord`].
//!
//! ## Strategies
//!
//! - [`GenericQuery`] - arbitrary expression, labels kept verbatim, no entity
//! - [`IstioQuery`] - Istio pod/service request rate and latency, with the
//!   destination UID normalized to `namespace/name`
//!
//! ## Extensibility
//!
//! To support a new metric family:
//! 1. Create a module under `src/query/`
//! 2. Implement [`MetricQuery`]
//! 3. Register it in [`create_query`]

pub mod generic;
pub mod istio;
pub mod record;

pub use generic::GenericQuery;
pub use istio::{IstioProfile, IstioQuery, IstioQueryConfig, QueryFamily};
pub use record::{EntityRef, MetricRecord};

use crate::client::response::RawSample;
use crate::error::{PromError, Result};

/// Producer of a query plus parser of its samples
///
/// Strategies with several precomputed queries expose them as query types;
/// single-query strategies keep the default of one type.
pub trait MetricQuery: Send + Sync {
    /// PromQL expression of the active query type
    fn query(&self) -> &str;

    /// Number of selectable query types
    fn query_type_count(&self) -> usize {
        1
    }

    /// Index of the active query type
    fn query_type(&self) -> usize {
        0
    }

    /// Select a query type in `[0, query_type_count())`
    fn set_query_type(&mut self, index: usize) -> Result<()> {
        let count = self.query_type_count();
        if index >= count {
            return Err(PromError::InvalidQueryType { index, count });
        }
        Ok(())
    }

    /// Convert one vector element into a record
    fn parse(&self, sample: &RawSample) -> Result<MetricRecord>;
}

/// Which strategy to build
#[derive(Debug, Clone)]
pub enum QueryKind {
    Generic(String),
    Istio(IstioQueryConfig),
}

/// Factory function to create a query strategy
pub fn create_query(kind: QueryKind) -> Box<dyn MetricQuery> {
    match kind {
        QueryKind::Generic(query) => Box::new(GenericQuery::new(query)),
        QueryKind::Istio(config) => Box::new(IstioQuery::new(config)),
    }
}
