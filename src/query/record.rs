use std::collections::BTreeMap;
use std::fmt;

use crate::error::{PromError, Result};
use crate::utils::uid::UidKind;

/// Where the entity ID of a record comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityRef {
    /// Label holding the raw UID
    pub label: &'static str,
    /// Format of that UID
    pub kind: UidKind,
}

/// A parsed sample: its value plus the labels kept by the query strategy
///
/// The entity ID is derived from the labels on demand and never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricRecord {
    value: f64,
    labels: BTreeMap<String, String>,
    entity: Option<EntityRef>,
}

impl MetricRecord {
    /// Create a record without an entity; fails on NaN
    pub fn new(value: f64, labels: BTreeMap<String, String>) -> Result<Self> {
        if value.is_nan() {
            return Err(PromError::InvalidValue("NaN".to_string()));
        }

        Ok(MetricRecord {
            value,
            labels,
            entity: None,
        })
    }

    /// Derive the entity ID from `entity.label`, normalized as `entity.kind`
    pub fn with_entity(mut self, entity: EntityRef) -> Self {
        self.entity = Some(entity);
        self
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn labels(&self) -> &BTreeMap<String, String> {
        &self.labels
    }

    pub fn label(&self, name: &str) -> Option<&str> {
        self.labels.get(name).map(String::as_str)
    }

    pub fn entity(&self) -> Option<EntityRef> {
        self.entity
    }

    /// `namespace/name` of the pod or service this record describes
    ///
    /// Records without an entity return an empty string.
    pub fn entity_id(&self) -> Result<String> {
        let Some(entity) = self.entity else {
            return Ok(String::new());
        };

        let uid = self
            .label(entity.label)
            .ok_or_else(|| PromError::MissingLabel(entity.label.to_string()))?;
        entity.kind.normalize(uid)
    }
}

impl fmt::Display for MetricRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.entity.is_some() {
            return match self.entity_id() {
                Ok(uid) => write!(f, "uid={}, value={:.5}", uid, self.value),
                Err(e) => write!(f, "Failed to get EntityID: {}", e),
            };
        }

        writeln!(f, "value={:.6}", self.value)?;
        for (key, value) in &self.labels {
            writeln!(f, "\t{}={}", key, value)?;
        }
        Ok(())
    }
}
