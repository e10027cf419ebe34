//! Normalization of Istio UIDs into `namespace/name` entity IDs
//!
//! Istio reports destinations in two textual formats:
//! - pods as `kubernetes://<podName>.<namespace>`
//! - services as `<name>.<namespace>.svc.<cluster domain>`
//!
//! Both are converted to the `<namespace>/<name>` form used to correlate a
//! metric with a Kubernetes object.

use tracing::{debug, warn};

use crate::config::K8S_PREFIX;
use crate::error::{PromError, Result};

/// Which UID format a label carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UidKind {
    /// `kubernetes://<podName>.<namespace>`
    Pod,
    /// `<name>.<namespace>.svc...`
    Service,
}

impl UidKind {
    /// Convert a UID of this kind to `<namespace>/<name>`
    pub fn normalize(self, uid: &str) -> Result<String> {
        match self {
            UidKind::Pod => normalize_pod_uid(uid),
            UidKind::Service => normalize_service_uid(uid),
        }
    }
}

/// Convert `kubernetes://<podName>.<namespace>` to `<namespace>/<podName>`
///
/// For example `kubernetes://video-671194421-vpxkh.default` becomes
/// `default/video-671194421-vpxkh`. Extra dot-separated fields after the
/// namespace are ignored.
pub fn normalize_pod_uid(uid: &str) -> Result<String> {
    let rest = uid
        .strip_prefix(K8S_PREFIX)
        .ok_or_else(|| PromError::malformed_uid(uid, format!("not start with {}", K8S_PREFIX)))?;

    let items: Vec<&str> = rest.split('.').collect();
    if items.len() < 2 {
        return Err(PromError::malformed_uid(
            uid,
            format!("not enough fields: {}", rest),
        ));
    }

    if items.len() > 2 {
        warn!(uid = %uid, fields = items.len(), "expected 2 fields in pod uid");
    }

    let name = items[0].trim();
    let namespace = items[1].trim();
    if name.is_empty() || namespace.is_empty() {
        return Err(PromError::malformed_uid(
            uid,
            format!("invalid fields: {}/{}", name, namespace),
        ));
    }

    Ok(format!("{}/{}", namespace, name))
}

/// Convert `<name>.<namespace>.svc.<domain>` to `<namespace>/<name>`
///
/// For example `productpage.default.svc.cluster.local` becomes
/// `default/productpage`. The placeholder value `unknown` is always rejected.
pub fn normalize_service_uid(uid: &str) -> Result<String> {
    if uid == "unknown" {
        return Err(PromError::malformed_uid(uid, "unknown service"));
    }

    let items: Vec<&str> = uid.split('.').map(str::trim).collect();
    if items.len() < 3 {
        debug!(uid = %uid, fields = items.len(), "not enough fields in service uid");
        return Err(PromError::malformed_uid(
            uid,
            format!("not enough fields {} vs. 3", items.len()),
        ));
    }

    if items[2] != "svc" {
        debug!(uid = %uid, field = %items[2], "third field of service uid is not svc");
        return Err(PromError::malformed_uid(
            uid,
            format!("fields[2] should be [svc]: [{}]", items[2]),
        ));
    }

    let (name, namespace) = (items[0], items[1]);
    if name.is_empty() || namespace.is_empty() {
        return Err(PromError::malformed_uid(
            uid,
            format!("invalid fields: {}/{}", name, namespace),
        ));
    }

    Ok(format!("{}/{}", namespace, name))
}
