use k8s_openapi::api::core::v1::PodStatus;
use std::fmt;
use std::time::Duration;

use crate::error::Error;
use crate::resources::pod::{PodManifest, PodStatusExt};

/// Interval to poll for the pod status.
pub static POLL_INTERVAL: u64 = 1;

/// Identifies a pod.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PodRef {
    pub name: String,
    pub namespace: String,
}

impl PodRef {
    pub fn of(manifest: &PodManifest) -> Self {
        Self {
            name: manifest.name().to_owned(),
            namespace: manifest.namespace().to_owned(),
        }
    }
}

impl fmt::Display for PodRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{ns}/{name}", ns = self.namespace, name = self.name)
    }
}

/// A state of a pod worth waiting for.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Condition {
    /// Every container is running and ready, so can be exec'd into.
    Ready,
    /// Every container has terminated.
    Completed,
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready => write!(f, "ready"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

/// Result of checking a pod status against a condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Progress {
    Waiting,
    Met,
    /// The pod can never meet the condition.
    Unreachable(String),
}

impl Condition {
    pub fn check(self, status: &PodStatus) -> Progress {
        match self {
            Self::Ready if status.is_ready() => Progress::Met,
            Self::Ready if status.is_terminal() => Progress::Unreachable(format!(
                "pod terminated before becoming ready: {status}",
                status = status.describe()
            )),
            Self::Completed if status.is_terminal() => Progress::Met,
            Self::Ready | Self::Completed => Progress::Waiting,
        }
    }
}

/// The operations these tools need from the cluster control plane.
///
/// Every method except `delete` blocks until the cluster has answered.
#[allow(async_fn_in_trait)]
pub trait Cluster {
    /// The namespace of the current context, if it sets one.
    async fn current_namespace(&self) -> Result<Option<String>, Error>;

    async fn namespace_exists(&self, namespace: &str) -> Result<bool, Error>;

    async fn node_names(&self) -> Result<Vec<String>, Error>;

    async fn service_exists(&self, namespace: &str, service: &str) -> Result<bool, Error>;

    /// Submit a manifest.  An error means the pod was not created.
    async fn apply(&self, manifest: &PodManifest) -> Result<(), Error>;

    async fn pod_status(&self, pod: &PodRef) -> Result<PodStatus, Error>;

    /// Attach the current terminal to `command` running inside the pod, and
    /// return when it exits.
    async fn exec_interactive(&self, pod: &PodRef, command: &[String]) -> Result<(), Error>;

    async fn logs(&self, pod: &PodRef) -> Result<String, Error>;

    /// Request deletion of a pod and return immediately.  The outcome is not
    /// observed: deleting a pod which does not exist is not an error.
    fn delete(&self, pod: &PodRef);

    /// Poll the pod status until the condition is met or cannot be met.  This
    /// has no timeout of its own.
    async fn wait_for(&self, pod: &PodRef, condition: Condition) -> Result<(), Error> {
        loop {
            let status = self.pod_status(pod).await?;
            match condition.check(&status) {
                Progress::Met => return Ok(()),
                Progress::Unreachable(reason) => {
                    return Err(Error::Wait {
                        pod: pod.name.clone(),
                        reason,
                    })
                }
                Progress::Waiting => {
                    tracing::debug!(pod = %pod, status = %status.describe(), %condition, "waiting");
                }
            }

            tokio::time::sleep(Duration::from_secs(POLL_INTERVAL)).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn status(value: serde_json::Value) -> PodStatus {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn ready_condition() {
        let pending = status(json!({"phase": "Pending"}));
        let running_unready = status(json!({
            "phase": "Running",
            "conditions": [{"type": "Ready", "status": "False"}],
        }));
        let ready = status(json!({
            "phase": "Running",
            "conditions": [{"type": "Ready", "status": "True"}],
        }));
        let failed = status(json!({"phase": "Failed", "reason": "Error"}));

        assert_eq!(Progress::Waiting, Condition::Ready.check(&pending));
        assert_eq!(Progress::Waiting, Condition::Ready.check(&running_unready));
        assert_eq!(Progress::Met, Condition::Ready.check(&ready));
        assert!(matches!(
            Condition::Ready.check(&failed),
            Progress::Unreachable(reason) if reason.contains("Failed (Error)")
        ));
    }

    #[test]
    fn completed_condition() {
        let running = status(json!({"phase": "Running"}));
        let succeeded = status(json!({"phase": "Succeeded"}));
        let failed = status(json!({"phase": "Failed"}));

        assert_eq!(Progress::Waiting, Condition::Completed.check(&running));
        assert_eq!(Progress::Met, Condition::Completed.check(&succeeded));
        assert_eq!(Progress::Met, Condition::Completed.check(&failed));
    }

    #[test]
    fn pod_ref_display() {
        let pod = PodRef {
            name: "nodeshell-node-7-abcd1234".to_owned(),
            namespace: "default".to_owned(),
        };
        assert_eq!("default/nodeshell-node-7-abcd1234", pod.to_string());
    }
}
