use k8s_openapi::api::core::v1::{EnvVar, Pod, PodSpec, PodStatus, ResourceRequirements, Toleration};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::util::label_value;

/// Label recording which tool created a pod.
pub static LABEL_MANAGED_BY: &str = "app.kubernetes.io/managed-by";

/// Label recording what a pod was created for (a node or alert name).
pub static LABEL_INSTANCE: &str = "app.kubernetes.io/instance";

/// Restart policy of every pod these tools create.
pub static RESTART_NEVER: &str = "Never";

/// A pod to submit with `kubectl apply`.  Its name and namespace are always
/// set.
#[derive(Clone, Debug, Serialize)]
#[serde(transparent)]
pub struct PodManifest {
    pod: Pod,
}

impl PodManifest {
    pub fn new(name: String, namespace: String, spec: PodSpec) -> Self {
        Self {
            pod: Pod {
                metadata: ObjectMeta {
                    name: Some(name),
                    namespace: Some(namespace),
                    ..ObjectMeta::default()
                },
                spec: Some(spec),
                status: None,
            },
        }
    }

    /// Set a label, overwriting any existing value.  Label values have a
    /// stricter syntax than names, so the value is made to fit it.
    pub fn with_label(mut self, key: &str, value: &str) -> Self {
        self.pod
            .metadata
            .labels
            .get_or_insert_with(BTreeMap::new)
            .insert(key.to_owned(), label_value(value));
        self
    }

    pub fn name(&self) -> &str {
        self.pod.metadata.name.as_deref().unwrap_or_default()
    }

    pub fn namespace(&self) -> &str {
        self.pod.metadata.namespace.as_deref().unwrap_or_default()
    }
}

/// Tolerate every taint, so the pod can run on any node.
pub fn tolerate_everything() -> Toleration {
    Toleration {
        operator: Some("Exists".to_owned()),
        ..Toleration::default()
    }
}

pub fn env_var(name: &str, value: String) -> EnvVar {
    EnvVar {
        name: name.to_owned(),
        value: Some(value),
        ..EnvVar::default()
    }
}

/// Request and limit the same amounts: `cpu` in cores, `memory` in MiB.
pub fn fixed_resources(cpu: Decimal, memory: u64) -> ResourceRequirements {
    let amounts = BTreeMap::from([
        ("cpu".to_owned(), Quantity(cpu.normalize().to_string())),
        ("memory".to_owned(), Quantity(format!("{memory}Mi"))),
    ]);

    ResourceRequirements {
        requests: Some(amounts.clone()),
        limits: Some(amounts),
        ..ResourceRequirements::default()
    }
}

///////////////////////////////////////////////////////////////////////////////

/// Questions asked of the observed state of a pod.
pub trait PodStatusExt {
    /// True if the `Ready` condition holds: every container is running and
    /// passing its readiness checks.
    fn is_ready(&self) -> bool;

    /// True if this is a terminal phase: no container will run again.
    fn is_terminal(&self) -> bool;

    /// Human-readable summary, for diagnostics.
    fn describe(&self) -> String;
}

impl PodStatusExt for PodStatus {
    fn is_ready(&self) -> bool {
        self.conditions
            .iter()
            .flatten()
            .any(|c| c.type_ == "Ready" && c.status == "True")
    }

    fn is_terminal(&self) -> bool {
        matches!(self.phase.as_deref(), Some("Succeeded" | "Failed"))
    }

    fn describe(&self) -> String {
        let phase = self.phase.as_deref().unwrap_or("no phase");
        match (&self.reason, &self.message) {
            (Some(reason), Some(message)) => format!("{phase} ({reason}: {message})"),
            (Some(reason), None) => format!("{phase} ({reason})"),
            (None, Some(message)) => format!("{phase} ({message})"),
            (None, None) => phase.to_owned(),
        }
    }
}
