//! An in-memory `Cluster` which records every call made to it.

use k8s_openapi::api::core::v1::PodStatus;
use serde_json::Value;
use std::cell::RefCell;
use std::collections::VecDeque;

use crate::cluster::{Cluster, PodRef};
use crate::error::{Error, KubectlError};
use crate::resources::pod::PodManifest;

/// A call made against a `FakeCluster`.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CurrentNamespace,
    NamespaceExists(String),
    NodeNames,
    ServiceExists(String, String),
    /// The manifest, as JSON.
    Apply(Value),
    PodStatus(PodRef),
    Exec(PodRef, Vec<String>),
    Logs(PodRef),
    Delete(PodRef),
}

/// How `exec_interactive` behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecBehaviour {
    Succeed,
    Fail,
    /// Never returns, like a session the operator is still using.
    Hang,
}

#[derive(Debug)]
pub struct FakeCluster {
    current_namespace: Option<String>,
    namespaces: Vec<String>,
    nodes: Vec<String>,
    services: Vec<(String, String)>,
    failing_lookups: bool,
    failing_apply: bool,
    statuses: RefCell<VecDeque<PodStatus>>,
    exec: ExecBehaviour,
    logs: String,
    calls: RefCell<Vec<Call>>,
}

impl Default for FakeCluster {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeCluster {
    /// A cluster with the `default` namespace, no nodes, no services, and
    /// pods which become ready immediately.
    pub fn new() -> Self {
        Self {
            current_namespace: None,
            namespaces: vec!["default".to_owned()],
            nodes: Vec::new(),
            services: Vec::new(),
            failing_lookups: false,
            failing_apply: false,
            statuses: RefCell::new(VecDeque::from([status(serde_json::json!({
                "phase": "Running",
                "conditions": [{"type": "Ready", "status": "True"}],
            }))])),
            exec: ExecBehaviour::Succeed,
            logs: String::new(),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn with_current_namespace(mut self, namespace: &str) -> Self {
        self.current_namespace = Some(namespace.to_owned());
        self
    }

    pub fn with_namespaces(mut self, namespaces: &[&str]) -> Self {
        self.namespaces.extend(namespaces.iter().map(|s| (*s).to_owned()));
        self
    }

    pub fn with_nodes(mut self, nodes: &[&str]) -> Self {
        self.nodes.extend(nodes.iter().map(|s| (*s).to_owned()));
        self
    }

    pub fn with_service(mut self, namespace: &str, service: &str) -> Self {
        self.services.push((namespace.to_owned(), service.to_owned()));
        self
    }

    /// Every lookup fails, as if the API server were unreachable.
    pub fn failing_lookups(mut self) -> Self {
        self.failing_lookups = true;
        self
    }

    /// Every manifest is rejected.
    pub fn failing_apply(mut self) -> Self {
        self.failing_apply = true;
        self
    }

    /// Statuses returned by successive `pod_status` calls, as JSON.  The last
    /// one repeats forever.
    pub fn with_pod_statuses(self, statuses: &[Value]) -> Self {
        *self.statuses.borrow_mut() = statuses.iter().cloned().map(status).collect();
        self
    }

    pub fn with_exec(mut self, exec: ExecBehaviour) -> Self {
        self.exec = exec;
        self
    }

    pub fn with_logs(mut self, logs: &str) -> Self {
        self.logs = logs.to_owned();
        self
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    /// The pods `delete` was called for, in order.
    pub fn deleted(&self) -> Vec<PodRef> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|c| match c {
                Call::Delete(pod) => Some(pod.clone()),
                _ => None,
            })
            .collect()
    }

    /// The manifests submitted so far.
    pub fn applied(&self) -> Vec<Value> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|c| match c {
                Call::Apply(manifest) => Some(manifest.clone()),
                _ => None,
            })
            .collect()
    }

    /// Number of calls which change cluster state.
    pub fn mutations(&self) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|c| matches!(c, Call::Apply(_) | Call::Delete(_)))
            .count()
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }

    fn lookup<T>(&self, verb: &str, value: T) -> Result<T, Error> {
        if self.failing_lookups {
            Err(fake_error(verb))
        } else {
            Ok(value)
        }
    }
}

impl Cluster for FakeCluster {
    async fn current_namespace(&self) -> Result<Option<String>, Error> {
        self.record(Call::CurrentNamespace);
        self.lookup("config", self.current_namespace.clone())
    }

    async fn namespace_exists(&self, namespace: &str) -> Result<bool, Error> {
        self.record(Call::NamespaceExists(namespace.to_owned()));
        self.lookup("get", self.namespaces.iter().any(|n| n == namespace))
    }

    async fn node_names(&self) -> Result<Vec<String>, Error> {
        self.record(Call::NodeNames);
        self.lookup("get", self.nodes.clone())
    }

    async fn service_exists(&self, namespace: &str, service: &str) -> Result<bool, Error> {
        self.record(Call::ServiceExists(
            namespace.to_owned(),
            service.to_owned(),
        ));
        let exists = self
            .services
            .iter()
            .any(|(ns, svc)| ns == namespace && svc == service);
        self.lookup("get", exists)
    }

    async fn apply(&self, manifest: &PodManifest) -> Result<(), Error> {
        self.record(Call::Apply(serde_json::to_value(manifest)?));
        if self.failing_apply {
            Err(fake_error("apply"))
        } else {
            Ok(())
        }
    }

    async fn pod_status(&self, pod: &PodRef) -> Result<PodStatus, Error> {
        self.record(Call::PodStatus(pod.clone()));
        let mut statuses = self.statuses.borrow_mut();
        let next = if statuses.len() > 1 {
            statuses.pop_front()
        } else {
            statuses.front().cloned()
        };
        Ok(next.unwrap_or_default())
    }

    async fn exec_interactive(&self, pod: &PodRef, command: &[String]) -> Result<(), Error> {
        self.record(Call::Exec(pod.clone(), command.to_vec()));
        match self.exec {
            ExecBehaviour::Succeed => Ok(()),
            ExecBehaviour::Fail => Err(fake_error("exec")),
            ExecBehaviour::Hang => std::future::pending().await,
        }
    }

    async fn logs(&self, pod: &PodRef) -> Result<String, Error> {
        self.record(Call::Logs(pod.clone()));
        Ok(self.logs.clone())
    }

    fn delete(&self, pod: &PodRef) {
        self.record(Call::Delete(pod.clone()));
    }
}

fn status(value: Value) -> PodStatus {
    serde_json::from_value(value).unwrap_or_default()
}

fn fake_error(verb: &str) -> Error {
    KubectlError {
        verb: verb.to_owned(),
        status: Some(1),
        stderr: "error: the server is currently unable to handle the request".to_owned(),
    }
    .into()
}
