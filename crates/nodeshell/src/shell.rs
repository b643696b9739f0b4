use std::future::Future;
use std::time::Duration;

use clusterlib::cluster::{Cluster, Condition, PodRef};
use clusterlib::error::Error;
use clusterlib::lifecycle::EphemeralPod;
use clusterlib::resources::pod::PodStatusExt;
use clusterlib::signal::Signal;
use clusterlib::util::resource_name;
use clusterlib::validate;

use crate::pod;

/// Prefix of generated pod names.
pub static POD_NAME_PREFIX: &str = "nodeshell";

/// A validated request for a node shell.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub node: String,
    pub namespace: String,
    pub image: String,
    pub timeout: Duration,
    pub command: Vec<String>,
}

impl Invocation {
    /// Resolve the namespace and check that it and the node exist.  Nothing
    /// is created.
    pub async fn resolve<C: Cluster>(
        cluster: &C,
        node: String,
        namespace: Option<String>,
        image: String,
        timeout: Duration,
        command: Vec<String>,
    ) -> Result<Self, Error> {
        let namespace = validate::resolve_namespace(cluster, namespace).await?;
        validate::require_namespace(cluster, &namespace).await?;
        validate::require_node(cluster, &node).await?;

        Ok(Self {
            node,
            namespace,
            image,
            timeout,
            command: if command.is_empty() {
                pod::default_command()
            } else {
                command
            },
        })
    }
}

/// Create the debug pod, attach to it, and delete it once the session ends.
///
/// `suffix` makes the pod name unique to this invocation.
pub async fn open<C, S>(
    cluster: &C,
    invocation: &Invocation,
    suffix: &str,
    shutdown: S,
) -> Result<(), Error>
where
    C: Cluster,
    S: Future<Output = Signal>,
{
    let manifest = pod::debug_pod(
        resource_name(POD_NAME_PREFIX, &invocation.node, suffix),
        invocation.namespace.clone(),
        &invocation.node,
        &invocation.image,
    );

    EphemeralPod::new(manifest, Condition::Ready, invocation.timeout)
        .run(cluster, shutdown, move |pod| async move {
            tracing::info!(node = invocation.node, pod = %pod, "attaching, exit the shell to clean up");
            match cluster.exec_interactive(&pod, &invocation.command).await {
                Ok(()) => Ok(()),
                Err(error) => session_outcome(cluster, &pod, error).await,
            }
        })
        .await
}

/// kubectl exits with the remote command's status, so a non-zero exit is
/// usually just the operator's last command failing.  It is only an error if
/// the pod stopped being usable.
async fn session_outcome<C: Cluster>(
    cluster: &C,
    pod: &PodRef,
    error: Error,
) -> Result<(), Error> {
    if let Error::Kubectl(_) = error {
        match cluster.pod_status(pod).await {
            Ok(status) if status.is_ready() => {
                tracing::info!(pod = %pod, %error, "shell exited");
                return Ok(());
            }
            Ok(status) => {
                tracing::warn!(pod = %pod, status = %status.describe(), "pod is gone");
            }
            Err(status_error) => {
                tracing::warn!(pod = %pod, %status_error, "could not check pod");
            }
        }
    }

    Err(Error::Action {
        pod: pod.name.clone(),
        reason: format!("shell session failed: {error}"),
    })
}
