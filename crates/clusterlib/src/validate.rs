//! Existence checks against live cluster state.  These only read, and run
//! before anything is created.

use crate::cluster::Cluster;
use crate::error::{Error, PreconditionError};

/// Namespace used when neither the command line nor the current context
/// names one.
pub static DEFAULT_NAMESPACE: &str = "default";

/// Pick the namespace to work in: the explicit one if given, otherwise the
/// current context's, otherwise `DEFAULT_NAMESPACE`.
pub async fn resolve_namespace<C: Cluster>(
    cluster: &C,
    explicit: Option<String>,
) -> Result<String, Error> {
    if let Some(namespace) = explicit {
        return Ok(namespace);
    }

    let namespace = cluster
        .current_namespace()
        .await?
        .unwrap_or_else(|| DEFAULT_NAMESPACE.to_owned());
    tracing::debug!(namespace, "using namespace from context");

    Ok(namespace)
}

pub async fn require_namespace<C: Cluster>(cluster: &C, namespace: &str) -> Result<(), Error> {
    if cluster.namespace_exists(namespace).await? {
        Ok(())
    } else {
        Err(PreconditionError::NoSuchNamespace(namespace.to_owned()).into())
    }
}

/// The node must be in the node list.  Names are compared exactly.
pub async fn require_node<C: Cluster>(cluster: &C, node: &str) -> Result<(), Error> {
    if cluster.node_names().await?.iter().any(|n| n == node) {
        Ok(())
    } else {
        Err(PreconditionError::NoSuchNode(node.to_owned()).into())
    }
}

pub async fn require_service<C: Cluster>(
    cluster: &C,
    namespace: &str,
    service: &str,
) -> Result<(), Error> {
    if cluster.service_exists(namespace, service).await? {
        Ok(())
    } else {
        Err(PreconditionError::NoSuchService {
            namespace: namespace.to_owned(),
            service: service.to_owned(),
        }
        .into())
    }
}
