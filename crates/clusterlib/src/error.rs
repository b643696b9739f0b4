use std::fmt;
use std::process::ExitStatus;
use std::time::Duration;

use crate::cluster::Condition;
use crate::signal::Signal;

/// Generic error type
#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    Json(serde_json::Error),
    Kubectl(KubectlError),
    Precondition(PreconditionError),
    /// The manifest was rejected, so no pod is known to exist.
    Submit {
        pod: String,
        source: Box<Error>,
    },
    /// The pod status could not be read, or the pod can never meet the
    /// condition.
    Wait {
        pod: String,
        reason: String,
    },
    TimedOut {
        pod: String,
        condition: Condition,
        timeout: Duration,
    },
    /// The pod became usable but the tool-specific action failed.
    Action {
        pod: String,
        reason: String,
    },
    Interrupted {
        pod: String,
        signal: Signal,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(s) => write!(f, "io: {s}"),
            Self::Json(s) => write!(f, "json: {s}"),
            Self::Kubectl(s) => write!(f, "kubectl: {s}"),
            Self::Precondition(s) => write!(f, "{s}"),
            Self::Submit { pod, source } => write!(f, "could not create pod '{pod}': {source}"),
            Self::Wait { pod, reason } => write!(f, "pod '{pod}' did not start: {reason}"),
            Self::TimedOut {
                pod,
                condition,
                timeout,
            } => write!(
                f,
                "timed out after {secs}s waiting for pod '{pod}' to be {condition}",
                secs = timeout.as_secs()
            ),
            Self::Action { pod, reason } => write!(f, "pod '{pod}': {reason}"),
            Self::Interrupted { pod, signal } => {
                write!(f, "interrupted by {signal} while pod '{pod}' was live")
            }
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error)
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Self::Json(error)
    }
}

impl From<KubectlError> for Error {
    fn from(error: KubectlError) -> Self {
        Self::Kubectl(error)
    }
}

impl From<PreconditionError> for Error {
    fn from(error: PreconditionError) -> Self {
        Self::Precondition(error)
    }
}

/// A `kubectl` invocation which exited unsuccessfully.
#[derive(Debug)]
pub struct KubectlError {
    /// The subcommand, eg "apply" or "get".
    pub verb: String,
    pub status: Option<i32>,
    pub stderr: String,
}

impl KubectlError {
    pub fn new(verb: &str, status: ExitStatus, stderr: &[u8]) -> Self {
        Self {
            verb: verb.to_owned(),
            status: status.code(),
            stderr: String::from_utf8_lossy(stderr).trim().to_owned(),
        }
    }
}

impl fmt::Display for KubectlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(code) => write!(f, "'{verb}' exited with {code}", verb = self.verb)?,
            None => write!(f, "'{verb}' killed by signal", verb = self.verb)?,
        }
        if !self.stderr.is_empty() {
            write!(f, ": {stderr}", stderr = self.stderr)?;
        }
        Ok(())
    }
}

/// Errors specific to validating the invocation against the cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreconditionError {
    NoSuchNamespace(String),
    NoSuchNode(String),
    NoSuchService { namespace: String, service: String },
}

impl fmt::Display for PreconditionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoSuchNamespace(ns) => write!(f, "namespace '{ns}' does not exist"),
            Self::NoSuchNode(node) => write!(f, "node '{node}' does not exist"),
            Self::NoSuchService { namespace, service } => {
                write!(f, "service '{service}' does not exist in namespace '{namespace}'")
            }
        }
    }
}
