use k8s_openapi::api::core::v1::{Pod, PodStatus};
use nix::sys::signal::{kill, Signal as NixSignal};
use nix::unistd::Pid;
use serde::Deserialize;
use std::os::unix::process::CommandExt;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, Command};

use crate::cluster::{Cluster, PodRef};
use crate::error::{Error, KubectlError};
use crate::resources::pod::PodManifest;

/// How long an abandoned interactive kubectl gets to restore the terminal
/// before it is killed, in milliseconds.
pub static ATTACHED_GRACE_MS: u64 = 1000;

/// Options to configure how the cluster is reached.
#[derive(Clone, Debug, Default, clap::Args)]
#[group(skip)]
pub struct Config {
    /// Name of the kubectl binary.  Defaults to "kubectl".
    #[clap(
        long = "kubectl-command",
        value_parser,
        default_value = "kubectl",
        env = "KUBECTL_CMD"
    )]
    pub kubectl: String,

    /// Kubeconfig context to use.  If not given the current context is used.
    #[clap(long = "context", value_parser, env = "KUBE_CONTEXT")]
    pub context: Option<String>,

    /// Kubeconfig file to use.  If not given kubectl's own lookup applies.
    #[clap(long = "kubeconfig", value_parser)]
    pub kubeconfig: Option<PathBuf>,
}

impl Config {
    /// Arguments which select the cluster, passed to every invocation.
    pub fn global_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(kubeconfig) = &self.kubeconfig {
            args.push(format!("--kubeconfig={path}", path = kubeconfig.display()));
        }
        if let Some(context) = &self.context {
            args.push(format!("--context={context}"));
        }
        args
    }

    /// A non-interactive kubectl invocation.
    fn kubectl(&self) -> Command {
        let mut cmd = Command::new(self.kubectl.clone());
        cmd.args(self.global_args())
            .stdin(Stdio::null())
            .kill_on_drop(true);
        cmd
    }

    /// A kubectl invocation sharing this process's stdin, stdout, and stderr.
    /// It is not killed on drop: see `AttachedSession`.
    fn kubectl_attached(&self) -> Command {
        let mut cmd = Command::new(self.kubectl.clone());
        cmd.args(self.global_args());
        cmd
    }
}

/// The cluster, as seen through `kubectl`.
#[derive(Clone, Debug)]
pub struct Kubectl {
    config: Config,
}

impl Kubectl {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Run a non-interactive kubectl command and return its stdout.
    async fn run(&self, args: Vec<String>) -> Result<Vec<u8>, Error> {
        let verb = args.first().cloned().unwrap_or_default();
        tracing::debug!(?args, "running kubectl");

        let output = self.config.kubectl().args(&args).output().await?;
        if output.status.success() {
            Ok(output.stdout)
        } else {
            Err(KubectlError::new(&verb, output.status, &output.stderr).into())
        }
    }
}

impl Cluster for Kubectl {
    async fn current_namespace(&self) -> Result<Option<String>, Error> {
        let stdout = self.run(current_namespace_args()).await?;
        let namespace = String::from_utf8_lossy(&stdout).trim().to_owned();

        if namespace.is_empty() {
            Ok(None)
        } else {
            Ok(Some(namespace))
        }
    }

    async fn namespace_exists(&self, namespace: &str) -> Result<bool, Error> {
        let stdout = self.run(get_by_name_args("namespace", namespace, None)).await?;
        Ok(!stdout.trim_ascii().is_empty())
    }

    async fn node_names(&self) -> Result<Vec<String>, Error> {
        let stdout = self.run(list_args("nodes")).await?;
        let list: ObjectList = serde_json::from_slice(&stdout)?;

        Ok(list.items.into_iter().map(|o| o.metadata.name).collect())
    }

    async fn service_exists(&self, namespace: &str, service: &str) -> Result<bool, Error> {
        let stdout = self
            .run(get_by_name_args("service", service, Some(namespace)))
            .await?;
        Ok(!stdout.trim_ascii().is_empty())
    }

    async fn apply(&self, manifest: &PodManifest) -> Result<(), Error> {
        let body = serde_json::to_vec(manifest)?;

        let mut child = self
            .config
            .kubectl()
            .args(apply_args(manifest.namespace()))
            // a ^C at the terminal must not cut the submission short
            .process_group(0)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(&body).await?;
        }

        let output = child.wait_with_output().await?;
        if output.status.success() {
            Ok(())
        } else {
            Err(KubectlError::new("apply", output.status, &output.stderr).into())
        }
    }

    async fn pod_status(&self, pod: &PodRef) -> Result<PodStatus, Error> {
        let stdout = self.run(pod_json_args(pod)).await?;
        let pod: Pod = serde_json::from_slice(&stdout)?;

        Ok(pod.status.unwrap_or_default())
    }

    async fn exec_interactive(&self, pod: &PodRef, command: &[String]) -> Result<(), Error> {
        let child = self
            .config
            .kubectl_attached()
            .args(exec_args(pod, command))
            .spawn()?;
        let mut session = AttachedSession { child };
        let status = session.child.wait().await?;

        if status.success() {
            Ok(())
        } else {
            // stderr went straight to the terminal
            Err(KubectlError::new("exec", status, &[]).into())
        }
    }

    async fn logs(&self, pod: &PodRef) -> Result<String, Error> {
        let stdout = self.run(logs_args(pod)).await?;
        Ok(String::from_utf8_lossy(&stdout).into_owned())
    }

    #[allow(clippy::zombie_processes)]
    fn delete(&self, pod: &PodRef) {
        tracing::info!(pod = %pod, "deleting pod");

        // Detached: nothing waits for this child, it may outlive us.
        let spawned = std::process::Command::new(&self.config.kubectl)
            .args(self.config.global_args())
            .args(delete_args(pod))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .process_group(0)
            .spawn();

        if let Err(error) = spawned {
            tracing::warn!(pod = %pod, ?error, "could not request pod deletion");
        }
    }
}

///////////////////////////////////////////////////////////////////////////////

/// An interactive kubectl which may be abandoned mid-session, when a signal
/// cancels the invocation.  It holds the terminal in raw mode, so rather than
/// being killed outright it is asked to stop and given `ATTACHED_GRACE_MS` to
/// restore the terminal.
#[derive(Debug)]
struct AttachedSession {
    child: Child,
}

impl Drop for AttachedSession {
    fn drop(&mut self) {
        if let Ok(None) = self.child.try_wait() {
            terminate(&mut self.child, Duration::from_millis(ATTACHED_GRACE_MS));
        }
    }
}

/// Send SIGTERM, wait up to `grace` for the child to exit, then SIGKILL it.
fn terminate(child: &mut Child, grace: Duration) {
    let Some(pid) = child.id().and_then(|id| i32::try_from(id).ok()) else {
        return;
    };

    if kill(Pid::from_raw(pid), NixSignal::SIGTERM).is_ok() {
        let deadline = Instant::now() + grace;
        while Instant::now() < deadline {
            if !matches!(child.try_wait(), Ok(None)) {
                return;
            }
            std::thread::sleep(Duration::from_millis(20));
        }
    }

    tracing::warn!(pid, "kubectl did not stop, killing it");
    let _ = child.start_kill();
}

///////////////////////////////////////////////////////////////////////////////

/// The parts of `kubectl get ... -o json` list output which are inspected.
#[derive(Debug, Deserialize)]
struct ObjectList {
    #[serde(default)]
    items: Vec<Object>,
}

#[derive(Debug, Deserialize)]
struct Object {
    metadata: Metadata,
}

#[derive(Debug, Deserialize)]
struct Metadata {
    name: String,
}

fn current_namespace_args() -> Vec<String> {
    strings(&[
        "config",
        "view",
        "--minify",
        "--output=jsonpath={..namespace}",
    ])
}

fn get_by_name_args(rtype: &str, name: &str, namespace: Option<&str>) -> Vec<String> {
    let mut args = strings(&["get", rtype, name, "--ignore-not-found", "--output=name"]);
    if let Some(ns) = namespace {
        args.push(format!("--namespace={ns}"));
    }
    args
}

fn list_args(rtype: &str) -> Vec<String> {
    strings(&["get", rtype, "--output=json"])
}

fn apply_args(namespace: &str) -> Vec<String> {
    let mut args = strings(&["apply", "--filename=-"]);
    args.push(format!("--namespace={namespace}"));
    args
}

fn pod_json_args(pod: &PodRef) -> Vec<String> {
    let mut args = strings(&["get", "pod", &pod.name, "--output=json"]);
    args.push(format!("--namespace={ns}", ns = pod.namespace));
    args
}

fn exec_args(pod: &PodRef, command: &[String]) -> Vec<String> {
    let mut args = strings(&["exec", "--stdin", "--tty"]);
    args.push(format!("--namespace={ns}", ns = pod.namespace));
    args.push(pod.name.clone());
    args.push("--".to_owned());
    args.extend(command.iter().cloned());
    args
}

fn logs_args(pod: &PodRef) -> Vec<String> {
    let mut args = strings(&["logs", &pod.name]);
    args.push(format!("--namespace={ns}", ns = pod.namespace));
    args
}

fn delete_args(pod: &PodRef) -> Vec<String> {
    let mut args = strings(&["delete", "pod", &pod.name]);
    args.push(format!("--namespace={ns}", ns = pod.namespace));
    args.extend(strings(&["--wait=false", "--ignore-not-found"]));
    args
}

fn strings(ss: &[&str]) -> Vec<String> {
    ss.iter().map(|s| (*s).to_owned()).collect()
}
