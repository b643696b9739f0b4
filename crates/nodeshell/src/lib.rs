#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::wildcard_imports)]

pub mod pod;
pub mod shell;

use clap::Parser;

use clusterlib::kubectl;
use clusterlib::lifecycle::WAIT_TIMEOUT;
use clusterlib::logging;

/// Image for the shell container if none is given.
pub static DEFAULT_IMAGE: &str = "docker.io/library/alpine:3";

/// Open a root shell on a cluster node.
///
/// A privileged pod sharing the node's network, IPC, and PID namespaces is
/// bound to the node, with the node's root filesystem mounted at `/host`.  The
/// pod is deleted when the shell exits, or if this command fails or is
/// interrupted.
#[derive(Debug, Parser)]
#[command(version)]
pub struct Args {
    /// Namespace to create the pod in.  Defaults to the namespace of the
    /// current context, or "default" if it does not set one.
    #[arg(short = 'n', long)]
    pub namespace: Option<String>,

    /// Image for the shell container.  It must provide `chroot` and `/bin/sh`
    /// unless a command is given.
    #[arg(long, default_value = DEFAULT_IMAGE, env = "NODESHELL_IMAGE")]
    pub image: String,

    /// Seconds to wait for the pod to become ready.
    #[arg(long, default_value_t = WAIT_TIMEOUT)]
    pub timeout: u64,

    #[command(flatten)]
    pub kubectl: kubectl::Config,

    #[command(flatten)]
    pub logging: logging::Config,

    /// Name of the node to open a shell on.
    pub node: String,

    /// Command to run in the pod instead of a login shell chrooted into the
    /// node's root filesystem.
    #[arg(last = true)]
    pub command: Vec<String>,
}
