#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::wildcard_imports)]

pub mod duration;
pub mod pod;
pub mod request;
pub mod silence;

use clap::Parser;
use rust_decimal::Decimal;

use clusterlib::kubectl;
use clusterlib::lifecycle::WAIT_TIMEOUT;
use clusterlib::logging;

use crate::duration::SilenceDuration;

/// Image for the request container if none is given.  It must provide `sh`
/// and `curl`.
pub static DEFAULT_IMAGE: &str = "docker.io/curlimages/curl:8.8.0";

/// Port the silencing API listens on if none is given.
pub static DEFAULT_PORT: u16 = 9093;

/// Silence an alert for a while.
///
/// A short-lived pod posts the silence to the silencing API behind a service
/// in the cluster, and is deleted once it has finished, or if this command
/// fails or is interrupted.
#[derive(Debug, Parser)]
#[command(version)]
pub struct Args {
    #[command(flatten)]
    pub silence: SilenceArgs,

    #[command(flatten)]
    pub kubectl: kubectl::Config,

    #[command(flatten)]
    pub logging: logging::Config,
}

#[derive(Debug, Clone, clap::Args)]
#[group(skip)]
pub struct SilenceArgs {
    /// Name of the alert to silence.
    pub alert: String,

    /// Service in front of the silencing API.
    #[arg(short = 's', long)]
    pub service: String,

    /// How long the silence lasts: a number followed by H (hours), M
    /// (minutes), or S (seconds).
    #[arg(short = 'd', long, default_value = "12H")]
    pub duration: SilenceDuration,

    /// Namespace of the service, where the pod is also created.  Defaults to
    /// the namespace of the current context, or "default" if it does not set
    /// one.
    #[arg(short = 'n', long)]
    pub namespace: Option<String>,

    /// Port of the service.
    #[arg(long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Image for the request container.
    #[arg(long, default_value = DEFAULT_IMAGE, env = "SILENCER_IMAGE")]
    pub image: String,

    /// Comment attached to the silence.  Defaults to a description of it.
    #[arg(long)]
    pub comment: Option<String>,

    /// Who the silence is recorded as created by.
    #[arg(long, default_value = "silencer", env = "USER")]
    pub created_by: String,

    /// Seconds to wait for the request to finish.
    #[arg(long, default_value_t = WAIT_TIMEOUT)]
    pub timeout: u64,

    /// CPU limit of the request container, in cores.
    #[arg(long, default_value = "0.1")]
    pub cpu_limit: Decimal,

    /// Memory limit of the request container, in MiB.
    #[arg(long, default_value_t = 64)]
    pub memory_limit: u64,
}
