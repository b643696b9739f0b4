use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::future::Future;
use std::time::Duration;

use clusterlib::cluster::{Cluster, Condition};
use clusterlib::error::Error;
use clusterlib::lifecycle::EphemeralPod;
use clusterlib::signal::Signal;
use clusterlib::util::resource_name;
use clusterlib::validate;

use crate::duration::SilenceDuration;
use crate::pod::SilencePod;
use crate::request::{self, Outcome, SilenceRequest};
use crate::SilenceArgs;

/// Prefix of generated pod names.
pub static POD_NAME_PREFIX: &str = "silencer";

/// A validated request for a silence.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub alert: String,
    pub namespace: String,
    pub service: String,
    pub port: u16,
    pub duration: SilenceDuration,
    pub image: String,
    pub created_by: String,
    pub comment: String,
    pub timeout: Duration,
    pub cpu_limit: Decimal,
    pub memory_limit: u64,
}

impl Invocation {
    /// Resolve the namespace and check that it and the service exist.
    /// Nothing is created.
    pub async fn resolve<C: Cluster>(cluster: &C, args: SilenceArgs) -> Result<Self, Error> {
        let namespace = validate::resolve_namespace(cluster, args.namespace).await?;
        validate::require_namespace(cluster, &namespace).await?;
        validate::require_service(cluster, &namespace, &args.service).await?;

        let comment = args
            .comment
            .unwrap_or_else(|| request::default_comment(&args.alert, args.duration));

        Ok(Self {
            alert: args.alert,
            namespace,
            service: args.service,
            port: args.port,
            duration: args.duration,
            image: args.image,
            created_by: args.created_by,
            comment,
            timeout: Duration::from_secs(args.timeout),
            cpu_limit: args.cpu_limit,
            memory_limit: args.memory_limit,
        })
    }
}

/// Create a pod which posts the silence, read its response, and delete it.
///
/// Returns the ID of the new silence, if the response could be parsed.
pub async fn silence<C, S>(
    cluster: &C,
    invocation: &Invocation,
    suffix: &str,
    now: DateTime<Utc>,
    shutdown: S,
) -> Result<Option<String>, Error>
where
    C: Cluster,
    S: Future<Output = Signal>,
{
    let body = SilenceRequest::new(
        &invocation.alert,
        invocation.duration,
        now,
        invocation.created_by.clone(),
        invocation.comment.clone(),
    );
    tracing::debug!(?body, "built silence");

    let manifest = SilencePod {
        name: resource_name(POD_NAME_PREFIX, &invocation.alert, suffix),
        namespace: invocation.namespace.clone(),
        alert: &invocation.alert,
        image: &invocation.image,
        url: request::silences_url(&invocation.service, &invocation.namespace, invocation.port),
        body: serde_json::to_string(&body)?,
        cpu_limit: invocation.cpu_limit,
        memory_limit: invocation.memory_limit,
    }
    .manifest();

    EphemeralPod::new(manifest, Condition::Completed, invocation.timeout)
        .run(cluster, shutdown, move |pod| async move {
            let output = cluster.logs(&pod).await?;
            match request::inspect(&output) {
                Outcome::Accepted { silence_id } => {
                    tracing::info!(pod = %pod, ?silence_id, "silence created");
                    Ok(silence_id)
                }
                Outcome::Rejected => Err(Error::Action {
                    pod: pod.name.clone(),
                    reason: format!("no silence was created, the response was:\n{output}"),
                }),
            }
        })
        .await
}

/// What to tell the operator once the silence exists.
pub fn success_message(alert: &str, duration: SilenceDuration, silence_id: Option<&str>) -> String {
    match silence_id {
        Some(id) => format!("silenced {alert} for {duration} (silence {id})"),
        None => format!("silenced {alert} for {duration}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use clap::Parser;
    use clusterlib::cluster::PodRef;
    use clusterlib::error::PreconditionError;
    use clusterlib::testing::{Call, FakeCluster};
    use serde_json::{json, Value};
    use std::future::pending;

    use crate::pod::BODY_ENV;
    use crate::Args;

    fn args(argv: &[&str]) -> SilenceArgs {
        Args::try_parse_from(std::iter::once("silencer").chain(argv.iter().copied()))
            .unwrap()
            .silence
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn completed() -> FakeCluster {
        FakeCluster::new()
            .with_service("default", "alertmanager")
            .with_pod_statuses(&[json!({"phase": "Pending"}), json!({"phase": "Succeeded"})])
    }

    fn posted_body(manifest: &Value) -> Value {
        let env = manifest["spec"]["containers"][0]["env"].as_array().unwrap();
        let body = env
            .iter()
            .find(|var| var["name"] == BODY_ENV)
            .unwrap()["value"]
            .as_str()
            .unwrap();
        serde_json::from_str(body).unwrap()
    }

    #[tokio::test]
    async fn silence_high_cpu_for_thirty_minutes() {
        let cluster = completed().with_logs("{\"silenceID\":\"6b3f5c1e\"}");

        let invocation = Invocation::resolve(
            &cluster,
            args(&["HighCPU", "-s", "alertmanager", "-d", "30M", "--created-by", "alice"]),
        )
        .await
        .unwrap();
        let silence_id = silence(&cluster, &invocation, "abcd1234", now(), pending())
            .await
            .unwrap();

        assert_eq!(Some("6b3f5c1e".to_owned()), silence_id);
        assert_eq!(
            "silenced HighCPU for 30M (silence 6b3f5c1e)",
            success_message(&invocation.alert, invocation.duration, silence_id.as_deref())
        );

        let applied = cluster.applied();
        assert_eq!(1, applied.len());
        assert_eq!(
            json!({
                "startsAt": "2024-05-01T12:02:00Z",
                "endsAt": "2024-05-01T12:32:00Z",
                "createdBy": "alice",
                "comment": "silence HighCPU for 30M",
                "matchers": [{
                    "name": "alertname",
                    "value": "HighCPU",
                    "isRegex": false,
                    "isEqual": true,
                }],
            }),
            posted_body(&applied[0])
        );
        assert_eq!(json!(null), applied[0]["spec"]["nodeName"]);

        let pod = PodRef {
            name: "silencer-highcpu-abcd1234".to_owned(),
            namespace: "default".to_owned(),
        };
        assert!(cluster.calls().contains(&Call::Logs(pod.clone())));
        assert_eq!(vec![pod], cluster.deleted());
    }

    #[tokio::test]
    async fn default_duration_is_twelve_hours() {
        let cluster = completed().with_logs("{\"silenceID\":\"x\"}");

        let invocation = Invocation::resolve(&cluster, args(&["HighCPU", "-s", "alertmanager"]))
            .await
            .unwrap();
        silence(&cluster, &invocation, "abcd1234", now(), pending())
            .await
            .unwrap();

        assert_eq!(
            json!("2024-05-02T00:02:00Z"),
            posted_body(&cluster.applied()[0])["endsAt"]
        );
    }

    #[tokio::test]
    async fn unparsed_marker_still_succeeds() {
        let cluster = completed().with_logs("silenceID=abc");

        let invocation = Invocation::resolve(&cluster, args(&["HighCPU", "-s", "alertmanager"]))
            .await
            .unwrap();
        let silence_id = silence(&cluster, &invocation, "abcd1234", now(), pending())
            .await
            .unwrap();

        assert_eq!(None, silence_id);
        assert_eq!(1, cluster.deleted().len());
    }

    #[tokio::test]
    async fn rejected_silence_reports_output() {
        let cluster = completed().with_logs("{\"code\":400,\"message\":\"bad matcher\"}");

        let invocation = Invocation::resolve(&cluster, args(&["HighCPU", "-s", "alertmanager"]))
            .await
            .unwrap();
        let error = silence(&cluster, &invocation, "abcd1234", now(), pending())
            .await
            .unwrap_err();

        assert!(matches!(error, Error::Action { .. }));
        assert!(error.to_string().contains("bad matcher"));
        assert_eq!(1, cluster.deleted().len());
    }

    #[tokio::test]
    async fn missing_service_mutates_nothing() {
        let cluster = completed();

        let result = Invocation::resolve(&cluster, args(&["HighCPU", "-s", "prometheus"])).await;

        assert!(matches!(
            result,
            Err(Error::Precondition(PreconditionError::NoSuchService { .. }))
        ));
        assert_eq!(0, cluster.mutations());
    }

    #[tokio::test]
    async fn bogus_namespace_mutates_nothing() {
        let cluster = completed();

        let result = Invocation::resolve(
            &cluster,
            args(&["HighCPU", "-s", "alertmanager", "-n", "bogus-ns"]),
        )
        .await;

        assert!(matches!(
            result,
            Err(Error::Precondition(PreconditionError::NoSuchNamespace(_)))
        ));
        assert!(!cluster
            .calls()
            .iter()
            .any(|c| matches!(c, Call::ServiceExists(..))));
        assert_eq!(0, cluster.mutations());
    }

    #[tokio::test]
    async fn service_is_looked_up_in_namespace() {
        let cluster = FakeCluster::new()
            .with_namespaces(&["monitoring"])
            .with_service("monitoring", "alertmanager")
            .with_pod_statuses(&[json!({"phase": "Succeeded"})])
            .with_logs("{\"silenceID\":\"x\"}");

        let invocation = Invocation::resolve(
            &cluster,
            args(&["HighCPU", "-s", "alertmanager", "-n", "monitoring", "--port", "9094"]),
        )
        .await
        .unwrap();
        silence(&cluster, &invocation, "abcd1234", now(), pending())
            .await
            .unwrap();

        let manifest = &cluster.applied()[0];
        assert_eq!(json!("monitoring"), manifest["metadata"]["namespace"]);
        assert_eq!(
            json!({
                "name": "SILENCE_URL",
                "value": "http://alertmanager.monitoring.svc:9094/api/v2/silences",
            }),
            manifest["spec"]["containers"][0]["env"][0]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn completion_timeout_deletes_pod() {
        let cluster = FakeCluster::new()
            .with_service("default", "alertmanager")
            .with_pod_statuses(&[json!({"phase": "Running"})]);

        let invocation = Invocation::resolve(&cluster, args(&["HighCPU", "-s", "alertmanager"]))
            .await
            .unwrap();
        let error = silence(&cluster, &invocation, "abcd1234", now(), pending())
            .await
            .unwrap_err();

        assert!(matches!(error, Error::TimedOut { .. }));
        assert_eq!(1, cluster.deleted().len());
        assert!(!cluster.calls().iter().any(|c| matches!(c, Call::Logs(_))));
    }

    #[tokio::test]
    async fn interrupt_deletes_pod() {
        let cluster = completed();

        let invocation = Invocation::resolve(&cluster, args(&["HighCPU", "-s", "alertmanager"]))
            .await
            .unwrap();
        let error = silence(&cluster, &invocation, "abcd1234", now(), async {
            Signal::Interrupt
        })
        .await
        .unwrap_err();

        assert!(matches!(error, Error::Interrupted { .. }));
        assert_eq!(1, cluster.deleted().len());
    }

    #[test]
    fn message_without_id() {
        assert_eq!(
            "silenced HighCPU for 12H",
            success_message("HighCPU", "12H".parse().unwrap(), None)
        );
    }
}
