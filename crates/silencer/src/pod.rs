use clusterlib::resources::pod::{
    env_var, fixed_resources, PodManifest, LABEL_INSTANCE, LABEL_MANAGED_BY, RESTART_NEVER,
};
use k8s_openapi::api::core::v1::{Container, PodSpec};
use rust_decimal::Decimal;

/// Name of the only container in the pod.
pub static CONTAINER_NAME: &str = "silence";

/// Environment variable holding the JSON request body.
pub static BODY_ENV: &str = "SILENCE_BODY";

/// Environment variable holding the silencing API address.
pub static URL_ENV: &str = "SILENCE_URL";

/// Send the request once and print the response.  HTTP errors are not
/// treated specially: the response is judged from the output.
pub static SCRIPT: &str = r#"curl -sS --max-time 30 -X POST -H 'Content-Type: application/json' -d "$SILENCE_BODY" "$SILENCE_URL""#;

/// What the silence pod needs to know.
#[derive(Debug, Clone)]
pub struct SilencePod<'a> {
    pub name: String,
    pub namespace: String,
    pub alert: &'a str,
    pub image: &'a str,
    pub url: String,
    pub body: String,
    pub cpu_limit: Decimal,
    pub memory_limit: u64,
}

impl SilencePod<'_> {
    /// Build the manifest of a small unprivileged pod which makes one request
    /// and exits.  It may be scheduled on any node.
    pub fn manifest(self) -> PodManifest {
        PodManifest::new(
            self.name,
            self.namespace,
            PodSpec {
                restart_policy: Some(RESTART_NEVER.to_owned()),
                containers: vec![Container {
                    name: CONTAINER_NAME.to_owned(),
                    image: Some(self.image.to_owned()),
                    command: Some(vec![
                        "/bin/sh".to_owned(),
                        "-c".to_owned(),
                        SCRIPT.to_owned(),
                    ]),
                    env: Some(vec![
                        env_var(URL_ENV, self.url),
                        env_var(BODY_ENV, self.body),
                    ]),
                    resources: Some(fixed_resources(self.cpu_limit, self.memory_limit)),
                    ..Container::default()
                }],
                ..PodSpec::default()
            },
        )
        .with_label(LABEL_MANAGED_BY, "silencer")
        .with_label(LABEL_INSTANCE, self.alert)
    }
}
