use clusterlib::resources::pod::{
    tolerate_everything, PodManifest, LABEL_INSTANCE, LABEL_MANAGED_BY, RESTART_NEVER,
};
use k8s_openapi::api::core::v1::{
    Container, HostPathVolumeSource, PodSpec, SecurityContext, Volume, VolumeMount,
};

/// Name of the only container in the pod.
pub static CONTAINER_NAME: &str = "shell";

/// Where the node's root filesystem is mounted in the container.
pub static HOST_MOUNT_PATH: &str = "/host";

static HOST_ROOT_VOLUME: &str = "host-root";

/// Build the manifest of a privileged pod bound to `node`.
///
/// The container idles on an interactive `sh` so it stays up until deleted.
pub fn debug_pod(name: String, namespace: String, node: &str, image: &str) -> PodManifest {
    PodManifest::new(
        name,
        namespace,
        PodSpec {
            node_name: Some(node.to_owned()),
            host_network: Some(true),
            host_pid: Some(true),
            host_ipc: Some(true),
            restart_policy: Some(RESTART_NEVER.to_owned()),
            termination_grace_period_seconds: Some(0),
            tolerations: Some(vec![tolerate_everything()]),
            containers: vec![Container {
                name: CONTAINER_NAME.to_owned(),
                image: Some(image.to_owned()),
                command: Some(vec!["/bin/sh".to_owned()]),
                stdin: Some(true),
                tty: Some(true),
                security_context: Some(SecurityContext {
                    privileged: Some(true),
                    ..SecurityContext::default()
                }),
                volume_mounts: Some(vec![VolumeMount {
                    name: HOST_ROOT_VOLUME.to_owned(),
                    mount_path: HOST_MOUNT_PATH.to_owned(),
                    ..VolumeMount::default()
                }]),
                ..Container::default()
            }],
            volumes: Some(vec![Volume {
                name: HOST_ROOT_VOLUME.to_owned(),
                host_path: Some(HostPathVolumeSource {
                    path: "/".to_owned(),
                    ..HostPathVolumeSource::default()
                }),
                ..Volume::default()
            }]),
            ..PodSpec::default()
        },
    )
    .with_label(LABEL_MANAGED_BY, "nodeshell")
    .with_label(LABEL_INSTANCE, node)
}

/// The command run in the pod if the operator does not give one: a login
/// shell in the node's root filesystem.
pub fn default_command() -> Vec<String> {
    vec![
        "chroot".to_owned(),
        HOST_MOUNT_PATH.to_owned(),
        "/bin/sh".to_owned(),
        "-l".to_owned(),
    ]
}
