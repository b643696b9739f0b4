use std::future::{poll_fn, Future};
use std::pin::{pin, Pin};
use std::task::Poll;
use std::time::Duration;

use crate::cluster::{Cluster, Condition, PodRef};
use crate::error::Error;
use crate::resources::pod::PodManifest;
use crate::signal::Signal;

/// Default time to wait for a pod to meet its condition, in seconds.
pub static WAIT_TIMEOUT: u64 = 120;

/// A pod which lives for a single invocation of a tool.
///
/// `run` creates it, waits for it to meet its condition, hands it to an
/// action, and deletes it.  Every path out of `run` after the pod has been
/// created issues exactly one deletion request, including cancellation by a
/// signal.
#[derive(Debug)]
pub struct EphemeralPod {
    manifest: PodManifest,
    pod: PodRef,
    condition: Condition,
    timeout: Duration,
}

impl EphemeralPod {
    pub fn new(manifest: PodManifest, condition: Condition, timeout: Duration) -> Self {
        let pod = PodRef::of(&manifest);
        Self {
            manifest,
            pod,
            condition,
            timeout,
        }
    }

    /// Create the pod, wait for it, and run `action` against it.
    ///
    /// If `shutdown` resolves at any point after the pod is created, whatever
    /// is in progress is abandoned, the pod is deleted, and
    /// `Error::Interrupted` is returned.  If the manifest is rejected no pod
    /// exists, so nothing is deleted, unless a signal arrived while it was
    /// being submitted: then the submission may have been cut short after the
    /// pod was created, and it is deleted anyway.
    pub async fn run<C, S, F, Fut, T>(self, cluster: &C, shutdown: S, action: F) -> Result<T, Error>
    where
        C: Cluster,
        S: Future<Output = Signal>,
        F: FnOnce(PodRef) -> Fut,
        Fut: Future<Output = Result<T, Error>>,
    {
        let mut shutdown = pin!(shutdown);

        if let Err(error) = cluster.apply(&self.manifest).await {
            if let Some(signal) = already_resolved(shutdown.as_mut()).await {
                tracing::warn!(pod = %self.pod, %error, "submission interrupted");
                Cleanup::register(cluster, &self.pod).fire();
                return Err(Error::Interrupted {
                    pod: self.pod.name.clone(),
                    signal,
                });
            }
            return Err(Error::Submit {
                pod: self.pod.name.clone(),
                source: Box::new(error),
            });
        }
        tracing::info!(pod = %self.pod, "created pod");

        let cleanup = Cleanup::register(cluster, &self.pod);

        let result = tokio::select! {
            result = self.wait_then(cluster, action) => result,
            signal = &mut shutdown => Err(Error::Interrupted {
                pod: self.pod.name.clone(),
                signal,
            }),
        };

        cleanup.fire();
        result
    }

    async fn wait_then<C, F, Fut, T>(&self, cluster: &C, action: F) -> Result<T, Error>
    where
        C: Cluster,
        F: FnOnce(PodRef) -> Fut,
        Fut: Future<Output = Result<T, Error>>,
    {
        let waited =
            tokio::time::timeout(self.timeout, cluster.wait_for(&self.pod, self.condition)).await;

        match waited {
            Ok(Ok(())) => (),
            Ok(Err(error @ Error::Wait { .. })) => return Err(error),
            Ok(Err(error)) => {
                return Err(Error::Wait {
                    pod: self.pod.name.clone(),
                    reason: error.to_string(),
                })
            }
            Err(_) => {
                return Err(Error::TimedOut {
                    pod: self.pod.name.clone(),
                    condition: self.condition,
                    timeout: self.timeout,
                })
            }
        }
        tracing::info!(pod = %self.pod, condition = %self.condition, "pod is usable");

        action(self.pod.clone()).await
    }
}

/// The output of `future` if it is ready now, without waiting.
async fn already_resolved<F: Future>(mut future: Pin<&mut F>) -> Option<F::Output> {
    poll_fn(|cx| match future.as_mut().poll(cx) {
        Poll::Ready(output) => Poll::Ready(Some(output)),
        Poll::Pending => Poll::Ready(None),
    })
    .await
}

/// Deletes a pod exactly once: when fired, or when dropped unfired.
///
/// It only holds the identity of a pod which already exists, so firing it
/// cannot fail.
#[derive(Debug)]
pub struct Cleanup<'a, C: Cluster> {
    cluster: &'a C,
    pod: Option<PodRef>,
}

impl<'a, C: Cluster> Cleanup<'a, C> {
    pub fn register(cluster: &'a C, pod: &PodRef) -> Self {
        Self {
            cluster,
            pod: Some(pod.clone()),
        }
    }

    pub fn fire(mut self) {
        self.delete();
    }

    fn delete(&mut self) {
        if let Some(pod) = self.pod.take() {
            self.cluster.delete(&pod);
        }
    }
}

impl<C: Cluster> Drop for Cleanup<'_, C> {
    fn drop(&mut self) {
        self.delete();
    }
}
