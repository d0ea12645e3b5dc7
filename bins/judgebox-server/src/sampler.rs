/// Memory Sampler - Live Container Resource Monitoring
///
/// Background loop attached to one running container. On every tick of
/// a fixed interval it requests a one-shot stats snapshot from the
/// container runtime and folds the observed resident memory usage into
/// a monotonically non-decreasing peak. The peak is a lock-free atomic,
/// so reading it never synchronizes with in-flight samples.
///
/// Sampling is best-effort: at the default 200 ms cadence, very
/// short-lived cases may report a zero or stale peak.
use bollard::container::StatsOptions;
use bollard::Docker;
use futures_util::StreamExt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// How long `stop` waits for the loop to exit before abandoning it.
const STOP_GRACE: Duration = Duration::from_secs(1);

pub struct MemorySampler {
    peak: Arc<AtomicU64>,
    stop_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl MemorySampler {
    /// Attach to a container and start sampling immediately.
    pub fn start(docker: Docker, container_id: String, poll_interval: Duration) -> Self {
        let peak = Arc::new(AtomicU64::new(0));
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();

        let task = tokio::spawn({
            let peak = Arc::clone(&peak);
            async move {
                let options = StatsOptions {
                    stream: false,
                    one_shot: true,
                };
                // The interval, not the runtime's own stats pacing,
                // governs the sampling cadence.
                let mut ticker = tokio::time::interval(poll_interval);
                ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

                loop {
                    tokio::select! {
                        _ = &mut stop_rx => break,
                        _ = ticker.tick() => {
                            let mut snapshot = docker.stats(&container_id, Some(options));
                            match snapshot.next().await {
                                Some(Ok(sample)) => {
                                    if let Some(usage) = sample.memory_stats.usage {
                                        peak.fetch_max(usage, Ordering::Relaxed);
                                    }
                                }
                                Some(Err(e)) => {
                                    // Snapshots fail once the container is
                                    // gone; not an error worth surfacing
                                    // to the caller.
                                    debug!(error = %e, "Stats snapshot failed, sampler exiting");
                                    break;
                                }
                                None => break,
                            }
                        }
                    }
                }
            }
        });

        Self {
            peak,
            stop_tx: Some(stop_tx),
            task: Some(task),
        }
    }

    /// Latest known peak in bytes. Safe to call while sampling is live.
    pub fn peak_bytes(&self) -> u64 {
        self.peak.load(Ordering::Relaxed)
    }

    /// Terminate the loop and release the stream, waiting at most one
    /// second. A loop that does not exit in time is abandoned; `stop`
    /// never blocks the caller indefinitely.
    pub async fn stop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            let abort = task.abort_handle();
            if tokio::time::timeout(STOP_GRACE, task).await.is_err() {
                warn!("Memory sampler did not shut down in time, abandoning");
                abort.abort();
            }
        }
    }
}
