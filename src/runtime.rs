//! Concurrent trace runtime.
//!
//! Traces are single-threaded, but independent traces over the same network
//! can run side by side. `TraceRuntime` owns a bounded pool of named worker
//! threads that run reachability traces against a shared, read-only network
//! and state. Submission never blocks: a full queue is reported as
//! [`ExecutionError::QueueFull`].

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};

use crate::algorithms::{trace_reachable, Reachability, TraceStart};
use crate::config::TraceConfig;
use crate::error::{ExecutionError, TraceError, TraceResult};
use crate::network::{Network, NetworkState};

/// Runtime configuration.
#[derive(Debug, Clone)]
pub struct TraceRuntimeConfig {
    /// Number of worker threads.
    pub workers: usize,
    /// Maximum queued jobs.
    pub queue_capacity: usize,
}

impl Default for TraceRuntimeConfig {
    fn default() -> Self {
        Self {
            workers: 2,
            queue_capacity: 256,
        }
    }
}

enum Job {
    Trace {
        start: TraceStart,
        config: TraceConfig,
        reply: Sender<TraceResult<Reachability>>,
    },

    #[cfg(test)]
    Sleep {
        duration: Duration,
        reply: Sender<()>,
    },
}

struct Shared {
    network: Arc<Network>,
    state: Arc<NetworkState>,
}

struct WorkerPool {
    tx: Sender<Job>,
    workers: Vec<JoinHandle<()>>,
    queue_capacity: usize,
}

impl WorkerPool {
    fn start(workers: usize, queue_capacity: usize, shared: &Arc<Shared>) -> Result<Self, ExecutionError> {
        let workers = workers.max(1);
        let queue_capacity = queue_capacity.max(1);
        let (tx, rx) = bounded::<Job>(queue_capacity);

        let mut pool = Self {
            tx,
            workers: Vec::with_capacity(workers),
            queue_capacity,
        };
        for idx in 0..workers {
            let rx: Receiver<Job> = rx.clone();
            let shared = Arc::clone(shared);
            let spawned = thread::Builder::new()
                .name(format!("gridtrace-worker-{idx}"))
                .spawn(move || worker_loop(&rx, &shared));
            match spawned {
                Ok(handle) => pool.workers.push(handle),
                Err(err) => {
                    pool.shutdown();
                    return Err(ExecutionError::Spawn {
                        message: err.to_string(),
                    });
                }
            }
        }
        Ok(pool)
    }

    fn try_submit(&self, job: Job) -> Result<(), ExecutionError> {
        match self.tx.try_send(job) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(ExecutionError::QueueFull {
                capacity: self.queue_capacity,
            }),
            Err(TrySendError::Disconnected(_)) => Err(ExecutionError::Disconnected),
        }
    }

    fn shutdown(self) {
        // Closing the channel lets workers drain queued jobs, then exit.
        drop(self.tx);
        for handle in self.workers {
            if handle.join().is_err() {
                tracing::warn!("trace worker panicked");
            }
        }
    }
}

fn worker_loop(rx: &Receiver<Job>, shared: &Shared) {
    while let Ok(job) = rx.recv() {
        match job {
            Job::Trace { start, config, reply } => {
                let result = trace_reachable(&shared.network, &shared.state, start, &config);
                if let Err(err) = &result {
                    tracing::warn!(error = %err, ?start, "trace job failed");
                }
                if reply.send(result).is_err() {
                    tracing::warn!(?start, "trace result dropped: handle was discarded");
                }
            }

            #[cfg(test)]
            Job::Sleep { duration, reply } => {
                thread::sleep(duration);
                let _ = reply.send(());
            }
        }
    }
}

/// Handle returned by [`TraceRuntime::submit`].
#[derive(Debug)]
pub struct TraceHandle {
    start: TraceStart,
    rx: Receiver<TraceResult<Reachability>>,
}

impl TraceHandle {
    /// Where the submitted trace starts.
    #[must_use]
    pub const fn start(&self) -> TraceStart {
        self.start
    }

    /// Waits for the trace to complete.
    ///
    /// # Errors
    /// Returns the trace's own error, or [`ExecutionError::Disconnected`] if
    /// the worker went away without replying.
    pub fn join(self) -> TraceResult<Reachability> {
        self.rx
            .recv()
            .map_err(|_| TraceError::Execution(ExecutionError::Disconnected))?
    }

    /// Waits for the trace to complete with a timeout.
    ///
    /// # Errors
    /// As [`join`](Self::join), plus [`ExecutionError::Timeout`].
    pub fn join_timeout(self, timeout: Duration) -> TraceResult<Reachability> {
        self.rx.recv_timeout(timeout).map_err(|err| match err {
            RecvTimeoutError::Timeout => TraceError::Execution(ExecutionError::Timeout {
                duration_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            }),
            RecvTimeoutError::Disconnected => TraceError::Execution(ExecutionError::Disconnected),
        })?
    }
}

/// A bounded worker pool running reachability traces.
pub struct TraceRuntime {
    shared: Arc<Shared>,
    pool: Option<WorkerPool>,
}

impl TraceRuntime {
    /// Starts the workers.
    ///
    /// # Errors
    /// Returns [`ExecutionError::Spawn`] if a worker thread cannot be started.
    pub fn start(
        network: Arc<Network>,
        state: Arc<NetworkState>,
        config: &TraceRuntimeConfig,
    ) -> Result<Self, ExecutionError> {
        let shared = Arc::new(Shared { network, state });
        let pool = WorkerPool::start(config.workers, config.queue_capacity, &shared)?;
        tracing::debug!(
            workers = pool.workers.len(),
            queue_capacity = pool.queue_capacity,
            "trace runtime started"
        );
        Ok(Self {
            shared,
            pool: Some(pool),
        })
    }

    /// The network traced by the workers.
    #[must_use]
    pub fn network(&self) -> &Network {
        &self.shared.network
    }

    /// Queues a reachability trace.
    ///
    /// The configuration is validated before it is queued.
    ///
    /// # Errors
    /// Returns a validation error for a bad configuration,
    /// [`ExecutionError::QueueFull`] when the queue is full and
    /// [`ExecutionError::Disconnected`] after shutdown.
    pub fn submit(&self, start: TraceStart, config: TraceConfig) -> TraceResult<TraceHandle> {
        config.validate()?;
        let (reply, rx) = bounded::<TraceResult<Reachability>>(1);
        self.pool()?.try_submit(Job::Trace { start, config, reply })?;
        Ok(TraceHandle { start, rx })
    }

    /// Runs a reachability trace on a worker and waits for it.
    ///
    /// # Errors
    /// As [`submit`](Self::submit) and [`TraceHandle::join`].
    pub fn trace(&self, start: TraceStart, config: TraceConfig) -> TraceResult<Reachability> {
        self.submit(start, config)?.join()
    }

    /// Stops accepting work, drains queued jobs and joins the workers.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn pool(&self) -> Result<&WorkerPool, ExecutionError> {
        self.pool.as_ref().ok_or(ExecutionError::Disconnected)
    }

    fn stop(&mut self) {
        if let Some(pool) = self.pool.take() {
            pool.shutdown();
            tracing::debug!("trace runtime stopped");
        }
    }

    #[cfg(test)]
    fn submit_sleep(&self, duration: Duration) -> Result<Receiver<()>, ExecutionError> {
        let (reply, rx) = bounded::<()>(1);
        self.pool()?.try_submit(Job::Sleep { duration, reply })?;
        Ok(rx)
    }
}

impl Drop for TraceRuntime {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::{EquipmentClass, EquipmentId};

    fn runtime(workers: usize, queue_capacity: usize) -> (TraceRuntime, EquipmentId) {
        let mut b = Network::builder();
        let src = b.add_equipment("src", EquipmentClass::EnergySource, 1).unwrap();
        let line = b.add_equipment("line", EquipmentClass::AcLineSegment, 2).unwrap();
        b.chain(&[src, line]).unwrap();
        let network = Arc::new(b.build());
        let rt = TraceRuntime::start(
            network,
            Arc::new(NetworkState::new()),
            &TraceRuntimeConfig {
                workers,
                queue_capacity,
            },
        )
        .unwrap();
        (rt, src)
    }

    #[test]
    fn trace_runs_on_a_worker() {
        let (rt, src) = runtime(1, 4);
        let result = rt.trace(TraceStart::Equipment(src), TraceConfig::default()).unwrap();
        assert_eq!(result.equipment.len(), 2);
    }

    #[test]
    fn full_queue_is_reported() {
        let (rt, src) = runtime(1, 1);
        let busy = rt.submit_sleep(Duration::from_millis(200)).unwrap();
        // Give the worker time to take the sleep job off the queue.
        thread::sleep(Duration::from_millis(50));
        let queued = rt.submit(TraceStart::Equipment(src), TraceConfig::default()).unwrap();
        let err = rt.submit(TraceStart::Equipment(src), TraceConfig::default()).unwrap_err();
        assert!(matches!(err, TraceError::Execution(ExecutionError::QueueFull { capacity: 1 })));

        busy.recv_timeout(Duration::from_secs(1)).unwrap();
        assert!(queued.join_timeout(Duration::from_secs(1)).is_ok());
    }

    #[test]
    fn invalid_config_is_rejected_before_queueing() {
        let (rt, src) = runtime(1, 1);
        let config = TraceConfig::default().with_direction(crate::direction::FeederDirection::Connector);
        let err = rt.submit(TraceStart::Equipment(src), config).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn join_reports_disconnected_when_reply_sender_dropped() {
        let (tx, rx) = bounded::<TraceResult<Reachability>>(1);
        drop(tx);
        let handle = TraceHandle {
            start: TraceStart::Equipment(EquipmentId::new(0)),
            rx,
        };
        let err = handle.join_timeout(Duration::from_millis(10)).unwrap_err();
        assert!(matches!(err, TraceError::Execution(ExecutionError::Disconnected)));
    }

    #[test]
    fn shutdown_drains_queued_work() {
        let (rt, src) = runtime(1, 8);
        let handles: Vec<_> = (0..4)
            .map(|_| rt.submit(TraceStart::Equipment(src), TraceConfig::default()).unwrap())
            .collect();
        rt.shutdown();
        for handle in handles {
            assert!(handle.join().is_ok());
        }
    }
}
