//! Asynchronous submission runtime.
//!
//! A fixed pool of worker threads pulls jobs from a bounded channel and
//! forwards them to the wrapped engine. Callers receive a [`JobTicket`] and
//! may block on it with or without a deadline.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use tracing::{debug, warn};

use crate::config::RuntimeConfig;
use crate::engine::{EngineError, ExecutionEngine, JobOutcome};
use crate::error::{ExecutionError, SimError, SimResult};
use crate::plan::{InvocationPlan, JobId};

enum Job {
    Submit {
        job_id: JobId,
        plan: InvocationPlan,
        reply: Sender<Result<JobOutcome, EngineError>>,
    },
}

struct WorkerPool {
    tx: Sender<Job>,
    workers: Vec<JoinHandle<()>>,
    queue_capacity: usize,
}

impl WorkerPool {
    fn start(config: RuntimeConfig, engine: Arc<dyn ExecutionEngine>) -> SimResult<Self> {
        let workers = config.workers.max(1);
        let queue_capacity = config.queue_capacity.max(1);
        let (tx, rx) = bounded::<Job>(queue_capacity);

        let mut handles = Vec::with_capacity(workers);
        for idx in 0..workers {
            let rx: Receiver<Job> = rx.clone();
            let engine = Arc::clone(&engine);
            let handle = thread::Builder::new()
                .name(format!("simdispatch-worker-{idx}"))
                .spawn(move || {
                    while let Ok(Job::Submit { job_id, plan, reply }) = rx.recv() {
                        debug!(%job_id, stage = %plan.stage, backend = %plan.backend, "worker picked up job");
                        let result = engine.submit(job_id, &plan);
                        let _ = reply.send(result);
                    }
                })
                .map_err(|e| SimError::internal(format!("failed to spawn worker {idx}: {e}")))?;
            handles.push(handle);
        }

        Ok(Self {
            tx,
            workers: handles,
            queue_capacity,
        })
    }

    fn try_submit(&self, job: Job) -> SimResult<()> {
        match self.tx.try_send(job) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(ExecutionError::QueueFull {
                capacity: self.queue_capacity,
            }
            .into()),
            Err(TrySendError::Disconnected(_)) => Err(ExecutionError::Disconnected.into()),
        }
    }

    fn shutdown(self) {
        // Closing the channel lets workers drain queued jobs, then exit.
        drop(self.tx);
        for handle in self.workers {
            let _ = handle.join();
        }
    }
}

/// Handle to a job submitted through [`EngineRuntime::spawn`].
pub struct JobTicket {
    job_id: JobId,
    rx: Receiver<Result<JobOutcome, EngineError>>,
}

impl JobTicket {
    /// Identifier the job was submitted under.
    #[must_use]
    pub const fn job_id(&self) -> JobId {
        self.job_id
    }

    /// Waits for the job to finish.
    pub fn wait(self) -> SimResult<JobOutcome> {
        let result = self.rx.recv().map_err(|_| ExecutionError::Disconnected)?;
        Ok(result?)
    }

    /// Waits for the job to finish, giving up after `timeout`.
    pub fn wait_timeout(self, timeout: Duration) -> SimResult<JobOutcome> {
        let result = self.rx.recv_timeout(timeout).map_err(|err| match err {
            RecvTimeoutError::Timeout => ExecutionError::Timeout {
                duration_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            },
            RecvTimeoutError::Disconnected => ExecutionError::Disconnected,
        })?;
        Ok(result?)
    }
}

/// Bounded worker pool in front of an [`ExecutionEngine`].
///
/// The runtime is itself an engine: `submit` spawns and waits, so it can be
/// handed to the driver wherever a blocking engine is expected.
pub struct EngineRuntime {
    engine: Arc<dyn ExecutionEngine>,
    pool: Option<WorkerPool>,
}

impl EngineRuntime {
    /// Starts the worker threads.
    pub fn start(engine: Arc<dyn ExecutionEngine>, config: RuntimeConfig) -> SimResult<Self> {
        let pool = WorkerPool::start(config, Arc::clone(&engine))?;
        Ok(Self {
            engine,
            pool: Some(pool),
        })
    }

    /// Queues `plan` under a fresh job ID.
    ///
    /// Fails immediately with `QueueFull` rather than blocking when the
    /// queue is at capacity.
    pub fn spawn(&self, plan: InvocationPlan) -> SimResult<JobTicket> {
        self.spawn_with_id(JobId::new(), plan)
    }

    fn spawn_with_id(&self, job_id: JobId, plan: InvocationPlan) -> SimResult<JobTicket> {
        let pool = self.pool.as_ref().ok_or(ExecutionError::Disconnected)?;
        let (tx, rx) = bounded(1);
        pool.try_submit(Job::Submit {
            job_id,
            plan,
            reply: tx,
        })
        .map_err(|err| {
            warn!(%job_id, error = %err, "job submission refused");
            err
        })?;
        Ok(JobTicket { job_id, rx })
    }

    /// The wrapped engine.
    #[must_use]
    pub fn engine(&self) -> &dyn ExecutionEngine {
        self.engine.as_ref()
    }
}

impl ExecutionEngine for EngineRuntime {
    fn name(&self) -> &str {
        self.engine.name()
    }

    fn submit(&self, job_id: JobId, plan: &InvocationPlan) -> Result<JobOutcome, EngineError> {
        let ticket = self
            .spawn_with_id(job_id, plan.clone())
            .map_err(|e| EngineError::Backend(e.to_string()))?;
        // Engine errors pass through untouched; only transport failures are rewrapped.
        ticket
            .rx
            .recv()
            .map_err(|_| EngineError::Backend(ExecutionError::Disconnected.to_string()))?
    }
}

impl Drop for EngineRuntime {
    fn drop(&mut self) {
        if let Some(pool) = self.pool.take() {
            pool.shutdown();
        }
    }
}
