//! # Worker Pool
//!
//! Runs the producer jobs of one write phase and joins them before returning.
//!
//! ## Architecture
//!
//! ```text
//!                  ┌──────────────────────┐
//!   job indices ──►│  crossbeam channel   │
//!                  └──┬────────┬───────┬──┘
//!                     ▼        ▼       ▼
//!               worker 1  worker 2  worker N     one thread per shard id
//!                  │         │         │
//!               shard 1   shard 2   shard N      exclusive writer each
//!                     ╲      │       ╱
//!                      ▼     ▼      ▼
//!                        join (scope end)        write phase over
//! ```
//!
//! A job may land on any worker, but a worker never changes shard, so every
//! append of a job goes to one shard.

use std::time::{Duration, Instant};

use parking_lot::Mutex;
use shardbuf_core::{QueueConfig, ShardError, ShardResult, ShardSlot, DEFAULT_SHARD_ID};

/// What a job knows about where it runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct JobContext {
    /// Index of the job in `0..job_count`.
    pub job_index: usize,
    /// Shard id of the worker running the job. Stable for the job's duration.
    pub shard_id: usize,
}

/// Outcome of one write phase.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct JobReport {
    /// Jobs executed, indexed by shard id.
    jobs_per_shard: Vec<usize>,
    /// Wall time from dispatch to join.
    pub elapsed: Duration,
}

impl JobReport {
    fn new(shard_count: usize) -> Self {
        Self {
            jobs_per_shard: vec![0; shard_count],
            elapsed: Duration::ZERO,
        }
    }

    fn record(&mut self, shard_id: usize, jobs: usize) {
        if shard_id >= self.jobs_per_shard.len() {
            self.jobs_per_shard.resize(shard_id + 1, 0);
        }
        self.jobs_per_shard[shard_id] += jobs;
    }

    /// Jobs executed on shard `shard_id`.
    #[must_use]
    pub fn jobs_on(&self, shard_id: usize) -> usize {
        self.jobs_per_shard.get(shard_id).copied().unwrap_or(0)
    }

    /// Total jobs executed.
    #[must_use]
    pub fn total(&self) -> usize {
        self.jobs_per_shard.iter().sum()
    }

    /// `(shard_id, jobs)` for every shard that ran at least one job.
    pub fn used_shards(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.jobs_per_shard
            .iter()
            .enumerate()
            .filter(|(_, &jobs)| jobs > 0)
            .map(|(id, &jobs)| (id, jobs))
    }
}

/// Scheduler that binds worker threads to shard ids `1..=worker_count`.
///
/// # Example
///
/// ```rust,ignore
/// let pool = WorkerPool::new(8)?;
/// let mut queue: EventQueue<u32> = EventQueue::new(&QueueConfig::default().with_worker_count(8))?;
///
/// let report = pool.run(queue.writers(), 100, |ctx, writer| {
///     writer.enqueue(ctx.job_index as u32).unwrap();
/// })?;
///
/// assert_eq!(queue.component_count(), 100);
/// assert_eq!(report.total(), 100);
/// ```
#[derive(Clone, Copy, Debug)]
pub struct WorkerPool {
    worker_count: usize,
}

impl WorkerPool {
    /// Creates a pool with `worker_count` worker slots.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if `worker_count` is zero or above
    /// [`MAX_WORKER_COUNT`](shardbuf_core::MAX_WORKER_COUNT).
    pub fn new(worker_count: usize) -> ShardResult<Self> {
        QueueConfig::default()
            .with_worker_count(worker_count)
            .validate()?;
        Ok(Self { worker_count })
    }

    /// Creates a pool matching the worker slots of a queue config.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` for an invalid config.
    pub fn from_config(config: &QueueConfig) -> ShardResult<Self> {
        config.validate()?;
        Ok(Self {
            worker_count: config.worker_count,
        })
    }

    /// Number of worker slots.
    #[inline]
    #[must_use]
    pub const fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Runs `job_count` jobs over the given per-shard writers and joins.
    ///
    /// Writers with ids `1..=worker_count` each get a dedicated thread. The
    /// default-shard writer is only used when no worker slot is available,
    /// in which case the jobs run on the calling thread. When this returns,
    /// every job has completed and the writers are dropped, so the queue they
    /// borrow can be read.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if `job_count > 0` and no usable writer was given.
    ///
    /// # Panics
    ///
    /// Re-raises the panic of any job, after all workers have joined.
    pub fn run<S, F>(&self, slots: Vec<S>, job_count: usize, job: F) -> ShardResult<JobReport>
    where
        S: ShardSlot,
        F: Fn(JobContext, &mut S) + Sync,
    {
        let start = Instant::now();
        let mut default_slot = None;
        let mut workers = Vec::with_capacity(self.worker_count);
        for slot in slots {
            match slot.shard_id() {
                DEFAULT_SHARD_ID => default_slot = Some(slot),
                id if id <= self.worker_count => workers.push(slot),
                _ => {}
            }
        }

        let mut report = JobReport::new(self.worker_count + 1);
        if job_count == 0 {
            return Ok(report);
        }

        if workers.is_empty() {
            let Some(mut slot) = default_slot else {
                return Err(ShardError::InvalidConfig(
                    "no writer available for the write phase".to_string(),
                ));
            };
            for job_index in 0..job_count {
                job(JobContext { job_index, shard_id: DEFAULT_SHARD_ID }, &mut slot);
            }
            report.record(DEFAULT_SHARD_ID, job_count);
            report.elapsed = start.elapsed();
            tracing::debug!(jobs = job_count, "write phase ran inline on default shard");
            return Ok(report);
        }

        tracing::debug!(jobs = job_count, workers = workers.len(), "write phase started");

        let (sender, receiver) = crossbeam_channel::unbounded();
        for job_index in 0..job_count {
            sender.send(job_index).ok();
        }
        drop(sender);

        let shared = Mutex::new(report);
        std::thread::scope(|s| {
            for mut slot in workers {
                let receiver = receiver.clone();
                let job = &job;
                let shared = &shared;
                s.spawn(move || {
                    let shard_id = slot.shard_id();
                    let mut executed = 0;
                    for job_index in receiver.iter() {
                        job(JobContext { job_index, shard_id }, &mut slot);
                        executed += 1;
                    }
                    shared.lock().record(shard_id, executed);
                });
            }
        });

        let mut report = shared.into_inner();
        report.elapsed = start.elapsed();
        tracing::debug!(
            jobs = report.total(),
            shards = report.used_shards().count(),
            elapsed_us = u64::try_from(report.elapsed.as_micros()).unwrap_or(u64::MAX),
            "write phase joined"
        );
        Ok(report)
    }
}
