//! # SHARDBUF Jobs
//!
//! The scheduling side of a write phase:
//! - Every worker thread gets a stable shard id before it runs any job
//! - Jobs are pulled from a shared channel, never migrated mid-job
//! - `run` joins every worker before returning, which ends the write phase
//!
//! ## Example
//!
//! ```rust,ignore
//! use shardbuf_core::{EventQueue, QueueConfig};
//! use shardbuf_jobs::WorkerPool;
//!
//! let config = QueueConfig::default().with_worker_count(8);
//! let pool = WorkerPool::from_config(&config)?;
//! let mut queue: EventQueue<u64> = EventQueue::new(&config)?;
//!
//! pool.run(queue.writers(), 1_000, |ctx, writer| {
//!     writer.enqueue(ctx.job_index as u64).unwrap();
//! })?;
//!
//! // Read phase: all producers have joined.
//! assert_eq!(queue.component_count(), 1_000);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

mod pool;

pub use pool::{JobContext, JobReport, WorkerPool};
