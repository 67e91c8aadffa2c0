//! Non-blocking probe instrumentation for asynchronous pipelines.
//!
//! A pipeline pairs its primary asynchronous result with an ordered set of
//! in-flight "probe" side actions (logging, metrics, audits). Probes launch
//! the moment the value they observe becomes available, never delay or alter
//! the primary result, and are all drained exactly once when the pipeline is
//! finalized.
//!
//! ```text
//! start(v) ──► tap ──► chain ──► map ──► tap ──► end ──► primary value
//!               │                         │        │
//!               ▼                         ▼        ▼
//!             spawn                     spawn    drain every probe
//!               │                         │      (optional timeout;
//!               └──────── ProbeSet ───────┘       first failure → on_error)
//! ```
//!
//! # Example
//!
//! ```no_run
//! use observable_task::{EndOptions, ObservableTask};
//!
//! # async fn run() {
//! let total = ObservableTask::start(20u32)
//!     .tap(|n| async move {
//!         tracing::debug!(n, "seen");
//!         Ok(())
//!     })
//!     .chain(|n| async move { n + 1 })
//!     .map(|n| n * 2)
//!     .end(EndOptions::new().timeout(std::time::Duration::from_millis(250)))
//!     .await;
//! assert_eq!(total, 42);
//! # }
//! ```
//!
//! # Design Decisions
//! - Attaching a probe is synchronous and non-blocking; only `end` awaits
//! - A probe failure (error or panic) is captured as data and surfaced at
//!   most once through [`EndOptions::on_error`]; it never replaces the
//!   primary value
//! - `branch` runs a sub-pipeline against a fresh, empty probe set and
//!   merges its probes back after the parent's, keeping attachment order
//! - Tokio-native: probes run as spawned tasks, so pipelines must be
//!   awaited inside a Tokio runtime

pub mod probe;
pub mod task;
pub mod task_either;

pub use probe::{BoxError, ProbeError, ProbeResult, ProbeSet};
pub use task::{EndOptions, ObservableTask};
pub use task_either::ObservableTaskEither;
