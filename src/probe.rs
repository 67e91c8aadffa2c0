//! Probe execution tracking and draining.
//!
//! # Responsibilities
//! - Launch probe actions as independent tasks and keep their handles
//! - Preserve attachment order across appends and merges
//! - Drain every launched probe exactly once, with an optional global timeout
//!
//! # Design Decisions
//! - Probes are spawned, never awaited inline; only draining waits
//! - A probe failure (error or panic) is captured as data, never rethrown
//! - On timeout, still-pending probes are abandoned, not cancelled

use std::future::Future;
use std::time::Duration;

use futures_util::future::join_all;
use thiserror::Error;
use tokio::task::JoinHandle;

/// Boxed error type carried by failing probes.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Outcome of a single settled probe, or of draining a whole set.
pub type ProbeResult = Result<(), ProbeError>;

pub(crate) type ProbeHandle = JoinHandle<ProbeResult>;

/// Why probe draining reported a failure.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Not every probe settled within the configured drain window. Reported
    /// once for the whole set, never per probe.
    #[error("probe drain timed out after {timeout:?}")]
    Timeout { timeout: Option<Duration> },

    /// A probe's own execution failed. The cause is captured here and never
    /// escapes into the primary channel.
    #[error("probe failed: {original}")]
    Execution { original: BoxError },
}

impl ProbeError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, ProbeError::Timeout { .. })
    }

    pub fn is_execution(&self) -> bool {
        matches!(self, ProbeError::Execution { .. })
    }
}

/// Launch a probe on the runtime, capturing any failure it produces.
///
/// The closure runs inside the spawned task, so a probe that panics before
/// returning its future is contained the same way as one whose future fails.
pub(crate) fn launch<F, Fut>(probe: F) -> ProbeHandle
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
{
    tokio::spawn(async move {
        probe()
            .await
            .map_err(|original| ProbeError::Execution { original })
    })
}

/// Ordered collection of in-flight probe executions.
///
/// Probes are recorded in attachment order and allowed to complete in any
/// order; only attachment order is preserved. The empty set is the identity
/// of [`ProbeSet::concat`].
#[derive(Debug, Default)]
pub struct ProbeSet {
    handles: Vec<ProbeHandle>,
}

impl ProbeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of probes launched so far.
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub(crate) fn push(&mut self, handle: ProbeHandle) {
        self.handles.push(handle);
    }

    /// Append `other` after `self`. All of `self`'s probes keep their
    /// positions, followed by all of `other`'s in order; nothing is dropped
    /// or deduplicated.
    pub fn concat(mut self, other: ProbeSet) -> ProbeSet {
        self.handles.extend(other.handles);
        self
    }

    /// Wait for every probe to settle, then report the first failure in
    /// attachment order (or `Ok` if none failed).
    ///
    /// With a `timeout` the whole wait is bounded; on expiry the pending
    /// probes are left running detached and [`ProbeError::Timeout`] is
    /// returned. Their failures were already captured inside the spawned
    /// tasks, so a late probe cannot crash anything.
    pub async fn drain(self, timeout: Option<Duration>) -> ProbeResult {
        if self.handles.is_empty() {
            return Ok(());
        }
        tracing::debug!(probes = self.handles.len(), "draining probes");
        match timeout {
            Some(limit) => match tokio::time::timeout(limit, settle_all(self.handles)).await {
                Ok(results) => first_failure(results),
                Err(_) => Err(ProbeError::Timeout {
                    timeout: Some(limit),
                }),
            },
            None => first_failure(settle_all(self.handles).await),
        }
    }
}

/// Join every handle concurrently; a slow probe does not gate a fast one.
/// A panicked probe surfaces as its join error, captured as `Execution`.
async fn settle_all(handles: Vec<ProbeHandle>) -> Vec<ProbeResult> {
    join_all(handles)
        .await
        .into_iter()
        .map(|joined| match joined {
            Ok(result) => result,
            Err(join_error) => Err(ProbeError::Execution {
                original: Box::new(join_error),
            }),
        })
        .collect()
}

/// Scan settled outcomes in attachment order and return the earliest failure.
fn first_failure(results: Vec<ProbeResult>) -> ProbeResult {
    results.into_iter().find(|result| result.is_err()).unwrap_or(Ok(()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn execution(message: &str) -> ProbeError {
        ProbeError::Execution {
            original: message.to_string().into(),
        }
    }

    #[test]
    fn test_first_failure_scans_in_attachment_order() {
        let results = vec![Ok(()), Err(execution("first")), Err(execution("second"))];
        let error = first_failure(results).unwrap_err();
        assert!(error.to_string().contains("first"));

        assert!(first_failure(vec![Ok(()), Ok(())]).is_ok());
        assert!(first_failure(Vec::new()).is_ok());
    }

    #[tokio::test]
    async fn test_empty_set_drains_immediately() {
        assert!(ProbeSet::new().drain(None).await.is_ok());
        assert!(ProbeSet::new().drain(Some(Duration::ZERO)).await.is_ok());
    }

    #[tokio::test]
    async fn test_concat_preserves_operand_order() {
        let mut left = ProbeSet::new();
        left.push(launch(|| async { Err::<(), BoxError>("left".into()) }));
        let mut right = ProbeSet::new();
        right.push(launch(|| async { Err::<(), BoxError>("right".into()) }));

        let merged = left.concat(right);
        assert_eq!(merged.len(), 2);

        let error = merged.drain(None).await.unwrap_err();
        assert!(error.is_execution());
        assert!(error.to_string().contains("left"));
    }

    #[tokio::test]
    async fn test_panicking_probe_settles_as_execution_failure() {
        let mut probes = ProbeSet::new();
        probes.push(launch(|| async { panic!("probe blew up") }));

        let error = probes.drain(None).await.unwrap_err();
        assert!(error.is_execution());
    }
}
