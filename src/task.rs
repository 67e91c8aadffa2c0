//! The dual-channel computation value and its composition operators.
//!
//! # Responsibilities
//! - Pair a lazy primary computation with its accumulated [`ProbeSet`]
//! - Compose pipelines with `start`/`tap`/`map`/`chain`/`branch`
//! - Finalize with `end`: resolve the primary, drain probes, report failures
//!
//! # Design Decisions
//! - Operators consume `self` and return a new value; within one run the
//!   primary and every probe handle are evaluated exactly once
//! - Nothing runs until the future returned by `end` is awaited
//! - A failing primary is not caught; only probe failures become data

use std::future::Future;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Duration;

use futures_util::future::BoxFuture;

use crate::probe::{self, BoxError, ProbeError, ProbeSet};

type ErrorHook = Box<dyn FnOnce(&ProbeError) + Send>;

/// Finalization options for [`ObservableTask::end`].
#[derive(Default)]
pub struct EndOptions {
    timeout: Option<Duration>,
    on_error: Option<ErrorHook>,
}

impl EndOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bound the probe drain, counted from the moment the primary value is
    /// available. Absent means wait indefinitely.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Observe the first probe failure, if draining reports one. Called at
    /// most once, for side effects only; its panics are contained.
    pub fn on_error<F>(mut self, hook: F) -> Self
    where
        F: FnOnce(&ProbeError) + Send + 'static,
    {
        self.on_error = Some(Box::new(hook));
        self
    }
}

/// A lazy primary computation paired with the probes attached along the way.
///
/// Composing does not run anything; awaiting the future returned by
/// [`ObservableTask::end`] runs the pipeline once, inside a Tokio runtime
/// (probes are spawned tasks).
pub struct ObservableTask<A> {
    inner: BoxFuture<'static, (A, ProbeSet)>,
}

impl<A: Send + 'static> ObservableTask<A> {
    /// A pipeline that immediately resolves to `value`, with no probes.
    pub fn start(value: A) -> Self {
        Self {
            inner: Box::pin(async move { (value, ProbeSet::new()) }),
        }
    }

    /// Attach a probe to the current value.
    ///
    /// When the value flows past this point the probe is launched with its
    /// own clone of the value and the pipeline moves on immediately; the
    /// probe's outcome is tracked in the [`ProbeSet`] until `end` drains it.
    /// A probe failure never alters the primary channel.
    pub fn tap<P, Fut>(self, probe: P) -> Self
    where
        A: Clone,
        P: FnOnce(A) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        Self {
            inner: Box::pin(async move {
                let (value, mut probes) = self.inner.await;
                let seen = value.clone();
                probes.push(probe::launch(move || probe(seen)));
                (value, probes)
            }),
        }
    }

    /// Transform the primary value with a synchronous function. Probes
    /// already attached are untouched.
    pub fn map<B, F>(self, f: F) -> ObservableTask<B>
    where
        B: Send + 'static,
        F: FnOnce(A) -> B + Send + 'static,
    {
        ObservableTask {
            inner: Box::pin(async move {
                let (value, probes) = self.inner.await;
                (f(value), probes)
            }),
        }
    }

    /// Re-derive the primary computation from the current value. Probes
    /// already attached are untouched.
    pub fn chain<B, F, Fut>(self, f: F) -> ObservableTask<B>
    where
        B: Send + 'static,
        F: FnOnce(A) -> Fut + Send + 'static,
        Fut: Future<Output = B> + Send + 'static,
    {
        ObservableTask {
            inner: Box::pin(async move {
                let (value, probes) = self.inner.await;
                (f(value).await, probes)
            }),
        }
    }

    /// Run `f` as a sub-pipeline seeded with the current value and an empty
    /// probe set, then merge its probes back after the parent's.
    ///
    /// The sub-pipeline needs no knowledge of the parent's probe history,
    /// and global attachment order is preserved across the merge: parent
    /// probes first, then the sub-pipeline's.
    pub fn branch<B, F>(self, f: F) -> ObservableTask<B>
    where
        B: Send + 'static,
        F: FnOnce(ObservableTask<A>) -> ObservableTask<B> + Send + 'static,
    {
        ObservableTask {
            inner: Box::pin(async move {
                let (value, parent) = self.inner.await;
                let (result, child) = f(ObservableTask::start(value)).inner.await;
                (result, parent.concat(child))
            }),
        }
    }

    /// Resolve the primary value, then drain all attached probes.
    ///
    /// The primary evaluation is never gated on probes. Once it resolves,
    /// every probe is awaited (bounded by `options.timeout` if set) and the
    /// first failure in attachment order is handed to `options.on_error`.
    /// The returned value is always the primary value, whatever the probes
    /// did.
    pub async fn end(self, options: EndOptions) -> A {
        let EndOptions { timeout, on_error } = options;
        let (value, probes) = self.inner.await;
        if let Err(error) = probes.drain(timeout).await {
            tracing::warn!(error = %error, "probe drain failed");
            if let Some(hook) = on_error {
                if catch_unwind(AssertUnwindSafe(|| hook(&error))).is_err() {
                    tracing::error!("probe error hook panicked");
                }
            }
        }
        value
    }
}
