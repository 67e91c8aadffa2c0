//! Success/failure variant of the pipeline, over `Result<A, L>`.
//!
//! Every operator lifts its [`ObservableTask`] counterpart over the wrapped
//! union: `tap` fires only on success, `tap_err` only on failure, `chain`
//! short-circuits once the channel holds an error. Probes attached after the
//! failure point never run their action; a no-op successful probe is
//! recorded in their place.

use std::future::Future;

use futures_util::future::{ready, Either};

use crate::probe::BoxError;
use crate::task::{EndOptions, ObservableTask};

/// A pipeline whose primary channel carries a success/failure union.
pub struct ObservableTaskEither<L, A> {
    inner: ObservableTask<Result<A, L>>,
}

impl<L, A> ObservableTaskEither<L, A>
where
    L: Send + 'static,
    A: Send + 'static,
{
    /// A pipeline that immediately succeeds with `value`, with no probes.
    pub fn start(value: A) -> Self {
        Self {
            inner: ObservableTask::start(Ok(value)),
        }
    }

    /// Attach a probe that fires only when the channel holds a success.
    /// On a failure the probe action is skipped and a no-op successful
    /// probe is recorded instead.
    pub fn tap<P, Fut>(self, probe: P) -> Self
    where
        A: Clone,
        L: Clone,
        P: FnOnce(A) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        Self {
            inner: self.inner.tap(move |result| match result {
                Ok(value) => Either::Left(probe(value)),
                Err(_) => Either::Right(ready(Ok(()))),
            }),
        }
    }

    /// Mirror of [`ObservableTaskEither::tap`]: fires only when the channel
    /// holds a failure, receiving the error value.
    pub fn tap_err<P, Fut>(self, probe: P) -> Self
    where
        A: Clone,
        L: Clone,
        P: FnOnce(L) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        Self {
            inner: self.inner.tap(move |result| match result {
                Err(error) => Either::Left(probe(error)),
                Ok(_) => Either::Right(ready(Ok(()))),
            }),
        }
    }

    /// Transform the success value; failures pass through untouched.
    pub fn map<B, F>(self, f: F) -> ObservableTaskEither<L, B>
    where
        B: Send + 'static,
        F: FnOnce(A) -> B + Send + 'static,
    {
        ObservableTaskEither {
            inner: self.inner.map(move |result| result.map(f)),
        }
    }

    /// Transform the failure value without touching probes or successes.
    pub fn map_err<M, F>(self, f: F) -> ObservableTaskEither<M, A>
    where
        M: Send + 'static,
        F: FnOnce(L) -> M + Send + 'static,
    {
        ObservableTaskEither {
            inner: self.inner.map(move |result| result.map_err(f)),
        }
    }

    /// Sequence the pipeline into `f` on success; short-circuit on failure.
    /// Once the channel holds an error, later `chain`s never run and later
    /// `tap`s never fire.
    pub fn chain<B, F, Fut>(self, f: F) -> ObservableTaskEither<L, B>
    where
        B: Send + 'static,
        F: FnOnce(A) -> Fut + Send + 'static,
        Fut: Future<Output = Result<B, L>> + Send + 'static,
    {
        ObservableTaskEither {
            inner: self.inner.chain(move |result| match result {
                Ok(value) => Either::Left(f(value)),
                Err(error) => Either::Right(ready(Err(error))),
            }),
        }
    }

    /// Run `f` as a sub-pipeline over the current union value with an empty
    /// probe set, merging its probes back after the parent's.
    pub fn branch<B, F>(self, f: F) -> ObservableTaskEither<L, B>
    where
        B: Send + 'static,
        F: FnOnce(ObservableTaskEither<L, A>) -> ObservableTaskEither<L, B> + Send + 'static,
    {
        ObservableTaskEither {
            inner: self.inner.branch(move |task| f(Self { inner: task }).inner),
        }
    }

    /// Resolve the union value, then drain all attached probes. Probe
    /// failures are reported via `options.on_error` and never replace the
    /// union value, success or failure.
    pub async fn end(self, options: EndOptions) -> Result<A, L> {
        self.inner.end(options).await
    }
}
