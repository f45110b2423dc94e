//! `Try<T>`: the outcome of a computation that produces a value.

use core::fmt;
use core::panic::Location;
use std::future::Future;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::bridge;
use crate::callable::{attempt, capture, Callable};
use crate::caught::{Caught, CreationFailure};
use crate::error::Error;

/// Either the value a computation produced, or the failure it raised.
///
/// A `Try` is only ever built by the entry points below and by the
/// combinators on an existing `Try`. Which variant it holds is fixed at
/// construction.
///
/// # Examples
///
/// ```
/// use try_this::Try;
///
/// let port = Try::create(|s: &str| s.parse::<u16>(), ("8080",));
/// assert_eq!(port.value_or(80), 8080);
///
/// let port = Try::create_with_cause(|s: &str| s.parse::<u16>(), ("http",), "reading port");
/// let failure = port.error().unwrap();
/// assert_eq!(failure.cause(), Some("reading port"));
/// ```
pub struct Try<T> {
    pub(crate) state: State<T>,
}

pub(crate) enum State<T> {
    Success(T),
    Failure(CreationFailure),
}

// ============================================================
// Entry points
// ============================================================

impl<T> Try<T> {
    /// Call `f` with `args` and capture the outcome.
    ///
    /// `f` returns `Result<T, E>`. Both an `Err` and a panic become a
    /// failure; a `None` callable does too.
    #[track_caller]
    pub fn create<F, Args, E>(f: F, args: Args) -> Self
    where
        F: Callable<Args, Output = Result<T, E>>,
        E: Into<Error>,
    {
        Self::lift(attempt(f, args), None, Location::caller())
    }

    /// Like [`create`](Self::create), recording why the value was needed.
    #[track_caller]
    pub fn create_with_cause<F, Args, E>(f: F, args: Args, cause: impl Into<Arc<str>>) -> Self
    where
        F: Callable<Args, Output = Result<T, E>>,
        E: Into<Error>,
    {
        Self::lift(attempt(f, args), Some(cause.into()), Location::caller())
    }

    /// Call `f` with `args`, then block until the returned future resolves.
    ///
    /// The future's own error (or panic) is captured as-is, never a wrapper
    /// around it. Cancellation and a refused blocking wait surface as
    /// failures too. See [`bridge`](crate::bridge) for the blocking rules.
    #[track_caller]
    pub fn create_from_task<F, Args, Fut, E>(f: F, args: Args, cancel: &CancellationToken) -> Self
    where
        F: Callable<Args, Output = Fut>,
        Fut: Future<Output = Result<T, E>>,
        E: Into<Error>,
    {
        Self::lift(run_task(f, args, cancel), None, Location::caller())
    }

    /// Like [`create_from_task`](Self::create_from_task), recording why the
    /// value was needed.
    #[track_caller]
    pub fn create_from_task_with_cause<F, Args, Fut, E>(
        f: F,
        args: Args,
        cause: impl Into<Arc<str>>,
        cancel: &CancellationToken,
    ) -> Self
    where
        F: Callable<Args, Output = Fut>,
        Fut: Future<Output = Result<T, E>>,
        E: Into<Error>,
    {
        Self::lift(run_task(f, args, cancel), Some(cause.into()), Location::caller())
    }

    pub(crate) fn lift(
        result: Result<T, Error>,
        cause: Option<Arc<str>>,
        site: &'static Location<'static>,
    ) -> Self {
        match result {
            Ok(value) => Self::success(value),
            Err(error) => Self::failure(Caught::new(error, cause, site)),
        }
    }

    #[inline]
    pub(crate) fn success(value: T) -> Self {
        Self { state: State::Success(value) }
    }

    #[inline]
    pub(crate) fn failure(failure: CreationFailure) -> Self {
        Self { state: State::Failure(failure) }
    }
}

fn run_task<F, Args, Fut, T, E>(f: F, args: Args, cancel: &CancellationToken) -> Result<T, Error>
where
    F: Callable<Args, Output = Fut>,
    Fut: Future<Output = Result<T, E>>,
    E: Into<Error>,
{
    capture(move || {
        let future = f.call(args)?;
        bridge::wait(future, cancel)?.map_err(Into::into)
    })
}

// ============================================================
// Queries and eager access
// ============================================================

impl<T> Try<T> {
    /// Whether a value was produced.
    #[inline]
    pub fn is_success(&self) -> bool {
        matches!(self.state, State::Success(_))
    }

    /// Whether a failure was captured.
    #[inline]
    pub fn is_failure(&self) -> bool {
        !self.is_success()
    }

    /// The value, if any.
    pub fn value(&self) -> Option<&T> {
        match &self.state {
            State::Success(value) => Some(value),
            State::Failure(_) => None,
        }
    }

    /// The failure, if any.
    pub fn error(&self) -> Option<&CreationFailure> {
        match &self.state {
            State::Success(_) => None,
            State::Failure(failure) => Some(failure),
        }
    }

    /// Eager access: the value, or the failure re-raised as an `Err`.
    ///
    /// The caller's location is appended to the failure's trace.
    #[track_caller]
    pub fn get(self) -> Result<T, CreationFailure> {
        match self.state {
            State::Success(value) => Ok(value),
            State::Failure(failure) => Err(failure.here()),
        }
    }

    /// Eager access that re-raises the original underlying error.
    ///
    /// # Panics
    ///
    /// On a failure, logs the failure and its trace at `error` level, then
    /// unwinds with the underlying [`Error`] as payload (see
    /// [`rethrow`](crate::rethrow)). A capture boundary further up recovers
    /// that very error.
    #[track_caller]
    pub fn unwrap(self) -> T {
        match self.state {
            State::Success(value) => value,
            State::Failure(failure) => failure.rethrow(),
        }
    }

    /// Convert into a plain `Result`.
    pub fn into_result(self) -> Result<T, CreationFailure> {
        match self.state {
            State::Success(value) => Ok(value),
            State::Failure(failure) => Err(failure),
        }
    }

    /// Split into `(value, failure)`; exactly one side is `Some`.
    pub fn deconstruct(self) -> (Option<T>, Option<CreationFailure>) {
        match self.state {
            State::Success(value) => (Some(value), None),
            State::Failure(failure) => (None, Some(failure)),
        }
    }

    /// Split into `(value, succeeded, failure)`, with `T::default()` standing
    /// in for the value of a failure.
    pub fn deconstruct_or_default(self) -> (T, bool, Option<CreationFailure>)
    where
        T: Default,
    {
        match self.state {
            State::Success(value) => (value, true, None),
            State::Failure(failure) => (T::default(), false, Some(failure)),
        }
    }
}

// ============================================================
// Combinators
// ============================================================

impl<T> Try<T> {
    /// Transform the value. A panic in `f` becomes a new failure; an
    /// existing failure passes through untouched.
    #[track_caller]
    pub fn map<U, F>(self, f: F) -> Try<U>
    where
        F: FnOnce(T) -> U,
    {
        let site = Location::caller();
        match self.state {
            State::Success(value) => Try::lift(capture(move || Ok(f(value))), None, site),
            State::Failure(failure) => Try::failure(failure),
        }
    }

    /// Transform the value with a fallible function.
    #[track_caller]
    pub fn try_map<U, E, F>(self, f: F) -> Try<U>
    where
        F: FnOnce(T) -> Result<U, E>,
        E: Into<Error>,
    {
        let site = Location::caller();
        match self.state {
            State::Success(value) => {
                Try::lift(capture(move || f(value).map_err(Into::into)), None, site)
            }
            State::Failure(failure) => Try::failure(failure),
        }
    }

    /// Chain a computation that already returns a `Try`.
    ///
    /// `f` is called as-is: nothing it raises is captured here. A failure
    /// short-circuits with the same underlying error.
    pub fn bind<U, F>(self, f: F) -> Try<U>
    where
        F: FnOnce(T) -> Try<U>,
    {
        match self.state {
            State::Success(value) => f(value),
            State::Failure(failure) => Try::failure(failure),
        }
    }

    /// Replace a failure with a value computed from it.
    ///
    /// A panic in `f` becomes a new failure carrying the same cause. On a
    /// success this returns `self` unchanged.
    #[track_caller]
    pub fn recover<F>(self, f: F) -> Self
    where
        F: FnOnce(&CreationFailure) -> T,
    {
        let site = Location::caller();
        match self.state {
            State::Success(_) => self,
            State::Failure(failure) => {
                let cause = failure.cause_handle();
                Self::lift(capture(move || Ok(f(&failure))), cause, site)
            }
        }
    }

    /// Replace a failure with another `Try` computed from it.
    pub fn recover_with<F>(self, f: F) -> Self
    where
        F: FnOnce(&CreationFailure) -> Try<T>,
    {
        match self.state {
            State::Success(_) => self,
            State::Failure(failure) => f(&failure),
        }
    }

    /// Exhaustive case analysis; exactly one branch runs.
    pub fn match_with<R, S, F>(self, on_success: S, on_failure: F) -> R
    where
        S: FnOnce(T) -> R,
        F: FnOnce(CreationFailure) -> R,
    {
        match self.state {
            State::Success(value) => on_success(value),
            State::Failure(failure) => on_failure(failure),
        }
    }

    /// Run the matching side effect and hand `self` back.
    ///
    /// Unlike [`map`](Self::map), panics in the callbacks are not captured.
    pub fn tap<S, F>(self, on_success: S, on_failure: F) -> Self
    where
        S: FnOnce(&T),
        F: FnOnce(&CreationFailure),
    {
        match &self.state {
            State::Success(value) => on_success(value),
            State::Failure(failure) => on_failure(failure),
        }
        self
    }

    /// Run `f` on the value, if any.
    pub fn tap_success<S: FnOnce(&T)>(self, f: S) -> Self {
        if let State::Success(value) = &self.state {
            f(value);
        }
        self
    }

    /// Run `f` on the failure, if any.
    pub fn tap_failure<F: FnOnce(&CreationFailure)>(self, f: F) -> Self {
        if let State::Failure(failure) = &self.state {
            f(failure);
        }
        self
    }
}

// ============================================================
// Trait impls
// ============================================================

impl<T: Clone> Clone for Try<T> {
    fn clone(&self) -> Self {
        match &self.state {
            State::Success(value) => Self::success(value.clone()),
            State::Failure(failure) => Self::failure(failure.clone()),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Try<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.state {
            State::Success(value) => f.debug_tuple("Success").field(value).finish(),
            State::Failure(failure) => f.debug_tuple("Failure").field(failure).finish(),
        }
    }
}

/// Successes compare by value; failures by identity of the underlying error.
impl<T: PartialEq> PartialEq for Try<T> {
    fn eq(&self, other: &Self) -> bool {
        match (&self.state, &other.state) {
            (State::Success(a), State::Success(b)) => a == b,
            (State::Failure(a), State::Failure(b)) => a == b,
            _ => false,
        }
    }
}

impl<T: Eq> Eq for Try<T> {}

impl<T> From<Try<T>> for Result<T, CreationFailure> {
    fn from(t: Try<T>) -> Self {
        t.into_result()
    }
}
