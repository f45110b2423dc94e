//! `TryAction`: the outcome of a computation that produces no value.

use core::fmt;
use core::panic::Location;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;

use crate::callable::{capture, identity_of, ActionOutput, ArgFactories, Callable, CallableMut};
use crate::caught::{Caught, InvocationFailure};
use crate::error::Error;
use crate::outcome::Try;
use crate::range::InvokeRange;

/// Identity of the callable behind a [`TryAction`].
///
/// Derived from the callable's type: every invocation of the same closure
/// or function carries the same token. Function pointers and boxed or
/// borrowed `dyn Fn*` objects are told apart by the pointer they hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActionToken(u64);

impl ActionToken {
    /// Token of the callable type `C`.
    ///
    /// Matches [`of_val`](Self::of_val) for closures and function items,
    /// not for function pointers or trait objects.
    pub fn of<C>() -> Self {
        Self(identity_of::<C>())
    }

    /// Token of the given callable.
    pub fn of_val<C, Args>(callable: &C) -> Self
    where
        C: Callable<Args>,
    {
        Self(Callable::identity(callable))
    }

    pub(crate) fn from_identity(identity: u64) -> Self {
        Self(identity)
    }

    /// The raw hash.
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Whether an action ran to completion, or the failure it raised.
///
/// # Examples
///
/// ```
/// use try_this::TryAction;
///
/// let mut log = Vec::new();
/// let done = TryAction::invoke(|line: &str| log.push(line.to_string()), ("started",));
/// assert!(done.is_success());
/// assert_eq!(log, ["started"]);
/// ```
pub struct TryAction {
    pub(crate) state: ActionState,
    token: ActionToken,
}

pub(crate) enum ActionState {
    Success,
    Failure(InvocationFailure),
}

// ============================================================
// Entry points
// ============================================================

impl TryAction {
    /// Call `action` with `args` and capture the outcome.
    ///
    /// `action` returns `()` or `Result<(), E>`. An `Err`, a panic or a
    /// `None` callable all become a failure.
    #[track_caller]
    pub fn invoke<F, Args>(action: F, args: Args) -> Self
    where
        F: Callable<Args>,
        F::Output: ActionOutput,
    {
        let token = ActionToken::of_val(&action);
        Self::lift(run(action, args), token, None, Location::caller())
    }

    /// Like [`invoke`](Self::invoke), recording why the action ran.
    #[track_caller]
    pub fn invoke_with_cause<F, Args>(action: F, args: Args, cause: impl Into<Arc<str>>) -> Self
    where
        F: Callable<Args>,
        F::Output: ActionOutput,
    {
        let token = ActionToken::of_val(&action);
        Self::lift(run(action, args), token, Some(cause.into()), Location::caller())
    }

    /// Await `action` until it resolves to a callable, then invoke that
    /// callable synchronously.
    ///
    /// Failing to resolve (an `Err` or a panic while polling) is itself an
    /// invocation failure.
    #[track_caller]
    pub fn invoke_async<Fut, C, E, Args>(action: Fut, args: Args) -> impl Future<Output = Self>
    where
        Fut: Future<Output = Result<C, E>>,
        E: Into<Error>,
        C: Callable<Args>,
        C::Output: ActionOutput,
    {
        resolve_and_run(action, args, None, Location::caller())
    }

    /// Like [`invoke_async`](Self::invoke_async), recording why the action
    /// ran.
    #[track_caller]
    pub fn invoke_async_with_cause<Fut, C, E, Args>(
        action: Fut,
        args: Args,
        cause: impl Into<Arc<str>>,
    ) -> impl Future<Output = Self>
    where
        Fut: Future<Output = Result<C, E>>,
        E: Into<Error>,
        C: Callable<Args>,
        C::Output: ActionOutput,
    {
        resolve_and_run(action, args, Some(cause.into()), Location::caller())
    }

    /// Invoke `action` once per element of `items`, lazily and in order.
    ///
    /// Each element is the action's first argument. Further arguments come
    /// from `factories`, a tuple of `FnMut(usize) -> X` called with the
    /// element's index right before that element's invocation. Pass `()`
    /// when the action takes the element only.
    ///
    /// ```
    /// use try_this::TryAction;
    ///
    /// let mut seen = Vec::new();
    /// let results: Vec<_> = TryAction::invoke_range(
    ///     [1, 2, 3],
    ///     |item: i32, scaled: usize| seen.push((item, scaled)),
    ///     (|index: usize| index * 10,),
    /// )
    /// .collect();
    ///
    /// assert!(results.iter().all(TryAction::is_success));
    /// assert_eq!(seen, [(1, 0), (2, 10), (3, 20)]);
    /// ```
    #[track_caller]
    pub fn invoke_range<I, F, Fs>(items: I, action: F, factories: Fs) -> InvokeRange<I::IntoIter, F, Fs>
    where
        I: IntoIterator,
        Fs: ArgFactories<I::Item>,
        F: CallableMut<Fs::Args>,
        F::Output: ActionOutput,
    {
        InvokeRange::new(items.into_iter(), action, factories, None, Location::caller())
    }

    /// Like [`invoke_range`](Self::invoke_range), recording why the actions
    /// ran on every failure.
    #[track_caller]
    pub fn invoke_range_with_cause<I, F, Fs>(
        items: I,
        action: F,
        factories: Fs,
        cause: impl Into<Arc<str>>,
    ) -> InvokeRange<I::IntoIter, F, Fs>
    where
        I: IntoIterator,
        Fs: ArgFactories<I::Item>,
        F: CallableMut<Fs::Args>,
        F::Output: ActionOutput,
    {
        InvokeRange::new(items.into_iter(), action, factories, Some(cause.into()), Location::caller())
    }

    pub(crate) fn lift(
        result: Result<(), Error>,
        token: ActionToken,
        cause: Option<Arc<str>>,
        site: &'static Location<'static>,
    ) -> Self {
        let state = match result {
            Ok(()) => ActionState::Success,
            Err(error) => ActionState::Failure(Caught::new(error, cause, site)),
        };
        Self { state, token }
    }
}

fn run<F, Args>(action: F, args: Args) -> Result<(), Error>
where
    F: Callable<Args>,
    F::Output: ActionOutput,
{
    capture(move || action.call(args)?.into_outcome())
}

async fn resolve_and_run<Fut, C, E, Args>(
    action: Fut,
    args: Args,
    cause: Option<Arc<str>>,
    site: &'static Location<'static>,
) -> TryAction
where
    Fut: Future<Output = Result<C, E>>,
    E: Into<Error>,
    C: Callable<Args>,
    C::Output: ActionOutput,
{
    let (token, outcome) = match AssertUnwindSafe(action).catch_unwind().await {
        Ok(Ok(callable)) => (ActionToken::of_val(&callable), run(callable, args)),
        Ok(Err(error)) => (ActionToken::of::<C>(), Err(error.into())),
        Err(payload) => (ActionToken::of::<C>(), Err(Error::from_panic(payload))),
    };
    TryAction::lift(outcome, token, cause, site)
}

// ============================================================
// Queries and eager access
// ============================================================

impl TryAction {
    /// Whether the action ran to completion.
    #[inline]
    pub fn is_success(&self) -> bool {
        matches!(self.state, ActionState::Success)
    }

    /// Whether a failure was captured.
    #[inline]
    pub fn is_failure(&self) -> bool {
        !self.is_success()
    }

    /// The failure, if any.
    pub fn error(&self) -> Option<&InvocationFailure> {
        match &self.state {
            ActionState::Success => None,
            ActionState::Failure(failure) => Some(failure),
        }
    }

    /// Identity of the invoked callable.
    pub fn token(&self) -> ActionToken {
        self.token
    }

    /// Eager access: `Ok(())`, or the failure re-raised as an `Err`.
    #[track_caller]
    pub fn get(self) -> Result<(), InvocationFailure> {
        match self.state {
            ActionState::Success => Ok(()),
            ActionState::Failure(failure) => Err(failure.here()),
        }
    }

    /// Eager access that re-raises the original underlying error.
    ///
    /// # Panics
    ///
    /// On a failure, logs the failure and its trace at `error` level, then
    /// unwinds with the underlying [`Error`] as payload.
    #[track_caller]
    pub fn unwrap(self) {
        if let ActionState::Failure(failure) = self.state {
            failure.rethrow();
        }
    }

    /// Convert into a plain `Result`.
    pub fn into_result(self) -> Result<(), InvocationFailure> {
        match self.state {
            ActionState::Success => Ok(()),
            ActionState::Failure(failure) => Err(failure),
        }
    }

    /// Split into `(succeeded, failure)`.
    pub fn deconstruct(self) -> (bool, Option<InvocationFailure>) {
        match self.state {
            ActionState::Success => (true, None),
            ActionState::Failure(failure) => (false, Some(failure)),
        }
    }
}

// ============================================================
// Combinators
// ============================================================

impl TryAction {
    /// Produce a value after a successful action.
    ///
    /// A panic in `f` becomes a creation failure. An invocation failure is
    /// carried over with the same underlying error and cause.
    #[track_caller]
    pub fn map<U, F>(self, f: F) -> Try<U>
    where
        F: FnOnce() -> U,
    {
        let site = Location::caller();
        match self.state {
            ActionState::Success => Try::lift(capture(move || Ok(f())), None, site),
            ActionState::Failure(failure) => Try::failure(failure.rekind()),
        }
    }

    /// Run a compensating action on failure.
    ///
    /// The result carries the compensating action's token. On a success this
    /// returns `self` unchanged.
    #[track_caller]
    pub fn recover<F>(self, f: F) -> Self
    where
        F: FnOnce(&InvocationFailure),
    {
        let site = Location::caller();
        match self.state {
            ActionState::Success => self,
            ActionState::Failure(failure) => {
                let token = ActionToken::of::<F>();
                let cause = failure.cause_handle();
                Self::lift(capture(move || Ok(f(&failure))), token, cause, site)
            }
        }
    }

    /// Replace a failure with another `TryAction` computed from it.
    pub fn recover_with<F>(self, f: F) -> Self
    where
        F: FnOnce(&InvocationFailure) -> TryAction,
    {
        match self.state {
            ActionState::Success => self,
            ActionState::Failure(failure) => f(&failure),
        }
    }

    /// Exhaustive case analysis; exactly one branch runs.
    pub fn match_with<R, S, F>(self, on_success: S, on_failure: F) -> R
    where
        S: FnOnce() -> R,
        F: FnOnce(InvocationFailure) -> R,
    {
        match self.state {
            ActionState::Success => on_success(),
            ActionState::Failure(failure) => on_failure(failure),
        }
    }

    /// Run the matching side effect and hand `self` back.
    ///
    /// Panics in the callbacks are not captured.
    pub fn tap<S, F>(self, on_success: S, on_failure: F) -> Self
    where
        S: FnOnce(),
        F: FnOnce(&InvocationFailure),
    {
        match &self.state {
            ActionState::Success => on_success(),
            ActionState::Failure(failure) => on_failure(failure),
        }
        self
    }

    /// Run `f` if the action succeeded.
    pub fn tap_success<S: FnOnce()>(self, f: S) -> Self {
        if self.is_success() {
            f();
        }
        self
    }

    /// Run `f` on the failure, if any.
    pub fn tap_failure<F: FnOnce(&InvocationFailure)>(self, f: F) -> Self {
        if let ActionState::Failure(failure) = &self.state {
            f(failure);
        }
        self
    }
}

// ============================================================
// Trait impls
// ============================================================

impl Clone for TryAction {
    fn clone(&self) -> Self {
        let state = match &self.state {
            ActionState::Success => ActionState::Success,
            ActionState::Failure(failure) => ActionState::Failure(failure.clone()),
        };
        Self { state, token: self.token }
    }
}

impl fmt::Debug for TryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.state {
            ActionState::Success => f.debug_tuple("SuccessAction").field(&self.token).finish(),
            ActionState::Failure(failure) => f
                .debug_tuple("FailureAction")
                .field(&self.token)
                .field(failure)
                .finish(),
        }
    }
}

/// Same callable, and for failures the very same underlying error.
impl PartialEq for TryAction {
    fn eq(&self, other: &Self) -> bool {
        if self.token != other.token {
            return false;
        }
        match (&self.state, &other.state) {
            (ActionState::Success, ActionState::Success) => true,
            (ActionState::Failure(a), ActionState::Failure(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for TryAction {}

impl From<TryAction> for Result<(), InvocationFailure> {
    fn from(action: TryAction) -> Self {
        action.into_result()
    }
}
