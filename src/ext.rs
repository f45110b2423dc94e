//! Extension traits for sequences and plain `Result`s.

use core::panic::Location;
use std::sync::Arc;

use crate::callable::{ActionOutput, ArgFactories, CallableMut};
use crate::error::Error;
use crate::outcome::Try;
use crate::range::InvokeRange;

/// Method-call form of [`TryAction::invoke_range`](crate::TryAction::invoke_range) on any
/// `IntoIterator`.
///
/// ```
/// use try_this::InvokeExt;
///
/// let failed = ["1", "two", "3"]
///     .invoke_each(|s: &str| s.parse::<i32>().map(drop), ())
///     .filter(|t| t.is_failure())
///     .count();
/// assert_eq!(failed, 1);
/// ```
pub trait InvokeExt: IntoIterator + Sized {
    /// Invoke `action` once per element, lazily.
    #[track_caller]
    fn invoke_each<F, Fs>(self, action: F, factories: Fs) -> InvokeRange<Self::IntoIter, F, Fs>
    where
        Fs: ArgFactories<Self::Item>,
        F: CallableMut<Fs::Args>,
        F::Output: ActionOutput,
    {
        InvokeRange::new(self.into_iter(), action, factories, None, Location::caller())
    }

    /// Invoke `action` once per element, recording why on every failure.
    #[track_caller]
    fn invoke_each_with_cause<F, Fs>(
        self,
        action: F,
        factories: Fs,
        cause: impl Into<Arc<str>>,
    ) -> InvokeRange<Self::IntoIter, F, Fs>
    where
        Fs: ArgFactories<Self::Item>,
        F: CallableMut<Fs::Args>,
        F::Output: ActionOutput,
    {
        InvokeRange::new(self.into_iter(), action, factories, Some(cause.into()), Location::caller())
    }
}

impl<I: IntoIterator> InvokeExt for I {}

/// Lift an already computed `Result` into the `Try` world.
pub trait TryResultExt<T> {
    /// `Ok` becomes a success, `Err` a failure captured at the caller.
    fn into_try(self) -> Try<T>;

    /// Like [`into_try`](Self::into_try), recording why the value was needed.
    fn into_try_with_cause(self, cause: impl Into<Arc<str>>) -> Try<T>;
}

impl<T, E: Into<Error>> TryResultExt<T> for Result<T, E> {
    #[track_caller]
    fn into_try(self) -> Try<T> {
        Try::lift(self.map_err(Into::into), None, Location::caller())
    }

    #[track_caller]
    fn into_try_with_cause(self, cause: impl Into<Arc<str>>) -> Try<T> {
        Try::lift(self.map_err(Into::into), Some(cause.into()), Location::caller())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::TryAction;
    use std::cell::Cell;
    use std::io;

    #[test]
    fn invoke_each_matches_invoke_range() {
        let total = Cell::new(0);
        let results: Vec<_> = vec![1, 2, 3]
            .invoke_each(|n: i32, scale: i32| total.set(total.get() + n * scale), (|_: usize| 2,))
            .collect();
        assert!(results.iter().all(TryAction::is_success));
        assert_eq!(total.get(), 12);
    }

    #[test]
    fn invoke_each_with_cause_tags_failures() {
        let first = (0..2)
            .invoke_each_with_cause(|_: i32| -> Result<(), io::Error> { Err(io::ErrorKind::Other.into()) }, (), "sweeping")
            .next()
            .unwrap();
        assert_eq!(first.error().unwrap().cause(), Some("sweeping"));
    }

    #[test]
    fn into_try_captures_at_the_caller() {
        let line = line!() + 1;
        let t = "x".parse::<u8>().into_try();
        let failure = t.error().unwrap();
        assert_eq!(failure.site().line, line);
        assert!(failure.underlying().is::<std::num::ParseIntError>());

        assert_eq!("7".parse::<u8>().into_try_with_cause("parsing").value(), Some(&7));
    }
}
