//! Safe extraction: get the value of a [`Try`] or a fallback.
//!
//! Every method here follows one rule. On a success it returns the held
//! value. On a failure it never panics on its own account and applies exactly
//! one fallback strategy.
//!
//! | Fallback                     | Plain                 | Boolean                        |
//! |------------------------------|-----------------------|--------------------------------|
//! | `T::default()`               | `value_or_default`    | `try_get_value`                |
//! | a given value                | `value_or`            | `try_get_value_or`             |
//! | `FnOnce() -> T`              | `value_or_else`       | `try_get_value_or_else`        |
//! | `FnOnce(&failure) -> T`      | `value_or_else_error` | `try_get_value_or_else_error`  |
//! | `FnOnce(&Error, cause) -> T` | `value_or_else_cause` | `try_get_value_or_else_cause`  |
//!
//! The plain family lets a panicking fallback unwind. The boolean family
//! swallows it and yields `(false, T::default())`.

use std::future::{ready, Ready};

use crate::callable::capture;
use crate::caught::CreationFailure;
use crate::error::Error;
use crate::outcome::{State, Try};

/// When the boolean extraction family reports `true`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Acceptance {
    /// Only for an original success.
    #[default]
    SuccessOnly,
    /// Also when a fallback produced the value.
    Fallback,
}

impl<T> Try<T> {
    /// The value, or `T::default()`.
    pub fn value_or_default(self) -> T
    where
        T: Default,
    {
        self.value_or_else(T::default)
    }

    /// The value, or `default`.
    pub fn value_or(self, default: T) -> T {
        self.value_or_else(move || default)
    }

    /// The value, or whatever `f` returns.
    pub fn value_or_else<F: FnOnce() -> T>(self, f: F) -> T {
        match self.state {
            State::Success(value) => value,
            State::Failure(_) => f(),
        }
    }

    /// The value, or a fallback computed from the failure.
    pub fn value_or_else_error<F: FnOnce(&CreationFailure) -> T>(self, f: F) -> T {
        match self.state {
            State::Success(value) => value,
            State::Failure(failure) => f(&failure),
        }
    }

    /// The value, or a fallback computed from the underlying error and the
    /// cause.
    pub fn value_or_else_cause<F: FnOnce(&Error, Option<&str>) -> T>(self, f: F) -> T {
        match self.state {
            State::Success(value) => value,
            State::Failure(failure) => f(failure.underlying(), failure.cause()),
        }
    }

    /// [`value_or_default`](Self::value_or_default) as an already-completed
    /// future.
    pub fn value_or_default_async(self) -> Ready<T>
    where
        T: Default,
    {
        ready(self.value_or_default())
    }

    /// [`value_or`](Self::value_or) as an already-completed future.
    pub fn value_or_async(self, default: T) -> Ready<T> {
        ready(self.value_or(default))
    }

    /// [`value_or_else`](Self::value_or_else) as an already-completed future.
    pub fn value_or_else_async<F: FnOnce() -> T>(self, f: F) -> Ready<T> {
        ready(self.value_or_else(f))
    }

    /// [`value_or_else_error`](Self::value_or_else_error) as an
    /// already-completed future.
    pub fn value_or_else_error_async<F: FnOnce(&CreationFailure) -> T>(self, f: F) -> Ready<T> {
        ready(self.value_or_else_error(f))
    }

    /// [`value_or_else_cause`](Self::value_or_else_cause) as an
    /// already-completed future.
    pub fn value_or_else_cause_async<F: FnOnce(&Error, Option<&str>) -> T>(self, f: F) -> Ready<T> {
        ready(self.value_or_else_cause(f))
    }
}

// ============================================================
// Boolean family
// ============================================================

impl<T: Default> Try<T> {
    /// `(true, value)` on a success, `(false, T::default())` on a failure.
    pub fn try_get_value(self) -> (bool, T) {
        match self.state {
            State::Success(value) => (true, value),
            State::Failure(_) => (false, T::default()),
        }
    }

    /// Like [`try_get_value`](Self::try_get_value) with `default` as the
    /// fallback.
    pub fn try_get_value_or(self, default: T, acceptance: Acceptance) -> (bool, T) {
        match self.state {
            State::Success(value) => (true, value),
            State::Failure(_) => (acceptance == Acceptance::Fallback, default),
        }
    }

    /// Like [`try_get_value`](Self::try_get_value) with a fallback factory.
    ///
    /// A panic in `f` yields `(false, T::default())`.
    pub fn try_get_value_or_else<F: FnOnce() -> T>(self, f: F, acceptance: Acceptance) -> (bool, T) {
        self.try_get_value_with(acceptance, |_| f())
    }

    /// Like [`try_get_value_or_else`](Self::try_get_value_or_else), with the
    /// failure passed to the factory.
    pub fn try_get_value_or_else_error<F>(self, f: F, acceptance: Acceptance) -> (bool, T)
    where
        F: FnOnce(&CreationFailure) -> T,
    {
        self.try_get_value_with(acceptance, f)
    }

    /// Like [`try_get_value_or_else`](Self::try_get_value_or_else), with the
    /// underlying error and the cause passed to the factory.
    pub fn try_get_value_or_else_cause<F>(self, f: F, acceptance: Acceptance) -> (bool, T)
    where
        F: FnOnce(&Error, Option<&str>) -> T,
    {
        self.try_get_value_with(acceptance, |failure| f(failure.underlying(), failure.cause()))
    }

    fn try_get_value_with<F>(self, acceptance: Acceptance, f: F) -> (bool, T)
    where
        F: FnOnce(&CreationFailure) -> T,
    {
        let failure = match self.state {
            State::Success(value) => return (true, value),
            State::Failure(failure) => failure,
        };
        match capture(|| Ok(f(&failure))) {
            Ok(value) => (acceptance == Acceptance::Fallback, value),
            Err(error) => {
                tracing::debug!(
                    code = failure.code(),
                    error = %error,
                    original = %failure.underlying(),
                    "fallback factory failed, using default"
                );
                (false, T::default())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    fn ok(v: i32) -> Try<i32> {
        Try::create(move || Ok::<_, io::Error>(v), ())
    }

    fn failed() -> Try<i32> {
        Try::create_with_cause(|| Err::<i32, _>(io::Error::new(io::ErrorKind::Other, "boom")), (), "loading")
    }

    #[test]
    fn success_always_returns_the_value() {
        assert_eq!(ok(5).value_or_default(), 5);
        assert_eq!(ok(5).value_or(1), 5);
        assert_eq!(ok(5).value_or_else(|| unreachable!()), 5);
        assert_eq!(ok(5).value_or_else_error(|_| unreachable!()), 5);
        assert_eq!(ok(5).value_or_else_cause(|_, _| unreachable!()), 5);
        assert_eq!(ok(5).try_get_value_or_else(|| unreachable!(), Acceptance::Fallback), (true, 5));
    }

    #[test]
    fn failure_applies_one_fallback() {
        assert_eq!(failed().value_or_default(), 0);
        assert_eq!(failed().value_or(1), 1);
        assert_eq!(failed().value_or_else(|| 2), 2);
        assert_eq!(failed().value_or_else_error(|f| f.code() as i32), 0x0C01);
        let len = failed().value_or_else_cause(|err, cause| (err.to_string().len() + cause.map_or(0, str::len)) as i32);
        assert_eq!(len, "boom".len() as i32 + "loading".len() as i32);
    }

    #[tokio::test]
    async fn async_forms_are_already_complete() {
        assert_eq!(ok(3).value_or_async(9).await, 3);
        assert_eq!(failed().value_or_default_async().await, 0);
        assert_eq!(failed().value_or_else_async(|| 4).await, 4);
        assert_eq!(failed().value_or_else_error_async(|_| 6).await, 6);
        assert_eq!(failed().value_or_else_cause_async(|_, c| c.map_or(0, str::len) as i32).await, 7);
    }

    #[test]
    fn boolean_family_reports_original_outcome() {
        assert_eq!(ok(1).try_get_value(), (true, 1));
        assert_eq!(failed().try_get_value(), (false, 0));
        assert_eq!(failed().try_get_value_or(8, Acceptance::SuccessOnly), (false, 8));
        assert_eq!(failed().try_get_value_or(8, Acceptance::Fallback), (true, 8));
        assert_eq!(failed().try_get_value_or_else_error(|_| 3, Acceptance::default()), (false, 3));
        assert_eq!(
            failed().try_get_value_or_else_cause(|_, cause| cause.map_or(0, str::len) as i32, Acceptance::Fallback),
            (true, 7)
        );
    }

    #[test]
    fn boolean_family_swallows_fallback_panics() {
        let result = failed().try_get_value_or_else(|| panic!("fallback broke"), Acceptance::Fallback);
        assert_eq!(result, (false, 0));
    }

    #[test]
    #[should_panic(expected = "fallback broke")]
    fn plain_family_lets_fallback_panics_through() {
        failed().value_or_else(|| panic!("fallback broke"));
    }
}
