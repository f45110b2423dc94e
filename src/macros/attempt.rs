//! `attempt!` and `invoke!`: block forms of [`Try::create`](crate::Try::create)
//! and [`TryAction::invoke`](crate::TryAction::invoke).
//!
//! The body runs inside a closure returning `Result<_, Error>`, so `?` works
//! on any error that converts into [`Error`](crate::Error).

/// Run a block and capture its value as a [`Try`](crate::Try).
///
/// ```
/// use try_this::attempt;
///
/// let port = attempt! { "8080".parse::<u16>()? };
/// assert_eq!(port.value(), Some(&8080));
///
/// let port = attempt! {
///     cause = "reading port";
///     "http".parse::<u16>()?
/// };
/// assert_eq!(port.error().unwrap().cause(), Some("reading port"));
/// ```
#[macro_export]
macro_rules! attempt {
    (cause = $cause:expr; $($body:tt)*) => {
        $crate::Try::create_with_cause($crate::__try_block!($($body)*), (), $cause)
    };
    ($($body:tt)*) => {
        $crate::Try::create($crate::__try_block!($($body)*), ())
    };
}

/// Run a block for its side effects and capture the outcome as a
/// [`TryAction`](crate::TryAction).
///
/// ```
/// use try_this::invoke;
///
/// let mut lines = Vec::new();
/// let done = invoke! {
///     let n: u8 = "3".parse()?;
///     lines.push(n);
/// };
/// assert!(done.is_success());
/// ```
#[macro_export]
macro_rules! invoke {
    (cause = $cause:expr; $($body:tt)*) => {
        $crate::TryAction::invoke_with_cause($crate::__action_block!($($body)*), (), $cause)
    };
    ($($body:tt)*) => {
        $crate::TryAction::invoke($crate::__action_block!($($body)*), ())
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __try_block {
    ($($body:tt)*) => {
        || -> ::core::result::Result<_, $crate::Error> {
            ::core::result::Result::Ok({ $($body)* })
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __action_block {
    ($($body:tt)*) => {
        || -> ::core::result::Result<(), $crate::Error> {
            { $($body)* }
            ::core::result::Result::Ok(())
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::Fault;

    #[test]
    fn attempt_captures_question_mark_errors() {
        let t = attempt! {
            let a: i32 = "4".parse()?;
            let b: i32 = "x".parse()?;
            a + b
        };
        assert!(t.error().unwrap().underlying().is::<std::num::ParseIntError>());
    }

    #[test]
    fn attempt_captures_panics_and_cause() {
        let t = attempt! {
            cause = "dividing";
            let divisor = "0".parse::<i32>()?;
            10 / divisor
        };
        let failure = t.error().unwrap();
        assert!(failure.underlying().is_panic());
        assert_eq!(failure.cause(), Some("dividing"));
    }

    #[test]
    fn invoke_captures_faults() {
        let t = invoke! {
            cause = "checking";
            return Err(Fault::Missing("config").into());
        };
        assert_eq!(t.error().unwrap().underlying().to_string(), "no config was supplied");
        assert!(invoke! { let _ = 1 + 1; }.is_success());
    }
}
