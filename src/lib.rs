//! try-this - Capture failing computations as values
//!
//! # Overview
//!
//! `try-this` turns computations that may fail (by returning `Err` or by
//! panicking, synchronously or asynchronously) into values you can inspect,
//! transform, recover from and unwrap. A value-producing computation becomes
//! a [`Try<T>`]; a side effect becomes a [`TryAction`].
//!
//! Nothing escapes a capture boundary uncaught. The only places a failure
//! turns back into control flow are the eager accessors (`get`, `unwrap`)
//! and the side-effect callbacks of `tap`.
//!
//! # Quick Start
//!
//! ```
//! use try_this::{attempt, Try};
//!
//! fn parse_port(raw: &str) -> Try<u16> {
//!     Try::create_with_cause(|s: &str| s.parse::<u16>(), (raw,), "parsing port")
//! }
//!
//! assert_eq!(parse_port("8080").value_or(80), 8080);
//! assert_eq!(parse_port("http").value_or(80), 80);
//!
//! let doubled = attempt! { "21".parse::<u32>()? * 2 };
//! assert_eq!(doubled.value(), Some(&42));
//! ```
//!
//! # Entry points
//!
//! Arguments are passed as a tuple: `()`, `(a,)`, `(a, b)` and so on, up to
//! sixteen.
//!
//! | Call | Result |
//! |------|--------|
//! | `Try::create(f, args)` | `Try<T>` from `f(args) -> Result<T, E>` |
//! | `Try::create_from_task(f, args, &cancel)` | `Try<T>`, blocking on `f(args) -> impl Future` |
//! | `TryAction::invoke(f, args)` | `TryAction` from `f(args) -> ()` or `Result<(), E>` |
//! | `TryAction::invoke_async(fut, args)` | awaits `fut` for the action, then invokes it |
//! | `TryAction::invoke_range(items, f, factories)` | lazy iterator, one `TryAction` per item |
//! | `attempt! { .. }` / `invoke! { .. }` | block forms of `create` / `invoke` |
//!
//! Every entry point has a `*_with_cause` variant recording *why* the work
//! ran, kept apart from *what* broke.
//!
//! # Combinators
//!
//! | Method | On success | On failure |
//! |--------|------------|------------|
//! | `map(f)` | `f(v)`, panics captured | passes through |
//! | `bind(f)` | `f(v)` as-is | passes through |
//! | `recover(f)` | no-op | value from `f(&failure)`, panics captured |
//! | `recover_with(f)` | no-op | `f(&failure)` |
//! | `match_with(s, f)` | `s(v)` | `f(failure)` |
//! | `tap(s, f)` | `s(&v)`, not captured | `f(&failure)`, not captured |
//!
//! # Safe extraction
//!
//! | Method | On failure |
//! |--------|------------|
//! | `value_or_default()` | `T::default()` |
//! | `value_or(v)` | `v` |
//! | `value_or_else(f)` | `f()` |
//! | `value_or_else_error(f)` | `f(&failure)` |
//! | `value_or_else_cause(f)` | `f(&error, cause)` |
//! | `try_get_value*(.., acceptance)` | `(bool, T)`, never panics |
//!
//! # Cargo features
//!
//! | Feature | Effect |
//! |---------|--------|
//! | `serde` | `Serialize` for failures |
//! | `anyhow` | `Error::from_anyhow` constructor |

#![deny(unsafe_code)]

// ============================================================
// Modules
// ============================================================

mod action;
mod callable;
mod caught;
mod error;
mod ext;
mod extract;
mod macros;
mod outcome;
mod range;

pub mod bridge;

// ============================================================
// Re-exports
// ============================================================

pub use action::{ActionToken, TryAction};
pub use callable::{ActionOutput, ArgFactories, Callable, CallableMut};
pub use caught::{
    Caught, Creation, CreationFailure, FailureKind, Frame, Invocation, InvocationFailure,
    DEFAULT_TRACE_LIMIT,
};
pub use error::{rethrow, Error, Fault, StringError};
pub use ext::{InvokeExt, TryResultExt};
pub use extract::Acceptance;
pub use outcome::Try;
pub use range::InvokeRange;

pub use tokio_util::sync::CancellationToken;

// ============================================================
// Type aliases
// ============================================================

/// Result type alias.
///
/// - `Result<T>` = `core::result::Result<T, Error>` (type-erased)
/// - `Result<T, CreationFailure>` = what [`Try::get`] returns
pub type Result<T, E = Error> = core::result::Result<T, E>;
