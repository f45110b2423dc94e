//! Failure wrappers: the underlying error, the caller's cause and a trace.

use core::fmt;
use core::marker::PhantomData;
use core::panic::Location;
use std::error::Error as StdError;
use std::sync::Arc;

use smallvec::SmallVec;

use crate::error::{rethrow, Error};

/// Default limit for trace depth.
pub const DEFAULT_TRACE_LIMIT: usize = 32;

// ============================================================
// Failure kinds
// ============================================================

/// Discriminates the two failure wrappers.
///
/// `CODE` and `FLAG` are stable identifiers meant for logs and telemetry.
/// Nothing in this crate branches on them.
pub trait FailureKind: 'static {
    /// Human readable name used in `Display`.
    const NAME: &'static str;
    /// Numeric identifier.
    const CODE: u16;
    /// Symbolic identifier.
    const FLAG: &'static str;
}

/// Marker for failures captured while creating a value.
#[derive(Debug)]
pub enum Creation {}

/// Marker for failures captured while invoking an action.
#[derive(Debug)]
pub enum Invocation {}

impl FailureKind for Creation {
    const NAME: &'static str = "creation";
    const CODE: u16 = 0x0C01;
    const FLAG: &'static str = "TRY_CREATE";
}

impl FailureKind for Invocation {
    const NAME: &'static str = "invocation";
    const CODE: u16 = 0x0C02;
    const FLAG: &'static str = "TRY_INVOKE";
}

/// Failure held by a failed [`Try`](crate::Try).
pub type CreationFailure = Caught<Creation>;

/// Failure held by a failed [`TryAction`](crate::TryAction).
pub type InvocationFailure = Caught<Invocation>;

// ============================================================
// Frame
// ============================================================

/// A source location recorded in a failure trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    /// Source file path
    pub file: &'static str,
    /// Line number
    pub line: u32,
    /// Column number
    pub col: u32,
}

impl From<&'static Location<'static>> for Frame {
    fn from(loc: &'static Location<'static>) -> Self {
        Self {
            file: loc.file(),
            line: loc.line(),
            col: loc.column(),
        }
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.col)
    }
}

// ============================================================
// Caught<K>
// ============================================================

/// A captured failure.
///
/// Holds the error raised by user code together with an optional `cause`
/// supplied by the caller: *why* the operation was attempted, as opposed to
/// *what* broke. Only the capture boundaries of this crate construct one,
/// so a failure always stems from an error that was actually caught.
///
/// The trace starts with the site of the entry point that captured the
/// error. Inline storage covers the usual one or two frames.
pub struct Caught<K: FailureKind> {
    underlying: Error,
    cause: Option<Arc<str>>,
    trace: SmallVec<[Frame; 2]>,
    _kind: PhantomData<fn() -> K>,
}

impl<K: FailureKind> Caught<K> {
    pub(crate) fn new(
        underlying: Error,
        cause: Option<Arc<str>>,
        site: &'static Location<'static>,
    ) -> Self {
        tracing::debug!(
            code = K::CODE,
            flag = K::FLAG,
            cause = cause.as_deref(),
            error = %underlying,
            site = %Frame::from(site),
            "{} failure captured",
            K::NAME
        );
        let mut trace = SmallVec::new();
        trace.push(Frame::from(site));
        Self {
            underlying,
            cause,
            trace,
            _kind: PhantomData,
        }
    }

    /// Add a frame at the caller's location.
    #[track_caller]
    pub(crate) fn here(mut self) -> Self {
        if self.trace.len() < DEFAULT_TRACE_LIMIT {
            self.trace.push(Frame::from(Location::caller()));
        }
        self
    }

    /// Carry the same error, cause and trace over to another kind.
    pub(crate) fn rekind<O: FailureKind>(self) -> Caught<O> {
        Caught {
            underlying: self.underlying,
            cause: self.cause,
            trace: self.trace,
            _kind: PhantomData,
        }
    }

    /// The error raised by user code.
    pub fn underlying(&self) -> &Error {
        &self.underlying
    }

    /// Consume and return the underlying error.
    pub fn into_underlying(self) -> Error {
        self.underlying
    }

    /// Why the operation was attempted, if the caller said so.
    pub fn cause(&self) -> Option<&str> {
        self.cause.as_deref()
    }

    /// Numeric kind identifier.
    pub fn code(&self) -> u16 {
        K::CODE
    }

    /// Symbolic kind identifier.
    pub fn flag(&self) -> &'static str {
        K::FLAG
    }

    /// Where the error was captured.
    pub fn site(&self) -> Frame {
        self.trace[0]
    }

    /// Capture site followed by every eager re-raise site.
    pub fn frames(&self) -> impl Iterator<Item = &Frame> + '_ {
        self.trace.iter()
    }

    /// Number of frames in the trace.
    pub fn depth(&self) -> usize {
        self.trace.len()
    }

    pub(crate) fn cause_handle(&self) -> Option<Arc<str>> {
        self.cause.clone()
    }

    /// Log the failure with its trace, then raise the underlying error.
    #[track_caller]
    pub(crate) fn rethrow(self) -> ! {
        tracing::error!(
            code = K::CODE,
            flag = K::FLAG,
            cause = self.cause.as_deref(),
            "unwrapped {:#}",
            self
        );
        rethrow(self.underlying)
    }
}

impl<K: FailureKind> Clone for Caught<K> {
    fn clone(&self) -> Self {
        Self {
            underlying: self.underlying.clone(),
            cause: self.cause.clone(),
            trace: self.trace.clone(),
            _kind: PhantomData,
        }
    }
}

/// Identity of the underlying error, not structural equality.
impl<K: FailureKind> PartialEq for Caught<K> {
    fn eq(&self, other: &Self) -> bool {
        self.underlying.ptr_eq(&other.underlying)
    }
}

impl<K: FailureKind> Eq for Caught<K> {}

impl<K: FailureKind> fmt::Debug for Caught<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Caught")
            .field("kind", &K::NAME)
            .field("code", &K::CODE)
            .field("flag", &K::FLAG)
            .field("underlying", &self.underlying)
            .field("cause", &self.cause)
            .field("trace", &self.trace)
            .finish()
    }
}

impl<K: FailureKind> fmt::Display for Caught<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failure", K::NAME)?;
        if let Some(cause) = &self.cause {
            write!(f, " while {}", cause)?;
        }
        write!(f, ": {}", self.underlying)?;

        if f.alternate() {
            write!(f, "\n\nTrace (most recent last):")?;
            for frame in &self.trace {
                write!(f, "\n  {}", frame)?;
            }
        }
        Ok(())
    }
}

impl<K: FailureKind> StdError for Caught<K> {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(self.underlying.as_error())
    }
}

// ============================================================
// Serde support
// ============================================================

#[cfg(feature = "serde")]
mod serde_impl {
    use super::*;
    use serde::{Serialize, Serializer};

    #[derive(Serialize)]
    struct SerializedFrame<'a> {
        file: &'a str,
        line: u32,
        col: u32,
    }

    #[derive(Serialize)]
    struct SerializedCaught<'a> {
        kind: &'static str,
        code: u16,
        flag: &'static str,
        #[serde(skip_serializing_if = "Option::is_none")]
        cause: Option<&'a str>,
        message: String,
        trace: Vec<SerializedFrame<'a>>,
    }

    impl<K: FailureKind> Serialize for Caught<K> {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            SerializedCaught {
                kind: K::NAME,
                code: K::CODE,
                flag: K::FLAG,
                cause: self.cause(),
                message: self.underlying.to_string(),
                trace: self
                    .trace
                    .iter()
                    .map(|frame| SerializedFrame {
                        file: frame.file,
                        line: frame.line,
                        col: frame.col,
                    })
                    .collect(),
            }
            .serialize(serializer)
        }
    }
}
