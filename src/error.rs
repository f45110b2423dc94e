//! Type-erased underlying errors and the crate's own fault kinds.

use core::any::Any;
use core::fmt;
use std::error::Error as StdError;
use std::sync::Arc;

// ============================================================
// Error - shared, type-erased handle
// ============================================================

/// The error a user computation produced.
///
/// A cheap-to-clone handle around `Arc<dyn Error + Send + Sync>`. Clones
/// share the same error object, which is what [`Error::ptr_eq`] compares.
///
/// This type does NOT implement `std::error::Error`. That keeps the blanket
/// `From<E: Error>` below coherent, so `?` works in any closure returning
/// `Result<_, Error>`.
#[derive(Clone)]
pub struct Error(Arc<dyn StdError + Send + Sync + 'static>);

impl Error {
    /// Create from any error type.
    #[inline]
    pub fn new<E: StdError + Send + Sync + 'static>(e: E) -> Self {
        Self(Arc::new(e))
    }

    /// Create from a boxed error.
    #[inline]
    pub fn from_box(e: Box<dyn StdError + Send + Sync + 'static>) -> Self {
        Self(Arc::from(e))
    }

    /// Create from a message string.
    #[inline]
    pub fn msg(message: impl Into<String>) -> Self {
        Self::new(StringError(message.into()))
    }

    /// Get the inner error as a trait object reference.
    #[inline]
    pub fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
        self.0.as_ref()
    }

    /// Try to downcast to a specific error type.
    #[inline]
    pub fn downcast_ref<T: StdError + 'static>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }

    /// Whether the inner error is of type `T`.
    #[inline]
    pub fn is<T: StdError + 'static>(&self) -> bool {
        self.0.is::<T>()
    }

    /// Whether two handles refer to the very same error object.
    #[inline]
    pub fn ptr_eq(&self, other: &Error) -> bool {
        Arc::as_ptr(&self.0) as *const () == Arc::as_ptr(&other.0) as *const ()
    }

    /// Whether this error was lifted from a caught panic.
    pub fn is_panic(&self) -> bool {
        matches!(self.downcast_ref::<Fault>(), Some(Fault::Panicked { .. }))
    }

    /// The panic message, if this error was lifted from a caught panic.
    pub fn panic_message(&self) -> Option<&str> {
        match self.downcast_ref::<Fault>() {
            Some(Fault::Panicked { message }) => Some(message),
            _ => None,
        }
    }

    /// Whether this error reports a cancelled wait.
    pub fn is_cancelled(&self) -> bool {
        matches!(self.downcast_ref::<Fault>(), Some(Fault::Cancelled))
    }

    /// Lift a panic payload into an error.
    ///
    /// A payload that already is an `Error` (see [`rethrow`]) is returned
    /// as-is, so identity survives a rethrow/capture round trip.
    pub(crate) fn from_panic(payload: Box<dyn Any + Send + 'static>) -> Self {
        let payload = match payload.downcast::<Error>() {
            Ok(error) => return *error,
            Err(payload) => payload,
        };
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            String::from("Box<dyn Any>")
        };
        Self::new(Fault::Panicked { message })
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

// This doesn't conflict with From<T> for T because Error doesn't implement Error
impl<E: StdError + Send + Sync + 'static> From<E> for Error {
    fn from(e: E) -> Self {
        Error::new(e)
    }
}

// anyhow::Error is not a std error, so the blanket impl above cannot cover it
// and a second From impl would overlap it.
#[cfg(feature = "anyhow")]
impl Error {
    /// Adopt an `anyhow::Error`, keeping its message and source chain.
    pub fn from_anyhow(e: anyhow::Error) -> Self {
        Self::from_box(e.into())
    }
}

// ============================================================
// Fault - failures raised by the crate itself
// ============================================================

/// Failures originating inside this crate rather than in user code.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Fault {
    /// A user computation panicked.
    #[error("panicked: {message}")]
    Panicked {
        /// The panic message, when the payload was a string.
        message: String,
    },

    /// A blocking wait was cancelled before the future completed.
    #[error("operation was cancelled")]
    Cancelled,

    /// A required input was not supplied. A `None` callable reports `"callable"`.
    #[error("no {0} was supplied")]
    Missing(&'static str),

    /// Blocking would stall the only thread able to drive the future.
    #[error("blocking wait inside a current-thread runtime would deadlock")]
    WouldDeadlock,

    /// A runtime for the blocking wait could not be started.
    #[error("failed to start a runtime for the blocking wait")]
    Runtime(#[source] std::io::Error),
}

// ============================================================
// StringError helper
// ============================================================

/// Plain message error behind [`Error::msg`].
#[derive(Debug)]
pub struct StringError(pub(crate) String);

impl fmt::Display for StringError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl StdError for StringError {}

// ============================================================
// Rethrow
// ============================================================

/// Re-raise an error as a panic whose payload is the error itself.
///
/// The error is logged at `error` level and the panic hook runs as for any
/// other panic, reporting the caller's location. Any capture boundary
/// further up (`Try::create`, `TryAction::invoke`, ...) recovers the same
/// `Error`, so `ptr_eq` still holds on the other side.
#[track_caller]
pub fn rethrow(error: Error) -> ! {
    let location = std::panic::Location::caller();
    tracing::error!(error = %error, location = %location, "rethrowing captured error");
    std::panic::panic_any(error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn clones_share_identity() {
        let e = Error::new(io::Error::new(io::ErrorKind::Other, "boom"));
        let same = e.clone();
        let other = Error::new(io::Error::new(io::ErrorKind::Other, "boom"));

        assert!(e.ptr_eq(&same));
        assert!(!e.ptr_eq(&other));
    }

    #[test]
    fn downcasts_to_concrete_type() {
        let e: Error = io::Error::new(io::ErrorKind::NotFound, "gone").into();
        assert!(e.is::<io::Error>());
        assert_eq!(e.downcast_ref::<io::Error>().map(|e| e.kind()), Some(io::ErrorKind::NotFound));
        assert!(e.downcast_ref::<StringError>().is_none());
    }

    #[test]
    fn panic_payloads_become_faults() {
        let e = Error::from_panic(Box::new("static message"));
        assert!(e.is_panic());
        assert_eq!(e.panic_message(), Some("static message"));

        let e = Error::from_panic(Box::new(String::from("owned message")));
        assert_eq!(e.panic_message(), Some("owned message"));

        let e = Error::from_panic(Box::new(17_u8));
        assert_eq!(e.panic_message(), Some("Box<dyn Any>"));
    }

    #[test]
    fn rethrown_error_keeps_identity() {
        let original = Error::msg("original");
        let thrown = original.clone();
        let payload = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || -> () { rethrow(thrown) }))
            .unwrap_err();
        let recovered = Error::from_panic(payload);

        assert!(recovered.ptr_eq(&original));
        assert!(!recovered.is_panic());
    }

    #[test]
    #[should_panic]
    fn rethrow_outside_a_boundary_panics() {
        rethrow(Error::msg("nobody catches this"));
    }

    #[test]
    fn rethrow_payload_is_the_error() {
        let payload = std::panic::catch_unwind(|| -> () { rethrow(Error::msg("disk quota exceeded")) })
            .unwrap_err();
        let error = payload.downcast::<Error>().expect("payload is an Error");
        assert_eq!(error.to_string(), "disk quota exceeded");
    }

    #[test]
    fn message_errors_display_verbatim() {
        assert_eq!(Error::msg("plain").to_string(), "plain");
        assert_eq!(Error::new(Fault::Missing("callable")).to_string(), "no callable was supplied");
        assert!(Error::new(Fault::Cancelled).is_cancelled());
    }
}
