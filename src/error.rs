//! Error types and Result alias for the emitter
//!
//! Three kinds of failure surface from a [`Dispatcher`](crate::Dispatcher):
//! configuration errors from `set_result_filter`, unhandled `"error"` events,
//! and listener failures during an emission.

use std::convert::Infallible;
use std::sync::Arc;
use thiserror::Error;

use crate::event::EventType;

/// Shared, clonable error value as produced by listeners or carried in payloads
pub type SharedError = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// The emitter's error type
#[derive(Error, Debug, Clone)]
pub enum Error {
    /// The value given to `set_result_filter` is neither a predicate nor null
    #[error("filter must be a function")]
    InvalidFilter,

    /// An `"error"` event was emitted with no listeners and a non-error argument
    #[error("Uncaught, unspecified \"error\" event.{}", fmt_detail(.detail))]
    Unspecified { detail: Option<String> },

    /// An `"error"` event was emitted with no listeners; this is the emitted error
    #[error(transparent)]
    Emitted(SharedError),

    /// A listener failed while an event was being emitted
    #[error("listener for '{event}' failed: {source}")]
    Listener {
        event: EventType,
        #[source]
        source: SharedError,
    },
}

fn fmt_detail(detail: &Option<String>) -> String {
    match detail {
        Some(detail) => format!(" ({detail})"),
        None => String::new(),
    }
}

/// Convenient result type for emitter operations
pub type Result<T> = std::result::Result<T, Error>;

impl From<Infallible> for Error {
    fn from(never: Infallible) -> Self {
        match never {}
    }
}

impl Error {
    /// Create a listener failure for the given event
    pub fn listener(event: EventType, source: SharedError) -> Self {
        Self::Listener { event, source }
    }

    /// Create an unhandled error with an optional stringified argument
    pub fn unspecified<D: Into<String>>(detail: Option<D>) -> Self {
        Self::Unspecified {
            detail: detail.map(Into::into),
        }
    }

    /// The original error value when an unhandled `"error"` event carried one
    pub fn emitted(&self) -> Option<&SharedError> {
        match self {
            Self::Emitted(err) => Some(err),
            _ => None,
        }
    }

    /// Check if this error comes from an `"error"` event nobody listened to
    pub fn is_unhandled(&self) -> bool {
        matches!(self, Self::Unspecified { .. } | Self::Emitted(_))
    }

    /// Check if this error is a listener failure
    pub fn is_listener(&self) -> bool {
        matches!(self, Self::Listener { .. })
    }

    /// The event whose listener failed, if any
    pub fn event(&self) -> Option<&EventType> {
        match self {
            Self::Listener { event, .. } => Some(event),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_unspecified_messages() {
        assert_eq!(
            Error::unspecified(None::<String>).to_string(),
            "Uncaught, unspecified \"error\" event."
        );
        assert_eq!(
            Error::unspecified(Some("Test string")).to_string(),
            "Uncaught, unspecified \"error\" event. (Test string)"
        );
    }

    #[test]
    fn test_emitted_is_transparent() {
        let inner: SharedError = Arc::new(io::Error::other("Test Error"));
        let err = Error::Emitted(inner.clone());

        assert_eq!(err.to_string(), "Test Error");
        assert!(Arc::ptr_eq(err.emitted().unwrap(), &inner));
        assert!(err.is_unhandled());
        assert!(!err.is_listener());
    }

    #[test]
    fn test_listener_error_keeps_source() {
        let err = Error::listener(
            EventType::from("foo"),
            Arc::new(io::Error::other("boom")),
        );

        assert_eq!(err.to_string(), "listener for 'foo' failed: boom");
        assert_eq!(err.event(), Some(&EventType::from("foo")));
        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "boom");
    }

    #[test]
    fn test_invalid_filter_message() {
        assert_eq!(Error::InvalidFilter.to_string(), "filter must be a function");
    }
}
