//! Event keys and the values that flow through a dispatcher
//!
//! An [`EventType`] is either a string name or an opaque [`Symbol`]. Arguments
//! handed to listeners, and the values listeners hand back, are [`Payload`]s.

use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::error::SharedError;
use crate::listener::Listener;

static NEXT_SYMBOL: AtomicU64 = AtomicU64::new(1);

/// Opaque event key that is only ever equal to its own clones
#[derive(Clone)]
pub struct Symbol {
    id: u64,
    description: Option<Arc<str>>,
}

impl Symbol {
    pub fn new() -> Self {
        Self {
            id: NEXT_SYMBOL.fetch_add(1, Ordering::Relaxed),
            description: None,
        }
    }

    /// Create a symbol carrying a description for display purposes
    pub fn with_description<D: Into<Arc<str>>>(description: D) -> Self {
        Self {
            description: Some(description.into()),
            ..Self::new()
        }
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

impl Default for Symbol {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Symbol {}

impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.description().unwrap_or(""))
    }
}

/// Key identifying a class of events
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventType {
    /// String-named event, such as `"data"` or `"error"`
    Named(Cow<'static, str>),
    /// Symbol-keyed event that cannot collide with any name
    Symbol(Symbol),
}

impl EventType {
    /// Emitted before a listener is added
    pub const NEW_LISTENER: EventType = EventType::Named(Cow::Borrowed("newListener"));
    /// Emitted after a listener is removed
    pub const REMOVE_LISTENER: EventType = EventType::Named(Cow::Borrowed("removeListener"));
    /// Fails the emission when nobody listens to it
    pub const ERROR: EventType = EventType::Named(Cow::Borrowed("error"));

    pub fn named<N: Into<Cow<'static, str>>>(name: N) -> Self {
        Self::Named(name.into())
    }

    /// A fresh symbol-keyed event type
    pub fn symbol<D: Into<Arc<str>>>(description: D) -> Self {
        Self::Symbol(Symbol::with_description(description))
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Named(name) => Some(name),
            Self::Symbol(_) => None,
        }
    }

    /// Check if this key has protocol meaning to the dispatcher
    pub fn is_reserved(&self) -> bool {
        *self == Self::NEW_LISTENER || *self == Self::REMOVE_LISTENER || *self == Self::ERROR
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.write_str(name),
            Self::Symbol(symbol) => write!(f, "{symbol:?}"),
        }
    }
}

impl From<&'static str> for EventType {
    fn from(name: &'static str) -> Self {
        Self::Named(Cow::Borrowed(name))
    }
}

impl From<String> for EventType {
    fn from(name: String) -> Self {
        Self::Named(Cow::Owned(name))
    }
}

impl From<Symbol> for EventType {
    fn from(symbol: Symbol) -> Self {
        Self::Symbol(symbol)
    }
}

impl From<&EventType> for EventType {
    fn from(event: &EventType) -> Self {
        event.clone()
    }
}

/// A value passed to listeners as an argument or returned by them
#[derive(Debug, Clone)]
pub enum Payload {
    /// Plain data
    Data(Value),
    /// An error value; the first argument of an unhandled `"error"` event
    Error(SharedError),
    /// An event key, as passed to `newListener`/`removeListener` listeners
    Event(EventType),
    /// A listener, as passed to `newListener`/`removeListener` listeners
    Listener(Listener),
}

impl Payload {
    /// Serialize any value into a data payload
    pub fn from_serialize<T: Serialize>(value: &T) -> serde_json::Result<Self> {
        serde_json::to_value(value).map(Self::Data)
    }

    /// Wrap an error value
    pub fn error<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Error(Arc::new(error))
    }

    pub fn as_data(&self) -> Option<&Value> {
        match self {
            Self::Data(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_data().and_then(Value::as_str)
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.as_data().and_then(Value::as_i64)
    }

    pub fn as_event(&self) -> Option<&EventType> {
        match self {
            Self::Event(event) => Some(event),
            _ => None,
        }
    }

    pub fn as_listener(&self) -> Option<&Listener> {
        match self {
            Self::Listener(listener) => Some(listener),
            _ => None,
        }
    }

    pub fn as_error(&self) -> Option<&SharedError> {
        match self {
            Self::Error(err) => Some(err),
            _ => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

// Strings are written bare, everything else in its natural text form.
impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Data(Value::String(s)) => f.write_str(s),
            Self::Data(value) => write!(f, "{value}"),
            Self::Error(err) => write!(f, "{err}"),
            Self::Event(event) => write!(f, "{event}"),
            Self::Listener(_) => f.write_str("[listener]"),
        }
    }
}

impl PartialEq for Payload {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Data(a), Self::Data(b)) => a == b,
            (Self::Error(a), Self::Error(b)) => Arc::ptr_eq(a, b),
            (Self::Event(a), Self::Event(b)) => a == b,
            (Self::Listener(a), Self::Listener(b)) => a == b,
            _ => false,
        }
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Self::Data(value)
    }
}

impl From<&str> for Payload {
    fn from(value: &str) -> Self {
        Self::Data(Value::from(value))
    }
}

impl From<String> for Payload {
    fn from(value: String) -> Self {
        Self::Data(Value::from(value))
    }
}

impl From<bool> for Payload {
    fn from(value: bool) -> Self {
        Self::Data(Value::from(value))
    }
}

impl From<i32> for Payload {
    fn from(value: i32) -> Self {
        Self::Data(Value::from(value))
    }
}

impl From<i64> for Payload {
    fn from(value: i64) -> Self {
        Self::Data(Value::from(value))
    }
}

impl From<u64> for Payload {
    fn from(value: u64) -> Self {
        Self::Data(Value::from(value))
    }
}

impl From<f64> for Payload {
    fn from(value: f64) -> Self {
        Self::Data(Value::from(value))
    }
}

impl From<EventType> for Payload {
    fn from(event: EventType) -> Self {
        Self::Event(event)
    }
}

impl From<Listener> for Payload {
    fn from(listener: Listener) -> Self {
        Self::Listener(listener)
    }
}

impl From<SharedError> for Payload {
    fn from(err: SharedError) -> Self {
        Self::Error(err)
    }
}
