//! Filtering of listener results
//!
//! After an emission every listener's result passes through the dispatcher's
//! [`ResultFilter`]. By default only absent results (`None`) are dropped.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::Error;
use crate::event::Payload;

/// Predicate deciding whether a listener result is kept
pub type ResultPredicate = Arc<dyn Fn(&Option<Payload>) -> bool + Send + Sync>;

/// Result filter applied to every emission
#[derive(Clone, Default)]
pub enum ResultFilter {
    /// Drop absent results, keep everything else
    #[default]
    DropAbsent,
    /// Keep every result, absent ones included
    Disabled,
    /// Keep the results the predicate accepts
    Predicate(ResultPredicate),
}

impl ResultFilter {
    pub fn predicate<F>(predicate: F) -> Self
    where
        F: Fn(&Option<Payload>) -> bool + Send + Sync + 'static,
    {
        Self::Predicate(Arc::new(predicate))
    }

    pub fn disabled() -> Self {
        Self::Disabled
    }

    pub fn is_disabled(&self) -> bool {
        matches!(self, Self::Disabled)
    }

    /// Check if a single result passes this filter
    pub fn keeps(&self, result: &Option<Payload>) -> bool {
        match self {
            Self::DropAbsent => result.is_some(),
            Self::Disabled => true,
            Self::Predicate(predicate) => predicate(result),
        }
    }

    /// Filter a sequence of results, preserving their relative order
    pub fn apply(&self, results: Vec<Option<Payload>>) -> Vec<Option<Payload>> {
        match self {
            Self::Disabled => results,
            _ => results.into_iter().filter(|r| self.keeps(r)).collect(),
        }
    }
}

impl fmt::Debug for ResultFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DropAbsent => f.write_str("DropAbsent"),
            Self::Disabled => f.write_str("Disabled"),
            Self::Predicate(_) => f.write_str("Predicate(<predicate>)"),
        }
    }
}

impl PartialEq for ResultFilter {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::DropAbsent, Self::DropAbsent) | (Self::Disabled, Self::Disabled) => true,
            (Self::Predicate(a), Self::Predicate(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<ResultPredicate> for ResultFilter {
    fn from(predicate: ResultPredicate) -> Self {
        Self::Predicate(predicate)
    }
}

/// `null` disables filtering; any other dynamic value is rejected
impl TryFrom<Value> for ResultFilter {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Null => Ok(Self::Disabled),
            _ => Err(Error::InvalidFilter),
        }
    }
}

impl TryFrom<Payload> for ResultFilter {
    type Error = Error;

    fn try_from(payload: Payload) -> Result<Self, Self::Error> {
        match payload {
            Payload::Data(value) => Self::try_from(value),
            _ => Err(Error::InvalidFilter),
        }
    }
}

impl<F> TryFrom<Option<F>> for ResultFilter
where
    F: Fn(&Option<Payload>) -> bool + Send + Sync + 'static,
{
    type Error = Error;

    fn try_from(predicate: Option<F>) -> Result<Self, Self::Error> {
        Ok(match predicate {
            Some(predicate) => Self::predicate(predicate),
            None => Self::Disabled,
        })
    }
}
