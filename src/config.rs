//! Dispatcher configuration

use crate::filter::ResultFilter;

/// Listener count per event type above which a leak warning is logged
pub const DEFAULT_MAX_LISTENERS: usize = 10;

/// Configuration for a new dispatcher
#[derive(Debug, Clone)]
pub struct EmitterConfig {
    /// Leak warning threshold, `0` disables the warning
    pub max_listeners: usize,
    /// Filter applied to listener results
    pub result_filter: ResultFilter,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            max_listeners: DEFAULT_MAX_LISTENERS,
            result_filter: ResultFilter::default(),
        }
    }
}

impl EmitterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the leak warning threshold
    pub fn max_listeners(mut self, max: usize) -> Self {
        self.max_listeners = max;
        self
    }

    /// Set the result filter
    pub fn result_filter(mut self, filter: ResultFilter) -> Self {
        self.result_filter = filter;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let config = EmitterConfig::new()
            .max_listeners(0)
            .result_filter(ResultFilter::disabled());

        assert_eq!(config.max_listeners, 0);
        assert!(config.result_filter.is_disabled());
        assert_eq!(EmitterConfig::default().max_listeners, DEFAULT_MAX_LISTENERS);
    }
}
