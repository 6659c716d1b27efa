//! Fetch settings
//!
//! Holds the knobs the protocol layer sets once and every connection then
//! shares: the line-read timeout and whether to emit verbose status messages.

use std::time::Duration;

/// Settings shared by connections made through a [`Fetch`](crate::Fetch) context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FetchConfig {
    timeout: Option<Duration>,
    verbose: bool,
    nodelay: bool,
}

impl FetchConfig {
    /// Create a config with no timeout and verbose output off
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the line-read timeout in whole seconds (0 disables the deadline)
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout = if secs == 0 {
            None
        } else {
            Some(Duration::from_secs(secs))
        };
        self
    }

    /// Enable status messages for lookups and connects
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Set TCP_NODELAY on new connections
    pub fn nodelay(mut self, nodelay: bool) -> Self {
        self.nodelay = nodelay;
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    pub fn is_nodelay(&self) -> bool {
        self.nodelay
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = FetchConfig::new();
        assert_eq!(config.timeout(), None);
        assert!(!config.is_verbose());
        assert!(!config.is_nodelay());
    }

    #[test]
    fn test_timeout_secs() {
        let config = FetchConfig::new().timeout_secs(30);
        assert_eq!(config.timeout(), Some(Duration::from_secs(30)));

        let config = config.timeout_secs(0);
        assert_eq!(config.timeout(), None);
    }

    #[test]
    fn test_builder_chain() {
        let config = FetchConfig::new().verbose(true).nodelay(true).timeout_secs(5);
        assert!(config.is_verbose());
        assert!(config.is_nodelay());
        assert_eq!(config.timeout(), Some(Duration::from_secs(5)));
    }
}
