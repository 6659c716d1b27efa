//! Diagnostic message sink
//!
//! The classifier and the connector report through a [`MessageSink`]. The
//! default sink forwards to `tracing`; applications decide where those events
//! go by installing a subscriber.

use std::sync::{Arc, OnceLock};

use tracing::{error, info};

use crate::error::Category;

/// Receiver for error reports and verbose status messages.
pub trait MessageSink: Send + Sync {
    /// Report a classified failure.
    fn error(&self, category: Category, message: &str);

    /// Report a verbose/status message.
    fn info(&self, message: &str);
}

/// Sink that emits `tracing` events under the `fetch` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl MessageSink for TracingSink {
    fn error(&self, category: Category, message: &str) {
        error!(target: "fetch", category = category.as_str(), "{}", message);
    }

    fn info(&self, message: &str) {
        info!(target: "fetch", "{}", message);
    }
}

static DEFAULT_SINK: OnceLock<Arc<TracingSink>> = OnceLock::new();

/// Shared default sink, created on first use.
pub fn default_sink() -> Arc<dyn MessageSink> {
    DEFAULT_SINK.get_or_init(|| Arc::new(TracingSink)).clone()
}
