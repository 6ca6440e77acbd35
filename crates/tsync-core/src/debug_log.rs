//! Debug side channel.
//!
//! A [`DebugLog`] is a no-op unless enabled. When enabled every message (and
//! its optional structured payload) is forwarded verbatim to a [`LogSink`].
//! The default sink emits a `tracing` debug event on the `tsync::debug` target.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

/// Destination for debug lines.
pub trait LogSink: Send + Sync {
    fn log(&self, message: &str, payload: Option<&Value>);
}

/// Forwards to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn log(&self, message: &str, payload: Option<&Value>) {
        match payload {
            Some(payload) => tracing::debug!(target: "tsync::debug", %payload, "{message}"),
            None => tracing::debug!(target: "tsync::debug", "{message}"),
        }
    }
}

#[derive(Clone)]
pub struct DebugLog {
    enabled: bool,
    sink: Arc<dyn LogSink>,
}

impl DebugLog {
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        Self::with_sink(enabled, Arc::new(TracingSink))
    }

    #[must_use]
    pub fn disabled() -> Self {
        Self::new(false)
    }

    pub fn with_sink(enabled: bool, sink: Arc<dyn LogSink>) -> Self {
        Self { enabled, sink }
    }

    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn log(&self, message: &str) {
        if self.enabled {
            self.sink.log(message, None);
        }
    }

    /// Log `message` with a structured payload. The payload is only
    /// serialized when logging is enabled.
    pub fn log_with<T: Serialize + ?Sized>(&self, message: &str, payload: &T) {
        if !self.enabled {
            return;
        }
        match serde_json::to_value(payload) {
            Ok(value) => self.sink.log(message, Some(&value)),
            Err(error) => {
                tracing::warn!(%error, "debug payload could not be serialized");
                self.sink.log(message, None);
            }
        }
    }
}

impl Default for DebugLog {
    fn default() -> Self {
        Self::disabled()
    }
}

impl fmt::Debug for DebugLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DebugLog")
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}
