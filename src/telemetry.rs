use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

use crate::version;

/// Initialize structured logging.
///
/// Every event is written to stdout as one JSON line, including the fields of
/// the span it was recorded in. `RUST_LOG` takes precedence over `level`.
pub fn init_telemetry(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // A subscriber may already be installed when the runner is driven from tests.
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(true)
                .with_writer(std::io::stdout),
        )
        .with(filter)
        .try_init();
}

/// Generate a correlation ID for linking the log lines of one invocation
pub fn generate_correlation_id() -> String {
    Uuid::new_v4().to_string()
}

/// Logging context of one invocation.
///
/// Built up as the invocation learns more about itself (operation first, then
/// the sequence number) and handed to every component explicitly.
#[derive(Debug, Clone)]
pub struct LogContext {
    pub version: &'static str,
    pub operation: Option<String>,
    pub seq: Option<u64>,
    pub correlation_id: String,
}

impl LogContext {
    pub fn new() -> Self {
        Self {
            version: version::VERSION,
            operation: None,
            seq: None,
            correlation_id: generate_correlation_id(),
        }
    }

    pub fn with_operation(mut self, operation: &str) -> Self {
        self.operation = Some(operation.to_lowercase());
        self
    }

    pub fn with_seq(mut self, seq: u64) -> Self {
        self.seq = Some(seq);
        self
    }

    pub fn span(&self) -> tracing::Span {
        tracing::info_span!(
            "handler",
            version = self.version,
            operation = self.operation.as_deref(),
            seq = self.seq,
            correlation.id = %self.correlation_id,
        )
    }
}

impl Default for LogContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_accumulates_fields() {
        let log = LogContext::new().with_operation("Enable").with_seq(4);

        assert_eq!(log.operation.as_deref(), Some("enable"));
        assert_eq!(log.seq, Some(4));
        assert_eq!(log.version, version::VERSION);
    }

    #[test]
    fn test_contexts_get_distinct_correlation_ids() {
        assert_ne!(LogContext::new().correlation_id, LogContext::new().correlation_id);
    }
}
