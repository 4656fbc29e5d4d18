// Custom Script Handler Library - extension lifecycle for the provisioning agent
// This exposes the core components for testing and integration

pub mod cli;
pub mod config;
pub mod download;
pub mod environment;
pub mod external;
pub mod fs;
pub mod lifecycle;
pub mod sequence;
pub mod settings;
pub mod status;
pub mod telemetry;
pub mod version;

// Re-export key types for easy access
pub use cli::commands::{handler_for, CommandHandler, HandlerError};
pub use cli::{parse_command, UsageError, Verb};
pub use config::HandlerConfig;
pub use environment::{resolve, EnvironmentError, HandlerEnvironment, InvocationContext};
pub use lifecycle::{LifecycleRunner, LifecycleState, RunOutcome};
pub use sequence::{SequenceError, SequenceGuard};
pub use status::{FileStatusReporter, StatusCode, StatusRecord, StatusReporter};
pub use telemetry::{init_telemetry, LogContext};
