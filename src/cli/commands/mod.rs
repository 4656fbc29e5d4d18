use std::path::PathBuf;

use thiserror::Error;

use crate::cli::Verb;
use crate::config::HandlerConfig;
use crate::download::FetchError;
use crate::environment::InvocationContext;
use crate::external::{ScriptError, ShellExecutor};
use crate::sequence::SequenceError;
use crate::settings::SettingsError;
use crate::telemetry::LogContext;

#[cfg(any(test, feature = "testing"))]
use mockall::automock;

pub mod disable;
pub mod enable;
pub mod install;
pub mod uninstall;
pub mod update;

/// Failure of a command handler.
///
/// The `Display` output is what the orchestrator sees as the status message.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error(transparent)]
    Sequence(#[from] SequenceError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Script(#[from] ScriptError),
    #[error("failed to {action} {path}: {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Logic behind one verb
#[cfg_attr(any(test, feature = "testing"), automock)]
pub trait CommandHandler {
    fn execute(&self, ctx: &InvocationContext, log: &LogContext) -> Result<(), HandlerError>;
}

/// Handler registered for `verb`
pub fn handler_for(verb: Verb, config: &HandlerConfig) -> Box<dyn CommandHandler> {
    match verb {
        Verb::Install => Box::new(install::InstallCommand),
        Verb::Enable => Box::new(enable::EnableCommand::new(Box::new(ShellExecutor::new(
            &config.shell,
        )))),
        Verb::Disable => Box::new(disable::DisableCommand),
        Verb::Uninstall => Box::new(uninstall::UninstallCommand),
        Verb::Update => Box::new(update::UpdateCommand),
    }
}
