use std::fs;
use std::io::ErrorKind;

use tracing::info;

use super::{CommandHandler, HandlerError};
use crate::environment::InvocationContext;
use crate::telemetry::LogContext;

/// Removes the data directory with the checkpoint and every download
pub struct UninstallCommand;

impl CommandHandler for UninstallCommand {
    fn execute(&self, ctx: &InvocationContext, log: &LogContext) -> Result<(), HandlerError> {
        let _span = log.span().entered();

        match fs::remove_dir_all(&ctx.data_dir) {
            Ok(()) => info!(data_dir = ?ctx.data_dir, "Removed data directory"),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(data_dir = ?ctx.data_dir, "Data directory already absent")
            }
            Err(source) => {
                return Err(HandlerError::Io {
                    action: "remove data directory",
                    path: ctx.data_dir.clone(),
                    source,
                })
            }
        }
        Ok(())
    }
}
