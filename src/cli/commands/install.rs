use std::fs;

use tracing::info;

use super::{CommandHandler, HandlerError};
use crate::environment::InvocationContext;
use crate::telemetry::LogContext;

/// Prepares the data directory
pub struct InstallCommand;

impl CommandHandler for InstallCommand {
    fn execute(&self, ctx: &InvocationContext, log: &LogContext) -> Result<(), HandlerError> {
        let _span = log.span().entered();

        fs::create_dir_all(&ctx.data_dir).map_err(|source| HandlerError::Io {
            action: "create data directory",
            path: ctx.data_dir.clone(),
            source,
        })?;

        info!(data_dir = ?ctx.data_dir, "Created data directory");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands::test_support::context;
    use tempfile::TempDir;

    #[test]
    fn test_install_creates_data_dir() {
        let temp_dir = TempDir::new().unwrap();
        let ctx = context(temp_dir.path(), 0);

        InstallCommand.execute(&ctx, &LogContext::default()).unwrap();
        InstallCommand.execute(&ctx, &LogContext::default()).unwrap();

        assert!(ctx.data_dir.is_dir());
    }
}
