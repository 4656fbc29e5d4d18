use std::fs;

use tracing::{info, warn};

use super::{CommandHandler, HandlerError};
use crate::download;
use crate::environment::InvocationContext;
use crate::external::{ScriptError, ScriptExecutor};
use crate::sequence::SequenceGuard;
use crate::settings;
use crate::telemetry::LogContext;

/// Fetches the configured files and runs the configured command, once per
/// sequence number.
pub struct EnableCommand {
    executor: Box<dyn ScriptExecutor>,
}

impl EnableCommand {
    pub fn new(executor: Box<dyn ScriptExecutor>) -> Self {
        Self { executor }
    }
}

impl CommandHandler for EnableCommand {
    fn execute(&self, ctx: &InvocationContext, log: &LogContext) -> Result<(), HandlerError> {
        let guard = SequenceGuard::new(&ctx.data_dir);
        if guard.should_skip(ctx.seq)? {
            let _span = log.span().entered();
            info!(
                checkpoint = ?guard.read()?,
                "Script configuration already processed, will not run again"
            );
            return Ok(());
        }

        let settings = settings::load(&ctx.settings_file, log)?;
        settings.validate()?;

        fs::create_dir_all(&ctx.download_dir).map_err(|source| HandlerError::Io {
            action: "create download directory",
            path: ctx.download_dir.clone(),
            source,
        })?;
        download::fetch_all(&settings.file_uris, &ctx.download_dir, log)?;

        let _span = log.span().entered();
        info!(download_dir = ?ctx.download_dir, "Running command");
        let output = self
            .executor
            .run(&settings.command_to_execute, &ctx.download_dir)?;

        // The command ran; whatever it did must not be repeated for this request.
        guard.commit(ctx.seq, log)?;

        if !output.success() {
            warn!(
                code = output.status_code,
                stderr = ?output.stderr_path,
                "Command failed"
            );
            return Err(ScriptError::NonZeroExit {
                code: output.status_code,
            }
            .into());
        }

        info!(stdout = ?output.stdout_path, "Command succeeded");
        Ok(())
    }
}
