use tracing::info;

use super::{CommandHandler, HandlerError};
use crate::environment::InvocationContext;
use crate::telemetry::LogContext;

/// The data directory layout is stable across versions; nothing to migrate.
pub struct UpdateCommand;

impl CommandHandler for UpdateCommand {
    fn execute(&self, _ctx: &InvocationContext, log: &LogContext) -> Result<(), HandlerError> {
        let _span = log.span().entered();
        info!("Update is a no-op for this extension");
        Ok(())
    }
}
