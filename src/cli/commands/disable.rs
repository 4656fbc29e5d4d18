use tracing::info;

use super::{CommandHandler, HandlerError};
use crate::environment::InvocationContext;
use crate::telemetry::LogContext;

/// Nothing keeps running after `enable` returns, so there is nothing to stop.
pub struct DisableCommand;

impl CommandHandler for DisableCommand {
    fn execute(&self, _ctx: &InvocationContext, log: &LogContext) -> Result<(), HandlerError> {
        let _span = log.span().entered();
        info!("Disable is a no-op for this extension");
        Ok(())
    }
}
