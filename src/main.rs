use std::ffi::OsString;
use std::process::ExitCode;

use custom_script_handler::environment::{self, SEQUENCE_NUMBER_VAR};
use custom_script_handler::{
    handler_for, init_telemetry, parse_command, FileStatusReporter, HandlerConfig,
    LifecycleRunner, LogContext,
};
use tracing::error;

fn main() -> ExitCode {
    let args: Vec<OsString> = std::env::args_os().collect();

    // No context exists yet, so bad usage is never reported as a status.
    let verb = match parse_command(&args) {
        Ok(verb) => verb,
        Err(e) => {
            println!("{}", e.usage_text());
            return ExitCode::FAILURE;
        }
    };

    let config = match HandlerConfig::load() {
        Ok(config) => config,
        Err(e) => {
            init_telemetry("info");
            let log = LogContext::new().with_operation(verb.name());
            error!(parent: &log.span(), error = %e, "failed to load configuration");
            return ExitCode::FAILURE;
        }
    };
    init_telemetry(&config.log_level);

    let log = LogContext::new().with_operation(verb.name());
    let ctx = match environment::resolve(&config, std::env::var(SEQUENCE_NUMBER_VAR).ok(), &log) {
        Ok(ctx) => ctx,
        Err(e) => {
            error!(parent: &log.span(), error = %e, "failed to parse handlerenv");
            return ExitCode::FAILURE;
        }
    };
    let log = log.with_seq(ctx.seq);

    let handler = handler_for(verb, &config);
    let reporter = FileStatusReporter::new(&ctx.environment.status_folder);

    LifecycleRunner::new(&reporter)
        .run(verb, handler.as_ref(), &ctx, &log)
        .exit_code()
}
