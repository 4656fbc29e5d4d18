use std::ffi::OsString;

use clap::{Parser, ValueEnum};
use thiserror::Error;

use crate::version::detailed_version_string;

pub mod commands;

/// Fallback program name for usage text when argv is empty
const PROGRAM_NAME: &str = "custom-script-handler";

#[derive(Parser, Debug)]
#[command(name = "custom-script-handler")]
#[command(about = "Extension handler that runs a custom script on the guest")]
pub struct Cli {
    /// Lifecycle operation requested by the provisioning agent
    #[arg(value_enum)]
    pub verb: Verb,
}

/// Operations the provisioning agent can request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum Verb {
    Install,
    Enable,
    Disable,
    Uninstall,
    Update,
}

impl Verb {
    /// Command-line token
    pub fn name(&self) -> &'static str {
        match self {
            Verb::Install => "install",
            Verb::Enable => "enable",
            Verb::Disable => "disable",
            Verb::Uninstall => "uninstall",
            Verb::Update => "update",
        }
    }

    /// Operation name shown in status reports
    pub fn label(&self) -> &'static str {
        match self {
            Verb::Install => "Install",
            Verb::Enable => "Enable",
            Verb::Disable => "Disable",
            Verb::Uninstall => "Uninstall",
            Verb::Update => "Update",
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum UsageError {
    #[error("Incorrect usage.")]
    IncorrectUsage { program: String },
    #[error("Incorrect command: {verb:?}")]
    UnknownCommand { program: String, verb: String },
}

impl UsageError {
    fn program(&self) -> &str {
        match self {
            UsageError::IncorrectUsage { program } | UsageError::UnknownCommand { program, .. } => {
                program
            }
        }
    }

    /// Full text printed before exiting: usage line, version, then the error.
    pub fn usage_text(&self) -> String {
        format!(
            "{}\n{}\n{}",
            usage_line(self.program()),
            detailed_version_string(),
            self
        )
    }
}

/// `Usage: <program> install|enable|...`
pub fn usage_line(program: &str) -> String {
    let verbs: Vec<&str> = Verb::value_variants().iter().map(Verb::name).collect();
    format!("Usage: {} {}", program, verbs.join("|"))
}

/// Resolve the requested verb from the full argument vector.
///
/// Exactly one argument besides the program name is accepted. Arguments need
/// not be valid UTF-8; anything that is not a known verb is an unknown command.
pub fn parse_command(args: &[OsString]) -> Result<Verb, UsageError> {
    let program = args
        .first()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|| PROGRAM_NAME.to_string());

    if args.len() != 2 {
        return Err(UsageError::IncorrectUsage { program });
    }

    Cli::try_parse_from(args)
        .map(|cli| cli.verb)
        .map_err(|_| UsageError::UnknownCommand {
            program,
            verb: args[1].to_string_lossy().into_owned(),
        })
}
