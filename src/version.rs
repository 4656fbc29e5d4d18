/// Crate version, attached to every log line.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build commit, injected by the release pipeline.
pub const GIT_COMMIT: Option<&str> = option_env!("CUSTOM_SCRIPT_GIT_COMMIT");

/// Short version string, e.g. `v0.1.0`.
pub fn version_string() -> String {
    format!("v{VERSION}")
}

/// Version string with build metadata, printed with the usage text.
pub fn detailed_version_string() -> String {
    format!(
        "{} {}/git@{}",
        env!("CARGO_PKG_NAME"),
        version_string(),
        GIT_COMMIT.unwrap_or("unknown")
    )
}
