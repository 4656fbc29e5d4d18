//! External process abstractions
//!
//! Running the user's command is the only impure effect of `enable` that is
//! hard to observe in tests, so it sits behind a trait with a shell-backed
//! implementation.

pub mod command;

pub use command::{ScriptError, ScriptExecutor, ScriptOutput, ShellExecutor};
