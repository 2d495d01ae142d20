//! Command-line front end for the docqa document assistant.
//!
//! `docqa chat [FILE]` runs an interactive session in the terminal and
//! `docqa serve` exposes the same assistant over HTTP.

pub mod cli;
pub mod repl;

pub use cli::{AssistantOptions, Cli, Commands, EmbedderKind};
pub use repl::{Input, run_chat, upload_file};
