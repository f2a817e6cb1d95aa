pub mod cli;
pub mod commands;
pub mod context;
pub mod error;

pub use cli::{Cli, Command, SessionCommand};
pub use error::CliError;
