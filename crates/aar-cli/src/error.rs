//! The CLI's own error type, mapping onto the exit codes of spec §6:
//! 0 success, 2 config error, 3 transport error, 4 blocked by the Enforcer
//! after retries.

use thiserror::Error;

use aar_kernel::error::AarError;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Runtime(AarError),

    #[error("turn blocked by the Enforcer: {0}")]
    EnforcerBlocked(String),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config(_) => 2,
            CliError::Runtime(err) => match err {
                AarError::ConfigError(_) => 2,
                AarError::Transport(_) | AarError::LlmUnavailable(_) | AarError::Timeout { .. } => 3,
                AarError::EnforcerBlocked(_) => 4,
                _ => 1,
            },
            CliError::EnforcerBlocked(_) => 4,
        }
    }
}

impl From<AarError> for CliError {
    fn from(err: AarError) -> Self {
        CliError::Runtime(err)
    }
}
