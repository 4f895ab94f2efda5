//! CLI error handling

use std::fmt;

use mirrorcheck_errors::UserFacingError;

/// CLI-specific error type
#[derive(Debug)]
pub enum CliError {
    /// Fatal condition raised by the check run or its setup
    Check(mirrorcheck_errors::Error),
    /// Configuration error
    Config(mirrorcheck_errors::ConfigError),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Check(e) => {
                write!(f, "{}", e.user_message())?;
                if let Some(code) = e.user_code() {
                    write!(f, "\n  Code: {code}")?;
                }
                if let Some(hint) = e.user_hint() {
                    write!(f, "\n  Hint: {hint}")?;
                }
                Ok(())
            }
            CliError::Config(e) => {
                write!(f, "Configuration error: {e}")?;
                if let Some(hint) = e.user_hint() {
                    write!(f, "\n  Hint: {hint}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Check(e) => Some(e),
            CliError::Config(e) => Some(e),
        }
    }
}

impl From<mirrorcheck_errors::Error> for CliError {
    fn from(e: mirrorcheck_errors::Error) -> Self {
        match e {
            mirrorcheck_errors::Error::Config(e) => CliError::Config(e),
            other => CliError::Check(other),
        }
    }
}
