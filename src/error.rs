use thiserror::Error;

/// CNI error code for failures that fit no more specific category.
pub const CODE_UNKNOWN: u32 = 7;

/// Result type for adapter and plugin operations
pub type Result<T> = std::result::Result<T, CniError>;

/// Errors raised while handling a CNI invocation
#[derive(Debug, Error)]
pub enum CniError {
    /// Standard input could not be inspected or drained
    #[error("Cannot read from stdin: {0}")]
    Io(#[from] std::io::Error),

    /// Plugin parameters are required but none were supplied
    #[error("Plugin parameters are empty. No STDIN")]
    Config,

    /// Standard input is not a JSON object
    #[error("{0}")]
    Parse(#[from] serde_json::Error),

    /// A result document could not be marshalled
    #[error("{0}")]
    Serialization(String),

    /// The runtime asked for a command this plugin does not handle
    #[error("Not Implemented: {0}")]
    UnsupportedCommand(String),

    /// A plugin parameter is present but has the wrong shape
    #[error("Invalid plugin parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },
}

impl CniError {
    /// CNI error code reported inside the error document.
    pub fn code(&self) -> u32 {
        // Every failure in this core is reported as the generic code.
        CODE_UNKNOWN
    }

    pub(crate) fn invalid(name: &str, reason: impl Into<String>) -> Self {
        CniError::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_command_message() {
        let err = CniError::UnsupportedCommand("FOO".to_string());
        assert_eq!(err.to_string(), "Not Implemented: FOO");
        assert_eq!(err.code(), 7);
    }

    #[test]
    fn empty_stdin_message() {
        assert_eq!(CniError::Config.to_string(), "Plugin parameters are empty. No STDIN");
    }
}
