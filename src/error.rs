use thiserror::Error;

/// Result type alias for metadata generation
pub type Result<T> = std::result::Result<T, GenerateMetadataError>;

/// Fatal classification or type resolution error.
///
/// Every violation found while walking controllers aborts the whole run. The
/// message names the offending controller, method and/or parameter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct GenerateMetadataError {
    message: String,
}

impl GenerateMetadataError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Appends the `Controller.method` location to the message.
    pub fn in_method(self, controller: &str, method: &str) -> Self {
        Self {
            message: format!("{} \n in '{}.{}'", self.message, controller, method),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Shorthand for returning a [`GenerateMetadataError`] from a function.
macro_rules! bail_generate {
    ($($arg:tt)*) => {
        return Err($crate::error::GenerateMetadataError::new(format!($($arg)*)))
    };
}

pub(crate) use bail_generate;
