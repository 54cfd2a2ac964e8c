//! Unified error handling for the order form
//!
//! Per-field validation failures are not errors in this sense: they live in
//! [`crate::form::ValidationErrors`] and never abort anything. `OrderError`
//! covers everything that makes an operation itself fail.

use std::fmt;

/// Unified error types for the order form
#[derive(Debug)]
pub enum OrderError {
    /// Configuration-related errors
    Configuration(String),

    /// File and I/O errors
    Io(std::io::Error),

    /// Schema validation errors on configuration or orders
    Validation(String),

    /// A topping id that is not part of the catalog
    UnknownTopping(String),

    /// The submission collaborator rejected or failed the order
    Submission(String),

    /// Internal system errors
    Internal(String),
}

impl fmt::Display for OrderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderError::Configuration(msg) => write!(f, "Configuration error: {msg}"),
            OrderError::Io(err) => write!(f, "I/O error: {err}"),
            OrderError::Validation(msg) => write!(f, "Validation error: {msg}"),
            OrderError::UnknownTopping(id) => write!(f, "Unknown topping: {id}"),
            OrderError::Submission(msg) => write!(f, "Submission failed: {msg}"),
            OrderError::Internal(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}

impl std::error::Error for OrderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            OrderError::Io(err) => Some(err),
            _ => None,
        }
    }
}

// Error conversions
impl From<std::io::Error> for OrderError {
    fn from(err: std::io::Error) -> Self {
        OrderError::Io(err)
    }
}

impl From<serde_yaml::Error> for OrderError {
    fn from(err: serde_yaml::Error) -> Self {
        OrderError::Configuration(err.to_string())
    }
}

impl From<validator::ValidationErrors> for OrderError {
    fn from(err: validator::ValidationErrors) -> Self {
        OrderError::Validation(err.to_string())
    }
}

/// Result type alias for order form operations
pub type OrderResult<T> = std::result::Result<T, OrderError>;

/// Helper trait for adding context to errors
pub trait ErrorContext<T> {
    fn with_context(self, context: &str) -> OrderResult<T>;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: fmt::Display,
{
    fn with_context(self, context: &str) -> OrderResult<T> {
        self.map_err(|e| OrderError::Internal(format!("{context}: {e}")))
    }
}

/// Convenience macros for error creation
#[macro_export]
macro_rules! config_error {
    ($msg:expr) => {
        $crate::core::OrderError::Configuration($msg.to_string())
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::core::OrderError::Configuration(format!($fmt, $($arg)*))
    };
}

#[macro_export]
macro_rules! submission_error {
    ($msg:expr) => {
        $crate::core::OrderError::Submission($msg.to_string())
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::core::OrderError::Submission(format!($fmt, $($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = OrderError::Configuration("missing catalog".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing catalog");

        let err = OrderError::UnknownTopping("42".to_string());
        assert_eq!(err.to_string(), "Unknown topping: 42");
    }

    #[test]
    fn test_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: OrderError = io_error.into();
        assert!(matches!(err, OrderError::Io(_)));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_error_context() {
        let result: Result<(), &str> = Err("boom");
        let err = result.with_context("spawning submission").unwrap_err();
        assert_eq!(err.to_string(), "Internal error: spawning submission: boom");
    }

    #[test]
    fn test_error_macros() {
        let err = config_error!("bad value {}", 7);
        assert!(matches!(err, OrderError::Configuration(ref m) if m == "bad value 7"));

        let err = submission_error!("rejected");
        assert!(matches!(err, OrderError::Submission(ref m) if m == "rejected"));
    }
}
