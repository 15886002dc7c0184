//! Error types for costcache

use std::fmt;

/// Result type alias for cache operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for cache operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Operation invoked on a cache that was never initialized
    NotInitialized,

    /// Key absent, or its hash slot is held by a different key
    NotFound,

    /// Invalid capacity or bucket count
    Config(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NotInitialized => {
                write!(f, "Cache has not been initialized. Use init() first")
            }
            Error::NotFound => write!(f, "Key not found"),
            Error::Config(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Error::NotFound.to_string(), "Key not found");
        assert!(Error::NotInitialized.to_string().contains("init()"));

        let err = Error::Config("bucket count 2048 exceeds 1024".to_string());
        assert!(err.to_string().contains("2048"));
    }

    #[test]
    fn test_implements_std_error() {
        fn assert_error<T: std::error::Error + Send + Sync + 'static>() {}
        assert_error::<Error>();
    }
}
