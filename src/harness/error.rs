//! Error types for the harness
//!
//! Every failure a scenario can hit maps onto one variant here; assertion
//! mismatches are modelled as errors too, since they abort the running
//! scenario the same way a broken client does.

use std::fmt;
use std::io;

/// Main error type for harness operations
#[derive(Debug, Clone)]
pub enum HarnessError {
    /// Configuration file missing, unreadable, or inconsistent
    ConfigError { message: String },

    /// Broker client failure (producer, consumer, offset lookup)
    KafkaError {
        message: String,
        topic: Option<String>,
        source: Option<String>,
    },

    /// Relational store failure
    DatabaseError {
        message: String,
        source: Option<String>,
    },

    /// Key service (DKS) or AWS-emulation endpoint failure
    KeyServiceError {
        message: String,
        source: Option<String>,
    },

    /// Metrics endpoint failure or unparseable response
    MetricsError {
        message: String,
        source: Option<String>,
    },

    /// Cipher or digest failure
    CryptoError { message: String },

    /// IO error (TLS material, config files)
    IoError { message: String, path: String },

    /// A bounded poll expired before the awaited state appeared
    TimeoutError {
        message: String,
        operation: String,
        timeout_ms: u64,
    },

    /// A positive read did not match the expected state
    AssertionFailed {
        assertion_type: String,
        expected: String,
        actual: String,
        message: String,
    },
}

impl fmt::Display for HarnessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HarnessError::ConfigError { message } => {
                write!(f, "Configuration error: {}", message)
            }
            HarnessError::KafkaError {
                message,
                topic,
                source,
            } => {
                match (topic, source) {
                    (Some(t), Some(s)) => {
                        write!(f, "Kafka error on topic '{}': {} ({})", t, message, s)
                    }
                    (Some(t), None) => write!(f, "Kafka error on topic '{}': {}", t, message),
                    (None, Some(s)) => write!(f, "Kafka error: {} ({})", message, s),
                    (None, None) => write!(f, "Kafka error: {}", message),
                }
            }
            HarnessError::DatabaseError { message, source } => {
                if let Some(s) = source {
                    write!(f, "Database error: {} ({})", message, s)
                } else {
                    write!(f, "Database error: {}", message)
                }
            }
            HarnessError::KeyServiceError { message, source } => {
                if let Some(s) = source {
                    write!(f, "Key service error: {} ({})", message, s)
                } else {
                    write!(f, "Key service error: {}", message)
                }
            }
            HarnessError::MetricsError { message, source } => {
                if let Some(s) = source {
                    write!(f, "Metrics error: {} ({})", message, s)
                } else {
                    write!(f, "Metrics error: {}", message)
                }
            }
            HarnessError::CryptoError { message } => {
                write!(f, "Crypto error: {}", message)
            }
            HarnessError::IoError { message, path } => {
                write!(f, "IO error for '{}': {}", path, message)
            }
            HarnessError::TimeoutError {
                message,
                operation,
                timeout_ms,
            } => {
                write!(
                    f,
                    "Timeout after {}ms during '{}': {}",
                    timeout_ms, operation, message
                )
            }
            HarnessError::AssertionFailed {
                assertion_type,
                expected,
                actual,
                message,
            } => {
                write!(
                    f,
                    "Assertion '{}' failed: {} (expected: {}, actual: {})",
                    assertion_type, message, expected, actual
                )
            }
        }
    }
}

impl std::error::Error for HarnessError {}

impl From<io::Error> for HarnessError {
    fn from(err: io::Error) -> Self {
        HarnessError::IoError {
            message: err.to_string(),
            path: String::new(),
        }
    }
}

impl From<serde_yaml::Error> for HarnessError {
    fn from(err: serde_yaml::Error) -> Self {
        HarnessError::ConfigError {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for HarnessError {
    fn from(err: serde_json::Error) -> Self {
        HarnessError::ConfigError {
            message: format!("JSON handling failed: {}", err),
        }
    }
}

/// Result type alias for harness operations
pub type HarnessResult<T> = Result<T, HarnessError>;
