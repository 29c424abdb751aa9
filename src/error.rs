//! Error types for the gate controller and trigger.

use std::path::PathBuf;
use thiserror::Error;

use crate::transport::TransportError;

/// The main error type for gate operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The serial link failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A PWM sysfs attribute could not be written.
    #[error("failed to write {value} to {path}: {source}")]
    Pwm {
        /// Attribute that was being written.
        path: PathBuf,
        /// Value that was being written.
        value: String,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Angle outside the servo's travel.
    #[error("angle {degrees} must be between 0 and 180 degrees")]
    InvalidAngle {
        /// The rejected angle.
        degrees: u8,
    },

    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    /// Every attempt to send the trigger byte failed.
    #[error("signal not delivered after {attempts} attempts: {last}")]
    SignalFailed {
        /// How many writes were tried.
        attempts: u32,
        /// The error from the final attempt.
        #[source]
        last: TransportError,
    },

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// File system or stdio operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized Result type for gate operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a config validation error.
    #[must_use]
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_angle_display() {
        let err = Error::InvalidAngle { degrees: 200 };
        assert_eq!(
            err.to_string(),
            "angle 200 must be between 0 and 180 degrees"
        );
    }

    #[test]
    fn test_config_validation_display() {
        let err = Error::invalid_config("baud_rate must be greater than 0");
        assert_eq!(
            err.to_string(),
            "invalid configuration: baud_rate must be greater than 0"
        );
    }

    #[test]
    fn test_pwm_error_display() {
        let err = Error::Pwm {
            path: PathBuf::from("/sys/class/pwm/pwmchip0/pwm0/enable"),
            value: "1".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        let msg = err.to_string();
        assert!(msg.contains("pwmchip0/pwm0/enable"));
        assert!(msg.contains("denied"));
    }

    #[test]
    fn test_signal_failed_display() {
        let err = Error::SignalFailed {
            attempts: 3,
            last: TransportError::Closed,
        };
        let msg = err.to_string();
        assert!(msg.contains("3 attempts"));
        assert!(msg.contains("closed"));
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<u8>("nope").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }
}
