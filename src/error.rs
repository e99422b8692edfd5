//! Centralized error types for skysentry using thiserror.
//!
//! Errors are grouped per domain. Nothing in the scheduler core is
//! fatal to the process; the binary only exits on configuration
//! failures or a tick source that cannot start.

use thiserror::Error;

/// Errors related to configuration loading and validation.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load config file: {0}")]
    LoadError(String),
    #[error("invalid configuration: {0}")]
    ValidationError(String),
    #[error("invalid operator '{operator}' in alert config '{config}': must be one of >, <, >=, <=, =")]
    InvalidOperator { config: String, operator: String },
    #[error("invalid time of day '{value}' in subscription '{subscription}': expected HH:MM")]
    InvalidTimeOfDay { subscription: String, value: String },
    #[error("invalid notifier '{name}': {message}")]
    InvalidNotifier { name: String, message: String },
}

/// Errors from the weather provider collaborator.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("weather fetch failed: {0}")]
    FetchFailed(String),
    #[error("weather fetch timed out")]
    Timeout,
    #[error("malformed provider response: {0}")]
    MalformedResponse(String),
}

/// Errors related to notification sending.
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("failed to send notification: {0}")]
    SendFailed(String),
    #[error("max retries exceeded")]
    MaxRetriesExceeded,
}

/// Errors related to notification queue operations.
#[derive(Error, Debug)]
pub enum QueueError {
    #[error("notification queue closed")]
    Closed,
}

/// Errors from the storage collaborator.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Errors related to scheduler execution.
#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),
    #[error("queue error: {0}")]
    Queue(#[from] QueueError),
    #[error("tick source failed to start: {0}")]
    TickSource(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let err = ConfigError::LoadError("file not found".to_string());
        assert_eq!(err.to_string(), "failed to load config file: file not found");
    }

    #[test]
    fn config_error_invalid_operator_display() {
        let err = ConfigError::InvalidOperator {
            config: "high-temp".to_string(),
            operator: "!=".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid operator '!=' in alert config 'high-temp': must be one of >, <, >=, <=, ="
        );
    }

    #[test]
    fn config_error_invalid_time_of_day_display() {
        let err = ConfigError::InvalidTimeOfDay {
            subscription: "morning-digest".to_string(),
            value: "25:99".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid time of day '25:99' in subscription 'morning-digest': expected HH:MM"
        );
    }

    #[test]
    fn provider_error_display() {
        let err = ProviderError::Timeout;
        assert_eq!(err.to_string(), "weather fetch timed out");

        let err = ProviderError::FetchFailed("503".to_string());
        assert_eq!(err.to_string(), "weather fetch failed: 503");
    }

    #[test]
    fn notify_error_display() {
        let err = NotifyError::SendFailed("network error".to_string());
        assert_eq!(err.to_string(), "failed to send notification: network error");

        let err = NotifyError::MaxRetriesExceeded;
        assert_eq!(err.to_string(), "max retries exceeded");
    }

    #[test]
    fn queue_error_display() {
        assert_eq!(QueueError::Closed.to_string(), "notification queue closed");
    }

    #[test]
    fn scheduler_error_wraps_collaborator_errors() {
        let err = SchedulerError::from(StorageError::Unavailable("down".to_string()));
        assert_eq!(err.to_string(), "storage error: storage unavailable: down");

        let err = SchedulerError::from(ProviderError::Timeout);
        assert_eq!(err.to_string(), "provider error: weather fetch timed out");

        let err = SchedulerError::from(QueueError::Closed);
        assert_eq!(err.to_string(), "queue error: notification queue closed");
    }
}
