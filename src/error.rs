use thiserror::Error;

/// Application-wide result type alias.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// I/O errors from local filesystem access.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Terminal initialization or rendering errors.
    #[error("Terminal error: {0}")]
    Terminal(String),

    /// Invalid path provided by the user.
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Transport-level failure talking to the document server.
    #[error("Network error: {0}")]
    Http(#[from] reqwest::Error),

    /// A payload could not be encoded or decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The server answered, but reported failure.
    #[error("{}", api_message(.status, .message))]
    Api {
        status: Option<u16>,
        message: String,
    },

    /// Input rejected before any request was issued.
    #[error("{0}")]
    Validation(String),

    /// A local directory entry could not be read during ingestion.
    #[error("Cannot read {path}: {message}")]
    Traversal { path: String, message: String },
}

fn api_message(status: &Option<u16>, message: &str) -> String {
    match status {
        Some(code) => format!("Server error ({}): {}", code, message),
        None => format!("Server error: {}", message),
    }
}

impl AppError {
    /// Shorthand for a server-side failure reported inside a 2xx envelope.
    pub fn api(message: impl Into<String>) -> Self {
        AppError::Api {
            status: None,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let app_err: AppError = io_err.into();
        assert!(matches!(app_err, AppError::Io(_)));
        assert!(app_err.to_string().contains("file not found"));
    }

    #[test]
    fn terminal_error_display() {
        let err = AppError::Terminal("failed to enter raw mode".into());
        assert_eq!(err.to_string(), "Terminal error: failed to enter raw mode");
    }

    #[test]
    fn api_error_display_with_status() {
        let err = AppError::Api {
            status: Some(404),
            message: "document not found".into(),
        };
        assert_eq!(err.to_string(), "Server error (404): document not found");
    }

    #[test]
    fn api_error_display_without_status() {
        let err = AppError::api("vectorize queue full");
        assert_eq!(err.to_string(), "Server error: vectorize queue full");
    }

    #[test]
    fn validation_error_is_plain_message() {
        let err = AppError::Validation("Folder name cannot be empty".into());
        assert_eq!(err.to_string(), "Folder name cannot be empty");
    }

    #[test]
    fn traversal_error_display() {
        let err = AppError::Traversal {
            path: "docs/private".into(),
            message: "permission denied".into(),
        };
        assert_eq!(err.to_string(), "Cannot read docs/private: permission denied");
    }

    #[test]
    fn json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let app_err: AppError = json_err.into();
        assert!(matches!(app_err, AppError::Json(_)));
    }
}
