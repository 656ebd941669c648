use thiserror::Error;

/// Application-wide error types.
///
/// This enum represents every failure the Tervis services can report. It uses
/// `thiserror` for ergonomic error handling and automatic conversion from the
/// underlying library errors.
///
/// # Error Conversion
///
/// - `sqlx::Error` → `AppError::DatabaseError`
/// - `serde_json::Error` → `AppError::SerializationError`
///
/// # Examples
///
/// ```no_run
/// use tervis_core::error::AppError;
///
/// fn example() -> Result<(), AppError> {
///     Err(AppError::InvalidQuery("Query is required".to_string()))
/// }
/// ```
#[derive(Error, Debug)]
pub enum AppError {
    /// A directory, location, usage or preference query failed.
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    /// Outbound HTTP call failed (news source, translation endpoint).
    #[error("HTTP client error: {0}")]
    ClientError(String),

    /// Gemini API call failed (authentication, quota, malformed reply).
    #[error("Gemini error: {0}")]
    GeminiError(String),

    /// A JSON payload could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// A configured URL could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The incoming query was rejected before any backend call was made.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// A row read from the store could not be turned into a domain record.
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// Configuration file could not be read or parsed.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The upstream reply carried no usable text.
    #[error("Upstream returned an empty reply")]
    EmptyResponse,

    /// Could not reach an upstream host.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// An upstream call exceeded its time budget.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// Rate limit exceeded, either upstream or by the daily usage ceiling.
    #[error("Rate limit exceeded. Please wait and try again.")]
    RateLimitExceeded,

    /// Anything not covered above.
    #[error("{0}")]
    Generic(String),
}

impl AppError {
    /// Returns a user-friendly error message suitable for CLI output.
    pub fn user_message(&self) -> String {
        match self {
            AppError::DatabaseError(e) => {
                if e.to_string().contains("connection") {
                    "The directory database is unreachable.\n   Check DATABASE_URL and that PostgreSQL is up."
                        .to_string()
                } else {
                    format!("Database error: {}", e)
                }
            }
            AppError::GeminiError(msg) => {
                if msg.contains("401")
                    || msg.contains("Unauthorized")
                    || msg.contains("API key")
                {
                    "Invalid Gemini API key.\n   Check your GEMINI_API_KEY environment variable."
                        .to_string()
                } else if msg.contains("429") || msg.contains("rate") {
                    "Gemini rate limit reached.\n   Wait a moment and try again.".to_string()
                } else {
                    format!("Gemini error: {}", msg)
                }
            }
            AppError::InvalidQuery(msg) => msg.clone(),
            AppError::ConfigError(msg) => {
                format!("Configuration error: {}\n   Check your tervis.toml file.", msg)
            }
            AppError::NetworkError(msg) => {
                format!("Network error: {}\n   Check your internet connection.", msg)
            }
            AppError::Timeout(secs) => {
                format!("No upstream answer within {} seconds.", secs)
            }
            AppError::RateLimitExceeded => "Search limit reached for today.".to_string(),
            AppError::EmptyResponse => "The upstream service answered with no text.".to_string(),
            _ => self.to_string(),
        }
    }

    /// Returns true if this error is transient.
    ///
    /// The search pipeline never retries, but callers such as the CLI use this
    /// to decide whether suggesting "try again" makes sense.
    ///
    /// # Examples
    ///
    /// ```
    /// use tervis_core::error::AppError;
    ///
    /// assert!(AppError::NetworkError("connection reset".to_string()).is_retryable());
    /// assert!(!AppError::InvalidQuery("too short".to_string()).is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AppError::NetworkError(_)
                | AppError::Timeout(_)
                | AppError::RateLimitExceeded
                | AppError::ClientError(_)
        )
    }

    /// Returns true for failures caused by the caller's input.
    pub fn is_client_error(&self) -> bool {
        matches!(self, AppError::InvalidQuery(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AppError::InvalidQuery("Query is required".to_string());
        assert_eq!(err.to_string(), "Invalid query: Query is required");
    }

    #[test]
    fn test_generic_error() {
        let err = AppError::Generic("preference store closed".to_string());
        assert_eq!(err.to_string(), "preference store closed");
    }

    #[test]
    fn test_user_message_gemini_auth() {
        let err = AppError::GeminiError("401 Unauthorized".to_string());
        assert!(err.user_message().contains("Invalid Gemini API key"));
    }

    #[test]
    fn test_user_message_rate_limit() {
        let err = AppError::GeminiError("429 rate limit".to_string());
        assert!(err.user_message().contains("rate limit"));
    }

    #[test]
    fn test_user_message_invalid_query_is_passthrough() {
        let err = AppError::InvalidQuery("Query must be at least 2 characters".to_string());
        assert_eq!(err.user_message(), "Query must be at least 2 characters");
    }

    #[test]
    fn test_error_from_serde() {
        let result: Result<serde_json::Value, _> = serde_json::from_str("{ invalid json }");
        let app_err: AppError = result.unwrap_err().into();
        assert!(matches!(app_err, AppError::SerializationError(_)));
    }

    #[test]
    fn test_user_message_database_connection() {
        let err = AppError::DatabaseError(sqlx::Error::PoolTimedOut);
        let msg = err.user_message();
        assert!(msg.contains("unreachable") || msg.contains("Database error"));
    }

    #[test]
    fn test_is_retryable() {
        assert!(AppError::NetworkError("timeout".to_string()).is_retryable());
        assert!(AppError::Timeout(8).is_retryable());
        assert!(AppError::RateLimitExceeded.is_retryable());
        assert!(!AppError::InvalidRecord("bad".to_string()).is_retryable());
    }

    #[test]
    fn test_is_client_error() {
        assert!(AppError::InvalidQuery("empty".to_string()).is_client_error());
        assert!(!AppError::EmptyResponse.is_client_error());
    }

    #[test]
    fn test_timeout_error() {
        let err = AppError::Timeout(8);
        assert_eq!(err.to_string(), "Request timed out after 8 seconds");
        assert_eq!(err.user_message(), "No upstream answer within 8 seconds.");
    }
}
