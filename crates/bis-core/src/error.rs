//! Error types shared by the BIS source adapters

use std::fmt;

/// Errors that can occur while talking to a source or handling its documents
#[derive(Debug)]
pub enum BisError {
    /// HTTP request failed
    Http(reqwest::Error),
    /// Source answered with a non-success status code
    Status(u16),
    /// Failed to parse or serialize JSON
    Json(serde_json::Error),
    /// Failed to parse an XML response
    Xml(String),
    /// Local file access failed
    Io(std::io::Error),
    /// Input was not in a shape the operation accepts
    InvalidInput(String),
}

impl fmt::Display for BisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(e) => write!(f, "HTTP error: {}", e),
            Self::Status(code) => write!(f, "HTTP Status Code: {}", code),
            Self::Json(e) => write!(f, "JSON error: {}", e),
            Self::Xml(msg) => write!(f, "XML parse error: {}", msg),
            Self::Io(e) => write!(f, "IO error: {}", e),
            Self::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
        }
    }
}

impl std::error::Error for BisError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Http(e) => Some(e),
            Self::Json(e) => Some(e),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for BisError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e)
    }
}

impl From<serde_json::Error> for BisError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

impl From<std::io::Error> for BisError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<quick_xml::Error> for BisError {
    fn from(e: quick_xml::Error) -> Self {
        Self::Xml(e.to_string())
    }
}

/// Result type for BIS operations
pub type Result<T> = std::result::Result<T, BisError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_display() {
        let err = BisError::Status(503);
        assert_eq!(format!("{}", err), "HTTP Status Code: 503");
    }

    #[test]
    fn test_invalid_input_display() {
        let err = BisError::InvalidInput("expected a list".to_string());
        assert_eq!(format!("{}", err), "Invalid input: expected a list");
    }

    #[test]
    fn test_json_error_has_source() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = BisError::from(parse_err);
        assert!(std::error::Error::source(&err).is_some());
    }
}
