use thiserror::Error;

#[derive(Error, Debug)]
pub enum JournalError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Insufficient data: {required} closed trades required, {available} available")]
    InsufficientData { required: usize, available: usize },

    #[error("Invalid document format: {0}")]
    Format(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Export error: {0}")]
    Export(String),
}

pub type Result<T> = std::result::Result<T, JournalError>;

impl JournalError {
    pub fn validation(message: impl Into<String>) -> Self {
        JournalError::Validation(message.into())
    }

    pub fn not_found(entity: &'static str, id: &str) -> Self {
        JournalError::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

impl From<rusqlite::Error> for JournalError {
    fn from(err: rusqlite::Error) -> Self {
        JournalError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for JournalError {
    fn from(err: serde_json::Error) -> Self {
        JournalError::Format(err.to_string())
    }
}

impl From<csv::Error> for JournalError {
    fn from(err: csv::Error) -> Self {
        JournalError::Export(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message_names_entity() {
        let err = JournalError::not_found("Trade", "TRADE-1");
        assert_eq!(err.to_string(), "Trade not found: TRADE-1");
    }

    #[test]
    fn test_json_errors_become_format_errors() {
        let err: JournalError = serde_json::from_str::<serde_json::Value>("{not json")
            .unwrap_err()
            .into();
        assert!(matches!(err, JournalError::Format(_)));
    }
}
