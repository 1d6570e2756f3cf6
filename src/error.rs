//! Error types for the attendance store.

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required input field was empty.
    #[error("`{0}` is required and must not be empty")]
    EmptyField(&'static str),

    /// A roll number could not be parsed as an integer.
    #[error("Invalid roll number: {0:?}")]
    InvalidRollNo(String),

    /// Another student already holds this roll number.
    #[error("Roll number {0} already exists")]
    DuplicateRollNo(i64),

    /// No student holds this roll number.
    #[error("No student with roll number {0}")]
    StudentNotFound(i64),

    /// The database file could not be created, opened, or written.
    #[error("Storage unavailable at {database}: {source}")]
    StorageUnavailable {
        database: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Database error: {0}")]
    Db(#[from] diesel::result::Error),

    /// A stored or supplied status was neither `Present` nor `Absent`.
    #[error("Invalid status: {0:?}")]
    InvalidStatus(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Parses operator input into a roll number.
pub fn parse_roll_no(input: &str) -> Result<i64> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(Error::EmptyField("roll_no"));
    }

    trimmed
        .parse()
        .map_err(|_| Error::InvalidRollNo(trimmed.to_string()))
}
