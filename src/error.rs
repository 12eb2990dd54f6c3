use thiserror::Error;

use crate::column::ColumnType;

/// Error type shared by every table operation
#[derive(Error, Debug)]
pub enum Error {
    #[error("unknown column: {0}")]
    UnknownColumn(String),

    #[error("duplicate column name: {0}")]
    DuplicateColumnName(String),

    #[error("inconsistent row count: expected {expected}, found {found}")]
    InconsistentRowCount { expected: usize, found: usize },

    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    #[error("column type mismatch: column {name}, expected {expected:?}, found {found:?}")]
    ColumnTypeMismatch {
        name: String,
        expected: ColumnType,
        found: ColumnType,
    },

    #[error("aggregate `{0}` must declare whether missing values are included or excluded")]
    AmbiguousMissingPolicy(String),

    #[error("cannot gather heterogeneous columns: {0}")]
    ColumnCountMismatch(String),

    #[error("aggregate `{0}` has no input values and no default")]
    EmptyGroupResult(String),

    #[error("duplicate key in spread: {0}")]
    DuplicateKey(String),

    #[error("index out of bounds: index {index}, size {size}")]
    IndexOutOfBounds { index: usize, size: usize },

    #[error("parse error at {position}: {message}")]
    Parse { position: usize, message: String },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid regular expression: {0}")]
    InvalidRegex(String),

    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("I/O error: {0}")]
    Io(#[source] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[source] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[source] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[source] serde_yaml::Error),

    #[error("TOML error: {0}")]
    Toml(#[source] toml::de::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn parse(position: usize, message: impl Into<String>) -> Self {
        Error::Parse {
            position,
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Error::Csv(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err)
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::Yaml(err)
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Toml(err)
    }
}

impl From<regex::Error> for Error {
    fn from(err: regex::Error) -> Self {
        Error::InvalidRegex(err.to_string())
    }
}
