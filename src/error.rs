use std::fmt;
use thiserror::Error;

/// A single row that failed typed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub table: String,
    /// Zero-based position of the row in the extracted batch, when known.
    pub row: Option<usize>,
    pub field: String,
    pub reason: String,
}

impl ValidationError {
    pub fn new(table: &str, field: &str, reason: impl Into<String>) -> Self {
        Self {
            table: table.to_string(),
            row: None,
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    pub fn at_row(mut self, row: usize) -> Self {
        self.row = Some(row);
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.row {
            Some(row) => write!(
                f,
                "{} row {}: field '{}' {}",
                self.table, row, self.field, self.reason
            ),
            None => write!(f, "{}: field '{}' {}", self.table, self.field, self.reason),
        }
    }
}

#[derive(Error, Debug)]
pub enum ScraperError {
    #[error("fetch failed for {url}: {message}")]
    Fetch { url: String, message: String },

    #[error("bot challenge still active for {url} after waiting")]
    Challenge { url: String },

    #[error("table '{table_id}' not found in {url}")]
    TableNotFound { table_id: String, url: String },

    #[error("validation failed: {0}")]
    Validation(ValidationError),

    #[error("all {attempts} attempts failed for {url}: {source}")]
    RetryExhausted {
        url: String,
        attempts: u32,
        #[source]
        source: Box<ScraperError>,
    },

    #[error("invalid retry configuration: {0}")]
    InvalidRetryConfig(String),

    #[error("duplicate record in {table}: {detail}")]
    DuplicateRecord { table: String, detail: String },

    #[error("unknown stat category: {0}")]
    UnknownCategory(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("database error: {0}")]
    Database(rusqlite::Error),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("API error: {message}")]
    Api { message: String },

    #[error("browser error: {0}")]
    Browser(String),
}

impl From<ValidationError> for ScraperError {
    fn from(e: ValidationError) -> Self {
        ScraperError::Validation(e)
    }
}

// Extended result codes for key conflicts. Other constraint failures
// (NOT NULL, CHECK, foreign key) stay plain database errors.
const SQLITE_CONSTRAINT_PRIMARYKEY: std::os::raw::c_int = 1555;
const SQLITE_CONSTRAINT_UNIQUE: std::os::raw::c_int = 2067;

impl From<rusqlite::Error> for ScraperError {
    fn from(e: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(ref code, ref msg) = e {
            if matches!(
                code.extended_code,
                SQLITE_CONSTRAINT_UNIQUE | SQLITE_CONSTRAINT_PRIMARYKEY
            ) {
                return ScraperError::DuplicateRecord {
                    table: String::new(),
                    detail: msg.clone().unwrap_or_else(|| code.to_string()),
                };
            }
        }
        ScraperError::Database(e)
    }
}

impl ScraperError {
    /// Network-level failures that a fresh attempt may fix.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ScraperError::Fetch { .. }
                | ScraperError::Challenge { .. }
                | ScraperError::Http(_)
                | ScraperError::Browser(_)
        )
    }

    /// The pipeline stage the error belongs to, as reported to callers.
    pub fn stage(&self) -> &'static str {
        match self {
            ScraperError::Fetch { .. }
            | ScraperError::Challenge { .. }
            | ScraperError::Http(_)
            | ScraperError::Browser(_) => "fetch",
            ScraperError::RetryExhausted { source, .. } => source.stage(),
            ScraperError::TableNotFound { .. } => "parse",
            ScraperError::Validation(_) => "validate",
            ScraperError::DuplicateRecord { .. } | ScraperError::Database(_) => "persist",
            ScraperError::Api { .. } => "odds",
            ScraperError::InvalidRetryConfig(_)
            | ScraperError::UnknownCategory(_)
            | ScraperError::Config(_)
            | ScraperError::Toml(_) => "config",
            ScraperError::Json(_) | ScraperError::Csv(_) | ScraperError::Io(_) => "io",
        }
    }

    /// Number of attempts made when the error ended a retry loop.
    pub fn attempts(&self) -> Option<u32> {
        match self {
            ScraperError::RetryExhausted { attempts, .. } => Some(*attempts),
            _ => None,
        }
    }

    /// Short type name used in structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ScraperError::Fetch { .. } => "FetchError",
            ScraperError::Challenge { .. } => "ChallengeError",
            ScraperError::TableNotFound { .. } => "TableNotFound",
            ScraperError::Validation(_) => "ValidationError",
            ScraperError::RetryExhausted { .. } => "RetryExhausted",
            ScraperError::InvalidRetryConfig(_) => "InvalidRetryConfig",
            ScraperError::DuplicateRecord { .. } => "DuplicateRecord",
            ScraperError::UnknownCategory(_) => "UnknownCategory",
            ScraperError::Http(_) => "HttpError",
            ScraperError::Database(_) => "DatabaseError",
            ScraperError::Json(_) => "JsonError",
            ScraperError::Toml(_) => "TomlError",
            ScraperError::Csv(_) => "CsvError",
            ScraperError::Io(_) => "IoError",
            ScraperError::Config(_) => "ConfigError",
            ScraperError::Api { .. } => "ApiError",
            ScraperError::Browser(_) => "BrowserError",
        }
    }

    pub(crate) fn in_table(self, table: &str) -> Self {
        match self {
            ScraperError::DuplicateRecord { detail, .. } => ScraperError::DuplicateRecord {
                table: table.to_string(),
                detail,
            },
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, ScraperError>;
