//! Error types for the Dolce core library.

/// Top-level error enum for the Dolce core library.
#[derive(Debug, thiserror::Error)]
pub enum DolceError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Oracle error: {0}")]
    Oracle(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Extraction error: {0}")]
    Extract(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

#[cfg(feature = "python")]
impl From<DolceError> for pyo3::PyErr {
    fn from(err: DolceError) -> pyo3::PyErr {
        use pyo3::exceptions::{PyConnectionError, PyIOError, PyRuntimeError, PyValueError};

        match &err {
            DolceError::Config(_) | DolceError::Parse(_) | DolceError::Toml(_) => {
                PyValueError::new_err(err.to_string())
            }
            DolceError::Connection(_) | DolceError::Http(_) => {
                PyConnectionError::new_err(err.to_string())
            }
            DolceError::Io(_) | DolceError::Extract(_) => PyIOError::new_err(err.to_string()),
            DolceError::Oracle(_) | DolceError::Cache(_) | DolceError::Json(_) => {
                PyRuntimeError::new_err(err.to_string())
            }
        }
    }
}

pub type DolceResult<T> = Result<T, DolceError>;
