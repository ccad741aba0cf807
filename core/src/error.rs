use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenError {
    #[error("Invalid configuration: {field} {reason}")]
    Config { field: &'static str, reason: String },

    #[error("All event ids are used")]
    Exhausted,

    #[error("Labeling failed for input {index}: {reason}")]
    Collaborator { index: usize, reason: String },

    #[error("Pool '{pool}' could not be filled: {rejections} duplicate draws")]
    PoolSaturated { pool: &'static str, rejections: u64 },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type GenResult<T> = Result<T, GenError>;

impl GenError {
    pub fn config(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Config {
            field,
            reason: reason.into(),
        }
    }
}

/// Fail with a configuration error unless `ok` holds.
pub(crate) fn ensure(ok: bool, field: &'static str, reason: &str) -> GenResult<()> {
    if ok {
        Ok(())
    } else {
        Err(GenError::config(field, reason))
    }
}
