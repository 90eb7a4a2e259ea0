use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A corpus line that is not a JSON object. `line` is 1-based.
    #[error("Malformed corpus record at line {line}: {source}")]
    Load {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Failures of the embedding model, vector store or text engine.
    #[error(transparent)]
    External(#[from] anyhow::Error),
}

impl Error {
    pub fn external<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::External(anyhow::Error::new(err))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
