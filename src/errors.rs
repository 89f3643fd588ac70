use thiserror::Error;

#[derive(Error, Debug)]
pub enum BoardRagError {
    #[error("Retrieval error: {0}")]
    Retrieval(String),

    #[error("Graph traversal error: {0}")]
    Traversal(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Source extract error: {0}")]
    SourceExtract(String),

    #[error("Commit error: {0}")]
    Commit(String),

    #[error("Index write error: {0}")]
    IndexWrite(String),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("HTTP error: {0}")]
    HttpError(String),

    #[error("Embedding error: {0}")]
    EmbeddingError(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlParsing(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Custom(String),
}

impl BoardRagError {
    /// Short machine-readable kind, used in logs and error events
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Retrieval(_) => "retrieval",
            Self::Traversal(_) => "traversal",
            Self::Generation(_) => "generation",
            Self::SourceExtract(_) => "source_extract",
            Self::Commit(_) => "commit",
            Self::IndexWrite(_) => "index_write",
            Self::ConfigError(_) => "config",
            Self::Database(_) => "database",
            Self::HttpError(_) => "http",
            Self::EmbeddingError(_) => "embedding",
            Self::Serialization(_) => "serialization",
            Self::TomlParsing(_) => "toml",
            Self::Io(_) => "io",
            Self::Custom(_) => "custom",
        }
    }
}

pub type Result<T> = std::result::Result<T, BoardRagError>;
