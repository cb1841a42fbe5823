use thiserror::Error;

pub type Result<T> = std::result::Result<T, SearchError>;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Unknown item: {0}")]
    UnknownItem(String),

    #[error("Invalid recipe quota {0} (must be at least 1)")]
    InvalidQuota(i64),

    #[error("Invalid search config: {0}")]
    Config(String),

    #[error("Catalog error: {0}")]
    Catalog(#[from] crafting_graph::GraphError),

    #[error("Search task failed: {0}")]
    Task(String),
}

impl From<tokio::task::JoinError> for SearchError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Task(err.to_string())
    }
}
