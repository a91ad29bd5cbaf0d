use thiserror::Error;

#[derive(Error, Debug)]
pub enum SavourError {
    #[error("Search error: {0}")]
    SearchError(#[from] crate::search::SearchError),
    #[error("Store error: {0}")]
    StoreError(#[from] crate::store::StoreError),
    #[error("Entity error: {0}")]
    EntityError(#[from] crate::entity::EntityError),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Init Logging error: {0}")]
    InitLoggingError(#[from] tracing_subscriber::filter::ParseError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, SavourError>;
