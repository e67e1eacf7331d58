use thiserror::Error;

#[derive(Error, Debug)]
pub enum StreetbotError {
    #[error("Gazetteer error: {0}")]
    Gazetteer(#[from] crate::gazetteer::GazetteerError),
    #[error("Data error: {0}")]
    Data(#[from] streetbot_gazetteer::DataError),
    #[error("Service query error: {0}")]
    Query(#[from] crate::search::QueryError),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Init Logging error: {0}")]
    InitLoggingError(#[from] tracing_subscriber::filter::ParseError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, StreetbotError>;
