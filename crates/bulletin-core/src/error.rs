use thiserror::Error;

use crate::schedule::ScheduleConfigError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Schedule error: {0}")]
    Schedule(#[from] ScheduleConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("News API error: {0}")]
    NewsApi(String),

    #[error("Translation error: {0}")]
    Translation(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Mail error: {0}")]
    Mail(String),

    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    #[error("Recipient already exists: {0}")]
    DuplicateRecipient(String),

    #[error("Recipient not found: {0}")]
    RecipientNotFound(String),

    #[error("Dispatch record not found: {0}")]
    RecordNotFound(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;
