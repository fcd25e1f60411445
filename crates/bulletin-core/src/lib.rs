pub mod config;
pub mod dispatch;
pub mod error;
pub mod mail;
pub mod news;
pub mod recipient;
pub mod render;
pub mod schedule;
pub mod scheduler;
pub mod storage;

pub use config::AppConfig;
pub use error::{Error, Result};
