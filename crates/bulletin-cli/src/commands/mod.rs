pub mod config;
pub mod daemon;
pub mod history;
pub mod preview;
pub mod recipients;
pub mod schedule;
pub mod send;
pub mod tick;
