pub mod config;
pub mod content;
pub mod health;
pub mod metrics;
pub mod notify;
pub mod replication;
pub mod runner;

pub use config::Config;
pub use runner::{RunReport, Runner};
