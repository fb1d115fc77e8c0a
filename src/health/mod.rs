// src/health/mod.rs
mod checker;

pub use checker::{HeartbeatChecker, HeartbeatResult};
