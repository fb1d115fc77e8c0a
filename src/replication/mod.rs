// src/replication/mod.rs
mod checker;

pub use checker::{ReplicationChecker, ReplicationError, ReplicationOutcome};
