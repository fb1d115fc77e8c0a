// src/notify/mod.rs
mod notifier;

pub use notifier::{Notifier, NotifyError};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Severity attached to an alert, passed through as the `Priority` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[default]
    Low,
    Default,
    High,
    Critical,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Default => "default",
            Priority::High => "high",
            Priority::Critical => "critical",
        }
    }

    /// Human title sent alongside the message.
    pub fn title(&self) -> &'static str {
        match self {
            Priority::Low => "Everything is fine",
            _ => "Something is down",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "default" => Ok(Priority::Default),
            "high" => Ok(Priority::High),
            "critical" => Ok(Priority::Critical),
            other => Err(format!("unknown priority '{}'", other)),
        }
    }
}

/// Alert sink used by the checks. Implementations must never fail the caller.
#[async_trait]
pub trait Notify: Send + Sync {
    async fn notify(&self, message: &str, priority: Priority);

    fn default_priority(&self) -> Priority;

    async fn notify_default(&self, message: &str) {
        self.notify(message, self.default_priority()).await
    }
}
