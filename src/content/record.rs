// src/content/record.rs
use serde::Deserialize;
use serde_json::Value;

/// A content item from the source listing, normalised at deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawContentRecord")]
pub struct ContentRecord {
    pub published: bool,
    /// Creation timestamp, larger is newer. `None` when missing or not an integer;
    /// only published records are required to carry one.
    pub created: Option<i64>,
    pub nid: Option<String>,
    pub uuid: Option<String>,
}

impl ContentRecord {
    /// The numeric id when usable, otherwise the UUID.
    pub fn identifier(&self) -> Option<&str> {
        self.nid.as_deref().or(self.uuid.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct FieldItem {
    #[serde(default)]
    value: Value,
}

// Listing entries wrap most fields as `[{ "value": ... }]`.
#[derive(Debug, Deserialize)]
struct RawContentRecord {
    #[serde(default)]
    status: Vec<FieldItem>,
    #[serde(default)]
    created: Value,
    #[serde(default)]
    nid: Vec<FieldItem>,
    #[serde(default)]
    uuid: Value,
}

impl From<RawContentRecord> for ContentRecord {
    fn from(raw: RawContentRecord) -> Self {
        let published = raw.status.first().map_or(false, |s| is_published(&s.value));
        let created = parse_created(&raw.created);
        let nid = raw.nid.first().and_then(|n| nid_text(&n.value));
        let uuid = match &raw.uuid {
            Value::Array(items) => items
                .first()
                .and_then(|item| item.get("value"))
                .and_then(identifier_text),
            other => identifier_text(other),
        };

        Self {
            published,
            created,
            nid,
            uuid,
        }
    }
}

/// Upstream sends the flag either as a boolean or as the string "true".
fn is_published(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => s == "true",
        _ => false,
    }
}

fn parse_created(value: &Value) -> Option<i64> {
    match value {
        Value::String(s) => s.trim().parse().ok(),
        Value::Number(n) => n.as_i64(),
        _ => None,
    }
}

// A numeric zero is never a real node id; treat it like an empty one so the UUID is used.
fn nid_text(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) if n.as_i64() == Some(0) => None,
        other => identifier_text(other),
    }
}

fn identifier_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
