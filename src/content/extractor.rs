// src/content/extractor.rs
use super::ContentRecord;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractError {
    #[error("No published content found")]
    EmptyResult,

    #[error("No ID found in the latest published content")]
    MissingIdentifier,

    #[error("Published content has an invalid created timestamp")]
    InvalidTimestamp,
}

/// Identifier of the newest published record.
///
/// Records are ordered by `created` descending; ties keep listing order.
/// Only published records need a valid `created`. The numeric id is
/// preferred over the UUID.
pub fn latest_content_id(records: &[ContentRecord]) -> Result<String, ExtractError> {
    let mut published = records
        .iter()
        .filter(|r| r.published)
        .map(|r| r.created.map(|created| (created, r)))
        .collect::<Option<Vec<_>>>()
        .ok_or(ExtractError::InvalidTimestamp)?;

    if published.is_empty() {
        return Err(ExtractError::EmptyResult);
    }

    published.sort_by(|(a, _), (b, _)| b.cmp(a));

    let id = published[0]
        .1
        .identifier()
        .ok_or(ExtractError::MissingIdentifier)?;

    info!("Latest published content ID: {}", id);
    Ok(id.to_string())
}
