// src/content/mod.rs
mod extractor;
mod record;

pub use extractor::{latest_content_id, ExtractError};
pub use record::ContentRecord;
