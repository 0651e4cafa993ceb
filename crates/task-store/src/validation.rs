//! Field validation for task data.
//!
//! Limits match the backing schema: short title, bounded description and
//! context, a closed priority set, and a bounded comma-separated tag list.

use crate::error::{Result, StoreError};

/// Maximum title length.
pub const MAX_TITLE_LEN: usize = 255;
/// Maximum description length.
pub const MAX_DESCRIPTION_LEN: usize = 1000;
/// Maximum AI context length.
pub const MAX_AI_CONTEXT_LEN: usize = 500;
/// Maximum number of tags.
pub const MAX_TAGS: usize = 10;
/// Maximum length of a single tag.
pub const MAX_TAG_LEN: usize = 50;

/// Allowed priority values.
pub const PRIORITIES: [&str; 3] = ["low", "medium", "high"];

/// Validate a task title.
pub fn validate_title(title: &str) -> Result<()> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(StoreError::Invalid("title must not be empty".to_string()));
    }
    if trimmed.len() > MAX_TITLE_LEN {
        return Err(StoreError::Invalid(format!(
            "title exceeds {} characters",
            MAX_TITLE_LEN
        )));
    }
    Ok(())
}

/// Validate an optional description.
pub fn validate_description(description: Option<&str>) -> Result<()> {
    if let Some(desc) = description {
        if desc.len() > MAX_DESCRIPTION_LEN {
            return Err(StoreError::Invalid(format!(
                "description exceeds {} characters",
                MAX_DESCRIPTION_LEN
            )));
        }
    }
    Ok(())
}

/// Validate a priority value.
pub fn validate_priority(priority: &str) -> Result<()> {
    if PRIORITIES.contains(&priority) {
        Ok(())
    } else {
        Err(StoreError::Invalid(format!(
            "priority must be one of low, medium, high (got '{}')",
            priority
        )))
    }
}

/// Validate a comma-separated tag list.
pub fn validate_tags(tags: Option<&str>) -> Result<()> {
    if let Some(tags) = tags {
        let parts: Vec<&str> = tags
            .split(',')
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .collect();
        if parts.len() > MAX_TAGS {
            return Err(StoreError::Invalid(format!(
                "at most {} tags are allowed",
                MAX_TAGS
            )));
        }
        for tag in parts {
            if tag.len() > MAX_TAG_LEN {
                return Err(StoreError::Invalid(format!(
                    "tag '{}' exceeds {} characters",
                    tag, MAX_TAG_LEN
                )));
            }
        }
    }
    Ok(())
}

/// Validate an optional AI context note.
pub fn validate_ai_context(context: Option<&str>) -> Result<()> {
    if let Some(ctx) = context {
        if ctx.len() > MAX_AI_CONTEXT_LEN {
            return Err(StoreError::Invalid(format!(
                "ai_context exceeds {} characters",
                MAX_AI_CONTEXT_LEN
            )));
        }
    }
    Ok(())
}
