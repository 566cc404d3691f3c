//! Block-type classifier.
//!
//! # Responsibility
//! - Recognize committed paragraph text that should change the block type.
//!
//! # Invariants
//! - `classify` is pure and total: unrecognized input yields `None`.
//! - Only markdown ATX-style headings (`#` .. `######` + space) are recognized.

use crate::model::block::{BlockMetadata, BlockType};
use once_cell::sync::Lazy;
use regex::Regex;

static HEADING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(#{1,6})[ \t]+(.+)$").expect("valid heading regex"));

/// Type conversion recognized from raw text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedBlock {
    pub kind: BlockType,
    /// Content with the recognized markup stripped.
    pub content: String,
    pub metadata: BlockMetadata,
}

/// Classifies raw paragraph text.
///
/// `"## Section"` yields a level-2 heading with content `"Section"`;
/// `"#NoSpace"` and `"plain text"` yield `None`.
pub fn classify(raw_text: &str) -> Option<ClassifiedBlock> {
    let caps = HEADING_RE.captures(raw_text)?;
    let marker = caps.get(1)?.as_str();
    let remainder = caps.get(2)?.as_str();
    if remainder.trim().is_empty() {
        return None;
    }

    // `#{1,6}` bounds the marker length, so the cast cannot truncate.
    let level = marker.len() as u8;
    Some(ClassifiedBlock {
        kind: BlockType::Heading,
        content: remainder.to_string(),
        metadata: BlockMetadata {
            level: Some(level),
            ..BlockMetadata::default()
        },
    })
}
