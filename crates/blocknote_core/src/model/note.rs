//! Note aggregate.
//!
//! # Responsibility
//! - Own one note document plus identity, title, ownership and visibility.
//! - Expose the only legal ways to mutate the document.
//!
//! # Invariants
//! - `id`, `owner_id` and `created_at` never change after `Note::create`.
//! - `updated_at` strictly increases on every accepted mutation.
//! - The document is never empty: deletions that would empty it re-seed one
//!   default paragraph.
//! - Operations return a new `Note`; the receiver is never modified.
//!
//! Authorization is the caller's job; see `service::access`.

use crate::document::classifier::classify;
use crate::document::tree::{
    block_ids, delete_by_id, depth_of, find_by_id, insert_after, set_indent, update_by_id,
};
use crate::model::block::{
    Block, BlockId, BlockMetadata, BlockPatch, BlockType, MAX_HEADING_LEVEL,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Stable note identifier.
pub type NoteId = Uuid;

/// Opaque identity of a user, supplied by the transport layer.
pub type UserId = String;

/// Maximum title length in characters.
pub const MAX_TITLE_CHARS: usize = 255;

/// Validation failures for note fields and documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteValidationError {
    /// Title is blank after trimming.
    EmptyTitle,
    /// Title exceeds `MAX_TITLE_CHARS`.
    TitleTooLong { max: usize, actual: usize },
    /// Heading metadata level outside `1..=6`.
    InvalidHeadingLevel { block_id: BlockId, level: u8 },
    /// Same block id appears twice in one document tree.
    DuplicateBlockId(BlockId),
    /// Document has no top-level blocks.
    EmptyDocument,
}

impl Display for NoteValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "title must not be blank"),
            Self::TitleTooLong { max, actual } => {
                write!(f, "title is {actual} characters; maximum is {max}")
            }
            Self::InvalidHeadingLevel { block_id, level } => write!(
                f,
                "heading block {block_id} has level {level}; expected 1..={MAX_HEADING_LEVEL}"
            ),
            Self::DuplicateBlockId(id) => write!(f, "duplicate block id in document: {id}"),
            Self::EmptyDocument => write!(f, "document must contain at least one block"),
        }
    }
}

impl Error for NoteValidationError {}

/// Errors returned by aggregate operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteError {
    /// Field or document validation failed.
    Validation(NoteValidationError),
    /// Operation does not apply to the target block's type.
    InvalidOperation {
        block_id: BlockId,
        operation: &'static str,
        actual: BlockType,
    },
}

impl Display for NoteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::InvalidOperation {
                block_id,
                operation,
                actual,
            } => write!(
                f,
                "cannot {operation} block {block_id} of type `{actual}`"
            ),
        }
    }
}

impl Error for NoteError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::InvalidOperation { .. } => None,
        }
    }
}

impl From<NoteValidationError> for NoteError {
    fn from(value: NoteValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Note aggregate root.
///
/// Serializes to `id, title, document, isPublic, createdAt, updatedAt,
/// userId`. Timestamps are Unix epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    pub document: Vec<Block>,
    #[serde(rename = "userId")]
    pub owner_id: UserId,
    #[serde(default)]
    pub is_public: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Note {
    /// Creates a private note with one empty paragraph.
    pub fn create(owner_id: impl Into<UserId>, title: &str) -> Result<Note, NoteError> {
        let title = normalize_title(title)?;
        let now = now_epoch_ms();
        Ok(Note {
            id: Uuid::new_v4(),
            title,
            document: vec![Block::default_paragraph()],
            owner_id: owner_id.into(),
            is_public: false,
            created_at: now,
            updated_at: now,
        })
    }

    /// Checks title rules, heading levels, block id uniqueness and that the
    /// document is non-empty.
    pub fn validate(&self) -> Result<(), NoteValidationError> {
        normalize_title(&self.title)?;
        if self.document.is_empty() {
            return Err(NoteValidationError::EmptyDocument);
        }
        validate_document(&self.document)
    }

    /// Looks up one block anywhere in the document.
    pub fn block(&self, block_id: BlockId) -> Option<&Block> {
        find_by_id(&self.document, block_id)
    }

    /// Replaces the title.
    pub fn rename(&self, title: &str) -> Result<Note, NoteError> {
        let title = normalize_title(title)?;
        Ok(Note {
            title,
            updated_at: self.next_updated_at(),
            ..self.clone()
        })
    }

    /// Sets public visibility.
    pub fn set_visibility(&self, is_public: bool) -> Note {
        Note {
            is_public,
            updated_at: self.next_updated_at(),
            ..self.clone()
        }
    }

    /// Commits new text into one block.
    ///
    /// Paragraphs whose text matches heading syntax are converted into
    /// headings; other block types keep their type. A missing target leaves
    /// the note unchanged.
    pub fn edit_block(&self, block_id: BlockId, content: &str) -> Note {
        let Some(target) = self.block(block_id) else {
            return self.clone();
        };

        let classified = match target.kind {
            BlockType::Paragraph => classify(content),
            _ => None,
        };
        let patch = match classified {
            Some(classified) => BlockPatch {
                kind: Some(classified.kind),
                content: Some(classified.content),
                metadata: Some(classified.metadata),
            },
            None => BlockPatch::content(content),
        };

        self.with_document(update_by_id(&self.document, block_id, &patch))
    }

    /// Inserts an empty block of `kind` after `after_id`.
    pub fn insert_block_after(&self, after_id: Option<BlockId>, kind: BlockType) -> Note {
        self.insert_block_after_with_id(after_id, kind).0
    }

    /// Same as [`Note::insert_block_after`], also returning the new block id.
    pub fn insert_block_after_with_id(
        &self,
        after_id: Option<BlockId>,
        kind: BlockType,
    ) -> (Note, BlockId) {
        let mut block = Block::new(kind);
        let block_id = block.id;
        if kind.is_list_style() {
            let depth = after_id
                .and_then(|id| depth_of(&self.document, id))
                .unwrap_or(0);
            block.metadata = Some(BlockMetadata {
                indent: Some(u32::try_from(depth).unwrap_or(u32::MAX)),
                ..BlockMetadata::default()
            });
        }

        let document = insert_after(&self.document, after_id, block);
        (self.with_document(document), block_id)
    }

    /// Removes one block and its subtree.
    pub fn delete_block(&self, block_id: BlockId) -> Note {
        if self.block(block_id).is_none() {
            return self.clone();
        }

        let mut document = delete_by_id(&self.document, block_id);
        if document.is_empty() {
            document.push(Block::default_paragraph());
        }
        self.with_document(document)
    }

    /// Flips the `checked` flag of a todo block.
    pub fn toggle_todo(&self, block_id: BlockId) -> Result<Note, NoteError> {
        let Some(target) = self.block(block_id) else {
            return Ok(self.clone());
        };
        if target.kind != BlockType::Todo {
            return Err(NoteError::InvalidOperation {
                block_id,
                operation: "toggle",
                actual: target.kind,
            });
        }

        let patch = BlockPatch::metadata(BlockMetadata {
            checked: Some(!target.is_checked()),
            ..BlockMetadata::default()
        });
        Ok(self.with_document(update_by_id(&self.document, block_id, &patch)))
    }

    /// Nests or un-nests a list-style block.
    pub fn indent_block(&self, block_id: BlockId, delta: i32) -> Result<Note, NoteError> {
        let Some(target) = self.block(block_id) else {
            return Ok(self.clone());
        };
        if !target.kind.is_list_style() {
            return Err(NoteError::InvalidOperation {
                block_id,
                operation: "indent",
                actual: target.kind,
            });
        }

        let document = set_indent(&self.document, block_id, delta);
        if document == self.document {
            return Ok(self.clone());
        }
        Ok(self.with_document(document))
    }

    /// Replaces the whole document, e.g. from an import or full-body update.
    pub fn replace_document(&self, document: Vec<Block>) -> Result<Note, NoteError> {
        let document = if document.is_empty() {
            vec![Block::default_paragraph()]
        } else {
            document
        };
        validate_document(&document)?;
        Ok(self.with_document(document))
    }

    fn with_document(&self, document: Vec<Block>) -> Note {
        Note {
            id: self.id,
            title: self.title.clone(),
            document,
            owner_id: self.owner_id.clone(),
            is_public: self.is_public,
            created_at: self.created_at,
            updated_at: self.next_updated_at(),
        }
    }

    // Strictly monotonic so that edits within one millisecond still advance.
    fn next_updated_at(&self) -> i64 {
        now_epoch_ms().max(self.updated_at.saturating_add(1))
    }
}

fn normalize_title(title: &str) -> Result<String, NoteValidationError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(NoteValidationError::EmptyTitle);
    }
    let actual = trimmed.chars().count();
    if actual > MAX_TITLE_CHARS {
        return Err(NoteValidationError::TitleTooLong {
            max: MAX_TITLE_CHARS,
            actual,
        });
    }
    Ok(trimmed.to_string())
}

fn validate_document(document: &[Block]) -> Result<(), NoteValidationError> {
    let mut seen = HashSet::new();
    for id in block_ids(document) {
        if !seen.insert(id) {
            return Err(NoteValidationError::DuplicateBlockId(id));
        }
    }
    validate_heading_levels(document)
}

fn validate_heading_levels(blocks: &[Block]) -> Result<(), NoteValidationError> {
    for block in blocks {
        if block.kind == BlockType::Heading {
            let level = block.heading_level();
            if !(1..=MAX_HEADING_LEVEL).contains(&level) {
                return Err(NoteValidationError::InvalidHeadingLevel {
                    block_id: block.id,
                    level,
                });
            }
        }
        validate_heading_levels(&block.children)?;
    }
    Ok(())
}

fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::{Note, NoteError, NoteValidationError, MAX_TITLE_CHARS};
    use crate::model::block::{Block, BlockType};

    fn note() -> Note {
        Note::create("u1", "Groceries").expect("valid note")
    }

    #[test]
    fn create_seeds_single_empty_paragraph() {
        let note = note();
        assert_eq!(note.document.len(), 1);
        assert_eq!(note.document[0].kind, BlockType::Paragraph);
        assert!(note.document[0].content.is_empty());
        assert!(!note.is_public);
        assert_eq!(note.created_at, note.updated_at);
        assert!(note.validate().is_ok());
    }

    #[test]
    fn create_rejects_blank_title() {
        let err = Note::create("u1", "   ").unwrap_err();
        assert_eq!(err, NoteError::Validation(NoteValidationError::EmptyTitle));
    }

    #[test]
    fn rename_rejects_overlong_title_and_keeps_original() {
        let note = note();
        let long = "x".repeat(MAX_TITLE_CHARS + 1);
        let err = note.rename(&long).unwrap_err();
        assert!(matches!(
            err,
            NoteError::Validation(NoteValidationError::TitleTooLong { actual, .. }) if actual == 256
        ));
        assert_eq!(note.title, "Groceries");
    }

    #[test]
    fn rename_accepts_max_length_multibyte_title() {
        let title = "é".repeat(MAX_TITLE_CHARS);
        let renamed = note().rename(&title).expect("255 chars is allowed");
        assert_eq!(renamed.title, title);
    }

    #[test]
    fn every_mutation_advances_updated_at() {
        let created = note();
        let renamed = created.rename("Errands").unwrap();
        let published = renamed.set_visibility(true);
        let edited = published.edit_block(published.document[0].id, "milk");

        assert!(renamed.updated_at > created.updated_at);
        assert!(published.updated_at > renamed.updated_at);
        assert!(edited.updated_at > published.updated_at);
        assert_eq!(edited.created_at, created.created_at);
        assert_eq!(edited.id, created.id);
        assert_eq!(edited.owner_id, created.owner_id);
    }

    #[test]
    fn edit_paragraph_with_heading_syntax_converts_type() {
        let note = note();
        let block_id = note.document[0].id;
        let edited = note.edit_block(block_id, "## Section");

        let block = edited.block(block_id).expect("block still present");
        assert_eq!(block.kind, BlockType::Heading);
        assert_eq!(block.content, "Section");
        assert_eq!(block.heading_level(), 2);
    }

    #[test]
    fn edit_non_paragraph_keeps_type_and_raw_text() {
        let (note, todo_id) = note().insert_block_after_with_id(None, BlockType::Todo);
        let edited = note.edit_block(todo_id, "# not a heading");
        let block = edited.block(todo_id).unwrap();
        assert_eq!(block.kind, BlockType::Todo);
        assert_eq!(block.content, "# not a heading");
    }

    #[test]
    fn edit_missing_block_returns_unchanged_note() {
        let note = note();
        assert_eq!(note.edit_block(uuid::Uuid::new_v4(), "x"), note);
    }

    #[test]
    fn deleting_last_block_reseeds_default_paragraph() {
        let note = note();
        let only_id = note.document[0].id;
        let deleted = note.delete_block(only_id);

        assert_eq!(deleted.document.len(), 1);
        assert_ne!(deleted.document[0].id, only_id);
        assert_eq!(deleted.document[0].kind, BlockType::Paragraph);
        assert!(deleted.document[0].content.is_empty());
    }

    #[test]
    fn toggle_rejects_non_todo() {
        let note = note();
        let paragraph_id = note.document[0].id;
        let err = note.toggle_todo(paragraph_id).unwrap_err();
        assert!(matches!(
            err,
            NoteError::InvalidOperation { actual: BlockType::Paragraph, .. }
        ));
    }

    #[test]
    fn toggle_flips_checked_and_keeps_content() {
        let (note, todo_id) = note().insert_block_after_with_id(None, BlockType::Todo);
        let note = note.edit_block(todo_id, "eggs");
        let toggled = note.toggle_todo(todo_id).unwrap();

        let block = toggled.block(todo_id).unwrap();
        assert!(block.is_checked());
        assert_eq!(block.content, "eggs");

        let untoggled = toggled.toggle_todo(todo_id).unwrap();
        assert!(!untoggled.block(todo_id).unwrap().is_checked());
    }

    #[test]
    fn indent_block_rejects_paragraph_and_nests_list_items() {
        let note = note();
        let paragraph_id = note.document[0].id;
        assert!(note.indent_block(paragraph_id, 1).is_err());

        let (note, first) = note.insert_block_after_with_id(None, BlockType::ListItem);
        let (note, second) = note.insert_block_after_with_id(Some(first), BlockType::ListItem);
        let nested = note.indent_block(second, 1).unwrap();

        assert_eq!(nested.block(first).unwrap().children[0].id, second);
        assert_eq!(nested.block(second).unwrap().indent(), 1);
    }

    #[test]
    fn indent_without_effect_does_not_bump_timestamp() {
        let (note, first) = note().insert_block_after_with_id(None, BlockType::ListItem);
        let unchanged = note.indent_block(first, -1).unwrap();
        assert_eq!(unchanged, note);
    }

    #[test]
    fn replace_document_rejects_duplicate_ids() {
        let block = Block::default_paragraph();
        let err = note()
            .replace_document(vec![block.clone(), block.clone()])
            .unwrap_err();
        assert_eq!(
            err,
            NoteError::Validation(NoteValidationError::DuplicateBlockId(block.id))
        );
    }

    #[test]
    fn replace_document_rejects_out_of_range_heading() {
        let mut heading = Block::new(BlockType::Heading);
        heading.metadata = Some(crate::model::block::BlockMetadata {
            level: Some(7),
            ..Default::default()
        });
        let err = note().replace_document(vec![heading]).unwrap_err();
        assert!(matches!(
            err,
            NoteError::Validation(NoteValidationError::InvalidHeadingLevel { level: 7, .. })
        ));
    }

    #[test]
    fn replace_document_with_empty_list_reseeds_paragraph() {
        let replaced = note().replace_document(Vec::new()).unwrap();
        assert_eq!(replaced.document.len(), 1);
        assert_eq!(replaced.document[0].kind, BlockType::Paragraph);
    }
}
