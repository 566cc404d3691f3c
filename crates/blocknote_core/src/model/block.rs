//! Block domain model.
//!
//! # Responsibility
//! - Define one node of a note's content tree and its typed metadata.
//! - Provide type-appropriate defaults for absent metadata fields.
//!
//! # Invariants
//! - `id` is stable and unique across the whole owning document tree.
//! - `heading` level is always within `1..=6` once validated.
//! - Empty `children` means "no children" and is omitted on the wire.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for one block inside a note document.
pub type BlockId = Uuid;

/// Default heading level when metadata is absent.
pub const DEFAULT_HEADING_LEVEL: u8 = 1;
/// Deepest supported heading level.
pub const MAX_HEADING_LEVEL: u8 = 6;

/// Closed set of block types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlockType {
    /// Plain body text.
    Paragraph,
    /// Section heading with a `level`.
    Heading,
    /// Checkable item with a `checked` flag.
    Todo,
    /// Unordered list container.
    BulletList,
    /// Ordered list container.
    NumberedList,
    /// One entry of a list.
    ListItem,
}

impl BlockType {
    /// Wire/storage name of this type.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Paragraph => "paragraph",
            Self::Heading => "heading",
            Self::Todo => "todo",
            Self::BulletList => "bullet-list",
            Self::NumberedList => "numbered-list",
            Self::ListItem => "list-item",
        }
    }

    /// Parses a wire name back into a block type.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "paragraph" => Some(Self::Paragraph),
            "heading" => Some(Self::Heading),
            "todo" => Some(Self::Todo),
            "bullet-list" => Some(Self::BulletList),
            "numbered-list" => Some(Self::NumberedList),
            "list-item" => Some(Self::ListItem),
            _ => None,
        }
    }

    /// Whether blocks of this type carry list `indent` metadata.
    pub fn is_list_style(self) -> bool {
        matches!(self, Self::BulletList | Self::NumberedList | Self::ListItem)
    }

    /// Metadata a freshly created block of this type starts with.
    pub fn default_metadata(self) -> Option<BlockMetadata> {
        match self {
            Self::Paragraph => None,
            Self::Heading => Some(BlockMetadata {
                level: Some(DEFAULT_HEADING_LEVEL),
                ..BlockMetadata::default()
            }),
            Self::Todo => Some(BlockMetadata {
                checked: Some(false),
                ..BlockMetadata::default()
            }),
            Self::BulletList | Self::NumberedList | Self::ListItem => Some(BlockMetadata {
                indent: Some(0),
                ..BlockMetadata::default()
            }),
        }
    }
}

impl std::fmt::Display for BlockType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type-specific block attributes.
///
/// Every field is optional; readers go through [`Block`] accessors, which
/// apply the type defaults (`level = 1`, `checked = false`, `indent = 0`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockMetadata {
    /// Heading level, `1..=6`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u8>,
    /// Todo completion flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checked: Option<bool>,
    /// List nesting depth.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indent: Option<u32>,
}

impl BlockMetadata {
    /// Returns a copy where every field set in `patch` overrides `self`.
    pub fn merged(&self, patch: &BlockMetadata) -> BlockMetadata {
        BlockMetadata {
            level: patch.level.or(self.level),
            checked: patch.checked.or(self.checked),
            indent: patch.indent.or(self.indent),
        }
    }

    fn is_empty(&self) -> bool {
        self.level.is_none() && self.checked.is_none() && self.indent.is_none()
    }
}

/// One node of a note document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    /// Serialized as `type` to match the wire schema.
    #[serde(rename = "type")]
    pub kind: BlockType,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BlockMetadata>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Block>,
}

/// Partial update merged into one block by the tree engine.
///
/// `id` and `children` are deliberately absent: neither identity nor
/// topology can change through a patch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockPatch {
    pub kind: Option<BlockType>,
    pub content: Option<String>,
    pub metadata: Option<BlockMetadata>,
}

impl BlockPatch {
    /// Patch that only replaces content.
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    /// Patch that only merges metadata.
    pub fn metadata(metadata: BlockMetadata) -> Self {
        Self {
            metadata: Some(metadata),
            ..Self::default()
        }
    }
}

impl Block {
    /// Creates an empty block of `kind` with a generated id and the type's
    /// default metadata.
    pub fn new(kind: BlockType) -> Self {
        Self::with_id(Uuid::new_v4(), kind, "")
    }

    /// Creates a block with a caller-provided id, e.g. for imports.
    pub fn with_id(id: BlockId, kind: BlockType, content: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            content: content.into(),
            metadata: kind.default_metadata(),
            children: Vec::new(),
        }
    }

    /// Fresh empty paragraph used as the starting cursor target of a note.
    pub fn default_paragraph() -> Self {
        Self::new(BlockType::Paragraph)
    }

    /// Builder-style helper for nested fixtures.
    pub fn with_children(mut self, children: Vec<Block>) -> Self {
        self.children = children;
        self
    }

    /// Heading level, defaulting to 1.
    pub fn heading_level(&self) -> u8 {
        self.metadata
            .as_ref()
            .and_then(|metadata| metadata.level)
            .unwrap_or(DEFAULT_HEADING_LEVEL)
    }

    /// Todo flag, defaulting to `false`.
    pub fn is_checked(&self) -> bool {
        self.metadata
            .as_ref()
            .and_then(|metadata| metadata.checked)
            .unwrap_or(false)
    }

    /// List indent, defaulting to 0.
    pub fn indent(&self) -> u32 {
        self.metadata
            .as_ref()
            .and_then(|metadata| metadata.indent)
            .unwrap_or(0)
    }

    /// Applies `patch` in place. Used by the tree engine on its own copy.
    pub(crate) fn apply(&mut self, patch: &BlockPatch) {
        if let Some(kind) = patch.kind {
            self.kind = kind;
        }
        if let Some(content) = patch.content.as_ref() {
            self.content = content.clone();
        }
        if let Some(metadata) = patch.metadata.as_ref() {
            let merged = match self.metadata.as_ref() {
                Some(current) => current.merged(metadata),
                None => metadata.clone(),
            };
            self.metadata = if merged.is_empty() { None } else { Some(merged) };
        }
    }
}
