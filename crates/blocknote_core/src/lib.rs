//! Core domain logic for BlockNote.
//! This crate is the single source of truth for note document invariants.

pub mod db;
pub mod document;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use document::classifier::{classify, ClassifiedBlock};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::block::{Block, BlockId, BlockMetadata, BlockPatch, BlockType};
pub use model::note::{Note, NoteError, NoteId, NoteValidationError, UserId, MAX_TITLE_CHARS};
pub use repo::memory_repo::MemoryNoteRepository;
pub use repo::note_repo::{
    normalize_note_limit, NoteListQuery, NoteRepository, RepoError, RepoResult,
    SqliteNoteRepository,
};
pub use service::access::{can_read, can_write, Access};
pub use service::note_service::{NoteService, NoteServiceError, NotesPage};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
