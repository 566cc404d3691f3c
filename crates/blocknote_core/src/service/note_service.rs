//! Note use-case service.
//!
//! # Responsibility
//! - Orchestrate load, access check, aggregate mutation and persistence for
//!   every note use-case.
//! - Emit metadata-only diagnostic events (ids, counts, durations).
//!
//! # Invariants
//! - Every read checks `can_read`, every mutation checks `can_write`,
//!   before the aggregate is touched.
//! - Mutations that leave the note unchanged (stale block ids) are not
//!   persisted.
//! - Concurrent writers are last-write-wins at `update_note`.

use crate::model::block::{Block, BlockId, BlockType};
use crate::model::note::{Note, NoteError, NoteId, NoteValidationError, UserId};
use crate::repo::note_repo::{NoteListQuery, NoteRepository, RepoError};
use crate::service::access::{is_allowed, Access};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Service error for note use-cases.
#[derive(Debug)]
pub enum NoteServiceError {
    /// Title or document failed validation.
    Validation(NoteValidationError),
    /// Operation does not apply to the target block's type.
    InvalidOperation {
        block_id: BlockId,
        operation: &'static str,
        actual: BlockType,
    },
    /// Target note does not exist.
    NoteNotFound(NoteId),
    /// Actor lacks the requested access to the note.
    Forbidden {
        actor: UserId,
        note_id: NoteId,
        access: Access,
    },
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for NoteServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::InvalidOperation {
                block_id,
                operation,
                actual,
            } => write!(f, "cannot {operation} block {block_id} of type `{actual}`"),
            Self::NoteNotFound(id) => write!(f, "note not found: {id}"),
            Self::Forbidden {
                actor,
                note_id,
                access,
            } => write!(
                f,
                "user `{actor}` has no {} access to note {note_id}",
                access.as_str()
            ),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for NoteServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for NoteServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NoteNotFound(id),
            other => Self::Repo(other),
        }
    }
}

impl From<NoteError> for NoteServiceError {
    fn from(value: NoteError) -> Self {
        match value {
            NoteError::Validation(err) => Self::Validation(err),
            NoteError::InvalidOperation {
                block_id,
                operation,
                actual,
            } => Self::InvalidOperation {
                block_id,
                operation,
                actual,
            },
        }
    }
}

/// Page of notes returned by list use-cases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotesPage {
    /// Items sorted by `updated_at DESC, id ASC`.
    pub items: Vec<Note>,
    /// Effective normalized limit used by the query.
    pub applied_limit: u32,
}

/// Note service facade over repository implementations.
pub struct NoteService<R: NoteRepository> {
    repo: R,
}

impl<R: NoteRepository> NoteService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Gives back the repository, e.g. to inspect it in tests.
    pub fn into_repo(self) -> R {
        self.repo
    }

    /// Creates a private note owned by `actor`.
    pub fn create_note(&mut self, actor: &str, title: &str) -> Result<Note, NoteServiceError> {
        let note = Note::create(actor, title)?;
        self.repo.create_note(&note)?;
        info!(
            "event=note_create module=service status=ok note_id={} blocks={}",
            note.id,
            note.document.len()
        );
        Ok(note)
    }

    /// Loads one note readable by `actor`.
    pub fn get_note(&self, actor: &str, note_id: NoteId) -> Result<Note, NoteServiceError> {
        self.load(actor, note_id, Access::Read)
    }

    /// Lists notes owned by `actor`.
    pub fn list_own_notes(
        &self,
        actor: &str,
        limit: Option<u32>,
        offset: u32,
    ) -> Result<NotesPage, NoteServiceError> {
        let query = NoteListQuery::new(limit, offset);
        let items = self.repo.list_by_owner(actor, &query)?;
        Ok(NotesPage {
            items,
            applied_limit: query.applied_limit(),
        })
    }

    /// Lists public notes of every owner.
    pub fn list_public_notes(
        &self,
        limit: Option<u32>,
        offset: u32,
    ) -> Result<NotesPage, NoteServiceError> {
        let query = NoteListQuery::new(limit, offset);
        let items = self.repo.list_public(&query)?;
        Ok(NotesPage {
            items,
            applied_limit: query.applied_limit(),
        })
    }

    pub fn rename_note(
        &mut self,
        actor: &str,
        note_id: NoteId,
        title: &str,
    ) -> Result<Note, NoteServiceError> {
        self.mutate(actor, note_id, "rename", |note| note.rename(title))
    }

    pub fn set_visibility(
        &mut self,
        actor: &str,
        note_id: NoteId,
        is_public: bool,
    ) -> Result<Note, NoteServiceError> {
        self.mutate(actor, note_id, "set_visibility", |note| {
            Ok(note.set_visibility(is_public))
        })
    }

    /// Commits new block text, converting heading-syntax paragraphs.
    pub fn edit_block(
        &mut self,
        actor: &str,
        note_id: NoteId,
        block_id: BlockId,
        content: &str,
    ) -> Result<Note, NoteServiceError> {
        self.mutate(actor, note_id, "edit_block", |note| {
            Ok(note.edit_block(block_id, content))
        })
    }

    /// Inserts an empty block and returns the note with the new block id.
    pub fn insert_block_after(
        &mut self,
        actor: &str,
        note_id: NoteId,
        after_id: Option<BlockId>,
        kind: BlockType,
    ) -> Result<(Note, BlockId), NoteServiceError> {
        let mut inserted = None;
        let note = self.mutate(actor, note_id, "insert_block", |note| {
            let (next, block_id) = note.insert_block_after_with_id(after_id, kind);
            inserted = Some(block_id);
            Ok(next)
        })?;
        match inserted {
            Some(block_id) => Ok((note, block_id)),
            None => Err(NoteServiceError::NoteNotFound(note_id)),
        }
    }

    pub fn delete_block(
        &mut self,
        actor: &str,
        note_id: NoteId,
        block_id: BlockId,
    ) -> Result<Note, NoteServiceError> {
        self.mutate(actor, note_id, "delete_block", |note| {
            Ok(note.delete_block(block_id))
        })
    }

    pub fn toggle_todo(
        &mut self,
        actor: &str,
        note_id: NoteId,
        block_id: BlockId,
    ) -> Result<Note, NoteServiceError> {
        self.mutate(actor, note_id, "toggle_todo", |note| note.toggle_todo(block_id))
    }

    pub fn indent_block(
        &mut self,
        actor: &str,
        note_id: NoteId,
        block_id: BlockId,
        delta: i32,
    ) -> Result<Note, NoteServiceError> {
        self.mutate(actor, note_id, "indent_block", |note| {
            note.indent_block(block_id, delta)
        })
    }

    /// Replaces the whole document of a note.
    pub fn replace_document(
        &mut self,
        actor: &str,
        note_id: NoteId,
        document: Vec<Block>,
    ) -> Result<Note, NoteServiceError> {
        self.mutate(actor, note_id, "replace_document", |note| {
            note.replace_document(document)
        })
    }

    /// Hard-deletes a note owned by `actor`.
    pub fn delete_note(&mut self, actor: &str, note_id: NoteId) -> Result<(), NoteServiceError> {
        self.load(actor, note_id, Access::Write)?;
        self.repo.delete_note(note_id)?;
        info!("event=note_delete module=service status=ok note_id={note_id}");
        Ok(())
    }

    fn load(&self, actor: &str, note_id: NoteId, access: Access) -> Result<Note, NoteServiceError> {
        let note = self.repo.get_note(note_id)?;
        if !is_allowed(actor, &note, access) {
            warn!(
                "event=note_access module=service status=denied note_id={} access={}",
                note_id,
                access.as_str()
            );
            return Err(NoteServiceError::Forbidden {
                actor: actor.to_string(),
                note_id,
                access,
            });
        }
        Ok(note)
    }

    fn mutate(
        &mut self,
        actor: &str,
        note_id: NoteId,
        op: &'static str,
        apply: impl FnOnce(&Note) -> Result<Note, NoteError>,
    ) -> Result<Note, NoteServiceError> {
        let started_at = Instant::now();
        let note = self.load(actor, note_id, Access::Write)?;
        let next = match apply(&note) {
            Ok(next) => next,
            Err(err) => {
                warn!(
                    "event=note_mutation module=service status=rejected op={} note_id={} error={}",
                    op, note_id, err
                );
                return Err(err.into());
            }
        };

        if next == note {
            info!(
                "event=note_mutation module=service status=noop op={} note_id={}",
                op, note_id
            );
            return Ok(next);
        }

        self.repo.update_note(&next)?;
        info!(
            "event=note_mutation module=service status=ok op={} note_id={} duration_ms={}",
            op,
            note_id,
            started_at.elapsed().as_millis()
        );
        Ok(next)
    }
}
