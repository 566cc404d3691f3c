//! In-process note repository.
//!
//! # Responsibility
//! - Provide a `NoteRepository` that owns its store, for tests and embedders
//!   that do not need durable storage.
//!
//! # Invariants
//! - Same contract as the SQLite implementation: validation on write,
//!   `NotFound` on misses, `updated_at DESC, id ASC` ordering, capped pages.

use crate::model::note::{Note, NoteId};
use crate::repo::note_repo::{NoteListQuery, NoteRepository, RepoError, RepoResult};
use std::collections::BTreeMap;

/// Note repository backed by an owned ordered map.
#[derive(Debug, Default)]
pub struct MemoryNoteRepository {
    notes: BTreeMap<NoteId, Note>,
}

impl MemoryNoteRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored notes.
    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    fn page(&self, filter: impl Fn(&Note) -> bool, query: &NoteListQuery) -> Vec<Note> {
        let mut matched: Vec<&Note> = self.notes.values().filter(|note| filter(*note)).collect();
        // Uuid byte order matches the hyphenated text order used by SQLite.
        matched.sort_by(|left, right| {
            right
                .updated_at
                .cmp(&left.updated_at)
                .then_with(|| left.id.cmp(&right.id))
        });
        matched
            .into_iter()
            .skip(query.offset as usize)
            .take(query.applied_limit() as usize)
            .cloned()
            .collect()
    }
}

impl NoteRepository for MemoryNoteRepository {
    fn create_note(&mut self, note: &Note) -> RepoResult<NoteId> {
        note.validate()?;
        if self.notes.contains_key(&note.id) {
            return Err(RepoError::InvalidData(format!(
                "note id already exists: {}",
                note.id
            )));
        }
        self.notes.insert(note.id, note.clone());
        Ok(note.id)
    }

    fn get_note(&self, id: NoteId) -> RepoResult<Note> {
        self.notes.get(&id).cloned().ok_or(RepoError::NotFound(id))
    }

    fn list_by_owner(&self, owner_id: &str, query: &NoteListQuery) -> RepoResult<Vec<Note>> {
        Ok(self.page(|note| note.owner_id == owner_id, query))
    }

    fn list_public(&self, query: &NoteListQuery) -> RepoResult<Vec<Note>> {
        Ok(self.page(|note| note.is_public, query))
    }

    fn update_note(&mut self, note: &Note) -> RepoResult<()> {
        note.validate()?;
        let stored = self
            .notes
            .get_mut(&note.id)
            .ok_or(RepoError::NotFound(note.id))?;
        // Identity, owner and creation time stay as first persisted.
        stored.title = note.title.clone();
        stored.document = note.document.clone();
        stored.is_public = note.is_public;
        stored.updated_at = note.updated_at;
        Ok(())
    }

    fn delete_note(&mut self, id: NoteId) -> RepoResult<()> {
        self.notes
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::MemoryNoteRepository;
    use crate::model::note::Note;
    use crate::repo::note_repo::{NoteListQuery, NoteRepository, RepoError};

    #[test]
    fn get_missing_note_is_not_found() {
        let repo = MemoryNoteRepository::new();
        let id = uuid::Uuid::new_v4();
        assert!(matches!(repo.get_note(id), Err(RepoError::NotFound(missing)) if missing == id));
    }

    #[test]
    fn list_orders_by_most_recent_update() {
        let mut repo = MemoryNoteRepository::new();
        let older = Note::create("u1", "older").unwrap();
        let newer = older.rename("newer").unwrap();
        let mut other = Note::create("u1", "other").unwrap();
        other.updated_at = older.updated_at - 10;

        repo.create_note(&older).unwrap();
        repo.create_note(&other).unwrap();
        repo.update_note(&newer).unwrap();

        let listed = repo.list_by_owner("u1", &NoteListQuery::default()).unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].title, "newer");
        assert_eq!(listed[1].id, other.id);
    }

    #[test]
    fn list_caps_page_size_and_applies_offset() {
        let mut repo = MemoryNoteRepository::new();
        for idx in 0..60 {
            let note = Note::create("u1", &format!("note {idx}")).unwrap();
            repo.create_note(&note).unwrap();
        }

        let capped = repo
            .list_by_owner("u1", &NoteListQuery::new(Some(500), 0))
            .unwrap();
        assert_eq!(capped.len(), 50);

        let tail = repo
            .list_by_owner("u1", &NoteListQuery::new(Some(10), 55))
            .unwrap();
        assert_eq!(tail.len(), 5);

        let second_page = repo
            .list_by_owner("u1", &NoteListQuery::new(Some(10), 50))
            .unwrap();
        assert_eq!(second_page.len(), 10);
        assert!(second_page.iter().all(|note| !capped.contains(note)));
        assert_eq!(tail, second_page[5..].to_vec());
    }

    #[test]
    fn update_keeps_original_owner_and_created_at() {
        let mut repo = MemoryNoteRepository::new();
        let note = Note::create("u1", "mine").unwrap();
        repo.create_note(&note).unwrap();

        let mut forged = note.rename("changed").unwrap();
        forged.owner_id = "intruder".to_string();
        forged.created_at = 0;
        repo.update_note(&forged).unwrap();

        let stored = repo.get_note(note.id).unwrap();
        assert_eq!(stored.owner_id, "u1");
        assert_eq!(stored.created_at, note.created_at);
        assert_eq!(stored.title, "changed");
    }

    #[test]
    fn delete_twice_reports_not_found() {
        let mut repo = MemoryNoteRepository::new();
        let note = Note::create("u1", "gone").unwrap();
        repo.create_note(&note).unwrap();
        repo.delete_note(note.id).unwrap();
        assert!(repo.is_empty());
        assert!(matches!(
            repo.delete_note(note.id),
            Err(RepoError::NotFound(_))
        ));
    }
}
