//! Note access policy.
//!
//! # Responsibility
//! - Decide whether an acting user may read or modify a note.
//!
//! # Invariants
//! - Only the owner may write.
//! - The owner may always read; anyone may read a public note.

use crate::model::note::Note;

/// Kind of access requested by a use-case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
}

impl Access {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
        }
    }
}

/// Returns whether `actor` may read `note`.
pub fn can_read(actor: &str, note: &Note) -> bool {
    note.owner_id == actor || note.is_public
}

/// Returns whether `actor` may modify or delete `note`.
pub fn can_write(actor: &str, note: &Note) -> bool {
    note.owner_id == actor
}

/// Checks one access kind.
pub fn is_allowed(actor: &str, note: &Note, access: Access) -> bool {
    match access {
        Access::Read => can_read(actor, note),
        Access::Write => can_write(actor, note),
    }
}

#[cfg(test)]
mod tests {
    use super::{can_read, can_write};
    use crate::model::note::Note;

    #[test]
    fn private_note_is_owner_only() {
        let note = Note::create("u1", "private").unwrap();
        assert!(can_read("u1", &note));
        assert!(can_write("u1", &note));
        assert!(!can_read("u2", &note));
        assert!(!can_write("u2", &note));
    }

    #[test]
    fn public_note_is_readable_but_not_writable_by_others() {
        let note = Note::create("u1", "shared").unwrap().set_visibility(true);
        assert!(can_read("u2", &note));
        assert!(!can_write("u2", &note));
    }
}
