//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the note persistence contract consumed by services.
//! - Isolate SQLite query details from use-case orchestration.
//!
//! # Invariants
//! - Repository writes enforce `Note::validate()` before persistence.
//! - Repository APIs return semantic errors (`NotFound`) in addition to
//!   storage transport errors.

pub mod memory_repo;
pub mod note_repo;
