//! Note document domain model.
//!
//! # Responsibility
//! - Define the block tree node and the note aggregate that owns it.
//!
//! # Invariants
//! - Every note and block is identified by a stable UUID.
//! - Block ids are unique across a note's whole document tree.

pub mod block;
pub mod note;
