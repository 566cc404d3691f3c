//! Pure algorithms over note documents.
//!
//! # Responsibility
//! - Classify committed text into block type conversions.
//! - Locate and rewrite blocks anywhere in a nested block tree.
//!
//! # Invariants
//! - Nothing here performs I/O or mutates its input.

pub mod classifier;
pub mod tree;
