//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls and aggregate operations into use-case
//!   level APIs.
//! - Enforce the access policy before any note is read or mutated.

pub mod access;
pub mod note_service;
