//! File-backed domain model for templates and documents.
//!
//! # Responsibility
//! - Define the in-memory shapes parsed from template and document files.
//! - Own the canonical filename grammar and the embedded metadata format.
//!
//! # Invariants
//! - Documents reference templates by shortcut, never by pointer.
//! - Human prose is opaque; only the metadata region is machine-owned.

pub mod document;
pub mod filename;
pub mod metadata;
pub mod template;
