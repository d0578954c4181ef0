//! Project repository: the `.mdd` directory and everything loaded from it.
//!
//! # Responsibility
//! - Discover, create and load projects from the filesystem.
//! - Keep path layout and directory scans inside this boundary.
//!
//! # Invariants
//! - Every command run loads fresh from disk; nothing is cached across runs.
//! - There is no file locking; concurrent runs on one file race.

pub mod project;
pub mod project_info;
pub mod template_source;
