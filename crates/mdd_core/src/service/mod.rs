//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate load -> mutate -> write flows over a loaded project.
//! - Keep CLI and renderer layers decoupled from file layout details.

pub mod document_service;
pub mod verify;
pub mod views;
