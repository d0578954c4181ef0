//! Document mutation use-cases.
//!
//! # Responsibility
//! - Provide tag/untag/link/unlink/new operations on a loaded project.
//! - Validate every input before the single file write each operation makes.
//!
//! # Invariants
//! - Each operation rewrites at most one file, as its last step.
//! - `link` requires both documents to exist; `unlink` only the parent, so
//!   dangling links can be removed.
//! - Document arguments may be base filenames or paths; only the base
//!   filename is used for lookup.

use crate::model::document::{Document, DocumentError, SaveOutcome};
use crate::repo::project::{Project, ProjectError};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Service error for document use-cases.
#[derive(Debug)]
pub enum ServiceError {
    /// No loaded document has this base filename.
    DocumentNotFound(String),
    /// No loaded template has this shortcut.
    TemplateNotFound(String),
    /// Validation or write failure on one document.
    Document(DocumentError),
    /// Project-level failure while creating a document.
    Project(ProjectError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DocumentNotFound(name) => write!(f, "document not found: `{name}`"),
            Self::TemplateNotFound(shortcut) => write!(f, "template not found: `{shortcut}`"),
            Self::Document(err) => write!(f, "{err}"),
            Self::Project(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Document(err) => Some(err),
            Self::Project(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DocumentError> for ServiceError {
    fn from(value: DocumentError) -> Self {
        Self::Document(value)
    }
}

impl From<ProjectError> for ServiceError {
    fn from(value: ProjectError) -> Self {
        match value {
            ProjectError::TemplateNotFound(shortcut) => Self::TemplateNotFound(shortcut),
            ProjectError::Document(err) => Self::Document(err),
            other => Self::Project(other),
        }
    }
}

/// Outcome of one mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationReport {
    /// Base filename of the mutated document.
    pub document: String,
    /// Whether the in-memory set changed.
    pub changed: bool,
    /// Whether the file was rewritten.
    pub saved: bool,
}

/// Document use-case facade over a loaded project.
pub struct DocumentService<'p> {
    project: &'p mut Project,
}

impl<'p> DocumentService<'p> {
    pub fn new(project: &'p mut Project) -> Self {
        Self { project }
    }

    pub fn project(&self) -> &Project {
        &*self.project
    }

    /// Adds a validated tag to one document.
    pub fn tag(&mut self, document: &str, tag: &str) -> ServiceResult<MutationReport> {
        let target = self.document_mut(document)?;
        let changed = target.tag(tag)?;
        persist("tag", target, changed)
    }

    /// Removes a tag from one document.
    pub fn untag(&mut self, document: &str, tag: &str) -> ServiceResult<MutationReport> {
        let target = self.document_mut(document)?;
        let changed = target.untag(tag);
        persist("untag", target, changed)
    }

    /// Adds `child` to `parent`'s children. Both must exist.
    pub fn link(&mut self, parent: &str, child: &str) -> ServiceResult<MutationReport> {
        let child_name = base_of(child);
        if self.project.find_document(&child_name).is_none() {
            return Err(ServiceError::DocumentNotFound(child_name));
        }
        let target = self.document_mut(parent)?;
        let changed = target.add_child(&child_name);
        persist("link", target, changed)
    }

    /// Removes `child` from `parent`'s children. Only the parent must exist.
    pub fn unlink(&mut self, parent: &str, child: &str) -> ServiceResult<MutationReport> {
        let child_name = base_of(child);
        let target = self.document_mut(parent)?;
        let changed = target.remove_child(&child_name);
        persist("unlink", target, changed)
    }

    /// Creates a document from a template. Returns its base filename.
    pub fn new_document(&mut self, shortcut: &str, title: &str) -> ServiceResult<String> {
        let document = self.project.new_document(shortcut, title)?;
        Ok(document.base_filename())
    }

    fn document_mut(&mut self, name: &str) -> ServiceResult<&mut Document> {
        let base = base_of(name);
        self.project
            .find_document_mut(&base)
            .ok_or(ServiceError::DocumentNotFound(base))
    }
}

fn persist(op: &str, document: &mut Document, changed: bool) -> ServiceResult<MutationReport> {
    let saved = if changed {
        document.save()? == SaveOutcome::Written
    } else {
        false
    };
    let name = document.base_filename();
    info!(
        "event=document_{op} module=service status=ok document={name} changed={changed} saved={saved}"
    );
    Ok(MutationReport {
        document: name,
        changed,
        saved,
    })
}

fn base_of(name: &str) -> String {
    Path::new(name.trim())
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.trim().to_string())
}
