//! Graph integrity check.
//!
//! Flags every child link that names a document missing from the project.
//! Cycles, orphans and tag validity are not checked.

use crate::repo::project::Project;
use log::{info, warn};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// One dangling child reference.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct IntegrityError {
    pub parent: String,
    pub child: String,
}

impl Display for IntegrityError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "document '{}' links to missing child '{}'",
            self.parent, self.child
        )
    }
}

impl Error for IntegrityError {}

/// Returns one error per dangling child link, ordered by parent then child.
pub fn verify(project: &Project) -> Vec<IntegrityError> {
    let known: HashSet<String> = project
        .documents
        .iter()
        .map(|d| d.base_filename())
        .collect();

    let mut errors: Vec<IntegrityError> = project
        .documents
        .iter()
        .flat_map(|document| {
            let parent = document.base_filename();
            document
                .children
                .iter()
                .filter(|child| !known.contains(child.as_str()))
                .map(move |child| IntegrityError {
                    parent: parent.clone(),
                    child: child.clone(),
                })
                .collect::<Vec<_>>()
        })
        .collect();
    errors.sort();

    for err in &errors {
        warn!(
            "event=verify module=verify status=error parent={} child={}",
            err.parent, err.child
        );
    }
    info!(
        "event=verify module=verify status={} documents={} errors={}",
        if errors.is_empty() { "ok" } else { "error" },
        project.documents.len(),
        errors.len()
    );
    errors
}
