//! Core domain logic for mdd, a markdown document graph kept in plain files.
//! This crate is the single source of truth for file formats and graph
//! invariants.

pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::document::{is_valid_tag, Document, DocumentError, DocumentResult, SaveOutcome};
pub use model::filename::{current_user_name, user_hash_fragment, DocumentFilename};
pub use model::metadata::{BlockScanner, BlockState, LineEvent, MetadataEntry, MetadataLineError};
pub use model::template::{Template, TemplateError, TemplateResult};
pub use repo::project::{find_root, Project, ProjectError, ProjectResult, ROOT_DIRECTORY};
pub use repo::project_info::ProjectInfo;
pub use repo::template_source::{
    BuiltinTemplates, DirectoryTemplateSource, TemplateFile, TemplateSource,
};
pub use service::document_service::{
    DocumentService, MutationReport, ServiceError, ServiceResult,
};
pub use service::verify::{verify, IntegrityError};
pub use service::views::{list_documents, DocumentView, PublishIndex, TemplateView};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
