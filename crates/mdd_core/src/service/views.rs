//! Read-only projections consumed by list and publish collaborators.
//!
//! Views are plain serializable records; nothing here writes to disk.

use crate::model::document::Document;
use crate::model::template::Template;
use crate::repo::project::Project;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateView {
    pub shortcut: String,
    pub title: String,
    pub filename: String,
}

impl TemplateView {
    pub fn from_template(template: &Template) -> Self {
        Self {
            shortcut: template.shortcut.clone(),
            title: template.title.clone(),
            filename: template.base_filename(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentView {
    pub filename: String,
    /// Empty when the document has no title line.
    pub title: String,
    pub tags: Vec<String>,
    pub children: Vec<String>,
    /// `None` only when the template was removed after load.
    pub template_filename: Option<String>,
    pub template_title: Option<String>,
}

impl DocumentView {
    pub fn from_document(project: &Project, document: &Document) -> Self {
        let template = project.template_for(document);
        Self {
            filename: document.base_filename(),
            title: document.title.clone().unwrap_or_default(),
            tags: document.tag_names(),
            children: document.child_names(),
            template_filename: template.map(Template::base_filename),
            template_title: template.map(|t| t.title.clone()),
        }
    }
}

/// Everything a site renderer needs, grouped for index pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishIndex {
    pub templates: Vec<TemplateView>,
    pub documents: Vec<DocumentView>,
    /// Tag to document filenames carrying it.
    pub tags: BTreeMap<String, Vec<String>>,
    /// Template shortcut to document filenames created from it.
    pub by_template: BTreeMap<String, Vec<String>>,
}

impl PublishIndex {
    pub fn build(project: &Project) -> Self {
        let templates = project
            .templates
            .iter()
            .map(TemplateView::from_template)
            .collect();
        let documents = list_documents(project, None);

        let mut tags: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let mut by_template: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for document in &project.documents {
            let name = document.base_filename();
            for tag in &document.tags {
                tags.entry(tag.clone()).or_default().push(name.clone());
            }
            by_template
                .entry(document.template.clone())
                .or_default()
                .push(name);
        }
        for names in tags.values_mut().chain(by_template.values_mut()) {
            names.sort();
        }

        Self {
            templates,
            documents,
            tags,
            by_template,
        }
    }
}

/// Lists documents sorted by filename, optionally only those with `tag`.
pub fn list_documents(project: &Project, tag: Option<&str>) -> Vec<DocumentView> {
    let mut views: Vec<DocumentView> = project
        .documents
        .iter()
        .filter(|d| tag.map_or(true, |t| d.tags.contains(t)))
        .map(|d| DocumentView::from_document(project, d))
        .collect();
    views.sort_by(|a, b| a.filename.cmp(&b.filename));
    views
}
