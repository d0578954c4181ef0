//! Starter template bundles copied into new projects.
//!
//! # Responsibility
//! - Abstract the read-only byte source that seeds `templates/`.
//! - Ship a small builtin bundle compiled into the crate.

use std::io;
use std::path::{Path, PathBuf};

/// One starter template file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateFile {
    /// Base filename written under `templates/`, e.g. `adr.md`.
    pub name: String,
    pub bytes: Vec<u8>,
}

impl TemplateFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

/// Read-only source of starter template files.
pub trait TemplateSource {
    fn files(&self) -> io::Result<Vec<TemplateFile>>;
}

/// Templates bundled into the binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinTemplates;

const BUILTIN: &[(&str, &str)] = &[
    ("adr.md", include_str!("../../templates/adr.md")),
    ("note.md", include_str!("../../templates/note.md")),
    ("req.md", include_str!("../../templates/req.md")),
];

impl TemplateSource for BuiltinTemplates {
    fn files(&self) -> io::Result<Vec<TemplateFile>> {
        Ok(BUILTIN
            .iter()
            .map(|(name, body)| TemplateFile::new(*name, body.as_bytes()))
            .collect())
    }
}

/// Every `*.md` file directly inside a directory.
#[derive(Debug, Clone)]
pub struct DirectoryTemplateSource {
    root: PathBuf,
}

impl DirectoryTemplateSource {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }
}

impl TemplateSource for DirectoryTemplateSource {
    fn files(&self) -> io::Result<Vec<TemplateFile>> {
        let mut files = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            let path = entry.path();
            if !entry.file_type()?.is_file() || !has_markdown_extension(&path) {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            files.push(TemplateFile::new(name, std::fs::read(&path)?));
        }
        files.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(files)
    }
}

impl TemplateSource for Vec<TemplateFile> {
    fn files(&self) -> io::Result<Vec<TemplateFile>> {
        Ok(self.clone())
    }
}

pub(crate) fn has_markdown_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext == crate::model::filename::MARKDOWN_EXTENSION)
}
