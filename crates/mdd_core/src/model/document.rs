//! Document domain model.
//!
//! # Responsibility
//! - Load one document file: filename grammar, template lookup, title and
//!   embedded metadata.
//! - Mutate the child-link and tag sets with validation.
//! - Rewrite only the metadata region on save.
//!
//! # Invariants
//! - A loaded document's base filename always parses as canonical.
//! - `children` and `tags` are sets; mutation is idempotent.
//! - Only the first complete metadata region is read; `save()` never changes
//!   bytes outside it.
//! - Children may name documents that do not exist; only verify flags them.

use crate::model::filename::DocumentFilename;
use crate::model::metadata::{
    self, BlockScanner, LineEvent, MetadataEntry, MetadataLineError,
};
use crate::model::template::{extract_title, Template};
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

static TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_]{3,20}$").expect("valid tag regex"));

pub type DocumentResult<T> = Result<T, DocumentError>;

#[derive(Debug)]
pub enum DocumentError {
    Io { path: PathBuf, source: std::io::Error },
    /// Base filename does not follow `shortcut-hash-sequence.md`.
    FilenameMismatch(String),
    /// No loaded template has the filename's shortcut.
    UnknownTemplate(String),
    /// Tag is not 3-20 characters of `[A-Za-z0-9_]`.
    InvalidTagFormat(String),
}

impl Display for DocumentError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "document io failed for `{}`: {source}", path.display())
            }
            Self::FilenameMismatch(base) => write!(
                f,
                "filename `{base}` does not match `shortcut-hash-sequence.md`"
            ),
            Self::UnknownTemplate(shortcut) => {
                write!(f, "no template for shortcut `{shortcut}`")
            }
            Self::InvalidTagFormat(tag) => write!(
                f,
                "invalid tag `{tag}`: tags must be 3-20 chars of `0-9A-Za-z_`"
            ),
        }
    }
}

impl Error for DocumentError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Result of writing a document back to disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The metadata region was replaced and the file rewritten.
    Written,
    /// The file has no complete metadata region; nothing was written.
    NoMetadataBlock,
}

/// One markdown document instantiated from a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub filename: PathBuf,
    /// Shortcut of the owning template, resolved against the project.
    pub template: String,
    /// First title line of the prose, if any.
    pub title: Option<String>,
    pub children: BTreeSet<String>,
    pub tags: BTreeSet<String>,
    /// Per-line failures recorded while reading the metadata region.
    pub metadata_errors: Vec<MetadataLineError>,
    raw: String,
}

impl Document {
    /// Loads the document at `path`, resolving its template from `templates`.
    ///
    /// Filename and template checks run before any file I/O.
    pub fn load(path: impl AsRef<Path>, templates: &[Template]) -> DocumentResult<Self> {
        let path = path.as_ref();
        let base = base_name(path);
        let parsed = DocumentFilename::parse(&base)
            .ok_or_else(|| DocumentError::FilenameMismatch(base.clone()))?;

        let template = templates
            .iter()
            .find(|t| t.shortcut == parsed.shortcut)
            .ok_or_else(|| DocumentError::UnknownTemplate(parsed.shortcut.clone()))?;

        let raw = std::fs::read_to_string(path).map_err(|source| DocumentError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(Self::from_raw(path, template.shortcut.clone(), raw))
    }

    fn from_raw(path: &Path, template: String, raw: String) -> Self {
        let lines: Vec<&str> = raw.split('\n').map(metadata::strip_terminator).collect();
        let title = extract_title(lines.iter().copied());

        let mut children = BTreeSet::new();
        let mut tags = BTreeSet::new();
        let mut metadata_errors = Vec::new();
        let mut scanner = BlockScanner::new();
        let mut opened = false;
        let mut closed = false;

        for (index, line) in lines.iter().copied().enumerate() {
            let entry_line = match scanner.feed(line) {
                LineEvent::BlockLine(entry_line) => entry_line,
                LineEvent::BlockStart => {
                    opened = true;
                    continue;
                }
                LineEvent::BlockEnd => {
                    closed = true;
                    break;
                }
                LineEvent::Prose => continue,
            };
            match metadata::parse_line(entry_line) {
                Ok(Some(MetadataEntry::Child(child))) => {
                    children.insert(child);
                }
                Ok(Some(MetadataEntry::Tag(tag))) => {
                    tags.insert(tag);
                }
                Ok(None) => {}
                Err(err) => {
                    warn!(
                        "event=metadata_parse module=document status=skip path={} line={} error={}",
                        path.display(),
                        index + 1,
                        err
                    );
                    metadata_errors.push(err);
                }
            }
        }

        // Entries count only when `save` can rewrite the region holding them.
        if opened && !closed {
            warn!(
                "event=metadata_parse module=document status=skip path={} reason=unclosed_block",
                path.display()
            );
            children.clear();
            tags.clear();
        }

        Self {
            filename: path.to_path_buf(),
            template,
            title,
            children,
            tags,
            metadata_errors,
            raw,
        }
    }

    /// Base filename, the key other documents link to.
    pub fn base_filename(&self) -> String {
        base_name(&self.filename)
    }

    /// Parsed filename parts.
    pub fn parsed_filename(&self) -> Option<DocumentFilename> {
        DocumentFilename::parse(&self.base_filename())
    }

    /// Full file text as last read or written.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Adds a validated tag. Returns whether the set changed.
    pub fn tag(&mut self, name: &str) -> DocumentResult<bool> {
        if !is_valid_tag(name) {
            return Err(DocumentError::InvalidTagFormat(name.to_string()));
        }
        Ok(self.tags.insert(name.to_string()))
    }

    /// Removes a tag. Removing a non-member is a no-op.
    pub fn untag(&mut self, name: &str) -> bool {
        self.tags.remove(name)
    }

    /// Adds a child link by base filename. Returns whether the set changed.
    pub fn add_child(&mut self, child_filename: &str) -> bool {
        self.children.insert(child_filename.to_string())
    }

    /// Removes a child link by base filename. Removing a non-member is a no-op.
    pub fn remove_child(&mut self, child_filename: &str) -> bool {
        self.children.remove(child_filename)
    }

    pub fn tag_names(&self) -> Vec<String> {
        self.tags.iter().cloned().collect()
    }

    pub fn child_names(&self) -> Vec<String> {
        self.children.iter().cloned().collect()
    }

    /// Renders the current metadata block with `\n` line separators.
    pub fn metadata_block(&self) -> String {
        metadata::render_block(&self.children, &self.tags, "\n")
    }

    /// Writes the metadata sets back into the first metadata region.
    ///
    /// When the file has no complete region nothing is written and the
    /// in-memory changes are not persisted.
    pub fn save(&mut self) -> DocumentResult<SaveOutcome> {
        let Some(span) = metadata::find_block(&self.raw) else {
            warn!(
                "event=document_save module=document status=skip path={} reason=no_metadata_block",
                self.filename.display()
            );
            return Ok(SaveOutcome::NoMetadataBlock);
        };

        let block = metadata::render_block(&self.children, &self.tags, span.newline());
        let updated = metadata::splice_block(&self.raw, span, &block);
        std::fs::write(&self.filename, updated.as_bytes()).map_err(|source| {
            DocumentError::Io {
                path: self.filename.clone(),
                source,
            }
        })?;

        debug!(
            "event=document_save module=document status=ok path={} children={} tags={}",
            self.filename.display(),
            self.children.len(),
            self.tags.len()
        );
        self.raw = updated;
        Ok(SaveOutcome::Written)
    }
}

/// Returns whether `name` satisfies the tag grammar.
pub fn is_valid_tag(name: &str) -> bool {
    TAG_RE.is_match(name)
}

fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::{is_valid_tag, Document, DocumentError};
    use crate::model::metadata::MetadataLineError;
    use std::path::Path;

    fn doc(raw: &str) -> Document {
        Document::from_raw(Path::new("docs/spec-ab-0001.md"), "spec".into(), raw.into())
    }

    #[test]
    fn tag_grammar_is_ascii_word_3_to_20() {
        assert!(is_valid_tag("abc"));
        assert!(is_valid_tag("Release_2024"));
        assert!(is_valid_tag("a".repeat(20).as_str()));
        assert!(!is_valid_tag("ab"));
        assert!(!is_valid_tag("a".repeat(21).as_str()));
        assert!(!is_valid_tag("has-dash"));
        assert!(!is_valid_tag("has space"));
        assert!(!is_valid_tag("ünïcode"));
    }

    #[test]
    fn parses_title_children_and_tags() {
        let d = doc("# Widget\n\nBody\n<!-- mdd\nchild: spec-ab-0002.md\ntag: draft\ntag: draft\n-->\n");
        assert_eq!(d.title.as_deref(), Some("Widget"));
        assert_eq!(d.child_names(), vec!["spec-ab-0002.md"]);
        assert_eq!(d.tag_names(), vec!["draft"]);
        assert!(d.metadata_errors.is_empty());
    }

    #[test]
    fn bad_metadata_lines_are_skipped_not_fatal() {
        let d = doc("# T\n<!-- mdd\nowner: bob\ntag: kept\nchild a.md\n-->\n");
        assert_eq!(d.tag_names(), vec!["kept"]);
        assert_eq!(d.metadata_errors.len(), 2);
        assert_eq!(
            d.metadata_errors[0],
            MetadataLineError::UnrecognisedKey("owner".into())
        );
    }

    #[test]
    fn document_without_block_has_empty_sets() {
        let d = doc("# Only prose\n\nchild: not-metadata.md\n");
        assert!(d.children.is_empty());
        assert!(d.tags.is_empty());
    }

    #[test]
    fn later_blocks_are_prose() {
        let d = doc("# T\n<!-- mdd\ntag: first\n-->\n<!-- mdd\ntag: second\nbogus line\n-->\n");
        assert_eq!(d.tag_names(), vec!["first"]);
        assert!(d.metadata_errors.is_empty());
    }

    #[test]
    fn unclosed_block_yields_no_entries() {
        let d = doc("# T\n<!-- mdd\ntag: dangling\nchild: spec-ab-0002.md\n");
        assert!(d.tags.is_empty());
        assert!(d.children.is_empty());
    }

    #[test]
    fn mutations_are_idempotent() {
        let mut d = doc("# T\n<!-- mdd\n-->\n");
        assert!(d.tag("alpha").unwrap());
        assert!(!d.tag("alpha").unwrap());
        assert!(d.untag("alpha"));
        assert!(!d.untag("alpha"));
        assert!(d.add_child("spec-ab-0002.md"));
        assert!(!d.add_child("spec-ab-0002.md"));
        assert!(d.remove_child("spec-ab-0002.md"));
        assert!(!d.remove_child("spec-ab-0002.md"));
    }

    #[test]
    fn invalid_tag_leaves_set_unchanged() {
        let mut d = doc("# T\n");
        let err = d.tag("no").unwrap_err();
        assert!(matches!(err, DocumentError::InvalidTagFormat(_)));
        assert!(d.tags.is_empty());
    }

    #[test]
    fn metadata_block_lists_children_then_tags() {
        let mut d = doc("# T\n");
        d.tag("beta").unwrap();
        d.add_child("spec-ab-0003.md");
        assert_eq!(
            d.metadata_block(),
            "<!-- mdd\nchild: spec-ab-0003.md\ntag: beta\n-->"
        );
    }
}
