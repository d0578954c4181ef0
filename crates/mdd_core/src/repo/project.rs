//! On-disk project: layout, discovery, loading and document creation.
//!
//! # Responsibility
//! - Locate the `.mdd` root and compute its directory roles.
//! - Load every template and document into memory, strictly or tolerantly.
//! - Create new projects and new documents.
//! - Compute the next collision-resistant document filename.
//!
//! # Invariants
//! - Template and document enumeration is non-recursive.
//! - The sequence counter is shared by all templates in a project.
//! - Tolerant loads never drop a file without logging it.
//! - A new document always contains a metadata block.
//!
//! # See also
//! - repo::project_info for the `project.data` format.

use crate::model::document::{Document, DocumentError};
use crate::model::filename::{
    current_user_name, user_hash_fragment, DocumentFilename, MAX_SEQUENCE,
};
use crate::model::metadata::{self, METADATA_END, METADATA_START};
use crate::model::template::{title_of, Template, TemplateError};
use crate::repo::project_info::ProjectInfo;
use crate::repo::template_source::{has_markdown_extension, TemplateSource};
use log::{debug, error, info, warn};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Hidden directory marking the top of a project.
pub const ROOT_DIRECTORY: &str = ".mdd";
/// Key/value project info file inside the root.
pub const PROJECT_DB_FILE: &str = "project.data";
pub const TEMPLATE_DIR: &str = "templates";
pub const DOCUMENT_DIR: &str = "documents";
pub const PUBLISH_DIR: &str = "publish";

pub type ProjectResult<T> = Result<T, ProjectError>;

#[derive(Debug)]
pub enum ProjectError {
    Io { path: PathBuf, source: io::Error },
    /// No `.mdd` directory below, at, or above the start directory.
    NotFound(PathBuf),
    /// Parent directory for a new project does not exist.
    NoSuchDirectory(PathBuf),
    /// Parent path for a new project is not a directory.
    NotADirectory(PathBuf),
    /// Project root or document file already exists.
    AlreadyExists(PathBuf),
    /// No loaded template has this shortcut.
    TemplateNotFound(String),
    /// The highest sequence in `documents/` leaves no canonical successor.
    SequenceExhausted(u64),
    Template(TemplateError),
    Document(DocumentError),
}

impl Display for ProjectError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "io failed for `{}`: {source}", path.display()),
            Self::NotFound(start) => write!(
                f,
                "no project found from `{}` (looked for `{ROOT_DIRECTORY}`)",
                start.display()
            ),
            Self::NoSuchDirectory(path) => write!(f, "no such directory `{}`", path.display()),
            Self::NotADirectory(path) => {
                write!(f, "expected a directory, not a file: `{}`", path.display())
            }
            Self::AlreadyExists(path) => write!(f, "`{}` already exists", path.display()),
            Self::TemplateNotFound(shortcut) => write!(f, "template not found: `{shortcut}`"),
            Self::SequenceExhausted(max) => {
                write!(f, "document sequence exhausted: `{max}` is the largest allowed")
            }
            Self::Template(err) => write!(f, "{err}"),
            Self::Document(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ProjectError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Template(err) => Some(err),
            Self::Document(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TemplateError> for ProjectError {
    fn from(value: TemplateError) -> Self {
        Self::Template(value)
    }
}

impl From<DocumentError> for ProjectError {
    fn from(value: DocumentError) -> Self {
        Self::Document(value)
    }
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> ProjectError + '_ {
    move |source| ProjectError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// A loaded mdd project.
#[derive(Debug, Clone)]
pub struct Project {
    pub home_path: PathBuf,
    pub template_path: PathBuf,
    pub document_path: PathBuf,
    pub publish_path: PathBuf,
    pub templates: Vec<Template>,
    pub documents: Vec<Document>,
}

impl Project {
    fn with_home(home_path: impl Into<PathBuf>) -> Self {
        let home_path = home_path.into();
        Self {
            template_path: home_path.join(TEMPLATE_DIR),
            document_path: home_path.join(DOCUMENT_DIR),
            publish_path: home_path.join(PUBLISH_DIR),
            home_path,
            templates: Vec::new(),
            documents: Vec::new(),
        }
    }

    /// Discovers and loads the project for the current working directory.
    pub fn discover(tolerant: bool) -> ProjectResult<Self> {
        let cwd = std::env::current_dir().map_err(io_error(Path::new(".")))?;
        Self::discover_from(cwd, tolerant)
    }

    /// Discovers and loads the project reachable from `start`.
    pub fn discover_from(start: impl AsRef<Path>, tolerant: bool) -> ProjectResult<Self> {
        let start = start.as_ref();
        let home = find_root(start).ok_or_else(|| ProjectError::NotFound(start.to_path_buf()))?;
        debug!(
            "event=project_discover module=project status=ok start={} home={}",
            start.display(),
            home.display()
        );
        Self::load(home, tolerant)
    }

    /// Loads all templates and documents under `home_path`.
    ///
    /// In tolerant mode a broken file is logged and skipped; otherwise the
    /// first failure aborts the load.
    pub fn load(home_path: impl Into<PathBuf>, tolerant: bool) -> ProjectResult<Self> {
        let mut project = Self::with_home(home_path);
        let mut skipped = 0usize;

        for path in list_files(&project.template_path, true)? {
            match Template::load(&path) {
                Ok(template) => project.templates.push(template),
                Err(err) if tolerant => {
                    warn!(
                        "event=template_load module=project status=skip path={} error={}",
                        path.display(),
                        err
                    );
                    skipped += 1;
                }
                Err(err) => return Err(err.into()),
            }
        }

        for path in list_files(&project.document_path, false)? {
            match Document::load(&path, &project.templates) {
                Ok(document) => project.documents.push(document),
                Err(err) if tolerant => {
                    warn!(
                        "event=document_load module=project status=skip path={} error={}",
                        path.display(),
                        err
                    );
                    skipped += 1;
                }
                Err(err) => return Err(err.into()),
            }
        }

        info!(
            "event=project_load module=project status=ok home={} templates={} documents={} skipped={} tolerant={}",
            project.home_path.display(),
            project.templates.len(),
            project.documents.len(),
            skipped,
            tolerant
        );
        Ok(project)
    }

    /// Loads strictly, falling back to a tolerant load on failure.
    ///
    /// Returns the loaded project and the strict-mode error, if any.
    pub fn load_with_fallback(
        home_path: impl Into<PathBuf>,
    ) -> ProjectResult<(Self, Option<ProjectError>)> {
        let home_path = home_path.into();
        match Self::load(&home_path, false) {
            Ok(project) => Ok((project, None)),
            Err(strict_err) => {
                error!(
                    "event=project_load module=project status=error mode=strict home={} error={}",
                    home_path.display(),
                    strict_err
                );
                let project = Self::load(&home_path, true)?;
                Ok((project, Some(strict_err)))
            }
        }
    }

    /// Creates a new project under `parent_dir` and loads it.
    ///
    /// Refuses to touch an existing `.mdd` directory.
    pub fn create(
        parent_dir: impl AsRef<Path>,
        name: &str,
        source: &dyn TemplateSource,
    ) -> ProjectResult<Self> {
        let parent_dir = parent_dir.as_ref();
        let metadata = match std::fs::metadata(parent_dir) {
            Ok(metadata) => metadata,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(ProjectError::NoSuchDirectory(parent_dir.to_path_buf()));
            }
            Err(err) => return Err(io_error(parent_dir)(err)),
        };
        if !metadata.is_dir() {
            return Err(ProjectError::NotADirectory(parent_dir.to_path_buf()));
        }

        let project = Self::with_home(parent_dir.join(ROOT_DIRECTORY));
        if project.home_path.exists() {
            return Err(ProjectError::AlreadyExists(project.home_path.clone()));
        }

        info!(
            "event=project_create module=project status=start home={} name={}",
            project.home_path.display(),
            name
        );
        for dir in [
            &project.home_path,
            &project.template_path,
            &project.document_path,
            &project.publish_path,
        ] {
            std::fs::create_dir_all(dir).map_err(io_error(dir))?;
        }

        let info_path = project.home_path.join(PROJECT_DB_FILE);
        ProjectInfo::named(name)
            .write(&info_path)
            .map_err(io_error(&info_path))?;

        let files = source
            .files()
            .map_err(io_error(&project.template_path))?;
        for file in &files {
            let target = project.template_path.join(&file.name);
            std::fs::write(&target, &file.bytes).map_err(io_error(&target))?;
            debug!(
                "event=template_copy module=project status=ok path={}",
                target.display()
            );
        }

        info!(
            "event=project_create module=project status=ok home={} templates={}",
            project.home_path.display(),
            files.len()
        );
        Self::load(project.home_path, false)
    }

    /// Reads `project.data`.
    pub fn info(&self) -> ProjectResult<ProjectInfo> {
        let path = self.home_path.join(PROJECT_DB_FILE);
        ProjectInfo::read(&path).map_err(io_error(&path))
    }

    /// Looks up a document by exact base filename.
    pub fn find_document(&self, base_filename: &str) -> Option<&Document> {
        self.documents
            .iter()
            .find(|d| d.base_filename() == base_filename)
    }

    pub fn find_document_mut(&mut self, base_filename: &str) -> Option<&mut Document> {
        self.documents
            .iter_mut()
            .find(|d| d.base_filename() == base_filename)
    }

    pub fn find_template(&self, shortcut: &str) -> Option<&Template> {
        self.templates.iter().find(|t| t.shortcut == shortcut)
    }

    /// Resolves a document's template back-reference.
    pub fn template_for(&self, document: &Document) -> Option<&Template> {
        self.find_template(&document.template)
    }

    /// Union of every document's tags.
    pub fn tags(&self) -> BTreeSet<String> {
        self.documents
            .iter()
            .flat_map(|d| d.tags.iter().cloned())
            .collect()
    }

    /// Highest sequence number among canonical files in `documents/`.
    ///
    /// Subdirectories are skipped, not descended into.
    pub fn max_sequence(&self) -> ProjectResult<u64> {
        let mut max = 0;
        let entries =
            std::fs::read_dir(&self.document_path).map_err(io_error(&self.document_path))?;
        for entry in entries {
            let entry = entry.map_err(io_error(&self.document_path))?;
            if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                debug!(
                    "event=sequence_scan module=project status=skip path={}",
                    entry.path().display()
                );
                continue;
            }
            let name = entry.file_name();
            if let Some(parsed) = DocumentFilename::parse(&name.to_string_lossy()) {
                max = max.max(parsed.sequence);
            }
        }
        Ok(max)
    }

    /// Next free document base filename for `shortcut` and the current user.
    pub fn next_filename(&self, shortcut: &str) -> ProjectResult<String> {
        self.next_filename_for_user(shortcut, &current_user_name())
    }

    /// Next free document base filename for `shortcut` and `user`.
    ///
    /// # Errors
    /// Returns `SequenceExhausted` when the successor would not fit the grammar.
    ///
    /// # Panics
    /// Panics when the computed name already exists, which means the scan
    /// itself is broken.
    pub fn next_filename_for_user(&self, shortcut: &str, user: &str) -> ProjectResult<String> {
        let max = self.max_sequence()?;
        let sequence = max
            .checked_add(1)
            .filter(|next| *next <= MAX_SEQUENCE)
            .ok_or(ProjectError::SequenceExhausted(max))?;
        let name = DocumentFilename::compose(shortcut, user_hash_fragment(user), sequence).to_string();
        let path = self.document_path.join(&name);
        if path.exists() {
            panic!(
                "generated filename `{}` already exists",
                path.display()
            );
        }
        Ok(name)
    }

    /// Creates a document from the template `shortcut` and adds it to the project.
    ///
    /// A non-empty `title` replaces the first title line of the template.
    pub fn new_document(&mut self, shortcut: &str, title: &str) -> ProjectResult<&Document> {
        let template = self
            .find_template(shortcut)
            .ok_or_else(|| ProjectError::TemplateNotFound(shortcut.to_string()))?;
        let body = instantiate(&template.contents, title);
        let base = self.next_filename(shortcut)?;
        let path = self.document_path.join(&base);

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|source| match source.kind() {
                io::ErrorKind::AlreadyExists => ProjectError::AlreadyExists(path.clone()),
                _ => io_error(&path)(source),
            })?;
        file.write_all(body.as_bytes()).map_err(io_error(&path))?;
        drop(file);

        let document = Document::load(&path, &self.templates)?;
        info!(
            "event=document_create module=project status=ok path={} template={}",
            path.display(),
            shortcut
        );
        self.documents.push(document);
        Ok(&self.documents[self.documents.len() - 1])
    }

    /// Removes every entry inside `publish/`. Returns the number removed.
    pub fn clear_published(&self) -> ProjectResult<usize> {
        let mut removed = 0;
        let entries =
            std::fs::read_dir(&self.publish_path).map_err(io_error(&self.publish_path))?;
        for entry in entries {
            let entry = entry.map_err(io_error(&self.publish_path))?;
            let path = entry.path();
            let is_dir = entry.file_type().map_err(io_error(&path))?.is_dir();
            if is_dir {
                std::fs::remove_dir_all(&path).map_err(io_error(&path))?;
            } else {
                std::fs::remove_file(&path).map_err(io_error(&path))?;
            }
            removed += 1;
        }
        Ok(removed)
    }
}

/// Finds the project root reachable from `start`.
///
/// Checks `start/.mdd`, then walks below `start` in file-name order, then
/// checks each ancestor of `start`.
pub fn find_root(start: &Path) -> Option<PathBuf> {
    let direct = start.join(ROOT_DIRECTORY);
    if direct.is_dir() {
        return Some(direct);
    }

    let walker = WalkDir::new(start)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                debug!("event=project_discover module=project status=skip error={err}");
                None
            }
        });
    for entry in walker {
        if entry.file_type().is_dir() && entry.file_name() == ROOT_DIRECTORY {
            return Some(entry.into_path());
        }
    }

    start
        .ancestors()
        .skip(1)
        .map(|dir| dir.join(ROOT_DIRECTORY))
        .find(|candidate| candidate.is_dir())
}

/// Renders a new document body from template lines.
///
/// Appends an empty metadata block when the template has none.
pub fn instantiate(contents: &[String], title: &str) -> String {
    let title = title.trim();
    let mut replaced = title.is_empty();
    let mut out = String::new();

    for line in contents {
        if !replaced && title_of(line).is_some() {
            out.push_str("# ");
            out.push_str(title);
            replaced = true;
        } else {
            out.push_str(line);
        }
        out.push('\n');
    }

    if metadata::find_block(&out).is_none() {
        if !out.is_empty() && !out.ends_with("\n\n") {
            out.push('\n');
        }
        out.push_str(METADATA_START);
        out.push('\n');
        out.push_str(METADATA_END);
        out.push('\n');
    }
    out
}

fn list_files(dir: &Path, markdown_only: bool) -> ProjectResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_error(dir))? {
        let entry = entry.map_err(io_error(dir))?;
        let path = entry.path();
        if !entry.file_type().map_err(io_error(&path))?.is_file() {
            continue;
        }
        if markdown_only && !has_markdown_extension(&path) {
            continue;
        }
        files.push(path);
    }
    files.sort();
    Ok(files)
}
