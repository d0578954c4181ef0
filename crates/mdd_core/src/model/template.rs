//! Template domain model.
//!
//! # Responsibility
//! - Load one shortcut template file from disk.
//! - Own the title-line rule shared with documents.
//!
//! # Invariants
//! - `shortcut` is the base filename minus its extension and is never empty.
//! - A template without a title line is a load error.

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

static TITLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[# ]*([\w\-.~][\w\-. ~]*?) *$").expect("valid title regex")
});
static SHORTCUT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[[:word:]]+$").expect("valid shortcut regex"));

pub type TemplateResult<T> = Result<T, TemplateError>;

#[derive(Debug)]
pub enum TemplateError {
    Io { path: PathBuf, source: std::io::Error },
    /// File stem is empty or not made of `[A-Za-z0-9_]`.
    InvalidShortcut(PathBuf),
    /// No line matched the title rule.
    MissingTitle(PathBuf),
}

impl Display for TemplateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read template `{}`: {source}", path.display())
            }
            Self::InvalidShortcut(path) => {
                write!(f, "template `{}` has no usable shortcut", path.display())
            }
            Self::MissingTitle(path) => {
                write!(f, "template `{}` is missing a title", path.display())
            }
        }
    }
}

impl Error for TemplateError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// A seed markdown file defining one document type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pub filename: PathBuf,
    pub shortcut: String,
    pub title: String,
    /// Body lines, used verbatim when instantiating documents.
    pub contents: Vec<String>,
}

impl Template {
    /// Reads and parses the template at `path`.
    pub fn load(path: impl AsRef<Path>) -> TemplateResult<Self> {
        let path = path.as_ref();
        let shortcut = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .filter(|stem| SHORTCUT_RE.is_match(stem))
            .ok_or_else(|| TemplateError::InvalidShortcut(path.to_path_buf()))?
            .to_string();

        let text = std::fs::read_to_string(path).map_err(|source| TemplateError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_text(path, shortcut, &text)
    }

    fn from_text(path: &Path, shortcut: String, text: &str) -> TemplateResult<Self> {
        let contents = split_contents(text);
        let title = extract_title(contents.iter().map(String::as_str))
            .ok_or_else(|| TemplateError::MissingTitle(path.to_path_buf()))?;

        Ok(Self {
            filename: path.to_path_buf(),
            shortcut,
            title,
            contents,
        })
    }

    /// Base filename, e.g. `spec.md`.
    pub fn base_filename(&self) -> String {
        self.filename
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Returns the title captured from `line`, if the line is a title line.
pub fn title_of(line: &str) -> Option<&str> {
    TITLE_RE
        .captures(line.strip_suffix('\r').unwrap_or(line))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// First title line wins; later matches are ignored.
pub fn extract_title<'a>(lines: impl IntoIterator<Item = &'a str>) -> Option<String> {
    lines.into_iter().find_map(title_of).map(str::to_string)
}

/// Splits on `\n`, dropping the empty segment produced by a final newline.
pub fn split_contents(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    let body = text.strip_suffix('\n').unwrap_or(text);
    body.split('\n').map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::{extract_title, split_contents, title_of, Template, TemplateError};
    use std::path::Path;

    #[test]
    fn title_strips_hashes_and_trailing_spaces() {
        assert_eq!(title_of("# Spec Template"), Some("Spec Template"));
        assert_eq!(title_of("### v1.2 ~ draft   "), Some("v1.2 ~ draft"));
        assert_eq!(title_of("Plain-line"), Some("Plain-line"));
    }

    #[test]
    fn title_rejects_blank_and_punctuated_lines() {
        assert_eq!(title_of(""), None);
        assert_eq!(title_of("   "), None);
        assert_eq!(title_of("#"), None);
        assert_eq!(title_of("Why? Because."), None);
        assert_eq!(title_of("<!-- mdd"), None);
    }

    #[test]
    fn first_title_line_wins() {
        let lines = ["", "<!-- mdd", "-->", "# First", "# Second"];
        assert_eq!(extract_title(lines), Some("First".to_string()));
    }

    #[test]
    fn split_contents_round_trips_final_newline() {
        assert_eq!(split_contents("a\nb\n"), vec!["a", "b"]);
        assert_eq!(split_contents("a\nb"), vec!["a", "b"]);
        assert_eq!(split_contents("a\n\n"), vec!["a", ""]);
        assert_eq!(split_contents("\n"), vec![""]);
        assert!(split_contents("").is_empty());
    }

    #[test]
    fn load_rejects_unsafe_shortcut() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("my-type.md");
        std::fs::write(&path, "# Title\n").unwrap();
        let err = Template::load(&path).unwrap_err();
        assert!(matches!(err, TemplateError::InvalidShortcut(_)));
    }

    #[test]
    fn from_text_requires_title() {
        let err = Template::from_text(Path::new("t/empty.md"), "empty".into(), "!!!\n\n")
            .unwrap_err();
        assert!(matches!(err, TemplateError::MissingTitle(_)));
    }
}
