//! `project.data` key/value file.
//!
//! # Invariants
//! - The file starts with a `#` comment header and then `key: value` lines.
//! - A missing file reads as an empty map.
//! - Unparseable lines are logged and skipped.

use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::io;
use std::path::Path;

/// Key holding the project name.
pub const KEY_PROJECT: &str = "project";

const HEADER: &str = "# mdd project db file. Do not edit";

static ENTRY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*([\w-]+)\s*:\s*(.*?)\s*$").expect("valid project entry regex"));

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectInfo {
    entries: BTreeMap<String, String>,
}

impl ProjectInfo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates project info holding only the project name.
    pub fn named(name: impl Into<String>) -> Self {
        let mut info = Self::new();
        info.set(KEY_PROJECT, name);
        info
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn name(&self) -> Option<&str> {
        self.get(KEY_PROJECT)
    }

    pub fn entries(&self) -> &BTreeMap<String, String> {
        &self.entries
    }

    /// Reads `path`; a missing file yields an empty map.
    pub fn read(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Self::new()),
            Err(err) => return Err(err),
        };
        Ok(Self::parse(path, &text))
    }

    fn parse(path: &Path, text: &str) -> Self {
        let mut info = Self::new();
        for (index, line) in text.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            match ENTRY_RE.captures(line) {
                Some(caps) => info.set(&caps[1], &caps[2]),
                None => warn!(
                    "event=project_info_parse module=project status=skip path={} line={}",
                    path.display(),
                    index + 1
                ),
            }
        }
        info
    }

    /// Writes the header and all entries, sorted by key.
    pub fn write(&self, path: impl AsRef<Path>) -> io::Result<()> {
        let mut out = String::from(HEADER);
        out.push('\n');
        for (key, value) in &self.entries {
            out.push_str(&format!("{key}: {value}\n"));
        }
        std::fs::write(path, out)
    }
}
