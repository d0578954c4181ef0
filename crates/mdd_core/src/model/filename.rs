//! Canonical document filename scheme.
//!
//! # Responsibility
//! - Parse and format `<shortcut>-<hash>-<sequence>.md` base filenames.
//! - Derive the per-user hash fragment that separates concurrent authors.
//!
//! # Invariants
//! - A canonical filename always parses to exactly three groups.
//! - Sequences are zero-padded to at least four digits when formatted.
//! - The hash fragment is always two lowercase hex characters.

use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};
use std::fmt::{Display, Formatter};

/// Extension shared by templates and documents.
pub const MARKDOWN_EXTENSION: &str = "md";
/// Login name used when the current user cannot be resolved.
pub const FALLBACK_USER_NAME: &str = "unknown";

const SEQUENCE_WIDTH: usize = 4;

/// Largest sequence the filename grammar admits (19 digits, fits in `u64`).
pub const MAX_SEQUENCE: u64 = 9_999_999_999_999_999_999;

static FILENAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([[:word:]]+)-([[:word:]]+)-([0-9]{1,19})\.md$").expect("valid filename regex")
});

/// Parsed form of a canonical document base filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentFilename {
    /// Template shortcut, the first filename segment.
    pub shortcut: String,
    /// Hash fragment identifying the creating user.
    pub hash: String,
    /// Project-wide sequence number, at most [`MAX_SEQUENCE`].
    pub sequence: u64,
}

impl DocumentFilename {
    /// Parses a base filename (no directory part).
    ///
    /// Returns `None` exactly when the name does not match the canonical grammar.
    pub fn parse(base: &str) -> Option<Self> {
        let caps = FILENAME_RE.captures(base)?;
        let sequence = caps.get(3)?.as_str().parse::<u64>().ok()?;
        Some(Self {
            shortcut: caps.get(1)?.as_str().to_string(),
            hash: caps.get(2)?.as_str().to_string(),
            sequence,
        })
    }

    /// Builds a filename from its parts.
    pub fn compose(shortcut: impl Into<String>, hash: impl Into<String>, sequence: u64) -> Self {
        Self {
            shortcut: shortcut.into(),
            hash: hash.into(),
            sequence,
        }
    }
}

impl Display for DocumentFilename {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}-{}-{:0width$}.{}",
            self.shortcut,
            self.hash,
            self.sequence,
            MARKDOWN_EXTENSION,
            width = SEQUENCE_WIDTH
        )
    }
}

/// Returns whether `base` conforms to the canonical document grammar.
pub fn is_canonical(base: &str) -> bool {
    FILENAME_RE.is_match(base)
}

/// Returns the first byte of the SHA-256 digest of `user` as two hex chars.
pub fn user_hash_fragment(user: &str) -> String {
    let digest = Sha256::digest(user.as_bytes());
    format!("{:02x}", digest[0])
}

/// Resolves the current login name from the environment.
///
/// Falls back to [`FALLBACK_USER_NAME`] so hashing never fails.
pub fn current_user_name() -> String {
    ["USER", "USERNAME"]
        .iter()
        .filter_map(|key| std::env::var(key).ok())
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
        .unwrap_or_else(|| FALLBACK_USER_NAME.to_string())
}

#[cfg(test)]
mod tests {
    use super::{is_canonical, user_hash_fragment, DocumentFilename, MAX_SEQUENCE};

    #[test]
    fn parse_extracts_three_groups() {
        let parsed = DocumentFilename::parse("spec-3f-0012.md").expect("canonical name");
        assert_eq!(parsed.shortcut, "spec");
        assert_eq!(parsed.hash, "3f");
        assert_eq!(parsed.sequence, 12);
    }

    #[test]
    fn parse_rejects_non_canonical_names() {
        for name in [
            "spec.md",
            "spec-3f.md",
            "spec-3f-0001.txt",
            "spec-3f-abc.md",
            "my spec-3f-0001.md",
            "notes/spec-3f-0001.md",
            "spec-3f-18446744073709551616.md",
        ] {
            assert!(DocumentFilename::parse(name).is_none(), "{name}");
            assert!(!is_canonical(name), "{name}");
        }
    }

    #[test]
    fn display_zero_pads_sequence() {
        let name = DocumentFilename::compose("adr", "0a", 7);
        assert_eq!(name.to_string(), "adr-0a-0007.md");

        let wide = DocumentFilename::compose("adr", "0a", 12345);
        assert_eq!(wide.to_string(), "adr-0a-12345.md");
        assert_eq!(DocumentFilename::parse(&wide.to_string()), Some(wide));
    }

    #[test]
    fn hash_fragment_is_stable_two_hex_chars() {
        let first = user_hash_fragment("alice");
        assert_eq!(first.len(), 2);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(first, user_hash_fragment("alice"));
    }

    #[test]
    fn grammar_and_parse_agree_on_widest_sequence() {
        let widest = format!("spec-3f-{MAX_SEQUENCE}.md");
        assert!(is_canonical(&widest));
        assert_eq!(DocumentFilename::parse(&widest).unwrap().sequence, MAX_SEQUENCE);

        let too_wide = format!("spec-3f-{}0.md", MAX_SEQUENCE);
        assert!(!is_canonical(&too_wide));
        assert!(DocumentFilename::parse(&too_wide).is_none());
    }
}
