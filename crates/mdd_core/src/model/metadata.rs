//! Embedded metadata block parsing and structured rewrite.
//!
//! # Responsibility
//! - Detect the machine-owned `<!-- mdd ... -->` region one line at a time.
//! - Parse `key: value` entries inside the region.
//! - Locate the first region by byte offsets and splice a new block into it.
//!
//! # Invariants
//! - Bytes outside the spliced region are never modified.
//! - Only the first start marker (and the first end marker after it) bound the
//!   region that gets rewritten.
//! - A malformed or unknown entry fails only its own line.

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// First line of a metadata block.
pub const METADATA_START: &str = "<!-- mdd";
/// Last line of a metadata block.
pub const METADATA_END: &str = "-->";
/// Key for a child link entry.
pub const KEY_CHILD: &str = "child";
/// Key for a tag entry.
pub const KEY_TAG: &str = "tag";

const LEGACY_KEY_CHILD: &str = "mdd-child";
const LEGACY_KEY_TAG: &str = "mdd-tag";
const SEPARATOR: char = ':';

static START_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*<!-- mdd\s*$").expect("valid metadata start regex"));
static END_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*-->\s*$").expect("valid metadata end regex"));

/// Scanner position relative to a metadata block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockState {
    OutsideBlock,
    InsideBlock,
}

/// Classification of one line fed through [`BlockScanner`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEvent<'a> {
    /// Human prose outside any block.
    Prose,
    /// Start marker line.
    BlockStart,
    /// A line inside a block, ready for [`parse_line`].
    BlockLine(&'a str),
    /// End marker line.
    BlockEnd,
}

/// Two-state automaton that classifies document lines.
#[derive(Debug, Clone)]
pub struct BlockScanner {
    state: BlockState,
}

impl Default for BlockScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockScanner {
    pub fn new() -> Self {
        Self {
            state: BlockState::OutsideBlock,
        }
    }

    pub fn state(&self) -> BlockState {
        self.state
    }

    /// Advances the automaton by one line (without its line terminator).
    pub fn feed<'a>(&mut self, line: &'a str) -> LineEvent<'a> {
        match self.state {
            BlockState::OutsideBlock => {
                if START_RE.is_match(line) {
                    self.state = BlockState::InsideBlock;
                    LineEvent::BlockStart
                } else {
                    LineEvent::Prose
                }
            }
            BlockState::InsideBlock => {
                if END_RE.is_match(line) {
                    self.state = BlockState::OutsideBlock;
                    LineEvent::BlockEnd
                } else {
                    LineEvent::BlockLine(line)
                }
            }
        }
    }
}

/// One recognised metadata entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataEntry {
    Child(String),
    Tag(String),
}

/// Per-line metadata failure. Never aborts a whole document load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataLineError {
    /// Line does not contain exactly one separator.
    Malformed(String),
    /// Key is neither a child nor a tag marker.
    UnrecognisedKey(String),
}

impl Display for MetadataLineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed(line) => write!(
                f,
                "expected exactly one `{SEPARATOR}` in metadata line `{line}`"
            ),
            Self::UnrecognisedKey(key) => write!(f, "unrecognised metadata key `{key}`"),
        }
    }
}

impl Error for MetadataLineError {}

/// Parses one in-block line.
///
/// Blank lines yield `Ok(None)`.
pub fn parse_line(line: &str) -> Result<Option<MetadataEntry>, MetadataLineError> {
    if line.trim().is_empty() {
        return Ok(None);
    }

    let mut parts = line.split(SEPARATOR);
    let (key, value) = match (parts.next(), parts.next(), parts.next()) {
        (Some(key), Some(value), None) => (key.trim(), value.trim()),
        _ => return Err(MetadataLineError::Malformed(line.trim().to_string())),
    };

    match key {
        KEY_CHILD | LEGACY_KEY_CHILD => Ok(Some(MetadataEntry::Child(value.to_string()))),
        KEY_TAG | LEGACY_KEY_TAG => Ok(Some(MetadataEntry::Tag(value.to_string()))),
        other => Err(MetadataLineError::UnrecognisedKey(other.to_string())),
    }
}

/// Renders a complete block using `newline` between lines.
///
/// No trailing terminator is emitted; the splice keeps the existing one.
pub fn render_block<'a, C, T>(children: C, tags: T, newline: &str) -> String
where
    C: IntoIterator<Item = &'a String>,
    T: IntoIterator<Item = &'a String>,
{
    let mut lines = vec![METADATA_START.to_string()];
    lines.extend(children.into_iter().map(|c| format!("{KEY_CHILD}: {c}")));
    lines.extend(tags.into_iter().map(|t| format!("{KEY_TAG}: {t}")));
    lines.push(METADATA_END.to_string());
    lines.join(newline)
}

/// Byte range of the first metadata region.
///
/// `start` is the first byte of the start-marker line; `end` is one past the
/// last byte of the end-marker line, excluding its terminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockSpan {
    pub start: usize,
    pub end: usize,
    /// Whether the start-marker line was terminated by `\r\n`.
    pub crlf: bool,
}

impl BlockSpan {
    /// Line terminator to use inside a replacement block.
    pub fn newline(&self) -> &'static str {
        if self.crlf {
            "\r\n"
        } else {
            "\n"
        }
    }
}

/// Finds the first complete metadata region in `text`.
///
/// Returns `None` when there is no start marker, or it is never closed.
pub fn find_block(text: &str) -> Option<BlockSpan> {
    let mut scanner = BlockScanner::new();
    let mut offset = 0usize;
    let mut open: Option<(usize, bool)> = None;

    for raw_line in text.split_inclusive('\n') {
        let line = strip_terminator(raw_line);
        match scanner.feed(line) {
            LineEvent::BlockStart => {
                open = Some((offset, raw_line.ends_with("\r\n")));
            }
            LineEvent::BlockEnd => {
                if let Some((start, crlf)) = open {
                    return Some(BlockSpan {
                        start,
                        end: offset + line.len(),
                        crlf,
                    });
                }
            }
            LineEvent::Prose | LineEvent::BlockLine(_) => {}
        }
        offset += raw_line.len();
    }

    None
}

/// Replaces `span` in `text` with `block`, keeping prefix and suffix bytes.
pub fn splice_block(text: &str, span: BlockSpan, block: &str) -> String {
    let mut out = String::with_capacity(text.len() + block.len());
    out.push_str(&text[..span.start]);
    out.push_str(block);
    out.push_str(&text[span.end..]);
    out
}

/// Removes a trailing `\n` or `\r\n` from one line.
pub fn strip_terminator(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}
