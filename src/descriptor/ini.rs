//! Line-level reader for the bracketed section format.
//!
//! Produces ordered sections of ordered entries and nothing else; the meaning
//! of keys is decided by [`super::parser`].
//!
//! Indented lines continue the previous value. Blank lines between
//! continuation lines stay in the value; blank lines at its end are dropped.

use crate::error::{DescriptorError, Result};

/// Section name reserved by configparser-style readers for defaults.
const RESERVED_SECTION: &str = "DEFAULT";

/// One `key = value` entry. Keys are lower-cased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub key: String,
    pub value: String,
    pub line: usize,
}

/// One `[name]` section with its entries in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub name: String,
    pub line: usize,
    pub entries: Vec<Entry>,
}

impl Section {
    fn new(name: impl Into<String>, line: usize) -> Self {
        Self {
            name: name.into(),
            line,
            entries: Vec::new(),
        }
    }

    /// Value of `key`, if the section has it.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.key == key)
            .map(|e| e.value.as_str())
    }

    pub fn has(&self, key: &str) -> bool {
        self.entries.iter().any(|e| e.key == key)
    }
}

fn is_comment(trimmed: &str) -> bool {
    trimmed.starts_with('#') || trimmed.starts_with(';')
}

/// Split the document into sections.
///
/// # Errors
///
/// Returns `MalformedDescriptor` for entries outside a section, unterminated
/// or empty headers, lines without a `=`/`:` delimiter, and keys repeated
/// within one section.
pub fn read_sections(text: &str) -> Result<Vec<Section>> {
    let mut sections: Vec<Section> = Vec::new();
    // Whether an indented line may still extend the last entry
    let mut value_open = false;
    // Blank lines seen since the last line of the open value
    let mut pending_blanks = 0_usize;

    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        let trimmed = raw.trim();

        if trimmed.is_empty() {
            if value_open {
                pending_blanks += 1;
            }
            continue;
        }
        if is_comment(trimmed) {
            continue;
        }

        let indented = raw.starts_with([' ', '\t']);
        if indented
            && value_open
            && let Some(entry) = sections.last_mut().and_then(|s| s.entries.last_mut())
        {
            for _ in 0..=pending_blanks {
                entry.value.push('\n');
            }
            entry.value.push_str(trimmed);
            pending_blanks = 0;
            continue;
        }
        pending_blanks = 0;

        if let Some(header) = trimmed.strip_prefix('[') {
            let Some(name) = header.strip_suffix(']') else {
                return Err(DescriptorError::malformed_at(
                    line,
                    format!("section header '{trimmed}' is missing ']'"),
                ));
            };
            let name = name.trim();
            if name.is_empty() {
                return Err(DescriptorError::malformed_at(line, "empty section name"));
            }
            if name == RESERVED_SECTION {
                return Err(DescriptorError::malformed_at(
                    line,
                    "[DEFAULT] sections are not supported",
                ));
            }
            sections.push(Section::new(name, line));
            value_open = false;
            continue;
        }

        let Some(section) = sections.last_mut() else {
            return Err(DescriptorError::malformed_at(
                line,
                format!("entry '{trimmed}' appears before any section header"),
            ));
        };

        let Some((key, value)) = trimmed.split_once(['=', ':']) else {
            return Err(DescriptorError::malformed_at(
                line,
                format!("expected 'key = value', found '{trimmed}'"),
            ));
        };

        let key = key.trim().to_lowercase();
        if key.is_empty() {
            return Err(DescriptorError::malformed_at(line, "entry has an empty key"));
        }
        if section.has(&key) {
            return Err(DescriptorError::malformed_at(
                line,
                format!("key '{key}' repeated in [{}]", section.name),
            ));
        }

        section.entries.push(Entry {
            key,
            value: value.trim().to_owned(),
            line,
        });
        value_open = true;
    }

    Ok(sections)
}
