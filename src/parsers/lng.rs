//! The `.lng` line format: `key;field1;field2`, one entry per line.
//!
//! A literal `;` inside a field is stored as `¦` and a newline as the two
//! characters `\n`.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::Path;

use tracing::{debug, warn};

use crate::error::{Result, TranslatorError};
use crate::model::entry::{ResourceEntry, ResourceFile};
use crate::services::encoding;

pub const SEPARATOR: char = ';';
pub const SEPARATOR_SUBSTITUTE: char = '¦';
pub const NEWLINE_ESCAPE: &str = "\\n";

pub fn unescape(field: &str) -> String {
    field
        .replace(SEPARATOR_SUBSTITUTE, ";")
        .replace(NEWLINE_ESCAPE, "\n")
}

pub fn escape(text: &str) -> String {
    text.replace("\r\n", NEWLINE_ESCAPE)
        .replace('\n', NEWLINE_ESCAPE)
        .replace(SEPARATOR, &SEPARATOR_SUBSTITUTE.to_string())
}

pub fn decode<'a, I>(lines: I) -> ResourceFile
where
    I: IntoIterator<Item = &'a str>,
{
    let mut file = ResourceFile::new();

    for (i, line) in lines.into_iter().enumerate() {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }

        let mut parts = line.split(SEPARATOR);
        // Keys are kept verbatim so `encode` writes them back unchanged.
        let key = parts.next().unwrap_or_default().to_string();
        let fields: Vec<String> = parts.map(unescape).collect();

        if !file.insert(ResourceEntry::new(key.clone(), fields)) {
            warn!(line = i + 1, key = %key, "duplicate key, keeping first occurrence");
        }
    }

    file
}

/// Reads a resource file. A missing file is an empty resource set.
pub fn load(path: &Path) -> Result<ResourceFile> {
    let bytes = match fs::read(path) {
        Ok(b) => b,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!(path = %path.display(), "source file not found, nothing to translate");
            return Ok(ResourceFile::new());
        }
        Err(e) => return Err(TranslatorError::io(path, e)),
    };

    let decoded = encoding::decode(&bytes);
    if decoded.had_errors {
        warn!(path = %path.display(), encoding = %decoded.encoding, "source file contains undecodable bytes");
    }

    let file = decode(decoded.text.lines());
    debug!(path = %path.display(), encoding = %decoded.encoding, entries = file.len(), "loaded resource file");
    Ok(file)
}

pub fn encode(key: &str, text: &str) -> String {
    format!("{}{}{}", key, SEPARATOR, escape(text))
}

/// Appends one encoded line. The file is opened and closed on every call.
pub fn append(path: &Path, line: &str) -> Result<()> {
    let mut f = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| TranslatorError::io(path, e))?;

    writeln!(f, "{line}").map_err(|e| TranslatorError::io(path, e))?;
    Ok(())
}
