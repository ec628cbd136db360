//! Newline-delimited word lists: candidate names and language codes.

use crate::error::{GenError, GenResult};
use std::path::Path;

/// A non-empty, ordered list of entries read from a text file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    name:    String,
    entries: Vec<String>,
}

impl Vocabulary {
    /// Read one entry per line. Line endings are stripped and blank
    /// lines skipped. A missing or empty file is an error.
    pub fn load(name: &str, path: &Path) -> GenResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| GenError::VocabularyMissing {
            path: path.to_path_buf(),
            source,
        })?;
        let vocab = Self::from_lines(name, content.lines())?;
        log::debug!("Loaded {} {name} from {}", vocab.len(), path.display());
        Ok(vocab)
    }

    pub fn from_lines<I, S>(name: &str, lines: I) -> GenResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let entries: Vec<String> = lines
            .into_iter()
            .map(|l| l.as_ref().trim_end_matches(['\r', '\n']).to_string())
            .filter(|l| !l.trim().is_empty())
            .collect();
        if entries.is_empty() {
            return Err(GenError::EmptyVocabulary { name: name.to_string() });
        }
        Ok(Self { name: name.to_string(), entries })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Derive a mailbox from a display name: lower-cased, spaces replaced
/// by `separator`, then `@domain`.
pub fn derive_email(name: &str, separator: &str, domain: &str) -> String {
    format!("{}@{domain}", name.to_lowercase().replace(' ', separator))
}
