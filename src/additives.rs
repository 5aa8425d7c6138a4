//! Additive knowledge base
//!
//! Entries are loaded from the same JSON the browser tool ships
//! (`添加物名`, `別名`, `メリット`, `デメリット`, `関連リンク`); English keys are
//! accepted too. Responses always use the English keys.

use crate::error::ScanError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One additive and its health notes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Additive {
    #[serde(rename(serialize = "name", deserialize = "添加物名"), alias = "name")]
    pub name: String,
    #[serde(
        rename(serialize = "aliases", deserialize = "別名"),
        alias = "aliases",
        default
    )]
    pub aliases: Option<Vec<String>>,
    #[serde(rename(serialize = "benefit", deserialize = "メリット"), alias = "benefit")]
    pub benefit: String,
    #[serde(
        rename(serialize = "drawback", deserialize = "デメリット"),
        alias = "drawback"
    )]
    pub drawback: String,
    #[serde(rename(serialize = "link", deserialize = "関連リンク"), alias = "link")]
    pub link: String,
}

impl Additive {
    /// True when `token` is a substring of the name or of any alias
    fn matches(&self, token: &str) -> bool {
        self.name.contains(token)
            || self
                .aliases
                .as_ref()
                .is_some_and(|aliases| aliases.iter().any(|a| a.contains(token)))
    }
}

#[derive(Debug, Clone, Default)]
pub struct KnowledgeBase {
    entries: Vec<Additive>,
}

impl KnowledgeBase {
    pub fn new(entries: Vec<Additive>) -> Self {
        Self { entries }
    }

    /// Load entries from a JSON array file
    pub fn load(path: &Path) -> Result<Self, ScanError> {
        let data = std::fs::read_to_string(path)
            .map_err(|e| ScanError::KnowledgeBase(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&data)
    }

    pub fn from_json(data: &str) -> Result<Self, ScanError> {
        let entries: Vec<Additive> =
            serde_json::from_str(data).map_err(|e| ScanError::KnowledgeBase(e.to_string()))?;
        Ok(Self::new(entries))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Additives mentioned in recognized text.
    ///
    /// The text is split on whitespace runs; each token selects the first
    /// entry it matches. Results follow token order and each entry appears
    /// once.
    pub fn lookup(&self, text: &str) -> Vec<&Additive> {
        let mut found: Vec<&Additive> = Vec::new();
        for token in text.split_whitespace() {
            if let Some(additive) = self.entries.iter().find(|a| a.matches(token)) {
                if !found.iter().any(|f| std::ptr::eq(*f, additive)) {
                    found.push(additive);
                }
            }
        }
        found
    }
}
