//! Inbound deck sources.
//!
//! # Responsibility
//! - Define the retrieval contract used to seed an editing session.
//! - Provide file-backed and in-memory implementations.
//!
//! # Invariants
//! - Sources never retry; failures are reported once to the caller.
//! - Request ids cannot escape the source directory.

use crate::model::document::{Document, DocumentError};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Failure reported by a deck source.
#[derive(Debug)]
pub enum SourceError {
    /// Request id is blank or contains path components.
    InvalidRequestId(String),
    /// No deck exists for the request id.
    NotFound(String),
    /// Reading the deck payload failed.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Payload could not be decoded into a valid document.
    Decode(DocumentError),
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRequestId(value) => write!(f, "invalid generation request id: `{value}`"),
            Self::NotFound(value) => write!(f, "no deck for generation request `{value}`"),
            Self::Io { path, source } => {
                write!(f, "failed to read deck `{}`: {source}", path.display())
            }
            Self::Decode(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SourceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Decode(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DocumentError> for SourceError {
    fn from(value: DocumentError) -> Self {
        Self::Decode(value)
    }
}

/// Retrieval contract for a generated presentation.
pub trait DeckSource {
    fn fetch_deck(&self, request_id: &str) -> Result<Document, SourceError>;
}

/// Reads `<dir>/<request_id>.json`.
#[derive(Debug, Clone)]
pub struct JsonFileDeckSource {
    dir: PathBuf,
}

impl JsonFileDeckSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        self.dir.as_path()
    }

    fn deck_path(&self, request_id: &str) -> Result<PathBuf, SourceError> {
        let trimmed = request_id.trim();
        let is_plain = !trimmed.is_empty()
            && trimmed != "."
            && trimmed != ".."
            && !trimmed.contains(['/', '\\']);
        if !is_plain {
            return Err(SourceError::InvalidRequestId(request_id.to_string()));
        }
        Ok(self.dir.join(format!("{trimmed}.json")))
    }
}

impl DeckSource for JsonFileDeckSource {
    fn fetch_deck(&self, request_id: &str) -> Result<Document, SourceError> {
        let path = self.deck_path(request_id)?;
        let raw = std::fs::read_to_string(&path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                SourceError::NotFound(request_id.to_string())
            } else {
                SourceError::Io {
                    path: path.clone(),
                    source,
                }
            }
        })?;
        Ok(Document::from_json_str(&raw)?)
    }
}

/// Fixed in-memory decks keyed by request id.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDeckSource {
    decks: BTreeMap<String, Document>,
}

impl InMemoryDeckSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_deck(mut self, request_id: impl Into<String>, document: Document) -> Self {
        self.decks.insert(request_id.into(), document);
        self
    }
}

impl DeckSource for InMemoryDeckSource {
    fn fetch_deck(&self, request_id: &str) -> Result<Document, SourceError> {
        self.decks
            .get(request_id)
            .cloned()
            .ok_or_else(|| SourceError::NotFound(request_id.to_string()))
    }
}
