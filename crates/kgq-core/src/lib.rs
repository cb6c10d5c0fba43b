//! KGQ Core - Domain models, traits, and shared types
//!
//! This crate defines the core abstractions used throughout the KGQ system:
//! - Subject-Relation-Object triples and the topic-partitioned triple store
//! - The linguistic annotation model consumed by the extractor
//! - The entity/relation context parsed from a question
//! - Common error types
//! - Configuration management

pub mod annotation;
pub mod config;
pub mod query;
pub mod store;

pub use annotation::{DependencyLabel, Document, EntityMention, Sentence, Token};
pub use config::{
    AnnotatorConfig, AppConfig, ConfigError, DisplayConfig, ExtractionConfig, LoggingConfig,
    StoreConfig,
};
pub use query::QueryContext;
pub use store::{MergeSummary, RecordId, TopicRecords, TripleRecord, TripleStore};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for KGQ operations
#[derive(Error, Debug)]
pub enum KgError {
    /// The linguistic annotator could not process the input
    #[error("Annotation failed: {0}")]
    AnnotationFailure(String),

    /// Persisted store data does not have the expected structure
    #[error("Triple store {origin} is corrupted: {message}")]
    StoreCorruption { origin: String, message: String },

    /// A triple candidate with an empty subject, relation or object
    #[error("Malformed triple: {0}")]
    MalformedTriple(String),

    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl KgError {
    /// Wrap an IO error together with the path it happened on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, KgError>;

// ============================================================================
// Triples
// ============================================================================

/// A (subject, relation, object) fact extracted from text
///
/// All three fields are guaranteed non-empty: construction goes through
/// [`Triple::new`], and deserialization runs the same check.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawTriple")]
pub struct Triple {
    subject: String,
    relation: String,
    object: String,
}

impl Triple {
    /// Create a new triple, rejecting empty fields
    pub fn new(
        subject: impl Into<String>,
        relation: impl Into<String>,
        object: impl Into<String>,
    ) -> Result<Self> {
        let subject = subject.into();
        let relation = relation.into();
        let object = object.into();

        for (field, value) in [
            ("subject", &subject),
            ("relation", &relation),
            ("object", &object),
        ] {
            if value.trim().is_empty() {
                return Err(KgError::MalformedTriple(format!(
                    "empty {field} in ({subject:?}, {relation:?}, {object:?})"
                )));
            }
        }

        Ok(Self {
            subject,
            relation,
            object,
        })
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn relation(&self) -> &str {
        &self.relation
    }

    pub fn object(&self) -> &str {
        &self.object
    }

    /// Split into `(subject, relation, object)`
    pub fn into_parts(self) -> (String, String, String) {
        (self.subject, self.relation, self.object)
    }
}

impl std::fmt::Display for Triple {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.subject, self.relation, self.object)
    }
}

#[derive(Deserialize)]
struct RawTriple {
    subject: String,
    relation: String,
    object: String,
}

impl TryFrom<RawTriple> for Triple {
    type Error = KgError;

    fn try_from(raw: RawTriple) -> Result<Self> {
        Triple::new(raw.subject, raw.relation, raw.object)
    }
}

// ============================================================================
// Traits
// ============================================================================

/// Linguistic annotator: tokenization, dependency labels, lemmas and
/// named-entity spans for a piece of text
///
/// Implementations are blocking and must not retry internally; failures
/// surface as [`KgError::AnnotationFailure`].
pub trait Annotator: Send + Sync {
    fn annotate(&self, text: &str) -> Result<Document>;

    /// Annotator name for logging
    fn name(&self) -> &str;
}

// ============================================================================
// Tests
// ============================================================================
