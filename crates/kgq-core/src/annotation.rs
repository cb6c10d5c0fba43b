//! Linguistic annotation model
//!
//! The shape of what an external annotator (tokenizer, dependency parser,
//! lemmatizer, NER) hands to the core. Token positions are sentence-relative.

use serde::{Deserialize, Serialize};

// ============================================================================
// Dependency Labels
// ============================================================================

/// Grammatical role of a token relative to its governing word
///
/// Only the labels the extractor inspects get their own variant; everything
/// else is carried verbatim in [`DependencyLabel::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DependencyLabel {
    Root,
    NominalSubject,
    PassiveNominalSubject,
    Marker,
    Preposition,
    Agent,
    AdjectivalComplement,
    ClausalModifier,
    Other(String),
}

impl DependencyLabel {
    /// Get the string representation
    pub fn as_str(&self) -> &str {
        match self {
            Self::Root => "ROOT",
            Self::NominalSubject => "nsubj",
            Self::PassiveNominalSubject => "nsubjpass",
            Self::Marker => "mark",
            Self::Preposition => "prep",
            Self::Agent => "agent",
            Self::AdjectivalComplement => "acomp",
            Self::ClausalModifier => "acl",
            Self::Other(label) => label,
        }
    }

    /// Nominal subject, active or passive
    pub fn is_subject(&self) -> bool {
        matches!(self, Self::NominalSubject | Self::PassiveNominalSubject)
    }
}

impl From<&str> for DependencyLabel {
    fn from(label: &str) -> Self {
        match label {
            "ROOT" => Self::Root,
            "nsubj" => Self::NominalSubject,
            "nsubjpass" => Self::PassiveNominalSubject,
            "mark" => Self::Marker,
            "prep" => Self::Preposition,
            "agent" => Self::Agent,
            "acomp" => Self::AdjectivalComplement,
            "acl" => Self::ClausalModifier,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for DependencyLabel {
    fn from(label: String) -> Self {
        Self::from(label.as_str())
    }
}

impl From<DependencyLabel> for String {
    fn from(label: DependencyLabel) -> Self {
        label.as_str().to_string()
    }
}

impl std::fmt::Display for DependencyLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Tokens, Spans, Sentences
// ============================================================================

/// A single annotated token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// Position within the sentence
    pub index: usize,

    /// Surface form
    pub text: String,

    /// Canonical dictionary form
    pub lemma: String,

    /// Dependency role label
    pub dep: DependencyLabel,

    /// Part-of-speech tag
    #[serde(default)]
    pub pos: String,
}

impl Token {
    /// Create a new token
    pub fn new(
        index: usize,
        text: impl Into<String>,
        lemma: impl Into<String>,
        dep: impl Into<DependencyLabel>,
    ) -> Self {
        Self {
            index,
            text: text.into(),
            lemma: lemma.into(),
            dep: dep.into(),
            pos: String::new(),
        }
    }

    /// Set part-of-speech tag
    pub fn with_pos(mut self, pos: impl Into<String>) -> Self {
        self.pos = pos.into();
        self
    }
}

/// An entity span over tokens `start..end` (end exclusive)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityMention {
    pub start: usize,
    pub end: usize,
    pub text: String,
    pub lemma: String,
    #[serde(default)]
    pub label: String,
}

impl EntityMention {
    /// Create a new entity mention
    pub fn new(
        start: usize,
        end: usize,
        text: impl Into<String>,
        lemma: impl Into<String>,
    ) -> Self {
        Self {
            start,
            end,
            text: text.into(),
            lemma: lemma.into(),
            label: String::new(),
        }
    }

    /// Set entity label
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Index of the last token covered by this span
    pub fn last_token(&self) -> usize {
        self.end.saturating_sub(1).max(self.start)
    }

    /// Whether the two spans share at least one token
    pub fn overlaps(&self, other: &EntityMention) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// One annotated sentence
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sentence {
    pub tokens: Vec<Token>,
    #[serde(default)]
    pub entities: Vec<EntityMention>,
}

impl Sentence {
    /// Create a sentence from tokens, without entities
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            entities: Vec::new(),
        }
    }

    /// Attach entity spans
    pub fn with_entities(mut self, entities: Vec<EntityMention>) -> Self {
        self.entities = entities;
        self
    }

    /// Lemmas of tokens `start..end`, joined by single spaces
    pub fn span_lemma(&self, start: usize, end: usize) -> String {
        self.span(start, end)
            .iter()
            .map(|t| t.lemma.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Surface text of tokens `start..end`, joined by single spaces
    pub fn span_text(&self, start: usize, end: usize) -> String {
        self.span(start, end)
            .iter()
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn span(&self, start: usize, end: usize) -> &[Token] {
        let end = end.min(self.tokens.len());
        self.tokens.get(start..end).unwrap_or(&[])
    }

    /// Plain text of the sentence
    pub fn text(&self) -> String {
        self.span_text(0, self.tokens.len())
    }
}

/// Annotated text, split into sentences
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub sentences: Vec<Sentence>,
}

impl Document {
    pub fn new(sentences: Vec<Sentence>) -> Self {
        Self { sentences }
    }

    pub fn is_empty(&self) -> bool {
        self.sentences.iter().all(|s| s.tokens.is_empty())
    }
}

// ============================================================================
// Tests
// ============================================================================
