//! Simple-sentence classification
//!
//! The fixed-window triple builder only reads sensibly on sentences with a
//! single subject and no subordinate clause; everything else is skipped.

use kgq_core::{DependencyLabel, Sentence};
use serde::{Deserialize, Serialize};

/// Structural shape of a sentence, as far as extraction cares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SentenceShape {
    /// Exactly one subject, no subordinating conjunction
    Simple,
    /// No nominal subject at all
    NoSubject,
    /// More than one nominal subject (compound sentence)
    MultipleSubjects,
    /// Contains a subordinating conjunction (complex sentence)
    Subordinate,
}

impl std::fmt::Display for SentenceShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Simple => write!(f, "simple"),
            Self::NoSubject => write!(f, "no_subject"),
            Self::MultipleSubjects => write!(f, "multiple_subjects"),
            Self::Subordinate => write!(f, "subordinate"),
        }
    }
}

/// Classify a sentence by its subject and marker tokens
pub fn sentence_shape(sentence: &Sentence) -> SentenceShape {
    let subjects = sentence
        .tokens
        .iter()
        .filter(|t| t.dep.is_subject())
        .count();
    let has_marker = sentence
        .tokens
        .iter()
        .any(|t| t.dep == DependencyLabel::Marker);

    if has_marker {
        SentenceShape::Subordinate
    } else {
        match subjects {
            0 => SentenceShape::NoSubject,
            1 => SentenceShape::Simple,
            _ => SentenceShape::MultipleSubjects,
        }
    }
}

/// Exactly one subject-role token and no subordinating conjunction
pub fn is_simple(sentence: &Sentence) -> bool {
    sentence_shape(sentence) == SentenceShape::Simple
}
