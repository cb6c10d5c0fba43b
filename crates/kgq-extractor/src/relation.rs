//! Relation detection
//!
//! Finds relation phrases from dependency patterns: an anchor token (the
//! sentence root or a clausal modifier) optionally followed by a preposition,
//! an agent and an adjectival complement, in that order.

use serde::{Deserialize, Serialize};
use tracing::trace;

use kgq_core::{DependencyLabel, Sentence};

// ============================================================================
// Relation Spans
// ============================================================================

/// A detected relation phrase
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelationSpan {
    /// First token of the phrase
    pub start: usize,
    /// One past the last token
    pub end: usize,
    /// Token lemmas joined by single spaces
    pub lemma: String,
}

impl RelationSpan {
    pub fn new(start: usize, end: usize, lemma: impl Into<String>) -> Self {
        Self {
            start,
            end,
            lemma: lemma.into(),
        }
    }

    pub fn word_count(&self) -> usize {
        self.lemma.split_whitespace().count()
    }

    /// Last word of the phrase, as collected into query relation sets
    pub fn last_word(&self) -> &str {
        self.lemma.split_whitespace().last().unwrap_or("")
    }
}

// ============================================================================
// Patterns
// ============================================================================

/// Token pattern: an anchor label followed by optional labels in order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationPattern {
    pub name: String,
    pub anchor: DependencyLabel,
    /// Each follower may appear at most once, in this order, on consecutive tokens
    pub followers: Vec<DependencyLabel>,
}

impl RelationPattern {
    pub fn new(
        name: impl Into<String>,
        anchor: DependencyLabel,
        followers: Vec<DependencyLabel>,
    ) -> Self {
        Self {
            name: name.into(),
            anchor,
            followers,
        }
    }

    /// Every `start..end` range matched from `start`, shortest first
    fn match_at(&self, sentence: &Sentence, start: usize) -> Vec<(usize, usize)> {
        let tokens = &sentence.tokens;
        if tokens.get(start).map(|t| &t.dep) != Some(&self.anchor) {
            return Vec::new();
        }

        let mut ranges = vec![(start, start + 1)];
        let mut next_follower = 0;
        for (offset, token) in tokens[start + 1..].iter().enumerate() {
            let Some(found) = self.followers[next_follower..]
                .iter()
                .position(|label| *label == token.dep)
            else {
                break;
            };
            next_follower += found + 1;
            ranges.push((start, start + offset + 2));
        }
        ranges
    }
}

fn relation_followers() -> Vec<DependencyLabel> {
    vec![
        DependencyLabel::Preposition,
        DependencyLabel::Agent,
        DependencyLabel::AdjectivalComplement,
    ]
}

// ============================================================================
// Detector
// ============================================================================

/// Dependency-pattern relation detector
#[derive(Debug, Clone)]
pub struct RelationDetector {
    patterns: Vec<RelationPattern>,
}

impl RelationDetector {
    /// Detector with the root and clausal-modifier patterns
    pub fn new() -> Self {
        Self::with_patterns(vec![
            RelationPattern::new("root_relation", DependencyLabel::Root, relation_followers()),
            RelationPattern::new(
                "clausal_relation",
                DependencyLabel::ClausalModifier,
                relation_followers(),
            ),
        ])
    }

    pub fn with_patterns(patterns: Vec<RelationPattern>) -> Self {
        Self { patterns }
    }

    pub fn patterns(&self) -> &[RelationPattern] {
        &self.patterns
    }

    /// All pattern matches, ordered by start then length, before deduplication
    pub fn candidates(&self, sentence: &Sentence) -> Vec<RelationSpan> {
        let mut spans = Vec::new();
        for start in 0..sentence.tokens.len() {
            for pattern in &self.patterns {
                for (s, e) in pattern.match_at(sentence, start) {
                    let span = RelationSpan::new(s, e, sentence.span_lemma(s, e));
                    if !span.lemma.trim().is_empty() && !spans.contains(&span) {
                        trace!(pattern = %pattern.name, relation = %span.lemma, start = s, "Relation candidate");
                        spans.push(span);
                    }
                }
            }
        }
        spans.sort_by_key(|s| (s.start, s.end));
        spans
    }

    /// Deduplicated relation phrases of a sentence
    pub fn detect(&self, sentence: &Sentence) -> Vec<RelationSpan> {
        deduplicate(self.candidates(sentence))
    }
}

impl Default for RelationDetector {
    fn default() -> Self {
        Self::new()
    }
}

/// Drop single-word phrases that some multi-word phrase contains
///
/// Containment is a plain substring test, so an unrelated multi-word phrase
/// that happens to contain the word also removes it.
pub fn deduplicate(spans: Vec<RelationSpan>) -> Vec<RelationSpan> {
    let multi_word: Vec<String> = spans
        .iter()
        .filter(|s| s.word_count() > 1)
        .map(|s| s.lemma.clone())
        .collect();

    let mut kept = spans;
    kept.retain(|span| {
        span.word_count() > 1 || !multi_word.iter().any(|m| m.contains(&span.lemma))
    });
    kept
}
