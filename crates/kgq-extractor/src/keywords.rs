//! Keyword lists for entity enrichment
//!
//! Domain terms loaded from plain text files (one term per line) and
//! phrase-matched against lower-cased token text.

use std::path::Path;

use tracing::debug;

use kgq_core::{EntityMention, KgError, Result, Sentence};

/// Irregular plurals the suffix rules get wrong
const IRREGULAR_PLURALS: [(&str, &str); 8] = [
    ("child", "children"),
    ("person", "people"),
    ("man", "men"),
    ("woman", "women"),
    ("index", "indices"),
    ("analysis", "analyses"),
    ("crisis", "crises"),
    ("criterion", "criteria"),
];

/// A list of keyword phrases sharing one entity label
#[derive(Debug, Clone, Default)]
pub struct KeywordList {
    label: String,
    /// Each term split into lower-cased words
    terms: Vec<Vec<String>>,
}

impl KeywordList {
    /// Create a list from terms; blank terms and duplicates are dropped
    pub fn new<I>(label: impl Into<String>, terms: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut list = Self {
            label: label.into(),
            terms: Vec::new(),
        };
        for term in terms {
            list.push(term.as_ref());
        }
        list
    }

    /// Load a keyword file, one term per line
    ///
    /// Files that are not valid UTF-8 are read as Latin-1.
    pub fn from_file(path: impl AsRef<Path>, label: impl Into<String>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| KgError::io(path, e))?;
        let content = match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(e) => e.into_bytes().iter().map(|&b| char::from(b)).collect(),
        };

        let list = Self::new(label, content.lines().map(str::trim_end));
        debug!(path = %path.display(), terms = list.len(), label = %list.label, "Loaded keyword list");
        Ok(list)
    }

    /// Add the plural form of every single-word term
    pub fn with_plurals(mut self) -> Self {
        let plurals: Vec<String> = self
            .terms
            .iter()
            .filter(|words| words.len() == 1)
            .map(|words| pluralize(&words[0]))
            .collect();
        for plural in plurals {
            self.push(&plural);
        }
        self
    }

    fn push(&mut self, term: &str) {
        let words: Vec<String> = term.split_whitespace().map(str::to_lowercase).collect();
        if !words.is_empty() && !self.terms.contains(&words) {
            self.terms.push(words);
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Whether the list contains the term (case-insensitive)
    pub fn contains(&self, term: &str) -> bool {
        let words: Vec<String> = term.split_whitespace().map(str::to_lowercase).collect();
        self.terms.contains(&words)
    }

    /// Every occurrence of every term in the sentence, ordered by position
    pub fn find_matches(&self, sentence: &Sentence) -> Vec<EntityMention> {
        let lowered: Vec<String> = sentence
            .tokens
            .iter()
            .map(|t| t.text.to_lowercase())
            .collect();

        let mut matches = Vec::new();
        for start in 0..lowered.len() {
            for words in &self.terms {
                let end = start + words.len();
                if end <= lowered.len() && lowered[start..end] == words[..] {
                    matches.push(
                        EntityMention::new(
                            start,
                            end,
                            sentence.span_text(start, end),
                            sentence.span_lemma(start, end),
                        )
                        .with_label(self.label.clone()),
                    );
                }
            }
        }
        matches
    }
}

/// English plural of a single noun
pub fn pluralize(word: &str) -> String {
    if let Some((_, plural)) = IRREGULAR_PLURALS.iter().find(|(singular, _)| *singular == word) {
        return (*plural).to_string();
    }

    let ends_with_consonant_y = word.ends_with('y')
        && word
            .chars()
            .rev()
            .nth(1)
            .is_some_and(|c| !"aeiou".contains(c));

    if ends_with_consonant_y {
        format!("{}ies", &word[..word.len() - 1])
    } else if ["s", "x", "z", "ch", "sh"].iter().any(|suffix| word.ends_with(suffix)) {
        format!("{word}es")
    } else {
        format!("{word}s")
    }
}
