//! Text normalization ahead of annotation
//!
//! Case-folds, strips parentheticals and heading markers, drops
//! determiners/pronouns the extractor cannot resolve, and evens out period
//! spacing so sentence segmentation downstream is reliable.

use once_cell::sync::Lazy;
use regex::Regex;

/// Words removed when surrounded by spaces
pub const STOP_WORDS: [&str; 10] = [
    "a", "the", "he", "she", "we", "they", "this", "that", "these", "those",
];

/// Bracketed content preceded by a space, non-greedy, single line
static BRACKETED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r" [(\[].*?[)\]]").expect("valid regex"));

/// `== heading ==` style markers
static HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"=.*? =").expect("valid regex"));

static PERIOD_SPACING: Lazy<Regex> = Lazy::new(|| Regex::new(r"\. *").expect("valid regex"));

/// Upper bound on normalization passes; real text settles in two or three
const MAX_PASSES: usize = 64;

/// Normalize raw text for annotation
///
/// Passes repeat until the text stops changing, so normalizing already
/// normalized text is a no-op.
pub fn normalize(text: &str) -> String {
    let mut current = text.to_string();
    for _ in 0..MAX_PASSES {
        let next = normalize_pass(&current);
        if next == current {
            break;
        }
        current = next;
    }
    current
}

fn normalize_pass(text: &str) -> String {
    let text = text.to_lowercase();
    let text = BRACKETED.replace_all(&text, "");
    let text = HEADING.replace_all(&text, "");
    let text = text.replace(|c: char| c == '\n' || c == '=', "");
    let text = PERIOD_SPACING.replace_all(&text, ". ");
    remove_stop_words(&text)
}

fn remove_stop_words(text: &str) -> String {
    let mut result = text.to_string();
    for word in STOP_WORDS {
        let padded = format!(" {word} ");
        // Adjacent stop words share a space, so one replace is not enough
        while result.contains(&padded) {
            result = result.replace(&padded, " ");
        }
    }
    result
}
