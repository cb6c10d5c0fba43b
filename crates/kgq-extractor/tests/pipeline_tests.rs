//! End-to-end extraction and query parsing against a fixture annotator

use std::io::Write;
use std::sync::{Arc, Mutex};

use kgq_core::{
    Annotator, Document, EntityMention, ExtractionConfig, KgError, Result, Sentence, Token,
    Triple,
};
use kgq_extractor::{AnnotationPipeline, QueryParser, TripleExtractor};

/// Returns a preset document and records the text it was given
struct FixtureAnnotator {
    document: Document,
    seen: Arc<Mutex<Vec<String>>>,
}

impl FixtureAnnotator {
    fn new(document: Document) -> (Self, Arc<Mutex<Vec<String>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                document,
                seen: Arc::clone(&seen),
            },
            seen,
        )
    }
}

impl Annotator for FixtureAnnotator {
    fn annotate(&self, text: &str) -> Result<Document> {
        if text.is_empty() {
            return Err(KgError::AnnotationFailure("empty".to_string()));
        }
        self.seen.lock().unwrap().push(text.to_string());
        Ok(self.document.clone())
    }

    fn name(&self) -> &str {
        "fixture"
    }
}

fn tokens(words: &[(&str, &str, &str)]) -> Vec<Token> {
    words
        .iter()
        .enumerate()
        .map(|(i, (text, lemma, dep))| Token::new(i, *text, *lemma, *dep))
        .collect()
}

/// "banks own assets. banks lend and firms borrow. rates are determined by central banks."
fn finance_document() -> Document {
    let simple = Sentence::new(tokens(&[
        ("banks", "bank", "nsubj"),
        ("own", "own", "ROOT"),
        ("assets", "asset", "dobj"),
        (".", ".", "punct"),
    ]))
    .with_entities(vec![
        EntityMention::new(0, 1, "banks", "bank"),
        EntityMention::new(2, 3, "assets", "asset"),
    ]);

    let compound = Sentence::new(tokens(&[
        ("banks", "bank", "nsubj"),
        ("lend", "lend", "ROOT"),
        ("and", "and", "cc"),
        ("firms", "firm", "nsubj"),
        ("borrow", "borrow", "conj"),
        (".", ".", "punct"),
    ]))
    .with_entities(vec![
        EntityMention::new(0, 1, "banks", "bank"),
        EntityMention::new(3, 4, "firms", "firm"),
    ]);

    let passive = Sentence::new(tokens(&[
        ("rates", "rate", "nsubjpass"),
        ("are", "be", "auxpass"),
        ("determined", "determine", "ROOT"),
        ("by", "by", "agent"),
        ("central", "central", "amod"),
        ("banks", "bank", "pobj"),
        (".", ".", "punct"),
    ]))
    .with_entities(vec![
        EntityMention::new(0, 1, "rates", "rate"),
        EntityMention::new(4, 6, "central banks", "central bank"),
    ]);

    Document::new(vec![simple, compound, passive])
}

#[test]
fn test_extract_from_simple_sentences_only() {
    let (annotator, seen) = FixtureAnnotator::new(finance_document());
    let extractor = TripleExtractor::new(Arc::new(AnnotationPipeline::standard(Box::new(annotator))));

    let triples = extractor
        .extract_triples("Banks own the assets. Banks lend and firms borrow.")
        .unwrap();

    assert_eq!(
        triples,
        vec![
            Triple::new("bank", "own", "asset").unwrap(),
            Triple::new("rate", "determine by", "central bank").unwrap(),
        ]
    );

    // The annotator sees normalized text
    let seen = seen.lock().unwrap();
    assert_eq!(seen[0], "banks own assets. banks lend and firms borrow. ");
}

#[test]
fn test_extract_empty_text_fails() {
    let (annotator, _) = FixtureAnnotator::new(finance_document());
    let extractor = TripleExtractor::new(Arc::new(AnnotationPipeline::standard(Box::new(annotator))));
    assert!(matches!(
        extractor.extract_triples("   "),
        Err(KgError::AnnotationFailure(_))
    ));
}

#[test]
fn test_parse_query() {
    let question = Document::new(vec![Sentence::new(tokens(&[
        ("does", "do", "aux"),
        ("the", "the", "det"),
        ("company", "company", "nsubj"),
        ("rely", "rely", "ROOT"),
        ("on", "on", "prep"),
        ("assets", "asset", "pobj"),
        ("?", "?", "punct"),
    ]))
    .with_entities(vec![
        EntityMention::new(2, 3, "company", "company"),
        EntityMention::new(5, 6, "assets", "asset"),
    ])]);

    let (annotator, seen) = FixtureAnnotator::new(question);
    let parser = QueryParser::new(Arc::new(AnnotationPipeline::standard(Box::new(annotator))));
    let context = parser.parse_query("Does the Company rely on assets?").unwrap();

    assert_eq!(context.entity_pair(), Some(("company", "asset")));
    assert_eq!(
        context.relations().iter().map(String::as_str).collect::<Vec<_>>(),
        vec!["on"]
    );
    // Lower-cased only, stop words kept
    assert_eq!(seen.lock().unwrap()[0], "does the company rely on assets?");
}

#[test]
fn test_keyword_stages_from_config() {
    let mut compound = tempfile::NamedTempFile::new().unwrap();
    writeln!(compound, "central bank").unwrap();
    let mut simple = tempfile::NamedTempFile::new().unwrap();
    writeln!(simple, "rate").unwrap();

    // The annotator finds no entities at all; keywords supply them
    let document = Document::new(vec![Sentence::new(tokens(&[
        ("rates", "rate", "nsubjpass"),
        ("are", "be", "auxpass"),
        ("set", "set", "ROOT"),
        ("by", "by", "agent"),
        ("central", "central", "amod"),
        ("bank", "bank", "pobj"),
    ]))]);

    let config = ExtractionConfig {
        compound_keywords: Some(compound.path().to_path_buf()),
        simple_keywords: Some(simple.path().to_path_buf()),
        include_plurals: true,
    };
    let (annotator, _) = FixtureAnnotator::new(document);
    let pipeline = AnnotationPipeline::from_config(Box::new(annotator), &config).unwrap();
    assert_eq!(
        pipeline.stage_names(),
        vec!["compound_keywords", "named_entities", "simple_keywords"]
    );

    let extractor = TripleExtractor::new(Arc::new(pipeline));
    let triples = extractor.extract_triples("rates are set by central bank").unwrap();
    assert_eq!(
        triples,
        vec![Triple::new("rate", "set by", "central bank").unwrap()]
    );
}
