//! Annotation enrichment pipeline
//!
//! Runs the external annotator, then an ordered list of enrichment stages
//! that rebuild each sentence's entity list: compound keywords first, the
//! annotator's named entities second, simple keywords last.

use tracing::{debug, info};

use kgq_core::{
    Annotator, Document, EntityMention, ExtractionConfig, KgError, Result, Sentence,
};

use crate::keywords::KeywordList;

/// One step that proposes entity mentions for a sentence
pub trait EnrichmentStage: Send + Sync {
    /// Stage name for logging
    fn name(&self) -> &str;

    /// New mentions, given the ones earlier stages found
    fn enrich(&self, sentence: &Sentence, found: &[EntityMention]) -> Vec<EntityMention>;
}

// ============================================================================
// Stages
// ============================================================================

/// Multi-word domain terms; every match is added
pub struct CompoundKeywordStage {
    keywords: KeywordList,
}

impl CompoundKeywordStage {
    pub fn new(keywords: KeywordList) -> Self {
        Self { keywords }
    }
}

impl EnrichmentStage for CompoundKeywordStage {
    fn name(&self) -> &str {
        "compound_keywords"
    }

    fn enrich(&self, sentence: &Sentence, found: &[EntityMention]) -> Vec<EntityMention> {
        let mut added: Vec<EntityMention> = Vec::new();
        for mention in self.keywords.find_matches(sentence) {
            let taken = found.iter().chain(added.iter()).any(|e| e.overlaps(&mention));
            if !taken {
                added.push(mention);
            }
        }
        added
    }
}

/// The annotator's own named-entity spans
#[derive(Debug, Default)]
pub struct NamedEntityStage;

impl EnrichmentStage for NamedEntityStage {
    fn name(&self) -> &str {
        "named_entities"
    }

    fn enrich(&self, sentence: &Sentence, found: &[EntityMention]) -> Vec<EntityMention> {
        sentence
            .entities
            .iter()
            .filter(|ent| !found.iter().any(|e| e.overlaps(ent)))
            .cloned()
            .collect()
    }
}

/// Single-word domain terms
///
/// A match is skipped when an entity already found contains its text and
/// the match ends within that entity's span.
pub struct SimpleKeywordStage {
    keywords: KeywordList,
}

impl SimpleKeywordStage {
    pub fn new(keywords: KeywordList) -> Self {
        Self { keywords }
    }
}

impl EnrichmentStage for SimpleKeywordStage {
    fn name(&self) -> &str {
        "simple_keywords"
    }

    fn enrich(&self, sentence: &Sentence, found: &[EntityMention]) -> Vec<EntityMention> {
        self.keywords
            .find_matches(sentence)
            .into_iter()
            .filter(|m| {
                !found.iter().any(|ent| {
                    ent.text.to_lowercase().contains(&m.text.to_lowercase())
                        && ent.start <= m.end
                        && m.end <= ent.end
                })
            })
            .collect()
    }
}

// ============================================================================
// Pipeline
// ============================================================================

/// Annotator plus ordered enrichment stages
pub struct AnnotationPipeline {
    annotator: Box<dyn Annotator>,
    stages: Vec<Box<dyn EnrichmentStage>>,
}

impl AnnotationPipeline {
    pub fn new(annotator: Box<dyn Annotator>, stages: Vec<Box<dyn EnrichmentStage>>) -> Self {
        Self { annotator, stages }
    }

    /// Named entities only, no keyword lists
    pub fn standard(annotator: Box<dyn Annotator>) -> Self {
        Self::new(annotator, vec![Box::new(NamedEntityStage)])
    }

    /// Build stages from configured keyword files
    pub fn from_config(annotator: Box<dyn Annotator>, config: &ExtractionConfig) -> Result<Self> {
        let mut stages: Vec<Box<dyn EnrichmentStage>> = Vec::new();

        if let Some(path) = &config.compound_keywords {
            let keywords = KeywordList::from_file(path, "COMPOUND")?;
            stages.push(Box::new(CompoundKeywordStage::new(keywords)));
        }

        stages.push(Box::new(NamedEntityStage));

        if let Some(path) = &config.simple_keywords {
            let mut keywords = KeywordList::from_file(path, "KEYWORD")?;
            if config.include_plurals {
                keywords = keywords.with_plurals();
            }
            stages.push(Box::new(SimpleKeywordStage::new(keywords)));
        }

        let pipeline = Self::new(annotator, stages);
        info!(
            annotator = pipeline.annotator.name(),
            stages = ?pipeline.stage_names(),
            "Annotation pipeline ready"
        );
        Ok(pipeline)
    }

    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    pub fn annotator_name(&self) -> &str {
        self.annotator.name()
    }

    /// Annotate text and rebuild each sentence's entities through the stages
    pub fn annotate(&self, text: &str) -> Result<Document> {
        if text.trim().is_empty() {
            return Err(KgError::AnnotationFailure(
                "cannot annotate empty text".to_string(),
            ));
        }

        let mut document = self.annotator.annotate(text)?;
        for sentence in &mut document.sentences {
            let mut entities: Vec<EntityMention> = Vec::new();
            for stage in &self.stages {
                let added = stage.enrich(sentence, &entities);
                debug!(stage = stage.name(), added = added.len(), "Enrichment stage");
                entities.extend(added);
            }
            entities.sort_by_key(|e| (e.start, e.end));
            sentence.entities = entities;
        }
        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kgq_core::Token;

    struct FixedAnnotator(Document);

    impl Annotator for FixedAnnotator {
        fn annotate(&self, _text: &str) -> Result<Document> {
            Ok(self.0.clone())
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    fn document() -> Document {
        let tokens = ["the", "stock", "market", "holds", "bank", "assets"]
            .iter()
            .enumerate()
            .map(|(i, w)| Token::new(i, *w, *w, "dep"))
            .collect();
        let sentence = Sentence::new(tokens).with_entities(vec![
            EntityMention::new(2, 3, "market", "market").with_label("ORG"),
            EntityMention::new(4, 5, "bank", "bank").with_label("ORG"),
        ]);
        Document::new(vec![sentence])
    }

    #[test]
    fn test_standard_keeps_named_entities() {
        let pipeline = AnnotationPipeline::standard(Box::new(FixedAnnotator(document())));
        let doc = pipeline.annotate("the stock market holds bank assets").unwrap();
        let lemmas: Vec<&str> = doc.sentences[0].entities.iter().map(|e| e.lemma.as_str()).collect();
        assert_eq!(lemmas, vec!["market", "bank"]);
        assert_eq!(pipeline.stage_names(), vec!["named_entities"]);
    }

    #[test]
    fn test_stage_order_and_overlap() {
        let pipeline = AnnotationPipeline::new(
            Box::new(FixedAnnotator(document())),
            vec![
                Box::new(CompoundKeywordStage::new(KeywordList::new("COMPOUND", ["stock market"]))),
                Box::new(NamedEntityStage),
                Box::new(SimpleKeywordStage::new(
                    KeywordList::new("KEYWORD", ["asset", "market"]).with_plurals(),
                )),
            ],
        );
        let doc = pipeline.annotate("the stock market holds bank assets").unwrap();
        let entities = &doc.sentences[0].entities;
        let spans: Vec<(usize, usize, &str)> = entities
            .iter()
            .map(|e| (e.start, e.end, e.lemma.as_str()))
            .collect();

        // The named "market" overlaps the compound match and is dropped;
        // the simple "market" lies inside "stock market" and is skipped.
        assert_eq!(
            spans,
            vec![(1, 3, "stock market"), (4, 5, "bank"), (5, 6, "assets")]
        );
    }

    #[test]
    fn test_empty_text_fails() {
        let pipeline = AnnotationPipeline::standard(Box::new(FixedAnnotator(document())));
        assert!(matches!(
            pipeline.annotate("  \n"),
            Err(KgError::AnnotationFailure(_))
        ));
    }

    #[test]
    fn test_from_config_without_keyword_files() {
        let pipeline = AnnotationPipeline::from_config(
            Box::new(FixedAnnotator(document())),
            &ExtractionConfig::default(),
        )
        .unwrap();
        assert_eq!(pipeline.stage_names(), vec!["named_entities"]);
        assert_eq!(pipeline.annotator_name(), "fixed");
    }

    #[test]
    fn test_from_config_missing_file() {
        let config = ExtractionConfig {
            compound_keywords: Some("/no/such/compound.txt".into()),
            ..ExtractionConfig::default()
        };
        let result = AnnotationPipeline::from_config(Box::new(FixedAnnotator(document())), &config);
        assert!(matches!(result, Err(KgError::Io { .. })));
    }
}
