//! KGQ Extractor - Subject-relation-object triple extraction
//!
//! Normalizes raw text, annotates it through an external annotator plus
//! keyword enrichment stages, keeps simple sentences only, and reads
//! triples off the ordered entity/relation sequence of each sentence.

pub mod annotator;
pub mod keywords;
pub mod normalize;
pub mod pipeline;
pub mod query;
pub mod relation;
pub mod sentence;
pub mod sequence;

pub use annotator::HttpAnnotator;
pub use keywords::KeywordList;
pub use normalize::normalize;
pub use pipeline::{
    AnnotationPipeline, CompoundKeywordStage, EnrichmentStage, NamedEntityStage,
    SimpleKeywordStage,
};
pub use query::QueryParser;
pub use relation::{RelationDetector, RelationPattern, RelationSpan};
pub use sentence::{is_simple, sentence_shape, SentenceShape};
pub use sequence::{build_triples, order_entities_and_relations, EntitySpan, OrderedItem};

use std::sync::Arc;

use tracing::{debug, info};

use kgq_core::{Result, Sentence, Triple};

/// Document-level triple extraction
pub struct TripleExtractor {
    pipeline: Arc<AnnotationPipeline>,
    detector: RelationDetector,
}

impl TripleExtractor {
    pub fn new(pipeline: Arc<AnnotationPipeline>) -> Self {
        Self {
            pipeline,
            detector: RelationDetector::new(),
        }
    }

    pub fn with_detector(mut self, detector: RelationDetector) -> Self {
        self.detector = detector;
        self
    }

    /// Extract triples from every simple sentence of `text`
    pub fn extract_triples(&self, text: &str) -> Result<Vec<Triple>> {
        let normalized = normalize(text);
        let document = self.pipeline.annotate(&normalized)?;

        let mut triples = Vec::new();
        let mut skipped = 0usize;
        for (index, sentence) in document.sentences.iter().enumerate() {
            let shape = sentence_shape(sentence);
            if shape != SentenceShape::Simple {
                debug!(sentence = index, %shape, text = %sentence.text(), "Skipping sentence");
                skipped += 1;
                continue;
            }
            triples.extend(self.sentence_triples(sentence));
        }

        info!(
            sentences = document.sentences.len(),
            skipped,
            triples = triples.len(),
            "Extracted triples"
        );
        Ok(triples)
    }

    /// Triples of one sentence, without the simple-sentence check
    pub fn sentence_triples(&self, sentence: &Sentence) -> Vec<Triple> {
        let entities: Vec<EntitySpan> = sentence.entities.iter().map(EntitySpan::from).collect();
        let relations = self.detector.detect(sentence);
        let items = order_entities_and_relations(&entities, &relations);
        build_triples(&items)
    }
}
