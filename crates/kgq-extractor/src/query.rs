//! Question parsing into entity and relation terms

use std::sync::Arc;

use tracing::debug;

use kgq_core::{QueryContext, Result};

use crate::pipeline::AnnotationPipeline;
use crate::relation::RelationDetector;

/// Turns a question into a [`QueryContext`]
pub struct QueryParser {
    pipeline: Arc<AnnotationPipeline>,
    detector: RelationDetector,
}

impl QueryParser {
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

    /// Entity lemmas in mention order, plus the last word of every relation
    ///
    /// The question is only lower-cased; stop words and brackets are kept.
    pub fn parse_query(&self, question: &str) -> Result<QueryContext> {
        let document = self.pipeline.annotate(&question.to_lowercase())?;

        let mut context = QueryContext::default();
        for sentence in &document.sentences {
            for entity in &sentence.entities {
                context.add_entity(&entity.lemma);
            }
            for relation in self.detector.detect(sentence) {
                context.add_relation(relation.last_word());
            }
        }

        debug!(
            entities = ?context.entities(),
            relations = ?context.relations(),
            "Parsed query"
        );
        Ok(context)
    }
}
