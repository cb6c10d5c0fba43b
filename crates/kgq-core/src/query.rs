//! Parsed question context

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Entities and relation terms mentioned in a question
///
/// Entities keep first-mention order so the first and last entity of a
/// question are well defined; relations are an unordered set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryContext {
    entities: Vec<String>,
    relations: BTreeSet<String>,
}

impl QueryContext {
    /// Create a context, dropping duplicates and empty terms
    pub fn new<E, R>(entities: E, relations: R) -> Self
    where
        E: IntoIterator,
        E::Item: AsRef<str>,
        R: IntoIterator,
        R::Item: AsRef<str>,
    {
        let mut context = Self::default();
        for entity in entities {
            context.add_entity(entity.as_ref());
        }
        for relation in relations {
            context.add_relation(relation.as_ref());
        }
        context
    }

    /// Add an entity unless empty or already present
    pub fn add_entity(&mut self, entity: &str) {
        let entity = entity.trim();
        if !entity.is_empty() && !self.entities.iter().any(|e| e == entity) {
            self.entities.push(entity.to_string());
        }
    }

    /// Add a relation term unless empty
    pub fn add_relation(&mut self, relation: &str) {
        let relation = relation.trim();
        if !relation.is_empty() {
            self.relations.insert(relation.to_string());
        }
    }

    pub fn entities(&self) -> &[String] {
        &self.entities
    }

    pub fn relations(&self) -> &BTreeSet<String> {
        &self.relations
    }

    /// First and last mentioned entity; the same entity twice when only one
    pub fn entity_pair(&self) -> Option<(&str, &str)> {
        let first = self.entities.first()?;
        let last = self.entities.last()?;
        Some((first.as_str(), last.as_str()))
    }

    /// True when either the entity set or the relation set is empty
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty() || self.relations.is_empty()
    }
}
