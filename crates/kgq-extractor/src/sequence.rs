//! Entity/relation sequencing and triple building
//!
//! Entities are placed at their last token, relations at their first; the
//! merged sequence is read three items at a time and every
//! entity-relation-entity window becomes a triple.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use kgq_core::{EntityMention, Triple};

use crate::relation::RelationSpan;

/// Entity span over tokens `start..=end`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySpan {
    pub start: usize,
    /// Last token of the entity
    pub end: usize,
    pub lemma: String,
}

impl EntitySpan {
    pub fn new(start: usize, end: usize, lemma: impl Into<String>) -> Self {
        Self {
            start,
            end: end.max(start),
            lemma: lemma.into(),
        }
    }

    /// Whether `position` lies within the entity's tokens
    pub fn covers(&self, position: usize) -> bool {
        self.start <= position && position <= self.end
    }

    fn width(&self) -> usize {
        self.end.saturating_sub(self.start)
    }
}

impl From<&EntityMention> for EntitySpan {
    fn from(mention: &EntityMention) -> Self {
        Self::new(mention.start, mention.last_token(), mention.lemma.clone())
    }
}

/// An entity or relation placed in the sentence sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OrderedItem {
    Entity(EntitySpan),
    Relation(RelationSpan),
}

impl OrderedItem {
    /// Ordering position: last token for entities, first token for relations
    pub fn position(&self) -> usize {
        match self {
            Self::Entity(e) => e.end,
            Self::Relation(r) => r.start,
        }
    }

    pub fn lemma(&self) -> &str {
        match self {
            Self::Entity(e) => &e.lemma,
            Self::Relation(r) => &r.lemma,
        }
    }

    pub fn is_entity(&self) -> bool {
        matches!(self, Self::Entity(_))
    }

    fn sort_key(&self) -> (usize, u8) {
        (self.position(), if self.is_entity() { 0 } else { 1 })
    }
}

/// Merge entities and relations into one sequence with strictly
/// increasing positions
///
/// A relation starting inside an entity is dropped. Entities ending on the
/// same token collapse to the widest one, and relations starting on the same
/// token collapse to the longest phrase.
pub fn order_entities_and_relations(
    entities: &[EntitySpan],
    relations: &[RelationSpan],
) -> Vec<OrderedItem> {
    let mut kept_entities: Vec<&EntitySpan> = Vec::new();
    for entity in entities {
        match kept_entities.iter_mut().find(|e| e.end == entity.end) {
            Some(existing) if entity.width() > existing.width() => *existing = entity,
            Some(_) => {}
            None => kept_entities.push(entity),
        }
    }

    let mut kept_relations: Vec<&RelationSpan> = Vec::new();
    for relation in relations {
        if let Some(entity) = kept_entities.iter().find(|e| e.covers(relation.start)) {
            debug!(
                relation = %relation.lemma,
                entity = %entity.lemma,
                "Dropping relation inside entity span"
            );
            continue;
        }
        match kept_relations.iter_mut().find(|r| r.start == relation.start) {
            Some(existing) if relation.end > existing.end => *existing = relation,
            Some(_) => {}
            None => kept_relations.push(relation),
        }
    }

    let mut items: Vec<OrderedItem> = kept_entities
        .into_iter()
        .cloned()
        .map(OrderedItem::Entity)
        .chain(kept_relations.into_iter().cloned().map(OrderedItem::Relation))
        .collect();
    items.sort_by_key(OrderedItem::sort_key);
    items
}

/// Emit a triple for every entity-relation-entity window
pub fn build_triples(items: &[OrderedItem]) -> Vec<Triple> {
    items
        .windows(3)
        .filter_map(|window| match window {
            [OrderedItem::Entity(subject), OrderedItem::Relation(relation), OrderedItem::Entity(object)] => {
                match Triple::new(&subject.lemma, &relation.lemma, &object.lemma) {
                    Ok(triple) => Some(triple),
                    Err(e) => {
                        warn!(error = %e, "Rejected triple candidate");
                        None
                    }
                }
            }
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn positions(items: &[OrderedItem]) -> Vec<usize> {
        items.iter().map(OrderedItem::position).collect()
    }

    #[test]
    fn test_relation_inside_entity_dropped() {
        let entities = vec![EntitySpan::new(0, 0, "bank"), EntitySpan::new(4, 5, "stock market")];
        let relations = vec![RelationSpan::new(1, 2, "own"), RelationSpan::new(4, 5, "stock")];

        let items = order_entities_and_relations(&entities, &relations);
        assert_eq!(positions(&items), vec![0, 1, 5]);
        assert!(items.iter().all(|i| i.lemma() != "stock"));
        assert!(positions(&items).windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_equal_relation_starts_keep_longest() {
        let relations = vec![
            RelationSpan::new(1, 2, "determine"),
            RelationSpan::new(1, 3, "determine by"),
        ];
        let items = order_entities_and_relations(&[], &relations);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].lemma(), "determine by");
    }

    #[test]
    fn test_equal_entity_ends_keep_widest() {
        let entities = vec![EntitySpan::new(3, 3, "market"), EntitySpan::new(2, 3, "stock market")];
        let items = order_entities_and_relations(&entities, &[]);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].lemma(), "stock market");
    }

    #[test]
    fn test_inverted_entity_span_has_no_width() {
        let inverted = EntitySpan {
            start: 5,
            end: 3,
            lemma: "market".to_string(),
        };
        assert_eq!(inverted.width(), 0);

        let entities = vec![inverted, EntitySpan::new(2, 3, "stock market")];
        let items = order_entities_and_relations(&entities, &[]);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].lemma(), "stock market");
    }

    #[test]
    fn test_sorted_by_position() {
        let entities = vec![EntitySpan::new(4, 4, "asset"), EntitySpan::new(0, 0, "bank")];
        let relations = vec![RelationSpan::new(2, 3, "own")];
        let items = order_entities_and_relations(&entities, &relations);
        assert_eq!(positions(&items), vec![0, 2, 4]);
        assert!(items[0].is_entity());
        assert!(!items[1].is_entity());
    }

    #[test]
    fn test_build_single_triple() {
        let items = vec![
            OrderedItem::Entity(EntitySpan::new(0, 0, "bank")),
            OrderedItem::Relation(RelationSpan::new(1, 2, "own")),
            OrderedItem::Entity(EntitySpan::new(2, 2, "asset")),
        ];
        let triples = build_triples(&items);
        assert_eq!(triples, vec![Triple::new("bank", "own", "asset").unwrap()]);
    }

    #[test]
    fn test_build_skips_non_matching_windows() {
        let items = vec![
            OrderedItem::Relation(RelationSpan::new(0, 1, "say")),
            OrderedItem::Entity(EntitySpan::new(1, 1, "bank")),
            OrderedItem::Entity(EntitySpan::new(2, 2, "fund")),
            OrderedItem::Relation(RelationSpan::new(3, 4, "buy")),
            OrderedItem::Entity(EntitySpan::new(4, 4, "bond")),
            OrderedItem::Relation(RelationSpan::new(5, 6, "from")),
            OrderedItem::Entity(EntitySpan::new(6, 6, "state")),
        ];
        let triples: Vec<String> = build_triples(&items).iter().map(ToString::to_string).collect();
        assert_eq!(triples, vec!["(fund, buy, bond)", "(bond, from, state)"]);
    }

    #[test]
    fn test_build_rejects_empty_lemma() {
        let items = vec![
            OrderedItem::Entity(EntitySpan::new(0, 0, "bank")),
            OrderedItem::Relation(RelationSpan::new(1, 2, "own")),
            OrderedItem::Entity(EntitySpan::new(2, 2, " ")),
        ];
        assert!(build_triples(&items).is_empty());
    }

    #[test]
    fn test_too_short() {
        assert!(build_triples(&[]).is_empty());
        let items = vec![OrderedItem::Entity(EntitySpan::new(0, 0, "bank"))];
        assert!(build_triples(&items).is_empty());
    }
}
