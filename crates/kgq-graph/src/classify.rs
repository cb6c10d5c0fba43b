//! Tiered matching of stored triples against a query
//!
//! Each record of a topic lands in at most one tier, checked in priority
//! order: exact match, same entity pair, first entity as subject, second
//! entity as subject.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use kgq_core::{QueryContext, Triple, TripleRecord, TripleStore};

/// Relevance tier, highest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Same entity pair and a matching relation
    Exact,
    /// Same entity pair, other relations
    EntityPair,
    /// Subject is the first query entity
    FirstEntity,
    /// Subject is the second query entity
    SecondEntity,
}

impl Tier {
    pub const ALL: [Tier; 4] = [
        Tier::Exact,
        Tier::EntityPair,
        Tier::FirstEntity,
        Tier::SecondEntity,
    ];
}

/// Matched triples bucketed by tier
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TieredMatches {
    pub exact: Vec<Triple>,
    pub entity_pair: Vec<Triple>,
    pub first_entity: Vec<Triple>,
    pub second_entity: Vec<Triple>,
}

impl TieredMatches {
    pub fn tier(&self, tier: Tier) -> &[Triple] {
        match tier {
            Tier::Exact => &self.exact,
            Tier::EntityPair => &self.entity_pair,
            Tier::FirstEntity => &self.first_entity,
            Tier::SecondEntity => &self.second_entity,
        }
    }

    fn tier_mut(&mut self, tier: Tier) -> &mut Vec<Triple> {
        match tier {
            Tier::Exact => &mut self.exact,
            Tier::EntityPair => &mut self.entity_pair,
            Tier::FirstEntity => &mut self.first_entity,
            Tier::SecondEntity => &mut self.second_entity,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    pub fn total(&self) -> usize {
        Tier::ALL.iter().map(|t| self.tier(*t).len()).sum()
    }
}

/// Bucket a topic's records against an entity pair and relation terms
///
/// A stored relation matches when it contains any query relation as a
/// substring. Blank relation terms are ignored, and a query left with no
/// terms matches nothing. Unknown topics classify as empty.
pub fn classify<I>(
    store: &TripleStore,
    topic: &str,
    (ent1, ent2): (&str, &str),
    relations: I,
) -> TieredMatches
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let relations: Vec<String> = relations
        .into_iter()
        .filter_map(|r| {
            let r: &str = r.as_ref();
            (!r.trim().is_empty()).then(|| r.to_string())
        })
        .collect();
    if relations.is_empty() {
        debug!(topic, "No non-blank relation terms");
        return TieredMatches::default();
    }
    let matches_query = |stored: &str| relations.iter().any(|r| stored.contains(r.as_str()));

    let mut matches = TieredMatches::default();
    for (id, record) in store.records(topic) {
        if is_malformed(record) {
            trace!(%id, "Skipping malformed record");
            continue;
        }

        let (tier, triples): (Tier, Vec<Triple>) = if record.connects(ent1, ent2) {
            let exact: Vec<Triple> = record
                .triples()
                .filter(|t| matches_query(t.relation()))
                .collect();
            if exact.is_empty() {
                (Tier::EntityPair, record.triples().collect())
            } else {
                (Tier::Exact, exact)
            }
        } else if record.subject == ent1 {
            (Tier::FirstEntity, record.triples().collect())
        } else if record.subject == ent2 {
            (Tier::SecondEntity, record.triples().collect())
        } else {
            continue;
        };

        trace!(%id, ?tier, count = triples.len(), "Record matched");
        matches.tier_mut(tier).extend(triples);
    }

    debug!(
        topic,
        ent1,
        ent2,
        exact = matches.exact.len(),
        entity_pair = matches.entity_pair.len(),
        first_entity = matches.first_entity.len(),
        second_entity = matches.second_entity.len(),
        "Classified records"
    );
    matches
}

/// Classify against a parsed question
///
/// A question without entities or without relations yields four empty
/// tiers. Otherwise the first and last mentioned entities form the pair.
pub fn classify_query(store: &TripleStore, topic: &str, query: &QueryContext) -> TieredMatches {
    if query.is_empty() {
        debug!(topic, "Query has no entities or no relations");
        return TieredMatches::default();
    }
    match query.entity_pair() {
        Some(pair) => classify(store, topic, pair, query.relations()),
        None => TieredMatches::default(),
    }
}

fn is_malformed(record: &TripleRecord) -> bool {
    record.subject.trim().is_empty()
        || record.object.trim().is_empty()
        || record.relations.iter().all(|r| r.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triple(s: &str, r: &str, o: &str) -> Triple {
        Triple::new(s, r, o).unwrap()
    }

    fn store(triples: &[Triple]) -> TripleStore {
        let mut store = TripleStore::new();
        store.merge("finance", triples);
        store
    }

    #[test]
    fn test_exact_match() {
        let store = store(&[triple("company", "own", "asset")]);
        let matches = classify(&store, "finance", ("company", "asset"), ["own"]);
        assert_eq!(matches.exact, vec![triple("company", "own", "asset")]);
        assert_eq!(matches.total(), 1);
    }

    #[test]
    fn test_entity_pair_when_relation_differs() {
        let store = store(&[triple("company", "own", "asset")]);
        let matches = classify(&store, "finance", ("company", "asset"), ["sell"]);
        assert!(matches.exact.is_empty());
        assert_eq!(matches.entity_pair, vec![triple("company", "own", "asset")]);
        assert_eq!(matches.total(), 1);
    }

    #[test]
    fn test_pair_matches_in_either_order() {
        let store = store(&[triple("asset", "belong to", "company")]);
        let matches = classify(&store, "finance", ("company", "asset"), ["to"]);
        assert_eq!(matches.exact, vec![triple("asset", "belong to", "company")]);
    }

    #[test]
    fn test_exact_emits_only_matching_relations() {
        let store = store(&[
            triple("company", "own", "asset"),
            triple("company", "sell", "asset"),
            triple("asset", "owned by", "company"),
        ]);
        let matches = classify(&store, "finance", ("company", "asset"), ["own"]);
        assert_eq!(
            matches.exact,
            vec![
                triple("company", "own", "asset"),
                triple("company", "owned by", "asset"),
            ]
        );
        assert!(matches.entity_pair.is_empty());
    }

    #[test]
    fn test_single_entity_tiers() {
        let store = store(&[
            triple("company", "issue", "bond"),
            triple("asset", "lose", "value"),
            triple("bank", "lend", "money"),
        ]);
        let matches = classify(&store, "finance", ("company", "asset"), ["own"]);
        assert_eq!(matches.first_entity, vec![triple("company", "issue", "bond")]);
        assert_eq!(matches.second_entity, vec![triple("asset", "lose", "value")]);
        assert_eq!(matches.total(), 2);
    }

    #[test]
    fn test_empty_and_unknown_topic() {
        let empty = TripleStore::new();
        assert!(classify(&empty, "finance", ("company", "asset"), ["own"]).is_empty());

        let store = store(&[triple("company", "own", "asset")]);
        assert!(classify(&store, "economy", ("company", "asset"), ["own"]).is_empty());
    }

    #[test]
    fn test_blank_relation_terms_match_nothing() {
        let store = store(&[
            triple("company", "own", "asset"),
            triple("company", "issue", "bond"),
        ]);
        let matches = classify(&store, "finance", ("company", "asset"), [""]);
        assert_eq!(matches, TieredMatches::default());
        let matches = classify(&store, "finance", ("company", "asset"), Vec::<&str>::new());
        assert_eq!(matches, TieredMatches::default());

        let matches = classify(&store, "finance", ("company", "asset"), [" ", "own"]);
        assert_eq!(matches.exact, vec![triple("company", "own", "asset")]);
        assert_eq!(matches.first_entity, vec![triple("company", "issue", "bond")]);
        assert_eq!(matches.total(), 2);
    }

    #[test]
    fn test_classify_query() {
        let store = store(&[triple("company", "own", "asset")]);

        let query = QueryContext::new(["company", "market", "asset"], ["own"]);
        let matches = classify_query(&store, "finance", &query);
        assert_eq!(matches.tier(Tier::Exact).len(), 1);

        let no_relations = QueryContext::new(["company", "asset"], Vec::<String>::new());
        assert_eq!(
            classify_query(&store, "finance", &no_relations),
            TieredMatches::default()
        );

        let no_entities = QueryContext::new(Vec::<String>::new(), ["own"]);
        assert!(classify_query(&store, "finance", &no_entities).is_empty());
    }

    #[test]
    fn test_single_entity_query_uses_it_twice() {
        let store = store(&[triple("company", "own", "asset")]);
        let query = QueryContext::new(["company"], ["own"]);
        let matches = classify_query(&store, "finance", &query);
        assert_eq!(matches.first_entity.len(), 1);
        assert!(matches.second_entity.is_empty());
    }
}
