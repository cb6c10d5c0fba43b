//! Topic-partitioned triple store
//!
//! Records group every relation seen between one subject/object pair.
//! The persisted form is a JSON object keyed by topic name, then by record
//! id (`triple0`, `triple1`, ...).

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{KgError, Result, Triple};

// ============================================================================
// Record Ids
// ============================================================================

const RECORD_ID_PREFIX: &str = "triple";

/// Per-topic record identifier, serialized as `triple<N>`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordId(u64);

impl RecordId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    fn next(&self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{RECORD_ID_PREFIX}{}", self.0)
    }
}

impl FromStr for RecordId {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        s.strip_prefix(RECORD_ID_PREFIX)
            .and_then(|n| n.parse().ok())
            .map(Self)
            .ok_or_else(|| format!("invalid record id {s:?}, expected {RECORD_ID_PREFIX}<N>"))
    }
}

impl Serialize for RecordId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Records
// ============================================================================

/// Every relation seen between one subject/object pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripleRecord {
    pub subject: String,
    pub relations: Vec<String>,
    pub object: String,
}

impl TripleRecord {
    /// Whether this record joins `a` and `b`, in either order
    pub fn connects(&self, a: &str, b: &str) -> bool {
        (self.subject == a && self.object == b) || (self.subject == b && self.object == a)
    }

    pub fn has_relation(&self, relation: &str) -> bool {
        self.relations.iter().any(|r| r == relation)
    }

    /// Append a relation unless already present; returns true if added
    pub fn add_relation(&mut self, relation: &str) -> bool {
        if self.has_relation(relation) {
            return false;
        }
        self.relations.push(relation.to_string());
        true
    }

    /// Expand into one triple per stored relation, skipping malformed ones
    pub fn triples(&self) -> impl Iterator<Item = Triple> + '_ {
        self.relations
            .iter()
            .filter_map(|relation| Triple::new(&self.subject, relation, &self.object).ok())
    }

    /// Check that no field is empty
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.subject.trim().is_empty() || self.object.trim().is_empty() {
            return Err("record with empty subject or object".to_string());
        }
        if self.relations.is_empty() {
            return Err("record without relations".to_string());
        }
        if self.relations.iter().any(|r| r.trim().is_empty()) {
            return Err("record with an empty relation".to_string());
        }
        Ok(())
    }
}

impl From<&Triple> for TripleRecord {
    fn from(triple: &Triple) -> Self {
        Self {
            subject: triple.subject().to_string(),
            relations: vec![triple.relation().to_string()],
            object: triple.object().to_string(),
        }
    }
}

/// Records of one topic, in id order
pub type TopicRecords = BTreeMap<RecordId, TripleRecord>;

// ============================================================================
// Store
// ============================================================================

/// Outcome of merging a batch of triples into a topic
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeSummary {
    /// New subject/object pairs
    pub records_created: usize,
    /// New relations on an existing pair
    pub relations_added: usize,
    /// Triples already present
    pub unchanged: usize,
}

impl MergeSummary {
    pub fn changed(&self) -> bool {
        self.records_created + self.relations_added > 0
    }
}

/// Mapping from topic name to that topic's records
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TripleStore {
    topics: BTreeMap<String, TopicRecords>,
}

impl TripleStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.values().all(|records| records.is_empty())
    }

    /// Topic names, sorted
    pub fn topics(&self) -> impl Iterator<Item = &str> {
        self.topics.keys().map(String::as_str)
    }

    /// Records of a topic, if the topic exists
    pub fn topic(&self, topic: &str) -> Option<&TopicRecords> {
        self.topics.get(topic)
    }

    /// Records of a topic in id order; empty for unknown topics
    pub fn records(&self, topic: &str) -> impl Iterator<Item = (&RecordId, &TripleRecord)> {
        self.topics.get(topic).into_iter().flat_map(|r| r.iter())
    }

    /// Total number of records across all topics
    pub fn record_count(&self) -> usize {
        self.topics.values().map(BTreeMap::len).sum()
    }

    /// Merge new triples into a topic
    ///
    /// A triple joins the record for its subject/object pair (matched in
    /// either order) or starts a new record. Existing records are never
    /// removed or rewritten.
    pub fn merge(&mut self, topic: &str, triples: &[Triple]) -> MergeSummary {
        let records = self.topics.entry(topic.to_string()).or_default();
        let mut summary = MergeSummary::default();

        for triple in triples {
            let existing = records
                .values_mut()
                .find(|record| record.connects(triple.subject(), triple.object()));

            match existing {
                Some(record) => {
                    if record.add_relation(triple.relation()) {
                        summary.relations_added += 1;
                    } else {
                        summary.unchanged += 1;
                    }
                }
                None => {
                    let id = next_record_id(records);
                    records.insert(id, TripleRecord::from(triple));
                    summary.records_created += 1;
                }
            }
        }

        tracing::debug!(
            topic,
            created = summary.records_created,
            added = summary.relations_added,
            unchanged = summary.unchanged,
            "Merged triples"
        );

        summary
    }

    /// Parse the persisted JSON form; `origin` names the source in errors
    pub fn from_json_str(json: &str, origin: &str) -> Result<Self> {
        let store: Self =
            serde_json::from_str(json).map_err(|e| KgError::StoreCorruption {
                origin: origin.to_string(),
                message: e.to_string(),
            })?;

        for (topic, records) in &store.topics {
            for (id, record) in records {
                record.validate().map_err(|message| KgError::StoreCorruption {
                    origin: origin.to_string(),
                    message: format!("{topic}/{id}: {message}"),
                })?;
            }
        }

        Ok(store)
    }

    /// Render the persisted JSON form
    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| KgError::Other(e.into()))
    }
}

/// One past the largest id, or the lowest unused id once the largest
/// id has reached `u64::MAX`
fn next_record_id(records: &TopicRecords) -> RecordId {
    match records.keys().next_back() {
        None => RecordId(0),
        Some(last) => last.next().unwrap_or_else(|| lowest_free_id(records)),
    }
}

fn lowest_free_id(records: &TopicRecords) -> RecordId {
    let mut candidate = 0u64;
    for id in records.keys() {
        if id.0 != candidate {
            break;
        }
        candidate = candidate.saturating_add(1);
    }
    RecordId(candidate)
}

// ============================================================================
// Tests
// ============================================================================
