//! KGQ Graph - Triple persistence and retrieval
//!
//! Stores extracted triples per topic, buckets stored triples into relevance
//! tiers against a query, and groups those tiers into knowledge graph panels.

pub mod classify;
pub mod display;
pub mod json_store;
pub mod session;

pub use classify::{classify, classify_query, Tier, TieredMatches};
pub use display::{DisplayNode, DisplayPanel, NodeKind, PanelSummary};
pub use json_store::JsonFileStore;
pub use session::{DrawReport, SessionContext, SessionManager, SessionStore};

use kgq_core::{MergeSummary, Result, Triple, TripleStore};

/// Persistent home of a [`TripleStore`]
pub trait TripleRepository: Send + Sync {
    /// Read the whole store; a store that was never written is empty
    fn load(&self) -> Result<TripleStore>;

    /// Replace the persisted store
    fn save(&self, store: &TripleStore) -> Result<()>;

    /// Load, merge into `topic` and persist as one serialized step
    fn merge(&self, topic: &str, triples: &[Triple]) -> Result<MergeSummary>;

    /// Where the store lives, for logs and errors
    fn location(&self) -> String;
}
