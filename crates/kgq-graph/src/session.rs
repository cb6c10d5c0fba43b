//! Per-session draw and save cycle
//!
//! A draw stages the session's document triples in a private store file,
//! classifies them and the shared database against the session's question,
//! and builds the display panels. The private store is removed when its
//! guard drops, whether the draw succeeded or not.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use kgq_core::{DisplayConfig, KgError, MergeSummary, QueryContext, Result, Triple};

use crate::classify::{classify_query, TieredMatches};
use crate::display::{DisplayPanel, PanelSummary};
use crate::json_store::JsonFileStore;
use crate::TripleRepository;

/// Everything one user session has produced so far
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionContext {
    pub id: Uuid,
    pub topic: String,
    /// Triples extracted from the session's document
    pub triples: Vec<Triple>,
    /// Parsed question
    pub query: QueryContext,
}

impl SessionContext {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            topic: topic.into(),
            triples: Vec::new(),
            query: QueryContext::default(),
        }
    }

    pub fn with_triples(mut self, triples: Vec<Triple>) -> Self {
        self.triples = triples;
        self
    }

    pub fn with_query(mut self, query: QueryContext) -> Self {
        self.query = query;
        self
    }
}

// ============================================================================
// Private Session Store
// ============================================================================

/// Session-scoped store file, removed on drop
#[derive(Debug)]
pub struct SessionStore {
    store: JsonFileStore,
    released: bool,
}

impl SessionStore {
    /// Private store for `session_id` inside `dir`
    pub fn create(dir: &Path, session_id: Uuid) -> Result<Self> {
        std::fs::create_dir_all(dir).map_err(|e| KgError::io(dir, e))?;
        let path = dir.join(format!("private-{session_id}.json"));
        Ok(Self {
            store: JsonFileStore::new(path),
            released: false,
        })
    }

    pub fn path(&self) -> &Path {
        self.store.path()
    }

    pub fn repository(&self) -> &JsonFileStore {
        &self.store
    }

    /// Remove the store file now; later calls do nothing
    pub fn release(&mut self) -> Result<()> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        self.store.remove()
    }
}

impl Drop for SessionStore {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            warn!(path = %self.path().display(), error = %e, "Failed to remove session store");
        }
    }
}

// ============================================================================
// Session Manager
// ============================================================================

/// Result of one draw
#[derive(Debug, Clone, Serialize)]
pub struct DrawReport {
    pub session_id: Uuid,
    pub topic: String,
    /// Tiers over the session's own document
    pub document: TieredMatches,
    /// Tiers over the shared database
    pub database: TieredMatches,
    /// Four document panels followed by two database panels
    pub panels: Vec<PanelSummary>,
}

/// Draw and save operations over a shared triple database
pub struct SessionManager {
    database: Arc<dyn TripleRepository>,
    session_dir: PathBuf,
    display: DisplayConfig,
}

impl SessionManager {
    pub fn new(
        database: Arc<dyn TripleRepository>,
        session_dir: impl Into<PathBuf>,
        display: DisplayConfig,
    ) -> Self {
        Self {
            database,
            session_dir: session_dir.into(),
            display,
        }
    }

    pub fn database(&self) -> &Arc<dyn TripleRepository> {
        &self.database
    }

    /// Classify the session's document and the shared database against its question
    pub fn draw(&self, session: &SessionContext) -> Result<DrawReport> {
        let mut private = SessionStore::create(&self.session_dir, session.id)?;
        let repository = private.repository();
        repository.merge(&session.topic, &session.triples)?;
        let staged = repository.load()?;

        let document = classify_query(&staged, &session.topic, &session.query);
        let shared = self.database.load()?;
        let database = classify_query(&shared, &session.topic, &session.query);

        let panels = self.panels(&session.query, &document, &database);
        private.release()?;

        info!(
            session = %session.id,
            topic = %session.topic,
            document_matches = document.total(),
            database_matches = database.total(),
            "Drew knowledge graph"
        );

        Ok(DrawReport {
            session_id: session.id,
            topic: session.topic.clone(),
            document,
            database,
            panels,
        })
    }

    /// Merge the session's document triples into the shared database
    pub fn save(&self, session: &SessionContext) -> Result<MergeSummary> {
        let summary = self.database.merge(&session.topic, &session.triples)?;
        info!(
            session = %session.id,
            topic = %session.topic,
            database = %self.database.location(),
            created = summary.records_created,
            added = summary.relations_added,
            "Saved session triples"
        );
        Ok(summary)
    }

    fn panels(
        &self,
        query: &QueryContext,
        document: &TieredMatches,
        database: &TieredMatches,
    ) -> Vec<PanelSummary> {
        let (ent1, ent2) = query.entity_pair().unwrap_or(("", ""));
        let cap = self.display.relation_cap;

        [
            ("Perfect Match from your Doc".to_string(), &document.exact),
            ("Both similar Entities from your Doc".to_string(), &document.entity_pair),
            (format!("Entity '{ent1}' from your doc"), &document.first_entity),
            (format!("Entity '{ent2}' from your doc"), &document.second_entity),
            ("Perfect Match from our Database".to_string(), &database.exact),
            ("Partial Match from our Database".to_string(), &database.entity_pair),
        ]
        .into_iter()
        .map(|(title, triples)| DisplayPanel::from_triples(title, triples, cap).summary())
        .collect()
    }
}
