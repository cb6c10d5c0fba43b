//! Knowledge graph display panels
//!
//! A panel turns one tier of matched triples into a small directed graph:
//! subject -> relation -> object, with entity and relation nodes shared by
//! label. Only a few distinct relations are drawn per panel; triples past
//! the cap are counted but not drawn.

use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};

use kgq_core::Triple;

/// Text shown on a panel with nothing to draw
pub const NO_MATCH: &str = "No Match Found";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Entity,
    Relation,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DisplayNode {
    pub label: String,
    pub kind: NodeKind,
}

/// One titled knowledge graph panel
#[derive(Debug, Clone)]
pub struct DisplayPanel {
    title: String,
    graph: DiGraph<DisplayNode, ()>,
    node_index: HashMap<(NodeKind, String), NodeIndex>,
    relation_cap: usize,
    shown: usize,
    hidden: usize,
}

impl DisplayPanel {
    pub fn new(title: impl Into<String>, relation_cap: usize) -> Self {
        Self {
            title: title.into(),
            graph: DiGraph::new(),
            node_index: HashMap::new(),
            relation_cap,
            shown: 0,
            hidden: 0,
        }
    }

    /// Panel over a list of triples, in order
    pub fn from_triples(title: impl Into<String>, triples: &[Triple], relation_cap: usize) -> Self {
        let mut panel = Self::new(title, relation_cap);
        for triple in triples {
            panel.add_triple(triple);
        }
        panel
    }

    /// Draw a triple; returns false when the relation cap hides it
    pub fn add_triple(&mut self, triple: &Triple) -> bool {
        let relation_key = (NodeKind::Relation, triple.relation().to_string());
        if !self.node_index.contains_key(&relation_key)
            && self.relation_count() >= self.relation_cap
        {
            self.hidden += 1;
            return false;
        }

        let subject = self.node(NodeKind::Entity, triple.subject());
        let relation = self.node(NodeKind::Relation, triple.relation());
        let object = self.node(NodeKind::Entity, triple.object());
        self.graph.update_edge(subject, relation, ());
        self.graph.update_edge(relation, object, ());
        self.shown += 1;
        true
    }

    fn node(&mut self, kind: NodeKind, label: &str) -> NodeIndex {
        if let Some(&idx) = self.node_index.get(&(kind, label.to_string())) {
            return idx;
        }
        let idx = self.graph.add_node(DisplayNode {
            label: label.to_string(),
            kind,
        });
        self.node_index.insert((kind, label.to_string()), idx);
        idx
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Distinct relation nodes drawn
    pub fn relation_count(&self) -> usize {
        self.node_index
            .keys()
            .filter(|(kind, _)| *kind == NodeKind::Relation)
            .count()
    }

    /// Triples drawn
    pub fn shown(&self) -> usize {
        self.shown
    }

    /// Triples left out by the relation cap
    pub fn hidden(&self) -> usize {
        self.hidden
    }

    /// Nothing was matched for this panel
    pub fn no_match(&self) -> bool {
        self.shown == 0 && self.hidden == 0
    }

    pub fn as_petgraph(&self) -> &DiGraph<DisplayNode, ()> {
        &self.graph
    }

    /// Serializable view of the panel
    pub fn summary(&self) -> PanelSummary {
        let nodes = self.graph.node_weights().cloned().collect();
        let edges = self
            .graph
            .edge_references()
            .map(|e| {
                (
                    self.graph[e.source()].label.clone(),
                    self.graph[e.target()].label.clone(),
                )
            })
            .collect();

        PanelSummary {
            title: self.title.clone(),
            no_match: self.no_match(),
            message: self.no_match().then(|| NO_MATCH.to_string()),
            nodes,
            edges,
            shown: self.shown,
            hidden: self.hidden,
        }
    }
}

/// Panel contents for output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelSummary {
    pub title: String,
    pub no_match: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub nodes: Vec<DisplayNode>,
    /// (from, to) node labels
    pub edges: Vec<(String, String)>,
    pub shown: usize,
    pub hidden: usize,
}
