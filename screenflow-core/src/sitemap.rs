//! Sitemap graph data structures
//!
//! A sitemap is the set of distinct screens found in a recording together with
//! the transitions observed between them. It is produced by the external
//! analysis step and consumed read-only by layout.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A distinct UI state observed in the recording
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenNode {
    /// Unique identifier of the screen
    pub id: String,
    /// Short human-readable name
    pub label: String,
    /// Longer description of what the screen shows
    #[serde(default)]
    pub description: String,
    /// Index of the representative frame in the captured frame sequence
    pub frame_index: usize,
}

impl ScreenNode {
    /// Creates a new screen node
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        description: impl Into<String>,
        frame_index: usize,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            description: description.into(),
            frame_index,
        }
    }
}

/// A directed transition between two screens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowEdge {
    pub from_id: String,
    pub to_id: String,
    /// The user action that caused the transition
    #[serde(default)]
    pub label: String,
}

impl FlowEdge {
    /// Creates a new edge
    pub fn new(from_id: impl Into<String>, to_id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            from_id: from_id.into(),
            to_id: to_id.into(),
            label: label.into(),
        }
    }

    /// Checks if this edge starts and ends at the same screen
    pub fn is_self_loop(&self) -> bool {
        self.from_id == self.to_id
    }
}

/// Screens and the transitions between them
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SitemapGraph {
    #[serde(rename = "screens")]
    pub nodes: Vec<ScreenNode>,
    #[serde(default)]
    pub edges: Vec<FlowEdge>,
}

impl SitemapGraph {
    /// Creates a new graph
    pub fn new(nodes: Vec<ScreenNode>, edges: Vec<FlowEdge>) -> Self {
        Self { nodes, edges }
    }

    /// Gets a node by id
    pub fn node(&self, id: &str) -> Option<&ScreenNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Maps each node id to its position in `nodes`.
    ///
    /// When ids repeat, the first occurrence wins.
    pub fn index_by_id(&self) -> HashMap<&str, usize> {
        let mut index = HashMap::with_capacity(self.nodes.len());
        for (i, node) in self.nodes.iter().enumerate() {
            index.entry(node.id.as_str()).or_insert(i);
        }
        index
    }

    /// Returns the ids that appear on more than one node
    pub fn duplicate_ids(&self) -> Vec<&str> {
        let mut seen = HashMap::new();
        let mut duplicates = Vec::new();
        for node in &self.nodes {
            let count = seen.entry(node.id.as_str()).or_insert(0usize);
            *count += 1;
            if *count == 2 {
                duplicates.push(node.id.as_str());
            }
        }
        duplicates
    }

    /// Returns edges whose endpoints reference unknown node ids
    pub fn dangling_edges(&self) -> Vec<&FlowEdge> {
        let index = self.index_by_id();
        self.edges
            .iter()
            .filter(|e| !index.contains_key(e.from_id.as_str()) || !index.contains_key(e.to_id.as_str()))
            .collect()
    }
}

/// A screen with its computed diagram position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutNode {
    #[serde(flatten)]
    pub screen: ScreenNode,
    /// Left edge of the node on the canvas
    pub x: f64,
    /// Top edge of the node on the canvas
    pub y: f64,
    /// Depth of the node from the graph's root set
    pub level: usize,
    /// Rank of the node within its level (0-based)
    pub order_in_level: usize,
}
