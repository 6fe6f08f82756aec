//! Canvas coordinates for a sitemap graph

use crate::{Error, LayoutConfig, LevelAssigner, LevelOrderer, Result};
use log::{debug, warn};
use screenflow_core::{LayoutNode, SitemapGraph};
use serde::{Deserialize, Serialize};

/// Positioned screens and the canvas size they need
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    /// Nodes in the same order as the input screens
    pub nodes: Vec<LayoutNode>,
    pub width: f64,
    pub height: f64,
}

impl Layout {
    /// Gets a positioned node by screen id
    pub fn node(&self, id: &str) -> Option<&LayoutNode> {
        self.nodes.iter().find(|n| n.screen.id == id)
    }

    /// Number of levels in the diagram
    pub fn level_count(&self) -> usize {
        self.nodes.iter().map(|n| n.level + 1).max().unwrap_or(0)
    }
}

/// Computes a layered layout: one row per level, rows centered on the widest
pub struct LayoutEngine {
    config: LayoutConfig,
}

impl LayoutEngine {
    /// Creates a new layout engine
    pub fn new(config: LayoutConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Lays out `graph`. The graph itself is left untouched.
    pub fn layout(&self, graph: &SitemapGraph) -> Result<Layout> {
        let duplicates = graph.duplicate_ids();
        if !duplicates.is_empty() {
            return Err(Error::GraphInconsistency(format!(
                "duplicate screen ids: {}",
                duplicates.join(", ")
            )));
        }

        let edges = resolve_edges(graph);
        let node_count = graph.nodes.len();

        let levels = LevelAssigner::new(node_count, &edges).assign();
        let frame_indices: Vec<usize> = graph.nodes.iter().map(|n| n.frame_index).collect();
        let order = LevelOrderer::new(node_count, &edges).order(&levels, &frame_indices);

        let LayoutConfig {
            node_width,
            node_height,
            gap_x,
            gap_y,
            margin,
        } = self.config;

        let max_level = levels.iter().copied().max().unwrap_or(0);
        let mut row_counts = vec![0usize; max_level + 1];
        for &level in &levels {
            row_counts[level] += 1;
        }

        let row_width = |count: usize| {
            if count == 0 {
                0.0
            } else {
                count as f64 * (node_width + gap_x) - gap_x
            }
        };
        let max_row_width = row_counts.iter().map(|&c| row_width(c)).fold(0.0, f64::max);

        let nodes: Vec<LayoutNode> = graph
            .nodes
            .iter()
            .enumerate()
            .map(|(i, screen)| {
                let level = levels[i];
                let offset = (max_row_width - row_width(row_counts[level])) / 2.0;
                LayoutNode {
                    screen: screen.clone(),
                    x: margin + offset + order[i] as f64 * (node_width + gap_x),
                    y: margin + level as f64 * (node_height + gap_y),
                    level,
                    order_in_level: order[i],
                }
            })
            .collect();

        let (width, height) = if nodes.is_empty() {
            (2.0 * margin, 2.0 * margin)
        } else {
            (
                max_row_width + 2.0 * margin,
                (max_level + 1) as f64 * (node_height + gap_y) + 2.0 * margin,
            )
        };

        debug!(
            "Laid out {} screens on {} levels ({}x{})",
            nodes.len(),
            row_counts.len(),
            width,
            height
        );

        Ok(Layout { nodes, width, height })
    }
}

/// Edges as node position pairs, without the ones pointing at unknown screens
fn resolve_edges(graph: &SitemapGraph) -> Vec<(usize, usize)> {
    let index = graph.index_by_id();
    graph
        .edges
        .iter()
        .filter_map(|edge| {
            match (index.get(edge.from_id.as_str()), index.get(edge.to_id.as_str())) {
                (Some(&from), Some(&to)) => Some((from, to)),
                _ => {
                    warn!(
                        "Dropping edge '{}' -> '{}': unknown screen id",
                        edge.from_id, edge.to_id
                    );
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use screenflow_core::{FlowEdge, ScreenNode};

    fn screen(id: &str, frame_index: usize) -> ScreenNode {
        ScreenNode::new(id, id.to_uppercase(), "", frame_index)
    }

    fn edge(from: &str, to: &str) -> FlowEdge {
        FlowEdge::new(from, to, "tap")
    }

    fn engine() -> LayoutEngine {
        LayoutEngine::new(LayoutConfig::default()).unwrap()
    }

    #[test]
    fn test_fan_out_layout() {
        let graph = SitemapGraph::new(
            vec![screen("a", 0), screen("b", 1), screen("c", 2)],
            vec![edge("a", "b"), edge("a", "c")],
        );
        let layout = engine().layout(&graph).unwrap();

        let a = layout.node("a").unwrap();
        let b = layout.node("b").unwrap();
        let c = layout.node("c").unwrap();
        assert_eq!((a.level, b.level, c.level), (0, 1, 1));
        assert_eq!((b.order_in_level, c.order_in_level), (0, 1));

        // Widest row: 2 * (260 + 80) - 80 = 600
        assert_eq!(layout.width, 680.0);
        assert_eq!(layout.height, 2.0 * 320.0 + 80.0);
        assert_eq!((a.x, a.y), (40.0 + 170.0, 40.0));
        assert_eq!((b.x, b.y), (40.0, 360.0));
        assert_eq!((c.x, c.y), (380.0, 360.0));
    }

    #[test]
    fn test_back_edge_terminates() {
        let graph = SitemapGraph::new(
            vec![screen("a", 0), screen("b", 1), screen("c", 2)],
            vec![edge("a", "b"), edge("b", "c"), edge("c", "a")],
        );
        let layout = engine().layout(&graph).unwrap();

        assert_eq!(layout.node("a").unwrap().level, 0);
        assert_eq!(layout.node("b").unwrap().level, 1);
        assert_eq!(layout.node("c").unwrap().level, 2);
        assert_eq!(layout.level_count(), 3);
    }

    #[test]
    fn test_layout_is_idempotent() {
        let graph = SitemapGraph::new(
            vec![screen("home", 0), screen("list", 1), screen("detail", 2), screen("cart", 3)],
            vec![
                edge("home", "list"),
                edge("list", "detail"),
                edge("detail", "list"),
                edge("home", "cart"),
                edge("detail", "cart"),
            ],
        );
        let engine = engine();
        assert_eq!(engine.layout(&graph).unwrap(), engine.layout(&graph).unwrap());
    }

    #[test]
    fn test_acyclic_invariants() {
        let ids = ["a", "b", "c", "d", "e", "f"];
        let graph = SitemapGraph::new(
            ids.iter().enumerate().map(|(i, id)| screen(id, i)).collect(),
            vec![
                edge("a", "b"),
                edge("a", "c"),
                edge("b", "d"),
                edge("c", "d"),
                edge("d", "e"),
                edge("f", "e"),
            ],
        );
        let layout = engine().layout(&graph).unwrap();

        assert!(layout.nodes.iter().all(|n| n.level < ids.len()));
        assert_eq!(layout.node("a").unwrap().level, 0);
        assert_eq!(layout.node("f").unwrap().level, 0);

        for level in 0..layout.level_count() {
            let mut ranks: Vec<usize> = layout
                .nodes
                .iter()
                .filter(|n| n.level == level)
                .map(|n| n.order_in_level)
                .collect();
            ranks.sort_unstable();
            assert_eq!(ranks, (0..ranks.len()).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_nodes_in_a_row_do_not_overlap() {
        let graph = SitemapGraph::new(
            vec![screen("root", 0), screen("x", 3), screen("y", 1), screen("z", 2)],
            vec![edge("root", "x"), edge("root", "y"), edge("root", "z")],
        );
        let layout = engine().layout(&graph).unwrap();

        let mut row: Vec<&LayoutNode> = layout.nodes.iter().filter(|n| n.level == 1).collect();
        row.sort_by(|a, b| a.x.total_cmp(&b.x));
        let ids: Vec<&str> = row.iter().map(|n| n.screen.id.as_str()).collect();
        assert_eq!(ids, vec!["y", "z", "x"]);
        for pair in row.windows(2) {
            assert!(pair[1].x - pair[0].x >= 260.0);
        }
    }

    #[test]
    fn test_dangling_edges_are_dropped() {
        let graph = SitemapGraph::new(
            vec![screen("a", 0), screen("b", 1)],
            vec![edge("a", "b"), edge("a", "ghost"), edge("ghost", "a")],
        );
        let layout = engine().layout(&graph).unwrap();

        assert_eq!(layout.node("a").unwrap().level, 0);
        assert_eq!(layout.node("b").unwrap().level, 1);
    }

    #[test]
    fn test_duplicate_ids_are_rejected() {
        let graph = SitemapGraph::new(vec![screen("a", 0), screen("a", 1)], vec![]);
        let err = engine().layout(&graph).unwrap_err();
        assert!(matches!(err, Error::GraphInconsistency(msg) if msg.contains('a')));
    }

    #[test]
    fn test_empty_graph() {
        let layout = engine().layout(&SitemapGraph::default()).unwrap();
        assert!(layout.nodes.is_empty());
        assert_eq!((layout.width, layout.height), (80.0, 80.0));
        assert_eq!(layout.level_count(), 0);
    }

    #[test]
    fn test_layout_json_uses_camel_case() {
        let graph = SitemapGraph::new(vec![screen("a", 4)], vec![]);
        let layout = engine().layout(&graph).unwrap();
        let json = serde_json::to_value(&layout).unwrap();

        let node = &json["nodes"][0];
        assert_eq!(node["id"], "a");
        assert_eq!(node["frameIndex"], 4);
        assert_eq!(node["orderInLevel"], 0);
        assert_eq!(node["x"], 40.0);
        assert_eq!(json["width"], 340.0);
    }
}
