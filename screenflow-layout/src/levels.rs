//! Breadth-first depth labelling

use std::collections::VecDeque;

/// Assigns every node the depth at which a breadth-first walk from the root
/// set first reaches it.
///
/// Roots are the nodes without incoming edges; a self-loop does not count as
/// incoming. When every node has a parent (the graph is one big cycle), the
/// first node is the only root. Nodes the walk never reaches sit at level 0.
///
/// Nodes are addressed by their position in the input, edges as
/// `(from, to)` position pairs.
pub struct LevelAssigner {
    successors: Vec<Vec<usize>>,
    has_parent: Vec<bool>,
}

impl LevelAssigner {
    pub fn new(node_count: usize, edges: &[(usize, usize)]) -> Self {
        let mut successors = vec![Vec::new(); node_count];
        let mut has_parent = vec![false; node_count];
        for &(from, to) in edges {
            successors[from].push(to);
            if from != to {
                has_parent[to] = true;
            }
        }
        Self {
            successors,
            has_parent,
        }
    }

    /// Root nodes in input order
    pub fn roots(&self) -> Vec<usize> {
        let roots: Vec<usize> = (0..self.has_parent.len())
            .filter(|&node| !self.has_parent[node])
            .collect();
        if roots.is_empty() && !self.has_parent.is_empty() {
            vec![0]
        } else {
            roots
        }
    }

    /// Level of every node, indexed by node position
    pub fn assign(&self) -> Vec<usize> {
        let mut levels: Vec<Option<usize>> = vec![None; self.successors.len()];
        let mut queue = VecDeque::new();

        for root in self.roots() {
            levels[root] = Some(0);
            queue.push_back((root, 0));
        }

        while let Some((node, level)) = queue.pop_front() {
            for &next in &self.successors[node] {
                if levels[next].is_none() {
                    levels[next] = Some(level + 1);
                    queue.push_back((next, level + 1));
                }
            }
        }

        levels.into_iter().map(|level| level.unwrap_or(0)).collect()
    }
}
