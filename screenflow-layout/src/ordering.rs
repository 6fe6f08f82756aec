//! Barycenter ordering within levels

use std::cmp::Ordering;

/// Weights closer than this are treated as equal
pub const TIE_EPSILON: f64 = 0.01;

/// Orders the nodes of each level under their parents.
///
/// Level 0 keeps input order. A node on a deeper level is weighted by the
/// mean rank of its distinct direct parents on strictly lower levels and the
/// level is sorted by that weight; nodes without such a parent go last.
/// Equal weights fall back to the node's frame index, then its input position.
pub struct LevelOrderer {
    predecessors: Vec<Vec<usize>>,
}

impl LevelOrderer {
    pub fn new(node_count: usize, edges: &[(usize, usize)]) -> Self {
        let mut predecessors: Vec<Vec<usize>> = vec![Vec::new(); node_count];
        for &(from, to) in edges {
            if !predecessors[to].contains(&from) {
                predecessors[to].push(from);
            }
        }
        Self { predecessors }
    }

    /// Rank of every node within its level, indexed by node position
    pub fn order(&self, levels: &[usize], frame_indices: &[usize]) -> Vec<usize> {
        let node_count = levels.len();
        let max_level = levels.iter().copied().max().unwrap_or(0);

        let mut by_level: Vec<Vec<usize>> = vec![Vec::new(); max_level + 1];
        for (node, &level) in levels.iter().enumerate() {
            by_level[level].push(node);
        }

        let mut order = vec![0; node_count];
        for (rank, &node) in by_level[0].iter().enumerate() {
            order[node] = rank;
        }

        for (level, nodes) in by_level.iter().enumerate().skip(1) {
            let weighted: Vec<Weighted> = nodes
                .iter()
                .map(|&node| Weighted {
                    node,
                    weight: self.parent_weight(node, level, levels, &order),
                    frame_index: frame_indices[node],
                })
                .collect();

            for (rank, node) in rank_by_weight(weighted).into_iter().enumerate() {
                order[node] = rank;
            }
        }

        order
    }

    /// Mean rank of the parents placed on a lower level
    fn parent_weight(&self, node: usize, level: usize, levels: &[usize], order: &[usize]) -> Option<f64> {
        let ranks: Vec<usize> = self.predecessors[node]
            .iter()
            .filter(|&&parent| levels[parent] < level)
            .map(|&parent| order[parent])
            .collect();
        if ranks.is_empty() {
            return None;
        }
        Some(ranks.iter().sum::<usize>() as f64 / ranks.len() as f64)
    }
}

#[derive(Debug, Clone, Copy)]
struct Weighted {
    node: usize,
    weight: Option<f64>,
    frame_index: usize,
}

fn compare_weight(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn is_tie(a: Option<f64>, b: Option<f64>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => (a - b).abs() < TIE_EPSILON,
        (None, None) => true,
        _ => false,
    }
}

/// Sorts by weight, then reorders each run of tied weights chronologically
fn rank_by_weight(mut items: Vec<Weighted>) -> Vec<usize> {
    items.sort_by(|a, b| compare_weight(a.weight, b.weight).then(a.node.cmp(&b.node)));

    let mut ranked = Vec::with_capacity(items.len());
    let mut start = 0;
    while start < items.len() {
        let mut end = start + 1;
        while end < items.len() && is_tie(items[end - 1].weight, items[end].weight) {
            end += 1;
        }
        let run = &mut items[start..end];
        run.sort_by_key(|item| (item.frame_index, item.node));
        ranked.extend(run.iter().map(|item| item.node));
        start = end;
    }
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weighted(node: usize, weight: Option<f64>, frame_index: usize) -> Weighted {
        Weighted {
            node,
            weight,
            frame_index,
        }
    }

    #[test]
    fn test_level_zero_keeps_input_order() {
        let orderer = LevelOrderer::new(3, &[]);
        assert_eq!(orderer.order(&[0, 0, 0], &[9, 5, 1]), vec![0, 1, 2]);
    }

    #[test]
    fn test_children_follow_parents() {
        // Roots 0 and 1; node 2 hangs under 1, node 3 under 0.
        let orderer = LevelOrderer::new(4, &[(1, 2), (0, 3)]);
        let order = orderer.order(&[0, 0, 1, 1], &[0, 1, 2, 3]);
        assert_eq!(order, vec![0, 1, 1, 0]);
    }

    #[test]
    fn test_equal_weights_fall_back_to_frame_index() {
        let orderer = LevelOrderer::new(3, &[(0, 1), (0, 2)]);
        let order = orderer.order(&[0, 1, 1], &[0, 7, 3]);
        assert_eq!(order, vec![0, 1, 0]);
    }

    #[test]
    fn test_equal_frame_index_falls_back_to_input_order() {
        let orderer = LevelOrderer::new(3, &[(0, 2), (0, 1)]);
        let order = orderer.order(&[0, 1, 1], &[0, 4, 4]);
        assert_eq!(order, vec![0, 0, 1]);
    }

    #[test]
    fn test_parents_on_same_or_deeper_level_are_ignored() {
        // Node 2 has parents 0 (level 0) and 3 (level 1, same as 2).
        let orderer = LevelOrderer::new(4, &[(1, 3), (0, 2), (3, 2)]);
        let order = orderer.order(&[0, 0, 1, 1], &[0, 0, 0, 0]);
        // 2 weighs 0 (only parent 0 counts), 3 weighs 1.
        assert_eq!(order[2], 0);
        assert_eq!(order[3], 1);
    }

    #[test]
    fn test_weights_within_epsilon_tie() {
        let ranked = rank_by_weight(vec![
            weighted(0, Some(1.005), 1),
            weighted(1, Some(1.0), 9),
            weighted(2, Some(0.5), 5),
        ]);
        assert_eq!(ranked, vec![2, 0, 1]);
    }

    #[test]
    fn test_weights_apart_are_not_tied() {
        let ranked = rank_by_weight(vec![weighted(0, Some(1.5), 0), weighted(1, Some(1.0), 9)]);
        assert_eq!(ranked, vec![1, 0]);
    }

    #[test]
    fn test_nodes_without_placed_parent_go_last() {
        let ranked = rank_by_weight(vec![
            weighted(0, None, 0),
            weighted(1, Some(3.0), 5),
            weighted(2, None, 1),
        ]);
        assert_eq!(ranked, vec![1, 0, 2]);
    }

    #[test]
    fn test_orders_are_unique_per_level() {
        let edges = [(0, 2), (0, 3), (1, 3), (1, 4), (2, 5), (4, 5)];
        let levels = [0, 0, 1, 1, 1, 2];
        let order = LevelOrderer::new(6, &edges).order(&levels, &[0, 1, 2, 3, 4, 5]);

        for level in 0..=2 {
            let mut ranks: Vec<usize> = (0..6).filter(|&n| levels[n] == level).map(|n| order[n]).collect();
            ranks.sort_unstable();
            assert_eq!(ranks, (0..ranks.len()).collect::<Vec<_>>());
        }
    }
}
