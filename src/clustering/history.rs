//! The immutable merge tree recorded by a clustering run.
//!
//! Nodes live in a flat arena and refer to each other by index. The first
//! `n_inputs` nodes are the input particles, in input order; every later node
//! is the result of recombining two earlier nodes. A node that was promoted to
//! an inclusive jet (merged with the beam) has no child.

use crate::types::FourMomentum;

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryNode {
    pub momentum: FourMomentum,
    /// The two nodes recombined into this one, harder-first is not implied.
    pub parents: Option<(usize, usize)>,
    /// The node this one was recombined into.
    pub child: Option<usize>,
    /// Distance measure at which this node was created (0 for inputs).
    pub dij: f64,
    /// Set when the node left the clustering as an inclusive jet.
    pub beam_distance: Option<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct MergeTree {
    nodes: Vec<HistoryNode>,
    n_inputs: usize,
}

impl MergeTree {
    pub(crate) fn with_inputs(inputs: impl IntoIterator<Item = FourMomentum>) -> Self {
        let nodes: Vec<HistoryNode> = inputs
            .into_iter()
            .map(|momentum| HistoryNode {
                momentum,
                parents: None,
                child: None,
                dij: 0.0,
                beam_distance: None,
            })
            .collect();
        let n_inputs = nodes.len();
        Self { nodes, n_inputs }
    }

    /// Records the recombination of `a` and `b`; returns the new node index.
    pub(crate) fn merge(&mut self, a: usize, b: usize, momentum: FourMomentum, dij: f64) -> usize {
        let new_index = self.nodes.len();
        self.nodes.push(HistoryNode {
            momentum,
            parents: Some((a, b)),
            child: None,
            dij,
            beam_distance: None,
        });
        self.nodes[a].child = Some(new_index);
        self.nodes[b].child = Some(new_index);
        new_index
    }

    pub(crate) fn finish(&mut self, node: usize, dib: f64) {
        self.nodes[node].beam_distance = Some(dib);
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn n_inputs(&self) -> usize {
        self.n_inputs
    }

    pub fn node(&self, index: usize) -> &HistoryNode {
        &self.nodes[index]
    }

    pub fn parents(&self, index: usize) -> Option<(usize, usize)> {
        self.nodes[index].parents
    }

    /// Input indices of every leaf below `index`, in depth-first order.
    pub fn leaves(&self, index: usize) -> Vec<usize> {
        let mut out = Vec::new();
        let mut stack = vec![index];
        while let Some(current) = stack.pop() {
            match self.nodes[current].parents {
                Some((a, b)) => {
                    stack.push(b);
                    stack.push(a);
                }
                None => out.push(current),
            }
        }
        out
    }

    /// Number of recombinations in the subtree rooted at `index`.
    pub fn n_merges(&self, index: usize) -> usize {
        self.leaves(index).len().saturating_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leaves_follow_parent_links() {
        let mut tree = MergeTree::with_inputs(vec![
            FourMomentum::new(1.0, 0.0, 0.0, 1.0),
            FourMomentum::new(0.0, 1.0, 0.0, 1.0),
            FourMomentum::new(0.0, 0.0, 1.0, 1.0),
        ]);
        let ab = tree.merge(0, 1, FourMomentum::new(1.0, 1.0, 0.0, 2.0), 0.1);
        let abc = tree.merge(ab, 2, FourMomentum::new(1.0, 1.0, 1.0, 3.0), 0.2);
        tree.finish(abc, 0.3);

        assert_eq!(tree.n_inputs(), 3);
        assert_eq!(tree.len(), 5);
        assert_eq!(tree.parents(abc), Some((ab, 2)));
        assert_eq!(tree.node(0).child, Some(ab));
        assert_eq!(tree.leaves(abc), vec![0, 1, 2]);
        assert_eq!(tree.n_merges(abc), 2);
        assert_eq!(tree.n_merges(2), 0);
        assert_eq!(tree.node(abc).beam_distance, Some(0.3));
    }
}
