//! Constraint-free clustering heuristics.
//!
//! Quick partitioning baselines driven by the edge attributes alone: they
//! ignore the memory, CPU and latency bounds and are not cost-optimal, but
//! give reasonable block layouts for interactive exploration.

use alloc::collections::{BTreeSet, VecDeque};
use alloc::vec::Vec;

use crate::error::PartitionResult;
use crate::graph::{subtrees, NodeId, ServiceGraph};

/// Cuts every branching node's child edges except the highest-rate one.
///
/// Keeping the hottest edge merged avoids billing the most frequent
/// invocations as separate block starts.
pub fn min_rate_cut_partitioning(sg: &ServiceGraph) -> PartitionResult<BTreeSet<NodeId>> {
    sg.validate()?;
    let root = sg.root().expect("validated graph has a root");
    let mut barr = BTreeSet::from([root]);
    for v in sg.functions().filter(|&v| sg.is_branching(v)) {
        let mut keep = sg.succ(v)[0];
        for &c in &sg.succ(v)[1..] {
            if sg.rate(c) > sg.rate(keep) {
                keep = c;
            }
        }
        barr.extend(sg.succ(v).iter().copied().filter(|&c| c != keep));
    }
    Ok(barr)
}

/// Clusters the tree into `k` blocks by transferred data volume.
///
/// Ranks all function pairs by the reciprocal rate·data weight summed over
/// the tree path between them, labels path edges in ascending order, and
/// cuts below the `k` most recently labelled edges, so the most loosely
/// coupled paths end up separated first.
///
/// # Panics
/// Panics if `k` is zero.
pub fn min_split_clustering(sg: &ServiceGraph, k: usize) -> PartitionResult<Vec<Vec<NodeId>>> {
    assert!(k >= 1, "cluster count must be positive");
    sg.validate()?;
    let root = sg.root().expect("validated graph has a root");

    // Reciprocal transfer weight of the in-edge of every function.
    let edge_weight =
        |v: NodeId| 1.0 / ((sg.rate(v) * sg.data(v)) as f64);

    // Pairwise distances, in pair enumeration order for a stable sort.
    let functions: Vec<NodeId> = sg.functions().collect();
    let mut distances: Vec<((NodeId, NodeId), f64)> = Vec::new();
    for (i, &u) in functions.iter().enumerate() {
        for &v in &functions[i + 1..] {
            let dist = tree_path(sg, u, v).iter().map(|&h| edge_weight(h)).sum();
            distances.push(((u, v), dist));
        }
    }
    distances.sort_by(|a, b| a.1.total_cmp(&b.1));

    let mut unlabeled: BTreeSet<NodeId> = sg.functions().filter(|&v| v != root).collect();
    let mut labeled: VecDeque<NodeId> = VecDeque::with_capacity(k);
    for ((u, v), _) in distances {
        let on_path: Vec<NodeId> = tree_path(sg, u, v)
            .into_iter()
            .filter(|h| unlabeled.contains(h))
            .collect();
        if on_path.is_empty() {
            continue;
        }
        for h in on_path {
            unlabeled.remove(&h);
            if labeled.len() == k {
                labeled.pop_front();
            }
            labeled.push_back(h);
        }
        if unlabeled.is_empty() {
            break;
        }
    }

    let mut barr = BTreeSet::from([root]);
    barr.extend(labeled);
    Ok(subtrees(sg, &barr))
}

/// Head nodes of the edges on the unique tree path between `u` and `v`,
/// in increasing id order.
fn tree_path(sg: &ServiceGraph, u: NodeId, v: NodeId) -> Vec<NodeId> {
    let mut ancestors = BTreeSet::new();
    let mut x = u;
    loop {
        ancestors.insert(x);
        match sg.pred(x) {
            Some(p) => x = p,
            None => break,
        }
    }
    let mut heads = Vec::new();
    let mut y = v;
    while !ancestors.contains(&y) {
        heads.push(y);
        y = sg.pred(y).expect("pair members share the platform as ancestor");
    }
    let lca = y;
    let mut x = u;
    while x != lca {
        heads.push(x);
        x = sg.pred(x).expect("walking toward an ancestor");
    }
    heads.sort_unstable();
    heads
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::PLATFORM;

    fn sample_tree() -> ServiceGraph {
        // platform -> 1 -> {2 -> 4, 3}; edge rates favour 1 -> 2
        let mut sg = ServiceGraph::new();
        for _ in 0..4 {
            sg.add_function(10, 1);
        }
        sg.add_invocation(PLATFORM, 1, 1).unwrap();
        sg.add_invocation_with_data(1, 2, 5, 4).unwrap();
        sg.add_invocation_with_data(1, 3, 2, 1).unwrap();
        sg.add_invocation_with_data(2, 4, 1, 2).unwrap();
        sg
    }

    #[test]
    fn test_min_rate_cut_keeps_hottest_edge() {
        let sg = sample_tree();
        let barr = min_rate_cut_partitioning(&sg).unwrap();

        assert_eq!(barr, BTreeSet::from([1, 3]));
        assert_eq!(subtrees(&sg, &barr), vec![vec![1, 2, 4], vec![3]]);
    }

    #[test]
    fn test_tree_path_heads() {
        let sg = sample_tree();

        assert_eq!(tree_path(&sg, 4, 3), vec![2, 3, 4]);
        assert_eq!(tree_path(&sg, 1, 4), vec![2, 4]);
    }

    #[test]
    fn test_min_split_clustering_covers_all_nodes() {
        let sg = sample_tree();
        let blocks = min_split_clustering(&sg, 2).unwrap();

        let mut nodes: Vec<NodeId> = blocks.iter().flatten().copied().collect();
        nodes.sort_unstable();
        assert_eq!(nodes, vec![1, 2, 3, 4]);
    }
}
