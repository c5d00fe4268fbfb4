//! Traversal helpers over service graphs.

use alloc::collections::BTreeSet;
use alloc::vec;
use alloc::vec::Vec;

use crate::error::{PartitionError, PartitionResult};
use crate::graph::{NodeId, ServiceGraph, PLATFORM};

/// Post-order depth-first traversal yielding `(predecessor, node)` pairs.
///
/// Every function node is yielded exactly once, after all of its
/// descendants; the platform node itself is not yielded.
pub struct PostOrder<'a> {
    sg: &'a ServiceGraph,
    stack: Vec<(NodeId, usize)>,
}

impl<'a> PostOrder<'a> {
    pub fn new(sg: &'a ServiceGraph) -> Self {
        Self {
            sg,
            stack: vec![(PLATFORM, 0)],
        }
    }
}

impl Iterator for PostOrder<'_> {
    type Item = (NodeId, NodeId);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(&(v, visited)) = self.stack.last() {
            if visited < self.sg.out_degree(v) {
                self.stack.last_mut().unwrap().1 += 1;
                self.stack.push((self.sg.succ(v)[visited], 0));
            } else {
                self.stack.pop();
                if let Some(&(pred, _)) = self.stack.last() {
                    return Some((pred, v));
                }
            }
        }
        None
    }
}

/// Nodes of the chain from `leaf` back to `start`, in backward order.
///
/// Both endpoints are included; `None` if `start` is not an ancestor of
/// `leaf`.
pub fn backtrack_chain(sg: &ServiceGraph, start: NodeId, leaf: NodeId) -> Option<Vec<NodeId>> {
    let mut chain = vec![leaf];
    let mut last = leaf;
    while last != start {
        last = sg.pred(last)?;
        if last == PLATFORM && start != PLATFORM {
            return None;
        }
        chain.push(last);
    }
    Some(chain)
}

/// The critical path from `root` to `cp_end` in forward order.
pub fn critical_path(
    sg: &ServiceGraph,
    root: NodeId,
    cp_end: NodeId,
) -> PartitionResult<Vec<NodeId>> {
    if !sg.contains(cp_end) || cp_end == PLATFORM {
        return Err(PartitionError::UnknownNode { node: cp_end });
    }
    let mut path = backtrack_chain(sg, root, cp_end)
        .ok_or_else(|| PartitionError::critical_path(cp_end, "not reachable from the root"))?;
    path.reverse();
    Ok(path)
}

/// For every node, the set of leaves reachable from it.
///
/// Indexed by node id; the platform entry holds all leaves of the service.
pub fn leaf_labels(sg: &ServiceGraph) -> Vec<BTreeSet<NodeId>> {
    let mut labels: Vec<BTreeSet<NodeId>> = vec![BTreeSet::new(); sg.len() + 1];
    // Ids are topologically ordered, so a reverse sweep sees children first.
    for v in (0..=sg.len()).rev() {
        if v != PLATFORM && sg.is_leaf(v) {
            labels[v].insert(v);
        } else {
            let mut set = BTreeSet::new();
            for &c in sg.succ(v) {
                set.extend(labels[c].iter().copied());
            }
            labels[v] = set;
        }
    }
    labels
}

/// A maximal sub-chain starting at some node, bisected at the last node
/// from which a designated leaf is still reachable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubchainSplit {
    /// Chain prefix that can still reach the designated leaf.
    pub head: Vec<NodeId>,
    /// Chain continuation past the bisection point (possibly empty).
    pub tail: Vec<NodeId>,
    /// Children branching off the chain at its branching nodes.
    pub branches: BTreeSet<NodeId>,
}

impl SubchainSplit {
    /// The whole sub-chain, head followed by tail.
    pub fn subchain(&self) -> Vec<NodeId> {
        let mut nodes = self.head.clone();
        nodes.extend_from_slice(&self.tail);
        nodes
    }
}

/// Enumerates the sub-chains reachable from `start` together with their
/// off-chain branches.
///
/// With `leaf` set, each sub-chain is bisected at the last node from which
/// `leaf` remains reachable (the head may then run through branching
/// nodes); without it, the maximal chains themselves are produced.
pub fn subchain_splits(
    sg: &ServiceGraph,
    labels: &[BTreeSet<NodeId>],
    start: NodeId,
    leaf: Option<NodeId>,
) -> Vec<SubchainSplit> {
    let mut chain = vec![start];
    while sg.out_degree(*chain.last().unwrap()) == 1 {
        chain.push(sg.succ(*chain.last().unwrap())[0]);
    }
    let last = *chain.last().unwrap();
    if sg.is_leaf(last) {
        return vec![SubchainSplit {
            head: chain,
            tail: Vec::new(),
            branches: BTreeSet::new(),
        }];
    }
    let children: BTreeSet<NodeId> = sg.succ(last).iter().copied().collect();
    let mut splits = Vec::new();
    for &c in sg.succ(last) {
        let mut nbr = children.clone();
        nbr.remove(&c);
        for sub in subchain_splits(sg, labels, c, leaf) {
            let mut branches = nbr.clone();
            branches.extend(sub.branches.iter().copied());
            let split = match leaf {
                Some(l) if labels[sub.head[0]].contains(&l) => {
                    let mut head = chain.clone();
                    head.extend_from_slice(&sub.head);
                    SubchainSplit {
                        head,
                        tail: sub.tail,
                        branches,
                    }
                }
                Some(_) => {
                    let mut tail = sub.head;
                    tail.extend_from_slice(&sub.tail);
                    SubchainSplit {
                        head: chain.clone(),
                        tail,
                        branches,
                    }
                }
                None => {
                    let mut head = chain.clone();
                    head.extend_from_slice(&sub.head);
                    SubchainSplit {
                        head,
                        tail: Vec::new(),
                        branches,
                    }
                }
            };
            splits.push(split);
        }
    }
    splits
}

/// The blocks induced by a barrier set: every non-barrier node joins its
/// nearest root-ward barrier. Blocks and their members are id-sorted.
pub fn subtrees(sg: &ServiceGraph, barr: &BTreeSet<NodeId>) -> Vec<Vec<NodeId>> {
    let mut blocks = Vec::with_capacity(barr.len());
    for &b in barr {
        let mut nodes = vec![b];
        let mut queue = vec![b];
        while let Some(u) = queue.pop() {
            for &v in sg.succ(u) {
                if !barr.contains(&v) {
                    nodes.push(v);
                    queue.push(v);
                }
            }
        }
        nodes.sort_unstable();
        blocks.push(nodes);
    }
    blocks.sort();
    blocks
}

/// Slices `path` into runs of consecutive nodes that share a block of
/// `partition`.
pub fn path_blocks(partition: &[Vec<NodeId>], path: &[NodeId]) -> Vec<Vec<NodeId>> {
    let mut parts: Vec<Vec<NodeId>> = Vec::new();
    let mut current: Option<usize> = None;
    for &v in path {
        if let Some(idx) = partition.iter().position(|blk| blk.contains(&v)) {
            if current == Some(idx) {
                parts.last_mut().unwrap().push(v);
            } else {
                parts.push(vec![v]);
                current = Some(idx);
            }
        }
    }
    parts
}
