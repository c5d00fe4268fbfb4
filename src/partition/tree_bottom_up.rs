//! Bottom-up tree partitioning.
//!
//! Each subtree remembers only its first (root-ward) block through a queue
//! of Pareto subcases per `(node, cuts)` pair: the cheapest subcase sits at
//! the queue front, the rest are kept because their distinct first-block
//! footprints may combine better with later merges. A parent either cuts
//! the edge to a child, keeping the child's best subcase as-is, or merges
//! the child's first block into its own, updating runtime, memory, peak
//! rate, CPU need and cost incrementally.

use alloc::collections::{BTreeSet, VecDeque};
use alloc::vec;
use alloc::vec::Vec;

use log::debug;

use crate::error::{PartitionError, PartitionResult};
use crate::graph::{critical_path, NodeId, PostOrder, ServiceGraph, PLATFORM};
use crate::partition::types::{
    exceeds, Constraints, CostParams, TreeOutcome, TreePartition, TreeRequest,
};

/// A subtree subcase: attributes of the first block plus the cost of the
/// whole subtree partitioning behind it.
#[derive(Debug, Clone, Copy)]
struct TreeBlock {
    /// Tail node of the first block.
    w: NodeId,
    /// Cost of the whole subtree partitioning.
    sum_cost: u64,
    /// Aggregate runtime of the first block.
    runtime: u64,
    /// Aggregate memory of the first block.
    memory: u64,
    /// Peak rate on the edges inside the first block.
    max_rate: u64,
    /// CPU cores needed by the first block.
    cpu: u64,
}

/// Per-`(node, cuts)` subcase queues; an empty queue marks infeasibility.
struct Subcases {
    queues: Vec<Vec<VecDeque<TreeBlock>>>,
    /// Established cut-count levels per node.
    levels: Vec<usize>,
    memory_bound: Option<u64>,
    core_bound: Option<u64>,
}

impl Subcases {
    fn new(nodes: usize, c_max: usize, cons: &Constraints) -> Self {
        Self {
            queues: vec![vec![VecDeque::new(); c_max + 1]; nodes],
            levels: vec![1; nodes],
            memory_bound: cons.memory,
            core_bound: cons.cores,
        }
    }

    /// Cost of the best subcase for `node` with `c` cuts.
    fn min_cost(&self, node: NodeId, c: usize) -> Option<u64> {
        self.queues[node][c].front().map(|blk| blk.sum_cost)
    }

    /// Inserts a subcase, keeping the cheapest at the queue front and
    /// discarding blocks that break the memory or CPU bound.
    fn insert(&mut self, node: NodeId, c: usize, blk: TreeBlock) {
        if exceeds(self.memory_bound, blk.memory) || exceeds(self.core_bound, blk.cpu) {
            return;
        }
        let queue = &mut self.queues[node][c];
        if queue.front().is_some_and(|front| blk.sum_cost <= front.sum_cost) {
            queue.push_front(blk);
        } else {
            queue.push_back(blk);
        }
    }

    /// Expands every subcase of `(child, c_child)` with `node` and inserts
    /// the results into `(node, c)`; `extra_cost` carries the best subcases
    /// of the node's other subtrees.
    #[allow(clippy::too_many_arguments)]
    fn merge(
        &mut self,
        sg: &ServiceGraph,
        node: NodeId,
        c: usize,
        child: NodeId,
        c_child: usize,
        extra_cost: u64,
        unit: u64,
    ) {
        let node_rt = sg.runtime(node);
        let node_rate = sg.rate(node);
        let subcases: Vec<TreeBlock> = self.queues[child][c_child].iter().copied().collect();
        for blk in subcases {
            // Replace the child's first-block bill with the expanded one.
            let child_cost = sg.rate(child) * (blk.runtime.div_ceil(unit) * unit);
            let runtime = blk.runtime + node_rt;
            let cost = node_rate * (runtime.div_ceil(unit) * unit);
            let max_rate = blk.max_rate.max(node_rate);
            self.insert(
                node,
                c,
                TreeBlock {
                    w: blk.w,
                    sum_cost: (blk.sum_cost - child_cost) + cost + extra_cost,
                    runtime,
                    memory: blk.memory + sg.memory(node),
                    max_rate,
                    cpu: blk.cpu.max(max_rate.div_ceil(node_rate)),
                },
            );
        }
    }

    /// Compacts a queue to its best subcase once the child was merged.
    fn compact(&mut self, node: NodeId, c: usize) {
        let queue = &mut self.queues[node][c];
        if let Some(front) = queue.front().copied() {
            queue.clear();
            queue.push_back(front);
        }
    }
}

/// Partitions a service tree bottom-up.
pub fn btp_partition(sg: &ServiceGraph, req: &TreeRequest) -> PartitionResult<TreeOutcome> {
    req.params.validate()?;
    sg.validate()?;
    if Some(req.root) != sg.root() {
        return Err(PartitionError::graph("root must be the platform's successor"));
    }
    if !sg.contains(req.cp_end) || !sg.is_leaf(req.cp_end) {
        return Err(PartitionError::critical_path(req.cp_end, "must be a leaf"));
    }
    let cpath_list = critical_path(sg, req.root, req.cp_end)?;
    let cpath: BTreeSet<NodeId> = cpath_list.iter().copied().collect();
    let cpath_rt: u64 = cpath_list.iter().map(|&v| sg.runtime(v)).sum();

    let c_max = match req.constraints.latency {
        Some(l) if l < cpath_rt => {
            return Ok(TreeOutcome::LatencyBound { min_latency: cpath_rt });
        }
        Some(l) => (((l - cpath_rt) / req.params.delay) as usize).min(cpath_list.len() - 1),
        None => cpath_list.len() - 1,
    };
    debug!("btp: n={} cpath={:?} c_max={c_max}", sg.len(), cpath_list);

    let unit = req.params.unit;
    let mut dp = Subcases::new(sg.len() + 1, c_max, &req.constraints);

    for (_, n) in PostOrder::new(sg) {
        let single = TreeBlock {
            w: n,
            sum_cost: sg.rate(n) * (sg.runtime(n).div_ceil(unit) * unit),
            runtime: sg.runtime(n),
            memory: sg.memory(n),
            max_rate: sg.rate(n),
            cpu: 1,
        };
        if sg.is_leaf(n) {
            dp.insert(n, 0, single);
            continue;
        }
        let succ: Vec<NodeId> = sg.succ(n).to_vec();
        // Best subcases of the successors hanging off the critical path.
        let mut off_path_cost = Some(0u64);
        for &m in succ.iter().filter(|m| !cpath.contains(*m)) {
            match dp.min_cost(m, 0) {
                Some(cost) => *off_path_cost.as_mut().unwrap() += cost,
                None => {
                    off_path_cost = None;
                    break;
                }
            }
        }
        if !cpath.contains(&n) {
            if let Some(extra) = off_path_cost {
                dp.insert(
                    n,
                    0,
                    TreeBlock {
                        sum_cost: single.sum_cost + extra,
                        ..single
                    },
                );
            }
            for &b in &succ {
                let siblings = sibling_cost(&dp, &succ, &cpath, b);
                if let Some(extra) = siblings {
                    dp.merge(sg, n, 0, b, 0, extra, unit);
                }
                dp.compact(b, 0);
            }
        } else {
            let m_cp = *succ
                .iter()
                .find(|m| cpath.contains(*m))
                .expect("critical path continues below every non-leaf on it");
            let child_levels = dp.levels[m_cp];
            let mut top_level = child_levels.min(c_max + 1) - 1;
            // Cutting the edge to the critical-path child spends one cut.
            for c in 1..=child_levels.min(c_max) {
                if let (Some(extra), Some(cp_cost)) = (off_path_cost, dp.min_cost(m_cp, c - 1)) {
                    dp.insert(
                        n,
                        c,
                        TreeBlock {
                            sum_cost: single.sum_cost + extra + cp_cost,
                            ..single
                        },
                    );
                    if !dp.queues[n][c].is_empty() {
                        top_level = top_level.max(c);
                    }
                }
            }
            for &b in &succ {
                if b == m_cp {
                    for c in 0..=(child_levels - 1).min(c_max) {
                        if let Some(extra) = off_path_cost {
                            dp.merge(sg, n, c, b, c, extra, unit);
                        }
                        dp.compact(b, c);
                    }
                } else {
                    let siblings = sibling_cost(&dp, &succ, &cpath, b);
                    for c in 1..=child_levels.min(c_max) {
                        if let (Some(extra), Some(cp_cost)) = (siblings, dp.min_cost(m_cp, c - 1))
                        {
                            dp.merge(sg, n, c, b, 0, extra + cp_cost, unit);
                        }
                        top_level = top_level.max(child_levels.min(c_max));
                    }
                    dp.compact(b, 0);
                }
            }
            dp.levels[n] = top_level + 1;
        }
    }

    let mut c_opt = None;
    for c in 0..=c_max {
        if let Some(cost) = dp.min_cost(req.root, c) {
            if c_opt.is_none_or(|(_, best)| cost < best) {
                c_opt = Some((c, cost));
            }
        }
    }
    match c_opt {
        Some((c_opt, cost)) => {
            debug!("btp optimum: c={c_opt} cost={cost}");
            Ok(TreeOutcome::Feasible(TreePartition {
                blocks: extract_blocks(sg, &dp, &cpath, req.root, c_opt),
                cost,
                cuts: c_opt,
            }))
        }
        None => Ok(TreeOutcome::Infeasible),
    }
}

/// Sum of the best zero-cut subcases of all off-path siblings of `child`.
fn sibling_cost(
    dp: &Subcases,
    succ: &[NodeId],
    cpath: &BTreeSet<NodeId>,
    child: NodeId,
) -> Option<u64> {
    let mut sum = 0;
    for &m in succ {
        if m == child || cpath.contains(&m) {
            continue;
        }
        sum += dp.min_cost(m, 0)?;
    }
    Some(sum)
}

/// Rebuilds the block partition from the first-block tails stored in the
/// queues: walk each tail up to its barrier, scheduling every off-block
/// successor as a new barrier with one cut less on the critical path.
fn extract_blocks(
    sg: &ServiceGraph,
    dp: &Subcases,
    cpath: &BTreeSet<NodeId>,
    root: NodeId,
    c_opt: usize,
) -> Vec<Vec<NodeId>> {
    let mut blocks = Vec::new();
    let mut pending = vec![(root, c_opt)];
    while let Some((b, c)) = pending.pop() {
        let w = dp.queues[b][c].front().expect("barrier subcase is feasible").w;
        let mut blk = Vec::new();
        let mut prior = None;
        let mut v = w;
        loop {
            for &m in sg.succ(v) {
                if Some(m) != prior {
                    pending.push((m, if cpath.contains(&m) { c - 1 } else { 0 }));
                }
            }
            blk.push(v);
            if v == b {
                break;
            }
            prior = Some(v);
            v = sg.pred(v).expect("block members stay below the platform");
        }
        blk.reverse();
        blocks.push(blk);
    }
    blocks.sort();
    blocks
}
