//! Meta tree partitioning.
//!
//! Walks the tree's branching skeleton post-order and lets a chain
//! partitioner solve every extracted sub-chain in isolation, combining the
//! per-subtree optima indexed by the number of cuts spent on the critical
//! path. Any [`ChainPartitioner`] can be threaded through; the DP variant
//! is the default.

use alloc::collections::BTreeSet;
use alloc::vec;
use alloc::vec::Vec;

use hashbrown::HashMap;
use log::debug;

use crate::error::{PartitionError, PartitionResult};
use crate::graph::{
    critical_path, leaf_labels, subchain_splits, subtrees, NodeId, PostOrder, ServiceGraph,
    PLATFORM,
};
use crate::partition::types::{
    ChainOutcome, ChainRequest, ChainView, TableOutcome, TreeOutcome, TreePartition, TreeRequest,
};
use crate::partition::{ChainPartitioner, ScpChain};

/// Best partitioning of a subtree for a given critical-path cut count.
#[derive(Debug, Clone)]
struct TreePart {
    barr: BTreeSet<NodeId>,
    cost: u64,
}

/// Partitions a service tree with the default chain partitioner.
pub fn mtp_partition(sg: &ServiceGraph, req: &TreeRequest) -> PartitionResult<TreeOutcome> {
    mtp_partition_with(&ScpChain, sg, req)
}

/// Partitions a service tree, solving sub-chains with `partitioner`.
pub fn mtp_partition_with<P: ChainPartitioner>(
    partitioner: &P,
    sg: &ServiceGraph,
    req: &TreeRequest,
) -> PartitionResult<TreeOutcome> {
    req.params.validate()?;
    sg.validate()?;
    if Some(req.root) != sg.root() {
        return Err(PartitionError::graph("root must be the platform's successor"));
    }
    if !sg.contains(req.cp_end) || !sg.is_leaf(req.cp_end) {
        return Err(PartitionError::critical_path(req.cp_end, "must be a leaf"));
    }
    let labels = leaf_labels(sg);
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
    debug!("mtp: n={} cpath={:?} c_max={c_max}", sg.len(), cpath_list);

    let mut dp: Vec<Vec<Option<TreePart>>> = vec![vec![None; c_max + 1]; sg.len() + 1];

    for (pred, n) in PostOrder::new(sg) {
        // Subcases are anchored at children of branching nodes (and the root).
        if sg.out_degree(pred) <= 1 && pred != PLATFORM {
            continue;
        }
        if sg.is_leaf(n) {
            // A single function always fits some block on its own.
            let (runtime, memory, rate) = ([sg.runtime(n)], [sg.memory(n)], [sg.rate(n)]);
            let view = ChainView::new(&runtime, &memory, &rate)?;
            let creq = ChainRequest::new(req.constraints.without_latency(), req.params);
            if let ChainOutcome::Feasible(p) = partitioner.partition(view, &creq)? {
                let count = if n == req.cp_end { c_max.max(1) } else { 1 };
                for c in 0..count {
                    dp[n][c] = Some(TreePart {
                        barr: BTreeSet::from([n]),
                        cost: p.cost,
                    });
                }
            }
            continue;
        }

        for split in subchain_splits(sg, &labels, n, Some(req.cp_end)) {
            let subchain = split.subchain();
            let runtime: Vec<u64> = subchain.iter().map(|&v| sg.runtime(v)).collect();
            let memory: Vec<u64> = subchain.iter().map(|&v| sg.memory(v)).collect();
            let rate: Vec<u64> = subchain.iter().map(|&v| sg.rate(v)).collect();
            let view = ChainView::new(&runtime, &memory, &rate)?;

            // Cost and barriers of the branches hanging off this sub-chain.
            let mut branch_cost = Some(0u64);
            let mut branch_barr: BTreeSet<NodeId> = BTreeSet::new();
            for &m in split.branches.iter().filter(|m| !cpath.contains(*m)) {
                match &dp[m][0] {
                    Some(part) => {
                        *branch_cost.as_mut().unwrap() += part.cost;
                        branch_barr.extend(part.barr.iter().copied());
                    }
                    None => {
                        branch_cost = None;
                        break;
                    }
                }
            }

            if !cpath.contains(&n) {
                // Sub-chain disjoint from the critical path: a single
                // latency-free optimum covers the whole subtree.
                let Some(bc) = branch_cost else { continue };
                let creq = ChainRequest::new(req.constraints.without_latency(), req.params);
                if let ChainOutcome::Feasible(p) = partitioner.partition(view, &creq)? {
                    let cost = p.cost + bc;
                    if dp[n][0].as_ref().is_none_or(|cur| cost < cur.cost) {
                        let mut barr: BTreeSet<NodeId> =
                            p.barriers.iter().map(|&b| subchain[b]).collect();
                        barr.extend(branch_barr.iter().copied());
                        dp[n][0] = Some(TreePart { barr, cost });
                    }
                }
            } else if *subchain.last().unwrap() == req.cp_end {
                if subchain[0] == req.root {
                    // The sub-chain is the whole critical path: solve it
                    // once under the full latency budget.
                    let creq = ChainRequest::new(req.constraints, req.params);
                    match partitioner.partition(view, &creq)? {
                        ChainOutcome::Feasible(p) => {
                            let Some(bc) = branch_cost else { continue };
                            let mut barr: BTreeSet<NodeId> =
                                p.barriers.iter().map(|&b| subchain[b]).collect();
                            barr.extend(branch_barr.iter().copied());
                            let part = TreePart { barr, cost: p.cost + bc };
                            for c in (p.barriers.len() - 1)..=c_max {
                                if dp[n][c].as_ref().is_none_or(|cur| part.cost < cur.cost) {
                                    dp[n][c] = Some(part.clone());
                                }
                            }
                        }
                        ChainOutcome::LatencyBound { min_latency } => {
                            return Ok(TreeOutcome::LatencyBound { min_latency });
                        }
                        ChainOutcome::Infeasible | ChainOutcome::NoPartition => {
                            return Ok(TreeOutcome::Infeasible);
                        }
                    }
                } else {
                    // Tail segment of the critical path: take the whole DP
                    // table and keep the monotone cost envelope over the
                    // allowed cut counts.
                    let Some(bc) = branch_cost else { continue };
                    let creq = ChainRequest::new(req.constraints.without_latency(), req.params);
                    let TableOutcome::Table(cdp) = partitioner.partition_table(view, &creq)?
                    else {
                        continue;
                    };
                    let mut part_best: Option<TreePart> = None;
                    let mut c_best = 0;
                    for c in 0..=c_max {
                        if c < subchain.len() {
                            match cdp.final_cost(c) {
                                None => continue,
                                Some(cost_c) => {
                                    if c == 0
                                        || cdp.final_cost(c_best).is_none_or(|cb| cost_c < cb)
                                    {
                                        let mut barr: BTreeSet<NodeId> = cdp
                                            .extract_barriers(c)
                                            .iter()
                                            .map(|&b| subchain[b])
                                            .collect();
                                        barr.extend(branch_barr.iter().copied());
                                        part_best = Some(TreePart { barr, cost: cost_c + bc });
                                        c_best = c;
                                    }
                                }
                            }
                        }
                        if let Some(pb) = &part_best {
                            if dp[n][c].as_ref().is_none_or(|cur| pb.cost < cur.cost) {
                                dp[n][c] = Some(pb.clone());
                            }
                        }
                    }
                }
            } else {
                // The sub-chain straddles a branching node of the critical
                // path: the edge into the critical-path child must be cut,
                // and the head part gets its own latency budget per cut
                // count.
                let Some(bc) = branch_cost else { continue };
                let head_len = split.head.len();
                let head_rt: u64 = split.head.iter().map(|&v| sg.runtime(v)).sum();
                let m_cp = *sg
                    .succ(*split.head.last().unwrap())
                    .iter()
                    .find(|m| cpath.contains(*m))
                    .expect("head part ends before a critical-path child");
                let mut cache: HashMap<usize, (Vec<usize>, u64)> = HashMap::new();
                for k in 0..c_max {
                    let Some(part_k) = dp[m_cp][k].clone() else { continue };
                    // A cheaper-or-equal k - 1 subcase dominates every
                    // combination built on k.
                    if k > 0 && dp[m_cp][k - 1].as_ref().is_some_and(|p| p.cost <= part_k.cost) {
                        continue;
                    }
                    for c_head in (0..c_max - k).rev() {
                        let cached = cache.get(&c_head).cloned();
                        let (barriers, opt_cost) = match cached {
                            Some(entry) => entry,
                            None => {
                                let l_head = head_rt + c_head as u64 * req.params.delay;
                                let creq =
                                    ChainRequest::new(req.constraints.with_latency(l_head), req.params)
                                        .with_window(0, head_len - 1);
                                match partitioner.partition(view, &creq)? {
                                    ChainOutcome::Feasible(p) => {
                                        let entry = (p.barriers, p.cost);
                                        // The same optimum already covers
                                        // every budget down to its own cut
                                        // count.
                                        for cc in (entry.0.len() - 1..=c_head).rev() {
                                            cache.insert(cc, entry.clone());
                                        }
                                        entry
                                    }
                                    // A stricter head budget cannot succeed
                                    // where this one failed.
                                    _ => break,
                                }
                            }
                        };
                        let c = k + c_head + 1;
                        let cost = opt_cost + part_k.cost + bc;
                        if dp[n][c].as_ref().is_none_or(|cur| cost < cur.cost) {
                            let mut barr: BTreeSet<NodeId> =
                                barriers.iter().map(|&b| subchain[b]).collect();
                            barr.extend(part_k.barr.iter().copied());
                            barr.extend(branch_barr.iter().copied());
                            dp[n][c] = Some(TreePart { barr, cost });
                        }
                    }
                }
            }
        }

        // A subtree infeasible both without cuts and with every allowed cut
        // leaves the whole tree without a feasible partition.
        if dp[n][0].is_none() && dp[n][c_max].is_none() {
            return Ok(TreeOutcome::Infeasible);
        }
    }

    let mut best: Option<(usize, &TreePart)> = None;
    for (c, part) in dp[req.root].iter().enumerate() {
        if let Some(part) = part {
            if best.is_none_or(|(_, b)| part.cost < b.cost) {
                best = Some((c, part));
            }
        }
    }
    match best {
        Some((c_opt, part)) => {
            debug!("mtp optimum: c={} cost={}", c_opt, part.cost);
            Ok(TreeOutcome::Feasible(TreePartition {
                blocks: subtrees(sg, &part.barr),
                cost: part.cost,
                cuts: c_opt,
            }))
        }
        None => Ok(TreeOutcome::Infeasible),
    }
}
