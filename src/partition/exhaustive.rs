//! Exhaustive enumerators.
//!
//! Brute-force search over cut combinations, used only to validate the DP
//! partitioners on small inputs. Unlike the DP solvers these return every
//! equi-optimal partition, so a DP result can be checked for membership.

use alloc::collections::BTreeSet;
use alloc::vec;
use alloc::vec::Vec;

use crate::error::PartitionResult;
use crate::graph::{critical_path, path_blocks, subtrees, NodeId, ServiceGraph, PLATFORM};
use crate::metrics::{block_cost, block_cpu, block_latency, block_memory};
use crate::partition::types::{
    exceeds, ChainPartition, ChainRequest, ChainView, Constraints, TreePartition, TreeRequest,
};

/// Maximum input size the enumerators accept; beyond this the cut
/// powersets explode.
pub const MAX_ORACLE_NODES: usize = 20;

/// Enumerates every minimum-cost partitioning of a chain.
///
/// Walks the powerset of cut positions, keeps the partitions whose blocks
/// all satisfy the memory and core bounds, and returns all equi-optimal
/// ones under the latency bound. Empty when nothing is feasible.
///
/// # Panics
/// Panics if the chain exceeds [`MAX_ORACLE_NODES`].
pub fn exhaustive_chain_partitioning(
    chain: ChainView<'_>,
    req: &ChainRequest,
) -> PartitionResult<Vec<ChainPartition>> {
    req.params.validate()?;
    let (start, end) = chain.window(req)?;
    let n = chain.len();
    assert!(
        n <= MAX_ORACLE_NODES,
        "exhaustive search is only feasible for {} nodes or fewer, got {}",
        MAX_ORACLE_NODES,
        n
    );
    let cons = &req.constraints;
    // No point enumerating fewer cuts than the memory bound dictates.
    let c_min = cons.memory.map_or(0, |m| {
        (chain.memory().iter().sum::<u64>().div_ceil(m) as usize).saturating_sub(1)
    });

    let mut best: Vec<ChainPartition> = Vec::new();
    let mut best_cost: Option<u64> = None;
    for mask in 0u64..(1 << (n - 1)) {
        if (mask.count_ones() as usize) < c_min {
            continue;
        }
        let mut barriers = vec![0];
        barriers.extend((1..n).filter(|i| mask & (1 << (i - 1)) != 0));

        let mut cost = 0;
        let mut latency = 0;
        let mut valid = true;
        for (i, &b) in barriers.iter().enumerate() {
            let w = barriers.get(i + 1).map_or(n - 1, |&next| next - 1);
            if exceeds(cons.memory, block_memory(chain.memory(), b, w))
                || exceeds(cons.cores, block_cpu(chain.rate(), b, w))
            {
                valid = false;
                break;
            }
            cost += block_cost(chain.runtime(), chain.rate(), b, w, req.params.unit);
            latency += block_latency(chain.runtime(), b, w, req.params.delay, start, end);
        }
        if !valid || exceeds(cons.latency, latency) {
            continue;
        }
        if best_cost.is_none_or(|bc| cost < bc) {
            best_cost = Some(cost);
            best = vec![ChainPartition { barriers, cost, latency }];
        } else if best_cost == Some(cost) {
            best.push(ChainPartition { barriers, cost, latency });
        }
    }
    Ok(best)
}

/// True when every block induced by `barr` satisfies the memory and core
/// bounds; with `require_chains`, non-chain blocks are rejected as well.
fn cuts_feasible(
    sg: &ServiceGraph,
    barr: &BTreeSet<NodeId>,
    cons: &Constraints,
    require_chains: bool,
) -> bool {
    for block in subtrees(sg, barr) {
        if require_chains
            && block
                .iter()
                .any(|&v| sg.succ(v).iter().filter(|m| block.contains(*m)).count() > 1)
        {
            return false;
        }
        let memory: Vec<u64> = block.iter().map(|&v| sg.memory(v)).collect();
        let rate: Vec<u64> = block.iter().map(|&v| sg.rate(v)).collect();
        let last = block.len() - 1;
        if exceeds(cons.memory, block_memory(&memory, 0, last))
            || exceeds(cons.cores, block_cpu(&rate, 0, last))
        {
            return false;
        }
    }
    true
}

/// Enumerates feasible chain-shaped barrier sets from the powerset of all
/// cuttable edges, rejecting candidates whose blocks are not chains.
pub fn exhaustive_chain_cuts(sg: &ServiceGraph, cons: &Constraints) -> Vec<BTreeSet<NodeId>> {
    let root = sg.root().expect("validated graph has a root");
    // In-edges of everything but the root are cuttable.
    let cuttable: Vec<NodeId> = sg.functions().filter(|&v| v != root).collect();
    assert!(
        cuttable.len() < MAX_ORACLE_NODES,
        "exhaustive search is only feasible for {} edges or fewer, got {}",
        MAX_ORACLE_NODES,
        cuttable.len()
    );
    let c_min = cons.memory.map_or(0, |m| {
        let total: u64 = sg.functions().map(|v| sg.memory(v)).sum();
        (total.div_ceil(m) as usize).saturating_sub(1)
    });

    let mut result = Vec::new();
    for mask in 0u64..(1 << cuttable.len()) {
        if (mask.count_ones() as usize) < c_min {
            continue;
        }
        let mut barr = BTreeSet::from([root]);
        barr.extend(
            cuttable
                .iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << i) != 0)
                .map(|(_, &v)| v),
        );
        if cuts_feasible(sg, &barr, cons, true) {
            result.push(barr);
        }
    }
    result
}

/// Enumerates feasible chain-shaped barrier sets from branching-node cut
/// combinations crossed with the powerset of plain chain edges.
///
/// At every branching node either all child edges are cut or all but one;
/// the resulting blocks are chains by construction.
pub fn feasible_chain_cuts(sg: &ServiceGraph, cons: &Constraints) -> Vec<BTreeSet<NodeId>> {
    let root = sg.root().expect("validated graph has a root");
    // Edges whose head hangs off a non-branching function node.
    let single_edges: Vec<NodeId> = sg
        .functions()
        .filter(|&v| {
            sg.pred(v)
                .is_some_and(|p| p != PLATFORM && sg.out_degree(p) == 1)
        })
        .collect();
    assert!(
        single_edges.len() < MAX_ORACLE_NODES,
        "exhaustive search is only feasible for {} edges or fewer, got {}",
        MAX_ORACLE_NODES,
        single_edges.len()
    );

    // Per branching node: cut all children, or all but one.
    let mut branch_options: Vec<Vec<Vec<NodeId>>> = Vec::new();
    for b in sg.functions().filter(|&v| sg.is_branching(v)) {
        let children = sg.succ(b);
        let mut options: Vec<Vec<NodeId>> = children
            .iter()
            .map(|keep| {
                children
                    .iter()
                    .filter(|c| *c != keep)
                    .copied()
                    .collect()
            })
            .collect();
        options.push(children.to_vec());
        branch_options.push(options);
    }

    // Cartesian product over the branching choices.
    let mut branch_cuts: Vec<Vec<NodeId>> = vec![Vec::new()];
    for options in &branch_options {
        let mut next = Vec::with_capacity(branch_cuts.len() * options.len());
        for prefix in &branch_cuts {
            for option in options {
                let mut cuts = prefix.clone();
                cuts.extend_from_slice(option);
                next.push(cuts);
            }
        }
        branch_cuts = next;
    }

    let mut result = Vec::new();
    for cuts in &branch_cuts {
        for mask in 0u64..(1 << single_edges.len()) {
            let mut barr = BTreeSet::from([root]);
            barr.extend(cuts.iter().copied());
            barr.extend(
                single_edges
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| mask & (1 << i) != 0)
                    .map(|(_, &v)| v),
            );
            if cuts_feasible(sg, &barr, cons, false) {
                result.push(barr);
            }
        }
    }
    result
}

/// Enumerates every minimum-cost partitioning of a service tree by
/// iterating over all feasible chain-shaped cut combinations.
pub fn exhaustive_tree_partitioning(
    sg: &ServiceGraph,
    req: &TreeRequest,
) -> PartitionResult<Vec<TreePartition>> {
    req.params.validate()?;
    sg.validate()?;
    let cpath = critical_path(sg, req.root, req.cp_end)?;

    let mut best: Vec<TreePartition> = Vec::new();
    let mut best_cost: Option<u64> = None;
    for barr in feasible_chain_cuts(sg, &req.constraints) {
        let partition = subtrees(sg, &barr);
        let mut cost = 0;
        for block in &partition {
            let runtime: Vec<u64> = block.iter().map(|&v| sg.runtime(v)).collect();
            let rate: Vec<u64> = block.iter().map(|&v| sg.rate(v)).collect();
            cost += block_cost(&runtime, &rate, 0, block.len() - 1, req.params.unit);
        }
        let cp_blocks = path_blocks(&partition, &cpath);
        let cuts = cp_blocks.len() - 1;
        let latency: u64 = cp_blocks
            .iter()
            .map(|blk| blk.iter().map(|&v| sg.runtime(v)).sum::<u64>())
            .sum::<u64>()
            + cuts as u64 * req.params.delay;
        if exceeds(req.constraints.latency, latency) {
            continue;
        }
        if best_cost.is_none_or(|bc| cost < bc) {
            best_cost = Some(cost);
            best = vec![TreePartition { blocks: partition, cost, cuts }];
        } else if best_cost == Some(cost) {
            best.push(TreePartition { blocks: partition, cost, cuts });
        }
    }
    Ok(best)
}
