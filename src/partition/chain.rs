//! Minimum-cost chain partitioning via dynamic programming.
//!
//! `DP[w][k]` holds the best way to break the chain prefix `[0, w]` into
//! `k + 1` blocks. A cell stores the head of its trailing block, so the
//! optimum is recovered by walking those references backward from the
//! cheapest final cell.

use alloc::vec;

use log::debug;

use crate::error::PartitionResult;
use crate::metrics::{block_cpu, chain_k_max, chain_k_min, BlockAgg, PrefixSums};
use crate::partition::types::{
    exceeds, ChainOutcome, ChainPartition, ChainRequest, ChainState, ChainView, Constraints,
    CostParams, DpTable, TableOutcome,
};
use crate::partition::ChainPartitioner;

/// The dynamic-programming chain partitioner.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScpChain;

pub(crate) enum Preflight {
    Go { start: usize, end: usize },
    LatencyBound { min_latency: u64 },
    Infeasible,
}

pub(crate) fn preflight_chain(chain: ChainView<'_>, req: &ChainRequest) -> PartitionResult<Preflight> {
    req.params.validate()?;
    let (start, end) = chain.window(req)?;
    let lat_min: u64 = chain.runtime()[start..=end].iter().sum();
    if req.constraints.latency.is_some_and(|l| l < lat_min) {
        return Ok(Preflight::LatencyBound { min_latency: lat_min });
    }
    let k_min = chain_k_min(
        chain.memory(),
        chain.rate(),
        req.constraints.memory,
        req.constraints.cores,
        start,
        end,
    );
    let k_max = chain_k_max(
        req.constraints.latency.map(|l| l - lat_min),
        req.params.delay,
        chain.len(),
    );
    debug!(
        "chain preflight: n={} window=[{start}, {end}] k_min={k_min} k_max={k_max}",
        chain.len()
    );
    if k_max < k_min {
        return Ok(Preflight::Infeasible);
    }
    Ok(Preflight::Go { start, end })
}

/// Fills the whole DP table for the given window.
///
/// The inner loop iterates block heads downward so that the first memory or
/// CPU violation ends it: both quantities only grow as the head moves
/// toward the chain start. Equal-cost candidates overwrite the cell, which
/// biases the result toward larger trailing blocks and fewer cuts.
fn fill_table(
    chain: ChainView<'_>,
    cons: &Constraints,
    params: &CostParams,
    start: usize,
    end: usize,
) -> DpTable {
    let n = chain.len();
    let (runtime, memory, rate) = (chain.runtime(), chain.memory(), chain.rate());
    let rt_sums = PrefixSums::new(runtime);
    let mut dp = DpTable::new(n);

    // Row 0: the prefix [0, w] as a single block.
    let mut head = BlockAgg::new();
    for w in 0..n {
        head.runtime += runtime[w];
        head.memory += memory[w];
        if exceeds(cons.memory, head.memory) || exceeds(cons.cores, block_cpu(rate, 0, w)) {
            break;
        }
        head.head_rate = rate[0];
        dp.set(
            w,
            0,
            ChainState {
                barr: 0,
                cost: head.cost(params.unit),
                lat: rt_sums.window_latency(0, w, params.delay, start, end),
            },
        );
    }

    // Per-row caches of the trailing block [b, w], filled head-ward.
    let mut blk_cost = vec![0u64; n];
    let mut blk_lat = vec![0u64; n];
    for w in 1..n {
        let mut agg = BlockAgg::new();
        let mut b_min = w + 1;
        for b in (1..=w).rev() {
            agg.prepend(runtime[b], memory[b], rate[b]);
            if exceeds(cons.memory, agg.memory) || exceeds(cons.cores, agg.cpu) {
                break;
            }
            b_min = b;
            blk_cost[b] = agg.cost(params.unit);
            blk_lat[b] = rt_sums.window_latency(b, w, params.delay, start, end);
        }
        for k in 1..=w {
            for b in (k.max(b_min)..=w).rev() {
                let Some(prev) = dp.cell(b - 1, k - 1) else {
                    continue;
                };
                let lat = prev.lat + blk_lat[b];
                if exceeds(cons.latency, lat) {
                    continue;
                }
                let cost = prev.cost + blk_cost[b];
                if dp.cell(w, k).is_none_or(|cur| cost <= cur.cost) {
                    dp.set(w, k, ChainState { barr: b, cost, lat });
                }
            }
            // A prefix that cannot be split into k + 1 blocks under L cannot
            // be split into k + 2 either.
            if dp.cell(w, k).is_none() && dp.cell(w, k - 1).is_some() {
                break;
            }
        }
    }
    dp
}

impl ChainPartitioner for ScpChain {
    fn partition(&self, chain: ChainView<'_>, req: &ChainRequest) -> PartitionResult<ChainOutcome> {
        let (start, end) = match preflight_chain(chain, req)? {
            Preflight::Go { start, end } => (start, end),
            Preflight::LatencyBound { min_latency } => {
                return Ok(ChainOutcome::LatencyBound { min_latency });
            }
            Preflight::Infeasible => return Ok(ChainOutcome::Infeasible),
        };
        // A single function always runs as its own block.
        if chain.len() == 1 {
            let cost = chain.rate()[0] * chain.runtime()[0].div_ceil(req.params.unit) * req.params.unit;
            return Ok(ChainOutcome::Feasible(ChainPartition {
                barriers: vec![0],
                cost,
                latency: chain.runtime()[0],
            }));
        }
        let dp = fill_table(chain, &req.constraints, &req.params, start, end);
        match dp.best() {
            Some((k_opt, state)) => {
                debug!("chain optimum: k={} cost={} lat={}", k_opt, state.cost, state.lat);
                Ok(ChainOutcome::Feasible(ChainPartition {
                    barriers: dp.extract_barriers(k_opt),
                    cost: state.cost,
                    latency: state.lat,
                }))
            }
            None => Ok(ChainOutcome::NoPartition),
        }
    }

    fn partition_table(
        &self,
        chain: ChainView<'_>,
        req: &ChainRequest,
    ) -> PartitionResult<TableOutcome> {
        let (start, end) = match preflight_chain(chain, req)? {
            Preflight::Go { start, end } => (start, end),
            Preflight::LatencyBound { min_latency } => {
                return Ok(TableOutcome::LatencyBound { min_latency });
            }
            Preflight::Infeasible => return Ok(TableOutcome::Infeasible),
        };
        Ok(TableOutcome::Table(fill_table(
            chain,
            &req.constraints,
            &req.params,
            start,
            end,
        )))
    }
}
