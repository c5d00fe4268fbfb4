//! Row-sweeping chain partitioner.
//!
//! Processes whole `DP[b-1][..]` rows per trailing-block candidate instead
//! of revisiting the block for every block count. The produced barriers and
//! optimal cost are identical to [`ScpChain`](crate::partition::ScpChain);
//! only the loop structure differs.

use alloc::vec;

use crate::error::PartitionResult;
use crate::metrics::{block_cpu, BlockAgg, PrefixSums};
use crate::partition::chain::{preflight_chain, Preflight};
use crate::partition::types::{
    exceeds, ChainOutcome, ChainPartition, ChainRequest, ChainState, ChainView, Constraints,
    CostParams, DpTable, TableOutcome,
};
use crate::partition::ChainPartitioner;

/// The row-sweeping chain partitioner.
#[derive(Debug, Clone, Copy, Default)]
pub struct SweepChain;

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

    for w in 1..n {
        let mut agg = BlockAgg::new();
        for b in (1..=w).rev() {
            agg.prepend(runtime[b], memory[b], rate[b]);
            if exceeds(cons.memory, agg.memory) || exceeds(cons.cores, agg.cpu) {
                break;
            }
            let blk_cost = agg.cost(params.unit);
            let blk_lat = rt_sums.window_latency(b, w, params.delay, start, end);
            // Sweep the whole predecessor row at once: DP[b-1][k-1]
            // extends to DP[w][k] for every stored block count.
            for prev_k in 0..b {
                let Some(prev) = dp.cell(b - 1, prev_k) else {
                    continue;
                };
                let lat = prev.lat + blk_lat;
                if exceeds(cons.latency, lat) {
                    continue;
                }
                let cost = prev.cost + blk_cost;
                let k = prev_k + 1;
                if dp.cell(w, k).is_none_or(|cur| cost <= cur.cost) {
                    dp.set(w, k, ChainState { barr: b, cost, lat });
                }
            }
        }
    }
    dp
}

impl ChainPartitioner for SweepChain {
    fn partition(&self, chain: ChainView<'_>, req: &ChainRequest) -> PartitionResult<ChainOutcome> {
        let (start, end) = match preflight_chain(chain, req)? {
            Preflight::Go { start, end } => (start, end),
            Preflight::LatencyBound { min_latency } => {
                return Ok(ChainOutcome::LatencyBound { min_latency });
            }
            Preflight::Infeasible => return Ok(ChainOutcome::Infeasible),
        };
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
            Some((k_opt, state)) => Ok(ChainOutcome::Feasible(ChainPartition {
                barriers: dp.extract_barriers(k_opt),
                cost: state.cost,
                latency: state.lat,
            })),
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
