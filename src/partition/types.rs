//! Shared request, state and outcome types of the partitioning algorithms.

use alloc::vec::Vec;

use serde::{Deserialize, Serialize};

use crate::error::{PartitionError, PartitionResult};
use crate::graph::NodeId;

/// True when `value` violates an optional upper `bound`.
pub(crate) fn exceeds(bound: Option<u64>, value: u64) -> bool {
    bound.is_some_and(|b| value > b)
}

/// Per-block resource bounds and the critical-path latency bound.
///
/// `None` leaves the corresponding axis unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Constraints {
    /// Upper memory bound of a block, in MB.
    pub memory: Option<u64>,
    /// Upper CPU core bound of a block.
    pub cores: Option<u64>,
    /// Latency limit on the critical path, in ms.
    pub latency: Option<u64>,
}

impl Constraints {
    pub fn new(memory: impl Into<Option<u64>>, cores: impl Into<Option<u64>>, latency: impl Into<Option<u64>>) -> Self {
        Self {
            memory: memory.into(),
            cores: cores.into(),
            latency: latency.into(),
        }
    }

    /// The same resource bounds with the latency axis removed.
    pub fn without_latency(self) -> Self {
        Self {
            latency: None,
            ..self
        }
    }

    /// The same resource bounds with the latency axis replaced.
    pub fn with_latency(self, latency: u64) -> Self {
        Self {
            latency: Some(latency),
            ..self
        }
    }
}

/// Billing and invocation-gap parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostParams {
    /// Cold invocation gap inserted between consecutive blocks, in ms.
    pub delay: u64,
    /// Billing rounding granularity, in ms.
    pub unit: u64,
}

impl Default for CostParams {
    fn default() -> Self {
        Self { delay: 1, unit: 100 }
    }
}

impl CostParams {
    pub fn new(delay: u64, unit: u64) -> Self {
        Self { delay, unit }
    }

    pub fn validate(&self) -> PartitionResult<()> {
        if self.delay == 0 {
            return Err(PartitionError::ZeroParameter { parameter: "delay" });
        }
        if self.unit == 0 {
            return Err(PartitionError::ZeroParameter { parameter: "unit" });
        }
        Ok(())
    }
}

/// A chain partitioning request: bounds, latency window and cost model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChainRequest {
    pub constraints: Constraints,
    /// Head node of the latency window.
    pub start: usize,
    /// Tail node of the latency window; `None` means the chain tail.
    pub end: Option<usize>,
    pub params: CostParams,
}

impl ChainRequest {
    pub fn new(constraints: Constraints, params: CostParams) -> Self {
        Self {
            constraints,
            start: 0,
            end: None,
            params,
        }
    }

    /// Restricts the latency window to `[start, end]`.
    pub fn with_window(mut self, start: usize, end: usize) -> Self {
        self.start = start;
        self.end = Some(end);
        self
    }
}

/// Borrowed chain attributes: equal-length runtime, memory and rate
/// vectors, all entries positive.
#[derive(Debug, Clone, Copy)]
pub struct ChainView<'a> {
    runtime: &'a [u64],
    memory: &'a [u64],
    rate: &'a [u64],
}

impl<'a> ChainView<'a> {
    pub fn new(runtime: &'a [u64], memory: &'a [u64], rate: &'a [u64]) -> PartitionResult<Self> {
        if runtime.is_empty() {
            return Err(PartitionError::EmptyChain);
        }
        if runtime.len() != memory.len() || runtime.len() != rate.len() {
            return Err(PartitionError::LengthMismatch {
                runtime: runtime.len(),
                memory: memory.len(),
                rate: rate.len(),
            });
        }
        for (i, ((&rt, &mem), &r)) in runtime.iter().zip(memory).zip(rate).enumerate() {
            let attribute = if rt == 0 {
                Some("runtime")
            } else if mem == 0 {
                Some("memory")
            } else if r == 0 {
                Some("rate")
            } else {
                None
            };
            if let Some(attribute) = attribute {
                return Err(PartitionError::ZeroAttribute { node: i, attribute });
            }
        }
        Ok(Self { runtime, memory, rate })
    }

    pub fn len(&self) -> usize {
        self.runtime.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runtime.is_empty()
    }

    pub fn runtime(&self) -> &'a [u64] {
        self.runtime
    }

    pub fn memory(&self) -> &'a [u64] {
        self.memory
    }

    pub fn rate(&self) -> &'a [u64] {
        self.rate
    }

    /// Resolves the latency window of `req` against this chain.
    pub fn window(&self, req: &ChainRequest) -> PartitionResult<(usize, usize)> {
        let end = req.end.unwrap_or(self.len() - 1);
        if req.start > end || end >= self.len() {
            return Err(PartitionError::InvalidWindow {
                start: req.start,
                end,
                len: self.len(),
            });
        }
        Ok((req.start, end))
    }
}

/// Best feasible way to break the chain prefix `[0, w]` into `k + 1`
/// blocks: head of the trailing block, total cost and window latency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainState {
    /// Barrier (head node) of the trailing block.
    pub barr: usize,
    /// Total cost of the prefix partitioning.
    pub cost: u64,
    /// Accumulated latency on the latency window.
    pub lat: u64,
}

/// Lower-triangular chain DP table; `cell(w, k)` is the best partitioning
/// of `[0, w]` into `k + 1` blocks, infeasible cells absent.
#[derive(Debug, Clone)]
pub struct DpTable {
    n: usize,
    cells: Vec<Option<ChainState>>,
}

impl DpTable {
    pub fn new(n: usize) -> Self {
        Self {
            n,
            cells: alloc::vec![None; n * (n + 1) / 2],
        }
    }

    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    fn idx(&self, w: usize, k: usize) -> usize {
        debug_assert!(k <= w && w < self.n);
        w * (w + 1) / 2 + k
    }

    pub fn cell(&self, w: usize, k: usize) -> Option<ChainState> {
        self.cells[self.idx(w, k)]
    }

    pub fn set(&mut self, w: usize, k: usize, state: ChainState) {
        let idx = self.idx(w, k);
        self.cells[idx] = Some(state);
    }

    /// Cost of partitioning the whole chain into `k + 1` blocks.
    pub fn final_cost(&self, k: usize) -> Option<u64> {
        self.cell(self.n - 1, k).map(|s| s.cost)
    }

    /// The cheapest final cell, smallest block count first on ties.
    pub fn best(&self) -> Option<(usize, ChainState)> {
        let mut best: Option<(usize, ChainState)> = None;
        for k in 0..self.n {
            if let Some(state) = self.cell(self.n - 1, k) {
                if best.is_none_or(|(_, b)| state.cost < b.cost) {
                    best = Some((k, state));
                }
            }
        }
        best
    }

    /// Recovers the barrier nodes of the `k + 1`-block optimum by walking
    /// the stored subcase references backward.
    pub fn extract_barriers(&self, k: usize) -> Vec<usize> {
        let mut barr = Vec::with_capacity(k + 1);
        let mut w = self.n - 1;
        for k in (0..=k).rev() {
            let b = self.cell(w, k).expect("backtracking a feasible cell").barr;
            barr.push(b);
            if k > 0 {
                w = b - 1;
            }
        }
        barr.reverse();
        barr
    }
}

/// A feasible chain partitioning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainPartition {
    /// Heads of the blocks in increasing order; the first is always 0.
    pub barriers: Vec<usize>,
    /// Total billed cost.
    pub cost: u64,
    /// Latency accumulated on the latency window.
    pub latency: u64,
}

impl ChainPartition {
    /// Expands the barriers into explicit blocks over an `n`-node chain.
    pub fn blocks(&self, n: usize) -> Vec<Vec<usize>> {
        let mut blocks = Vec::with_capacity(self.barriers.len());
        for (i, &b) in self.barriers.iter().enumerate() {
            let end = self.barriers.get(i + 1).copied().unwrap_or(n);
            blocks.push((b..end).collect());
        }
        blocks
    }
}

/// Outcome of a chain partitioning call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChainOutcome {
    /// An optimal feasible partitioning.
    Feasible(ChainPartition),
    /// The latency bound lies below the window's runtime sum.
    LatencyBound { min_latency: u64 },
    /// The bounds admit no block count at all (`k_max < k_min`).
    Infeasible,
    /// The DP exhausted its feasibility region without a solution.
    NoPartition,
}

impl ChainOutcome {
    pub fn feasible(&self) -> Option<&ChainPartition> {
        match self {
            Self::Feasible(p) => Some(p),
            _ => None,
        }
    }

    pub fn cost(&self) -> Option<u64> {
        self.feasible().map(|p| p.cost)
    }

    pub fn is_feasible(&self) -> bool {
        matches!(self, Self::Feasible(_))
    }
}

/// Outcome of a table-producing chain partitioning call.
#[derive(Debug, Clone)]
pub enum TableOutcome {
    /// The full DP table; the caller picks cells and backtracks itself.
    Table(DpTable),
    /// The latency bound lies below the window's runtime sum.
    LatencyBound { min_latency: u64 },
    /// The bounds admit no block count at all.
    Infeasible,
}

/// A tree partitioning request: root, critical-path end, bounds and cost
/// model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeRequest {
    /// Root function of the service (the platform's single successor).
    pub root: NodeId,
    /// Leaf ending the critical path.
    pub cp_end: NodeId,
    pub constraints: Constraints,
    pub params: CostParams,
}

impl TreeRequest {
    pub fn new(cp_end: NodeId) -> Self {
        Self {
            root: 1,
            cp_end,
            constraints: Constraints::default(),
            params: CostParams::default(),
        }
    }

    pub fn with_constraints(mut self, constraints: Constraints) -> Self {
        self.constraints = constraints;
        self
    }

    pub fn with_params(mut self, params: CostParams) -> Self {
        self.params = params;
        self
    }
}

/// A feasible tree partitioning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreePartition {
    /// Blocks as id-sorted node lists, sorted by their head node.
    pub blocks: Vec<Vec<NodeId>>,
    /// Total billed cost.
    pub cost: u64,
    /// Number of cuts spent on the critical path.
    pub cuts: usize,
}

impl TreePartition {
    /// The barrier (head) node of every block, in increasing order.
    pub fn barriers(&self) -> Vec<NodeId> {
        self.blocks.iter().map(|blk| blk[0]).collect()
    }
}

/// Outcome of a tree partitioning call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TreeOutcome {
    /// An optimal feasible partitioning.
    Feasible(TreePartition),
    /// The latency bound lies below the critical path's runtime sum.
    LatencyBound { min_latency: u64 },
    /// No partition satisfies the bounds.
    Infeasible,
}

impl TreeOutcome {
    pub fn feasible(&self) -> Option<&TreePartition> {
        match self {
            Self::Feasible(p) => Some(p),
            _ => None,
        }
    }

    pub fn cost(&self) -> Option<u64> {
        self.feasible().map(|p| p.cost)
    }

    pub fn is_feasible(&self) -> bool {
        matches!(self, Self::Feasible(_))
    }
}
