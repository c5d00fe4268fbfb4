//! Partitioning algorithms.
//!
//! Implements the competing strategies for cost-optimal block placement:
//! - Chain DP: O(n³) exact partitioning of linear chains
//! - Sweep: the same DP advancing whole subcase rows at once
//! - Meta tree DP: reduces a tree to chain partitionings along its
//!   branching skeleton
//! - Bottom-up tree DP: direct tree partitioning with Pareto subcase
//!   queues
//! - Exhaustive enumerators: validation oracles for small inputs

mod chain;
mod exhaustive;
mod sweep;
mod tree_bottom_up;
mod tree_meta;
mod types;

pub use chain::ScpChain;
pub use exhaustive::{
    exhaustive_chain_cuts, exhaustive_chain_partitioning, exhaustive_tree_partitioning,
    feasible_chain_cuts, MAX_ORACLE_NODES,
};
pub use sweep::SweepChain;
pub use tree_bottom_up::btp_partition;
pub use tree_meta::{mtp_partition, mtp_partition_with};
pub use types::{
    ChainOutcome, ChainPartition, ChainRequest, ChainState, ChainView, Constraints, CostParams,
    DpTable, TableOutcome, TreeOutcome, TreePartition, TreeRequest,
};

use crate::error::PartitionResult;

/// Capability of partitioning a chain of functions into cost-optimal
/// blocks.
///
/// The meta tree algorithm is parameterised over this trait so that any
/// behaviourally equivalent chain solver can be threaded through it.
pub trait ChainPartitioner {
    /// Computes an optimal partitioning of `chain` under `req`.
    fn partition(&self, chain: ChainView<'_>, req: &ChainRequest)
        -> PartitionResult<ChainOutcome>;

    /// Like [`partition`](Self::partition), but hands back the full DP
    /// table so the caller can inspect every block count.
    fn partition_table(
        &self,
        chain: ChainView<'_>,
        req: &ChainRequest,
    ) -> PartitionResult<TableOutcome>;
}
