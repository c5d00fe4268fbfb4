//! # FaaScut
//!
//! Cost-optimal partitioning of serverless service graphs.
//!
//! A service is a rooted tree of functions invoked through a synthetic
//! platform node. Every function carries a per-invocation runtime and a
//! memory footprint; every invocation edge carries an average rate. The
//! engine groups functions into co-located *blocks* so that the
//! rate-weighted, unit-quantized billing cost of the whole service is
//! minimal while every block respects a memory bound, a CPU core bound and
//! an end-to-end latency bound on a designated critical path.
//!
//! ## Algorithms
//!
//! - Chain partitioning via dynamic programming ([`ScpChain`]), plus a
//!   row-sweeping variant with identical results ([`SweepChain`])
//! - Tree partitioning by threading the chain solver through the branching
//!   skeleton ([`mtp_partition`])
//! - Tree partitioning bottom-up with Pareto subcase queues
//!   ([`btp_partition`])
//! - Exhaustive enumerators used as validation oracles
//!
//! ## Example
//!
//! ```ignore
//! use faascut::{ScpChain, ChainPartitioner, ChainView, ChainRequest};
//!
//! let chain = ChainView::new(&[20, 40, 50], &[3, 3, 2], &[1, 1, 2])?;
//! let outcome = ScpChain.partition(chain, &ChainRequest::default())?;
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod cluster;
pub mod error;
pub mod graph;
pub mod metrics;
pub mod partition;
pub mod services;
#[cfg(feature = "std")]
pub mod testing;

pub use error::{PartitionError, PartitionResult};
pub use graph::{NodeId, ServiceGraph, PLATFORM};
pub use partition::{
    btp_partition, mtp_partition, mtp_partition_with, ChainOutcome, ChainPartition,
    ChainPartitioner, ChainRequest, ChainView, Constraints, CostParams, ScpChain, SweepChain,
    TreeOutcome, TreePartition, TreeRequest,
};
