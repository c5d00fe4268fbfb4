//! Error types for partitioning operations.
//!
//! Only contract violations are errors: a well-formed request that merely
//! has no feasible partition resolves to an infeasible outcome instead
//! (see [`crate::partition::ChainOutcome`] and
//! [`crate::partition::TreeOutcome`]).

use alloc::string::String;

use crate::graph::NodeId;

/// Errors raised for ill-formed inputs to the partitioning engine.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(thiserror::Error))]
pub enum PartitionError {
    /// A chain was given with no nodes.
    #[cfg_attr(feature = "std", error("chain must contain at least one node"))]
    EmptyChain,

    /// The chain attribute vectors differ in length.
    #[cfg_attr(
        feature = "std",
        error("attribute vectors differ in length: runtime {runtime}, memory {memory}, rate {rate}")
    )]
    LengthMismatch {
        runtime: usize,
        memory: usize,
        rate: usize,
    },

    /// A node attribute that must be positive is zero.
    #[cfg_attr(feature = "std", error("node {node} has zero {attribute}"))]
    ZeroAttribute { node: NodeId, attribute: &'static str },

    /// The latency window does not address the chain.
    #[cfg_attr(
        feature = "std",
        error("latency window [{start}, {end}] is invalid for a chain of {len} nodes")
    )]
    InvalidWindow { start: usize, end: usize, len: usize },

    /// Delay and unit must be positive.
    #[cfg_attr(feature = "std", error("cost parameter '{parameter}' must be positive"))]
    ZeroParameter { parameter: &'static str },

    /// A node identifier does not exist in the graph.
    #[cfg_attr(feature = "std", error("node {node} is not part of the service graph"))]
    UnknownNode { node: NodeId },

    /// An invocation edge would break the tree shape.
    #[cfg_attr(feature = "std", error("invalid invocation edge {from} -> {to}: {message}"))]
    InvalidEdge {
        from: NodeId,
        to: NodeId,
        message: String,
    },

    /// The graph is not a rooted tree under the platform node.
    #[cfg_attr(feature = "std", error("malformed service graph: {message}"))]
    MalformedGraph { message: String },

    /// The designated critical-path end cannot serve as one.
    #[cfg_attr(
        feature = "std",
        error("critical path cannot end at node {node}: {message}")
    )]
    InvalidCriticalPath { node: NodeId, message: String },
}

impl PartitionError {
    pub fn edge(from: NodeId, to: NodeId, message: impl Into<String>) -> Self {
        Self::InvalidEdge {
            from,
            to,
            message: message.into(),
        }
    }

    pub fn graph(message: impl Into<String>) -> Self {
        Self::MalformedGraph {
            message: message.into(),
        }
    }

    pub fn critical_path(node: NodeId, message: impl Into<String>) -> Self {
        Self::InvalidCriticalPath {
            node,
            message: message.into(),
        }
    }
}

/// Result type for partitioning operations.
pub type PartitionResult<T> = core::result::Result<T, PartitionError>;
