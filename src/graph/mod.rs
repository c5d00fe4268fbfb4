//! Service graph model and traversal helpers.
//!
//! A service graph is a rooted tree of functions fed by a synthetic
//! platform node. It is immutable once built; the partitioning algorithms
//! only ever walk predecessor and successor links.

mod service;
mod traverse;

pub use service::{NodeId, ServiceGraph, PLATFORM};
pub use traverse::{
    backtrack_chain, critical_path, leaf_labels, path_blocks, subchain_splits, subtrees,
    PostOrder, SubchainSplit,
};
