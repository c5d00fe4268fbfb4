//! Randomized service generators.
//!
//! Drive the stress tests that validate the DP partitioners against the
//! exhaustive oracles. Seed the generator to make a run reproducible.

use alloc::vec::Vec;

use rand::{Rng, RngExt};

use crate::graph::{NodeId, ServiceGraph, PLATFORM};
use crate::partition::ChainView;

/// Owned attribute vectors of a randomly generated chain.
#[derive(Debug, Clone)]
pub struct ChainCase {
    pub runtime: Vec<u64>,
    pub memory: Vec<u64>,
    pub rate: Vec<u64>,
}

impl ChainCase {
    pub fn view(&self) -> ChainView<'_> {
        ChainView::new(&self.runtime, &self.memory, &self.rate)
            .expect("generated attributes are positive and equal-length")
    }
}

/// Generates chain attributes with runtimes in 10..=100, memory in 1..=3
/// and rates in 1..=3; the platform invokes the chain head at rate 1.
pub fn random_chain_case(rng: &mut impl Rng, n: usize) -> ChainCase {
    assert!(n >= 1, "chains need at least one node");
    let mut rate: Vec<u64> = Vec::with_capacity(n);
    rate.push(1);
    rate.extend((1..n).map(|_| rng.random_range(1..=3)));
    ChainCase {
        runtime: (0..n).map(|_| rng.random_range(10..=100)).collect(),
        memory: (0..n).map(|_| rng.random_range(1..=3)).collect(),
        rate,
    }
}

/// Generates a random service chain as a graph under the platform node.
pub fn random_chain(rng: &mut impl Rng, n: usize) -> ServiceGraph {
    let case = random_chain_case(rng, n);
    ServiceGraph::chain(&case.runtime, &case.memory, &case.rate)
        .expect("generated attributes form a valid chain")
}

/// Generates a random service tree of `n` functions.
///
/// Every node picks its parent among the already placed ones, so ids stay
/// topologically ordered and node `n` is always a leaf usable as a
/// critical-path end. Runtimes fall in 1..=100, memory in 1..=3, rates in
/// 1..=3 and data weights in 1..=20.
pub fn random_tree(rng: &mut impl Rng, n: usize) -> ServiceGraph {
    assert!(n >= 1, "trees need at least one node");
    let mut sg = ServiceGraph::new();
    for _ in 0..n {
        sg.add_function(rng.random_range(1..=100), rng.random_range(1..=3));
    }
    sg.add_invocation_with_data(PLATFORM, 1, rng.random_range(1..=3), rng.random_range(1..=20))
        .expect("platform edge is always valid");
    for v in 2..=n {
        let parent: NodeId = rng.random_range(1..v);
        sg.add_invocation_with_data(
            parent,
            v,
            rng.random_range(1..=3),
            rng.random_range(1..=20),
        )
        .expect("parents precede their children");
    }
    sg
}
