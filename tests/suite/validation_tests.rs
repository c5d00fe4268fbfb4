//! Randomized DP-versus-oracle validation.
//!
//! The DP partitioners must reproduce the exhaustive optimum on every
//! input: equal cost, and a partition the oracle also lists.

use faascut::graph::critical_path;
use faascut::partition::{exhaustive_chain_partitioning, exhaustive_tree_partitioning};
use faascut::testing::{random_chain_case, random_tree};
use faascut::{
    btp_partition, mtp_partition, ChainOutcome, ChainPartitioner, ChainRequest, Constraints,
    CostParams, ScpChain, SweepChain, TreeOutcome, TreeRequest,
};
use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};

const ITERATIONS: usize = 100;
const NODES: usize = 10;

#[test]
fn test_chain_partitioners_match_oracle() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    for round in 0..ITERATIONS {
        let case = random_chain_case(&mut rng, NODES);
        let total_rt: u64 = case.runtime.iter().sum();
        let latency = total_rt + 1 + 10 * rng.random_range(2..=5);
        let req = ChainRequest::new(
            Constraints::new(6, 2, latency),
            CostParams::new(10, 100),
        );

        let optima = exhaustive_chain_partitioning(case.view(), &req).unwrap();
        for outcome in [
            ScpChain.partition(case.view(), &req).unwrap(),
            SweepChain.partition(case.view(), &req).unwrap(),
        ] {
            match outcome {
                ChainOutcome::Feasible(part) => {
                    assert_eq!(
                        part.cost, optima[0].cost,
                        "round {round}: DP cost diverges from the oracle"
                    );
                    assert!(
                        optima.iter().any(|p| p.barriers == part.barriers),
                        "round {round}: DP partition {:?} not listed by the oracle",
                        part.barriers
                    );
                }
                ChainOutcome::Infeasible | ChainOutcome::NoPartition => {
                    assert!(
                        optima.is_empty(),
                        "round {round}: DP infeasible but the oracle found {optima:?}"
                    );
                }
                ChainOutcome::LatencyBound { .. } => {
                    unreachable!("round {round}: the budget sits above the runtime sum")
                }
            }
        }
    }
}

#[test]
fn test_tree_partitioners_match_oracle() {
    let mut rng = StdRng::seed_from_u64(0xfeed);
    for round in 0..ITERATIONS {
        let sg = random_tree(&mut rng, NODES);
        let cp_end = NODES;
        let cpath = critical_path(&sg, 1, cp_end).unwrap();
        let cpath_rt: u64 = cpath.iter().map(|&v| sg.runtime(v)).sum();
        let max_cuts = (cpath.len() - 1).max(1) as u64;
        let latency = cpath_rt + 10 * rng.random_range(1..=max_cuts);
        let req = TreeRequest::new(cp_end)
            .with_constraints(Constraints::new(6, 2, latency))
            .with_params(CostParams::new(10, 100));

        let optima = exhaustive_tree_partitioning(&sg, &req).unwrap();
        for outcome in [mtp_partition(&sg, &req).unwrap(), btp_partition(&sg, &req).unwrap()] {
            match outcome {
                TreeOutcome::Feasible(part) => {
                    assert_eq!(
                        part.cost, optima[0].cost,
                        "round {round}: DP cost diverges from the oracle"
                    );
                    assert!(
                        optima.iter().any(|p| p.blocks == part.blocks),
                        "round {round}: DP partition {:?} not listed by the oracle",
                        part.blocks
                    );
                }
                TreeOutcome::Infeasible => {
                    assert!(
                        optima.is_empty(),
                        "round {round}: DP infeasible but the oracle found {optima:?}"
                    );
                }
                TreeOutcome::LatencyBound { .. } => {
                    unreachable!("round {round}: the budget sits above the path runtime")
                }
            }
        }
    }
}

#[test]
fn test_tree_partitioners_agree_without_latency_bound() {
    let mut rng = StdRng::seed_from_u64(0xabcd);
    for round in 0..ITERATIONS {
        let sg = random_tree(&mut rng, NODES);
        let req = TreeRequest::new(NODES)
            .with_constraints(Constraints::new(6, 2, None))
            .with_params(CostParams::new(10, 100));

        let mtp = mtp_partition(&sg, &req).unwrap();
        let btp = btp_partition(&sg, &req).unwrap();
        assert_eq!(mtp.cost(), btp.cost(), "round {round}");
    }
}
