//! Chain partitioning scenarios.

use faascut::partition::exhaustive_chain_partitioning;
use faascut::{
    ChainOutcome, ChainPartitioner, ChainRequest, ChainView, Constraints, CostParams, ScpChain,
    SweepChain,
};
use pretty_assertions::assert_eq;

const RUNTIME: [u64; 10] = [20, 40, 50, 20, 70, 40, 50, 60, 40, 10];
const MEMORY: [u64; 10] = [3, 3, 2, 1, 2, 1, 2, 1, 2, 3];
const RATE: [u64; 10] = [1, 1, 2, 2, 1, 3, 1, 2, 1, 3];

fn chain() -> ChainView<'static> {
    ChainView::new(&RUNTIME, &MEMORY, &RATE).unwrap()
}

fn request(constraints: Constraints) -> ChainRequest {
    ChainRequest::new(constraints, CostParams::new(10, 100))
}

#[test]
fn test_unconstrained_latency_matches_oracle() {
    let req = request(Constraints::new(6, 3, None));

    let dp = ScpChain.partition(chain(), &req).unwrap();
    let part = dp.feasible().expect("bounds admit a partitioning");
    let optima = exhaustive_chain_partitioning(chain(), &req).unwrap();
    assert!(!optima.is_empty());
    assert_eq!(part.cost, optima[0].cost);
    assert!(
        optima.iter().any(|p| p.barriers == part.barriers),
        "DP partition {:?} missing from the oracle's equi-optimum set",
        part.barriers
    );
}

#[test]
fn test_sweep_variant_is_identical() {
    for latency in [None, Some(500), Some(430), Some(400)] {
        let req = request(Constraints::new(6, 3, latency));
        assert_eq!(
            SweepChain.partition(chain(), &req).unwrap(),
            ScpChain.partition(chain(), &req).unwrap(),
        );
    }
}

#[test]
fn test_windowed_latency_sweep() {
    // Latency window [1, 8]; shrinking the budget by one delay at a time
    // forces ever fewer blocks until M makes the request infeasible.
    let window_rt: u64 = RUNTIME[1..=8].iter().sum();
    let mut last_cost = 0;
    for slack in (2..=4).rev() {
        let req = request(Constraints::new(6, 3, window_rt + slack * 10)).with_window(1, 8);
        let outcome = ScpChain.partition(chain(), &req).unwrap();

        let part = outcome.feasible().expect("enough slack for three blocks");
        assert!(part.latency <= window_rt + slack * 10);
        assert!(part.cost >= last_cost, "tighter latency must not get cheaper");
        last_cost = part.cost;

        let optima = exhaustive_chain_partitioning(chain(), &req).unwrap();
        assert_eq!(part.cost, optima[0].cost);
        assert!(optima.iter().any(|p| p.barriers == part.barriers));
    }
}

#[test]
fn test_windowed_latency_infeasible_by_memory() {
    // One delay of slack admits at most two blocks, but M = 6 needs three
    // over the window.
    let window_rt: u64 = RUNTIME[1..=8].iter().sum();
    let req = request(Constraints::new(6, 3, window_rt + 10)).with_window(1, 8);

    assert_eq!(ScpChain.partition(chain(), &req).unwrap(), ChainOutcome::Infeasible);
    assert_eq!(SweepChain.partition(chain(), &req).unwrap(), ChainOutcome::Infeasible);
    assert!(exhaustive_chain_partitioning(chain(), &req).unwrap().is_empty());
}

#[test]
fn test_single_node_chain() {
    let runtime = [70];
    let memory = [2];
    let rate = [3];
    let single = ChainView::new(&runtime, &memory, &rate).unwrap();
    let req = request(Constraints::default());

    let outcome = ScpChain.partition(single, &req).unwrap();
    let part = outcome.feasible().unwrap();
    assert_eq!(part.blocks(1), vec![vec![0]]);
    assert_eq!(part.cost, 3 * 100);
    assert_eq!(part.latency, 70);
}

#[test]
fn test_cost_monotone_in_memory_bound() {
    let mut last_cost = u64::MAX;
    for m in 4..=10 {
        let req = request(Constraints::new(m, 3, None));
        if let Some(part) = ScpChain.partition(chain(), &req).unwrap().feasible() {
            assert!(part.cost <= last_cost, "loosening M must not raise the cost");
            last_cost = part.cost;
        }
    }
}

#[test]
fn test_cost_monotone_in_core_bound() {
    let mut last_cost = u64::MAX;
    for n in 1..=4 {
        let req = request(Constraints::new(6, n, None));
        if let Some(part) = ScpChain.partition(chain(), &req).unwrap().feasible() {
            assert!(part.cost <= last_cost, "loosening N must not raise the cost");
            last_cost = part.cost;
        }
    }
}

#[test]
fn test_returned_blocks_respect_bounds() {
    let req = request(Constraints::new(6, 3, Some(500)));
    let outcome = ScpChain.partition(chain(), &req).unwrap();

    let part = outcome.feasible().unwrap();
    for block in part.blocks(RUNTIME.len()) {
        let (b, w) = (block[0], *block.last().unwrap());
        assert!(MEMORY[b..=w].iter().sum::<u64>() <= 6);
        let mut max_rate = 0;
        let mut cpu = 1;
        for i in (b..=w).rev() {
            max_rate = max_rate.max(RATE[i]);
            cpu = cpu.max(max_rate.div_ceil(RATE[i]));
        }
        assert!(cpu <= 3);
    }
    // Blocks tile the chain.
    let nodes: Vec<usize> = part.blocks(RUNTIME.len()).into_iter().flatten().collect();
    assert_eq!(nodes, (0..RUNTIME.len()).collect::<Vec<_>>());
}
