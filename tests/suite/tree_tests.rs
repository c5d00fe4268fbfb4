//! Tree partitioning scenarios.

use faascut::partition::exhaustive_tree_partitioning;
use faascut::{
    btp_partition, mtp_partition, mtp_partition_with, ChainPartitioner, ChainRequest, ChainView,
    Constraints, CostParams, ScpChain, ServiceGraph, SweepChain, TreeOutcome, TreeRequest,
    PLATFORM,
};
use pretty_assertions::assert_eq;

/// Ten-function tree with critical path 1 -> 3 -> 8 -> 10.
///
/// The four path functions alone exceed M = 6, so a latency budget that
/// forbids any cut on the path is infeasible.
fn latency_tree() -> ServiceGraph {
    let mut sg = ServiceGraph::new();
    let nodes = [
        (30, 2),
        (20, 1),
        (40, 2),
        (10, 1),
        (15, 2),
        (10, 1),
        (25, 2),
        (35, 2),
        (10, 1),
        (20, 2),
    ];
    for (rt, mem) in nodes {
        sg.add_function(rt, mem);
    }
    let edges = [
        (PLATFORM, 1, 1),
        (1, 2, 1),
        (1, 3, 1),
        (2, 5, 2),
        (3, 4, 1),
        (3, 8, 2),
        (4, 6, 1),
        (4, 7, 2),
        (8, 9, 1),
        (8, 10, 1),
    ];
    for (u, v, r) in edges {
        sg.add_invocation(u, v, r).unwrap();
    }
    sg.validate().unwrap();
    sg
}

fn request(cp_end: usize, constraints: Constraints) -> TreeRequest {
    TreeRequest::new(cp_end)
        .with_constraints(constraints)
        .with_params(CostParams::new(10, 100))
}

#[test]
fn test_chain_as_degenerate_tree() {
    let runtime = [20, 40, 50, 20, 70, 40, 50, 60, 40, 10];
    let memory = [3, 3, 2, 1, 2, 1, 2, 1, 2, 3];
    let rate = [1, 1, 2, 2, 1, 3, 1, 2, 1, 3];
    let sg = ServiceGraph::chain(&runtime, &memory, &rate).unwrap();

    for latency in [None, Some(500), Some(440)] {
        let creq = ChainRequest::new(
            Constraints::new(6, 3, latency),
            CostParams::new(10, 100),
        );
        let chain = ChainView::new(&runtime, &memory, &rate).unwrap();
        let chain_cost = ScpChain
            .partition(chain, &creq)
            .unwrap()
            .cost()
            .expect("chain bounds admit a partitioning");

        let treq = request(10, Constraints::new(6, 3, latency));
        assert_eq!(mtp_partition(&sg, &treq).unwrap().cost(), Some(chain_cost));
        assert_eq!(btp_partition(&sg, &treq).unwrap().cost(), Some(chain_cost));
    }
}

#[test]
fn test_algorithms_agree_with_oracle() {
    let sg = latency_tree();
    let req = request(10, Constraints::new(6, 2, None));

    let optima = exhaustive_tree_partitioning(&sg, &req).unwrap();
    assert!(!optima.is_empty());
    let best = optima[0].cost;

    let mtp = mtp_partition(&sg, &req).unwrap();
    let btp = btp_partition(&sg, &req).unwrap();
    assert_eq!(mtp.cost(), Some(best));
    assert_eq!(btp.cost(), Some(best));
    assert!(optima.iter().any(|p| p.blocks == mtp.feasible().unwrap().blocks));
    assert!(optima.iter().any(|p| p.blocks == btp.feasible().unwrap().blocks));
}

#[test]
fn test_latency_sweep_costs_are_monotone() {
    let sg = latency_tree();
    let cpath_rt: u64 = [1, 3, 8, 10].iter().map(|&v| sg.runtime(v)).sum();
    assert_eq!(cpath_rt, 125);

    let mut last_cost = 0;
    for slack in (0..=3).rev() {
        let req = request(10, Constraints::new(6, 2, cpath_rt + slack * 10));
        let mtp = mtp_partition(&sg, &req).unwrap();
        let btp = btp_partition(&sg, &req).unwrap();
        assert_eq!(mtp.cost(), btp.cost(), "slack {slack}");

        let optima = exhaustive_tree_partitioning(&sg, &req).unwrap();
        match mtp {
            TreeOutcome::Feasible(ref part) => {
                assert_eq!(part.cost, optima[0].cost, "slack {slack}");
                assert!(part.cost >= last_cost, "tighter latency must not get cheaper");
                assert!(part.cuts as u64 * 10 + cpath_rt <= cpath_rt + slack * 10);
                last_cost = part.cost;
            }
            _ => {
                // The four path functions exceed M in a single block, so a
                // budget without cuts has no feasible partition.
                assert!(optima.is_empty(), "slack {slack}");
            }
        }
    }
    // Below the path runtime both algorithms report the lower bound.
    let req = request(10, Constraints::new(6, 2, cpath_rt - 1));
    assert_eq!(
        mtp_partition(&sg, &req).unwrap(),
        TreeOutcome::LatencyBound { min_latency: cpath_rt }
    );
    assert_eq!(
        btp_partition(&sg, &req).unwrap(),
        TreeOutcome::LatencyBound { min_latency: cpath_rt }
    );
}

#[test]
fn test_meta_accepts_alternate_chain_partitioner() {
    let sg = latency_tree();
    let req = request(10, Constraints::new(6, 2, Some(155)));

    let with_dp = mtp_partition_with(&ScpChain, &sg, &req).unwrap();
    let with_sweep = mtp_partition_with(&SweepChain, &sg, &req).unwrap();
    assert_eq!(with_dp, with_sweep);
}

#[test]
fn test_partition_invariants_hold() {
    let sg = latency_tree();
    let req = request(10, Constraints::new(6, 2, Some(145)));

    for outcome in [mtp_partition(&sg, &req).unwrap(), btp_partition(&sg, &req).unwrap()] {
        let part = outcome.feasible().expect("two cuts of slack are enough");
        // Blocks tile all functions and respect the bounds.
        let mut nodes: Vec<usize> = part.blocks.iter().flatten().copied().collect();
        nodes.sort_unstable();
        assert_eq!(nodes, (1..=10).collect::<Vec<_>>());
        for block in &part.blocks {
            assert!(block.iter().map(|&v| sg.memory(v)).sum::<u64>() <= 6);
            let rate: Vec<u64> = block.iter().map(|&v| sg.rate(v)).collect();
            let mut max_rate = 0;
            let mut cpu = 1;
            for &r in rate.iter().rev() {
                max_rate = max_rate.max(r);
                cpu = cpu.max(max_rate.div_ceil(r));
            }
            assert!(cpu <= 2);
        }
    }
}

#[test]
fn test_determinism() {
    let sg = latency_tree();
    let req = request(10, Constraints::new(6, 2, Some(155)));

    let first_mtp = mtp_partition(&sg, &req).unwrap();
    let first_btp = btp_partition(&sg, &req).unwrap();
    for _ in 0..3 {
        assert_eq!(mtp_partition(&sg, &req).unwrap(), first_mtp);
        assert_eq!(btp_partition(&sg, &req).unwrap(), first_btp);
    }
}
