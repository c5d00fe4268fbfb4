//! Partitioning the smart-parking reference services.

use faascut::partition::exhaustive_tree_partitioning;
use faascut::services::{daytime_service, nighttime_service};
use faascut::{btp_partition, mtp_partition, Constraints, CostParams, TreeRequest};
use pretty_assertions::assert_eq;

fn request() -> TreeRequest {
    TreeRequest::new(14)
        .with_constraints(Constraints::new(3072, 3, 3400))
        .with_params(CostParams::new(80, 100))
}

#[test]
fn test_daytime_service_algorithms_agree() {
    let sg = daytime_service();
    let req = request();

    let mtp = mtp_partition(&sg, &req).unwrap();
    let btp = btp_partition(&sg, &req).unwrap();
    let mtp_part = mtp.feasible().expect("daytime service fits the bounds");
    let btp_part = btp.feasible().expect("daytime service fits the bounds");
    assert_eq!(mtp_part.cost, btp_part.cost);
    assert_eq!(mtp_part.blocks, btp_part.blocks);
}

#[test]
fn test_nighttime_service_algorithms_agree() {
    let sg = nighttime_service();
    let req = request();

    let mtp = mtp_partition(&sg, &req).unwrap();
    let btp = btp_partition(&sg, &req).unwrap();
    let mtp_part = mtp.feasible().expect("nighttime service fits the bounds");
    let btp_part = btp.feasible().expect("nighttime service fits the bounds");
    assert_eq!(mtp_part.cost, btp_part.cost);
    assert_eq!(mtp_part.blocks, btp_part.blocks);
}

#[test]
fn test_services_match_the_oracle() {
    for sg in [daytime_service(), nighttime_service()] {
        let req = request();
        let optima = exhaustive_tree_partitioning(&sg, &req).unwrap();
        assert!(!optima.is_empty());

        let mtp = mtp_partition(&sg, &req).unwrap();
        let btp = btp_partition(&sg, &req).unwrap();
        assert_eq!(mtp.cost(), Some(optima[0].cost));
        assert_eq!(btp.cost(), Some(optima[0].cost));
        assert!(optima.iter().any(|p| p.blocks == mtp.feasible().unwrap().blocks));
        assert!(optima.iter().any(|p| p.blocks == btp.feasible().unwrap().blocks));
    }
}

#[test]
fn test_service_partition_respects_bounds() {
    let sg = daytime_service();
    let req = request();

    let part = btp_partition(&sg, &req).unwrap().feasible().cloned().unwrap();
    for block in &part.blocks {
        assert!(block.iter().map(|&v| sg.memory(v)).sum::<u64>() <= 3072);
    }
    // Critical-path latency: block runtimes plus one delay per cut.
    let cpath = [1, 2, 3, 8, 10, 12, 13, 14];
    let cpath_rt: u64 = cpath.iter().map(|&v| sg.runtime(v)).sum();
    assert!(cpath_rt + part.cuts as u64 * 80 <= 3400);
}

#[test]
fn test_day_and_night_optimal_layouts_differ_in_cost() {
    let req = request();
    let day = btp_partition(&daytime_service(), &req).unwrap();
    let night = btp_partition(&nighttime_service(), &req).unwrap();

    // Rates differ by an order of magnitude on the detection branch, so
    // the optimal bills do as well.
    assert!(day.cost().unwrap() > night.cost().unwrap());
}
