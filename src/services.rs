//! Smart-parking reference services.
//!
//! Two measured variants of the same 14-function parking-lot monitoring
//! service, differing in per-function runtimes and invocation rates
//! between busy and idle hours. They double as realistic fixtures for the
//! partitioning tests.

use crate::graph::{NodeId, ServiceGraph, PLATFORM};

fn build(nodes: &[(u64, u64)], edges: &[(NodeId, NodeId, u64)]) -> ServiceGraph {
    let mut sg = ServiceGraph::new();
    for &(runtime, memory) in nodes {
        sg.add_function(runtime, memory);
    }
    for &(from, to, rate) in edges {
        sg.add_invocation(from, to, rate)
            .expect("reference service tables are well-formed");
    }
    sg.validate().expect("reference service tables are well-formed");
    sg
}

/// The daytime (busy hours) parking service.
pub fn daytime_service() -> ServiceGraph {
    build(
        &[
            (288, 226),  // 1: image registration
            (434, 349),  // 2: image transformation
            (1928, 1635), // 3: car detection
            (4, 82),     // 4: display update
            (121, 110),  // 5: free slot detection
            (4, 75),     // 6: register update
            (4, 89),     // 7: logging
            (21, 110),   // 8: slot validation
            (4, 77),     // 9: queue warning
            (170, 193),  // 10: car cut
            (45, 261),   // 11: anonymized statistics
            (378, 216),  // 12: plate recognition
            (21, 73),    // 13: license validation
            (4, 80),     // 14: system update
        ],
        &[
            (PLATFORM, 1, 1),
            (1, 2, 1),
            (2, 3, 1),
            (3, 4, 1),
            (3, 5, 1),
            (3, 8, 9),
            (5, 6, 3),
            (5, 7, 3),
            (8, 9, 2),
            (8, 10, 7),
            (10, 11, 7),
            (10, 12, 7),
            (12, 13, 7),
            (13, 14, 7),
        ],
    )
}

/// The nighttime (idle hours) parking service.
pub fn nighttime_service() -> ServiceGraph {
    build(
        &[
            (289, 226),  // 1: image registration
            (437, 349),  // 2: image transformation
            (1928, 1635), // 3: car detection
            (4, 82),     // 4: display update
            (279, 111),  // 5: free slot detection
            (4, 75),     // 6: register update
            (4, 89),     // 7: logging
            (28, 111),   // 8: slot validation
            (4, 77),     // 9: queue warning
            (172, 193),  // 10: car cut
            (48, 261),   // 11: anonymized statistics
            (376, 216),  // 12: plate recognition
            (27, 74),    // 13: license validation
            (4, 77),     // 14: system update
        ],
        &[
            (PLATFORM, 1, 1),
            (1, 2, 1),
            (2, 3, 1),
            (3, 4, 1),
            (3, 5, 1),
            (3, 8, 2),
            (5, 6, 8),
            (5, 7, 8),
            (8, 9, 1),
            (8, 10, 2),
            (10, 11, 2),
            (10, 12, 2),
            (12, 13, 2),
            (13, 14, 2),
        ],
    )
}
