// BgpSim: BGP Network Simulator written in Rust
// Copyright 2022-2024 Tibor Schneider <sctibor@ethz.ch>
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Seven-node diamond: a single flow of volume 1.0 splits unevenly across two ECMP-style forks
//! and recombines, so the combined load on one link is neither 0.5 nor 1.0.

use std::collections::HashMap;

use approx::assert_abs_diff_eq;

use crate::common::Flow;
use crate::forwarding::{FwGraph, EXIT};
use crate::properties::CongestionProperty;

#[test]
fn load_recombines_to_three_quarters_at_the_merge_point() {
    let flow = Flow::new(1, "10.0.0.0/24".to_string());
    let mut fwg = FwGraph::new(7, 1, "10.0.0.0/24".to_string());
    // node 1 forks into node 2 and node 3 (each gets half of the volume)
    fwg.add_fw_rule(1, 2);
    fwg.add_fw_rule(1, 3);
    // node 3 forwards everything it gets straight to node 5
    fwg.add_fw_rule(3, 5);
    // node 2 forks again: half of its share goes to 5, the other half leaves directly via 6
    fwg.add_fw_rule(2, 5);
    fwg.add_fw_rule(2, 6);
    // node 5 forwards everything onward to node 6, where it exits
    fwg.add_fw_rule(5, 6);
    fwg.add_fw_rule(6, EXIT);

    let mut fw_graphs = HashMap::new();
    fw_graphs.insert(flow.clone(), fwg);

    let prop = CongestionProperty {
        flows: vec![flow],
        volumes: vec![1.0],
        link: (5, 6),
        threshold: 0.75,
    };
    assert!(prop.check(&fw_graphs));

    let prop_too_strict = CongestionProperty {
        threshold: 0.74,
        ..prop
    };
    assert!(!prop_too_strict.check(&fw_graphs));
}

#[test]
fn load_on_merge_link_is_exactly_three_quarters() {
    // same topology, read the load back out through a threshold sweep to pin the exact value
    let flow = Flow::new(1, "10.0.0.0/24".to_string());
    let mut fwg = FwGraph::new(7, 1, "10.0.0.0/24".to_string());
    fwg.add_fw_rule(1, 2);
    fwg.add_fw_rule(1, 3);
    fwg.add_fw_rule(3, 5);
    fwg.add_fw_rule(2, 5);
    fwg.add_fw_rule(2, 6);
    fwg.add_fw_rule(5, 6);
    fwg.add_fw_rule(6, EXIT);
    let mut fw_graphs = HashMap::new();
    fw_graphs.insert(flow.clone(), fwg);

    // binary search the threshold at which the property flips, which is exactly the load value
    let mut lo = 0.0f64;
    let mut hi = 1.0f64;
    for _ in 0..40 {
        let mid = (lo + hi) / 2.0;
        let prop = CongestionProperty {
            flows: vec![flow.clone()],
            volumes: vec![1.0],
            link: (5, 6),
            threshold: mid,
        };
        if prop.check(&fw_graphs) {
            hi = mid;
        } else {
            lo = mid;
        }
    }
    assert_abs_diff_eq!(hi, 0.75, epsilon = 1e-9);
}
