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

//! A waypoint property over a small chain topology, with and without a shortcut that bypasses
//! the waypoint node.

use std::collections::HashMap;
use std::rc::Rc;

use crate::bgp::{AsId, Announcement, BgpConfig, BgpRouter, ExternalRouter, InternalRouter};
use crate::common::Flow;
use crate::graph::{Link, Topology};
use crate::properties::WaypointProperty;

use super::support::compute_fw_graph;

fn chain_bgp_config() -> Rc<BgpConfig> {
    let routers = vec![
        BgpRouter::Internal(InternalRouter {
            id: 0,
            as_id: AsId(1),
            name: "r0".to_string(),
            assigned_node: 0,
            peers: vec![1],
            rr_clients: vec![],
            is_border_router: false,
        }),
        BgpRouter::Internal(InternalRouter {
            id: 1,
            as_id: AsId(1),
            name: "r1".to_string(),
            assigned_node: 1,
            peers: vec![0, 2],
            rr_clients: vec![],
            is_border_router: false,
        }),
        BgpRouter::Internal(InternalRouter {
            id: 2,
            as_id: AsId(1),
            name: "r2".to_string(),
            assigned_node: 2,
            peers: vec![1, 3],
            rr_clients: vec![],
            is_border_router: false,
        }),
        BgpRouter::Internal(InternalRouter {
            id: 3,
            as_id: AsId(1),
            name: "r3".to_string(),
            assigned_node: 3,
            peers: vec![2],
            rr_clients: vec![],
            is_border_router: true,
        }),
        BgpRouter::External(ExternalRouter {
            id: 4,
            as_id: AsId(2),
            name: "X".to_string(),
            peer: 3,
        }),
    ];
    let mut ext_anns = HashMap::new();
    let mut per_router = HashMap::new();
    per_router.insert(4, Announcement::new(100, 1, 0, 0));
    ext_anns.insert("P".to_string(), per_router);
    Rc::new(BgpConfig::new(routers, ext_anns))
}

#[test]
fn waypoint_holds_on_the_direct_chain() {
    let links = vec![Link::new(0, 1, 1, 1), Link::new(1, 2, 1, 1), Link::new(2, 3, 1, 1)];
    let topo = Topology::new(4, links);
    let bgp_config = chain_bgp_config();

    let fwg = compute_fw_graph(4, &topo, &bgp_config, 0, "P");
    let flow = Flow::new(0, "P".to_string());
    let mut fw_graphs = HashMap::new();
    fw_graphs.insert(flow.clone(), fwg);

    let prop = WaypointProperty {
        flows: vec![flow],
        waypoint: 1,
    };
    assert!(prop.check(&fw_graphs));
}

#[test]
fn waypoint_fails_when_a_shortcut_bypasses_it() {
    let links = vec![
        Link::new(0, 1, 1, 1),
        Link::new(1, 2, 1, 1),
        Link::new(2, 3, 1, 1),
        Link::new(0, 3, 1, 1), // shortcut straight to the border router
    ];
    let topo = Topology::new(4, links);
    let bgp_config = chain_bgp_config();

    let fwg = compute_fw_graph(4, &topo, &bgp_config, 0, "P");
    let flow = Flow::new(0, "P".to_string());
    let mut fw_graphs = HashMap::new();
    fw_graphs.insert(flow.clone(), fwg);

    let prop = WaypointProperty {
        flows: vec![flow],
        waypoint: 1,
    };
    assert!(!prop.check(&fw_graphs));
}
