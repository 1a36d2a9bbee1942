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

//! Two border routers announce routes tying on the Top-3 attributes but from the same remote
//! AS with different MED; the lower MED must win at the node that sees both.

use std::collections::HashMap;
use std::rc::Rc;

use crate::bgp::{AsId, Announcement, BgpConfig, BgpRouter, ExternalRouter, InternalRouter};
use crate::common::Flow;
use crate::graph::{Link, Topology};
use crate::properties::ReachableProperty;

use super::support::compute_fw_graph;

// node 0: border for X (med 10), node 1: border for W (med 50), node 2: source, seeing both.
fn triangle_bgp_config() -> Rc<BgpConfig> {
    let routers = vec![
        BgpRouter::Internal(InternalRouter {
            id: 0,
            as_id: AsId(1),
            name: "border-x".to_string(),
            assigned_node: 0,
            peers: vec![1, 2],
            rr_clients: vec![],
            is_border_router: true,
        }),
        BgpRouter::Internal(InternalRouter {
            id: 1,
            as_id: AsId(1),
            name: "border-w".to_string(),
            assigned_node: 1,
            peers: vec![0, 2],
            rr_clients: vec![],
            is_border_router: true,
        }),
        BgpRouter::Internal(InternalRouter {
            id: 2,
            as_id: AsId(1),
            name: "src".to_string(),
            assigned_node: 2,
            peers: vec![0, 1],
            rr_clients: vec![],
            is_border_router: false,
        }),
        BgpRouter::External(ExternalRouter {
            id: 3,
            as_id: AsId(9),
            name: "X".to_string(),
            peer: 0,
        }),
        BgpRouter::External(ExternalRouter {
            id: 4,
            as_id: AsId(9),
            name: "W".to_string(),
            peer: 1,
        }),
    ];
    let mut ext_anns = HashMap::new();
    let mut per_router = HashMap::new();
    per_router.insert(3, Announcement::new(3, 1, 0, 10));
    per_router.insert(4, Announcement::new(3, 1, 0, 50));
    ext_anns.insert("P".to_string(), per_router);
    Rc::new(BgpConfig::new(routers, ext_anns))
}

#[test]
fn lower_med_wins_between_two_same_as_borders() {
    let links = vec![Link::new(0, 2, 1, 1), Link::new(1, 2, 1, 1)];
    let topo = Topology::new(3, links);
    let bgp_config = triangle_bgp_config();

    let fwg = compute_fw_graph(3, &topo, &bgp_config, 2, "P");
    // traffic from 2 must go via node 0 (X, med 10), not node 1 (W, med 50)
    assert_eq!(fwg.next[2], vec![0]);
    assert!(fwg.exits_at(0));

    let flow = Flow::new(2, "P".to_string());
    let mut fw_graphs = HashMap::new();
    fw_graphs.insert(flow.clone(), fwg);
    let prop = ReachableProperty { flows: vec![flow] };
    assert!(prop.check(&fw_graphs));
}
