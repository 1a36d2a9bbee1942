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

//! Reference-equivalence test: the smart explorer's `p_property` must agree with a brute-force
//! enumeration over every concrete link-failure state, to within floating-point tolerance.

use std::collections::HashMap;
use std::rc::Rc;

use approx::assert_abs_diff_eq;

use crate::bgp::{AsId, Announcement, BgpConfig, BgpRouter, ExternalRouter, InternalRouter};
use crate::bgp::protocol::BgpProtocol;
use crate::common::Flow;
use crate::explorer::Explorer;
use crate::failure_model::{FailureModel, LinkFailureModel};
use crate::forwarding::construct_fw_graph_decision_points;
use crate::graph::{Link, Topology};
use crate::igp::IgpProvider;
use crate::prob::Prob;
use crate::problem::Problem;
use crate::properties::{Property, ReachableProperty};

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
            name: "border".to_string(),
            assigned_node: 2,
            peers: vec![1],
            rr_clients: vec![],
            is_border_router: true,
        }),
        BgpRouter::External(ExternalRouter {
            id: 3,
            as_id: AsId(2),
            name: "X".to_string(),
            peer: 2,
        }),
    ];
    let mut ext_anns = HashMap::new();
    let mut per_router = HashMap::new();
    per_router.insert(3, Announcement::new(100, 1, 0, 0));
    ext_anns.insert("P".to_string(), per_router);
    Rc::new(BgpConfig::new(routers, ext_anns))
}

#[test]
fn explorer_matches_brute_force_enumeration() {
    let links = vec![Link::new(0, 1, 1, 1), Link::new(1, 2, 1, 1)];
    let bgp_config = chain_bgp_config();
    let failure_model = Rc::new(FailureModel::Link(LinkFailureModel::new(Prob::new(0.1))));
    let flow = Flow::new(0, "P".to_string());
    let property = Property::Reachable(ReachableProperty { flows: vec![flow.clone()] });

    let mut problem = Problem::new(
        3,
        links.clone(),
        vec![],
        Rc::clone(&bgp_config),
        Rc::clone(&failure_model),
        property.clone(),
    );
    problem.target_precision = 0.0;

    let mut explorer = Explorer::new(problem);
    let solution = explorer.explore_all(None).expect("BGP converges in this fixture");

    let mut expected = Prob::zero();
    for mask in 0u8..4 {
        let state = vec![(mask & 1) as i8, ((mask >> 1) & 1) as i8];
        let p_state = failure_model.get_state_prob(&state);

        let mut topo = Topology::new(3, links.clone());
        for (link_id, &s) in state.iter().enumerate() {
            if s == 0 {
                topo.remove_link_from_graph(link_id);
            }
        }

        let mut igp = IgpProvider::new(3, vec![2], HashMap::new());
        igp.recompute(&topo);
        let mut bgp = BgpProtocol::new(Rc::clone(&bgp_config));
        bgp.init_partition(0, "P", &igp);
        bgp.run(&igp).expect("BGP converges in this fixture");
        igp.update_bgp_next_hops("P", bgp.next_hops_for_internal());

        let (fwg, _decision_points) = construct_fw_graph_decision_points(3, 0, "P", &topo, &bgp_config, &igp);
        let mut fw_graphs = HashMap::new();
        fw_graphs.insert(flow.clone(), fwg);

        if property.check(&fw_graphs) {
            expected += p_state;
        }
    }

    assert_abs_diff_eq!(expected.val(), solution.p_property.val(), epsilon = 1e-10);
    // with target_precision == 0.0 the queue drains completely
    assert_abs_diff_eq!(solution.p_explored.val(), 1.0, epsilon = 1e-10);
}
