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

//! Shared helpers for the cross-module integration scenarios.

use std::collections::HashMap;
use std::rc::Rc;

use crate::bgp::protocol::BgpProtocol;
use crate::bgp::BgpConfig;
use crate::forwarding::{construct_fw_graph_decision_points, FwGraph};
use crate::graph::{NodeId, Topology};
use crate::igp::IgpProvider;

/// Run IGP + BGP + forwarding-graph construction for one flow over an already-built topology and
/// BGP configuration, exactly as [`crate::explorer::Explorer`] does internally for each flow.
pub fn compute_fw_graph(
    nof_nodes: usize,
    topo: &Topology,
    bgp_config: &Rc<BgpConfig>,
    src: NodeId,
    dst: &str,
) -> FwGraph {
    let border_routers: Vec<NodeId> = bgp_config
        .border
        .iter()
        .map(|&i| bgp_config.routers[i].as_internal().unwrap().assigned_node)
        .collect();
    let mut igp = IgpProvider::new(nof_nodes, border_routers, HashMap::new());
    igp.recompute(topo);

    let mut bgp = BgpProtocol::new(Rc::clone(bgp_config));
    bgp.init_partition(src, dst, &igp);
    bgp.run(&igp).expect("BGP converges in these small fixtures");
    igp.update_bgp_next_hops(dst, bgp.next_hops_for_internal());

    let (fwg, _decision_points) =
        construct_fw_graph_decision_points(nof_nodes, src, dst, topo, bgp_config, &igp);
    fwg
}
