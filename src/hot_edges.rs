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

//! Hot-edge selection: the small set of links whose failure could actually change a flow's
//! forwarding behavior, used by the explorer to decide which failure states are worth splitting
//! off from the current one instead of folding into "all other links stay up".

use std::collections::HashSet;

use crate::bgp::BgpConfig;
use crate::bgp::protocol::BgpProtocol;
use crate::common::Flow;
use crate::forwarding::FwGraph;
use crate::graph::NodeId;
use crate::igp::IgpProvider;

/// Normalized `(min, max)` undirected edge.
pub type Edge = (NodeId, NodeId);

fn add_normalized(e: (NodeId, NodeId), into: &mut HashSet<Edge>) {
    into.insert(if e.0 < e.1 { e } else { (e.1, e.0) });
}

fn add_edges_of_path(path: &[NodeId], into: &mut HashSet<Edge>) {
    for w in path.windows(2) {
        add_normalized((w[0], w[1]), into);
    }
}

/// Add every edge relevant to `flow`'s forwarding graph to `hot_edges`:
/// - every shortest path between a route reflector and a Top-3-surviving border router
/// - the shortest path from each decision point to its selected next hop
/// - every edge actually traversed while building the forwarding graph
/// - if there are no route reflectors in this partition, the shortest path from the flow's
///   source to each Top-3-surviving border router (needed to keep the partition connected)
pub fn add_hot_edges_bgp(
    flow: &Flow,
    fwg: &FwGraph,
    decision_points: &[NodeId],
    bgp: &BgpProtocol,
    bgp_config: &BgpConfig,
    igp: &IgpProvider,
    hot_edges: &mut HashSet<Edge>,
) {
    for &rr_idx in &bgp.rr_in_partition {
        let rr_node = bgp_config.routers[rr_idx].as_internal().unwrap().assigned_node;
        for &br_peer in &bgp.br_top3_in_partition {
            let br_node = bgp_config.assigned_node(br_peer);
            add_edges_of_path(&igp.get_a_shortest_path(rr_node, br_node), hot_edges);
        }
    }

    for &r in decision_points {
        if let Some(next_hop) = igp.get_bgp_next_hop(r, &flow.dst) {
            if !bgp_config.is_external(next_hop) {
                let next_node = bgp_config.assigned_node(next_hop);
                add_edges_of_path(&igp.get_a_shortest_path(r, next_node), hot_edges);
            }
        }
    }

    for &(u, v) in &fwg.traversed_edges {
        add_normalized((u, v), hot_edges);
    }

    if bgp.rr_in_partition.is_empty() {
        for &br_peer in &bgp.br_top3_in_partition {
            let br_node = bgp_config.assigned_node(br_peer);
            add_edges_of_path(&igp.get_a_shortest_path(flow.src, br_node), hot_edges);
        }
    }
}
