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

//! Forwarding graph construction: turn static routes, selected BGP next hops and IGP ECMP into
//! the per-node set of routers a packet for a given flow is forwarded to next.

use crate::bgp::BgpConfig;
use crate::graph::{NodeId, Topology};
use crate::igp::IgpProvider;

/// Sentinel `next` entry meaning "traffic exits the network here".
pub const EXIT: i64 = -1;

/// The forwarding behavior of every node in the topology for one flow.
#[derive(Debug, Clone)]
pub struct FwGraph {
    /// flow source
    pub src: NodeId,
    /// flow destination prefix
    pub dst: String,
    /// `next[u]` are the next routers `u` forwards to; `[EXIT]` means traffic leaves the network
    pub next: Vec<Vec<i64>>,
    /// every `(u, v)` edge actually used while building this graph
    pub traversed_edges: Vec<(NodeId, NodeId)>,
}

impl FwGraph {
    /// An empty forwarding graph over `nof_nodes` nodes.
    pub fn new(nof_nodes: usize, src: NodeId, dst: String) -> Self {
        FwGraph {
            src,
            dst,
            next: vec![Vec::new(); nof_nodes],
            traversed_edges: Vec::new(),
        }
    }

    /// `true` iff `node` forwards traffic out of the network.
    pub fn exits_at(&self, node: NodeId) -> bool {
        self.next[node].len() == 1 && self.next[node][0] == EXIT
    }

    /// Record that `u` forwards to `v` (`v = EXIT` for "leaves the network").
    pub fn add_fw_rule(&mut self, u: NodeId, v: i64) {
        self.next[u].push(v);
        if v >= 0 {
            self.traversed_edges.push((u, v as NodeId));
        }
    }

    /// Sort each node's outgoing next-hop list, for deterministic comparison/printing.
    pub fn normalize(&mut self) {
        for l in &mut self.next {
            l.sort_unstable();
        }
    }
}

/// Build the forwarding graph for `(src, dst)`, plus the list of "decision points": nodes where
/// the selected BGP next hop differs from the one the caller arrived with (including `src`
/// itself, which is always a decision point).
pub fn construct_fw_graph_decision_points(
    nof_nodes: usize,
    src: NodeId,
    dst: &str,
    topo: &Topology,
    bgp_config: &BgpConfig,
    igp: &IgpProvider,
) -> (FwGraph, Vec<NodeId>) {
    let mut fwg = FwGraph::new(nof_nodes, src, dst.to_string());
    let mut decision_points = Vec::new();
    let mut visited = vec![false; nof_nodes];
    visit(
        &mut fwg,
        &mut decision_points,
        &mut visited,
        src,
        None,
        topo,
        bgp_config,
        igp,
    );
    (fwg, decision_points)
}

fn visit(
    fwg: &mut FwGraph,
    decision_points: &mut Vec<NodeId>,
    visited: &mut [bool],
    cur: NodeId,
    prev_next_hop: Option<u32>,
    topo: &Topology,
    bgp_config: &BgpConfig,
    igp: &IgpProvider,
) {
    if visited[cur] {
        return;
    }
    visited[cur] = true;

    match igp.get_static_route_at(cur, &fwg.dst) {
        None => {
            let bgp_next_hop = igp.get_bgp_next_hop(cur, &fwg.dst);
            if bgp_next_hop != prev_next_hop {
                decision_points.push(cur);
            }
            if let Some(next_hop) = bgp_next_hop {
                if bgp_config.is_external(next_hop) {
                    fwg.add_fw_rule(cur, EXIT);
                } else {
                    let next_node = bgp_config.assigned_node(next_hop);
                    for next in igp.get_next_routers_shortest_paths(topo, cur, next_node) {
                        fwg.add_fw_rule(cur, next as i64);
                        visit(
                            fwg,
                            decision_points,
                            visited,
                            next,
                            Some(next_hop),
                            topo,
                            bgp_config,
                            igp,
                        );
                    }
                }
            }
        }
        Some(sr_next) => {
            if topo.has_edge(cur, sr_next) {
                fwg.add_fw_rule(cur, sr_next as i64);
                visit(
                    fwg,
                    decision_points,
                    visited,
                    sr_next,
                    None,
                    topo,
                    bgp_config,
                    igp,
                );
            }
        }
    }
}
