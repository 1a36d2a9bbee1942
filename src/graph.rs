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

//! Topology: the physical link list and the directed graph derived from it.

use std::collections::HashMap;

use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::Directed;

/// Internal node identifier: a dense index into `0..nof_nodes`.
pub type NodeId = usize;

/// Index of a link in the canonical link list.
pub type LinkId = usize;

/// An undirected topology edge with two directed weights, identified by its position in the
/// canonical link list. Immutable once loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Link {
    /// first endpoint
    pub u: NodeId,
    /// second endpoint
    pub v: NodeId,
    /// weight of the u -> v direction
    pub weight_uv: i64,
    /// weight of the v -> u direction
    pub weight_vu: i64,
}

impl Link {
    /// Construct a new link.
    pub fn new(u: NodeId, v: NodeId, weight_uv: i64, weight_vu: i64) -> Self {
        Link {
            u,
            v,
            weight_uv,
            weight_vu,
        }
    }
}

/// The directed graph `G` derived from the link list, plus the bookkeeping needed to mutate it
/// in place as failure states are explored.
///
/// Each link contributes two directed edges. The weight stored on edge `(u -> v)` is
/// *intentionally* the link's `v -> u` weight: a single-source shortest-path computation rooted
/// at a border router then yields, for every node, the cost of reaching that router in the
/// forward direction. This inversion is load-bearing for [`crate::igp::IgpProvider`] and must be
/// preserved by any code that adds or removes edges.
#[derive(Debug, Clone)]
pub struct Topology {
    /// total number of internal nodes
    pub nof_nodes: usize,
    /// canonical link list; `links[i]` is the link with id `i`
    pub links: Vec<Link>,
    /// the live directed graph, mutated in place to reflect the currently explored state
    pub graph: StableDiGraph<(), i64, Directed, u32>,
    link_id_for_edge: HashMap<(NodeId, NodeId), LinkId>,
}

impl Topology {
    /// Build a topology with all links up.
    pub fn new(nof_nodes: usize, links: Vec<Link>) -> Self {
        let mut graph = StableDiGraph::with_capacity(nof_nodes, links.len() * 2);
        for _ in 0..nof_nodes {
            graph.add_node(());
        }
        let mut link_id_for_edge = HashMap::with_capacity(links.len() * 2);
        for (link_id, link) in links.iter().enumerate() {
            link_id_for_edge.insert((link.u, link.v), link_id);
            link_id_for_edge.insert((link.v, link.u), link_id);
        }
        let mut topo = Topology {
            nof_nodes,
            links,
            graph,
            link_id_for_edge,
        };
        for link_id in 0..topo.links.len() {
            topo.add_link_to_graph(link_id);
        }
        topo
    }

    fn node_index(&self, id: NodeId) -> NodeIndex<u32> {
        NodeIndex::new(id)
    }

    /// Add the two directed edges for `link_id` back into `G` (weights swapped per the struct
    /// doc comment).
    pub fn add_link_to_graph(&mut self, link_id: LinkId) {
        let link = self.links[link_id];
        let u = self.node_index(link.u);
        let v = self.node_index(link.v);
        self.graph.update_edge(u, v, link.weight_vu);
        self.graph.update_edge(v, u, link.weight_uv);
    }

    /// Remove both directed edges for `link_id` from `G`.
    pub fn remove_link_from_graph(&mut self, link_id: LinkId) {
        let link = self.links[link_id];
        let u = self.node_index(link.u);
        let v = self.node_index(link.v);
        if let Some(e) = self.graph.find_edge(u, v) {
            self.graph.remove_edge(e);
        }
        if let Some(e) = self.graph.find_edge(v, u) {
            self.graph.remove_edge(e);
        }
    }

    /// The link id of the edge between `u` and `v` in either direction, if one exists.
    pub fn link_id_for_edge(&self, u: NodeId, v: NodeId) -> Option<LinkId> {
        self.link_id_for_edge.get(&(u, v)).copied()
    }

    /// The non-inverted weight actually configured for the directed edge `u -> v`.
    pub fn get_weight_for_edge(&self, u: NodeId, v: NodeId) -> i64 {
        let link = self.links[self.link_id_for_edge[&(u, v)]];
        if link.u == u {
            link.weight_uv
        } else {
            link.weight_vu
        }
    }

    /// `true` iff the directed edge `u -> v` is currently live in `G`.
    pub fn has_edge(&self, u: NodeId, v: NodeId) -> bool {
        self.graph
            .find_edge(self.node_index(u), self.node_index(v))
            .is_some()
    }

    /// Out-neighbors of `u` currently present in `G`.
    pub fn neighbors(&self, u: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.graph
            .neighbors(self.node_index(u))
            .map(|idx| idx.index())
    }
}
