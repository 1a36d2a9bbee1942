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

//! IGP shortest paths, strong connectivity, static routes and the per-destination BGP next-hop
//! cache, recomputed once per explored failure state.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use crate::bgp::PeerId;
use crate::graph::{NodeId, Topology};

#[derive(Debug, Clone)]
struct ShortestPaths {
    /// `cost[u]` is the real-graph cost of the path from `u` to the border router this was
    /// computed for.
    cost: Vec<i64>,
    /// `pred[u]` is the node preceding `u` on that path, walking from the border router.
    pred: Vec<Option<NodeId>>,
}

/// Recomputed once per explored failure state via [`IgpProvider::recompute`]; every other method
/// just reads the cached result.
#[derive(Debug)]
pub struct IgpProvider {
    nof_nodes: usize,
    border_routers: Vec<NodeId>,
    sp: HashMap<NodeId, ShortestPaths>,
    /// `components[u]` is the id of `u`'s strongly connected component
    components: Vec<i64>,
    static_route_data: HashMap<String, HashMap<NodeId, NodeId>>,
    bgp_next_hop_data: HashMap<String, HashMap<NodeId, Option<PeerId>>>,
}

impl IgpProvider {
    /// Build a provider for a topology with `nof_nodes` nodes, rooted at `border_routers` for
    /// shortest-path computation, with the given static routes (`dst -> (u -> v)`).
    pub fn new(
        nof_nodes: usize,
        border_routers: Vec<NodeId>,
        static_route_data: HashMap<String, HashMap<NodeId, NodeId>>,
    ) -> Self {
        IgpProvider {
            nof_nodes,
            border_routers,
            sp: HashMap::new(),
            components: vec![-1; nof_nodes],
            static_route_data,
            bgp_next_hop_data: HashMap::new(),
        }
    }

    /// Total number of internal nodes.
    pub fn nof_nodes(&self) -> usize {
        self.nof_nodes
    }

    /// Recompute shortest paths (rooted at every border router) and strongly connected
    /// components from the currently live edges of `topo`. Must be called after any failure is
    /// applied to `topo` and before any other query method is used.
    pub fn recompute(&mut self, topo: &Topology) {
        self.bgp_next_hop_data.clear();
        self.sp.clear();
        for &br in &self.border_routers.clone() {
            self.sp.insert(br, dijkstra_from(topo, br, self.nof_nodes));
        }
        self.components = tarjan_scc_ids(topo, self.nof_nodes);
    }

    /// Feed in the BGP next hop selected by every internal node for `destination`, so that
    /// forwarding-graph construction can look it up via [`IgpProvider::get_bgp_next_hop`].
    pub fn update_bgp_next_hops(
        &mut self,
        destination: &str,
        next_hop_data: HashMap<NodeId, Option<PeerId>>,
    ) {
        self.bgp_next_hop_data
            .insert(destination.to_string(), next_hop_data);
    }

    /// IGP cost of the path from internal node `u` to border router `v`.
    pub fn get_igp_cost(&self, u: NodeId, v: NodeId) -> i64 {
        self.sp[&v].cost[u]
    }

    /// `true` iff `v` is reachable from `u` (they lie in the same strongly connected component).
    pub fn is_reachable(&self, u: NodeId, v: NodeId) -> bool {
        self.components[u] == self.components[v]
    }

    /// A shortest path from `u` to border router `v`, as a sequence of node ids starting at `u`
    /// and ending at `v`.
    pub fn get_a_shortest_path(&self, u: NodeId, v: NodeId) -> Vec<NodeId> {
        let sp = &self.sp[&v];
        let mut path = vec![u];
        let mut cur = u;
        while cur != v {
            match sp.pred[cur] {
                Some(p) => {
                    path.push(p);
                    cur = p;
                }
                None => break,
            }
        }
        path
    }

    /// The BGP next hop selected by node `u` for `dst`, if the destination's next-hop map was
    /// fed in via [`IgpProvider::update_bgp_next_hops`].
    pub fn get_bgp_next_hop(&self, u: NodeId, dst: &str) -> Option<PeerId> {
        *self.bgp_next_hop_data.get(dst)?.get(&u)?
    }

    /// The static route configured at `u` for `dst`, if any.
    pub fn get_static_route_at(&self, u: NodeId, dst: &str) -> Option<NodeId> {
        self.static_route_data.get(dst)?.get(&u).copied()
    }

    /// All neighbors of `u` that lie on a shortest path to border router `v` (ECMP set). Empty
    /// if `u` has no path to `v`.
    pub fn get_next_routers_shortest_paths(&self, topo: &Topology, u: NodeId, v: NodeId) -> Vec<NodeId> {
        let sp = &self.sp[&v];
        let mut out = Vec::new();
        for neigh in topo.neighbors(u) {
            let w = topo.get_weight_for_edge(u, neigh);
            if sp.cost[neigh] + w == sp.cost[u] {
                out.push(neigh);
            }
        }
        out
    }
}

fn dijkstra_from(topo: &Topology, src: NodeId, nof_nodes: usize) -> ShortestPaths {
    let mut cost = vec![i64::MAX; nof_nodes];
    let mut pred = vec![None; nof_nodes];
    let mut visited = vec![false; nof_nodes];
    let mut heap = BinaryHeap::new();

    cost[src] = 0;
    heap.push(Reverse((0i64, src)));

    while let Some(Reverse((d, u))) = heap.pop() {
        if visited[u] {
            continue;
        }
        visited[u] = true;
        if d > cost[u] {
            continue;
        }
        for v in topo.neighbors(u) {
            if visited[v] {
                continue;
            }
            let w = topo.graph[topo
                .graph
                .find_edge(
                    petgraph::stable_graph::NodeIndex::new(u),
                    petgraph::stable_graph::NodeIndex::new(v),
                )
                .expect("neighbors() only yields nodes with a live edge")];
            let nd = d.saturating_add(w);
            if nd < cost[v] {
                cost[v] = nd;
                pred[v] = Some(u);
                heap.push(Reverse((nd, v)));
            }
        }
    }

    ShortestPaths { cost, pred }
}

/// Tarjan's strongly connected components, returning a per-node component id.
fn tarjan_scc_ids(topo: &Topology, nof_nodes: usize) -> Vec<i64> {
    struct State {
        index: Vec<Option<u32>>,
        low_link: Vec<u32>,
        on_stack: Vec<bool>,
        stack: Vec<NodeId>,
        next_index: u32,
        components: Vec<i64>,
        next_component: i64,
    }

    fn strongconnect(topo: &Topology, v: NodeId, st: &mut State) {
        st.index[v] = Some(st.next_index);
        st.low_link[v] = st.next_index;
        st.next_index += 1;
        st.stack.push(v);
        st.on_stack[v] = true;

        for w in topo.neighbors(v) {
            if st.index[w].is_none() {
                strongconnect(topo, w, st);
                st.low_link[v] = st.low_link[v].min(st.low_link[w]);
            } else if st.on_stack[w] {
                st.low_link[v] = st.low_link[v].min(st.index[w].unwrap());
            }
        }

        if st.low_link[v] == st.index[v].unwrap() {
            let comp = st.next_component;
            st.next_component += 1;
            loop {
                let w = st.stack.pop().unwrap();
                st.on_stack[w] = false;
                st.components[w] = comp;
                if w == v {
                    break;
                }
            }
        }
    }

    let mut st = State {
        index: vec![None; nof_nodes],
        low_link: vec![0; nof_nodes],
        on_stack: vec![false; nof_nodes],
        stack: Vec::new(),
        next_index: 0,
        components: vec![-1; nof_nodes],
        next_component: 0,
    };
    for v in 0..nof_nodes {
        if st.index[v].is_none() {
            strongconnect(topo, v, &mut st);
        }
    }
    st.components
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Link;

    fn line_topology() -> Topology {
        // 0 -- 1 -- 2, symmetric weights
        Topology::new(3, vec![Link::new(0, 1, 1, 1), Link::new(1, 2, 1, 1)])
    }

    #[test]
    fn shortest_path_cost_and_path() {
        let topo = line_topology();
        let mut igp = IgpProvider::new(3, vec![2], HashMap::new());
        igp.recompute(&topo);
        assert_eq!(igp.get_igp_cost(0, 2), 2);
        assert_eq!(igp.get_a_shortest_path(0, 2), vec![0, 1, 2]);
    }

    #[test]
    fn reachability_breaks_on_partition() {
        let mut topo = line_topology();
        let link_id = topo.link_id_for_edge(1, 2).unwrap();
        topo.remove_link_from_graph(link_id);
        let mut igp = IgpProvider::new(3, vec![0], HashMap::new());
        igp.recompute(&topo);
        assert!(igp.is_reachable(0, 1));
        assert!(!igp.is_reachable(0, 2));
    }

    #[test]
    fn ecmp_next_routers() {
        // 0 connects to 1 and 2, both with cost 1 to border 3
        let topo = Topology::new(
            4,
            vec![
                Link::new(0, 1, 1, 1),
                Link::new(0, 2, 1, 1),
                Link::new(1, 3, 1, 1),
                Link::new(2, 3, 1, 1),
            ],
        );
        let mut igp = IgpProvider::new(4, vec![3], HashMap::new());
        igp.recompute(&topo);
        let mut next = igp.get_next_routers_shortest_paths(&topo, 0, 3);
        next.sort();
        assert_eq!(next, vec![1, 2]);
    }
}
