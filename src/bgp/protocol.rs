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

//! Round-based BGP convergence over a single network partition.
//!
//! [`BgpProtocol`] is re-initialized for every flow that the exploration driver evaluates: it
//! determines which routers are even IP-reachable from the flow's source, pre-filters
//! announcements with the Top-3 rule, then runs the synchronous round loop until every active
//! router's output stabilizes (or the round cap is hit, which is treated as a configuration
//! bug, not a recoverable condition).

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use crate::bgp::{Announcement, BgpConfig, BgpMsg, PeerId};
use crate::error::{NetDiceError, Result};
use crate::graph::NodeId;
use crate::igp::IgpProvider;

const MAX_ROUNDS: u32 = 100;

/// Per-router mutable state kept across a single convergence run. Reset at the start of every
/// [`BgpProtocol::init_partition`] call.
#[derive(Debug, Default, Clone)]
struct RouterRuntime {
    msg_in: Vec<BgpMsg>,
    msg: Vec<BgpMsg>,
    last_sent: Option<BgpMsg>,
    last_best: Option<BgpMsg>,
    converged: bool,
    /// one-shot outgoing message for external routers, set by the Top-3 pre-filter
    ext_msg: Option<BgpMsg>,
}

/// Runs the BGP protocol over a [`BgpConfig`], one partition (flow) at a time.
#[derive(Debug)]
pub struct BgpProtocol {
    config: Rc<BgpConfig>,
    runtime: Vec<RouterRuntime>,

    active_in_partition: Vec<usize>,
    passive_in_partition: Vec<usize>,
    all_in_partition: HashSet<usize>,

    /// external routers IP-reachable from the current flow's source
    pub ext_in_partition: Vec<usize>,
    /// route reflectors IP-reachable from the current flow's source
    pub rr_in_partition: Vec<usize>,
    /// peer ids of border routers whose externally-learned route survived the Top-3 filter
    pub br_top3_in_partition: HashSet<PeerId>,
}

impl BgpProtocol {
    /// Build a protocol runner over a shared, immutable configuration.
    pub fn new(config: Rc<BgpConfig>) -> Self {
        let runtime = vec![RouterRuntime::default(); config.routers.len()];
        BgpProtocol {
            config,
            runtime,
            active_in_partition: Vec::new(),
            passive_in_partition: Vec::new(),
            all_in_partition: HashSet::new(),
            ext_in_partition: Vec::new(),
            rr_in_partition: Vec::new(),
            br_top3_in_partition: HashSet::new(),
        }
    }

    /// Re-initialize the protocol for a new flow: determine the IP-reachable partition, compute
    /// BGP-session clusters within it, and pre-filter announcements with Top-3. Must be followed
    /// by [`BgpProtocol::run`].
    pub fn init_partition(&mut self, src: NodeId, dst: &str, igp: &IgpProvider) {
        self.determine_partition(src, igp);
        let clusters = self.construct_bgp_clusters(src, igp);

        self.br_top3_in_partition.clear();
        for cluster in &clusters {
            let Some(cluster) = cluster else { continue };
            let mut best: Option<Announcement> = None;
            let mut best_routers: Vec<usize> = Vec::new();
            for &ext_idx in cluster {
                let ext_id = self.config.routers[ext_idx].id();
                let ann = self
                    .config
                    .ext_anns
                    .get(dst)
                    .and_then(|m| m.get(&ext_id))
                    .copied();
                let Some(ann) = ann else { continue };
                match &best {
                    None => {
                        best = Some(ann);
                        best_routers = vec![ext_idx];
                    }
                    Some(b) if ann.better_top3(b) => {
                        best = Some(ann);
                        best_routers = vec![ext_idx];
                    }
                    Some(b) if ann.eq_top3(b) => {
                        best_routers.push(ext_idx);
                    }
                    _ => {}
                }
            }
            for ext_idx in best_routers {
                let ext_id = self.config.routers[ext_idx].id();
                let ann = self.config.ext_anns[dst][&ext_id];
                let as_id = match &self.config.routers[ext_idx] {
                    crate::bgp::BgpRouter::External(r) => r.as_id,
                    _ => unreachable!(),
                };
                let border_peer = match &self.config.routers[ext_idx] {
                    crate::bgp::BgpRouter::External(r) => r.peer,
                    _ => unreachable!(),
                };
                self.runtime[ext_idx].ext_msg = Some(BgpMsg {
                    med: ann.med(),
                    peer: ext_id,
                    next_hop: ext_id,
                    remote_as: as_id,
                });
                self.br_top3_in_partition.insert(border_peer);
            }
        }
    }

    fn determine_partition(&mut self, src: NodeId, igp: &IgpProvider) {
        self.active_in_partition.clear();
        self.passive_in_partition.clear();
        self.all_in_partition.clear();
        self.ext_in_partition.clear();
        self.rr_in_partition.clear();

        for &idx in &self.config.active {
            self.runtime[idx] = RouterRuntime::default();
            let reachable_node = match &self.config.routers[idx] {
                crate::bgp::BgpRouter::External(r) => self.config.assigned_node(r.peer),
                crate::bgp::BgpRouter::Internal(r) => r.assigned_node,
            };
            if igp.is_reachable(src, reachable_node) {
                self.active_in_partition.push(idx);
                self.all_in_partition.insert(idx);
                match &self.config.routers[idx] {
                    crate::bgp::BgpRouter::External(_) => self.ext_in_partition.push(idx),
                    crate::bgp::BgpRouter::Internal(r) if r.is_route_reflector() => {
                        self.rr_in_partition.push(idx)
                    }
                    _ => {}
                }
            }
        }
        for &idx in &self.config.passive {
            self.runtime[idx] = RouterRuntime {
                converged: true,
                ..RouterRuntime::default()
            };
            let node = self.config.routers[idx].as_internal().unwrap().assigned_node;
            if igp.is_reachable(src, node) {
                self.passive_in_partition.push(idx);
                self.all_in_partition.insert(idx);
            }
        }
    }

    /// Maximal sets of internal routers mutually reachable through `peers`/`rr_clients` edges
    /// (restricted to the current IGP partition), with external routers grouped into the
    /// cluster of the border router they attach to.
    fn construct_bgp_clusters(&self, src: NodeId, igp: &IgpProvider) -> Vec<Option<Vec<usize>>> {
        let n = igp.nof_nodes();
        let mut visited = vec![false; n];
        let mut component = vec![usize::MAX; n];
        let mut cur = 0usize;
        for &idx in &self.active_in_partition {
            if let crate::bgp::BgpRouter::Internal(ir) = &self.config.routers[idx] {
                if !visited[ir.assigned_node] {
                    self.cluster_dfs(src, igp, idx, cur, &mut visited, &mut component);
                    cur += 1;
                }
            }
        }

        let mut clusters: Vec<Option<Vec<usize>>> = vec![None; cur];
        for &idx in &self.ext_in_partition {
            let peer_node = match &self.config.routers[idx] {
                crate::bgp::BgpRouter::External(r) => self.config.assigned_node(r.peer),
                _ => unreachable!(),
            };
            let comp = component[peer_node];
            if comp == usize::MAX {
                continue;
            }
            clusters[comp].get_or_insert_with(Vec::new).push(idx);
        }
        clusters
    }

    fn cluster_dfs(
        &self,
        src: NodeId,
        igp: &IgpProvider,
        idx: usize,
        cur_component: usize,
        visited: &mut [bool],
        component: &mut [usize],
    ) {
        let ir = match &self.config.routers[idx] {
            crate::bgp::BgpRouter::Internal(r) => r,
            _ => unreachable!("cluster dfs only visits internal routers"),
        };
        if visited[ir.assigned_node] {
            return;
        }
        visited[ir.assigned_node] = true;
        component[ir.assigned_node] = cur_component;

        for &peer_id in ir.rr_clients.iter().chain(ir.peers.iter()) {
            let peer_idx = self.config.index(peer_id);
            if let crate::bgp::BgpRouter::Internal(peer_ir) = &self.config.routers[peer_idx] {
                if igp.is_reachable(src, peer_ir.assigned_node) {
                    self.cluster_dfs(src, igp, peer_idx, cur_component, visited, component);
                }
            }
        }
    }

    /// Run the protocol to convergence. Must be called after [`BgpProtocol::init_partition`].
    pub fn run(&mut self, igp: &IgpProvider) -> Result<()> {
        log::debug!("running BGP...");
        // externals emit their one-shot message before the round loop starts
        self.fire_externals();

        let mut nof_rounds = 0u32;
        loop {
            nof_rounds += 1;
            if nof_rounds > MAX_ROUNDS {
                log::error!("BGP did not converge after {MAX_ROUNDS} rounds, is it diverging?");
                return Err(NetDiceError::BgpDidNotConverge(MAX_ROUNDS));
            }
            let mut converged = true;
            for &idx in &self.all_in_partition {
                self.runtime[idx].msg = std::mem::take(&mut self.runtime[idx].msg_in);
                converged &= self.runtime[idx].converged;
            }
            if converged {
                break;
            }
            self.step_active(igp, true);
        }
        log::debug!("BGP converged after {nof_rounds} rounds");

        for &idx in &self.passive_in_partition {
            self.step_one(idx, igp, false);
        }
        Ok(())
    }

    fn fire_externals(&mut self) {
        let mut deliveries = Vec::new();
        for &idx in &self.active_in_partition {
            if let crate::bgp::BgpRouter::External(r) = &self.config.routers[idx] {
                if let Some(m) = self.runtime[idx].ext_msg {
                    deliveries.push((self.config.index(r.peer), m));
                }
            }
        }
        for (target, m) in deliveries {
            self.runtime[target].msg_in.push(m);
        }
    }

    fn step_active(&mut self, igp: &IgpProvider, send: bool) {
        for idx in self.active_in_partition.clone() {
            self.step_one(idx, igp, send);
        }
    }

    fn step_one(&mut self, idx: usize, igp: &IgpProvider, send: bool) {
        match &self.config.routers[idx] {
            crate::bgp::BgpRouter::External(_) => {
                if send {
                    if let Some(m) = self.runtime[idx].ext_msg {
                        if let crate::bgp::BgpRouter::External(r) = &self.config.routers[idx] {
                            let target = self.config.index(r.peer);
                            self.runtime[target].msg_in.push(m);
                        }
                    }
                }
            }
            crate::bgp::BgpRouter::Internal(ir) => {
                let assigned_node = ir.assigned_node;
                let my_id = ir.id;
                let peers: Vec<PeerId> = ir
                    .rr_clients
                    .iter()
                    .chain(ir.peers.iter())
                    .copied()
                    .collect();

                let mut best: Option<BgpMsg> = None;
                let mut best_cost = 0i64;
                for m in &self.runtime[idx].msg {
                    let c = self.igp_cost_for_msg(m, assigned_node, igp);
                    let replace = match best {
                        None => true,
                        Some(b) => m.better(&b, c, best_cost),
                    };
                    if replace {
                        best = Some(*m);
                        best_cost = c;
                    }
                }
                self.runtime[idx].last_best = best;

                if !send {
                    return;
                }

                let out = best.map(|b| {
                    let mut o = b;
                    let from_peer = o.peer;
                    o.peer = my_id;
                    if self.config.is_external(o.next_hop) {
                        o.next_hop = my_id;
                    }
                    for &p in &peers {
                        if p != from_peer {
                            let target = self.config.index(p);
                            self.runtime[target].msg_in.push(o);
                        }
                    }
                    o
                });
                self.runtime[idx].converged = self.runtime[idx].last_sent == out;
                self.runtime[idx].last_sent = out;
            }
        }
    }

    fn igp_cost_for_msg(&self, msg: &BgpMsg, at_node: NodeId, igp: &IgpProvider) -> i64 {
        if self.config.is_external(msg.next_hop) {
            // externally learned routes are always preferred over internal ones
            -1
        } else {
            igp.get_igp_cost(at_node, self.config.assigned_node(msg.next_hop))
        }
    }

    /// The selected next hop (peer id, possibly external) for every internal router in the
    /// current partition. `None` if the router selected no route.
    pub fn next_hops_for_internal(&self) -> HashMap<NodeId, Option<PeerId>> {
        let mut data = HashMap::new();
        for &idx in &self.all_in_partition {
            if let crate::bgp::BgpRouter::Internal(ir) = &self.config.routers[idx] {
                data.insert(ir.assigned_node, self.runtime[idx].last_best.map(|m| m.next_hop));
            }
        }
        data
    }
}
