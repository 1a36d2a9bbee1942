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

//! BGP router/announcement data model and the static configuration built from it.
//!
//! The actual round-based convergence loop lives in [`protocol`]; this module only owns the
//! router relation graph (peers, route-reflector clients, the external-to-border back pointer),
//! which is a *relation*, not ownership, so it is represented as a flat vector of routers plus
//! index-based edges rather than as a tree of owned Rust values.

pub mod protocol;

use std::collections::HashMap;

use crate::graph::NodeId;

/// BGP peer id, unique across internal and external routers.
pub type PeerId = u32;

/// Autonomous system number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AsId(pub u32);

/// BGP origin attribute, ordered as in standard BGP best-path selection (lower is more
/// preferred, matching the `−LocalPref` convention used for the rest of the Top-3 tuple).
pub type Origin = i64;

/// A single route announcement: `(−LocalPref, AS-path length, Origin, MED)`. LocalPref is
/// negated up front so every attribute in the tuple follows "lower is better".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Announcement {
    neg_local_pref: i64,
    as_path_len: i64,
    origin: Origin,
    med: i64,
}

impl Announcement {
    /// Construct an announcement from its raw (non-negated) local preference.
    pub fn new(local_pref: i64, as_path_len: i64, origin: Origin, med: i64) -> Self {
        Announcement {
            neg_local_pref: -local_pref,
            as_path_len,
            origin,
            med,
        }
    }

    /// The three attributes used by the Top-3 pre-filter, as a lexicographically comparable
    /// tuple.
    fn top3(&self) -> (i64, i64, Origin) {
        (self.neg_local_pref, self.as_path_len, self.origin)
    }

    /// `true` iff `self` is strictly preferred to `other` by the Top-3 ordering.
    pub fn better_top3(&self, other: &Announcement) -> bool {
        self.top3() < other.top3()
    }

    /// `true` iff `self` and `other` tie under the Top-3 ordering.
    pub fn eq_top3(&self, other: &Announcement) -> bool {
        self.top3() == other.top3()
    }

    /// MED attribute, compared only between announcements from the same remote AS.
    pub fn med(&self) -> i64 {
        self.med
    }
}

/// One router's best announcement as relayed to its neighbors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BgpMsg {
    /// MED attribute carried by this message
    pub med: i64,
    /// sender of this message
    pub peer: PeerId,
    /// the BGP next hop (rewritten to the sender for externally-sourced routes)
    pub next_hop: PeerId,
    /// AS number this announcement originates from (relevant for MED comparison)
    pub remote_as: AsId,
}

impl BgpMsg {
    /// Decide whether `self` is preferred over `other` at a router whose IGP cost to each
    /// message's next hop is given by `this_igp_cost` / `other_igp_cost` (`-1` is the sentinel
    /// used for externally-learned routes, which are therefore always preferred over internal
    /// ones).
    pub fn better(&self, other: &BgpMsg, this_igp_cost: i64, other_igp_cost: i64) -> bool {
        if self.remote_as == other.remote_as {
            (self.med, this_igp_cost, self.peer) < (other.med, other_igp_cost, other.peer)
        } else {
            (this_igp_cost, self.peer) < (other_igp_cost, other.peer)
        }
    }
}

/// A BGP router: either external (belongs to a peer AS, attached to exactly one internal
/// border router) or internal (sits on a topology node).
#[derive(Debug, Clone)]
pub enum BgpRouter {
    /// an externally-owned router attached to one internal border router
    External(ExternalRouter),
    /// a router sitting on an internal topology node
    Internal(InternalRouter),
}

/// An external BGP router.
#[derive(Debug, Clone)]
pub struct ExternalRouter {
    /// BGP peer id
    pub id: PeerId,
    /// AS number of the external router
    pub as_id: AsId,
    /// display name
    pub name: String,
    /// the internal border router this external router is attached to
    pub peer: PeerId,
}

/// An internal BGP router, sitting on topology node `assigned_node`.
#[derive(Debug, Clone)]
pub struct InternalRouter {
    /// BGP peer id
    pub id: PeerId,
    /// AS number (all internal routers in a single topology share one AS in this model)
    pub as_id: AsId,
    /// display name
    pub name: String,
    /// internal topology node this router sits on
    pub assigned_node: NodeId,
    /// plain eBGP/iBGP peers
    pub peers: Vec<PeerId>,
    /// route-reflector clients
    pub rr_clients: Vec<PeerId>,
    /// set once an external router registers `peer` pointing at this router
    pub is_border_router: bool,
}

impl InternalRouter {
    /// `true` iff this router reflects routes to at least one client.
    pub fn is_route_reflector(&self) -> bool {
        !self.rr_clients.is_empty()
    }
}

impl BgpRouter {
    /// BGP peer id of this router.
    pub fn id(&self) -> PeerId {
        match self {
            BgpRouter::External(r) => r.id,
            BgpRouter::Internal(r) => r.id,
        }
    }

    /// Display name.
    pub fn name(&self) -> &str {
        match self {
            BgpRouter::External(r) => &r.name,
            BgpRouter::Internal(r) => &r.name,
        }
    }

    /// `true` iff this is an external router.
    pub fn is_external(&self) -> bool {
        matches!(self, BgpRouter::External(_))
    }

    /// The internal router, if this is one.
    pub fn as_internal(&self) -> Option<&InternalRouter> {
        match self {
            BgpRouter::Internal(r) => Some(r),
            BgpRouter::External(_) => None,
        }
    }
}

/// Static BGP configuration: the router relation graph plus the external announcements.
/// Immutable after construction; shared (via [`std::rc::Rc`]) between the [`protocol::BgpProtocol`]
/// that runs convergence over it and any code that needs to resolve a selected next hop back to
/// a node (forwarding-graph construction, hot-edge selection).
#[derive(Debug)]
pub struct BgpConfig {
    /// flat list of all routers (internal and external); relations between them are expressed
    /// as [`PeerId`] indices into this list rather than as owned references.
    pub routers: Vec<BgpRouter>,
    index_of: HashMap<PeerId, usize>,
    int_router_for_node: HashMap<NodeId, usize>,
    /// indices (into `routers`) of active routers: externals, border routers, route reflectors
    pub active: Vec<usize>,
    /// indices of passive routers: plain internal routers with no special role
    pub passive: Vec<usize>,
    /// indices of internal border routers
    pub border: Vec<usize>,
    /// external announcements: destination -> external router id -> announcement
    pub ext_anns: HashMap<String, HashMap<PeerId, Announcement>>,
}

impl BgpConfig {
    /// Build a configuration from already-wired routers (sessions configured) and external
    /// announcements.
    pub fn new(
        routers: Vec<BgpRouter>,
        ext_anns: HashMap<String, HashMap<PeerId, Announcement>>,
    ) -> Self {
        let mut index_of = HashMap::with_capacity(routers.len());
        let mut int_router_for_node = HashMap::new();
        for (i, r) in routers.iter().enumerate() {
            index_of.insert(r.id(), i);
            if let BgpRouter::Internal(ir) = r {
                int_router_for_node.insert(ir.assigned_node, i);
            }
        }

        let mut active = Vec::new();
        let mut passive = Vec::new();
        let mut border = Vec::new();
        for (i, r) in routers.iter().enumerate() {
            match r {
                BgpRouter::External(_) => active.push(i),
                BgpRouter::Internal(ir) if ir.is_border_router => {
                    active.push(i);
                    border.push(i);
                }
                BgpRouter::Internal(ir) if ir.is_route_reflector() => active.push(i),
                BgpRouter::Internal(_) => passive.push(i),
            }
        }

        BgpConfig {
            routers,
            index_of,
            int_router_for_node,
            active,
            passive,
            border,
            ext_anns,
        }
    }

    /// Router index for a given peer id.
    pub fn index(&self, peer_id: PeerId) -> usize {
        self.index_of[&peer_id]
    }

    /// The router with the given peer id.
    pub fn router(&self, peer_id: PeerId) -> &BgpRouter {
        &self.routers[self.index(peer_id)]
    }

    /// The internal router assigned to topology node `node`, if any.
    pub fn router_for_node(&self, node: NodeId) -> Option<&InternalRouter> {
        self.int_router_for_node
            .get(&node)
            .map(|&i| self.routers[i].as_internal().unwrap())
    }

    /// `true` iff `peer_id` names an external router.
    pub fn is_external(&self, peer_id: PeerId) -> bool {
        self.router(peer_id).is_external()
    }

    /// The topology node the given (necessarily internal) peer is assigned to.
    pub fn assigned_node(&self, peer_id: PeerId) -> NodeId {
        self.router(peer_id)
            .as_internal()
            .expect("assigned_node called on an external router")
            .assigned_node
    }
}
