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

//! A single problem instance (one property to check over one network) and the solution the
//! exploration engine produces for it.

use std::collections::HashMap;
use std::rc::Rc;

use crate::bgp::BgpConfig;
use crate::common::StaticRoute;
use crate::failure_model::FailureModel;
use crate::graph::{Link, NodeId, Topology};
use crate::prob::Prob;
use crate::properties::Property;

/// Everything needed to check one property against one (probabilistically failing) network.
pub struct Problem {
    /// total number of internal nodes
    pub nof_nodes: usize,
    /// canonical link list
    pub links: Vec<Link>,
    /// configured static routes
    pub static_routes: Vec<StaticRoute>,
    /// BGP configuration, shared with the [`crate::bgp::protocol::BgpProtocol`] run per flow
    pub bgp_config: Rc<BgpConfig>,
    /// the independent failure model over `links`
    pub failure_model: Rc<FailureModel>,
    /// the property to check
    pub property: Property,
    /// the live directed graph, mutated in place as the explorer flips links up/down
    pub topology: Topology,
    /// exploration stops once `1 - p_explored` drops below this bound
    pub target_precision: f64,
}

impl Problem {
    /// Construct a problem instance. `target_precision` defaults to `0.0` (explore until the
    /// queue is empty); callers typically overwrite it before running the explorer.
    pub fn new(
        nof_nodes: usize,
        links: Vec<Link>,
        static_routes: Vec<StaticRoute>,
        bgp_config: Rc<BgpConfig>,
        failure_model: Rc<FailureModel>,
        property: Property,
    ) -> Self {
        let topology = Topology::new(nof_nodes, links.clone());
        Problem {
            nof_nodes,
            links,
            static_routes,
            bgp_config,
            failure_model,
            property,
            topology,
            target_precision: 0.0,
        }
    }

    /// Total number of links.
    pub fn nof_links(&self) -> usize {
        self.links.len()
    }

    /// `dst -> (u -> v)` static-route lookup table, as consumed by
    /// [`crate::igp::IgpProvider::new`].
    pub fn static_route_table(&self) -> HashMap<String, HashMap<NodeId, NodeId>> {
        let mut table: HashMap<String, HashMap<NodeId, NodeId>> = HashMap::new();
        for sr in &self.static_routes {
            table.entry(sr.dst.clone()).or_default().insert(sr.u, sr.v);
        }
        table
    }
}

/// The result of an exploration run.
#[derive(Debug, Clone, Copy)]
pub struct Solution {
    /// number of distinct failure states explored
    pub num_explored: u64,
    /// probability mass of all explored states
    pub p_explored: Prob,
    /// lower bound on the probability that the property holds
    pub p_property: Prob,
}

impl Solution {
    /// A fresh, empty solution.
    pub fn new() -> Self {
        Solution {
            num_explored: 0,
            p_explored: Prob::zero(),
            p_property: Prob::zero(),
        }
    }
}

impl Default for Solution {
    fn default() -> Self {
        Solution::new()
    }
}
