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

//! Single-flow reachability-style properties, each a DFS over one forwarding graph.

use std::collections::HashMap;

use serde_json::Value;

use crate::common::Flow;
use crate::error::Result;
use crate::forwarding::FwGraph;
use crate::graph::NodeId;
use crate::input::{i64_field, str_field, NameResolver};

use super::{get_flow_str, parse_flow};

/// Traffic always exits the network at a fixed node.
#[derive(Debug, Clone)]
pub struct EgressProperty {
    pub flows: Vec<Flow>,
    pub egress: NodeId,
}

impl EgressProperty {
    pub(crate) fn from_data(data: &Value, names: &NameResolver) -> Result<Self> {
        let flow = parse_flow(data, names)?;
        let egress = names.node_id(&str_field(data, "egress")?)?;
        Ok(EgressProperty {
            flows: vec![flow],
            egress,
        })
    }

    pub(crate) fn get_human_readable(&self, names: &NameResolver) -> String {
        format!(
            "Egress({}, {})",
            get_flow_str(&self.flows[0], names),
            names.node_name_for_id.get(&self.egress).map(String::as_str).unwrap_or("?")
        )
    }

    pub(crate) fn check(&self, fw_graphs: &HashMap<Flow, FwGraph>) -> bool {
        let fwg = &fw_graphs[&self.flows[0]];
        let mut visited = vec![false; fwg.next.len()];
        check_rec(fwg, &mut visited, fwg.src, self.egress)
    }
}

fn check_rec(fwg: &FwGraph, visited: &mut [bool], cur: NodeId, egress: NodeId) -> bool {
    if visited[cur] {
        return false; // loop
    }
    if fwg.exits_at(cur) {
        return cur == egress;
    }
    if fwg.next[cur].is_empty() {
        return false; // black hole
    }
    visited[cur] = true;
    fwg.next[cur]
        .iter()
        .all(|&n| check_rec(fwg, visited, n as NodeId, egress))
}

/// Traffic never loops.
#[derive(Debug, Clone)]
pub struct LoopProperty {
    pub flows: Vec<Flow>,
}

impl LoopProperty {
    pub(crate) fn from_data(data: &Value, names: &NameResolver) -> Result<Self> {
        Ok(LoopProperty {
            flows: vec![parse_flow(data, names)?],
        })
    }

    pub(crate) fn get_human_readable(&self, names: &NameResolver) -> String {
        format!("Loop({})", get_flow_str(&self.flows[0], names))
    }

    pub(crate) fn check(&self, fw_graphs: &HashMap<Flow, FwGraph>) -> bool {
        let fwg = &fw_graphs[&self.flows[0]];
        let mut visited = vec![false; fwg.next.len()];
        !has_loop(fwg, &mut visited, fwg.src)
    }
}

fn has_loop(fwg: &FwGraph, visited: &mut [bool], cur: NodeId) -> bool {
    if visited[cur] {
        return true;
    }
    if fwg.exits_at(cur) {
        return false;
    }
    visited[cur] = true;
    fwg.next[cur].iter().any(|&n| has_loop(fwg, visited, n as NodeId))
}

/// Traffic always reaches its destination (no loop, no black hole).
#[derive(Debug, Clone)]
pub struct ReachableProperty {
    pub flows: Vec<Flow>,
}

impl ReachableProperty {
    pub(crate) fn from_data(data: &Value, names: &NameResolver) -> Result<Self> {
        Ok(ReachableProperty {
            flows: vec![parse_flow(data, names)?],
        })
    }

    pub(crate) fn get_human_readable(&self, names: &NameResolver) -> String {
        format!("Reachable({})", get_flow_str(&self.flows[0], names))
    }

    pub(crate) fn check(&self, fw_graphs: &HashMap<Flow, FwGraph>) -> bool {
        let fwg = &fw_graphs[&self.flows[0]];
        let mut visited = vec![false; fwg.next.len()];
        reaches_dst(fwg, &mut visited, fwg.src)
    }
}

fn reaches_dst(fwg: &FwGraph, visited: &mut [bool], cur: NodeId) -> bool {
    if visited[cur] {
        return false; // loop
    }
    if fwg.exits_at(cur) {
        return true;
    }
    if fwg.next[cur].is_empty() {
        return false; // black hole
    }
    visited[cur] = true;
    fwg.next[cur].iter().all(|&n| reaches_dst(fwg, visited, n as NodeId))
}

/// Every path has a fixed length.
#[derive(Debug, Clone)]
pub struct PathLengthProperty {
    pub flows: Vec<Flow>,
    pub len: i64,
}

impl PathLengthProperty {
    pub(crate) fn from_data(data: &Value, names: &NameResolver) -> Result<Self> {
        let flow = parse_flow(data, names)?;
        let len = i64_field(data, "length")?;
        Ok(PathLengthProperty {
            flows: vec![flow],
            len,
        })
    }

    pub(crate) fn get_human_readable(&self, names: &NameResolver) -> String {
        format!("PathLength({}, {})", get_flow_str(&self.flows[0], names), self.len)
    }

    pub(crate) fn check(&self, fw_graphs: &HashMap<Flow, FwGraph>) -> bool {
        let fwg = &fw_graphs[&self.flows[0]];
        let mut visited = vec![false; fwg.next.len()];
        check_len(fwg, &mut visited, fwg.src, 0, self.len)
    }
}

fn check_len(fwg: &FwGraph, visited: &mut [bool], cur: NodeId, traversed: i64, target: i64) -> bool {
    if visited[cur] {
        return false; // loop
    }
    if fwg.exits_at(cur) {
        return traversed == target;
    }
    if fwg.next[cur].is_empty() {
        return traversed == target; // black hole
    }
    visited[cur] = true;
    fwg.next[cur]
        .iter()
        .all(|&n| check_len(fwg, visited, n as NodeId, traversed + 1, target))
}

/// Every path traverses a given waypoint.
#[derive(Debug, Clone)]
pub struct WaypointProperty {
    pub flows: Vec<Flow>,
    pub waypoint: NodeId,
}

impl WaypointProperty {
    pub(crate) fn from_data(data: &Value, names: &NameResolver) -> Result<Self> {
        let flow = parse_flow(data, names)?;
        let waypoint = names.node_id(&str_field(data, "waypoint")?)?;
        Ok(WaypointProperty {
            flows: vec![flow],
            waypoint,
        })
    }

    pub(crate) fn get_human_readable(&self, names: &NameResolver) -> String {
        format!(
            "Waypoint({}, {})",
            get_flow_str(&self.flows[0], names),
            names.node_name_for_id.get(&self.waypoint).map(String::as_str).unwrap_or("?")
        )
    }

    pub(crate) fn check(&self, fw_graphs: &HashMap<Flow, FwGraph>) -> bool {
        let fwg = &fw_graphs[&self.flows[0]];
        let mut visited = vec![false; fwg.next.len()];
        let mut on_path = vec![false; fwg.next.len()];
        self.all_traverse(fwg, &mut visited, &mut on_path, fwg.src)
    }

    fn all_traverse(&self, fwg: &FwGraph, visited: &mut [bool], on_path: &mut [bool], cur: NodeId) -> bool {
        if cur == self.waypoint {
            return true;
        }
        if fwg.exits_at(cur) {
            return false;
        }
        if visited[cur] {
            return !on_path[cur];
        }
        if fwg.next[cur].is_empty() {
            return false; // black hole
        }
        visited[cur] = true;
        on_path[cur] = true;
        let ok = fwg.next[cur]
            .iter()
            .all(|&n| self.all_traverse(fwg, visited, on_path, n as NodeId));
        on_path[cur] = false;
        ok
    }
}
