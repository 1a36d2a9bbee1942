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

//! Multi-flow load and isolation properties.
//!
//! Load is approximate within loops: a node's load only starts flowing to its successors once
//! every predecessor that can still reach it has been processed, so load circulating purely
//! within a loop that never reaches the source is (by construction) never accounted for. This
//! mirrors the upstream tool's own documented approximation.

use std::collections::HashMap;

use serde_json::Value;

use crate::common::Flow;
use crate::error::{NetDiceError, Result};
use crate::forwarding::FwGraph;
use crate::graph::NodeId;
use crate::input::{f64_field, str_field, NameResolver};

use super::{get_flow_str, parse_flows, parse_volumes};

fn get_load_for_links(
    flows: &[Flow],
    volumes: &[f64],
    fw_graphs: &HashMap<Flow, FwGraph>,
) -> HashMap<(NodeId, NodeId), f64> {
    let mut link_load: HashMap<(NodeId, NodeId), f64> = HashMap::new();

    for (i, flow) in flows.iter().enumerate() {
        let fwg = &fw_graphs[flow];
        let nof_nodes = fwg.next.len();

        let mut in_degrees = vec![0i64; nof_nodes];
        in_degrees[flow.src] = 1; // artificial in-degree so the source itself gets processed
        for n in 0..nof_nodes {
            for &next in &fwg.next[n] {
                if next != -1 {
                    in_degrees[next as usize] += 1;
                }
            }
        }

        let mut load_at = vec![0.0; nof_nodes];
        load_at[flow.src] += volumes[i];
        let mut stack = vec![flow.src];
        while let Some(cur) = stack.pop() {
            in_degrees[cur] -= 1;

            if fwg.exits_at(cur) {
                continue;
            }
            if in_degrees[cur] != 0 {
                continue;
            }
            if fwg.next[cur].is_empty() {
                continue;
            }

            let load_per_outgoing = load_at[cur] / fwg.next[cur].len() as f64;
            for &next in &fwg.next[cur] {
                let next = next as usize;
                load_at[next] += load_per_outgoing;
                *link_load.entry((cur, next)).or_insert(0.0) += load_per_outgoing;
                stack.push(next);
            }
        }
    }
    link_load
}

/// The combined load of several flows on one link stays under a threshold.
#[derive(Debug, Clone)]
pub struct CongestionProperty {
    pub flows: Vec<Flow>,
    pub volumes: Vec<f64>,
    pub link: (NodeId, NodeId),
    pub threshold: f64,
}

impl CongestionProperty {
    pub(crate) fn from_data(data: &Value, names: &NameResolver) -> Result<Self> {
        let flows = parse_flows(data, names)?;
        let volumes = parse_volumes(data)?;
        let link_data = data
            .get("link")
            .ok_or_else(|| NetDiceError::Malformed("missing 'link'".to_string()))?;
        let u = names.node_id(&str_field(link_data, "u")?)?;
        let v = names.node_id(&str_field(link_data, "v")?)?;
        let threshold = f64_field(data, "threshold")?;
        Ok(CongestionProperty {
            flows,
            volumes,
            link: (u, v),
            threshold,
        })
    }

    pub(crate) fn get_human_readable(&self, names: &NameResolver) -> String {
        let flow_str: String = self
            .flows
            .iter()
            .zip(&self.volumes)
            .map(|(f, v)| format!("{}*{} ", get_flow_str(f, names), v))
            .collect();
        format!(
            "Congestion({}, ({}, {}), {})",
            flow_str, self.link.0, self.link.1, self.threshold
        )
    }

    pub(crate) fn check(&self, fw_graphs: &HashMap<Flow, FwGraph>) -> bool {
        let link_load = get_load_for_links(&self.flows, &self.volumes, fw_graphs);
        match link_load.get(&self.link) {
            None => true,
            Some(&load) => load <= self.threshold,
        }
    }
}

/// The load spread of several flows across several links stays within a delta.
#[derive(Debug, Clone)]
pub struct BalancedProperty {
    pub flows: Vec<Flow>,
    pub volumes: Vec<f64>,
    pub links: Vec<(NodeId, NodeId)>,
    pub delta: f64,
}

impl BalancedProperty {
    pub(crate) fn from_data(data: &Value, names: &NameResolver) -> Result<Self> {
        let flows = parse_flows(data, names)?;
        let volumes = parse_volumes(data)?;
        let links_data = data
            .get("links")
            .and_then(Value::as_array)
            .ok_or_else(|| NetDiceError::Malformed("missing 'links'".to_string()))?;
        let mut links = Vec::with_capacity(links_data.len());
        for l in links_data {
            let u = names.node_id(&str_field(l, "u")?)?;
            let v = names.node_id(&str_field(l, "v")?)?;
            links.push((u, v));
        }
        let delta = f64_field(data, "delta")?;
        Ok(BalancedProperty {
            flows,
            volumes,
            links,
            delta,
        })
    }

    pub(crate) fn get_human_readable(&self, names: &NameResolver) -> String {
        let flow_str: String = self
            .flows
            .iter()
            .zip(&self.volumes)
            .map(|(f, v)| format!("{}*{} ", get_flow_str(f, names), v))
            .collect();
        let links_str: String = self.links.iter().map(|l| format!("({}, {}) ", l.0, l.1)).collect();
        format!("Balanced({}, [{}], {})", flow_str, links_str, self.delta)
    }

    pub(crate) fn check(&self, fw_graphs: &HashMap<Flow, FwGraph>) -> bool {
        let link_load = get_load_for_links(&self.flows, &self.volumes, fw_graphs);
        let loads: Vec<f64> = self
            .links
            .iter()
            .map(|l| link_load.get(l).copied().unwrap_or(0.0))
            .collect();
        let min_load = loads.iter().cloned().fold(f64::INFINITY, f64::min);
        let max_load = loads.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        max_load - min_load <= self.delta
    }
}

/// No two flows' forwarding graphs share a node.
#[derive(Debug, Clone)]
pub struct IsolationProperty {
    pub flows: Vec<Flow>,
}

impl IsolationProperty {
    pub(crate) fn from_data(data: &Value, names: &NameResolver) -> Result<Self> {
        Ok(IsolationProperty {
            flows: parse_flows(data, names)?,
        })
    }

    pub(crate) fn get_human_readable(&self, names: &NameResolver) -> String {
        let flow_str: String = self.flows.iter().map(|f| get_flow_str(f, names)).collect();
        format!("Isolation({})", flow_str)
    }

    pub(crate) fn check(&self, fw_graphs: &HashMap<Flow, FwGraph>) -> bool {
        let Some(first) = self.flows.first() else {
            return true;
        };
        let nof_nodes = fw_graphs[first].next.len();
        let mut visited: Vec<i64> = vec![-1; nof_nodes];

        for (i, flow) in self.flows.iter().enumerate() {
            let fwg = &fw_graphs[flow];
            if !check_rec(fwg, fwg.src, i as i64, &mut visited) {
                return false;
            }
        }
        true
    }
}

fn check_rec(fwg: &FwGraph, cur: NodeId, graph_id: i64, visited: &mut [i64]) -> bool {
    if visited[cur] > -1 {
        return visited[cur] == graph_id;
    }
    visited[cur] = graph_id;
    fwg.next[cur]
        .iter()
        .filter(|&&n| n != -1)
        .all(|&n| check_rec(fwg, n as NodeId, graph_id, visited))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forwarding::EXIT;

    #[test]
    fn congestion_splits_load_evenly_across_ecmp() {
        let flow = Flow::new(0, "10.0.0.0/24".to_string());
        let mut fwg = FwGraph::new(3, 0, "10.0.0.0/24".to_string());
        fwg.add_fw_rule(0, 1);
        fwg.add_fw_rule(0, 2);
        fwg.add_fw_rule(1, EXIT);
        fwg.add_fw_rule(2, EXIT);
        let mut fw_graphs = HashMap::new();
        fw_graphs.insert(flow.clone(), fwg);

        let prop = CongestionProperty {
            flows: vec![flow],
            volumes: vec![10.0],
            link: (0, 1),
            threshold: 4.0,
        };
        assert!(!prop.check(&fw_graphs)); // 5.0 > 4.0

        let prop2 = CongestionProperty {
            link: (0, 1),
            threshold: 5.0,
            ..prop
        };
        assert!(prop2.check(&fw_graphs));
    }

    #[test]
    fn isolation_detects_shared_node() {
        let flow_a = Flow::new(0, "a".to_string());
        let flow_b = Flow::new(1, "b".to_string());
        let mut fwg_a = FwGraph::new(3, 0, "a".to_string());
        fwg_a.add_fw_rule(0, 2);
        fwg_a.add_fw_rule(2, EXIT);
        let mut fwg_b = FwGraph::new(3, 1, "b".to_string());
        fwg_b.add_fw_rule(1, 2);
        fwg_b.add_fw_rule(2, EXIT);

        let mut fw_graphs = HashMap::new();
        fw_graphs.insert(flow_a.clone(), fwg_a);
        fw_graphs.insert(flow_b.clone(), fwg_b);

        let prop = IsolationProperty {
            flows: vec![flow_a, flow_b],
        };
        assert!(!prop.check(&fw_graphs));
    }
}
