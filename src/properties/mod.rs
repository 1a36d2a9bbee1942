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

//! Properties to check against the forwarding graphs of one or more flows.

mod load;
mod reachability;

use std::collections::HashMap;

use serde_json::Value;

use crate::common::Flow;
use crate::error::{NetDiceError, Result};
use crate::forwarding::FwGraph;
use crate::input::{f64_field, str_field, NameResolver};

pub use load::{BalancedProperty, CongestionProperty, IsolationProperty};
pub use reachability::{EgressProperty, LoopProperty, PathLengthProperty, ReachableProperty, WaypointProperty};

/// A property over the forwarding graphs of one or more flows.
#[derive(Debug, Clone)]
pub enum Property {
    /// traffic always exits the network at a fixed node
    Egress(EgressProperty),
    /// traffic never loops
    Loop(LoopProperty),
    /// traffic always reaches its destination (no loop, no black hole)
    Reachable(ReachableProperty),
    /// every path has a fixed length
    PathLength(PathLengthProperty),
    /// every path traverses a given waypoint
    Waypoint(WaypointProperty),
    /// the combined load of several flows on one link stays under a threshold
    Congestion(CongestionProperty),
    /// the load spread of several flows across several links stays within a delta
    Balanced(BalancedProperty),
    /// no two flows' forwarding graphs share a node
    Isolation(IsolationProperty),
}

impl Property {
    /// The flows this property's forwarding graphs must be computed for.
    pub fn flows(&self) -> &[Flow] {
        match self {
            Property::Egress(p) => &p.flows,
            Property::Loop(p) => &p.flows,
            Property::Reachable(p) => &p.flows,
            Property::PathLength(p) => &p.flows,
            Property::Waypoint(p) => &p.flows,
            Property::Congestion(p) => &p.flows,
            Property::Balanced(p) => &p.flows,
            Property::Isolation(p) => &p.flows,
        }
    }

    /// `true` iff the property holds for the given forwarding graphs (one per relevant flow).
    pub fn check(&self, fw_graphs: &HashMap<Flow, FwGraph>) -> bool {
        match self {
            Property::Egress(p) => p.check(fw_graphs),
            Property::Loop(p) => p.check(fw_graphs),
            Property::Reachable(p) => p.check(fw_graphs),
            Property::PathLength(p) => p.check(fw_graphs),
            Property::Waypoint(p) => p.check(fw_graphs),
            Property::Congestion(p) => p.check(fw_graphs),
            Property::Balanced(p) => p.check(fw_graphs),
            Property::Isolation(p) => p.check(fw_graphs),
        }
    }

    /// A human-readable rendering of the property, used in program output.
    pub fn get_human_readable(&self, names: &NameResolver) -> String {
        match self {
            Property::Egress(p) => p.get_human_readable(names),
            Property::Loop(p) => p.get_human_readable(names),
            Property::Reachable(p) => p.get_human_readable(names),
            Property::PathLength(p) => p.get_human_readable(names),
            Property::Waypoint(p) => p.get_human_readable(names),
            Property::Congestion(p) => p.get_human_readable(names),
            Property::Balanced(p) => p.get_human_readable(names),
            Property::Isolation(p) => p.get_human_readable(names),
        }
    }

    /// Parse a property from its JSON `type`-tagged representation.
    pub fn from_json(data: &Value, names: &NameResolver) -> Result<Property> {
        let ty = str_field(data, "type")?;
        match ty.as_str() {
            "Egress" => Ok(Property::Egress(EgressProperty::from_data(data, names)?)),
            "Loop" => Ok(Property::Loop(LoopProperty::from_data(data, names)?)),
            "Reachable" => Ok(Property::Reachable(ReachableProperty::from_data(data, names)?)),
            "PathLength" => Ok(Property::PathLength(PathLengthProperty::from_data(data, names)?)),
            "Waypoint" => Ok(Property::Waypoint(WaypointProperty::from_data(data, names)?)),
            "Congestion" => Ok(Property::Congestion(CongestionProperty::from_data(data, names)?)),
            "Balanced" => Ok(Property::Balanced(BalancedProperty::from_data(data, names)?)),
            "Isolation" => Ok(Property::Isolation(IsolationProperty::from_data(data, names)?)),
            other => Err(NetDiceError::UnsupportedProperty(other.to_string())),
        }
    }
}

pub(crate) fn get_flow_str(flow: &Flow, names: &NameResolver) -> String {
    format!(
        "[src: {}, dst: {}]",
        names.node_name_for_id.get(&flow.src).map(String::as_str).unwrap_or("?"),
        flow.dst
    )
}

pub(crate) fn parse_flow(data: &Value, names: &NameResolver) -> Result<Flow> {
    let flow_data = data
        .get("flow")
        .ok_or_else(|| NetDiceError::Malformed("missing 'flow'".to_string()))?;
    let src = names.node_id(&str_field(flow_data, "src")?)?;
    let dst = str_field(flow_data, "dst")?;
    Ok(Flow::new(src, dst))
}

pub(crate) fn parse_flows(data: &Value, names: &NameResolver) -> Result<Vec<Flow>> {
    let flows_data = data
        .get("flows")
        .and_then(Value::as_array)
        .ok_or_else(|| NetDiceError::Malformed("missing 'flows'".to_string()))?;
    flows_data
        .iter()
        .map(|f| {
            let src = names.node_id(&str_field(f, "src")?)?;
            let dst = str_field(f, "dst")?;
            Ok(Flow::new(src, dst))
        })
        .collect()
}

pub(crate) fn parse_volumes(data: &Value) -> Result<Vec<f64>> {
    let flows_data = data
        .get("flows")
        .and_then(Value::as_array)
        .ok_or_else(|| NetDiceError::Malformed("missing 'flows'".to_string()))?;
    flows_data.iter().map(|f| f64_field(f, "volume")).collect()
}
