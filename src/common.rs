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

//! Small shared value types used across the problem definition and the exploration engine.

use crate::graph::NodeId;

/// A single-source, single-destination-prefix traffic flow under analysis.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Flow {
    /// source node
    pub src: NodeId,
    /// destination prefix, as configured in `topology.nodes`/announcements
    pub dst: String,
}

impl Flow {
    /// Construct a new flow.
    pub fn new(src: NodeId, dst: impl Into<String>) -> Self {
        Flow {
            src,
            dst: dst.into(),
        }
    }
}

/// A static route configured at `u`, overriding BGP for `dst` with a fixed next hop `v`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticRoute {
    /// destination prefix this route applies to
    pub dst: String,
    /// node the route is configured at
    pub u: NodeId,
    /// fixed next hop
    pub v: NodeId,
}

impl StaticRoute {
    /// Construct a new static route.
    pub fn new(dst: impl Into<String>, u: NodeId, v: NodeId) -> Self {
        StaticRoute {
            dst: dst.into(),
            u,
            v,
        }
    }
}
