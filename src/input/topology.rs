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

//! Topology parsing: either an inline `nodes`/`links` JSON description, or a reference to a
//! legacy whitespace-separated topology file (`nof_nodes` on the first line, then one
//! `u v weight_uv weight_vu` line per link, nodes named by their integer index).

use std::path::Path;

use serde_json::Value;

use crate::error::{NetDiceError, Result};
use crate::graph::Link;

use super::{i64_field, str_field, NameResolver};

/// Parse `topology.nodes`/`topology.links`, or fall back to `topology.file`. Returns the number
/// of nodes and the canonical link list; node names are registered on `resolver` as a side
/// effect.
pub fn topology_from_data(
    topo_data: &Value,
    base_dir: &Path,
    resolver: &mut NameResolver,
) -> Result<(usize, Vec<Link>)> {
    if let Some(file) = topo_data.get("file").and_then(Value::as_str) {
        return topology_from_legacy_file(&base_dir.join(file), resolver);
    }

    let nodes_data = topo_data
        .get("nodes")
        .and_then(Value::as_array)
        .ok_or_else(|| NetDiceError::Malformed("missing 'topology.nodes'".to_string()))?;
    for (id, node) in nodes_data.iter().enumerate() {
        let name = node
            .as_str()
            .ok_or_else(|| NetDiceError::Malformed("'topology.nodes' entries must be strings".to_string()))?
            .to_string();
        resolver.register_node(id, name);
    }
    let nof_nodes = nodes_data.len();

    let links_data = topo_data
        .get("links")
        .and_then(Value::as_array)
        .ok_or_else(|| NetDiceError::Malformed("missing 'topology.links'".to_string()))?;
    let mut links = Vec::with_capacity(links_data.len());
    for link in links_data {
        let u = resolver.node_id(&str_field(link, "u")?)?;
        let v = resolver.node_id(&str_field(link, "v")?)?;
        let w_uv = i64_field(link, "w_uv")?;
        let w_vu = i64_field(link, "w_vu")?;
        links.push(Link::new(u, v, w_uv, w_vu));
    }
    Ok((nof_nodes, links))
}

fn topology_from_legacy_file(path: &Path, resolver: &mut NameResolver) -> Result<(usize, Vec<Link>)> {
    let path_str = path.to_string_lossy().to_string();
    let text = std::fs::read_to_string(path)
        .map_err(|_| NetDiceError::LegacyTopologyMissing(path_str.clone()))?;

    let mut lines = text.lines().enumerate().filter(|(_, l)| !l.trim().is_empty());

    let (first_line_no, first_line) = lines
        .next()
        .ok_or_else(|| NetDiceError::LegacyTopologyMalformed {
            path: path_str.clone(),
            line: 1,
        })?;
    let nof_nodes: usize = first_line
        .trim()
        .parse()
        .map_err(|_| NetDiceError::LegacyTopologyMalformed {
            path: path_str.clone(),
            line: first_line_no + 1,
        })?;
    for id in 0..nof_nodes {
        resolver.register_node(id, id.to_string());
    }

    let mut links = Vec::new();
    for (line_no, line) in lines {
        let fields: Vec<&str> = line.split_whitespace().collect();
        let malformed = || NetDiceError::LegacyTopologyMalformed {
            path: path_str.clone(),
            line: line_no + 1,
        };
        if fields.len() != 4 {
            return Err(malformed());
        }
        let u: usize = fields[0].parse().map_err(|_| malformed())?;
        let v: usize = fields[1].parse().map_err(|_| malformed())?;
        let weight_uv: i64 = fields[2].parse().map_err(|_| malformed())?;
        let weight_vu: i64 = fields[3].parse().map_err(|_| malformed())?;
        links.push(Link::new(u, v, weight_uv, weight_vu));
    }
    Ok((nof_nodes, links))
}
