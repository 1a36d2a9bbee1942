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

//! JSON input parsing: topology (with a legacy whitespace-file fallback), BGP configuration,
//! announcements, failure model and properties, merged from an input file plus an optional
//! query file into one or more [`crate::problem::Problem`] instances.

pub mod bgp_config;
pub mod topology;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::common::StaticRoute;
use crate::error::{NetDiceError, Result};
use crate::failure_model::FailureModel;
use crate::graph::NodeId;
use crate::prob::Prob;
use crate::problem::Problem;
use crate::properties::Property;

const INPUT_VERSION: &str = "0.1";

/// Resolves node names (and BGP router names) to their internal dense ids, and back.
#[derive(Debug, Default)]
pub struct NameResolver {
    /// node name -> node id
    pub id_for_node_name: HashMap<String, NodeId>,
    /// node id -> node name
    pub node_name_for_id: HashMap<NodeId, String>,
    /// BGP router name -> peer id
    pub bgp_peer_for_name: HashMap<String, u32>,
}

impl NameResolver {
    /// A resolver with nothing registered yet.
    pub fn new() -> Self {
        NameResolver::default()
    }

    /// Register node `id` under `name`.
    pub fn register_node(&mut self, id: NodeId, name: impl Into<String>) {
        let name = name.into();
        self.node_name_for_id.insert(id, name.clone());
        self.id_for_node_name.insert(name, id);
    }

    /// Resolve a node name, failing with [`NetDiceError::UnknownNode`] if undeclared.
    pub fn node_id(&self, name: &str) -> Result<NodeId> {
        self.id_for_node_name
            .get(name)
            .copied()
            .ok_or_else(|| NetDiceError::UnknownNode(name.to_string()))
    }

    /// Resolve a BGP router name to its peer id, failing with [`NetDiceError::UnknownBgpRouter`]
    /// if undeclared.
    pub fn bgp_peer_id(&self, name: &str) -> Result<u32> {
        self.bgp_peer_for_name
            .get(name)
            .copied()
            .ok_or_else(|| NetDiceError::UnknownBgpRouter(name.to_string()))
    }
}

/// Parse the input file (and, if given, the query file) into one [`Problem`] per property
/// entry, mirroring the upstream tool's `input_file` + optional `query_file` split: the query
/// file's `properties` replace the input file's, while `topology` always comes from the input
/// file. Also returns the [`NameResolver`] built while parsing, so callers can render properties
/// and nodes back to their declared names.
pub fn parse_problems(input_file: &Path, query_file: Option<&Path>) -> Result<(Vec<Problem>, NameResolver)> {
    let mut data = read_json(input_file, |path, source| NetDiceError::InputFileIo {
        path: path.to_string(),
        source,
    })?;
    check_version(&data);

    if let Some(query_file) = query_file {
        let mut query_data =
            read_json(query_file, |path, source| NetDiceError::QueryFileIo {
                path: path.to_string(),
                source,
            })?;
        check_version(&query_data);
        let topology = data
            .get("topology")
            .cloned()
            .ok_or_else(|| NetDiceError::Malformed("missing 'topology'".to_string()))?;
        query_data
            .as_object_mut()
            .ok_or_else(|| NetDiceError::Malformed("input root must be an object".to_string()))?
            .insert("topology".to_string(), topology);
        data = query_data;
    }

    problems_from_data(&data, input_file)
}

fn read_json(
    path: &Path,
    io_err: impl FnOnce(&str, std::io::Error) -> NetDiceError,
) -> Result<Value> {
    let path_str = path.to_string_lossy().to_string();
    let text = std::fs::read_to_string(path).map_err(|e| io_err(&path_str, e))?;
    serde_json::from_str(&text).map_err(|source| NetDiceError::Json {
        path: path_str,
        source,
    })
}

fn check_version(data: &Value) {
    if data.get("version").and_then(Value::as_str) != Some(INPUT_VERSION) {
        log::warn!("input data version not supported");
    }
}

pub(crate) fn problems_from_data(data: &Value, input_file: &Path) -> Result<(Vec<Problem>, NameResolver)> {
    let properties_data = data
        .get("properties")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            NetDiceError::Malformed(
                "could not find 'properties', did you forget to specify a query file?"
                    .to_string(),
            )
        })?;

    let mut resolver = NameResolver::new();

    let topo_data = data
        .get("topology")
        .ok_or_else(|| NetDiceError::Malformed("missing 'topology'".to_string()))?;
    let base_dir = input_file.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."));
    let (nof_nodes, links) = topology::topology_from_data(topo_data, &base_dir, &mut resolver)?;

    let mut static_routes = Vec::new();
    if let Some(srs) = topo_data.get("static_routes").and_then(Value::as_array) {
        for sr in srs {
            let dst = str_field(sr, "dst")?;
            let u = resolver.node_id(&str_field(sr, "u")?)?;
            let v = resolver.node_id(&str_field(sr, "v")?)?;
            static_routes.push(StaticRoute::new(dst, u, v));
        }
    }

    let bgp_data = topo_data
        .get("bgp")
        .ok_or_else(|| NetDiceError::Malformed("missing 'topology.bgp'".to_string()))?;
    let routers = bgp_config::bgp_config_from_data(bgp_data, &mut resolver)?;

    let anns_data = data
        .get("announcements")
        .ok_or_else(|| NetDiceError::Malformed("missing 'announcements'".to_string()))?;
    let ext_anns = bgp_config::anns_from_data(anns_data, &resolver)?;

    let bgp_config = std::rc::Rc::new(crate::bgp::BgpConfig::new(routers, ext_anns));

    let failure_data = data
        .get("failures")
        .ok_or_else(|| NetDiceError::Malformed("missing 'failures'".to_string()))?;
    let failure_model = std::rc::Rc::new(failure_model_from_data(failure_data, nof_nodes, &links)?);

    let mut problems = Vec::with_capacity(properties_data.len());
    for prop_data in properties_data {
        let property = Property::from_json(prop_data, &resolver)?;
        problems.push(Problem::new(
            nof_nodes,
            links.clone(),
            static_routes.clone(),
            bgp_config.clone(),
            failure_model.clone(),
            property,
        ));
    }
    Ok((problems, resolver))
}

fn failure_model_from_data(
    data: &Value,
    nof_nodes: usize,
    links: &[crate::graph::Link],
) -> Result<FailureModel> {
    let ty = str_field(data, "type")?;
    let p_link_failure = Prob::new(f64_field(data, "p_link_failure")?);
    match ty.as_str() {
        "LinkFailureModel" => Ok(FailureModel::Link(crate::failure_model::LinkFailureModel::new(
            p_link_failure,
        ))),
        "NodeFailureModel" => {
            let p_node_failure = Prob::new(f64_field(data, "p_node_failure")?);
            Ok(FailureModel::Node(crate::failure_model::NodeFailureModel::new(
                p_link_failure,
                p_node_failure,
                nof_nodes,
                links,
            )))
        }
        other => Err(NetDiceError::UnsupportedFailureModel(other.to_string())),
    }
}

pub(crate) fn str_field(data: &Value, field: &str) -> Result<String> {
    data.get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| NetDiceError::Malformed(format!("missing or non-string field '{field}'")))
}

pub(crate) fn f64_field(data: &Value, field: &str) -> Result<f64> {
    data.get(field)
        .and_then(Value::as_f64)
        .ok_or_else(|| NetDiceError::Malformed(format!("missing or non-numeric field '{field}'")))
}

pub(crate) fn i64_field(data: &Value, field: &str) -> Result<i64> {
    data.get(field)
        .and_then(Value::as_i64)
        .ok_or_else(|| NetDiceError::Malformed(format!("missing or non-integer field '{field}'")))
}

pub(crate) fn u64_field(data: &Value, field: &str) -> Result<u64> {
    data.get(field)
        .and_then(Value::as_u64)
        .ok_or_else(|| NetDiceError::Malformed(format!("missing or non-integer field '{field}'")))
}
