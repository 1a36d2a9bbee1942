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

//! Error type returned by every fallible operation in this crate.

use thiserror::Error;

/// Everything that can go wrong while parsing an input, wiring up a problem instance, or
/// running the exploration engine.
#[derive(Debug, Error)]
pub enum NetDiceError {
    /// The top-level input file could not be read or parsed as JSON.
    #[error("could not read input file '{path}': {source}")]
    InputFileIo {
        /// path that was opened
        path: String,
        /// underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// The query file could not be read or parsed as JSON.
    #[error("could not read query file '{path}': {source}")]
    QueryFileIo {
        /// path that was opened
        path: String,
        /// underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// JSON deserialization of an otherwise readable file failed.
    #[error("malformed input in '{path}': {source}")]
    Json {
        /// path of the offending file
        path: String,
        /// underlying serde error
        #[source]
        source: serde_json::Error,
    },

    /// A required field or referenced node/router was missing from the input.
    #[error("malformed input: {0}")]
    Malformed(String),

    /// A `properties` entry had a `type` tag this crate does not implement.
    #[error("unsupported property type '{0}'")]
    UnsupportedProperty(String),

    /// A `failures` entry had a `type` tag this crate does not implement.
    #[error("unsupported failure model type '{0}'")]
    UnsupportedFailureModel(String),

    /// A node name used in a reference (link endpoint, flow source, static route, ...) was
    /// never declared in `topology.nodes`.
    #[error("unknown node name '{0}'")]
    UnknownNode(String),

    /// A BGP router name used in a reference (session, peer, announcement) was never declared.
    #[error("unknown BGP router name '{0}'")]
    UnknownBgpRouter(String),

    /// BGP peer ids must be unique across internal and external routers.
    #[error("duplicate BGP peer id {0}")]
    DuplicatePeerId(u32),

    /// The legacy topology file referenced by `topology.file` does not exist.
    #[error("could not open legacy topology file '{0}'")]
    LegacyTopologyMissing(String),

    /// The legacy topology file is not in the expected `u v w_uv w_vu` format.
    #[error("malformed legacy topology file '{path}' at line {line}")]
    LegacyTopologyMalformed {
        /// path of the offending file
        path: String,
        /// 1-indexed line number
        line: usize,
    },

    /// BGP did not converge within the round cap; this indicates an oscillating configuration.
    #[error("BGP did not converge after {0} rounds, is it diverging?")]
    BgpDidNotConverge(u32),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, NetDiceError>;
