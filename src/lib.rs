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

//! `netbound`: probabilistic bounds on network-reliability properties under correlated
//! link/node failure.
//!
//! Given a network topology, its BGP configuration and route announcements, a set of static
//! routes, an independent (or Bayesian-network-correlated) per-link/per-node failure model, and a
//! property over the forwarding behavior of one or more flows, [`explorer::Explorer`] computes a
//! rigorous `[lo, hi]` bound on the probability that the property holds, tightening the bound by
//! repeatedly splitting the most likely unexplored failure state along whichever links could
//! actually change the forwarding outcome.
//!
//! ```text
//! input (JSON) --> problem::Problem --> explorer::Explorer::explore_all --> problem::Solution
//! ```

pub mod bayes;
pub mod bgp;
pub mod common;
pub mod error;
pub mod explorer;
pub mod failure_model;
pub mod forwarding;
pub mod graph;
pub mod hot_edges;
pub mod igp;
pub mod input;
pub mod logging;
pub mod prob;
pub mod problem;
pub mod properties;

#[cfg(test)]
mod test;
