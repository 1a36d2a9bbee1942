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

//! Independent probabilistic failure models over the link set.
//!
//! A state is a `-1`/`0`/`1` entry per link: `-1` undecided (marginalized out), `0` down, `1`
//! up. [`FailureModel::get_state_prob`] returns the marginal probability of the partial
//! assignment, which is all the explorer ever needs.

use crate::bayes::{BayesianNetwork, BnNode, VarId};
use crate::graph::Link;
use crate::prob::Prob;

/// Per-link failure state: `-1` undecided, `0` down, `1` up.
pub type State = Vec<i8>;

/// An independent-link or node+link failure model.
#[derive(Debug)]
pub enum FailureModel {
    /// every link fails independently with the same probability
    Link(LinkFailureModel),
    /// every node and every link fails independently; a link additionally requires both of its
    /// endpoint nodes to be up
    Node(NodeFailureModel),
}

impl FailureModel {
    /// Marginal probability of the given (possibly partial) link state.
    pub fn get_state_prob(&self, state: &State) -> Prob {
        match self {
            FailureModel::Link(m) => m.get_state_prob(state),
            FailureModel::Node(m) => m.get_state_prob(state),
        }
    }
}

/// Every link fails independently with probability `p_fail`.
#[derive(Debug, Clone, Copy)]
pub struct LinkFailureModel {
    p_fail: Prob,
}

impl LinkFailureModel {
    /// Construct a model with per-link failure probability `p_link_failure`.
    pub fn new(p_link_failure: Prob) -> Self {
        LinkFailureModel {
            p_fail: p_link_failure,
        }
    }

    fn get_state_prob(&self, state: &State) -> Prob {
        let mut p = Prob::one();
        for &s in state {
            if s == 1 {
                p = p * self.p_fail.invert();
            } else if s == 0 {
                p = p * self.p_fail;
            }
        }
        p
    }
}

/// Every node and every link fails independently; a link additionally goes down whenever either
/// endpoint node is down. Marginal probabilities are computed by exact Bayesian-network
/// inference since a link's state is no longer independent of its sibling links once they share
/// a node.
#[derive(Debug)]
pub struct NodeFailureModel {
    bnet: BayesianNetwork,
    link_var: Vec<VarId>,
}

impl NodeFailureModel {
    /// Construct a model with per-link failure probability `p_link_failure` and per-node failure
    /// probability `p_node_failure`, wiring up one Bayesian-network variable per node and per
    /// link in `links`.
    pub fn new(
        p_link_failure: Prob,
        p_node_failure: Prob,
        nof_nodes: usize,
        links: &[Link],
    ) -> Self {
        let mut nodes = Vec::with_capacity(nof_nodes + links.len());
        for i in 0..nof_nodes {
            nodes.push(BnNode::new(
                i,
                vec![],
                vec![p_node_failure.val(), p_node_failure.invert().val()],
            ));
        }

        let mut link_var = Vec::with_capacity(links.len());
        for (li, l) in links.iter().enumerate() {
            let var = nof_nodes + li;
            // layout: [node_u, node_v, link] with link as the most-significant bit, i.e. the
            // link is down with certainty whenever either endpoint is down, and otherwise fails
            // independently with probability p_link_failure
            let cpt = vec![
                1.0,
                1.0,
                1.0,
                p_link_failure.val(),
                0.0,
                0.0,
                0.0,
                p_link_failure.invert().val(),
            ];
            nodes.push(BnNode::new(var, vec![l.u, l.v], cpt));
            link_var.push(var);
        }

        NodeFailureModel {
            bnet: BayesianNetwork::new(nodes),
            link_var,
        }
    }

    fn get_state_prob(&self, state: &State) -> Prob {
        let evidence: Vec<(VarId, u8)> = state
            .iter()
            .enumerate()
            .filter(|&(_, &s)| s != -1)
            .map(|(i, &s)| (self.link_var[i], s as u8))
            .collect();
        Prob::new(self.bnet.compute_event_prob(&evidence))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_model_multiplies_independent_probabilities() {
        let m = FailureModel::Link(LinkFailureModel::new(Prob::new(0.1)));
        let p = m.get_state_prob(&vec![1, 0, -1]);
        assert!((p.val() - 0.9 * 0.1).abs() < 1e-9);
    }

    #[test]
    fn node_model_propagates_node_failure_to_incident_links() {
        let links = vec![Link::new(0, 1, 1, 1)];
        let m = FailureModel::Node(NodeFailureModel::new(
            Prob::new(0.05),
            Prob::new(0.1),
            2,
            &links,
        ));
        let p_up = m.get_state_prob(&vec![1]);
        assert!((p_up.val() - 0.9 * 0.9 * 0.95).abs() < 1e-9);
    }
}
