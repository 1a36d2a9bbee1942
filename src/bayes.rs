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

//! A tiny Bayesian network engine over binary variables, just expressive enough for the
//! node/link failure model: exact inference via variable elimination with a min-degree ordering
//! heuristic, building only the ancestral sub-network needed for the queried event.

use std::collections::{HashMap, HashSet};

/// Identifier of a binary random variable.
pub type VarId = usize;

/// A factor over an ordered set of variables: `table[i]` is the (possibly unnormalized)
/// probability mass at the assignment where bit `k` of `i` is the value of `vars[k]`.
#[derive(Debug, Clone)]
struct Factor {
    vars: Vec<VarId>,
    table: Vec<f64>,
}

impl Factor {
    fn var_index(&self, v: VarId) -> Option<usize> {
        self.vars.iter().position(|&x| x == v)
    }

    /// Fix `var` to `val`, dropping it from the factor.
    fn reduce(&self, var: VarId, val: u8) -> Factor {
        let Some(pos) = self.var_index(var) else {
            return self.clone();
        };
        let mut vars = self.vars.clone();
        vars.remove(pos);
        let mut table = vec![0.0; 1usize << vars.len()];
        for (i, &p) in self.table.iter().enumerate() {
            if ((i >> pos) & 1) as u8 != val {
                continue;
            }
            table[strip_bit(i, pos)] = p;
        }
        Factor { vars, table }
    }

    /// Sum `var` out of the factor.
    fn sum_out(&self, var: VarId) -> Factor {
        let pos = self.var_index(var).expect("var must be present to sum out");
        let mut vars = self.vars.clone();
        vars.remove(pos);
        let mut table = vec![0.0; 1usize << vars.len()];
        for (i, &p) in self.table.iter().enumerate() {
            table[strip_bit(i, pos)] += p;
        }
        Factor { vars, table }
    }

    /// Pointwise product over the union of variables.
    fn multiply(&self, other: &Factor) -> Factor {
        let mut vars = self.vars.clone();
        for &v in &other.vars {
            if !vars.contains(&v) {
                vars.push(v);
            }
        }
        let mut table = vec![0.0; 1usize << vars.len()];
        for (i, slot) in table.iter_mut().enumerate() {
            let a = self.project(&vars, i);
            let b = other.project(&vars, i);
            *slot = a * b;
        }
        Factor { vars, table }
    }

    /// Value of this factor at the assignment encoded by `combo` over `combo_vars` (which must
    /// be a superset of `self.vars`).
    fn project(&self, combo_vars: &[VarId], combo: usize) -> f64 {
        let mut idx = 0usize;
        for (k, &v) in self.vars.iter().enumerate() {
            let pos_in_combo = combo_vars.iter().position(|&x| x == v).unwrap();
            let bit = (combo >> pos_in_combo) & 1;
            idx |= bit << k;
        }
        self.table[idx]
    }
}

fn strip_bit(i: usize, pos: usize) -> usize {
    let low = i & ((1 << pos) - 1);
    let high = (i >> (pos + 1)) << pos;
    high | low
}

/// A node in the Bayesian network: a binary variable, its parents (also binary), and the
/// conditional probability table over `[parents..., var]` (each variable contributing a bit,
/// least significant first, `var` itself last).
#[derive(Debug, Clone)]
pub struct BnNode {
    pub var: VarId,
    pub parents: Vec<VarId>,
    pub cpt: Vec<f64>,
}

impl BnNode {
    /// Construct a node. `cpt.len()` must be `2.pow(parents.len() + 1)`.
    pub fn new(var: VarId, parents: Vec<VarId>, cpt: Vec<f64>) -> Self {
        debug_assert_eq!(cpt.len(), 1usize << (parents.len() + 1));
        BnNode { var, parents, cpt }
    }

    fn to_factor(&self) -> Factor {
        let mut vars = self.parents.clone();
        vars.push(self.var);
        Factor {
            vars,
            table: self.cpt.clone(),
        }
    }
}

/// A Bayesian network over binary variables.
#[derive(Debug)]
pub struct BayesianNetwork {
    nodes: HashMap<VarId, BnNode>,
}

impl BayesianNetwork {
    /// Build a network from its nodes.
    pub fn new(nodes: Vec<BnNode>) -> Self {
        BayesianNetwork {
            nodes: nodes.into_iter().map(|n| (n.var, n)).collect(),
        }
    }

    /// Probability of the joint event `evidence = [(var, value), ...]`, computed by variable
    /// elimination over the ancestral sub-network of the observed variables, eliminating the
    /// highest-degree-reducing variable first at each step.
    pub fn compute_event_prob(&self, evidence: &[(VarId, u8)]) -> f64 {
        if evidence.is_empty() {
            return 1.0;
        }

        let mut included = HashSet::new();
        let mut queue: Vec<VarId> = evidence.iter().map(|&(v, _)| v).collect();
        let mut factors = Vec::new();
        while let Some(v) = queue.pop() {
            if !included.insert(v) {
                continue;
            }
            let node = &self.nodes[&v];
            factors.push(node.to_factor());
            queue.extend(node.parents.iter().copied());
        }

        let evidence_vars: HashSet<VarId> = evidence.iter().map(|&(v, _)| v).collect();
        let mut factors: Vec<Factor> = factors
            .into_iter()
            .map(|mut f| {
                for &(ev_var, ev_val) in evidence {
                    if f.var_index(ev_var).is_some() {
                        f = f.reduce(ev_var, ev_val);
                    }
                }
                f
            })
            .collect();

        let mut to_eliminate: Vec<VarId> = included
            .into_iter()
            .filter(|v| !evidence_vars.contains(v))
            .collect();

        while !to_eliminate.is_empty() {
            let mut best_var = to_eliminate[0];
            let mut best_size = usize::MAX;
            for &v in &to_eliminate {
                let mut union = HashSet::new();
                for f in &factors {
                    if f.var_index(v).is_some() {
                        union.extend(f.vars.iter().copied());
                    }
                }
                if union.len() < best_size {
                    best_size = union.len();
                    best_var = v;
                }
            }

            let mut with_v = Vec::new();
            let mut without_v = Vec::new();
            for f in factors {
                if f.var_index(best_var).is_some() {
                    with_v.push(f);
                } else {
                    without_v.push(f);
                }
            }
            let mut prod = with_v.pop().expect("best_var must appear in some factor");
            for f in &with_v {
                prod = prod.multiply(f);
            }
            without_v.push(prod.sum_out(best_var));
            factors = without_v;
            to_eliminate.retain(|&x| x != best_var);
        }

        let mut prod = factors.pop().expect("at least one factor remains");
        for f in &factors {
            prod = prod.multiply(f);
        }
        prod.table[0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_node_prior() {
        let net = BayesianNetwork::new(vec![BnNode::new(0, vec![], vec![0.3, 0.7])]);
        assert_eq!(net.compute_event_prob(&[(0, 0)]), 0.3);
        assert_eq!(net.compute_event_prob(&[(0, 1)]), 0.7);
    }

    #[test]
    fn link_requires_both_endpoints_up() {
        // two node priors (p_node = 0.1 chance of failing) and a link node depending on both,
        // mirroring the node/link failure model's CPT layout.
        let p_node = 0.1;
        let p_link = 0.05;
        let node_u = BnNode::new(0, vec![], vec![p_node, 1.0 - p_node]);
        let node_v = BnNode::new(1, vec![], vec![p_node, 1.0 - p_node]);
        let link = BnNode::new(
            2,
            vec![0, 1],
            vec![1.0, 1.0, 1.0, p_link, 0.0, 0.0, 0.0, 1.0 - p_link],
        );
        let net = BayesianNetwork::new(vec![node_u, node_v, link]);

        // P(link up) = P(both nodes up) * P(link up | both up) = 0.9*0.9*0.95
        let p_link_up = net.compute_event_prob(&[(2, 1)]);
        assert!((p_link_up - 0.9 * 0.9 * 0.95).abs() < 1e-9);

        // P(link down) = 1 - P(link up)
        let p_link_down = net.compute_event_prob(&[(2, 0)]);
        assert!((p_link_up + p_link_down - 1.0).abs() < 1e-9);
    }

    #[test]
    fn shared_parent_between_two_links() {
        let p_node = 0.2;
        let p_link = 0.1;
        let n0 = BnNode::new(0, vec![], vec![p_node, 1.0 - p_node]);
        let n1 = BnNode::new(1, vec![], vec![p_node, 1.0 - p_node]);
        let n2 = BnNode::new(2, vec![], vec![p_node, 1.0 - p_node]);
        let l01 = BnNode::new(
            3,
            vec![0, 1],
            vec![1.0, 1.0, 1.0, p_link, 0.0, 0.0, 0.0, 1.0 - p_link],
        );
        let l12 = BnNode::new(
            4,
            vec![1, 2],
            vec![1.0, 1.0, 1.0, p_link, 0.0, 0.0, 0.0, 1.0 - p_link],
        );
        let net = BayesianNetwork::new(vec![n0, n1, n2, l01, l12]);

        let p_both_up = net.compute_event_prob(&[(3, 1), (4, 1)]);
        let expected = (1.0 - p_node).powi(3) * (1.0 - p_link).powi(2);
        assert!((p_both_up - expected).abs() < 1e-9);
    }
}
