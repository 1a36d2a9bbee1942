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

//! Best-first failure-state exploration: repeatedly pop the most likely unexplored failure
//! state, compute every flow's forwarding graph for it, check the property, and split the state
//! further along whichever links could actually change the outcome ("hot edges") until the
//! unexplored probability mass drops below the target precision.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::{Duration, Instant};

use priority_queue::PriorityQueue;

use crate::bgp::protocol::BgpProtocol;
use crate::error::Result;
use crate::failure_model::State;
use crate::forwarding::{construct_fw_graph_decision_points, FwGraph};
use crate::hot_edges::add_hot_edges_bgp;
use crate::igp::IgpProvider;
use crate::problem::{Problem, Solution};

#[derive(Debug, Clone, Copy, PartialEq)]
struct Priority(f64);

impl Eq for Priority {}

impl PartialOrd for Priority {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.0.partial_cmp(&other.0)
    }
}

impl Ord for Priority {
    fn cmp(&self, other: &Self) -> Ordering {
        self.partial_cmp(other)
            .expect("failure-state probabilities are always finite")
    }
}

/// Drives the exploration loop over one [`Problem`].
pub struct Explorer {
    problem: Problem,
    igp: IgpProvider,
    bgp: BgpProtocol,
    queue: PriorityQueue<State, Priority>,
    prev_state: State,
}

impl Explorer {
    /// Build an explorer for `problem`.
    pub fn new(problem: Problem) -> Self {
        let border_routers = problem
            .bgp_config
            .border
            .iter()
            .map(|&idx| problem.bgp_config.routers[idx].as_internal().unwrap().assigned_node)
            .collect();
        let igp = IgpProvider::new(problem.nof_nodes, border_routers, problem.static_route_table());
        let bgp = BgpProtocol::new(Rc::clone(&problem.bgp_config));
        Explorer {
            problem,
            igp,
            bgp,
            queue: PriorityQueue::new(),
            prev_state: Vec::new(),
        }
    }

    /// Run exploration to completion (queue empty or target precision reached), optionally
    /// bounded by a wall-clock `timeout`.
    pub fn explore_all(&mut self, timeout: Option<Duration>) -> Result<Solution> {
        let mut solution = Solution::new();
        self.queue = PriorityQueue::new();
        self.prev_state = vec![-1i8; self.problem.nof_links()];

        let initial = vec![-1i8; self.problem.nof_links()];
        self.queue.push(initial, Priority(1.0));

        let start = Instant::now();
        loop {
            if self.queue.is_empty() {
                break;
            }
            if solution.p_explored.invert().val() < self.problem.target_precision {
                break;
            }
            let (state, _) = self.queue.pop().expect("queue is non-empty");
            self.explore(state, &mut solution)?;

            if let Some(timeout) = timeout {
                if start.elapsed() > timeout {
                    log::warn!("exploration timed out!");
                    break;
                }
            }
        }
        self.restore_graph();
        Ok(solution)
    }

    fn explore(&mut self, mut state: State, solution: &mut Solution) -> Result<()> {
        log::debug!("exploring: {:?}", state);

        self.update_graph(&state);
        self.igp.recompute(&self.problem.topology);

        let mut hot_edges = std::collections::HashSet::new();
        let mut fw_graphs: HashMap<crate::common::Flow, FwGraph> = HashMap::new();

        for flow in self.problem.property.flows().to_vec() {
            self.bgp.init_partition(flow.src, &flow.dst, &self.igp);
            self.bgp.run(&self.igp)?;
            self.igp.update_bgp_next_hops(&flow.dst, self.bgp.next_hops_for_internal());

            let (fwg, decision_points) = construct_fw_graph_decision_points(
                self.problem.nof_nodes,
                flow.src,
                &flow.dst,
                &self.problem.topology,
                &self.problem.bgp_config,
                &self.igp,
            );
            log::debug!("computed forwarding graph: {:?}", fwg);
            add_hot_edges_bgp(
                &flow,
                &fwg,
                &decision_points,
                &self.bgp,
                &self.problem.bgp_config,
                &self.igp,
                &mut hot_edges,
            );
            fw_graphs.insert(flow, fwg);
        }

        for e in hot_edges {
            let e_id = self
                .problem
                .topology
                .link_id_for_edge(e.0, e.1)
                .expect("hot edges are always real topology edges");
            if state[e_id] == -1 {
                state[e_id] = 0;
                let p_state = self.problem.failure_model.get_state_prob(&state);
                self.queue.push(state.clone(), Priority(p_state.val()));
                state[e_id] = 1;
            }
        }

        let p_state = self.problem.failure_model.get_state_prob(&state);
        solution.p_explored += p_state;
        log::debug!("checking property for fw graphs: {:?}", fw_graphs);
        if self.problem.property.check(&fw_graphs) {
            log::debug!(" -> HOLDS");
            solution.p_property += p_state;
        } else {
            log::debug!(" -> DOES NOT HOLD");
        }
        solution.num_explored += 1;
        log::debug!("current precision: {}", solution.p_explored.invert().val());
        Ok(())
    }

    fn update_graph(&mut self, state: &State) {
        for i in 0..state.len() {
            if state[i] != 0 && self.prev_state[i] == 0 {
                self.problem.topology.add_link_to_graph(i);
            } else if state[i] == 0 && self.prev_state[i] != 0 {
                self.problem.topology.remove_link_from_graph(i);
            }
            self.prev_state[i] = state[i];
        }
    }

    fn restore_graph(&mut self) {
        for i in 0..self.prev_state.len() {
            if self.prev_state[i] == 0 {
                self.problem.topology.add_link_to_graph(i);
            }
        }
    }
}
