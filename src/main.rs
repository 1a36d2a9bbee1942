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

//! CLI entry point: parse an input (plus optional query) file, explore every property it
//! contains to the requested precision, and print `P(<human-readable>) ∈ [lo, hi]` for each.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use netbound::error::Result;
use netbound::explorer::Explorer;
use netbound::input::parse_problems;
use netbound::logging;

/// Probabilistic bounds on network-reliability properties under correlated link/node failure.
#[derive(Parser, Debug)]
#[command(name = "netbound", version, about)]
struct Cli {
    /// JSON (or legacy-topology-referencing) input file
    input: PathBuf,

    /// query file providing (or overriding) `properties`, reusing the input file's topology
    #[arg(short = 'q', long = "query")]
    query: Option<PathBuf>,

    /// target precision: exploration stops once `1 - p_explored` drops below this bound
    #[arg(short = 'p', long = "precision", default_value_t = 1e-5)]
    precision: f64,

    /// wall-clock budget per property, in seconds (unbounded if omitted)
    #[arg(long = "timeout")]
    timeout_secs: Option<u64>,

    /// suppress info-level output
    #[arg(long)]
    quiet: bool,

    /// enable debug-level output
    #[arg(long)]
    debug: bool,

    /// append a JSON-lines data log to this path
    #[arg(long = "data-log")]
    data_log: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();
    logging::init_term_log(cli.quiet, cli.debug);
    if let Some(path) = &cli.data_log {
        if let Err(e) = logging::init_data_log(path) {
            log::warn!("could not open data log '{}': {e}", path.display());
        }
    }

    if let Err(e) = run(&cli) {
        log::error!("{e}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let (mut problems, names) = parse_problems(&cli.input, cli.query.as_deref())?;
    let timeout = cli.timeout_secs.map(Duration::from_secs);

    for problem in problems.drain(..) {
        let human = problem.property.get_human_readable(&names);
        let mut target_precision = problem;
        target_precision.target_precision = cli.precision;

        let mut explorer = Explorer::new(target_precision);
        let solution = explorer.explore_all(timeout)?;

        let lo = solution.p_property.val();
        let hi = (lo + solution.p_explored.invert().val()).min(1.0);
        println!("P({human}) ∈ [{lo:.8}, {hi:.8}]");
        log::info!(
            "explored {} states, p_explored={:.8}",
            solution.num_explored,
            solution.p_explored.val()
        );
    }
    Ok(())
}
