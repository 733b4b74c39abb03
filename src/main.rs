// TOMO: Network Loss Tomography Simulation with Bernoulli Losses
// Copyright (C) 2024-2025 Roland Schmid <roschmi@ethz.ch> and Tibor Schneider <sctibor@ethz.ch>
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.
use std::process;

use clap::Parser;

use tomo::{
    config::{parse_link_loss, parse_mode, parse_receivers, receivers_help},
    prelude::*,
    report::{write_results, GRAPH_FILE},
    topology::DEFAULT_LOSS,
    util::{self, PathBufExt},
};
use tomo_utils::{convergence::DEFAULT_TOLERANCE, other::fmt_estimate};

#[derive(Parser, Debug)]
#[command(about, long_about = None)]
struct Args {
    /// Number of probes (ticks) to simulate.
    #[arg(short, long)]
    ticks: usize,
    #[arg(short, long = "num-recvrs", default_value = "2", value_parser = parse_receivers, help = receivers_help())]
    num_receivers: usize,
    /// Estimation mode: `tomography` infers losses from the receivers, `sdn` measures every link.
    #[arg(short, long, default_value = "tomography", value_parser = parse_mode)]
    mode: Mode,
    /// Seed of the random number generator.
    #[arg(short, long, default_value_t = 0)]
    seed: u64,
    /// Drop probability of every link except the control link.
    #[arg(short, long, default_value_t = DEFAULT_LOSS)]
    loss: f64,
    /// Draw the drop probability of every link uniformly from [LOW, HIGH).
    #[arg(long, num_args = 2, value_names = ["LOW", "HIGH"])]
    loss_range: Option<Vec<f64>>,
    /// Overwrite the drop probability of a single link, e.g., `--link-loss 3=0.25`.
    #[arg(long, value_parser = parse_link_loss)]
    link_loss: Vec<(usize, f64)>,
    /// Root directory for the results. Every run creates a timestamped subdirectory.
    #[arg(short, long, default_value = "./results/")]
    output: String,
}

impl Args {
    fn config(&self) -> SimulationConfig {
        let mut losses = LinkLossBuilder::new().default_loss(self.loss);
        if let Some([low, high]) = self.loss_range.as_deref() {
            losses = losses.uniform(*low, *high);
        }
        for (link, alpha) in &self.link_loss {
            losses = losses.overwrite(*link, *alpha);
        }
        SimulationConfig::new(self.ticks, self.num_receivers, self.mode)
            .seed(self.seed)
            .losses(losses)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    util::init_logging();
    let args = Args::parse();

    let sim = match Simulator::new(args.config()) {
        Ok(sim) => sim,
        Err(e) => {
            log::error!("Invalid configuration: {e}");
            process::exit(2);
        }
    };
    log::info!(
        "Simulating {} ticks on a tree with {} receivers ({} mode)",
        args.ticks,
        args.num_receivers,
        args.mode
    );

    let result = sim.run();
    let dir = write_results(&result, util::results_dir(&args.output), DEFAULT_TOLERANCE)?;
    log::info!("Results stored in {dir:?}");

    let summary = result.summary(DEFAULT_TOLERANCE);
    println!(
        "{:>14} {:>8} {:>10} {:>10} {:>10} {:>10}",
        "host", "alpha", "estimate", "y", "y_hat", "converged"
    );
    for (host, series) in summary.hosts.iter().zip(result.state.series()) {
        let estimate = series.alpha.last().copied().unwrap_or(f64::NAN);
        println!(
            "{:>14} {:>8.4} {:>10} {:>10.4} {:>10} {:>10}",
            host.name,
            host.true_alpha,
            fmt_estimate(estimate),
            host.true_path_success,
            fmt_estimate(host.y_hat.unwrap_or(f64::NAN)),
            host.convergence
                .converged_at
                .map(|t| t.to_string())
                .unwrap_or_else(|| "-".to_string()),
        );
    }

    log::info!(
        "Render the tree with `dot -Tpng -O {}`",
        dir.then(GRAPH_FILE).display()
    );

    Ok(())
}
