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
use std::{fs, path::PathBuf};

use clap::Parser;
use itertools::Itertools;
use plotly::{
    common::{DashType, Line, Mode},
    layout::{Axis, HoverMode},
    Layout, Plot, Scatter,
};

use tomo::{
    report::{read_series, read_summary},
    util::{self, PathBufExt},
};

/// Number of hosts shown in a single chart.
const HOSTS_PER_PLOT: usize = 4;

#[derive(Parser, Debug)]
#[command(about, long_about = None)]
struct Args {
    /// Result directory of a single run, as written by `main`.
    #[arg(short, long)]
    input: PathBuf,
    /// Output directory for the plots. Defaults to the input directory.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    util::init_logging();
    let args = Args::parse();
    let output = args.output.clone().unwrap_or_else(|| args.input.clone());
    fs::create_dir_all(&output)?;

    let summary = read_summary(&args.input)?;
    log::info!(
        "Plotting {} hosts of a {} run with {} ticks",
        summary.hosts.len(),
        summary.config.mode,
        summary.config.ticks
    );

    let chunks = summary.hosts.iter().chunks(HOSTS_PER_PLOT);
    for (i, hosts) in chunks.into_iter().enumerate() {
        let mut plot = Plot::new();
        plot.set_layout(
            Layout::new()
                .title("<b>Algorithm Convergence Comparison</b>")
                .x_axis(Axis::new().title("Packets sent"))
                .y_axis(
                    Axis::new()
                        .title("Loss rate")
                        .range(vec![0.0, 0.5]),
                )
                .hover_mode(HoverMode::X),
        );

        for host in hosts {
            let (t, alpha): (Vec<_>, Vec<_>) = read_series(&args.input, &host.name)?
                .into_iter()
                .filter_map(|r| r.alpha.map(|a| (r.tick, a)))
                .unzip();
            plot.add_trace(
                Scatter::new(t, alpha)
                    .mode(Mode::Lines)
                    .name(format!("{} (alpha={:.3})", host.name, host.true_alpha)),
            );
            // the configured drop probability as reference
            plot.add_trace(
                Scatter::new(vec![0, summary.config.ticks], vec![host.true_alpha, host.true_alpha])
                    .mode(Mode::Lines)
                    .line(Line::new().dash(DashType::Dash))
                    .name(format!("{} (truth)", host.name)),
            );
        }

        let path = output.clone().then(format!("graph{i}.html"));
        log::info!("Writing {path:?}");
        plot.write_html(&path);
    }

    Ok(())
}
