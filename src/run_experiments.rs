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
use std::{
    sync::{Arc, Mutex},
    time::Instant,
};

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{MultiProgress, ParallelProgressIterator, ProgressBar, ProgressStyle};
use indicatif_log_bridge::LogWrapper;
use itertools::iproduct;
use rayon::prelude::*;
use serde::Serialize;
use strum::IntoEnumIterator;

use tomo::prelude::*;
use tomo_utils::convergence::DEFAULT_TOLERANCE;

#[derive(Parser, Debug)]
#[command(about, long_about = None)]
struct Args {
    /// Sweep loss rates between 10% and 40% instead of 1% and 10%.
    #[arg(long)]
    hi_loss: bool,
    /// Output file for the results.
    #[arg(short, long, default_value = "experiments.csv")]
    output: String,
    /// Seed of every run.
    #[arg(short, long, default_value_t = 0)]
    seed: u64,
}

#[derive(Debug, Clone, Copy)]
struct Experiment {
    loss: f64,
    ticks: usize,
    depth: u32,
    mode: Mode,
    seed: u64,
}

impl Experiment {
    fn num_receivers(&self) -> usize {
        1 << self.depth
    }

    fn config(&self) -> SimulationConfig {
        SimulationConfig::new(self.ticks, self.num_receivers(), self.mode)
            .seed(self.seed)
            .losses(LinkLossBuilder::new().default_loss(self.loss))
    }
}

#[derive(Clone, Debug, Serialize)]
struct Record {
    mode: Mode,
    loss: f64,
    ticks: usize,
    depth: u32,
    num_receivers: usize,
    seed: u64,
    mean_abs_error: Option<f64>,
    max_abs_error: Option<f64>,
    frac_converged: f64,
    median_convergence_tick: Option<usize>,
    time_sim: f64,
}

fn main() -> Result<()> {
    let logger = pretty_env_logger::formatted_builder().build();
    let multi = MultiProgress::new();
    LogWrapper::new(multi.clone(), logger)
        .try_init()
        .context("Cannot install the logger")?;

    let args = Args::parse();
    // loss rates in percent
    let losses: Vec<u32> = if args.hi_loss {
        (10..50).step_by(10).collect()
    } else {
        (1..=10).collect()
    };

    let experiments: Vec<Experiment> = iproduct!(
        losses,                        // loss
        [100, 1_000, 10_000, 100_000], // ticks
        [3, 4, 5],                     // depth
        Mode::iter()                   // mode
    )
    .map(|(loss, ticks, depth, mode)| Experiment {
        loss: loss as f64 / 100.0,
        ticks,
        depth,
        mode,
        seed: args.seed,
    })
    .collect();

    log::info!("Running {} experiments", experiments.len());

    let writer = Arc::new(Mutex::new(
        csv::Writer::from_path(&args.output)
            .with_context(|| format!("Cannot create {}", args.output))?,
    ));

    let pb = multi.add(
        ProgressBar::new(experiments.len() as u64).with_style(
            ProgressStyle::with_template(
                "[{bar:80}] iter: {pos:>7}/{len:7}, elapsed: {elapsed}, eta: {eta}, speed: {per_sec}",
            )
            .context("Invalid progress bar template")?
            .progress_chars("##-"),
        ),
    );

    experiments
        .into_par_iter()
        .progress_with(pb)
        .map_with(writer, |writer, e| run_experiment_wrapper(e, writer.clone()))
        .collect::<Vec<Result<()>>>()
        .into_iter()
        .collect::<Result<Vec<_>>>()?;

    log::info!("Results written to {}", args.output);

    Ok(())
}

fn run_experiment_wrapper<W: std::io::Write>(
    experiment: Experiment,
    writer: Arc<Mutex<csv::Writer<W>>>,
) -> Result<()> {
    match run_experiment(experiment, writer) {
        Ok(_) => Ok(()),
        Err(e) => {
            log::warn!("Cannot run {experiment:?}\n{e:?}");
            Err(e.context(format!("Error running {experiment:?}")))
        }
    }
}

fn run_experiment<W: std::io::Write>(
    experiment: Experiment,
    writer: Arc<Mutex<csv::Writer<W>>>,
) -> Result<()> {
    log::debug!("Running {experiment:?}");
    let start = Instant::now();
    let result = Simulator::new(experiment.config())
        .context("Invalid experiment configuration")?
        .run();
    let time_sim = start.elapsed().as_secs_f64();

    // the sender has nothing to estimate
    let summary = result.summary(DEFAULT_TOLERANCE);
    let hosts: Vec<_> = summary
        .hosts
        .iter()
        .filter(|h| h.role != Role::Sender)
        .collect();

    let errors: Vec<f64> = hosts
        .iter()
        .filter_map(|h| h.convergence.abs_error)
        .collect();
    let mut converged: Vec<usize> = hosts
        .iter()
        .filter_map(|h| h.convergence.converged_at)
        .collect();
    converged.sort_unstable();

    let record = Record {
        mode: experiment.mode,
        loss: experiment.loss,
        ticks: experiment.ticks,
        depth: experiment.depth,
        num_receivers: experiment.num_receivers(),
        seed: experiment.seed,
        mean_abs_error: (!errors.is_empty())
            .then(|| errors.iter().sum::<f64>() / errors.len() as f64),
        max_abs_error: errors.iter().copied().reduce(f64::max),
        frac_converged: converged.len() as f64 / hosts.len() as f64,
        median_convergence_tick: converged.get(converged.len() / 2).copied(),
        time_sim,
    };

    // store the results
    {
        let mut csv = writer
            .lock()
            .map_err(|_| anyhow::anyhow!("The csv writer is poisoned"))?;
        csv.serialize(record)
            .context("Cannot write the record to file")?;
        csv.flush().context("Error writing the record to file")?;
    }

    Ok(())
}
