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
//! Persisting the results of a run: one CSV file per host, a JSON summary and the Graphviz
//! description of the tree.
use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tomo_utils::convergence::ConvergenceReport;

use crate::{
    config::SimulationConfig, network::Role, records::SeriesRecord, simulator::SimulationResult,
    util::PathBufExt,
};

/// Name of the JSON summary within a result directory.
pub const SUMMARY_FILE: &str = "summary.json";
/// Name of the Graphviz file within a result directory.
pub const GRAPH_FILE: &str = "graph_structure.gv";

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV Error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Json Error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Final state of a single host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostSummary {
    pub name: String,
    pub role: Role,
    /// Configured drop probability of the incoming link.
    pub true_alpha: f64,
    /// Configured probability of a probe reaching the host.
    pub true_path_success: f64,
    /// Empirical drop rate of the incoming link.
    pub measured_alpha: f64,
    /// Final y-hat (tomography only).
    pub y_hat: Option<f64>,
    /// Final gamma (tomography only).
    pub gamma: Option<f64>,
    /// Convergence of the alpha series towards `true_alpha`.
    pub convergence: ConvergenceReport,
}

/// Summary of a whole run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub config: SimulationConfig,
    pub runtime_ms: f64,
    /// All hosts, in heap order.
    pub hosts: Vec<HostSummary>,
}

impl SimulationResult {
    /// Summarize the run. A series counts as converged once it stays within the relative
    /// `tolerance` of the configured drop probability.
    pub fn summary(&self, tolerance: f64) -> RunSummary {
        let net = &self.network;
        let hosts = self
            .state
            .series()
            .iter()
            .zip(net.hosts())
            .map(|(series, host)| {
                let link = net.link(host.index());
                HostSummary {
                    name: host.name().to_string(),
                    role: host.role(),
                    true_alpha: link.alpha(),
                    true_path_success: net.path_success(host.index()),
                    measured_alpha: link.loss_rate(),
                    y_hat: series.y_hat.last().copied().filter(|x| !x.is_nan()),
                    gamma: Some(series.gamma).filter(|x| !x.is_nan()),
                    convergence: ConvergenceReport::new(&series.alpha, link.alpha(), tolerance),
                }
            })
            .collect();
        RunSummary {
            config: self.config.clone(),
            runtime_ms: self.runtime.as_secs_f64() * 1000.0,
            hosts,
        }
    }
}

/// Write all results of the run into `dir` (which is created if necessary) and return the path of
/// the directory.
pub fn write_results(
    result: &SimulationResult,
    dir: impl AsRef<Path>,
    tolerance: f64,
) -> Result<PathBuf, ReportError> {
    let dir = dir.as_ref().to_path_buf();
    fs::create_dir_all(&dir)?;

    for series in result.state.series() {
        let path = dir.clone().then(format!("{}.csv", series.name));
        log::debug!("Writing {path:?}");
        let mut csv = csv::Writer::from_path(path)?;
        for record in SeriesRecord::from_series(series) {
            csv.serialize(record)?;
        }
        csv.flush()?;
    }

    fs::write(
        dir.clone().then(SUMMARY_FILE),
        serde_json::to_string_pretty(&result.summary(tolerance))?,
    )?;
    fs::write(dir.clone().then(GRAPH_FILE), result.network.to_dot())?;

    Ok(dir)
}

/// Read the summary from a result directory.
pub fn read_summary(dir: impl AsRef<Path>) -> Result<RunSummary, ReportError> {
    let raw = fs::read_to_string(dir.as_ref().then(SUMMARY_FILE))?;
    Ok(serde_json::from_str(&raw)?)
}

/// Read the series of a single host from a result directory.
pub fn read_series(dir: impl AsRef<Path>, host: &str) -> Result<Vec<SeriesRecord>, ReportError> {
    let mut csv = csv::Reader::from_path(dir.as_ref().then(format!("{host}.csv")))?;
    Ok(csv.deserialize().collect::<Result<_, _>>()?)
}

#[cfg(test)]
mod test {
    use tomo_utils::convergence::DEFAULT_TOLERANCE;

    use super::*;
    use crate::prelude::*;

    fn tmp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().then(format!("tomo-{name}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn summary() {
        let result = Simulator::new(SimulationConfig::new(2_000, 2, Mode::Sdn).seed(3))
            .unwrap()
            .run();
        let summary = result.summary(DEFAULT_TOLERANCE);
        assert_eq!(summary.hosts.len(), 4);
        assert_eq!(summary.hosts[0].role, Role::Sender);
        assert_eq!(summary.hosts[0].true_alpha, 0.0);
        assert!(summary.hosts[0].convergence.converged());
        for host in &summary.hosts[1..] {
            assert_eq!(host.true_alpha, 0.1);
            assert_eq!(host.y_hat, None);
            assert_eq!(host.gamma, None);
            assert_eq!(host.convergence.final_value, Some(host.measured_alpha));
        }
        assert!((summary.hosts[3].true_path_success - 0.81).abs() < 1e-12);
    }

    #[test]
    fn write_and_read() {
        let result = Simulator::new(SimulationConfig::new(50, 4, Mode::Tomography).seed(9))
            .unwrap()
            .run();
        let dir = write_results(&result, tmp_dir("report"), DEFAULT_TOLERANCE).unwrap();

        let summary = read_summary(&dir).unwrap();
        assert_eq!(summary.config, result.config);
        assert_eq!(summary.hosts.len(), 8);

        for series in result.state.series() {
            let records = read_series(&dir, &series.name).unwrap();
            assert_eq!(records.len(), 50);
            assert_eq!(records, SeriesRecord::from_series(series).collect::<Vec<_>>());
        }

        let dot = fs::read_to_string(dir.clone().then(GRAPH_FILE)).unwrap();
        assert_eq!(dot, result.network.to_dot());

        fs::remove_dir_all(dir).unwrap();
    }
}
