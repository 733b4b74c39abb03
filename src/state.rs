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
//! Accumulated results of a run, owned by the simulator and handed to the estimator every tick.
use bitvec::prelude::*;
use serde::Serialize;

use crate::{
    estimator::{Estimate, NOT_ESTIMABLE},
    network::Network,
};

/// Estimation series of a single host.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HostSeries {
    /// Name of the host.
    pub name: String,
    /// Estimated path success probability after each tick (tomography only).
    pub y_hat: Vec<f64>,
    /// Latest subtree observation fraction (tomography only).
    pub gamma: f64,
    /// Estimated (tomography) or measured (sdn) drop probability of the incoming link after each
    /// tick.
    pub alpha: Vec<f64>,
}

impl HostSeries {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            y_hat: Vec::new(),
            gamma: NOT_ESTIMABLE,
            alpha: Vec::new(),
        }
    }
}

/// State of a run that outlives single ticks: the per-host series (in heap order) and the raw
/// observations at the receivers.
#[derive(Debug, Clone)]
pub struct SimulationState {
    series: Vec<HostSeries>,
    /// One bit per receiver and tick, set if the receiver got the probe.
    observations: Vec<BitVec>,
}

impl SimulationState {
    pub fn new(network: &Network) -> Self {
        Self {
            series: network
                .hosts()
                .iter()
                .map(|h| HostSeries::new(h.name()))
                .collect(),
            observations: Vec::new(),
        }
    }

    /// Series of all hosts, in heap order.
    pub fn series(&self) -> &[HostSeries] {
        &self.series
    }

    pub fn series_of(&self, name: &str) -> Option<&HostSeries> {
        self.series.iter().find(|s| s.name == name)
    }

    pub(crate) fn series_mut(&mut self, host: usize) -> &mut HostSeries {
        &mut self.series[host]
    }

    /// Append a tomography estimate to the series of `host`.
    pub(crate) fn record(&mut self, host: usize, estimate: Estimate) {
        let series = &mut self.series[host];
        series.y_hat.push(estimate.y_hat);
        series.gamma = estimate.gamma;
        series.alpha.push(estimate.alpha_hat);
    }

    /// Store which receivers got the probe of the tick that just completed.
    pub(crate) fn observe(&mut self, network: &Network) {
        let received = network
            .receivers()
            .map(|i| network.host(i).has_received())
            .collect();
        self.observations.push(received);
    }

    /// Receiver observations of every completed tick. Bit `j` corresponds to `receiver_{j+1}`.
    pub fn observations(&self) -> &[BitVec] {
        &self.observations
    }

    /// Number of completed ticks.
    pub fn ticks(&self) -> usize {
        self.observations.len()
    }
}
