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
//! Library for simulating probe traffic on lossy binary trees and inferring per-link loss
//! probabilities from end-to-end observations (loss tomography).
//!
//! The network is an arena of hosts and links laid out as an implicit binary heap (see
//! [`network`]). A [`simulator::Simulator`] drives one probe per tick through the tree and hands
//! the outcome to an [`estimator::Estimator`], either inferring the losses from the receivers'
//! observations ([`estimator::TomographyEstimator`]) or reading them off the links directly
//! ([`estimator::DirectEstimator`]).

pub mod config;
pub mod estimator;
pub mod network;
pub mod records;
pub mod report;
pub mod simulator;
pub mod state;
pub mod topology;
pub mod util;

#[cfg(test)]
mod test;

/// Simulation time, counted in probes sent by the sender.
pub type Tick = usize;

pub mod prelude {
    pub use super::{
        config::{Mode, SimulationConfig},
        estimator::{DirectEstimator, Estimate, Estimator, TomographyEstimator},
        network::{Host, Link, Network, Packet, Role},
        simulator::{SimulationResult, Simulator},
        state::{HostSeries, SimulationState},
        topology::{LinkLossBuilder, TopologyBuilder},
        Tick,
    };
}
