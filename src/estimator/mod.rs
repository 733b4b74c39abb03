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
//! Estimators of the per-link drop probabilities. The estimator is chosen once from the
//! [`Mode`] and invoked after every tick, appending one value to the series of every host.

use std::fmt::Debug;

use crate::{config::Mode, network::Network, state::SimulationState, Tick};

mod direct;
mod tomography;

pub use direct::DirectEstimator;
pub use tomography::TomographyEstimator;

/// Placeholder for values that cannot be estimated yet, e.g., because no receiver below a host
/// has observed a single probe.
pub const NOT_ESTIMABLE: f64 = f64::NAN;

/// Point estimate of a single host after a tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Estimate {
    /// Estimated probability that a probe reaches the host from the sender.
    pub y_hat: f64,
    /// Fraction of probes observed by at least one receiver in the subtree of the host.
    pub gamma: f64,
    /// Estimated drop probability of the incoming link of the host.
    pub alpha_hat: f64,
}

/// Strategy invoked once per tick, after all deliveries of that tick are completed.
pub trait Estimator: Debug + Send {
    /// The mode this estimator implements.
    fn mode(&self) -> Mode;

    /// Incorporate the outcome of `tick` and append the new estimates to `state`.
    fn update(&mut self, tick: Tick, network: &Network, state: &mut SimulationState);
}
