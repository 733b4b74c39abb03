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
use super::Estimator;
use crate::{config::Mode, network::Link, network::Network, state::SimulationState, Tick};

/// Baseline that reads the empirical drop rate of each host's incoming link directly, as a
/// smart router with link-level counters would. It has no inference error by construction.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectEstimator;

impl DirectEstimator {
    /// Measured drop probability of `link`.
    pub fn measure(link: &Link) -> f64 {
        link.loss_rate()
    }
}

impl Estimator for DirectEstimator {
    fn mode(&self) -> Mode {
        Mode::Sdn
    }

    fn update(&mut self, tick: Tick, network: &Network, state: &mut SimulationState) {
        for (host, link) in network.hosts().iter().zip(network.links()) {
            let alpha = Self::measure(link);
            log::trace!("tick {tick}: {} measured alpha={alpha:.4}", host.name());
            state.series_mut(host.index()).alpha.push(alpha);
        }
    }
}

#[cfg(test)]
mod test {
    use crate::prelude::*;

    #[test]
    fn measures_every_link() {
        let config = SimulationConfig::new(200, 4, Mode::Sdn).seed(1);
        let mut sim = Simulator::new(config).unwrap();
        while sim.step().is_some() {
            let net = sim.network();
            for (i, series) in sim.state().series().iter().enumerate() {
                assert_eq!(series.alpha.last().copied(), Some(net.link(i).loss_rate()));
                assert!(series.y_hat.is_empty());
                assert!(series.gamma.is_nan());
            }
        }
        assert!(sim.state().series().iter().all(|s| s.alpha.len() == 200));
        // the control link never drops
        assert!(sim.state().series()[0].alpha.iter().all(|a| *a == 0.0));
    }
}
