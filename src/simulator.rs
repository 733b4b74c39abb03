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
//! The discrete-time simulation driver.
use std::time::{Duration, Instant};

use rand::{rngs::StdRng, SeedableRng};

use crate::{
    config::{ConfigError, SimulationConfig},
    estimator::Estimator,
    network::{Network, Packet},
    state::SimulationState,
    topology::TopologyBuilder,
    Tick,
};

/// Lifecycle of a [`Simulator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    /// No tick has been simulated yet.
    Idle,
    /// Ticks `0..tick` are completed, `tick` is the next one.
    Running { tick: Tick },
    /// All configured ticks are completed.
    Finished,
}

/// Drives probes through the network, one tick at a time.
///
/// A tick walks the link array once in ascending heap order. The control packet is delivered to
/// the sender over link 0, each link hands the packet it delivered to its host, the sender emits
/// the probe of this tick and every router copies it onto both child links. Since children have
/// larger indices than their parents, a single pass carries the probe down the whole tree. Only
/// after the pass, the observations are recorded and the estimator is invoked.
#[derive(Debug)]
pub struct Simulator {
    config: SimulationConfig,
    network: Network,
    estimator: Box<dyn Estimator>,
    state: SimulationState,
    rng: StdRng,
    driver: DriverState,
    runtime: Duration,
}

impl Simulator {
    /// Validate the configuration and build the network. Nothing is built for an invalid
    /// configuration.
    pub fn new(config: SimulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut rng = StdRng::seed_from_u64(config.seed);
        let network = TopologyBuilder::new(config.num_receivers)
            .losses(config.losses.clone())
            .build(&mut rng)?;
        let estimator = config.mode.estimator(network.num_hosts());
        let state = SimulationState::new(&network);
        log::debug!(
            "prepared a {} run of {} ticks on {} receivers (seed {})",
            config.mode,
            config.ticks,
            config.num_receivers,
            config.seed
        );
        Ok(Self {
            config,
            network,
            estimator,
            state,
            rng,
            driver: DriverState::Idle,
            runtime: Duration::ZERO,
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn driver_state(&self) -> DriverState {
        self.driver
    }

    /// Simulate the next tick. Returns the tick that was simulated, or `None` if the run is
    /// already finished.
    pub fn step(&mut self) -> Option<Tick> {
        let tick = match self.driver {
            DriverState::Idle => 0,
            DriverState::Running { tick } => tick,
            DriverState::Finished => return None,
        };

        let start = Instant::now();
        self.send_probe(tick);
        self.state.observe(&self.network);
        self.estimator.update(tick, &self.network, &mut self.state);
        self.network.finish_tick();
        self.runtime += start.elapsed();

        self.driver = if tick + 1 < self.config.ticks {
            DriverState::Running { tick: tick + 1 }
        } else {
            DriverState::Finished
        };
        Some(tick)
    }

    /// Run the remaining ticks.
    pub fn run(mut self) -> SimulationResult {
        while let Some(tick) = self.step() {
            if log::log_enabled!(log::Level::Debug) {
                log::debug!(
                    "Probe {tick}: {} of {} receivers reached",
                    self.state
                        .observations()
                        .last()
                        .map(|o| o.count_ones())
                        .unwrap_or_default(),
                    self.network.num_receivers()
                );
            }
        }
        log::info!(
            "Simulation of {} ticks ran in {:.3} milliseconds",
            self.config.ticks,
            self.runtime.as_secs_f64() * 1000.0
        );
        SimulationResult {
            config: self.config,
            network: self.network,
            state: self.state,
            runtime: self.runtime,
        }
    }

    /// The link pass of a single tick.
    fn send_probe(&mut self, tick: Tick) {
        let n = self.network.num_receivers();
        let rng = &mut self.rng;
        let (hosts, links) = self.network.split_mut();
        debug_assert_eq!(hosts.len(), links.len());

        for i in 0..links.len() {
            if i == 0 {
                let delivered = links[0].attempt_delivery(Packet::new(tick), rng);
                debug_assert!(delivered, "the control link never drops");
            }

            links[i].tick(tick, &mut hosts[i]);

            // the sender and all routers forward; receivers have nothing to do
            if i < n {
                hosts[i].forward(tick, links, rng);
            }
        }
    }
}

/// Everything a finished run produced.
#[derive(Debug, Clone)]
pub struct SimulationResult {
    pub config: SimulationConfig,
    pub network: Network,
    pub state: SimulationState,
    /// Time spent simulating, excluding setup.
    pub runtime: Duration,
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::Mode;

    #[test]
    fn state_machine() {
        let mut sim = Simulator::new(SimulationConfig::new(3, 2, Mode::Tomography)).unwrap();
        assert_eq!(sim.driver_state(), DriverState::Idle);
        assert_eq!(sim.step(), Some(0));
        assert_eq!(sim.driver_state(), DriverState::Running { tick: 1 });
        assert_eq!(sim.step(), Some(1));
        assert_eq!(sim.step(), Some(2));
        assert_eq!(sim.driver_state(), DriverState::Finished);
        assert_eq!(sim.step(), None);
        assert_eq!(sim.state().ticks(), 3);
    }

    #[test]
    fn invalid_config_builds_nothing() {
        assert_eq!(
            Simulator::new(SimulationConfig::new(0, 2, Mode::Tomography)).unwrap_err(),
            ConfigError::InvalidTicks(0)
        );
        assert_eq!(
            Simulator::new(SimulationConfig::new(10, 3, Mode::Sdn)).unwrap_err(),
            ConfigError::UnsupportedReceivers(3)
        );
    }

    #[test]
    fn one_probe_per_tick() {
        let result = Simulator::new(SimulationConfig::new(500, 8, Mode::Sdn).seed(5))
            .unwrap()
            .run();
        let net = &result.network;
        assert_eq!(net.link(0).attempts(), 500);
        assert_eq!(net.link(0).loss_rate(), 0.0);
        assert_eq!(net.link(1).attempts(), 500);
        assert!(net.host(0).is_ready_to_send());
        for i in 1..net.num_hosts() {
            // every delivered packet reached the host, and every host received at most one
            // packet per tick
            assert_eq!(net.host(i).received(), net.link(i).successes());
            assert!(!net.host(i).has_received());
            if i >= 2 {
                let parent = net.parent(i).unwrap();
                assert_eq!(net.link(i).attempts(), net.host(parent).received());
            }
        }
        for i in net.receivers() {
            let j = i - net.num_receivers();
            let observed = result.state.observations().iter().filter(|o| o[j]).count() as u64;
            assert_eq!(observed, net.host(i).received());
        }
    }
}
