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
use rand::Rng;
use rand_distr::{Bernoulli, Distribution};

use super::{Host, Packet};
use crate::{config::ConfigError, Tick};

/// A lossy link of the tree. The link at heap index `i` is the incoming link of the host at index
/// `i`.
///
/// Every delivery attempt is an independent Bernoulli trial that drops the packet with
/// probability `alpha`. A dropped packet simply vanishes, only the counters remember it.
#[derive(Debug, Clone)]
pub struct Link {
    index: usize,
    alpha: f64,
    drop: Bernoulli,
    attempts: u64,
    successes: u64,
    last_tick: Option<Tick>,
    delivered: Option<Packet>,
}

impl Link {
    /// Create a new link with drop probability `alpha` in `[0, 1)`.
    pub fn new(index: usize, alpha: f64) -> Result<Self, ConfigError> {
        if !(0.0..1.0).contains(&alpha) {
            return Err(ConfigError::InvalidLoss { link: index, alpha });
        }
        let drop = Bernoulli::new(alpha).map_err(|_| ConfigError::InvalidLoss { link: index, alpha })?;
        Ok(Self {
            index,
            alpha,
            drop,
            attempts: 0,
            successes: 0,
            last_tick: None,
            delivered: None,
        })
    }

    /// Try to push `packet` over the link. Returns whether the packet made it to the downstream
    /// host. The outcome is recorded in either case.
    pub fn attempt_delivery<R: Rng + ?Sized>(&mut self, packet: Packet, rng: &mut R) -> bool {
        self.attempts += 1;
        if self.drop.sample(rng) {
            log::trace!("link {} dropped packet {}", self.index, packet.tick());
            return false;
        }
        self.successes += 1;
        self.delivered = Some(packet);
        true
    }

    /// Per-tick bookkeeping: stamp the tick and hand the packet delivered during this tick (if
    /// any) to the downstream host.
    pub fn tick(&mut self, tick: Tick, host: &mut Host) {
        debug_assert_eq!(host.index(), self.index);
        self.last_tick = Some(tick);
        if let Some(packet) = self.delivered.take() {
            host.receive(packet);
        }
    }

    /// Empirical loss rate `1 - successes / attempts`, or 0 if nothing was sent yet.
    pub fn loss_rate(&self) -> f64 {
        if self.attempts == 0 {
            0.0
        } else {
            1.0 - self.successes as f64 / self.attempts as f64
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// The configured drop probability.
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn attempts(&self) -> u64 {
        self.attempts
    }

    pub fn successes(&self) -> u64 {
        self.successes
    }

    /// The tick of the last bookkeeping step.
    pub fn last_tick(&self) -> Option<Tick> {
        self.last_tick
    }
}

#[cfg(test)]
mod test {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;
    use crate::network::Role;

    #[test]
    fn reliable_link_never_drops() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut link = Link::new(0, 0.0).unwrap();
        for tick in 0..10_000 {
            assert!(link.attempt_delivery(Packet::new(tick), &mut rng));
        }
        assert_eq!(link.attempts(), 10_000);
        assert_eq!(link.loss_rate(), 0.0);
    }

    #[test]
    fn empirical_loss_rate() {
        let mut rng = StdRng::seed_from_u64(42);
        let n = 100_000;
        for alpha in [0.01, 0.1, 0.3, 0.5] {
            let mut link = Link::new(1, alpha).unwrap();
            for tick in 0..n {
                link.attempt_delivery(Packet::new(tick), &mut rng);
            }
            // more than 5 standard deviations away
            let tolerance = 5.0 * (alpha * (1.0 - alpha) / n as f64).sqrt();
            assert!(
                (link.loss_rate() - alpha).abs() < tolerance,
                "alpha={alpha}, measured={}",
                link.loss_rate()
            );
        }
    }

    #[test]
    fn loss_rate_without_traffic() {
        let link = Link::new(3, 0.2).unwrap();
        assert_eq!(link.loss_rate(), 0.0);
        assert_eq!(link.last_tick(), None);
    }

    #[test]
    fn invalid_alpha() {
        assert!(Link::new(1, 1.0).is_err());
        assert!(Link::new(1, -0.1).is_err());
        assert!(Link::new(1, f64::NAN).is_err());
    }

    #[test]
    fn tick_hands_packet_downstream() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut link = Link::new(1, 0.0).unwrap();
        let mut host = Host::new("router_1", 1, Role::Router);

        link.tick(0, &mut host);
        assert!(!host.has_received());

        assert!(link.attempt_delivery(Packet::new(1), &mut rng));
        link.tick(1, &mut host);
        assert_eq!(host.inbox(), Some(Packet::new(1)));
        assert_eq!(link.last_tick(), Some(1));

        // the packet is handed over only once
        host.clear();
        link.tick(2, &mut host);
        assert!(!host.has_received());
        assert_eq!(host.received(), 1);
    }
}
