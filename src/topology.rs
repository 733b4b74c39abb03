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
//! Construction of the binary-tree topology and of the per-link drop probabilities.
use std::collections::BTreeMap;

use rand::Rng;
use rand_distr::{Distribution, Uniform};
use serde::{Deserialize, Serialize};

use crate::{
    config::{check_receivers, ConfigError},
    network::{Host, Link, Network, Role},
};

/// Drop probability of every tree link unless configured otherwise.
pub const DEFAULT_LOSS: f64 = 0.1;

/// Description of the drop probabilities of the links in the network.
///
/// Every link gets the default probability, or a value sampled uniformly from a range if one is
/// set. Single links can be overwritten by their heap index. The control link (index 0) always
/// has a drop probability of zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkLossBuilder {
    default: f64,
    range: Option<(f64, f64)>,
    exceptions: BTreeMap<usize, f64>,
}

impl Default for LinkLossBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkLossBuilder {
    pub fn new() -> Self {
        Self {
            default: DEFAULT_LOSS,
            range: None,
            exceptions: Default::default(),
        }
    }

    /// Sets the default drop probability of all tree links.
    pub fn default_loss(mut self, alpha: f64) -> Self {
        self.default = alpha;
        self
    }

    /// Sample the drop probability of every tree link uniformly from `[low, high)`. This takes
    /// precedence over the default probability.
    pub fn uniform(mut self, low: f64, high: f64) -> Self {
        self.range = Some((low, high));
        self
    }

    /// Add an overwrite rule for the link with the given heap index.
    pub fn overwrite(mut self, link: usize, alpha: f64) -> Self {
        self.exceptions.insert(link, alpha);
        self
    }

    pub fn default_value(&self) -> f64 {
        self.default
    }

    /// Check that all probabilities lie in `[0, 1)` and that all overwrites address one of the
    /// `num_links` links.
    pub fn validate(&self, num_links: usize) -> Result<(), ConfigError> {
        if !(0.0..1.0).contains(&self.default) {
            return Err(ConfigError::InvalidDefaultLoss(self.default));
        }
        if let Some((low, high)) = self.range {
            if !(0.0..1.0).contains(&low) || !(0.0..=1.0).contains(&high) || low >= high {
                return Err(ConfigError::InvalidLossRange { low, high });
            }
        }
        for (&link, &alpha) in self.exceptions.iter() {
            if link >= num_links {
                return Err(ConfigError::LinkOutOfRange { link, num_links });
            }
            if link == 0 && alpha != 0.0 {
                return Err(ConfigError::ControlLinkLoss(alpha));
            }
            check_loss(link, alpha)?;
        }
        Ok(())
    }

    /// Generate the drop probability of each of the `num_links` links.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        num_links: usize,
        rng: &mut R,
    ) -> Result<Vec<f64>, ConfigError> {
        self.validate(num_links)?;
        let uniform = self.range.map(|(low, high)| Uniform::new(low, high));
        Ok((0..num_links)
            .map(|i| {
                if i == 0 {
                    0.0
                } else if let Some(alpha) = self.exceptions.get(&i) {
                    *alpha
                } else if let Some(dist) = uniform.as_ref() {
                    dist.sample(rng)
                } else {
                    self.default
                }
            })
            .collect())
    }
}

fn check_loss(link: usize, alpha: f64) -> Result<(), ConfigError> {
    if (0.0..1.0).contains(&alpha) {
        Ok(())
    } else {
        Err(ConfigError::InvalidLoss { link, alpha })
    }
}

/// Builds the host and link arena of a complete binary tree with `num_receivers` leaves.
#[derive(Debug, Clone)]
pub struct TopologyBuilder {
    num_receivers: usize,
    losses: LinkLossBuilder,
}

impl TopologyBuilder {
    pub fn new(num_receivers: usize) -> Self {
        Self {
            num_receivers,
            losses: LinkLossBuilder::new(),
        }
    }

    pub fn losses(mut self, losses: LinkLossBuilder) -> Self {
        self.losses = losses;
        self
    }

    /// Build the network. The random number generator is only used if drop probabilities are
    /// sampled from a range.
    pub fn build<R: Rng + ?Sized>(self, rng: &mut R) -> Result<Network, ConfigError> {
        let n = check_receivers(self.num_receivers)?;
        let total_links = 2 * n;

        let links = self
            .losses
            .generate(total_links, rng)?
            .into_iter()
            .enumerate()
            .map(|(i, alpha)| Link::new(i, alpha))
            .collect::<Result<Vec<_>, _>>()?;

        // in a heap, the receivers are one half of the nodes
        let internal = (0..n).map(|i| match i {
            0 => Host::new("sender", 0, Role::Sender),
            i => Host::new(format!("router_{i}"), i, Role::Router),
        });
        let receivers = (0..n).map(|j| Host::new(format!("receiver_{}", j + 1), n + j, Role::Receiver));
        let mut hosts: Vec<Host> = internal.chain(receivers).collect();

        // connect the nodes, starting at the last router and working down to the sender
        for i in (0..n).rev() {
            if i == 0 {
                hosts[0].connect(1);
            } else {
                hosts[i].connect(2 * i);
                hosts[i].connect(2 * i + 1);
            }
        }

        log::debug!(
            "built a tree with {n} receivers, drop probabilities: {:?}",
            links.iter().map(Link::alpha).collect::<Vec<_>>()
        );

        Ok(Network::from_parts(hosts, links))
    }
}

#[cfg(test)]
mod test {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;
    use crate::config::SUPPORTED_RECEIVERS;

    #[test]
    fn tree_shape() {
        let mut rng = StdRng::seed_from_u64(0);
        for n in SUPPORTED_RECEIVERS {
            let net = TopologyBuilder::new(n).build(&mut rng).unwrap();
            assert_eq!(net.hosts().len(), 2 * n);
            assert_eq!(net.links().len(), 2 * n);
            for (i, host) in net.hosts().iter().enumerate() {
                assert_eq!(host.index(), i);
                assert_eq!(host.children().len(), host.role().num_children());
                let expected_role = match i {
                    0 => Role::Sender,
                    i if i < n => Role::Router,
                    _ => Role::Receiver,
                };
                assert_eq!(host.role(), expected_role);
                if host.role() == Role::Router {
                    assert_eq!(host.children(), &[2 * i, 2 * i + 1]);
                }
            }
            assert_eq!(net.host(0).children(), &[1]);
            assert_eq!(net.link(0).alpha(), 0.0);
            assert!(net.links()[1..].iter().all(|l| l.alpha() == DEFAULT_LOSS));
        }
    }

    #[test]
    fn names() {
        let mut rng = StdRng::seed_from_u64(0);
        let net = TopologyBuilder::new(4).build(&mut rng).unwrap();
        let names: Vec<_> = net.hosts().iter().map(|h| h.name()).collect();
        assert_eq!(
            names,
            [
                "sender",
                "router_1",
                "router_2",
                "router_3",
                "receiver_1",
                "receiver_2",
                "receiver_3",
                "receiver_4"
            ]
        );
    }

    #[test]
    fn unsupported_sizes() {
        let mut rng = StdRng::seed_from_u64(0);
        for n in [0, 1, 3, 6, 100, 256] {
            assert!(matches!(
                TopologyBuilder::new(n).build(&mut rng),
                Err(ConfigError::UnsupportedReceivers(_))
            ));
        }
    }

    #[test]
    fn overwrites() {
        let mut rng = StdRng::seed_from_u64(0);
        let losses = LinkLossBuilder::new()
            .default_loss(0.05)
            .overwrite(3, 0.2)
            .overwrite(0, 0.0);
        let net = TopologyBuilder::new(4).losses(losses).build(&mut rng).unwrap();
        assert_eq!(net.link(0).alpha(), 0.0);
        assert_eq!(net.link(3).alpha(), 0.2);
        assert_eq!(net.link(2).alpha(), 0.05);
    }

    #[test]
    fn uniform_losses() {
        let mut rng = StdRng::seed_from_u64(7);
        let losses = LinkLossBuilder::new().uniform(0.01, 0.05).overwrite(2, 0.3);
        let alphas = losses.generate(16, &mut rng).unwrap();
        assert_eq!(alphas[0], 0.0);
        assert_eq!(alphas[2], 0.3);
        assert!(alphas
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != 0 && *i != 2)
            .all(|(_, a)| (0.01..0.05).contains(a)));

        // same seed, same losses
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(losses.generate(16, &mut rng).unwrap(), alphas);
    }

    #[test]
    fn invalid_losses() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            LinkLossBuilder::new().default_loss(1.0).generate(4, &mut rng),
            Err(ConfigError::InvalidDefaultLoss(_))
        ));
        assert!(matches!(
            LinkLossBuilder::new().overwrite(0, 0.1).generate(4, &mut rng),
            Err(ConfigError::ControlLinkLoss(_))
        ));
        assert!(matches!(
            LinkLossBuilder::new().overwrite(4, 0.1).generate(4, &mut rng),
            Err(ConfigError::LinkOutOfRange {
                link: 4,
                num_links: 4
            })
        ));
        assert!(matches!(
            LinkLossBuilder::new().uniform(0.2, 0.1).generate(4, &mut rng),
            Err(ConfigError::InvalidLossRange { .. })
        ));
    }
}
