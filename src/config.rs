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
//! Configuration of a simulation run, validated before any state is built.
use std::str::FromStr;

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    estimator::{DirectEstimator, Estimator, TomographyEstimator},
    topology::LinkLossBuilder,
};

/// Supported numbers of receivers. The tree must be complete, hence only powers of two. 256
/// receivers are not supported.
pub const SUPPORTED_RECEIVERS: [usize; 7] = [2, 4, 8, 16, 32, 64, 128];

/// Which estimator is used to learn the drop probabilities.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
    strum_macros::EnumString,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Infer the drop probabilities from end-to-end observations at the receivers.
    #[default]
    Tomography,
    /// Read the empirical drop rate directly off every link (smart router baseline).
    Sdn,
}

impl Mode {
    /// Create the estimator of this mode for a network with `num_hosts` hosts.
    pub fn estimator(&self, num_hosts: usize) -> Box<dyn Estimator> {
        match self {
            Self::Tomography => Box::new(TomographyEstimator::new(num_hosts)),
            Self::Sdn => Box::new(DirectEstimator),
        }
    }
}

/// Error thrown when the configuration is invalid.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// A run needs at least one tick.
    #[error("The number of ticks must be positive, got {0}.")]
    InvalidTicks(usize),
    /// The tree cannot be built with this number of receivers.
    #[error("Unsupported number of receivers {0}. Available experiments are {}.", supported_receivers())]
    UnsupportedReceivers(usize),
    /// Unknown estimation mode.
    #[error("Unknown mode `{0}`. Run in either <sdn> (smart router) or <tomography> mode.")]
    InvalidMode(String),
    /// The default drop probability is not in `[0, 1)`.
    #[error("The default drop probability must be in [0, 1), got {0}.")]
    InvalidDefaultLoss(f64),
    /// A drop probability is not in `[0, 1)`.
    #[error("The drop probability of link {link} must be in [0, 1), got {alpha}.")]
    InvalidLoss { link: usize, alpha: f64 },
    /// The range to sample drop probabilities from is empty or not within `[0, 1)`.
    #[error("Invalid range of drop probabilities [{low}, {high}).")]
    InvalidLossRange { low: f64, high: f64 },
    /// An overwrite addresses a link that does not exist.
    #[error("Link {link} does not exist, the network has {num_links} links.")]
    LinkOutOfRange { link: usize, num_links: usize },
    /// The control link into the sender must be reliable.
    #[error("The control link (link 0) never drops, cannot set its drop probability to {0}.")]
    ControlLinkLoss(f64),
    /// A `--link-loss` argument could not be parsed.
    #[error("Cannot parse `{0}`, expected <LINK>=<PROBABILITY>.")]
    InvalidLinkLoss(String),
}

/// Human-readable list of the supported numbers of receivers.
pub fn supported_receivers() -> String {
    SUPPORTED_RECEIVERS.iter().join(", ")
}

/// Help text for the number of receivers, generated from [`SUPPORTED_RECEIVERS`].
pub fn receivers_help() -> String {
    format!(
        "Specify number of receivers for this experiment (one of {})",
        supported_receivers()
    )
}

/// Check that the tree can be built with `num_receivers` receivers.
pub fn check_receivers(num_receivers: usize) -> Result<usize, ConfigError> {
    if SUPPORTED_RECEIVERS.contains(&num_receivers) {
        Ok(num_receivers)
    } else {
        Err(ConfigError::UnsupportedReceivers(num_receivers))
    }
}

/// Parse and check the number of receivers, as given on the command line.
pub fn parse_receivers(s: &str) -> Result<usize, ConfigError> {
    // anything that is not a number is just as unsupported as 3
    let n = s.trim().parse().unwrap_or(0);
    check_receivers(n)
}

/// Parse the estimation mode, as given on the command line.
pub fn parse_mode(s: &str) -> Result<Mode, ConfigError> {
    Mode::from_str(s.trim()).map_err(|_| ConfigError::InvalidMode(s.to_string()))
}

/// Parse a link overwrite of the form `<LINK>=<PROBABILITY>`.
pub fn parse_link_loss(s: &str) -> Result<(usize, f64), ConfigError> {
    let err = || ConfigError::InvalidLinkLoss(s.to_string());
    let (link, alpha) = s.split_once('=').ok_or_else(err)?;
    let link = link.trim().parse().map_err(|_| err())?;
    let alpha = alpha.trim().parse().map_err(|_| err())?;
    Ok((link, alpha))
}

/// Parameters of a single simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// How many rounds of probe traffic to send.
    pub ticks: usize,
    /// Number of receivers, i.e. leaves of the tree.
    pub num_receivers: usize,
    /// Estimator to run after every tick.
    pub mode: Mode,
    /// Seed of the random number generator driving all Bernoulli trials.
    pub seed: u64,
    /// Drop probabilities of the links.
    pub losses: LinkLossBuilder,
}

impl SimulationConfig {
    pub fn new(ticks: usize, num_receivers: usize, mode: Mode) -> Self {
        Self {
            ticks,
            num_receivers,
            mode,
            seed: 0,
            losses: LinkLossBuilder::new(),
        }
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn losses(mut self, losses: LinkLossBuilder) -> Self {
        self.losses = losses;
        self
    }

    /// Number of links (and hosts) of the network.
    pub fn num_links(&self) -> usize {
        2 * self.num_receivers
    }

    /// Reject configurations that cannot be simulated.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ticks == 0 {
            return Err(ConfigError::InvalidTicks(self.ticks));
        }
        check_receivers(self.num_receivers)?;
        self.losses.validate(self.num_links())
    }
}
