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
use bitvec::prelude::*;

use super::{Estimate, Estimator, NOT_ESTIMABLE};
use crate::{config::Mode, network::Network, state::SimulationState, Tick};

/// Loss tomography on a binary tree, based on the end-to-end observations at the receivers only.
///
/// For every host `k`, the estimator counts the probes that were observed by at least one receiver
/// in the subtree of `k`, giving the fraction `gamma_k`. Assuming independent Bernoulli losses,
/// the probability `A_k` that a probe reaches `k` satisfies
///
/// ```text
/// gamma_k = A_k * (1 - (1 - gamma_l / A_k) * (1 - gamma_r / A_k))
/// ```
///
/// for the two children `l` and `r`, which solves to `A_k = gamma_l * gamma_r / (gamma_l +
/// gamma_r - gamma_k)`. The denominator is exactly the fraction of probes that both subtrees
/// observed. The drop probability of the incoming link of `k` follows as `1 - A_k / A_parent`.
///
/// Receivers are their own subtree, so `A_k = gamma_k` is the empirical end-to-end success rate.
/// The sender is the injection point of the probes and has `A_0 = 1`.
#[derive(Debug, Clone)]
pub struct TomographyEstimator {
    /// Number of probes observed in the subtree of each host.
    hits: Vec<u64>,
    /// Number of probes sent so far.
    probes: u64,
}

impl TomographyEstimator {
    pub fn new(num_hosts: usize) -> Self {
        Self {
            hits: vec![0; num_hosts],
            probes: 0,
        }
    }

    fn num_receivers(&self) -> usize {
        self.hits.len() / 2
    }

    /// Record which subtrees observed the probe of the current tick. Only the receivers are
    /// consulted; internal hosts are credited if any receiver below them got the probe.
    fn observe(&mut self, network: &Network) {
        debug_assert_eq!(network.num_hosts(), self.hits.len());
        let n = self.num_receivers();
        let mut reached = bitvec![0; 2 * n];
        for i in network.receivers() {
            reached.set(i, network.host(i).has_received());
        }
        for i in (1..n).rev() {
            let any = reached[2 * i] || reached[2 * i + 1];
            reached.set(i, any);
        }
        let root = reached[1];
        reached.set(0, root);

        for i in reached.iter_ones() {
            self.hits[i] += 1;
        }
        self.probes += 1;
    }

    /// Number of probes observed in the subtree of `host`.
    pub fn hits(&self, host: usize) -> u64 {
        self.hits[host]
    }

    /// Number of probes incorporated so far.
    pub fn probes(&self) -> u64 {
        self.probes
    }

    /// Fraction of probes observed in the subtree of `host`.
    pub fn gamma(&self, host: usize) -> f64 {
        if self.probes == 0 {
            NOT_ESTIMABLE
        } else {
            self.hits[host] as f64 / self.probes as f64
        }
    }

    /// Estimated probability that a probe reaches `host` from the sender.
    pub fn path_success(&self, host: usize) -> f64 {
        if host == 0 {
            return 1.0;
        }
        let hits = self.hits[host];
        if hits == 0 {
            return NOT_ESTIMABLE;
        }
        let gamma = hits as f64 / self.probes as f64;
        if host >= self.num_receivers() {
            return gamma;
        }

        let left = self.hits[2 * host];
        let right = self.hits[2 * host + 1];
        if left == 0 || right == 0 {
            // only one side has seen anything, the subtree cannot tell the links apart yet
            return gamma;
        }
        let both = left + right - hits;
        if both == 0 {
            return 1.0;
        }
        let a = (left as f64 * right as f64) / (self.probes as f64 * both as f64);
        a.clamp(gamma, 1.0)
    }

    /// Current estimate of `host`.
    pub fn estimate(&self, host: usize) -> Estimate {
        let y_hat = self.path_success(host);
        let alpha_hat = match host {
            // the control link is known to be reliable
            0 => 0.0,
            k => link_loss(y_hat, self.path_success(k / 2)),
        };
        Estimate {
            y_hat,
            gamma: self.gamma(host),
            alpha_hat,
        }
    }
}

/// Drop probability of a link, given the path success probabilities to both of its ends.
fn link_loss(y_hat: f64, parent_y_hat: f64) -> f64 {
    if y_hat.is_nan() || parent_y_hat.is_nan() {
        NOT_ESTIMABLE
    } else {
        (1.0 - y_hat / parent_y_hat).clamp(0.0, 1.0)
    }
}

impl Estimator for TomographyEstimator {
    fn mode(&self) -> Mode {
        Mode::Tomography
    }

    fn update(&mut self, tick: Tick, network: &Network, state: &mut SimulationState) {
        self.observe(network);
        for host in network.hosts() {
            let estimate = self.estimate(host.index());
            log::trace!(
                "tick {tick}: {} y_hat={:.4}, gamma={:.4}, alpha_hat={:.4}",
                host.name(),
                estimate.y_hat,
                estimate.gamma,
                estimate.alpha_hat
            );
            state.record(host.index(), estimate);
        }
    }
}
