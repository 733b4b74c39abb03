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
//! Runs are fully determined by their seed.

use crate::prelude::*;

fn run(mode: Mode, seed: u64) -> SimulationResult {
    let config = SimulationConfig::new(1_000, 8, mode)
        .seed(seed)
        .losses(LinkLossBuilder::new().uniform(0.05, 0.3));
    Simulator::new(config).unwrap().run()
}

/// Series as raw bits, such that missing estimates compare equal.
fn bits(result: &SimulationResult) -> Vec<(Vec<u64>, u64, Vec<u64>)> {
    result
        .state
        .series()
        .iter()
        .map(|s| {
            (
                s.y_hat.iter().map(|x| x.to_bits()).collect(),
                s.gamma.to_bits(),
                s.alpha.iter().map(|x| x.to_bits()).collect(),
            )
        })
        .collect()
}

#[test]
fn same_seed_same_run() {
    for mode in [Mode::Tomography, Mode::Sdn] {
        let a = run(mode, 42);
        let b = run(mode, 42);
        let alphas = |r: &SimulationResult| -> Vec<f64> {
            r.network.links().iter().map(|l| l.alpha()).collect()
        };
        assert_eq!(alphas(&a), alphas(&b));
        assert_eq!(a.state.observations(), b.state.observations());
        assert_eq!(bits(&a), bits(&b));
    }
}

#[test]
fn different_seed_different_run() {
    let a = run(Mode::Tomography, 1);
    let b = run(Mode::Tomography, 2);
    assert_ne!(a.state.observations(), b.state.observations());
}

#[test]
fn mode_does_not_change_the_sampled_losses() {
    let tomo = run(Mode::Tomography, 5);
    let sdn = run(Mode::Sdn, 5);
    assert_eq!(tomo.state.observations(), sdn.state.observations());
    for (a, b) in tomo.network.links().iter().zip(sdn.network.links()) {
        assert_eq!(a.alpha(), b.alpha());
        assert_eq!(a.attempts(), b.attempts());
        assert_eq!(a.successes(), b.successes());
    }
}
