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
//! Test cases to test how accurate the estimators are.
//!
//! Use the following commands to see the diffs:
//!
//! ```shell
//! cargo test --release -- --nocapture --test-threads 1 --quiet
//! ```

/// Check that `acq` is within `precision` of `exp`, printing the difference in color.
pub fn check_diff(exp: f64, acq: f64, precision: f64, n_iter: usize) {
    let diff = (exp - acq).abs();
    let ok = diff < precision;

    let color = if ok {
        termion::color::Fg(termion::color::Green).to_string()
    } else {
        termion::color::Fg(termion::color::Red).to_string()
    };
    eprintln!(
        "diff: {color}{:.4}%{} with precision = {:.2}% and {} iterations",
        diff * 100.0,
        termion::color::Fg(termion::color::Reset),
        precision * 100.0,
        n_iter
    );
    assert!(
        ok,
        "expected {exp:.4}, got {acq:.4} (precision {precision:.4})"
    );
}

mod determinism;
