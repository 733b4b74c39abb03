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
//! Utility module collection of functions
use std::path::{Path, PathBuf};

/// log4rs configuration file, relative to the working directory.
pub const LOG_CONFIG: &str = "log4rs.yml";

/// Initialize logging from `log4rs.yml`. Falls back to `pretty_env_logger` (configured through
/// `RUST_LOG`) if the file is missing or invalid.
pub fn init_logging() {
    if Path::new(LOG_CONFIG).exists() {
        match log4rs::init_file(LOG_CONFIG, Default::default()) {
            Ok(()) => return,
            Err(e) => eprintln!("Cannot initialize logging from {LOG_CONFIG}: {e}"),
        }
    }
    // a logger might already be installed, e.g., when called repeatedly in tests
    let _ = pretty_env_logger::try_init();
}

/// Directory to store the results of a new run in: a fresh, timestamped subdirectory of `root`.
pub fn results_dir(root: impl AsRef<Path>) -> PathBuf {
    root.as_ref().then(tomo_utils::other::get_timestamp())
}

pub trait PathBufExt: Sized {
    fn then(self, p: impl AsRef<Path>) -> PathBuf;
}

impl PathBufExt for PathBuf {
    fn then(mut self, p: impl AsRef<Path>) -> PathBuf {
        self.push(p);
        self
    }
}

impl PathBufExt for &Path {
    fn then(self, p: impl AsRef<Path>) -> PathBuf {
        let mut path = self.to_path_buf();
        path.push(p);
        path
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn then() {
        let root = Path::new("/tmp/results");
        assert_eq!(root.then("a.csv"), PathBuf::from("/tmp/results/a.csv"));
        assert_eq!(
            PathBuf::from("results").then("x").then("y.gv"),
            PathBuf::from("results/x/y.gv")
        );
        assert!(results_dir("results").starts_with("results"));
    }
}
