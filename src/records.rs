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
//! Module defining record data types to (de-)serialize estimation results to CSV.
use serde::{Deserialize, Serialize};

use crate::{state::HostSeries, Tick};

/// One tick of the estimation series of a single host.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SeriesRecord {
    pub tick: Tick,
    /// Estimated or measured drop probability of the incoming link. Empty if not yet estimable.
    pub alpha: Option<f64>,
    /// Estimated path success probability. Empty in sdn mode and if not yet estimable.
    pub y_hat: Option<f64>,
}

impl SeriesRecord {
    /// Turn the series of a host into one record per tick.
    pub fn from_series(series: &HostSeries) -> impl Iterator<Item = SeriesRecord> + '_ {
        series.alpha.iter().enumerate().map(|(tick, alpha)| SeriesRecord {
            tick,
            alpha: finite(*alpha),
            y_hat: series.y_hat.get(tick).copied().and_then(finite),
        })
    }
}

fn finite(x: f64) -> Option<f64> {
    (!x.is_nan()).then_some(x)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn serialize_series_record() {
        let series = HostSeries {
            name: "receiver_1".to_string(),
            y_hat: vec![f64::NAN, 0.5],
            gamma: 0.5,
            alpha: vec![f64::NAN, 0.25],
        };
        let records: Vec<_> = SeriesRecord::from_series(&series).collect();
        assert_eq!(
            records,
            vec![
                SeriesRecord {
                    tick: 0,
                    alpha: None,
                    y_hat: None
                },
                SeriesRecord {
                    tick: 1,
                    alpha: Some(0.25),
                    y_hat: Some(0.5)
                },
            ]
        );

        let mut csv = csv::WriterBuilder::new()
            .has_headers(true)
            .from_writer(vec![]);
        for record in &records {
            csv.serialize(record).unwrap();
        }
        csv.flush().unwrap();
        let ser = String::from_utf8(csv.into_inner().unwrap()).unwrap();
        assert_eq!(ser, "tick,alpha,y_hat\n0,,\n1,0.25,0.5\n".to_string());

        let mut csv = csv::Reader::from_reader(ser.as_bytes());
        let de: Vec<SeriesRecord> = csv.deserialize().map(|r| r.unwrap()).collect();
        assert_eq!(de, records);
    }

    #[test]
    fn sdn_series_has_no_y_hat() {
        let series = HostSeries {
            name: "router_1".to_string(),
            y_hat: vec![],
            gamma: f64::NAN,
            alpha: vec![0.0, 0.5],
        };
        assert!(SeriesRecord::from_series(&series).all(|r| r.y_hat.is_none() && r.alpha.is_some()));
    }
}
