use nalgebra::Vector5;
use serde::{Deserialize, Serialize};

use crate::scenario::ScenarioLabel;

/// Compartment sizes at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StateVector {
    pub sh: f64,
    pub ih: f64,
    pub rh: f64,
    pub sv: f64,
    pub iv: f64,
}

impl StateVector {
    pub fn human_total(&self) -> f64 {
        self.sh + self.ih + self.rh
    }

    pub fn vector_total(&self) -> f64 {
        self.sv + self.iv
    }

    pub fn get(&self, compartment: Compartment) -> f64 {
        match compartment {
            Compartment::Sh => self.sh,
            Compartment::Ih => self.ih,
            Compartment::Rh => self.rh,
            Compartment::Sv => self.sv,
            Compartment::Iv => self.iv,
        }
    }

    pub fn components(&self) -> [f64; 5] {
        [self.sh, self.ih, self.rh, self.sv, self.iv]
    }
}

impl From<Vector5<f64>> for StateVector {
    fn from(y: Vector5<f64>) -> Self {
        StateVector {
            sh: y[0],
            ih: y[1],
            rh: y[2],
            sv: y[3],
            iv: y[4],
        }
    }
}

impl From<StateVector> for Vector5<f64> {
    fn from(s: StateVector) -> Self {
        Vector5::new(s.sh, s.ih, s.rh, s.sv, s.iv)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Compartment {
    Sh,
    Ih,
    Rh,
    Sv,
    Iv,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimePoint {
    pub day: f64,
    pub state: StateVector,
}

/// Model states at the requested output days, in order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TimeSeries {
    points: Vec<TimePoint>,
}

impl TimeSeries {
    pub fn new(points: Vec<TimePoint>) -> TimeSeries {
        TimeSeries { points }
    }

    pub fn points(&self) -> &[TimePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn days(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.day).collect()
    }

    pub fn column(&self, compartment: Compartment) -> Vec<f64> {
        self.points.iter().map(|p| p.state.get(compartment)).collect()
    }

    pub fn final_state(&self) -> Option<&StateVector> {
        self.points.last().map(|p| &p.state)
    }

    /// State at `day`, if `day` is one of the output days.
    pub fn at_day(&self, day: f64) -> Option<&StateVector> {
        self.points.iter().find(|p| p.day == day).map(|p| &p.state)
    }

    pub fn peak(&self, compartment: Compartment) -> f64 {
        self.points
            .iter()
            .map(|p| p.state.get(compartment))
            .fold(f64::NEG_INFINITY, f64::max)
    }

    pub fn sum(&self, compartment: Compartment) -> f64 {
        self.points.iter().map(|p| p.state.get(compartment)).sum()
    }

    pub fn mean(&self, compartment: Compartment) -> f64 {
        if self.points.is_empty() {
            return f64::NAN;
        }
        self.sum(compartment) / self.points.len() as f64
    }

    /// Flat rows for tabular export, tagged with `scenario`.
    pub fn rows(&self, scenario: ScenarioLabel) -> Vec<SeriesRow> {
        self.points
            .iter()
            .map(|p| SeriesRow {
                scenario,
                time: p.day,
                sh: p.state.sh,
                ih: p.state.ih,
                rh: p.state.rh,
                sv: p.state.sv,
                iv: p.state.iv,
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesRow {
    pub scenario: ScenarioLabel,
    pub time: f64,
    #[serde(rename = "Sh")]
    pub sh: f64,
    #[serde(rename = "Ih")]
    pub ih: f64,
    #[serde(rename = "Rh")]
    pub rh: f64,
    #[serde(rename = "Sv")]
    pub sv: f64,
    #[serde(rename = "Iv")]
    pub iv: f64,
}

#[cfg(test)]
mod test {
    use super::*;

    fn series() -> TimeSeries {
        let state = |ih: f64, iv: f64| StateVector {
            sh: 100.0 - ih,
            ih,
            rh: 0.0,
            sv: 50.0 - iv,
            iv,
        };
        TimeSeries::new(
            [(1.0, 5.0), (4.0, 9.0), (1.0, 7.0)]
                .into_iter()
                .enumerate()
                .map(|(day, (ih, iv))| TimePoint {
                    day: day as f64,
                    state: state(ih, iv),
                })
                .collect(),
        )
    }

    #[test]
    fn test_statistics() {
        let s = series();
        assert_eq!(s.len(), 3);
        assert_eq!(s.peak(Compartment::Ih), 4.0);
        assert_eq!(s.sum(Compartment::Ih), 6.0);
        assert_eq!(s.mean(Compartment::Ih), 2.0);
        assert_eq!(s.peak(Compartment::Iv), 9.0);
        assert_eq!(s.column(Compartment::Iv), vec![5.0, 9.0, 7.0]);
        assert_eq!(s.final_state().unwrap().iv, 7.0);
        assert_eq!(s.at_day(1.0).unwrap().ih, 4.0);
        assert!(s.at_day(1.5).is_none());
    }

    #[test]
    fn test_empty_series() {
        let s = TimeSeries::default();
        assert!(s.is_empty());
        assert!(s.final_state().is_none());
        assert!(s.mean(Compartment::Ih).is_nan());
    }

    #[test]
    fn test_vector_conversion() {
        let state = StateVector::from(Vector5::new(1.0, 2.0, 3.0, 4.0, 5.0));
        assert_eq!(state.sh, 1.0);
        assert_eq!(state.iv, 5.0);
        let y: Vector5<f64> = state.into();
        assert_eq!(y, Vector5::new(1.0, 2.0, 3.0, 4.0, 5.0));
        assert_eq!(StateVector::from(y), state);
        assert_eq!(state.human_total(), 6.0);
        assert_eq!(state.vector_total(), 9.0);
    }

    #[test]
    fn test_rows_tagged_with_scenario() {
        let rows = series().rows(ScenarioLabel::NoItns);
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r.scenario == ScenarioLabel::NoItns));
        assert_eq!(rows[1].time, 1.0);
        assert_eq!(rows[1].ih, 4.0);
    }
}
