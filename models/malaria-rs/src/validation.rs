use log::warn;
use serde::Serialize;

use crate::output::TimeSeries;
use crate::scenario::{ScenarioLabel, ScenarioResults};

/// Relative tolerance for population conservation and non-negativity.
pub const TOLERANCE: f64 = 1e-5;

/// Absolute floor added to the conservation check.
const ABSOLUTE_TOLERANCE: f64 = 1e-8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ValidationRecord {
    pub scenario: ScenarioLabel,
    pub population_conserved: bool,
    pub non_negative: bool,
    pub all_finite: bool,
    pub all_checks_passed: bool,
}

fn close_to(value: f64, expected: f64) -> bool {
    (value - expected).abs() <= ABSOLUTE_TOLERANCE + TOLERANCE * expected.abs()
}

/// Checks a single trajectory. Humans are compared against their fixed
/// population; vectors against the largest vector total reached.
pub fn validate_series(
    scenario: ScenarioLabel,
    series: &TimeSeries,
    human_population: u64,
) -> ValidationRecord {
    let population = human_population as f64;
    let all_finite = series
        .points()
        .iter()
        .all(|p| p.state.components().iter().all(|v| v.is_finite()));

    let population_conserved = series
        .points()
        .iter()
        .all(|p| close_to(p.state.human_total(), population));

    let vector_scale = series
        .points()
        .iter()
        .map(|p| p.state.vector_total())
        .fold(0.0, f64::max);
    let non_negative = series.points().iter().all(|p| {
        let s = &p.state;
        [s.sh, s.ih, s.rh].iter().all(|&v| v >= -TOLERANCE * population)
            && [s.sv, s.iv].iter().all(|&v| v >= -TOLERANCE * vector_scale)
    });

    let record = ValidationRecord {
        scenario,
        population_conserved,
        non_negative,
        all_finite,
        all_checks_passed: population_conserved && non_negative && all_finite,
    };
    if !record.all_checks_passed {
        warn!(
            "{scenario} failed validation (conserved: {population_conserved}, \
             non-negative: {non_negative}, finite: {all_finite})"
        );
    }
    record
}

pub fn validate(scenarios: &ScenarioResults, human_population: u64) -> Vec<ValidationRecord> {
    scenarios
        .iter()
        .map(|(&label, series)| validate_series(label, series, human_population))
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::output::{StateVector, TimePoint};
    use crate::parameters::ParameterSet;
    use crate::scenario::run_scenarios;

    fn series(states: &[StateVector]) -> TimeSeries {
        TimeSeries::new(
            states
                .iter()
                .enumerate()
                .map(|(day, &state)| TimePoint {
                    day: day as f64,
                    state,
                })
                .collect(),
        )
    }

    fn healthy() -> Vec<StateVector> {
        [
            (999.0, 1.0, 0.0, 500.0, 10.0),
            (990.0, 8.0, 2.0, 480.0, 30.0),
            (970.0, 20.0, 10.0, 450.0, 60.0),
        ]
        .into_iter()
        .map(|(sh, ih, rh, sv, iv)| StateVector { sh, ih, rh, sv, iv })
        .collect()
    }

    #[test]
    fn test_healthy_series_passes() {
        let record = validate_series(ScenarioLabel::NoItns, &series(&healthy()), 1000);
        assert_eq!(
            record,
            ValidationRecord {
                scenario: ScenarioLabel::NoItns,
                population_conserved: true,
                non_negative: true,
                all_finite: true,
                all_checks_passed: true,
            }
        );
    }

    #[test]
    fn test_population_drift_is_flagged() {
        let mut states = healthy();
        states[2].ih += 1.0;
        let record = validate_series(ScenarioLabel::NoItns, &series(&states), 1000);
        assert!(!record.population_conserved);
        assert!(record.non_negative);
        assert!(!record.all_checks_passed);

        // Drift inside the relative tolerance is accepted
        let mut states = healthy();
        states[1].sh += 0.005;
        let record = validate_series(ScenarioLabel::NoItns, &series(&states), 1000);
        assert!(record.population_conserved);
    }

    #[test]
    fn test_negative_compartment_is_flagged() {
        let mut states = healthy();
        states[1].sv = -5.0;
        let record = validate_series(ScenarioLabel::ItnsLowResistance, &series(&states), 1000);
        assert!(record.population_conserved);
        assert!(!record.non_negative);
        assert!(!record.all_checks_passed);

        // Round-off below zero is tolerated
        let mut states = healthy();
        states[0].rh = -1e-6;
        states[0].sh += 1e-6;
        assert!(validate_series(ScenarioLabel::NoItns, &series(&states), 1000).non_negative);
    }

    #[test]
    fn test_non_finite_values_are_flagged() {
        let mut states = healthy();
        states[2].iv = f64::NAN;
        let record = validate_series(ScenarioLabel::NoItns, &series(&states), 1000);
        assert!(!record.all_finite);
        assert!(!record.all_checks_passed);
    }

    #[test]
    fn test_model_run_validates_over_full_horizon() {
        let base = ParameterSet::default();
        assert_eq!(base.simulation_days(), 1825);
        let results = run_scenarios(&base).unwrap();
        let records = validate(&results, base.human_population());
        assert_eq!(records.len(), 4);
        assert!(records.iter().all(|r| r.all_checks_passed), "{records:?}");
        assert!(
            records
                .iter()
                .map(|r| r.scenario)
                .eq(ScenarioLabel::ALL)
        );
    }
}
