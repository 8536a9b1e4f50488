use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;
use crate::output::StateVector;

/// Raw, unvalidated model inputs. Missing fields take the Madagascar
/// baseline values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParameterValues {
    // Epidemiological
    #[serde(alias = "R0")]
    pub r0: f64,
    pub infectious_period: f64,  // days
    pub immunity_loss_rate: f64, // per day

    // Vector
    pub carrying_capacity: f64,
    pub vector_death_rate: f64, // per day
    pub vector_birth_rate: f64, // per day

    // ITN
    pub itn_coverage: f64,
    pub itn_efficacy: f64,    // at day 0
    pub resistance_rate: f64, // per year

    // Population
    pub human_population: u64,
    pub vector_population: u64,
    pub initial_infected_humans: u64,
    pub initial_infected_vectors: u64,

    pub simulation_days: u32,
}

impl Default for ParameterValues {
    fn default() -> Self {
        ParameterValues {
            r0: 2.0,
            infectious_period: 14.0,
            immunity_loss_rate: 1.0 / 365.0,
            carrying_capacity: 5e5,
            vector_death_rate: 1.0 / 28.0,
            vector_birth_rate: 0.08,
            itn_coverage: 0.8,
            itn_efficacy: 0.9,
            resistance_rate: 0.1,
            human_population: 200_000,
            vector_population: 400_000,
            initial_infected_humans: 1,
            initial_infected_vectors: 10_000,
            simulation_days: 365 * 5,
        }
    }
}

/// Validated, immutable parameter set for one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ParameterValues", into = "ParameterValues")]
pub struct ParameterSet {
    values: ParameterValues,
}

fn finite(field: &'static str, value: f64) -> Result<f64, ConfigurationError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ConfigurationError::NonFinite { field, value })
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigurationError> {
    if finite(field, value)? > 0.0 {
        Ok(())
    } else {
        Err(ConfigurationError::NotPositive { field, value })
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ConfigurationError> {
    if finite(field, value)? >= 0.0 {
        Ok(())
    } else {
        Err(ConfigurationError::Negative { field, value })
    }
}

fn fraction(field: &'static str, value: f64) -> Result<(), ConfigurationError> {
    if (0.0..=1.0).contains(&finite(field, value)?) {
        Ok(())
    } else {
        Err(ConfigurationError::NotAFraction { field, value })
    }
}

fn infected_within(
    field: &'static str,
    infected: u64,
    population_field: &'static str,
    population: u64,
) -> Result<(), ConfigurationError> {
    if infected <= population {
        Ok(())
    } else {
        Err(ConfigurationError::InfectedExceedsPopulation {
            field,
            infected,
            population_field,
            population,
        })
    }
}

impl ParameterSet {
    pub fn new(values: ParameterValues) -> Result<ParameterSet, ConfigurationError> {
        positive("r0", values.r0)?;
        positive("infectious_period", values.infectious_period)?;
        non_negative("immunity_loss_rate", values.immunity_loss_rate)?;

        positive("carrying_capacity", values.carrying_capacity)?;
        positive("vector_death_rate", values.vector_death_rate)?;
        non_negative("vector_birth_rate", values.vector_birth_rate)?;

        fraction("itn_coverage", values.itn_coverage)?;
        fraction("itn_efficacy", values.itn_efficacy)?;
        non_negative("resistance_rate", values.resistance_rate)?;

        infected_within(
            "initial_infected_humans",
            values.initial_infected_humans,
            "human_population",
            values.human_population,
        )?;
        infected_within(
            "initial_infected_vectors",
            values.initial_infected_vectors,
            "vector_population",
            values.vector_population,
        )?;

        if values.vector_population as f64 > values.carrying_capacity {
            warn!(
                "vector_population ({}) starts above carrying_capacity ({})",
                values.vector_population, values.carrying_capacity
            );
        }

        Ok(ParameterSet { values })
    }

    /// Copies these parameters, applies `edit` and validates the result.
    pub fn with_overrides(
        &self,
        edit: impl FnOnce(&mut ParameterValues),
    ) -> Result<ParameterSet, ConfigurationError> {
        let mut values = self.values.clone();
        edit(&mut values);
        ParameterSet::new(values)
    }

    pub fn r0(&self) -> f64 {
        self.values.r0
    }

    pub fn infectious_period(&self) -> f64 {
        self.values.infectious_period
    }

    pub fn immunity_loss_rate(&self) -> f64 {
        self.values.immunity_loss_rate
    }

    pub fn carrying_capacity(&self) -> f64 {
        self.values.carrying_capacity
    }

    pub fn vector_death_rate(&self) -> f64 {
        self.values.vector_death_rate
    }

    pub fn vector_birth_rate(&self) -> f64 {
        self.values.vector_birth_rate
    }

    pub fn itn_coverage(&self) -> f64 {
        self.values.itn_coverage
    }

    pub fn itn_efficacy(&self) -> f64 {
        self.values.itn_efficacy
    }

    pub fn resistance_rate(&self) -> f64 {
        self.values.resistance_rate
    }

    pub fn human_population(&self) -> u64 {
        self.values.human_population
    }

    pub fn vector_population(&self) -> u64 {
        self.values.vector_population
    }

    pub fn simulation_days(&self) -> u32 {
        self.values.simulation_days
    }

    /// Human recovery rate (gamma), per day.
    pub fn recovery_rate(&self) -> f64 {
        1.0 / self.values.infectious_period
    }

    /// Transmission rate (beta) before any ITN reduction, per day.
    pub fn transmission_rate(&self) -> f64 {
        self.values.r0 * self.recovery_rate()
    }

    pub fn initial_state(&self) -> StateVector {
        let v = &self.values;
        StateVector {
            sh: (v.human_population - v.initial_infected_humans) as f64,
            ih: v.initial_infected_humans as f64,
            rh: 0.0,
            sv: (v.vector_population - v.initial_infected_vectors) as f64,
            iv: v.initial_infected_vectors as f64,
        }
    }

    /// Reporting grid: every day from 0 to `simulation_days` inclusive.
    pub fn output_days(&self) -> Vec<f64> {
        (0..=self.values.simulation_days).map(f64::from).collect()
    }
}

impl TryFrom<ParameterValues> for ParameterSet {
    type Error = ConfigurationError;

    fn try_from(values: ParameterValues) -> Result<Self, Self::Error> {
        ParameterSet::new(values)
    }
}

impl From<ParameterSet> for ParameterValues {
    fn from(parameters: ParameterSet) -> Self {
        parameters.values
    }
}

impl Default for ParameterSet {
    fn default() -> Self {
        ParameterSet {
            values: ParameterValues::default(),
        }
    }
}

#[cfg(test)]
mod test {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn test_default_parameters() {
        let params = ParameterSet::new(ParameterValues::default()).unwrap();
        assert_eq!(params.r0(), 2.0);
        assert_eq!(params.infectious_period(), 14.0);
        assert_eq!(params.itn_coverage(), 0.8);
        assert_eq!(params.itn_efficacy(), 0.9);
        assert_eq!(params.human_population(), 200_000);
        assert_eq!(params.simulation_days(), 1825);
        assert_eq!(params, ParameterSet::default());
    }

    #[test]
    fn test_derived_rates() {
        let params = ParameterSet::default();
        assert_relative_eq!(params.recovery_rate(), 1.0 / 14.0, epsilon = 1e-12);
        assert_relative_eq!(params.transmission_rate(), 2.0 / 14.0, epsilon = 1e-12);
    }

    #[test]
    fn test_initial_state() {
        let params = ParameterSet::new(ParameterValues {
            human_population: 1000,
            initial_infected_humans: 10,
            vector_population: 2000,
            initial_infected_vectors: 100,
            ..Default::default()
        })
        .unwrap();
        let state = params.initial_state();
        assert_eq!(state.sh, 990.0);
        assert_eq!(state.ih, 10.0);
        assert_eq!(state.rh, 0.0);
        assert_eq!(state.sv, 1900.0);
        assert_eq!(state.iv, 100.0);
    }

    #[test]
    fn test_output_days() {
        let params = ParameterSet::new(ParameterValues {
            simulation_days: 3,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(params.output_days(), vec![0.0, 1.0, 2.0, 3.0]);

        let empty_horizon = params.with_overrides(|v| v.simulation_days = 0).unwrap();
        assert_eq!(empty_horizon.output_days(), vec![0.0]);
    }

    #[test]
    fn test_rejects_invalid_values() {
        let cases: [(fn(&mut ParameterValues), &str); 10] = [
            (|v| v.r0 = 0.0, "r0"),
            (|v| v.r0 = f64::NAN, "r0"),
            (|v| v.infectious_period = -1.0, "infectious_period"),
            (|v| v.immunity_loss_rate = -0.1, "immunity_loss_rate"),
            (|v| v.carrying_capacity = f64::INFINITY, "carrying_capacity"),
            (|v| v.vector_death_rate = 0.0, "vector_death_rate"),
            (|v| v.vector_birth_rate = -0.01, "vector_birth_rate"),
            (|v| v.itn_coverage = 1.2, "itn_coverage"),
            (|v| v.itn_efficacy = -0.1, "itn_efficacy"),
            (|v| v.resistance_rate = -1.0, "resistance_rate"),
        ];
        for (edit, expected_field) in cases {
            let err = ParameterSet::default().with_overrides(edit).unwrap_err();
            let field = match err {
                ConfigurationError::NonFinite { field, .. }
                | ConfigurationError::NotPositive { field, .. }
                | ConfigurationError::Negative { field, .. }
                | ConfigurationError::NotAFraction { field, .. }
                | ConfigurationError::InfectedExceedsPopulation { field, .. } => field,
            };
            assert_eq!(field, expected_field);
        }
    }

    #[test]
    fn test_rejects_infected_above_population() {
        let err = ParameterSet::default()
            .with_overrides(|v| v.initial_infected_humans = 200_001)
            .unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::InfectedExceedsPopulation {
                field: "initial_infected_humans",
                infected: 200_001,
                population_field: "human_population",
                population: 200_000,
            }
        );
        assert!(
            ParameterSet::default()
                .with_overrides(|v| v.initial_infected_vectors = 400_001)
                .is_err()
        );
    }

    #[test]
    fn test_boundary_values_accepted() {
        let params = ParameterSet::default()
            .with_overrides(|v| {
                v.itn_coverage = 1.0;
                v.itn_efficacy = 0.0;
                v.resistance_rate = 0.0;
                v.immunity_loss_rate = 0.0;
                v.vector_birth_rate = 0.0;
                v.human_population = 0;
                v.initial_infected_humans = 0;
            })
            .unwrap();
        assert_eq!(params.initial_state().sh, 0.0);
    }

    #[test]
    fn test_overrides_leave_base_untouched() {
        let base = ParameterSet::default();
        let no_itn = base.with_overrides(|v| v.itn_coverage = 0.0).unwrap();
        assert_eq!(base.itn_coverage(), 0.8);
        assert_eq!(no_itn.itn_coverage(), 0.0);
        assert_eq!(no_itn.resistance_rate(), base.resistance_rate());
    }

    #[test]
    fn test_deserialize_validates() {
        let params: ParameterSet =
            serde_json::from_str(r#"{"R0": 3.0, "simulation_days": 100}"#).unwrap();
        assert_eq!(params.r0(), 3.0);
        assert_eq!(params.simulation_days(), 100);
        assert_eq!(params.itn_coverage(), 0.8);

        let rejected = serde_json::from_str::<ParameterSet>(r#"{"itn_coverage": 1.5}"#);
        assert!(rejected.is_err());
    }

    #[test]
    fn test_serialize_round_trips_values() {
        let params = ParameterSet::default();
        let json = serde_json::to_value(&params).unwrap();
        assert_eq!(json["r0"], 2.0);
        assert_eq!(json["human_population"], 200_000);
    }
}
