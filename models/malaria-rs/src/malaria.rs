use log::debug;
use nalgebra::Vector5;

use crate::error::Result;
use crate::integrator::DormandPrince;
use crate::output::{TimePoint, TimeSeries};
use crate::parameters::ParameterSet;
use crate::transmission::TransmissionSystem;

pub struct MalariaModel {}

impl MalariaModel {
    /// Runs one simulation over `0..=simulation_days` with the default
    /// integrator settings.
    pub fn simulate(parameters: &ParameterSet) -> Result<TimeSeries> {
        Self::simulate_with(parameters, &DormandPrince::default())
    }

    pub fn simulate_with(
        parameters: &ParameterSet,
        integrator: &DormandPrince,
    ) -> Result<TimeSeries> {
        Self::simulate_days(parameters, integrator, &parameters.output_days())
    }

    /// Reports the state at each of `days`; the first entry is the start
    /// time of the initial state.
    pub fn simulate_days(
        parameters: &ParameterSet,
        integrator: &DormandPrince,
        days: &[f64],
    ) -> Result<TimeSeries> {
        debug!(
            "simulating {} output days (coverage {}, resistance {}/yr)",
            days.len(),
            parameters.itn_coverage(),
            parameters.resistance_rate()
        );
        let system = TransmissionSystem::new(parameters);
        let y0: Vector5<f64> = parameters.initial_state().into();
        let solution = integrator.integrate(&system, y0, days)?;
        Ok(TimeSeries::new(
            solution
                .into_iter()
                .map(|(day, y)| TimePoint {
                    day,
                    state: y.into(),
                })
                .collect(),
        ))
    }
}
