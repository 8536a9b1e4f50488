use std::collections::BTreeMap;
use std::fmt;

use log::info;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigurationError, Result};
use crate::integrator::DormandPrince;
use crate::malaria::MalariaModel;
use crate::output::{Compartment, TimeSeries};
use crate::parameters::ParameterSet;

/// Resistance rate (per year) of the low-resistance scenario.
pub const LOW_RESISTANCE_RATE: f64 = 0.05;

/// The four intervention scenarios compared in every run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ScenarioLabel {
    #[serde(rename = "NoITNs")]
    NoItns,
    #[serde(rename = "ITNs_NoResistance")]
    ItnsNoResistance,
    #[serde(rename = "ITNs_LowResistance")]
    ItnsLowResistance,
    /// The caller's own parameters, unchanged.
    #[serde(rename = "ITNs_HighResistance")]
    ItnsHighResistance,
}

impl ScenarioLabel {
    pub const ALL: [ScenarioLabel; 4] = [
        ScenarioLabel::NoItns,
        ScenarioLabel::ItnsNoResistance,
        ScenarioLabel::ItnsLowResistance,
        ScenarioLabel::ItnsHighResistance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScenarioLabel::NoItns => "NoITNs",
            ScenarioLabel::ItnsNoResistance => "ITNs_NoResistance",
            ScenarioLabel::ItnsLowResistance => "ITNs_LowResistance",
            ScenarioLabel::ItnsHighResistance => "ITNs_HighResistance",
        }
    }

    /// Derives this scenario's parameters from `base` by overriding a single
    /// field.
    pub fn parameters(
        &self,
        base: &ParameterSet,
    ) -> std::result::Result<ParameterSet, ConfigurationError> {
        match self {
            ScenarioLabel::NoItns => base.with_overrides(|v| v.itn_coverage = 0.0),
            ScenarioLabel::ItnsNoResistance => base.with_overrides(|v| v.resistance_rate = 0.0),
            ScenarioLabel::ItnsLowResistance => {
                base.with_overrides(|v| v.resistance_rate = LOW_RESISTANCE_RATE)
            }
            ScenarioLabel::ItnsHighResistance => base.with_overrides(|_| {}),
        }
    }
}

impl fmt::Display for ScenarioLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub type ScenarioResults = BTreeMap<ScenarioLabel, TimeSeries>;

/// Runs all four scenarios derived from `base`, in parallel.
pub fn run_scenarios(base: &ParameterSet) -> Result<ScenarioResults> {
    run_scenarios_with(base, &DormandPrince::default())
}

pub fn run_scenarios_with(
    base: &ParameterSet,
    integrator: &DormandPrince,
) -> Result<ScenarioResults> {
    ScenarioLabel::ALL
        .par_iter()
        .map(|&label| -> Result<(ScenarioLabel, TimeSeries)> {
            let parameters = label.parameters(base)?;
            let series = MalariaModel::simulate_with(&parameters, integrator)?;
            info!(
                "{label}: peak infected humans {:.0}, peak infected vectors {:.0}",
                series.peak(Compartment::Ih),
                series.peak(Compartment::Iv)
            );
            Ok((label, series))
        })
        .collect()
}
