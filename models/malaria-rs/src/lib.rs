//! Deterministic host–vector malaria model with insecticide-treated nets.
//!
//! Five compartments (`Sh`, `Ih`, `Rh` for humans, `Sv`, `Iv` for mosquitoes)
//! evolve under a system of ODEs solved with an adaptive Dormand–Prince
//! integrator. Net efficacy decays as insecticide resistance spreads, and
//! [`run_scenarios`] compares four intervention settings side by side.
//!
//! ```no_run
//! use itn_malaria::{ParameterSet, run_scenarios, summarize, validate};
//!
//! let base = ParameterSet::default();
//! let results = run_scenarios(&base)?;
//! let summary = summarize(&results);
//! let checks = validate(&results, base.human_population());
//! # Ok::<(), itn_malaria::Error>(())
//! ```

pub mod error;
pub mod integrator;
pub mod malaria;
pub mod output;
pub mod parameters;
pub mod scenario;
pub mod summary;
pub mod transmission;
pub mod validation;

pub use error::{ConfigurationError, Error, IntegrationError, Result};
pub use integrator::{DormandPrince, IntegratorSettings};
pub use malaria::MalariaModel;
pub use output::{Compartment, SeriesRow, StateVector, TimePoint, TimeSeries};
pub use parameters::{ParameterSet, ParameterValues};
pub use scenario::{ScenarioLabel, ScenarioResults, run_scenarios, run_scenarios_with};
pub use summary::{
    ComparisonRecord, Recommendation, SummaryRecord, compare_scenarios, recommend, summarize,
};
pub use transmission::{efficacy_curve, effective_reproduction_number, itn_efficacy_at};
pub use validation::{ValidationRecord, validate};
