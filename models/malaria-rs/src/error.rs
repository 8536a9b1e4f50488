use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// A parameter value rejected while building a [`crate::ParameterSet`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("{field} must be finite, got {value}")]
    NonFinite { field: &'static str, value: f64 },

    #[error("{field} must be positive, got {value}")]
    NotPositive { field: &'static str, value: f64 },

    #[error("{field} must be non-negative, got {value}")]
    Negative { field: &'static str, value: f64 },

    #[error("{field} must lie in [0, 1], got {value}")]
    NotAFraction { field: &'static str, value: f64 },

    #[error("{field} ({infected}) exceeds {population_field} ({population})")]
    InfectedExceedsPopulation {
        field: &'static str,
        infected: u64,
        population_field: &'static str,
        population: u64,
    },
}

/// The solver could not produce a finite solution over the requested days.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IntegrationError {
    #[error("non-finite state at t = {t}")]
    NonFinite { t: f64 },

    #[error("step size underflow after t = {t}")]
    StepSizeUnderflow { t: f64 },

    #[error("step budget of {max_steps} exhausted after t = {t}")]
    MaxStepsExceeded { t: f64, max_steps: u32 },

    #[error("problem became stiff after t = {t}")]
    Stiff { t: f64 },

    #[error("output times must be finite and non-decreasing (at index {index})")]
    InvalidOutputGrid { index: usize },

    #[error("invalid integrator setting: {0}")]
    InvalidSettings(&'static str),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("integration failed: {0}")]
    Integration(#[from] IntegrationError),
}
