//! Adaptive Dormand–Prince 5(4) integration on a fixed output grid.
//!
//! Stepping and error control come from `ode_solvers::Dopri5`. The solver is
//! restarted between consecutive output times, so every reported state is the
//! end point of an accepted step rather than an interpolated value. A single
//! step budget is shared by all segments of one run.

use log::debug;
use nalgebra::SVector;
use ode_solvers::dop_shared::{IntegrationError as SolverError, OutputType};
use ode_solvers::dopri5::Dopri5;
use ode_solvers::System;
use serde::{Deserialize, Serialize};

use crate::error::IntegrationError;

// Step-size controller of the reference DOPRI5 code
const SAFETY_FACTOR: f64 = 0.9;
const BETA: f64 = 0.04;
const MIN_FACTOR: f64 = 0.2;
const MAX_FACTOR: f64 = 10.0;
const STIFFNESS_CHECKS: u32 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegratorSettings {
    pub rtol: f64,
    pub atol: f64,
    pub max_step: f64,
    /// Budget of attempted steps (accepted and rejected) per run.
    pub max_steps: u32,
}

impl Default for IntegratorSettings {
    fn default() -> Self {
        IntegratorSettings {
            rtol: 1e-8,
            atol: 1e-8,
            max_step: 10.0,
            max_steps: 500_000,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DormandPrince {
    settings: IntegratorSettings,
}

impl DormandPrince {
    pub fn new(settings: IntegratorSettings) -> Result<DormandPrince, IntegrationError> {
        let positive = |v: f64| v.is_finite() && v > 0.0;
        if !positive(settings.rtol) {
            return Err(IntegrationError::InvalidSettings("rtol must be positive"));
        }
        if !positive(settings.atol) {
            return Err(IntegrationError::InvalidSettings("atol must be positive"));
        }
        if !positive(settings.max_step) {
            return Err(IntegrationError::InvalidSettings("max_step must be positive"));
        }
        if settings.max_steps == 0 {
            return Err(IntegrationError::InvalidSettings("max_steps must be at least 1"));
        }
        Ok(DormandPrince { settings })
    }

    pub fn settings(&self) -> &IntegratorSettings {
        &self.settings
    }

    /// Solves the initial value problem `y(times[0]) = y0` and returns the
    /// state at each of `times`, which must be finite and non-decreasing.
    pub fn integrate<S, const D: usize>(
        &self,
        system: &S,
        y0: SVector<f64, D>,
        times: &[f64],
    ) -> Result<Vec<(f64, SVector<f64, D>)>, IntegrationError>
    where
        S: System<f64, SVector<f64, D>> + Clone,
    {
        for (index, &t) in times.iter().enumerate() {
            if !t.is_finite() || (index > 0 && t < times[index - 1]) {
                return Err(IntegrationError::InvalidOutputGrid { index });
            }
        }
        let Some(&t0) = times.first() else {
            return Ok(Vec::new());
        };
        if !all_finite(&y0) {
            return Err(IntegrationError::NonFinite { t: t0 });
        }

        let max_steps = self.settings.max_steps;
        let mut used = 0u32;
        let mut t = t0;
        let mut y = y0;
        let mut out = Vec::with_capacity(times.len());
        out.push((t, y));

        for &target in &times[1..] {
            if target > t {
                let remaining = max_steps.saturating_sub(used);
                if remaining == 0 {
                    return Err(IntegrationError::MaxStepsExceeded { t, max_steps });
                }
                let (y_end, steps) = self.segment(system, t, target, y, remaining)?;
                used = used.saturating_add(steps);
                t = target;
                y = y_end;
            }
            out.push((target, y));
        }

        debug!(
            "integrated {} output times over [{t0}, {t}] in {used} steps",
            times.len()
        );
        Ok(out)
    }

    /// Advances `y` from `t` to `target`, returning the end state and the
    /// number of attempted steps.
    fn segment<S, const D: usize>(
        &self,
        system: &S,
        t: f64,
        target: f64,
        y: SVector<f64, D>,
        n_max: u32,
    ) -> Result<(SVector<f64, D>, u32), IntegrationError>
    where
        S: System<f64, SVector<f64, D>> + Clone,
    {
        let settings = &self.settings;
        let mut stepper = Dopri5::from_param(
            system.clone(),
            t,
            target,
            0.0,
            y,
            settings.rtol,
            settings.atol,
            SAFETY_FACTOR,
            BETA,
            MIN_FACTOR,
            MAX_FACTOR,
            settings.max_step,
            0.0,
            n_max,
            STIFFNESS_CHECKS,
            OutputType::Sparse,
        );
        let stats = stepper.integrate().map_err(|err| match err {
            SolverError::MaxNumStepReached { .. } => IntegrationError::MaxStepsExceeded {
                t,
                max_steps: settings.max_steps,
            },
            SolverError::StepSizeUnderflow { .. } => IntegrationError::StepSizeUnderflow { t },
            SolverError::StiffnessDetected { .. } => IntegrationError::Stiff { t },
        })?;

        let reached = stepper.x_out().last().copied();
        let y_end = match (reached, stepper.y_out().last()) {
            (Some(x), Some(y_end)) if (x - target).abs() <= 1e-9 * target.abs().max(1.0) => *y_end,
            _ => return Err(IntegrationError::NonFinite { t }),
        };
        if !all_finite(&y_end) {
            return Err(IntegrationError::NonFinite { t });
        }
        Ok((y_end, (stats.accepted_steps + stats.rejected_steps) as u32))
    }
}

fn all_finite<const D: usize>(y: &SVector<f64, D>) -> bool {
    y.iter().all(|v| v.is_finite())
}
