//! Host–vector transmission rates under ITN protection.
//!
//! Humans move S → I → R → S, vectors S → I. Bed nets scale the shared
//! transmission rate by `1 - coverage * efficacy(t)`, where efficacy decays
//! exponentially as resistance builds up. Vector mortality follows an annual
//! cycle.

use std::f64::consts::PI;

use nalgebra::Vector5;
use ode_solvers::System;

use crate::output::StateVector;
use crate::parameters::ParameterSet;

pub const DAYS_PER_YEAR: f64 = 365.0;

/// Fixed biting normalization applied to both transmission directions.
pub const BITING_DIVISOR: f64 = 4.0;

/// Divisor of the seasonal mortality multiplier `(1 + sin(2πt/365)) / 5`.
pub const SEASONAL_DIVISOR: f64 = 5.0;

/// Net efficacy on `day`: `itn_efficacy * exp(-resistance_rate * day / 365)`.
pub fn itn_efficacy_at(params: &ParameterSet, day: f64) -> f64 {
    params.itn_efficacy() * (-params.resistance_rate() * day / DAYS_PER_YEAR).exp()
}

pub fn efficacy_curve(params: &ParameterSet, days: &[f64]) -> Vec<f64> {
    days.iter().map(|&day| itn_efficacy_at(params, day)).collect()
}

/// Fraction of contacts blocked by nets on `day`.
pub fn effective_coverage(params: &ParameterSet, day: f64) -> f64 {
    params.itn_coverage() * itn_efficacy_at(params, day)
}

pub fn effective_reproduction_number(params: &ParameterSet, day: f64) -> f64 {
    params.r0() * (1.0 - effective_coverage(params, day))
}

/// Multiplier on the baseline vector death rate, in [0, 0.4].
pub fn seasonal_mortality(day: f64) -> f64 {
    (1.0 + (2.0 * PI * day / DAYS_PER_YEAR).sin()) / SEASONAL_DIVISOR
}

/// Time derivative of `state` at time `t` (days since start).
pub fn derivative(t: f64, state: &StateVector, params: &ParameterSet) -> StateVector {
    let StateVector { sh, ih, rh, sv, iv } = *state;
    let nh = state.human_total();
    let nv = state.vector_total();

    let beta = params.transmission_rate() * (1.0 - effective_coverage(params, t));
    let gamma = params.recovery_rate();
    let omega = params.immunity_loss_rate();
    let vector_mortality = seasonal_mortality(t) * params.vector_death_rate();

    // Terms dividing by an empty population vanish
    let human_infection = if nh > 0.0 && nv > 0.0 {
        beta * sh * (nv / nh) * (iv / nv) / BITING_DIVISOR
    } else {
        0.0
    };
    let vector_infection = if nh > 0.0 {
        beta * sv * (ih / nh) / BITING_DIVISOR
    } else {
        0.0
    };
    let vector_births =
        params.vector_birth_rate() * nv * (1.0 - nv / params.carrying_capacity());

    StateVector {
        sh: -human_infection + omega * rh,
        ih: human_infection - gamma * ih,
        rh: gamma * ih - omega * rh,
        sv: vector_births - vector_infection - vector_mortality * sv,
        iv: vector_infection - vector_mortality * iv,
    }
}

/// The transmission equations closed over one parameter set.
#[derive(Debug, Clone, Copy)]
pub struct TransmissionSystem<'a> {
    params: &'a ParameterSet,
}

impl<'a> TransmissionSystem<'a> {
    pub fn new(params: &'a ParameterSet) -> Self {
        TransmissionSystem { params }
    }
}

impl System<f64, Vector5<f64>> for TransmissionSystem<'_> {
    fn system(&self, t: f64, y: &Vector5<f64>, dy: &mut Vector5<f64>) {
        *dy = derivative(t, &StateVector::from(*y), self.params).into();
    }
}
