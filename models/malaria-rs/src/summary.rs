use std::fmt;

use log::warn;
use serde::Serialize;

use crate::output::{Compartment, TimeSeries};
use crate::scenario::{ScenarioLabel, ScenarioResults};

/// Burden statistics for one scenario. The `*_vs_no_itn` and `*_percent`
/// fields are filled only when the batch contains a `NoITNs` run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRecord {
    pub scenario: ScenarioLabel,
    pub max_infected_humans: f64,
    pub mean_infected_humans: f64,
    pub total_infected_humans: f64,
    pub max_infected_vectors: f64,
    pub mean_infected_vectors: f64,
    pub diff_total_infected_vs_no_itn: Option<f64>,
    pub diff_mean_infected_vs_no_itn: Option<f64>,
    pub total_reduction_percent: Option<f64>,
    pub mean_reduction_percent: Option<f64>,
    pub peak_reduction_percent: Option<f64>,
}

impl SummaryRecord {
    fn from_series(scenario: ScenarioLabel, series: &TimeSeries) -> Self {
        SummaryRecord {
            scenario,
            max_infected_humans: series.peak(Compartment::Ih),
            mean_infected_humans: series.mean(Compartment::Ih),
            total_infected_humans: series.sum(Compartment::Ih),
            max_infected_vectors: series.peak(Compartment::Iv),
            mean_infected_vectors: series.mean(Compartment::Iv),
            diff_total_infected_vs_no_itn: None,
            diff_mean_infected_vs_no_itn: None,
            total_reduction_percent: None,
            mean_reduction_percent: None,
            peak_reduction_percent: None,
        }
    }
}

fn reduction_percent(baseline: f64, value: f64) -> Option<f64> {
    (baseline > 0.0).then(|| (baseline - value) / baseline * 100.0)
}

pub fn summarize(scenarios: &ScenarioResults) -> Vec<SummaryRecord> {
    let mut records: Vec<SummaryRecord> = scenarios
        .iter()
        .map(|(&label, series)| SummaryRecord::from_series(label, series))
        .collect();

    let Some(baseline) = records
        .iter()
        .find(|r| r.scenario == ScenarioLabel::NoItns)
        .cloned()
    else {
        return records;
    };
    if baseline.total_infected_humans <= 0.0 {
        warn!("NoITNs baseline has no infections; reductions are left empty");
    }

    for record in &mut records {
        record.diff_total_infected_vs_no_itn =
            Some(record.total_infected_humans - baseline.total_infected_humans);
        record.diff_mean_infected_vs_no_itn =
            Some(record.mean_infected_humans - baseline.mean_infected_humans);
        record.total_reduction_percent =
            reduction_percent(baseline.total_infected_humans, record.total_infected_humans);
        record.mean_reduction_percent =
            reduction_percent(baseline.mean_infected_humans, record.mean_infected_humans);
        record.peak_reduction_percent =
            reduction_percent(baseline.max_infected_humans, record.max_infected_humans);
    }
    records
}

/// Advice on deploying nets when resistance is high, judged on the drop in
/// peak prevalence rather than in cumulative burden.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Recommendation {
    /// Peak reduction above 20%.
    Deploy,
    /// Peak reduction above 10%; combine with other interventions.
    Moderate,
    /// Cost-effectiveness needs a closer look.
    Evaluate,
}

impl Recommendation {
    pub fn from_peak_reduction(percent: f64) -> Recommendation {
        if percent > 20.0 {
            Recommendation::Deploy
        } else if percent > 10.0 {
            Recommendation::Moderate
        } else {
            Recommendation::Evaluate
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Recommendation::Deploy => "deploy nets, they stay effective despite resistance",
            Recommendation::Moderate => "nets help moderately, combine with other interventions",
            Recommendation::Evaluate => "net benefit is limited, evaluate cost-effectiveness",
        })
    }
}

/// Recommendation based on the high-resistance scenario, if the summary has
/// both it and a baseline.
pub fn recommend(summary: &[SummaryRecord]) -> Option<Recommendation> {
    summary
        .iter()
        .find(|r| r.scenario == ScenarioLabel::ItnsHighResistance)
        .and_then(|r| r.peak_reduction_percent)
        .map(Recommendation::from_peak_reduction)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ComparisonRecord {
    AtDay {
        scenario: ScenarioLabel,
        day: f64,
        value: f64,
    },
    Overall {
        scenario: ScenarioLabel,
        max: f64,
        mean: f64,
        final_value: f64,
    },
}

/// Compares one compartment across scenarios, either on a given day or over
/// the whole run. Scenarios without an output on `day` are skipped.
pub fn compare_scenarios(
    scenarios: &ScenarioResults,
    compartment: Compartment,
    day: Option<f64>,
) -> Vec<ComparisonRecord> {
    scenarios
        .iter()
        .filter_map(|(&scenario, series)| match day {
            Some(day) => series.at_day(day).map(|state| ComparisonRecord::AtDay {
                scenario,
                day,
                value: state.get(compartment),
            }),
            None => series.final_state().map(|last| ComparisonRecord::Overall {
                scenario,
                max: series.peak(compartment),
                mean: series.mean(compartment),
                final_value: last.get(compartment),
            }),
        })
        .collect()
}
