use anyhow::{Context, Result};
use itn_mrp::Environment;
use log::{LevelFilter, info, warn};
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
use serde::{Deserialize, Serialize};

use itn_malaria::transmission::DAYS_PER_YEAR;
use itn_malaria::{
    DormandPrince, IntegratorSettings, ParameterSet, ParameterValues, ScenarioLabel,
    effective_reproduction_number, itn_efficacy_at, recommend, run_scenarios_with, summarize,
    validate,
};

const LOG_LEVEL_VAR: &str = "ITN_MALARIA_LOG";

/// Model input: parameter fields at the top level, solver settings under
/// `integrator`.
#[derive(Debug, Deserialize)]
struct RunInput {
    #[serde(flatten)]
    parameters: ParameterValues,
    #[serde(default)]
    integrator: IntegratorSettings,
}

#[derive(Debug, Serialize)]
struct EfficacyRow {
    day: f64,
    efficacy: f64,
    effective_r: f64,
}

#[derive(Serialize)]
struct Manifest<'a> {
    parameters: &'a ParameterSet,
    integrator: &'a IntegratorSettings,
    input_digest: String,
}

/// Net efficacy and effective R at the start of every year of the run.
fn efficacy_rows(parameters: &ParameterSet) -> Vec<EfficacyRow> {
    let last_day = f64::from(parameters.simulation_days());
    (0..)
        .map(|year| f64::from(year) * DAYS_PER_YEAR)
        .take_while(|&day| day <= last_day)
        .map(|day| EfficacyRow {
            day,
            efficacy: itn_efficacy_at(parameters, day),
            effective_r: effective_reproduction_number(parameters, day),
        })
        .collect()
}

fn init_logging() -> Result<()> {
    let level = match std::env::var(LOG_LEVEL_VAR) {
        Ok(value) => value
            .parse::<LevelFilter>()
            .with_context(|| format!("invalid {LOG_LEVEL_VAR}={value}"))?,
        Err(_) => LevelFilter::Info,
    };
    let stderr = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new("{d(%H:%M:%S%.3f)} {l:<5} {t} - {m}{n}")))
        .build();
    let config = Config::builder()
        .appender(Appender::builder().build("stderr", Box::new(stderr)))
        .build(Root::builder().appender("stderr").build(level))?;
    log4rs::init_config(config)?;
    Ok(())
}

fn main() -> Result<()> {
    init_logging()?;

    let env = Environment::<RunInput>::load("parameters").context("reading run request")?;
    let input = env.input.as_ref().context("run request has no model input")?;
    let parameters =
        ParameterSet::new(input.parameters.clone()).context("invalid model parameters")?;
    let integrator = DormandPrince::new(input.integrator).context("invalid integrator settings")?;
    info!(
        "running {} days for {} humans (digest {})",
        parameters.simulation_days(),
        parameters.human_population(),
        env.input_digest()
    );

    let results = run_scenarios_with(&parameters, &integrator).context("running scenarios")?;
    let summary = summarize(&results);
    let checks = validate(&results, parameters.human_population());
    if checks.iter().any(|c| !c.all_checks_passed) {
        warn!("some scenarios failed validation; see malaria_validation.csv");
    }
    if let Some(recommendation) = recommend(&summary) {
        info!("recommendation under high resistance: {recommendation}");
    }

    let rows: Vec<_> = results
        .iter()
        .flat_map(|(&label, series)| series.rows(label))
        .collect();
    env.write_csv("malaria_simulation_results.csv", &rows)?;
    env.write_csv("malaria_summary_statistics.csv", &summary)?;
    env.write_csv("malaria_validation.csv", &checks)?;
    env.write_csv("itn_efficacy.csv", &efficacy_rows(&parameters))?;
    env.write_json(
        "model_parameters.json",
        &Manifest {
            parameters: &parameters,
            integrator: integrator.settings(),
            input_digest: env.input_digest(),
        },
    )?;

    info!("finished {} scenarios", ScenarioLabel::ALL.len());
    Ok(())
}
