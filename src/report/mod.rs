//! Reporting collaborator: converts finished runs into CSV records, JSON summaries, and the
//! four-panel figure.

mod figure;

use std::path::Path;

use csv::ReaderBuilder;
use dynbin_config::RunConfig;
use dynbin_core::time::seconds_to_years;
use dynbin_core::units::{kg_per_s_to_msun_per_yr, kg_to_msun, m_to_rsun};
use dynbin_evolution::{RunPlan, Sample, TimeSeries};
use dynbin_export::summary::{RunInputs, RunSummary};
use dynbin_export::timeseries::Record;
use thiserror::Error;

pub use figure::{FigureOptions, render_figure};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to read CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("CSV missing '{0}' column")]
    MissingColumn(&'static str),
    #[error("time series is empty; nothing to plot")]
    EmptySeries,
    #[error("output path contains invalid UTF-8")]
    InvalidPath,
    #[error("rendering failed: {0}")]
    Draw(String),
}

/// One CSV record per sample, in solar units and years.
pub fn records_from_series(series: &TimeSeries) -> Vec<Record> {
    series.iter().map(record_from_sample).collect()
}

pub fn record_from_sample(sample: &Sample) -> Record {
    Record {
        time_yr: seconds_to_years(sample.time_s),
        a_rsun: m_to_rsun(sample.semimajor_axis_m),
        e: sample.eccentricity,
        mass_msun: kg_to_msun(sample.total_mass_kg),
        a_analytic_rsun: m_to_rsun(sample.analytic_semimajor_axis_m),
        e_analytic: sample.analytic_eccentricity,
        m1_msun: kg_to_msun(sample.primary_mass_kg),
        m2_msun: kg_to_msun(sample.secondary_mass_kg),
    }
}

/// Read records back from a CSV written by the time-series exporter. Rows with unparsable
/// numbers are skipped; the star-mass columns are optional.
pub fn read_records<P: AsRef<Path>>(path: P) -> Result<Vec<Record>, ReportError> {
    let mut rdr = ReaderBuilder::new().has_headers(true).from_path(path)?;
    let headers = rdr.headers()?.clone();
    let column = |name: &'static str| {
        headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name))
            .ok_or(ReportError::MissingColumn(name))
    };
    let time_idx = column("time_yr")?;
    let a_idx = column("a_rsun")?;
    let e_idx = column("e")?;
    let mass_idx = column("mass_msun")?;
    let a_an_idx = column("a_analytic_rsun")?;
    let e_an_idx = column("e_analytic")?;
    let m1_idx = column("m1_msun").ok();
    let m2_idx = column("m2_msun").ok();

    let mut records = Vec::new();
    for rec in rdr.records() {
        let r = rec?;
        let field =
            |idx: usize| -> f64 { r.get(idx).unwrap_or("").trim().parse().unwrap_or(f64::NAN) };
        let record = Record {
            time_yr: field(time_idx),
            a_rsun: field(a_idx),
            e: field(e_idx),
            mass_msun: field(mass_idx),
            a_analytic_rsun: field(a_an_idx),
            e_analytic: field(e_an_idx),
            m1_msun: m1_idx.map(field).unwrap_or(f64::NAN),
            m2_msun: m2_idx.map(field).unwrap_or(f64::NAN),
        };
        let core = [
            record.time_yr,
            record.a_rsun,
            record.e,
            record.mass_msun,
            record.a_analytic_rsun,
            record.e_analytic,
        ];
        if core.iter().all(|v| v.is_finite()) {
            records.push(record);
        }
    }
    Ok(records)
}

/// Build the JSON summary for a run. `status` is `"finished"` or `"aborted"`.
pub fn build_summary<'a>(
    config: &'a RunConfig,
    plan: &RunPlan,
    initial: &Sample,
    series: &TimeSeries,
    status: &'a str,
) -> RunSummary<'a> {
    let last = series.last().copied().unwrap_or(*initial);
    RunSummary {
        name: &config.name,
        generated_utc: chrono::Utc::now().to_rfc3339(),
        status,
        inputs: RunInputs {
            primary_mass_msun: config.primary_mass_msun,
            secondary_mass_msun: config.secondary_mass_msun,
            semimajor_axis_rsun: config.semimajor_axis_rsun,
            eccentricity: config.eccentricity,
            end_time_yr: config.end_time_yr,
            mass_loss_rate_msun_per_yr: config.mass_loss.rate_msun_per_yr,
            eta: config.integrator.eta,
        },
        period_yr: seconds_to_years(plan.binary.period_s()),
        dt_yr: plan
            .settings
            .timestep()
            .map(seconds_to_years)
            .unwrap_or(f64::NAN),
        steps: series.len(),
        initial_mass_msun: kg_to_msun(initial.total_mass_kg),
        final_mass_msun: kg_to_msun(last.total_mass_kg),
        initial_mass_loss_rate_msun_per_yr: system_loss_rate(plan, initial),
        final_mass_loss_rate_msun_per_yr: system_loss_rate(plan, &last),
        final_time_yr: seconds_to_years(last.time_s),
        final_a_rsun: m_to_rsun(last.semimajor_axis_m),
        final_a_analytic_rsun: m_to_rsun(last.analytic_semimajor_axis_m),
        final_e: last.eccentricity,
        final_e_analytic: last.analytic_eccentricity,
        a_relative_difference: last.semimajor_axis_residual(),
    }
}

fn system_loss_rate(plan: &RunPlan, sample: &Sample) -> f64 {
    let law = &plan.settings.mass_loss;
    kg_per_s_to_msun_per_yr(law.rate(sample.primary_mass_kg) + law.rate(sample.secondary_mass_kg))
}
