use std::fs;

use dynbin_massloss::config::RunConfig;
use dynbin_massloss::evolution::{RunPlan, Sample, TimeSeries};
use dynbin_massloss::export::summary::write_summary;
use dynbin_massloss::export::timeseries::{self, HEADER, Record};
use dynbin_massloss::physics::time::years_to_seconds;
use dynbin_massloss::physics::units::{msun_to_kg, rsun_to_m};
use dynbin_massloss::report::{self, ReportError};

fn sample(time_yr: f64, a_rsun: f64, a_analytic_rsun: f64, m1: f64, m2: f64) -> Sample {
    Sample {
        time_s: years_to_seconds(time_yr),
        semimajor_axis_m: rsun_to_m(a_rsun),
        eccentricity: 0.68,
        total_mass_kg: msun_to_kg(m1 + m2),
        analytic_semimajor_axis_m: rsun_to_m(a_analytic_rsun),
        analytic_eccentricity: 0.68,
        primary_mass_kg: msun_to_kg(m1),
        secondary_mass_kg: msun_to_kg(m2),
    }
}

fn short_series() -> TimeSeries {
    let mut series = TimeSeries::new();
    series.push(sample(0.5, 138.001, 138.0015, 14.9999, 7.99997));
    series.push(sample(1.0, 138.003, 138.0030, 14.9998, 7.99994));
    series
}

fn rel_diff(actual: f64, expected: f64) -> f64 {
    ((actual - expected) / expected).abs()
}

#[test]
fn samples_convert_to_solar_units() {
    let records = report::records_from_series(&short_series());
    assert_eq!(records.len(), 2);
    let first = records[0];
    assert!(rel_diff(first.time_yr, 0.5) < 1e-12);
    assert!(rel_diff(first.a_rsun, 138.001) < 1e-12);
    assert!(rel_diff(first.a_analytic_rsun, 138.0015) < 1e-12);
    assert!(rel_diff(first.mass_msun, 14.9999 + 7.99997) < 1e-12);
    assert!(rel_diff(first.m1_msun, 14.9999) < 1e-12);
    assert!(rel_diff(first.m2_msun, 7.99997) < 1e-12);
    assert_eq!(first.e, 0.68);
}

#[test]
fn csv_written_by_exporter_reads_back() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("out/series.csv");
    let records = report::records_from_series(&short_series());

    let mut writer = timeseries::writer_for_path(&path).expect("writer");
    timeseries::write_all(&mut *writer, &records).expect("write");
    drop(writer);

    let text = fs::read_to_string(&path).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some(HEADER));
    assert_eq!(lines.count(), 2);

    let back = report::read_records(&path).expect("read back");
    assert_eq!(back.len(), 2);
    for (a, b) in records.iter().zip(&back) {
        assert!((a.time_yr - b.time_yr).abs() < 1e-9);
        assert!((a.a_rsun - b.a_rsun).abs() < 1e-8);
        assert!((a.m2_msun - b.m2_msun).abs() < 1e-8);
    }
}

#[test]
fn reader_skips_bad_rows_and_requires_core_columns() {
    let dir = tempfile::tempdir().expect("tempdir");
    let good = dir.path().join("good.csv");
    fs::write(
        &good,
        "time_yr,a_rsun,e,mass_msun,a_analytic_rsun,e_analytic\n\
         0.5,138.0,0.68,23.0,138.0,0.68\n\
         oops,138.0,0.68,23.0,138.0,0.68\n",
    )
    .unwrap();
    let records = report::read_records(&good).expect("records");
    assert_eq!(records.len(), 1);
    assert!(records[0].m1_msun.is_nan());

    let bad = dir.path().join("bad.csv");
    fs::write(&bad, "time_yr,a_rsun\n0.5,138.0\n").unwrap();
    assert!(matches!(
        report::read_records(&bad),
        Err(ReportError::MissingColumn("e"))
    ));
}

#[test]
fn empty_series_cannot_be_plotted() {
    let dir = tempfile::tempdir().expect("tempdir");
    let records: Vec<Record> = Vec::new();
    assert!(matches!(
        report::render_figure(&records, &dir.path().join("x.png"), Default::default()),
        Err(ReportError::EmptySeries)
    ));
}

#[test]
fn summary_reports_final_comparison() {
    let config = RunConfig {
        end_time_yr: 1.0,
        ..RunConfig::default()
    };
    let plan = RunPlan::from_config(&config).expect("plan");
    let series = short_series();
    let initial = Sample::at_start(&plan.binary);
    let summary = report::build_summary(&config, &plan, &initial, &series, "finished");

    assert_eq!(summary.steps, 2);
    assert!(rel_diff(summary.initial_mass_msun, 23.0) < 1e-12);
    assert!(rel_diff(summary.final_time_yr, 1.0) < 1e-12);
    assert!(rel_diff(summary.dt_yr, 0.0005) < 1e-12);
    assert!(summary.period_yr > 0.09 && summary.period_yr < 0.12);
    assert!(summary.a_relative_difference.abs() < 1e-12);
    assert!(rel_diff(summary.initial_mass_loss_rate_msun_per_yr, 2.89e-4) < 1e-9);
    let final_rate = 1.0e-6 * (14.9998_f64.powi(2) + 7.99994_f64.powi(2));
    assert!(rel_diff(summary.final_mass_loss_rate_msun_per_yr, final_rate) < 1e-9);

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("summary.json");
    write_summary(&path, &summary).expect("summary");
    let text = fs::read_to_string(&path).unwrap();
    assert!(text.contains("\"status\": \"finished\""));
    assert!(text.contains("\"generated_utc\""));
    assert!(text.contains("\"mass_loss_rate_msun_per_yr\""));
    assert!(text.contains("\"initial_mass_loss_rate_msun_per_yr\""));
}
