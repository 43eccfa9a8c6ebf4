use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;

#[test]
fn mloss_writes_csv_summary_and_figure() {
    let dir = tempfile::tempdir().expect("tempdir");
    let csv_path = dir.path().join("mloss.csv");
    let png_path = dir.path().join("mloss.png");
    let json_path = dir.path().join("mloss.json");

    Command::cargo_bin("mloss")
        .expect("mloss bin")
        .args([
            "-t",
            "2",
            "--csv",
            csv_path.to_str().unwrap(),
            "--figure",
            png_path.to_str().unwrap(),
            "--summary",
            json_path.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("period"));

    let csv = fs::read_to_string(&csv_path).expect("csv");
    let mut lines = csv.lines();
    assert!(lines.next().unwrap().starts_with("time_yr,a_rsun,e,mass_msun"));
    assert!(lines.count() >= 2000);

    let metadata = fs::metadata(&png_path).expect("png metadata");
    assert!(metadata.len() > 0, "PNG output should not be empty");

    let summary = fs::read_to_string(&json_path).expect("summary");
    assert!(summary.contains("\"status\": \"finished\""));
}

#[test]
fn mloss_streams_csv_to_stdout() {
    Command::cargo_bin("mloss")
        .expect("mloss bin")
        .args(["-t", "0.2", "--csv", "-", "--no-figure"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("time_yr,"));
}

#[test]
fn mloss_rejects_unbound_orbit() {
    let dir = tempfile::tempdir().expect("tempdir");
    Command::cargo_bin("mloss")
        .expect("mloss bin")
        .args([
            "-e",
            "1.5",
            "--no-figure",
            "--csv",
            dir.path().join("x.csv").to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("eccentricity"));
}

#[test]
fn mloss_runs_every_manifest_in_a_sweep() {
    let dir = tempfile::tempdir().expect("tempdir");
    let manifest = dir.path().join("sweep.yaml");
    fs::write(
        &manifest,
        "- name: tight\n  semimajor_axis_rsun: 50.0\n- name: wide\n  semimajor_axis_rsun: 300.0\n",
    )
    .unwrap();
    let csv_path = dir.path().join("runs.csv");

    Command::cargo_bin("mloss")
        .expect("mloss bin")
        .args([
            "--config",
            manifest.to_str().unwrap(),
            "-t",
            "0.5",
            "--no-figure",
            "--csv",
            csv_path.to_str().unwrap(),
        ])
        .assert()
        .success();

    assert!(dir.path().join("runs-tight.csv").exists());
    assert!(dir.path().join("runs-wide.csv").exists());
}

#[test]
fn mloss_plot_renders_png_from_csv() {
    let dir = tempfile::tempdir().expect("tempdir");
    let csv_path = dir.path().join("series.csv");
    let png_path = dir.path().join("series.png");

    let mut csv = String::from(
        "time_yr,a_rsun,e,mass_msun,a_analytic_rsun,e_analytic,m1_msun,m2_msun\n",
    );
    for i in 1..=20 {
        let t = i as f64 * 0.5;
        let loss = 2.9e-4 * t;
        csv.push_str(&format!(
            "{t:.3},{:.9},0.68,{:.9},{:.9},0.68,{:.9},{:.9}\n",
            138.0 * (1.0 + loss / 23.0) + 1.0e-5 * (t * 3.0).sin(),
            23.0 - loss,
            138.0 * (1.0 + loss / 23.0),
            15.0 - 0.78 * loss,
            8.0 - 0.22 * loss,
        ));
    }
    fs::write(&csv_path, csv).unwrap();

    Command::cargo_bin("mloss_plot")
        .expect("mloss_plot bin")
        .args([
            "--input",
            csv_path.to_str().unwrap(),
            "--output",
            png_path.to_str().unwrap(),
            "--width",
            "400",
            "--height",
            "300",
        ])
        .assert()
        .success();

    let metadata = fs::metadata(png_path).expect("png metadata");
    assert!(metadata.len() > 0, "PNG output should not be empty");
}

#[test]
fn mloss_plot_reports_missing_columns() {
    let dir = tempfile::tempdir().expect("tempdir");
    let csv_path = dir.path().join("broken.csv");
    fs::write(&csv_path, "time_yr,a_rsun\n1.0,138.0\n").unwrap();

    Command::cargo_bin("mloss_plot")
        .expect("mloss_plot bin")
        .args([
            "--input",
            csv_path.to_str().unwrap(),
            "--output",
            dir.path().join("out.png").to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing"));
}

#[test]
fn mloss_reports_crate_version() {
    Command::cargo_bin("mloss")
        .expect("mloss bin")
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(dynbin_massloss::version()));
}
