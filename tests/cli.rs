use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;

const SAMPLE: &str = "\
Date,Branch,Product,Quantity,UnitPrice,Total
2024-06-01,Colombo,Milk,5,150,750
2024-06-02,Kandy,Bread,10,50,500
2024-06-03,Colombo,Milk,2,160,320
bad-date,Kandy,Bread,1,50,50
";

struct Env {
    home: tempfile::TempDir,
}

impl Env {
    fn new() -> Self {
        Self {
            home: tempfile::tempdir().unwrap(),
        }
    }

    fn data_file(&self) -> PathBuf {
        self.home.path().join("sales.csv")
    }

    fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.home.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("salesdesk").unwrap();
        cmd.env("HOME", self.home.path())
            .env("NO_COLOR", "1")
            .arg("--data-file")
            .arg(self.data_file());
        cmd
    }

    fn import_sample(&self) {
        let file = self.write("sample.csv", SAMPLE);
        self.cmd().args(["import", "--yes"]).arg(&file).assert().success();
    }
}

fn read(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap()
}

#[test]
fn status_without_data() {
    let env = Env::new();
    env.cmd()
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("No sales data yet"));
}

#[test]
fn import_persists_valid_rows() {
    let env = Env::new();
    let file = env.write("sample.csv", SAMPLE);
    env.cmd()
        .args(["import", "--yes"])
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("Data imported and saved successfully! (3 added, 1 skipped)"));

    let saved = read(&env.data_file());
    assert!(saved.starts_with("Date,Branch,Product,Quantity,UnitPrice,Total"));
    assert_eq!(saved.lines().count(), 4);

    env.cmd()
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Records:      3"))
        .stdout(predicate::str::contains("Top product:  Milk"));
}

#[test]
fn import_missing_columns_fails_without_touching_data() {
    let env = Env::new();
    let file = env.write("bad.csv", "Date,Branch,Product\n2024-06-01,Colombo,Milk\n");
    env.cmd()
        .args(["import", "--yes"])
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Missing required columns: Quantity, UnitPrice, Total"));
    assert!(!env.data_file().exists());
}

#[test]
fn import_rejects_unknown_extension() {
    let env = Env::new();
    let file = env.write("sales.txt", SAMPLE);
    env.cmd()
        .args(["import", "--yes"])
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported file type"));
}

#[test]
fn report_text_when_piped() {
    let env = Env::new();
    env.import_sample();
    env.cmd()
        .args(["report", "monthly", "--year", "2024", "--month", "June"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Monthly Sales Report"))
        .stdout(predicate::str::contains("Rs. 1,070.00"))
        .stdout(predicate::str::contains("Total Sales"));
}

#[test]
fn report_without_data_asks_for_import() {
    let env = Env::new();
    env.cmd()
        .args(["report", "preference", "--text"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Please import sales data first to generate reports."));
}

#[test]
fn report_rejects_inverted_range() {
    let env = Env::new();
    env.import_sample();
    env.cmd()
        .args(["report", "weekly", "--from", "2024-06-10", "--to", "2024-06-01"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be after"));
}

#[test]
fn report_output_by_extension() {
    let env = Env::new();
    env.import_sample();
    let out = env.home.path().join("pref.csv");
    env.cmd()
        .args(["report", "preference", "--from", "2024-06-01", "--to", "2024-06-30", "--output"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Report saved to"));
    let csv = read(&out);
    assert!(csv.starts_with("Product,Units Sold,Revenue"));
    assert!(csv.lines().nth(1).unwrap().starts_with("Bread,10"));
}

#[test]
fn export_filters_by_branch() {
    let env = Env::new();
    env.import_sample();
    let out = env.home.path().join("colombo.csv");
    env.cmd()
        .args(["export", "--branch", "Colombo", "--output"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported 2 records"));
    let csv = read(&out);
    assert_eq!(csv.lines().count(), 3);
    assert!(!csv.contains("Kandy"));
}

#[test]
fn export_with_no_matches_fails() {
    let env = Env::new();
    env.import_sample();
    env.cmd()
        .args(["export", "--product", "Cheese"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No data found for the selected filters to export."));
}

#[test]
fn load_switches_data_file() {
    let env = Env::new();
    let other = env.write("other.csv", SAMPLE);
    Command::cargo_bin("salesdesk")
        .unwrap()
        .env("HOME", env.home.path())
        .arg("load")
        .arg(&other)
        .assert()
        .success()
        .stdout(predicate::str::contains("Switched to"))
        .stderr(predicate::str::contains("1 invalid rows"));

    Command::cargo_bin("salesdesk")
        .unwrap()
        .env("HOME", env.home.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("other.csv"))
        .stdout(predicate::str::contains("Records:      3"));
}

#[test]
fn completions_for_bash() {
    let env = Env::new();
    env.cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("salesdesk"));
}
