use std::path::PathBuf;
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

fn bin_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_sctrends"))
}

fn repo_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../..").canonicalize().unwrap()
}

fn fixture_path(name: &str) -> PathBuf {
    repo_root().join("tests/fixtures/pipeline").join(name)
}

fn tmp_dir(name: &str) -> PathBuf {
    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos();
    let mut p = std::env::temp_dir();
    p.push(format!("sctrends_cli_{}_{}_{}", std::process::id(), nanos, name));
    p
}

fn run(args: &[&str]) -> Output {
    Command::new(bin_path())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("failed to run {:?} {:?}: {}", bin_path(), args, e))
}

#[test]
fn audit_prints_row_accounting_and_exports_csv() {
    let dir = tmp_dir("audit");
    std::fs::create_dir_all(&dir).unwrap();
    let csv_path = dir.join("analysis.csv");

    let out = run(&[
        "audit",
        "--trends-dir",
        fixture_path("trends").to_string_lossy().as_ref(),
        "--crosswalk",
        fixture_path("crosswalk.csv").to_string_lossy().as_ref(),
        "--scorecard",
        fixture_path("scorecard.csv").to_string_lossy().as_ref(),
        "--export-csv",
        csv_path.to_string_lossy().as_ref(),
    ]);
    assert!(out.status.success(), "audit failed, stderr={}", String::from_utf8_lossy(&out.stderr));

    let stdout = String::from_utf8(out.stdout).unwrap();
    for needle in ["search_interest", "identifier", "outcomes", "complete rows", "share in city"] {
        assert!(stdout.contains(needle), "stdout missing {needle}:\n{stdout}");
    }
    assert!(!stdout.contains("Model A"), "audit must not fit models");

    let text = std::fs::read_to_string(&csv_path).unwrap();
    let mut lines = text.lines();
    let header = lines.next().unwrap();
    for col in ["institution_name", "index_std", "after_release", "is_high_earning", "is_in_city"] {
        assert!(header.contains(col), "header missing {col}: {header}");
    }
    assert!(lines.count() > 0);
    assert!(!text.contains("Twin Oaks College"));
    assert!(!text.contains("Stray Academy"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn bad_schema_version_is_rejected() {
    let out = run(&[
        "audit",
        "--trends-dir",
        fixture_path("trends").to_string_lossy().as_ref(),
        "--crosswalk",
        fixture_path("crosswalk.csv").to_string_lossy().as_ref(),
        "--scorecard",
        fixture_path("scorecard.csv").to_string_lossy().as_ref(),
        "--config",
        fixture_path("analysis_bad_schema.yaml").to_string_lossy().as_ref(),
    ]);
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("unsupported schema_version"), "stderr={stderr}");
}

#[test]
fn config_schema_prints_loadable_defaults() {
    let out = run(&["config-schema"]);
    assert!(out.status.success());
    let yaml = String::from_utf8(out.stdout).unwrap();
    assert!(yaml.contains("schema_version: sctrends_analysis_v0"));
    assert!(yaml.contains("earnings_threshold"));
    assert!(yaml.contains("covariance: HC2"));

    // the printed defaults are themselves a valid config
    let dir = tmp_dir("schema");
    std::fs::create_dir_all(&dir).unwrap();
    let cfg = dir.join("analysis.yaml");
    std::fs::write(&cfg, &yaml).unwrap();
    let out = run(&[
        "audit",
        "--trends-dir",
        fixture_path("trends").to_string_lossy().as_ref(),
        "--crosswalk",
        fixture_path("crosswalk.csv").to_string_lossy().as_ref(),
        "--scorecard",
        fixture_path("scorecard.csv").to_string_lossy().as_ref(),
        "--config",
        cfg.to_string_lossy().as_ref(),
    ]);
    assert!(out.status.success(), "stderr={}", String::from_utf8_lossy(&out.stderr));
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn version_prints_crate_version() {
    let out = run(&["version"]);
    assert!(out.status.success());
    let stdout = String::from_utf8(out.stdout).unwrap();
    assert_eq!(stdout.trim(), format!("sctrends {}", env!("CARGO_PKG_VERSION")));
}
