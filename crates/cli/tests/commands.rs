use assert_cmd::Command;
use predicates::prelude::*;
use pretty_assertions::assert_eq;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::{tempdir, TempDir};

const DOC: &str = r#"# managed by hand
locals {
  alerts = [
    {
      name                           = "Shipment duration <DPD>(741)"
      nrql_query                     = "SELECT average(duration) FROM Transaction WHERE carrierId = 741"
      severity                       = "critical"
      aggregation_method             = "event_flow"
      critical_operator              = "above"
      critical_threshold             = 12
      critical_threshold_occurrences = "all"
    },
    {
      name                           = "Error rate <GLS>(12) (Peak)"
      nrql_query                     = "SELECT percentage(count(*), WHERE error IS true) FROM Transaction WHERE CarrierName = 'GLS'"
      severity                       = "warning"
      aggregation_method             = "event_flow"
      critical_operator              = "above"
      critical_threshold_occurrences = "all"
    },
  ]
}
"#;

#[allow(deprecated)]
fn alertsmith(workdir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("alertsmith").expect("binary");
    cmd.current_dir(workdir)
        .env_remove("ALERTSMITH_CONFIG")
        .env_remove("RUST_LOG");
    cmd
}

fn setup(doc: &str) -> TempDir {
    let temp = tempdir().unwrap();
    fs::write(temp.path().join("alerts.tf"), doc).unwrap();
    temp
}

fn json_stdout(cmd: &mut Command) -> Value {
    let output = cmd.output().expect("run");
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("valid json")
}

#[test]
fn list_reports_labels_and_ids() {
    let temp = setup(DOC);
    let body = json_stdout(alertsmith(temp.path()).args(["list", "--json"]));
    let alerts = body.as_array().expect("array");
    assert_eq!(alerts.len(), 2);
    assert_eq!(alerts[0]["carrier"], "DPD");
    assert_eq!(alerts[0]["carrier_id"], "741");
    assert_eq!(alerts[0]["critical_threshold"], 12.0);
    assert_eq!(alerts[1]["carrier"], "GLS");
    assert_eq!(alerts[1]["carrier_id"], "");

    alertsmith(temp.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Shipment duration <DPD>(741)"))
        .stdout(predicate::str::contains("threshold=12"));
}

#[test]
fn validate_passes_on_complete_alerts() {
    let temp = setup(DOC);
    let body = json_stdout(alertsmith(temp.path()).args(["validate", "--json"]));
    assert_eq!(body, Value::Array(Vec::new()));
}

#[test]
fn validate_reports_every_violation_and_fails() {
    let doc = "alerts = [\n  {\n    nrql_query = \"SELECT 1 FROM Tx WHERE x = 1\"\n    severity = \"crit[ical\"\n    aggregation_method = \"event_flow\"\n    critical_operator = \"above\"\n    critical_threshold_occurrences = \"all\"\n  },\n]\n";
    let temp = setup(doc);
    alertsmith(temp.path())
        .arg("validate")
        .assert()
        .failure()
        .stdout(predicate::str::contains("name is required"))
        .stdout(predicate::str::contains("severity must not contain '['"))
        .stderr(predicate::str::contains("2 violation(s)"));
}

#[test]
fn carrier_coverage_uses_exact_ids() {
    let temp = setup(DOC);
    alertsmith(temp.path())
        .args(["carrier", "741", "--id", "--kind", "duration"])
        .assert()
        .success()
        .stdout("yes\n");
    alertsmith(temp.path())
        .args(["carrier", "74", "--id", "--kind", "duration"])
        .assert()
        .failure()
        .stdout("no\n");
}

#[test]
fn carrier_listing_by_name_and_variant() {
    let temp = setup(DOC);
    let body = json_stdout(alertsmith(temp.path()).args(["carrier", "GLS", "--peak", "--json"]));
    assert_eq!(body.as_array().map(Vec::len), Some(1));
    assert_eq!(body[0]["index"], 1);

    let body =
        json_stdout(alertsmith(temp.path()).args(["carrier", "GLS", "--regular", "--json"]));
    assert_eq!(body, Value::Array(Vec::new()));

    let body = json_stdout(alertsmith(temp.path()).args([
        "carrier",
        "GLS",
        "--kind",
        "error-rate",
        "--json",
    ]));
    assert_eq!(body["present"], true);
}

#[test]
fn suggest_uses_config_defaults_and_file() {
    let temp = setup(DOC);
    alertsmith(temp.path())
        .args(["suggest", "--average", "10", "--std-dev", "1"])
        .assert()
        .success()
        .stdout("12\n");
    alertsmith(temp.path())
        .args(["suggest", "--average", "0.1", "--std-dev", "0.1", "--multiplier", "1"])
        .assert()
        .success()
        .stdout("3\n");

    fs::write(
        temp.path().join("alertsmith.toml"),
        "[threshold]\nmethod = \"formula\"\n",
    )
    .unwrap();
    let body = json_stdout(alertsmith(temp.path()).args([
        "suggest",
        "--average",
        "4",
        "--std-dev",
        "0",
        "--json",
    ]));
    assert_eq!(body["method"], "formula");
    assert_eq!(body["critical_threshold"], 9.0);
}

#[test]
fn set_threshold_rewrites_only_the_target_block() {
    let temp = setup(DOC);
    alertsmith(temp.path())
        .args(["set-threshold", "Error rate <GLS>(12) (Peak)", "--value", "4.5"])
        .assert()
        .success();

    let updated = fs::read_to_string(temp.path().join("alerts.tf")).unwrap();
    let gls_start = DOC.find("    {\n      name                           = \"Error rate").unwrap();
    assert_eq!(&updated[..gls_start], &DOC[..gls_start]);
    assert!(updated.contains("      critical_threshold = 4.5\n"), "{updated}");
    assert!(updated.ends_with("    },\n  ]\n}\n"));

    let body = json_stdout(alertsmith(temp.path()).args(["list", "--json"]));
    assert_eq!(body[1]["critical_threshold"], 4.5);
}

#[test]
fn set_threshold_dry_run_leaves_file_alone() {
    let temp = setup(DOC);
    alertsmith(temp.path())
        .args([
            "set-threshold",
            "Shipment duration <DPD>(741)",
            "--average",
            "20",
            "--std-dev",
            "1",
            "--dry-run",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("critical_threshold = 22\n"))
        .stdout(predicate::str::starts_with("# managed by hand\n"));
    assert_eq!(fs::read_to_string(temp.path().join("alerts.tf")).unwrap(), DOC);

    alertsmith(temp.path())
        .args(["set-threshold", "No such alert", "--value", "3"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no alert named"));
}

#[test]
fn fmt_check_then_rewrite() {
    let temp = setup(DOC);
    alertsmith(temp.path())
        .args(["fmt", "--check"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not in canonical layout"));

    alertsmith(temp.path()).arg("fmt").assert().success();
    let formatted = fs::read_to_string(temp.path().join("alerts.tf")).unwrap();
    assert!(formatted.contains("      name = \"Shipment duration <DPD>(741)\"\n"));

    alertsmith(temp.path())
        .args(["fmt", "--check"])
        .assert()
        .success();
}

#[test]
fn branch_reads_head_of_document_repository() {
    let temp = setup(DOC);
    fs::create_dir(temp.path().join(".git")).unwrap();
    fs::write(temp.path().join(".git/HEAD"), "ref: refs/heads/feature-x\n").unwrap();
    alertsmith(temp.path())
        .arg("branch")
        .assert()
        .success()
        .stdout("feature-x\n");

    fs::write(
        temp.path().join(".git/HEAD"),
        "9fceb02d0ae598e95dc970b74767f19372d61af8\n",
    )
    .unwrap();
    let body = json_stdout(alertsmith(temp.path()).args(["branch", "--json"]));
    assert_eq!(body["detached"], true);
    assert_eq!(body["branch"], Value::Null);
}

#[test]
fn check_layout_lists_missing_folders() {
    let temp = setup(DOC);
    fs::create_dir(temp.path().join(".git")).unwrap();
    fs::create_dir(temp.path().join("terraform")).unwrap();
    fs::write(
        temp.path().join("alertsmith.toml"),
        "[layout]\nrequired_dirs = [\"terraform\", \"services\"]\n",
    )
    .unwrap();

    alertsmith(temp.path())
        .arg("check-layout")
        .assert()
        .failure()
        .stdout("missing: services\n");

    fs::create_dir(temp.path().join("services")).unwrap();
    alertsmith(temp.path())
        .arg("check-layout")
        .assert()
        .success()
        .stdout(predicate::str::ends_with(": ok\n"));
}

#[test]
fn document_and_config_overrides() {
    let temp = setup("");
    let nested = temp.path().join("terraform");
    fs::create_dir(&nested).unwrap();
    fs::write(nested.join("carriers.tf"), DOC).unwrap();

    let body = json_stdout(alertsmith(temp.path()).args([
        "list",
        "--json",
        "--document",
        "terraform/carriers.tf",
    ]));
    assert_eq!(body.as_array().map(Vec::len), Some(2));

    fs::write(
        temp.path().join("custom.toml"),
        "[document]\npath = \"terraform/carriers.tf\"\n",
    )
    .unwrap();
    let body = json_stdout(
        alertsmith(temp.path())
            .env("ALERTSMITH_CONFIG", "custom.toml")
            .args(["list", "--json"]),
    );
    assert_eq!(body.as_array().map(Vec::len), Some(2));

    fs::write(temp.path().join("alertsmith.toml"), "[documents]\n").unwrap();
    alertsmith(temp.path())
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown config keys: documents"));
}
