use assert_cmd::Command;
use predicates::str::contains;

fn cmd() -> Command {
    Command::cargo_bin("sitesweep").unwrap()
}

#[test]
fn help_exits_clean() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("TARGET"));
}

#[test]
fn version_exits_clean() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(contains("sitesweep"));
}

#[test]
fn missing_target_is_a_usage_error() {
    cmd().assert().code(1).stderr(contains("TARGET"));
}

#[test]
fn malformed_target_is_rejected() {
    cmd()
        .arg("@host")
        .assert()
        .code(1)
        .stderr(contains("malformed target"));
}

#[test]
fn conflicting_write_modes_are_rejected() {
    cmd()
        .args(["-o", "report.csv", "--overwrite", "--append", "web01"])
        .assert()
        .code(1);
}

#[test]
fn write_mode_flags_require_an_output() {
    cmd().args(["--overwrite", "web01"]).assert().code(1);
}

#[test]
fn existing_output_without_a_mode_fails_fast_when_unattended() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("report.csv");
    std::fs::write(&path, "prior.example.com,true\n").unwrap();

    cmd()
        .args(["-o", path.to_str().unwrap(), "web01"])
        .assert()
        .code(1)
        .stderr(contains("--overwrite or --append"));
}
