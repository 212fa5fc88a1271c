// Drives the compiled `deer` binary against a throwaway session log.
// HOME and XDG_CONFIG_HOME point into the temp dir so the user's real
// config is never read.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use chrono::{Duration, Local};
use tempfile::{tempdir, TempDir};

fn deer(home: &TempDir, data_file: &Path) -> Command {
    let mut cmd = Command::cargo_bin("deer").unwrap();
    cmd.env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join(".config"))
        .env_remove("RUST_LOG")
        .arg("--data-file")
        .arg(data_file);
    cmd
}

fn stdout_of(cmd: &mut Command) -> String {
    let out = cmd.output().unwrap();
    assert!(out.status.success(), "command failed: {out:?}");
    String::from_utf8(out.stdout).unwrap()
}

fn write_sessions(path: &Path) {
    let now = Local::now().naive_local();
    let yesterday = (now - Duration::days(1)).format("%Y-%m-%dT%H:%M:%S");
    let today = now.format("%Y-%m-%dT%H:%M:%S");
    fs::write(
        path,
        format!(
            r#"[
  {{"timestamp":"{yesterday}","duration":600,"remark":"warm-up","props":"Cup","mood":"Calm"}},
  {{"timestamp":"{today}","duration":1200,"remark":"second go","climax":true,"rating":4.5}}
]"#
        ),
    )
    .unwrap();
}

#[test]
fn log_on_missing_file_is_empty() {
    let home = tempdir().unwrap();
    let out = stdout_of(deer(&home, &home.path().join("none.json")).arg("log"));
    assert!(out.contains("No sessions recorded yet."));
}

#[test]
fn log_lists_sessions_and_honours_limit() {
    let home = tempdir().unwrap();
    let data = home.path().join("sessions.json");
    write_sessions(&data);

    let all = stdout_of(deer(&home, &data).arg("log"));
    assert!(all.contains("warm-up"));
    assert!(all.contains("second go"));
    assert!(all.contains("4.5/5"));

    let last = stdout_of(deer(&home, &data).args(["log", "-n", "1"]));
    assert!(!last.contains("warm-up"));
    assert!(last.contains("second go"));
}

#[test]
fn stats_summarises_the_log() {
    let home = tempdir().unwrap();
    let data = home.path().join("sessions.json");
    write_sessions(&data);

    let out = stdout_of(deer(&home, &data).arg("stats"));
    assert!(out.contains("Latest: Today"), "{out}");
    assert!(out.contains("checked in today"));
    assert!(out.contains("Overall: 30m in 2 sessions, 15.0 min on average"));
    assert!(out.contains("This week:"));
    assert!(out.contains("This year:"));
}

#[test]
fn corrupt_log_starts_empty_with_a_warning() {
    let home = tempdir().unwrap();
    let data = home.path().join("sessions.json");
    fs::write(&data, "definitely not json").unwrap();

    let out = deer(&home, &data).arg("stats").output().unwrap();
    assert!(out.status.success());
    let stderr = String::from_utf8(out.stderr).unwrap();
    assert!(stderr.contains("starting with an empty log"), "{stderr}");
    assert!(String::from_utf8(out.stdout).unwrap().contains("No statistics yet."));
}

#[test]
fn export_writes_csv_with_header() {
    let home = tempdir().unwrap();
    let data = home.path().join("sessions.json");
    let csv_path = home.path().join("out.csv");
    write_sessions(&data);

    stdout_of(deer(&home, &data).arg("export").arg("--output").arg(&csv_path));

    let csv = fs::read_to_string(&csv_path).unwrap();
    let mut lines = csv.lines();
    assert_eq!(
        lines.next().unwrap(),
        "timestamp,duration,remark,location,props,mood,watchedMovie,climax,rating"
    );
    assert_eq!(lines.count(), 2);
}

#[test]
fn track_refuses_to_run_without_a_terminal() {
    let home = tempdir().unwrap();
    deer(&home, &home.path().join("sessions.json"))
        .arg("track")
        .write_stdin("")
        .assert()
        .failure();
    assert!(!home.path().join("sessions.json").exists());
}
