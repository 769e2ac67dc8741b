use std::{path::PathBuf, process::Command};

fn levels() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("levels")
}

fn outbreak() -> Command {
    Command::new(env!("CARGO_BIN_EXE_outbreak"))
}

#[test]
fn sample_level_runs_and_reports_a_summary() {
    let output = outbreak()
        .arg(levels().join("infirmary.toml"))
        .args(["--config"])
        .arg(levels().join("tuning.toml"))
        .args(["--frames", "180", "--input", "right+infect:60", "--input", "down:30"])
        .env("RUST_LOG", "warn")
        .output()
        .expect("failed to run outbreak");

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("level:      infirmary"), "{stdout}");
    assert!(stdout.contains("ticks:"), "{stdout}");
}

#[test]
fn identical_seeds_print_identical_summaries() {
    let run = || {
        outbreak()
            .arg(levels().join("infirmary.toml"))
            .args(["--seed", "3", "--frames", "240", "--input", "right+infect:120"])
            .env("RUST_LOG", "off")
            .output()
            .expect("failed to run outbreak")
            .stdout
    };
    assert_eq!(run(), run());
}

#[test]
fn missing_levels_fail_with_context() {
    let output = outbreak()
        .arg(levels().join("does-not-exist.toml"))
        .env("RUST_LOG", "off")
        .output()
        .expect("failed to run outbreak");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to read level"), "{stderr}");
}

#[test]
fn malformed_input_segments_are_rejected() {
    let output = outbreak()
        .arg(levels().join("infirmary.toml"))
        .args(["--input", "jump:3"])
        .output()
        .expect("failed to run outbreak");

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown key 'jump'"));
}
