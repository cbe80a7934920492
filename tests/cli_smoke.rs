use std::process::{Command, Stdio};

fn referee() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_referee"));
    command.stdin(Stdio::null());
    command
}

#[test]
fn test_missing_engine_prints_usage() {
    let output = referee().output().expect("failed to run referee");
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("usage"), "stderr: {stderr}");
}

#[test]
fn test_unknown_option_is_rejected() {
    let output = referee()
        .args(["-fcp", "engine", "-bogus", "1"])
        .output()
        .expect("failed to run referee");
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("bogus"), "stderr: {stderr}");
}

#[test]
fn test_unlaunchable_engines_fail_the_match() {
    let output = referee()
        .args([
            "-fcp",
            "/nonexistent/first-engine",
            "-scp",
            "/nonexistent/second-engine",
        ])
        .output()
        .expect("failed to run referee");
    assert_eq!(output.status.code(), Some(1));
    assert!(!output.stderr.is_empty());
}

#[test]
fn test_position_status_reports_mate() {
    let output = Command::new(env!("CARGO_BIN_EXE_position_status"))
        .args(["f3", "e5", "g4", "Qh4"])
        .output()
        .expect("failed to run position_status");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("legal_moves: 0"), "stdout: {stdout}");
    assert!(stdout.contains("checkmate: true"), "stdout: {stdout}");
    assert!(stdout.contains("side_to_move: white"), "stdout: {stdout}");
}

#[test]
fn test_position_status_rejects_illegal_move() {
    let output = Command::new(env!("CARGO_BIN_EXE_position_status"))
        .args(["e5"])
        .output()
        .expect("failed to run position_status");
    assert!(!output.status.success());
}
