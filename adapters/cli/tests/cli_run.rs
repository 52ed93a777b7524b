use std::process::{Command, Output};

fn run(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_space-invaders"))
        .args(args)
        .env("RUST_LOG", "off")
        .output()
        .expect("failed to run space-invaders binary")
}

#[test]
fn default_session_prints_summary() {
    let output = run(&[]);
    assert!(output.status.success(), "default session should start");

    let stdout = String::from_utf8(output.stdout).expect("utf-8 output");
    assert!(stdout.contains("invader: 32"), "unexpected summary:\n{stdout}");
    assert!(stdout.contains("players: 1 from (380, 555)"));
    assert!(stdout.contains("cheats off"));
}

#[test]
fn toggle_command_is_applied_before_summary() {
    let output = run(&[
        "--command",
        r#"{"typeId":"ToggleCheat","transportAffinity":"UDP","playerId":32}"#,
    ]);
    assert!(output.status.success(), "toggle command should execute");

    let stdout = String::from_utf8(output.stdout).expect("utf-8 output");
    assert!(
        stdout.contains("cheats on: player distance 50, projectile distance 45"),
        "unexpected summary:\n{stdout}"
    );
}

#[test]
fn snapshot_flag_prints_json() {
    let output = run(&["--team-size", "2", "--snapshot"]);
    assert!(output.status.success(), "snapshot should print");

    let snapshot: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("snapshot is JSON");
    assert_eq!(snapshot["kinds"][1]["kind"], "Player");
    assert_eq!(
        snapshot["kinds"][1]["entities"]
            .as_array()
            .map(Vec::len),
        Some(2)
    );
}

#[test]
fn empty_team_fails_with_diagnostic() {
    let output = run(&["--team-size", "0"]);
    assert!(!output.status.success(), "empty team must be rejected");

    let stderr = String::from_utf8(output.stderr).expect("utf-8 output");
    assert!(
        stderr.contains("team size must be at least 1"),
        "unexpected stderr:\n{stderr}"
    );
}

#[test]
fn unknown_command_fails_with_diagnostic() {
    let output = run(&["--command", r#"{"typeId":"Warp","transportAffinity":"TCP"}"#]);
    assert!(!output.status.success(), "unknown command must be rejected");

    let stderr = String::from_utf8(output.stderr).expect("utf-8 output");
    assert!(stderr.contains("unknown command type 'Warp'"), "unexpected stderr:\n{stderr}");
}
