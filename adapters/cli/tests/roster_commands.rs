use std::{path::Path, process::Command};

fn courtside(roster: &Path, args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_courtside"))
        .arg("--roster")
        .arg(roster)
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run courtside")
}

fn stdout(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn roster_edits_persist_between_runs() {
    let dir = tempfile::tempdir().expect("temp dir");
    let roster = dir.path().join("roster.toml");

    for name in ["Ann", "Bea", "Carl", "Dana", "Eve"] {
        assert!(courtside(&roster, &["roster", "add", name]).status.success());
        assert!(courtside(&roster, &["roster", "toggle", name]).status.success());
    }
    assert!(courtside(&roster, &["roster", "edit", "Ann", "games", "4"])
        .status
        .success());
    assert!(courtside(&roster, &["roster", "edit", "Ann", "wins", "3"])
        .status
        .success());

    let listing = stdout(&courtside(&roster, &["leaderboard"]));
    let first_row = listing.lines().nth(1).expect("one row per player");
    assert!(first_row.contains("Ann"));
    assert!(first_row.ends_with("75.00"));

    let balance = stdout(&courtside(&roster, &["balance", "--seed", "3"]));
    assert!(balance.contains("Team 1  [2]"));
    assert!(balance.contains("Team 2  [2]"));
    assert!(balance.contains("Subs    [1]"));
}

#[test]
fn destructive_commands_need_confirmation() {
    let dir = tempfile::tempdir().expect("temp dir");
    let roster = dir.path().join("roster.toml");
    assert!(courtside(&roster, &["roster", "add", "Ann"]).status.success());

    let refused = courtside(&roster, &["roster", "remove", "Ann"]);
    assert!(!refused.status.success());
    assert!(stdout(&courtside(&roster, &["roster", "list"])).contains("Ann"));

    assert!(courtside(&roster, &["roster", "remove", "Ann", "--yes"])
        .status
        .success());
    assert!(!stdout(&courtside(&roster, &["roster", "list"])).contains("Ann"));
}
