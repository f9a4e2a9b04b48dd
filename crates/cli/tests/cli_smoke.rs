// Integration tests for the `moa` binary: exit codes, JSON output and
// persistence across invocations.
// Run with: cargo test -p moa-cli --test cli_smoke -- --nocapture
//
// Manual smoke test (requires a real TTY):
//   moa tui audit
//   Verify: Ctrl+K opens the palette, typing filters, Enter runs, Esc closes,
//   q exits cleanly and the terminal is restored.

use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

/// Binary pointed at an isolated state dir and a settings file that does not exist.
fn moa(state: &TempDir) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_moa"));
    cmd.arg("--state-dir")
        .arg(state.path())
        .arg("--config")
        .arg(state.path().join("settings.json"))
        .env_remove("RUST_LOG")
        .env_remove("MOA_STATE_DIR")
        .env_remove("MOA_CONFIG");
    cmd
}

fn run(state: &TempDir, args: &[&str]) -> Output {
    moa(state).args(args).output().expect("moa should run")
}

fn stdout_json(output: &Output) -> serde_json::Value {
    assert!(
        output.status.success(),
        "exit code: {:?}\nstderr: {}",
        output.status,
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout should be json")
}

// ---------------------------------------------------------------------------
// modules / commands
// ---------------------------------------------------------------------------

#[test]
fn modules_lists_builtin_layouts() {
    let state = TempDir::new().unwrap();
    let value = stdout_json(&run(&state, &["modules", "--json"]));
    let modules: Vec<&str> = value
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["module"].as_str().unwrap())
        .collect();
    assert_eq!(modules, ["audit", "payments", "finances", "messages", "equipment"]);
}

#[test]
fn commands_include_navigation_and_host_hooks() {
    let state = TempDir::new().unwrap();
    let value = stdout_json(&run(&state, &["commands", "audit", "--json"]));
    let ids: Vec<&str> = value
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids[0], "category:pending");
    for id in ["nav-back", "toggle-theme", "export", "refresh", "open-stats"] {
        assert!(ids.contains(&id), "missing {id}");
    }
}

#[test]
fn unknown_module_exits_3() {
    let state = TempDir::new().unwrap();
    let output = run(&state, &["commands", "warehouse"]);
    assert_eq!(output.status.code(), Some(3));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unknown module"), "stderr: {stderr}");
    assert!(stderr.contains("hint:"), "stderr: {stderr}");
}

// ---------------------------------------------------------------------------
// search
// ---------------------------------------------------------------------------

#[test]
fn search_ranks_matching_commands() {
    let state = TempDir::new().unwrap();
    let value = stdout_json(&run(&state, &["search", "audit", "urg", "--json"]));
    let first = &value["groups"][0]["commands"][0];
    assert_eq!(first["id"], "category:urgent");
}

#[test]
fn search_query_groups_by_category_without_recent_bucket() {
    let state = TempDir::new().unwrap();
    stdout_json(&run(&state, &["run", "audit", "toggle-theme", "--json"]));

    let value = stdout_json(&run(&state, &["search", "audit", "theme", "--json"]));
    let groups: Vec<&str> = value["groups"]
        .as_array()
        .unwrap()
        .iter()
        .map(|g| g["group"].as_str().unwrap())
        .collect();
    assert_eq!(groups, ["Paramètres"]);
    assert_eq!(value["groups"][0]["commands"][0]["id"], "toggle-theme");

    let value = stdout_json(&run(&state, &["search", "audit", "--json"]));
    assert_eq!(value["groups"][0]["group"], "Récents");
}

#[test]
fn search_with_no_match_prints_nothing_on_stdout() {
    let state = TempDir::new().unwrap();
    let output = run(&state, &["search", "audit", "zzzzqqq"]);
    assert!(output.status.success());
    assert!(output.stdout.is_empty());
}

// ---------------------------------------------------------------------------
// run / nav persistence
// ---------------------------------------------------------------------------

#[test]
fn run_persists_recency_and_navigation() {
    let state = TempDir::new().unwrap();

    let value = stdout_json(&run(&state, &["run", "audit", "export", "--json"]));
    assert_eq!(value["hooks"], serde_json::json!(["export"]));

    let value = stdout_json(&run(&state, &["run", "audit", "category:urgent", "--json"]));
    assert_eq!(value["state"]["activeCategory"], "urgent");
    assert!(state.path().join("audit.nav-state.json").exists());

    // Browse mode: most recent first, grouped under Recent
    let value = stdout_json(&run(&state, &["search", "audit", "--json"]));
    let recent: Vec<&str> = value["groups"][0]["commands"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].as_str().unwrap())
        .collect();
    assert_eq!(recent, ["category:urgent", "export"]);

    let value = stdout_json(&run(&state, &["nav", "audit", "show", "--json"]));
    assert_eq!(value["state"]["activeCategory"], "urgent");
    assert_eq!(value["state"]["activeSubCategory"], "critical");
}

#[test]
fn run_unknown_command_exits_4() {
    let state = TempDir::new().unwrap();
    let output = run(&state, &["run", "audit", "launch-rockets"]);
    assert_eq!(output.status.code(), Some(4));
    assert!(!state.path().join("audit.recent-commands.json").exists());
}

#[test]
fn nav_back_returns_to_previous_sub_category() {
    let state = TempDir::new().unwrap();
    stdout_json(&run(&state, &["nav", "audit", "sub", "assigned", "--json"]));
    stdout_json(&run(&state, &["nav", "audit", "category", "completed", "--json"]));

    let value = stdout_json(&run(&state, &["nav", "audit", "back", "--json"]));
    assert_eq!(value["state"]["activeCategory"], "pending");
    assert_eq!(value["state"]["activeSubCategory"], "assigned");
    assert_eq!(value["state"]["history"], serde_json::json!([]));
}

#[test]
fn nav_filter_shows_in_breadcrumb() {
    let state = TempDir::new().unwrap();
    run(&state, &["nav", "audit", "category", "urgent"]);
    let output = run(&state, &["nav", "audit", "filter", "unresolved-only"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.starts_with("Urgent › Critiques › Non résolus uniquement"),
        "stdout: {stdout}"
    );
}

#[test]
fn nav_unknown_category_is_usage_error_and_state_unchanged() {
    let state = TempDir::new().unwrap();
    let output = run(&state, &["nav", "audit", "category", "nowhere"]);
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("pending, urgent, completed"), "stderr: {stderr}");

    let value = stdout_json(&run(&state, &["nav", "audit", "show", "--json"]));
    assert_eq!(value["state"]["activeCategory"], "pending");
}

#[test]
fn modules_keep_separate_state() {
    let state = TempDir::new().unwrap();
    run(&state, &["nav", "audit", "category", "urgent"]);

    let value = stdout_json(&run(&state, &["nav", "payments", "show", "--json"]));
    assert_eq!(value["state"]["activeCategory"], "to-validate");
    assert!(!state.path().join("payments.nav-state.json").exists());
}

// ---------------------------------------------------------------------------
// --layout
// ---------------------------------------------------------------------------

fn write_layout(dir: &Path, text: &str) -> std::path::PathBuf {
    let path = dir.join("layout.toml");
    std::fs::write(&path, text).unwrap();
    path
}

#[test]
fn custom_layout_is_used() {
    let state = TempDir::new().unwrap();
    let layout = write_layout(
        state.path(),
        r#"
module = "stock"
label = "Stock"

[[categories]]
id = "inbound"
label = "Entrées"

[[categories]]
id = "outbound"
label = "Sorties"
"#,
    );
    let value = stdout_json(
        &moa(&state)
            .args(["--layout", layout.to_str().unwrap(), "nav", "stock", "category", "outbound", "--json"])
            .output()
            .unwrap(),
    );
    assert_eq!(value["state"]["activeCategory"], "outbound");
    assert_eq!(value["breadcrumb"]["category"]["label"], "Sorties");
}

#[test]
fn invalid_layout_exits_5() {
    let state = TempDir::new().unwrap();
    let layout = write_layout(
        state.path(),
        r#"
module = "stock"
label = "Stock"
categories = []
"#,
    );
    let output = moa(&state)
        .args(["--layout", layout.to_str().unwrap(), "commands", "stock"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(5));
}

// ---------------------------------------------------------------------------
// storage
// ---------------------------------------------------------------------------

#[test]
fn unusable_state_dir_exits_6() {
    let state = TempDir::new().unwrap();
    let blocker = state.path().join("not-a-dir");
    std::fs::write(&blocker, "x").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_moa"))
        .arg("--state-dir")
        .arg(&blocker)
        .arg("--config")
        .arg(state.path().join("settings.json"))
        .args(["nav", "audit", "show"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(6));
}
