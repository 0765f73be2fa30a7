use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

const T0: i64 = 1_700_000_000_000;

fn temp_path(file_name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("taskboard-{nanos}-{file_name}"))
}

fn run(store_path: &Path, journal_dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_taskboard"))
        .args(args)
        .env("TASKBOARD_STORE_PATH", store_path)
        .env("TASKBOARD_CONFIG_PATH", temp_path("no-config.json"))
        .env("TASKBOARD_JOURNAL_DIR", journal_dir)
        .env("TASKBOARD_DISABLE_NOTIFICATIONS", "1")
        .env("TASKBOARD_CLOCK_MS", T0.to_string())
        .output()
        .expect("failed to run taskboard")
}

fn journal_notes(journal_dir: &Path) -> Vec<PathBuf> {
    match std::fs::read_dir(journal_dir.join("日记")) {
        Ok(entries) => entries.map(|entry| entry.unwrap().path()).collect(),
        Err(_) => Vec::new(),
    }
}

#[test]
fn summary_without_completions_writes_nothing() {
    let store_path = temp_path("cli-summary-empty.json");
    let journal_dir = temp_path("journal-empty");

    run(&store_path, &journal_dir, &["add", "still open"]);
    let output = run(&store_path, &journal_dir, &["summary"]);
    std::fs::remove_file(&store_path).ok();

    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("nothing to summarize"));
    assert!(!journal_dir.exists());
}

#[test]
fn summary_appends_completed_tasks_to_daily_note() {
    let store_path = temp_path("cli-summary.json");
    let journal_dir = temp_path("journal");
    let id = T0.to_string();

    run(&store_path, &journal_dir, &["add", "Write report", "--points", "10"]);
    run(&store_path, &journal_dir, &["toggle", &id]);
    let first = run(&store_path, &journal_dir, &["summary", "--json"]);
    let second = run(&store_path, &journal_dir, &["summary"]);

    let notes = journal_notes(&journal_dir);
    let content = notes
        .first()
        .map(|note| std::fs::read_to_string(note).unwrap())
        .unwrap_or_default();
    std::fs::remove_file(&store_path).ok();
    std::fs::remove_dir_all(&journal_dir).ok();

    assert!(first.status.success());
    let payload: serde_json::Value = serde_json::from_slice(&first.stdout).unwrap();
    assert_eq!(payload["outcome"], "written");
    assert_eq!(payload["tasks"], 1);
    assert!(second.status.success());

    assert_eq!(notes.len(), 1);
    assert!(notes[0].extension().is_some_and(|ext| ext == "md"));
    assert_eq!(content.matches("## Task summary").count(), 2);
    assert!(content.contains("- [x] Write report · 10 pts · 00:00:00"));
    assert!(content.contains("\n\n## Task summary"));
}

#[test]
fn summary_respects_disabled_journal() {
    let store_path = temp_path("cli-summary-disabled.json");
    let journal_dir = temp_path("journal-disabled");
    let id = T0.to_string();

    run(&store_path, &journal_dir, &["add", "demo"]);
    run(&store_path, &journal_dir, &["toggle", &id]);
    let output = run(
        &store_path,
        &journal_dir,
        &["summary", "--config-override", "journal.enabled=false"],
    );
    std::fs::remove_file(&store_path).ok();

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("disabled"));
    assert!(!journal_dir.exists());
}

#[test]
fn summary_uses_configured_folder() {
    let store_path = temp_path("cli-summary-folder.json");
    let journal_dir = temp_path("journal-folder");
    let id = T0.to_string();

    run(&store_path, &journal_dir, &["add", "demo"]);
    run(&store_path, &journal_dir, &["toggle", &id]);
    let output = run(
        &store_path,
        &journal_dir,
        &[
            "summary",
            "--config-override",
            "journal.folder=Daily",
            "--config-override",
            "journal.format=YYYY_MM_DD",
        ],
    );
    let written: Vec<PathBuf> = std::fs::read_dir(journal_dir.join("Daily"))
        .map(|entries| entries.map(|entry| entry.unwrap().path()).collect())
        .unwrap_or_default();
    std::fs::remove_file(&store_path).ok();
    std::fs::remove_dir_all(&journal_dir).ok();

    assert!(output.status.success());
    assert_eq!(written.len(), 1);
    let name = written[0].file_name().unwrap().to_string_lossy().to_string();
    assert!(name.ends_with(".md"));
    assert_eq!(name.matches('_').count(), 2);
}

#[test]
fn summary_rejects_bad_override() {
    let store_path = temp_path("cli-summary-bad-override.json");
    let journal_dir = temp_path("journal-bad-override");

    let output = run(
        &store_path,
        &journal_dir,
        &["summary", "--config-override", "journal.enabled=maybe"],
    );

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("ERROR: invalid_input"));
}
