use std::path::PathBuf;
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

fn run(store_path: &PathBuf, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_taskboard"))
        .args(args)
        .env("TASKBOARD_STORE_PATH", store_path)
        .env("TASKBOARD_CONFIG_PATH", temp_path("no-config.json"))
        .env("TASKBOARD_DISABLE_NOTIFICATIONS", "1")
        .env("TASKBOARD_CLOCK_MS", T0.to_string())
        .output()
        .expect("failed to run taskboard")
}

fn write_store(path: &PathBuf, tasks: serde_json::Value) {
    let content = serde_json::json!({
        "users": [],
        "tasks": tasks,
        "rewardItems": [],
        "currentUserId": "alice"
    });
    std::fs::write(path, serde_json::to_string_pretty(&content).unwrap()).unwrap();
}

fn three_tasks() -> serde_json::Value {
    serde_json::json!([
        {
            "id": "1",
            "title": "done one",
            "points": 3,
            "completed": true,
            "completedAt": T0 - 60_000,
            "completedBy": "alice",
            "timeSpent": 120,
            "isTimerRunning": false
        },
        {
            "id": "2",
            "title": "open",
            "points": 1,
            "completed": false,
            "timeSpent": 5,
            "isTimerRunning": false
        },
        {
            "id": "3",
            "title": "done two",
            "points": 2,
            "completed": true,
            "completedAt": T0 - 30_000,
            "completedBy": "bob",
            "timeSpent": 60,
            "isTimerRunning": false
        }
    ])
}

#[test]
fn clear_completed_keeps_only_open_tasks() {
    let store_path = temp_path("cli-clear.json");
    write_store(&store_path, three_tasks());

    let output = run(&store_path, &["clear-completed"]);
    let stored: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&store_path).unwrap()).unwrap();
    std::fs::remove_file(&store_path).ok();

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Cleared 2 completed task(s)"));
    let tasks = stored["tasks"].as_array().unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0]["id"], "2");
    assert_eq!(tasks[0]["timeSpent"], 5);
    assert_eq!(stored["currentUserId"], "alice");
}

#[test]
fn completed_lists_only_completed_records() {
    let store_path = temp_path("cli-completed.json");
    write_store(&store_path, three_tasks());

    let output = run(&store_path, &["completed", "--json"]);
    std::fs::remove_file(&store_path).ok();

    assert!(output.status.success());
    let payload: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let ids: Vec<&str> = payload
        .as_array()
        .unwrap()
        .iter()
        .map(|task| task["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, ["1", "3"]);
}

#[test]
fn delete_completed_rejects_open_task() {
    let store_path = temp_path("cli-delete-completed.json");
    write_store(&store_path, three_tasks());

    let rejected = run(&store_path, &["delete-completed", "2"]);
    let deleted = run(&store_path, &["delete-completed", "3"]);
    let stored: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&store_path).unwrap()).unwrap();
    std::fs::remove_file(&store_path).ok();

    assert!(!rejected.status.success());
    assert!(String::from_utf8_lossy(&rejected.stderr).contains("task is not completed"));
    assert!(deleted.status.success());
    assert_eq!(stored["tasks"].as_array().unwrap().len(), 2);
}

#[test]
fn delete_removes_task() {
    let store_path = temp_path("cli-delete.json");
    write_store(&store_path, three_tasks());

    let output = run(&store_path, &["delete", "2"]);
    let stored: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&store_path).unwrap()).unwrap();
    std::fs::remove_file(&store_path).ok();

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Deleted task: open (2)"));
    assert!(stored["tasks"].as_array().unwrap().iter().all(|task| task["id"] != "2"));
}

#[test]
fn user_command_attributes_future_completions() {
    let store_path = temp_path("cli-user.json");
    write_store(&store_path, three_tasks());

    assert!(run(&store_path, &["user", "carol"]).status.success());
    assert!(run(&store_path, &["toggle", "2"]).status.success());
    let stored: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&store_path).unwrap()).unwrap();
    std::fs::remove_file(&store_path).ok();

    assert_eq!(stored["currentUserId"], "carol");
    assert_eq!(stored["tasks"][1]["completedBy"], "carol");
    assert_eq!(stored["tasks"][1]["completedAt"], T0);
}

#[test]
fn malformed_store_falls_back_to_defaults() {
    let store_path = temp_path("cli-malformed.json");
    std::fs::write(&store_path, "{ definitely not json").unwrap();

    let output = run(&store_path, &["list", "--json"]);
    std::fs::remove_file(&store_path).ok();

    assert!(output.status.success());
    let payload: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(payload, serde_json::json!([]));
}
