use crate::error::AppError;
use crate::model::{DEFAULT_USER_ID, Task, TaskBoardData};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

const STORE_FILE_NAME: &str = "data.json";
pub const STORE_ENV_VAR: &str = "TASKBOARD_STORE_PATH";

/// Loose document shape; each field falls back to its default on its own.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct StoredBoard {
    users: Option<Value>,
    tasks: Option<Value>,
    reward_items: Option<Value>,
    current_user_id: Option<Value>,
}

pub fn store_path() -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var(STORE_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    if cfg!(windows) {
        let appdata =
            std::env::var("APPDATA").map_err(|_| AppError::invalid_data("APPDATA is not set"))?;
        Ok(PathBuf::from(appdata).join("taskboard").join(STORE_FILE_NAME))
    } else {
        let home = std::env::var("HOME").map_err(|_| AppError::invalid_data("HOME is not set"))?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("taskboard")
            .join(STORE_FILE_NAME))
    }
}

/// Reads the document, merging whatever is present over the defaults.
///
/// Only an unreadable file is an error; malformed content is logged and
/// replaced by defaults.
pub fn load_board(path: &Path) -> Result<TaskBoardData, AppError> {
    if !path.exists() {
        return Ok(TaskBoardData::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|err| AppError::io(format!("{}: {}", path.display(), err)))?;
    Ok(parse_board(&content, path))
}

fn parse_board(content: &str, path: &Path) -> TaskBoardData {
    let stored = match serde_json::from_str::<StoredBoard>(content) {
        Ok(stored) => stored,
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "task board is malformed, using defaults");
            return TaskBoardData::default();
        }
    };

    TaskBoardData {
        users: array_or_empty(stored.users),
        tasks: parse_tasks(stored.tasks),
        reward_items: array_or_empty(stored.reward_items),
        current_user_id: match stored.current_user_id {
            Some(Value::String(id)) if !id.trim().is_empty() => id,
            _ => DEFAULT_USER_ID.to_string(),
        },
    }
}

fn array_or_empty(value: Option<Value>) -> Vec<Value> {
    match value {
        Some(Value::Array(items)) => items,
        _ => Vec::new(),
    }
}

fn parse_tasks(value: Option<Value>) -> Vec<Task> {
    let mut seen = HashSet::new();
    let mut tasks = Vec::new();

    for (index, entry) in array_or_empty(value).into_iter().enumerate() {
        let task: Task = match serde_json::from_value(entry) {
            Ok(task) => task,
            Err(err) => {
                tracing::warn!(index, error = %err, "skipping malformed task entry");
                continue;
            }
        };

        if !seen.insert(task.id.clone()) {
            tracing::warn!(task_id = %task.id, "skipping duplicate task id");
            continue;
        }
        tasks.push(task);
    }

    tasks
}

/// Overwrites the whole document.
pub fn save_board(path: &Path, data: &TaskBoardData) -> Result<(), AppError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let content = serde_json::to_string_pretty(data)?;
    std::fs::write(path, content)
        .map_err(|err| AppError::io(format!("{}: {}", path.display(), err)))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let permissions = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(path, permissions)?;
    }

    tracing::debug!(path = %path.display(), tasks = data.tasks.len(), "saved task board");
    Ok(())
}
