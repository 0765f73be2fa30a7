use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub const DEFAULT_USER_ID: &str = "local";

/// Timer/completion state layered over the always-present task fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskState {
    Idle,
    Running {
        timer_start_time: i64,
    },
    Completed {
        completed_at: i64,
        completed_by: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredTask", into = "StoredTask")]
pub struct Task {
    pub id: String,
    pub title: String,
    pub points: i64,
    /// First time the timer was ever started for this task.
    pub started_at: Option<i64>,
    /// Accumulated seconds, excluding any in-flight running interval.
    pub time_spent: u64,
    pub state: TaskState,
}

impl Task {
    pub fn new<I: Into<String>, T: Into<String>>(id: I, title: T, points: i64) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            points,
            started_at: None,
            time_spent: 0,
            state: TaskState::Idle,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self.state, TaskState::Completed { .. })
    }

    pub fn is_timer_running(&self) -> bool {
        matches!(self.state, TaskState::Running { .. })
    }

    pub fn timer_start_time(&self) -> Option<i64> {
        match self.state {
            TaskState::Running { timer_start_time } => Some(timer_start_time),
            _ => None,
        }
    }

    pub fn completed_at(&self) -> Option<i64> {
        match self.state {
            TaskState::Completed { completed_at, .. } => Some(completed_at),
            _ => None,
        }
    }

    pub fn completed_by(&self) -> Option<&str> {
        match &self.state {
            TaskState::Completed { completed_by, .. } => Some(completed_by),
            _ => None,
        }
    }
}

/// Flat on-disk shape of a task.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredTask {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default, deserialize_with = "lenient_points")]
    points: i64,
    #[serde(default)]
    completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    completed_by: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_millis",
        skip_serializing_if = "Option::is_none"
    )]
    completed_at: Option<i64>,
    #[serde(
        default,
        deserialize_with = "lenient_millis",
        skip_serializing_if = "Option::is_none"
    )]
    started_at: Option<i64>,
    #[serde(default, deserialize_with = "lenient_seconds")]
    time_spent: u64,
    #[serde(default)]
    is_timer_running: bool,
    #[serde(
        default,
        deserialize_with = "lenient_millis",
        skip_serializing_if = "Option::is_none"
    )]
    timer_start_time: Option<i64>,
}

impl From<StoredTask> for Task {
    fn from(stored: StoredTask) -> Self {
        let state = if stored.completed {
            TaskState::Completed {
                completed_at: stored.completed_at.unwrap_or_default(),
                completed_by: stored.completed_by.unwrap_or_default(),
            }
        } else {
            match (stored.is_timer_running, stored.timer_start_time) {
                (true, Some(timer_start_time)) => TaskState::Running { timer_start_time },
                _ => TaskState::Idle,
            }
        };

        Self {
            id: stored.id,
            title: stored.title,
            points: stored.points,
            started_at: stored.started_at,
            time_spent: stored.time_spent,
            state,
        }
    }
}

impl From<Task> for StoredTask {
    fn from(task: Task) -> Self {
        let mut stored = StoredTask {
            id: task.id,
            title: task.title,
            points: task.points,
            completed: false,
            completed_by: None,
            completed_at: None,
            started_at: task.started_at,
            time_spent: task.time_spent,
            is_timer_running: false,
            timer_start_time: None,
        };

        match task.state {
            TaskState::Idle => {}
            TaskState::Running { timer_start_time } => {
                stored.is_timer_running = true;
                stored.timer_start_time = Some(timer_start_time);
            }
            TaskState::Completed {
                completed_at,
                completed_by,
            } => {
                stored.completed = true;
                stored.completed_at = Some(completed_at);
                stored.completed_by = Some(completed_by);
            }
        }

        stored
    }
}

fn finite_number(value: Option<Value>) -> Option<f64> {
    value
        .as_ref()
        .and_then(Value::as_f64)
        .filter(|number| number.is_finite())
}

// Null, strings and negative values count as "no time recorded".
fn lenient_seconds<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(finite_number(value)
        .filter(|seconds| *seconds > 0.0)
        .map(|seconds| seconds.floor() as u64)
        .unwrap_or(0))
}

fn lenient_millis<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(finite_number(value).map(|millis| millis.floor() as i64))
}

fn lenient_points<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(finite_number(value).map(|points| points as i64).unwrap_or(0))
}

/// Root persisted document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TaskBoardData {
    pub users: Vec<Value>,
    pub tasks: Vec<Task>,
    pub reward_items: Vec<Value>,
    pub current_user_id: String,
}

impl Default for TaskBoardData {
    fn default() -> Self {
        Self {
            users: Vec::new(),
            tasks: Vec::new(),
            reward_items: Vec::new(),
            current_user_id: DEFAULT_USER_ID.to_string(),
        }
    }
}
