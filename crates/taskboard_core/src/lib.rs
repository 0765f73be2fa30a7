pub mod board;
pub mod clock;
pub mod config;
pub mod error;
pub mod journal;
pub mod model;
pub mod notify;
pub mod storage;
pub mod summary;
pub mod ticker;
pub mod timer;
pub mod view;

#[cfg(test)]
mod tests {
    use crate::error::AppError;
    use crate::model::{Task, TaskState};

    #[test]
    fn task_has_required_fields() {
        let task = Task::new("task-1", "demo", 3);

        assert_eq!(task.id, "task-1");
        assert_eq!(task.title, "demo");
        assert_eq!(task.points, 3);
        assert_eq!(task.state, TaskState::Idle);
        assert_eq!(task.started_at, None);
        assert_eq!(task.time_spent, 0);
        assert!(!task.is_completed());
        assert!(!task.is_timer_running());
    }

    #[test]
    fn app_error_exposes_code() {
        let err = AppError::invalid_input("missing title");
        assert_eq!(err.code(), "invalid_input");
        assert_eq!(err.to_string(), "invalid_input - missing title");
    }

    #[test]
    fn io_errors_convert_to_io_code() {
        let err: AppError = std::io::Error::other("disk full").into();
        assert_eq!(err.code(), "io_error");
    }
}
