use crate::model::Task;

/// Rendering surface for the board. Implementations must tolerate being
/// called from display-tick threads.
pub trait BoardView: Send + Sync {
    fn refresh_tasks(&self, tasks: &[Task]);

    fn refresh_completed(&self, completed: &[Task]);

    fn show_elapsed(&self, task_id: &str, seconds: u64);
}

pub struct NoopView;

impl BoardView for NoopView {
    fn refresh_tasks(&self, _tasks: &[Task]) {}

    fn refresh_completed(&self, _completed: &[Task]) {}

    fn show_elapsed(&self, _task_id: &str, _seconds: u64) {}
}
