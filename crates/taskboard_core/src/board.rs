//! The task store: owns the persisted document, the clock, the view and the
//! process-local display ticks for running timers.

use crate::clock::Clock;
use crate::error::AppError;
use crate::model::{Task, TaskBoardData};
use crate::storage::json_store;
use crate::ticker::{DISPLAY_TICK, TickHandle, TimerRegistry};
use crate::view::BoardView;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

pub struct Board {
    path: PathBuf,
    data: TaskBoardData,
    timers: TimerRegistry,
    clock: Arc<dyn Clock>,
    view: Arc<dyn BoardView>,
    tick_interval: Duration,
}

impl Board {
    pub fn open<P: Into<PathBuf>>(
        path: P,
        clock: Arc<dyn Clock>,
        view: Arc<dyn BoardView>,
    ) -> Result<Self, AppError> {
        let path = path.into();
        let data = json_store::load_board(&path)?;
        tracing::debug!(path = %path.display(), tasks = data.tasks.len(), "opened task board");

        Ok(Self {
            path,
            data,
            timers: TimerRegistry::new(),
            clock,
            view,
            tick_interval: DISPLAY_TICK,
        })
    }

    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn data(&self) -> &TaskBoardData {
        &self.data
    }

    pub fn tasks(&self) -> &[Task] {
        &self.data.tasks
    }

    pub fn completed_tasks(&self) -> Vec<Task> {
        self.data
            .tasks
            .iter()
            .filter(|task| task.is_completed())
            .cloned()
            .collect()
    }

    pub fn current_user_id(&self) -> &str {
        &self.data.current_user_id
    }

    pub fn now_ms(&self) -> i64 {
        self.clock.now_ms()
    }

    pub fn task(&self, id: &str) -> Result<&Task, AppError> {
        let index = self.index_of(id)?;
        Ok(&self.data.tasks[index])
    }

    pub fn display_elapsed(&self, id: &str) -> Result<u64, AppError> {
        Ok(self.task(id)?.display_elapsed(self.clock.now_ms()))
    }

    pub fn active_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn is_ticking(&self, id: &str) -> bool {
        self.timers.is_active(id.trim())
    }

    pub fn add_task(&mut self, title: &str, points: i64) -> Result<Task, AppError> {
        let trimmed = title.trim();
        if trimmed.is_empty() {
            return Err(AppError::invalid_input("title is required"));
        }

        let task = Task::new(self.next_id(), trimmed, points);
        self.data.tasks.push(task.clone());
        self.save()?;
        tracing::debug!(task_id = %task.id, points, "added task");
        self.view.refresh_tasks(&self.data.tasks);

        Ok(task)
    }

    pub fn start_timer(&mut self, id: &str) -> Result<Task, AppError> {
        let index = self.index_of(id)?;
        let now_ms = self.clock.now_ms();
        let started = self.data.tasks[index].start(now_ms)?;
        let task = self.data.tasks[index].clone();
        if !started {
            return Ok(task);
        }

        self.save()?;
        self.register_tick(&task);
        tracing::debug!(task_id = %task.id, "timer started");
        self.view.refresh_tasks(&self.data.tasks);

        Ok(task)
    }

    /// No-op for a task whose timer is not running.
    pub fn pause_timer(&mut self, id: &str) -> Result<Task, AppError> {
        let index = self.index_of(id)?;
        let now_ms = self.clock.now_ms();
        let task_id = self.data.tasks[index].id.clone();
        self.timers.cancel(&task_id);

        if !self.data.tasks[index].pause(now_ms) {
            return Ok(self.data.tasks[index].clone());
        }

        self.save()?;
        let task = self.data.tasks[index].clone();
        tracing::debug!(task_id = %task.id, time_spent = task.time_spent, "timer paused");
        self.view.refresh_tasks(&self.data.tasks);

        Ok(task)
    }

    pub fn reset_timer(&mut self, id: &str) -> Result<Task, AppError> {
        let index = self.index_of(id)?;
        let task_id = self.data.tasks[index].id.clone();
        self.timers.cancel(&task_id);
        self.data.tasks[index].reset();

        self.save()?;
        let task = self.data.tasks[index].clone();
        tracing::debug!(task_id = %task.id, "timer reset");
        self.view.refresh_tasks(&self.data.tasks);

        Ok(task)
    }

    pub fn toggle_task(&mut self, id: &str) -> Result<Task, AppError> {
        let index = self.index_of(id)?;
        let now_ms = self.clock.now_ms();
        let task_id = self.data.tasks[index].id.clone();
        self.timers.cancel(&task_id);

        let user_id = self.data.current_user_id.clone();
        self.data.tasks[index].toggle(now_ms, &user_id);

        self.save()?;
        let task = self.data.tasks[index].clone();
        tracing::debug!(task_id = %task.id, completed = task.is_completed(), "task toggled");
        self.view.refresh_tasks(&self.data.tasks);
        self.view.refresh_completed(&self.completed_tasks());

        Ok(task)
    }

    pub fn delete_task(&mut self, id: &str) -> Result<Task, AppError> {
        let index = self.index_of(id)?;
        self.remove_at(index)
    }

    /// Like [`Board::delete_task`], restricted to completed tasks.
    pub fn delete_completed_task(&mut self, id: &str) -> Result<Task, AppError> {
        let index = self.index_of(id)?;
        if !self.data.tasks[index].is_completed() {
            return Err(AppError::invalid_input("task is not completed"));
        }
        self.remove_at(index)
    }

    pub fn clear_completed_tasks(&mut self) -> Result<Vec<Task>, AppError> {
        let (removed, kept): (Vec<Task>, Vec<Task>) = std::mem::take(&mut self.data.tasks)
            .into_iter()
            .partition(Task::is_completed);
        self.data.tasks = kept;

        for task in &removed {
            self.timers.cancel(&task.id);
        }

        self.save()?;
        tracing::debug!(removed = removed.len(), "cleared completed tasks");
        self.view.refresh_tasks(&self.data.tasks);
        self.view.refresh_completed(&[]);

        Ok(removed)
    }

    pub fn set_current_user(&mut self, user_id: &str) -> Result<(), AppError> {
        let trimmed = user_id.trim();
        if trimmed.is_empty() {
            return Err(AppError::invalid_input("user id is required"));
        }

        self.data.current_user_id = trimmed.to_string();
        self.save()
    }

    /// Starts display ticks for every task whose timer is running.
    pub fn watch_running(&mut self) -> usize {
        let running: Vec<Task> = self
            .data
            .tasks
            .iter()
            .filter(|task| task.is_timer_running())
            .cloned()
            .collect();

        for task in &running {
            self.register_tick(task);
        }
        running.len()
    }

    /// Cancels every outstanding display tick, then persists.
    pub fn close(mut self) -> Result<(), AppError> {
        let cancelled = self.timers.cancel_all();
        tracing::debug!(cancelled, "closing task board");
        self.save()
    }

    fn remove_at(&mut self, index: usize) -> Result<Task, AppError> {
        let task_id = self.data.tasks[index].id.clone();
        self.timers.cancel(&task_id);
        let removed = self.data.tasks.remove(index);

        self.save()?;
        tracing::debug!(task_id = %removed.id, "deleted task");
        self.view.refresh_tasks(&self.data.tasks);
        if removed.is_completed() {
            self.view.refresh_completed(&self.completed_tasks());
        }

        Ok(removed)
    }

    // The tick reads a snapshot; only pause/toggle ever write `time_spent`.
    fn register_tick(&mut self, task: &Task) {
        let snapshot = task.clone();
        let clock = Arc::clone(&self.clock);
        let view = Arc::clone(&self.view);
        let handle = TickHandle::spawn(self.tick_interval, move || {
            view.show_elapsed(&snapshot.id, snapshot.display_elapsed(clock.now_ms()));
        });
        self.timers.register(&task.id, handle);
    }

    fn index_of(&self, id: &str) -> Result<usize, AppError> {
        let trimmed_id = id.trim();
        if trimmed_id.is_empty() {
            return Err(AppError::invalid_input("id is required"));
        }

        self.data
            .tasks
            .iter()
            .position(|task| task.id == trimmed_id)
            .ok_or_else(AppError::task_not_found)
    }

    fn next_id(&self) -> String {
        let mut candidate = self.clock.now_ms();
        while self
            .data
            .tasks
            .iter()
            .any(|task| task.id == candidate.to_string())
        {
            candidate += 1;
        }
        candidate.to_string()
    }

    fn save(&self) -> Result<(), AppError> {
        json_store::save_board(&self.path, &self.data)
    }
}
