use std::collections::HashMap;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::JoinHandle;
use std::time::Duration;

pub const DISPLAY_TICK: Duration = Duration::from_secs(1);

/// A periodic callback on a background thread. Cancelled on drop.
pub struct TickHandle {
    stop: Option<Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

impl TickHandle {
    pub fn spawn<F>(interval: Duration, mut on_tick: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        let (stop, stopped) = mpsc::channel::<()>();
        let worker = std::thread::spawn(move || {
            loop {
                match stopped.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => on_tick(),
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            }
        });

        Self {
            stop: Some(stop),
            worker: Some(worker),
        }
    }

    pub fn cancel(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(worker) = self.worker.take()
            && worker.join().is_err()
        {
            tracing::warn!("display tick callback panicked");
        }
    }
}

impl Drop for TickHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Outstanding tick handles keyed by task id. Never persisted.
#[derive(Default)]
pub struct TimerRegistry {
    handles: HashMap<String, TickHandle>,
}

impl TimerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces (and cancels) any handle already registered for `task_id`.
    pub fn register(&mut self, task_id: &str, handle: TickHandle) {
        if let Some(previous) = self.handles.insert(task_id.to_string(), handle) {
            previous.cancel();
        }
    }

    pub fn cancel(&mut self, task_id: &str) -> bool {
        match self.handles.remove(task_id) {
            Some(handle) => {
                handle.cancel();
                tracing::debug!(task_id, "cancelled display tick");
                true
            }
            None => false,
        }
    }

    pub fn cancel_all(&mut self) -> usize {
        let count = self.handles.len();
        for (_, handle) in self.handles.drain() {
            handle.cancel();
        }
        count
    }

    pub fn is_active(&self, task_id: &str) -> bool {
        self.handles.contains_key(task_id)
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}
