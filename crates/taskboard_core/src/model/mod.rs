mod task;

pub use task::{DEFAULT_USER_ID, Task, TaskBoardData, TaskState};
