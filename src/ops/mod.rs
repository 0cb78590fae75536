pub mod due;
pub mod export;
pub mod history;
pub mod recurring;
pub mod reminder;
pub mod subtask_ops;
pub mod tag_ops;
pub mod task_ops;
pub mod view;
