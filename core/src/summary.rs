//! Status totals over a task listing.

use crate::model::{GeneratedTask, TaskStatus};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskSummary {
    pub total: usize,
    pub pending: usize,
    pub completed: usize,
    pub skipped: usize,
    /// Latest completion. Falls back to the execution time for completed
    /// tasks with no recorded completion.
    pub last_completed_at: Option<NaiveDateTime>,
}

impl TaskSummary {
    pub fn from_tasks(tasks: &[GeneratedTask]) -> Self {
        let mut summary = Self {
            total: tasks.len(),
            ..Self::default()
        };
        for task in tasks {
            match task.status {
                TaskStatus::Pending => summary.pending += 1,
                TaskStatus::Completed => {
                    summary.completed += 1;
                    let at = task.completed_at.unwrap_or(task.exec_at);
                    if summary.last_completed_at.map_or(true, |prev| at > prev) {
                        summary.last_completed_at = Some(at);
                    }
                }
                TaskStatus::Skipped => summary.skipped += 1,
            }
        }
        summary
    }
}
