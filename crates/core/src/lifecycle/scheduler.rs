//! In-process task queue
//!
//! Tasks are ordered by due time. Identical entries collapse, and every task
//! kind is safe to run more than once.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TaskKind {
    Reminder,
    Terminate,
    Cleanup,
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Reminder => "reminder",
            Self::Terminate => "terminate",
            Self::Cleanup => "cleanup",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScheduledTask {
    pub run_at: DateTime<Utc>,
    pub booking_id: i64,
    pub kind: TaskKind,
}

#[derive(Clone, Default)]
pub struct TaskQueue {
    tasks: Arc<Mutex<BTreeSet<ScheduledTask>>>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// `false` if the same task was already queued
    pub async fn push(&self, task: ScheduledTask) -> bool {
        self.tasks.lock().await.insert(task)
    }

    /// Remove and return every task due at or before `now`, oldest first
    pub async fn take_due(&self, now: DateTime<Utc>) -> Vec<ScheduledTask> {
        let mut tasks = self.tasks.lock().await;
        let mut due = Vec::new();
        while let Some(task) = tasks.first().copied() {
            if task.run_at > now {
                break;
            }
            tasks.remove(&task);
            due.push(task);
        }
        due
    }

    pub async fn pending_for(&self, booking_id: i64) -> Vec<ScheduledTask> {
        self.tasks
            .lock()
            .await
            .iter()
            .filter(|task| task.booking_id == booking_id)
            .copied()
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.tasks.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tasks.lock().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::at;

    fn task(hour: u32, minute: u32, kind: TaskKind) -> ScheduledTask {
        ScheduledTask {
            run_at: at(hour, minute),
            booking_id: 100,
            kind,
        }
    }

    #[tokio::test]
    async fn duplicates_collapse() {
        let queue = TaskQueue::new();
        assert!(queue.push(task(10, 30, TaskKind::Terminate)).await);
        assert!(!queue.push(task(10, 30, TaskKind::Terminate)).await);
        assert!(queue.push(task(10, 31, TaskKind::Cleanup)).await);
        assert_eq!(queue.len().await, 2);
    }

    #[tokio::test]
    async fn take_due_returns_in_time_order_and_leaves_the_rest() {
        let queue = TaskQueue::new();
        queue.push(task(10, 31, TaskKind::Cleanup)).await;
        queue.push(task(10, 25, TaskKind::Reminder)).await;
        queue.push(task(10, 30, TaskKind::Terminate)).await;

        let due = queue.take_due(at(10, 30)).await;
        assert_eq!(
            due.iter().map(|task| task.kind).collect::<Vec<_>>(),
            vec![TaskKind::Reminder, TaskKind::Terminate]
        );
        assert_eq!(queue.pending_for(100).await, vec![task(10, 31, TaskKind::Cleanup)]);
        assert!(queue.take_due(at(10, 0)).await.is_empty());
    }
}
