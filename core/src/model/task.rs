use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Tracker status of a task. Only `New` and `InProgress` are open.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(from = "String", into = "String")]
pub enum TaskStatus {
    New,
    InProgress,
    Other(String),
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::New
    }
}

impl TaskStatus {
    pub fn is_open(&self) -> bool {
        matches!(self, TaskStatus::New | TaskStatus::InProgress)
    }

    pub fn label(&self) -> &str {
        match self {
            TaskStatus::New => "New",
            TaskStatus::InProgress => "InProgress",
            TaskStatus::Other(label) => label,
        }
    }
}

impl From<String> for TaskStatus {
    fn from(label: String) -> Self {
        // The tracker reports Russian labels, the API English ones.
        match label.trim() {
            "New" | "new" | "Новая" => TaskStatus::New,
            "InProgress" | "in_progress" | "In Progress" | "В работе" => TaskStatus::InProgress,
            _ => TaskStatus::Other(label),
        }
    }
}

impl From<&str> for TaskStatus {
    fn from(label: &str) -> Self {
        TaskStatus::from(label.to_string())
    }
}

impl From<TaskStatus> for String {
    fn from(status: TaskStatus) -> Self {
        status.label().to_string()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub value: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Task {
    pub id: Uuid,
    pub name: String,
    pub status: TaskStatus,
    pub project_id: Option<u32>,

    pub start_date: Option<DateTime<Utc>>,
    // None while the task is still being worked on
    pub close_date: Option<DateTime<Utc>>,

    pub evaluation: Option<Evaluation>,
}

impl Task {
    pub fn new(name: String, start_date: Option<DateTime<Utc>>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            status: TaskStatus::default(),
            project_id: None,
            start_date,
            close_date: None,
            evaluation: None,
        }
    }

    pub fn close(&mut self, at: DateTime<Utc>, status: TaskStatus) {
        self.close_date = Some(at);
        self.status = status;
    }

    pub fn evaluate(&mut self, value: f64) {
        self.evaluation = Some(Evaluation { value });
    }
}
