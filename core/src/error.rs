use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// Why a task was left out of the span metrics.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MalformedTask {
    #[error("task {0} is closed but has no start date")]
    MissingStart(uuid::Uuid),

    #[error("task {0} closes before it starts")]
    CloseBeforeStart(uuid::Uuid),
}

/// Property path -> messages, the shape validation failures are reported in.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationErrors {
    pub errors: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    pub fn add(&mut self, property: &str, message: impl Into<String>) {
        self.errors.entry(property.to_string()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.values().map(Vec::len).sum()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (property, messages) in &self.errors {
            for message in messages {
                if !first {
                    write!(f, "; ")?;
                }
                write!(f, "{}: {}", property, message)?;
                first = false;
            }
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum UserError {
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("User {0} does not exists.")]
    NotFound(String),

    #[error("task {0} not found")]
    TaskNotFound(uuid::Uuid),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}
