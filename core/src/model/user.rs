use serde::{Deserialize, Serialize};
use chrono::NaiveDate;
use uuid::Uuid;

use crate::model::achievement::PersonalAchievement;
use crate::model::task::Task;

pub const ROLE_USER: &str = "ROLE_USER";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct User {
    pub username: String,
    #[serde(default)]
    pub roles: Vec<String>,

    pub last_name: String,
    pub first_name: String,
    pub patronymic: String,
    pub position: String,
    pub date_of_hiring: NaiveDate,
    pub development_plan: Option<String>,

    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub achievements: Vec<PersonalAchievement>,
}

impl User {
    /// Stored roles plus `ROLE_USER`, without duplicates, in first-seen order.
    pub fn effective_roles(&self) -> Vec<String> {
        let mut roles: Vec<String> = Vec::with_capacity(self.roles.len() + 1);
        for role in self.roles.iter().map(String::as_str).chain(std::iter::once(ROLE_USER)) {
            if !roles.iter().any(|r| r == role) {
                roles.push(role.to_string());
            }
        }
        roles
    }

    pub fn full_name(&self) -> String {
        format!("{} {} {}", self.last_name, self.first_name, self.patronymic)
            .trim()
            .to_string()
    }

    pub fn task(&self, id: &Uuid) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == *id)
    }

    pub fn task_mut(&mut self, id: &Uuid) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == *id)
    }

    /// Returns false when a task with the same id is already assigned.
    pub fn add_task(&mut self, task: Task) -> bool {
        if self.tasks.iter().any(|t| t.id == task.id) {
            return false;
        }
        self.tasks.push(task);
        true
    }

    pub fn remove_task(&mut self, id: &Uuid) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != *id);
        self.tasks.len() != before
    }

    pub fn add_achievement(&mut self, achievement: PersonalAchievement) -> bool {
        if self.achievements.iter().any(|a| a.id == achievement.id) {
            return false;
        }
        self.achievements.push(achievement);
        true
    }

    pub fn remove_achievement(&mut self, id: &Uuid) -> bool {
        let before = self.achievements.len();
        self.achievements.retain(|a| a.id != *id);
        self.achievements.len() != before
    }
}

#[cfg(test)]
pub(crate) fn sample_user(username: &str) -> User {
    User {
        username: username.to_string(),
        roles: Vec::new(),
        last_name: "Ivanov".to_string(),
        first_name: "Ivan".to_string(),
        patronymic: "Ivanovich".to_string(),
        position: "Developer".to_string(),
        date_of_hiring: NaiveDate::from_ymd_opt(2021, 3, 15).unwrap(),
        development_plan: None,
        tasks: Vec::new(),
        achievements: Vec::new(),
    }
}
