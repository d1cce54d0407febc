use serde::{Serialize, Deserialize};
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::error::ValidationErrors;
use crate::metrics::PerformanceReport;
use crate::model::achievement::PersonalAchievement;
use crate::model::task::Task;
use crate::model::user::User;

const USERNAME_MAX_LEN: usize = 180;
const NAME_MAX_LEN: usize = 255;
const DEVELOPMENT_PLAN_MAX_LEN: usize = 3000;

/// Registration / profile update payload.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub username: String,
    #[serde(default)]
    pub roles: Vec<String>,
    pub last_name: String,
    pub first_name: String,
    pub patronymic: String,
    pub position: String,
    pub date_of_hiring: NaiveDate,
    #[serde(default)]
    pub development_plan: Option<String>,
}

impl UserDto {
    /// Field-level checks only; uniqueness is checked against the repository.
    pub fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::default();

        let username = self.username.trim();
        if username.is_empty() {
            errors.add("username", "This value should not be blank.");
        } else if username.chars().count() > USERNAME_MAX_LEN {
            errors.add("username", format!("This value is too long. It should have {} characters or less.", USERNAME_MAX_LEN));
        }

        for (property, value) in [
            ("lastName", &self.last_name),
            ("firstName", &self.first_name),
            ("patronymic", &self.patronymic),
            ("position", &self.position),
        ] {
            if value.trim().is_empty() {
                errors.add(property, "This value should not be blank.");
            } else if value.chars().count() > NAME_MAX_LEN {
                errors.add(property, format!("This value is too long. It should have {} characters or less.", NAME_MAX_LEN));
            }
        }

        if let Some(plan) = &self.development_plan {
            if plan.chars().count() > DEVELOPMENT_PLAN_MAX_LEN {
                errors.add("developmentPlan", format!("This value is too long. It should have {} characters or less.", DEVELOPMENT_PLAN_MAX_LEN));
            }
        }

        errors
    }

    pub fn into_user(self) -> User {
        User {
            username: self.username.trim().to_string(),
            roles: self.roles,
            last_name: self.last_name,
            first_name: self.first_name,
            patronymic: self.patronymic,
            position: self.position,
            date_of_hiring: self.date_of_hiring,
            development_plan: self.development_plan,
            tasks: Vec::new(),
            achievements: Vec::new(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UserAuthDto {
    pub username: String,
    pub roles: Vec<String>,
}

/// Short status reply for write operations, e.g. `Sync` / `Sync 12`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Answer {
    pub status: String,
    #[serde(rename = "messageAnswer")]
    pub message: String,
}

impl Answer {
    pub fn new(status: &str, message: impl Into<String>) -> Self {
        Self {
            status: status.to_string(),
            message: message.into(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskDto {
    pub id: Uuid,
    pub name: String,
    pub status: String,
    pub is_open: bool,
    pub project_id: Option<u32>,
    pub start_date: Option<DateTime<Utc>>,
    pub close_date: Option<DateTime<Utc>>,
    pub evaluation: Option<f64>,
    /// Working hours between start and close; None while open or malformed.
    pub working_hours: Option<f64>,
}

impl TaskDto {
    pub fn from_entity(task: Task, working_hours: Option<f64>) -> Self {
        Self {
            id: task.id,
            is_open: task.status.is_open(),
            status: task.status.label().to_string(),
            name: task.name,
            project_id: task.project_id,
            start_date: task.start_date,
            close_date: task.close_date,
            evaluation: task.evaluation.map(|e| e.value),
            working_hours,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserInfoDto {
    pub last_name: String,
    pub first_name: String,
    pub patronymic: String,
    pub position: String,
    pub date_of_hiring: NaiveDate,
    pub development_plan: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserCurrentDto {
    pub username: String,
    pub roles: Vec<String>,
    pub user_info: UserInfoDto,
    pub tasks: Vec<TaskDto>,
    pub achievements: Vec<PersonalAchievement>,
    #[serde(flatten)]
    pub metrics: PerformanceReport,
}

impl UserCurrentDto {
    pub fn from_entity(user: User, tasks: Vec<TaskDto>, metrics: PerformanceReport) -> Self {
        let roles = user.effective_roles();
        Self {
            username: user.username,
            roles,
            user_info: UserInfoDto {
                last_name: user.last_name,
                first_name: user.first_name,
                patronymic: user.patronymic,
                position: user.position,
                date_of_hiring: user.date_of_hiring,
                development_plan: user.development_plan,
            },
            tasks,
            achievements: user.achievements,
            metrics,
        }
    }
}

#[cfg(test)]
pub(crate) fn sample_dto(username: &str) -> UserDto {
    UserDto {
        username: username.to_string(),
        roles: Vec::new(),
        last_name: "Petrova".to_string(),
        first_name: "Anna".to_string(),
        patronymic: "Sergeevna".to_string(),
        position: "QA engineer".to_string(),
        date_of_hiring: NaiveDate::from_ymd_opt(2022, 9, 1).unwrap(),
        development_plan: Some("Automate regression suite".to_string()),
    }
}
