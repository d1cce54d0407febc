use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use crate::error::{UserError, ValidationErrors};
use crate::model::achievement::PersonalAchievement;
use crate::model::task::{Task, TaskStatus};
use crate::model::user::User;
use crate::repository::UserRepository;
use crate::service::dto::{Answer, UserAuthDto, UserDto};

pub type Result<T> = std::result::Result<T, UserError>;

pub struct UserService<R: UserRepository> {
    repo: R,
}

impl<R: UserRepository> UserService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    pub fn register(&self, dto: UserDto) -> Result<UserAuthDto> {
        let mut errors = dto.validate();
        let username = dto.username.trim().to_string();
        if !username.is_empty() && self.repo.get(&username)?.is_some() {
            errors.add("username", format!("User {} already exists.", username));
        }
        if !errors.is_empty() {
            return Err(UserError::Validation(errors));
        }

        let user = self.repo.create(dto.into_user())?;
        info!(username = %user.username, "registered user");
        Ok(UserAuthDto {
            roles: user.effective_roles(),
            username: user.username,
        })
    }

    /// Overwrites the profile fields of an existing user; tasks and achievements are kept.
    pub fn update(&self, dto: UserDto) -> Result<Answer> {
        let username = dto.username.trim().to_string();
        let Some(mut user) = self.repo.get(&username)? else {
            return Err(UserError::NotFound(username));
        };
        let errors = dto.validate();
        if !errors.is_empty() {
            return Err(UserError::Validation(errors));
        }

        let changed = dto.into_user();
        user.last_name = changed.last_name;
        user.first_name = changed.first_name;
        user.patronymic = changed.patronymic;
        user.position = changed.position;
        user.date_of_hiring = changed.date_of_hiring;
        user.development_plan = changed.development_plan;
        if !changed.roles.is_empty() {
            user.roles = changed.roles;
        }
        self.repo.update(&user)?;

        info!(username = %user.username, "updated user profile");
        Ok(Answer::new("Change", "User Info change"))
    }

    pub fn get(&self, username: &str) -> Result<User> {
        self.repo
            .get(username)?
            .ok_or_else(|| UserError::NotFound(username.to_string()))
    }

    pub fn list(&self) -> Result<Vec<User>> {
        Ok(self.repo.list()?)
    }

    pub fn remove(&self, username: &str) -> Result<()> {
        if self.repo.get(username)?.is_none() {
            return Err(UserError::NotFound(username.to_string()));
        }
        self.repo.delete(username)?;
        info!(username, "removed user");
        Ok(())
    }

    /// Returns false when the task was already assigned.
    pub fn assign_task(&self, username: &str, task: Task) -> Result<bool> {
        let mut user = self.get(username)?;
        if let (Some(start), Some(close)) = (task.start_date, task.close_date) {
            check_close_after_start(start, close)?;
        }
        if let Some(evaluation) = task.evaluation {
            check_finite("evaluation", evaluation.value)?;
        }
        let added = user.add_task(task);
        if added {
            self.repo.update(&user)?;
        }
        Ok(added)
    }

    pub fn close_task(&self, username: &str, id: &Uuid, at: DateTime<Utc>, status: TaskStatus) -> Result<()> {
        self.modify_task(username, id, |task| {
            if let Some(start) = task.start_date {
                check_close_after_start(start, at)?;
            }
            task.close(at, status);
            Ok(())
        })
    }

    pub fn start_task(&self, username: &str, id: &Uuid, at: DateTime<Utc>) -> Result<()> {
        self.modify_task(username, id, |task| {
            if let Some(close) = task.close_date {
                check_close_after_start(at, close)?;
            }
            task.start_date = Some(at);
            task.status = TaskStatus::InProgress;
            Ok(())
        })
    }

    pub fn evaluate_task(&self, username: &str, id: &Uuid, value: f64) -> Result<()> {
        check_finite("evaluation", value)?;
        self.modify_task(username, id, |task| {
            task.evaluate(value);
            Ok(())
        })
    }

    pub fn remove_task(&self, username: &str, id: &Uuid) -> Result<()> {
        let mut user = self.get(username)?;
        if !user.remove_task(id) {
            return Err(UserError::TaskNotFound(*id));
        }
        self.repo.update(&user)?;
        Ok(())
    }

    pub fn add_achievement(&self, username: &str, achievement: PersonalAchievement) -> Result<()> {
        check_finite("value", achievement.value)?;
        let mut user = self.get(username)?;
        if user.add_achievement(achievement) {
            self.repo.update(&user)?;
        }
        Ok(())
    }

    pub fn remove_achievement(&self, username: &str, id: &Uuid) -> Result<bool> {
        let mut user = self.get(username)?;
        let removed = user.remove_achievement(id);
        if removed {
            self.repo.update(&user)?;
        }
        Ok(removed)
    }

    fn modify_task<F>(&self, username: &str, id: &Uuid, f: F) -> Result<()>
    where
        F: FnOnce(&mut Task) -> Result<()>,
    {
        let mut user = self.get(username)?;
        let task = user.task_mut(id).ok_or(UserError::TaskNotFound(*id))?;
        f(task)?;
        self.repo.update(&user)?;
        Ok(())
    }
}

fn check_close_after_start(start: DateTime<Utc>, close: DateTime<Utc>) -> Result<()> {
    if close < start {
        let mut errors = ValidationErrors::default();
        errors.add("closeDate", "Close date precedes start date.");
        return Err(UserError::Validation(errors));
    }
    Ok(())
}

fn check_finite(property: &str, value: f64) -> Result<()> {
    if !value.is_finite() {
        let mut errors = ValidationErrors::default();
        errors.add(property, "This value should be a finite number.");
        return Err(UserError::Validation(errors));
    }
    Ok(())
}
