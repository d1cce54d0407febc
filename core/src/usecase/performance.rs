use crate::error::UserError;
use crate::metrics::{PerformanceMetrics, PerformanceReport};
use crate::repository::UserRepository;
use crate::service::dto::{TaskDto, UserCurrentDto};
use chrono::{DateTime, Utc};
use serde::Serialize;

pub type Result<T> = std::result::Result<T, UserError>;

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct TeamRow {
    pub username: String,
    pub full_name: String,
    pub position: String,
    pub report: PerformanceReport,
}

/// Loads users from storage and runs the metrics engine against a fixed `now`.
pub struct PerformanceUseCase<'a, R: UserRepository> {
    repo: &'a R,
    engine: PerformanceMetrics,
}

impl<'a, R: UserRepository> PerformanceUseCase<'a, R> {
    pub fn new(repo: &'a R, engine: PerformanceMetrics) -> Self {
        Self { repo, engine }
    }

    pub fn current(&self, username: &str, now: DateTime<Utc>) -> Result<UserCurrentDto> {
        let user = self
            .repo
            .get(username)?
            .ok_or_else(|| UserError::NotFound(username.to_string()))?;

        let report = self.engine.report(&user.tasks, &user.achievements, now);
        let tasks = user
            .tasks
            .iter()
            .map(|t| TaskDto::from_entity(t.clone(), self.engine.task_working_hours(t)))
            .collect();
        Ok(UserCurrentDto::from_entity(user, tasks, report))
    }

    pub fn team_report(&self, now: DateTime<Utc>) -> Result<Vec<TeamRow>> {
        let mut users = self.repo.list()?;
        users.sort_by(|a, b| a.username.cmp(&b.username));

        Ok(users
            .into_iter()
            .map(|user| TeamRow {
                report: self.engine.report(&user.tasks, &user.achievements, now),
                full_name: user.full_name(),
                position: user.position,
                username: user.username,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::SpanStrategy;
    use crate::model::achievement::PersonalAchievement;
    use crate::model::task::{Task, TaskStatus};
    use crate::model::user::sample_user;
    use crate::service::user_service::tests::MockUserRepo;
    use chrono::TimeZone;

    fn at(m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, m, d, h, 0, 0).unwrap()
    }

    fn repo_with_history() -> MockUserRepo {
        let mut ivan = sample_user("ivan");

        let mut week = Task::new("Payroll export".to_string(), Some(at(1, 1, 9)));
        week.close(at(1, 5, 17), TaskStatus::from("Done"));
        week.evaluate(4.0);
        ivan.add_task(week);

        let mut open = Task::new("Onboarding docs".to_string(), Some(at(1, 8, 9)));
        open.status = TaskStatus::InProgress;
        ivan.add_task(open);

        ivan.add_achievement(PersonalAchievement::new("Speaker".to_string(), 2.0));
        ivan.add_achievement(PersonalAchievement::new("Mentor".to_string(), 3.5));

        let repo = MockUserRepo::default();
        repo.users.borrow_mut().push(sample_user("zoe"));
        repo.users.borrow_mut().push(ivan);
        repo
    }

    #[test]
    fn test_current_user_report() {
        let repo = repo_with_history();
        let usecase = PerformanceUseCase::new(&repo, PerformanceMetrics::default());

        let dto = usecase.current("ivan", at(1, 20, 12)).unwrap();
        assert_eq!(dto.metrics.speed, 40.0);
        // the January 1st 09:00 start is after the month boundary
        assert_eq!(dto.metrics.hours, 40.0);
        assert_eq!(dto.metrics.avg_mark, 4.0);
        assert_eq!(dto.metrics.avg_ach, 5.5);
        assert_eq!(dto.metrics.task_in_work, 0.5);

        assert_eq!(dto.tasks.len(), 2);
        assert_eq!(dto.tasks[0].working_hours, Some(40.0));
        assert_eq!(dto.tasks[1].working_hours, None);
        assert!(dto.tasks[1].is_open);
    }

    #[test]
    fn test_current_unknown_user() {
        let repo = repo_with_history();
        let usecase = PerformanceUseCase::new(&repo, PerformanceMetrics::default());
        assert!(matches!(usecase.current("nobody", at(1, 20, 12)), Err(UserError::NotFound(_))));
    }

    #[test]
    fn test_team_report_is_sorted_and_zero_for_empty_users() {
        let repo = repo_with_history();
        let engine = PerformanceMetrics::default().with_strategy(SpanStrategy::Envelope);
        let rows = PerformanceUseCase::new(&repo, engine).team_report(at(2, 10, 12)).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].username, "ivan");
        assert_eq!(rows[0].report.hours, 0.0);
        assert_eq!(rows[1].username, "zoe");
        assert_eq!(rows[1].report, PerformanceReport::default());
    }
}
