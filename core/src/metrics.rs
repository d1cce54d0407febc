//! Working-time and performance statistics over a user's task history.
//!
//! Every operation is a pure function of the snapshot it is handed; the
//! engine itself only carries configuration.

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::MalformedTask;
use crate::model::achievement::PersonalAchievement;
use crate::model::task::Task;
use crate::time::{local_date, month_bounds, working_days_inclusive};

pub const DEFAULT_HOURS_PER_DAY: f64 = 8.0;

/// How task start/close dates are turned into a working-day span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpanStrategy {
    /// Each task's own start..close span.
    PerTask,
    /// Earliest start of all tasks to latest close of all tasks.
    Envelope,
}

impl Default for SpanStrategy {
    fn default() -> Self {
        SpanStrategy::PerTask
    }
}

/// Start and close of a task that has both, with close not before start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClosedSpan {
    pub start: DateTime<Utc>,
    pub close: DateTime<Utc>,
}

/// `Ok(None)` for tasks that are still open.
pub fn closed_span(task: &Task) -> Result<Option<ClosedSpan>, MalformedTask> {
    let Some(close) = task.close_date else {
        return Ok(None);
    };
    let start = task.start_date.ok_or(MalformedTask::MissingStart(task.id))?;
    if close < start {
        return Err(MalformedTask::CloseBeforeStart(task.id));
    }
    Ok(Some(ClosedSpan { start, close }))
}

/// All five scalars, named as the current-user payload names them.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceReport {
    /// Average task turnaround in working hours.
    pub speed: f64,
    /// Working hours within the current month.
    pub hours: f64,
    pub avg_mark: f64,
    pub avg_ach: f64,
    pub task_in_work: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerformanceMetrics {
    hours_per_day: f64,
    strategy: SpanStrategy,
    offset: FixedOffset,
}

impl Default for PerformanceMetrics {
    fn default() -> Self {
        Self {
            hours_per_day: DEFAULT_HOURS_PER_DAY,
            strategy: SpanStrategy::default(),
            offset: Utc.fix(),
        }
    }
}

impl PerformanceMetrics {
    pub fn new(hours_per_day: f64, strategy: SpanStrategy, offset: FixedOffset) -> Self {
        Self { hours_per_day, strategy, offset }
    }

    pub fn with_strategy(mut self, strategy: SpanStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn strategy(&self) -> SpanStrategy {
        self.strategy
    }

    pub fn hours_per_day(&self) -> f64 {
        self.hours_per_day
    }

    /// Working hours of one closed task; None while it is open or malformed.
    pub fn task_working_hours(&self, task: &Task) -> Option<f64> {
        let span = closed_span(task).ok()??;
        let days = working_days_inclusive(
            local_date(span.start, self.offset),
            local_date(span.close, self.offset),
        );
        Some(days as f64 * self.hours_per_day)
    }

    /// Average working hours from start to close over closed tasks.
    pub fn average_task_turnaround_hours(&self, tasks: &[Task]) -> f64 {
        let spans = self.closed_spans(tasks.iter());
        if spans.is_empty() {
            return 0.0;
        }

        let days = match self.strategy {
            SpanStrategy::PerTask => spans
                .iter()
                .map(|(start, close)| working_days_inclusive(*start, *close))
                .sum(),
            SpanStrategy::Envelope => envelope_days(&spans),
        };
        let result = days as f64 * self.hours_per_day / spans.len() as f64;
        debug!(tasks = spans.len(), days, result, "average task turnaround");
        result
    }

    /// Working hours of tasks started and closed inside `now`'s calendar month.
    pub fn monthly_working_hours(&self, tasks: &[Task], now: DateTime<Utc>) -> f64 {
        let Some((month_start, month_end)) = month_bounds(now, self.offset) else {
            return 0.0;
        };
        let in_month = tasks.iter().filter(|t| {
            matches!((t.start_date, t.close_date), (Some(s), Some(c)) if s > month_start && c < month_end)
        });
        let spans = self.closed_spans(in_month);
        if spans.is_empty() {
            return 0.0;
        }

        let days = match self.strategy {
            SpanStrategy::PerTask => union_days(spans.clone()),
            SpanStrategy::Envelope => envelope_days(&spans),
        };
        let result = days as f64 * self.hours_per_day;
        debug!(tasks = spans.len(), days, result, "monthly working hours");
        result
    }

    pub fn average_evaluation(&self, tasks: &[Task]) -> f64 {
        let (sum, count) = tasks
            .iter()
            .filter_map(|t| t.evaluation)
            .fold((0.0, 0usize), |(sum, count), e| (sum + e.value, count + 1));
        if count == 0 {
            return 0.0;
        }
        sum / count as f64
    }

    pub fn achievement_total(&self, achievements: &[PersonalAchievement]) -> f64 {
        if achievements.is_empty() {
            return 0.0;
        }
        achievements.iter().map(|a| a.value).sum()
    }

    /// Share of tasks whose status is `New` or `InProgress`.
    pub fn in_progress_ratio(&self, tasks: &[Task]) -> f64 {
        if tasks.is_empty() {
            return 0.0;
        }
        let open = tasks.iter().filter(|t| t.status.is_open()).count();
        open as f64 / tasks.len() as f64
    }

    pub fn report(
        &self,
        tasks: &[Task],
        achievements: &[PersonalAchievement],
        now: DateTime<Utc>,
    ) -> PerformanceReport {
        PerformanceReport {
            speed: self.average_task_turnaround_hours(tasks),
            hours: self.monthly_working_hours(tasks, now),
            avg_mark: self.average_evaluation(tasks),
            avg_ach: self.achievement_total(achievements),
            task_in_work: self.in_progress_ratio(tasks),
        }
    }

    // Local start/close dates of every well-formed closed task.
    fn closed_spans<'a>(&self, tasks: impl Iterator<Item = &'a Task>) -> Vec<(NaiveDate, NaiveDate)> {
        let mut spans = Vec::new();
        for task in tasks {
            match closed_span(task) {
                Ok(Some(span)) => spans.push((
                    local_date(span.start, self.offset),
                    local_date(span.close, self.offset),
                )),
                Ok(None) => {}
                Err(e) => warn!(task = %task.id, name = %task.name, "skipping task: {}", e),
            }
        }
        spans
    }
}

fn envelope_days(spans: &[(NaiveDate, NaiveDate)]) -> i64 {
    let first = spans.iter().map(|(s, _)| *s).min();
    let last = spans.iter().map(|(_, c)| *c).max();
    match (first, last) {
        (Some(first), Some(last)) => working_days_inclusive(first, last),
        _ => 0,
    }
}

// Weekdays covered by at least one span; overlaps are counted once.
fn union_days(mut spans: Vec<(NaiveDate, NaiveDate)>) -> i64 {
    spans.sort();
    let mut total = 0;
    let mut current: Option<(NaiveDate, NaiveDate)> = None;
    for (start, end) in spans {
        current = match current {
            Some((cs, ce)) if start <= ce => Some((cs, ce.max(end))),
            Some((cs, ce)) => {
                total += working_days_inclusive(cs, ce);
                Some((start, end))
            }
            None => Some((start, end)),
        };
    }
    if let Some((cs, ce)) = current {
        total += working_days_inclusive(cs, ce);
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::task::TaskStatus;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn closed(start: DateTime<Utc>, close: DateTime<Utc>) -> Task {
        let mut task = Task::new("task".to_string(), Some(start));
        task.close(close, TaskStatus::from("Done"));
        task
    }

    fn with_status(status: &str) -> Task {
        let mut task = Task::new("task".to_string(), None);
        task.status = TaskStatus::from(status);
        task
    }

    fn achievement(value: f64) -> PersonalAchievement {
        PersonalAchievement::new("award".to_string(), value)
    }

    #[test]
    fn test_empty_inputs_are_zero() {
        let now = at(2024, 1, 15, 12);
        for strategy in [SpanStrategy::PerTask, SpanStrategy::Envelope] {
            let engine = PerformanceMetrics::default().with_strategy(strategy);
            assert_eq!(engine.average_task_turnaround_hours(&[]), 0.0);
            assert_eq!(engine.monthly_working_hours(&[], now), 0.0);
            assert_eq!(engine.average_evaluation(&[]), 0.0);
            assert_eq!(engine.achievement_total(&[]), 0.0);
            assert_eq!(engine.in_progress_ratio(&[]), 0.0);
            assert_eq!(engine.report(&[], &[], now), PerformanceReport::default());
        }
    }

    #[test]
    fn test_single_week_task() {
        let mut task = closed(at(2024, 1, 1, 9), at(2024, 1, 5, 17));
        task.evaluate(4.0);
        let tasks = vec![task];

        for strategy in [SpanStrategy::PerTask, SpanStrategy::Envelope] {
            let engine = PerformanceMetrics::default().with_strategy(strategy);
            assert_eq!(engine.average_task_turnaround_hours(&tasks), 40.0);
            assert_eq!(engine.average_evaluation(&tasks), 4.0);
        }
    }

    #[test]
    fn test_open_tasks_do_not_count_toward_turnaround() {
        let tasks = vec![
            closed(at(2024, 1, 1, 9), at(2024, 1, 2, 17)),
            Task::new("open".to_string(), Some(at(2024, 1, 3, 9))),
        ];
        let engine = PerformanceMetrics::default();
        assert_eq!(engine.average_task_turnaround_hours(&tasks), 16.0);
    }

    #[test]
    fn test_per_task_and_envelope_differ() {
        // Mon..Tue and Thu..Fri of the same week; envelope also counts Wed.
        let tasks = vec![
            closed(at(2024, 1, 1, 9), at(2024, 1, 2, 17)),
            closed(at(2024, 1, 4, 9), at(2024, 1, 5, 17)),
        ];
        let per_task = PerformanceMetrics::default();
        let envelope = per_task.with_strategy(SpanStrategy::Envelope);

        assert_eq!(per_task.average_task_turnaround_hours(&tasks), 16.0);
        assert_eq!(envelope.average_task_turnaround_hours(&tasks), 20.0);
    }

    #[test]
    fn test_malformed_tasks_are_skipped() {
        let mut missing_start = Task::new("no start".to_string(), None);
        missing_start.close(at(2024, 1, 2, 9), TaskStatus::from("Done"));
        let reversed = closed(at(2024, 1, 5, 9), at(2024, 1, 1, 9));
        let good = closed(at(2024, 1, 1, 9), at(2024, 1, 1, 17));

        assert_eq!(closed_span(&missing_start), Err(MalformedTask::MissingStart(missing_start.id)));
        assert_eq!(closed_span(&reversed), Err(MalformedTask::CloseBeforeStart(reversed.id)));

        let engine = PerformanceMetrics::default();
        let tasks = vec![missing_start, reversed, good];
        assert_eq!(engine.average_task_turnaround_hours(&tasks), 8.0);
    }

    #[test]
    fn test_monthly_hours_only_counts_tasks_inside_month() {
        let now = at(2024, 1, 20, 12);
        let tasks = vec![
            // inside: Mon 8th .. Wed 10th
            closed(at(2024, 1, 8, 9), at(2024, 1, 10, 17)),
            // overlaps the inside task: Tue 9th .. Thu 11th
            closed(at(2024, 1, 9, 9), at(2024, 1, 11, 17)),
            // starts in December
            closed(at(2023, 12, 28, 9), at(2024, 1, 3, 17)),
            // closes in February
            closed(at(2024, 1, 29, 9), at(2024, 2, 2, 17)),
            // open
            Task::new("open".to_string(), Some(at(2024, 1, 15, 9))),
        ];
        let engine = PerformanceMetrics::default();
        // union Mon 8th .. Thu 11th
        assert_eq!(engine.monthly_working_hours(&tasks, now), 32.0);

        let other_month = at(2024, 3, 1, 12);
        assert_eq!(engine.monthly_working_hours(&tasks, other_month), 0.0);
    }

    #[test]
    fn test_monthly_hours_is_a_total() {
        let now = at(2024, 1, 31, 12);
        let tasks = vec![
            closed(at(2024, 1, 8, 9), at(2024, 1, 8, 17)),
            closed(at(2024, 1, 15, 9), at(2024, 1, 15, 17)),
        ];
        let per_task = PerformanceMetrics::default();
        let envelope = per_task.with_strategy(SpanStrategy::Envelope);

        assert_eq!(per_task.monthly_working_hours(&tasks, now), 16.0);
        // Mon 8th .. Mon 15th is six weekdays.
        assert_eq!(envelope.monthly_working_hours(&tasks, now), 48.0);
    }

    #[test]
    fn test_month_start_is_exclusive() {
        let now = at(2024, 1, 20, 12);
        let tasks = vec![closed(at(2024, 1, 1, 0), at(2024, 1, 2, 17))];
        assert_eq!(PerformanceMetrics::default().monthly_working_hours(&tasks, now), 0.0);
    }

    #[test]
    fn test_average_evaluation_within_bounds() {
        let values = [2.0, 5.0, 3.5, 4.25];
        let mut tasks: Vec<Task> = values
            .iter()
            .map(|v| {
                let mut t = closed(at(2024, 1, 1, 9), at(2024, 1, 1, 17));
                t.evaluate(*v);
                t
            })
            .collect();
        tasks.push(Task::new("unrated".to_string(), None));

        let avg = PerformanceMetrics::default().average_evaluation(&tasks);
        assert!(avg >= 2.0 && avg <= 5.0);
        assert!((avg - 3.6875).abs() < 1e-9);
    }

    #[test]
    fn test_achievement_total() {
        let engine = PerformanceMetrics::default();
        assert_eq!(engine.achievement_total(&[achievement(2.0), achievement(3.5)]), 5.5);
    }

    #[test]
    fn test_in_progress_ratio() {
        let engine = PerformanceMetrics::default();
        let tasks = vec![with_status("InProgress"), with_status("Done")];
        assert_eq!(engine.in_progress_ratio(&tasks), 0.5);

        let tasks = vec![with_status("Новая"), with_status("В работе"), with_status("Закрыта")];
        let ratio = engine.in_progress_ratio(&tasks);
        assert!((0.0..=1.0).contains(&ratio));
        assert!((ratio - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_hours_per_day_is_configurable() {
        let offset = FixedOffset::east_opt(0).unwrap();
        let engine = PerformanceMetrics::new(6.0, SpanStrategy::PerTask, offset);
        let tasks = vec![closed(at(2024, 1, 1, 9), at(2024, 1, 5, 17))];
        assert_eq!(engine.average_task_turnaround_hours(&tasks), 30.0);
    }

    #[test]
    fn test_repeated_calls_are_identical() {
        let now = at(2024, 1, 20, 12);
        let mut rated = closed(at(2024, 1, 8, 9), at(2024, 1, 12, 17));
        rated.evaluate(3.0);
        let tasks = vec![rated, with_status("InProgress")];
        let achievements = vec![achievement(1.5)];

        let engine = PerformanceMetrics::default();
        let first = engine.report(&tasks, &achievements, now);
        let second = engine.report(&tasks, &achievements, now);
        assert_eq!(first, second);
        assert_eq!(first.speed, 40.0);
        assert_eq!(first.hours, 40.0);
        assert_eq!(first.avg_mark, 3.0);
        assert_eq!(first.avg_ach, 1.5);
        assert_eq!(first.task_in_work, 0.5);
    }
}
