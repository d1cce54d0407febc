use chrono::{DateTime, Utc};
use hrm_core::{Project, TaskDto, TeamRow, User, UserCurrentDto};
use tabled::settings::object::Rows;
use tabled::settings::{Color, Modify, Style};
use tabled::{Table, Tabled};

#[derive(Tabled)]
struct TeamTableRow {
    #[tabled(rename = "User")]
    username: String,
    #[tabled(rename = "Name")]
    full_name: String,
    #[tabled(rename = "Position")]
    position: String,
    #[tabled(rename = "Turnaround (h)")]
    speed: String,
    #[tabled(rename = "Month (h)")]
    hours: String,
    #[tabled(rename = "Avg mark")]
    avg_mark: String,
    #[tabled(rename = "Achievements")]
    avg_ach: String,
    #[tabled(rename = "In work")]
    task_in_work: String,
}

#[derive(Tabled)]
struct TaskTableRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Task")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Start")]
    start: String,
    #[tabled(rename = "Close")]
    close: String,
    #[tabled(rename = "Hours")]
    hours: String,
    #[tabled(rename = "Mark")]
    mark: String,
}

#[derive(Tabled)]
struct UserTableRow {
    #[tabled(rename = "User")]
    username: String,
    #[tabled(rename = "Name")]
    full_name: String,
    #[tabled(rename = "Position")]
    position: String,
    #[tabled(rename = "Hired")]
    hired: String,
    #[tabled(rename = "Tasks")]
    tasks: usize,
}

#[derive(Tabled)]
struct ProjectTableRow {
    #[tabled(rename = "ID")]
    id: u32,
    #[tabled(rename = "Project")]
    name: String,
    #[tabled(rename = "Status")]
    status: i32,
    #[tabled(rename = "Created")]
    created_on: String,
}

fn render<T: Tabled>(rows: Vec<T>) -> String {
    let mut table = Table::new(rows);
    table
        .with(Style::modern())
        .with(Modify::new(Rows::first()).with(Color::FG_CYAN));
    table.to_string()
}

fn hours(value: f64) -> String {
    format!("{:.1}", value)
}

fn optional_date(value: Option<DateTime<Utc>>) -> String {
    value
        .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn task_row(task: &TaskDto) -> TaskTableRow {
    TaskTableRow {
        id: crate::short_id(&task.id),
        name: task.name.clone(),
        status: task.status.clone(),
        start: optional_date(task.start_date),
        close: optional_date(task.close_date),
        hours: task.working_hours.map(hours).unwrap_or_else(|| "-".to_string()),
        mark: task.evaluation.map(|v| format!("{}", v)).unwrap_or_else(|| "-".to_string()),
    }
}

pub fn print_team(rows: &[TeamRow], now: DateTime<Utc>) {
    if rows.is_empty() {
        println!("No users registered.");
        return;
    }

    println!("\n\x1b[1;36mPerformance as of {}\x1b[0m", now.format("%Y-%m-%d %H:%M"));
    let table_rows = rows
        .iter()
        .map(|row| TeamTableRow {
            username: row.username.clone(),
            full_name: row.full_name.clone(),
            position: row.position.clone(),
            speed: hours(row.report.speed),
            hours: hours(row.report.hours),
            avg_mark: format!("{:.2}", row.report.avg_mark),
            avg_ach: format!("{:.1}", row.report.avg_ach),
            task_in_work: format!("{:.0}%", row.report.task_in_work * 100.0),
        })
        .collect();
    println!("{}", render::<TeamTableRow>(table_rows));
}

pub fn print_user(dto: &UserCurrentDto, now: DateTime<Utc>) {
    let info = &dto.user_info;
    println!(
        "\n\x1b[1;36m{} {} {}\x1b[0m ({}) {}",
        info.last_name, info.first_name, info.patronymic, dto.username, info.position
    );
    println!("Hired: {}  Roles: {}", info.date_of_hiring, dto.roles.join(", "));
    if let Some(plan) = &info.development_plan {
        println!("Development plan: {}", plan);
    }

    println!(
        "\nAs of {}: turnaround {:.1}h, month {:.1}h, avg mark {:.2}, achievements {:.1}, in work {:.0}%",
        now.format("%Y-%m-%d %H:%M"),
        dto.metrics.speed,
        dto.metrics.hours,
        dto.metrics.avg_mark,
        dto.metrics.avg_ach,
        dto.metrics.task_in_work * 100.0
    );

    if dto.tasks.is_empty() {
        println!("No tasks assigned.");
    } else {
        println!("{}", render(dto.tasks.iter().map(task_row).collect::<Vec<_>>()));
    }

    if !dto.achievements.is_empty() {
        println!("Achievements:");
        for a in &dto.achievements {
            println!("  {:>5.1}  {}", a.value, a.title);
        }
    }
}

pub fn print_users(users: &[User]) {
    if users.is_empty() {
        println!("No users registered.");
        return;
    }
    let mut rows: Vec<UserTableRow> = users
        .iter()
        .map(|u| UserTableRow {
            username: u.username.clone(),
            full_name: u.full_name(),
            position: u.position.clone(),
            hired: u.date_of_hiring.to_string(),
            tasks: u.tasks.len(),
        })
        .collect();
    rows.sort_by(|a, b| a.username.cmp(&b.username));
    println!("{}", render(rows));
}

pub fn print_projects(projects: &[Project]) {
    if projects.is_empty() {
        println!("No projects synchronized.");
        return;
    }
    let rows: Vec<ProjectTableRow> = projects
        .iter()
        .map(|p| ProjectTableRow {
            id: p.id,
            name: p.name.clone(),
            status: p.status,
            created_on: p.created_on.to_string(),
        })
        .collect();
    println!("{}", render(rows));
}
