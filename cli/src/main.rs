mod report;

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{anyhow, bail, Result};
use chrono::{DateTime, FixedOffset, Utc};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use hrm_core::config::{self, ensure_home, load_config};
use hrm_core::input::{TASK_KEYS, USER_KEYS};
use hrm_core::{
    normalize_metadata, parse_args, parse_date, parse_timestamp, Config, FileProjectRepository,
    FileUserRepository, PerformanceUseCase, PersonalAchievement, ProjectService, SpanStrategy, Task,
    TaskStatus, TrackerExportSource, UserDto, UserError, UserService,
};

#[derive(Parser)]
#[command(name = "hrm")]
#[command(about = "HR performance tracking", long_about = None)]
struct Cli {
    /// Application home (defaults to ~/.hrm)
    #[arg(long, global = true)]
    home: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Register, update and inspect users
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Track a user's tasks
    Task {
        #[command(subcommand)]
        action: TaskAction,
    },
    /// Record personal achievements
    Achievement {
        #[command(subcommand)]
        action: AchievementAction,
    },
    /// Synchronize projects from the issue tracker
    Project {
        #[command(subcommand)]
        action: ProjectAction,
    },
    /// Performance metrics for every user
    Report {
        /// Evaluate as of this time instead of now
        #[arg(long)]
        at: Option<String>,
        /// Override the configured span strategy
        #[arg(long, value_enum)]
        strategy: Option<StrategyArg>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Write the default config.toml if none exists
    Init,
    /// Print the effective configuration
    Show,
}

#[derive(Subcommand)]
enum UserAction {
    /// Register a user (usage: register ivan first:Ivan last:Ivanov patronymic:Ivanovich position:Dev hired:2021-03-15)
    Register {
        username: String,
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Update a user's profile; same keys as register
    Update {
        username: String,
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Show a user's profile, tasks and metrics
    Show {
        username: String,
        #[arg(long)]
        at: Option<String>,
        /// Print the JSON payload instead of tables
        #[arg(long)]
        json: bool,
    },
    /// List all users
    List,
    /// Delete a user with all tasks and achievements
    Remove { username: String },
}

#[derive(Subcommand)]
enum TaskAction {
    /// Assign a task (usage: add ivan "Payroll export" start:2024-01-01 09:00 close:... status:Done eval:4)
    Add {
        username: String,
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Mark a task as in progress
    Start {
        username: String,
        /// Task id or unique id prefix
        id: String,
        #[arg(long)]
        at: Option<String>,
    },
    /// Close a task
    Close {
        username: String,
        id: String,
        #[arg(long)]
        at: Option<String>,
        #[arg(long, default_value = "Done")]
        status: String,
    },
    /// Set a task's evaluation mark
    Evaluate {
        username: String,
        id: String,
        value: f64,
    },
    /// Remove a task from a user
    Remove {
        username: String,
        id: String,
    },
}

#[derive(Subcommand)]
enum AchievementAction {
    /// Add an achievement (usage: add ivan 2.5 Conference talk)
    Add {
        username: String,
        value: f64,
        #[arg(trailing_var_arg = true)]
        title: Vec<String>,
    },
    /// Remove an achievement by id or unique id prefix
    Remove { username: String, id: String },
}

#[derive(Subcommand)]
enum ProjectAction {
    /// Import a tracker projects.json export
    Sync { export: PathBuf },
    /// List synchronized projects
    List,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum StrategyArg {
    PerTask,
    Envelope,
}

impl From<StrategyArg> for SpanStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::PerTask => SpanStrategy::PerTask,
            StrategyArg::Envelope => SpanStrategy::Envelope,
        }
    }
}

struct Context {
    home: PathBuf,
    config: Config,
    offset: FixedOffset,
    now: DateTime<Utc>,
}

impl Context {
    fn data_dir(&self) -> PathBuf {
        self.config.data_dir(&self.home)
    }

    fn users(&self) -> Result<UserService<FileUserRepository>> {
        Ok(UserService::new(FileUserRepository::new(Some(self.data_dir()))?))
    }

    fn projects(&self) -> Result<ProjectService<FileProjectRepository>> {
        Ok(ProjectService::new(FileProjectRepository::new(Some(self.data_dir()))?))
    }

    fn at(&self, input: Option<&str>) -> Result<DateTime<Utc>> {
        match input {
            Some(s) => parse_timestamp(s, self.now, self.offset),
            None => Ok(self.now),
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("HRM_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let home = ensure_home(cli.home)?;
    let config = load_config(&home)?;
    let offset = config.metrics.offset()?;
    let ctx = Context { home, config, offset, now: Utc::now() };
    debug!(home = %ctx.home.display(), "loaded configuration");

    match cli.command {
        Commands::Config { action } => run_config(&ctx, action),
        Commands::User { action } => run_user(&ctx, action),
        Commands::Task { action } => run_task(&ctx, action),
        Commands::Achievement { action } => run_achievement(&ctx, action),
        Commands::Project { action } => run_project(&ctx, action),
        Commands::Report { at, strategy } => {
            let now = ctx.at(at.as_deref())?;
            let mut engine = ctx.config.metrics.engine()?;
            if let Some(strategy) = strategy {
                engine = engine.with_strategy(strategy.into());
            }
            debug!(strategy = ?engine.strategy(), hours_per_day = engine.hours_per_day(), "team report");
            let repo = FileUserRepository::new(Some(ctx.data_dir()))?;
            let rows = PerformanceUseCase::new(&repo, engine).team_report(now)?;
            report::print_team(&rows, now);
            Ok(())
        }
    }
}

fn run_config(ctx: &Context, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Init => {
            let path = config::config_path(&ctx.home);
            if config::init_config(&ctx.home)? {
                println!("Wrote {}", path.display());
            } else {
                println!("Config already exists: {}", path.display());
            }
        }
        ConfigAction::Show => {
            println!("# {}", config::config_path(&ctx.home).display());
            print!("{}", config::render_config(&ctx.config)?);
        }
    }
    Ok(())
}

fn run_user(ctx: &Context, action: UserAction) -> Result<()> {
    let service = ctx.users()?;
    match action {
        UserAction::Register { username, args } => {
            let dto = user_dto(username, &args, None)?;
            let auth = service.register(dto).map_err(explain)?;
            println!("User registered: {} (roles: {})", auth.username, auth.roles.join(", "));
        }
        UserAction::Update { username, args } => {
            let existing = service.get(&username).map_err(explain)?;
            let dto = user_dto(username, &args, Some(existing))?;
            let answer = service.update(dto).map_err(explain)?;
            println!("{}: {}", answer.status, answer.message);
        }
        UserAction::Show { username, at, json } => {
            let now = ctx.at(at.as_deref())?;
            let engine = ctx.config.metrics.engine()?;
            let dto = PerformanceUseCase::new(service.repo(), engine)
                .current(&username, now)
                .map_err(explain)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&dto)?);
            } else {
                report::print_user(&dto, now);
            }
        }
        UserAction::List => {
            report::print_users(&service.list()?);
        }
        UserAction::Remove { username } => {
            service.remove(&username).map_err(explain)?;
            println!("User removed: {}", username);
        }
    }
    Ok(())
}

/// Builds a profile payload from `key:value` args, falling back to `existing` for missing keys.
fn user_dto(username: String, args: &[String], existing: Option<hrm_core::User>) -> Result<UserDto> {
    let parsed = parse_args(args);
    if !parsed.name.is_empty() {
        bail!("Unexpected arguments: '{}' (use key:value)", parsed.name);
    }
    let meta = normalize_metadata(parsed.metadata, USER_KEYS)?;

    let field = |key: &str, current: Option<&String>| -> Result<String> {
        meta.get(key)
            .or(current)
            .cloned()
            .ok_or_else(|| anyhow!("Missing required key: {}", key))
    };

    let date_of_hiring = match (meta.get("hired"), &existing) {
        (Some(d), _) => parse_date(d)?,
        (None, Some(user)) => user.date_of_hiring,
        (None, None) => bail!("Missing required key: hired"),
    };
    let roles = meta
        .get("roles")
        .map(|r| split_roles(r))
        .unwrap_or_default();

    Ok(UserDto {
        last_name: field("last", existing.as_ref().map(|u| &u.last_name))?,
        first_name: field("first", existing.as_ref().map(|u| &u.first_name))?,
        patronymic: field("patronymic", existing.as_ref().map(|u| &u.patronymic))?,
        position: field("position", existing.as_ref().map(|u| &u.position))?,
        development_plan: meta
            .get("plan")
            .cloned()
            .or_else(|| existing.as_ref().and_then(|u| u.development_plan.clone())),
        date_of_hiring,
        roles,
        username,
    })
}

fn split_roles(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|r| r.trim().to_uppercase())
        .filter(|r| !r.is_empty())
        .collect()
}

fn run_task(ctx: &Context, action: TaskAction) -> Result<()> {
    let service = ctx.users()?;
    match action {
        TaskAction::Add { username, args } => {
            let parsed = parse_args(&args);
            if parsed.name.is_empty() {
                bail!("Task name is required.");
            }
            let meta = normalize_metadata(parsed.metadata, TASK_KEYS)?;
            let task = task_from_metadata(ctx, parsed.name, &meta)?;
            let id = task.id;
            if service.assign_task(&username, task).map_err(explain)? {
                println!("Task added: {} (ID: {})", id, short_id(&id));
            }
        }
        TaskAction::Start { username, id, at } => {
            let id = resolve_task_id(&service, &username, &id)?;
            service.start_task(&username, &id, ctx.at(at.as_deref())?).map_err(explain)?;
            println!("Task {} started", short_id(&id));
        }
        TaskAction::Close { username, id, at, status } => {
            let id = resolve_task_id(&service, &username, &id)?;
            let status = TaskStatus::from(status);
            if status.is_open() {
                bail!("Closing status must not be an open status ({})", status.label());
            }
            service
                .close_task(&username, &id, ctx.at(at.as_deref())?, status)
                .map_err(explain)?;
            println!("Task {} closed", short_id(&id));
        }
        TaskAction::Evaluate { username, id, value } => {
            let id = resolve_task_id(&service, &username, &id)?;
            service.evaluate_task(&username, &id, value).map_err(explain)?;
            println!("Task {} evaluated: {}", short_id(&id), value);
        }
        TaskAction::Remove { username, id } => {
            let id = resolve_task_id(&service, &username, &id)?;
            service.remove_task(&username, &id).map_err(explain)?;
            println!("Task {} removed", short_id(&id));
        }
    }
    Ok(())
}

fn task_from_metadata(ctx: &Context, name: String, meta: &HashMap<String, String>) -> Result<Task> {
    let start = meta.get("start").map(|s| parse_timestamp(s, ctx.now, ctx.offset)).transpose()?;
    let mut task = Task::new(name, start);

    if let Some(close) = meta.get("close") {
        let at = parse_timestamp(close, ctx.now, ctx.offset)?;
        let status = meta.get("status").map(|s| TaskStatus::from(s.as_str())).unwrap_or_else(|| TaskStatus::from("Done"));
        task.close(at, status);
    } else if let Some(status) = meta.get("status") {
        task.status = TaskStatus::from(status.as_str());
    } else if start.is_some() {
        task.status = TaskStatus::InProgress;
    }

    if let Some(eval) = meta.get("eval") {
        let value: f64 = eval.parse().map_err(|_| anyhow!("Invalid evaluation: {}", eval))?;
        task.evaluate(value);
    }
    if let Some(project) = meta.get("project") {
        task.project_id = Some(project.parse().map_err(|_| anyhow!("Invalid project id: {}", project))?);
    }
    Ok(task)
}

fn resolve_task_id(service: &UserService<FileUserRepository>, username: &str, prefix: &str) -> Result<Uuid> {
    let user = service.get(username).map_err(explain)?;
    let ids: Vec<Uuid> = user.tasks.iter().map(|t| t.id).collect();
    match_prefix(&ids, prefix)
}

/// Resolves a full id or a unique id prefix, as shown in the 8-character ID column.
fn match_prefix(ids: &[Uuid], prefix: &str) -> Result<Uuid> {
    if let Ok(id) = Uuid::parse_str(prefix) {
        return Ok(id);
    }
    let matches: Vec<&Uuid> = ids.iter().filter(|id| id.to_string().starts_with(prefix)).collect();
    match matches.as_slice() {
        [id] => Ok(**id),
        [] => Err(anyhow!("No entry matches '{}'", prefix)),
        _ => Err(anyhow!("Id '{}' is ambiguous ({} matches)", prefix, matches.len())),
    }
}

fn short_id(id: &Uuid) -> String {
    id.to_string()[..8].to_string()
}

fn run_achievement(ctx: &Context, action: AchievementAction) -> Result<()> {
    let service = ctx.users()?;
    match action {
        AchievementAction::Add { username, value, title } => {
            if title.is_empty() {
                bail!("Achievement title is required.");
            }
            let achievement = PersonalAchievement::new(title.join(" "), value);
            service.add_achievement(&username, achievement).map_err(explain)?;
            println!("Achievement added for {}", username);
        }
        AchievementAction::Remove { username, id } => {
            let user = service.get(&username).map_err(explain)?;
            let ids: Vec<Uuid> = user.achievements.iter().map(|a| a.id).collect();
            let id = match_prefix(&ids, &id)?;
            if service.remove_achievement(&username, &id).map_err(explain)? {
                println!("Achievement {} removed", short_id(&id));
            }
        }
    }
    Ok(())
}

fn run_project(ctx: &Context, action: ProjectAction) -> Result<()> {
    let service = ctx.projects()?;
    match action {
        ProjectAction::Sync { export } => {
            let answer = service.sync(&TrackerExportSource::new(export))?;
            println!("{}: {}", answer.status, answer.message);
        }
        ProjectAction::List => report::print_projects(&service.list()?),
    }
    Ok(())
}

/// Flattens validation errors into a readable message.
fn explain(err: UserError) -> anyhow::Error {
    match err {
        UserError::Validation(errors) => {
            let mut lines = vec!["Invalid input:".to_string()];
            for (property, messages) in &errors.errors {
                for message in messages {
                    lines.push(format!("  {}: {}", property, message));
                }
            }
            anyhow!(lines.join("\n"))
        }
        other => anyhow!(other),
    }
}
