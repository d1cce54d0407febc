pub mod config;
pub mod error;
pub mod input;
pub mod metrics;
pub mod model;
pub mod repository;
pub mod service;
pub mod time;
pub mod usecase;

pub use config::{Config, MetricsSection};
pub use error::{MalformedTask, UserError, ValidationErrors};
pub use input::{parse_args, expand_key, normalize_metadata, ParsedInput};
pub use metrics::{PerformanceMetrics, PerformanceReport, SpanStrategy};
pub use model::achievement::PersonalAchievement;
pub use model::project::Project;
pub use model::task::{Evaluation, Task, TaskStatus};
pub use model::user::User;
pub use repository::{FileProjectRepository, FileUserRepository, ProjectRepository, UserRepository};
pub use service::dto::{Answer, TaskDto, UserAuthDto, UserCurrentDto, UserDto};
pub use service::project_service::{ProjectService, ProjectSource, TrackerExportSource};
pub use service::user_service::UserService;
pub use time::{parse_date, parse_timestamp};
pub use usecase::performance::{PerformanceUseCase, TeamRow};
