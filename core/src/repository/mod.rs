pub mod file;
pub mod project;
pub mod traits;

// Re-export
pub use file::FileUserRepository;
pub use project::FileProjectRepository;
pub use traits::{ProjectRepository, UserRepository};
