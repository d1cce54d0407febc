use crate::model::project::Project;
use crate::model::user::User;
use anyhow::Result;

pub trait UserRepository {
    fn create(&self, user: User) -> Result<User>;
    fn get(&self, username: &str) -> Result<Option<User>>;
    fn list(&self) -> Result<Vec<User>>;
    fn update(&self, user: &User) -> Result<()>;
    fn delete(&self, username: &str) -> Result<()>;
}

pub trait ProjectRepository {
    fn get(&self, id: u32) -> Result<Option<Project>>;
    fn list(&self) -> Result<Vec<Project>>;
    /// Inserts or replaces by id. Returns true when the project was new.
    fn upsert(&self, project: Project) -> Result<bool>;
}
