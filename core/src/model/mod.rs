pub mod achievement;
pub mod project;
pub mod task;
pub mod user;
