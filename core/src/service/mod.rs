pub mod dto;
pub mod project_service;
pub mod user_service;
