use serde::{Deserialize, Serialize};
use chrono::NaiveDate;

/// A project mirrored from the issue tracker. `id` is the tracker's id.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Project {
    pub id: u32,
    pub name: String,
    pub description: String,
    pub status: i32,
    pub created_on: NaiveDate,
}
