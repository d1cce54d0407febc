use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PersonalAchievement {
    pub id: Uuid,
    pub title: String,
    pub value: f64,
}

impl PersonalAchievement {
    pub fn new(title: String, value: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            title,
            value,
        }
    }
}
