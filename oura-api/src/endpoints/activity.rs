use super::{Collection, DailyRecord};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Daily activity summary. Activity times are in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyActivity {
    pub day: NaiveDate,
    pub score: Option<i32>,
    pub active_calories: Option<i32>,
    pub target_calories: Option<i32>,
    pub total_calories: Option<i32>,
    pub steps: Option<i32>,
    pub high_activity_time: Option<i32>,
    pub medium_activity_time: Option<i32>,
}

impl DailyRecord for DailyActivity {
    const COLLECTION: Collection = Collection::DailyActivity;

    fn day(&self) -> NaiveDate {
        self.day
    }
}
