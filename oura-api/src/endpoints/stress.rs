use super::{Collection, DailyRecord};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Daily stress summary. Both durations are in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyStress {
    pub day: NaiveDate,
    /// Time spent in high stress
    pub stress_high: Option<i32>,
    /// Time spent in high recovery
    pub recovery_high: Option<i32>,
}

impl DailyRecord for DailyStress {
    const COLLECTION: Collection = Collection::DailyStress;

    fn day(&self) -> NaiveDate {
        self.day
    }
}
