use super::{Collection, DailyRecord};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Daily sleep score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySleep {
    pub day: NaiveDate,
    pub score: Option<i32>,
}

impl DailyRecord for DailySleep {
    const COLLECTION: Collection = Collection::DailySleep;

    fn day(&self) -> NaiveDate {
        self.day
    }
}

/// One detailed sleep period. Durations are in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepPeriod {
    pub day: NaiveDate,
    pub total_sleep_duration: Option<i32>,
    pub time_in_bed: Option<i32>,
    /// Percentage of time in bed spent asleep
    pub efficiency: Option<i32>,
    pub average_heart_rate: Option<f64>,
    pub average_hrv: Option<f64>,
    /// Breaths per minute
    pub average_breath: Option<f64>,
}

impl DailyRecord for SleepPeriod {
    const COLLECTION: Collection = Collection::Sleep;

    fn day(&self) -> NaiveDate {
        self.day
    }
}
