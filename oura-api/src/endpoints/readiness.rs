use super::{Collection, DailyRecord};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyReadiness {
    pub day: NaiveDate,
    pub score: Option<i32>,
    /// Deviation from the body temperature baseline in °C
    pub temperature_deviation: Option<f64>,
}

impl DailyRecord for DailyReadiness {
    const COLLECTION: Collection = Collection::DailyReadiness;

    fn day(&self) -> NaiveDate {
        self.day
    }
}
