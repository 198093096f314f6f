use crate::snapshot::RollingHistory;
use chrono::NaiveDate;
use oura_api::endpoints::{DailyRecord, FetchWindow};
use std::collections::HashMap;

/// Lay records out over the seven history dates of `window`.
///
/// A later record for the same day replaces an earlier one. Days without a
/// record, or whose record lacks the field, get `sentinel`.
pub fn build_history<T, F>(
    records: &[T],
    window: &FetchWindow,
    field: F,
    sentinel: i32,
) -> RollingHistory
where
    T: DailyRecord,
    F: Fn(&T) -> Option<i32>,
{
    let by_day: HashMap<NaiveDate, &T> = records.iter().map(|r| (r.day(), r)).collect();

    RollingHistory::new(window.history_dates().map(|date| {
        by_day
            .get(&date)
            .and_then(|record| field(*record))
            .unwrap_or(sentinel)
    }))
}
