pub mod activity;
pub mod readiness;
pub mod sleep;
pub mod stress;

use crate::macros::setter;
use chrono::{Days, Local, NaiveDate};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt::Display;
use std::marker::PhantomData;

/// Number of days in a rolling history, today included
pub const HISTORY_DAYS: usize = 7;

/// The `usercollection` endpoints the bridge reads from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    DailySleep,
    DailyReadiness,
    DailyActivity,
    DailyStress,
    /// Detailed sleep periods
    Sleep,
}

impl Collection {
    pub const ALL: [Collection; 5] = [
        Collection::DailySleep,
        Collection::DailyReadiness,
        Collection::DailyActivity,
        Collection::DailyStress,
        Collection::Sleep,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            Self::DailySleep => "daily_sleep",
            Self::DailyReadiness => "daily_readiness",
            Self::DailyActivity => "daily_activity",
            Self::DailyStress => "daily_stress",
            Self::Sleep => "sleep",
        }
    }
}

impl Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}

/// Inclusive date range requested from every endpoint in one cycle.
///
/// Always spans from seven days before "today" through tomorrow, so records
/// stamped in a timezone ahead of or behind the phone still fall inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchWindow {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl FetchWindow {
    /// Window anchored on the given local date
    pub fn for_today(today: NaiveDate) -> Self {
        Self {
            start_date: today - Days::new(HISTORY_DAYS as u64),
            end_date: today + Days::new(1),
        }
    }

    /// Window anchored on the current local date
    pub fn current() -> Self {
        Self::for_today(Local::now().date_naive())
    }

    pub fn today(&self) -> NaiveDate {
        self.end_date - Days::new(1)
    }

    /// Inclusive number of days covered
    pub fn span_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }

    /// The seven dates of a rolling history: index 0 is six days ago, index 6 is today
    pub fn history_dates(&self) -> [NaiveDate; HISTORY_DAYS] {
        let today = self.today();
        std::array::from_fn(|i| today - Days::new((HISTORY_DAYS - 1 - i) as u64))
    }
}

/// A per-day record returned by one of the collection endpoints
pub trait DailyRecord: DeserializeOwned + Send + 'static {
    const COLLECTION: Collection;

    fn day(&self) -> NaiveDate;
}

// Responses

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionResponse<T> {
    pub data: Vec<T>,
}

// Requests

#[derive(Debug, Clone)]
pub struct ListCollection<T> {
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    record: PhantomData<fn() -> T>,
}

impl<T: DailyRecord> ListCollection<T> {
    pub fn new() -> Self {
        Self {
            start_date: None,
            end_date: None,
            record: PhantomData,
        }
    }

    setter!(opt start_date: NaiveDate);
    setter!(opt end_date: NaiveDate);

    pub fn collection(&self) -> Collection {
        T::COLLECTION
    }

    pub fn endpoint(&self) -> Cow<'_, str> {
        let mut endpoint = format!("/usercollection/{}", T::COLLECTION);
        let mut separator = '?';

        if let Some(start_date) = self.start_date {
            endpoint.push_str(&format!("{}start_date={}", separator, start_date));
            separator = '&';
        }
        if let Some(end_date) = self.end_date {
            endpoint.push_str(&format!("{}end_date={}", separator, end_date));
        }

        endpoint.into()
    }
}

impl<T: DailyRecord> Default for ListCollection<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoints::sleep::DailySleep;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn window_spans_nine_days_ending_tomorrow() {
        let window = FetchWindow::for_today(date("2024-03-01"));

        assert_eq!(window.start_date, date("2024-02-23"));
        assert_eq!(window.end_date, date("2024-03-02"));
        assert_eq!(window.span_days(), 9);
        assert_eq!(window.today(), date("2024-03-01"));
    }

    #[test]
    fn history_dates_end_on_today() {
        let window = FetchWindow::for_today(date("2024-01-03"));
        let dates = window.history_dates();

        assert_eq!(dates.len(), HISTORY_DAYS);
        assert_eq!(dates[0], date("2023-12-28"));
        assert_eq!(dates[4], date("2024-01-01"));
        assert_eq!(dates[6], date("2024-01-03"));
    }

    #[test]
    fn endpoint_includes_date_range() {
        let window = FetchWindow::for_today(date("2024-01-03"));
        let req = ListCollection::<DailySleep>::new()
            .start_date(window.start_date)
            .end_date(window.end_date);

        assert_eq!(
            req.endpoint(),
            "/usercollection/daily_sleep?start_date=2023-12-27&end_date=2024-01-04"
        );
    }

    #[test]
    fn endpoint_without_range_has_no_query() {
        let req = ListCollection::<DailySleep>::new();
        assert_eq!(req.endpoint(), "/usercollection/daily_sleep");
        assert_eq!(req.collection(), Collection::DailySleep);
    }
}
