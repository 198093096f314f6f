use crate::endpoints::{
    DailyRecord, FetchWindow, ListCollection,
    activity::DailyActivity,
    readiness::DailyReadiness,
    sleep::{DailySleep, SleepPeriod},
    stress::DailyStress,
};
use std::marker::PhantomData;

pub type DailySleepRepository = CollectionRepository<DailySleep>;
pub type DailyReadinessRepository = CollectionRepository<DailyReadiness>;
pub type DailyActivityRepository = CollectionRepository<DailyActivity>;
pub type DailyStressRepository = CollectionRepository<DailyStress>;
pub type SleepPeriodRepository = CollectionRepository<SleepPeriod>;

pub struct CollectionRepository<T> {
    record: PhantomData<fn() -> T>,
}

impl<T: DailyRecord> CollectionRepository<T> {
    pub fn new() -> Self {
        Self {
            record: PhantomData,
        }
    }

    /// List every record inside the window
    pub fn list(&self, window: &FetchWindow) -> ListCollection<T> {
        ListCollection::new()
            .start_date(window.start_date)
            .end_date(window.end_date)
    }
}

impl<T: DailyRecord> Default for CollectionRepository<T> {
    fn default() -> Self {
        Self::new()
    }
}
