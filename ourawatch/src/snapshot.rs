use oura_api::endpoints::HISTORY_DAYS;
use serde::{Deserialize, Serialize};
use std::ops::Index;

/// No score or metric for this slot
pub const MISSING: i32 = -1;
/// No stress recorded for this day
pub const NO_STRESS: i32 = 0;
/// No temperature reading
pub const NO_TEMPERATURE: i32 = -100;

/// Seven daily values; index 0 is six days ago, index 6 is today
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollingHistory([i32; HISTORY_DAYS]);

impl RollingHistory {
    pub fn new(values: [i32; HISTORY_DAYS]) -> Self {
        Self(values)
    }

    /// History with every slot set to `sentinel`
    pub fn filled(sentinel: i32) -> Self {
        Self([sentinel; HISTORY_DAYS])
    }

    pub fn today(&self) -> i32 {
        self.0[HISTORY_DAYS - 1]
    }

    pub fn values(&self) -> &[i32; HISTORY_DAYS] {
        &self.0
    }

    pub fn map(self, f: impl Fn(i32) -> i32) -> Self {
        Self(self.0.map(f))
    }
}

impl Index<usize> for RollingHistory {
    type Output = i32;

    fn index(&self, index: usize) -> &i32 {
        &self.0[index]
    }
}

/// The three scores a watchface shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadlineScores {
    pub sleep: i32,
    pub readiness: i32,
    pub activity: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SleepDetail {
    pub total_minutes: i32,
    pub in_bed_minutes: i32,
    /// Percent
    pub efficiency: i32,
    pub heart_rate: i32,
}

impl Default for SleepDetail {
    fn default() -> Self {
        Self {
            total_minutes: MISSING,
            in_bed_minutes: MISSING,
            efficiency: MISSING,
            heart_rate: MISSING,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadinessDetail {
    pub heart_rate: i32,
    pub hrv: i32,
    /// Tenths of a degree
    pub temperature_deviation: i32,
    /// Tenths of a breath per minute
    pub respiratory_rate: i32,
}

impl Default for ReadinessDetail {
    fn default() -> Self {
        Self {
            heart_rate: MISSING,
            hrv: MISSING,
            temperature_deviation: NO_TEMPERATURE,
            respiratory_rate: MISSING,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityDetail {
    pub active_calories: i32,
    pub goal_calories: i32,
    pub total_calories: i32,
    pub active_minutes: i32,
    pub steps: i32,
}

impl Default for ActivityDetail {
    fn default() -> Self {
        Self {
            active_calories: MISSING,
            goal_calories: MISSING,
            total_calories: MISSING,
            active_minutes: MISSING,
            steps: MISSING,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Histories {
    pub sleep: RollingHistory,
    pub readiness: RollingHistory,
    pub activity: RollingHistory,
    /// Minutes of high stress per day
    pub stress_high: RollingHistory,
    /// Minutes of restorative time per day
    pub stress_recovery: RollingHistory,
}

impl Default for Histories {
    fn default() -> Self {
        Self {
            sleep: RollingHistory::filled(MISSING),
            readiness: RollingHistory::filled(MISSING),
            activity: RollingHistory::filled(MISSING),
            stress_high: RollingHistory::filled(NO_STRESS),
            stress_recovery: RollingHistory::filled(NO_STRESS),
        }
    }
}

/// Everything one refresh cycle publishes to the watch.
///
/// Headline scores are not stored separately: they are always the last slot
/// of the matching history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreSnapshot {
    pub sleep: SleepDetail,
    pub readiness: ReadinessDetail,
    pub activity: ActivityDetail,
    pub history: Histories,
}

impl ScoreSnapshot {
    pub fn scores(&self) -> HeadlineScores {
        HeadlineScores {
            sleep: self.history.sleep.today(),
            readiness: self.history.readiness.today(),
            activity: self.history.activity.today(),
        }
    }
}
