mod history;

pub use history::build_history;

use crate::snapshot::{
    ActivityDetail, Histories, ReadinessDetail, ScoreSnapshot, SleepDetail, MISSING, NO_STRESS,
    NO_TEMPERATURE,
};
use crate::utils::math::{round_half_up, seconds_to_minutes, stress_minutes, tenths};
use oura_api::endpoints::{
    activity::DailyActivity, readiness::DailyReadiness, sleep::DailySleep, sleep::SleepPeriod,
    stress::DailyStress, FetchWindow,
};

/// Records gathered by one refresh cycle. An endpoint that failed or was not
/// fetched contributes an empty set.
#[derive(Debug, Clone, Default)]
pub struct RecordSets {
    pub daily_sleep: Vec<DailySleep>,
    pub daily_readiness: Vec<DailyReadiness>,
    pub daily_activity: Vec<DailyActivity>,
    pub daily_stress: Vec<DailyStress>,
    pub sleep_periods: Vec<SleepPeriod>,
}

/// Turn raw records into the snapshot the watch displays
pub fn aggregate(records: &RecordSets, window: &FetchWindow) -> ScoreSnapshot {
    let history = Histories {
        sleep: build_history(&records.daily_sleep, window, |r| r.score, MISSING),
        readiness: build_history(&records.daily_readiness, window, |r| r.score, MISSING),
        activity: build_history(&records.daily_activity, window, |r| r.score, MISSING),
        stress_high: build_history(
            &records.daily_stress,
            window,
            |r| r.stress_high.map(stress_minutes),
            NO_STRESS,
        ),
        stress_recovery: build_history(
            &records.daily_stress,
            window,
            |r| r.recovery_high.map(stress_minutes),
            NO_STRESS,
        ),
    };

    let sleep = sleep_detail(records.sleep_periods.last());

    ScoreSnapshot {
        sleep,
        readiness: readiness_detail(
            records.sleep_periods.last(),
            records.daily_readiness.last(),
            sleep.heart_rate,
        ),
        activity: activity_detail(records.daily_activity.last()),
        history,
    }
}

fn sleep_detail(latest: Option<&SleepPeriod>) -> SleepDetail {
    let Some(period) = latest else {
        return SleepDetail::default();
    };

    SleepDetail {
        total_minutes: period
            .total_sleep_duration
            .map(seconds_to_minutes)
            .unwrap_or(MISSING),
        in_bed_minutes: period.time_in_bed.map(seconds_to_minutes).unwrap_or(MISSING),
        efficiency: period.efficiency.unwrap_or(MISSING),
        heart_rate: period
            .average_heart_rate
            .map(round_half_up)
            .unwrap_or(MISSING),
    }
}

// Resting heart rate on the readiness screen is the sleeping heart rate
fn readiness_detail(
    period: Option<&SleepPeriod>,
    readiness: Option<&DailyReadiness>,
    sleep_heart_rate: i32,
) -> ReadinessDetail {
    ReadinessDetail {
        heart_rate: sleep_heart_rate,
        hrv: period
            .and_then(|p| p.average_hrv)
            .map(round_half_up)
            .unwrap_or(MISSING),
        temperature_deviation: readiness
            .and_then(|r| r.temperature_deviation)
            .map(tenths)
            .unwrap_or(NO_TEMPERATURE),
        respiratory_rate: period
            .and_then(|p| p.average_breath)
            .map(tenths)
            .unwrap_or(MISSING),
    }
}

fn activity_detail(latest: Option<&DailyActivity>) -> ActivityDetail {
    let Some(activity) = latest else {
        return ActivityDetail::default();
    };

    let active_seconds =
        activity.high_activity_time.unwrap_or(0) + activity.medium_activity_time.unwrap_or(0);

    ActivityDetail {
        active_calories: activity.active_calories.unwrap_or(MISSING),
        goal_calories: activity.target_calories.unwrap_or(MISSING),
        total_calories: activity.total_calories.unwrap_or(MISSING),
        active_minutes: seconds_to_minutes(active_seconds),
        steps: activity.steps.unwrap_or(MISSING),
    }
}
