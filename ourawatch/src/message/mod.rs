mod dictionary;
pub mod keys;

pub use dictionary::{AppMessage, MAX_MESSAGE_SIZE, MAX_TUPLES};

use crate::snapshot::{
    ActivityDetail, HeadlineScores, Histories, ReadinessDetail, RollingHistory, ScoreSnapshot,
    SleepDetail,
};
use oura_api::endpoints::HISTORY_DAYS;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MessageError {
    #[error("Missing key {0}")]
    MissingKey(u32),

    #[error("Message has {0} tuples, more than the watch accepts")]
    TooManyTuples(usize),

    #[error("Message is {0} bytes, larger than the watch accepts")]
    TooLarge(usize),

    #[error("Message ended early")]
    Truncated,

    #[error("Unsupported tuple type {0}")]
    UnsupportedType(u8),

    #[error("Unsupported integer width of {0} bytes")]
    UnsupportedLength(u16),

    #[error("{0} unexpected bytes after the last tuple")]
    TrailingBytes(usize),

    #[error("Score under key {0} disagrees with its history")]
    InconsistentScore(u32),
}

/// What the bridge tells the watch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchMessage {
    /// Full app: scores, details and every history
    Scores(ScoreSnapshot),
    /// Watchface: the three scores only
    Headline(HeadlineScores),
    /// The user has to authorize again
    Unauthorized,
}

impl WatchMessage {
    pub fn to_app_message(&self) -> AppMessage {
        let mut message = AppMessage::new();

        match self {
            WatchMessage::Unauthorized => {
                message.insert(keys::AUTH_STATUS, 0);
            }
            WatchMessage::Headline(scores) => {
                message.insert(keys::AUTH_STATUS, 1);
                insert_scores(&mut message, scores);
            }
            WatchMessage::Scores(snapshot) => {
                message.insert(keys::AUTH_STATUS, 1);
                insert_scores(&mut message, &snapshot.scores());

                let sleep = &snapshot.sleep;
                message.insert(keys::SLEEP_TOTAL, sleep.total_minutes);
                message.insert(keys::SLEEP_IN_BED, sleep.in_bed_minutes);
                message.insert(keys::SLEEP_EFFICIENCY, sleep.efficiency);
                message.insert(keys::SLEEP_HR, sleep.heart_rate);

                let readiness = &snapshot.readiness;
                message.insert(keys::READINESS_HR, readiness.heart_rate);
                message.insert(keys::READINESS_HRV, readiness.hrv);
                message.insert(keys::READINESS_TEMP, readiness.temperature_deviation);
                message.insert(keys::READINESS_RESP, readiness.respiratory_rate);

                let activity = &snapshot.activity;
                message.insert(keys::ACTIVITY_CAL, activity.active_calories);
                message.insert(keys::ACTIVITY_GOAL_CAL, activity.goal_calories);
                message.insert(keys::ACTIVITY_BURN, activity.total_calories);
                message.insert(keys::ACTIVITY_TIME, activity.active_minutes);
                message.insert(keys::ACTIVITY_STEPS, activity.steps);

                let history = &snapshot.history;
                message.insert_series(keys::SLEEP_HISTORY, history.sleep.values());
                message.insert_series(keys::READINESS_HISTORY, history.readiness.values());
                message.insert_series(keys::ACTIVITY_HISTORY, history.activity.values());
                message.insert_series(keys::STRESS_HIGH_HISTORY, history.stress_high.values());
                message.insert_series(
                    keys::STRESS_RESTORE_HISTORY,
                    history.stress_recovery.values(),
                );
            }
        }

        message
    }

    /// Read a message as the watch would.
    ///
    /// `AUTH_STATUS` 0 means unauthorized. With history keys present every
    /// snapshot key is required; otherwise the three scores are.
    pub fn from_app_message(message: &AppMessage) -> Result<Self, MessageError> {
        if message.require(keys::AUTH_STATUS)? == 0 {
            return Ok(WatchMessage::Unauthorized);
        }

        if !message.contains(keys::SLEEP_HISTORY) {
            return Ok(WatchMessage::Headline(read_scores(message)?));
        }

        let snapshot = ScoreSnapshot {
            sleep: SleepDetail {
                total_minutes: message.require(keys::SLEEP_TOTAL)?,
                in_bed_minutes: message.require(keys::SLEEP_IN_BED)?,
                efficiency: message.require(keys::SLEEP_EFFICIENCY)?,
                heart_rate: message.require(keys::SLEEP_HR)?,
            },
            readiness: ReadinessDetail {
                heart_rate: message.require(keys::READINESS_HR)?,
                hrv: message.require(keys::READINESS_HRV)?,
                temperature_deviation: message.require(keys::READINESS_TEMP)?,
                respiratory_rate: message.require(keys::READINESS_RESP)?,
            },
            activity: ActivityDetail {
                active_calories: message.require(keys::ACTIVITY_CAL)?,
                goal_calories: message.require(keys::ACTIVITY_GOAL_CAL)?,
                total_calories: message.require(keys::ACTIVITY_BURN)?,
                active_minutes: message.require(keys::ACTIVITY_TIME)?,
                steps: message.require(keys::ACTIVITY_STEPS)?,
            },
            history: Histories {
                sleep: read_history(message, keys::SLEEP_HISTORY)?,
                readiness: read_history(message, keys::READINESS_HISTORY)?,
                activity: read_history(message, keys::ACTIVITY_HISTORY)?,
                stress_high: read_history(message, keys::STRESS_HIGH_HISTORY)?,
                stress_recovery: read_history(message, keys::STRESS_RESTORE_HISTORY)?,
            },
        };

        // Scores are carried twice; the copies have to agree
        let scores = read_scores(message)?;
        let today = snapshot.scores();
        for (key, sent, derived) in [
            (keys::SLEEP_SCORE, scores.sleep, today.sleep),
            (keys::READINESS_SCORE, scores.readiness, today.readiness),
            (keys::ACTIVITY_SCORE, scores.activity, today.activity),
        ] {
            if sent != derived {
                return Err(MessageError::InconsistentScore(key));
            }
        }

        Ok(WatchMessage::Scores(snapshot))
    }
}

fn insert_scores(message: &mut AppMessage, scores: &HeadlineScores) {
    message.insert(keys::SLEEP_SCORE, scores.sleep);
    message.insert(keys::READINESS_SCORE, scores.readiness);
    message.insert(keys::ACTIVITY_SCORE, scores.activity);
}

fn read_scores(message: &AppMessage) -> Result<HeadlineScores, MessageError> {
    Ok(HeadlineScores {
        sleep: message.require(keys::SLEEP_SCORE)?,
        readiness: message.require(keys::READINESS_SCORE)?,
        activity: message.require(keys::ACTIVITY_SCORE)?,
    })
}

fn read_history(message: &AppMessage, base: u32) -> Result<RollingHistory, MessageError> {
    let mut values = [0; HISTORY_DAYS];
    for (offset, slot) in (0u32..).zip(values.iter_mut()) {
        *slot = message.require(base + offset)?;
    }
    Ok(RollingHistory::new(values))
}
