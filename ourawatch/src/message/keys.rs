//! Integer keys shared with the watch. History keys are base offsets; slot
//! `i` of a history lives at `base + i`.

pub const SLEEP_HISTORY: u32 = 10000;
pub const READINESS_HISTORY: u32 = 10007;
pub const ACTIVITY_HISTORY: u32 = 10014;
pub const STRESS_HIGH_HISTORY: u32 = 10021;
pub const STRESS_RESTORE_HISTORY: u32 = 10028;

pub const AUTH_STATUS: u32 = 10035;
pub const REQUEST_SCORES: u32 = 10036;

pub const SLEEP_SCORE: u32 = 10037;
pub const READINESS_SCORE: u32 = 10038;
pub const ACTIVITY_SCORE: u32 = 10039;

pub const SLEEP_TOTAL: u32 = 10040;
pub const SLEEP_IN_BED: u32 = 10041;
pub const SLEEP_EFFICIENCY: u32 = 10042;
pub const SLEEP_HR: u32 = 10043;

pub const READINESS_HR: u32 = 10044;
pub const READINESS_HRV: u32 = 10045;
pub const READINESS_TEMP: u32 = 10046;
pub const READINESS_RESP: u32 = 10047;

pub const ACTIVITY_CAL: u32 = 10048;
pub const ACTIVITY_GOAL_CAL: u32 = 10049;
pub const ACTIVITY_BURN: u32 = 10050;
pub const ACTIVITY_TIME: u32 = 10051;
pub const ACTIVITY_STEPS: u32 = 10052;
