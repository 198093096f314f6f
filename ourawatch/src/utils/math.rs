/// Round to the nearest integer, halves going up (towards positive infinity).
///
/// Examples:
/// - 2.5 -> 3
/// - -2.5 -> -2
/// - -0.2 -> 0
pub fn round_half_up(value: f64) -> i32 {
    (value + 0.5).floor() as i32
}

/// Whole minutes in a number of seconds, rounded half up
pub fn seconds_to_minutes(seconds: i32) -> i32 {
    round_half_up(f64::from(seconds) / 60.0)
}

/// Stress time in minutes; anything non-positive counts as none
pub fn stress_minutes(seconds: i32) -> i32 {
    if seconds > 0 {
        seconds_to_minutes(seconds)
    } else {
        0
    }
}

/// Value in tenths, so one decimal place survives an integer channel
pub fn tenths(value: f64) -> i32 {
    round_half_up(value * 10.0)
}
