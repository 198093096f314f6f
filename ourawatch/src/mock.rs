use crate::snapshot::{
    ActivityDetail, Histories, ReadinessDetail, RollingHistory, ScoreSnapshot, SleepDetail,
};

/// Fixed snapshot for running against an emulator without an Oura account
pub fn demo_snapshot() -> ScoreSnapshot {
    ScoreSnapshot {
        sleep: SleepDetail {
            total_minutes: 432,
            in_bed_minutes: 480,
            efficiency: 90,
            heart_rate: 58,
        },
        readiness: ReadinessDetail {
            heart_rate: 58,
            hrv: 45,
            temperature_deviation: -2,
            respiratory_rate: 158,
        },
        activity: ActivityDetail {
            active_calories: 320,
            goal_calories: 500,
            total_calories: 2100,
            active_minutes: 45,
            steps: 8432,
        },
        history: Histories {
            sleep: RollingHistory::new([75, 82, 90, 68, 85, 79, 88]),
            readiness: RollingHistory::new([80, 65, 72, 78, 60, 85, 72]),
            activity: RollingHistory::new([55, 70, 45, 80, 62, 75, 65]),
            stress_high: RollingHistory::new([25, 40, 30, 15, 45, 35, 20]),
            stress_recovery: RollingHistory::new([60, 45, 55, 70, 35, 50, 65]),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::HeadlineScores;

    #[test]
    fn demo_scores() {
        assert_eq!(
            demo_snapshot().scores(),
            HeadlineScores {
                sleep: 88,
                readiness: 72,
                activity: 65
            }
        );
    }
}
