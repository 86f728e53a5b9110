//! Difficulty Adaptation
//!
//! Two independent adapters over the six-level ladder:
//! - `baseline`: week-implied level nudged by recent reading accuracy,
//!   used when picking content for a session
//! - `predict`: trend-aware suggestion from an arbitrary base level,
//!   used after a session
//!
//! Both are total: every step is clamped to the ladder ends.

use super::content::DifficultyLevel;

pub const BASELINE_STEP_UP_ACCURACY: f32 = 0.85;
pub const BASELINE_STEP_DOWN_ACCURACY: f32 = 0.65;

pub const PREDICT_STEP_UP_ACCURACY: f32 = 0.90;
pub const PREDICT_STEP_UP_TREND: f32 = 0.10;
pub const PREDICT_STEP_DOWN_ACCURACY: f32 = 0.60;
pub const PREDICT_STEP_DOWN_TREND: f32 = -0.20;

/// Level for `week`, one step up above 85% recent accuracy, one down below 65%
///
/// Both thresholds are exclusive: exactly 0.85 or 0.65 holds.
pub fn baseline(week: u32, recent_accuracy: f32) -> DifficultyLevel {
    let level = DifficultyLevel::from_week(week);

    if recent_accuracy > BASELINE_STEP_UP_ACCURACY {
        level.step(1)
    } else if recent_accuracy < BASELINE_STEP_DOWN_ACCURACY {
        level.step(-1)
    } else {
        level
    }
}

/// Suggest the next level from `base` given accuracy and its trend
pub fn predict(base: DifficultyLevel, accuracy: f32, trend: f32) -> DifficultyLevel {
    if accuracy > PREDICT_STEP_UP_ACCURACY && trend > PREDICT_STEP_UP_TREND {
        base.step(1)
    } else if accuracy < PREDICT_STEP_DOWN_ACCURACY || trend < PREDICT_STEP_DOWN_TREND {
        base.step(-1)
    } else {
        base
    }
}
