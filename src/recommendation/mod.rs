//! Recommendation Module
//!
//! Picks reading content for a learner from an immutable catalog and a
//! snapshot of their task logs.
//!
//! ## Architecture
//!
//! 1. **Catalog** - Validated content plus build-once lookup indices
//! 2. **Signals** - Weak areas, recent topics and reading accuracy from logs
//! 3. **Rotation** - Topic weights favouring fresh and preferred topics
//! 4. **Engine** - Scores items and drives the recommendation entry points
//! 5. **Sampler** - Eligibility filter, fallback and roulette selection
//! 6. **Difficulty** - Week baseline and trend-aware level adaptation
//!
//! ## Scoring Overview
//!
//! Each term is clamped to its own range, then the sum is clamped to [0,1]:
//! - Time fit (25%): estimated minutes against the time budget
//! - Difficulty match (20%): 1.0 on the preferred level, 0.5 otherwise
//! - Weak-area bonus (up to 30%): keyword overlap with weak skill areas
//! - Topic variety (15%): average rotation weight of the item's topics
//! - Vocabulary alignment (10%): balance of known and new focus words

pub mod catalog;
pub mod content;
pub mod difficulty;
pub mod engine;
pub mod metrics;
pub mod rotation;
pub mod sampler;
pub mod signals;

// Re-export the types that are actually used externally
pub use catalog::ContentCatalog;
pub use content::{ContentItem, ContentSourceType, DifficultyLevel, WeekRange};
pub use engine::{
    CategoryMatch, CurationEngine, EngineSettings, LearnerSnapshot, Recommendation,
    RecommendationContext, RecommendationQuery, RecommendationReason, ScoredContent, ScoringWeights,
};
pub use rotation::{TopicPreferences, TopicRotationState};
pub use sampler::{Selection, SelectionSampler};
pub use signals::{
    PerformanceLogEntry, PerformanceSignals, ReadingProfile, SessionType, SkillCategory,
};
