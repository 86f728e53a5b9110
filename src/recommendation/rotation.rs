//! Topic Rotation
//!
//! Weights topics so that overexposed ones are discouraged and fresh or
//! preferred ones are favoured. The state is rebuilt from the log snapshot on
//! every call and never mutated afterwards.
//!
//! Every topic that appears in the trailing 7-day window is recorded as seen
//! at the moment of computation, not at its true last occurrence. Freshness
//! tiers therefore only kick in for a later `now` or for topics outside the
//! window.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::debug;

use super::sampler::roulette_select;
use super::signals::PerformanceLogEntry;

pub const DAY_MILLIS: i64 = 24 * 60 * 60 * 1000;
pub const ROTATION_WINDOW_MILLIS: i64 = 7 * DAY_MILLIS;

/// Returned by topic exploration when the catalog has no topics at all
pub const FALLBACK_TOPIC: &str = "general";

/// Learner-supplied topic lists
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TopicPreferences {
    #[serde(default)]
    pub avoided: Vec<String>,
    #[serde(default)]
    pub preferred: Vec<String>,
}

/// The six discrete rotation outcomes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationTier {
    Avoided,
    Overexposed,
    Default,
    Neutral,
    Fresh,
    Preferred,
}

impl RotationTier {
    pub fn weight(self) -> f32 {
        match self {
            RotationTier::Avoided => 0.1,
            RotationTier::Overexposed => 0.6,
            RotationTier::Default => 0.8,
            RotationTier::Neutral => 1.0,
            RotationTier::Fresh => 1.2,
            RotationTier::Preferred => 1.5,
        }
    }
}

const OVEREXPOSURE_COUNT: u32 = 5;

/// Per-topic recency and frequency over the trailing window
#[derive(Debug, Clone, Default)]
pub struct TopicRotationState {
    last_seen: HashMap<String, i64>,
    frequency: HashMap<String, u32>,
    avoided: HashSet<String>,
    preferred: HashSet<String>,
}

impl TopicRotationState {
    /// Counts topics in the trailing window. Every topic in the window is
    /// stamped as last seen at `now_millis`, not at its latest log.
    pub fn from_logs(
        logs: &[PerformanceLogEntry],
        now_millis: i64,
        prefs: &TopicPreferences,
    ) -> Self {
        let mut frequency: HashMap<String, u32> = HashMap::new();
        for log in logs
            .iter()
            .filter(|log| now_millis.saturating_sub(log.timestamp_millis) < ROTATION_WINDOW_MILLIS)
        {
            *frequency.entry(log.category.to_lowercase()).or_insert(0) += 1;
        }

        let last_seen = frequency.keys().map(|topic| (topic.clone(), now_millis)).collect();

        debug!("Topic rotation window holds {} topics", frequency.len());

        Self {
            last_seen,
            frequency,
            avoided: normalize(&prefs.avoided),
            preferred: normalize(&prefs.preferred),
        }
    }

    pub fn frequency(&self, topic: &str) -> u32 {
        self.frequency.get(&topic.to_lowercase()).copied().unwrap_or(0)
    }

    pub fn tier(&self, topic: &str, now_millis: i64) -> RotationTier {
        let topic = topic.to_lowercase();

        if self.avoided.contains(&topic) {
            return RotationTier::Avoided;
        }
        if self.preferred.contains(&topic) {
            return RotationTier::Preferred;
        }

        // never seen counts as seen at the epoch, i.e. long ago
        let last_seen = self.last_seen.get(&topic).copied().unwrap_or(0);
        let days_since = now_millis.saturating_sub(last_seen) / DAY_MILLIS;

        if days_since > 7 {
            RotationTier::Fresh
        } else if days_since > 3 {
            RotationTier::Neutral
        } else if self.frequency.get(&topic).copied().unwrap_or(0) > OVEREXPOSURE_COUNT {
            RotationTier::Overexposed
        } else {
            RotationTier::Default
        }
    }

    pub fn weight(&self, topic: &str, now_millis: i64) -> f32 {
        self.tier(topic, now_millis).weight()
    }

    /// Mean weight over `topics`, 0 for an item without topics
    pub fn average_weight(&self, topics: &[String], now_millis: i64) -> f32 {
        if topics.is_empty() {
            return 0.0;
        }
        topics.iter().map(|t| self.weight(t, now_millis)).sum::<f32>() / topics.len() as f32
    }

    /// Weighted random pick among `topics`
    pub fn select_topic<R: Rng + ?Sized>(
        &self,
        topics: &[String],
        now_millis: i64,
        rng: &mut R,
    ) -> String {
        let weighted: Vec<(&String, f32)> = topics
            .iter()
            .map(|topic| (topic, self.weight(topic, now_millis)))
            .collect();

        roulette_select(&weighted, rng)
            .map(|topic| topic.to_string())
            .unwrap_or_else(|| FALLBACK_TOPIC.to_string())
    }
}

fn normalize(topics: &[String]) -> HashSet<String> {
    topics.iter().map(|t| t.trim().to_lowercase()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const NOW: i64 = 1_700_000_000_000;

    fn logs(category: &str, count: usize, age_days: i64) -> Vec<PerformanceLogEntry> {
        (0..count)
            .map(|i| {
                PerformanceLogEntry::new(category, true, NOW - age_days * DAY_MILLIS - i as i64)
            })
            .collect()
    }

    fn prefs(avoided: &[&str], preferred: &[&str]) -> TopicPreferences {
        TopicPreferences {
            avoided: avoided.iter().map(|s| s.to_string()).collect(),
            preferred: preferred.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_avoided_topic_always_low() {
        let state =
            TopicRotationState::from_logs(&logs("news", 9, 1), NOW, &prefs(&["News"], &["news"]));
        assert_eq!(state.weight("news", NOW), 0.1);
        assert_eq!(state.weight("news", NOW + 30 * DAY_MILLIS), 0.1);
    }

    #[test]
    fn test_preferred_topic_boosted() {
        let state =
            TopicRotationState::from_logs(&logs("health", 9, 0), NOW, &prefs(&[], &["health"]));
        assert_eq!(state.weight("health", NOW), 1.5);
    }

    #[test]
    fn test_unseen_topic_is_fresh() {
        let state = TopicRotationState::from_logs(&[], NOW, &TopicPreferences::default());
        assert_eq!(state.tier("culture", NOW), RotationTier::Fresh);
    }

    #[test]
    fn test_overexposed_topic_discouraged() {
        let state =
            TopicRotationState::from_logs(&logs("news", 6, 2), NOW, &TopicPreferences::default());
        assert_eq!(state.frequency("news"), 6);
        assert_eq!(state.weight("news", NOW), 0.6);
    }

    #[test]
    fn test_recent_topic_default_weight() {
        let state =
            TopicRotationState::from_logs(&logs("news", 5, 2), NOW, &TopicPreferences::default());
        assert_eq!(state.weight("news", NOW), 0.8);
    }

    #[test]
    fn test_logs_outside_window_ignored() {
        let state =
            TopicRotationState::from_logs(&logs("news", 9, 8), NOW, &TopicPreferences::default());
        assert_eq!(state.frequency("news"), 0);
        assert_eq!(state.tier("news", NOW), RotationTier::Fresh);
    }

    #[test]
    fn test_corrupt_timestamp_stays_outside_window() {
        let entries = vec![
            PerformanceLogEntry::new("news", true, i64::MIN),
            PerformanceLogEntry::new("health", true, NOW - DAY_MILLIS),
        ];
        let state = TopicRotationState::from_logs(&entries, NOW, &TopicPreferences::default());
        assert_eq!(state.frequency("news"), 0);
        assert_eq!(state.frequency("health"), 1);
        assert_eq!(state.tier("news", i64::MIN), RotationTier::Default);
    }

    #[test]
    fn test_window_topics_count_as_seen_at_computation() {
        // seen six days ago, but recorded as seen "now"
        let state =
            TopicRotationState::from_logs(&logs("news", 1, 6), NOW, &TopicPreferences::default());
        assert_eq!(state.tier("news", NOW), RotationTier::Default);
        assert_eq!(state.tier("news", NOW + 4 * DAY_MILLIS), RotationTier::Neutral);
        assert_eq!(state.tier("news", NOW + 8 * DAY_MILLIS), RotationTier::Fresh);
    }

    #[test]
    fn test_average_weight() {
        let state = TopicRotationState::from_logs(&[], NOW, &prefs(&["a"], &[]));
        let topics = vec!["a".to_string(), "b".to_string()];
        assert!((state.average_weight(&topics, NOW) - 0.65).abs() < 1e-6);
        assert_eq!(state.average_weight(&[], NOW), 0.0);
    }

    #[test]
    fn test_select_topic_reproducible() {
        let state =
            TopicRotationState::from_logs(&logs("news", 9, 0), NOW, &TopicPreferences::default());
        let topics = vec!["news".to_string(), "health".to_string(), "culture".to_string()];

        let a = state.select_topic(&topics, NOW, &mut ChaCha8Rng::seed_from_u64(7));
        let b = state.select_topic(&topics, NOW, &mut ChaCha8Rng::seed_from_u64(7));
        assert_eq!(a, b);
        assert!(topics.contains(&a));
    }

    #[test]
    fn test_select_topic_without_topics() {
        let state = TopicRotationState::default();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(state.select_topic(&[], NOW, &mut rng), "general");
    }
}
