//! Performance Signals
//!
//! Derives what the scorer needs to know about a learner from a read-only
//! snapshot of their task logs: weak skill areas, recently touched topics,
//! recent reading accuracy and its trend.
//!
//! Skill categories are a lookup table rather than a match on an enum, so a
//! new category only needs a new table row.

use serde::{Deserialize, Serialize, Serializer};
use std::collections::{HashMap, HashSet};

use super::catalog::MAX_WEEK;

/// One completed task as recorded by the log store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceLogEntry {
    pub category: String,
    pub correct: bool,
    #[serde(alias = "timestampMillis")]
    pub timestamp_millis: i64,
    #[serde(default, alias = "minutesSpent")]
    pub minutes_spent: u32,
}

impl PerformanceLogEntry {
    pub fn new(category: impl Into<String>, correct: bool, timestamp_millis: i64) -> Self {
        Self {
            category: category.into(),
            correct,
            timestamp_millis,
            minutes_spent: 0,
        }
    }

    fn matches(&self, needle: &str) -> bool {
        self.category.to_lowercase().contains(&needle.to_lowercase())
    }
}

/// A skill area and the keywords that tie content to it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SkillCategory {
    pub name: &'static str,
    /// Matched as substrings of content topics and grammar patterns
    pub keywords: &'static [&'static str],
    /// Topics a category-focused query looks for
    pub focus_topics: &'static [&'static str],
}

pub const GRAMMAR: SkillCategory = SkillCategory {
    name: "grammar",
    keywords: &["grammar", "structure", "syntax", "tense", "clause"],
    focus_topics: &["grammar", "language_structure", "syntax"],
};

pub const READING: SkillCategory = SkillCategory {
    name: "reading",
    keywords: &["comprehension", "analysis", "inference", "main_idea", "detail"],
    focus_topics: &["comprehension", "analysis", "academic"],
};

pub const LISTENING: SkillCategory = SkillCategory {
    name: "listening",
    keywords: &["conversation", "dialogue", "spoken", "audio", "communication"],
    focus_topics: &["conversation", "everyday", "communication"],
};

pub const VOCAB: SkillCategory = SkillCategory {
    name: "vocab",
    keywords: &["vocabulary", "word", "meaning", "definition", "synonym"],
    focus_topics: &["vocabulary", "academic", "business"],
};

pub const SKILL_CATEGORIES: &[SkillCategory] = &[GRAMMAR, READING, LISTENING, VOCAB];

impl SkillCategory {
    /// Find a category by name, accepting "vocabulary" for "vocab"
    pub fn lookup(name: &str) -> Option<SkillCategory> {
        let name = name.trim().to_lowercase();
        SKILL_CATEGORIES
            .iter()
            .copied()
            .find(|c| c.name == name || name.starts_with(c.name))
    }

    /// Share of an item's topics and grammar patterns that mention this category
    pub fn relevance(&self, topics: &[String], grammar_patterns: &[String]) -> f32 {
        let total = topics.len() + grammar_patterns.len();
        if total == 0 {
            return 0.0;
        }

        let mentions = |label: &String| {
            let label = label.to_lowercase();
            self.keywords.iter().any(|k| label.contains(k))
        };
        let matches = topics.iter().filter(|t| mentions(*t)).count()
            + grammar_patterns.iter().filter(|p| mentions(*p)).count();

        matches as f32 / total as f32
    }
}

impl Serialize for SkillCategory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name)
    }
}

/// Hint for what kind of reading session fits right now
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionType {
    #[default]
    GeneralPractice,
    VocabularyFocus,
    SpeedReading,
    ComprehensionFocus,
    ExamPreparation,
    TopicExploration,
}

impl SessionType {
    pub fn for_session(available_minutes: u32, vocabulary_weakness: bool) -> Self {
        if available_minutes < 5 {
            SessionType::SpeedReading
        } else if available_minutes > 20 {
            SessionType::ComprehensionFocus
        } else if vocabulary_weakness {
            SessionType::VocabularyFocus
        } else {
            SessionType::GeneralPractice
        }
    }
}

pub const WEAK_AREA_THRESHOLD: f32 = 0.70;
pub const RECENT_TOPIC_WINDOW: usize = 20;
pub const RECENT_READING_WINDOW: usize = 10;
/// Assumed reading accuracy for a learner with no reading history
pub const DEFAULT_READING_ACCURACY: f32 = 0.75;
pub const MIN_TREND_SAMPLES: usize = 5;

/// Everything derived from one log snapshot
#[derive(Debug, Clone, Serialize)]
pub struct PerformanceSignals {
    pub weak_areas: Vec<SkillCategory>,
    pub recent_topics: Vec<String>,
    pub recent_reading_accuracy: f32,
    pub accuracy_trend: f32,
    pub vocabulary_weakness: bool,
}

impl PerformanceSignals {
    pub fn extract(logs: &[PerformanceLogEntry]) -> Self {
        let reading = recent_matching(logs, "reading", RECENT_READING_WINDOW);
        Self {
            weak_areas: weak_areas(logs),
            recent_topics: recent_topics(logs),
            recent_reading_accuracy: accuracy(&reading).unwrap_or(DEFAULT_READING_ACCURACY),
            accuracy_trend: accuracy_trend(&reading),
            vocabulary_weakness: has_vocabulary_weakness(logs),
        }
    }
}

/// Curriculum week implied by the number of completed tasks, in 1..=30
pub fn current_week(completed_tasks: usize) -> u32 {
    (completed_tasks / 10).clamp(1, MAX_WEEK as usize) as u32
}

/// Categories whose matching logs fall below 70% accuracy
///
/// A category with no matching logs counts as fully accurate.
pub fn weak_areas(logs: &[PerformanceLogEntry]) -> Vec<SkillCategory> {
    SKILL_CATEGORIES
        .iter()
        .copied()
        .filter(|category| {
            let matching: Vec<&PerformanceLogEntry> =
                logs.iter().filter(|log| log.matches(category.name)).collect();
            accuracy(&matching).unwrap_or(1.0) < WEAK_AREA_THRESHOLD
        })
        .collect()
}

/// Lowercased categories of the 20 latest logs, newest first, without repeats
pub fn recent_topics(logs: &[PerformanceLogEntry]) -> Vec<String> {
    let mut sorted: Vec<&PerformanceLogEntry> = logs.iter().collect();
    sorted.sort_by(|a, b| b.timestamp_millis.cmp(&a.timestamp_millis));

    let mut seen = HashSet::new();
    sorted
        .into_iter()
        .take(RECENT_TOPIC_WINDOW)
        .map(|log| log.category.to_lowercase())
        .filter(|topic| seen.insert(topic.clone()))
        .collect()
}

/// Accuracy over the 10 latest reading logs, 0.75 when there are none
pub fn recent_reading_accuracy(logs: &[PerformanceLogEntry]) -> f32 {
    accuracy(&recent_matching(logs, "reading", RECENT_READING_WINDOW))
        .unwrap_or(DEFAULT_READING_ACCURACY)
}

/// Second-half minus first-half accuracy of the given logs in time order
///
/// Needs at least five logs; fewer yield 0.
pub fn accuracy_trend(logs: &[&PerformanceLogEntry]) -> f32 {
    if logs.len() < MIN_TREND_SAMPLES {
        return 0.0;
    }

    let mut sorted = logs.to_vec();
    sorted.sort_by_key(|log| log.timestamp_millis);
    let (first, second) = sorted.split_at(sorted.len() / 2);

    accuracy(second).unwrap_or(0.0) - accuracy(first).unwrap_or(0.0)
}

/// Trend over the 10 latest reading logs
pub fn reading_trend(logs: &[PerformanceLogEntry]) -> f32 {
    accuracy_trend(&recent_matching(logs, "reading", RECENT_READING_WINDOW))
}

pub fn has_vocabulary_weakness(logs: &[PerformanceLogEntry]) -> bool {
    accuracy(&recent_matching(logs, "vocab", RECENT_READING_WINDOW))
        .map(|acc| acc < WEAK_AREA_THRESHOLD)
        .unwrap_or(false)
}

/// The `limit` newest logs whose category contains `needle`
fn recent_matching<'a>(
    logs: &'a [PerformanceLogEntry],
    needle: &str,
    limit: usize,
) -> Vec<&'a PerformanceLogEntry> {
    let mut matching: Vec<&PerformanceLogEntry> =
        logs.iter().filter(|log| log.matches(needle)).collect();
    matching.sort_by(|a, b| b.timestamp_millis.cmp(&a.timestamp_millis));
    matching.truncate(limit);
    matching
}

fn accuracy(logs: &[&PerformanceLogEntry]) -> Option<f32> {
    if logs.is_empty() {
        return None;
    }
    let correct = logs.iter().filter(|log| log.correct).count();
    Some(correct as f32 / logs.len() as f32)
}

/// Longer-run view of reading history
#[derive(Debug, Clone, Serialize)]
pub struct ReadingProfile {
    pub strong_topics: Vec<String>,
    pub challenging_topics: Vec<String>,
    pub preferred_minutes: u32,
}

const STRONG_TOPIC_ACCURACY: f32 = 0.8;
const CHALLENGING_TOPIC_ACCURACY: f32 = 0.6;
const DEFAULT_PREFERRED_MINUTES: u32 = 12;

impl ReadingProfile {
    pub fn from_logs(logs: &[PerformanceLogEntry]) -> Self {
        let reading: Vec<&PerformanceLogEntry> =
            logs.iter().filter(|log| log.matches("reading")).collect();

        if reading.is_empty() {
            return Self {
                strong_topics: Vec::new(),
                challenging_topics: Vec::new(),
                preferred_minutes: DEFAULT_PREFERRED_MINUTES,
            };
        }

        // (correct, total) per lowercased category, in first-seen order
        let mut order: Vec<String> = Vec::new();
        let mut tallies: HashMap<String, (usize, usize)> = HashMap::new();
        for log in &reading {
            let key = log.category.to_lowercase();
            let tally = tallies.entry(key.clone()).or_insert_with(|| {
                order.push(key);
                (0, 0)
            });
            tally.1 += 1;
            if log.correct {
                tally.0 += 1;
            }
        }

        let topic_accuracy = |topic: &String| {
            let (correct, total) = tallies[topic];
            correct as f32 / total as f32
        };

        let mean_minutes =
            reading.iter().map(|log| log.minutes_spent as f64).sum::<f64>() / reading.len() as f64;

        Self {
            strong_topics: order
                .iter()
                .filter(|t| topic_accuracy(*t) > STRONG_TOPIC_ACCURACY)
                .cloned()
                .collect(),
            challenging_topics: order
                .iter()
                .filter(|t| topic_accuracy(*t) < CHALLENGING_TOPIC_ACCURACY)
                .cloned()
                .collect(),
            preferred_minutes: (mean_minutes.round() as u32).clamp(5, 25),
        }
    }
}
