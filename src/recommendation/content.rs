//! Reading Content Model
//!
//! Immutable content records as handed over by the content loader, plus the
//! difficulty ladder and the readability heuristics derived from a record.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Six ordered proficiency bands, A2 (rank 1) through C1 (rank 6)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DifficultyLevel {
    #[serde(rename = "A2")]
    A2,
    #[serde(rename = "B1")]
    B1,
    #[serde(rename = "B1+", alias = "B1_PLUS")]
    B1Plus,
    #[serde(rename = "B2")]
    B2,
    #[serde(rename = "B2+", alias = "B2_PLUS")]
    B2Plus,
    #[serde(rename = "C1")]
    C1,
}

impl DifficultyLevel {
    pub const ALL: [DifficultyLevel; 6] = [
        DifficultyLevel::A2,
        DifficultyLevel::B1,
        DifficultyLevel::B1Plus,
        DifficultyLevel::B2,
        DifficultyLevel::B2Plus,
        DifficultyLevel::C1,
    ];

    pub const MIN_RANK: i32 = 1;
    pub const MAX_RANK: i32 = 6;

    /// Numeric rank in 1..=6
    pub fn rank(self) -> i32 {
        match self {
            DifficultyLevel::A2 => 1,
            DifficultyLevel::B1 => 2,
            DifficultyLevel::B1Plus => 3,
            DifficultyLevel::B2 => 4,
            DifficultyLevel::B2Plus => 5,
            DifficultyLevel::C1 => 6,
        }
    }

    pub fn from_rank(rank: i32) -> Option<Self> {
        Self::ALL.iter().copied().find(|level| level.rank() == rank)
    }

    /// Level a learner is expected to be at in a given curriculum week
    pub fn from_week(week: u32) -> Self {
        match week {
            0..=5 => DifficultyLevel::A2,
            6..=10 => DifficultyLevel::B1,
            11..=15 => DifficultyLevel::B1Plus,
            16..=22 => DifficultyLevel::B2,
            23..=28 => DifficultyLevel::B2Plus,
            _ => DifficultyLevel::C1,
        }
    }

    /// Move `delta` ranks up or down, clamped to the ladder ends
    pub fn step(self, delta: i32) -> Self {
        let rank = (self.rank() + delta).clamp(Self::MIN_RANK, Self::MAX_RANK);
        Self::from_rank(rank).unwrap_or(self)
    }

    pub fn code(self) -> &'static str {
        match self {
            DifficultyLevel::A2 => "A2",
            DifficultyLevel::B1 => "B1",
            DifficultyLevel::B1Plus => "B1+",
            DifficultyLevel::B2 => "B2",
            DifficultyLevel::B2Plus => "B2+",
            DifficultyLevel::C1 => "C1",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            DifficultyLevel::A2 => "A2 - Elementary",
            DifficultyLevel::B1 => "B1 - Intermediate",
            DifficultyLevel::B1Plus => "B1+ - Upper Intermediate",
            DifficultyLevel::B2 => "B2 - Upper Intermediate",
            DifficultyLevel::B2Plus => "B2+ - Advanced",
            DifficultyLevel::C1 => "C1 - Proficient",
        }
    }
}

impl fmt::Display for DifficultyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for DifficultyLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_uppercase().replace("_PLUS", "+");
        Self::ALL
            .iter()
            .copied()
            .find(|level| level.code() == normalized)
            .ok_or_else(|| Error::config(format!("unknown difficulty level '{}'", s)))
    }
}

/// Where a passage came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentSourceType {
    NewsArticle,
    AcademicText,
    BusinessCommunication,
    CulturalText,
    ExamPassage,
    #[default]
    Curated,
}

/// Inclusive range of curriculum weeks a passage suits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekRange {
    pub start: u32,
    pub end: u32,
}

impl WeekRange {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }

    pub fn contains(&self, week: u32) -> bool {
        self.start <= week && week <= self.end
    }
}

/// A piece of reading content
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: String,
    #[serde(default)]
    pub title: String,
    /// Full passage text, when the loader ships it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    pub difficulty: DifficultyLevel,
    /// Signed so that a malformed record can be parsed and then rejected
    pub estimated_minutes: i32,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub vocabulary_focus: Vec<String>,
    #[serde(default)]
    pub grammar_patterns: Vec<String>,
    #[serde(default)]
    pub word_count: u32,
    #[serde(default)]
    pub average_sentence_length: f32,
    /// Precomputed complexity; filled in by `validated` when the record omits it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complexity_score: Option<f32>,
    pub eligible_weeks: WeekRange,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comprehension_questions: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cultural_context: Option<String>,
    #[serde(default)]
    pub source_type: ContentSourceType,
}

/// Syllables per word assumed when no passage text is available
const DEFAULT_SYLLABLES_PER_WORD: f32 = 1.5;

impl ContentItem {
    /// Check the record invariants and normalize topics to a lowercase set
    ///
    /// Topic order is kept (first occurrence wins) so catalog iteration stays
    /// deterministic.
    pub fn validated(mut self) -> Result<Self> {
        if self.id.trim().is_empty() {
            return Err(Error::invalid_content("<blank>", "id must not be blank"));
        }
        if self.estimated_minutes < 0 {
            return Err(Error::invalid_content(
                self.id,
                format!("estimated_minutes is negative ({})", self.estimated_minutes),
            ));
        }
        if self.eligible_weeks.is_empty() {
            return Err(Error::invalid_content(
                self.id,
                format!(
                    "eligible_weeks {}..={} is empty",
                    self.eligible_weeks.start, self.eligible_weeks.end
                ),
            ));
        }
        if !self.average_sentence_length.is_finite() || self.average_sentence_length < 0.0 {
            return Err(Error::invalid_content(
                self.id,
                "average_sentence_length must be a non-negative number",
            ));
        }

        let complexity = self.complexity_score.unwrap_or_else(|| ComplexityAnalyzer::score(&self));
        if !(0.0..=1.0).contains(&complexity) {
            return Err(Error::invalid_content(
                self.id,
                format!("complexity_score {} is outside 0..=1", complexity),
            ));
        }
        self.complexity_score = Some(complexity);

        let mut seen = HashSet::new();
        self.topics = self
            .topics
            .into_iter()
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty() && seen.insert(t.clone()))
            .collect();

        Ok(self)
    }

    pub fn minutes(&self) -> u32 {
        self.estimated_minutes.max(0) as u32
    }

    /// Stored complexity, or the analyzer's estimate when none was given
    pub fn complexity(&self) -> f32 {
        self.complexity_score.unwrap_or_else(|| ComplexityAnalyzer::score(self))
    }

    pub fn is_advanced(&self) -> bool {
        self.difficulty >= DifficultyLevel::B2
    }

    /// Flesch reading-ease approximation, normalized to 0..=1 (higher = easier)
    pub fn readability_level(&self) -> f32 {
        let syllables = self
            .body
            .as_deref()
            .and_then(estimate_syllables_per_word)
            .unwrap_or(DEFAULT_SYLLABLES_PER_WORD);

        let ease = 206.835 - 1.015 * self.average_sentence_length - 84.6 * syllables;
        ease.clamp(0.0, 100.0) / 100.0
    }
}

/// Grammar patterns that count as complex (matched case-insensitively as substrings)
pub const COMPLEX_GRAMMAR_PATTERNS: &[&str] = &[
    "subjunctive",
    "conditional_perfect",
    "passive_voice",
    "relative_clauses",
    "gerund_infinitive",
    "modal_perfects",
];

const SENTENCE_LENGTH_CAP: f32 = 0.3;
const WORD_COUNT_CAP: f32 = 0.2;
const VOCABULARY_CAP: f32 = 0.3;
const GRAMMAR_CAP: f32 = 0.2;
/// Share given to a term whose list is empty
const EMPTY_LIST_FACTOR: f32 = 0.1;

/// Structural complexity estimate in 0..=1 (higher = harder)
///
/// Sum of four capped terms: sentence length (0.3), word count (0.2), share of
/// long or capitalized focus words (0.3) and share of complex grammar
/// patterns (0.2).
pub struct ComplexityAnalyzer;

impl ComplexityAnalyzer {
    pub fn score(item: &ContentItem) -> f32 {
        let total = Self::sentence_length_factor(item.average_sentence_length)
            + Self::word_count_factor(item.word_count)
            + Self::vocabulary_factor(&item.vocabulary_focus)
            + Self::grammar_factor(&item.grammar_patterns);
        total.clamp(0.0, 1.0)
    }

    pub fn sentence_length_factor(average_sentence_length: f32) -> f32 {
        (average_sentence_length / 25.0).clamp(0.0, SENTENCE_LENGTH_CAP)
    }

    pub fn word_count_factor(word_count: u32) -> f32 {
        (word_count as f32 / 1000.0).clamp(0.0, WORD_COUNT_CAP)
    }

    /// Words longer than eight characters or containing a capital letter
    pub fn vocabulary_factor(focus: &[String]) -> f32 {
        if focus.is_empty() {
            return EMPTY_LIST_FACTOR;
        }
        let complex = focus
            .iter()
            .filter(|word| word.chars().count() > 8 || word.chars().any(char::is_uppercase))
            .count();
        (complex as f32 / focus.len() as f32 * VOCABULARY_CAP).clamp(0.0, VOCABULARY_CAP)
    }

    pub fn grammar_factor(patterns: &[String]) -> f32 {
        if patterns.is_empty() {
            return EMPTY_LIST_FACTOR;
        }
        let complex = patterns
            .iter()
            .filter(|pattern| {
                let pattern = pattern.to_lowercase();
                COMPLEX_GRAMMAR_PATTERNS.iter().any(|c| pattern.contains(c))
            })
            .count();
        (complex as f32 / patterns.len() as f32 * GRAMMAR_CAP).clamp(0.0, GRAMMAR_CAP)
    }
}

/// Average vowel-cluster count per whitespace-separated word
fn estimate_syllables_per_word(text: &str) -> Option<f32> {
    let mut words = 0usize;
    let mut syllables = 0usize;

    for word in text.split_whitespace() {
        let mut count = 0;
        let mut prev_vowel = false;
        for c in word.chars() {
            let vowel = matches!(c.to_ascii_lowercase(), 'a' | 'e' | 'i' | 'o' | 'u');
            if vowel && !prev_vowel {
                count += 1;
            }
            prev_vowel = vowel;
        }
        syllables += count.max(1);
        words += 1;
    }

    if words == 0 {
        None
    } else {
        Some(syllables as f32 / words as f32)
    }
}
