//! Curation Engine
//!
//! Scores reading content against a per-call context and drives the
//! recommendation entry points. Every call works on an immutable catalog plus
//! a log snapshot; nothing is cached between calls.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use super::catalog::ContentCatalog;
use super::content::{ContentItem, DifficultyLevel};
use super::difficulty;
use super::metrics::{PerformanceTimer, QualityAnalyzer, RecommendationMetrics};
use super::rotation::{TopicPreferences, TopicRotationState};
use super::sampler::{Selection, SelectionSampler, DEFAULT_PARALLEL_THRESHOLD, DEFAULT_TOP_K};
use super::signals::{
    current_week, reading_trend, recent_reading_accuracy, PerformanceLogEntry, PerformanceSignals,
    SessionType, SkillCategory,
};
use crate::error::{Error, Result};

/// Mastery above this counts a focus word as known
pub const KNOWN_WORD_MASTERY: f32 = 0.7;

/// Why this item was recommended
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecommendationReason {
    /// Duration fits the time budget
    TimeFit { estimated_minutes: u32, available_minutes: u32 },
    /// At the learner's current level
    DifficultyMatch { level: DifficultyLevel },
    /// Trains a weak skill area
    WeakAreaFocus { categories: Vec<String> },
    /// Topics not seen lately
    TopicFreshness { topics: Vec<String> },
    /// Mix of known and new focus words
    VocabularyChallenge { focus_words: usize },
    /// Nothing fit the budget; closest duration instead
    ClosestDuration { estimated_minutes: u32, available_minutes: u32 },
}

impl RecommendationReason {
    pub fn kind(&self) -> &'static str {
        match self {
            RecommendationReason::TimeFit { .. } => "time_fit",
            RecommendationReason::DifficultyMatch { .. } => "difficulty_match",
            RecommendationReason::WeakAreaFocus { .. } => "weak_area_focus",
            RecommendationReason::TopicFreshness { .. } => "topic_freshness",
            RecommendationReason::VocabularyChallenge { .. } => "vocabulary_challenge",
            RecommendationReason::ClosestDuration { .. } => "closest_duration",
        }
    }
}

/// Term weights (can be tuned)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub time_fit: f32,
    pub difficulty_match: f32,
    /// Cap on the summed weak-area relevance
    pub weak_area_cap: f32,
    pub topic_variety: f32,
    pub vocabulary: f32,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            time_fit: 0.25,
            difficulty_match: 0.20,
            weak_area_cap: 0.30,
            topic_variety: 0.15,
            vocabulary: 0.10,
        }
    }
}

impl ScoringWeights {
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("time_fit", self.time_fit),
            ("difficulty_match", self.difficulty_match),
            ("weak_area_cap", self.weak_area_cap),
            ("topic_variety", self.topic_variety),
            ("vocabulary", self.vocabulary),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::InvalidConfig {
                    key: "CURATOR_WEIGHTS_FILE",
                    message: format!("weight {} must be a non-negative number, got {}", name, value)
                        .into(),
                });
            }
        }
        Ok(())
    }
}

/// One value per scoring term
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct TermScores {
    pub time_fit: f32,
    pub difficulty_match: f32,
    pub weak_area: f32,
    pub topic_variety: f32,
    pub vocabulary: f32,
}

impl TermScores {
    fn sum(&self) -> f32 {
        self.time_fit
            + self.difficulty_match
            + self.weak_area
            + self.topic_variety
            + self.vocabulary
    }
}

/// Raw terms, their weighted contributions and the clamped total
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub terms: TermScores,
    pub contributions: TermScores,
    pub score: f32,
    pub reason: RecommendationReason,
}

/// A scored item
#[derive(Debug, Clone, Serialize)]
pub struct ScoredContent {
    pub item: ContentItem,
    pub score: f32,
    pub reason: RecommendationReason,
    pub terms: TermScores,
    pub contributions: TermScores,
}

impl ScoredContent {
    pub fn new(item: ContentItem, breakdown: ScoreBreakdown) -> Self {
        Self {
            item,
            score: breakdown.score,
            reason: breakdown.reason,
            terms: breakdown.terms,
            contributions: breakdown.contributions,
        }
    }
}

/// Everything the scorer knows about one request
#[derive(Debug, Clone)]
pub struct RecommendationContext {
    pub available_minutes: u32,
    pub current_week: u32,
    pub weak_areas: Vec<SkillCategory>,
    pub vocabulary_mastery: HashMap<String, f32>,
    pub recent_topics: Vec<String>,
    pub preferred_difficulty: Option<DifficultyLevel>,
    pub hour_of_day: u32,
    pub session_type: SessionType,
    pub rotation: TopicRotationState,
    pub now_millis: i64,
}

impl RecommendationContext {
    /// Context with no learner history
    pub fn new(available_minutes: u32, current_week: u32) -> Self {
        Self {
            available_minutes,
            current_week,
            weak_areas: Vec::new(),
            vocabulary_mastery: HashMap::new(),
            recent_topics: Vec::new(),
            preferred_difficulty: None,
            hour_of_day: 12,
            session_type: SessionType::for_session(available_minutes, false),
            rotation: TopicRotationState::default(),
            now_millis: 0,
        }
    }
}

// ---- Scoring terms (pure functions) ----

/// `1 - |est - avail| / avail`, clamped to [0,1]; 0 when no time is available
pub fn time_fit(estimated_minutes: u32, available_minutes: u32) -> f32 {
    if available_minutes == 0 {
        return 0.0;
    }
    let gap = (estimated_minutes as f32 - available_minutes as f32).abs();
    (1.0 - gap / available_minutes as f32).clamp(0.0, 1.0)
}

pub fn difficulty_match(item: DifficultyLevel, preferred: Option<DifficultyLevel>) -> f32 {
    if preferred == Some(item) {
        1.0
    } else {
        0.5
    }
}

/// Tiered value of an item's focus words against the learner's mastery
pub fn vocabulary_alignment(focus: &[String], mastery: &HashMap<String, f32>) -> f32 {
    if focus.is_empty() {
        return 0.5;
    }

    let unknown = focus
        .iter()
        .filter(|word| mastery.get(*word).map_or(true, |&m| m <= KNOWN_WORD_MASTERY))
        .count();
    let unknown_ratio = unknown as f32 / focus.len() as f32;

    if unknown == 0 {
        0.3
    } else if unknown_ratio > 0.7 {
        0.2
    } else {
        1.0
    }
}

/// Score one item; every weighted term is clamped to its own range first
pub fn score_breakdown(
    item: &ContentItem,
    ctx: &RecommendationContext,
    weights: &ScoringWeights,
) -> ScoreBreakdown {
    let weak_relevance: Vec<(&SkillCategory, f32)> = ctx
        .weak_areas
        .iter()
        .map(|category| (category, category.relevance(&item.topics, &item.grammar_patterns)))
        .collect();

    let terms = TermScores {
        time_fit: time_fit(item.minutes(), ctx.available_minutes),
        difficulty_match: difficulty_match(item.difficulty, ctx.preferred_difficulty),
        weak_area: weak_relevance.iter().map(|(_, r)| r).sum(),
        topic_variety: ctx.rotation.average_weight(&item.topics, ctx.now_millis),
        vocabulary: vocabulary_alignment(&item.vocabulary_focus, &ctx.vocabulary_mastery),
    };

    let contributions = TermScores {
        time_fit: weighted(weights.time_fit, terms.time_fit),
        difficulty_match: weighted(weights.difficulty_match, terms.difficulty_match),
        weak_area: capped(terms.weak_area, weights.weak_area_cap),
        topic_variety: capped(
            weighted(weights.topic_variety, terms.topic_variety),
            weights.topic_variety,
        ),
        vocabulary: weighted(weights.vocabulary, terms.vocabulary),
    };

    let score = contributions.sum().clamp(0.0, 1.0);

    // Primary reason is the largest contribution; earlier terms win ties
    let candidates = [
        contributions.time_fit,
        contributions.difficulty_match,
        contributions.weak_area,
        contributions.topic_variety,
        contributions.vocabulary,
    ];
    let mut primary = 0;
    for (pos, value) in candidates.iter().enumerate() {
        if *value > candidates[primary] {
            primary = pos;
        }
    }

    let reason = match primary {
        0 => RecommendationReason::TimeFit {
            estimated_minutes: item.minutes(),
            available_minutes: ctx.available_minutes,
        },
        1 => RecommendationReason::DifficultyMatch {
            level: item.difficulty,
        },
        2 => RecommendationReason::WeakAreaFocus {
            categories: weak_relevance
                .iter()
                .filter(|(_, r)| *r > 0.0)
                .map(|(c, _)| c.name.to_string())
                .collect(),
        },
        3 => RecommendationReason::TopicFreshness {
            topics: item.topics.clone(),
        },
        _ => RecommendationReason::VocabularyChallenge {
            focus_words: item.vocabulary_focus.len(),
        },
    };

    ScoreBreakdown {
        terms,
        contributions,
        score,
        reason,
    }
}

/// Non-negative product; NaN maps to 0
fn weighted(weight: f32, term: f32) -> f32 {
    (weight * term).max(0.0)
}

/// `value` limited to [0, cap]; a negative or NaN cap allows nothing
fn capped(value: f32, cap: f32) -> f32 {
    value.max(0.0).min(cap.max(0.0))
}

/// Scalar score in [0,1]
pub fn score(item: &ContentItem, ctx: &RecommendationContext, weights: &ScoringWeights) -> f32 {
    score_breakdown(item, ctx, weights).score
}

// ---- Engine ----

/// Read-only view of one learner at call time
#[derive(Debug, Clone, Default)]
pub struct LearnerSnapshot {
    pub logs: Vec<PerformanceLogEntry>,
    pub completed_tasks: usize,
    pub vocabulary_mastery: HashMap<String, f32>,
    pub topic_preferences: TopicPreferences,
}

impl LearnerSnapshot {
    pub fn current_week(&self) -> u32 {
        current_week(self.completed_tasks)
    }
}

/// A single recommendation request
#[derive(Debug, Clone, Copy)]
pub struct RecommendationQuery {
    pub available_minutes: u32,
    pub now_millis: i64,
    pub hour_of_day: u32,
}

impl RecommendationQuery {
    /// Query stamped with the current wall clock
    pub fn now(available_minutes: u32) -> Self {
        Self::at(available_minutes, chrono::Utc::now().timestamp_millis())
    }

    /// Query at a fixed instant; `hour_of_day` is the UTC hour
    pub fn at(available_minutes: u32, now_millis: i64) -> Self {
        use chrono::Timelike;
        let hour_of_day = chrono::DateTime::from_timestamp_millis(now_millis)
            .map(|dt| dt.hour())
            .unwrap_or(0);
        Self {
            available_minutes,
            now_millis,
            hour_of_day,
        }
    }
}

/// Outcome of `CurationEngine::recommend`
#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    pub selection: Selection,
    pub current_week: u32,
    pub difficulty: Option<DifficultyLevel>,
    pub session_type: SessionType,
    pub metrics: RecommendationMetrics,
}

impl Recommendation {
    pub fn item(&self) -> &ContentItem {
        &self.selection.choice.item
    }
}

/// A category-focused match
#[derive(Debug, Clone, Serialize)]
pub struct CategoryMatch {
    pub item: ContentItem,
    pub relevance: f32,
}

/// Engine tunables outside the scoring weights
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub top_k: usize,
    pub focus_limit: usize,
    pub parallel_threshold: usize,
    pub slow_threshold_ms: u64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            focus_limit: 10,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
            slow_threshold_ms: 50,
        }
    }
}

/// Main curation engine
#[derive(Clone)]
pub struct CurationEngine {
    catalog: Arc<ContentCatalog>,
    weights: ScoringWeights,
    settings: EngineSettings,
    sampler: SelectionSampler,
}

impl CurationEngine {
    pub fn new(catalog: Arc<ContentCatalog>) -> Self {
        Self::assemble(catalog, ScoringWeights::default(), EngineSettings::default())
    }

    /// Engine with custom weights; rejects negative or non-finite weights
    pub fn with_settings(
        catalog: Arc<ContentCatalog>,
        weights: ScoringWeights,
        settings: EngineSettings,
    ) -> Result<Self> {
        weights.validate()?;
        Ok(Self::assemble(catalog, weights, settings))
    }

    fn assemble(
        catalog: Arc<ContentCatalog>,
        weights: ScoringWeights,
        settings: EngineSettings,
    ) -> Self {
        let sampler = SelectionSampler::new(settings.top_k, settings.parallel_threshold);
        Self {
            catalog,
            weights,
            settings,
            sampler,
        }
    }

    pub fn catalog(&self) -> &ContentCatalog {
        &self.catalog
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// Derive the per-call scoring context from a snapshot
    pub fn build_context(
        &self,
        query: &RecommendationQuery,
        snapshot: &LearnerSnapshot,
    ) -> RecommendationContext {
        let signals = PerformanceSignals::extract(&snapshot.logs);
        let week = snapshot.current_week();

        RecommendationContext {
            available_minutes: query.available_minutes,
            current_week: week,
            weak_areas: signals.weak_areas,
            vocabulary_mastery: snapshot.vocabulary_mastery.clone(),
            recent_topics: signals.recent_topics,
            preferred_difficulty: Some(difficulty::baseline(week, signals.recent_reading_accuracy)),
            hour_of_day: query.hour_of_day,
            session_type: SessionType::for_session(
                query.available_minutes,
                signals.vocabulary_weakness,
            ),
            rotation: TopicRotationState::from_logs(
                &snapshot.logs,
                query.now_millis,
                &snapshot.topic_preferences,
            ),
            now_millis: query.now_millis,
        }
    }

    /// Recommend one item for the time budget, `None` for an empty catalog
    #[instrument(skip(self, snapshot, rng), fields(minutes = query.available_minutes))]
    pub fn recommend<R: Rng + ?Sized>(
        &self,
        query: &RecommendationQuery,
        snapshot: &LearnerSnapshot,
        rng: &mut R,
    ) -> Option<Recommendation> {
        let timer = PerformanceTimer::new("recommend");

        if self.catalog.is_empty() {
            debug!("Empty catalog, nothing to recommend");
            return None;
        }

        let ctx = self.build_context(query, snapshot);
        let pool = self.catalog.candidates_for_week(ctx.current_week);
        let selection = self.sampler.select(&pool, &ctx, &self.weights, rng)?;

        let metrics =
            RecommendationMetrics::from_selection(&selection, ctx.current_week, timer.elapsed_ms());
        metrics.record();
        for issue in QualityAnalyzer::detect_issues(&metrics) {
            debug!("Recommendation quality: {}", issue);
        }
        timer.log_if_slow(self.settings.slow_threshold_ms);

        info!(
            "📖 Recommended {} ({} min, {}) for week {} with score {:.3}",
            selection.choice.item.id,
            selection.choice.item.minutes(),
            selection.choice.item.difficulty,
            ctx.current_week,
            selection.choice.score
        );

        Some(Recommendation {
            selection,
            current_week: ctx.current_week,
            difficulty: ctx.preferred_difficulty,
            session_type: ctx.session_type,
            metrics,
        })
    }

    /// Week-appropriate items aimed at one skill category, most relevant first
    #[instrument(skip(self, category, snapshot), fields(category = category.name))]
    pub fn rank_for_category(
        &self,
        category: &SkillCategory,
        snapshot: &LearnerSnapshot,
    ) -> Vec<CategoryMatch> {
        let week = snapshot.current_week();
        let ceiling = DifficultyLevel::from_week(week + 2);

        let mut matches: Vec<CategoryMatch> = self
            .catalog
            .candidates_for_week(week)
            .into_iter()
            .filter(|item| {
                item.eligible_weeks.contains(week)
                    && item.difficulty <= ceiling
                    && item
                        .topics
                        .iter()
                        .any(|t| category.focus_topics.contains(&t.as_str()))
            })
            .map(|item| CategoryMatch {
                relevance: category.relevance(&item.topics, &item.grammar_patterns),
                item: item.clone(),
            })
            .collect();

        matches.sort_by(|a, b| {
            b.relevance
                .partial_cmp(&a.relevance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        matches.truncate(self.settings.focus_limit);

        debug!("Ranked {} items for category {} in week {}", matches.len(), category.name, week);
        matches
    }

    /// Pick a topic to explore, favouring fresh and preferred ones
    pub fn recommend_topic<R: Rng + ?Sized>(
        &self,
        snapshot: &LearnerSnapshot,
        now_millis: i64,
        rng: &mut R,
    ) -> String {
        let rotation =
            TopicRotationState::from_logs(&snapshot.logs, now_millis, &snapshot.topic_preferences);
        let topic = rotation.select_topic(&self.catalog.topics(), now_millis, rng);
        debug!("Topic rotation picked {}", topic);
        topic
    }

    /// Week baseline adjusted by recent reading accuracy
    pub fn optimal_difficulty(&self, snapshot: &LearnerSnapshot) -> DifficultyLevel {
        difficulty::baseline(snapshot.current_week(), recent_reading_accuracy(&snapshot.logs))
    }

    /// Post-session suggestion; `base` defaults to the optimal difficulty
    pub fn predict_difficulty(
        &self,
        base: Option<DifficultyLevel>,
        snapshot: &LearnerSnapshot,
    ) -> DifficultyLevel {
        let base = base.unwrap_or_else(|| self.optimal_difficulty(snapshot));
        difficulty::predict(
            base,
            recent_reading_accuracy(&snapshot.logs),
            reading_trend(&snapshot.logs),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recommendation::content::tests::item;
    use crate::recommendation::content::WeekRange;
    use crate::recommendation::signals::{GRAMMAR, VOCAB};
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const NOW: i64 = 1_700_000_000_000;

    fn words(list: &[&str]) -> Vec<String> {
        list.iter().map(|w| w.to_string()).collect()
    }

    fn engine(items: Vec<ContentItem>) -> CurationEngine {
        CurationEngine::new(Arc::new(ContentCatalog::new(items).unwrap()))
    }

    fn reading_logs(correct: usize, total: usize) -> Vec<PerformanceLogEntry> {
        (0..total)
            .map(|i| PerformanceLogEntry::new("reading", i < correct, NOW - (total - i) as i64))
            .collect()
    }

    #[test]
    fn test_time_fit_zero_budget() {
        assert_eq!(time_fit(10, 0), 0.0);
        assert_eq!(time_fit(0, 0), 0.0);
    }

    #[test]
    fn test_time_fit_values() {
        assert_eq!(time_fit(10, 10), 1.0);
        assert_relative_eq!(time_fit(5, 10), 0.5);
        assert_eq!(time_fit(40, 10), 0.0);
    }

    #[test]
    fn test_difficulty_match_is_soft() {
        assert_eq!(difficulty_match(DifficultyLevel::B1, Some(DifficultyLevel::B1)), 1.0);
        assert_eq!(difficulty_match(DifficultyLevel::B1, Some(DifficultyLevel::C1)), 0.5);
        assert_eq!(difficulty_match(DifficultyLevel::B1, None), 0.5);
    }

    #[test]
    fn test_vocabulary_alignment_tiers() {
        let mut mastery = HashMap::new();
        mastery.insert("alpha".to_string(), 0.9);
        mastery.insert("beta".to_string(), 0.9);
        mastery.insert("gamma".to_string(), 0.7);

        assert_eq!(vocabulary_alignment(&[], &mastery), 0.5);
        assert_eq!(vocabulary_alignment(&words(&["alpha", "beta"]), &mastery), 0.3);
        assert_eq!(vocabulary_alignment(&words(&["alpha", "gamma"]), &mastery), 1.0);
        // exactly 0.7 mastery is still unknown
        assert_eq!(vocabulary_alignment(&words(&["gamma", "delta", "eps", "zeta"]), &mastery), 0.2);
    }

    #[test]
    fn test_weak_area_bonus_capped() {
        let mut grammar = item("g", DifficultyLevel::B1, 10, &["grammar", "syntax"]);
        grammar.grammar_patterns = words(&["past tense"]);
        let mut ctx = RecommendationContext::new(10, 5);
        ctx.weak_areas = vec![GRAMMAR, VOCAB];

        let breakdown = score_breakdown(&grammar, &ctx, &ScoringWeights::default());
        assert_eq!(breakdown.terms.weak_area, 1.0);
        assert_relative_eq!(breakdown.contributions.weak_area, 0.3);
        assert!(matches!(
            breakdown.reason,
            RecommendationReason::WeakAreaFocus { ref categories }
                if categories == &vec!["grammar".to_string()]
        ));
    }

    #[test]
    fn test_topic_variety_bounded_by_weight() {
        let prefs = TopicPreferences {
            avoided: Vec::new(),
            preferred: words(&["news"]),
        };
        let mut ctx = RecommendationContext::new(10, 5);
        ctx.rotation = TopicRotationState::from_logs(&[], NOW, &prefs);
        ctx.now_millis = NOW;

        let news = item("n", DifficultyLevel::B1, 10, &["news"]);
        let breakdown = score_breakdown(&news, &ctx, &ScoringWeights::default());
        assert_eq!(breakdown.terms.topic_variety, 1.5);
        assert_relative_eq!(breakdown.contributions.topic_variety, 0.15);
    }

    #[test]
    fn test_single_item_scenario() {
        let mut news = item("only", DifficultyLevel::B1, 10, &["news"]);
        news.eligible_weeks = WeekRange::new(1, 10);
        let engine = engine(vec![news]);

        let mut ctx = RecommendationContext::new(10, 5);
        ctx.preferred_difficulty = Some(DifficultyLevel::B1);

        let pool = engine.catalog().candidates_for_week(5);
        let selection = SelectionSampler::default()
            .select(&pool, &ctx, engine.weights(), &mut ChaCha8Rng::seed_from_u64(0))
            .unwrap();

        assert!(!selection.fallback);
        assert_eq!(selection.eligible_count, 1);
        assert_eq!(selection.choice.item.id, "only");
        assert_eq!(selection.choice.terms.difficulty_match, 1.0);
        assert_eq!(selection.choice.terms.time_fit, 1.0);
    }

    #[test]
    fn test_score_in_unit_range() {
        let mut heavy = item("h", DifficultyLevel::B1, 10, &["grammar"]);
        heavy.grammar_patterns = words(&["clause"]);
        let mut ctx = RecommendationContext::new(10, 5);
        ctx.preferred_difficulty = Some(DifficultyLevel::B1);
        ctx.weak_areas = vec![GRAMMAR];
        let weights = ScoringWeights {
            time_fit: 1.0,
            difficulty_match: 1.0,
            weak_area_cap: 1.0,
            topic_variety: 1.0,
            vocabulary: 1.0,
        };
        assert_eq!(score(&heavy, &ctx, &weights), 1.0);
    }

    #[test]
    fn test_weights_validation() {
        assert!(ScoringWeights::default().validate().is_ok());
        let bad = ScoringWeights {
            vocabulary: -0.1,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
        let nan = ScoringWeights {
            time_fit: f32::NAN,
            ..Default::default()
        };
        assert!(nan.validate().is_err());
    }

    #[test]
    fn test_with_settings_rejects_negative_weight() {
        let items = vec![item("n", DifficultyLevel::A2, 8, &["news"])];
        let catalog = Arc::new(ContentCatalog::new(items).unwrap());
        let weights = ScoringWeights {
            topic_variety: -0.1,
            ..Default::default()
        };
        let result = CurationEngine::with_settings(catalog, weights, EngineSettings::default());
        assert!(matches!(result, Err(Error::InvalidConfig { .. })));
    }

    #[test]
    fn test_score_tolerates_unvalidated_weights() {
        let mut passage = item("p", DifficultyLevel::B1, 10, &["grammar"]);
        passage.grammar_patterns = words(&["clause"]);
        let mut ctx = RecommendationContext::new(10, 5);
        ctx.weak_areas = vec![GRAMMAR];

        for bad in [-0.1, f32::NAN] {
            let weights = ScoringWeights {
                time_fit: bad,
                weak_area_cap: bad,
                topic_variety: bad,
                ..Default::default()
            };
            let breakdown = score_breakdown(&passage, &ctx, &weights);
            assert!((0.0..=1.0).contains(&breakdown.score));
            assert_eq!(breakdown.contributions.time_fit, 0.0);
            assert_eq!(breakdown.contributions.weak_area, 0.0);
            assert_eq!(breakdown.contributions.topic_variety, 0.0);
        }
    }

    #[test]
    fn test_query_hour_is_utc() {
        // 2023-11-14T22:13:20Z
        assert_eq!(RecommendationQuery::at(10, NOW).hour_of_day, 22);
        let query = RecommendationQuery::now(10);
        assert_eq!(RecommendationQuery::at(10, query.now_millis).hour_of_day, query.hour_of_day);
    }

    #[test]
    fn test_recommend_empty_catalog() {
        let engine = CurationEngine::new(Arc::new(ContentCatalog::empty()));
        let picked = engine.recommend(
            &RecommendationQuery::at(10, NOW),
            &LearnerSnapshot::default(),
            &mut ChaCha8Rng::seed_from_u64(1),
        );
        assert!(picked.is_none());
    }

    #[test]
    fn test_recommend_uses_baseline_difficulty() {
        // new learner: week 1, default accuracy 0.75 holds at A2
        let engine = engine(vec![
            item("a2", DifficultyLevel::A2, 8, &["news"]),
            item("b2", DifficultyLevel::B2, 8, &["news"]),
        ]);
        let rec = engine
            .recommend(
                &RecommendationQuery::at(10, NOW),
                &LearnerSnapshot::default(),
                &mut ChaCha8Rng::seed_from_u64(5),
            )
            .unwrap();
        assert_eq!(rec.current_week, 1);
        assert_eq!(rec.difficulty, Some(DifficultyLevel::A2));
        assert_eq!(rec.item().id, "a2");
        assert_eq!(rec.selection.eligible_count, 1);
    }

    #[test]
    fn test_rank_for_category() {
        let mut pure = item("pure", DifficultyLevel::A2, 5, &["grammar", "syntax"]);
        pure.grammar_patterns = words(&["clause"]);
        let mixed = item("mixed", DifficultyLevel::A2, 5, &["grammar", "news", "culture"]);
        let too_hard = item("hard", DifficultyLevel::C1, 5, &["grammar"]);
        let off_topic = item("off", DifficultyLevel::A2, 5, &["news"]);
        let engine = engine(vec![mixed, too_hard, pure, off_topic]);

        let ranked = engine.rank_for_category(&GRAMMAR, &LearnerSnapshot::default());
        let ids: Vec<&str> = ranked.iter().map(|m| m.item.id.as_str()).collect();
        assert_eq!(ids, vec!["pure", "mixed"]);
        assert_eq!(ranked[0].relevance, 1.0);
    }

    #[test]
    fn test_rank_for_category_most_relevant_first() {
        let partial = item("partial", DifficultyLevel::A2, 5, &["grammar", "news"]);
        let mut full = item("full", DifficultyLevel::A2, 5, &["grammar"]);
        full.grammar_patterns = words(&["relative clause"]);

        let engine = engine(vec![partial, full]);
        let ranked = engine.rank_for_category(&GRAMMAR, &LearnerSnapshot::default());
        let ids: Vec<&str> = ranked.iter().map(|m| m.item.id.as_str()).collect();
        assert_eq!(ids, vec!["full", "partial"]);
        assert_relative_eq!(ranked[0].relevance, 1.0);
        assert_relative_eq!(ranked[1].relevance, 0.5);
    }

    #[test]
    fn test_rank_for_category_limit() {
        let items: Vec<ContentItem> = (0..15)
            .map(|i| item(&format!("g{}", i), DifficultyLevel::A2, 5, &["grammar"]))
            .collect();
        let ranked = engine(items).rank_for_category(&GRAMMAR, &LearnerSnapshot::default());
        assert_eq!(ranked.len(), 10);
    }

    #[test]
    fn test_recommend_topic() {
        let engine = engine(vec![
            item("a", DifficultyLevel::A2, 5, &["news", "health"]),
            item("b", DifficultyLevel::A2, 5, &["culture"]),
        ]);
        let snapshot = LearnerSnapshot::default();
        let topic = engine.recommend_topic(&snapshot, NOW, &mut ChaCha8Rng::seed_from_u64(2));
        assert!(["news", "health", "culture"].contains(&topic.as_str()));

        let empty = CurationEngine::new(Arc::new(ContentCatalog::empty()));
        let topic = empty.recommend_topic(&snapshot, NOW, &mut ChaCha8Rng::seed_from_u64(2));
        assert_eq!(topic, "general");
    }

    #[test]
    fn test_optimal_difficulty_steps_up_on_perfect_reading() {
        let engine = engine(Vec::new());
        let snapshot = LearnerSnapshot {
            logs: reading_logs(10, 10),
            completed_tasks: 80,
            ..Default::default()
        };
        assert_eq!(engine.optimal_difficulty(&snapshot), DifficultyLevel::B1Plus);

        let senior = LearnerSnapshot {
            completed_tasks: 300,
            ..snapshot
        };
        assert_eq!(engine.optimal_difficulty(&senior), DifficultyLevel::C1);
    }

    #[test]
    fn test_predict_difficulty() {
        let engine = engine(Vec::new());
        // oldest half wrong, newest half right: accuracy 0.5, trend +1.0
        let logs: Vec<PerformanceLogEntry> = (0..10)
            .map(|i| PerformanceLogEntry::new("reading", i >= 5, NOW + i))
            .collect();
        let snapshot = LearnerSnapshot {
            logs,
            ..Default::default()
        };
        assert_eq!(
            engine.predict_difficulty(Some(DifficultyLevel::B2), &snapshot),
            DifficultyLevel::B1Plus
        );
        assert_eq!(
            engine.predict_difficulty(Some(DifficultyLevel::B2), &LearnerSnapshot::default()),
            DifficultyLevel::B2
        );
    }

    #[test]
    fn test_reason_serializes_tagged() {
        let json = serde_json::to_value(RecommendationReason::DifficultyMatch {
            level: DifficultyLevel::B1Plus,
        })
        .unwrap();
        assert_eq!(json["kind"], "difficulty_match");
        assert_eq!(json["level"], "B1+");
    }
}
