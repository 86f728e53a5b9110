//! Recommendation Metrics and Performance Monitoring
//!
//! Per-request quality metrics, a drop-logged timer and a small analyzer that
//! flags poor recommendations. Counters and histograms go through the
//! `metrics` facade; without an installed recorder they are no-ops.

use metrics::{counter, histogram};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::time::Instant;

use super::sampler::Selection;

/// Metrics for a single recommendation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationMetrics {
    pub request_id: String,
    pub timestamp: i64,

    // Performance metrics
    pub total_duration_ms: u64,

    // Pool metrics
    pub current_week: u32,
    pub pool_size: usize,
    pub eligible_count: usize,
    pub shortlist_size: usize,
    pub fallback: bool,

    // Quality metrics
    pub chosen_score: f32,
    pub avg_score: f32,
    pub reason_distribution: HashMap<String, usize>,
    pub unique_topics: usize,
}

impl Default for RecommendationMetrics {
    fn default() -> Self {
        Self {
            request_id: uuid::Uuid::new_v4().to_string(),
            timestamp: chrono::Utc::now().timestamp(),
            total_duration_ms: 0,
            current_week: 1,
            pool_size: 0,
            eligible_count: 0,
            shortlist_size: 0,
            fallback: false,
            chosen_score: 0.0,
            avg_score: 0.0,
            reason_distribution: HashMap::new(),
            unique_topics: 0,
        }
    }
}

impl RecommendationMetrics {
    pub fn from_selection(
        selection: &Selection,
        current_week: u32,
        total_duration_ms: u64,
    ) -> Self {
        let shortlist = &selection.shortlist;

        let mut reason_distribution = HashMap::new();
        for scored in shortlist {
            *reason_distribution.entry(scored.reason.kind().to_string()).or_insert(0) += 1;
        }

        let unique_topics = shortlist
            .iter()
            .flat_map(|scored| scored.item.topics.iter())
            .collect::<HashSet<_>>()
            .len();

        let avg_score = if shortlist.is_empty() {
            0.0
        } else {
            shortlist.iter().map(|s| s.score).sum::<f32>() / shortlist.len() as f32
        };

        Self {
            total_duration_ms,
            current_week,
            pool_size: selection.pool_size,
            eligible_count: selection.eligible_count,
            shortlist_size: shortlist.len(),
            fallback: selection.fallback,
            chosen_score: selection.choice.score,
            avg_score,
            reason_distribution,
            unique_topics,
            ..Default::default()
        }
    }

    /// Push this request's numbers to the metrics recorder
    pub fn record(&self) {
        let outcome = if self.fallback { "fallback" } else { "sampled" };
        counter!("curator_recommendations_total", "outcome" => outcome).increment(1);
        histogram!("curator_recommendation_duration_ms").record(self.total_duration_ms as f64);
        histogram!("curator_eligible_pool_size").record(self.eligible_count as f64);
        histogram!("curator_chosen_score").record(self.chosen_score as f64);
    }
}

/// Performance timer for tracking operation duration
pub struct PerformanceTimer {
    start: Instant,
    label: &'static str,
}

impl PerformanceTimer {
    pub fn new(label: &'static str) -> Self {
        Self {
            start: Instant::now(),
            label,
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    pub fn log_if_slow(&self, threshold_ms: u64) {
        let elapsed = self.elapsed_ms();
        if elapsed > threshold_ms {
            counter!("curator_slow_operations_total", "operation" => self.label).increment(1);
            tracing::warn!(
                "⚠️ Slow operation: {} took {}ms (threshold: {}ms)",
                self.label,
                elapsed,
                threshold_ms
            );
        }
    }
}

impl Drop for PerformanceTimer {
    fn drop(&mut self) {
        let elapsed = self.elapsed_ms();
        tracing::debug!("⏱️ {} completed in {}ms", self.label, elapsed);
    }
}

/// Recommendation quality analyzer
pub struct QualityAnalyzer;

impl QualityAnalyzer {
    /// Distinct topics per shortlisted item, scaled so two topics each is 1.0
    pub fn topic_diversity(unique_topics: usize, shortlist_size: usize) -> f32 {
        if shortlist_size == 0 {
            return 0.0;
        }
        (unique_topics as f32 / (shortlist_size as f32 * 2.0)).min(1.0)
    }

    /// Detect potential issues with recommendation quality
    pub fn detect_issues(metrics: &RecommendationMetrics) -> Vec<String> {
        let mut issues = Vec::new();

        if metrics.fallback {
            issues.push(format!(
                "No eligible content: fell back on closest duration out of {} items",
                metrics.pool_size
            ));
        }

        // Low diversity
        let diversity = Self::topic_diversity(metrics.unique_topics, metrics.shortlist_size);
        if metrics.shortlist_size > 1 && diversity < 0.3 {
            issues.push(format!("Low topic diversity: {:.2}", diversity));
        }

        // Too slow
        if metrics.total_duration_ms > 200 {
            issues.push(format!("Slow response: {}ms", metrics.total_duration_ms));
        }

        // Low average score
        if metrics.shortlist_size > 0 && metrics.avg_score < 0.3 {
            issues.push(format!("Low avg score: {:.2}", metrics.avg_score));
        }

        // Very few candidates
        if !metrics.fallback && metrics.eligible_count < metrics.shortlist_size * 2 {
            issues.push("Too few eligible items for meaningful sampling".to_string());
        }

        issues
    }
}
