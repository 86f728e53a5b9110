//! Selection Sampler
//!
//! Turns a week-appropriate pool into one pick:
//! 1. Filter to eligible items (week, time budget, difficulty)
//! 2. Empty pool: deterministic closest-duration fallback
//! 3. Otherwise score, keep the top candidates and roulette-sample by score

use rand::Rng;
use rayon::prelude::*;
use serde::Serialize;
use tracing::debug;

use super::content::ContentItem;
use super::engine::{
    score_breakdown, RecommendationContext, RecommendationReason, ScoredContent, ScoringWeights,
};
use super::metrics::PerformanceTimer;

pub const DEFAULT_TOP_K: usize = 5;
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 256;

/// Cumulative-weight roulette wheel
///
/// Draws `r` in `[0, total)` and returns the first entry whose running sum
/// reaches it. Falls back to the first entry when rounding leaves none
/// selected; `None` only for an empty slice.
pub fn roulette_select<'a, T, R>(weighted: &'a [(T, f32)], rng: &mut R) -> Option<&'a T>
where
    R: Rng + ?Sized,
{
    let (first, _) = weighted.first()?;

    let total: f32 = weighted.iter().map(|(_, w)| *w).sum();
    let r = rng.gen::<f32>() * total;

    let mut cumulative = 0.0f32;
    for (value, weight) in weighted {
        cumulative += *weight;
        if cumulative >= r {
            return Some(value);
        }
    }

    Some(first)
}

/// Outcome of one sampling pass
#[derive(Debug, Clone, Serialize)]
pub struct Selection {
    pub choice: ScoredContent,
    /// Scored shortlist the choice was drawn from, best first
    pub shortlist: Vec<ScoredContent>,
    pub pool_size: usize,
    pub eligible_count: usize,
    pub fallback: bool,
}

#[derive(Debug, Clone)]
pub struct SelectionSampler {
    pub top_k: usize,
    pub parallel_threshold: usize,
}

impl Default for SelectionSampler {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }
}

impl SelectionSampler {
    pub fn new(top_k: usize, parallel_threshold: usize) -> Self {
        Self {
            top_k: top_k.max(1),
            parallel_threshold,
        }
    }

    pub fn is_eligible(item: &ContentItem, ctx: &RecommendationContext) -> bool {
        item.eligible_weeks.contains(ctx.current_week)
            && item.minutes() <= ctx.available_minutes
            && ctx.preferred_difficulty.map_or(true, |d| d == item.difficulty)
    }

    /// Item whose duration is closest to the budget; first wins on ties
    pub fn closest_duration<'a>(
        pool: &[&'a ContentItem],
        available_minutes: u32,
    ) -> Option<&'a ContentItem> {
        pool.iter()
            .copied()
            .min_by_key(|item| (item.estimated_minutes as i64 - available_minutes as i64).abs())
    }

    /// Score every item, best first; ties keep pool order
    pub fn rank(
        &self,
        items: &[&ContentItem],
        ctx: &RecommendationContext,
        weights: &ScoringWeights,
    ) -> Vec<ScoredContent> {
        let _timer = PerformanceTimer::new("score_pool");

        let breakdowns: Vec<_> = if items.len() >= self.parallel_threshold {
            items.par_iter().map(|item| score_breakdown(item, ctx, weights)).collect()
        } else {
            items.iter().map(|item| score_breakdown(item, ctx, weights)).collect()
        };

        let mut order: Vec<usize> = (0..items.len()).collect();
        order.sort_by(|&a, &b| {
            breakdowns[b]
                .score
                .partial_cmp(&breakdowns[a].score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        order
            .into_iter()
            .map(|pos| ScoredContent::new(items[pos].clone(), breakdowns[pos].clone()))
            .collect()
    }

    /// Pick one item from a week-appropriate pool
    pub fn select<R: Rng + ?Sized>(
        &self,
        pool: &[&ContentItem],
        ctx: &RecommendationContext,
        weights: &ScoringWeights,
        rng: &mut R,
    ) -> Option<Selection> {
        let eligible: Vec<&ContentItem> = pool
            .iter()
            .copied()
            .filter(|item| Self::is_eligible(item, ctx))
            .collect();

        if eligible.is_empty() {
            let item = Self::closest_duration(pool, ctx.available_minutes)?;
            debug!(
                "No eligible content for {} min, falling back to closest duration: {}",
                ctx.available_minutes, item.id
            );
            let mut choice = ScoredContent::new(item.clone(), score_breakdown(item, ctx, weights));
            choice.reason = RecommendationReason::ClosestDuration {
                estimated_minutes: item.minutes(),
                available_minutes: ctx.available_minutes,
            };
            return Some(Selection {
                shortlist: vec![choice.clone()],
                choice,
                pool_size: pool.len(),
                eligible_count: 0,
                fallback: true,
            });
        }

        let mut shortlist = self.rank(&eligible, ctx, weights);
        shortlist.truncate(self.top_k);

        let weighted: Vec<(usize, f32)> = shortlist
            .iter()
            .enumerate()
            .map(|(pos, scored)| (pos, scored.score))
            .collect();
        let pos = roulette_select(&weighted, rng).copied().unwrap_or(0);
        let choice = shortlist[pos].clone();

        debug!(
            "Sampled {} (score {:.3}) from {} candidates of {} eligible",
            choice.item.id,
            choice.score,
            shortlist.len(),
            eligible.len()
        );

        Some(Selection {
            choice,
            shortlist,
            pool_size: pool.len(),
            eligible_count: eligible.len(),
            fallback: false,
        })
    }
}
