//! Race-level ranking, standout marking and bet-tier classification.

use std::collections::HashMap;

use crate::config::TierThresholds;
use crate::types::{BetTier, BettingRecommendation, HorseForm, ScoredHorse};

/// Scores within this distance count as tied.
const SCORE_TIE_EPSILON: f64 = 1e-9;

/// Order a scored field best-first. Ties keep saddle-number order so the
/// ranking is deterministic run to run.
pub fn rank(mut horses: Vec<ScoredHorse>) -> Vec<ScoredHorse> {
    horses.sort_by(|a, b| {
        b.total
            .partial_cmp(&a.total)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.horse.saddle_number.cmp(&b.horse.saddle_number))
    });
    horses
}

/// Mark standouts among horses tied on the top score.
///
/// When two or more horses share the lead, the ones with the strongest
/// career record (wins plus placings) get the marker. A career record
/// of zero marks nobody; the tie stands unresolved.
pub fn mark_standouts(ranked: &mut [ScoredHorse], forms: &HashMap<String, HorseForm>) {
    let Some(top) = ranked.first().map(|h| h.total) else {
        return;
    };

    let career_quality: Vec<(usize, u32)> = ranked
        .iter()
        .enumerate()
        .filter(|(_, h)| (top - h.total).abs() < SCORE_TIE_EPSILON)
        .map(|(i, h)| {
            let quality = forms
                .get(&h.horse.horse_code)
                .and_then(|f| f.career)
                .map(|c| c.wins + c.seconds + c.thirds)
                .unwrap_or(0);
            (i, quality)
        })
        .collect();
    if career_quality.len() < 2 {
        return;
    }

    let best = career_quality.iter().map(|&(_, q)| q).max().unwrap_or(0);
    if best == 0 {
        return;
    }
    for &(i, quality) in &career_quality {
        if quality == best {
            ranked[i].standout = true;
        }
    }
}

/// Classify the top-ranked horse by its point gap to the runner-up.
///
/// A single-horse field uses the horse's own total as the gap. An empty
/// field yields no recommendation.
pub fn recommend(
    ranked: &[ScoredHorse],
    thresholds: &TierThresholds,
) -> Option<BettingRecommendation> {
    let top = ranked.first()?;
    let margin = match ranked.get(1) {
        Some(second) => top.total - second.total,
        None => top.total,
    };

    let tier = if margin >= thresholds.highest {
        BetTier::Highest
    } else if margin >= thresholds.high {
        BetTier::High
    } else if margin >= thresholds.moderate {
        BetTier::Moderate
    } else {
        BetTier::None
    };

    let confidence = match tier {
        BetTier::Highest => "very high",
        BetTier::High => "high",
        BetTier::Moderate => "moderate",
        BetTier::None => "low",
    }
    .to_string();

    Some(BettingRecommendation {
        tier,
        margin,
        confidence,
    })
}
