//! Deterministic scoring engine: twelve weighted, independently capped
//! laws computed over a horse, its race and its synthesized form.
//!
//! Which laws are active depends on the horse's career category. Every
//! component is capped on its own; the total is the plain sum of the
//! active components (first starters additionally cap at 58).

use std::collections::HashMap;

use crate::form::{classify_horse, RaceCategory};
use crate::types::{
    Horse, HorseForm, PerformanceStats, PremiershipEntry, Race, RaceResultDetail, ScoreBreakdown,
    ScoredHorse, SpellPerformance,
};

/// Per-law caps.
const CAP_UP: f64 = 8.0;
const CAP_RECENT_FORM: f64 = 25.0;
const CAP_RECENT_FORM_SECOND_UP: f64 = 8.0;
const CAP_CLASS: f64 = 25.0;
const CAP_TRACK_DISTANCE: f64 = 20.0;
const CAP_TRACK_DISTANCE_BONUS: f64 = 5.0;
const CAP_SECTIONAL: f64 = 8.0;
const CAP_SECTIONAL_TRIAL: f64 = 10.0;
const CAP_BARRIER: f64 = 6.0;
const CAP_JOCKEY_RANK: f64 = 8.0;
const CAP_TRAINER_RANK: f64 = 8.0;
const CAP_JOCKEY_HORSE: f64 = 8.0;
const CAP_JOCKEY_HORSE_FIRST_STARTER: f64 = 4.0;
const CAP_CONDITION: f64 = 8.0;
const CAP_WEIGHT: f64 = 8.0;
const CAP_FRESHNESS: f64 = 3.0;
const FIRST_STARTER_TOTAL_CAP: f64 = 58.0;

/// Read-only context shared by every scoring call in one analysis run.
#[derive(Debug, Clone, Default)]
pub struct ScoringContext<'a> {
    pub jockey_rankings: &'a [PremiershipEntry],
    pub trainer_rankings: &'a [PremiershipEntry],
    /// Champion jockeys always score the jockey-rank cap.
    pub champion_jockeys: &'a [String],
    /// Optional jockey/trainer combination records keyed by
    /// (jockey, trainer), both names normalized.
    pub combinations: Option<&'a HashMap<(String, String), PerformanceStats>>,
}

/// Score one horse. The caller guarantees a synthesized `HorseForm`;
/// horses without one never reach the engine.
pub fn score_horse(
    horse: &Horse,
    race: &Race,
    form: &HorseForm,
    ctx: &ScoringContext,
) -> ScoredHorse {
    let category = classify_horse(&horse.form, form);

    let mut b = ScoreBreakdown {
        category: category.label().to_string(),
        ..Default::default()
    };

    // Always-active laws.
    b.barrier = barrier_points(horse.barrier, race.distance);
    b.jockey_rank = premiership_points(
        &horse.jockey,
        ctx.jockey_rankings,
        ctx.champion_jockeys,
        CAP_JOCKEY_RANK,
    );
    b.trainer_rank = premiership_points(&horse.trainer, ctx.trainer_rankings, &[], CAP_TRAINER_RANK);
    b.weight_advantage = weight_advantage_points(horse, race);

    match category {
        RaceCategory::Normal => {
            b.recent_form = recent_form_points(&form.last_five);
            b.class_suitability = class_points(race, &form.last_five);
            b.track_distance = track_distance_points(form, race);
            b.sectional = sectional_points(form.last_five.first());
            b.jockey_horse = jockey_horse_points(&horse.jockey, &form.last_five);
            b.condition_suitability = condition_points(&race.condition, &form.last_five);
            b.freshness = freshness_points(race, form.last_five.first());
        }
        RaceCategory::FirstUp => {
            b.up_performance = spell_points(form.first_up.as_ref());
        }
        RaceCategory::SecondUp => {
            b.up_performance = spell_points(form.second_up.as_ref());
            b.recent_form = second_up_recent_form_points(form.last_five.first());
            b.class_suitability = class_points(race, &form.last_five);
            b.track_distance = track_distance_points(form, race);
            b.sectional = sectional_points(form.last_five.first());
            b.jockey_horse = jockey_horse_points(&horse.jockey, &form.last_five);
            b.condition_suitability = condition_points(&race.condition, &form.last_five);
        }
        RaceCategory::FirstStarter => {
            b.sectional = trial_sectional_points(&form.trial_sectionals);
            b.jockey_horse = first_starter_combination_points(horse, ctx);
        }
        // Unrecognized form strings get no history-dependent credit.
        RaceCategory::Unknown => {}
    }

    let mut total = b.total();
    if category == RaceCategory::FirstStarter {
        total = total.min(FIRST_STARTER_TOTAL_CAP);
    }

    ScoredHorse {
        horse: horse.clone(),
        total,
        breakdown: b,
        standout: false,
    }
}

/// First-up / second-up record, scaled to the cap by win and place rate.
fn spell_points(spell: Option<&SpellPerformance>) -> f64 {
    let Some(spell) = spell else {
        return 0.0;
    };
    if spell.runs == 0 {
        return 0.0;
    }
    let ratio =
        (spell.wins as f64 + 0.5 * (spell.seconds + spell.thirds) as f64) / spell.runs as f64;
    (ratio * CAP_UP).min(CAP_UP)
}

/// Recency-weighted win/place points over the last five runs, plus a
/// bonus for a close last-start margin.
fn recent_form_points(last_five: &[RaceResultDetail]) -> f64 {
    const WEIGHTS: [f64; 5] = [1.0, 0.8, 0.6, 0.4, 0.2];

    let mut points = 0.0;
    for (i, detail) in last_five.iter().take(5).enumerate() {
        points += position_base_points(detail.position) * WEIGHTS[i];
    }

    if let Some(margin) = last_five.first().and_then(|d| d.margin) {
        points += margin_bonus(margin);
    }

    points.min(CAP_RECENT_FORM)
}

fn position_base_points(position: u32) -> f64 {
    match position {
        1 => 5.0,
        2 | 3 => 3.0,
        4..=7 => 1.0,
        _ => 0.0,
    }
}

/// Beaten-margin bonus, only within four lengths of the winner.
fn margin_bonus(margin: f64) -> f64 {
    if margin < 1.0 {
        4.0
    } else if margin < 3.0 {
        3.0
    } else if margin <= 4.0 {
        2.0
    } else {
        0.0
    }
}

/// Second-up variant: credit keys off the first-up run's position.
fn second_up_recent_form_points(first_up_run: Option<&RaceResultDetail>) -> f64 {
    let Some(run) = first_up_run else {
        return 0.0;
    };
    let points: f64 = match run.position {
        1 => 8.0,
        2 => 6.0,
        3 => 4.0,
        4 | 5 => 2.0,
        _ => 0.0,
    };
    points.min(CAP_RECENT_FORM_SECOND_UP)
}

/// Class suitability: the current class against the average of the
/// last three known classes. Dropping in class earns the most.
fn class_points(race: &Race, last_five: &[RaceResultDetail]) -> f64 {
    let Some(current) = race.class.as_deref().and_then(class_level) else {
        return 0.0;
    };

    let historical: Vec<f64> = last_five
        .iter()
        .take(3)
        .filter_map(|d| class_level(&d.class))
        .collect();
    if historical.is_empty() {
        return 0.0;
    }
    let average = historical.iter().sum::<f64>() / historical.len() as f64;

    let diff = average - current;
    let points: f64 = if diff >= 2.0 {
        25.0
    } else if diff >= 1.0 {
        20.0
    } else if diff >= 0.0 {
        15.0
    } else if diff >= -1.0 {
        8.0
    } else {
        0.0
    };
    points.min(CAP_CLASS)
}

/// Numeric class level used for comparisons across class codes.
fn class_level(class: &str) -> Option<f64> {
    let trimmed = class.trim();
    if trimmed.is_empty() {
        return None;
    }

    match trimmed {
        "G1" | "Group 1" => return Some(10.0),
        "G2" | "Group 2" => return Some(9.0),
        "G3" | "Group 3" => return Some(8.0),
        "LR" | "Listed" => return Some(7.0),
        "OPEN" | "Open" => return Some(6.0),
        "HCP" | "Hcp" | "Handicap" => return Some(6.0),
        "MDN" | "Maiden" => return Some(1.0),
        _ => {}
    }

    if let Some(n) = trimmed.strip_prefix("BM").and_then(|s| s.parse::<f64>().ok()) {
        return Some((2.0 + n / 20.0).min(7.0));
    }
    if let Some(n) = trimmed
        .strip_prefix("CL")
        .or_else(|| trimmed.strip_prefix("Class").map(str::trim))
        .and_then(|s| s.trim().parse::<f64>().ok())
    {
        return Some(1.0 + n * 0.5);
    }
    None
}

/// Track, distance and combined record, with a comfort-zone bonus.
fn track_distance_points(form: &HorseForm, race: &Race) -> f64 {
    let mut points = 0.0;

    if let Some(stats) = &form.stats {
        points += record_scale(&stats.track);
        points += record_scale(&stats.distance);
        points += combined_scale(&stats.track_distance);
    }
    points = points.min(CAP_TRACK_DISTANCE);

    let exact_win = form.last_five.iter().any(|d| {
        d.position == 1 && d.distance == Some(race.distance)
    });
    let comfort_place = form.last_five.iter().any(|d| {
        d.position <= 3
            && d.distance
                .is_some_and(|dist| race.distance.abs_diff(dist) <= 200)
    });
    let bonus = if exact_win {
        CAP_TRACK_DISTANCE_BONUS
    } else if comfort_place {
        CAP_TRACK_DISTANCE_BONUS / 2.0
    } else {
        0.0
    };

    points + bonus
}

fn record_scale(stats: &PerformanceStats) -> f64 {
    if stats.wins >= 2 {
        7.0
    } else if stats.wins == 1 {
        5.0
    } else if stats.places() > 0 {
        2.0
    } else {
        0.0
    }
}

fn combined_scale(stats: &PerformanceStats) -> f64 {
    if stats.wins >= 1 {
        6.0
    } else if stats.places() > 0 {
        3.0
    } else {
        0.0
    }
}

/// Last-start closing 600m bucket.
fn sectional_points(last_run: Option<&RaceResultDetail>) -> f64 {
    let Some(sectional) = last_run.and_then(|d| d.sectional_600m) else {
        return 0.0;
    };
    let points: f64 = if sectional <= 33.0 {
        8.0
    } else if sectional <= 34.0 {
        6.0
    } else if sectional <= 35.0 {
        4.0
    } else if sectional <= 36.0 {
        2.0
    } else {
        0.0
    };
    points.min(CAP_SECTIONAL)
}

/// First-starter variant: best trial sectional, higher cap.
fn trial_sectional_points(trials: &[f64]) -> f64 {
    let Some(best) = trials.iter().copied().reduce(f64::min) else {
        return 0.0;
    };
    let points: f64 = if best <= 34.0 {
        10.0
    } else if best <= 35.0 {
        7.0
    } else if best <= 36.0 {
        4.0
    } else {
        0.0
    };
    points.min(CAP_SECTIONAL_TRIAL)
}

/// Distance-aware barrier credit: sprints favor inside gates harder.
fn barrier_points(barrier: u32, distance: u32) -> f64 {
    let points: f64 = if distance <= 1200 {
        match barrier {
            1..=4 => 6.0,
            5..=8 => 3.0,
            _ => 0.0,
        }
    } else {
        match barrier {
            1..=6 => 6.0,
            7..=12 => 3.0,
            _ => 0.0,
        }
    };
    points.min(CAP_BARRIER)
}

/// Premiership-rank bucket, with an always-cap whitelist for champion
/// riders.
fn premiership_points(
    name: &str,
    rankings: &[PremiershipEntry],
    champions: &[String],
    cap: f64,
) -> f64 {
    let normalized = normalize_name(name);

    if champions.iter().any(|c| normalize_name(c) == normalized) {
        return cap;
    }

    let Some(entry) = rankings
        .iter()
        .find(|e| normalize_name(&e.name) == normalized)
    else {
        return 0.0;
    };

    match entry.rank {
        1..=5 => cap,
        6..=10 => 5.0,
        11..=20 => 2.0,
        _ => 0.0,
    }
}

fn normalize_name(name: &str) -> String {
    crate::scraper::parsers::clean_person_name(name).to_ascii_lowercase()
}

/// Wins and places the current jockey has had aboard this horse in the
/// last five runs.
fn jockey_horse_points(jockey: &str, last_five: &[RaceResultDetail]) -> f64 {
    let normalized = normalize_name(jockey);
    let together: Vec<&RaceResultDetail> = last_five
        .iter()
        .filter(|d| !d.jockey.is_empty() && normalize_name(&d.jockey) == normalized)
        .collect();

    let wins = together.iter().filter(|d| d.position == 1).count();
    let places = together
        .iter()
        .filter(|d| d.position == 2 || d.position == 3)
        .count();

    let points: f64 = if wins >= 2 {
        4.0
    } else if wins == 1 {
        2.0
    } else if places >= 2 {
        1.0
    } else if places == 1 {
        0.5
    } else {
        0.0
    };
    points.min(CAP_JOCKEY_HORSE)
}

/// First starters have no shared history; use the jockey/trainer
/// combination record instead, halved.
fn first_starter_combination_points(horse: &Horse, ctx: &ScoringContext) -> f64 {
    let Some(combinations) = ctx.combinations else {
        return 0.0;
    };
    let key = (normalize_name(&horse.jockey), normalize_name(&horse.trainer));
    let Some(stats) = combinations.get(&key) else {
        return 0.0;
    };

    let points: f64 = if stats.wins >= 2 {
        4.0
    } else if stats.wins == 1 {
        2.0
    } else if stats.places() >= 2 {
        1.0
    } else if stats.places() == 1 {
        0.5
    } else {
        0.0
    };
    (points / 2.0).min(CAP_JOCKEY_HORSE_FIRST_STARTER)
}

/// Best finish achieved in the race-day condition category.
fn condition_points(race_condition: &str, last_five: &[RaceResultDetail]) -> f64 {
    let category = crate::scraper::parsers::condition_category(race_condition);
    if category.is_empty() {
        return 0.0;
    }

    let best = last_five
        .iter()
        .filter(|d| {
            d.condition
                .as_deref()
                .is_some_and(|c| crate::scraper::parsers::condition_category(c) == category)
        })
        .map(|d| d.position)
        .min();

    let points: f64 = match best {
        Some(1) => 8.0,
        Some(2) => 6.0,
        Some(3) => 4.0,
        Some(4) | Some(5) => 2.0,
        _ => 0.0,
    };
    points.min(CAP_CONDITION)
}

/// Weight against the field average.
fn weight_advantage_points(horse: &Horse, race: &Race) -> f64 {
    if race.horses.is_empty() {
        return 0.0;
    }
    let average =
        race.horses.iter().map(|h| h.weight).sum::<f64>() / race.horses.len() as f64;
    let advantage = average - horse.weight;

    let points: f64 = if advantage >= 4.0 {
        8.0
    } else if advantage >= 2.0 {
        5.0
    } else if advantage >= 0.0 {
        2.0
    } else {
        0.0
    };
    points.min(CAP_WEIGHT)
}

/// Days since the last run. Not applicable to spelled horses or first
/// starters, and undated runs earn nothing.
fn freshness_points(race: &Race, last_run: Option<&RaceResultDetail>) -> f64 {
    let Some(last_date) = last_run.and_then(|d| d.date) else {
        return 0.0;
    };
    let days = (race.date - last_date).num_days();
    let points: f64 = match days {
        14..=28 => 3.0,
        29..=56 => 1.0,
        _ => 0.0,
    };
    points.min(CAP_FRESHNESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn race_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 8, 27).unwrap()
    }

    fn horse(name: &str, weight: f64, barrier: u32, form: &str) -> Horse {
        Horse {
            saddle_number: 1,
            name: name.to_string(),
            jockey: "J McDonald".to_string(),
            trainer: "C Waller".to_string(),
            weight,
            barrier,
            odds: None,
            form: form.to_string(),
            horse_code: "H1".to_string(),
            race_entry: "R1".to_string(),
        }
    }

    fn race(distance: u32, horses: Vec<Horse>) -> Race {
        Race {
            number: 1,
            name: "TEST PLATE".to_string(),
            start_time: "1:45PM".to_string(),
            distance,
            surface: "Turf".to_string(),
            condition: "Good4".to_string(),
            class: None,
            date: race_date(),
            horses,
        }
    }

    fn run(position: u32) -> RaceResultDetail {
        RaceResultDetail {
            position,
            ..Default::default()
        }
    }

    fn ranking(name: &str, rank: u32) -> PremiershipEntry {
        PremiershipEntry {
            name: name.to_string(),
            rank,
            wins: 50,
            seconds: 40,
            thirds: 30,
            fourths: 20,
            fifths: 10,
            prize_money: 0.0,
            strike_rate: 0.0,
            total_starts: 300,
            places: 70,
            points: 0,
            win_percentage: 0.0,
        }
    }

    #[test]
    fn test_recent_form_worked_example() {
        // Positions [1,3,7,9,2], last-start margin 2.5 lengths:
        // 5*1.0 + 3*0.8 + 1*0.6 + 0*0.4 + 3*0.2 + 3.0 = 11.6
        let mut last_five: Vec<RaceResultDetail> =
            [1, 3, 7, 9, 2].iter().map(|&p| run(p)).collect();
        last_five[0].margin = Some(2.5);
        assert!((recent_form_points(&last_five) - 11.6).abs() < 1e-9);
    }

    #[test]
    fn test_recent_form_is_capped() {
        let mut last_five: Vec<RaceResultDetail> = (0..5).map(|_| run(1)).collect();
        last_five[0].margin = Some(0.1);
        // Uncapped: 5*(1.0+0.8+0.6+0.4+0.2) + 4 = 19, under the cap.
        assert!(recent_form_points(&last_five) <= 25.0);
    }

    #[test]
    fn test_weight_advantage_worked_example() {
        // 54.0kg in a field averaging 58.5kg: difference >= 4 -> 8.
        let light = horse("Featherweight", 54.0, 1, "111");
        let field = vec![
            light.clone(),
            horse("Heavy One", 60.0, 2, "111"),
            horse("Heavy Two", 61.5, 3, "111"),
        ];
        let race = race(1400, field);
        assert_eq!(weight_advantage_points(&light, &race), 8.0);
    }

    #[test]
    fn test_barrier_is_distance_aware() {
        assert_eq!(barrier_points(3, 1000), 6.0);
        assert_eq!(barrier_points(6, 1000), 3.0);
        assert_eq!(barrier_points(9, 1000), 0.0);
        assert_eq!(barrier_points(6, 1600), 6.0);
        assert_eq!(barrier_points(9, 1600), 3.0);
        assert_eq!(barrier_points(13, 1600), 0.0);
    }

    #[test]
    fn test_premiership_rank_buckets() {
        let rankings: Vec<PremiershipEntry> = [
            ("J McDonald", 1),
            ("T Berry", 7),
            ("R King", 15),
            ("B Nobody", 25),
        ]
        .iter()
        .map(|(n, r)| ranking(n, *r))
        .collect();

        assert_eq!(premiership_points("J McDonald", &rankings, &[], 8.0), 8.0);
        assert_eq!(premiership_points("T Berry", &rankings, &[], 8.0), 5.0);
        assert_eq!(premiership_points("R King", &rankings, &[], 8.0), 2.0);
        assert_eq!(premiership_points("B Nobody", &rankings, &[], 8.0), 0.0);
        assert_eq!(premiership_points("Unlisted Rider", &rankings, &[], 8.0), 0.0);
    }

    #[test]
    fn test_champion_whitelist_always_scores_cap() {
        let champions = vec!["J McDonald".to_string()];
        assert_eq!(premiership_points("Ms J McDonald", &[], &champions, 8.0), 8.0);
    }

    #[test]
    fn test_freshness_buckets() {
        let subject = horse("Fresh", 55.0, 1, "1");
        let race = race(1400, vec![subject]);

        let mut last = run(1);
        last.date = Some(race_date() - chrono::Duration::days(21));
        assert_eq!(freshness_points(&race, Some(&last)), 3.0);

        last.date = Some(race_date() - chrono::Duration::days(40));
        assert_eq!(freshness_points(&race, Some(&last)), 1.0);

        last.date = Some(race_date() - chrono::Duration::days(7));
        assert_eq!(freshness_points(&race, Some(&last)), 0.0);

        last.date = None;
        assert_eq!(freshness_points(&race, Some(&last)), 0.0);
    }

    #[test]
    fn test_first_up_horse_activates_only_spell_laws() {
        let subject = horse("Spelled", 55.0, 2, "21x");
        let race = race(1400, vec![subject.clone()]);
        let form = HorseForm {
            last_five: vec![run(2), run(1)],
            first_up: Some(SpellPerformance {
                runs: 2,
                wins: 1,
                seconds: 0,
                thirds: 1,
            }),
            ..Default::default()
        };

        let scored = score_horse(&subject, &race, &form, &ScoringContext::default());
        assert_eq!(scored.breakdown.category, "first_up");
        // (1 + 0.5) / 2 * 8 = 6
        assert!((scored.breakdown.up_performance - 6.0).abs() < 1e-9);
        assert_eq!(scored.breakdown.recent_form, 0.0);
        assert_eq!(scored.breakdown.freshness, 0.0);
        assert!(scored.breakdown.barrier > 0.0);
    }

    #[test]
    fn test_second_up_recent_form_uses_first_up_position() {
        let mut first_up_run = run(1);
        first_up_run.sectional_600m = Some(33.5);
        assert_eq!(second_up_recent_form_points(Some(&first_up_run)), 8.0);
        assert_eq!(second_up_recent_form_points(Some(&run(3))), 4.0);
        assert_eq!(second_up_recent_form_points(Some(&run(8))), 0.0);
    }

    #[test]
    fn test_first_starter_total_capped() {
        let subject = horse("Debutant", 50.0, 1, "");
        let race = race(1000, vec![subject.clone(), horse("Rival", 60.0, 2, "1")]);
        let form = HorseForm {
            trial_sectionals: vec![33.2],
            ..Default::default()
        };
        let champions = vec!["J McDonald".to_string()];
        let rankings = vec![ranking("C Waller", 1)];
        let ctx = ScoringContext {
            trainer_rankings: &rankings,
            champion_jockeys: &champions,
            ..Default::default()
        };

        let scored = score_horse(&subject, &race, &form, &ctx);
        assert_eq!(scored.breakdown.category, "first_starter");
        assert_eq!(scored.breakdown.sectional, 10.0);
        assert!(scored.total <= 58.0);
        assert!((scored.total - scored.breakdown.total().min(58.0)).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_category_gets_no_history_credit() {
        let subject = horse("Mystery", 55.0, 3, "??");
        let race = race(1200, vec![subject.clone()]);
        let form = HorseForm {
            last_five: vec![run(1), run(1)],
            ..Default::default()
        };
        let scored = score_horse(&subject, &race, &form, &ScoringContext::default());
        assert_eq!(scored.breakdown.category, "unknown");
        assert_eq!(scored.breakdown.recent_form, 0.0);
        assert_eq!(scored.breakdown.condition_suitability, 0.0);
        assert!(scored.breakdown.barrier > 0.0);
    }

    #[test]
    fn test_breakdown_total_matches_sum_and_caps() {
        let subject = horse("Consistent", 54.0, 2, "1213");
        let race = race(1400, vec![subject.clone(), horse("Rival", 59.0, 9, "5")]);
        let mut last_five: Vec<RaceResultDetail> =
            [1, 2, 1, 3].iter().map(|&p| run(p)).collect();
        last_five[0].margin = Some(0.5);
        last_five[0].sectional_600m = Some(33.4);
        last_five[0].condition = Some("Good3".to_string());
        last_five[0].date = Some(race_date() - chrono::Duration::days(21));
        last_five[0].jockey = "J McDonald".to_string();
        last_five[2].jockey = "J McDonald".to_string();

        let form = HorseForm {
            last_five,
            ..Default::default()
        };
        let scored = score_horse(&subject, &race, &form, &ScoringContext::default());

        assert!((scored.total - scored.breakdown.total()).abs() < 1e-9);
        let b = &scored.breakdown;
        assert!(b.recent_form <= CAP_RECENT_FORM);
        assert!(b.sectional <= CAP_SECTIONAL);
        assert!(b.barrier <= CAP_BARRIER);
        assert!(b.jockey_horse <= CAP_JOCKEY_HORSE);
        assert!(b.condition_suitability <= CAP_CONDITION);
        assert!(b.weight_advantage <= CAP_WEIGHT);
        assert!(b.freshness <= CAP_FRESHNESS);
        // Two wins with the booked jockey aboard.
        assert_eq!(b.jockey_horse, 4.0);
    }

    #[test]
    fn test_class_levels_ordered() {
        assert!(class_level("G1").unwrap() > class_level("G3").unwrap());
        assert!(class_level("G3").unwrap() > class_level("BM72").unwrap());
        assert!(class_level("BM78").unwrap() > class_level("BM64").unwrap());
        assert!(class_level("Maiden").unwrap() < class_level("CL3").unwrap());
        assert!(class_level("").is_none());
        assert!(class_level("unrated").is_none());
    }

    #[test]
    fn test_class_drop_scores_high() {
        let mut race = race(1400, vec![horse("Dropper", 55.0, 1, "456")]);
        race.class = Some("BM64".to_string());
        let mut last_five: Vec<RaceResultDetail> = [4, 5, 6].iter().map(|&p| run(p)).collect();
        for d in &mut last_five {
            d.class = "G3".to_string();
        }
        let points = class_points(&race, &last_five);
        assert_eq!(points, 25.0);
    }

    #[test]
    fn test_track_distance_bonus_exact_win_beats_comfort() {
        let mut winner_run = run(1);
        winner_run.distance = Some(1400);
        let form = HorseForm {
            last_five: vec![winner_run],
            ..Default::default()
        };
        let race = race(1400, vec![horse("Proven", 55.0, 1, "1")]);
        assert_eq!(track_distance_points(&form, &race), 5.0);

        let mut placed_run = run(3);
        placed_run.distance = Some(1300);
        let comfort_form = HorseForm {
            last_five: vec![placed_run],
            ..Default::default()
        };
        assert_eq!(track_distance_points(&comfort_form, &race), 2.5);
    }
}
