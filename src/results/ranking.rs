//! Multi-factor result scoring
//!
//! Every result gets five component scores on a 0-100 scale: price,
//! quality, relevance, personalization and freshness. The total is their
//! weighted sum, and the list is ordered by it.

use crate::config::RankingConfig;
use crate::model::{EnrichedQuery, Ranking, ResultDetails, UnifiedResult, UserPreferences};
use chrono::{DateTime, Utc};

const NEUTRAL: f64 = 50.0;

/// Score and order results, assigning dense 1-based ranks
pub fn rank(
    results: Vec<UnifiedResult>,
    query: &EnrichedQuery,
    config: &RankingConfig,
    now: DateTime<Utc>,
) -> Vec<UnifiedResult> {
    if results.is_empty() {
        return results;
    }

    let (min_price, max_price) = results.iter().fold(
        (f64::INFINITY, f64::NEG_INFINITY),
        |(lo, hi), r| (lo.min(r.price.amount), hi.max(r.price.amount)),
    );

    let mut scored: Vec<UnifiedResult> = results
        .into_iter()
        .map(|mut result| {
            let price_score = price_score(result.price.amount, min_price, max_price);
            let quality_score = quality_score(&result.details);
            let relevance_score = relevance_score(&result.details);
            let personalization_score =
                personalization_score(&result, query.preferences.as_ref());
            let freshness_score =
                freshness_score(result.retrieved_at, now, config.freshness_window_secs);

            let total_score = price_score * config.price_weight
                + quality_score * config.quality_weight
                + relevance_score * config.relevance_weight
                + personalization_score * config.personalization_weight
                + freshness_score * config.freshness_weight;

            result.ranking = Some(Ranking {
                price_score,
                quality_score,
                relevance_score,
                personalization_score,
                freshness_score,
                total_score,
                rank: 0,
            });
            result
        })
        .collect();

    // Stable, so equal totals keep their input order
    scored.sort_by(|a, b| total(b).total_cmp(&total(a)));

    for (i, result) in scored.iter_mut().enumerate() {
        if let Some(ranking) = result.ranking.as_mut() {
            ranking.rank = i + 1;
        }
    }

    scored
}

fn total(result: &UnifiedResult) -> f64 {
    result.ranking.as_ref().map(|r| r.total_score).unwrap_or(0.0)
}

fn price_score(amount: f64, min: f64, max: f64) -> f64 {
    if max - min <= f64::EPSILON {
        return NEUTRAL;
    }
    (max - amount) / (max - min) * 100.0
}

fn quality_score(details: &ResultDetails) -> f64 {
    match details {
        ResultDetails::Hotel(h) => {
            let star = h.star_rating.map(|s| 20.0 + s.clamp(0.0, 5.0) * 8.0);
            let guest = h.guest_rating.map(|g| g.clamp(0.0, 10.0) * 10.0);
            match (star, guest) {
                (Some(s), Some(g)) => g * 0.6 + s * 0.4,
                (Some(s), None) => s,
                (None, Some(g)) => g,
                (None, None) => NEUTRAL,
            }
        }
        ResultDetails::Experience(e) => e
            .rating
            .map(|r| r.clamp(0.0, 5.0) * 20.0)
            .unwrap_or(NEUTRAL),
        _ => NEUTRAL,
    }
}

fn relevance_score(details: &ResultDetails) -> f64 {
    let mut score = NEUTRAL;

    match details {
        ResultDetails::Flight(f) => match f.stops {
            0 => score += 20.0,
            1 => score += 10.0,
            n => score -= 5.0 * f64::from(n - 1),
        },
        ResultDetails::Hotel(h) => {
            if let Some(distance) = h.distance_from_center {
                if distance < 1.0 {
                    score += 20.0;
                } else if distance < 3.0 {
                    score += 10.0;
                } else if distance > 10.0 {
                    score -= 10.0;
                }
            }
        }
        _ => {}
    }

    score.clamp(0.0, 100.0)
}

fn personalization_score(result: &UnifiedResult, prefs: Option<&UserPreferences>) -> f64 {
    let Some(prefs) = prefs else {
        return NEUTRAL;
    };

    let mut score = NEUTRAL;

    if let Some(level) = prefs.budget_level {
        if level.matches(result.price.amount) {
            score += 15.0;
        }
    }

    if let ResultDetails::Flight(f) = &result.details {
        let preferred = f.airlines.iter().any(|airline| {
            prefs
                .preferred_airlines
                .iter()
                .any(|p| p.eq_ignore_ascii_case(airline))
        });
        if preferred {
            score += 15.0;
        }
    }

    score.clamp(0.0, 100.0)
}

fn freshness_score(
    retrieved_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    window_secs: i64,
) -> f64 {
    let Some(retrieved_at) = retrieved_at else {
        return NEUTRAL;
    };

    let age = (now - retrieved_at).num_milliseconds().max(0) as f64 / 1000.0;
    let window = window_secs.max(1) as f64;

    if age <= window {
        100.0 - NEUTRAL * (age / window)
    } else {
        NEUTRAL
    }
}
