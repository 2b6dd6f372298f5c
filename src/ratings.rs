//! Rating engine: category stats, role fitness and the overall rating.
//!
//! Attribute averages are scaled onto a 0–99 axis and, on the default path,
//! bent by [`compress`] so that mid-range players spread out and elite
//! values flatten near the ceiling.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::weights::{AttributeWeights, WeightProvider};

pub const RATING_FLOOR: i32 = 0;
pub const RATING_CEILING: i32 = 99;

/// Multiplier from a 1–20 weighted average to the 0–99 axis for categories.
pub const DEFAULT_RATING_SCALE: f64 = 5.3;
/// Same, for role fitness.
pub const DEFAULT_ROLE_SCALE: f64 = 5.85;

/// Number of best roles averaged into the overall rating.
pub const OVERALL_TOP_ROLES: usize = 7;

pub const OUTFIELD_CATEGORIES: &[&str] = &["PAC", "SHO", "PAS", "DRI", "DEF", "PHY"];
pub const GOALKEEPER_CATEGORIES: &[&str] = &["GK", "DIV", "HAN", "REF", "KIC", "SPD", "POS"];

const PASSING: &str = "PAS";
const SET_PIECE_ATTRIBUTES: &[&str] = &["Cor", "Fre", "Pen"];
const OFF_BALL_ATTRIBUTES: &[&str] = &["OtB"];

const CURVE_KNEE: f64 = 75.0;
const CURVE_EXPONENT: f64 = 1.8;
const CURVE_TAIL_SLOPE: f64 = 0.95;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scaling {
    #[default]
    Nonlinear,
    Linear,
}

impl Scaling {
    pub fn from_label(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "nonlinear" | "scaled" | "curve" => Some(Scaling::Nonlinear),
            "linear" => Some(Scaling::Linear),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingSettings {
    pub rating_scale: f64,
    pub role_scale: f64,
    pub scaling: Scaling,
}

impl Default for RatingSettings {
    fn default() -> Self {
        Self {
            rating_scale: DEFAULT_RATING_SCALE,
            role_scale: DEFAULT_ROLE_SCALE,
            scaling: Scaling::Nonlinear,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleScore {
    pub role: String,
    pub score: i32,
}

static CURVE_TABLE: Lazy<[i32; 100]> = Lazy::new(|| {
    let mut table = [0; 100];
    for (idx, slot) in table.iter_mut().enumerate() {
        *slot = compute_curve(idx as f64);
    }
    table
});

/// Maps a linear 0–99 value onto the rating curve.
pub fn compress(linear: f64) -> i32 {
    if linear >= 0.0 && linear < 100.0 && linear.fract() == 0.0 {
        return CURVE_TABLE[linear as usize];
    }
    compute_curve(linear)
}

fn compute_curve(x: f64) -> i32 {
    if x.is_nan() || x <= 0.0 {
        return RATING_FLOOR;
    }
    if x >= RATING_CEILING as f64 {
        return RATING_CEILING;
    }
    let curved = if x >= CURVE_KNEE {
        CURVE_KNEE + (x - CURVE_KNEE) * CURVE_TAIL_SLOPE
    } else {
        let bent = (x / CURVE_KNEE).powf(CURVE_EXPONENT) * CURVE_KNEE;
        // Flat band for low-but-real values.
        if bent < 10.0 && x > 20.0 {
            10.0 + (x - 20.0) * 0.15
        } else {
            bent
        }
    };
    clamp_rating(curved.round() as i32)
}

pub fn clamp_rating(value: i32) -> i32 {
    value.clamp(RATING_FLOOR, RATING_CEILING)
}

/// Weighted mean over attributes inside the 1–20 scale. `None` when no
/// weighted attribute qualifies.
fn weighted_average(attributes: &HashMap<String, i32>, weights: &AttributeWeights) -> Option<f64> {
    let mut sum: i64 = 0;
    let mut weight_total: i64 = 0;
    for (attr, weight) in weights {
        if *weight <= 0 {
            continue;
        }
        let Some(value) = attributes.get(attr).copied() else {
            continue;
        };
        if !(1..=20).contains(&value) {
            continue;
        }
        sum += i64::from(value) * i64::from(*weight);
        weight_total += i64::from(*weight);
    }
    (weight_total > 0).then(|| sum as f64 / weight_total as f64)
}

fn scale(average: f64, factor: f64, scaling: Scaling) -> i32 {
    let linear = average * factor;
    match scaling {
        Scaling::Nonlinear => clamp_rating(compress(linear)),
        Scaling::Linear => clamp_rating(linear.round() as i32),
    }
}

/// Category stat for an explicit weight table.
pub fn category_stat(
    attributes: &HashMap<String, i32>,
    weights: &AttributeWeights,
    settings: &RatingSettings,
) -> i32 {
    match weighted_average(attributes, weights) {
        Some(avg) => scale(avg, settings.rating_scale, settings.scaling),
        None => 0,
    }
}

/// Category stat by code. Passing takes the best of three profiles: the
/// standard table, the table without set pieces, and the table without
/// off-the-ball movement.
pub fn category_score(
    attributes: &HashMap<String, i32>,
    category: &str,
    provider: &dyn WeightProvider,
    settings: &RatingSettings,
) -> i32 {
    let weights = provider.category_weights(category);
    if category != PASSING {
        return category_stat(attributes, weights, settings);
    }
    passing_profiles(weights)
        .iter()
        .map(|profile| category_stat(attributes, profile, settings))
        .max()
        .unwrap_or(0)
}

/// Standard, no-set-pieces and no-off-the-ball passing profiles.
pub fn passing_profiles(standard: &AttributeWeights) -> [AttributeWeights; 3] {
    let without = |excluded: &[&str]| {
        standard
            .iter()
            .filter(|(attr, _)| !excluded.contains(&attr.as_str()))
            .map(|(attr, weight)| (attr.clone(), *weight))
            .collect::<AttributeWeights>()
    };
    [
        standard.clone(),
        without(SET_PIECE_ATTRIBUTES),
        without(OFF_BALL_ATTRIBUTES),
    ]
}

/// Role fitness for one role's weights.
pub fn role_score(
    attributes: &HashMap<String, i32>,
    weights: &AttributeWeights,
    settings: &RatingSettings,
) -> i32 {
    match weighted_average(attributes, weights) {
        Some(avg) => scale(avg, settings.role_scale, settings.scaling),
        None => 0,
    }
}

/// Scores every role that applies to the given short positions, sorted by
/// score descending and then by role name.
pub fn role_scores(
    attributes: &HashMap<String, i32>,
    short_positions: &[String],
    provider: &dyn WeightProvider,
    settings: &RatingSettings,
) -> Vec<RoleScore> {
    let mut seen = HashSet::new();
    let mut scores = Vec::new();
    for short in short_positions {
        for role in provider.roles_for_position(short) {
            if !seen.insert(role.name.as_str()) {
                continue;
            }
            scores.push(RoleScore {
                role: role.name.clone(),
                score: role_score(attributes, &role.weights, settings),
            });
        }
    }
    scores.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.role.cmp(&b.role)));
    scores
}

/// Integer mean of the best [`OVERALL_TOP_ROLES`] scores.
pub fn overall_rating(scores: &[RoleScore]) -> i32 {
    let mut values = scores.iter().map(|s| s.score).collect::<Vec<_>>();
    values.sort_unstable_by(|a, b| b.cmp(a));
    let top = &values[..values.len().min(OVERALL_TOP_ROLES)];
    if top.is_empty() {
        return 0;
    }
    top.iter().sum::<i32>() / top.len() as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn curve_fixed_points() {
        assert_eq!(compress(0.0), 0);
        assert_eq!(compress(-4.0), 0);
        assert_eq!(compress(75.0), 75);
        assert_eq!(compress(99.0), 99);
        assert_eq!(compress(140.0), 99);
        assert_eq!(compress(20.0), 7);
    }

    #[test]
    fn curve_is_monotone_outside_floor_band() {
        for x in 31..99 {
            assert!(compress(x as f64) <= compress((x + 1) as f64), "x={x}");
        }
        for x in 0..20 {
            assert!(compress(x as f64) <= compress((x + 1) as f64), "x={x}");
        }
    }

    #[test]
    fn table_matches_direct_computation() {
        for x in 0..100 {
            assert_eq!(compress(x as f64), compute_curve(x as f64));
        }
        assert_eq!(compress(80.5), compute_curve(80.5));
    }

    #[test]
    fn overall_averages_top_seven() {
        let scores = [90, 85, 80, 75, 70, 65, 60, 50]
            .iter()
            .map(|score| RoleScore {
                role: format!("R{score}"),
                score: *score,
            })
            .collect::<Vec<_>>();
        assert_eq!(overall_rating(&scores), 75);
        assert_eq!(overall_rating(&scores[..2]), 87);
        assert_eq!(overall_rating(&[]), 0);
    }

    #[test]
    fn weighted_average_ignores_out_of_scale() {
        let attributes = HashMap::from([
            ("Acc".to_string(), 20),
            ("Pac".to_string(), 0),
            ("Agi".to_string(), 25),
        ]);
        let weights = HashMap::from([
            ("Acc".to_string(), 12),
            ("Pac".to_string(), 12),
            ("Agi".to_string(), 5),
        ]);
        assert_eq!(weighted_average(&attributes, &weights), Some(20.0));
        assert_eq!(weighted_average(&HashMap::new(), &weights), None);
    }

    #[test]
    fn linear_path_skips_curve() {
        let attributes = HashMap::from([("Acc".to_string(), 10)]);
        let weights = HashMap::from([("Acc".to_string(), 1)]);
        let linear = RatingSettings {
            scaling: Scaling::Linear,
            ..RatingSettings::default()
        };
        assert_eq!(category_stat(&attributes, &weights, &linear), 53);
        assert_eq!(
            category_stat(&attributes, &weights, &RatingSettings::default()),
            compress(53.0)
        );
    }

    #[test]
    fn scaling_labels() {
        assert_eq!(Scaling::from_label("Linear"), Some(Scaling::Linear));
        assert_eq!(Scaling::from_label("nonlinear"), Some(Scaling::Nonlinear));
        assert_eq!(Scaling::from_label("cubic"), None);
    }
}
