//! Three-tier percentile ranking over a finished batch.
//!
//! Every record is ranked per performance stat against the whole batch
//! ("Global"), against each broad position group it belongs to, and against
//! each detailed group its short positions fall into.

use std::collections::HashMap;
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::attributes::PERFORMANCE_STAT_KEYS;
use crate::player::PlayerRecord;
use crate::positions::{GROUP_ATTACKERS, GROUP_DEFENDERS, GROUP_GOALKEEPERS, GROUP_MIDFIELDERS};

pub const GLOBAL_COHORT: &str = "Global";

/// Value written when a cohort has no data for a stat.
pub const NO_DATA: f64 = -1.0;

pub const BROAD_GROUPS: &[&str] = &[
    GROUP_GOALKEEPERS,
    GROUP_DEFENDERS,
    GROUP_MIDFIELDERS,
    GROUP_ATTACKERS,
];

pub const DETAILED_GROUPS: &[(&str, &[&str])] = &[
    ("Full-backs", &["DR", "DL"]),
    ("Centre-backs", &["DC"]),
    ("Wing-backs", &["WBR", "WBL"]),
    ("Defensive Midfielders", &["DM"]),
    ("Central Midfielders", &["MC"]),
    ("Wide Midfielders", &["MR", "ML"]),
    ("Attacking Midfielders (Central)", &["AMC"]),
    ("Wingers", &["AMR", "AML"]),
    ("Strikers", &["ST"]),
];

pub const TOP_FIVE_DIVISIONS: &[&str] = &[
    "Premier League",
    "Championship",
    "Serie A",
    "Bundesliga",
    "La Liga",
];

/// Restricts which records contribute values to a cohort. Every record is
/// still ranked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DivisionFilter {
    #[default]
    All,
    Same(String),
    TopFive,
}

impl DivisionFilter {
    pub fn admits(&self, division: &str) -> bool {
        match self {
            DivisionFilter::All => true,
            DivisionFilter::Same(target) => division == target.as_str(),
            DivisionFilter::TopFive => TOP_FIVE_DIVISIONS.contains(&division),
        }
    }
}

/// `round(100 * (below + 0.5 * equal) / n)` against an ascending slice, or
/// [`NO_DATA`] for an empty one.
pub fn percentile_rank(sorted: &[f64], value: f64) -> f64 {
    if sorted.is_empty() {
        return NO_DATA;
    }
    let below = sorted.partition_point(|v| *v < value);
    let through = sorted.partition_point(|v| *v <= value);
    let equal = through - below;
    (100.0 * (below as f64 + 0.5 * equal as f64) / sorted.len() as f64).round()
}

struct Cohort {
    name: &'static str,
    /// Records that receive a percentile map under this cohort.
    members: Vec<usize>,
    /// Members whose values define the distribution.
    contributors: Vec<usize>,
}

/// Ranks the batch with no division filter.
pub fn rank(records: &mut [PlayerRecord]) {
    rank_with_filter(records, &DivisionFilter::All);
}

pub fn rank_with_filter(records: &mut [PlayerRecord], filter: &DivisionFilter) {
    let started = Instant::now();
    let view: &[PlayerRecord] = records;
    let cohorts = build_cohorts(view, filter);
    let writes = cohorts
        .par_iter()
        .map(|cohort| (cohort.name, score_cohort(view, cohort)))
        .collect::<Vec<_>>();

    for record in records.iter_mut() {
        record.percentiles.clear();
    }
    for (name, per_member) in writes {
        for (idx, stats) in per_member {
            records[idx].percentiles.insert(name.to_string(), stats);
        }
    }

    debug!(
        records = records.len(),
        cohorts = cohorts.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "percentile pass complete"
    );
}

fn build_cohorts(records: &[PlayerRecord], filter: &DivisionFilter) -> Vec<Cohort> {
    let admitted = records
        .iter()
        .map(|record| filter.admits(&record.division))
        .collect::<Vec<_>>();

    let cohort = |name: &'static str, belongs: &dyn Fn(&PlayerRecord) -> bool| {
        let members = records
            .iter()
            .enumerate()
            .filter_map(|(idx, record)| belongs(record).then_some(idx))
            .collect::<Vec<_>>();
        let contributors = members
            .iter()
            .copied()
            .filter(|idx| admitted[*idx])
            .collect();
        Cohort {
            name,
            members,
            contributors,
        }
    };

    let mut cohorts = Vec::with_capacity(1 + BROAD_GROUPS.len() + DETAILED_GROUPS.len());
    cohorts.push(cohort(GLOBAL_COHORT, &|_: &PlayerRecord| true));
    for group in BROAD_GROUPS.iter().copied() {
        cohorts.push(cohort(group, &|record: &PlayerRecord| {
            record.position_groups.iter().any(|g| g.as_str() == group)
        }));
    }
    for (name, codes) in DETAILED_GROUPS.iter().copied() {
        cohorts.push(cohort(name, &|record: &PlayerRecord| {
            record
                .short_positions
                .iter()
                .any(|code| codes.contains(&code.as_str()))
        }));
    }
    // Groups with no members leave no trace on any record.
    cohorts.retain(|cohort| !cohort.members.is_empty());
    cohorts
}

fn score_cohort(records: &[PlayerRecord], cohort: &Cohort) -> Vec<(usize, HashMap<String, f64>)> {
    let mut per_member = cohort
        .members
        .iter()
        .map(|idx| (*idx, HashMap::with_capacity(PERFORMANCE_STAT_KEYS.len())))
        .collect::<Vec<_>>();

    for key in PERFORMANCE_STAT_KEYS {
        let mut values = cohort
            .contributors
            .iter()
            .filter_map(|idx| records[*idx].performance_stats.get(*key).copied())
            .filter(|v| !v.is_nan())
            .collect::<Vec<f64>>();
        values.sort_by(f64::total_cmp);

        for (idx, stats) in per_member.iter_mut() {
            let percentile = match records[*idx].performance_stats.get(*key) {
                Some(value) if !values.is_empty() && !value.is_nan() => {
                    percentile_rank(&values, *value)
                }
                _ => NO_DATA,
            };
            stats.insert((*key).to_string(), percentile);
        }
    }
    per_member
}
