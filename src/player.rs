use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::attributes;
use crate::error::RowError;
use crate::money::WagePeriod;
use crate::positions::{self, GROUP_GOALKEEPERS};
use crate::ratings::{
    self, GOALKEEPER_CATEGORIES, OUTFIELD_CATEGORIES, RatingSettings, RoleScore,
};
use crate::weights::WeightProvider;

/// Headline category stats on the 0–99 axis. Outfield and goalkeeper sets are
/// mutually exclusive: the set that does not apply stays zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct CategoryStats {
    pub pac: i32,
    pub sho: i32,
    pub pas: i32,
    pub dri: i32,
    pub def: i32,
    pub phy: i32,
    pub gk: i32,
    pub div: i32,
    pub han: i32,
    pub r#ref: i32,
    pub kic: i32,
    pub spd: i32,
    pub pos: i32,
}

impl CategoryStats {
    pub fn get(&self, code: &str) -> Option<i32> {
        Some(match code {
            "PAC" => self.pac,
            "SHO" => self.sho,
            "PAS" => self.pas,
            "DRI" => self.dri,
            "DEF" => self.def,
            "PHY" => self.phy,
            "GK" => self.gk,
            "DIV" => self.div,
            "HAN" => self.han,
            "REF" => self.r#ref,
            "KIC" => self.kic,
            "SPD" => self.spd,
            "POS" => self.pos,
            _ => return None,
        })
    }

    fn slot(&mut self, code: &str) -> Option<&mut i32> {
        Some(match code {
            "PAC" => &mut self.pac,
            "SHO" => &mut self.sho,
            "PAS" => &mut self.pas,
            "DRI" => &mut self.dri,
            "DEF" => &mut self.def,
            "PHY" => &mut self.phy,
            "GK" => &mut self.gk,
            "DIV" => &mut self.div,
            "HAN" => &mut self.han,
            "REF" => &mut self.r#ref,
            "KIC" => &mut self.kic,
            "SPD" => &mut self.spd,
            "POS" => &mut self.pos,
            _ => return None,
        })
    }
}

/// One player parsed from an export row and enriched by the rating engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub uid: String,
    pub name: String,
    pub position: String,
    pub age: String,
    pub club: String,
    pub division: String,
    pub personality: String,
    pub media_handling: String,
    pub nationality: String,
    pub nationality_iso: String,
    pub nationality_fifa_code: String,
    pub transfer_value: String,
    pub transfer_value_amount: i64,
    pub wage: String,
    pub wage_amount: i64,
    pub wage_period: Option<WagePeriod>,
    pub currency_symbol: String,
    /// Raw cell text for every non-identity column, keyed by header.
    pub attributes: HashMap<String, String>,
    pub numeric_attributes: HashMap<String, i32>,
    pub performance_stats: HashMap<String, f64>,
    /// Cohort name ("Global", a position group, a detailed group) to
    /// stat key to percentile.
    pub percentiles: HashMap<String, HashMap<String, f64>>,
    pub parsed_positions: Vec<String>,
    pub short_positions: Vec<String>,
    pub position_groups: Vec<String>,
    pub attribute_masked: bool,
    pub stats: CategoryStats,
    pub role_scores: Vec<RoleScore>,
    pub best_role: Option<RoleScore>,
    pub overall: i32,
}

impl PlayerRecord {
    pub fn is_goalkeeper(&self) -> bool {
        self.position_groups.iter().any(|g| g == GROUP_GOALKEEPERS)
    }

    /// Runs attribute resolution, stat parsing, position derivation and
    /// every rating over the raw cells collected by the row parser.
    pub fn enhance(&mut self, provider: &dyn WeightProvider, settings: &RatingSettings) {
        let mut masked = false;
        self.numeric_attributes.clear();
        for key in attributes::rated_attributes() {
            let Some(raw) = self.attributes.get(key) else {
                continue;
            };
            let (value, hidden) = attributes::resolve_attribute(raw);
            masked |= hidden;
            self.numeric_attributes.insert(key.to_string(), value);
        }

        self.performance_stats.clear();
        for key in attributes::PERFORMANCE_STAT_KEYS {
            let Some(raw) = self.attributes.get(*key) else {
                continue;
            };
            if let Some(value) = attributes::parse_stat(key, raw) {
                self.performance_stats.insert((*key).to_string(), value);
            }
        }

        let derived = positions::derive_positions(&self.position);
        self.parsed_positions = derived.names;
        self.short_positions = derived.short;
        self.position_groups = derived.groups;

        self.attribute_masked = masked;
        self.recalculate(provider, settings);
    }

    /// Recomputes category stats, role fitness and the masking flag from the
    /// already-resolved numeric attributes, e.g. after the scaling mode changed.
    pub fn recalculate(&mut self, provider: &dyn WeightProvider, settings: &RatingSettings) {
        self.attribute_masked |= self.scan_masked();

        let (active, inactive) = if self.is_goalkeeper() {
            (GOALKEEPER_CATEGORIES, OUTFIELD_CATEGORIES)
        } else {
            (OUTFIELD_CATEGORIES, GOALKEEPER_CATEGORIES)
        };
        let mut stats = CategoryStats::default();
        for code in active {
            let score = ratings::category_score(&self.numeric_attributes, code, provider, settings);
            if let Some(slot) = stats.slot(code) {
                *slot = score;
            }
        }
        for code in inactive {
            if let Some(slot) = stats.slot(code) {
                *slot = 0;
            }
        }
        self.stats = stats;

        self.role_scores = ratings::role_scores(
            &self.numeric_attributes,
            &self.short_positions,
            provider,
            settings,
        );
        self.best_role = self.role_scores.first().cloned();
        self.overall = ratings::overall_rating(&self.role_scores);
    }

    fn scan_masked(&self) -> bool {
        attributes::rated_attributes()
            .filter_map(|key| self.attributes.get(key))
            .any(|raw| attributes::is_masked_value(raw))
    }
}

/// One row of cell text in document order, tagged with its position among
/// the rows handed to workers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    pub index: usize,
    pub cells: Vec<String>,
}

/// Result of parsing one [`RawRow`].
#[derive(Debug, Clone)]
pub struct ParseOutcome {
    pub index: usize,
    pub result: Result<PlayerRecord, RowError>,
}
