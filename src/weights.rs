//! Category and role weight tables.
//!
//! Tables are loaded once, before any worker starts, and shared read-only
//! behind an `Arc<dyn WeightProvider>`.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use once_cell::sync::Lazy;
use tracing::{debug, warn};

/// Attribute code to integer weight.
pub type AttributeWeights = HashMap<String, i32>;

/// Table name (category code or full role name) to its weights.
pub type WeightTable = HashMap<String, AttributeWeights>;

/// A named role and its weights, indexed by short position code.
#[derive(Debug, Clone)]
pub struct RoleWeights {
    pub name: String,
    pub weights: AttributeWeights,
}

/// Source of weights for the rating engine.
pub trait WeightProvider: Send + Sync {
    /// Weights for a category code such as `PAC` or `GK`. Never fails: an
    /// unknown category resolves to the built-in table, or an empty one.
    fn category_weights(&self, category: &str) -> &AttributeWeights;

    /// Roles applicable to a short position code, in role-name order.
    fn roles_for_position(&self, short: &str) -> &[RoleWeights];
}

const DEFAULT_ATTRIBUTE_WEIGHTS: &[(&str, &[(&str, i32)])] = &[
    ("PAC", &[("Acc", 12), ("Pac", 12), ("Agi", 5)]),
    (
        "SHO",
        &[
            ("Fin", 8),
            ("Lon", 6),
            ("Pen", 4),
            ("Hea", 5),
            ("Cmp", 6),
            ("Tec", 5),
            ("Ant", 4),
            ("Dec", 4),
            ("Fla", 3),
        ],
    ),
    (
        "PAS",
        &[
            ("Pas", 8),
            ("Cro", 6),
            ("Fre", 4),
            ("Vis", 7),
            ("Tec", 5),
            ("Tea", 4),
            ("Dec", 4),
            ("Cor", 3),
            ("Fir", 4),
            ("OtB", 3),
        ],
    ),
    (
        "DRI",
        &[
            ("Dri", 8),
            ("Fir", 7),
            ("Tec", 6),
            ("Fla", 5),
            ("Cmp", 4),
            ("OtB", 3),
        ],
    ),
    (
        "DEF",
        &[
            ("Mar", 8),
            ("Tck", 8),
            ("Hea", 6),
            ("Ant", 7),
            ("Cnt", 6),
            ("Pos", 7),
            ("Dec", 5),
            ("Cmp", 4),
            ("Bra", 5),
            ("Agg", 4),
            ("Wor", 4),
        ],
    ),
    (
        "PHY",
        &[
            ("Str", 8),
            ("Sta", 7),
            ("Nat", 6),
            ("Jum", 5),
            ("Bal", 4),
            ("Agg", 5),
            ("Bra", 4),
            ("Wor", 4),
        ],
    ),
    (
        "GK",
        &[
            ("Han", 20),
            ("Ref", 20),
            ("Cmd", 15),
            ("Aer", 15),
            ("1v1", 10),
            ("Kic", 5),
            ("TRO", 5),
            ("Com", 3),
            ("Thr", 3),
            ("Ecc", 1),
        ],
    ),
    (
        "DIV",
        &[("Aer", 8), ("Ref", 7), ("Agi", 6), ("1v1", 7), ("Han", 5)],
    ),
    ("HAN", &[("Han", 10), ("Cmd", 7), ("Cmp", 5), ("Cnt", 4)]),
    ("REF", &[("Ref", 10), ("Ant", 6), ("Cnt", 5), ("1v1", 5)]),
    (
        "KIC",
        &[("Kic", 8), ("Thr", 6), ("Tec", 5), ("Vis", 4), ("Pas", 3)],
    ),
    ("SPD", &[("Acc", 8), ("Pac", 8), ("TRO", 6)]),
    (
        "POS",
        &[
            ("Pos", 8),
            ("Cmd", 7),
            ("Ant", 6),
            ("Dec", 5),
            ("TRO", 4),
            ("Cnt", 4),
            ("Com", 3),
        ],
    ),
];

const DEFAULT_ROLE_WEIGHTS: &[(&str, &[(&str, i32)])] = &[
    (
        "GK - Goalkeeper - Defend",
        &[
            ("Han", 90),
            ("Ref", 90),
            ("Aer", 80),
            ("Cmd", 75),
            ("1v1", 80),
            ("Cnt", 70),
            ("Dec", 70),
            ("Pos", 75),
            ("Ant", 60),
            ("Cmp", 60),
            ("Bra", 60),
            ("Com", 50),
            ("Kic", 40),
            ("Thr", 40),
            ("TRO", 30),
            ("Det", 50),
            ("Ldr", 40),
            ("Wor", 40),
            ("Tea", 40),
            ("Agi", 50),
            ("Jum", 60),
            ("Str", 50),
            ("Acc", 30),
            ("Pac", 30),
            ("Ecc", 10),
        ],
    ),
    (
        "DC - Ball Playing Defender - Defend",
        &[
            ("Cor", 5),
            ("Cro", 1),
            ("Dri", 40),
            ("Fin", 10),
            ("Fir", 35),
            ("Fre", 10),
            ("Hea", 55),
            ("Lon", 10),
            ("L Th", 0),
            ("Mar", 55),
            ("Pas", 55),
            ("Pen", 10),
            ("Tck", 40),
            ("Tec", 35),
            ("Agg", 40),
            ("Ant", 50),
            ("Bra", 30),
            ("Cmp", 80),
            ("Cnt", 50),
            ("Dec", 50),
            ("Det", 20),
            ("Fla", 10),
            ("Ldr", 10),
            ("OtB", 10),
            ("Pos", 55),
            ("Tea", 20),
            ("Vis", 50),
            ("Wor", 55),
            ("Acc", 100),
            ("Agi", 60),
            ("Bal", 35),
            ("Jum", 65),
            ("Nat", 10),
            ("Pac", 100),
            ("Sta", 30),
            ("Str", 50),
        ],
    ),
    (
        "DC - Central Defender - Defend",
        &[
            ("Cor", 10),
            ("Cro", 10),
            ("Dri", 30),
            ("Fin", 10),
            ("Fir", 30),
            ("Fre", 5),
            ("Hea", 60),
            ("Lon", 0),
            ("L Th", 0),
            ("Mar", 70),
            ("Pas", 40),
            ("Pen", 0),
            ("Tck", 70),
            ("Tec", 30),
            ("Agg", 60),
            ("Ant", 65),
            ("Bra", 50),
            ("Cmp", 80),
            ("Cnt", 65),
            ("Dec", 65),
            ("Det", 20),
            ("Fla", 10),
            ("Ldr", 10),
            ("OtB", 10),
            ("Pos", 65),
            ("Tea", 20),
            ("Vis", 30),
            ("Wor", 60),
            ("Acc", 80),
            ("Agi", 30),
            ("Bal", 30),
            ("Jum", 65),
            ("Nat", 10),
            ("Pac", 90),
            ("Sta", 40),
            ("Str", 60),
        ],
    ),
];

fn build_table(source: &[(&str, &[(&str, i32)])]) -> WeightTable {
    source
        .iter()
        .map(|(name, weights)| {
            let weights = weights
                .iter()
                .map(|(attr, weight)| (attr.to_string(), *weight))
                .collect::<AttributeWeights>();
            (name.to_string(), weights)
        })
        .collect()
}

static DEFAULT_CATEGORIES: Lazy<WeightTable> = Lazy::new(|| build_table(DEFAULT_ATTRIBUTE_WEIGHTS));
static EMPTY_WEIGHTS: Lazy<AttributeWeights> = Lazy::new(AttributeWeights::new);

pub fn default_attribute_weights() -> WeightTable {
    DEFAULT_CATEGORIES.clone()
}

pub fn default_role_weights() -> WeightTable {
    build_table(DEFAULT_ROLE_WEIGHTS)
}

/// Short position code a role belongs to: `DC - Central Defender - Defend`
/// belongs to `DC`.
pub fn role_position_key(role_name: &str) -> Option<&str> {
    let (prefix, _) = role_name.split_once(" - ")?;
    let prefix = prefix.trim();
    (!prefix.is_empty()).then_some(prefix)
}

/// In-memory weight tables with roles pre-indexed by short position code.
#[derive(Debug, Clone)]
pub struct WeightTables {
    categories: WeightTable,
    roles_by_position: HashMap<String, Vec<RoleWeights>>,
    role_count: usize,
}

impl WeightTables {
    pub fn new(categories: WeightTable, roles: WeightTable) -> Self {
        let role_count = roles.len();
        // Deterministic order inside each position bucket.
        let ordered = roles.into_iter().collect::<BTreeMap<_, _>>();
        let mut roles_by_position: HashMap<String, Vec<RoleWeights>> = HashMap::new();
        for (name, weights) in ordered {
            let Some(key) = role_position_key(&name) else {
                debug!(role = %name, "role name has no position prefix, skipping");
                continue;
            };
            roles_by_position
                .entry(key.to_string())
                .or_default()
                .push(RoleWeights { name, weights });
        }
        Self {
            categories,
            roles_by_position,
            role_count,
        }
    }

    pub fn defaults() -> Self {
        Self::new(default_attribute_weights(), default_role_weights())
    }

    /// Loads both tables from JSON files, falling back per file to the
    /// built-in defaults when a path is absent, unreadable or empty.
    pub fn load(attribute_path: Option<&Path>, role_path: Option<&Path>) -> Self {
        let categories = match attribute_path {
            Some(path) => load_or_default(path, default_attribute_weights),
            None => default_attribute_weights(),
        };
        let roles = match role_path {
            Some(path) => load_or_default(path, default_role_weights),
            None => default_role_weights(),
        };
        Self::new(categories, roles)
    }

    pub fn role_count(&self) -> usize {
        self.role_count
    }
}

impl Default for WeightTables {
    fn default() -> Self {
        Self::defaults()
    }
}

impl WeightProvider for WeightTables {
    fn category_weights(&self, category: &str) -> &AttributeWeights {
        self.categories
            .get(category)
            .or_else(|| DEFAULT_CATEGORIES.get(category))
            .unwrap_or(&EMPTY_WEIGHTS)
    }

    fn roles_for_position(&self, short: &str) -> &[RoleWeights] {
        self.roles_by_position
            .get(short)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Reads a `{ "table": { "Attr": weight } }` JSON file.
pub fn read_weight_file(path: &Path) -> Result<WeightTable> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed reading weights {}", path.display()))?;
    let table: WeightTable = serde_json::from_str(&raw)
        .with_context(|| format!("failed parsing weights {}", path.display()))?;
    if table.is_empty() {
        return Err(anyhow!("weights file {} is empty", path.display()));
    }
    Ok(table)
}

fn load_or_default(path: &Path, fallback: fn() -> WeightTable) -> WeightTable {
    match read_weight_file(path) {
        Ok(table) => {
            debug!(path = %path.display(), entries = table.len(), "loaded weights");
            table
        }
        Err(err) => {
            warn!("{err:#}; using built-in weights");
            fallback()
        }
    }
}
