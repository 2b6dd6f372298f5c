use std::collections::BTreeSet;

/// Short position codes in pitch order, goalkeeper first.
pub const DISPLAY_ORDER: &[&str] = &[
    "GK", "SW", "DR", "DC", "DL", "WBR", "WBL", "DM", "MR", "MC", "ML", "AMR", "AMC", "AML", "ST",
];

const POSITION_NAMES: &[(&str, &str)] = &[
    ("GK", "Goalkeeper"),
    ("SW", "Sweeper"),
    ("DC", "Centre Back"),
    ("DR", "Right Back"),
    ("DL", "Left Back"),
    ("WBR", "Right Wing-Back"),
    ("WBL", "Left Wing-Back"),
    ("DM", "Centre Defensive Midfielder"),
    ("MC", "Centre Midfielder"),
    ("MR", "Right Midfielder"),
    ("ML", "Left Midfielder"),
    ("AMC", "Centre Attacking Midfielder"),
    ("AMR", "Right Attacking Midfielder"),
    ("AML", "Left Attacking Midfielder"),
    ("ST", "Striker"),
];

pub const GROUP_GOALKEEPERS: &str = "Goalkeepers";
pub const GROUP_DEFENDERS: &str = "Defenders";
pub const GROUP_WING_BACKS: &str = "Wing-Backs";
pub const GROUP_MIDFIELDERS: &str = "Midfielders";
pub const GROUP_ATTACKERS: &str = "Attackers";

const POSITION_GROUPS: &[(&str, &[&str])] = &[
    (GROUP_GOALKEEPERS, &["Goalkeeper"]),
    (
        GROUP_DEFENDERS,
        &["Sweeper", "Right Back", "Left Back", "Centre Back"],
    ),
    (GROUP_WING_BACKS, &["Right Wing-Back", "Left Wing-Back"]),
    (
        GROUP_MIDFIELDERS,
        &[
            "Centre Defensive Midfielder",
            "Right Midfielder",
            "Left Midfielder",
            "Centre Midfielder",
            "Centre Attacking Midfielder",
            "Right Attacking Midfielder",
            "Left Attacking Midfielder",
        ],
    ),
    (GROUP_ATTACKERS, &["Striker"]),
];

/// Positions derived from a raw position cell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DerivedPositions {
    /// Standardized names, alphabetical.
    pub names: Vec<String>,
    /// Short codes, in [`DISPLAY_ORDER`].
    pub short: Vec<String>,
    /// Broad groups, alphabetical.
    pub groups: Vec<String>,
}

pub fn position_name(short: &str) -> Option<&'static str> {
    POSITION_NAMES
        .iter()
        .find(|(code, _)| *code == short)
        .map(|(_, name)| *name)
}

pub fn short_code(name: &str) -> Option<&'static str> {
    POSITION_NAMES
        .iter()
        .find(|(_, full)| *full == name)
        .map(|(code, _)| *code)
}

pub fn group_for(name: &str) -> Option<&'static str> {
    for (group, members) in POSITION_GROUPS {
        if members.contains(&name) {
            return Some(group);
        }
    }
    None
}

/// Parses a game position string such as `D/WB (R), DM` into standardized
/// position names. Unknown fragments are ignored.
pub fn parse_positions(raw: &str) -> Vec<String> {
    let mut found = BTreeSet::new();
    for part in raw.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let (roles, sides) = split_sides(part);
        for role in roles.split('/') {
            let role = role.trim().to_uppercase();
            if role.is_empty() {
                continue;
            }
            if sides.is_empty() {
                if let Some(name) = resolve_bare_role(&role) {
                    found.insert(name);
                }
                continue;
            }
            for side in sides.chars() {
                if let Some(name) = resolve_role_side(&role, side) {
                    found.insert(name);
                }
            }
        }
    }
    found.into_iter().map(str::to_string).collect()
}

/// Derives names, short codes and groups in one pass.
pub fn derive_positions(raw: &str) -> DerivedPositions {
    let names = parse_positions(raw);

    let mut short = names
        .iter()
        .filter_map(|name| short_code(name))
        .collect::<Vec<_>>();
    short.sort_by_key(|code| display_rank(code));
    short.dedup();

    let groups = names
        .iter()
        .filter_map(|name| group_for(name))
        .collect::<BTreeSet<_>>();

    DerivedPositions {
        names,
        short: short.into_iter().map(str::to_string).collect(),
        groups: groups.into_iter().map(str::to_string).collect(),
    }
}

pub fn display_rank(short: &str) -> usize {
    DISPLAY_ORDER
        .iter()
        .position(|code| *code == short)
        .unwrap_or(DISPLAY_ORDER.len())
}

// "AM (RLC)" -> ("AM", "RLC"). The parenthesised suffix only counts when it
// closes the fragment and does not start it.
fn split_sides(part: &str) -> (&str, String) {
    if part.ends_with(')')
        && let Some(open) = part.rfind('(')
        && open > 0
    {
        let sides = part[open + 1..part.len() - 1]
            .trim()
            .to_uppercase()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        return (part[..open].trim(), sides);
    }
    (part, String::new())
}

fn resolve_bare_role(role: &str) -> Option<&'static str> {
    match role {
        "D" | "M" | "AM" | "ST" | "DM" | "SW" => resolve_role_side(role, 'C'),
        // A wing-back with no side cannot be placed.
        "WB" => None,
        _ => position_name(role),
    }
}

fn resolve_role_side(role: &str, side: char) -> Option<&'static str> {
    let key = match (role, side) {
        ("D" | "M" | "AM", 'R' | 'L' | 'C') => format!("{role}{side}"),
        ("DM", 'C') => "DM".to_string(),
        ("WB", 'R' | 'L') => format!("WB{side}"),
        ("ST", 'C') => "ST".to_string(),
        ("SW", 'C') => "SW".to_string(),
        _ => format!("{role}{side}"),
    };
    let key = match key.as_str() {
        "STC" => "ST",
        "DMC" => "DM",
        other => other,
    };
    position_name(key)
}
