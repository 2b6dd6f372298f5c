//! Attribute and performance-stat catalogs, plus the rules for turning raw
//! cell text into numbers.

use std::collections::HashSet;

use once_cell::sync::Lazy;

pub const PHYSICAL: &[&str] = &["Acc", "Pac", "Str", "Sta", "Nat", "Bal", "Jum", "Agi"];
pub const MENTAL: &[&str] = &[
    "Agg", "Ant", "Bra", "Cmp", "Cnt", "Dec", "Det", "Fla", "Ldr", "OtB", "Pos", "Tea", "Vis",
    "Wor",
];
pub const TECHNICAL: &[&str] = &[
    "Cor", "Cro", "Dri", "Fin", "Fir", "Fre", "Hea", "Lon", "L Th", "Mar", "Pas", "Pen", "Tck",
    "Tec",
];
pub const GOALKEEPING: &[&str] = &[
    "Aer", "Cmd", "Com", "Ecc", "Han", "Kic", "1v1", "Ref", "TRO", "Thr", "Pun",
];

/// Footedness columns; kept as raw text, never rated or scanned for masking.
pub const FOOT_KEYS: &[&str] = &["Left Foot", "Right Foot"];

/// Columns that carry neither identity nor a rated attribute.
pub const IGNORED_COLUMNS: &[&str] = &["Inf", "Rec", "Salary"];

pub const PERFORMANCE_STAT_KEYS: &[&str] = &[
    "Asts/90", "Av Rat", "Blk/90", "Ch C/90", "Clr/90", "Cr C/90", "Drb/90", "xA/90", "xG/90",
    "Gls/90", "Hdrs W/90", "Int/90", "K Ps/90", "Ps C/90", "Shot/90", "Tck/90", "Poss Won/90",
    "ShT/90", "Pres C/90", "Poss Lost/90", "Pr passes/90", "Conv %", "Tck R", "Pas %", "Cr C/A",
    "Fls", "Apps", "NP-xG/90", "Ps A/90", "Mins", "Clean Sheets", "FA", "CRS A/90", "Con/90",
    "Cln/90", "xGP/90", "Sv %",
];

static ROSTER: Lazy<HashSet<&'static str>> = Lazy::new(|| rated_attributes().collect());

pub fn rated_attributes() -> impl Iterator<Item = &'static str> {
    PHYSICAL
        .iter()
        .chain(MENTAL)
        .chain(TECHNICAL)
        .chain(GOALKEEPING)
        .copied()
}

/// Number of rated attributes across all four groups.
pub fn roster_len() -> usize {
    ROSTER.len()
}

pub fn is_rated_attribute(key: &str) -> bool {
    ROSTER.contains(key)
}

pub fn is_performance_stat(key: &str) -> bool {
    PERFORMANCE_STAT_KEYS.contains(&key)
}

/// Numeric value of an attribute cell and whether the cell hid its true value.
///
/// `-` is a fully masked attribute (0). `a-b` is a scouting range and resolves
/// to its integer midpoint; a malformed range resolves to 0 and is not masked.
pub fn resolve_attribute(raw: &str) -> (i32, bool) {
    let raw = raw.trim();
    if raw == "-" {
        return (0, true);
    }
    if raw.contains('-') {
        return match parse_range(raw) {
            Some((lo, hi)) => ((lo + hi) / 2, true),
            None => (0, false),
        };
    }
    (raw.parse::<i32>().unwrap_or(0), false)
}

/// True when the cell text is `-` or a well-formed integer range.
pub fn is_masked_value(raw: &str) -> bool {
    let raw = raw.trim();
    raw == "-" || parse_range(raw).is_some()
}

pub fn parse_range(raw: &str) -> Option<(i32, i32)> {
    let (lo, hi) = raw.split_once('-')?;
    let lo = lo.trim().parse::<i32>().ok()?;
    let hi = hi.trim().parse::<i32>().ok()?;
    Some((lo, hi))
}

/// Parses a performance-stat cell. `Apps` may read `22 (4)`, which counts
/// starts and substitute appearances together. A malformed substitute part
/// drops the whole value.
pub fn parse_stat(key: &str, raw: &str) -> Option<f64> {
    let s = raw.trim();
    if s.is_empty() || s == "-" {
        return None;
    }
    let s = s.replace('%', "");
    if key == "Apps"
        && let Some((starts, subs)) = s.split_once('(')
    {
        let starts = parse_number(starts)?;
        let subs = parse_number(subs.trim_end().strip_suffix(')')?)?;
        return Some(starts + subs);
    }
    parse_number(&s)
}

fn parse_number(raw: &str) -> Option<f64> {
    let cleaned = raw.trim().replace(',', "");
    if cleaned.is_empty() || cleaned == "-" {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_masked_and_ranged_values() {
        assert_eq!(resolve_attribute("15"), (15, false));
        assert_eq!(resolve_attribute("-"), (0, true));
        assert_eq!(resolve_attribute("12-16"), (14, true));
        assert_eq!(resolve_attribute("13-16"), (14, true));
        assert_eq!(resolve_attribute("a-b"), (0, false));
        assert_eq!(resolve_attribute("abc"), (0, false));
    }

    #[test]
    fn masking_scan_requires_integer_ranges() {
        assert!(is_masked_value("-"));
        assert!(is_masked_value("8-12"));
        assert!(!is_masked_value("Very Strong"));
        assert!(!is_masked_value("x-y"));
    }

    #[test]
    fn parses_stat_shapes() {
        assert_eq!(parse_stat("Mins", "2,430"), Some(2430.0));
        assert_eq!(parse_stat("Apps", "22 (4)"), Some(26.0));
        assert_eq!(parse_stat("Apps", "30"), Some(30.0));
        assert_eq!(parse_stat("Apps", " 22 ( 4 ) "), Some(26.0));
        assert_eq!(parse_stat("Pas %", "84%"), Some(84.0));
        assert_eq!(parse_stat("xG/90", "0.45"), Some(0.45));
        assert_eq!(parse_stat("xG/90", "-"), None);
        assert_eq!(parse_stat("xG/90", "n/a"), None);
    }

    #[test]
    fn malformed_substitute_apps_are_omitted() {
        assert_eq!(parse_stat("Apps", "22 (x)"), None);
        assert_eq!(parse_stat("Apps", "22 (4"), None);
        assert_eq!(parse_stat("Apps", "22 ()"), None);
        assert_eq!(parse_stat("Apps", "(4)"), None);
    }

    #[test]
    fn roster_covers_all_groups() {
        assert_eq!(roster_len(), 8 + 14 + 14 + 11);
        assert!(is_rated_attribute("L Th"));
        assert!(is_rated_attribute("1v1"));
        assert!(!is_rated_attribute("Left Foot"));
    }
}
