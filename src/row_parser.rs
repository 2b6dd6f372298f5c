//! Maps one row of cell text onto a [`PlayerRecord`] using the frozen header
//! snapshot.

use std::collections::HashMap;

use crate::attributes::{self, FOOT_KEYS, IGNORED_COLUMNS};
use crate::error::RowError;
use crate::money::{MoneyValue, parse_money};
use crate::nations::resolve_nationality;
use crate::player::PlayerRecord;

const UID_HEADERS: &[&str] = &[
    "UID", "uid", "Uid", "ID", "id", "Id", "Player ID", "PlayerId", "player_id", "unique_id",
    "UniqueId",
];

const NATIONALITY_HEADER: &str = "Nat";
const MISSING_NAME_PREVIEW: usize = 5;

/// Builds an unrated record from a row. Cells beyond the header count are
/// ignored and missing trailing cells read as empty.
pub fn parse_row(cells: &[String], headers: &[String]) -> Result<PlayerRecord, RowError> {
    if headers.is_empty() {
        return Err(RowError::NoHeaders);
    }
    if cells.iter().all(|cell| cell.trim().is_empty()) {
        return Err(RowError::EmptyRow);
    }

    let mut record = PlayerRecord {
        attributes: HashMap::with_capacity(headers.len()),
        ..PlayerRecord::default()
    };
    let mut nationality_set = false;

    for (idx, header) in headers.iter().enumerate() {
        let value = cells.get(idx).map(|cell| cell.trim()).unwrap_or("");
        if value.is_empty() {
            continue;
        }
        let header = header.trim();
        match header {
            "Name" => record.name = value.to_string(),
            "Position" => record.position = value.to_string(),
            "Age" => record.age = value.to_string(),
            "Club" => record.club = value.to_string(),
            "Division" => record.division = value.to_string(),
            "Personality" => record.personality = value.to_string(),
            "Media Handling" => record.media_handling = value.to_string(),
            "Transfer Value" => {
                let money = parse_money(value);
                record.transfer_value = money.display.clone();
                record.transfer_value_amount = money.amount;
                adopt_symbol(&mut record, &money);
            }
            "Wage" => {
                let money = parse_money(value);
                record.wage = money.display.clone();
                record.wage_amount = money.amount;
                record.wage_period = money.period;
                adopt_symbol(&mut record, &money);
            }
            NATIONALITY_HEADER => {
                if nationality_set || looks_like_attribute(value) {
                    record
                        .attributes
                        .insert(NATIONALITY_HEADER.to_string(), value.to_string());
                } else {
                    let nat = resolve_nationality(value);
                    record.nationality = nat.name;
                    record.nationality_iso = nat.iso;
                    record.nationality_fifa_code = nat.fifa_code;
                    nationality_set = true;
                }
            }
            h if UID_HEADERS.contains(&h) => {
                if record.uid.is_empty() {
                    record.uid = value.to_string();
                }
            }
            h if FOOT_KEYS.contains(&h) => {
                if value != "-" {
                    record.attributes.insert(h.to_string(), value.to_string());
                }
            }
            h if IGNORED_COLUMNS.contains(&h) => {}
            h => {
                record.attributes.insert(h.to_string(), value.to_string());
            }
        }
    }

    if record.name.is_empty() {
        let preview = cells
            .iter()
            .take(MISSING_NAME_PREVIEW)
            .map(|cell| cell.trim().to_string())
            .collect();
        return Err(RowError::MissingName { preview });
    }

    Ok(record)
}

// "Nat" is both Natural Fitness and nationality. A 1-20 number, "-" or a
// numeric range is the attribute; anything else is a FIFA code.
fn looks_like_attribute(value: &str) -> bool {
    if value == "-" {
        return true;
    }
    if let Ok(n) = value.parse::<i32>() {
        return (1..=20).contains(&n);
    }
    attributes::parse_range(value).is_some()
}

fn adopt_symbol(record: &mut PlayerRecord, money: &MoneyValue) {
    if record.currency_symbol.is_empty() && !money.symbol.is_empty() {
        record.currency_symbol = money.symbol.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn nat_column_disambiguation() {
        let headers = strings(&["Name", "Nat", "Nat"]);
        let record = parse_row(&strings(&["A", "ENG", "14"]), &headers).unwrap();
        assert_eq!(record.nationality, "England");
        assert_eq!(record.attributes.get("Nat").map(String::as_str), Some("14"));

        let record = parse_row(&strings(&["A", "12", "FRA"]), &headers).unwrap();
        assert_eq!(record.nationality, "France");
        assert_eq!(record.nationality_iso, "fr");
    }

    #[test]
    fn nat_out_of_range_number_is_not_an_attribute() {
        let headers = strings(&["Name", "Nat"]);
        let record = parse_row(&strings(&["A", "25"]), &headers).unwrap();
        assert_eq!(record.nationality_fifa_code, "25");
        assert!(!record.attributes.contains_key("Nat"));
    }

    #[test]
    fn ignores_dropped_columns_and_blank_feet() {
        let headers = strings(&["Name", "Inf", "Left Foot", "Right Foot", "UID"]);
        let record = parse_row(&strings(&["A", "Wnt", "-", "Strong", "123"]), &headers).unwrap();
        assert!(!record.attributes.contains_key("Inf"));
        assert!(!record.attributes.contains_key("Left Foot"));
        assert_eq!(record.attributes.get("Right Foot").map(String::as_str), Some("Strong"));
        assert_eq!(record.uid, "123");
    }

    #[test]
    fn currency_comes_from_first_monetary_cell() {
        let headers = strings(&["Name", "Transfer Value", "Wage"]);
        let record = parse_row(&strings(&["A", "€5M", "£20K p/w"]), &headers).unwrap();
        assert_eq!(record.currency_symbol, "€");
        assert_eq!(record.wage_amount, 20_000);
    }
}
