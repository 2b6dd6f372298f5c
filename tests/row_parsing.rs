use squadview::error::RowError;
use squadview::money::{WagePeriod, parse_money};
use squadview::nations::resolve_nationality;
use squadview::positions::derive_positions;
use squadview::row_parser::parse_row;

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

#[test]
fn identity_and_money_columns() {
    let headers = strings(&[
        "UID", "Name", "Club", "Division", "Personality", "Media Handling", "Transfer Value",
        "Wage",
    ]);
    let cells = strings(&[
        "2000123",
        " Florian Wirtz ",
        "Leverkusen",
        "Bundesliga",
        "Driven",
        "Evasive",
        "€100M - €120M",
        "€6.5M p/a",
    ]);
    let record = parse_row(&cells, &headers).expect("row should parse");
    assert_eq!(record.uid, "2000123");
    assert_eq!(record.name, "Florian Wirtz");
    assert_eq!(record.personality, "Driven");
    assert_eq!(record.media_handling, "Evasive");
    assert_eq!(record.transfer_value_amount, 120_000_000);
    assert_eq!(record.wage_amount, 6_500_000);
    assert_eq!(record.wage_period, Some(WagePeriod::Annual));
    assert_eq!(record.currency_symbol, "€");
}

#[test]
fn short_rows_read_missing_cells_as_empty() {
    let headers = strings(&["Name", "Club", "Fin"]);
    let record = parse_row(&strings(&["Solo"]), &headers).expect("row should parse");
    assert_eq!(record.name, "Solo");
    assert!(record.club.is_empty());
    assert!(record.attributes.is_empty());
}

#[test]
fn nationality_column_doubles_as_natural_fitness() {
    let headers = strings(&["Name", "Nat"]);
    let fitness = parse_row(&strings(&["A", "14"]), &headers).expect("row should parse");
    assert!(fitness.nationality.is_empty());
    assert_eq!(fitness.attributes.get("Nat").map(String::as_str), Some("14"));

    let masked = parse_row(&strings(&["B", "11-15"]), &headers).expect("row should parse");
    assert_eq!(masked.attributes.get("Nat").map(String::as_str), Some("11-15"));

    let nation = parse_row(&strings(&["C", "bra"]), &headers).expect("row should parse");
    assert_eq!(nation.nationality, "Brazil");
    assert_eq!(nation.nationality_fifa_code, "BRA");
    assert_eq!(nation.nationality_iso, "br");
}

#[test]
fn skippable_row_errors() {
    let headers = strings(&["Name", "Age"]);
    assert_eq!(
        parse_row(&strings(&[" ", ""]), &headers),
        Err(RowError::EmptyRow)
    );
    let err = parse_row(&strings(&["", "31"]), &headers).unwrap_err();
    assert_eq!(
        err,
        RowError::MissingName {
            preview: strings(&["", "31"])
        }
    );
    assert!(!err.is_skippable());
    assert!(RowError::EmptyRow.is_skippable());
    assert_eq!(parse_row(&strings(&["A"]), &[]), Err(RowError::NoHeaders));
    assert!(!RowError::NoHeaders.is_skippable());
}

#[test]
fn money_edge_cases() {
    let value = parse_money("R$ 2.5M");
    assert_eq!(value.symbol, "R$");
    assert_eq!(value.amount, 2_500_000);

    let value = parse_money("Not for Sale");
    assert_eq!(value.amount, 0);
    assert!(value.symbol.is_empty());

    assert_eq!(parse_money("£1.2K p/m").period, Some(WagePeriod::Monthly));
}

#[test]
fn loan_transfer_value_leaves_currency_to_the_wage() {
    let headers = strings(&["Name", "Transfer Value", "Wage"]);
    let record = parse_row(&strings(&["Alice", "Loan", "£20K p/w"]), &headers)
        .expect("row should parse");
    assert_eq!(record.transfer_value_amount, 0);
    assert_eq!(record.wage_amount, 20_000);
    assert_eq!(record.currency_symbol, "£");

    let record = parse_row(&strings(&["Bob", "Free", "-"]), &headers).expect("row should parse");
    assert!(record.currency_symbol.is_empty());
}

#[test]
fn unknown_nation_falls_back_to_code() {
    let nat = resolve_nationality("XKX");
    assert_eq!(nat.fifa_code, "XKX");
    assert_eq!(nat.name, "XKX");
    assert_eq!(nat.iso, "xk");
}

#[test]
fn complex_position_strings() {
    let derived = derive_positions("D/WB/M (L), DM, GK");
    assert_eq!(derived.short, vec!["GK", "DL", "WBL", "DM", "ML"]);
    assert_eq!(
        derived.groups,
        vec!["Defenders", "Goalkeepers", "Midfielders", "Wing-Backs"]
    );
}
