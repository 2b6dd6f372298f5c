use squadview::attributes::PERFORMANCE_STAT_KEYS;
use squadview::percentiles::{DivisionFilter, GLOBAL_COHORT, NO_DATA, rank, rank_with_filter};
use squadview::player::PlayerRecord;
use squadview::positions::derive_positions;

fn player(name: &str, position: &str, division: &str, stats: &[(&str, f64)]) -> PlayerRecord {
    let derived = derive_positions(position);
    PlayerRecord {
        name: name.to_string(),
        position: position.to_string(),
        division: division.to_string(),
        parsed_positions: derived.names,
        short_positions: derived.short,
        position_groups: derived.groups,
        performance_stats: stats.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
        ..PlayerRecord::default()
    }
}

fn squad() -> Vec<PlayerRecord> {
    vec![
        player("A", "D (C)", "Premier League", &[("Tck/90", 3.0), ("Apps", 30.0)]),
        player("B", "D (RC)", "Serie A", &[("Tck/90", 2.0), ("Apps", 12.0)]),
        player("C", "ST (C)", "Eredivisie", &[("Gls/90", 0.8), ("Apps", 25.0)]),
        player("D", "ST (C), AM (L)", "Premier League", &[("Gls/90", 0.5)]),
    ]
}

#[test]
fn every_member_gets_every_stat() {
    let mut records = squad();
    rank(&mut records);
    for record in &records {
        let global = &record.percentiles[GLOBAL_COHORT];
        assert_eq!(global.len(), PERFORMANCE_STAT_KEYS.len());
        for value in record.percentiles.values().flat_map(|m| m.values()) {
            assert!(*value == NO_DATA || (0.0..=100.0).contains(value));
        }
    }
}

#[test]
fn cohorts_follow_positions() {
    let mut records = squad();
    rank(&mut records);

    let a = &records[0];
    assert!(a.percentiles.contains_key("Defenders"));
    assert!(a.percentiles.contains_key("Centre-backs"));
    assert!(!a.percentiles.contains_key("Full-backs"));
    // Centre-backs: A 3.0, B 2.0.
    assert_eq!(a.percentiles["Centre-backs"]["Tck/90"], 75.0);

    let b = &records[1];
    assert_eq!(b.percentiles["Full-backs"]["Tck/90"], 50.0);

    let d = &records[3];
    assert!(d.percentiles.contains_key("Wingers"));
    assert!(d.percentiles.contains_key("Midfielders"));
    // Strikers: C 0.8, D 0.5.
    assert_eq!(d.percentiles["Strikers"]["Gls/90"], 25.0);
    // D has no Apps, but the cohort does.
    assert_eq!(d.percentiles["Strikers"]["Apps"], NO_DATA);
    assert_eq!(d.percentiles[GLOBAL_COHORT]["Tck/90"], NO_DATA);

    // No goalkeepers in the squad.
    assert!(records.iter().all(|r| !r.percentiles.contains_key("Goalkeepers")));
}

#[test]
fn top_five_filter_ranks_outsiders_against_the_filtered_cohort() {
    let mut records = squad();
    rank_with_filter(&mut records, &DivisionFilter::TopFive);

    // Contributors to Apps: A 30, B 12. C (Eredivisie) still gets a value.
    let c = &records[2];
    assert_eq!(c.percentiles[GLOBAL_COHORT]["Apps"], 50.0);
    // Strikers cohort keeps only D for Gls/90.
    assert_eq!(c.percentiles["Strikers"]["Gls/90"], 100.0);
}

#[test]
fn reranking_replaces_previous_maps() {
    let mut records = squad();
    rank(&mut records);
    records[0].position_groups.clear();
    records[0].short_positions.clear();
    rank(&mut records);
    assert_eq!(records[0].percentiles.len(), 1);
    assert!(records[0].percentiles.contains_key(GLOBAL_COHORT));
}
