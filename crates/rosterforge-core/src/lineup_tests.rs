//! Tests for lineups and stack identities.

use crate::lineup::{Lineup, LineupEntry, StackKey};
use crate::player::Player;

fn entry(slot: &str, id: &str, team: &str, salary: u32, projection: f64) -> LineupEntry {
    LineupEntry {
        slot: slot.to_string(),
        player: Player::new(id, id, &[slot], team, "OPP", salary, projection),
    }
}

fn lineup() -> Lineup {
    Lineup::new(vec![
        entry("P", "p1", "NYY", 9000, 30.0),
        entry("OF", "o1", "BOS", 4000, 10.0),
        entry("OF", "o2", "BOS", 3500, 9.5),
        entry("SS", "s1", "LAD", 3000, 8.0),
    ])
    .with_stacks(Some(StackKey::team("BOS")), None)
}

#[test]
fn test_totals() {
    let l = lineup();
    assert_eq!(l.total_salary(), 19_500);
    assert!((l.total_projection() - 57.5).abs() < 1e-9);
    assert_eq!(l.len(), 4);
}

#[test]
fn test_team_counts_skip_marker() {
    let l = lineup();
    let counts = l.team_counts(&["P"]);
    assert_eq!(counts.get("BOS"), Some(&2));
    assert_eq!(counts.get("NYY"), None);
}

#[test]
fn test_shared_players() {
    let a = lineup();
    let mut b = lineup();
    b.entries[3] = entry("SS", "s2", "LAD", 3000, 7.0);
    assert_eq!(a.shared_players(&b), 3);
}

#[test]
fn test_stack_key_labels() {
    let key = StackKey::grouped("PIT", "L1");
    assert_eq!(key.to_string(), "PIT:L1");
    assert_eq!(StackKey::parse("PIT:L1"), Some(key));
    assert_eq!(StackKey::parse("BOS"), Some(StackKey::team("BOS")));
    assert_eq!(StackKey::parse("  "), None);
}

#[test]
fn test_stack_key_includes_group() {
    let key = StackKey::grouped("PIT", "L1");
    let on_line = Player::new("1", "A", &["C"], "PIT", "NYR", 5000, 9.0).with_stack_group("L1");
    let off_line = Player::new("2", "B", &["C"], "PIT", "NYR", 5000, 9.0).with_stack_group("L2");
    assert!(key.includes(&on_line));
    assert!(!key.includes(&off_line));
    assert!(StackKey::team("PIT").includes(&off_line));
}

#[test]
fn test_row_keeps_slot_order() {
    let row = lineup().to_row();
    let slots: Vec<&str> = row.slots.iter().map(|(s, _)| s.as_str()).collect();
    assert_eq!(slots, ["P", "OF", "OF", "SS"]);
    assert_eq!(row.primary_stack.as_deref(), Some("BOS"));
    assert_eq!(row.total_salary, 19_500);
}

#[test]
fn test_lineup_serializes() {
    let json = serde_json::to_string(&lineup()).unwrap();
    let back: Lineup = serde_json::from_str(&json).unwrap();
    assert_eq!(back, lineup());
}
