use super::*;
use rosterforge_core::PlayerId;
use rosterforge_test::{lineup_from_ids, mlb_catalog, mlb_players, mlb_stacked_rules, nyy_stack_lineup};

fn scratched(ids: &[&str]) -> PlayerCatalog {
    let players = mlb_players()
        .into_iter()
        .map(|p| if ids.contains(&p.id.as_str()) { p.inactive() } else { p })
        .collect();
    PlayerCatalog::new(players).unwrap()
}

fn ids(players: &[Player]) -> Vec<&str> {
    players.iter().map(|p| p.id.as_str()).collect()
}

#[test]
fn test_all_active_needs_no_swap() {
    let rules = mlb_stacked_rules();
    let config = LateSwapConfig::default();
    let catalog = mlb_catalog();
    let lineup = nyy_stack_lineup(&rules, &catalog);

    let analysis = SwapAnalyzer::new(&rules, &config).analyze(&lineup, &catalog);
    assert_eq!(analysis.verdict, SwapVerdict::NoSwapNeeded);
    assert!(analysis.invalid_slots.is_empty());
    assert_eq!(analysis.primary_stack, Some(StackKey::team("NYY")));
}

#[test]
fn test_scratched_stack_player_ranks_same_team_first() {
    let rules = mlb_stacked_rules();
    let config = LateSwapConfig::default();
    let lineup = nyy_stack_lineup(&rules, &mlb_catalog());
    let refreshed = scratched(&["h01"]);

    let analysis = SwapAnalyzer::new(&rules, &config).analyze(&lineup, &refreshed);
    assert_eq!(analysis.verdict, SwapVerdict::NeedsSwap);
    assert_eq!(analysis.invalid_slots.len(), 1);

    let slot = &analysis.invalid_slots[0];
    assert_eq!(slot.index, 5);
    assert_eq!(slot.slot, "OF");
    assert_eq!(slot.stack_role, Some(StackRole::Primary));
    assert_eq!(slot.priority, 3);
    assert_eq!(slot.stack(&analysis), Some(&StackKey::team("NYY")));
    // Stanton keeps the stack; the rest follow by projection.
    assert_eq!(ids(&slot.candidates), vec!["h03", "h11", "h16", "h10"]);
}

#[test]
fn test_missing_player_counts_as_ineligible() {
    let rules = mlb_stacked_rules();
    let config = LateSwapConfig::default();
    let lineup = nyy_stack_lineup(&rules, &mlb_catalog());
    let players = mlb_players().into_iter().filter(|p| p.id.as_str() != "h07").collect();
    let refreshed = PlayerCatalog::new(players).unwrap();

    let analysis = SwapAnalyzer::new(&rules, &config).analyze(&lineup, &refreshed);
    let slot = &analysis.invalid_slots[0];
    assert_eq!(slot.player.id, PlayerId::new("h07"));
    assert_eq!(slot.stack_role, None);
    assert_eq!(slot.priority, 1);
}

#[test]
fn test_slots_sorted_by_priority() {
    let rules = mlb_stacked_rules();
    let config = LateSwapConfig::default();
    let lineup = nyy_stack_lineup(&rules, &mlb_catalog());
    // Altuve (2B, unstacked) sits before Soto (OF, stacked) in slot order.
    let refreshed = scratched(&["h15", "h02"]);

    let analysis = SwapAnalyzer::new(&rules, &config).analyze(&lineup, &refreshed);
    let order: Vec<usize> = analysis.invalid_slots.iter().map(|s| s.index).collect();
    assert_eq!(order, vec![6, 2]);
}

#[test]
fn test_locked_team_never_offered() {
    let rules = mlb_stacked_rules();
    let config = LateSwapConfig::default().with_locked_teams(&["LAD"]);
    let lineup = nyy_stack_lineup(&rules, &mlb_catalog());
    let refreshed = scratched(&["h01"]);

    let analysis = SwapAnalyzer::new(&rules, &config).analyze(&lineup, &refreshed);
    let candidates = &analysis.invalid_slots[0].candidates;
    assert!(candidates.iter().all(|p| p.team != "LAD"));
    assert_eq!(ids(candidates), vec!["h03", "h16", "h10"]);
}

#[test]
fn test_locked_invalid_player_stays() {
    let rules = mlb_stacked_rules();
    let config = LateSwapConfig::default().with_locked_teams(&["LAD"]);
    let catalog = mlb_catalog();
    let lineup = lineup_from_ids(
        &rules,
        &catalog,
        &["p03", "h14", "h15", "h17", "h04", "h01", "h02", "h07", "h05"],
    );
    let refreshed = scratched(&["h14"]);

    let analysis = SwapAnalyzer::new(&rules, &config).analyze(&lineup, &refreshed);
    assert_eq!(analysis.verdict, SwapVerdict::LockedOnly);
    assert_eq!(analysis.locked_invalid, vec![1]);
    assert!(analysis.invalid_slots.is_empty());
    // Derived from team counts: four NYY hitters.
    assert_eq!(analysis.primary_stack, Some(StackKey::team("NYY")));
}

#[test]
fn test_analysis_is_repeatable() {
    let rules = mlb_stacked_rules();
    let config = LateSwapConfig::default();
    let lineup = nyy_stack_lineup(&rules, &mlb_catalog());
    let refreshed = scratched(&["h01", "h09"]);
    let analyzer = SwapAnalyzer::new(&rules, &config);

    let first = analyzer.analyze(&lineup, &refreshed);
    let second = analyzer.analyze(&lineup, &refreshed);
    assert_eq!(first, second);
}
