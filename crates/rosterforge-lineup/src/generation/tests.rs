use super::*;
use crate::stacks::stack_counts;
use rosterforge_config::{RandomnessConfig, SportRules};
use rosterforge_core::{Player, PlayerCatalog, StackKey};
use rosterforge_test::{
    mlb_catalog, mlb_rules, slate_catalog, slate_rules, stack_catalog, stack_players, stack_rules,
};

fn config(rules: SportRules, count: usize, threshold: u32) -> OptimizerConfig {
    OptimizerConfig::new(rules)
        .with_lineup_count(count)
        .with_similarity_threshold(threshold)
        .with_time_limit_ms(20_000)
        .with_workers(1)
}

fn assert_pairwise_diverse(lineups: &[Lineup], threshold: u32) {
    for (i, a) in lineups.iter().enumerate() {
        for b in &lineups[i + 1..] {
            assert!(a.shared_players(b) <= threshold as usize);
        }
    }
}

fn catalog_of(ids: &[&str]) -> PlayerCatalog {
    let players: Vec<Player> = stack_players()
        .into_iter()
        .filter(|p| ids.contains(&p.id.as_str()))
        .collect();
    PlayerCatalog::new(players).unwrap()
}

#[test]
fn test_generates_diverse_lineups_under_cap() {
    let config = config(mlb_rules(), 5, 6);
    let catalog = mlb_catalog();
    let report = LineupGenerator::new(&config, &catalog).generate().unwrap();

    assert_eq!(report.lineups.len(), 5);
    assert_eq!(report.stop_reason, StopReason::Completed);
    assert!(report.is_complete());
    assert_pairwise_diverse(&report.lineups, 6);

    let validator = LineupValidator::new(&config.sport);
    for lineup in &report.lineups {
        assert!(lineup.total_salary() <= 35000);
        assert_eq!(lineup.len(), 9);
        assert!(validator.is_valid(lineup, ValidationProfile::Full));
        let no_skip: [&str; 0] = [];
        for (team, count) in lineup.team_counts(&no_skip) {
            let has_marker = lineup.players().any(|p| p.team == team && p.plays("P"));
            assert!(count <= if has_marker { 6 } else { 5 });
        }
    }
}

#[test]
fn test_excluding_only_marker_is_infeasible() {
    let mut config = config(stack_rules(), 3, 3);
    config.generation.excluded_players = vec!["sp1".to_string()];
    let catalog = catalog_of(&["sp1", "bos1", "bos2", "nyy1", "tor1", "tb1"]);

    let report = LineupGenerator::new(&config, &catalog).generate().unwrap();

    assert!(report.lineups.is_empty());
    assert_eq!(report.stop_reason, StopReason::Infeasible);
    assert_eq!(report.attempts, 1);
    assert!(matches!(
        report.failures[0].error,
        RosterError::InfeasibleModel(_)
    ));
}

#[test]
fn test_primary_exposure_cap_spreads_stacks() {
    let config = config(stack_rules(), 10, 3);
    let catalog = stack_catalog();
    let report = LineupGenerator::new(&config, &catalog).generate().unwrap();

    assert_eq!(report.lineups.len(), 10);
    assert_pairwise_diverse(&report.lineups, 3);

    let bos = report
        .lineups
        .iter()
        .filter(|l| l.primary_stack == Some(StackKey::team("BOS")))
        .count();
    assert!(bos <= 2);

    let rules = stack_rules();
    for team in catalog.teams() {
        let key = StackKey::team(team.as_str());
        let used = report
            .lineups
            .iter()
            .filter(|l| l.primary_stack.as_ref() == Some(&key))
            .count();
        // Within one lineup of the 20% cap.
        assert!(used as f64 / 10.0 <= 0.2 + 0.1 + 1e-9);
    }
    for lineup in &report.lineups {
        let primary = lineup.primary_stack.as_ref().unwrap();
        assert_eq!(stack_counts(&rules, lineup).get(primary), Some(&2));
    }
}

#[test]
fn test_exposure_cap_binds_without_max_unstacked() {
    let mut rules = stack_rules();
    rules.stacks.max_unstacked = None;
    let config = config(rules.clone(), 10, 3);
    let catalog = stack_catalog();
    let report = LineupGenerator::new(&config, &catalog).generate().unwrap();

    assert_eq!(report.lineups.len(), 10);
    let bos = StackKey::team("BOS");
    let stacked_bos = report
        .lineups
        .iter()
        .filter(|l| stack_counts(&rules, l).get(&bos).is_some_and(|&n| n >= 2))
        .count();
    assert!(stacked_bos <= 2, "BOS stacked in {stacked_bos} of 10 lineups");

    for lineup in &report.lineups {
        for (key, count) in stack_counts(&rules, lineup) {
            if count >= 2 {
                assert_eq!(lineup.primary_stack.as_ref(), Some(&key));
            }
        }
    }
}

#[test]
fn test_full_slate_builds_lineups_with_both_stacks() {
    let rules = slate_rules();
    let mut config = config(rules.clone(), 2, 7);
    config.solver.unimproved_time_limit_ms = Some(1_000);
    let catalog = slate_catalog();
    let report = LineupGenerator::new(&config, &catalog).generate().unwrap();

    assert_eq!(report.lineups.len(), 2);
    assert_pairwise_diverse(&report.lineups, 7);
    let validator = LineupValidator::new(&rules);
    for lineup in &report.lineups {
        assert!(validator.is_valid(lineup, ValidationProfile::Full));
        let counts = stack_counts(&rules, lineup);
        assert_eq!(counts[lineup.primary_stack.as_ref().unwrap()], 4);
        assert_eq!(counts[lineup.secondary_stack.as_ref().unwrap()], 3);
    }
}

#[test]
fn test_locked_only_stack_exhausts_exposure() {
    let config = config(stack_rules(), 3, 3);
    let catalog = catalog_of(&["sp1", "bos1", "bos2", "bos3", "nyy1", "tor1", "tb1"]);

    let report = LineupGenerator::new(&config, &catalog).generate().unwrap();

    assert_eq!(report.lineups.len(), 1);
    assert_eq!(
        report.stop_reason,
        StopReason::ExposureExhausted(ExposureScope::PrimaryStack)
    );
    assert_eq!(report.attempts, 2);
    assert_eq!(report.relaxations, 1);
    assert_eq!(
        report.summary(),
        "1 of 3: stopped after 2 attempts, primary-stack exposure exhausted"
    );

    let bos = crate::exposure::Tracked::Stack(StackRole::Primary, StackKey::team("BOS"));
    let entry = report.exposure.get(&bos).unwrap();
    assert_eq!(entry.count, 1);
    assert!(entry.locked);
}

#[test]
fn test_duplicate_threshold_is_fatal() {
    let config = config(mlb_rules(), 2, 9);
    let catalog = mlb_catalog();

    let err = LineupGenerator::new(&config, &catalog).generate().unwrap_err();
    assert!(err.is_fatal());
}

#[test]
fn test_unknown_excluded_player_is_fatal() {
    let mut config = config(stack_rules(), 2, 3);
    config.generation.excluded_players = vec!["Nobody".to_string()];
    let catalog = stack_catalog();

    let err = LineupGenerator::new(&config, &catalog).generate().unwrap_err();
    assert!(matches!(err, RosterError::Configuration(_)));
}

#[test]
fn test_randomized_run_still_valid() {
    let mut config = config(mlb_rules(), 3, 6);
    config.generation.randomness = Some(RandomnessConfig {
        seed: Some(42),
        spread: 0.5,
    });
    let catalog = mlb_catalog();

    let report = LineupGenerator::new(&config, &catalog).generate().unwrap();

    assert_eq!(report.lineups.len(), 3);
    assert_pairwise_diverse(&report.lineups, 6);
    let validator = LineupValidator::new(&config.sport);
    assert!(report
        .lineups
        .iter()
        .all(|l| validator.is_valid(l, ValidationProfile::Full)));
}

#[test]
fn test_zero_lineups_requested() {
    let config = config(stack_rules(), 0, 3);
    let catalog = stack_catalog();

    let report = LineupGenerator::new(&config, &catalog).generate().unwrap();
    assert!(report.lineups.is_empty());
    assert_eq!(report.attempts, 0);
    assert_eq!(report.summary(), "0 of 0: completed in 0 attempts");
}
