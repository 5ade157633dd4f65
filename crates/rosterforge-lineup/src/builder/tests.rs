//! Tests for the lineup model builder.

use std::time::Duration;

use rosterforge_config::{GroupLogic, GroupRule, GroupSelector, StackRules};
use rosterforge_core::{Player, RosterSlot};
use rosterforge_solver::{CpSolver, SearchConfig, SolveStatus};
use rosterforge_test::{
    mlb_catalog, mlb_rules, slate_catalog, slate_rules, stack_catalog, stack_players, stack_rules,
};

use crate::stacks::stack_counts;
use crate::validation::{LineupValidator, ValidationProfile};

use super::*;

fn solve(model: &LineupModel) -> Lineup {
    let config = SearchConfig::default().with_time_limit(Duration::from_secs(10));
    let result = CpSolver::new(config).solve(model.model());
    assert!(result.status.has_solution(), "status {}", result.status);
    model.extract(result.assignment.as_ref().unwrap()).unwrap()
}

fn ids(lineup: &Lineup) -> Vec<&str> {
    lineup.players().map(|p| p.id.as_str()).collect()
}

fn sorted_ids(lineup: &Lineup) -> Vec<&str> {
    let mut players = ids(lineup);
    players.sort_unstable();
    players
}

fn catalog_with(edit: impl Fn(Player) -> Player) -> PlayerCatalog {
    PlayerCatalog::new(stack_players().into_iter().map(edit).collect()).unwrap()
}

fn team_count(lineup: &Lineup, team: &str) -> usize {
    lineup.players().filter(|p| p.team == team && !p.plays("P")).count()
}

fn assert_full_valid(rules: &SportRules, lineup: &Lineup) {
    assert_eq!(LineupValidator::new(rules).validate(lineup, ValidationProfile::Full), vec![]);
}

#[test]
fn test_build_mlb_model() {
    let rules = mlb_rules();
    let catalog = mlb_catalog();
    let model = LineupModelBuilder::new(&rules, &catalog).build().unwrap();

    assert_eq!(model.pool_size(), 20);
    assert!(model.model().validate().is_ok());
    assert!(model.player_var(&PlayerId::new("h01")).is_some());
}

#[test]
fn test_uncovered_slot_is_configuration_error() {
    let mut rules = mlb_rules();
    rules.slots.push(RosterSlot::new("DH", 1, &["DH"]));
    let catalog = mlb_catalog();

    let err = LineupModelBuilder::new(&rules, &catalog).build().unwrap_err();
    assert!(matches!(err, RosterError::Configuration(_)));
}

#[test]
fn test_pool_without_markers_is_configuration_error() {
    let rules = stack_rules();
    let hitters: Vec<Player> = stack_players().into_iter().filter(|p| !p.plays("P")).collect();
    let catalog = PlayerCatalog::new(hitters).unwrap();

    let err = LineupModelBuilder::new(&rules, &catalog).build().unwrap_err();
    assert!(err.is_fatal());
}

#[test]
fn test_unknown_group_player_is_configuration_error() {
    let rules = mlb_rules().with_group(GroupRule::new("ghost", GroupSelector::names(&["Babe Ruth"])).with_max(0));
    let catalog = mlb_catalog();

    let err = LineupModelBuilder::new(&rules, &catalog).build().unwrap_err();
    assert!(matches!(err, RosterError::Configuration(msg) if msg.contains("Babe Ruth")));
}

#[test]
fn test_best_lineup_uses_strongest_stack() {
    let rules = stack_rules();
    let catalog = stack_catalog();
    let model = LineupModelBuilder::new(&rules, &catalog).build().unwrap();

    let lineup = solve(&model);
    let mut players = ids(&lineup);
    players.sort_unstable();
    assert_eq!(players, ["bos1", "bos2", "nyy1", "sp1", "tor1"]);
    assert_eq!(lineup.primary_stack, Some(StackKey::team("BOS")));
    assert_eq!(lineup.entries[0].slot, "P");
}

#[test]
fn test_excluded_stack_moves_primary() {
    let rules = stack_rules();
    let catalog = stack_catalog();
    let mut exclusions = Exclusions::new();
    exclusions.exclude_stack(StackRole::Primary, StackKey::team("BOS"));

    let model = LineupModelBuilder::new(&rules, &catalog)
        .with_exclusions(&exclusions)
        .build()
        .unwrap();
    let lineup = solve(&model);

    assert_ne!(lineup.primary_stack, Some(StackKey::team("BOS")));
    // BOS may still appear once as an unstacked team.
    assert!(lineup.players().filter(|p| p.team == "BOS").count() <= 1);
}

#[test]
fn test_excluding_only_marker_is_infeasible() {
    let rules = stack_rules();
    let players: Vec<Player> = stack_players()
        .into_iter()
        .filter(|p| !p.plays("P") || p.id.as_str() == "sp1")
        .collect();
    let catalog = PlayerCatalog::new(players).unwrap();
    let mut exclusions = Exclusions::new();
    exclusions.exclude_player(PlayerId::new("sp1"));

    let model = LineupModelBuilder::new(&rules, &catalog)
        .with_exclusions(&exclusions)
        .build()
        .unwrap();
    let result = CpSolver::new(SearchConfig::default()).solve(model.model());
    assert_eq!(result.status, SolveStatus::Infeasible);
}

#[test]
fn test_conditional_group_applies_when_condition_holds() {
    let group = GroupRule::new(
        "no_nyy_with_bos1",
        GroupSelector {
            teams: vec!["NYY".to_string()],
            ..GroupSelector::default()
        },
    )
    .with_max(0)
    .when(&["bos1"], GroupLogic::Any);
    let rules = stack_rules().with_group(group);
    let catalog = stack_catalog();

    let lineup = solve(&LineupModelBuilder::new(&rules, &catalog).build().unwrap());
    assert!(lineup.contains(&PlayerId::new("bos1")));
    assert!(lineup.players().all(|p| p.team != "NYY"));
}

#[test]
fn test_fixed_player_and_pinned_stack() {
    let rules = stack_rules();
    let catalog = stack_catalog();
    let model = LineupModelBuilder::new(&rules, &catalog)
        .with_fixed(&[(0, PlayerId::new("sp3"))])
        .with_pinned_stack(StackRole::Primary, StackKey::team("TOR"))
        .build()
        .unwrap();

    let lineup = solve(&model);
    assert_eq!(lineup.entries[0].player.id.as_str(), "sp3");
    assert_eq!(lineup.primary_stack, Some(StackKey::team("TOR")));
    assert_eq!(lineup.players().filter(|p| p.team == "TOR").count(), 2);
}

#[test]
fn test_pinning_unformable_stack_is_infeasible() {
    let rules = stack_rules();
    let catalog = stack_catalog();
    let err = LineupModelBuilder::new(&rules, &catalog)
        .with_pinned_stack(StackRole::Primary, StackKey::team("SEA"))
        .build()
        .unwrap_err();
    assert!(matches!(err, RosterError::InfeasibleModel(_)));
}

#[test]
fn test_diversity_limits_shared_players() {
    let rules = stack_rules();
    let catalog = stack_catalog();
    let first = solve(&LineupModelBuilder::new(&rules, &catalog).build().unwrap());

    let model = LineupModelBuilder::new(&rules, &catalog)
        .with_previous_lineups(std::slice::from_ref(&first), 2)
        .build()
        .unwrap();
    let second = solve(&model);
    assert!(second.shared_players(&first) <= 2);
}

#[test]
fn test_objective_weights_override_projection() {
    let rules = stack_rules();
    let catalog = stack_catalog();
    let weights = ObjectiveWeights::new().with_projection(PlayerId::new("sp3"), 40.0);

    let lineup = solve(&LineupModelBuilder::new(&rules, &catalog).with_objective(&weights).build().unwrap());
    assert_eq!(lineup.entries[0].player.id.as_str(), "sp3");
}

#[test]
fn test_resolve_player_by_id_or_name() {
    let catalog = mlb_catalog();
    assert_eq!(resolve_player(&catalog, "h02").unwrap().display_name(), "Juan Soto");
    assert_eq!(resolve_player(&catalog, "Juan Soto").unwrap().id.as_str(), "h02");
    assert!(resolve_player(&catalog, "Nobody").is_err());
}

#[test]
fn test_avoid_rule_keeps_marker_off_stack() {
    let rules = stack_rules().with_marker_rule(MarkerStackRule::Avoid {
        markers: vec!["sp1".to_string()],
        teams: vec!["BOS".to_string()],
        top_owned: 3,
        threshold: 2,
    });
    let catalog = stack_catalog();

    let lineup = solve(&LineupModelBuilder::new(&rules, &catalog).build().unwrap());
    // sp2 with the BOS stack (57.8) beats sp1 with NYY (56.3).
    assert_eq!(lineup.entries[0].player.id.as_str(), "sp2");
    assert_eq!(lineup.primary_stack, Some(StackKey::team("BOS")));
    assert_full_valid(&rules, &lineup);
}

#[test]
fn test_require_rule_pairs_marker_with_stack() {
    let rules = stack_rules().with_marker_rule(MarkerStackRule::Require {
        markers: vec!["sp2".to_string()],
        primary: vec!["BOS".to_string()],
        secondary: vec![],
    });
    let catalog = stack_catalog();

    let lineup = solve(&LineupModelBuilder::new(&rules, &catalog).build().unwrap());
    assert_eq!(lineup.primary_stack, Some(StackKey::team("BOS")));
    assert_eq!(lineup.entries[0].player.id.as_str(), "sp2");
    assert_full_valid(&rules, &lineup);
}

#[test]
fn test_stack_only_player_left_out_of_unstacked_team() {
    let rules = stack_rules();
    let catalog = catalog_with(|p| if p.id.as_str() == "nyy1" { p.stack_only() } else { p });

    let lineup = solve(&LineupModelBuilder::new(&rules, &catalog).build().unwrap());
    assert_eq!(sorted_ids(&lineup), ["bos1", "bos2", "sp1", "tb1", "tor1"]);
    assert_full_valid(&rules, &lineup);
}

#[test]
fn test_one_off_players_are_the_only_unstacked_choices() {
    let rules = stack_rules();
    let catalog = stack_catalog();
    let one_off = ["tor1".to_string(), "TB Hitter 1".to_string()];

    let lineup = solve(
        &LineupModelBuilder::new(&rules, &catalog)
            .with_one_off_players(&one_off)
            .build()
            .unwrap(),
    );
    assert_eq!(sorted_ids(&lineup), ["bos1", "bos2", "sp1", "tb1", "tor1"]);
}

#[test]
fn test_unknown_one_off_player_is_configuration_error() {
    let rules = stack_rules();
    let catalog = stack_catalog();
    let err = LineupModelBuilder::new(&rules, &catalog)
        .with_one_off_players(&["Nobody".to_string()])
        .build()
        .unwrap_err();
    assert!(matches!(err, RosterError::Configuration(_)));
}

#[test]
fn test_opponent_exclusion_in_model() {
    let rules = stack_rules().with_opponent_exclusion();
    let catalog = catalog_with(|mut p| {
        if p.id.as_str() == "sp1" {
            p.opponent = "BOS".to_string();
        }
        p
    });

    let lineup = solve(&LineupModelBuilder::new(&rules, &catalog).build().unwrap());
    // sp1 faces BOS, so the BOS stack goes with sp2.
    assert_eq!(lineup.entries[0].player.id.as_str(), "sp2");
    assert_eq!(lineup.primary_stack, Some(StackKey::team("BOS")));
    assert_full_valid(&rules, &lineup);
}

fn two_stack_rules(stacks: StackRules) -> SportRules {
    let mut rules = stack_rules();
    rules.stacks = stacks;
    rules
}

fn two_stacks() -> StackRules {
    StackRules::default().with_primary(&[2], 1.0).with_secondary(&[2], 1.0)
}

#[test]
fn test_secondary_stack_is_formed() {
    let rules = two_stack_rules(two_stacks());
    let catalog = stack_catalog();

    let lineup = solve(&LineupModelBuilder::new(&rules, &catalog).build().unwrap());
    let mut keys = [lineup.primary_stack.clone().unwrap(), lineup.secondary_stack.clone().unwrap()];
    keys.sort();
    assert_eq!(keys, [StackKey::team("BOS"), StackKey::team("NYY")]);
    assert_eq!(team_count(&lineup, "BOS"), 2);
    assert_eq!(team_count(&lineup, "NYY"), 2);
    assert_full_valid(&rules, &lineup);
}

#[test]
fn test_excluded_primary_team_may_still_be_secondary() {
    let mut stacks = two_stacks();
    stacks.excluded_primary_teams = vec!["BOS".to_string()];
    let rules = two_stack_rules(stacks);
    let catalog = stack_catalog();

    let lineup = solve(&LineupModelBuilder::new(&rules, &catalog).build().unwrap());
    assert_eq!(lineup.primary_stack, Some(StackKey::team("NYY")));
    assert_eq!(lineup.secondary_stack, Some(StackKey::team("BOS")));
    assert_full_valid(&rules, &lineup);
}

#[test]
fn test_allowed_pairings_restrict_secondary() {
    let mut stacks = two_stacks();
    stacks.allowed_pairings.insert("BOS".to_string(), vec!["TB".to_string()]);
    let rules = two_stack_rules(stacks);
    let catalog = stack_catalog();

    let lineup = solve(&LineupModelBuilder::new(&rules, &catalog).build().unwrap());
    // BOS over NYY is not a legal pairing; NYY over BOS (41.0) beats
    // BOS over TB (40.2).
    assert_eq!(lineup.primary_stack, Some(StackKey::team("NYY")));
    assert_eq!(lineup.secondary_stack, Some(StackKey::team("BOS")));
    assert_full_valid(&rules, &lineup);

    let mut stacks = two_stacks();
    stacks.allowed_pairings.insert("BOS".to_string(), vec!["TB".to_string()]);
    stacks.excluded_primary_teams = ["NYY", "TOR", "TB", "BAL", "CLE"].map(String::from).to_vec();
    let rules = two_stack_rules(stacks);
    let lineup = solve(&LineupModelBuilder::new(&rules, &catalog).build().unwrap());
    assert_eq!(lineup.primary_stack, Some(StackKey::team("BOS")));
    assert_eq!(lineup.secondary_stack, Some(StackKey::team("TB")));
}

/// `tor1` is banned whenever `logic` holds over `names`.
fn tor1_banned_when(names: &[&str], logic: GroupLogic) -> (SportRules, Lineup) {
    let group = GroupRule::new("no_tor1", GroupSelector::names(&["tor1"]))
        .with_max(0)
        .when(names, logic);
    let rules = stack_rules().with_group(group);
    let catalog = stack_catalog();
    let lineup = solve(&LineupModelBuilder::new(&rules, &catalog).build().unwrap());
    (rules, lineup)
}

#[test]
fn test_condition_logic_binds_when_it_holds() {
    let cases = [
        (vec!["bos1", "sp2"], GroupLogic::Xor),
        (vec!["bos1", "sp2"], GroupLogic::Nand),
        (vec!["sp2", "sp3"], GroupLogic::Nor),
    ];
    for (names, logic) in cases {
        let (rules, lineup) = tor1_banned_when(&names, logic);
        assert_eq!(sorted_ids(&lineup), ["bos1", "bos2", "nyy1", "sp1", "tb1"], "{logic}");
        assert_full_valid(&rules, &lineup);
    }
}

#[test]
fn test_condition_logic_ignored_when_it_fails() {
    let cases = [
        (vec!["bos1", "nyy1"], GroupLogic::Xor),
        (vec!["bos1", "bos2"], GroupLogic::Nand),
        (vec!["sp1"], GroupLogic::Nor),
    ];
    for (names, logic) in cases {
        let (rules, lineup) = tor1_banned_when(&names, logic);
        assert_eq!(sorted_ids(&lineup), ["bos1", "bos2", "nyy1", "sp1", "tor1"], "{logic}");
        assert_full_valid(&rules, &lineup);
    }
}

#[test]
fn test_every_stack_sized_group_is_labeled() {
    let mut rules = stack_rules();
    rules.stacks.max_unstacked = None;
    let catalog = stack_catalog();
    let mut exclusions = Exclusions::new();
    exclusions.exclude_stack(StackRole::Primary, StackKey::team("BOS"));

    let lineup = solve(
        &LineupModelBuilder::new(&rules, &catalog)
            .with_exclusions(&exclusions)
            .build()
            .unwrap(),
    );
    assert_ne!(lineup.primary_stack, Some(StackKey::team("BOS")));
    for (key, count) in stack_counts(&rules, &lineup) {
        if count >= 2 {
            assert_eq!(lineup.primary_stack.as_ref(), Some(&key));
        }
    }
}

#[test]
fn test_full_slate_with_both_stack_roles() {
    let rules = slate_rules();
    let catalog = slate_catalog();
    let model = LineupModelBuilder::new(&rules, &catalog).build().unwrap();
    assert_eq!(model.pool_size(), 120);

    let config = SearchConfig::default()
        .with_time_limit(Duration::from_secs(10))
        .with_unimproved_limit(Duration::from_millis(500));
    let result = CpSolver::new(config).solve(model.model());
    assert!(result.status.has_solution(), "status {}", result.status);
    let lineup = model.extract(result.assignment.as_ref().unwrap()).unwrap();

    let primary = lineup.primary_stack.clone().unwrap();
    let secondary = lineup.secondary_stack.clone().unwrap();
    assert_ne!(primary, secondary);
    let counts = stack_counts(&rules, &lineup);
    assert_eq!(counts[&primary], 4);
    assert_eq!(counts[&secondary], 3);
    assert!(lineup.total_salary() <= 50000);
    assert_full_valid(&rules, &lineup);
}
