//! Tests for optimizer configuration.

use super::*;

const MLB_TOML: &str = r#"
    [sport]
    name = "mlb_classic"
    salary_cap = 35000
    marker_positions = ["P"]
    opponent_exclusion = true

    [[sport.slots]]
    name = "P"
    count = 1
    eligible = ["P"]

    [[sport.slots]]
    name = "C/1B"
    count = 1
    eligible = ["C", "1B"]

    [[sport.slots]]
    name = "2B"
    count = 1
    eligible = ["2B"]

    [[sport.slots]]
    name = "3B"
    count = 1
    eligible = ["3B"]

    [[sport.slots]]
    name = "SS"
    count = 1
    eligible = ["SS"]

    [[sport.slots]]
    name = "OF"
    count = 3
    eligible = ["OF"]

    [[sport.slots]]
    name = "UTIL"
    count = 1
    eligible = ["C", "1B", "2B", "3B", "SS", "OF"]

    [sport.stacks]
    max_unstacked = 1

    [sport.stacks.primary]
    sizes = [4]
    max_exposure = 0.2083

    [sport.stacks.secondary]
    sizes = [3, 4]
    max_exposure = 0.126

    [sport.stacks.allowed_pairings]
    CLE = ["CHC", "NYY"]

    [[sport.marker_stack_rules]]
    type = "avoid"
    markers = ["Brandon Pfaadt"]
    teams = ["LAD", "STL"]

    [[sport.groups]]
    name = "bottom_of_order"
    players = { roster_orders = [8, 9] }
    max = 1

    [generation]
    lineup_count = 300
    recent_stack_window = 5

    [solver]
    time_limit_ms = 10000
    workers = { count = 4 }
    random_seed = 7

    [late_swap]
    locked_teams = ["LAD"]
    unrepairable = "drop"
"#;

#[test]
fn test_toml_parsing() {
    let config = OptimizerConfig::from_toml_str(MLB_TOML).unwrap();

    assert_eq!(config.sport.lineup_size(), 9);
    assert_eq!(config.sport.marker_slot_count(), 1);
    assert!(!config.sport.has_flexible_marker_slot());
    assert_eq!(config.sport.stacks.primary.as_ref().unwrap().sizes, vec![4]);
    assert!(config.sport.stacks.primary.as_ref().unwrap().required);
    assert_eq!(config.sport.stacks.allowed_pairings["CLE"], vec!["CHC", "NYY"]);
    assert_eq!(config.generation.lineup_count, 300);
    assert_eq!(config.generation.max_attempts, 1000);
    assert_eq!(config.solver.workers, WorkerCount::Count(4));
    assert_eq!(config.solver.unimproved_time_limit(), Some(Duration::from_millis(3000)));
    assert_eq!(config.late_swap.unrepairable, UnrepairablePolicy::Drop);
    assert!(config.late_swap.is_locked("LAD"));
    assert_eq!(config.late_swap.strategies.len(), 3);
    config.validate().unwrap();
}

#[test]
fn test_marker_rule_defaults() {
    let config = OptimizerConfig::from_toml_str(MLB_TOML).unwrap();

    match &config.sport.marker_stack_rules[0] {
        MarkerStackRule::Avoid {
            top_owned,
            threshold,
            teams,
            ..
        } => {
            assert_eq!(*top_owned, 5);
            assert_eq!(*threshold, 3);
            assert_eq!(teams.len(), 2);
        }
        other => panic!("unexpected rule {other:?}"),
    }
}

#[test]
fn test_yaml_parsing() {
    let yaml = r#"
        sport:
          name: nhl
          salary_cap: 55000
          marker_positions: [G]
          slots:
            - { name: C, count: 2, eligible: [C] }
            - { name: W, count: 4, eligible: [W] }
            - { name: D, count: 2, eligible: [D] }
            - { name: G, count: 1, eligible: [G] }
          stacks:
            group_by: team_and_group
            primary:
              sizes: [3]
          groups:
            - name: goalie_guard
              players: { positions: [C] }
              max: 1
              condition:
                players: [Connor Hellebuyck]
                logic: any
        generation:
          lineup_count: 40
    "#;

    let config = OptimizerConfig::from_yaml_str(yaml).unwrap();
    assert_eq!(config.sport.stacks.group_by, StackGrouping::TeamAndGroup);
    assert_eq!(config.sport.stacks.primary.as_ref().unwrap().max_exposure, 1.0);
    assert_eq!(
        config.sport.groups[0].condition.as_ref().unwrap().logic,
        GroupLogic::Any
    );
    assert_eq!(config.generation.lineup_count, 40);
    config.validate().unwrap();
}

#[test]
fn test_builder() {
    let sport = SportRules::new("classic", 50_000, vec![RosterSlot::new("QB", 1, &["QB"])])
        .with_markers(&["QB"])
        .with_team_limit(2, 4);
    let config = OptimizerConfig::new(sport)
        .with_lineup_count(5)
        .with_similarity_threshold(0)
        .with_time_limit_ms(500)
        .with_random_seed(9)
        .with_locked_teams(&["KC"]);

    assert_eq!(config.generation.lineup_count, 5);
    assert_eq!(config.similarity_threshold(), 0);
    assert_eq!(config.solver.time_limit(), Duration::from_millis(500));
    assert_eq!(config.solver.retry_time_limit(), Duration::from_millis(1000));
    assert_eq!(config.late_swap.locked_teams, vec!["KC"]);
}

#[test]
fn test_zero_unimproved_limit_rejected() {
    let mut config = OptimizerConfig::from_toml_str(MLB_TOML).unwrap();
    config.solver.unimproved_time_limit_ms = Some(0);
    assert!(config.validate().is_err());

    config.solver.unimproved_time_limit_ms = None;
    assert!(config.validate().is_ok());
}

#[test]
fn test_default_similarity_threshold() {
    let config = OptimizerConfig::from_toml_str(MLB_TOML).unwrap();
    assert_eq!(config.similarity_threshold(), 6);
}

#[test]
fn test_load_missing_file() {
    let result = OptimizerConfig::load("/nonexistent/rosterforge.toml");
    assert!(matches!(result, Err(ConfigError::Io(_))));
}

fn base_rules() -> SportRules {
    SportRules::new(
        "test",
        10_000,
        vec![
            RosterSlot::new("P", 1, &["P"]),
            RosterSlot::new("UTIL", 4, &["H"]),
        ],
    )
    .with_markers(&["P"])
}

#[test]
fn test_validate_rejects_oversized_stack() {
    let rules = base_rules().with_stacks(StackRules::default().with_primary(&[5], 1.0));
    assert!(matches!(rules.validate(), Err(ConfigError::Invalid(_))));
}

#[test]
fn test_validate_rejects_max_unstacked_at_stack_size() {
    let rules = base_rules().with_stacks(
        StackRules::default()
            .with_primary(&[2], 1.0)
            .with_max_unstacked(2),
    );
    assert!(rules.validate().is_err());

    let rules = base_rules().with_stacks(
        StackRules::default()
            .with_primary(&[2], 1.0)
            .with_max_unstacked(1),
    );
    assert!(rules.validate().is_ok());
}

#[test]
fn test_unstacked_limit_defaults_below_smallest_size() {
    assert_eq!(StackRules::default().unstacked_limit(), None);

    let stacks = StackRules::default().with_primary(&[4, 5], 1.0).with_secondary(&[3], 1.0);
    assert_eq!(stacks.unstacked_limit(), Some(2));
    assert_eq!(stacks.with_max_unstacked(1).unstacked_limit(), Some(1));
}

#[test]
fn test_validate_rejects_exposure_out_of_range() {
    let rules = base_rules().with_stacks(StackRules::default().with_primary(&[2], 1.5));
    assert!(rules.validate().is_err());
}

#[test]
fn test_validate_rejects_inverted_team_limit() {
    let rules = base_rules().with_team_limit(4, 2);
    assert!(rules.validate().is_err());
}

#[test]
fn test_validate_rejects_empty_slots() {
    let rules = SportRules::new("empty", 10_000, Vec::new());
    assert!(rules.validate().is_err());

    let rules = SportRules::new("zero", 10_000, vec![RosterSlot::new("P", 0, &["P"])]);
    assert!(rules.validate().is_err());
}

#[test]
fn test_validate_rejects_inverted_group() {
    let rules = base_rules().with_group(
        GroupRule::new("bad", GroupSelector::names(&["A", "B"]))
            .with_min(2)
            .with_max(1),
    );
    assert!(rules.validate().is_err());
}

#[test]
fn test_validate_rejects_duplicate_allowing_threshold() {
    let config = OptimizerConfig::new(base_rules()).with_similarity_threshold(5);
    assert!(config.validate().is_err());
}

#[test]
fn test_config_error_maps_to_fatal_roster_error() {
    let err: RosterError = ConfigError::Invalid("boom".into()).into();
    assert!(err.is_fatal());
}

#[test]
fn test_group_logic_bounds() {
    assert_eq!(GroupLogic::Any.count_bounds(3), Some((1, 3)));
    assert_eq!(GroupLogic::All.count_bounds(3), Some((3, 3)));
    assert_eq!(GroupLogic::Xor.count_bounds(3), Some((1, 1)));
    assert_eq!(GroupLogic::Nand.count_bounds(3), Some((0, 2)));
    assert_eq!(GroupLogic::Nor.count_bounds(3), Some((0, 0)));
    assert_eq!(GroupLogic::AtLeast(2).count_bounds(3), Some((2, 3)));
    assert_eq!(GroupLogic::AtLeast(4).count_bounds(3), None);
    assert!(GroupLogic::Nor.evaluate(0, 2));
    assert!(!GroupLogic::All.evaluate(1, 2));
}

#[test]
fn test_group_selector_matches_every_criterion() {
    let player = Player::new("9", "9:Josh Naylor", &["1B"], "CLE", "DET", 3_400, 9.1)
        .with_roster_order(8);

    assert!(GroupSelector::roster_orders(&[8, 9]).matches(&player));
    assert!(GroupSelector::names(&["Josh Naylor"]).matches(&player));
    assert!(GroupSelector::names(&["9"]).matches(&player));

    let selector = GroupSelector {
        teams: vec!["CLE".into()],
        positions: vec!["OF".into()],
        ..GroupSelector::default()
    };
    assert!(!selector.matches(&player));
}

#[test]
fn test_repair_stage_display() {
    assert_eq!(RepairStage::StackPreserving.to_string(), "stack_preserving");
}
