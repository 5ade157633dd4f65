use super::*;
use rosterforge_core::ExclusionReason;
use rosterforge_test::{mlb_catalog, mlb_rules, mlb_stacked_rules, nyy_stack_lineup};

fn written(rules: &SportRules, lineups: &[Lineup]) -> String {
    let mut buf = Vec::new();
    write_lineups(&mut buf, rules, lineups).unwrap();
    String::from_utf8(buf).unwrap()
}

#[test]
fn test_header_and_row_layout() {
    let rules = mlb_stacked_rules();
    let catalog = mlb_catalog();
    let text = written(&rules, &[nyy_stack_lineup(&rules, &catalog)]);

    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(
        lines[0],
        "P,C/1B,2B,3B,SS,OF,OF,OF,UTIL,total_salary,total_projection,primary_stack,secondary_stack"
    );
    assert_eq!(lines[1], "p03,h05,h15,h17,h04,h01,h02,h07,h09,34800,87.80,NYY,");
    assert_eq!(lines.len(), 2);
}

#[test]
fn test_read_back_resolves_current_catalog() {
    let rules = mlb_stacked_rules();
    let catalog = mlb_catalog();
    let text = written(&rules, &[nyy_stack_lineup(&rules, &catalog)]);

    let players = rosterforge_test::mlb_players()
        .into_iter()
        .map(|p| if p.id.as_str() == "h01" { p.inactive() } else { p })
        .collect();
    let refreshed = PlayerCatalog::new(players).unwrap();

    let lineups = read_lineups(text.as_bytes(), &rules, &refreshed).unwrap();
    assert_eq!(lineups.len(), 1);
    assert!(!lineups[0].entries[5].player.active);
    assert_eq!(lineups[0].primary_stack, Some(StackKey::team("NYY")));
    assert_eq!(lineups[0].secondary_stack, None);
}

#[test]
fn test_unknown_player_is_data_quality() {
    let rules = mlb_rules();
    let text = "P,C/1B,2B,3B,SS,OF,OF,OF,UTIL,total_salary,total_projection,primary_stack,secondary_stack\n\
                p03,h05,h15,h17,h04,zz9,h02,h07,h09,0,0,,\n";

    let err = read_lineups(text.as_bytes(), &rules, &mlb_catalog()).unwrap_err();
    assert!(matches!(err, RosterError::DataQuality(_)));
}

#[test]
fn test_header_mismatch_is_interchange() {
    let rules = mlb_rules();
    let text = "QB,RB,total_salary,total_projection,primary_stack,secondary_stack\n";

    let err = read_lineups(text.as_bytes(), &rules, &mlb_catalog()).unwrap_err();
    assert!(matches!(err, RosterError::Interchange(_)));
}

#[test]
fn test_wrong_lineup_size_is_rejected() {
    let rules = mlb_rules();
    let short = Lineup::new(vec![]);

    let mut buf = Vec::new();
    let err = write_lineups(&mut buf, &rules, &[short]).unwrap_err();
    assert!(matches!(err, RosterError::Interchange(_)));
}

#[test]
fn test_read_players_counts_bad_rows() {
    let text = "id,name,positions,team,opponent,salary,projection,floor,ceiling,ownership,stack_group,roster_order,active,stack_only\n\
                p1,Gerrit Cole,P,NYY,BOS,9000,22.5,,,,,,true,false\n\
                h1,Aaron Judge,OF,NYY,BOS,4600,12.5,6,20,0.3,,2,,\n\
                h2,Broken Salary,OF,NYY,BOS,cheap,9.0,,,,,,,\n\
                h3,,SS,BOS,NYY,3000,7.0,,,,,,,\n";

    let (catalog, report) = read_players(text.as_bytes()).unwrap();
    assert_eq!(catalog.len(), 2);
    assert_eq!(report.accepted, 2);
    assert_eq!(report.excluded.get(&ExclusionReason::InvalidSalary), Some(&1));
    assert_eq!(report.excluded.get(&ExclusionReason::MissingField), Some(&1));

    let judge = catalog.get(&PlayerId::new("h1")).unwrap();
    assert_eq!(judge.ceiling, Some(20.0));
    assert_eq!(judge.roster_order, Some(2));
    assert!(judge.active);
}
