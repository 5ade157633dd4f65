//! Player pool fixtures.
//!
//! # Example
//!
//! ```
//! use rosterforge_core::PlayerId;
//! use rosterforge_test::pool::{mlb_catalog, mlb_players};
//!
//! let catalog = mlb_catalog();
//! let judge = catalog.get(&PlayerId::new("h01")).unwrap();
//! assert_eq!(judge.display_name(), "Aaron Judge");
//! assert_eq!(judge.team, "NYY");
//! assert!(mlb_players().iter().all(|p| (0.0..=1.0).contains(&p.ownership_or_zero())));
//! ```

use rosterforge_core::{Player, PlayerCatalog};

/// A 20-player MLB slate: three pitchers and seventeen hitters from NYY,
/// BOS, LAD and HOU. Salaries are sized for a $35,000 cap.
pub fn mlb_players() -> Vec<Player> {
    vec![
        Player::new("p01", "p01:Gerrit Cole", &["P"], "NYY", "BOS", 9000, 22.0).with_ownership(0.31),
        Player::new("p02", "p02:Chris Sale", &["P"], "BOS", "NYY", 8200, 19.5).with_ownership(0.24),
        Player::new("p03", "p03:Framber Valdez", &["P"], "HOU", "LAD", 7400, 17.0).with_ownership(0.12),
        // NYY
        hitter("h01", "Aaron Judge", &["OF"], "NYY", "BOS", 4600, 12.5, 2, 0.28),
        hitter("h02", "Juan Soto", &["OF"], "NYY", "BOS", 4400, 11.8, 3, 0.25),
        hitter("h03", "Giancarlo Stanton", &["OF"], "NYY", "BOS", 3400, 8.9, 4, 0.14),
        hitter("h04", "Anthony Volpe", &["SS"], "NYY", "BOS", 3100, 7.6, 1, 0.09),
        hitter("h05", "Austin Wells", &["C"], "NYY", "BOS", 2600, 6.2, 7, 0.04),
        // BOS
        hitter("h06", "Rafael Devers", &["3B"], "BOS", "NYY", 4000, 10.1, 3, 0.19),
        hitter("h07", "Masataka Yoshida", &["OF"], "BOS", "NYY", 3000, 7.8, 4, 0.08),
        hitter("h08", "Trevor Story", &["SS"], "BOS", "NYY", 2900, 7.0, 5, 0.06),
        hitter("h09", "Triston Casas", &["1B"], "BOS", "NYY", 2800, 7.4, 2, 0.07),
        hitter("h10", "Jarren Duran", &["OF"], "BOS", "NYY", 3300, 8.6, 1, 0.11),
        // LAD
        hitter("h11", "Shohei Ohtani", &["OF"], "LAD", "HOU", 4800, 13.0, 1, 0.35),
        hitter("h12", "Freddie Freeman", &["1B"], "LAD", "HOU", 4100, 10.4, 3, 0.17),
        hitter("h13", "Mookie Betts", &["SS", "2B"], "LAD", "HOU", 4300, 11.0, 2, 0.21),
        hitter("h14", "Will Smith", &["C"], "LAD", "HOU", 2900, 7.3, 4, 0.05),
        // HOU
        hitter("h15", "Jose Altuve", &["2B"], "HOU", "LAD", 3700, 9.5, 1, 0.13),
        hitter("h16", "Yordan Alvarez", &["OF"], "HOU", "LAD", 4200, 11.5, 3, 0.18),
        hitter("h17", "Alex Bregman", &["3B"], "HOU", "LAD", 3200, 8.0, 4, 0.1),
    ]
}

pub fn mlb_catalog() -> PlayerCatalog {
    PlayerCatalog::new(mlb_players()).expect("fixture ids are unique")
}

/// A small slate for stacking tests: three pitchers without hitters and
/// three hitters from each of six teams. BOS hitters project highest.
pub fn stack_players() -> Vec<Player> {
    let mut players = vec![
        Player::new("sp1", "Logan Gilbert", &["P"], "SEA", "OAK", 8000, 18.0),
        Player::new("sp2", "Cole Ragans", &["P"], "KC", "CWS", 7600, 16.5),
        Player::new("sp3", "Pablo Lopez", &["P"], "MIN", "DET", 7200, 15.0),
    ];
    let teams: [(&str, [f64; 3]); 6] = [
        ("BOS", [12.0, 11.5, 11.0]),
        ("NYY", [9.0, 8.5, 8.0]),
        ("TOR", [8.8, 8.2, 7.9]),
        ("TB", [8.6, 8.1, 7.7]),
        ("BAL", [8.4, 7.8, 7.5]),
        ("CLE", [8.2, 7.6, 7.2]),
    ];
    for (team, projections) in teams {
        for (i, projection) in projections.iter().enumerate() {
            let id = format!("{}{}", team.to_lowercase(), i + 1);
            let name = format!("{team} Hitter {}", i + 1);
            players.push(
                Player::new(id, name, &["OF"], team, "", 4000, *projection).with_roster_order(i as u8 + 1),
            );
        }
    }
    players
}

pub fn stack_catalog() -> PlayerCatalog {
    PlayerCatalog::new(stack_players()).expect("fixture ids are unique")
}

/// Teams of the full slate, paired as opponents in order (NYY v BOS, ...).
const SLATE_TEAMS: [&str; 12] = [
    "NYY", "BOS", "LAD", "SF", "HOU", "TEX", "ATL", "PHI", "CHC", "STL", "SEA", "TOR",
];

const SLATE_POSITIONS: [&[&str]; 9] = [
    &["C"],
    &["1B"],
    &["2B"],
    &["3B"],
    &["SS"],
    &["OF"],
    &["OF"],
    &["OF"],
    &["1B", "OF"],
];

/// A 120-player main slate: twelve teams of one pitcher and nine hitters.
/// Salaries rise with projection so a $50,000 cap binds for nine-slot
/// lineups built from the best stacks.
///
/// ```
/// use rosterforge_test::pool::slate_players;
///
/// let players = slate_players();
/// assert_eq!(players.len(), 120);
/// assert_eq!(players.iter().filter(|p| p.plays("P")).count(), 12);
/// ```
pub fn slate_players() -> Vec<Player> {
    let mut players = Vec::with_capacity(120);
    for (t, team) in SLATE_TEAMS.iter().enumerate() {
        let opponent = SLATE_TEAMS[t ^ 1];
        let ace = 14.0 + ((t * 3) % 7) as f64;
        players.push(Player::new(
            format!("{}_p", team.to_lowercase()),
            format!("{team} Starter"),
            &["P"],
            *team,
            opponent,
            salary_for(6000.0, ace, 220.0),
            ace,
        ));
        for (h, positions) in SLATE_POSITIONS.iter().enumerate() {
            let projection = 6.0 + ((t * 7 + h * 5) % 11) as f64 * 0.6;
            players.push(
                Player::new(
                    format!("{}_{}", team.to_lowercase(), h + 1),
                    format!("{team} Hitter {}", h + 1),
                    positions,
                    *team,
                    opponent,
                    salary_for(2000.0, projection, 400.0),
                    projection,
                )
                .with_roster_order(h as u8 + 1),
            );
        }
    }
    players
}

pub fn slate_catalog() -> PlayerCatalog {
    PlayerCatalog::new(slate_players()).expect("fixture ids are unique")
}

/// Salary rounded to the nearest $100.
fn salary_for(base: f64, projection: f64, per_point: f64) -> u32 {
    (((base + projection * per_point) / 100.0).round() * 100.0) as u32
}

#[allow(clippy::too_many_arguments)]
fn hitter(
    id: &str,
    name: &str,
    positions: &[&str],
    team: &str,
    opponent: &str,
    salary: u32,
    projection: f64,
    order: u8,
    ownership: f64,
) -> Player {
    Player::new(id, format!("{id}:{name}"), positions, team, opponent, salary, projection)
        .with_roster_order(order)
        .with_ownership(ownership)
        .with_range(projection * 0.5, projection * 1.6)
}
