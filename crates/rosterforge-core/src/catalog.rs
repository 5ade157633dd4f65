//! Immutable player pool with an id index.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::error::{Result, RosterError};
use crate::player::{Player, PlayerId, PlayerRecord};

/// Why a raw record was left out of the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ExclusionReason {
    MissingField,
    InvalidSalary,
    InvalidProjection,
    DuplicateId,
}

/// Accounting for records excluded while importing a player pool.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataQualityReport {
    pub accepted: usize,
    pub excluded: BTreeMap<ExclusionReason, usize>,
}

impl DataQualityReport {
    pub fn excluded_count(&self) -> usize {
        self.excluded.values().sum()
    }

    fn exclude(&mut self, reason: ExclusionReason) {
        *self.excluded.entry(reason).or_insert(0) += 1;
    }
}

/// The player pool for one run.
///
/// # Example
///
/// ```
/// use rosterforge_core::{Player, PlayerCatalog};
///
/// let catalog = PlayerCatalog::new(vec![
///     Player::new("1", "Gerrit Cole", &["P"], "NYY", "BOS", 10_500, 42.0),
///     Player::new("2", "Rafael Devers", &["3B"], "BOS", "NYY", 3_600, 11.5),
/// ]).unwrap();
///
/// assert_eq!(catalog.len(), 2);
/// assert_eq!(catalog.get(&"2".into()).map(|p| p.team.as_str()), Some("BOS"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct PlayerCatalog {
    players: Vec<Player>,
    index: HashMap<PlayerId, usize>,
}

impl PlayerCatalog {
    /// Builds a catalog, rejecting duplicate ids.
    pub fn new(players: Vec<Player>) -> Result<Self> {
        let mut index = HashMap::with_capacity(players.len());
        for (i, player) in players.iter().enumerate() {
            if index.insert(player.id.clone(), i).is_some() {
                return Err(RosterError::DataQuality(format!(
                    "duplicate player id {}",
                    player.id
                )));
            }
        }
        Ok(Self { players, index })
    }

    /// Builds a catalog from raw loader rows, dropping unusable rows.
    ///
    /// Required: id, name, positions, team, a non-negative integer salary
    /// and a numeric projection. Optional fields that fail to parse fall
    /// back to their neutral value.
    pub fn from_records(records: impl IntoIterator<Item = PlayerRecord>) -> (Self, DataQualityReport) {
        let mut report = DataQualityReport::default();
        let mut players = Vec::new();
        let mut index = HashMap::new();

        for record in records {
            match parse_record(record) {
                Ok(player) => {
                    if index.contains_key(&player.id) {
                        report.exclude(ExclusionReason::DuplicateId);
                        continue;
                    }
                    index.insert(player.id.clone(), players.len());
                    players.push(player);
                }
                Err(reason) => report.exclude(reason),
            }
        }

        report.accepted = players.len();
        (Self { players, index }, report)
    }

    /// Removes players whose projection does not exceed `min_projection`.
    ///
    /// Returns the filtered catalog and the number of players removed.
    pub fn filter_usable(&self, min_projection: f64) -> (Self, usize) {
        let kept: Vec<Player> = self
            .players
            .iter()
            .filter(|p| p.projection > min_projection)
            .cloned()
            .collect();
        let removed = self.players.len() - kept.len();
        let index = kept
            .iter()
            .enumerate()
            .map(|(i, p)| (p.id.clone(), i))
            .collect();
        (
            Self {
                players: kept,
                index,
            },
            removed,
        )
    }

    pub fn get(&self, id: &PlayerId) -> Option<&Player> {
        self.index.get(id).map(|&i| &self.players[i])
    }

    pub fn contains(&self, id: &PlayerId) -> bool {
        self.index.contains_key(id)
    }

    /// Looks a player up by display name (id prefix ignored).
    pub fn by_name(&self, name: &str) -> Option<&Player> {
        let name = name.trim();
        self.players.iter().find(|p| p.display_name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.players.iter()
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Distinct teams, sorted.
    pub fn teams(&self) -> Vec<String> {
        let teams: BTreeSet<&str> = self.players.iter().map(|p| p.team.as_str()).collect();
        teams.into_iter().map(str::to_string).collect()
    }
}

fn required(field: Option<String>) -> std::result::Result<String, ExclusionReason> {
    match field {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(ExclusionReason::MissingField),
    }
}

fn optional_f64(field: &Option<String>) -> Option<f64> {
    field
        .as_deref()
        .and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

fn parse_record(record: PlayerRecord) -> std::result::Result<Player, ExclusionReason> {
    let id = required(record.id)?;
    let name = required(record.name)?;
    let positions = required(record.positions)?;
    let team = required(record.team)?;

    let salary = required(record.salary)?
        .parse::<u32>()
        .map_err(|_| ExclusionReason::InvalidSalary)?;
    let projection = required(record.projection)?
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or(ExclusionReason::InvalidProjection)?;

    Ok(Player {
        id: PlayerId::new(id),
        name,
        positions: positions
            .split('/')
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect(),
        team,
        opponent: record.opponent.map(|o| o.trim().to_string()).unwrap_or_default(),
        salary,
        projection,
        floor: optional_f64(&record.floor),
        ceiling: optional_f64(&record.ceiling),
        ownership: optional_f64(&record.ownership),
        stack_group: record.stack_group.filter(|g| !g.trim().is_empty()),
        roster_order: record
            .roster_order
            .as_deref()
            .and_then(|s| s.trim().parse::<u8>().ok()),
        active: record.active.unwrap_or(true),
        stack_only: record.stack_only.unwrap_or(false),
    })
}
