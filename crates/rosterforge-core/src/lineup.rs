//! Lineups, stack identities and the interchange row.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::player::{Player, PlayerId};

/// Identity of a stack: a team, optionally narrowed to a sub-group
/// (forward line, batting-order block).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StackKey {
    pub team: String,
    #[serde(default)]
    pub group: Option<String>,
}

impl StackKey {
    pub fn team(team: impl Into<String>) -> Self {
        Self {
            team: team.into(),
            group: None,
        }
    }

    pub fn grouped(team: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            team: team.into(),
            group: Some(group.into()),
        }
    }

    /// Returns true if the player belongs to this stack.
    pub fn includes(&self, player: &Player) -> bool {
        player.team == self.team
            && match &self.group {
                Some(group) => player.stack_group.as_deref() == Some(group.as_str()),
                None => true,
            }
    }

    /// Parses the `TEAM` / `TEAM:GROUP` label form.
    pub fn parse(label: &str) -> Option<Self> {
        let label = label.trim();
        if label.is_empty() {
            return None;
        }
        Some(match label.split_once(':') {
            Some((team, group)) => Self::grouped(team, group),
            None => Self::team(label),
        })
    }
}

impl fmt::Display for StackKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.group {
            Some(group) => write!(f, "{}:{}", self.team, group),
            None => f.write_str(&self.team),
        }
    }
}

/// The two independently tracked stack roles of a lineup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StackRole {
    Primary,
    Secondary,
}

impl fmt::Display for StackRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StackRole::Primary => f.write_str("primary"),
            StackRole::Secondary => f.write_str("secondary"),
        }
    }
}

/// One filled slot instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineupEntry {
    pub slot: String,
    pub player: Player,
}

/// A complete lineup: exactly one player per slot instance.
///
/// Entries are kept in slot-instance order so the lineup can be written to
/// the interchange format without re-sorting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lineup {
    pub entries: Vec<LineupEntry>,
    pub primary_stack: Option<StackKey>,
    pub secondary_stack: Option<StackKey>,
}

impl Lineup {
    pub fn new(entries: Vec<LineupEntry>) -> Self {
        Self {
            entries,
            primary_stack: None,
            secondary_stack: None,
        }
    }

    pub fn with_stacks(mut self, primary: Option<StackKey>, secondary: Option<StackKey>) -> Self {
        self.primary_stack = primary;
        self.secondary_stack = secondary;
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.entries.iter().map(|e| &e.player)
    }

    pub fn total_salary(&self) -> u32 {
        self.players().map(|p| p.salary).sum()
    }

    pub fn total_projection(&self) -> f64 {
        self.players().map(|p| p.projection).sum()
    }

    pub fn player_ids(&self) -> HashSet<&PlayerId> {
        self.players().map(|p| &p.id).collect()
    }

    pub fn contains(&self, id: &PlayerId) -> bool {
        self.players().any(|p| &p.id == id)
    }

    /// Number of players this lineup shares with another.
    pub fn shared_players(&self, other: &Lineup) -> usize {
        let ours = self.player_ids();
        other.players().filter(|p| ours.contains(&p.id)).count()
    }

    /// Player counts per team, optionally skipping some positions
    /// (typically the marker role).
    pub fn team_counts<S: AsRef<str>>(&self, skip_positions: &[S]) -> BTreeMap<&str, u32> {
        let mut counts = BTreeMap::new();
        for player in self.players() {
            if player.plays_any(skip_positions) {
                continue;
            }
            *counts.entry(player.team.as_str()).or_insert(0) += 1;
        }
        counts
    }

    pub fn stack(&self, role: StackRole) -> Option<&StackKey> {
        match role {
            StackRole::Primary => self.primary_stack.as_ref(),
            StackRole::Secondary => self.secondary_stack.as_ref(),
        }
    }

    /// Interchange projection of this lineup.
    pub fn to_row(&self) -> LineupRow {
        LineupRow {
            slots: self
                .entries
                .iter()
                .map(|e| (e.slot.clone(), e.player.id.clone()))
                .collect(),
            total_salary: self.total_salary(),
            total_projection: self.total_projection(),
            primary_stack: self.primary_stack.as_ref().map(ToString::to_string),
            secondary_stack: self.secondary_stack.as_ref().map(ToString::to_string),
        }
    }
}

/// Plain-data row of the lineup interchange format: one column per slot
/// instance plus summary scalars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineupRow {
    pub slots: Vec<(String, PlayerId)>,
    pub total_salary: u32,
    pub total_projection: f64,
    pub primary_stack: Option<String>,
    pub secondary_stack: Option<String>,
}
