//! Player identity and attributes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique player identifier as issued by the contest site.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for PlayerId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

fn default_active() -> bool {
    true
}

/// A player in the pool for one slate.
///
/// Constructed once per run from external data and never mutated while a
/// run is in progress. A negative projection is legal; such players are
/// filtered out by the usability threshold before any model is built.
///
/// # Example
///
/// ```
/// use rosterforge_core::Player;
///
/// let p = Player::new("101", "101:Aaron Judge", &["OF"], "NYY", "BOS", 4200, 14.2)
///     .with_stack_group("1")
///     .with_roster_order(2);
///
/// assert_eq!(p.display_name(), "Aaron Judge");
/// assert!(p.plays("OF"));
/// assert!(p.active);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub positions: Vec<String>,
    pub team: String,
    pub opponent: String,
    pub salary: u32,
    pub projection: f64,
    #[serde(default)]
    pub floor: Option<f64>,
    #[serde(default)]
    pub ceiling: Option<f64>,
    /// Projected ownership as a fraction in `[0, 1]`.
    #[serde(default)]
    pub ownership: Option<f64>,
    #[serde(default)]
    pub stack_group: Option<String>,
    #[serde(default)]
    pub roster_order: Option<u8>,
    /// Eligibility marker. Scratched players are `false`.
    #[serde(default = "default_active")]
    pub active: bool,
    /// Usable only as part of a primary or secondary stack.
    #[serde(default)]
    pub stack_only: bool,
}

impl Player {
    pub fn new(
        id: impl Into<PlayerId>,
        name: impl Into<String>,
        positions: &[&str],
        team: impl Into<String>,
        opponent: impl Into<String>,
        salary: u32,
        projection: f64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            positions: positions.iter().map(|p| p.to_string()).collect(),
            team: team.into(),
            opponent: opponent.into(),
            salary,
            projection,
            floor: None,
            ceiling: None,
            ownership: None,
            stack_group: None,
            roster_order: None,
            active: true,
            stack_only: false,
        }
    }

    pub fn with_range(mut self, floor: f64, ceiling: f64) -> Self {
        self.floor = Some(floor);
        self.ceiling = Some(ceiling);
        self
    }

    pub fn with_ownership(mut self, ownership: f64) -> Self {
        self.ownership = Some(ownership);
        self
    }

    pub fn with_stack_group(mut self, group: impl Into<String>) -> Self {
        self.stack_group = Some(group.into());
        self
    }

    pub fn with_roster_order(mut self, order: u8) -> Self {
        self.roster_order = Some(order);
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    pub fn stack_only(mut self) -> Self {
        self.stack_only = true;
        self
    }

    /// Name without the `"<id>:"` prefix some projection exports prepend.
    pub fn display_name(&self) -> &str {
        match self.name.rsplit_once(':') {
            Some((_, name)) => name.trim(),
            None => self.name.trim(),
        }
    }

    /// Returns true if the player is listed at the given position.
    pub fn plays(&self, position: &str) -> bool {
        self.positions.iter().any(|p| p == position)
    }

    /// Returns true if the player is listed at any of the given positions.
    pub fn plays_any<S: AsRef<str>>(&self, positions: &[S]) -> bool {
        positions.iter().any(|p| self.plays(p.as_ref()))
    }

    pub fn ownership_or_zero(&self) -> f64 {
        self.ownership.unwrap_or(0.0)
    }
}

/// Raw player row as handed over by an external loader.
///
/// Every field is optional and numeric fields are still text; the catalog
/// decides which rows are usable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub id: Option<String>,
    pub name: Option<String>,
    /// Slash-separated list, e.g. `"C/1B"`.
    pub positions: Option<String>,
    pub team: Option<String>,
    pub opponent: Option<String>,
    pub salary: Option<String>,
    pub projection: Option<String>,
    pub floor: Option<String>,
    pub ceiling: Option<String>,
    pub ownership: Option<String>,
    pub stack_group: Option<String>,
    pub roster_order: Option<String>,
    pub active: Option<bool>,
    pub stack_only: Option<bool>,
}
