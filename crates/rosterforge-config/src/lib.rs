//! Configuration system for RosterForge.
//!
//! Sport rules (slots, salary cap, stacking, custom groups) and run
//! settings are plain data loaded from TOML or YAML, so one generic model
//! builder serves every sport.
//!
//! # Examples
//!
//! Load configuration from TOML string:
//!
//! ```
//! use rosterforge_config::OptimizerConfig;
//! use std::time::Duration;
//!
//! let config = OptimizerConfig::from_toml_str(r#"
//!     [sport]
//!     name = "mlb_classic"
//!     salary_cap = 35000
//!     marker_positions = ["P"]
//!
//!     [[sport.slots]]
//!     name = "P"
//!     count = 1
//!     eligible = ["P"]
//!
//!     [[sport.slots]]
//!     name = "OF"
//!     count = 3
//!     eligible = ["OF"]
//!
//!     [generation]
//!     lineup_count = 150
//!
//!     [solver]
//!     time_limit_ms = 5000
//! "#).unwrap();
//!
//! assert_eq!(config.sport.lineup_size(), 4);
//! assert_eq!(config.generation.lineup_count, 150);
//! assert_eq!(config.solver.time_limit(), Duration::from_secs(5));
//! ```
//!
//! Use default config when file is missing:
//!
//! ```
//! use rosterforge_config::OptimizerConfig;
//!
//! let config = OptimizerConfig::load("rosterforge.toml").unwrap_or_default();
//! // Proceeds with defaults if file doesn't exist
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::time::Duration;

use rosterforge_core::{Player, RosterError, RosterSlot, StackRole};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl From<ConfigError> for RosterError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Io(e) => RosterError::Io(e),
            ConfigError::Invalid(msg) => RosterError::Configuration(msg),
            other => RosterError::Configuration(other.to_string()),
        }
    }
}

fn invalid(msg: impl Into<String>) -> ConfigError {
    ConfigError::Invalid(msg.into())
}

/// Main optimizer configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct OptimizerConfig {
    /// Sport rule table.
    #[serde(default)]
    pub sport: SportRules,

    /// Generation loop settings.
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Solver budget and parallelism.
    #[serde(default)]
    pub solver: SolverSettings,

    /// Late-swap settings.
    #[serde(default)]
    pub late_swap: LateSwapConfig,
}

impl OptimizerConfig {
    /// Creates a configuration for the given sport with default run settings.
    pub fn new(sport: SportRules) -> Self {
        Self {
            sport,
            ..Self::default()
        }
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if file doesn't exist or contains invalid TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_toml_file(path)
    }

    /// Loads configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Loads configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Parses configuration from a YAML string.
    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(s)?)
    }

    /// Sets the number of lineups to generate.
    pub fn with_lineup_count(mut self, count: usize) -> Self {
        self.generation.lineup_count = count;
        self
    }

    /// Sets the maximum number of players two lineups may share.
    pub fn with_similarity_threshold(mut self, threshold: u32) -> Self {
        self.generation.similarity_threshold = Some(threshold);
        self
    }

    /// Sets the per-solve time limit.
    pub fn with_time_limit_ms(mut self, millis: u64) -> Self {
        self.solver.time_limit_ms = millis;
        self
    }

    /// Sets the solver worker count.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.solver.workers = WorkerCount::Count(workers);
        self
    }

    /// Sets the random seed used by solver workers and projection noise.
    pub fn with_random_seed(mut self, seed: u64) -> Self {
        self.solver.random_seed = Some(seed);
        self
    }

    /// Sets the teams whose games have started.
    pub fn with_locked_teams<S: AsRef<str>>(mut self, teams: &[S]) -> Self {
        self.late_swap = self.late_swap.with_locked_teams(teams);
        self
    }

    /// Checks every section for contradictions.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.sport.validate()?;
        self.generation.validate(self.sport.lineup_size())?;
        self.solver.validate()?;
        Ok(())
    }

    /// Similarity threshold resolved against the sport's lineup size.
    pub fn similarity_threshold(&self) -> u32 {
        self.generation
            .similarity_threshold
            .unwrap_or_else(|| self.sport.lineup_size().saturating_sub(3))
    }
}

/// Sport rule table consumed once per run.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct SportRules {
    #[serde(default)]
    pub name: String,

    pub salary_cap: u32,

    #[serde(default)]
    pub salary_floor: Option<u32>,

    #[serde(default)]
    pub slots: Vec<RosterSlot>,

    /// Positions whose presence changes team limits (pitcher, quarterback).
    #[serde(default)]
    pub marker_positions: Vec<String>,

    /// Players must project strictly above this to enter a model.
    #[serde(default)]
    pub min_projection: f64,

    /// Forbid a marker player together with non-marker players of the
    /// marker's opponent.
    #[serde(default)]
    pub opponent_exclusion: bool,

    #[serde(default)]
    pub team_limit: Option<TeamLimit>,

    #[serde(default)]
    pub stacks: StackRules,

    #[serde(default)]
    pub marker_stack_rules: Vec<MarkerStackRule>,

    #[serde(default)]
    pub groups: Vec<GroupRule>,
}

impl SportRules {
    pub fn new(name: impl Into<String>, salary_cap: u32, slots: Vec<RosterSlot>) -> Self {
        Self {
            name: name.into(),
            salary_cap,
            slots,
            ..Self::default()
        }
    }

    pub fn with_markers(mut self, positions: &[&str]) -> Self {
        self.marker_positions = positions.iter().map(|p| p.to_string()).collect();
        self
    }

    pub fn with_salary_floor(mut self, floor: u32) -> Self {
        self.salary_floor = Some(floor);
        self
    }

    pub fn with_team_limit(mut self, without_marker: u32, with_marker: u32) -> Self {
        self.team_limit = Some(TeamLimit {
            without_marker,
            with_marker,
        });
        self
    }

    pub fn with_opponent_exclusion(mut self) -> Self {
        self.opponent_exclusion = true;
        self
    }

    pub fn with_stacks(mut self, stacks: StackRules) -> Self {
        self.stacks = stacks;
        self
    }

    pub fn with_group(mut self, group: GroupRule) -> Self {
        self.groups.push(group);
        self
    }

    pub fn with_marker_rule(mut self, rule: MarkerStackRule) -> Self {
        self.marker_stack_rules.push(rule);
        self
    }

    /// Total number of slot instances.
    pub fn lineup_size(&self) -> u32 {
        self.slots.iter().map(|s| s.count).sum()
    }

    pub fn is_marker(&self, player: &Player) -> bool {
        player.plays_any(&self.marker_positions)
    }

    /// Seats that only marker players can fill.
    pub fn marker_slot_count(&self) -> u32 {
        if self.marker_positions.is_empty() {
            return 0;
        }
        self.slots
            .iter()
            .filter(|s| {
                !s.eligible.is_empty() && s.eligible.iter().all(|p| self.marker_positions.contains(p))
            })
            .map(|s| s.count)
            .sum()
    }

    /// True when some slot takes both marker and non-marker positions.
    pub fn has_flexible_marker_slot(&self) -> bool {
        self.slots.iter().any(|s| {
            s.eligible.iter().any(|p| self.marker_positions.contains(p))
                && s.eligible.iter().any(|p| !self.marker_positions.contains(p))
        })
    }

    /// Checks the rule table for contradictions.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.slots.is_empty() {
            return Err(invalid("no roster slots configured"));
        }
        for slot in &self.slots {
            if slot.count == 0 {
                return Err(invalid(format!("slot {} has a zero count", slot.name)));
            }
            if slot.eligible.is_empty() {
                return Err(invalid(format!("slot {} accepts no positions", slot.name)));
            }
        }
        if let Some(floor) = self.salary_floor {
            if floor > self.salary_cap {
                return Err(invalid(format!(
                    "salary floor {} exceeds cap {}",
                    floor, self.salary_cap
                )));
            }
        }
        if let Some(limit) = &self.team_limit {
            if limit.with_marker < limit.without_marker {
                return Err(invalid(format!(
                    "team limit with marker ({}) is below the limit without ({})",
                    limit.with_marker, limit.without_marker
                )));
            }
        }
        self.stacks.validate(self.lineup_size())?;
        for group in &self.groups {
            group.validate()?;
        }
        for rule in &self.marker_stack_rules {
            rule.validate()?;
        }
        Ok(())
    }
}

/// Conditional per-team player cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct TeamLimit {
    /// Cap when no marker player of the team is used.
    pub without_marker: u32,

    /// Cap when a marker player of the team is used.
    pub with_marker: u32,
}

/// How stack identities are formed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StackGrouping {
    /// One stack identity per team.
    #[default]
    Team,

    /// One stack identity per team and stack-group tag.
    TeamAndGroup,
}

/// Stacking configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct StackRules {
    #[serde(default)]
    pub group_by: StackGrouping,

    #[serde(default)]
    pub primary: Option<StackRoleRules>,

    #[serde(default)]
    pub secondary: Option<StackRoleRules>,

    /// Most non-marker players allowed from a team that is not stacked.
    #[serde(default)]
    pub max_unstacked: Option<u32>,

    /// Primary team to the secondary teams it may be paired with.
    #[serde(default)]
    pub allowed_pairings: BTreeMap<String, Vec<String>>,

    #[serde(default)]
    pub excluded_primary_teams: Vec<String>,
}

impl StackRules {
    pub fn with_primary(mut self, sizes: &[u32], max_exposure: f64) -> Self {
        self.primary = Some(StackRoleRules::new(sizes, max_exposure));
        self
    }

    pub fn with_secondary(mut self, sizes: &[u32], max_exposure: f64) -> Self {
        self.secondary = Some(StackRoleRules::new(sizes, max_exposure));
        self
    }

    pub fn with_max_unstacked(mut self, max: u32) -> Self {
        self.max_unstacked = Some(max);
        self
    }

    pub fn with_group_by(mut self, grouping: StackGrouping) -> Self {
        self.group_by = grouping;
        self
    }

    pub fn role(&self, role: StackRole) -> Option<&StackRoleRules> {
        match role {
            StackRole::Primary => self.primary.as_ref(),
            StackRole::Secondary => self.secondary.as_ref(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.primary.is_some() || self.secondary.is_some()
    }

    /// Most non-marker players a stack identity may place in a lineup
    /// without asserting a stack. Defaults to one below the smallest stack
    /// size so every stack-sized group carries a label.
    pub fn unstacked_limit(&self) -> Option<u32> {
        let smallest = [&self.primary, &self.secondary]
            .into_iter()
            .flatten()
            .map(StackRoleRules::min_size)
            .min()?;
        Some(self.max_unstacked.unwrap_or(smallest.saturating_sub(1)))
    }

    fn validate(&self, lineup_size: u32) -> Result<(), ConfigError> {
        let roles = [("primary", &self.primary), ("secondary", &self.secondary)];
        let mut smallest = None;
        for (label, role) in roles {
            let Some(role) = role else { continue };
            if role.sizes.is_empty() {
                return Err(invalid(format!("{label} stack has no sizes")));
            }
            for &size in &role.sizes {
                if size == 0 || size >= lineup_size {
                    return Err(invalid(format!(
                        "{label} stack size {size} does not fit a lineup of {lineup_size}"
                    )));
                }
            }
            if !(0.0..=1.0).contains(&role.max_exposure) {
                return Err(invalid(format!(
                    "{label} stack exposure {} is outside [0, 1]",
                    role.max_exposure
                )));
            }
            let min = role.min_size();
            smallest = Some(smallest.map_or(min, |s: u32| s.min(min)));
        }
        if let (Some(primary), Some(secondary)) = (&self.primary, &self.secondary) {
            if primary.required && secondary.required && primary.min_size() + secondary.min_size() > lineup_size {
                return Err(invalid("primary and secondary stacks cannot both fit a lineup"));
            }
        }
        if let (Some(max), Some(smallest)) = (self.max_unstacked, smallest) {
            if max >= smallest {
                return Err(invalid(format!(
                    "max_unstacked {max} must be below the smallest stack size {smallest}"
                )));
            }
        }
        if self.secondary.is_none() && !self.allowed_pairings.is_empty() {
            return Err(invalid("stack pairings configured without a secondary stack"));
        }
        Ok(())
    }
}

fn default_true() -> bool {
    true
}

fn default_exposure() -> f64 {
    1.0
}

/// Size and exposure rules for one stack role.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct StackRoleRules {
    /// Allowed exact sizes, e.g. `[3, 4]`.
    pub sizes: Vec<u32>,

    /// Exactly one stack of this role (otherwise at most one).
    #[serde(default = "default_true")]
    pub required: bool,

    /// Largest share of emitted lineups that may use one stack identity.
    #[serde(default = "default_exposure")]
    pub max_exposure: f64,
}

impl StackRoleRules {
    pub fn new(sizes: &[u32], max_exposure: f64) -> Self {
        Self {
            sizes: sizes.to_vec(),
            required: true,
            max_exposure,
        }
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn min_size(&self) -> u32 {
        self.sizes.iter().copied().min().unwrap_or(0)
    }
}

fn default_top_owned() -> usize {
    5
}

fn default_avoid_threshold() -> u32 {
    3
}

/// Rules tying marker players to stacks.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MarkerStackRule {
    /// A listed marker may not be used when `threshold` or more of a listed
    /// team's `top_owned` highest-owned players are used.
    Avoid {
        markers: Vec<String>,
        teams: Vec<String>,
        #[serde(default = "default_top_owned")]
        top_owned: usize,
        #[serde(default = "default_avoid_threshold")]
        threshold: u32,
    },

    /// When a listed primary team (and a listed secondary team, if any are
    /// given) is stacked, one of the markers must be used.
    Require {
        markers: Vec<String>,
        primary: Vec<String>,
        #[serde(default)]
        secondary: Vec<String>,
    },
}

impl MarkerStackRule {
    pub fn markers(&self) -> &[String] {
        match self {
            MarkerStackRule::Avoid { markers, .. } | MarkerStackRule::Require { markers, .. } => markers,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if let MarkerStackRule::Avoid {
            top_owned, threshold, ..
        } = self
        {
            if *threshold == 0 {
                return Err(invalid("avoid rule threshold must be positive"));
            }
            if *top_owned == 0 {
                return Err(invalid("avoid rule needs at least one top-owned player"));
            }
        }
        Ok(())
    }
}

/// Boolean combinator over the presence of a set of players.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupLogic {
    /// At least one present.
    Any,
    /// All present.
    All,
    /// Exactly one present.
    Xor,
    /// Not all present.
    Nand,
    /// None present.
    Nor,
    /// At least `k` present.
    AtLeast(u32),
}

impl GroupLogic {
    /// Inclusive bounds on the present count that satisfy the combinator
    /// over `n` players. `None` when no count can satisfy it.
    pub fn count_bounds(self, n: u32) -> Option<(u32, u32)> {
        let (lo, hi) = match self {
            GroupLogic::Any => (1, n),
            GroupLogic::All => (n, n),
            GroupLogic::Xor => (1, 1),
            GroupLogic::Nand => (0, n.checked_sub(1)?),
            GroupLogic::Nor => (0, 0),
            GroupLogic::AtLeast(k) => (k, n),
        };
        (lo <= hi && lo <= n).then_some((lo, hi))
    }

    /// Evaluates the combinator for `present` of `n` players.
    ///
    /// ```
    /// use rosterforge_config::GroupLogic;
    ///
    /// assert!(GroupLogic::Xor.evaluate(1, 3));
    /// assert!(!GroupLogic::Xor.evaluate(2, 3));
    /// assert!(GroupLogic::AtLeast(2).evaluate(2, 3));
    /// assert!(GroupLogic::Nand.evaluate(2, 3));
    /// ```
    pub fn evaluate(self, present: u32, n: u32) -> bool {
        match self.count_bounds(n) {
            Some((lo, hi)) => present >= lo && present <= hi,
            None => false,
        }
    }
}

impl fmt::Display for GroupLogic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupLogic::Any => f.write_str("ANY"),
            GroupLogic::All => f.write_str("ALL"),
            GroupLogic::Xor => f.write_str("XOR"),
            GroupLogic::Nand => f.write_str("NAND"),
            GroupLogic::Nor => f.write_str("NOR"),
            GroupLogic::AtLeast(k) => write!(f, "AT_LEAST({k})"),
        }
    }
}

/// Selects the members of a custom group. A player matches when it
/// matches every non-empty criterion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct GroupSelector {
    /// Player names or ids.
    #[serde(default)]
    pub names: Vec<String>,

    #[serde(default)]
    pub teams: Vec<String>,

    #[serde(default)]
    pub positions: Vec<String>,

    #[serde(default)]
    pub roster_orders: Vec<u8>,
}

impl GroupSelector {
    pub fn names<S: AsRef<str>>(names: &[S]) -> Self {
        Self {
            names: names.iter().map(|n| n.as_ref().to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn roster_orders(orders: &[u8]) -> Self {
        Self {
            roster_orders: orders.to_vec(),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
            && self.teams.is_empty()
            && self.positions.is_empty()
            && self.roster_orders.is_empty()
    }

    pub fn matches(&self, player: &Player) -> bool {
        let named = self.names.is_empty()
            || self
                .names
                .iter()
                .any(|n| n == player.id.as_str() || n == player.display_name());
        let team = self.teams.is_empty() || self.teams.contains(&player.team);
        let position = self.positions.is_empty() || player.plays_any(&self.positions);
        let order = self.roster_orders.is_empty()
            || player
                .roster_order
                .is_some_and(|o| self.roster_orders.contains(&o));
        named && team && position && order
    }
}

/// Guard that decides whether a group's bounds are enforced.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct GroupCondition {
    /// Player names or ids the combinator ranges over.
    pub players: Vec<String>,
    pub logic: GroupLogic,
}

/// Externally configured min/max count over a set of players, optionally
/// enforced only while a condition holds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct GroupRule {
    #[serde(default)]
    pub name: String,

    pub players: GroupSelector,

    #[serde(default)]
    pub min: Option<u32>,

    #[serde(default)]
    pub max: Option<u32>,

    #[serde(default)]
    pub condition: Option<GroupCondition>,
}

impl GroupRule {
    pub fn new(name: impl Into<String>, players: GroupSelector) -> Self {
        Self {
            name: name.into(),
            players,
            min: None,
            max: None,
            condition: None,
        }
    }

    pub fn with_min(mut self, min: u32) -> Self {
        self.min = Some(min);
        self
    }

    pub fn with_max(mut self, max: u32) -> Self {
        self.max = Some(max);
        self
    }

    pub fn when<S: AsRef<str>>(mut self, players: &[S], logic: GroupLogic) -> Self {
        self.condition = Some(GroupCondition {
            players: players.iter().map(|p| p.as_ref().to_string()).collect(),
            logic,
        });
        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.players.is_empty() {
            return Err(invalid(format!("group {} selects no players", self.name)));
        }
        if self.min.is_none() && self.max.is_none() {
            return Err(invalid(format!("group {} has neither min nor max", self.name)));
        }
        if let (Some(min), Some(max)) = (self.min, self.max) {
            if min > max {
                return Err(invalid(format!(
                    "group {} min {} exceeds max {}",
                    self.name, min, max
                )));
            }
        }
        if let Some(condition) = &self.condition {
            if condition.players.is_empty() {
                return Err(invalid(format!("group {} condition names no players", self.name)));
            }
            let n = condition.players.len() as u32;
            if condition.logic.count_bounds(n).is_none() {
                return Err(invalid(format!(
                    "group {} condition {} can never hold over {} players",
                    self.name, condition.logic, n
                )));
            }
        }
        Ok(())
    }
}

fn default_lineup_count() -> usize {
    20
}

fn default_max_attempts() -> usize {
    1000
}

fn default_relaxation_steps() -> u32 {
    3
}

/// Generation loop configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct GenerationConfig {
    #[serde(default = "default_lineup_count")]
    pub lineup_count: usize,

    /// Upper bound on solve attempts for the whole run.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,

    /// Most players two lineups may share; lineup size minus 3 if unset.
    #[serde(default)]
    pub similarity_threshold: Option<u32>,

    /// Diversity comparisons that may be dropped per lineup on infeasibility.
    #[serde(default = "default_relaxation_steps")]
    pub max_relaxation_steps: u32,

    /// Player names or ids never used.
    #[serde(default)]
    pub excluded_players: Vec<String>,

    /// When set, every non-marker player not listed may only be used
    /// inside a stack.
    #[serde(default)]
    pub one_off_players: Option<Vec<String>>,

    /// Per-player exposure caps keyed by name or id.
    #[serde(default)]
    pub player_exposure: BTreeMap<String, f64>,

    /// Streak length after which a stack identity sits out.
    #[serde(default)]
    pub recent_stack_window: Option<u32>,

    #[serde(default)]
    pub randomness: Option<RandomnessConfig>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            lineup_count: default_lineup_count(),
            max_attempts: default_max_attempts(),
            similarity_threshold: None,
            max_relaxation_steps: default_relaxation_steps(),
            excluded_players: Vec::new(),
            one_off_players: None,
            player_exposure: BTreeMap::new(),
            recent_stack_window: None,
            randomness: None,
        }
    }
}

impl GenerationConfig {
    fn validate(&self, lineup_size: u32) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            return Err(invalid("max_attempts must be positive"));
        }
        if let Some(threshold) = self.similarity_threshold {
            if threshold >= lineup_size {
                return Err(invalid(format!(
                    "similarity threshold {threshold} allows duplicate lineups of size {lineup_size}"
                )));
            }
        }
        for (player, cap) in &self.player_exposure {
            if !(0.0..=1.0).contains(cap) {
                return Err(invalid(format!("exposure for {player} is outside [0, 1]")));
            }
        }
        if self.recent_stack_window == Some(0) {
            return Err(invalid("recent_stack_window must be positive"));
        }
        if let Some(randomness) = &self.randomness {
            if !(randomness.spread >= 0.0 && randomness.spread <= 1.0) {
                return Err(invalid("randomness spread must be within [0, 1]"));
            }
        }
        Ok(())
    }
}

fn default_spread() -> f64 {
    1.0
}

/// Per-attempt projection noise.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct RandomnessConfig {
    #[serde(default)]
    pub seed: Option<u64>,

    /// Fraction of the floor–ceiling range to sample from.
    #[serde(default = "default_spread")]
    pub spread: f64,
}

impl Default for RandomnessConfig {
    fn default() -> Self {
        Self {
            seed: None,
            spread: default_spread(),
        }
    }
}

fn default_time_limit_ms() -> u64 {
    30_000
}

fn default_unimproved_ms() -> Option<u64> {
    Some(3_000)
}

fn default_retry_multiplier() -> f64 {
    2.0
}

/// Solver configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct SolverSettings {
    /// Wall-clock budget per solve.
    #[serde(default = "default_time_limit_ms")]
    pub time_limit_ms: u64,

    /// Budget multiplier for the single retry after an UNKNOWN result.
    #[serde(default = "default_retry_multiplier")]
    pub retry_time_multiplier: f64,

    #[serde(default)]
    pub workers: WorkerCount,

    #[serde(default)]
    pub node_limit: Option<u64>,

    /// Stop a solve once its best lineup has not improved for this long.
    /// `None` searches until proven optimal or out of time.
    #[serde(default = "default_unimproved_ms")]
    pub unimproved_time_limit_ms: Option<u64>,

    /// Random seed for reproducible results.
    #[serde(default)]
    pub random_seed: Option<u64>,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            time_limit_ms: default_time_limit_ms(),
            retry_time_multiplier: default_retry_multiplier(),
            workers: WorkerCount::default(),
            node_limit: None,
            unimproved_time_limit_ms: default_unimproved_ms(),
            random_seed: None,
        }
    }
}

impl SolverSettings {
    pub fn time_limit(&self) -> Duration {
        Duration::from_millis(self.time_limit_ms)
    }

    pub fn unimproved_time_limit(&self) -> Option<Duration> {
        self.unimproved_time_limit_ms.map(Duration::from_millis)
    }

    /// Budget for the retry after an UNKNOWN result.
    pub fn retry_time_limit(&self) -> Duration {
        self.time_limit().mul_f64(self.retry_time_multiplier.max(1.0))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.time_limit_ms == 0 {
            return Err(invalid("time_limit_ms must be positive"));
        }
        if !(self.retry_time_multiplier >= 1.0 && self.retry_time_multiplier.is_finite()) {
            return Err(invalid("retry_time_multiplier must be at least 1"));
        }
        if self.unimproved_time_limit_ms == Some(0) {
            return Err(invalid("unimproved_time_limit_ms must be positive"));
        }
        if self.workers == WorkerCount::Count(0) {
            return Err(invalid("worker count must be positive"));
        }
        Ok(())
    }
}

/// Solver worker count configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerCount {
    /// One worker per available core, capped at 8.
    #[default]
    Auto,

    /// Specific number of workers.
    Count(usize),
}

impl WorkerCount {
    pub fn resolve(self) -> usize {
        match self {
            WorkerCount::Auto => std::thread::available_parallelism()
                .map(|n| n.get().min(8))
                .unwrap_or(1),
            WorkerCount::Count(n) => n.max(1),
        }
    }
}

/// One stage of the late-swap repair chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RepairStage {
    /// Joint re-optimization of every invalid slot.
    MultiSwap,
    /// Per-slot substitution within the original stack.
    StackPreserving,
    /// Per-slot substitution without the stack preference.
    Greedy,
}

impl fmt::Display for RepairStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepairStage::MultiSwap => f.write_str("multi_swap"),
            RepairStage::StackPreserving => f.write_str("stack_preserving"),
            RepairStage::Greedy => f.write_str("greedy"),
        }
    }
}

/// What to do with a lineup no strategy could repair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnrepairablePolicy {
    /// Pass the lineup through unchanged, flagged.
    #[default]
    Skip,
    /// Leave the lineup out of the output.
    Drop,
}

fn default_strategies() -> Vec<RepairStage> {
    vec![
        RepairStage::MultiSwap,
        RepairStage::StackPreserving,
        RepairStage::Greedy,
    ]
}

/// Late-swap configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct LateSwapConfig {
    /// Teams whose games have started.
    #[serde(default)]
    pub locked_teams: Vec<String>,

    #[serde(default = "default_strategies")]
    pub strategies: Vec<RepairStage>,

    #[serde(default)]
    pub unrepairable: UnrepairablePolicy,

    /// Pin stack identities during the multi-swap stage.
    #[serde(default = "default_true")]
    pub preserve_stacks: bool,
}

impl Default for LateSwapConfig {
    fn default() -> Self {
        Self {
            locked_teams: Vec::new(),
            strategies: default_strategies(),
            unrepairable: UnrepairablePolicy::default(),
            preserve_stacks: true,
        }
    }
}

impl LateSwapConfig {
    pub fn is_locked(&self, team: &str) -> bool {
        self.locked_teams.iter().any(|t| t == team)
    }

    pub fn with_locked_teams<S: AsRef<str>>(mut self, teams: &[S]) -> Self {
        self.locked_teams = teams.iter().map(|t| t.as_ref().to_string()).collect();
        self
    }

    pub fn with_strategies(mut self, strategies: &[RepairStage]) -> Self {
        self.strategies = strategies.to_vec();
        self
    }

    pub fn with_policy(mut self, policy: UnrepairablePolicy) -> Self {
        self.unrepairable = policy;
        self
    }
}

#[cfg(test)]
mod tests;
