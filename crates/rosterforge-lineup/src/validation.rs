//! Post-solve lineup validation.
//!
//! The validator re-checks a finished lineup against the sport rules
//! without the solver. Generation uses it as a last gate before accepting
//! a lineup; late swap uses it after every substitution.

use std::collections::BTreeSet;
use std::fmt;

use rosterforge_config::{GroupRule, SportRules};
use rosterforge_core::{Lineup, Player, PlayerId, RosterSlot, StackKey, StackRole};

use crate::stacks::{stack_counts, stack_key};

/// Which rules a lineup is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationProfile {
    /// Every rule.
    Full,
    /// Salary, slot eligibility, duplicates, team limits and opponent
    /// exclusion. Stack structure and groups are not checked.
    Relaxed,
}

/// One broken rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    SalaryCap { total: u32, cap: u32 },
    SalaryFloor { total: u32, floor: u32 },
    SlotCount { expected: usize, actual: usize },
    IneligibleSlot { slot: String, player: PlayerId },
    DuplicatePlayer(PlayerId),
    TeamLimit { team: String, count: u32, limit: u32 },
    OpponentConflict { marker: PlayerId, player: PlayerId },
    MarkerCount { expected: u32, actual: u32 },
    MissingStack(StackRole),
    StackSize { role: StackRole, key: StackKey, count: u32 },
    SameStackTwice(StackKey),
    Unstacked { key: StackKey, count: u32, max: u32 },
    ExcludedPrimaryTeam(String),
    Pairing { primary: String, secondary: String },
    StackOnly(PlayerId),
    Group { name: String, count: u32 },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::SalaryCap { total, cap } => write!(f, "salary {total} exceeds cap {cap}"),
            Violation::SalaryFloor { total, floor } => write!(f, "salary {total} is below floor {floor}"),
            Violation::SlotCount { expected, actual } => write!(f, "{actual} entries for {expected} slots"),
            Violation::IneligibleSlot { slot, player } => write!(f, "{player} cannot fill {slot}"),
            Violation::DuplicatePlayer(id) => write!(f, "{id} used twice"),
            Violation::TeamLimit { team, count, limit } => write!(f, "{count} players from {team}, limit {limit}"),
            Violation::OpponentConflict { marker, player } => write!(f, "{player} faces marker {marker}"),
            Violation::MarkerCount { expected, actual } => write!(f, "{actual} marker players, expected {expected}"),
            Violation::MissingStack(role) => write!(f, "no {role} stack"),
            Violation::StackSize { role, key, count } => write!(f, "{role} stack {key} has {count} players"),
            Violation::SameStackTwice(key) => write!(f, "{key} is both primary and secondary"),
            Violation::Unstacked { key, count, max } => write!(f, "{count} unstacked players from {key}, max {max}"),
            Violation::ExcludedPrimaryTeam(team) => write!(f, "{team} may not be the primary stack"),
            Violation::Pairing { primary, secondary } => write!(f, "{primary} may not pair with {secondary}"),
            Violation::StackOnly(id) => write!(f, "{id} is only usable in a stack"),
            Violation::Group { name, count } => write!(f, "group {name} has {count} players"),
        }
    }
}

/// Checks finished lineups against sport rules.
#[derive(Debug, Clone)]
pub struct LineupValidator<'a> {
    rules: &'a SportRules,
}

impl<'a> LineupValidator<'a> {
    pub fn new(rules: &'a SportRules) -> Self {
        Self { rules }
    }

    pub fn is_valid(&self, lineup: &Lineup, profile: ValidationProfile) -> bool {
        self.validate(lineup, profile).is_empty()
    }

    pub fn validate(&self, lineup: &Lineup, profile: ValidationProfile) -> Vec<Violation> {
        let rules = self.rules;
        let mut violations = Vec::new();

        let total = lineup.total_salary();
        if total > rules.salary_cap {
            violations.push(Violation::SalaryCap {
                total,
                cap: rules.salary_cap,
            });
        }
        if let Some(floor) = rules.salary_floor {
            if total < floor {
                violations.push(Violation::SalaryFloor { total, floor });
            }
        }

        let instances: Vec<_> = RosterSlot::instances(&rules.slots).collect();
        if instances.len() != lineup.len() {
            violations.push(Violation::SlotCount {
                expected: instances.len(),
                actual: lineup.len(),
            });
        }
        for (instance, entry) in instances.iter().zip(&lineup.entries) {
            let slot = &rules.slots[instance.slot_index];
            if entry.slot != instance.name || !slot.accepts(&entry.player) {
                violations.push(Violation::IneligibleSlot {
                    slot: instance.name.clone(),
                    player: entry.player.id.clone(),
                });
            }
        }

        let mut seen = BTreeSet::new();
        for player in lineup.players() {
            if !seen.insert(&player.id) {
                violations.push(Violation::DuplicatePlayer(player.id.clone()));
            }
        }

        if let Some(limit) = rules.team_limit {
            let no_skip: [&str; 0] = [];
            for (team, count) in lineup.team_counts(&no_skip) {
                let has_marker = lineup.players().any(|p| p.team == team && rules.is_marker(p));
                let cap = if has_marker { limit.with_marker } else { limit.without_marker };
                if count > cap {
                    violations.push(Violation::TeamLimit {
                        team: team.to_string(),
                        count,
                        limit: cap,
                    });
                }
            }
        }

        if rules.opponent_exclusion {
            for marker in lineup.players().filter(|p| rules.is_marker(p)) {
                for player in lineup
                    .players()
                    .filter(|p| !rules.is_marker(p) && !marker.opponent.is_empty() && p.team == marker.opponent)
                {
                    violations.push(Violation::OpponentConflict {
                        marker: marker.id.clone(),
                        player: player.id.clone(),
                    });
                }
            }
        }

        if profile == ValidationProfile::Full {
            self.check_markers(lineup, &mut violations);
            self.check_stacks(lineup, &mut violations);
            for group in &rules.groups {
                if let Some(count) = group_violation(group, lineup) {
                    violations.push(Violation::Group {
                        name: group.name.clone(),
                        count,
                    });
                }
            }
        }
        violations
    }

    fn check_markers(&self, lineup: &Lineup, violations: &mut Vec<Violation>) {
        let rules = self.rules;
        if rules.marker_positions.is_empty() {
            return;
        }
        let expected = rules.marker_slot_count();
        let actual = lineup.players().filter(|p| rules.is_marker(p)).count() as u32;
        let ok = if rules.has_flexible_marker_slot() {
            actual >= expected
        } else {
            actual == expected
        };
        if !ok {
            violations.push(Violation::MarkerCount { expected, actual });
        }
    }

    fn check_stacks(&self, lineup: &Lineup, violations: &mut Vec<Violation>) {
        let stacks = &self.rules.stacks;
        let counts = stack_counts(self.rules, lineup);

        for role in [StackRole::Primary, StackRole::Secondary] {
            let Some(role_rules) = stacks.role(role) else {
                if let Some(key) = lineup.stack(role) {
                    violations.push(Violation::StackSize {
                        role,
                        key: key.clone(),
                        count: counts.get(key).copied().unwrap_or(0),
                    });
                }
                continue;
            };
            match lineup.stack(role) {
                None if role_rules.required => violations.push(Violation::MissingStack(role)),
                None => {}
                Some(key) => {
                    let count = counts.get(key).copied().unwrap_or(0);
                    if !role_rules.sizes.contains(&count) {
                        violations.push(Violation::StackSize {
                            role,
                            key: key.clone(),
                            count,
                        });
                    }
                }
            }
        }

        if let (Some(primary), Some(secondary)) = (&lineup.primary_stack, &lineup.secondary_stack) {
            if primary == secondary {
                violations.push(Violation::SameStackTwice(primary.clone()));
            }
            if let Some(allowed) = stacks.allowed_pairings.get(&primary.team) {
                if !allowed.contains(&secondary.team) {
                    violations.push(Violation::Pairing {
                        primary: primary.team.clone(),
                        secondary: secondary.team.clone(),
                    });
                }
            }
        }
        if let Some(primary) = &lineup.primary_stack {
            if stacks.excluded_primary_teams.contains(&primary.team) {
                violations.push(Violation::ExcludedPrimaryTeam(primary.team.clone()));
            }
        }

        let stacked = |key: &StackKey| {
            lineup.primary_stack.as_ref() == Some(key) || lineup.secondary_stack.as_ref() == Some(key)
        };
        if let Some(max) = stacks.unstacked_limit() {
            for (key, &count) in &counts {
                if !stacked(key) && count > max {
                    violations.push(Violation::Unstacked {
                        key: key.clone(),
                        count,
                        max,
                    });
                }
            }
        }
        for player in lineup.players().filter(|p| p.stack_only) {
            if !stack_key(self.rules, player).is_some_and(|key| stacked(&key)) {
                violations.push(Violation::StackOnly(player.id.clone()));
            }
        }
    }
}

/// Returns the offending member count when a group rule is broken.
fn group_violation(group: &GroupRule, lineup: &Lineup) -> Option<u32> {
    if let Some(condition) = &group.condition {
        let present = condition
            .players
            .iter()
            .filter(|name| lineup.players().any(|p| names_player(name, p)))
            .count() as u32;
        if !condition.logic.evaluate(present, condition.players.len() as u32) {
            return None;
        }
    }
    let count = lineup.players().filter(|p| group.players.matches(p)).count() as u32;
    let below = group.min.is_some_and(|min| count < min);
    let above = group.max.is_some_and(|max| count > max);
    (below || above).then_some(count)
}

fn names_player(name: &str, player: &Player) -> bool {
    name == player.id.as_str() || name == player.display_name()
}
