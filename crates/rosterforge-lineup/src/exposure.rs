//! Exposure tracking across one generation run.
//!
//! Exposure is evaluated relative to the lineups accepted so far: an
//! identity is locked while `count / max(1, accepted) >= cap`, so a stack
//! locked early unlocks again once enough other lineups are accepted.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use rosterforge_config::{GenerationConfig, SportRules};
use rosterforge_core::{Lineup, PlayerCatalog, PlayerId, Result, StackKey, StackRole};
use serde::Serialize;

use crate::builder::{resolve_player, Exclusions};

/// An identity whose exposure is tracked.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Tracked {
    Stack(StackRole, StackKey),
    Player(PlayerId),
}

impl fmt::Display for Tracked {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tracked::Stack(role, key) => write!(f, "{role} stack {key}"),
            Tracked::Player(id) => write!(f, "player {id}"),
        }
    }
}

/// Exposure caps by identity. A cap of 1.0 or more never locks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExposureCaps {
    pub primary: Option<f64>,
    pub secondary: Option<f64>,
    pub players: BTreeMap<PlayerId, f64>,
    /// Consecutive uses after which a stack is locked.
    pub recent_stack_window: Option<u32>,
}

impl ExposureCaps {
    /// Caps from the stack rules and the per-player exposure table.
    /// Player names are resolved against the catalog.
    pub fn from_config(rules: &SportRules, generation: &GenerationConfig, catalog: &PlayerCatalog) -> Result<Self> {
        let mut players = BTreeMap::new();
        for (name, cap) in &generation.player_exposure {
            players.insert(resolve_player(catalog, name)?.id.clone(), *cap);
        }
        Ok(Self {
            primary: rules.stacks.primary.as_ref().map(|r| r.max_exposure),
            secondary: rules.stacks.secondary.as_ref().map(|r| r.max_exposure),
            players,
            recent_stack_window: generation.recent_stack_window,
        })
    }

    fn cap(&self, tracked: &Tracked) -> Option<f64> {
        match tracked {
            Tracked::Stack(StackRole::Primary, _) => self.primary,
            Tracked::Stack(StackRole::Secondary, _) => self.secondary,
            Tracked::Player(id) => self.players.get(id).copied(),
        }
        .filter(|cap| *cap < 1.0)
    }
}

/// Caller-owned exposure state for one generation run.
///
/// # Example
///
/// ```
/// use rosterforge_core::{Lineup, StackKey, StackRole};
/// use rosterforge_lineup::exposure::{ExposureCaps, ExposureCounter, Tracked};
///
/// let caps = ExposureCaps { primary: Some(0.5), ..ExposureCaps::default() };
/// let mut counter = ExposureCounter::new(caps);
/// let bos = Tracked::Stack(StackRole::Primary, StackKey::team("BOS"));
///
/// counter.record(&Lineup::new(vec![]).with_stacks(Some(StackKey::team("BOS")), None));
/// assert!(counter.is_locked(&bos));
///
/// counter.record(&Lineup::new(vec![]));
/// counter.record(&Lineup::new(vec![]));
/// assert!(!counter.is_locked(&bos));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ExposureCounter {
    caps: ExposureCaps,
    accepted: usize,
    counts: BTreeMap<Tracked, usize>,
    streaks: BTreeMap<(StackRole, StackKey), u32>,
}

impl ExposureCounter {
    pub fn new(caps: ExposureCaps) -> Self {
        Self {
            caps,
            ..Self::default()
        }
    }

    pub fn caps(&self) -> &ExposureCaps {
        &self.caps
    }

    /// Counts an accepted lineup.
    pub fn record(&mut self, lineup: &Lineup) {
        self.accepted += 1;
        for role in [StackRole::Primary, StackRole::Secondary] {
            let used = lineup.stack(role);
            if let Some(key) = used {
                *self.counts.entry(Tracked::Stack(role, key.clone())).or_insert(0) += 1;
            }
            if self.caps.recent_stack_window.is_some() {
                for ((r, k), streak) in self.streaks.iter_mut() {
                    if *r == role && Some(k) != used {
                        *streak = streak.saturating_sub(1);
                    }
                }
                if let Some(key) = used {
                    *self.streaks.entry((role, key.clone())).or_insert(0) += 1;
                }
            }
        }
        for id in self.caps.players.keys() {
            if lineup.contains(id) {
                *self.counts.entry(Tracked::Player(id.clone())).or_insert(0) += 1;
            }
        }
    }

    pub fn accepted(&self) -> usize {
        self.accepted
    }

    pub fn count(&self, tracked: &Tracked) -> usize {
        self.counts.get(tracked).copied().unwrap_or(0)
    }

    /// Share of accepted lineups using the identity.
    pub fn exposure(&self, tracked: &Tracked) -> f64 {
        if self.accepted == 0 {
            return 0.0;
        }
        self.count(tracked) as f64 / self.accepted as f64
    }

    pub fn is_locked(&self, tracked: &Tracked) -> bool {
        if let Some(cap) = self.caps.cap(tracked) {
            let share = self.count(tracked) as f64 / self.accepted.max(1) as f64;
            if self.count(tracked) > 0 && share >= cap {
                return true;
            }
        }
        match (tracked, self.caps.recent_stack_window) {
            (Tracked::Stack(role, key), Some(window)) => self
                .streaks
                .get(&(*role, key.clone()))
                .is_some_and(|streak| *streak >= window),
            _ => false,
        }
    }

    pub fn locked_stacks(&self, role: StackRole) -> BTreeSet<StackKey> {
        let counted = self.counts.keys().filter_map(|t| match t {
            Tracked::Stack(r, key) if *r == role => Some(key),
            _ => None,
        });
        let streaked = self.streaks.keys().filter(|(r, _)| *r == role).map(|(_, key)| key);
        counted
            .chain(streaked)
            .filter(|key| self.is_locked(&Tracked::Stack(role, (*key).clone())))
            .cloned()
            .collect()
    }

    pub fn locked_players(&self) -> BTreeSet<PlayerId> {
        self.caps
            .players
            .keys()
            .filter(|id| self.is_locked(&Tracked::Player((*id).clone())))
            .cloned()
            .collect()
    }

    pub fn any_locked(&self) -> bool {
        !self.locked_stacks(StackRole::Primary).is_empty()
            || !self.locked_stacks(StackRole::Secondary).is_empty()
            || !self.locked_players().is_empty()
    }

    /// Everything currently locked, as model exclusions.
    pub fn exclusions(&self) -> Exclusions {
        let mut exclusions = Exclusions::new();
        for role in [StackRole::Primary, StackRole::Secondary] {
            for key in self.locked_stacks(role) {
                exclusions.exclude_stack(role, key);
            }
        }
        for id in self.locked_players() {
            exclusions.exclude_player(id);
        }
        exclusions
    }

    pub fn snapshot(&self) -> ExposureSnapshot {
        ExposureSnapshot {
            accepted: self.accepted,
            entries: self
                .counts
                .iter()
                .map(|(tracked, &count)| ExposureEntry {
                    tracked: tracked.clone(),
                    count,
                    exposure: self.exposure(tracked),
                    locked: self.is_locked(tracked),
                })
                .collect(),
        }
    }
}

/// Exposure of one identity at the end of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExposureEntry {
    pub tracked: Tracked,
    pub count: usize,
    pub exposure: f64,
    pub locked: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExposureSnapshot {
    pub accepted: usize,
    pub entries: Vec<ExposureEntry>,
}

impl ExposureSnapshot {
    pub fn get(&self, tracked: &Tracked) -> Option<&ExposureEntry> {
        self.entries.iter().find(|e| &e.tracked == tracked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stacked(primary: &str) -> Lineup {
        Lineup::new(vec![]).with_stacks(Some(StackKey::team(primary)), None)
    }

    fn bos() -> Tracked {
        Tracked::Stack(StackRole::Primary, StackKey::team("BOS"))
    }

    #[test]
    fn test_twenty_percent_cap_allows_two_in_ten() {
        let caps = ExposureCaps {
            primary: Some(0.2),
            ..ExposureCaps::default()
        };
        let mut counter = ExposureCounter::new(caps);
        let mut used = 0;
        for i in 0..10 {
            let lineup = if counter.is_locked(&bos()) {
                stacked(&format!("T{i}"))
            } else {
                used += 1;
                stacked("BOS")
            };
            counter.record(&lineup);
        }
        assert_eq!(used, 2);
        assert_eq!(counter.count(&bos()), 2);
        assert!((counter.exposure(&bos()) - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_uncapped_identity_never_locks() {
        let mut counter = ExposureCounter::new(ExposureCaps {
            primary: Some(1.0),
            ..ExposureCaps::default()
        });
        counter.record(&stacked("BOS"));
        counter.record(&stacked("BOS"));
        assert!(!counter.is_locked(&bos()));
        assert!(!counter.any_locked());
        assert!(counter.exclusions().is_empty());
    }

    #[test]
    fn test_player_cap_excludes_player() {
        let id = PlayerId::new("h01");
        let mut caps = ExposureCaps::default();
        caps.players.insert(id.clone(), 0.5);
        let mut counter = ExposureCounter::new(caps);

        counter.record(&Lineup::new(vec![]));
        assert!(counter.locked_players().is_empty());

        let catalog = rosterforge_test::mlb_catalog();
        let judge = catalog.get(&id).unwrap().clone();
        counter.record(&Lineup::new(vec![rosterforge_core::LineupEntry {
            slot: "OF".to_string(),
            player: judge,
        }]));
        // 1 of 2 reaches the 50% cap.
        assert!(counter.any_locked());
        assert!(counter.exclusions().players.contains(&id));
    }

    #[test]
    fn test_recent_window_locks_streak() {
        let mut counter = ExposureCounter::new(ExposureCaps {
            recent_stack_window: Some(2),
            ..ExposureCaps::default()
        });
        counter.record(&stacked("BOS"));
        assert!(!counter.is_locked(&bos()));
        counter.record(&stacked("BOS"));
        assert!(counter.is_locked(&bos()));
        counter.record(&stacked("NYY"));
        assert!(!counter.is_locked(&bos()));
        assert_eq!(counter.locked_stacks(StackRole::Primary).len(), 0);
    }

    #[test]
    fn test_snapshot_reports_counts() {
        let mut counter = ExposureCounter::new(ExposureCaps {
            primary: Some(0.5),
            ..ExposureCaps::default()
        });
        counter.record(&stacked("BOS"));
        counter.record(&stacked("NYY"));

        let snapshot = counter.snapshot();
        assert_eq!(snapshot.accepted, 2);
        let entry = snapshot.get(&bos()).unwrap();
        assert_eq!(entry.count, 1);
        assert!(entry.locked);
    }
}
