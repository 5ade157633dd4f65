//! Constraint model construction for one lineup.
//!
//! [`LineupModelBuilder`] turns sport rules, a catalog and the per-attempt
//! exclusions into a boolean [`Model`]:
//!
//! - `x[p, s]` for every eligible (player, slot instance) pair
//! - `y[p]` "player used", linked by `y[p] == sum_s x[p, s]`
//! - one indicator per stack identity and role, with per-size
//!   sub-indicators when a role allows several sizes
//! - reification literals for group conditions and marker presence
//!
//! The objective maximizes scaled projection over `y`.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use rosterforge_config::{MarkerStackRule, SportRules};
use rosterforge_core::{
    Lineup, LineupEntry, Player, PlayerCatalog, PlayerId, Result, RosterError, RosterSlot,
    SlotInstance, StackKey, StackRole,
};
use rosterforge_solver::{Assignment, BoolVar, LinearExpr, Literal, Model};
use tracing::debug;

use crate::stacks::stack_key;

/// Objective coefficient per projected point.
pub const PROJECTION_SCALE: f64 = 100.0;

/// Players and stacks forced out of one model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Exclusions {
    pub players: BTreeSet<PlayerId>,
    pub primary_stacks: BTreeSet<StackKey>,
    pub secondary_stacks: BTreeSet<StackKey>,
}

impl Exclusions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exclude_player(&mut self, id: PlayerId) {
        self.players.insert(id);
    }

    pub fn exclude_stack(&mut self, role: StackRole, key: StackKey) {
        match role {
            StackRole::Primary => self.primary_stacks.insert(key),
            StackRole::Secondary => self.secondary_stacks.insert(key),
        };
    }

    pub fn stacks(&self, role: StackRole) -> &BTreeSet<StackKey> {
        match role {
            StackRole::Primary => &self.primary_stacks,
            StackRole::Secondary => &self.secondary_stacks,
        }
    }

    pub fn merge(&mut self, other: &Exclusions) {
        self.players.extend(other.players.iter().cloned());
        self.primary_stacks.extend(other.primary_stacks.iter().cloned());
        self.secondary_stacks.extend(other.secondary_stacks.iter().cloned());
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty() && self.primary_stacks.is_empty() && self.secondary_stacks.is_empty()
    }
}

/// Projection overrides for the objective. Players without an override
/// use their catalog projection.
#[derive(Debug, Clone, Default)]
pub struct ObjectiveWeights {
    projections: HashMap<PlayerId, f64>,
}

impl ObjectiveWeights {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_projection(mut self, id: PlayerId, projection: f64) -> Self {
        self.set(id, projection);
        self
    }

    pub fn set(&mut self, id: PlayerId, projection: f64) {
        self.projections.insert(id, projection);
    }

    pub fn projection(&self, player: &Player) -> f64 {
        self.projections
            .get(&player.id)
            .copied()
            .unwrap_or(player.projection)
    }

    pub fn len(&self) -> usize {
        self.projections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projections.is_empty()
    }
}

/// Resolves a rule reference by player id, then by display name.
pub fn resolve_player<'c>(catalog: &'c PlayerCatalog, reference: &str) -> Result<&'c Player> {
    catalog
        .get(&PlayerId::new(reference.trim()))
        .or_else(|| catalog.by_name(reference))
        .ok_or_else(|| RosterError::config(format!("player {reference} is not in the catalog")))
}

/// One stack indicator.
#[derive(Debug, Clone)]
struct StackVar {
    key: StackKey,
    var: BoolVar,
    members: Vec<usize>,
}

/// Builds the constraint model for one lineup.
///
/// # Example
///
/// ```
/// use rosterforge_lineup::LineupModelBuilder;
/// use rosterforge_test::{mlb_catalog, mlb_rules};
///
/// let rules = mlb_rules();
/// let catalog = mlb_catalog();
/// let model = LineupModelBuilder::new(&rules, &catalog).build().unwrap();
/// assert_eq!(model.pool_size(), 20);
/// ```
#[derive(Debug, Clone)]
pub struct LineupModelBuilder<'a> {
    rules: &'a SportRules,
    catalog: &'a PlayerCatalog,
    exclusions: Exclusions,
    diversity: Vec<(Vec<PlayerId>, u32)>,
    weights: ObjectiveWeights,
    fixed: Vec<(usize, PlayerId)>,
    pinned: Vec<(StackRole, StackKey)>,
    one_off: Option<Vec<String>>,
}

impl<'a> LineupModelBuilder<'a> {
    pub fn new(rules: &'a SportRules, catalog: &'a PlayerCatalog) -> Self {
        Self {
            rules,
            catalog,
            exclusions: Exclusions::default(),
            diversity: Vec::new(),
            weights: ObjectiveWeights::default(),
            fixed: Vec::new(),
            pinned: Vec::new(),
            one_off: None,
        }
    }

    pub fn with_exclusions(mut self, exclusions: &Exclusions) -> Self {
        self.exclusions.merge(exclusions);
        self
    }

    /// Caps the players shared with each lineup at `threshold`.
    pub fn with_previous_lineups(mut self, lineups: &[Lineup], threshold: u32) -> Self {
        for lineup in lineups {
            self.diversity
                .push((lineup.players().map(|p| p.id.clone()).collect(), threshold));
        }
        self
    }

    /// Forbids exact duplicates of each lineup.
    pub fn with_distinct_from(mut self, lineups: &[Lineup]) -> Self {
        let limit = self.rules.lineup_size().saturating_sub(1);
        self.with_previous_lineups(lineups, limit)
    }

    pub fn with_objective(mut self, weights: &ObjectiveWeights) -> Self {
        self.weights = weights.clone();
        self
    }

    /// Pins players to slot instances (index into slot-instance order).
    pub fn with_fixed(mut self, fixed: &[(usize, PlayerId)]) -> Self {
        self.fixed.extend(fixed.iter().cloned());
        self
    }

    /// Requires the given stack identity in the given role.
    pub fn with_pinned_stack(mut self, role: StackRole, key: StackKey) -> Self {
        self.pinned.push((role, key));
        self
    }

    /// Every non-marker player not listed may only be used inside a stack.
    pub fn with_one_off_players(mut self, players: &[String]) -> Self {
        self.one_off = Some(players.to_vec());
        self
    }

    pub fn build(self) -> Result<LineupModel> {
        let rules = self.rules;
        rules.validate()?;

        let instances: Vec<SlotInstance> = RosterSlot::instances(&rules.slots).collect();
        let size = instances.len();

        let mut fixed_ids = BTreeSet::new();
        for (slot, id) in &self.fixed {
            if *slot >= size {
                return Err(RosterError::config(format!("fixed slot {slot} is out of range")));
            }
            if !self.catalog.contains(id) {
                return Err(RosterError::config(format!("fixed player {id} is not in the catalog")));
            }
            fixed_ids.insert(id.clone());
        }

        let pool: Vec<&Player> = self
            .catalog
            .iter()
            .filter(|p| fixed_ids.contains(&p.id) || (p.active && p.projection > rules.min_projection))
            .collect();
        let index: HashMap<&PlayerId, usize> = pool.iter().enumerate().map(|(i, &p)| (&p.id, i)).collect();

        for slot in &rules.slots {
            let eligible = pool.iter().filter(|p| slot.accepts(p)).count();
            if eligible < slot.count as usize {
                return Err(RosterError::config(format!(
                    "slot {} needs {} players but only {} are eligible",
                    slot.name, slot.count, eligible
                )));
            }
        }
        let markers: Vec<usize> = (0..pool.len()).filter(|&p| rules.is_marker(pool[p])).collect();
        if !rules.marker_positions.is_empty() && markers.is_empty() {
            return Err(RosterError::config("no marker-eligible player in the pool"));
        }

        let mut model = Model::new();

        let mut slot_vars: Vec<Vec<(usize, BoolVar)>> = vec![Vec::new(); size];
        let mut player_slots: Vec<Vec<BoolVar>> = vec![Vec::new(); pool.len()];
        for (s, instance) in instances.iter().enumerate() {
            let slot = &rules.slots[instance.slot_index];
            for (p, player) in pool.iter().enumerate() {
                if slot.accepts(player) {
                    let var = model.new_bool_var(format!("x[{},{}]", player.id, s));
                    slot_vars[s].push((p, var));
                    player_slots[p].push(var);
                }
            }
        }
        let used: Vec<BoolVar> = pool
            .iter()
            .map(|p| model.new_bool_var(format!("y[{}]", p.id)))
            .collect();
        let count_of = |members: &[usize]| LinearExpr::sum(members.iter().map(|&p| used[p]));

        for vars in &slot_vars {
            let lits: Vec<Literal> = vars.iter().map(|(_, v)| v.lit()).collect();
            model.add_exactly(&lits, 1);
        }
        for (p, vars) in player_slots.iter().enumerate() {
            let mut link = LinearExpr::weighted([(1, used[p])]);
            for &v in vars {
                link.add_term(-1, v);
            }
            model.add(link.eq(0));
        }
        let all: Vec<usize> = (0..pool.len()).collect();
        model.add(count_of(&all).eq(size as i64));

        let salary = || LinearExpr::weighted(pool.iter().zip(&used).map(|(p, v)| (p.salary as i64, *v)));
        model.add(salary().le(rules.salary_cap as i64));
        if let Some(floor) = rules.salary_floor {
            model.add(salary().ge(floor as i64));
        }

        if !markers.is_empty() {
            let count = rules.marker_slot_count() as i64;
            if rules.has_flexible_marker_slot() {
                if count > 0 {
                    model.add(count_of(&markers).ge(count));
                }
            } else {
                model.add(count_of(&markers).eq(count));
            }
        }

        for (s, id) in &self.fixed {
            let p = *index
                .get(id)
                .ok_or_else(|| RosterError::config(format!("fixed player {id} is not usable")))?;
            let var = slot_vars[*s]
                .iter()
                .find(|(q, _)| *q == p)
                .map(|(_, v)| *v)
                .ok_or_else(|| {
                    RosterError::config(format!("fixed player {id} cannot fill slot {}", instances[*s].name))
                })?;
            model.fix(var, true);
        }
        for id in &self.exclusions.players {
            if let Some(&p) = index.get(id) {
                if !fixed_ids.contains(id) {
                    model.fix(used[p], false);
                }
            }
        }

        let mut teams: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
        for (p, player) in pool.iter().enumerate() {
            teams.entry(player.team.as_str()).or_default().push(p);
        }

        if let Some(limit) = rules.team_limit {
            for (team, members) in &teams {
                let team_markers: Vec<usize> = members.iter().copied().filter(|p| markers.contains(p)).collect();
                if team_markers.is_empty() || limit.with_marker == limit.without_marker {
                    model.add(count_of(members).le(limit.without_marker as i64));
                    continue;
                }
                let present = model.new_bool_var(format!("marker[{team}]"));
                for &m in &team_markers {
                    model.add_implication(used[m].lit(), present.lit());
                }
                model.add(count_of(&team_markers).ge(1)).only_enforce_if(&[present.lit()]);
                model
                    .add(count_of(members).le(limit.with_marker as i64))
                    .only_enforce_if(&[present.lit()]);
                model
                    .add(count_of(members).le(limit.without_marker as i64))
                    .only_enforce_if(&[!present]);
            }
        }

        // Stack identities over non-marker players.
        let mut keyed: BTreeMap<StackKey, Vec<usize>> = BTreeMap::new();
        for (p, player) in pool.iter().enumerate() {
            if let Some(key) = stack_key(rules, player) {
                keyed.entry(key).or_default().push(p);
            }
        }

        let mut primary: Vec<StackVar> = Vec::new();
        let mut secondary: Vec<StackVar> = Vec::new();
        for role in [StackRole::Primary, StackRole::Secondary] {
            let Some(role_rules) = rules.stacks.role(role) else {
                continue;
            };
            let mut vars = Vec::new();
            for (key, members) in &keyed {
                let sizes: Vec<u32> = role_rules
                    .sizes
                    .iter()
                    .copied()
                    .filter(|&s| members.len() as u32 >= s)
                    .collect();
                if sizes.is_empty() {
                    continue;
                }
                let var = model.new_bool_var(format!("{role}[{key}]"));
                if sizes.len() == 1 {
                    model.add(count_of(members).eq(sizes[0] as i64)).only_enforce_if(&[var.lit()]);
                } else {
                    let mut link = LinearExpr::weighted([(1, var)]);
                    for size in sizes {
                        let exact = model.new_bool_var(format!("{role}[{key}]={size}"));
                        link.add_term(-1, exact);
                        model.add(count_of(members).eq(size as i64)).only_enforce_if(&[exact.lit()]);
                    }
                    model.add(link.eq(0));
                }
                if self.exclusions.stacks(role).contains(key) {
                    model.fix(var, false);
                }
                vars.push(StackVar {
                    key: key.clone(),
                    var,
                    members: members.clone(),
                });
            }
            if vars.is_empty() && role_rules.required {
                return Err(RosterError::config(format!("no stack identity can form a {role} stack")));
            }
            let lits: Vec<Literal> = vars.iter().map(|s| s.var.lit()).collect();
            if role_rules.required {
                model.add_exactly(&lits, 1);
            } else {
                model.add_at_most_one(&lits);
            }
            match role {
                StackRole::Primary => primary = vars,
                StackRole::Secondary => secondary = vars,
            }
        }

        for p in &primary {
            if let Some(s) = secondary.iter().find(|s| s.key == p.key) {
                model.add_at_most_one(&[p.var.lit(), s.var.lit()]);
            }
            if rules.stacks.excluded_primary_teams.contains(&p.key.team) {
                model.fix(p.var, false);
            }
            if let Some(allowed) = rules.stacks.allowed_pairings.get(&p.key.team) {
                for s in secondary.iter().filter(|s| !allowed.contains(&s.key.team)) {
                    model.add_at_most_one(&[p.var.lit(), s.var.lit()]);
                }
            }
        }

        if let Some(max) = rules.stacks.unstacked_limit() {
            for (key, members) in &keyed {
                if members.len() as u32 <= max {
                    continue;
                }
                let guards: Vec<Literal> = primary
                    .iter()
                    .chain(&secondary)
                    .filter(|s| &s.key == key)
                    .map(|s| !s.var)
                    .collect();
                model.add(count_of(members).le(max as i64)).only_enforce_if(&guards);
            }
        }

        for (role, key) in &self.pinned {
            let vars = match role {
                StackRole::Primary => &primary,
                StackRole::Secondary => &secondary,
            };
            let var = vars.iter().find(|s| &s.key == key).map(|s| s.var).ok_or_else(|| {
                RosterError::InfeasibleModel(format!("{role} stack {key} cannot be formed"))
            })?;
            model.fix(var, true);
        }

        if rules.opponent_exclusion {
            for &m in &markers {
                let Some(opponents) = teams.get(pool[m].opponent.as_str()) else {
                    continue;
                };
                for &q in opponents.iter().filter(|q| !markers.contains(q)) {
                    model.add_at_most_one(&[used[m].lit(), used[q].lit()]);
                }
            }
        }

        let one_off: Option<BTreeSet<PlayerId>> = match &self.one_off {
            Some(names) => Some(
                names
                    .iter()
                    .map(|n| resolve_player(self.catalog, n).map(|p| p.id.clone()))
                    .collect::<Result<_>>()?,
            ),
            None => None,
        };
        for (p, player) in pool.iter().enumerate() {
            if markers.contains(&p) || fixed_ids.contains(&player.id) {
                continue;
            }
            let stack_only = player.stack_only
                || one_off.as_ref().is_some_and(|listed| !listed.contains(&player.id));
            if !stack_only {
                continue;
            }
            let mut clause = vec![!used[p]];
            clause.extend(
                primary
                    .iter()
                    .chain(&secondary)
                    .filter(|s| s.members.contains(&p))
                    .map(|s| s.var.lit()),
            );
            model.add_bool_or(&clause);
        }

        for (g, group) in rules.groups.iter().enumerate() {
            for name in &group.players.names {
                resolve_player(self.catalog, name)?;
            }
            let members: Vec<usize> = (0..pool.len()).filter(|&p| group.players.matches(pool[p])).collect();
            let guard = match &group.condition {
                None => None,
                Some(condition) => {
                    let n = condition.players.len() as u32;
                    let (lo, hi) = condition.logic.count_bounds(n).ok_or_else(|| {
                        RosterError::config(format!("group {} condition can never hold", group.name))
                    })?;
                    let mut present = Vec::new();
                    for name in &condition.players {
                        let player = resolve_player(self.catalog, name)?;
                        if let Some(&p) = index.get(&player.id) {
                            present.push(used[p]);
                        }
                    }
                    Some(reify_count(&mut model, &present, lo, hi, &format!("group{g}")))
                }
            };
            let guards: Vec<Literal> = guard.into_iter().collect();
            if let Some(min) = group.min {
                model.add(count_of(&members).ge(min as i64)).only_enforce_if(&guards);
            }
            if let Some(max) = group.max {
                model.add(count_of(&members).le(max as i64)).only_enforce_if(&guards);
            }
        }

        for rule in &rules.marker_stack_rules {
            let mut rule_markers = Vec::new();
            for name in rule.markers() {
                let player = resolve_player(self.catalog, name)?;
                if let Some(&p) = index.get(&player.id) {
                    rule_markers.push(p);
                }
            }
            match rule {
                MarkerStackRule::Avoid {
                    teams: avoided,
                    top_owned,
                    threshold,
                    ..
                } => {
                    for team in avoided {
                        let Some(members) = teams.get(team.as_str()) else {
                            continue;
                        };
                        let mut top: Vec<usize> = members.iter().copied().filter(|p| !markers.contains(p)).collect();
                        top.sort_by(|a, b| {
                            pool[*b]
                                .ownership_or_zero()
                                .total_cmp(&pool[*a].ownership_or_zero())
                                .then_with(|| pool[*a].id.cmp(&pool[*b].id))
                        });
                        top.truncate(*top_owned);
                        if (top.len() as u32) < *threshold {
                            continue;
                        }
                        for &m in &rule_markers {
                            model
                                .add(count_of(&top).le(*threshold as i64 - 1))
                                .only_enforce_if(&[used[m].lit()]);
                        }
                    }
                }
                MarkerStackRule::Require {
                    primary: teams_p,
                    secondary: teams_s,
                    ..
                } => {
                    let marker_lits: Vec<Literal> = rule_markers.iter().map(|&m| used[m].lit()).collect();
                    for p in primary.iter().filter(|s| teams_p.contains(&s.key.team)) {
                        if teams_s.is_empty() {
                            let mut clause = vec![!p.var];
                            clause.extend(&marker_lits);
                            model.add_bool_or(&clause);
                            continue;
                        }
                        for s in secondary.iter().filter(|s| teams_s.contains(&s.key.team)) {
                            let mut clause = vec![!p.var, !s.var];
                            clause.extend(&marker_lits);
                            model.add_bool_or(&clause);
                        }
                    }
                }
            }
        }

        for (ids, limit) in &self.diversity {
            let shared: Vec<usize> = ids.iter().filter_map(|id| index.get(id).copied()).collect();
            if shared.len() as u32 > *limit {
                model.add(count_of(&shared).le(*limit as i64));
            }
        }

        let projection = |p: usize| self.weights.projection(pool[p]);
        model.maximize(
            (0..pool.len())
                .map(|p| ((projection(p) * PROJECTION_SCALE).round() as i64, used[p]))
                .collect(),
        );
        model.cardinality_hint(used.clone(), size);

        // Strongest stacks first, each followed by its best members, then
        // marker seats, then every seat by projection.
        for (role, vars) in [(StackRole::Primary, &primary), (StackRole::Secondary, &secondary)] {
            let depth = rules.stacks.role(role).map_or(0, |r| r.sizes.iter().copied().max().unwrap_or(0)) as usize;
            let mut ranked: Vec<(f64, BoolVar)> = Vec::with_capacity(vars.len());
            for s in vars.iter() {
                let mut members = s.members.clone();
                members.sort_by(|a, b| projection(*b).total_cmp(&projection(*a)));
                ranked.push((members.iter().take(depth).map(|&p| projection(p)).sum(), s.var));
                model.branch_when(s.var.lit(), members.into_iter().map(|p| used[p]), true);
            }
            ranked.sort_by(|a, b| b.0.total_cmp(&a.0));
            model.branch_priority(ranked.into_iter().map(|(_, v)| v), true);
        }
        let mut seats: Vec<usize> = (0..size).collect();
        seats.sort_by_key(|&s| !slot_vars[s].iter().all(|(p, _)| markers.contains(p)));
        for s in seats {
            let mut ranked = slot_vars[s].clone();
            ranked.sort_by(|a, b| projection(b.0).total_cmp(&projection(a.0)));
            model.branch_priority(ranked.into_iter().map(|(_, v)| v), true);
        }

        debug!(
            event = "model_built",
            players = pool.len(),
            vars = model.num_vars(),
            constraints = model.constraints().len(),
            excluded = self.exclusions.players.len(),
            comparisons = self.diversity.len(),
        );

        Ok(LineupModel {
            model,
            instances,
            pool: pool.into_iter().cloned().collect(),
            slot_vars,
            used,
            primary: primary.into_iter().map(|s| (s.key, s.var)).collect(),
            secondary: secondary.into_iter().map(|s| (s.key, s.var)).collect(),
        })
    }
}

/// Returns a literal equivalent to `lo <= count(vars) <= hi`.
fn reify_count(model: &mut Model, vars: &[BoolVar], lo: u32, hi: u32, label: &str) -> Literal {
    let holds = model.new_bool_var(label.to_string());
    let count = || LinearExpr::sum(vars.iter().copied());
    model.add(count().ge(lo as i64)).only_enforce_if(&[holds.lit()]);
    model.add(count().le(hi as i64)).only_enforce_if(&[holds.lit()]);

    let mut escape = vec![holds.lit()];
    if lo > 0 {
        let below = model.new_bool_var(format!("{label}<"));
        model.add(count().le(lo as i64 - 1)).only_enforce_if(&[below.lit()]);
        escape.push(below.lit());
    }
    if (hi as usize) < vars.len() {
        let above = model.new_bool_var(format!("{label}>"));
        model.add(count().ge(hi as i64 + 1)).only_enforce_if(&[above.lit()]);
        escape.push(above.lit());
    }
    model.add_bool_or(&escape);
    holds.lit()
}

/// A built lineup model and the variable maps needed to read a solution.
#[derive(Debug, Clone)]
pub struct LineupModel {
    model: Model,
    instances: Vec<SlotInstance>,
    pool: Vec<Player>,
    slot_vars: Vec<Vec<(usize, BoolVar)>>,
    used: Vec<BoolVar>,
    primary: Vec<(StackKey, BoolVar)>,
    secondary: Vec<(StackKey, BoolVar)>,
}

impl LineupModel {
    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Players that entered the model.
    pub fn pool_size(&self) -> usize {
        self.pool.len()
    }

    pub fn player_var(&self, id: &PlayerId) -> Option<BoolVar> {
        self.pool.iter().position(|p| &p.id == id).map(|p| self.used[p])
    }

    pub fn stack_var(&self, role: StackRole, key: &StackKey) -> Option<BoolVar> {
        let vars = match role {
            StackRole::Primary => &self.primary,
            StackRole::Secondary => &self.secondary,
        };
        vars.iter().find(|(k, _)| k == key).map(|(_, v)| *v)
    }

    /// Reads the lineup out of a solver assignment.
    pub fn extract(&self, assignment: &Assignment) -> Result<Lineup> {
        let mut entries = Vec::with_capacity(self.instances.len());
        for (instance, vars) in self.instances.iter().zip(&self.slot_vars) {
            let (p, _) = vars
                .iter()
                .find(|(_, v)| assignment.value(*v))
                .ok_or_else(|| RosterError::InfeasibleModel(format!("slot {} left empty", instance.name)))?;
            entries.push(LineupEntry {
                slot: instance.name.clone(),
                player: self.pool[*p].clone(),
            });
        }
        let asserted = |vars: &[(StackKey, BoolVar)]| {
            vars.iter()
                .find(|(_, v)| assignment.value(*v))
                .map(|(k, _)| k.clone())
        };
        Ok(Lineup::new(entries).with_stacks(asserted(&self.primary), asserted(&self.secondary)))
    }
}

#[cfg(test)]
mod tests;
