//! Depth-first branch-and-bound search worker.
//!
//! One worker owns its assignment, trail and decision stack. Propagation
//! runs to fixpoint after every decision; a conflict or a failed bound
//! check backtracks to the most recent decision whose opposite value has
//! not been tried.
//!
//! Triggered branches take precedence over the static order: once a
//! trigger literal holds, its variables are decided next.

mod bounder;
mod propagate;

use std::collections::VecDeque;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::trace;

use crate::model::{BoolVar, Literal, Model};
use crate::stats::SolveStats;
use crate::termination::Termination;

use bounder::{is_hinted_budget, ObjectiveBounder};

/// Branch-order jitter window for non-canonical workers.
const PERTURBATION_WINDOW: f64 = 4.0;

#[derive(Debug, Clone, Copy)]
struct Decision {
    var: BoolVar,
    value: bool,
    order_pos: usize,
    trail_len: usize,
    flipped: bool,
}

/// What one worker hands back to the portfolio.
#[derive(Debug, Clone)]
pub(crate) struct WorkerOutcome {
    pub(crate) worker: usize,
    /// The whole tree was explored (or a satisfaction model was satisfied).
    pub(crate) exhausted: bool,
    pub(crate) best: Option<(i64, Vec<bool>)>,
    pub(crate) stats: SolveStats,
}

pub(crate) struct Search<'m> {
    model: &'m Model,
    worker: usize,
    watches: Vec<Vec<u32>>,
    values: Vec<Option<bool>>,
    trail: Vec<BoolVar>,
    decisions: Vec<Decision>,
    order: Vec<(BoolVar, bool)>,
    bounder: ObjectiveBounder,
    hints: HintCounts,
    /// Per constraint, its terms sorted by weight when it is a budget over
    /// hinted variables.
    budgets: Vec<Option<Vec<(i64, Literal)>>>,
    queue: VecDeque<u32>,
    queued: Vec<bool>,
    best: Option<(i64, Vec<bool>)>,
    stats: SolveStats,
}

impl<'m> Search<'m> {
    pub(crate) fn new(model: &'m Model, worker: usize, seed: u64) -> Self {
        let n = model.num_vars();
        let mut watches = vec![Vec::new(); n];
        for (ci, c) in model.constraints().iter().enumerate() {
            for (_, lit) in c.terms() {
                watches[lit.var().index()].push(ci as u32);
            }
            for lit in c.enforcement() {
                watches[lit.var().index()].push(ci as u32);
            }
        }
        for list in &mut watches {
            list.dedup();
        }
        let hints = HintCounts::new(model);
        let budgets = model
            .constraints()
            .iter()
            .map(|c| {
                is_hinted_budget(c, &hints.hinted).then(|| {
                    let mut terms = c.terms().to_vec();
                    terms.sort_by_key(|&(coef, lit)| (coef, lit));
                    terms
                })
            })
            .collect();

        Self {
            model,
            worker,
            watches,
            values: vec![None; n],
            trail: Vec::with_capacity(n),
            decisions: Vec::new(),
            order: branch_order(model, worker, seed),
            bounder: ObjectiveBounder::new(model),
            hints,
            budgets,
            queue: VecDeque::new(),
            queued: vec![false; model.constraints().len()],
            best: None,
            stats: SolveStats::default(),
        }
    }

    pub(crate) fn run(mut self, termination: &dyn Termination) -> WorkerOutcome {
        self.stats.start();
        let exhausted = self.search(termination);
        self.stats.finish();
        trace!(
            event = "worker_end",
            worker = self.worker,
            exhausted,
            nodes = self.stats.nodes,
            conflicts = self.stats.conflicts,
        );
        WorkerOutcome {
            worker: self.worker,
            exhausted,
            best: self.best,
            stats: self.stats,
        }
    }

    /// Returns true when the search space was exhausted.
    fn search(&mut self, termination: &dyn Termination) -> bool {
        for ci in 0..self.model.constraints().len() {
            self.enqueue(ci as u32);
        }
        if !self.propagate() {
            return true;
        }

        loop {
            if termination.is_terminated(&self.stats) {
                return false;
            }

            let dead_end = if self.bound_prunes() {
                true
            } else {
                match self.next_unassigned() {
                    None => {
                        self.record_leaf();
                        if !self.model.has_objective() && self.best.is_some() {
                            return true;
                        }
                        true
                    }
                    Some((pos, var, value)) => {
                        self.stats.record_node();
                        self.decisions.push(Decision {
                            var,
                            value,
                            order_pos: pos,
                            trail_len: self.trail.len(),
                            flipped: false,
                        });
                        !self.decide(var, value)
                    }
                }
            };

            if dead_end {
                self.stats.record_conflict();
                if !self.backtrack() {
                    return true;
                }
            }
        }
    }

    fn decide(&mut self, var: BoolVar, value: bool) -> bool {
        self.assign(var, value);
        self.propagate()
    }

    /// Flips the most recent untried decision. False when none is left.
    fn backtrack(&mut self) -> bool {
        while let Some(decision) = self.decisions.pop() {
            self.undo_to(decision.trail_len);
            if decision.flipped {
                continue;
            }
            self.decisions.push(Decision {
                value: !decision.value,
                flipped: true,
                ..decision
            });
            if self.decide(decision.var, !decision.value) {
                return true;
            }
            self.stats.record_conflict();
        }
        false
    }

    fn bound_prunes(&self) -> bool {
        if !self.model.has_objective() {
            return false;
        }
        match &self.best {
            Some((best, _)) => self.bounder.bound(&self.values) <= *best,
            None => false,
        }
    }

    fn next_unassigned(&self) -> Option<(usize, BoolVar, bool)> {
        let start = self.decisions.last().map_or(0, |d| d.order_pos);
        for branch in self.model.triggered_branches() {
            if self.lit_value(branch.trigger) != Some(true) {
                continue;
            }
            if let Some(&var) = branch.vars.iter().find(|v| self.values[v.index()].is_none()) {
                return Some((start, var, branch.first));
            }
        }
        self.order[start..]
            .iter()
            .enumerate()
            .find(|(_, (v, _))| self.values[v.index()].is_none())
            .map(|(i, &(v, first))| (start + i, v, first))
    }

    fn record_leaf(&mut self) {
        let values: Vec<bool> = self.values.iter().map(|v| v.unwrap_or(false)).collect();
        if !self.model.is_satisfied(|v| values[v.index()]) {
            trace!(event = "leaf_rejected", worker = self.worker);
            return;
        }
        let objective = self.model.objective_value(|v| values[v.index()]);
        if self.best.as_ref().is_some_and(|(best, _)| objective <= *best) {
            return;
        }
        self.stats.record_solution();
        trace!(
            event = "incumbent",
            worker = self.worker,
            objective,
            nodes = self.stats.nodes,
        );
        self.best = Some((objective, values));
    }

    fn assign(&mut self, var: BoolVar, value: bool) {
        self.values[var.index()] = Some(value);
        self.hints.assign(var, value);
        self.trail.push(var);
        for i in 0..self.watches[var.index()].len() {
            let ci = self.watches[var.index()][i];
            self.enqueue(ci);
        }
    }

    fn undo_to(&mut self, trail_len: usize) {
        while self.trail.len() > trail_len {
            if let Some(var) = self.trail.pop() {
                if let Some(value) = self.values[var.index()].take() {
                    self.hints.unassign(var, value);
                }
            }
        }
    }

    fn enqueue(&mut self, ci: u32) {
        if !self.queued[ci as usize] {
            self.queued[ci as usize] = true;
            self.queue.push_back(ci);
        }
    }

    fn clear_queue(&mut self) {
        while let Some(ci) = self.queue.pop_front() {
            self.queued[ci as usize] = false;
        }
    }

    fn lit_value(&self, lit: Literal) -> Option<bool> {
        self.values[lit.var().index()].map(|v| lit.holds(v))
    }
}

/// Assigned-variable counters over the cardinality hint.
#[derive(Debug, Clone, Default)]
struct HintCounts {
    hinted: Vec<bool>,
    len: usize,
    count: usize,
    taken: usize,
    dropped: usize,
}

impl HintCounts {
    fn new(model: &Model) -> Self {
        let mut hinted = vec![false; model.num_vars()];
        let Some((vars, count)) = model.cardinality() else {
            return Self {
                hinted,
                ..Self::default()
            };
        };
        for v in vars {
            hinted[v.index()] = true;
        }
        let len = hinted.iter().filter(|h| **h).count();
        Self {
            hinted,
            len,
            count: *count,
            taken: 0,
            dropped: 0,
        }
    }

    fn assign(&mut self, var: BoolVar, value: bool) {
        if self.hinted[var.index()] {
            if value {
                self.taken += 1;
            } else {
                self.dropped += 1;
            }
        }
    }

    fn unassign(&mut self, var: BoolVar, value: bool) {
        if self.hinted[var.index()] {
            if value {
                self.taken -= 1;
            } else {
                self.dropped -= 1;
            }
        }
    }

    /// Hinted variables still to be set true.
    fn remaining(&self) -> usize {
        self.count.saturating_sub(self.taken)
    }

    fn open(&self) -> usize {
        self.len - self.taken - self.dropped
    }
}

/// Priority variables first (deduplicated), then the rest false-first.
/// Workers other than 0 jitter the priority section.
fn branch_order(model: &Model, worker: usize, seed: u64) -> Vec<(BoolVar, bool)> {
    let mut seen = vec![false; model.num_vars()];
    let mut order: Vec<(BoolVar, bool)> = Vec::with_capacity(model.num_vars());
    for &(var, first) in model.branch_order() {
        if var.index() < seen.len() && !seen[var.index()] {
            seen[var.index()] = true;
            order.push((var, first));
        }
    }

    if worker > 0 {
        let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(worker as u64));
        let mut keyed: Vec<(f64, (BoolVar, bool))> = order
            .iter()
            .enumerate()
            .map(|(i, &entry)| (i as f64 + rng.random::<f64>() * PERTURBATION_WINDOW, entry))
            .collect();
        keyed.sort_by(|a, b| a.0.total_cmp(&b.0));
        order = keyed.into_iter().map(|(_, entry)| entry).collect();
    }

    for (i, taken) in seen.iter().enumerate() {
        if !taken {
            order.push((BoolVar(i as u32), false));
        }
    }
    order
}
