//! Optimistic objective bound for branch-and-bound pruning.

use crate::model::{BoolVar, LinearConstraint, Model, Relation};

/// Golden-section steps spent on the budget multiplier.
const MULTIPLIER_STEPS: usize = 12;

/// Upper bound on the objective reachable from a partial assignment.
///
/// Unassigned positive terms are assumed true and negative ones false.
/// When the model carries a cardinality hint, only the best remaining
/// hinted variables are counted. A budget constraint over the hinted
/// variables is dualized: any multiplier `m >= 0` bounds the hinted part by
/// `m * room + best_r(profit - m * weight)`.
#[derive(Debug, Clone)]
pub(crate) struct ObjectiveBounder {
    /// Objective terms, coefficient descending.
    sorted: Vec<(i64, BoolVar)>,
    hinted: Vec<bool>,
    hint_vars: Vec<BoolVar>,
    hint_count: usize,
    budget: Option<Budget>,
}

/// Dualized `sum(weight * var) <= capacity` over hinted variables.
#[derive(Debug, Clone)]
struct Budget {
    /// Per hinted variable: objective profit and budget weight.
    items: Vec<(BoolVar, f64, f64)>,
    capacity: i64,
}

impl ObjectiveBounder {
    pub(crate) fn new(model: &Model) -> Self {
        let mut sorted = model.objective().to_vec();
        sorted.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));

        let mut hinted = vec![false; model.num_vars()];
        let (hint_vars, hint_count) = match model.cardinality() {
            Some((vars, count)) => {
                for v in vars {
                    hinted[v.index()] = true;
                }
                (vars.clone(), *count)
            }
            None => (Vec::new(), 0),
        };
        let budget = Budget::find(model, &hinted, &hint_vars);

        Self {
            sorted,
            hinted,
            hint_vars,
            hint_count,
            budget,
        }
    }

    pub(crate) fn bound(&self, values: &[Option<bool>]) -> i64 {
        let taken = self
            .hint_vars
            .iter()
            .filter(|v| values[v.index()] == Some(true))
            .count();
        let mut remaining = self.hint_count.saturating_sub(taken);
        let has_hint = !self.hint_vars.is_empty();

        let mut bound = 0;
        let mut hinted_part = 0;
        for &(coef, var) in &self.sorted {
            match values[var.index()] {
                Some(true) => bound += coef,
                Some(false) => {}
                None if coef > 0 => {
                    if has_hint && self.hinted[var.index()] {
                        if remaining > 0 {
                            hinted_part += coef;
                            remaining -= 1;
                        }
                    } else {
                        bound += coef;
                    }
                }
                None => {}
            }
        }

        let left = self.hint_count.saturating_sub(taken);
        if let Some(budget) = &self.budget {
            if left > 0 {
                if let Some(dual) = budget.dual_bound(values, left) {
                    hinted_part = hinted_part.min(dual);
                }
            }
        }
        bound + hinted_part
    }
}

impl Budget {
    /// The unguarded `<=` over hinted variables with the most terms.
    fn find(model: &Model, hinted: &[bool], hint_vars: &[BoolVar]) -> Option<Self> {
        let c = model
            .constraints()
            .iter()
            .filter(|c| is_hinted_budget(c, hinted))
            .max_by_key(|c| c.terms().len())?;

        let mut weight = vec![0i64; hinted.len()];
        for &(coef, lit) in c.terms() {
            weight[lit.var().index()] += coef;
        }
        let mut profit = vec![0i64; hinted.len()];
        for &(coef, var) in model.objective() {
            profit[var.index()] += coef;
        }
        let items = hint_vars
            .iter()
            .map(|v| (*v, profit[v.index()] as f64, weight[v.index()] as f64))
            .collect();
        Some(Self {
            items,
            capacity: c.rhs(),
        })
    }

    /// Best dual bound on the hinted objective when `left` more hinted
    /// variables must be set. None when too few are open to tell.
    fn dual_bound(&self, values: &[Option<bool>], left: usize) -> Option<i64> {
        let mut room = self.capacity as f64;
        let mut open: Vec<(f64, f64)> = Vec::with_capacity(self.items.len());
        for &(var, profit, weight) in &self.items {
            match values[var.index()] {
                Some(true) => room -= weight,
                Some(false) => {}
                None => open.push((profit, weight)),
            }
        }
        if open.len() < left {
            return None;
        }

        let mut scratch = vec![0.0; open.len()];
        let mut lagrangian = |m: f64| {
            for (slot, (profit, weight)) in scratch.iter_mut().zip(&open) {
                *slot = profit - m * weight;
            }
            scratch.select_nth_unstable_by(left - 1, |a, b| b.total_cmp(a));
            m * room + scratch[..left].iter().sum::<f64>()
        };

        let ceiling = open
            .iter()
            .filter(|(_, weight)| *weight > 0.0)
            .map(|(profit, weight)| profit / weight)
            .fold(0.0, f64::max);
        let mut best = lagrangian(0.0);
        let (mut lo, mut hi) = (0.0, ceiling);
        let ratio = (5f64.sqrt() - 1.0) / 2.0;
        for _ in 0..MULTIPLIER_STEPS {
            let a = hi - ratio * (hi - lo);
            let b = lo + ratio * (hi - lo);
            let (fa, fb) = (lagrangian(a), lagrangian(b));
            best = best.min(fa).min(fb);
            if fa <= fb {
                hi = b;
            } else {
                lo = a;
            }
        }
        // Objective values are integers, so the ceiling stays a valid bound.
        Some((best - 1e-6).ceil() as i64)
    }
}

/// Unguarded `<=` with positive weights over distinct hinted variables.
pub(crate) fn is_hinted_budget(c: &LinearConstraint, hinted: &[bool]) -> bool {
    if c.relation() != Relation::Le || !c.enforcement().is_empty() || c.terms().len() < 2 {
        return false;
    }
    let mut vars = Vec::with_capacity(c.terms().len());
    for &(coef, lit) in c.terms() {
        if coef <= 0 || lit.is_negated() || !hinted.get(lit.var().index()).copied().unwrap_or(false) {
            return false;
        }
        vars.push(lit.var());
    }
    vars.sort_unstable();
    vars.windows(2).all(|w| w[0] != w[1])
}
