//! Bounds propagation over half-reified linear constraints.

use super::Search;
use crate::model::{Literal, Relation};

/// Constraint proven unsatisfiable under the current assignment.
#[derive(Debug, Clone, Copy)]
pub(super) struct Conflict;

impl Search<'_> {
    /// Runs the queue to fixpoint. False on conflict.
    pub(super) fn propagate(&mut self) -> bool {
        while let Some(ci) = self.queue.pop_front() {
            self.queued[ci as usize] = false;
            if self.propagate_constraint(ci as usize).is_err() {
                self.clear_queue();
                return false;
            }
        }
        true
    }

    /// Makes `lit` true, or reports a conflict if it is already false.
    fn set_true(&mut self, lit: Literal) -> Result<(), Conflict> {
        match self.lit_value(lit) {
            Some(true) => Ok(()),
            Some(false) => Err(Conflict),
            None => {
                self.stats.record_propagation();
                self.assign(lit.var(), lit.satisfying_value());
                Ok(())
            }
        }
    }

    /// Budget rows over hinted variables must leave room for the cheapest
    /// way to reach the hinted count. Every open variable that would not
    /// leave that room is fixed false.
    fn reserve_completion(&mut self, ci: usize, fixed: i64, hi: i64) -> Result<(), Conflict> {
        let Some(terms) = self.budgets[ci].as_ref() else {
            return Ok(());
        };
        let open_inside = terms.iter().filter(|(_, lit)| self.lit_value(*lit).is_none()).count();
        let needed = self
            .hints
            .remaining()
            .saturating_sub(self.hints.open().saturating_sub(open_inside));
        if needed == 0 {
            return Ok(());
        }
        if needed > open_inside {
            return Err(Conflict);
        }

        let mut reserve = 0i64;
        let mut largest_reserved = 0i64;
        let mut reserved = 0usize;
        let mut cut = None;
        for (i, &(coef, lit)) in terms.iter().enumerate() {
            if self.lit_value(lit).is_some() {
                continue;
            }
            if reserved < needed {
                reserve += coef;
                largest_reserved = coef;
                reserved += 1;
            } else if fixed + reserve - largest_reserved + coef > hi {
                cut = Some(i);
                break;
            }
        }
        if fixed + reserve > hi {
            return Err(Conflict);
        }
        let Some(cut) = cut else {
            return Ok(());
        };
        // Terms are sorted by weight, so everything past the cut is too heavy.
        let heavy: Vec<Literal> = terms[cut..]
            .iter()
            .map(|&(_, lit)| lit)
            .filter(|lit| self.lit_value(*lit).is_none())
            .collect();
        for lit in heavy {
            self.set_true(!lit)?;
        }
        Ok(())
    }

    fn propagate_constraint(&mut self, ci: usize) -> Result<(), Conflict> {
        let model = self.model;
        let c = &model.constraints()[ci];

        let mut open_guard = None;
        let mut open_guards = 0;
        for &lit in c.enforcement() {
            match self.lit_value(lit) {
                Some(false) => return Ok(()),
                Some(true) => {}
                None => {
                    open_guards += 1;
                    open_guard = Some(lit);
                }
            }
        }

        let mut min = 0i64;
        let mut max = 0i64;
        let mut fixed = 0i64;
        let mut open_terms = 0usize;
        let mut last_open = None;
        for &(coef, lit) in c.terms() {
            match self.lit_value(lit) {
                Some(true) => {
                    min += coef;
                    max += coef;
                    fixed += coef;
                }
                Some(false) => {}
                None => {
                    if coef > 0 {
                        max += coef;
                    } else {
                        min += coef;
                    }
                    open_terms += 1;
                    last_open = Some((coef, lit));
                }
            }
        }

        let rhs = c.rhs();
        let (lo, hi) = match c.relation() {
            Relation::Le => (None, Some(rhs)),
            Relation::Ge => (Some(rhs), None),
            Relation::Eq => (Some(rhs), Some(rhs)),
            Relation::Ne => (None, None),
        };
        let violated = match c.relation() {
            Relation::Ne => open_terms == 0 && fixed == rhs,
            _ => lo.is_some_and(|lo| max < lo) || hi.is_some_and(|hi| min > hi),
        };

        if violated {
            return match (open_guards, open_guard) {
                (0, _) => Err(Conflict),
                (1, Some(guard)) => self.set_true(!guard),
                _ => Ok(()),
            };
        }
        if open_guards > 0 || open_terms == 0 {
            return Ok(());
        }
        if let Some(hi) = hi {
            if self.budgets[ci].is_some() {
                self.reserve_completion(ci, min, hi)?;
            }
        }

        if c.relation() == Relation::Ne {
            if let (1, Some((coef, lit))) = (open_terms, last_open) {
                if fixed + coef == rhs {
                    self.set_true(!lit)?;
                } else if fixed == rhs {
                    self.set_true(lit)?;
                }
            }
            return Ok(());
        }

        for &(coef, lit) in c.terms() {
            if self.lit_value(lit).is_some() {
                continue;
            }
            if let Some(hi) = hi {
                if coef > 0 && min + coef > hi {
                    self.set_true(!lit)?;
                } else if coef < 0 && min - coef > hi {
                    self.set_true(lit)?;
                }
            }
            if let Some(lo) = lo {
                if coef > 0 && max - coef < lo {
                    self.set_true(lit)?;
                } else if coef < 0 && max + coef < lo {
                    self.set_true(!lit)?;
                }
            }
        }
        Ok(())
    }
}
