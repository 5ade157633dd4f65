//! Boolean constraint model.
//!
//! A model is a set of boolean variables, linear constraints over literals
//! (each optionally half-reified by enforcement literals) and an optional
//! linear objective to maximize.

use std::fmt;
use std::ops::Not;

use smallvec::SmallVec;
use thiserror::Error;

/// Malformed model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("constraint {constraint} references unknown variable {var}")]
    UnknownVariable { constraint: usize, var: usize },

    #[error("objective references unknown variable {0}")]
    UnknownObjectiveVariable(usize),

    #[error("constraint {0} overflows its activity range")]
    Overflow(usize),

    #[error("branching references unknown variable {0}")]
    UnknownBranchVariable(usize),

    #[error("cardinality hint of {count} exceeds its {vars} variables")]
    BadCardinality { count: usize, vars: usize },
}

/// A boolean decision variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BoolVar(pub(crate) u32);

impl BoolVar {
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// The literal that is true when this variable is true.
    pub fn lit(self) -> Literal {
        Literal {
            var: self,
            negated: false,
        }
    }
}

impl Not for BoolVar {
    type Output = Literal;

    fn not(self) -> Literal {
        Literal {
            var: self,
            negated: true,
        }
    }
}

impl From<BoolVar> for Literal {
    fn from(var: BoolVar) -> Self {
        var.lit()
    }
}

/// A variable or its negation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Literal {
    var: BoolVar,
    negated: bool,
}

impl Literal {
    pub fn var(self) -> BoolVar {
        self.var
    }

    pub fn is_negated(self) -> bool {
        self.negated
    }

    /// Truth of this literal when its variable takes `value`.
    pub fn holds(self, value: bool) -> bool {
        value != self.negated
    }

    /// Variable value that makes this literal true.
    pub fn satisfying_value(self) -> bool {
        !self.negated
    }
}

impl Not for Literal {
    type Output = Literal;

    fn not(self) -> Literal {
        Literal {
            var: self.var,
            negated: !self.negated,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negated {
            write!(f, "!v{}", self.var.0)
        } else {
            write!(f, "v{}", self.var.0)
        }
    }
}

/// Comparison between a linear expression and its right-hand side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Le,
    Ge,
    Eq,
    Ne,
}

/// Weighted sum of literals.
///
/// ```
/// use rosterforge_solver::{LinearExpr, Model};
///
/// let mut model = Model::new();
/// let a = model.new_bool_var("a");
/// let b = model.new_bool_var("b");
///
/// let expr = LinearExpr::sum([a, b]);
/// model.add(expr.le(1));
/// assert_eq!(model.constraints().len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct LinearExpr {
    terms: Vec<(i64, Literal)>,
}

impl LinearExpr {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unit-weight sum.
    pub fn sum<L: Into<Literal>>(lits: impl IntoIterator<Item = L>) -> Self {
        Self {
            terms: lits.into_iter().map(|l| (1, l.into())).collect(),
        }
    }

    pub fn weighted<L: Into<Literal>>(terms: impl IntoIterator<Item = (i64, L)>) -> Self {
        Self {
            terms: terms.into_iter().map(|(c, l)| (c, l.into())).collect(),
        }
    }

    pub fn add_term(&mut self, coef: i64, lit: impl Into<Literal>) {
        self.terms.push((coef, lit.into()));
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn le(self, rhs: i64) -> LinearConstraint {
        LinearConstraint::new(self.terms, Relation::Le, rhs)
    }

    pub fn ge(self, rhs: i64) -> LinearConstraint {
        LinearConstraint::new(self.terms, Relation::Ge, rhs)
    }

    pub fn eq(self, rhs: i64) -> LinearConstraint {
        LinearConstraint::new(self.terms, Relation::Eq, rhs)
    }

    pub fn ne(self, rhs: i64) -> LinearConstraint {
        LinearConstraint::new(self.terms, Relation::Ne, rhs)
    }
}

/// `terms <relation> rhs`, active only while every enforcement literal holds.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearConstraint {
    pub(crate) terms: Vec<(i64, Literal)>,
    pub(crate) relation: Relation,
    pub(crate) rhs: i64,
    pub(crate) enforcement: SmallVec<[Literal; 2]>,
}

impl LinearConstraint {
    pub fn new(terms: Vec<(i64, Literal)>, relation: Relation, rhs: i64) -> Self {
        Self {
            terms,
            relation,
            rhs,
            enforcement: SmallVec::new(),
        }
    }

    /// Adds enforcement literals (`OnlyEnforceIf`).
    pub fn only_enforce_if(&mut self, lits: &[Literal]) -> &mut Self {
        self.enforcement.extend_from_slice(lits);
        self
    }

    pub fn terms(&self) -> &[(i64, Literal)] {
        &self.terms
    }

    pub fn relation(&self) -> Relation {
        self.relation
    }

    pub fn rhs(&self) -> i64 {
        self.rhs
    }

    pub fn enforcement(&self) -> &[Literal] {
        &self.enforcement
    }

    /// Evaluates the constraint against a complete assignment.
    pub fn is_satisfied(&self, value: impl Fn(BoolVar) -> bool) -> bool {
        if !self.enforcement.iter().all(|l| l.holds(value(l.var()))) {
            return true;
        }
        let activity: i64 = self
            .terms
            .iter()
            .filter(|(_, l)| l.holds(value(l.var())))
            .map(|(c, _)| c)
            .sum();
        match self.relation {
            Relation::Le => activity <= self.rhs,
            Relation::Ge => activity >= self.rhs,
            Relation::Eq => activity == self.rhs,
            Relation::Ne => activity != self.rhs,
        }
    }
}

/// A boolean constraint model.
#[derive(Debug, Clone, Default)]
pub struct Model {
    names: Vec<String>,
    constraints: Vec<LinearConstraint>,
    objective: Vec<(i64, BoolVar)>,
    cardinality: Option<(Vec<BoolVar>, usize)>,
    branch_order: Vec<(BoolVar, bool)>,
    triggered: Vec<TriggeredBranch>,
}

/// Variables branched ahead of the static order while `trigger` holds.
#[derive(Debug, Clone)]
pub(crate) struct TriggeredBranch {
    pub(crate) trigger: Literal,
    pub(crate) vars: Vec<BoolVar>,
    pub(crate) first: bool,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_bool_var(&mut self, name: impl Into<String>) -> BoolVar {
        let var = BoolVar(self.names.len() as u32);
        self.names.push(name.into());
        var
    }

    pub fn num_vars(&self) -> usize {
        self.names.len()
    }

    pub fn var_name(&self, var: BoolVar) -> &str {
        self.names.get(var.index()).map_or("", String::as_str)
    }

    pub fn constraints(&self) -> &[LinearConstraint] {
        &self.constraints
    }

    /// Adds a constraint and returns it for chaining enforcement literals.
    pub fn add(&mut self, constraint: LinearConstraint) -> &mut LinearConstraint {
        self.constraints.push(constraint);
        let last = self.constraints.len() - 1;
        &mut self.constraints[last]
    }

    /// At least one literal holds.
    pub fn add_bool_or(&mut self, lits: &[Literal]) -> &mut LinearConstraint {
        self.add(LinearExpr::sum(lits.iter().copied()).ge(1))
    }

    /// Every literal holds.
    pub fn add_bool_and(&mut self, lits: &[Literal]) -> &mut LinearConstraint {
        let n = lits.len() as i64;
        self.add(LinearExpr::sum(lits.iter().copied()).ge(n))
    }

    /// `a => b`.
    pub fn add_implication(&mut self, a: Literal, b: Literal) {
        self.add(LinearExpr::sum([b]).ge(1)).only_enforce_if(&[a]);
    }

    pub fn add_at_most_one(&mut self, lits: &[Literal]) -> &mut LinearConstraint {
        self.add(LinearExpr::sum(lits.iter().copied()).le(1))
    }

    pub fn add_exactly(&mut self, lits: &[Literal], count: i64) -> &mut LinearConstraint {
        self.add(LinearExpr::sum(lits.iter().copied()).eq(count))
    }

    /// Pins a variable to a value.
    pub fn fix(&mut self, var: BoolVar, value: bool) {
        let lit = if value { var.lit() } else { !var };
        self.add(LinearExpr::sum([lit]).ge(1));
    }

    /// Sets the objective to maximize. Replaces any previous objective.
    pub fn maximize(&mut self, terms: Vec<(i64, BoolVar)>) {
        self.objective = terms;
    }

    pub fn objective(&self) -> &[(i64, BoolVar)] {
        &self.objective
    }

    pub fn has_objective(&self) -> bool {
        !self.objective.is_empty()
    }

    /// Declares that exactly `count` of `vars` are true in every solution.
    ///
    /// The search trusts the hint: it tightens the objective bound and lets
    /// positive-weight `<=` constraints over hinted variables reserve room
    /// for the cheapest completion.
    pub fn cardinality_hint(&mut self, vars: Vec<BoolVar>, count: usize) {
        self.cardinality = Some((vars, count));
    }

    pub(crate) fn cardinality(&self) -> Option<&(Vec<BoolVar>, usize)> {
        self.cardinality.as_ref()
    }

    /// Appends variables to the branching order, tried with `first` before
    /// the opposite value. Unlisted variables are branched last, false first.
    pub fn branch_priority(&mut self, vars: impl IntoIterator<Item = BoolVar>, first: bool) {
        self.branch_order.extend(vars.into_iter().map(|v| (v, first)));
    }

    pub(crate) fn branch_order(&self) -> &[(BoolVar, bool)] {
        &self.branch_order
    }

    /// Once `trigger` holds, branches on `vars` (in the given order, `first`
    /// value first) before resuming the static order. Earlier registrations
    /// take precedence.
    pub fn branch_when(&mut self, trigger: Literal, vars: impl IntoIterator<Item = BoolVar>, first: bool) {
        self.triggered.push(TriggeredBranch {
            trigger,
            vars: vars.into_iter().collect(),
            first,
        });
    }

    pub(crate) fn triggered_branches(&self) -> &[TriggeredBranch] {
        &self.triggered
    }

    /// Evaluates every constraint against a complete assignment.
    pub fn is_satisfied(&self, value: impl Fn(BoolVar) -> bool + Copy) -> bool {
        self.constraints.iter().all(|c| c.is_satisfied(value))
    }

    /// Objective value of a complete assignment.
    pub fn objective_value(&self, value: impl Fn(BoolVar) -> bool) -> i64 {
        self.objective
            .iter()
            .filter(|(_, v)| value(*v))
            .map(|(c, _)| c)
            .sum()
    }

    /// Checks variable references and coefficient ranges.
    pub fn validate(&self) -> Result<(), ModelError> {
        let n = self.num_vars();
        for (i, c) in self.constraints.iter().enumerate() {
            let mut magnitude: i64 = 0;
            for (coef, lit) in &c.terms {
                if lit.var().index() >= n {
                    return Err(ModelError::UnknownVariable {
                        constraint: i,
                        var: lit.var().index(),
                    });
                }
                magnitude = magnitude
                    .checked_add(coef.checked_abs().ok_or(ModelError::Overflow(i))?)
                    .ok_or(ModelError::Overflow(i))?;
            }
            if magnitude.checked_add(c.rhs.checked_abs().ok_or(ModelError::Overflow(i))?).is_none() {
                return Err(ModelError::Overflow(i));
            }
            if let Some(lit) = c.enforcement.iter().find(|l| l.var().index() >= n) {
                return Err(ModelError::UnknownVariable {
                    constraint: i,
                    var: lit.var().index(),
                });
            }
        }
        if let Some((_, var)) = self.objective.iter().find(|(_, v)| v.index() >= n) {
            return Err(ModelError::UnknownObjectiveVariable(var.index()));
        }
        for branch in &self.triggered {
            if let Some(var) = std::iter::once(branch.trigger.var())
                .chain(branch.vars.iter().copied())
                .find(|v| v.index() >= n)
            {
                return Err(ModelError::UnknownBranchVariable(var.index()));
            }
        }
        if let Some((vars, count)) = &self.cardinality {
            if *count > vars.len() {
                return Err(ModelError::BadCardinality {
                    count: *count,
                    vars: vars.len(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_negation() {
        let mut model = Model::new();
        let a = model.new_bool_var("a");

        assert!(a.lit().holds(true));
        assert!((!a).holds(false));
        assert_eq!(!!a.lit(), a.lit());
        assert_eq!((!a).to_string(), "!v0");
    }

    #[test]
    fn test_constraint_evaluation_respects_enforcement() {
        let mut model = Model::new();
        let a = model.new_bool_var("a");
        let b = model.new_bool_var("b");
        let guard = model.new_bool_var("guard");
        model
            .add(LinearExpr::sum([a, b]).eq(2))
            .only_enforce_if(&[guard.lit()]);

        let values = [true, false, false];
        assert!(model.is_satisfied(|v| values[v.index()]));
        let values = [true, false, true];
        assert!(!model.is_satisfied(|v| values[v.index()]));
    }

    #[test]
    fn test_validate_rejects_foreign_variable() {
        let mut model = Model::new();
        let _ = model.new_bool_var("a");
        model.add(LinearExpr::sum([BoolVar(5)]).le(1));

        assert_eq!(
            model.validate(),
            Err(ModelError::UnknownVariable {
                constraint: 0,
                var: 5
            })
        );
    }

    #[test]
    fn test_objective_value() {
        let mut model = Model::new();
        let a = model.new_bool_var("a");
        let b = model.new_bool_var("b");
        model.maximize(vec![(300, a), (-50, b)]);

        assert_eq!(model.objective_value(|_| true), 250);
        assert_eq!(model.objective_value(|v| v == a), 300);
    }
}
