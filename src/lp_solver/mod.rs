//! Linear Programming (LP) solver abstraction layer
//!
//! This module provides a backend-independent model builder for linear and
//! mixed-integer programs, and a [`SolverChain`] that submits a built model to an
//! ordered list of solver backends, falling through to the next one whenever a
//! backend fails.
//!
//! # Type Safety with Branded Types
//!
//! All core types (`VariableId`, `LinearExpression`, `Constraint`, `LPModelBuilder`)
//! use a generic `Brand` type parameter that provides compile-time guarantees:
//!
//! - Variables from one builder cannot be accidentally used with another builder
//! - Constraints are type-checked to ensure they only use variables from their builder
//! - No runtime overhead - the brand is a zero-sized phantom type
//!
//! Use the `lp_model_builder!()` macro to create builders with guaranteed unique brands:
//!
//! ```rust
//! use dietopt::constraint;
//! use dietopt::lp_model_builder;
//! use dietopt::lp_solver::VariableType;
//!
//! let mut builder1 = lp_model_builder!();
//! let mut builder2 = lp_model_builder!();
//!
//! let x = builder1.add_variable("x", VariableType::Continuous, 0.0, 10.0);
//! let y = builder2.add_variable("y", VariableType::Continuous, 0.0, 10.0);
//!
//! // This compiles:
//! builder1.add_constraint(constraint!((x) <= 5.0));
//!
//! // This would NOT compile (type error):
//! // builder1.add_constraint(constraint!((y) <= 5.0));
//! ```
//!
//! # Building and Solving
//!
//! ```rust
//! use dietopt::constraint;
//! use dietopt::lp_model_builder;
//! use dietopt::lp_solver::{OptimisationSense, OptimisationStatus, SolverBackend, VariableType};
//!
//! let mut builder = lp_model_builder!();
//! let x = builder.add_variable("x", VariableType::Continuous, 0.0, f64::INFINITY);
//! let y = builder.add_variable("y", VariableType::Continuous, 0.0, 3.0);
//!
//! builder.add_constraint(constraint!("capacity", (x + y) <= 4.0));
//! builder.set_objective(2.0 * y + x, OptimisationSense::Maximise);
//!
//! let solution = builder.solve_with(SolverBackend::MicroLp, &Default::default()).unwrap();
//! assert_eq!(solution.status, OptimisationStatus::Optimal);
//! assert!((solution.objective_value - 7.0).abs() < 1e-6);
//! ```
//!
//! # Solver Selection
//!
//! The preferred backend can be selected via the `DIETOPT_LP_SOLVER` environment variable:
//! - `"microlp"` - Pure Rust simplex with branch-and-bound (always available)
//! - `"coin_cbc"` or `"cbc"` - Use COIN-OR CBC (requires `coin_cbc` feature)
//! - `"gurobi"` - Use Gurobi (requires `gurobi` feature)
//!
//! The preferred backend is tried first; the remaining compiled backends follow,
//! most capable first, and microlp is the final fallback.

use anyhow::{Result, anyhow};
use std::collections::BTreeMap;
use std::env;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

/// Variable types supported by LP solvers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableType {
    /// Continuous variable (can take any real value within its bounds)
    Continuous,
    /// Binary variable (can only take values 0 or 1)
    Binary,
}

/// Constraint sense for linear constraints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintSense {
    /// Less than or equal to (≤)
    LessEqual,
    /// Equal to (=)
    Equal,
    /// Greater than or equal to (≥)
    GreaterEqual,
}

/// Optimisation direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptimisationSense {
    /// Minimise the objective function
    Minimise,
    /// Maximise the objective function
    Maximise,
}

/// Status of the optimisation process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptimisationStatus {
    /// Optimal solution found
    Optimal,
    /// A solution was found, but the solver stopped before proving optimality
    /// (time limit, reduced numerical confidence)
    OptimalInaccurate,
    /// Problem is infeasible (no solution exists)
    Infeasible,
    /// Problem is unbounded
    Unbounded,
    /// Problem is infeasible or unbounded
    InfeasibleOrUnbounded,
    /// Other status (solver-specific)
    Other(&'static str),
}

impl OptimisationStatus {
    /// Whether the solver produced a usable assignment of the variables.
    pub fn has_solution(self) -> bool {
        matches!(
            self,
            OptimisationStatus::Optimal | OptimisationStatus::OptimalInaccurate
        )
    }
}

/// Available LP solver backends
///
/// Every backend is always nameable; backends whose cargo feature is not compiled
/// in fail with an "unsupported" error when asked to solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SolverBackend {
    /// Gurobi commercial solver
    Gurobi,
    /// Coin CBC open-source solver
    CoinCbc,
    /// microlp pure Rust solver
    MicroLp,
}

impl fmt::Display for SolverBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverBackend::Gurobi => write!(f, "gurobi"),
            SolverBackend::CoinCbc => write!(f, "coin_cbc"),
            SolverBackend::MicroLp => write!(f, "microlp"),
        }
    }
}

impl SolverBackend {
    /// All mixed-integer capable backends, most capable first.
    pub const MIP_CANDIDATES: [SolverBackend; 3] = [
        SolverBackend::Gurobi,
        SolverBackend::CoinCbc,
        SolverBackend::MicroLp,
    ];

    /// Whether the backend was compiled into this build.
    pub fn is_compiled(self) -> bool {
        match self {
            SolverBackend::Gurobi => cfg!(feature = "gurobi"),
            SolverBackend::CoinCbc => cfg!(feature = "coin_cbc"),
            SolverBackend::MicroLp => true,
        }
    }

    /// Parse a backend name as accepted by `DIETOPT_LP_SOLVER`.
    pub fn from_name(name: &str) -> Result<Self> {
        match name.to_lowercase().as_str() {
            "gurobi" => Ok(SolverBackend::Gurobi),
            "coin_cbc" | "coin-cbc" | "cbc" => Ok(SolverBackend::CoinCbc),
            "microlp" | "minilp" => Ok(SolverBackend::MicroLp),
            _ => Err(anyhow!(
                "Invalid solver '{}'. Valid options: gurobi, coin_cbc, microlp",
                name
            )),
        }
    }

    /// Get the preferred solver backend from the `DIETOPT_LP_SOLVER` environment variable
    pub fn from_env() -> Result<Option<Self>> {
        match env::var("DIETOPT_LP_SOLVER") {
            Ok(solver_name) => Self::from_name(&solver_name).map(Some),
            Err(_) => Ok(None),
        }
    }
}

/// Options forwarded to every backend in a solve attempt.
#[derive(Debug, Clone, Default)]
pub struct SolverOptions {
    /// Wall-clock limit for a single backend run.
    pub time_limit: Option<Duration>,
}

/// A linear expression term: coefficient * variable
#[derive(Debug, Clone)]
pub struct LinearTerm<Brand> {
    pub coefficient: f64,
    pub variable: VariableId<Brand>,
}

/// A linear expression: sum of terms plus constant
#[derive(Debug, Clone)]
pub struct LinearExpression<Brand> {
    pub terms: Vec<LinearTerm<Brand>>,
    pub constant: f64,
}

impl<Brand> LinearExpression<Brand> {
    /// Create a new linear expression with a constant term
    pub fn new(constant: f64) -> Self {
        Self {
            terms: Vec::new(),
            constant,
        }
    }

    /// Add a term to the expression
    pub fn add_term(&mut self, coefficient: f64, variable: VariableId<Brand>) {
        self.terms.push(LinearTerm {
            coefficient,
            variable,
        });
    }

    /// Create a linear expression from a single variable
    pub fn from_variable(variable: VariableId<Brand>) -> Self {
        Self {
            terms: vec![LinearTerm {
                coefficient: 1.0,
                variable,
            }],
            constant: 0.0,
        }
    }

    /// Merge repeated variables and drop zero coefficients.
    ///
    /// Terms come back ordered by variable index.
    pub fn compact(&self) -> Vec<(usize, f64)> {
        let mut merged: BTreeMap<usize, f64> = BTreeMap::new();
        for term in &self.terms {
            *merged.entry(term.variable.id).or_insert(0.0) += term.coefficient;
        }
        merged.into_iter().filter(|(_, c)| *c != 0.0).collect()
    }

    /// Evaluate the expression against a full variable assignment.
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.terms.iter().fold(self.constant, |acc, term| {
            acc + term.coefficient * values.get(term.variable.id).copied().unwrap_or(0.0)
        })
    }
}

impl<Brand> From<VariableId<Brand>> for LinearExpression<Brand> {
    fn from(variable: VariableId<Brand>) -> Self {
        Self::from_variable(variable)
    }
}

impl<Brand> FromIterator<(f64, VariableId<Brand>)> for LinearExpression<Brand> {
    fn from_iter<I: IntoIterator<Item = (f64, VariableId<Brand>)>>(iter: I) -> Self {
        let mut expr = LinearExpression::new(0.0);
        for (coefficient, variable) in iter {
            expr.add_term(coefficient, variable);
        }
        expr
    }
}

/// Unique identifier for a variable in the LP model
///
/// The `Brand` type parameter ensures that variables can only be used with the
/// builder that created them. This is enforced at compile time.
pub struct VariableId<Brand> {
    id: usize,
    _brand: PhantomData<fn() -> Brand>,
}

impl<Brand> VariableId<Brand> {
    /// Position of the variable in the builder (and in every solution vector).
    pub fn index(&self) -> usize {
        self.id
    }
}

// Manual trait implementations that don't require Brand to implement anything
impl<Brand> fmt::Debug for VariableId<Brand> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VariableId").field("id", &self.id).finish()
    }
}

impl<Brand> Clone for VariableId<Brand> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<Brand> Copy for VariableId<Brand> {}

impl<Brand> PartialEq for VariableId<Brand> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<Brand> Eq for VariableId<Brand> {}

impl<Brand> std::hash::Hash for VariableId<Brand> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// A linear constraint representation
///
/// Constraints carry an optional name (empty when unnamed) which backends use
/// for their row labels.
///
/// # Examples
///
/// ```rust
/// use dietopt::constraint;
/// use dietopt::lp_model_builder;
/// use dietopt::lp_solver::{Constraint, ConstraintSense, VariableType};
///
/// let mut builder = lp_model_builder!();
/// let x = builder.add_variable("x", VariableType::Continuous, 0.0, 10.0);
/// let y = builder.add_variable("y", VariableType::Continuous, 0.0, 10.0);
///
/// let c = constraint!((x + y) == 10.0);
/// let c = constraint!("budget", (x + y) <= 10.0);
/// let c = Constraint::new("total", x + y, ConstraintSense::Equal, 10.0);
/// ```
#[derive(Debug, Clone)]
pub struct Constraint<Brand> {
    name: Arc<str>,
    expression: LinearExpression<Brand>,
    sense: ConstraintSense,
    rhs: f64,
}

impl<Brand> Constraint<Brand> {
    /// Create a new constraint
    pub fn new(
        name: impl Into<Arc<str>>,
        expression: impl Into<LinearExpression<Brand>>,
        sense: ConstraintSense,
        rhs: f64,
    ) -> Self {
        Self {
            name: name.into(),
            expression: expression.into(),
            sense,
            rhs,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn expression(&self) -> &LinearExpression<Brand> {
        &self.expression
    }

    pub fn sense(&self) -> ConstraintSense {
        self.sense
    }

    pub fn rhs(&self) -> f64 {
        self.rhs
    }

    /// Check the constraint against an assignment, with a tolerance relative to
    /// the magnitude of the right-hand side.
    pub fn is_satisfied(&self, values: &[f64], tolerance: f64) -> bool {
        let lhs = self.expression.evaluate(values);
        let slack = tolerance * self.rhs.abs().max(1.0);
        match self.sense {
            ConstraintSense::LessEqual => lhs <= self.rhs + slack,
            ConstraintSense::Equal => (lhs - self.rhs).abs() <= slack,
            ConstraintSense::GreaterEqual => lhs >= self.rhs - slack,
        }
    }
}

/// Variable information stored in the model
#[derive(Debug, Clone)]
struct VariableInfo {
    name: Arc<str>,
    var_type: VariableType,
    lower_bound: f64,
    upper_bound: f64,
}

/// Objective function information
#[derive(Debug, Clone)]
struct ObjectiveInfo<Brand> {
    expression: LinearExpression<Brand>,
    sense: OptimisationSense,
}

/// Result of solving an LP model
#[derive(Clone)]
pub struct LPSolution<Brand> {
    pub status: OptimisationStatus,
    pub objective_value: f64,
    variable_values: Vec<f64>,
    _brand: PhantomData<fn() -> Brand>,
}

impl<Brand> fmt::Debug for LPSolution<Brand> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LPSolution")
            .field("status", &self.status)
            .field("objective_value", &self.objective_value)
            .field("variable_values", &self.variable_values)
            .finish()
    }
}

impl<Brand> LPSolution<Brand> {
    pub(crate) fn new(status: OptimisationStatus, objective_value: f64, variable_values: Vec<f64>) -> Self {
        Self {
            status,
            objective_value,
            variable_values,
            _brand: PhantomData,
        }
    }

    /// A solution without variable values, for statuses that carry none.
    fn empty(status: OptimisationStatus, num_vars: usize) -> Self {
        Self::new(status, 0.0, vec![0.0; num_vars])
    }

    /// Get the value of a variable from the solution
    pub fn get_value(&self, var_id: VariableId<Brand>) -> Option<f64> {
        self.variable_values.get(var_id.id).copied()
    }

    /// The raw solution vector, indexed by variable position.
    pub fn values(&self) -> &[f64] {
        &self.variable_values
    }
}

/// Builder for LP models that can work with different backends
///
/// The `Brand` type parameter ensures type safety - variables from one builder
/// cannot be accidentally used with another builder. This is enforced at compile time.
pub struct LPModelBuilder<Brand> {
    variables: Vec<VariableInfo>,
    constraints: Vec<Constraint<Brand>>,
    objective: Option<ObjectiveInfo<Brand>>,
    _brand: PhantomData<fn() -> Brand>,
}

impl<Brand> LPModelBuilder<Brand> {
    /// Create a new LP model builder
    pub fn new() -> Self {
        Self {
            variables: Vec::new(),
            constraints: Vec::new(),
            objective: None,
            _brand: PhantomData,
        }
    }

    /// Add a variable to the model
    pub fn add_variable(
        &mut self,
        name: impl Into<Arc<str>>,
        var_type: VariableType,
        lower_bound: f64,
        upper_bound: f64,
    ) -> VariableId<Brand> {
        let var_id = VariableId {
            id: self.variables.len(),
            _brand: PhantomData,
        };
        self.variables.push(VariableInfo {
            name: name.into(),
            var_type,
            lower_bound,
            upper_bound,
        });
        var_id
    }

    /// Add a constraint to the model
    pub fn add_constraint(&mut self, constraint: Constraint<Brand>) {
        self.constraints.push(constraint);
    }

    /// Set the objective function
    pub fn set_objective(&mut self, expression: LinearExpression<Brand>, sense: OptimisationSense) {
        self.objective = Some(ObjectiveInfo { expression, sense });
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn constraints(&self) -> &[Constraint<Brand>] {
        &self.constraints
    }

    /// Find a constraint by name
    pub fn constraint(&self, name: &str) -> Option<&Constraint<Brand>> {
        self.constraints.iter().find(|c| c.name() == name)
    }

    /// Whether any variable requires integrality
    pub fn is_mixed_integer(&self) -> bool {
        self.variables
            .iter()
            .any(|v| v.var_type == VariableType::Binary)
    }

    /// Solve the model with a single backend
    pub fn solve_with(
        &self,
        backend: SolverBackend,
        options: &SolverOptions,
    ) -> Result<LPSolution<Brand>> {
        match backend {
            SolverBackend::MicroLp => microlp::solve_microlp(self, options),

            #[cfg(feature = "coin_cbc")]
            SolverBackend::CoinCbc => coin_cbc::solve_coin_cbc(self, options),

            #[cfg(feature = "gurobi")]
            SolverBackend::Gurobi => gurobi::solve_gurobi(self, options),

            #[allow(unreachable_patterns)]
            other => Err(anyhow!(
                "{} solver requested but the {} feature is not enabled",
                other,
                other
            )),
        }
    }
}

impl<Brand> Default for LPModelBuilder<Brand> {
    fn default() -> Self {
        Self::new()
    }
}

// Macros for convenient syntax
pub mod macros;

// Operator overloading for linear expressions
pub mod ops;

mod chain;
pub use chain::{SolveOutcome, SolverChain, SolverFailure};

pub mod microlp;

#[cfg(feature = "gurobi")]
pub mod gurobi;

#[cfg(feature = "coin_cbc")]
pub mod coin_cbc;

#[cfg(feature = "coin_cbc")]
pub mod output_suppression;
