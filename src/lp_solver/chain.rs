//! Ordered solver fallback.
//!
//! A [`SolverChain`] hands one model to each candidate backend in turn. A backend
//! "fails" when it errors (feature not compiled, licence missing, numerical
//! breakdown), panics, or reports a status it cannot classify; the failure is
//! recorded and the next candidate runs. Infeasible and unbounded results are
//! answers, not failures, and end the chain.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use anyhow::{Result, anyhow};
use tracing::{debug, info, warn};

use super::{LPModelBuilder, LPSolution, OptimisationStatus, SolverBackend, SolverOptions};
use crate::AppError;

/// Why one backend in the chain did not produce an answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolverFailure {
    pub backend: SolverBackend,
    pub reason: String,
}

impl fmt::Display for SolverFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.backend, self.reason)
    }
}

/// The answer of the first backend that ran to completion.
pub struct SolveOutcome<Brand> {
    pub backend: SolverBackend,
    pub solution: LPSolution<Brand>,
    /// Failures of the backends tried before `backend`, in order.
    pub failures: Vec<SolverFailure>,
}

impl<Brand> fmt::Debug for SolveOutcome<Brand> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SolveOutcome")
            .field("backend", &self.backend)
            .field("solution", &self.solution)
            .field("failures", &self.failures)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct SolverChain {
    candidates: Vec<SolverBackend>,
    fallback: SolverBackend,
    options: SolverOptions,
}

impl SolverChain {
    pub fn new(candidates: Vec<SolverBackend>, fallback: SolverBackend) -> Self {
        Self {
            candidates,
            fallback,
            options: SolverOptions::default(),
        }
    }

    /// Compiled mixed-integer backends, most capable first, with the
    /// `DIETOPT_LP_SOLVER` preference moved to the front.
    pub fn from_env() -> Result<Self> {
        let preferred = SolverBackend::from_env()?;

        let mut candidates: Vec<SolverBackend> = preferred.into_iter().collect();
        candidates.extend(
            SolverBackend::MIP_CANDIDATES
                .into_iter()
                .filter(|backend| backend.is_compiled() && Some(*backend) != preferred),
        );

        Ok(Self::new(candidates, SolverBackend::MicroLp))
    }

    pub fn with_options(mut self, options: SolverOptions) -> Self {
        self.options = options;
        self
    }

    pub fn candidates(&self) -> &[SolverBackend] {
        &self.candidates
    }

    /// Solve `builder` with the first backend that does not fail.
    ///
    /// When every candidate and the fallback have failed, the error is an
    /// [`AppError::SolverChainExhausted`] listing each failure.
    pub fn solve<Brand>(&self, builder: &LPModelBuilder<Brand>) -> Result<SolveOutcome<Brand>> {
        debug!(mixed_integer = builder.is_mixed_integer(), "solving model");
        self.solve_using(|backend| builder.solve_with(backend, &self.options))
    }

    /// Walk the chain, running each backend through `run`.
    pub(crate) fn solve_using<Brand>(
        &self,
        mut run: impl FnMut(SolverBackend) -> Result<LPSolution<Brand>>,
    ) -> Result<SolveOutcome<Brand>> {
        let mut failures = Vec::new();

        let fallback = Some(self.fallback).filter(|backend| !self.candidates.contains(backend));

        for backend in self.candidates.iter().copied().chain(fallback) {
            debug!(%backend, "attempting solve");

            match attempt(|| run(backend)) {
                Ok(solution) => {
                    info!(%backend, status = ?solution.status, "solver finished");
                    return Ok(SolveOutcome {
                        backend,
                        solution,
                        failures,
                    });
                }
                Err(err) => {
                    warn!(%backend, error = %err, "solver failed, trying next candidate");
                    failures.push(SolverFailure {
                        backend,
                        reason: format!("{:#}", err),
                    });
                }
            }
        }

        Err(AppError::SolverChainExhausted(failures).into())
    }
}

/// One backend run, with panics and unclassified statuses turned into errors.
fn attempt<Brand>(run: impl FnOnce() -> Result<LPSolution<Brand>>) -> Result<LPSolution<Brand>> {
    let solution = panic::catch_unwind(AssertUnwindSafe(run))
        .map_err(|payload| anyhow!("solver panicked: {}", panic_message(payload.as_ref())))??;

    if let OptimisationStatus::Other(status) = solution.status {
        return Err(anyhow!("unrecognised solver status: {}", status));
    }

    Ok(solution)
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}
