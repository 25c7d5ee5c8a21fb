use arg_core::errors::{ArgError, ErrorInfo};
use arg_core::ArgRng;

/// Attempts spent by rejection sampling before a move gives up.
pub const DEFAULT_RETRY_BUDGET: usize = 10_000;

/// Bounded rejection sampler over random graph locations.
///
/// `draw` proposes one random tuple per attempt and returns `Ok(None)` when it
/// fails the move's precondition. Exhausting the budget is a recoverable
/// [`ArgError::NoValidMove`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandidateSelector {
    budget: usize,
}

impl Default for CandidateSelector {
    fn default() -> Self {
        Self::new(DEFAULT_RETRY_BUDGET)
    }
}

impl CandidateSelector {
    /// Creates a selector with the given attempt budget.
    pub fn new(budget: usize) -> Self {
        Self { budget }
    }

    /// Attempt budget.
    pub fn budget(&self) -> usize {
        self.budget
    }

    /// Draws until `draw` yields a candidate or the budget runs out.
    pub fn select<T>(
        &self,
        rng: &mut dyn ArgRng,
        what: &str,
        mut draw: impl FnMut(&mut dyn ArgRng) -> Result<Option<T>, ArgError>,
    ) -> Result<T, ArgError> {
        for attempt in 0..self.budget {
            if let Some(found) = draw(&mut *rng)? {
                tracing::trace!(what, attempts = attempt + 1, "candidate found");
                return Ok(found);
            }
        }
        tracing::warn!(what, budget = self.budget, "retry budget exhausted");
        Err(ArgError::NoValidMove(
            ErrorInfo::new("retry-budget-exhausted", "no valid candidate within the budget")
                .with_context("move", what)
                .with_context("attempts", self.budget.to_string()),
        ))
    }
}
