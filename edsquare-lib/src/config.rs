use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Caller-level bounds on a crossword repair run.
///
/// Both bounds are checked between passes only. Running out of either one ends the repair with
/// `EdsError::UnrepairableDataSquare`, as if no further progress were possible.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Maximum number of full row and column passes.
    ///
    /// Default: unbounded
    pub max_passes: Option<usize>,

    /// Wall-clock budget for the whole solving loop.
    ///
    /// Default: unbounded
    pub deadline: Option<Duration>,
}

impl SolverConfig {
    pub fn with_max_passes(mut self, max_passes: usize) -> Self {
        self.max_passes = Some(max_passes);
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Whether another pass may start after `passes` passes taking `elapsed` in total.
    pub(crate) fn allows_pass(&self, passes: usize, elapsed: Duration) -> bool {
        self.max_passes.is_none_or(|max_passes| passes < max_passes) && self.deadline.is_none_or(|deadline| elapsed < deadline)
    }
}
