//! Step gating: which steps are completed, which were submitted, and which
//! one is active.

use std::{collections::BTreeSet, fmt};

use log::debug;
use serde::Serialize;

use crate::models::STEP_COUNT;

/// Display status of one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepStatus {
    NotStarted,
    Active,
    Completed,
}

impl StepStatus {
    /// Status with its icon, for markdown output.
    pub fn with_icon(&self) -> &'static str {
        match self {
            StepStatus::Completed => "✓ Completed",
            StepStatus::Active => "➤ Active",
            StepStatus::NotStarted => "○ Not started",
        }
    }
}

/// Why a navigation request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockReason {
    /// `Next` before the active step's section was saved
    NotSubmitted,
    /// Skipping ahead past the step after the furthest completed one
    NotReachable,
    /// No such step
    OutOfRange,
}

impl fmt::Display for BlockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockReason::NotSubmitted => write!(f, "save this step before moving on"),
            BlockReason::NotReachable => write!(f, "finish the earlier steps first"),
            BlockReason::OutOfRange => write!(f, "there is no such step"),
        }
    }
}

/// Result of a navigation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Moved { from: usize, to: usize },
    /// Legal request that left the active step where it was
    Stayed(usize),
    Blocked {
        requested: usize,
        active: usize,
        reason: BlockReason,
    },
}

impl Navigation {
    pub fn is_blocked(&self) -> bool {
        matches!(self, Navigation::Blocked { .. })
    }
}

/// The wizard's navigation state machine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepController {
    completed: BTreeSet<usize>,
    submitted: BTreeSet<usize>,
    active: usize,
}

impl StepController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derives the state of a freshly loaded aggregate: every step with data
    /// is completed and submitted, and the first step without data is
    /// active (the last step when all have data).
    pub fn seeded(with_data: impl IntoIterator<Item = usize>) -> Self {
        let persisted: BTreeSet<usize> = with_data.into_iter().filter(|step| *step < STEP_COUNT).collect();
        let active = (0..STEP_COUNT)
            .find(|step| !persisted.contains(step))
            .unwrap_or(STEP_COUNT - 1);
        Self {
            completed: persisted.clone(),
            submitted: persisted,
            active,
        }
    }

    /// Folds in steps a refresh of the same aggregate reports as persisted,
    /// leaving the active step alone.
    pub fn merge_persisted(&mut self, with_data: impl IntoIterator<Item = usize>) {
        for step in with_data.into_iter().filter(|step| *step < STEP_COUNT) {
            self.completed.insert(step);
            self.submitted.insert(step);
        }
    }

    /// Records a successful save of a step's section. This is the only way a
    /// step becomes completed.
    pub fn mark_submitted(&mut self, step: usize) {
        if step < STEP_COUNT {
            self.completed.insert(step);
            self.submitted.insert(step);
        }
    }

    /// Moves to the next step once the active one has been submitted.
    pub fn advance(&mut self) -> Navigation {
        let from = self.active;
        if !self.submitted.contains(&from) {
            debug!("Next from step {from} refused: not submitted");
            return Navigation::Blocked {
                requested: from + 1,
                active: from,
                reason: BlockReason::NotSubmitted,
            };
        }

        self.completed.insert(from);
        if from + 1 >= STEP_COUNT {
            return Navigation::Stayed(from);
        }
        self.active = from + 1;
        Navigation::Moved {
            from,
            to: self.active,
        }
    }

    /// Whether the step selector may jump to `step`.
    pub fn can_select(&self, step: usize) -> bool {
        step < STEP_COUNT
            && (self.completed.contains(&step)
                || step == self.active
                || step <= self.furthest_reachable())
    }

    /// The step after the furthest completed one (step 0 when none is).
    fn furthest_reachable(&self) -> usize {
        self.completed.iter().next_back().map_or(0, |max| max + 1)
    }

    /// Jumps directly to `step` when allowed.
    pub fn select(&mut self, step: usize) -> Navigation {
        let from = self.active;
        if !self.can_select(step) {
            let reason = if step >= STEP_COUNT {
                BlockReason::OutOfRange
            } else {
                BlockReason::NotReachable
            };
            debug!("Selecting step {step} from {from} refused: {reason}");
            return Navigation::Blocked {
                requested: step,
                active: from,
                reason,
            };
        }
        if step == from {
            return Navigation::Stayed(from);
        }
        self.active = step;
        Navigation::Moved { from, to: step }
    }

    pub fn active(&self) -> usize {
        self.active
    }

    pub fn is_completed(&self, step: usize) -> bool {
        self.completed.contains(&step)
    }

    pub fn is_submitted(&self, step: usize) -> bool {
        self.submitted.contains(&step)
    }

    pub fn completed(&self) -> impl Iterator<Item = usize> + '_ {
        self.completed.iter().copied()
    }

    pub fn completed_count(&self) -> usize {
        self.completed.len()
    }

    /// True once every step is completed.
    pub fn all_completed(&self) -> bool {
        self.completed.len() == STEP_COUNT
    }

    pub fn status(&self, step: usize) -> StepStatus {
        if step == self.active {
            StepStatus::Active
        } else if self.completed.contains(&step) {
            StepStatus::Completed
        } else {
            StepStatus::NotStarted
        }
    }
}
