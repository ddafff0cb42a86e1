#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! The undo log behind chronological backtracking.
//!
//! Every change the search makes to its working state is recorded as a
//! [`Step`]. Backtracking pops steps back to a checkpoint and reverses them
//! in LIFO order, which restores clause contents (including literal order)
//! and the assignment exactly as they were.

use crate::sat::assignment::VarState;
use crate::sat::literal::{Literal, Variable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    /// A variable was given a value; `previous` is what it held before.
    Assigned { var: Variable, previous: VarState },
    /// A clause became satisfied and left the working set.
    Satisfied { clause: usize },
    /// One occurrence of a falsified literal was removed from a clause.
    Struck {
        clause: usize,
        position: usize,
        literal: Literal,
    },
}

/// Position in the trail to backtrack to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Checkpoint(usize);

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Trail {
    steps: Vec<Step>,
}

impl Trail {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            steps: Vec::with_capacity(capacity),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn push(&mut self, step: Step) {
        self.steps.push(step);
    }

    #[must_use]
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint(self.steps.len())
    }

    /// Pops the most recent step, unless that would cross `mark`.
    pub fn pop_to(&mut self, mark: Checkpoint) -> Option<Step> {
        if self.steps.len() > mark.0 {
            self.steps.pop()
        } else {
            None
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Step> {
        self.steps.iter()
    }
}
