//! Solve session state machine.
//!
//! ```text
//! Idle --request--> AwaitingSolution --empty--> Idle
//!                                    --moves--> SolutionReady --confirm--> Executing
//!                                    --failed-> Idle
//! Executing --applied (more left)--> Executing
//! Executing --applied (last) | completed | cancel | abort--> Idle
//! ```
//!
//! The session never talks to the backend. [`crate::App`] drives it and
//! performs the requests it asks for, so every transition here is
//! synchronous and can be exercised exhaustively in tests.

use tubesort_types::{Move, Solution};

use crate::errors::{EngineError, RECONCILIATION};
use crate::reconcile::Reconciliation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolvePhase {
    Idle,
    AwaitingSolution,
    SolutionReady,
    Executing,
}

impl SolvePhase {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            SolvePhase::Idle => "idle",
            SolvePhase::AwaitingSolution => "awaiting a solution",
            SolvePhase::SolutionReady => "holding a solution",
            SolvePhase::Executing => "executing",
        }
    }
}

impl std::fmt::Display for SolvePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
enum SessionState {
    #[default]
    Idle,
    AwaitingSolution,
    SolutionReady(Solution),
    Executing { solution: Solution, cursor: usize },
}

/// What [`SolveSession::solution_received`] did with the backend's answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arrival {
    /// Empty solution: nothing to run.
    AlreadySolved,
    Ready { steps: usize },
}

/// Result of folding one `Applied` step into the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepProgress {
    /// More steps remain; schedule the next one.
    Continue { cursor: usize, remaining: usize },
    /// The list ran out without the backend confirming completion.
    Exhausted { executed: usize },
}

/// Summary of a user-initiated stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stopped {
    pub cursor: usize,
    pub discarded: usize,
}

#[derive(Debug, Default)]
pub struct SolveSession {
    state: SessionState,
    moves_since_manual_stop: usize,
    resume_from_current_state: bool,
}

impl SolveSession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn phase(&self) -> SolvePhase {
        match self.state {
            SessionState::Idle => SolvePhase::Idle,
            SessionState::AwaitingSolution => SolvePhase::AwaitingSolution,
            SessionState::SolutionReady(_) => SolvePhase::SolutionReady,
            SessionState::Executing { .. } => SolvePhase::Executing,
        }
    }

    #[must_use]
    pub const fn is_executing(&self) -> bool {
        matches!(self.state, SessionState::Executing { .. })
    }

    /// The held solution, while one is displayed or being executed.
    #[must_use]
    pub fn solution(&self) -> Option<&Solution> {
        match &self.state {
            SessionState::SolutionReady(solution) | SessionState::Executing { solution, .. } => {
                Some(solution)
            }
            SessionState::Idle | SessionState::AwaitingSolution => None,
        }
    }

    #[must_use]
    pub const fn cursor(&self) -> Option<usize> {
        match self.state {
            SessionState::Executing { cursor, .. } => Some(cursor),
            _ => None,
        }
    }

    #[must_use]
    pub const fn moves_since_manual_stop(&self) -> usize {
        self.moves_since_manual_stop
    }

    #[must_use]
    pub const fn resume_from_current_state(&self) -> bool {
        self.resume_from_current_state
    }

    fn invalid(&self, action: &'static str) -> EngineError {
        EngineError::InvalidTransition {
            action,
            phase: self.phase(),
        }
    }

    /// Enter `AwaitingSolution`.
    ///
    /// Returns whether the request must carry the current board; the resume
    /// flag is consumed either way. A solution already on display is dropped.
    pub fn request(&mut self) -> Result<bool, EngineError> {
        match self.state {
            SessionState::Idle | SessionState::SolutionReady(_) => {
                self.state = SessionState::AwaitingSolution;
                Ok(std::mem::take(&mut self.resume_from_current_state))
            }
            SessionState::AwaitingSolution | SessionState::Executing { .. } => {
                Err(self.invalid("request a solution"))
            }
        }
    }

    pub fn solution_received(&mut self, solution: Solution) -> Result<Arrival, EngineError> {
        if self.state != SessionState::AwaitingSolution {
            return Err(self.invalid("accept a solution"));
        }
        if solution.is_empty() {
            self.state = SessionState::Idle;
            return Ok(Arrival::AlreadySolved);
        }
        let steps = solution.len();
        self.state = SessionState::SolutionReady(solution);
        Ok(Arrival::Ready { steps })
    }

    /// Failure or transport error while awaiting: nothing is retained.
    pub fn solution_failed(&mut self) -> Result<(), EngineError> {
        if self.state != SessionState::AwaitingSolution {
            return Err(self.invalid("fail a solve request"));
        }
        self.state = SessionState::Idle;
        Ok(())
    }

    /// Start stepping through the held solution.
    pub fn confirm_execute(
        &mut self,
        reconciliation: Option<&Reconciliation>,
    ) -> Result<usize, EngineError> {
        if reconciliation.is_some() {
            return Err(EngineError::ConcurrentEdit(RECONCILIATION));
        }
        match std::mem::take(&mut self.state) {
            SessionState::SolutionReady(solution) => {
                let steps = solution.len();
                self.moves_since_manual_stop = 0;
                self.state = SessionState::Executing {
                    solution,
                    cursor: 0,
                };
                Ok(steps)
            }
            other => {
                self.state = other;
                Err(self.invalid("execute"))
            }
        }
    }

    /// The move at the cursor, while executing.
    #[must_use]
    pub fn next_step(&self) -> Option<&Move> {
        match &self.state {
            SessionState::Executing { solution, cursor } => solution.get(*cursor),
            _ => None,
        }
    }

    /// Fold an `Applied` outcome for the current step.
    pub fn step_applied(&mut self) -> Result<StepProgress, EngineError> {
        let SessionState::Executing { solution, cursor } = &mut self.state else {
            return Err(self.invalid("advance"));
        };
        *cursor += 1;
        self.moves_since_manual_stop += 1;
        if *cursor >= solution.len() {
            let executed = *cursor;
            self.state = SessionState::Idle;
            return Ok(StepProgress::Exhausted { executed });
        }
        Ok(StepProgress::Continue {
            cursor: *cursor,
            remaining: solution.len() - *cursor,
        })
    }

    /// The backend declared the puzzle solved. Valid in any phase.
    pub fn completed(&mut self) {
        self.state = SessionState::Idle;
        self.resume_from_current_state = false;
    }

    /// User stop: discard the unexecuted suffix and solve from here next time.
    pub fn cancel(&mut self) -> Result<Stopped, EngineError> {
        let SessionState::Executing { solution, cursor } = &self.state else {
            return Err(self.invalid("stop"));
        };
        let stopped = Stopped {
            cursor: *cursor,
            discarded: solution.len() - *cursor,
        };
        self.state = SessionState::Idle;
        self.resume_from_current_state = true;
        Ok(stopped)
    }

    /// Execution ended on a failure. The next solve resumes from the current
    /// board if any step made it through.
    pub fn abort(&mut self) -> Result<usize, EngineError> {
        let SessionState::Executing { cursor, .. } = self.state else {
            return Err(self.invalid("abort"));
        };
        self.state = SessionState::Idle;
        if cursor > 0 {
            self.resume_from_current_state = true;
        }
        Ok(cursor)
    }

    /// A manual move invalidates a solution computed for the old board.
    pub fn board_moved(&mut self) {
        if matches!(self.state, SessionState::SolutionReady(_)) {
            self.state = SessionState::Idle;
        }
    }

    /// Forget everything; a new puzzle was installed.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
