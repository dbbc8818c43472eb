//! Core engine for tubesort - state machine and orchestration.
//!
//! This crate contains the [`App`] coordinator without any front-end
//! dependencies. It owns the board, the move catalog, the solve session and
//! an optional color reconciliation, and talks to the puzzle server through a
//! [`GameBackend`].
//!
//! All work happens on the caller's task. Delays (pacing between solution
//! steps, the pause before a dead-end undo) are queued continuations: the
//! front end waits for [`App::next_deadline`] alongside user input and calls
//! [`App::fire_due`], so a stop command can land between two steps.

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory
#![allow(clippy::missing_panics_doc)] // Panics are documented in assertions

use tokio::time::Instant;

pub use tubesort_client::{self, AnalysisReply, BoardImage, GameBackend, SolveReply, UpdateTubesReply};
pub use tubesort_types::{
    Color, GameState, Move, RankedMove, SlotCoord, Solution, Tube,
};

mod catalog;
mod config;
mod errors;
mod events;
mod moves;
mod reconcile;
mod scheduler;
mod solve;
mod store;

pub use catalog::{MoveCatalog, Refresh};
pub use config::{
    ConfigError, EngineSettings, PlayConfig, PuzzleConfig, SERVER_ENV_VAR, ServerConfig,
    TubesortConfig, config_path, expand_env_vars,
};
pub use errors::EngineError;
pub use events::{EventQueue, ViewEvent};
pub use moves::{MoveOutcome, UndoOutcome};
pub use reconcile::{Reconciliation, Selection};
pub use scheduler::{Continuation, Scheduler};
pub use solve::{Arrival, SolvePhase, SolveSession, StepProgress, Stopped};
pub use store::GameStateStore;

use errors::{EXECUTION, RECONCILIATION};

/// The coordinating object behind every front-end command.
#[derive(Debug)]
pub struct App<B> {
    backend: B,
    settings: EngineSettings,
    store: GameStateStore,
    catalog: MoveCatalog,
    solve: SolveSession,
    reconciliation: Option<Reconciliation>,
    scheduler: Scheduler,
    events: EventQueue,
    /// Automatic undos since the last refresh that found moves.
    dead_end_streak: u32,
    /// A dead-end undo was withdrawn when reconciliation began.
    recovery_suspended: bool,
}

impl<B: GameBackend> App<B> {
    pub fn new(backend: B, settings: EngineSettings) -> Self {
        let store = GameStateStore::new(settings.tube_capacity);
        Self {
            backend,
            settings,
            store,
            catalog: MoveCatalog::new(),
            solve: SolveSession::new(),
            reconciliation: None,
            scheduler: Scheduler::new(),
            events: EventQueue::new(),
            dead_end_streak: 0,
            recovery_suspended: false,
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// The board to draw: the tentative layout while reconciling.
    pub fn board(&self) -> Option<&GameState> {
        self.store.displayed()
    }

    /// The last backend-confirmed board.
    pub fn authoritative_board(&self) -> Option<&GameState> {
        self.store.current()
    }

    pub fn moves(&self) -> &[RankedMove] {
        self.catalog.moves()
    }

    pub fn is_dead_end(&self) -> bool {
        self.catalog.is_dead_end()
    }

    pub fn solve_phase(&self) -> SolvePhase {
        self.solve.phase()
    }

    pub fn solve_session(&self) -> &SolveSession {
        &self.solve
    }

    pub fn reconciliation(&self) -> Option<&Reconciliation> {
        self.reconciliation.as_ref()
    }

    /// Drain queued view events, oldest first.
    pub fn take_events(&mut self) -> Vec<ViewEvent> {
        self.events.take()
    }

    /// When the earliest scheduled continuation is due.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.scheduler.next_deadline()
    }

    pub fn has_pending(&self) -> bool {
        !self.scheduler.is_empty()
    }

    // ========================================================================
    // Bootstrap and catalog
    // ========================================================================

    /// Load the server's current puzzle and its moves, discarding local workflows.
    pub async fn bootstrap(&mut self) {
        self.scheduler.clear();
        self.solve.reset();
        self.reconciliation = None;
        self.store.clear_overlay();
        self.dead_end_streak = 0;
        self.recovery_suspended = false;

        match self.backend.initial_state().await {
            Ok(tubes) => match self.store.replace(tubes) {
                Ok(state) => {
                    tracing::info!(tubes = state.tubes().len(), "Puzzle loaded");
                    self.events.push(ViewEvent::BoardChanged);
                }
                Err(err) => {
                    self.events
                        .push(ViewEvent::Notice(format!("Server sent an unusable board: {err}")));
                    return;
                }
            },
            Err(err) => {
                self.events.push(ViewEvent::TransportFailure {
                    context: "load the puzzle",
                    error: err.to_string(),
                });
                return;
            }
        }
        self.refresh_moves().await;
    }

    /// Refetch the ranked moves for the current board.
    pub async fn refresh_moves(&mut self) {
        match self.catalog.refresh(&self.backend).await {
            Refresh::Moves(count) => {
                self.dead_end_streak = 0;
                self.events.push(ViewEvent::MovesUpdated { count });
            }
            Refresh::DeadEnd => self.on_dead_end().await,
            Refresh::Failed(err) => {
                self.events.push(ViewEvent::TransportFailure {
                    context: "fetch moves",
                    error: err.to_string(),
                });
            }
        }
    }

    async fn on_dead_end(&mut self) {
        if self.store.current().is_some_and(GameState::is_solved) {
            self.events
                .push(ViewEvent::Notice("No moves left: every tube is sorted".to_string()));
            return;
        }

        if self.settings.report_dead_ends
            && let Some(state) = self.store.current()
            && let Err(err) = self.backend.add_dead_end(state.tubes()).await
        {
            tracing::debug!(error = %err, "Dead-end report not delivered");
        }

        let max = self.settings.max_dead_end_recoveries;
        if self.dead_end_streak >= max {
            tracing::warn!(attempts = self.dead_end_streak, "Dead-end recovery limit reached");
            self.events.push(ViewEvent::DeadEnd { recovering: false });
            if self.dead_end_streak > 0 {
                self.events.push(ViewEvent::DeadEndRecoveryExhausted {
                    attempts: self.dead_end_streak,
                });
            }
            return;
        }

        self.dead_end_streak += 1;
        tracing::info!(streak = self.dead_end_streak, "Dead end; undo scheduled");
        self.scheduler.schedule(
            Continuation::DeadEndUndo,
            self.settings.dead_end_delay,
            Instant::now(),
        );
        self.events.push(ViewEvent::DeadEnd { recovering: true });
    }

    // ========================================================================
    // Scheduled continuations
    // ========================================================================

    /// Run the continuations that were already queued and are due. Work they
    /// schedule waits for the next call, even with a zero delay, so the
    /// caller can act between solution steps. Returns how many ran.
    pub async fn fire_due(&mut self) -> usize {
        let cutoff = self.scheduler.cutoff();
        let mut fired = 0;
        while let Some(continuation) = self.scheduler.pop_due(Instant::now(), cutoff) {
            fired += 1;
            match continuation {
                Continuation::NextSolutionStep => self.execute_step().await,
                Continuation::DeadEndUndo => self.dead_end_undo().await,
            }
        }
        fired
    }

    /// Sleep until each deadline and fire, until nothing is scheduled.
    pub async fn run_pending(&mut self) {
        while let Some(deadline) = self.scheduler.next_deadline() {
            tokio::time::sleep_until(deadline).await;
            self.fire_due().await;
        }
    }

    async fn dead_end_undo(&mut self) {
        if self.solve.is_executing() || self.reconciliation.is_some() {
            tracing::info!("Skipping dead-end undo while the board is held by another workflow");
            return;
        }
        match moves::undo(&self.backend, &mut self.store).await {
            UndoOutcome::Applied => {
                self.events.push(ViewEvent::BoardChanged);
                self.refresh_moves().await;
            }
            UndoOutcome::TransportFailure(err) => {
                self.events.push(ViewEvent::TransportFailure {
                    context: "undo the dead end",
                    error: err.to_string(),
                });
            }
            UndoOutcome::Malformed(err) => {
                self.events
                    .push(ViewEvent::Notice(format!("Ignored unusable board after undo: {err}")));
            }
        }
    }

    // ========================================================================
    // Manual play
    // ========================================================================

    fn check_manual_edit(&self) -> Result<(), EngineError> {
        if self.reconciliation.is_some() {
            return Err(EngineError::ConcurrentEdit(RECONCILIATION));
        }
        if self.solve.is_executing() {
            return Err(EngineError::ConcurrentEdit(EXECUTION));
        }
        if self.store.current().is_none() {
            return Err(EngineError::NotLoaded);
        }
        Ok(())
    }

    /// Apply the catalog's `index`-th move (0-based).
    pub async fn apply_ranked(&mut self, index: usize) -> Result<(), EngineError> {
        let movement = self
            .catalog
            .get(index)
            .map(|ranked| ranked.movement.clone())
            .ok_or(EngineError::UnknownMove(index))?;
        self.apply_manual(movement).await
    }

    pub async fn apply_manual(&mut self, movement: Move) -> Result<(), EngineError> {
        self.check_manual_edit()?;
        self.scheduler.cancel(Continuation::DeadEndUndo);
        self.dead_end_streak = 0;

        match moves::apply_move(&self.backend, &mut self.store, &movement).await {
            MoveOutcome::Applied => {
                self.solve.board_moved();
                self.events.push(ViewEvent::BoardChanged);
                self.refresh_moves().await;
            }
            MoveOutcome::Completed { final_moves } => self.finish_game(final_moves),
            MoveOutcome::Rejected { reason } => {
                self.events
                    .push(ViewEvent::MoveRejected { movement, reason });
                self.refresh_moves().await;
            }
            MoveOutcome::TransportFailure(err) => {
                self.events.push(ViewEvent::TransportFailure {
                    context: "apply the move",
                    error: err.to_string(),
                });
            }
            MoveOutcome::Malformed(err) => {
                self.events
                    .push(ViewEvent::Notice(format!("Ignored unusable board: {err}")));
                self.refresh_moves().await;
            }
        }
        Ok(())
    }

    /// Revert the server's last move.
    pub async fn undo(&mut self) -> Result<(), EngineError> {
        self.check_manual_edit()?;
        self.scheduler.cancel(Continuation::DeadEndUndo);
        self.dead_end_streak = 0;

        match moves::undo(&self.backend, &mut self.store).await {
            UndoOutcome::Applied => {
                self.solve.board_moved();
                self.events.push(ViewEvent::BoardChanged);
                self.refresh_moves().await;
            }
            UndoOutcome::TransportFailure(err) => {
                self.events.push(ViewEvent::TransportFailure {
                    context: "undo",
                    error: err.to_string(),
                });
            }
            UndoOutcome::Malformed(err) => {
                self.events
                    .push(ViewEvent::Notice(format!("Ignored unusable board after undo: {err}")));
            }
        }
        Ok(())
    }

    fn finish_game(&mut self, final_moves: Vec<Move>) {
        tracing::info!(moves = final_moves.len(), "Puzzle completed");
        self.solve.completed();
        self.scheduler.clear();
        self.dead_end_streak = 0;
        self.events.push(ViewEvent::BoardChanged);
        self.events.push(ViewEvent::GameCompleted { final_moves });
    }

    // ========================================================================
    // Solving
    // ========================================================================

    /// Ask the backend for a solution and hold it for confirmation.
    ///
    /// After a stopped execution the current board is sent so the solver
    /// resumes from it; otherwise the original puzzle is solved.
    pub async fn request_solution(&mut self) -> Result<(), EngineError> {
        let resume = self.solve.request()?;
        let current = if resume {
            self.store.current().map(|state| state.tubes().to_vec())
        } else {
            None
        };
        tracing::info!(resume, "Requesting solution");

        match self.backend.solve_puzzle(current.as_deref()).await {
            Ok(SolveReply::Solved(solution)) => {
                let moves = solution.moves().to_vec();
                match self.solve.solution_received(solution)? {
                    Arrival::AlreadySolved => self.events.push(ViewEvent::AlreadySolved),
                    Arrival::Ready { steps } => {
                        tracing::info!(steps, "Solution ready");
                        self.events.push(ViewEvent::SolutionReady { moves });
                    }
                }
            }
            Ok(SolveReply::Failed(reason)) => {
                self.solve.solution_failed()?;
                self.events.push(ViewEvent::SolveFailed { reason });
            }
            Err(err) => {
                self.solve.solution_failed()?;
                self.events.push(ViewEvent::TransportFailure {
                    context: "request a solution",
                    error: err.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Start executing the held solution. The first step is due immediately.
    pub fn confirm_execute(&mut self) -> Result<(), EngineError> {
        let steps = self.solve.confirm_execute(self.reconciliation.as_ref())?;
        self.scheduler.cancel(Continuation::DeadEndUndo);
        tracing::info!(steps, "Executing solution");
        self.events.push(ViewEvent::ExecutionStarted { steps });
        self.scheduler.schedule(
            Continuation::NextSolutionStep,
            std::time::Duration::ZERO,
            Instant::now(),
        );
        Ok(())
    }

    /// Stop executing. A request already in flight is not interrupted; only the
    /// next step is prevented.
    pub async fn cancel_execution(&mut self) -> Result<(), EngineError> {
        let stopped = self.solve.cancel()?;
        self.scheduler.cancel(Continuation::NextSolutionStep);
        tracing::info!(
            executed = stopped.cursor,
            discarded = stopped.discarded,
            "Execution stopped"
        );
        self.events.push(ViewEvent::ExecutionStopped {
            executed: stopped.cursor,
            discarded: stopped.discarded,
        });
        self.refresh_moves().await;
        Ok(())
    }

    async fn execute_step(&mut self) {
        // A stop may have arrived during the pacing delay.
        let Some(movement) = self.solve.next_step().cloned() else {
            tracing::debug!("Execution no longer active; dropping step");
            return;
        };

        match moves::apply_move(&self.backend, &mut self.store, &movement).await {
            MoveOutcome::Applied => {
                self.events.push(ViewEvent::BoardChanged);
                match self.solve.step_applied() {
                    Ok(StepProgress::Continue { .. }) => self.scheduler.schedule(
                        Continuation::NextSolutionStep,
                        self.settings.step_delay,
                        Instant::now(),
                    ),
                    Ok(StepProgress::Exhausted { executed }) => {
                        tracing::warn!(executed, "Solution exhausted without completion");
                        self.events.push(ViewEvent::ExecutionExhausted { executed });
                        self.refresh_moves().await;
                    }
                    Err(err) => tracing::error!(error = %err, "Step applied outside execution"),
                }
            }
            MoveOutcome::Completed { final_moves } => self.finish_game(final_moves),
            MoveOutcome::Rejected { reason } => {
                let executed = self.solve.abort().unwrap_or(0);
                self.events.push(ViewEvent::MoveRejected {
                    movement,
                    reason: reason.clone(),
                });
                self.events
                    .push(ViewEvent::ExecutionAborted { executed, reason });
                self.refresh_moves().await;
            }
            MoveOutcome::TransportFailure(err) => {
                let executed = self.solve.abort().unwrap_or(0);
                let error = err.to_string();
                self.events.push(ViewEvent::TransportFailure {
                    context: "apply a solution step",
                    error: error.clone(),
                });
                self.events.push(ViewEvent::ExecutionAborted {
                    executed,
                    reason: error,
                });
            }
            MoveOutcome::Malformed(err) => {
                let executed = self.solve.abort().unwrap_or(0);
                self.events.push(ViewEvent::ExecutionAborted {
                    executed,
                    reason: format!("unusable board from server: {err}"),
                });
                self.refresh_moves().await;
            }
        }
    }

    // ========================================================================
    // Color reconciliation
    // ========================================================================

    /// Send a photo of the board for analysis and start reconciling the result.
    pub async fn analyze_image(&mut self, image: BoardImage) -> Result<(), EngineError> {
        if self.solve.is_executing() {
            return Err(EngineError::ConcurrentEdit(EXECUTION));
        }
        let Some(current) = self.store.current() else {
            return Err(EngineError::NotLoaded);
        };
        let capacity = current.capacity();

        match self.backend.analyze_tubes(image).await {
            Ok(AnalysisReply::Tubes { tubes, warning }) => {
                let tentative = match GameState::new(tubes, capacity) {
                    Ok(state) => state,
                    Err(err) => {
                        self.events.push(ViewEvent::AnalysisFailed {
                            reason: err.to_string(),
                        });
                        return Ok(());
                    }
                };
                match self.begin_reconciliation(tentative, warning) {
                    Err(EngineError::ShapeMismatch) => {
                        self.events.push(ViewEvent::AnalysisFailed {
                            reason: EngineError::ShapeMismatch.to_string(),
                        });
                        Ok(())
                    }
                    other => other,
                }
            }
            Ok(AnalysisReply::Failed(reason)) => {
                self.events.push(ViewEvent::AnalysisFailed { reason });
                Ok(())
            }
            Err(err) => {
                self.events.push(ViewEvent::TransportFailure {
                    context: "analyze the image",
                    error: err.to_string(),
                });
                Ok(())
            }
        }
    }

    /// Show `tentative` in place of the board and start editing it.
    ///
    /// An active reconciliation is replaced; its snapshot is the same board.
    pub fn begin_reconciliation(
        &mut self,
        tentative: GameState,
        warning: Option<String>,
    ) -> Result<(), EngineError> {
        let snapshot = self.store.current().cloned().ok_or(EngineError::NotLoaded)?;
        let reconciliation = Reconciliation::begin(&self.solve, snapshot, tentative)?;
        self.recovery_suspended |= self.scheduler.cancel(Continuation::DeadEndUndo) > 0;
        self.store.show(reconciliation.tentative().clone());
        self.reconciliation = Some(reconciliation);
        tracing::info!("Color reconciliation started");
        self.events.push(ViewEvent::ReconciliationStarted { warning });
        self.events.push(ViewEvent::BoardChanged);
        Ok(())
    }

    pub fn select_slot(&mut self, coord: SlotCoord) -> Result<(), EngineError> {
        let reconciliation = self
            .reconciliation
            .as_mut()
            .ok_or(EngineError::NoReconciliation)?;
        match reconciliation.select_slot(coord)? {
            Selection::Selected(coord) => {
                self.events.push(ViewEvent::SlotSelected {
                    coord,
                    selected: true,
                });
            }
            Selection::Deselected(coord) => {
                self.events.push(ViewEvent::SlotSelected {
                    coord,
                    selected: false,
                });
            }
            Selection::Swapped(first, second) => {
                self.store.show(reconciliation.tentative().clone());
                self.events
                    .push(ViewEvent::ColorsSwapped { first, second });
                self.events.push(ViewEvent::BoardChanged);
            }
        }
        Ok(())
    }

    /// Commit the tentative layout. On failure it is kept for another try.
    pub async fn accept_reconciliation(&mut self) -> Result<(), EngineError> {
        let tubes = self
            .reconciliation
            .as_ref()
            .ok_or(EngineError::NoReconciliation)?
            .tentative()
            .tubes()
            .to_vec();

        let echoed = match self.backend.update_tubes(&tubes).await {
            Ok(UpdateTubesReply::Accepted(echoed)) => echoed,
            Ok(UpdateTubesReply::Refused(reason)) => {
                self.events.push(ViewEvent::AcceptFailed { reason });
                return Ok(());
            }
            Err(err) => {
                self.events.push(ViewEvent::AcceptFailed {
                    reason: err.to_string(),
                });
                return Ok(());
            }
        };

        let Some(reconciliation) = self.reconciliation.take() else {
            return Err(EngineError::NoReconciliation);
        };
        let tentative = reconciliation.tentative().clone();
        match echoed.map(|tubes| self.store.replace(tubes).map(|_| ())) {
            Some(Ok(())) => {}
            Some(Err(err)) => {
                tracing::warn!(error = %err, "Using submitted colors instead of unusable echo");
                self.store.install(tentative);
            }
            None => self.store.install(tentative),
        }
        self.store.clear_overlay();

        // The committed layout is a new puzzle.
        self.solve.reset();
        self.scheduler.clear();
        self.dead_end_streak = 0;
        self.recovery_suspended = false;

        tracing::info!("Color reconciliation accepted");
        self.events.push(ViewEvent::ReconciliationAccepted);
        self.events.push(ViewEvent::BoardChanged);
        self.refresh_moves().await;
        Ok(())
    }

    /// Discard the tentative layout without contacting the backend.
    pub fn reject_reconciliation(&mut self) -> Result<(), EngineError> {
        let reconciliation = self
            .reconciliation
            .take()
            .ok_or(EngineError::NoReconciliation)?;
        let snapshot = reconciliation.into_snapshot();
        self.store.clear_overlay();
        if self.store.current() != Some(&snapshot) {
            tracing::error!("Board changed during reconciliation; restoring snapshot");
            self.store.install(snapshot);
        }
        if std::mem::take(&mut self.recovery_suspended) && self.catalog.is_dead_end() {
            tracing::info!("Dead end still showing; undo rescheduled");
            self.scheduler.schedule(
                Continuation::DeadEndUndo,
                self.settings.dead_end_delay,
                Instant::now(),
            );
        }
        tracing::info!("Color reconciliation rejected");
        self.events.push(ViewEvent::ReconciliationRejected);
        self.events.push(ViewEvent::BoardChanged);
        Ok(())
    }
}
