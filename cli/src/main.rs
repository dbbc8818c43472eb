//! Tubesort CLI - line-oriented front end for the tube-sorting puzzle.
//!
//! # Architecture
//!
//! The CLI drives a [`tubesort_engine::App`] backed by the HTTP puzzle server
//! and renders whatever the engine reports.
//!
//! ```text
//! main() -> App::bootstrap() -> loop {
//!     select! { stdin line  => commands::parse -> dispatch
//!               deadline    => app.fire_due()          }
//!     drain app events -> render
//! }
//! ```
//!
//! Scheduled work (solution steps, dead-end undos) only runs while the loop
//! waits, so a `stop` typed between two steps is seen before the next one.

mod commands;
mod render;

use anyhow::Result;
use std::{
    fs::{self, OpenOptions},
    path::{Path, PathBuf},
    sync::Mutex,
};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::time::Instant;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use commands::{Command, HELP, TubeArg};
use tubesort_client::HttpBackend;
use tubesort_engine::{App, BoardImage, EngineError, Move, SlotCoord, TubesortConfig, ViewEvent};

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let (log_file, init_warnings) = open_tubesort_log_file();

    if let Some((log_path, file)) = log_file {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
            .with(env_filter)
            .init();

        tracing::info!(path = %log_path.display(), "Logging initialized");
        for warning in init_warnings {
            tracing::warn!("{warning}");
        }
        return;
    }

    // Without a log file, drop logs rather than interleave them with the board.
    tracing_subscriber::registry().with(env_filter).init();
}

fn open_tubesort_log_file() -> (Option<(PathBuf, fs::File)>, Vec<String>) {
    let mut warnings = Vec::new();

    for candidate in tubesort_log_file_candidates() {
        if let Some(parent) = candidate.parent()
            && let Err(e) = fs::create_dir_all(parent)
        {
            warnings.push(format!(
                "Failed to create log dir {}: {e}",
                parent.display()
            ));
            continue;
        }

        match OpenOptions::new()
            .create(true)
            .append(true)
            .open(&candidate)
        {
            Ok(file) => return (Some((candidate, file)), warnings),
            Err(e) => {
                warnings.push(format!(
                    "Failed to open log file {}: {e}",
                    candidate.display()
                ));
            }
        }
    }

    (None, warnings)
}

fn tubesort_log_file_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    // Primary: ~/.tubesort/logs/tubesort.log
    if let Some(config_path) = TubesortConfig::path()
        && let Some(config_dir) = config_path.parent()
    {
        candidates.push(config_dir.join("logs").join("tubesort.log"));
    }

    // Fallback: ./.tubesort/logs/tubesort.log
    candidates.push(PathBuf::from(".tubesort").join("logs").join("tubesort.log"));

    candidates
}

/// MIME type for a board photo, from its extension.
fn image_type(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        _ => None,
    }
}

enum Flow {
    Continue,
    Quit,
}

/// Tracks the `> ` prompt so scheduled output does not reprint it.
///
/// While steps are queued the prompt stays hidden; it comes back once the
/// engine has nothing left to run or after the user enters a line.
#[derive(Debug)]
struct Prompt {
    shown: bool,
    wanted: bool,
}

impl Prompt {
    const TEXT: &'static str = "> ";

    fn new() -> Self {
        Self {
            shown: false,
            wanted: true,
        }
    }

    /// The prompt to print before waiting, if it is not already on screen.
    fn before_wait(&mut self) -> Option<&'static str> {
        if self.wanted && !self.shown {
            self.shown = true;
            return Some(Self::TEXT);
        }
        None
    }

    fn line_entered(&mut self) {
        self.shown = false;
        self.wanted = true;
    }

    /// Scheduled work is about to print. Returns whether a shown prompt
    /// must be broken off with a newline first.
    fn interrupt(&mut self) -> bool {
        std::mem::take(&mut self.shown)
    }

    /// Scheduled work ran; `idle` when nothing else is queued.
    fn settled(&mut self, idle: bool) {
        self.wanted = idle;
    }
}

async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

fn resolve_slot(app: &App<HttpBackend>, tube: &TubeArg, slot: usize) -> Option<SlotCoord> {
    let board = app.board()?;
    let index = match tube {
        TubeArg::Position(n) => n.checked_sub(1).filter(|i| *i < board.tubes().len())?,
        TubeArg::Name(name) => board.tubes().iter().position(|t| t.name == *name)?,
    };
    Some(SlotCoord::new(index, slot - 1))
}

async fn dispatch(app: &mut App<HttpBackend>, command: Command) -> Result<Flow, EngineError> {
    match command {
        Command::Show => {
            if app.board().is_some() {
                show_board(app);
            } else {
                println!("No board loaded yet; try 'reload'");
            }
        }
        Command::Moves => {
            if let Some(solution) = app.solve_session().solution() {
                println!("Solution:");
                println!("{}", render::solution(solution.moves(), app.solve_session().cursor()));
            }
            println!("{}", render::moves(app.moves()));
        }
        Command::MoveRanked(n) => {
            if n > app.moves().len() {
                println!("No move numbered {n}; 'moves' lists them");
            } else {
                app.apply_ranked(n - 1).await?;
            }
        }
        Command::MoveBetween { from, to } => {
            app.apply_manual(Move::new(from, to)).await?;
        }
        Command::Undo => app.undo().await?,
        Command::Solve => app.request_solution().await?,
        Command::Run => app.confirm_execute()?,
        Command::Stop => app.cancel_execution().await?,
        Command::Analyze(path) => {
            let Some(image_type) = image_type(&path) else {
                println!("Unsupported image type; use a .png or .jpg file");
                return Ok(Flow::Continue);
            };
            match tokio::fs::read(&path).await {
                Ok(bytes) => {
                    let image = BoardImage {
                        bytes,
                        image_type: image_type.to_string(),
                    };
                    app.analyze_image(image).await?;
                }
                Err(e) => println!("Cannot read {}: {e}", path.display()),
            }
        }
        Command::Pick { tube, slot } => match resolve_slot(app, &tube, slot) {
            Some(coord) => app.select_slot(coord)?,
            None => println!("No such tube on the board"),
        },
        Command::Accept => app.accept_reconciliation().await?,
        Command::Reject => app.reject_reconciliation()?,
        Command::Reload => app.bootstrap().await,
        Command::Help => println!("{HELP}"),
        Command::Quit => return Ok(Flow::Quit),
    }
    Ok(Flow::Continue)
}

/// Draw the displayed board with any slot picked for a swap.
fn show_board(app: &App<HttpBackend>) {
    let Some(board) = app.board() else {
        return;
    };
    let selected = app
        .reconciliation()
        .map(|r| r.selected().to_vec())
        .unwrap_or_default();
    println!("{}", render::board(board, &selected));
}

fn print_events(app: &mut App<HttpBackend>) {
    for event in app.take_events() {
        match &event {
            ViewEvent::BoardChanged => show_board(app),
            ViewEvent::SlotSelected { .. } => {
                println!("{}", event.describe());
                show_board(app);
            }
            ViewEvent::MovesUpdated { .. } => println!("{}", render::moves(app.moves())),
            ViewEvent::SolutionReady { moves } => {
                println!("{}", event.describe());
                println!("{}", render::solution(moves, None));
            }
            _ => println!("{}", event.describe()),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = match TubesortConfig::load() {
        Ok(config) => config.unwrap_or_default(),
        Err(e) => {
            eprintln!("Ignoring config: {e}");
            TubesortConfig::default()
        }
    };
    let backend = HttpBackend::new(&config.backend_config())?;
    tracing::info!(base_url = backend.base_url(), "Using puzzle server");

    let mut app = App::new(backend, config.engine_settings());
    app.bootstrap().await;
    print_events(&mut app);
    println!("Type 'help' for commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    let mut prompt = Prompt::new();

    loop {
        if let Some(text) = prompt.before_wait() {
            stdout.write_all(text.as_bytes()).await?;
            stdout.flush().await?;
        }

        let flow = tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                prompt.line_entered();
                match commands::parse(&line) {
                    Ok(Some(command)) => match dispatch(&mut app, command).await {
                        Ok(flow) => flow,
                        Err(e) => {
                            println!("{e}");
                            Flow::Continue
                        }
                    },
                    Ok(None) => Flow::Continue,
                    Err(e) => {
                        println!("{e}");
                        Flow::Continue
                    }
                }
            }
            () = wait_for(app.next_deadline()) => {
                if prompt.interrupt() {
                    println!();
                }
                app.fire_due().await;
                prompt.settled(!app.has_pending());
                Flow::Continue
            }
        };

        print_events(&mut app);
        if matches!(flow, Flow::Quit) {
            break;
        }
    }

    Ok(())
}
