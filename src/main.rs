//! Tetromerge terminal runner (default binary).
//!
//! Fixed 16 ms frame loop on the main thread. The wave runner is the only
//! async piece: it is spawned on a small tokio runtime when a turn ends, and
//! the loop keeps ticking enemies and turrets until the runner finishes.
//!
//! Logs never go to the terminal (it is in raw mode). Set `TETROMERGE_LOG`
//! to a file path to capture them; `TETROMERGE_LOG_LEVEL` sets the filter.

use std::fs::File;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use tokio::runtime::Runtime;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use tetromerge::engine::{run_wave, GameConfig, Phase, Session, WaveReport};
use tetromerge::input::{handle_key_event, Command, PointerEvent, PointerQueue};
use tetromerge::term::{FieldView, FrameBuffer, TerminalRenderer, Viewport};
use tetromerge::types::TICK_MS;

fn main() -> Result<()> {
    init_logging();

    let config = GameConfig::from_env();
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_time()
        .build()?;

    let mut term = TerminalRenderer::new();
    term.enter()?;

    let result = run(&mut term, &rt, config);

    // Always try to restore terminal state.
    let _ = term.exit();
    result
}

fn init_logging() {
    let Some(path) = std::env::var("TETROMERGE_LOG")
        .ok()
        .filter(|p| !p.trim().is_empty())
    else {
        return;
    };
    let file = match File::create(path.trim()) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("cannot open log file {path}: {e}");
            return;
        }
    };
    let level = std::env::var("TETROMERGE_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&level).unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
}

fn run(term: &mut TerminalRenderer, rt: &Runtime, config: GameConfig) -> Result<()> {
    let mut session = Session::new(config);
    let view = FieldView::default();
    let mut fb = FrameBuffer::new(0, 0);
    let mut pointer = PointerQueue::new();
    let mut wave: Option<JoinHandle<WaveReport>> = None;

    let started = Instant::now();
    let tick = Duration::from_millis(TICK_MS as u64);
    let mut last_tick = Instant::now();

    info!(seed = session.config().field.rng_seed, "game started");

    loop {
        let (w, h) = crossterm::terminal::size().unwrap_or((80, 24));
        let viewport = Viewport::new(w, h);
        view.render_into(&session, viewport, &mut fb);
        term.draw_swap(&mut fb)?;

        // Drain input until the next tick is due.
        let mut timeout = tick.saturating_sub(last_tick.elapsed());
        while event::poll(timeout)? {
            timeout = Duration::ZERO;
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => match handle_key_event(key) {
                    Some(Command::Quit) => return Ok(()),
                    Some(Command::Restart) => {
                        if let Some(handle) = wave.take() {
                            handle.abort();
                        }
                        session.restart();
                    }
                    Some(Command::EndTurn) => {
                        if let Some(plan) = session.end_turn() {
                            wave = Some(rt.spawn(run_wave(plan, session.roster())));
                        }
                    }
                    None => {}
                },
                Event::Mouse(mouse) => pointer.push_mouse(mouse),
                Event::Resize(..) => term.invalidate(),
                _ => {}
            }
        }

        let proj = view.projection(&session, viewport);
        let now_ms = started.elapsed().as_millis() as u64;
        for ev in pointer.drain() {
            let (col, row) = ev.cell();
            let pos = proj.to_world(col, row);
            match ev {
                PointerEvent::Down { .. } => session.pointer_down(pos, now_ms),
                PointerEvent::Move { .. } => session.pointer_move(pos),
                PointerEvent::Up { .. } => {
                    session.pointer_up(pos, now_ms);
                }
            }
        }

        if last_tick.elapsed() >= tick {
            let dt = last_tick.elapsed().as_secs_f32();
            last_tick = Instant::now();
            session.tick(dt);

            if session.phase() == Phase::Lost {
                if let Some(handle) = wave.take() {
                    handle.abort();
                }
            }
            if wave.as_ref().is_some_and(|h| h.is_finished()) {
                if let Some(handle) = wave.take() {
                    match rt.block_on(handle) {
                        Ok(report) => info!(turn = report.turn, spawned = report.spawned, "wave report"),
                        Err(e) => warn!(error = %e, "wave task failed"),
                    }
                }
                session.finish_wave();
            }
        }
    }
}
