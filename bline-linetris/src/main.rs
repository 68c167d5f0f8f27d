//! Linetris entry point.
//!
//! ```text
//! bline-linetris                        Play with bline-linetris.toml / defaults
//! bline-linetris -c strip.json          Use another segment layout
//! bline-linetris --alpha 64 --speed 20  Dimmer and slower
//! bline-linetris --gen-config           Print the default config and exit
//! ```

use std::fmt::Display;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use clap::Parser;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::{Terminal, backend::CrosstermBackend};
use tokio::sync::{Mutex, mpsc};
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use bline_core::{BlineError, Brightness, LedStrip, StripConfig, UdpSegment};
use bline_linetris::config::LoggingConfig;
use bline_linetris::terminal::TerminalGuard;
use bline_linetris::{
    App, Game, GameEvent, LinetrisConfig, Move, Phase, SharedStrip, UiEvent, run_game,
};

// ── CLI ──────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "bline-linetris", about = "Linetris on a segmented LED strip")]
struct Cli {
    /// Path to the game configuration TOML file.
    #[arg(long, default_value = "bline-linetris.toml")]
    config: PathBuf,

    /// Segment layout file (JSON or TOML). Overrides the config.
    #[arg(short = 'c', long = "strip")]
    strip: Option<PathBuf>,

    /// Brightness, 0 (black) to 255 (unchanged). Overrides the config.
    #[arg(long, allow_negative_numbers = true)]
    alpha: Option<i64>,

    /// Initial number of blocks in the stack.
    #[arg(long)]
    blocks: Option<usize>,

    /// Initial speed in pixels per second.
    #[arg(long)]
    speed: Option<u32>,

    /// Let falling blocks change color at random.
    #[arg(long)]
    rand: bool,

    /// Print the default configuration to stdout and exit.
    #[arg(long)]
    gen_config: bool,
}

impl Cli {
    fn apply(&self, config: &mut LinetrisConfig) {
        if let Some(path) = &self.strip {
            config.strip.config = path.clone();
        }
        if let Some(alpha) = self.alpha {
            config.strip.brightness = alpha;
        }
        if let Some(blocks) = self.blocks {
            config.game.blocks = blocks;
        }
        if let Some(speed) = self.speed {
            config.game.speed = speed;
        }
        if self.rand {
            config.game.random_change = true;
        }
    }
}

// ── Main ─────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.gen_config {
        let text = toml::to_string_pretty(&LinetrisConfig::default())?;
        println!("{text}");
        return Ok(());
    }

    let mut config = LinetrisConfig::load(&cli.config);
    cli.apply(&mut config);
    if let Err(msg) = config.validate() {
        fatal(msg);
    }

    init_tracing(&config.logging)?;
    info!("bline-linetris v{}", env!("CARGO_PKG_VERSION"));

    // ── 1. Open the strip ───────────────────────────────────────

    let layout = StripConfig::load(&config.strip.config).unwrap_or_else(|e| fatal(e));
    let brightness = Brightness::from_level(config.strip.brightness);
    let strip = LedStrip::connect(&layout, brightness)
        .await
        .unwrap_or_else(|e| fatal(e));

    let led_count = strip.led_count();
    let segments = strip.segments().len();
    let strip: SharedStrip<UdpSegment> = Arc::new(Mutex::new(strip));

    // ── 2. Play ─────────────────────────────────────────────────

    let game = Game::new(config.game_settings(), led_count);
    let mut app = App::new(led_count, segments, config.game.speed);

    let (finished, flush_error) = play(game, strip.clone(), &mut app, &config).await?;

    // ── 3. Shutdown ─────────────────────────────────────────────

    if let Err(e) = strip.lock().await.close().await {
        warn!("{e}");
        if let BlineError::Close(failures) = &e {
            for f in failures {
                warn!("segment {} ({}): {}", f.segment, f.endpoint, f.source);
            }
        }
    }

    match finished.phase() {
        Phase::Won => println!("You win!"),
        Phase::Lost => println!("Game over."),
        _ => {}
    }
    println!("Speed: {}", finished.speed());

    if let Some(e) = flush_error {
        return Err(e.into());
    }
    Ok(())
}

/// Run the game with the terminal in raw mode, restoring it afterwards.
async fn play(
    game: Game,
    strip: SharedStrip<UdpSegment>,
    app: &mut App,
    config: &LinetrisConfig,
) -> std::io::Result<(Game, Option<BlineError>)> {
    let running = Arc::new(AtomicBool::new(true));
    let dirty = Arc::new(AtomicBool::new(false));

    // 1. Setup communication channels
    let (move_tx, move_rx) = mpsc::unbounded_channel::<Move>();
    let (game_tx, mut game_rx) = mpsc::unbounded_channel::<GameEvent>();
    let (ui_tx, mut ui_rx) = mpsc::unbounded_channel::<UiEvent>();

    // 2. Setup terminal (restored when `screen` drops)
    let mut screen = TerminalGuard::enter(std::io::stdout())?;
    let mut terminal = Terminal::new(CrosstermBackend::new(std::io::stdout()))?;
    terminal.clear()?;

    // 3. Input task (dedicated thread for blocking crossterm poll)
    let input_running = running.clone();
    let input = tokio::task::spawn_blocking(move || {
        while input_running.load(Ordering::SeqCst) {
            if !event::poll(Duration::from_millis(10)).unwrap_or(false) {
                continue;
            }
            let sent = match event::read() {
                Ok(Event::Key(key)) => ui_tx.send(UiEvent::Key(key)),
                Ok(Event::Resize(w, h)) => ui_tx.send(UiEvent::Resize(w, h)),
                _ => Ok(()),
            };
            if sent.is_err() {
                break;
            }
        }
    });

    // 4. Game task
    let game_task = tokio::spawn(run_game(
        game,
        strip.clone(),
        move_rx,
        game_tx,
        dirty.clone(),
        running.clone(),
    ));

    // 5. Render loop: flush dirty frames, redraw the view
    let mut frame_timer = tokio::time::interval(Duration::from_secs(1) / config.game.draw_rate);
    frame_timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut flush_error = None;

    let result: std::io::Result<()> = async {
        loop {
            tokio::select! {
                Some(event) = game_rx.recv() => app.update(event),

                Some(event) = ui_rx.recv() => {
                    if let UiEvent::Key(key) = event {
                        if key.kind != KeyEventKind::Press {
                            continue;
                        }
                        match key.code {
                            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                                running.store(false, Ordering::SeqCst);
                            }
                            KeyCode::Esc | KeyCode::Char('q') => running.store(false, Ordering::SeqCst),
                            KeyCode::Left | KeyCode::Char('a') => {
                                let _ = move_tx.send(Move::RotateLeft);
                            }
                            KeyCode::Right | KeyCode::Char('d') => {
                                let _ = move_tx.send(Move::RotateRight);
                            }
                            _ => {}
                        }
                    }
                    // Ratatui picks up resizes on the next draw.
                }

                _ = frame_timer.tick() => {
                    if dirty.swap(false, Ordering::SeqCst) {
                        if let Err(e) = flush_frame(&strip, app).await {
                            error!("flush failed: {e}");
                            app.fail(e.to_string());
                            flush_error = Some(e);
                            running.store(false, Ordering::SeqCst);
                        }
                    }
                    terminal.draw(|f| app.draw(f))?;
                    if !running.load(Ordering::SeqCst) {
                        break;
                    }
                }
            }
        }
        Ok(())
    }
    .await;

    running.store(false, Ordering::SeqCst);
    let finished = game_task.await.map_err(std::io::Error::other)?;
    let _ = input.await;

    // The game may have painted its last frame after the final tick.
    if flush_error.is_none() && dirty.swap(false, Ordering::SeqCst) {
        if let Err(e) = flush_frame(&strip, app).await {
            error!("flush failed: {e}");
            flush_error = Some(e);
        }
    }

    screen.restore()?;
    result.map(|()| (finished, flush_error))
}

async fn flush_frame(strip: &SharedStrip<UdpSegment>, app: &mut App) -> bline_core::Result<()> {
    let mut strip = strip.lock().await;
    let stats = strip.flush().await?;
    app.record_frame(stats, strip.stats(), strip.as_bytes());
    Ok(())
}

fn init_tracing(logging: &LoggingConfig) -> std::io::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    if logging.file.is_empty() {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::sink)
            .init();
    } else {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&logging.file)?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(std::sync::Mutex::new(file))
            .init();
    }
    Ok(())
}

fn fatal(e: impl Display) -> ! {
    error!("{e}");
    eprintln!("{e}");
    std::process::exit(1);
}
