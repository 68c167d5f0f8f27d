//! The game loop task.
//!
//! Input, game ticks and frame flushes run as separate tasks, so the
//! strip is shared behind a mutex. The game task paints into it and
//! raises `dirty`; the render loop flushes only dirty frames.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::{Mutex, mpsc};

use bline_core::{LedStrip, SegmentSink};

use crate::app::GameEvent;
use crate::game::{Game, Move, Tick};

/// A strip shared between the game and render loops.
pub type SharedStrip<T> = Arc<Mutex<LedStrip<T>>>;

/// Run `game` until it ends or `running` is cleared.
///
/// Returns the finished game so the caller can report the final speed.
pub async fn run_game<T: SegmentSink>(
    mut game: Game,
    strip: SharedStrip<T>,
    mut moves: mpsc::UnboundedReceiver<Move>,
    events: mpsc::UnboundedSender<GameEvent>,
    dirty: Arc<AtomicBool>,
    running: Arc<AtomicBool>,
) -> Game {
    while running.load(Ordering::SeqCst) {
        while let Ok(mv) = moves.try_recv() {
            game.apply(mv);
        }

        let tick = game.tick();
        {
            let mut strip = strip.lock().await;
            game.draw(&mut *strip);
        }
        dirty.store(true, Ordering::SeqCst);

        let _ = events.send(GameEvent::Status {
            speed: game.speed(),
            stack: game.stack().len(),
            phase: game.phase(),
        });
        if let Some(line) = describe(tick, &game) {
            tracing::info!("{line}");
            let _ = events.send(GameEvent::Log(line));
        }

        if game.phase().is_over() {
            running.store(false, Ordering::SeqCst);
            break;
        }

        tokio::time::sleep(Duration::from_secs(1) / game.speed().max(1)).await;
    }
    game
}

fn describe(tick: Tick, game: &Game) -> Option<String> {
    let line = match tick {
        Tick::Stacked => format!("stacked, {} blocks high", game.stack().len()),
        Tick::Matched => "match!".to_string(),
        Tick::Cleared => format!("cleared, {} blocks left", game.stack().len()),
        Tick::Won => "stack cleared, you win".to_string(),
        Tick::Lost => "the stack reached the end, game over".to_string(),
        Tick::Moved | Tick::Exploding | Tick::Idle => return None,
    };
    Some(line)
}
