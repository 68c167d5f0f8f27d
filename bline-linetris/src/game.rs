//! Linetris game rules.
//!
//! A one-dimensional stacking game. The player's stack grows from
//! pixel 0; a block falls from the far end of the strip one pixel per
//! tick. Landing on a block of the same color and size blows the top
//! block away, anything else adds to the stack. Clearing the stack
//! wins, reaching the end of the strip loses.
//!
//! The game is a pure state machine: [`Game::tick`] advances it and
//! [`Game::draw`] paints the current state into a [`LedStrip`].

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use bline_core::{LedStrip, SegmentSink};

/// Block colors, indexed by [`Block::color`].
pub const PALETTE: [u32; 6] = [0xFF0000, 0x00FF00, 0x0000FF, 0xFFB000, 0x00FFFF, 0xFF00FF];

/// Length of every spawned block, in pixels.
pub const BLOCK_SIZE: usize = 4;

/// Frames in the explosion animation.
pub const EXPLOSION_STEPS: usize = 8;

const SPARK_BASE: usize = 2;
const SPARK_RANGE: usize = 4;

/// A falling block only changes color while this far above the stack.
const RANDOM_CHANGE_CLEARANCE: usize = 60;

// ── Block ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    pub size: usize,
    /// Index into [`PALETTE`].
    pub color: usize,
    pub pos: usize,
}

impl Block {
    pub fn rgb(&self) -> u32 {
        PALETTE[self.color % PALETTE.len()]
    }

    fn matches(&self, other: &Block) -> bool {
        self.color == other.color && self.size == other.size
    }
}

// ── Settings / Phase / Tick ──────────────────────────────────────

/// Starting parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameSettings {
    /// Blocks in the player's stack at start.
    pub blocks: usize,
    /// Initial tick rate in Hz.
    pub speed: u32,
    /// Let falling blocks change color at random.
    pub random_change: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Falling,
    Exploding { step: usize },
    Won,
    Lost,
}

impl Phase {
    pub fn is_over(self) -> bool {
        matches!(self, Phase::Won | Phase::Lost)
    }
}

/// What happened during one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Moved,
    /// The falling block joined the stack.
    Stacked,
    /// A matching landing started the explosion.
    Matched,
    Exploding,
    /// The explosion finished and the top block is gone.
    Cleared,
    Won,
    Lost,
    /// Ticks after the game ended do nothing.
    Idle,
}

/// Player input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Move {
    /// Bottom block goes to the top.
    RotateLeft,
    /// Top block goes to the bottom.
    RotateRight,
}

// ── Game ─────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct Game {
    led_count: usize,
    stack: Vec<Block>,
    drop: Block,
    speed: u32,
    random_change: bool,
    phase: Phase,
    /// Spark positions for the current explosion frame.
    sparks: Vec<usize>,
    rng: StdRng,
}

impl Game {
    pub fn new(settings: GameSettings, led_count: usize) -> Self {
        Self::with_rng(settings, led_count, StdRng::from_os_rng())
    }

    /// Deterministic game for tests and replays.
    pub fn with_rng(settings: GameSettings, led_count: usize, mut rng: StdRng) -> Self {
        let stack = (0..settings.blocks)
            .map(|_| random_block(&mut rng, 0))
            .collect();
        let drop = random_block(&mut rng, led_count);
        Self {
            led_count,
            stack,
            drop,
            speed: settings.speed,
            random_change: settings.random_change,
            phase: Phase::Falling,
            sparks: Vec::new(),
            rng,
        }
    }

    // ── Accessors ────────────────────────────────────────────────

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Current tick rate in Hz.
    pub fn speed(&self) -> u32 {
        self.speed
    }

    pub fn stack(&self) -> &[Block] {
        &self.stack
    }

    pub fn falling(&self) -> &Block {
        &self.drop
    }

    pub fn led_count(&self) -> usize {
        self.led_count
    }

    /// First free pixel above the stack.
    pub fn stack_top(&self) -> usize {
        stack_height(&self.stack)
    }

    // ── Input ────────────────────────────────────────────────────

    /// Rotate the stack. Ignored unless a block is falling.
    pub fn apply(&mut self, mv: Move) {
        if self.phase != Phase::Falling || self.stack.is_empty() {
            return;
        }
        match mv {
            Move::RotateLeft => self.stack.rotate_left(1),
            Move::RotateRight => self.stack.rotate_right(1),
        }
    }

    // ── Update ───────────────────────────────────────────────────

    pub fn tick(&mut self) -> Tick {
        match self.phase {
            Phase::Falling => self.fall(),
            Phase::Exploding { step } => self.explode(step),
            Phase::Won | Phase::Lost => Tick::Idle,
        }
    }

    fn fall(&mut self) -> Tick {
        self.drop.pos = self.drop.pos.saturating_sub(1);
        let top = self.stack_top();

        if self.random_change
            && self.drop.pos > top + RANDOM_CHANGE_CLEARANCE
            && self.rng.random_range(0..100) == 0
        {
            self.drop.color = self.rng.random_range(0..PALETTE.len());
        }

        if self.drop.pos > top {
            return Tick::Moved;
        }
        self.drop.pos = top;

        let matched = self.stack.last().is_some_and(|b| b.matches(&self.drop));
        if matched {
            self.phase = Phase::Exploding { step: 0 };
            self.sparks.clear();
            return Tick::Matched;
        }

        self.stack.push(self.drop);
        if self.drop.pos + self.drop.size >= self.led_count.saturating_sub(1) {
            self.phase = Phase::Lost;
            return Tick::Lost;
        }
        self.respawn();
        Tick::Stacked
    }

    fn explode(&mut self, step: usize) -> Tick {
        if step < EXPLOSION_STEPS {
            let below = &self.stack[..self.stack.len().saturating_sub(1)];
            let mut spark = stack_height(below) + self.drop.size;
            self.sparks.clear();
            for _ in 0..step {
                spark += SPARK_BASE + self.rng.random_range(0..SPARK_RANGE);
                if spark < self.led_count {
                    self.sparks.push(spark);
                }
            }
            self.phase = Phase::Exploding { step: step + 1 };
            return Tick::Exploding;
        }

        self.sparks.clear();
        self.stack.pop();
        if self.stack.is_empty() {
            self.phase = Phase::Won;
            return Tick::Won;
        }
        self.respawn();
        self.phase = Phase::Falling;
        Tick::Cleared
    }

    fn respawn(&mut self) {
        self.drop = random_block(&mut self.rng, self.led_count);
        self.speed += 1;
    }

    // ── Render ───────────────────────────────────────────────────

    /// Paint the current state. Pixels past the strip end are dropped.
    pub fn draw<T: SegmentSink>(&self, strip: &mut LedStrip<T>) {
        strip.clear();

        match self.phase {
            Phase::Falling => {
                draw_block(strip, &self.drop);
                draw_stack(strip, &self.stack);
            }
            Phase::Exploding { step } => {
                let below = &self.stack[..self.stack.len().saturating_sub(1)];
                draw_stack(strip, below);

                // Drawn step is one behind the phase counter.
                let shown = step.saturating_sub(1);
                let blast = Block {
                    size: EXPLOSION_STEPS - shown,
                    color: self.drop.color,
                    pos: stack_height(below),
                };
                draw_block(strip, &blast);
                for &spark in &self.sparks {
                    strip.fill(spark..spark + 1, self.drop.rgb());
                }
            }
            Phase::Won | Phase::Lost => draw_stack(strip, &self.stack),
        }
    }
}

// ── Helpers ──────────────────────────────────────────────────────

fn random_block(rng: &mut StdRng, pos: usize) -> Block {
    Block {
        size: BLOCK_SIZE,
        color: rng.random_range(0..PALETTE.len()),
        pos,
    }
}

/// Pixels covered by `blocks` stacked with one-pixel gaps.
fn stack_height(blocks: &[Block]) -> usize {
    blocks.iter().map(|b| b.size + 1).sum()
}

fn draw_block<T: SegmentSink>(strip: &mut LedStrip<T>, block: &Block) {
    strip.fill(block.pos..block.pos + block.size, block.rgb());
}

fn draw_stack<T: SegmentSink>(strip: &mut LedStrip<T>, blocks: &[Block]) {
    let mut pos = 0;
    for block in blocks {
        draw_block(strip, &Block { pos, ..*block });
        pos += block.size + 1;
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::io;

    use async_trait::async_trait;
    use bline_core::{Brightness, Rgb, Segment, SegmentConfig};

    use super::*;

    #[derive(Debug)]
    struct Null;

    #[async_trait]
    impl SegmentSink for Null {
        async fn send(&mut self, _frame: &[u8]) -> io::Result<()> {
            Ok(())
        }

        async fn close(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn strip(leds: usize) -> LedStrip<Null> {
        LedStrip::from_segments(
            vec![Segment::new(SegmentConfig::new("null", 1, leds), Null)],
            Brightness::FULL,
        )
        .unwrap()
    }

    fn settings(blocks: usize) -> GameSettings {
        GameSettings {
            blocks,
            speed: 40,
            random_change: false,
        }
    }

    fn game(blocks: usize, leds: usize) -> Game {
        Game::with_rng(settings(blocks), leds, StdRng::seed_from_u64(7))
    }

    fn block(color: usize) -> Block {
        Block {
            size: BLOCK_SIZE,
            color,
            pos: 0,
        }
    }

    /// Tick until something other than a plain move happens.
    fn run_until_event(game: &mut Game) -> Tick {
        loop {
            match game.tick() {
                Tick::Moved => continue,
                other => return other,
            }
        }
    }

    #[test]
    fn initial_state() {
        let g = game(4, 100);
        assert_eq!(g.stack().len(), 4);
        assert_eq!(g.stack_top(), 20);
        assert_eq!(g.falling().pos, 100);
        assert_eq!(g.phase(), Phase::Falling);
        assert!(g.stack().iter().all(|b| b.size == BLOCK_SIZE));
    }

    #[test]
    fn block_falls_one_pixel_per_tick() {
        let mut g = game(2, 50);
        assert_eq!(g.tick(), Tick::Moved);
        assert_eq!(g.falling().pos, 49);
        assert_eq!(g.tick(), Tick::Moved);
        assert_eq!(g.falling().pos, 48);
    }

    #[test]
    fn rotation() {
        let mut g = game(3, 50);
        g.stack = vec![block(0), block(1), block(2)];

        g.apply(Move::RotateLeft);
        let colors: Vec<_> = g.stack().iter().map(|b| b.color).collect();
        assert_eq!(colors, vec![1, 2, 0]);

        g.apply(Move::RotateRight);
        g.apply(Move::RotateRight);
        let colors: Vec<_> = g.stack().iter().map(|b| b.color).collect();
        assert_eq!(colors, vec![2, 0, 1]);
    }

    #[test]
    fn mismatch_stacks_and_speeds_up() {
        let mut g = game(1, 60);
        g.stack = vec![block(0)];
        g.drop.color = 1;

        assert_eq!(run_until_event(&mut g), Tick::Stacked);
        assert_eq!(g.stack().len(), 2);
        assert_eq!(g.stack()[1].color, 1);
        assert_eq!(g.speed(), 41);
        assert_eq!(g.falling().pos, 60);
        assert_eq!(g.phase(), Phase::Falling);
    }

    #[test]
    fn match_explodes_then_clears() {
        let mut g = game(2, 60);
        g.stack = vec![block(3), block(5)];
        g.drop.color = 5;

        assert_eq!(run_until_event(&mut g), Tick::Matched);
        assert_eq!(g.phase(), Phase::Exploding { step: 0 });

        // Input is ignored mid-explosion.
        g.apply(Move::RotateLeft);
        assert_eq!(g.stack()[1].color, 5);

        for step in 1..=EXPLOSION_STEPS {
            assert_eq!(g.tick(), Tick::Exploding);
            assert_eq!(g.phase(), Phase::Exploding { step });
        }
        assert_eq!(g.tick(), Tick::Cleared);
        assert_eq!(g.stack().len(), 1);
        assert_eq!(g.speed(), 41);
        assert_eq!(g.phase(), Phase::Falling);
    }

    #[test]
    fn clearing_last_block_wins() {
        let mut g = game(1, 30);
        g.stack = vec![block(2)];
        g.drop.color = 2;

        assert_eq!(run_until_event(&mut g), Tick::Matched);
        let mut last = Tick::Idle;
        for _ in 0..=EXPLOSION_STEPS {
            last = g.tick();
        }
        assert_eq!(last, Tick::Won);
        assert!(g.phase().is_over());
        assert_eq!(g.tick(), Tick::Idle);
    }

    #[test]
    fn reaching_strip_end_loses() {
        // Stack top sits at 10; a 4-pixel block there ends at the last pixel.
        let mut g = game(2, 15);
        g.stack = vec![block(0), block(1)];
        g.drop.color = 2;

        assert_eq!(run_until_event(&mut g), Tick::Lost);
        assert_eq!(g.phase(), Phase::Lost);
    }

    #[test]
    fn short_strip_still_lands() {
        // Drop spawns below the stack top; it must not fall forever.
        let mut g = game(4, 10);
        g.drop.color = (g.stack()[3].color + 1) % PALETTE.len();
        assert_eq!(g.tick(), Tick::Lost);
    }

    #[test]
    fn draw_falling_frame() {
        let mut g = game(2, 20);
        g.stack = vec![block(0), block(2)];
        g.drop = Block {
            size: BLOCK_SIZE,
            color: 1,
            pos: 15,
        };
        let mut s = strip(20);
        g.draw(&mut s);

        assert_eq!(s.get_pixel(0).unwrap(), Rgb::from(PALETTE[0]));
        assert_eq!(s.get_pixel(3).unwrap(), Rgb::from(PALETTE[0]));
        assert_eq!(s.get_pixel(4).unwrap(), Rgb::BLACK);
        assert_eq!(s.get_pixel(5).unwrap(), Rgb::from(PALETTE[2]));
        assert_eq!(s.get_pixel(10).unwrap(), Rgb::BLACK);
        assert_eq!(s.get_pixel(15).unwrap(), Rgb::from(PALETTE[1]));
        assert_eq!(s.get_pixel(19).unwrap(), Rgb::BLACK);
    }

    #[test]
    fn draw_clips_spawned_block() {
        let g = game(1, 12);
        let mut s = strip(12);
        g.draw(&mut s);
        // The new block sits just past the end; only the stack shows.
        assert_eq!(s.get_pixel(11).unwrap(), Rgb::BLACK);
    }

    #[test]
    fn draw_explosion_shrinks() {
        let mut g = game(2, 80);
        g.stack = vec![block(1), block(4)];
        g.drop.color = 4;
        run_until_event(&mut g);

        let mut s = strip(80);
        g.tick();
        g.draw(&mut s);
        // Blast starts where the top block sat, full width on the first frame.
        for px in 5..13 {
            assert_eq!(s.get_pixel(px).unwrap(), Rgb::from(PALETTE[4]), "px {px}");
        }

        g.tick();
        g.draw(&mut s);
        assert_eq!(s.get_pixel(11).unwrap(), Rgb::from(PALETTE[4]));

        // One spark flies somewhere past the blast.
        assert_eq!(g.sparks.len(), 1);
        let spark = g.sparks[0];
        assert!((11..15).contains(&spark), "spark {spark}");
        for px in 12..16 {
            let expected = if px == spark {
                Rgb::from(PALETTE[4])
            } else {
                Rgb::BLACK
            };
            assert_eq!(s.get_pixel(px).unwrap(), expected, "px {px}");
        }
    }
}
