use ratatui::{
    Frame,
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, List, ListItem, Paragraph, Widget, Wrap},
};

use bline_core::{BYTES_PER_PIXEL, FrameStats, ThroughputMeter};

use crate::game::Phase;

/// Log lines kept for the message pane.
const MAX_LOGS: usize = 200;

#[derive(Debug, Clone)]
pub enum UiEvent {
    Key(crossterm::event::KeyEvent),
    Resize(u16, u16),
}

/// Updates published by the game task.
#[derive(Debug, Clone)]
pub enum GameEvent {
    Log(String),
    Status {
        speed: u32,
        stack: usize,
        phase: Phase,
    },
}

#[derive(Debug, Default)]
pub struct FrameInfo {
    pub frames: u64,
    pub fps: f64,
    pub bytes_per_sec: u64,
    pub last: FrameStats,
}

#[derive(Debug)]
pub struct App {
    pub led_count: usize,
    pub segments: usize,
    pub speed: u32,
    pub stack: usize,
    pub phase: Phase,
    /// Unscaled strip colors, one entry per pixel.
    pub preview: Vec<(u8, u8, u8)>,
    pub frame: FrameInfo,
    pub logs: Vec<String>,
    pub error: Option<String>,
}

impl App {
    pub fn new(led_count: usize, segments: usize, speed: u32) -> Self {
        Self {
            led_count,
            segments,
            speed,
            stack: 0,
            phase: Phase::Falling,
            preview: vec![(0, 0, 0); led_count],
            frame: FrameInfo::default(),
            logs: vec![
                "Welcome to Linetris".to_string(),
                "a/← rotate left, d/→ rotate right, Esc quits".to_string(),
            ],
            error: None,
        }
    }

    pub fn update(&mut self, event: GameEvent) {
        match event {
            GameEvent::Log(line) => self.log(line),
            GameEvent::Status {
                speed,
                stack,
                phase,
            } => {
                self.speed = speed;
                self.stack = stack;
                self.phase = phase;
            }
        }
    }

    pub fn log(&mut self, line: String) {
        self.logs.push(line);
        if self.logs.len() > MAX_LOGS {
            let excess = self.logs.len() - MAX_LOGS;
            self.logs.drain(..excess);
        }
    }

    /// Record a flushed frame and the strip contents it carried.
    pub fn record_frame(&mut self, stats: FrameStats, meter: &ThroughputMeter, bytes: &[u8]) {
        self.frame.frames = meter.total_frames();
        self.frame.fps = meter.frames_per_sec();
        self.frame.bytes_per_sec = meter.bytes_per_sec();
        self.frame.last = stats;
        if stats.truncated {
            self.log("warning: frame truncated, check the segment layout".to_string());
        }
        self.preview = bytes
            .chunks_exact(BYTES_PER_PIXEL)
            .map(|px| (px[0], px[1], px[2]))
            .collect();
    }

    pub fn fail(&mut self, message: String) {
        self.log(format!("error: {message}"));
        self.error = Some(message);
    }

    pub fn draw(&mut self, frame: &mut Frame) {
        let area = frame.area();
        let buf = frame.buffer_mut();

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(5),
                Constraint::Length(8),
            ])
            .split(area);

        self.render_status(layout[0], buf);
        self.render_strip(layout[1], buf);
        self.render_logs(layout[2], buf);
    }

    fn render_status(&self, area: Rect, buf: &mut Buffer) {
        let (label, color) = match self.phase {
            Phase::Falling => ("PLAYING", Color::Green),
            Phase::Exploding { .. } => ("MATCH!", Color::Yellow),
            Phase::Won => ("YOU WIN", Color::Cyan),
            Phase::Lost => ("GAME OVER", Color::Red),
        };

        let status = Line::from(vec![
            Span::styled(
                format!(" {label} "),
                Style::default()
                    .bg(color)
                    .fg(Color::Black)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!("  speed {} Hz", self.speed)),
            Span::raw(format!("  stack {}", self.stack)),
            Span::styled(
                format!(
                    "  {} leds / {} segments  {:.0} fps  {:.1} KiB/s",
                    self.led_count,
                    self.segments,
                    self.frame.fps,
                    self.frame.bytes_per_sec as f64 / 1024.0,
                ),
                Style::default().fg(Color::Gray),
            ),
        ]);

        Paragraph::new(status)
            .block(
                Block::bordered()
                    .title(Span::styled(
                        " Linetris ",
                        Style::default()
                            .fg(Color::Cyan)
                            .add_modifier(Modifier::BOLD),
                    ))
                    .border_style(Style::default().fg(Color::DarkGray)),
            )
            .render(area, buf);
    }

    fn render_strip(&self, area: Rect, buf: &mut Buffer) {
        let pixels: Vec<Span> = self
            .preview
            .iter()
            .map(|&(r, g, b)| {
                if (r, g, b) == (0, 0, 0) {
                    Span::styled("·", Style::default().fg(Color::DarkGray))
                } else {
                    Span::styled("█", Style::default().fg(Color::Rgb(r, g, b)))
                }
            })
            .collect();

        Paragraph::new(Line::from(pixels))
            .wrap(Wrap { trim: false })
            .block(
                Block::bordered()
                    .title(format!(" Strip ({} frames) ", self.frame.frames))
                    .border_style(Style::default().fg(Color::DarkGray)),
            )
            .render(area, buf);
    }

    fn render_logs(&self, area: Rect, buf: &mut Buffer) {
        let visible = area.height.saturating_sub(2) as usize;
        let start = self.logs.len().saturating_sub(visible);
        let items: Vec<ListItem> = self.logs[start..]
            .iter()
            .map(|line| {
                let style = if line.starts_with("error") {
                    Style::default().fg(Color::Red)
                } else if line.starts_with("warning") {
                    Style::default().fg(Color::Yellow)
                } else {
                    Style::default()
                };
                ListItem::new(line.as_str()).style(style)
            })
            .collect();

        List::new(items)
            .block(
                Block::bordered()
                    .title(" Messages ")
                    .border_style(Style::default().fg(Color::DarkGray)),
            )
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_event_updates_fields() {
        let mut app = App::new(10, 2, 40);
        app.update(GameEvent::Status {
            speed: 42,
            stack: 5,
            phase: Phase::Lost,
        });
        assert_eq!(app.speed, 42);
        assert_eq!(app.stack, 5);
        assert_eq!(app.phase, Phase::Lost);
    }

    #[test]
    fn log_is_bounded() {
        let mut app = App::new(1, 1, 1);
        for i in 0..(MAX_LOGS + 50) {
            app.update(GameEvent::Log(format!("line {i}")));
        }
        assert_eq!(app.logs.len(), MAX_LOGS);
        assert_eq!(app.logs.last().unwrap(), &format!("line {}", MAX_LOGS + 49));
    }

    #[test]
    fn frame_updates_preview() {
        let mut app = App::new(2, 1, 1);
        let mut meter = ThroughputMeter::new();
        meter.record(6);
        let stats = FrameStats {
            segments_sent: 1,
            bytes_sent: 6,
            truncated: true,
        };
        app.record_frame(stats, &meter, &[1, 2, 3, 4, 5, 6]);
        assert_eq!(app.preview, vec![(1, 2, 3), (4, 5, 6)]);
        assert_eq!(app.frame.frames, 1);
        assert!(app.logs.last().unwrap().starts_with("warning"));
    }
}
