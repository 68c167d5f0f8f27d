//! # bline-core
//!
//! One logical LED strip spread over several network controllers.
//!
//! This crate contains:
//! - **Color**: `split_rgb` / `combine_rgb` and the `Rgb` pixel type
//! - **Config**: `StripConfig` / `SegmentConfig` loaded from JSON or TOML
//! - **Transport**: `SegmentSink` trait and the `UdpSegment` implementation
//! - **Strip**: `LedStrip`, the frame buffer that slices, reverses,
//!   dims, and sends each frame to its segments
//! - **Stats**: `FrameStats` and the rolling `ThroughputMeter`
//! - **Error**: `BlineError`, typed, `thiserror`-based error hierarchy

pub mod color;
pub mod config;
pub mod error;
pub mod stats;
pub mod strip;
pub mod transport;

// ── Re-exports for ergonomic usage ───────────────────────────────

pub use color::{BYTES_PER_PIXEL, Rgb, combine_rgb, split_rgb};
pub use config::{MAX_SEGMENT_LEDS, SegmentConfig, StripConfig};
pub use error::{BlineError, CloseFailure, Result};
pub use stats::{FrameStats, ThroughputMeter};
pub use strip::{Brightness, LedStrip, Segment};
pub use transport::{SegmentSink, UdpSegment};
