//! The logical LED strip.
//!
//! [`LedStrip`] owns one flat RGB buffer covering every pixel of every
//! segment, in configuration order. Pixel writes only touch the
//! buffer; [`flush`](LedStrip::flush) slices it per segment, applies
//! orientation and brightness, and sends one datagram per segment.
//!
//! ```text
//! buffer:   | seg 0 (n0 px) | seg 1 (n1 px, reversed) | seg 2 ... |
//!                 │                   │
//!           scale by brightness   reverse pixel order, then scale
//!                 ▼                   ▼
//!            datagram → ctl 0     datagram → ctl 1          ...
//! ```

use crate::color::{BYTES_PER_PIXEL, Rgb, split_rgb};
use crate::config::{SegmentConfig, StripConfig};
use crate::error::{BlineError, CloseFailure, Result};
use crate::stats::{FrameStats, ThroughputMeter};
use crate::transport::{SegmentSink, UdpSegment};

// ── Brightness ───────────────────────────────────────────────────

/// Global channel scale in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Brightness(f64);

impl Brightness {
    pub const FULL: Brightness = Brightness(1.0);

    /// Derive the factor from a 0–255 level. Out-of-range levels are
    /// clamped first.
    pub fn from_level(level: i64) -> Self {
        Self(level.clamp(0, 255) as f64 / 255.0)
    }

    pub fn factor(self) -> f64 {
        self.0
    }

    /// Scale one channel byte, truncating toward zero.
    pub fn scale(self, channel: u8) -> u8 {
        (f64::from(channel) * self.0) as u8
    }
}

impl Default for Brightness {
    fn default() -> Self {
        Self::FULL
    }
}

// ── Segment ──────────────────────────────────────────────────────

/// One controller with its place in the strip.
#[derive(Debug)]
pub struct Segment<T> {
    config: SegmentConfig,
    sink: T,
}

impl<T> Segment<T> {
    pub fn new(config: SegmentConfig, sink: T) -> Self {
        Self { config, sink }
    }

    pub fn config(&self) -> &SegmentConfig {
        &self.config
    }

    pub fn sink(&self) -> &T {
        &self.sink
    }

    fn byte_len(&self) -> usize {
        self.config.led_count * BYTES_PER_PIXEL
    }
}

// ── LedStrip ─────────────────────────────────────────────────────

/// A logical pixel buffer distributed across segment controllers.
///
/// All mutation goes through `&mut self`; callers driving the strip
/// from several tasks must wrap it in a mutex.
#[derive(Debug)]
pub struct LedStrip<T = UdpSegment> {
    segments: Vec<Segment<T>>,
    buffer: Vec<u8>,
    led_count: usize,
    brightness: Brightness,
    meter: ThroughputMeter,
}

impl LedStrip<UdpSegment> {
    /// Open one UDP segment per configured controller, in order.
    ///
    /// The first failure aborts setup; sockets opened before it are
    /// released when the partial list is dropped.
    pub async fn connect(config: &StripConfig, brightness: Brightness) -> Result<Self> {
        config.validate()?;

        let mut segments = Vec::with_capacity(config.servers.len());
        for (idx, seg) in config.servers.iter().enumerate() {
            let sink = UdpSegment::open(&seg.address, seg.port)
                .await
                .inspect_err(|e| tracing::error!("segment {idx} ({seg}): {e}"))?;
            segments.push(Segment::new(seg.clone(), sink));
        }

        let strip = Self::from_segments(segments, brightness)?;
        tracing::info!(
            "strip ready: {} segment(s), {} leds, brightness {:.3}",
            strip.segments.len(),
            strip.led_count,
            brightness.factor(),
        );
        Ok(strip)
    }
}

impl<T: SegmentSink> LedStrip<T> {
    /// Build a strip over already-opened sinks.
    ///
    /// Fails with [`BlineError::Config`] when the total buffer size
    /// does not fit in memory addressing.
    pub fn from_segments(segments: Vec<Segment<T>>, brightness: Brightness) -> Result<Self> {
        let led_count = segments
            .iter()
            .try_fold(0usize, |acc, s| acc.checked_add(s.config.led_count))
            .ok_or_else(|| BlineError::Config("total led count overflows".into()))?;
        let byte_len = led_count
            .checked_mul(BYTES_PER_PIXEL)
            .ok_or_else(|| BlineError::Config(format!("{led_count} leds overflow the buffer")))?;
        Ok(Self {
            segments,
            buffer: vec![0; byte_len],
            led_count,
            brightness,
            meter: ThroughputMeter::new(),
        })
    }

    // ── Accessors ────────────────────────────────────────────────

    /// Total pixels across all segments.
    pub fn led_count(&self) -> usize {
        self.led_count
    }

    pub fn brightness(&self) -> Brightness {
        self.brightness
    }

    pub fn segments(&self) -> &[Segment<T>] {
        &self.segments
    }

    /// The unscaled logical buffer, `led_count * 3` bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    pub fn stats(&self) -> &ThroughputMeter {
        &self.meter
    }

    // ── Pixels ───────────────────────────────────────────────────

    /// Reset every pixel to black.
    pub fn clear(&mut self) {
        self.buffer.fill(0);
    }

    /// Write `0xRRGGBB` at `index`.
    pub fn set_pixel(&mut self, index: usize, color: u32) -> Result<()> {
        let offset = self.offset(index)?;
        let (r, g, b) = split_rgb(color);
        self.buffer[offset..offset + BYTES_PER_PIXEL].copy_from_slice(&[r, g, b]);
        Ok(())
    }

    /// Read back the channel bytes at `index`.
    pub fn get_pixel(&self, index: usize) -> Result<Rgb> {
        let offset = self.offset(index)?;
        let px = &self.buffer[offset..offset + BYTES_PER_PIXEL];
        Ok(Rgb::new(px[0], px[1], px[2]))
    }

    /// Set every pixel in `range` that lies on the strip, ignoring the
    /// rest. Returns how many pixels were written.
    pub fn fill(&mut self, range: std::ops::Range<usize>, color: u32) -> usize {
        let end = range.end.min(self.led_count);
        let start = range.start.min(end);
        let px = Rgb::from(color).to_array();
        for chunk in self.buffer[start * BYTES_PER_PIXEL..end * BYTES_PER_PIXEL]
            .chunks_exact_mut(BYTES_PER_PIXEL)
        {
            chunk.copy_from_slice(&px);
        }
        end - start
    }

    fn offset(&self, index: usize) -> Result<usize> {
        if index >= self.led_count {
            return Err(BlineError::IndexOutOfRange {
                index,
                len: self.led_count,
            });
        }
        Ok(index * BYTES_PER_PIXEL)
    }

    // ── Frame ────────────────────────────────────────────────────

    /// Send the current buffer to every segment, in order.
    ///
    /// A failed send aborts the frame: later segments receive nothing.
    /// The buffer itself is left untouched.
    pub async fn flush(&mut self) -> Result<FrameStats> {
        let usable = self.buffer.len() - self.buffer.len() % BYTES_PER_PIXEL;
        let frame = &self.buffer[..usable];
        let brightness = self.brightness;

        let mut stats = FrameStats::default();
        let mut offset = 0;
        for (idx, segment) in self.segments.iter_mut().enumerate() {
            let end = offset + segment.byte_len();
            // Checked before sending, so a trailing empty segment still gets its datagram.
            if end > frame.len() {
                tracing::warn!(
                    "frame truncated: segment {idx} ({}) needs bytes {offset}..{end}, buffer has {}",
                    segment.config,
                    frame.len(),
                );
                stats.truncated = true;
                break;
            }

            let payload = render_segment(&frame[offset..end], segment.config.reverse, brightness);
            segment
                .sink
                .send(&payload)
                .await
                .map_err(|source| BlineError::Send {
                    segment: idx,
                    endpoint: segment.config.endpoint(),
                    source,
                })?;

            stats.segments_sent += 1;
            stats.bytes_sent += payload.len();
            offset = end;
        }

        self.meter.record(stats.bytes_sent as u64);
        Ok(stats)
    }

    /// Close every segment, in order, even if some fail.
    pub async fn close(&mut self) -> Result<()> {
        let mut failures = Vec::new();
        for (idx, segment) in self.segments.iter_mut().enumerate() {
            if let Err(source) = segment.sink.close().await {
                tracing::warn!("closing segment {idx} ({}): {source}", segment.config);
                failures.push(CloseFailure {
                    segment: idx,
                    endpoint: segment.config.endpoint(),
                    source,
                });
            }
        }
        tracing::info!("strip closed ({} failure(s))", failures.len());

        if failures.is_empty() {
            Ok(())
        } else {
            Err(BlineError::Close(failures))
        }
    }
}

// ── Transforms ───────────────────────────────────────────────────

/// Produce the datagram for one segment's slice of the frame.
///
/// `slice.len()` must be a multiple of [`BYTES_PER_PIXEL`].
pub fn render_segment(slice: &[u8], reverse: bool, brightness: Brightness) -> Vec<u8> {
    let mut out = if reverse {
        reverse_pixels(slice)
    } else {
        slice.to_vec()
    };
    for byte in &mut out {
        *byte = brightness.scale(*byte);
    }
    out
}

/// Reverse pixel order while keeping `R, G, B` order inside each pixel.
pub fn reverse_pixels(slice: &[u8]) -> Vec<u8> {
    let len = slice.len();
    let mut out = vec![0u8; len];
    for (idx, &byte) in slice.iter().enumerate() {
        let dst = (len - idx - 1) / BYTES_PER_PIXEL * BYTES_PER_PIXEL + idx % BYTES_PER_PIXEL;
        out[dst] = byte;
    }
    out
}

// ── Tests ────────────────────────────────────────────────────────
