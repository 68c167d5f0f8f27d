//! Segment configuration.
//!
//! The strip layout is an ordered list of controllers. Two file
//! formats are accepted:
//!
//! ```text
//! strip.json   {"Servers": [{"Address": "10.0.0.5", "Port": 7777, "LedCount": 150, "Reverse": false}]}
//! strip.toml   [[servers]]
//!              address = "10.0.0.5"
//!              port = 7777
//!              led_count = 150
//!              reverse = false
//! ```
//!
//! Unlike the application config, a strip config that cannot be read
//! is fatal: there are no sensible default controllers.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::color::BYTES_PER_PIXEL;
use crate::error::{BlineError, Result};

/// Largest payload a single UDP datagram can carry over IPv4.
pub const MAX_DATAGRAM_SIZE: usize = 65_507;

/// Most pixels a single segment can address in one datagram.
pub const MAX_SEGMENT_LEDS: usize = MAX_DATAGRAM_SIZE / BYTES_PER_PIXEL;

// ── SegmentConfig ────────────────────────────────────────────────

/// One controller's share of the strip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentConfig {
    /// Host name or IP of the controller.
    #[serde(alias = "Address")]
    pub address: String,
    /// UDP port the controller listens on.
    #[serde(alias = "Port")]
    pub port: u16,
    /// Number of pixels driven by this controller.
    #[serde(alias = "LedCount")]
    pub led_count: usize,
    /// The physical strip runs against the logical index direction.
    #[serde(alias = "Reverse", default)]
    pub reverse: bool,
}

impl SegmentConfig {
    pub fn new(address: impl Into<String>, port: u16, led_count: usize) -> Self {
        Self {
            address: address.into(),
            port,
            led_count,
            reverse: false,
        }
    }

    pub fn reversed(mut self) -> Self {
        self.reverse = true;
        self
    }

    /// `host:port` as used in logs and errors.
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }
}

impl fmt::Display for SegmentConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} leds", self.endpoint(), self.led_count)?;
        if self.reverse {
            f.write_str(", reversed")?;
        }
        f.write_str(")")
    }
}

// ── StripConfig ──────────────────────────────────────────────────

/// Ordered list of segments forming one logical strip.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StripConfig {
    #[serde(alias = "Servers")]
    pub servers: Vec<SegmentConfig>,
}

impl StripConfig {
    pub fn new(servers: Vec<SegmentConfig>) -> Self {
        Self { servers }
    }

    /// Load from disk. `.toml` files are parsed as TOML, anything
    /// else as JSON.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| BlineError::Config(format!("cannot read {}: {e}", path.display())))?;

        let is_toml = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
        let config = if is_toml {
            Self::from_toml(&text)?
        } else {
            Self::from_json(&text)?
        };

        tracing::debug!(
            "loaded {} segment(s) from {}",
            config.servers.len(),
            path.display()
        );
        Ok(config)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject layouts that could never be flushed in full.
    ///
    /// Empty addresses are left to [`UdpSegment::open`](crate::UdpSegment::open)
    /// so they surface as [`BlineError::Address`].
    pub fn validate(&self) -> Result<()> {
        for (idx, seg) in self.servers.iter().enumerate() {
            if seg.led_count > MAX_SEGMENT_LEDS {
                return Err(BlineError::Config(format!(
                    "segment {idx} ({}) has {} leds; one datagram holds at most {MAX_SEGMENT_LEDS}",
                    seg.endpoint(),
                    seg.led_count,
                )));
            }
        }
        self.servers
            .iter()
            .try_fold(0usize, |acc, seg| acc.checked_add(seg.led_count))
            .and_then(|total| total.checked_mul(BYTES_PER_PIXEL))
            .ok_or_else(|| BlineError::Config("total led count overflows".into()))?;
        Ok(())
    }

    /// Sum of all segment lengths.
    pub fn led_count(&self) -> usize {
        self.servers.iter().map(|s| s.led_count).sum()
    }
}

// ── Tests ────────────────────────────────────────────────────────
