//! Packed 24-bit RGB helpers.
//!
//! Colors travel through the public API as `0xRRGGBB` integers and
//! are stored in the frame buffer as three channel bytes.

/// Bytes occupied by one pixel in the frame buffer and on the wire.
pub const BYTES_PER_PIXEL: usize = 3;

// ── Rgb ──────────────────────────────────────────────────────────

/// One pixel's channel bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Pack into `0xRRGGBB`.
    pub const fn packed(self) -> u32 {
        combine_rgb(self.r, self.g, self.b)
    }

    pub const fn to_array(self) -> [u8; BYTES_PER_PIXEL] {
        [self.r, self.g, self.b]
    }
}

impl From<u32> for Rgb {
    fn from(color: u32) -> Self {
        let (r, g, b) = split_rgb(color);
        Self { r, g, b }
    }
}

impl From<Rgb> for u32 {
    fn from(rgb: Rgb) -> Self {
        rgb.packed()
    }
}

impl From<Rgb> for (u8, u8, u8) {
    fn from(rgb: Rgb) -> Self {
        (rgb.r, rgb.g, rgb.b)
    }
}

// ── Packing ──────────────────────────────────────────────────────

/// Split `0xRRGGBB` into `(r, g, b)`. Bits above 23 are ignored.
pub const fn split_rgb(color: u32) -> (u8, u8, u8) {
    (
        ((color >> 16) & 0xFF) as u8,
        ((color >> 8) & 0xFF) as u8,
        (color & 0xFF) as u8,
    )
}

/// Pack three channel bytes into `0xRRGGBB`.
pub const fn combine_rgb(r: u8, g: u8, b: u8) -> u32 {
    (r as u32) << 16 | (g as u32) << 8 | b as u32
}
