//! Pixel colours and the fixed-size display frame.
//!
//! # Display geometry
//!
//! The lighthouse is a grid of [`LIGHTHOUSE_ROWS`] × [`LIGHTHOUSE_COLS`]
//! windows, each of which shows one RGB colour.  A [`Frame`] always holds
//! exactly [`LIGHTHOUSE_SIZE`] pixels in row-major order: the first
//! `LIGHTHOUSE_COLS` pixels are the top row, the next `LIGHTHOUSE_COLS` the
//! second row, and so on.
//!
//! # Wire layout
//!
//! ```text
//! [r0][g0][b0][r1][g1][b1] ... [rN][gN][bN]      N = LIGHTHOUSE_SIZE - 1
//! ```
//!
//! Three bytes per pixel, no delimiters, no header.  A buffer whose length is
//! not exactly `3 * LIGHTHOUSE_SIZE` is rejected.

use thiserror::Error;

/// Number of pixel rows on the device.
pub const LIGHTHOUSE_ROWS: usize = 16;

/// Number of pixel columns on the device.
pub const LIGHTHOUSE_COLS: usize = 16;

/// Total number of pixels in a frame.
pub const LIGHTHOUSE_SIZE: usize = LIGHTHOUSE_ROWS * LIGHTHOUSE_COLS;

/// Number of bytes a frame occupies on the wire.
pub const FRAME_BYTES: usize = LIGHTHOUSE_SIZE * 3;

/// Errors produced when building a frame from raw bytes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    /// The buffer is not a whole number of pixels or not one full display.
    #[error("invalid frame length: {len} bytes (expected {FRAME_BYTES})")]
    InvalidLength { len: usize },
}

// ── Color ─────────────────────────────────────────────────────────────────────

/// An RGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Color {
    pub const BLACK: Color = Color::new(0, 0, 0);
    pub const WHITE: Color = Color::new(255, 255, 255);
    pub const RED: Color = Color::new(255, 0, 0);
    pub const GREEN: Color = Color::new(0, 255, 0);
    pub const BLUE: Color = Color::new(0, 0, 255);
    pub const YELLOW: Color = Color::new(255, 255, 0);
    pub const CYAN: Color = Color::new(0, 255, 255);
    pub const MAGENTA: Color = Color::new(255, 0, 255);

    /// Creates a colour from its three channels.
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }
}

// ── Frame ─────────────────────────────────────────────────────────────────────

/// An 'image' to be displayed on the lighthouse.
///
/// The pixel vector is private so the length invariant
/// (`pixels.len() == LIGHTHOUSE_SIZE`) cannot be broken from outside.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Frame {
    pixels: Vec<Color>,
}

impl Frame {
    /// Creates a frame with every pixel set to `color`.
    pub fn fill(color: Color) -> Self {
        Self {
            pixels: vec![color; LIGHTHOUSE_SIZE],
        }
    }

    /// Creates a frame from exactly [`LIGHTHOUSE_SIZE`] pixels.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::InvalidLength`] (expressed in bytes) if the
    /// pixel count does not match the device.
    pub fn from_pixels(pixels: Vec<Color>) -> Result<Self, FrameError> {
        if pixels.len() != LIGHTHOUSE_SIZE {
            return Err(FrameError::InvalidLength {
                len: pixels.len() * 3,
            });
        }
        Ok(Self { pixels })
    }

    /// Decodes a frame from its flat `R,G,B,R,G,B,...` byte layout.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::InvalidLength`] if `bytes.len()` is not a
    /// multiple of 3 or does not describe exactly one full display.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use lighthouse_core::domain::display::{Frame, FRAME_BYTES};
    ///
    /// let frame = Frame::from_bytes(&vec![0u8; FRAME_BYTES]).unwrap();
    /// assert_eq!(frame.to_bytes().len(), FRAME_BYTES);
    /// assert!(Frame::from_bytes(&[1, 2]).is_err());
    /// ```
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FrameError> {
        if bytes.len() % 3 != 0 || bytes.len() / 3 != LIGHTHOUSE_SIZE {
            return Err(FrameError::InvalidLength { len: bytes.len() });
        }

        let pixels = bytes
            .chunks_exact(3)
            .map(|rgb| Color::new(rgb[0], rgb[1], rgb[2]))
            .collect();
        Ok(Self { pixels })
    }

    /// Encodes the frame as `3 * LIGHTHOUSE_SIZE` bytes in R,G,B order.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(FRAME_BYTES);
        for pixel in &self.pixels {
            buf.extend_from_slice(&[pixel.red, pixel.green, pixel.blue]);
        }
        buf
    }

    /// The pixels in row-major order.
    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    /// Returns the pixel at `(row, col)`, or `None` when out of range.
    pub fn get(&self, row: usize, col: usize) -> Option<Color> {
        if row >= LIGHTHOUSE_ROWS || col >= LIGHTHOUSE_COLS {
            return None;
        }
        Some(self.pixels[row * LIGHTHOUSE_COLS + col])
    }

    /// Sets the pixel at `(row, col)`.  Out-of-range coordinates are ignored.
    pub fn set(&mut self, row: usize, col: usize, color: Color) {
        if row < LIGHTHOUSE_ROWS && col < LIGHTHOUSE_COLS {
            self.pixels[row * LIGHTHOUSE_COLS + col] = color;
        }
    }
}

impl Default for Frame {
    /// An all-black frame.
    fn default() -> Self {
        Self::fill(Color::BLACK)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
