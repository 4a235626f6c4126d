//! Window template
//!
//! The square window centered on the pixel under test has side
//! `1 + 2*(guard_win + bg_win)`. Cells inside the central
//! `(2*guard_win + 1)` square form the guard region; the surrounding
//! annulus of width `bg_win` is the background region.
//!
//! ```text
//! guard_win = 1, bg_win = 1 (width 5)
//!
//!   B B B B B
//!   B . . . B
//!   B . x . B      x: center, .: guard, B: background
//!   B . . . B
//!   B B B B B
//! ```

use crate::{AnomalyError, AnomalyResult};

/// Largest supported window side
pub const MAX_WINDOW_WIDTH: u32 = 1 << 12;

/// Immutable background-sampling mask for one detector run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowTemplate {
    guard_win: u32,
    bg_win: u32,
    width: u32,
    /// Row-major, `true` = background
    cells: Vec<bool>,
    /// `(row, col)` offsets from the window's top-left corner of every
    /// background cell, column-major
    offsets: Vec<(u32, u32)>,
}

impl WindowTemplate {
    /// Build the template for the given radii.
    ///
    /// # Errors
    ///
    /// Returns `AnomalyError::InvalidParameter` if `bg_win` is 0 or the
    /// window is wider than [`MAX_WINDOW_WIDTH`].
    pub fn new(guard_win: u32, bg_win: u32) -> AnomalyResult<Self> {
        if bg_win == 0 {
            return Err(AnomalyError::InvalidParameter(
                "bg_win must be >= 1".into(),
            ));
        }
        let width = guard_win
            .checked_add(bg_win)
            .and_then(|h| h.checked_mul(2))
            .and_then(|w| w.checked_add(1))
            .filter(|&w| w <= MAX_WINDOW_WIDTH)
            .ok_or_else(|| {
                AnomalyError::InvalidParameter(format!(
                    "window too large: guard_win={guard_win}, bg_win={bg_win}"
                ))
            })?;

        let guard_end = width - bg_win;
        let in_guard = |r: u32, c: u32| {
            (bg_win..guard_end).contains(&r) && (bg_win..guard_end).contains(&c)
        };

        let mut cells = Vec::with_capacity((width as usize) * (width as usize));
        for r in 0..width {
            for c in 0..width {
                cells.push(!in_guard(r, c));
            }
        }

        let mut offsets = Vec::new();
        for c in 0..width {
            for r in 0..width {
                if !in_guard(r, c) {
                    offsets.push((r, c));
                }
            }
        }

        Ok(WindowTemplate {
            guard_win,
            bg_win,
            width,
            cells,
            offsets,
        })
    }

    /// Guard window radius
    #[inline]
    pub fn guard_win(&self) -> u32 {
        self.guard_win
    }

    /// Background window radius
    #[inline]
    pub fn bg_win(&self) -> u32 {
        self.bg_win
    }

    /// Distance from the window center to its edge
    #[inline]
    pub fn half_width(&self) -> u32 {
        self.guard_win + self.bg_win
    }

    /// Side length of the square window
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Whether the cell at `(row, col)` (window coordinates) is background.
    ///
    /// Cells outside the window are not background.
    pub fn is_background(&self, row: u32, col: u32) -> bool {
        if row >= self.width || col >= self.width {
            return false;
        }
        self.cells[(row as usize) * (self.width as usize) + (col as usize)]
    }

    /// Number of background cells
    #[inline]
    pub fn background_count(&self) -> usize {
        self.offsets.len()
    }

    /// Offsets of the background cells from the window's top-left corner,
    /// in column-major order.
    #[inline]
    pub fn background_offsets(&self) -> &[(u32, u32)] {
        &self.offsets
    }
}
