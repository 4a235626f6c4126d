//! Sliding window positions
//!
//! Enumerates every center position at which a full window fits inside
//! the image. The window's top-left corner `(j, i)` ranges over
//! `j in 0..=rows-width`, `i in 0..=cols-width`, and the center is
//! `(j + half_width, i + half_width)`. Traversal is column-major: the
//! row index varies fastest.
//!
//! Pixels within `half_width` of the image border are never enumerated.

use crate::window::WindowTemplate;
use crate::{AnomalyError, AnomalyResult};
use std::iter::FusedIterator;

/// A window center in image coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    /// Row of the center pixel
    pub row: u32,
    /// Column of the center pixel
    pub col: u32,
}

impl Position {
    /// Create a position
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }
}

/// Lazy, finite iterator over valid window centers.
///
/// A clone keeps the current cursor; [`WindowPositions::restart`] rewinds
/// to the first position.
#[derive(Debug, Clone)]
pub struct WindowPositions {
    /// Number of valid top-left rows (`rows - width + 1`)
    fit_rows: u32,
    /// Number of valid top-left columns (`cols - width + 1`)
    fit_cols: u32,
    half_width: u32,
    next: usize,
    len: usize,
}

impl WindowPositions {
    /// Positions for an image of `rows x cols` scanned with `template`.
    ///
    /// # Errors
    ///
    /// Returns `AnomalyError::InvalidParameter` if the window is wider or
    /// taller than the image, so that no valid center exists.
    pub fn new(rows: u32, cols: u32, template: &WindowTemplate) -> AnomalyResult<Self> {
        let width = template.width();
        if width > rows || width > cols {
            return Err(AnomalyError::InvalidParameter(format!(
                "window of width {width} does not fit a {rows}x{cols} image"
            )));
        }
        let fit_rows = rows - width + 1;
        let fit_cols = cols - width + 1;
        Ok(WindowPositions {
            fit_rows,
            fit_cols,
            half_width: template.half_width(),
            next: 0,
            len: (fit_rows as usize) * (fit_cols as usize),
        })
    }

    /// Rewind to the first position.
    pub fn restart(&mut self) {
        self.next = 0;
    }

    /// Whether `pos` is one of the enumerated centers.
    pub fn contains(&self, pos: Position) -> bool {
        let hw = self.half_width;
        pos.row >= hw
            && pos.col >= hw
            && pos.row - hw < self.fit_rows
            && pos.col - hw < self.fit_cols
    }

    fn position_at(&self, k: usize) -> Position {
        let fit_rows = self.fit_rows as usize;
        let i = (k / fit_rows) as u32;
        let j = (k % fit_rows) as u32;
        Position {
            row: j + self.half_width,
            col: i + self.half_width,
        }
    }
}

impl Iterator for WindowPositions {
    type Item = Position;

    fn next(&mut self) -> Option<Position> {
        if self.next >= self.len {
            return None;
        }
        let pos = self.position_at(self.next);
        self.next += 1;
        Some(pos)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.len - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for WindowPositions {}

impl FusedIterator for WindowPositions {}
