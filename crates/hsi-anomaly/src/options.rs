//! Detector options
//!
//! Window radii plus the two policy switches of the detector: how a mask
//! is applied and whether window positions are scored in parallel.

use crate::{AnomalyError, AnomalyResult};

/// Default guard window radius
pub const DEFAULT_GUARD_WIN: u32 = 1;

/// Default background window radius
pub const DEFAULT_BG_WIN: u32 = 2;

/// How a mask restricts the detector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MaskMode {
    /// Only centers with a `true` mask value are scored; every background
    /// cell of the window contributes samples.
    #[default]
    Centers,
    /// As `Centers`, and background cells whose mask value is `false` are
    /// dropped from the sample set.
    CentersAndBackground,
}

/// How window positions are scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Execution {
    /// One position after another on the calling thread
    #[default]
    Sequential,
    /// Positions distributed over the rayon thread pool.
    ///
    /// Falls back to `Sequential` when the `parallel` feature is disabled.
    Parallel,
}

/// Options for the windowed RX detector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RxOptions {
    /// Guard window radius; the `(2*guard_win + 1)` square around the center
    /// is excluded from the background
    pub guard_win: u32,
    /// Background window radius (minimum 1); width of the annulus around
    /// the guard square
    pub bg_win: u32,
    /// Mask policy
    pub mask_mode: MaskMode,
    /// Scheduling of window positions
    pub execution: Execution,
}

impl Default for RxOptions {
    fn default() -> Self {
        Self {
            guard_win: DEFAULT_GUARD_WIN,
            bg_win: DEFAULT_BG_WIN,
            mask_mode: MaskMode::default(),
            execution: Execution::default(),
        }
    }
}

impl RxOptions {
    /// Options with the given radii and default policies
    pub fn new(guard_win: u32, bg_win: u32) -> Self {
        Self {
            guard_win,
            bg_win,
            ..Self::default()
        }
    }

    /// Set the mask policy
    pub fn with_mask_mode(mut self, mask_mode: MaskMode) -> Self {
        self.mask_mode = mask_mode;
        self
    }

    /// Set the scheduling of window positions
    pub fn with_execution(mut self, execution: Execution) -> Self {
        self.execution = execution;
        self
    }

    /// Check the radii.
    ///
    /// A zero background radius leaves the background set empty.
    pub fn validate(&self) -> AnomalyResult<()> {
        if self.bg_win == 0 {
            return Err(AnomalyError::InvalidParameter(
                "bg_win must be >= 1".into(),
            ));
        }
        Ok(())
    }
}
