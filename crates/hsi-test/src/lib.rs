//! hsi-test - Regression test framework for hyperspectral anomaly detection
//!
//! Supports two modes:
//!
//! - **Compare**: Check results against the expected values written in the
//!   tests
//! - **Display**: Compare as well, and let tests write their result grids
//!   to the regout directory for inspection
//!
//! together with deterministic synthetic cubes for the detector tests.
//!
//! # Usage
//!
//! ```ignore
//! use hsi_test::{RegParams, random_cube};
//!
//! let mut rp = RegParams::new("rx_basic");
//! let cube = random_cube(12, 12, 3, 7);
//! rp.compare_values(0.0, scores.get_value(0, 0).unwrap(), 0.0);
//! assert!(rp.cleanup());
//! ```
//!
//! # Environment Variables
//!
//! - `REGTEST_MODE`: Set to "compare" or "display"
//! - `RUST_LOG`: Log filter for the crates under test

mod error;
mod fixtures;
mod params;

pub use error::{TestError, TestResult};
pub use fixtures::{SimpleRng, random_cube, spike_cube, uniform_cube};
pub use params::{RegParams, RegTestMode};

/// Route `log` output of the crates under test to the test harness.
///
/// Safe to call from every test; only the first call installs the logger.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Get the path to the workspace root
fn workspace_root() -> String {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    // hsi-test is at crates/hsi-test, so go up two directories
    format!("{}/../..", manifest_dir)
}

/// Get the path to the regout (regression output) directory
pub fn regout_dir() -> String {
    format!("{}/tests/regout", workspace_root())
}
