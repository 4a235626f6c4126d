//! Regression test parameters and operations

use crate::error::{TestError, TestResult};
use crate::{init_logging, regout_dir};
use hsi_core::Grid;
use std::fs;

/// Regression test mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegTestMode {
    /// Compare with the expected values (default)
    #[default]
    Compare,
    /// Compare, and write result grids for inspection
    Display,
}

impl RegTestMode {
    /// Parse mode from the `REGTEST_MODE` environment variable
    pub fn from_env() -> Self {
        Self::parse(&std::env::var("REGTEST_MODE").unwrap_or_default())
    }

    /// Parse mode from a string; anything but "display" means compare
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "display" => Self::Display,
            _ => Self::Compare,
        }
    }
}

/// Regression test parameters
///
/// Tracks the test name, current index, mode and success status.
pub struct RegParams {
    /// Name of the test (e.g., "rx_basic")
    pub test_name: String,
    /// Current test index (incremented before each test)
    index: usize,
    /// Test mode (compare or display)
    pub mode: RegTestMode,
    /// Overall success status
    success: bool,
    /// Recorded failures
    failures: Vec<String>,
}

impl RegParams {
    /// Create new regression test parameters
    ///
    /// The mode comes from the `REGTEST_MODE` environment variable. Also
    /// installs the test logger.
    pub fn new(test_name: &str) -> Self {
        init_logging();
        let mode = RegTestMode::from_env();

        let _ = fs::create_dir_all(regout_dir());

        eprintln!();
        eprintln!("////////////////////////////////////////////////");
        eprintln!("////////////////   {}_reg   ///////////////", test_name);
        eprintln!("////////////////////////////////////////////////");
        eprintln!("Mode: {:?}", mode);

        Self {
            test_name: test_name.to_string(),
            index: 0,
            mode,
            success: true,
            failures: Vec::new(),
        }
    }

    /// Get the current test index
    pub fn index(&self) -> usize {
        self.index
    }

    /// Check if in display mode
    pub fn display(&self) -> bool {
        self.mode == RegTestMode::Display
    }

    fn fail(&mut self, msg: String) {
        eprintln!("{}", msg);
        self.failures.push(msg);
        self.success = false;
    }

    /// Compare two floating-point values
    ///
    /// Returns `true` if `|expected - actual| <= delta`.
    pub fn compare_values(&mut self, expected: f64, actual: f64, delta: f64) -> bool {
        self.index += 1;
        let diff = (expected - actual).abs();

        // NaN never compares within delta
        if diff <= delta {
            true
        } else {
            let msg = format!(
                "Failure in {}_reg: value comparison for index {}\n\
                 difference = {} but allowed delta = {}\n\
                 expected = {}, actual = {}",
                self.test_name, self.index, diff, delta, expected, actual
            );
            self.fail(msg);
            false
        }
    }

    /// Compare two grids cell by cell
    ///
    /// Returns `true` if the dimensions agree and every pair of cells
    /// differs by at most `delta`. A `delta` of 0 demands bit-level
    /// equality of the values.
    pub fn compare_grids(&mut self, expected: &Grid, actual: &Grid, delta: f64) -> bool {
        self.index += 1;

        if expected.dimensions() != actual.dimensions() {
            let msg = format!(
                "Failure in {}_reg: grid comparison for index {} - dimension mismatch \
                 {:?} vs {:?}",
                self.test_name,
                self.index,
                expected.dimensions(),
                actual.dimensions()
            );
            self.fail(msg);
            return false;
        }

        let cols = expected.cols() as usize;
        for (i, (&e, &a)) in expected.data().iter().zip(actual.data()).enumerate() {
            let same = if delta == 0.0 {
                e.to_bits() == a.to_bits()
            } else {
                (e - a).abs() <= delta
            };
            if !same {
                let msg = format!(
                    "Failure in {}_reg: grid comparison for index {} - value mismatch at \
                     ({}, {}): expected {}, actual {}",
                    self.test_name,
                    self.index,
                    i / cols,
                    i % cols,
                    e,
                    a
                );
                self.fail(msg);
                return false;
            }
        }

        true
    }

    /// Compare two binary data arrays
    ///
    /// Returns `true` if data is identical.
    pub fn compare_strings(&mut self, data1: &[u8], data2: &[u8]) -> bool {
        self.index += 1;

        if data1 != data2 {
            let msg = format!(
                "Failure in {}_reg: string comparison for index {}\n\
                 sizes: {} vs {}",
                self.test_name,
                self.index,
                data1.len(),
                data2.len()
            );
            self.fail(msg);
            false
        } else {
            true
        }
    }

    /// Write a grid to the regout directory for inspection
    ///
    /// Uses the native grid serialization. Returns the written path.
    pub fn write_grid(&mut self, grid: &Grid) -> TestResult<String> {
        self.index += 1;

        let local_path = format!("{}/{}.{:02}.grid", regout_dir(), self.test_name, self.index);
        grid.write_to_file(&local_path)
            .map_err(|e| TestError::GridWrite {
                path: local_path.clone(),
                message: e.to_string(),
            })?;
        eprintln!("Wrote: {}", local_path);
        Ok(local_path)
    }

    /// Clean up and report results
    ///
    /// Returns `true` if all tests passed.
    pub fn cleanup(self) -> bool {
        if self.success {
            eprintln!("SUCCESS: {}_reg", self.test_name);
        } else {
            eprintln!("FAILURE: {}_reg", self.test_name);
            for failure in &self.failures {
                eprintln!("  {}", failure);
            }
        }
        eprintln!();

        self.success
    }

    /// Check if all tests have passed so far
    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Get list of failures
    pub fn failures(&self) -> &[String] {
        &self.failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_from_env() {
        let mode = RegTestMode::from_env();
        assert!(matches!(mode, RegTestMode::Compare | RegTestMode::Display));
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!(RegTestMode::parse("display"), RegTestMode::Display);
        assert_eq!(RegTestMode::parse(" Display "), RegTestMode::Display);
        assert_eq!(RegTestMode::parse("compare"), RegTestMode::Compare);
        assert_eq!(RegTestMode::parse(""), RegTestMode::Compare);
        // no golden-file generation mode exists
        assert_eq!(RegTestMode::parse("generate"), RegTestMode::Compare);
    }

    #[test]
    fn test_compare_values() {
        let mut rp = RegParams::new("params_values");
        assert!(rp.compare_values(100.0, 100.0, 0.0));
        assert!(rp.compare_values(100.0, 100.5, 1.0));
        assert!(rp.is_success());
        assert!(!rp.compare_values(100.0, 200.0, 0.0));
        assert!(!rp.compare_values(0.0, f64::NAN, 1.0));
        assert!(!rp.is_success());
        assert_eq!(rp.failures().len(), 2);
        assert_eq!(rp.index(), 4);
    }

    #[test]
    fn test_compare_grids() {
        let mut rp = RegParams::new("params_grids");
        let a = Grid::from_data(2, 2, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let b = Grid::from_data(2, 2, vec![1.0, 2.0, 3.0, 4.0 + 1e-9]).unwrap();
        assert!(rp.compare_grids(&a, &a.clone(), 0.0));
        assert!(rp.compare_grids(&a, &b, 1e-6));
        assert!(rp.is_success());
        assert!(!rp.compare_grids(&a, &b, 0.0));
        let c = Grid::new(2, 3).unwrap();
        assert!(!rp.compare_grids(&a, &c, 1.0));
        assert!(!rp.cleanup());
    }

    #[test]
    fn test_compare_strings() {
        let mut rp = RegParams::new("params_strings");
        assert!(rp.compare_strings(b"abc", b"abc"));
        assert!(!rp.compare_strings(b"abc", b"abd"));
    }
}
