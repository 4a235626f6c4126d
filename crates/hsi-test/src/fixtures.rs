//! Deterministic synthetic cubes

use hsi_core::Cube;

/// Small deterministic generator for test data.
///
/// 64-bit LCG; the same seed always yields the same sequence.
#[derive(Debug, Clone)]
pub struct SimpleRng {
    state: u64,
}

impl SimpleRng {
    /// Create a generator from `seed`
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Next raw value
    pub fn next_u64(&mut self) -> u64 {
        // LCG parameters from Numerical Recipes
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        self.state
    }

    /// Next value in `[0, 1]`
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() as f64) / (u64::MAX as f64)
    }

    /// Next value in `[lo, hi]`
    pub fn next_range(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }
}

/// Cube with every sample equal to `value`.
///
/// # Panics
///
/// Panics on zero dimensions.
pub fn uniform_cube(rows: u32, cols: u32, bands: u32, value: f64) -> Cube {
    Cube::new_with_value(rows, cols, bands, value).expect("valid fixture dimensions")
}

/// Cube of independent values in `[0, 1]` drawn from `SimpleRng::new(seed)`.
///
/// # Panics
///
/// Panics on zero dimensions.
pub fn random_cube(rows: u32, cols: u32, bands: u32, seed: u64) -> Cube {
    let mut cube = Cube::new(rows, cols, bands).expect("valid fixture dimensions");
    let mut rng = SimpleRng::new(seed);
    for v in cube.data_mut() {
        *v = rng.next_f64();
    }
    cube
}

/// Zero cube with every band of pixel `(row, col)` set to `value`.
///
/// # Panics
///
/// Panics on zero dimensions or an out-of-range pixel.
pub fn spike_cube(rows: u32, cols: u32, bands: u32, row: u32, col: u32, value: f64) -> Cube {
    let mut cube = Cube::new(rows, cols, bands).expect("valid fixture dimensions");
    cube.spectrum_mut(row, col)
        .expect("spike inside the cube")
        .fill(value);
    cube
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rng_is_deterministic() {
        let mut a = SimpleRng::new(42);
        let mut b = SimpleRng::new(42);
        for _ in 0..100 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
        let mut c = SimpleRng::new(43);
        assert_ne!(SimpleRng::new(42).next_u64(), c.next_u64());
    }

    #[test]
    fn test_next_range_bounds() {
        let mut rng = SimpleRng::new(1);
        for _ in 0..1000 {
            let v = rng.next_range(-2.0, 3.0);
            assert!((-2.0..=3.0).contains(&v));
        }
    }

    #[test]
    fn test_random_cube_reproducible() {
        let a = random_cube(4, 5, 3, 9);
        let b = random_cube(4, 5, 3, 9);
        assert_eq!(a.data(), b.data());
        assert!(a.data().iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn test_spike_cube() {
        let cube = spike_cube(7, 7, 2, 3, 4, 100.0);
        assert_eq!(cube.spectrum(3, 4).unwrap(), &[100.0, 100.0]);
        assert_eq!(cube.spectrum(3, 3).unwrap(), &[0.0, 0.0]);
        assert_eq!(cube.data().iter().filter(|&&v| v != 0.0).count(), 2);
    }

    #[test]
    fn test_uniform_cube() {
        let cube = uniform_cube(3, 3, 4, 0.1);
        assert!(cube.data().iter().all(|&v| v == 0.1));
    }
}
