//! P² (Jain–Chlamtac) online quantile estimator.
//!
//! Maintains five markers spanning the minimum, two values bracketing the
//! target quantile, and the maximum, updating their heights and positions
//! incrementally as observations arrive so the quantile estimate never
//! requires storing the full sample.

/// Online estimator of a single fixed quantile `p in (0, 1)`.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct P2Quantile {
    p: f64,
    count: usize,
    /// Marker heights `q[0..5]`.
    heights: [f64; 5],
    /// Desired (real-valued) marker positions `n'[0..5]`.
    desired: [f64; 5],
    /// Actual marker positions `n[0..5]`.
    positions: [i64; 5],
    /// Position increments `dn[0..5]`.
    increments: [f64; 5],
    /// First five raw observations, buffered until initialization.
    #[cfg_attr(feature = "serde", serde(skip, default))]
    startup: Vec<f64>,
}

impl P2Quantile {
    /// Creates an estimator targeting quantile `p`. `p` must lie in `(0, 1)`;
    /// out-of-range values are clamped defensively to keep the marker math
    /// well-defined.
    pub fn new(p: f64) -> Self {
        let p = p.clamp(1e-9, 1.0 - 1e-9);
        Self {
            p,
            count: 0,
            heights: [0.0; 5],
            desired: [0.0; 5],
            positions: [0; 5],
            increments: [0.0; 5],
            startup: Vec::with_capacity(5),
        }
    }

    /// The target quantile this estimator tracks.
    pub fn p(&self) -> f64 {
        self.p
    }

    /// Number of observations seen so far.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Feeds one observation, updating marker heights and positions.
    pub fn push(&mut self, x: f64) {
        self.count += 1;

        if self.count <= 5 {
            self.startup.push(x);
            if self.count == 5 {
                self.startup.sort_by(|a, b| a.partial_cmp(b).unwrap());
                for i in 0..5 {
                    self.heights[i] = self.startup[i];
                }
                self.positions = [1, 2, 3, 4, 5];
                self.desired = [
                    1.0,
                    1.0 + 2.0 * self.p,
                    1.0 + 4.0 * self.p,
                    3.0 + 2.0 * self.p,
                    5.0,
                ];
                self.increments = [0.0, self.p / 2.0, self.p, (1.0 + self.p) / 2.0, 1.0];
            }
            return;
        }

        // A new min or max only replaces a marker's height; it does not
        // shift any marker's position or advance the desired positions.
        // Those updates happen only for a value landing strictly between
        // the current extremes.
        if x < self.heights[0] {
            self.heights[0] = x;
            return;
        }
        if x >= self.heights[4] {
            self.heights[4] = x;
            return;
        }

        let mut k = 0;
        for i in 0..4 {
            if self.heights[i] <= x && x < self.heights[i + 1] {
                k = i;
            }
        }

        for i in (k + 1)..5 {
            self.positions[i] += 1;
        }
        for i in 0..5 {
            self.desired[i] += self.increments[i];
        }

        for i in 1..4 {
            let n = self.positions[i] as f64;
            let d = self.desired[i] - n;
            let np1 = self.positions[i + 1] as f64;
            let nm1 = self.positions[i - 1] as f64;

            if (d >= 1.0 && np1 - n > 1.0) || (d <= -1.0 && nm1 - n < -1.0) {
                let sign = if d >= 0.0 { 1.0 } else { -1.0 };
                let qp1 = self.heights[i + 1];
                let q = self.heights[i];
                let qm1 = self.heights[i - 1];

                let parabolic = q
                    + sign / (np1 - nm1)
                        * ((n - nm1 + sign) * (qp1 - q) / (np1 - n)
                            + (np1 - n - sign) * (q - qm1) / (n - nm1));

                let new_q = if qm1 < parabolic && parabolic < qp1 {
                    parabolic
                } else if sign > 0.0 {
                    q + (qp1 - q) / (np1 - n)
                } else {
                    q - (qm1 - q) / (nm1 - n)
                };

                self.heights[i] = new_q;
                self.positions[i] += sign as i64;
            }
        }
    }

    /// Current quantile estimate. `NaN` if fewer than 5 observations have
    /// been seen, since the markers aren't initialized yet.
    pub fn quantile(&self) -> f64 {
        if self.count < 5 {
            f64::NAN
        } else {
            self.heights[2]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn fewer_than_five_is_nan() {
        let mut est = P2Quantile::new(0.5);
        for i in 0..4 {
            est.push(i as f64);
            assert!(est.quantile().is_nan());
        }
    }

    #[test]
    fn median_of_five_sorted_inputs() {
        let mut est = P2Quantile::new(0.5);
        for v in [5.0, 1.0, 3.0, 2.0, 4.0] {
            est.push(v);
        }
        assert_relative_eq!(est.quantile(), 3.0);
    }

    #[test]
    fn tracks_uniform_median_reasonably() {
        let mut seed: u64 = 42;
        let mut next = || {
            seed = seed.wrapping_mul(1103515245).wrapping_add(12345);
            ((seed / 65536) % 32768) as f64 / 32768.0
        };
        let mut est = P2Quantile::new(0.5);
        for _ in 0..2000 {
            est.push(next());
        }
        assert!((est.quantile() - 0.5).abs() < 0.05);
    }

    #[test]
    fn tracks_high_quantile_of_uniform() {
        let mut seed: u64 = 7;
        let mut next = || {
            seed = seed.wrapping_mul(1103515245).wrapping_add(12345);
            ((seed / 65536) % 32768) as f64 / 32768.0
        };
        let mut est = P2Quantile::new(0.98);
        for _ in 0..2000 {
            est.push(next());
        }
        assert!((est.quantile() - 0.98).abs() < 0.05);
    }

    proptest::proptest! {
        #[test]
        fn quantile_within_markers_range(values in proptest::collection::vec(-1e3f64..1e3f64, 5..500)) {
            let mut est = P2Quantile::new(0.9);
            for &v in &values {
                est.push(v);
            }
            let q = est.quantile();
            let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
            let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            proptest::prop_assert!(q >= min - 1e-9 && q <= max + 1e-9);
        }
    }
}
