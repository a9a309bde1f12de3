//! Running statistics over a fixed-capacity window of peaks (excesses).

use crate::ubend::Ubend;

/// A [`Ubend`] of excesses together with incrementally maintained sum,
/// sum-of-squares, min and max.
///
/// Invariant: the four scalars always equal the exact moments of the
/// current buffer contents. When an eviction removes the current min or
/// max, they — and the sums, to avoid drift accumulating independently of
/// the buffer's own accounting — are rebuilt by a single O(capacity) scan.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Peaks {
    #[cfg_attr(feature = "serde", serde(rename = "e"))]
    sum: f64,
    #[cfg_attr(feature = "serde", serde(rename = "e2"))]
    sum_sq: f64,
    #[cfg_attr(
        feature = "serde",
        serde(skip_serializing_if = "is_nan_ref", default = "nan")
    )]
    min: f64,
    #[cfg_attr(
        feature = "serde",
        serde(skip_serializing_if = "is_nan_ref", default = "nan")
    )]
    max: f64,
    #[cfg_attr(feature = "serde", serde(rename = "container"))]
    buffer: Ubend,
}

#[cfg(feature = "serde")]
fn nan() -> f64 {
    f64::NAN
}

#[cfg(feature = "serde")]
fn is_nan_ref(x: &f64) -> bool {
    x.is_nan()
}

impl Peaks {
    /// Creates an empty `Peaks` with the given capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            sum: 0.0,
            sum_sq: 0.0,
            min: f64::NAN,
            max: f64::NAN,
            buffer: Ubend::new(capacity),
        }
    }

    /// Number of excesses currently stored.
    pub fn size(&self) -> usize {
        self.buffer.size()
    }

    /// Capacity of the underlying buffer.
    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    /// Pushes a new excess, updating moments in O(1) unless the evicted
    /// value was the current min or max, in which case this is O(capacity).
    pub fn push(&mut self, x: f64) {
        let evicted = self.buffer.push(x);

        self.sum += x;
        self.sum_sq += x * x;
        if self.min.is_nan() || x < self.min {
            self.min = x;
        }
        if self.max.is_nan() || x > self.max {
            self.max = x;
        }

        if !evicted.is_nan() {
            self.sum -= evicted;
            self.sum_sq -= evicted * evicted;
            if evicted <= self.min || evicted >= self.max {
                self.rebuild();
            }
        }
    }

    fn rebuild(&mut self) {
        self.min = f64::NAN;
        self.max = f64::NAN;
        self.sum = 0.0;
        self.sum_sq = 0.0;

        self.buffer.recompute_moments();
        for i in 0..self.buffer.size() {
            let v = self.buffer.raw_data()[i];
            self.sum += v;
            self.sum_sq += v * v;
            if self.min.is_nan() || v < self.min {
                self.min = v;
            }
            if self.max.is_nan() || v > self.max {
                self.max = v;
            }
        }
    }

    /// Arithmetic mean of the stored excesses, `NaN` if empty.
    pub fn mean(&self) -> f64 {
        let n = self.size();
        if n == 0 {
            f64::NAN
        } else {
            self.sum / n as f64
        }
    }

    /// Population variance of the stored excesses, `NaN` if empty.
    pub fn var(&self) -> f64 {
        let n = self.size();
        if n == 0 {
            f64::NAN
        } else {
            let n = n as f64;
            let mean = self.sum / n;
            self.sum_sq / n - mean * mean
        }
    }

    /// Minimum stored excess, `NaN` if empty.
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Maximum stored excess, `NaN` if empty.
    pub fn max(&self) -> f64 {
        self.max
    }

    /// Sum of the stored excesses.
    pub fn sum(&self) -> f64 {
        self.sum
    }

    /// Sum of squares of the stored excesses.
    pub fn sum_sq(&self) -> f64 {
        self.sum_sq
    }

    /// Access to the underlying data, for iterating GPD log-likelihood
    /// terms without reallocating.
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.buffer.iter()
    }

    /// Generalized Pareto log-likelihood of the stored excesses under
    /// parameters `(gamma, sigma)`.
    ///
    /// `gamma == 0.0` uses the exponential-tail limit
    /// `-n*ln(sigma) - sum/sigma`; otherwise
    /// `-n*ln(sigma) - (1 + 1/gamma) * sum_i ln(1 + (gamma/sigma)*x_i)`,
    /// returning `-inf` wherever a term's argument is non-positive (the
    /// parameters are inadmissible for this data).
    pub fn log_likelihood(&self, gamma: f64, sigma: f64) -> f64 {
        let n = self.size();
        if n == 0 || sigma <= 0.0 {
            return f64::NEG_INFINITY;
        }
        let n = n as f64;

        if gamma == 0.0 {
            return -n * sigma.ln() - self.sum / sigma;
        }

        let c = 1.0 + 1.0 / gamma;
        let k = gamma / sigma;
        let mut ll = -n * sigma.ln();
        for x in self.iter() {
            let term = 1.0 + k * x;
            if term <= 0.0 {
                return f64::NEG_INFINITY;
            }
            ll -= c * term.ln();
        }
        ll
    }
}
