//! The core single-tail SPOT detector.

use crate::config::SpotConfig;
use crate::error::{ConfigError, FitError, StepError};
use crate::p2::P2Quantile;
use crate::status::Decision;
use crate::tail::Tail;

/// Streaming Peaks-Over-Threshold anomaly detector.
///
/// Holds two thresholds above (or, in `low` mode, below) a data stream's
/// bulk: an *excess threshold* `t` (a fixed high quantile, estimated once
/// from the initial batch) and an *anomaly threshold* `zq` (the rarer tail
/// quantile corresponding to `q`, continually refit as excesses
/// accumulate). `step` classifies each new observation against both.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Spot {
    #[cfg_attr(feature = "serde", serde(flatten))]
    config: SpotConfig,
    n: usize,
    #[cfg_attr(feature = "serde", serde(rename = "Nt"))]
    nt: usize,
    #[cfg_attr(
        feature = "serde",
        serde(skip_serializing_if = "is_nan_ref", default = "nan")
    )]
    excess_threshold: f64,
    #[cfg_attr(
        feature = "serde",
        serde(skip_serializing_if = "is_nan_ref", default = "nan")
    )]
    anomaly_threshold: f64,
    tail: Tail,
}

#[cfg(feature = "serde")]
fn nan() -> f64 {
    f64::NAN
}

#[cfg(feature = "serde")]
fn is_nan_ref(x: &f64) -> bool {
    x.is_nan()
}

impl Spot {
    /// Validates `config` and creates an unfit detector. Both thresholds
    /// start at `NaN` until [`Spot::fit`] succeeds.
    pub fn new(config: SpotConfig) -> Result<Self, ConfigError> {
        if !(config.level >= 0.0 && config.level < 1.0) {
            return Err(ConfigError::LevelOutOfBounds);
        }
        if !(config.q > 0.0 && config.q < 1.0 - config.level) {
            return Err(ConfigError::QOutOfBounds);
        }

        Ok(Self {
            tail: Tail::new(config.max_excess),
            config,
            n: 0,
            nt: 0,
            excess_threshold: f64::NAN,
            anomaly_threshold: f64::NAN,
        })
    }

    /// `+1.0` in upper-tail mode, `-1.0` in lower-tail (`low`) mode.
    fn sign(&self) -> f64 {
        if self.config.low {
            -1.0
        } else {
            1.0
        }
    }

    /// The detector's configuration.
    pub fn config(&self) -> SpotConfig {
        self.config
    }

    /// Whether [`Spot::fit`] has succeeded (both thresholds are finite).
    pub fn is_fit(&self) -> bool {
        self.excess_threshold.is_finite() && self.anomaly_threshold.is_finite()
    }

    /// Total observations processed since the last [`Spot::fit`] or
    /// [`Spot::reset`] (`N`).
    pub fn n(&self) -> usize {
        self.n
    }

    /// Total excesses seen since the last [`Spot::fit`] or [`Spot::reset`]
    /// (`Nt`).
    pub fn nt(&self) -> usize {
        self.nt
    }

    /// Current excess threshold `t`, `NaN` if unfit.
    pub fn excess_threshold(&self) -> f64 {
        self.excess_threshold
    }

    /// Current anomaly threshold `zq`, `NaN` if unfit.
    pub fn anomaly_threshold(&self) -> f64 {
        self.anomaly_threshold
    }

    /// Current `(gamma, sigma)` of the fitted tail.
    pub fn tail_parameters(&self) -> (f64, f64) {
        (self.tail.gamma(), self.tail.sigma())
    }

    fn tail_mass(&self) -> f64 {
        self.nt as f64 / self.n as f64
    }

    /// Establishes the excess threshold as the `level`- (or, in `low`
    /// mode, `1 - level`-) quantile of `batch` via the P² estimator, then
    /// fits the GPD tail to the excesses found in it.
    ///
    /// Leaves the detector unfit (both thresholds `NaN`) on failure.
    pub fn fit(&mut self, batch: &[f64]) -> Result<(), FitError> {
        let p = if self.config.low {
            1.0 - self.config.level
        } else {
            self.config.level
        };
        let mut estimator = P2Quantile::new(p);
        for &x in batch {
            estimator.push(x);
        }
        let t = estimator.quantile();
        if !t.is_finite() {
            return Err(FitError::ExcessThresholdIsNaN);
        }

        let sign = if self.config.low { -1.0 } else { 1.0 };
        let mut tail = Tail::new(self.config.max_excess);
        let mut nt = 0;
        for &x in batch {
            let e = sign * (x - t);
            if e > 0.0 {
                tail.push(e);
                nt += 1;
            }
        }
        tail.fit()?;

        let n = batch.len();
        let s = nt as f64 / n as f64;
        let z = t + sign * tail.quantile(s, self.config.q);
        if !z.is_finite() {
            return Err(FitError::AnomalyThresholdIsNaN);
        }

        self.excess_threshold = t;
        self.tail = tail;
        self.anomaly_threshold = z;
        self.n = n;
        self.nt = nt;
        Ok(())
    }

    /// Classifies one new observation.
    ///
    /// 1. If `discard_anomalies` and the observation is past the anomaly
    ///    threshold, returns [`Decision::Anomaly`] without mutating any
    ///    state at all — the core guarantee that anomalies never
    ///    contaminate the model.
    /// 2. Otherwise increments `N`; if the signed excess over `t` is
    ///    non-negative, increments `Nt`, folds it into the tail, refits,
    ///    recomputes `zq`, and returns [`Decision::Excess`] (this is also
    ///    what happens to a value past `zq` when `discard_anomalies` is
    ///    `false` — it is folded into the model like any other excess).
    /// 3. Otherwise returns [`Decision::Normal`].
    ///
    /// If a refit triggered by step 2 fails, the previous `(gamma, sigma)`
    /// and `zq` are kept; an `Excess` classification itself never fails
    /// once the detector is already fit.
    ///
    /// Fails with [`StepError::DataIsNaN`] for a `NaN` input, leaving all
    /// state untouched.
    pub fn step(&mut self, x: f64) -> Result<Decision, StepError> {
        if x.is_nan() {
            return Err(StepError::DataIsNaN);
        }

        let sign = self.sign();

        if self.config.discard_anomalies && sign * (x - self.anomaly_threshold) > 0.0 {
            return Ok(Decision::Anomaly);
        }

        self.n += 1;
        let e = sign * (x - self.excess_threshold);
        if e >= 0.0 {
            self.nt += 1;
            self.tail.push(e);
            if self.tail.fit().is_ok() {
                let z = self.excess_threshold
                    + sign * self.tail.quantile(self.tail_mass(), self.config.q);
                if z.is_finite() {
                    self.anomaly_threshold = z;
                }
            }
            return Ok(Decision::Excess);
        }

        Ok(Decision::Normal)
    }

    /// Updates the target anomaly probability and immediately recomputes
    /// the anomaly threshold from the current tail fit, without touching
    /// the excess threshold or refitting the tail.
    pub fn set_q(&mut self, q: f64) -> Result<(), ConfigError> {
        if !(q > 0.0 && q < 1.0 - self.config.level) {
            return Err(ConfigError::QOutOfBounds);
        }
        self.config.q = q;
        if self.is_fit() {
            self.anomaly_threshold = self.quantile(q);
        }
        Ok(())
    }

    /// The value `z` such that `P(X > z) = q'` under the fitted tail (or,
    /// in `low` mode, `P(X < z) = q'`), for an arbitrary target probability
    /// `q'`. Equivalent to `anomaly_threshold()` when `q' == config().q`.
    pub fn quantile(&self, q: f64) -> f64 {
        self.excess_threshold + self.sign() * self.tail.quantile(self.tail_mass(), q)
    }

    /// Estimated probability of observing a value at least as extreme as
    /// `z` (`>= z` upper tail, `<= z` lower tail). `NaN` if `z` is not past
    /// the excess threshold or the detector is unfit.
    pub fn probability(&self, z: f64) -> f64 {
        let sign = self.sign();
        let d = sign * (z - self.excess_threshold);
        if !self.is_fit() || d < 0.0 {
            return f64::NAN;
        }
        self.tail.probability(self.tail_mass(), d)
    }

    /// Returns the detector to its unfit, zero-observation state, keeping
    /// its configuration.
    pub fn reset(&mut self) {
        self.n = 0;
        self.nt = 0;
        self.excess_threshold = f64::NAN;
        self.anomaly_threshold = f64::NAN;
        self.tail = Tail::new(self.config.max_excess);
    }
}
