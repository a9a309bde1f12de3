//! Drift-aware SPOT: a [`Normalizer`]-detrended stream feeding a bilateral
//! pair of [`Spot`]s.

use crate::config::DSpotConfig;
use crate::error::{ConfigError, FitError, StepError};
use crate::normalizer::Normalizer;
use crate::spot::Spot;
use crate::status::Decision;

/// SPOT with a moving-average front end, so thresholds track a drifting
/// baseline instead of sitting at a fixed level.
///
/// Wraps one `Normalizer` around a pair of single-tail `Spot`s tracking an
/// upper and a lower tail simultaneously. The core `Spot` type is
/// single-tail only (see [`crate::Spot`]'s docs), so bilateral behavior is
/// obtained by running two of them — one forced to `low = false`, one to
/// `low = true` — against the same detrended coordinate. Either tail
/// reporting [`Decision::Anomaly`] cancels the shared normalizer's push,
/// so outliers from either direction never pollute the baseline.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DSpot {
    normalizer: Normalizer,
    upper: Spot,
    lower: Spot,
}

impl DSpot {
    /// Validates `config` and creates an unfit detector.
    pub fn new(config: DSpotConfig) -> Result<Self, ConfigError> {
        let mut upper_config = config.spot;
        upper_config.low = false;
        let mut lower_config = config.spot;
        lower_config.low = true;

        Ok(Self {
            normalizer: Normalizer::new(config.depth),
            upper: Spot::new(upper_config)?,
            lower: Spot::new(lower_config)?,
        })
    }

    /// Whether both inner `Spot`s have been fit.
    pub fn is_fit(&self) -> bool {
        self.upper.is_fit() && self.lower.is_fit()
    }

    /// Current moving average of the raw stream ("drift").
    pub fn average(&self) -> f64 {
        self.normalizer.average()
    }

    /// Detrends `batch` with a fresh moving average (fed in stream order)
    /// and fits both inner `Spot`s to the detrended values.
    ///
    /// The first `depth` samples only serve to fill the moving-average
    /// window and are not themselves detrended against it: the window
    /// isn't warmed up yet, so the average it would subtract is either
    /// `NaN` (no samples pushed) or computed from a partial, not-yet
    /// representative prefix. Only once the window is already warmed up
    /// *before* a given push does that push's detrended value get folded
    /// into the inner fit.
    pub fn fit(&mut self, batch: &[f64]) -> Result<(), FitError> {
        let mut normalizer = Normalizer::new(self.normalizer.capacity());
        let mut detrended = Vec::with_capacity(batch.len());
        for &x in batch {
            let warmed_up_before_push = normalizer.is_warmed_up();
            let z = normalizer.step(x);
            if warmed_up_before_push {
                detrended.push(z);
            }
        }
        self.upper.fit(&detrended)?;
        self.lower.fit(&detrended)?;
        self.normalizer = normalizer;
        Ok(())
    }

    /// Classifies one raw observation: asks the normalizer for the
    /// detrended coordinate `z`, classifies `z` with both inner `Spot`s,
    /// and on either one reporting [`Decision::Anomaly`] cancels the
    /// normalizer's push so the anomaly never enters the moving average.
    ///
    /// The overall decision is `Anomaly` if either tail says so, else
    /// `Excess` if either tail says so, else `Normal`.
    ///
    /// Fails with [`StepError::DataIsNaN`] for a `NaN` input (normalizer
    /// untouched) or [`StepError::NotWarmedUp`] while the moving-average
    /// window has not yet filled (normalizer still receives the push, so
    /// warm-up progresses).
    pub fn step(&mut self, x: f64) -> Result<Decision, StepError> {
        if x.is_nan() {
            return Err(StepError::DataIsNaN);
        }

        let z = self.normalizer.step(x);
        if !self.normalizer.is_warmed_up() {
            return Err(StepError::NotWarmedUp);
        }

        let up = self.upper.step(z)?;
        let down = self.lower.step(z)?;

        let decision = if up == Decision::Anomaly || down == Decision::Anomaly {
            Decision::Anomaly
        } else if up == Decision::Excess || down == Decision::Excess {
            Decision::Excess
        } else {
            Decision::Normal
        };

        if decision == Decision::Anomaly {
            self.normalizer.cancel();
        }
        Ok(decision)
    }

    /// The upper `Spot`'s excess threshold, in detrended coordinates.
    pub fn get_upper_t(&self) -> f64 {
        self.upper.excess_threshold()
    }

    /// The lower `Spot`'s excess threshold, in detrended coordinates.
    pub fn get_lower_t(&self) -> f64 {
        self.lower.excess_threshold()
    }

    /// The upper excess threshold translated back into the raw stream's
    /// scale.
    pub fn get_upper_threshold(&self) -> f64 {
        self.upper.excess_threshold() + self.normalizer.average()
    }

    /// The lower excess threshold translated back into the raw stream's
    /// scale.
    pub fn get_lower_threshold(&self) -> f64 {
        self.lower.excess_threshold() + self.normalizer.average()
    }

    /// The upper anomaly threshold translated back into the raw stream's
    /// scale.
    pub fn get_upper_anomaly_threshold(&self) -> f64 {
        self.upper.anomaly_threshold() + self.normalizer.average()
    }

    /// The lower anomaly threshold translated back into the raw stream's
    /// scale.
    pub fn get_lower_anomaly_threshold(&self) -> f64 {
        self.lower.anomaly_threshold() + self.normalizer.average()
    }

    /// Estimated probability, in the raw stream's scale, of a value at
    /// least as large as `z`.
    pub fn up_probability(&self, z: f64) -> f64 {
        self.upper.probability(z - self.normalizer.average())
    }

    /// Estimated probability, in the raw stream's scale, of a value at
    /// least as small as `z`.
    pub fn low_probability(&self, z: f64) -> f64 {
        self.lower.probability(z - self.normalizer.average())
    }
}
