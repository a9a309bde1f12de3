//! Error types returned by [`crate::Spot`] and [`crate::DSpot`].

use std::fmt;

/// Rejected [`crate::SpotConfig`] at construction time. The two variants
/// pin down which bound was violated, rather than a single catch-all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// `level` is not in `[0, 1)`.
    LevelOutOfBounds,
    /// `q` is not in `(0, 1 - level)`.
    QOutOfBounds,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::LevelOutOfBounds => {
                write!(f, "level must satisfy 0 <= level < 1")
            }
            ConfigError::QOutOfBounds => {
                write!(f, "q must satisfy 0 < q < 1 - level")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Failure to establish a usable model during [`crate::Spot::fit`]. The
/// detector is left in its pre-fit state, both thresholds still `NaN`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitError {
    /// The P² estimate of the excess threshold was not finite.
    ExcessThresholdIsNaN,
    /// The fitted tail produced a non-finite anomaly threshold.
    AnomalyThresholdIsNaN,
}

impl fmt::Display for FitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FitError::ExcessThresholdIsNaN => {
                write!(f, "excess threshold could not be estimated (non-finite)")
            }
            FitError::AnomalyThresholdIsNaN => {
                write!(f, "anomaly threshold could not be estimated (non-finite)")
            }
        }
    }
}

impl std::error::Error for FitError {}

/// Failure of a single [`crate::Spot::step`] or [`crate::DSpot::step`] call.
///
/// `DataIsNaN` is a no-op on both: no counter, buffer, or threshold is
/// mutated. `NotWarmedUp` is `DSpot`-only and is *not* a no-op: by the time
/// it's returned, the observation has already been pushed into the
/// moving-average window (that's how the window gets to warm up at all) —
/// only the inner `Spot` is left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepError {
    /// The input observation was `NaN`.
    DataIsNaN,
    /// (DSpot only) the moving-average window has not filled yet, so no
    /// normalized coordinate is available. The observation was still
    /// pushed into the window itself.
    NotWarmedUp,
}

impl fmt::Display for StepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepError::DataIsNaN => write!(f, "input observation is NaN"),
            StepError::NotWarmedUp => {
                write!(f, "normalizer has not reached its warm-up depth yet")
            }
        }
    }
}

impl std::error::Error for StepError {}
