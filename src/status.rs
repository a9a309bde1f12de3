//! Classification returned by a successful `step`.

/// Outcome of feeding one observation to [`crate::Spot::step`] or
/// [`crate::DSpot::step`].
///
/// This is the `Ok` arm only: anything that prevents classification (a
/// `NaN` input, a DSpot normalizer not yet warmed up) is a [`crate::StepError`]
/// instead, so callers never need to match a catch-all variant here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Decision {
    /// Below the excess threshold: ordinary data, folded into the central
    /// model only.
    Normal,
    /// Above the excess threshold but below the anomaly threshold: counted
    /// as an excess and used to refit the tail.
    Excess,
    /// Above the anomaly threshold: reported as an anomaly and excluded
    /// from the tail fit (and, for `DSpot`, from the moving average).
    Anomaly,
}
