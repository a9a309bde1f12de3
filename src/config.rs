//! Tunable parameters for [`crate::Spot`] and [`crate::DSpot`].

/// Configuration accepted by [`crate::Spot::new`].
///
/// `level` and `q` together fix where the excess threshold (a fixed high
/// quantile) and the anomaly threshold (a rarer tail probability inside it)
/// sit. `low` switches the whole detector to lower-tail mode (flagging
/// unusually small values instead of unusually large ones); bilateral
/// detection is obtained by running two `Spot`s with opposite `low`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpotConfig {
    /// Target anomaly probability, in `(0, 1 - level)`.
    pub q: f64,
    /// Quantile level defining the excess threshold, in `[0, 1)`.
    pub level: f64,
    /// Lower-tail mode: flags unusually small values instead of unusually
    /// large ones.
    pub low: bool,
    /// Whether observations past the anomaly threshold are excluded from
    /// the model (returned as `Decision::Anomaly`) rather than folded in as
    /// an ordinary excess.
    pub discard_anomalies: bool,
    /// Capacity of the excess window the GPD tail is fitted against.
    pub max_excess: usize,
}

impl Default for SpotConfig {
    fn default() -> Self {
        Self {
            q: 1e-4,
            level: 0.98,
            low: false,
            discard_anomalies: true,
            max_excess: 200,
        }
    }
}

/// Configuration accepted by [`crate::DSpot::new`]: a [`SpotConfig`] plus
/// the moving-average window depth used to detrend the stream before
/// handing it to the two inner `Spot`s. Depth `0` disables centering
/// entirely; `DSpot` then degenerates to a bilateral pair of plain `Spot`s.
///
/// `spot.low` is ignored: `DSpot` always runs both tails, each as its own
/// `Spot` built from `spot` with `low` forced to `false` and `true`
/// respectively.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DSpotConfig {
    pub spot: SpotConfig,
    /// Size of the moving-average window.
    pub depth: usize,
}

impl Default for DSpotConfig {
    fn default() -> Self {
        Self {
            spot: SpotConfig::default(),
            depth: 0,
        }
    }
}
