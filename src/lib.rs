//! Streaming Peaks-Over-Threshold (SPOT) and drift-aware DSPOT anomaly
//! detection for univariate time series.
//!
//! [`Spot`] fits a Generalized Pareto tail above a fixed high quantile of an
//! initial batch, then classifies each subsequent observation as
//! [`Decision::Normal`], [`Decision::Excess`] (folded back into the tail
//! fit), or [`Decision::Anomaly`]. [`DSpot`] wraps a [`Spot`] behind a
//! moving-average [`Normalizer`] so the thresholds track a drifting
//! baseline instead of a fixed one.
//!
//! ```
//! use spot::{Spot, SpotConfig};
//!
//! let mut detector = Spot::new(SpotConfig::default()).unwrap();
//! let batch: Vec<f64> = (0..3000).map(|i| (i as f64 * 0.6180339887).fract()).collect();
//! detector.fit(&batch).unwrap();
//! match detector.step(0.5).unwrap() {
//!     spot::Decision::Normal => {}
//!     spot::Decision::Excess => {}
//!     spot::Decision::Anomaly => {}
//! }
//! ```

mod brent;
mod config;
mod dspot;
mod error;
mod estimator;
mod normalizer;
mod p2;
mod peaks;
mod spot;
mod status;
mod tail;
mod ubend;

pub use brent::{find_root, BrentError, BrentMinimizer};
pub use config::{DSpotConfig, SpotConfig};
pub use dspot::DSpot;
pub use error::{ConfigError, FitError, StepError};
pub use estimator::{grimshaw_candidates, moment_estimator, Estimate};
pub use normalizer::Normalizer;
pub use p2::P2Quantile;
pub use peaks::Peaks;
pub use spot::Spot;
pub use status::Decision;
pub use tail::Tail;
pub use ubend::Ubend;
