//! Quantitative and qualitative anomaly scoring. Each submodule is pure —
//! no I/O, no storage, no warehouse access — so the executor can be the
//! only place that touches the outside world.

pub mod forecast;
pub mod fusion;
pub mod qualitative;
pub mod robust;
pub mod thresholds;

pub use fusion::{
    analyze_forecast, analyze_zscore, fuse, ForecastResult, QuantModelOutcome, ZScoreResult,
    DEFAULT_IMPORTANCE_THRESHOLD,
};
pub use qualitative::{diff_schema, QualitativeOutcome};
pub use thresholds::BoundPair;
