//! Two independent analyses — robust z-score and forecast — fused into one
//! decision. Pure functions over already-computed analysis results; no
//! knowledge of storage or the warehouse.

use crate::domain::{ForcedThresholds, TestKind};

use super::forecast::ForecastComponents;
use super::robust::RobustReference;
use super::thresholds::{apply_forced, clamp_nonnegative, BoundPair};

const DEFAULT_Z_BOUND: f64 = 3.0;
pub const DEFAULT_IMPORTANCE_THRESHOLD: f64 = 0.1;
const NO_EXPECTED_SENTINEL: f64 = -9999.0;

#[derive(Debug, Clone, Copy)]
pub struct ZScoreResult {
    pub median: f64,
    pub mad: f64,
    pub mean_ad: Option<f64>,
    pub modified_z_score: f64,
    pub expected: f64,
    pub bounds: BoundPair,
    pub is_anomalous: bool,
    pub deviation: f64,
}

/// Forecast analysis's deviation rule: `-9999` sentinel when the expected
/// value is exactly zero, since a ratio against zero is meaningless.
fn deviation_of(y: f64, expected: f64) -> f64 {
    if expected != 0.0 {
        y / expected - 1.0
    } else {
        NO_EXPECTED_SENTINEL
    }
}

/// The z-score analysis's own deviation rule, distinct from the forecast
/// analysis's: zero expected values collapse to a deviation of 0, no
/// sentinel.
fn zscore_deviation(y: f64, expected: f64) -> f64 {
    if expected > 0.0 {
        y / expected - 1.0
    } else {
        0.0
    }
}

/// `meanAD` is only ever consumed as a fallback when MAD collapses to
/// zero, so it is recorded only in that case.
pub fn analyze_zscore(
    history_values: &[f64],
    y: f64,
    test_kind: TestKind,
    forced: ForcedThresholds,
) -> ZScoreResult {
    let reference = RobustReference::from_history(history_values);
    let raw_bounds = BoundPair {
        lower: reference.bound_at_z(-DEFAULT_Z_BOUND),
        upper: reference.bound_at_z(DEFAULT_Z_BOUND),
    };
    let forced_bounds = apply_forced(raw_bounds, forced, reference.median);
    let (bounds, expected) = clamp_nonnegative(test_kind, forced_bounds, reference.median);

    let is_anomalous = y < bounds.lower || y > bounds.upper;
    ZScoreResult {
        median: reference.median,
        mad: reference.mad,
        mean_ad: if reference.mad > 0.0 {
            None
        } else {
            Some(reference.mean_ad)
        },
        modified_z_score: reference.modified_z_score(y),
        expected,
        bounds,
        is_anomalous,
        deviation: zscore_deviation(y, expected),
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ForecastResult {
    pub expected: f64,
    pub bounds: BoundPair,
    pub is_anomalous: bool,
    pub deviation: f64,
}

pub fn analyze_forecast(
    components: ForecastComponents,
    y: f64,
    test_kind: TestKind,
    forced: ForcedThresholds,
    relative_reference: f64,
) -> ForecastResult {
    let (yhat_bounds, yhat_value) =
        clamp_nonnegative(test_kind, components.yhat.bounds, components.yhat.value);
    let (trend_bounds, trend_value) =
        clamp_nonnegative(test_kind, components.trend.bounds, components.trend.value);

    let union_lower = yhat_bounds.lower.min(trend_bounds.lower);
    let union_upper = yhat_bounds.upper.max(trend_bounds.upper);
    let midpoint = (union_lower + union_upper) / 2.0;

    let expected = if (yhat_value - midpoint).abs() <= (trend_value - midpoint).abs() {
        yhat_value
    } else {
        trend_value
    };

    let bounds = apply_forced(
        BoundPair {
            lower: union_lower,
            upper: union_upper,
        },
        forced,
        relative_reference,
    );

    let is_anomalous = y < bounds.lower || y > bounds.upper;
    ForecastResult {
        expected,
        bounds,
        is_anomalous,
        deviation: deviation_of(y, expected),
    }
}

#[derive(Debug, Clone, Copy)]
pub struct QuantModelOutcome {
    pub median_ad: f64,
    pub mean_ad: Option<f64>,
    pub modified_z_score: f64,
    pub expected_value: f64,
    pub expected_upper: f64,
    pub expected_lower: f64,
    pub deviation: f64,
    pub is_anomalous: bool,
    pub importance: Option<f64>,
}

/// Widest-union bound fusion plus the importance gate. `forecast` is `None`
/// when the history was too short to fit one; the z-score analysis alone
/// then determines the outcome. `importance_threshold` is normally
/// [`DEFAULT_IMPORTANCE_THRESHOLD`] but is exposed as a parameter since the
/// ambient configuration allows overriding it for testing.
pub fn fuse(z: ZScoreResult, forecast: Option<ForecastResult>, y: f64, importance_threshold: f64) -> QuantModelOutcome {
    let (final_lower, final_upper) = match forecast {
        Some(f) => (z.bounds.lower.min(f.bounds.lower), z.bounds.upper.max(f.bounds.upper)),
        None => (z.bounds.lower, z.bounds.upper),
    };

    let preliminary_anomaly = y < final_lower || y > final_upper;

    // expectedValue is chosen by proximity to the fused bounds' midpoint,
    // independently of deviation's own y-proximity rule.
    let midpoint = (final_lower + final_upper) / 2.0;
    let expected_value = match forecast {
        Some(f) if (f.expected - midpoint).abs() < (z.expected - midpoint).abs() => f.expected,
        _ => z.expected,
    };

    let deviation = match forecast {
        Some(f) if (f.expected - y).abs() < (z.expected - y).abs() => f.deviation,
        _ => z.deviation,
    };

    let importance = preliminary_anomaly.then(|| {
        let distance = if y > final_upper { y - final_upper } else { final_lower - y };
        let width = final_upper - final_lower;
        if width != 0.0 {
            distance / width
        } else {
            f64::INFINITY
        }
    });

    let is_anomalous = importance.is_some_and(|i| i >= importance_threshold);

    QuantModelOutcome {
        median_ad: z.mad,
        mean_ad: z.mean_ad,
        modified_z_score: z.modified_z_score,
        expected_value,
        expected_upper: final_upper,
        expected_lower: final_lower,
        deviation,
        is_anomalous,
        importance,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ForcedThresholds;

    #[test]
    fn steady_history_is_not_anomalous() {
        let history: Vec<f64> = vec![990.0, 995.0, 1000.0, 1005.0, 1010.0, 998.0, 1002.0];
        let z = analyze_zscore(&history, 1002.0, TestKind::MaterializationRowCount, ForcedThresholds::none());
        let outcome = fuse(z, None, 1002.0, DEFAULT_IMPORTANCE_THRESHOLD);
        assert!(!outcome.is_anomalous);
        assert!(outcome.importance.is_none());
    }

    #[test]
    fn large_spike_clears_importance_threshold() {
        let history: Vec<f64> = vec![990.0, 995.0, 1000.0, 1005.0, 1010.0, 998.0, 1002.0];
        let z = analyze_zscore(&history, 3000.0, TestKind::MaterializationRowCount, ForcedThresholds::none());
        let outcome = fuse(z, None, 3000.0, DEFAULT_IMPORTANCE_THRESHOLD);
        assert!(outcome.is_anomalous);
        assert!(outcome.importance.unwrap() > DEFAULT_IMPORTANCE_THRESHOLD);
    }

    #[test]
    fn forced_absolute_upper_overrides_computed_bound() {
        use crate::domain::{ForcedThreshold, ThresholdMode, ThresholdSource};
        let history: Vec<f64> = vec![80.0, 78.0, 82.0, 79.0, 81.0, 80.0, 77.0];
        let forced = ForcedThresholds {
            lower: None,
            upper: Some(ForcedThreshold {
                value: 100.0,
                mode: ThresholdMode::Absolute,
                source: ThresholdSource::Custom,
            }),
        };
        let z = analyze_zscore(&history, 150.0, TestKind::MaterializationRowCount, forced);
        assert_eq!(z.bounds.upper, 100.0);
        let outcome = fuse(z, None, 150.0, DEFAULT_IMPORTANCE_THRESHOLD);
        assert!(outcome.is_anomalous);
    }
}
