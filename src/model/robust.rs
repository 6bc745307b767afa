//! Robust location/scale statistics over a reference distribution (history
//! only, never including the candidate point), grounded on the median/MAD
//! helpers a time-series scoring module would hand-roll rather than pull in
//! a heavier statistics dependency for.

const MAD_SCALE: f64 = 1.486;
const MEAN_AD_SCALE: f64 = 1.253_314;

pub fn median(values: &[f64]) -> f64 {
    let mut sorted: Vec<f64> = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let len = sorted.len();
    if len == 0 {
        return f64::NAN;
    }
    let mid = len / 2;
    if len % 2 == 1 {
        sorted[mid]
    } else {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    }
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Median absolute deviation around `center`.
pub fn median_absolute_deviation(values: &[f64], center: f64) -> f64 {
    let deviations: Vec<f64> = values.iter().map(|v| (v - center).abs()).collect();
    median(&deviations)
}

/// Mean absolute deviation around the (arithmetic) mean of `values`, used
/// as the fallback scale estimator when MAD collapses to zero.
pub fn mean_absolute_deviation(values: &[f64]) -> f64 {
    let m = mean(values);
    values.iter().map(|v| (v - m).abs()).sum::<f64>() / values.len() as f64
}

#[derive(Debug, Clone, Copy)]
pub struct RobustReference {
    pub median: f64,
    pub mad: f64,
    pub mean_ad: f64,
}

impl RobustReference {
    pub fn from_history(values: &[f64]) -> Self {
        let median = median(values);
        let mad = median_absolute_deviation(values, median);
        let mean_ad = mean_absolute_deviation(values);
        Self { median, mad, mean_ad }
    }

    /// The scale actually used: MAD scaled by 1.486, or MeanAD scaled by
    /// 1.253314 when MAD collapses to zero.
    fn scale(&self) -> Option<f64> {
        if self.mad > 0.0 {
            Some(MAD_SCALE * self.mad)
        } else if self.mean_ad > 0.0 {
            Some(MEAN_AD_SCALE * self.mean_ad)
        } else {
            None
        }
    }

    /// Modified z-score of `y` against this reference. `NaN` when both MAD
    /// and MeanAD are zero (a perfectly flat history).
    pub fn modified_z_score(&self, y: f64) -> f64 {
        match self.scale() {
            Some(scale) => (y - self.median) / scale,
            None => f64::NAN,
        }
    }

    /// `bound_at_z(t) = scale * t + median`.
    pub fn bound_at_z(&self, z: f64) -> f64 {
        match self.scale() {
            Some(scale) => scale * z + self.median,
            None => self.median,
        }
    }

    /// Inverts `bound_at_z`: the z-boundary a given bound value corresponds
    /// to, used when a forced threshold overrides a bound directly and the
    /// model still needs a z-boundary for the decision.
    pub fn z_at_bound(&self, bound: f64) -> f64 {
        match self.scale() {
            Some(scale) if scale != 0.0 => (bound - self.median) / scale,
            _ => f64::NAN,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn median_of_odd_length_is_middle_value() {
        assert_eq!(median(&[1.0, 3.0, 2.0]), 2.0);
    }

    #[test]
    fn median_of_even_length_averages_middle_pair() {
        assert_eq!(median(&[1.0, 2.0, 3.0, 4.0]), 2.5);
    }

    #[test]
    fn flat_history_has_nan_z_score() {
        let reference = RobustReference::from_history(&[5.0, 5.0, 5.0, 5.0]);
        assert!(reference.modified_z_score(5.0).is_nan());
        assert!(reference.modified_z_score(9.0).is_nan());
    }

    #[test]
    fn mean_ad_fallback_applies_when_mad_is_zero() {
        // Median collapses to 10 (four 10s dominate) but values still vary,
        // so MeanAD > 0 even though MAD == 0.
        let reference = RobustReference::from_history(&[10.0, 10.0, 10.0, 10.0, 40.0]);
        assert_eq!(reference.mad, 0.0);
        assert!(reference.mean_ad > 0.0);
        assert!(reference.modified_z_score(10.0).is_finite());
    }

    #[test]
    fn bound_and_z_at_bound_are_inverses() {
        let reference = RobustReference::from_history(&[10.0, 12.0, 9.0, 11.0, 10.0, 13.0, 8.0]);
        let bound = reference.bound_at_z(3.0);
        let z = reference.z_at_bound(bound);
        assert!((z - 3.0).abs() < 1e-9);
    }
}
