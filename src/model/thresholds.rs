//! Forced-threshold application and the domain-adjusted non-negativity
//! clamp, shared by both the z-score and forecast analyses so the two stay
//! in lock-step on how a "custom"/"feedback" override reads.

use crate::domain::{ForcedThreshold, ForcedThresholds, ThresholdMode, TestKind};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundPair {
    pub lower: f64,
    pub upper: f64,
}

fn resolve(threshold: ForcedThreshold, relative_reference: f64) -> f64 {
    match threshold.mode {
        ThresholdMode::Absolute => threshold.value,
        ThresholdMode::Relative => relative_reference * threshold.value,
    }
}

/// Replaces a computed bound with a forced one wherever the definition
/// supplies one, independently per side. `relative_reference` is always
/// the history's robust median (μ̃), the same reference both analyses'
/// relative-mode thresholds scale against.
pub fn apply_forced(
    computed: BoundPair,
    forced: ForcedThresholds,
    relative_reference: f64,
) -> BoundPair {
    BoundPair {
        lower: forced
            .lower
            .map(|t| resolve(t, relative_reference))
            .unwrap_or(computed.lower),
        upper: forced
            .upper
            .map(|t| resolve(t, relative_reference))
            .unwrap_or(computed.upper),
    }
}

/// Clamps bounds and expected value to 0 for every metric except
/// `ColumnDistribution` and `ColumnFreshness`, which may legitimately be
/// negative.
pub fn clamp_nonnegative(test_kind: TestKind, bounds: BoundPair, expected: f64) -> (BoundPair, f64) {
    if test_kind.exempt_from_nonnegativity_clamp() {
        return (bounds, expected);
    }
    (
        BoundPair {
            lower: bounds.lower.max(0.0),
            upper: bounds.upper.max(0.0),
        },
        expected.max(0.0),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ThresholdSource;

    #[test]
    fn absolute_forced_threshold_replaces_bound_outright() {
        let forced = ForcedThresholds {
            lower: None,
            upper: Some(ForcedThreshold {
                value: 100.0,
                mode: ThresholdMode::Absolute,
                source: ThresholdSource::Custom,
            }),
        };
        let bounds = apply_forced(BoundPair { lower: 10.0, upper: 1050.0 }, forced, 200.0);
        assert_eq!(bounds.upper, 100.0);
        assert_eq!(bounds.lower, 10.0);
    }

    #[test]
    fn relative_forced_threshold_scales_against_median() {
        let forced = ForcedThresholds {
            lower: Some(ForcedThreshold {
                value: 0.5,
                mode: ThresholdMode::Relative,
                source: ThresholdSource::Feedback,
            }),
            upper: None,
        };
        let bounds = apply_forced(BoundPair { lower: 0.0, upper: 300.0 }, forced, 200.0);
        assert_eq!(bounds.lower, 100.0);
    }

    #[test]
    fn column_distribution_is_exempt_from_clamp() {
        let (bounds, expected) =
            clamp_nonnegative(TestKind::ColumnDistribution, BoundPair { lower: -5.0, upper: 10.0 }, -1.0);
        assert_eq!(bounds.lower, -5.0);
        assert_eq!(expected, -1.0);
    }

    #[test]
    fn row_count_clamps_negative_bound_to_zero() {
        let (bounds, expected) = clamp_nonnegative(
            TestKind::MaterializationRowCount,
            BoundPair { lower: -5.0, upper: 10.0 },
            -1.0,
        );
        assert_eq!(bounds.lower, 0.0);
        assert_eq!(expected, 0.0);
    }
}
