//! Trend-plus-seasonality forecast computed with plain iterative math,
//! `statrs` only for the distribution quantile, rather than pulling in a
//! heavier fitting dependency for what amounts to an OLS-plus-Fourier fit.

use chrono::{DateTime, Utc};
use statrs::distribution::{ContinuousCDF, StudentsT};

use super::thresholds::BoundPair;
use crate::domain::HistoryPoint;

/// Matches the ~99.73% two-sided coverage the z-score analysis gets from a
/// fixed ±3.0 bound, so the two analyses' default widths are comparable.
const UPPER_TAIL_PROBABILITY: f64 = 0.00135;

#[derive(Debug, Clone, Copy)]
struct SeasonalPeriod {
    days: f64,
}

const CANDIDATE_PERIODS: [SeasonalPeriod; 3] = [
    SeasonalPeriod { days: 1.0 },
    SeasonalPeriod { days: 7.0 },
    SeasonalPeriod { days: 365.25 },
];

#[derive(Debug, Clone, Copy)]
pub struct ForecastComponent {
    pub value: f64,
    pub bounds: BoundPair,
}

#[derive(Debug, Clone, Copy)]
pub struct ForecastComponents {
    pub yhat: ForecastComponent,
    pub trend: ForecastComponent,
}

/// Fits trend + whichever seasonal periods the history spans at least two
/// full cycles of, then predicts the point at `at`. Returns `None` when
/// there isn't enough history to fit a trend with a usable residual
/// degree of freedom (fewer than 3 points).
pub fn fit(history: &[HistoryPoint], at: DateTime<Utc>) -> Option<ForecastComponents> {
    if history.len() < 3 {
        return None;
    }
    let origin = history.iter().map(|p| p.executed_on).min()?;
    let span_days = history
        .iter()
        .map(|p| days_between(origin, p.executed_on))
        .fold(0.0_f64, f64::max);

    let active_periods: Vec<SeasonalPeriod> = CANDIDATE_PERIODS
        .into_iter()
        .filter(|p| span_days >= 2.0 * p.days)
        .collect();

    let design: Vec<Vec<f64>> = history
        .iter()
        .map(|p| design_row(days_between(origin, p.executed_on), &active_periods))
        .collect();
    let targets: Vec<f64> = history.iter().map(|p| p.value).collect();

    let beta = ols_solve(&design, &targets)?;
    let k = beta.len();
    let n = history.len();
    let df = (n - k) as f64;
    if df < 1.0 {
        return None;
    }

    let residual_sum_sq: f64 = design
        .iter()
        .zip(targets.iter())
        .map(|(row, &y)| {
            let pred = dot(row, &beta);
            (y - pred).powi(2)
        })
        .sum();
    let residual_se = (residual_sum_sq / df).sqrt();

    let t_crit = StudentsT::new(0.0, 1.0, df)
        .ok()
        .map(|dist| dist.inverse_cdf(1.0 - UPPER_TAIL_PROBABILITY))
        .unwrap_or(3.0);
    let half_width = t_crit * residual_se;

    let target_t = days_between(origin, at);
    let target_row = design_row(target_t, &active_periods);
    let yhat_value = dot(&target_row, &beta);
    let trend_value = beta[0] + beta[1] * target_t;

    Some(ForecastComponents {
        yhat: ForecastComponent {
            value: yhat_value,
            bounds: BoundPair {
                lower: yhat_value - half_width,
                upper: yhat_value + half_width,
            },
        },
        trend: ForecastComponent {
            value: trend_value,
            bounds: BoundPair {
                lower: trend_value - half_width,
                upper: trend_value + half_width,
            },
        },
    })
}

fn days_between(origin: DateTime<Utc>, t: DateTime<Utc>) -> f64 {
    (t - origin).num_milliseconds() as f64 / 86_400_000.0
}

/// `[1, t, sin(2pi t/p), cos(2pi t/p), ...]` for each active period.
fn design_row(t_days: f64, periods: &[SeasonalPeriod]) -> Vec<f64> {
    let mut row = vec![1.0, t_days];
    for period in periods {
        let angle = 2.0 * std::f64::consts::PI * t_days / period.days;
        row.push(angle.sin());
        row.push(angle.cos());
    }
    row
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Solves the normal equations `(XᵀX)β = Xᵀy` via Gaussian elimination with
/// partial pivoting. Returns `None` if `XᵀX` is singular.
fn ols_solve(design: &[Vec<f64>], targets: &[f64]) -> Option<Vec<f64>> {
    let k = design[0].len();
    let mut xtx = vec![vec![0.0_f64; k]; k];
    let mut xty = vec![0.0_f64; k];
    for (row, &y) in design.iter().zip(targets) {
        for i in 0..k {
            xty[i] += row[i] * y;
            for j in 0..k {
                xtx[i][j] += row[i] * row[j];
            }
        }
    }
    solve_linear_system(xtx, xty)
}

fn solve_linear_system(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Option<Vec<f64>> {
    let n = b.len();
    for col in 0..n {
        let pivot_row = (col..n).max_by(|&r1, &r2| a[r1][col].abs().total_cmp(&a[r2][col].abs()))?;
        if a[pivot_row][col].abs() < 1e-12 {
            return None;
        }
        a.swap(col, pivot_row);
        b.swap(col, pivot_row);

        let pivot = a[col][col];
        for j in col..n {
            a[col][j] /= pivot;
        }
        b[col] /= pivot;

        for row in 0..n {
            if row == col {
                continue;
            }
            let factor = a[row][col];
            if factor == 0.0 {
                continue;
            }
            for j in col..n {
                a[row][j] -= factor * a[col][j];
            }
            b[row] -= factor * b[col];
        }
    }
    Some(b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn point(day: i64, value: f64) -> HistoryPoint {
        HistoryPoint {
            executed_on: Utc.timestamp_opt(day * 86_400, 0).unwrap(),
            value,
        }
    }

    #[test]
    fn too_little_history_yields_no_forecast() {
        let history = vec![point(0, 10.0), point(1, 11.0)];
        assert!(fit(&history, Utc.timestamp_opt(2 * 86_400, 0).unwrap()).is_none());
    }

    #[test]
    fn flat_history_forecasts_near_its_own_level() {
        let history: Vec<HistoryPoint> = (0..10).map(|d| point(d, 1000.0)).collect();
        let at = Utc.timestamp_opt(10 * 86_400, 0).unwrap();
        let components = fit(&history, at).expect("enough history to fit");
        assert!((components.yhat.value - 1000.0).abs() < 1.0);
        assert!((components.trend.value - 1000.0).abs() < 1.0);
    }

    #[test]
    fn rising_trend_extrapolates_forward() {
        let history: Vec<HistoryPoint> = (0..10).map(|d| point(d, 100.0 + 10.0 * d as f64)).collect();
        let at = Utc.timestamp_opt(10 * 86_400, 0).unwrap();
        let components = fit(&history, at).expect("enough history to fit");
        assert!(components.trend.value > 190.0);
    }
}
