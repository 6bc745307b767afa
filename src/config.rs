use anyhow::{Context, Result};

/// Runtime configuration for one engine invocation, resolved from the
/// environment. Mirrors the defaulting/validation style of a typical
/// deployment config loader: required values fail closed with a contextual
/// message, optional values fall back to sane defaults.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub database_url: String,
    pub warehouse_api_base_url: String,
    pub alert_webhook_base_url: Option<String>,
    /// Samples below which a test suite is still in warm-up, absent the day
    /// bound also being satisfied.
    pub warmup_sample_threshold: usize,
    /// Days below which a test suite is still in warm-up, absent the sample
    /// bound also being satisfied.
    pub warmup_day_threshold: i64,
    /// Fraction of the fused bound interval a violation must clear before
    /// it is reported as an anomaly.
    pub importance_threshold: f64,
    /// Minimum gap between two `lastAlertSent` bumps for the same suite.
    pub alert_resend_cooldown_hours: i64,
}

impl EngineConfig {
    pub fn from_env() -> Result<Self> {
        let database_url = env_required("ENGINE_DATABASE_URL")
            .context("ENGINE_DATABASE_URL must be set for the test execution engine")?;
        let warehouse_api_base_url = env_required("ENGINE_WAREHOUSE_API_BASE_URL")
            .context("ENGINE_WAREHOUSE_API_BASE_URL must be set to reach the warehouse query service")?;
        let alert_webhook_base_url = env_optional("ENGINE_ALERT_WEBHOOK_BASE_URL");

        let warmup_sample_threshold = env_u64("ENGINE_WARMUP_SAMPLE_THRESHOLD", 30) as usize;
        let warmup_day_threshold = env_u64("ENGINE_WARMUP_DAY_THRESHOLD", 7) as i64;
        let importance_threshold = env_f64("ENGINE_IMPORTANCE_THRESHOLD", 0.1);
        let alert_resend_cooldown_hours = env_u64("ENGINE_ALERT_RESEND_COOLDOWN_HOURS", 24) as i64;

        if !(0.0..=1.0).contains(&importance_threshold) {
            anyhow::bail!("ENGINE_IMPORTANCE_THRESHOLD must be between 0 and 1");
        }

        Ok(Self {
            database_url,
            warehouse_api_base_url,
            alert_webhook_base_url,
            warmup_sample_threshold,
            warmup_day_threshold,
            importance_threshold,
            alert_resend_cooldown_hours,
        })
    }
}

fn env_optional(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn env_required(key: &str) -> Result<String> {
    env_optional(key).ok_or_else(|| anyhow::anyhow!("{key} is not set"))
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|value| value.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_f64(key: &str, default: f64) -> f64 {
    std::env::var(key)
        .ok()
        .and_then(|value| value.trim().parse::<f64>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_f64_parses_valid_values() {
        std::env::set_var("ENGINE_TEST_FLOAT_KEY", "0.25");
        assert_eq!(env_f64("ENGINE_TEST_FLOAT_KEY", 0.1), 0.25);
        std::env::remove_var("ENGINE_TEST_FLOAT_KEY");
    }
}
