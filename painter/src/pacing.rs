use crate::config::PacingConfig;
use rand::Rng;
use std::time::Duration;
use tokio::time::sleep;

/// Randomized pause between commit operations, sized to diffuse timestamps
/// and avoid overwhelming the remote service. Disable it to make test runs
/// deterministic and instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacingPolicy {
    min: Duration,
    max: Duration,
}

impl PacingPolicy {
    pub fn new(min: Duration, max: Duration) -> Self {
        Self { min, max }
    }

    pub fn disabled() -> Self {
        Self {
            min: Duration::ZERO,
            max: Duration::ZERO,
        }
    }

    pub fn is_disabled(&self) -> bool {
        self.max.is_zero()
    }

    /// Draw a pause length from the configured bounds.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> Duration {
        if self.is_disabled() {
            return Duration::ZERO;
        }
        let min = self.min.as_millis() as u64;
        let max = self.max.as_millis() as u64;
        if min >= max {
            return self.max;
        }
        Duration::from_millis(rng.gen_range(min..=max))
    }

    pub async fn pause(&self) {
        if self.is_disabled() {
            return;
        }
        let delay = self.sample(&mut rand::thread_rng());
        sleep(delay).await;
    }
}

impl From<&PacingConfig> for PacingPolicy {
    fn from(config: &PacingConfig) -> Self {
        Self::new(
            Duration::from_millis(config.min_ms),
            Duration::from_millis(config.max_ms),
        )
    }
}
