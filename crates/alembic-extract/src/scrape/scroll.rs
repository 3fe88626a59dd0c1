//! Adaptive scroll loop
//!
//! Chat share pages lazy-load history as the viewport moves. The loop scrolls
//! by a large fixed delta, waits, and measures the document height. It stops
//! once the height has stayed the same for `stability_threshold` consecutive
//! measurements, or at the step cap. A single unchanged measurement is not
//! enough: slow pages often pause before the next batch arrives.

use crate::error::ExtractResult;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Scroll steps between progress log lines
const PROGRESS_EVERY: u32 = 5;

/// Something that can be scrolled and measured.
#[async_trait]
pub trait ScrollSurface: Send + Sync {
    /// Scroll the viewport down by `delta` pixels.
    async fn scroll_by(&self, delta: f64) -> ExtractResult<()>;

    /// Current total document height in pixels.
    async fn scroll_height(&self) -> ExtractResult<u64>;
}

/// Loop parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrollPolicy {
    /// Pixels per step
    pub delta: f64,
    /// Wait after each step
    pub pause: Duration,
    /// Consecutive unchanged measurements that end the loop
    pub stability_threshold: u32,
    /// Hard cap on steps
    pub max_steps: u32,
}

impl Default for ScrollPolicy {
    fn default() -> Self {
        Self {
            delta: 3000.0,
            pause: Duration::from_secs(1),
            stability_threshold: 3,
            max_steps: 150,
        }
    }
}

impl From<&alembic_config::ScrapeConfig> for ScrollPolicy {
    fn from(config: &alembic_config::ScrapeConfig) -> Self {
        Self {
            delta: config.scroll_delta_px,
            pause: config.scroll_pause(),
            stability_threshold: config.stability_threshold,
            max_steps: config.max_scroll_steps,
        }
    }
}

/// Why the loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollStop {
    /// Height stopped changing
    Stable,
    /// Step cap reached while content was still growing
    StepCap,
    /// Scrolling or measuring failed; whatever loaded so far is kept
    Failed,
}

/// Summary of one run of the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollOutcome {
    /// Steps performed
    pub steps: u32,
    /// Last successfully measured height
    pub final_height: u64,
    /// Termination reason
    pub stop: ScrollStop,
}

/// Scroll `surface` until its height settles.
pub async fn adaptive_scroll<S>(surface: &S, policy: &ScrollPolicy) -> ScrollOutcome
where
    S: ScrollSurface + ?Sized,
{
    let mut last_height = surface.scroll_height().await.unwrap_or_else(|e| {
        warn!(error = %e, "Initial height measurement failed");
        0
    });
    let mut stable_count = 0u32;
    let mut steps = 0u32;

    while steps < policy.max_steps {
        if let Err(e) = surface.scroll_by(policy.delta).await {
            warn!(error = %e, steps, "Scroll failed, keeping loaded content");
            return ScrollOutcome {
                steps,
                final_height: last_height,
                stop: ScrollStop::Failed,
            };
        }
        steps += 1;

        if !policy.pause.is_zero() {
            tokio::time::sleep(policy.pause).await;
        }

        let height = match surface.scroll_height().await {
            Ok(height) => height,
            Err(e) => {
                warn!(error = %e, steps, "Height measurement failed, keeping loaded content");
                return ScrollOutcome {
                    steps,
                    final_height: last_height,
                    stop: ScrollStop::Failed,
                };
            }
        };

        if height == last_height {
            stable_count += 1;
            debug!(steps, height, stable_count, "Height unchanged");
            if stable_count >= policy.stability_threshold {
                info!(steps, height, "Page height stable");
                return ScrollOutcome {
                    steps,
                    final_height: height,
                    stop: ScrollStop::Stable,
                };
            }
        } else {
            stable_count = 0;
        }
        last_height = height;

        if steps % PROGRESS_EVERY == 0 {
            info!(steps, height, "Scrolling...");
        }
    }

    info!(steps, height = last_height, "Scroll step cap reached");
    ScrollOutcome {
        steps,
        final_height: last_height,
        stop: ScrollStop::StepCap,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExtractError;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// Replays scripted heights; the last one repeats forever.
    struct ScriptedPage {
        heights: Mutex<VecDeque<u64>>,
        scrolls: AtomicU32,
    }

    impl ScriptedPage {
        fn new(heights: &[u64]) -> Self {
            Self {
                heights: Mutex::new(heights.iter().copied().collect()),
                scrolls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl ScrollSurface for ScriptedPage {
        async fn scroll_by(&self, _delta: f64) -> ExtractResult<()> {
            self.scrolls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn scroll_height(&self) -> ExtractResult<u64> {
            let mut heights = self.heights.lock().unwrap();
            if heights.len() > 1 {
                Ok(heights.pop_front().unwrap())
            } else {
                heights
                    .front()
                    .copied()
                    .ok_or_else(|| ExtractError::Browser("no heights".to_string()))
            }
        }
    }

    /// Grows by 1000px on every measurement.
    struct EndlessPage {
        height: AtomicU32,
    }

    #[async_trait]
    impl ScrollSurface for EndlessPage {
        async fn scroll_by(&self, _delta: f64) -> ExtractResult<()> {
            Ok(())
        }

        async fn scroll_height(&self) -> ExtractResult<u64> {
            Ok(u64::from(self.height.fetch_add(1000, Ordering::SeqCst)))
        }
    }

    struct BrokenPage;

    #[async_trait]
    impl ScrollSurface for BrokenPage {
        async fn scroll_by(&self, _delta: f64) -> ExtractResult<()> {
            Ok(())
        }

        async fn scroll_height(&self) -> ExtractResult<u64> {
            Err(ExtractError::Browser("target closed".to_string()))
        }
    }

    fn policy(max_steps: u32) -> ScrollPolicy {
        ScrollPolicy {
            delta: 3000.0,
            pause: Duration::ZERO,
            stability_threshold: 3,
            max_steps,
        }
    }

    #[tokio::test]
    async fn test_two_equal_measurements_do_not_stop() {
        // 200 repeats twice before the page grows again to 300.
        let page = ScriptedPage::new(&[100, 200, 200, 200, 300]);

        let outcome = adaptive_scroll(&page, &policy(150)).await;

        assert_eq!(outcome.stop, ScrollStop::Stable);
        assert_eq!(outcome.final_height, 300);
        // 200, 200, 200, 300, then three unchanged 300s
        assert_eq!(outcome.steps, 7);
        assert_eq!(page.scrolls.load(Ordering::SeqCst), 7);
    }

    #[tokio::test]
    async fn test_stops_after_threshold_unchanged() {
        let page = ScriptedPage::new(&[500]);
        let outcome = adaptive_scroll(&page, &policy(150)).await;

        assert_eq!(outcome.stop, ScrollStop::Stable);
        assert_eq!(outcome.steps, 3);
    }

    #[tokio::test]
    async fn test_endless_growth_hits_step_cap() {
        let page = EndlessPage {
            height: AtomicU32::new(0),
        };

        let outcome = adaptive_scroll(&page, &policy(12)).await;

        assert_eq!(outcome.stop, ScrollStop::StepCap);
        assert_eq!(outcome.steps, 12);
    }

    #[tokio::test]
    async fn test_measurement_failure_keeps_going_with_partial_content() {
        let outcome = adaptive_scroll(&BrokenPage, &policy(150)).await;

        assert_eq!(outcome.stop, ScrollStop::Failed);
        assert_eq!(outcome.steps, 1);
        assert_eq!(outcome.final_height, 0);
    }

    #[test]
    fn test_policy_from_config() {
        let config = alembic_config::ScrapeConfig::default();
        let policy = ScrollPolicy::from(&config);
        assert_eq!(policy, ScrollPolicy::default());
    }
}
