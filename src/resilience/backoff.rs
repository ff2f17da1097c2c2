//! Exponential backoff with optional jitter.

use rand::Rng;
use std::time::Duration;

/// Calculate the delay after failed attempt number `attempt` (1-based).
///
/// The delay is `base_ms * multiplier^(attempt - 1)`, capped at `max_ms`,
/// plus up to `jitter_ratio` of itself in random jitter. A multiplier of
/// 1.0 yields a fixed interval.
pub fn calculate_backoff(attempt: u32, base_ms: u64, multiplier: f64, max_ms: u64, jitter_ratio: f64) -> Duration {
    if attempt == 0 {
        return Duration::from_millis(0);
    }

    let exponent = i32::try_from(attempt - 1).unwrap_or(i32::MAX);
    let delay_ms = base_ms as f64 * multiplier.powi(exponent);
    let capped_delay = if delay_ms.is_finite() {
        (delay_ms as u64).min(max_ms)
    } else {
        max_ms
    };

    let jitter_range = (capped_delay as f64 * jitter_ratio.clamp(0.0, 1.0)) as u64;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    Duration::from_millis(capped_delay.saturating_add(jitter))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_interval() {
        for attempt in 1..20 {
            assert_eq!(calculate_backoff(attempt, 2000, 1.0, 30_000, 0.0), Duration::from_secs(2));
        }
    }

    #[test]
    fn test_backoff_calculation() {
        assert_eq!(calculate_backoff(1, 100, 2.0, 2000, 0.0).as_millis(), 100);
        assert_eq!(calculate_backoff(2, 100, 2.0, 2000, 0.0).as_millis(), 200);
        assert_eq!(calculate_backoff(3, 100, 2.0, 2000, 0.0).as_millis(), 400);
        assert_eq!(calculate_backoff(10, 100, 2.0, 1000, 0.0).as_millis(), 1000);
        assert_eq!(calculate_backoff(u32::MAX, 100, 2.0, 1000, 0.0).as_millis(), 1000);
    }

    #[test]
    fn test_jitter_bounds() {
        for _ in 0..100 {
            let delay = calculate_backoff(1, 1000, 1.0, 1000, 0.1).as_millis();
            assert!((1000..1100).contains(&delay));
        }
    }

    #[test]
    fn test_jitter_on_unbounded_cap_saturates() {
        let delay = calculate_backoff(1, u64::MAX, 1.0, u64::MAX, 1.0);
        assert!(delay >= Duration::from_millis(u64::MAX / 2));
        assert!(delay <= Duration::from_millis(u64::MAX));
    }

    #[test]
    fn test_attempt_zero_has_no_delay() {
        assert_eq!(calculate_backoff(0, 2000, 1.0, 30_000, 0.5), Duration::ZERO);
    }
}
