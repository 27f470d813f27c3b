use rand::Rng;
use std::time::Duration;

/// Exponential backoff with ±30% jitter. `retry` is zero for the first retry.
pub fn calculate_backoff_delay(retry: u32, base_delay_secs: u32) -> Duration {
    // Cap the exponent so the delay stays bounded (~8.5 hours with a 30s base)
    let capped = retry.min(10);
    let base_delay = base_delay_secs.saturating_mul(2_u32.saturating_pow(capped));
    if base_delay == 0 {
        return Duration::ZERO;
    }

    let jitter_factor = rand::thread_rng().gen_range(0.7..1.3);
    let millis = (base_delay as f64 * 1000.0 * jitter_factor).round() as u64;

    Duration::from_millis(millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_progression() {
        let base_delay = 5;

        let delay0 = calculate_backoff_delay(0, base_delay);
        let delay1 = calculate_backoff_delay(1, base_delay);
        let delay2 = calculate_backoff_delay(2, base_delay);

        assert!(delay0 >= Duration::from_millis(3500) && delay0 <= Duration::from_millis(6500));
        assert!(delay1 >= Duration::from_millis(7000) && delay1 <= Duration::from_millis(13000));
        assert!(delay2 >= Duration::from_millis(14000) && delay2 <= Duration::from_millis(26000));
    }

    #[test]
    fn test_backoff_cap() {
        // 30 * 2^10 = 30720s, with jitter 0.7-1.3
        let delay_high = calculate_backoff_delay(20, 30);
        assert!(delay_high.as_secs() >= 21000 && delay_high.as_secs() <= 40000);
    }

    #[test]
    fn test_zero_base_means_no_wait() {
        assert_eq!(calculate_backoff_delay(3, 0), Duration::ZERO);
    }
}
