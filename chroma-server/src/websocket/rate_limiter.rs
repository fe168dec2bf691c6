use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitSettings {
    pub max_messages: u32,
    pub refill_every: Duration,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            max_messages: 30,
            refill_every: Duration::from_millis(500),
        }
    }
}

/// Per-connection token bucket. One token per inbound message, one token
/// back every `refill_every`.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    tokens: u32,
    max_tokens: u32,
    refill_every: Duration,
    last_refill: Instant,
}

impl RateLimiter {
    pub fn new(settings: RateLimitSettings) -> Self {
        Self {
            tokens: settings.max_messages,
            max_tokens: settings.max_messages,
            refill_every: settings.refill_every,
            last_refill: Instant::now(),
        }
    }

    pub fn check_rate_limit(&mut self) -> bool {
        self.refill_tokens(Instant::now());

        if self.tokens > 0 {
            self.tokens -= 1;
            true
        } else {
            false
        }
    }

    fn refill_tokens(&mut self, now: Instant) {
        if self.refill_every.is_zero() {
            self.tokens = self.max_tokens;
            self.last_refill = now;
            return;
        }

        let elapsed = now.duration_since(self.last_refill);
        let earned = (elapsed.as_nanos() / self.refill_every.as_nanos()).min(u128::from(u32::MAX)) as u32;
        if earned > 0 {
            self.tokens = self.tokens.saturating_add(earned).min(self.max_tokens);
            // Keep the remainder so partial intervals still count
            self.last_refill += self.refill_every * earned;
        }
    }

    pub fn remaining_tokens(&mut self) -> u32 {
        self.refill_tokens(Instant::now());
        self.tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_drains() {
        let mut limiter = RateLimiter::new(RateLimitSettings {
            max_messages: 3,
            refill_every: Duration::from_secs(60),
        });

        assert!(limiter.check_rate_limit());
        assert!(limiter.check_rate_limit());
        assert!(limiter.check_rate_limit());
        assert!(!limiter.check_rate_limit());
        assert_eq!(limiter.remaining_tokens(), 0);
    }

    #[test]
    fn test_bucket_refills() {
        let mut limiter = RateLimiter::new(RateLimitSettings {
            max_messages: 2,
            refill_every: Duration::from_millis(10),
        });

        assert!(limiter.check_rate_limit());
        assert!(limiter.check_rate_limit());
        assert!(!limiter.check_rate_limit());

        std::thread::sleep(Duration::from_millis(25));
        assert_eq!(limiter.remaining_tokens(), 2);
    }

    #[test]
    fn test_default_settings_allow_a_burst() {
        let mut limiter = RateLimiter::new(RateLimitSettings::default());
        assert_eq!(limiter.remaining_tokens(), 30);

        for _ in 0..30 {
            assert!(limiter.check_rate_limit());
        }
        assert!(!limiter.check_rate_limit());
    }

    #[test]
    fn test_zero_refill_never_limits() {
        let mut limiter = RateLimiter::new(RateLimitSettings {
            max_messages: 1,
            refill_every: Duration::ZERO,
        });

        for _ in 0..100 {
            assert!(limiter.check_rate_limit());
        }
    }
}
