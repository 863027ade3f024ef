//! Token-bucket rate limiting for disk and network transfers.
//!
//! Limiters are resolved once at startup and shared read-only with every
//! transfer worker; `acquire` is the only blocking point they expose.

use crate::config::result_error::result::Result;
use crate::config::settings::{parse_u64_setting, Settings};
use std::sync::Arc;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::info;

pub const DISK_RATE_LIMIT_SETTING: &str = "WALVAULT_DISK_RATE_LIMIT";
pub const NETWORK_RATE_LIMIT_SETTING: &str = "WALVAULT_NETWORK_RATE_LIMIT";

pub const DATABASE_PAGE_SIZE: u64 = 8192;
/// Extra burst headroom on top of the configured rate: eight database pages.
pub const DEFAULT_DATA_BURST_RATE_LIMIT: u64 = 8 * DATABASE_PAGE_SIZE;

/// Token bucket state for one limiter.
#[derive(Debug)]
struct TokenBucket {
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucket {
    fn refill(&mut self, rate: u64, capacity: u64, now: Instant) {
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        if elapsed > 0.0 {
            self.tokens = (self.tokens + elapsed * rate as f64).min(capacity as f64);
            self.last_refill = now;
        }
    }

    fn try_consume(&mut self, rate: u64, capacity: u64, amount: u64, now: Instant) -> bool {
        self.refill(rate, capacity, now);
        let amount = amount as f64;
        if self.tokens >= amount {
            self.tokens -= amount;
            true
        } else {
            false
        }
    }
}

/// Shared token-bucket limiter. Burst capacity is always rate + eight pages,
/// so the bucket can never be smaller than its own rate.
#[derive(Debug)]
pub struct RateLimiter {
    rate: u64,
    burst: u64,
    bucket: Mutex<TokenBucket>,
}

impl RateLimiter {
    pub fn new(rate: u64) -> Self {
        let burst = rate.saturating_add(DEFAULT_DATA_BURST_RATE_LIMIT);
        Self {
            rate,
            burst,
            bucket: Mutex::new(TokenBucket {
                tokens: burst as f64,
                last_refill: Instant::now(),
            }),
        }
    }

    pub fn rate(&self) -> u64 {
        self.rate
    }

    pub fn burst(&self) -> u64 {
        self.burst
    }

    /// Consumes `amount` tokens if available without blocking.
    pub fn try_acquire(&self, amount: u64) -> bool {
        let amount = amount.min(self.burst);
        let mut bucket = self.bucket.lock().unwrap();
        bucket.try_consume(self.rate, self.burst, amount, Instant::now())
    }

    /// Blocks the calling worker until `amount` tokens are available.
    /// Requests larger than the burst capacity are clamped to it.
    pub fn acquire(&self, amount: u64) {
        let amount = amount.min(self.burst);
        loop {
            let wait = {
                let mut bucket = self.bucket.lock().unwrap();
                let now = Instant::now();
                if bucket.try_consume(self.rate, self.burst, amount, now) {
                    return;
                }
                let missing = amount as f64 - bucket.tokens;
                if self.rate == 0 {
                    Duration::from_millis(100)
                } else {
                    Duration::from_secs_f64(missing / self.rate as f64)
                }
            };
            std::thread::sleep(wait);
        }
    }
}

/// Disk and network limiters resolved from settings. `None` means unlimited.
#[derive(Clone, Debug, Default)]
pub struct RateLimits {
    pub disk: Option<Arc<RateLimiter>>,
    pub network: Option<Arc<RateLimiter>>,
}

fn configure_limiter(
    settings: &dyn Settings,
    setting: &'static str,
) -> Result<Option<Arc<RateLimiter>>> {
    let Some(value) = settings.lookup(setting).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    let rate = parse_u64_setting(&value, setting)?;
    info!("Limiting {} to {} bytes/sec", setting, rate);
    Ok(Some(Arc::new(RateLimiter::new(rate))))
}

pub fn configure_limiters(settings: &dyn Settings) -> Result<RateLimits> {
    Ok(RateLimits {
        disk: configure_limiter(settings, DISK_RATE_LIMIT_SETTING)?,
        network: configure_limiter(settings, NETWORK_RATE_LIMIT_SETTING)?,
    })
}
