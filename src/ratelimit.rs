use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::clients::ProviderId;
use crate::constants::ratelimit::{DEFAULT_CAPACITY, DEFAULT_WINDOW_SECS};

/// Capacity over a trailing window for one provider.
#[derive(Debug, Clone, Copy)]
pub struct WindowConfig {
    pub capacity: usize,
    pub window: Duration,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            window: Duration::from_secs(DEFAULT_WINDOW_SECS),
        }
    }
}

/// Sliding-window admission control, one window per provider.
///
/// Admission is decided synchronously; there is no waiting. A denied caller
/// treats it as terminal for the request and may retry after
/// [`RateLimiter::retry_after`]. Timestamps older than the window are pruned
/// lazily before every check, so a fully decayed window is indistinguishable
/// from a provider that was never called.
pub struct RateLimiter {
    configs: HashMap<ProviderId, WindowConfig>,
    fallback: WindowConfig,
    windows: Mutex<HashMap<ProviderId, VecDeque<Instant>>>,
}

impl RateLimiter {
    #[must_use]
    pub fn new(configs: HashMap<ProviderId, WindowConfig>) -> Self {
        Self {
            configs,
            fallback: WindowConfig::default(),
            windows: Mutex::new(HashMap::new()),
        }
    }

    fn config_for(&self, provider: ProviderId) -> WindowConfig {
        self.configs.get(&provider).copied().unwrap_or(self.fallback)
    }

    /// True if a call to `provider` may proceed right now. Does not consume
    /// capacity; pair with [`RateLimiter::record`] when the call is made.
    pub fn admit(&self, provider: ProviderId) -> bool {
        let cfg = self.config_for(provider);
        let now = Instant::now();
        let mut windows = self.windows.lock().unwrap_or_else(|e| e.into_inner());
        let window = windows.entry(provider).or_default();
        Self::prune(window, now, cfg.window);
        window.len() < cfg.capacity
    }

    /// Registers that a call to `provider` was made.
    pub fn record(&self, provider: ProviderId) {
        let mut windows = self.windows.lock().unwrap_or_else(|e| e.into_inner());
        windows.entry(provider).or_default().push_back(Instant::now());
    }

    /// Time until the oldest in-window timestamp ages out. Zero when the
    /// provider is under capacity.
    pub fn retry_after(&self, provider: ProviderId) -> Duration {
        let cfg = self.config_for(provider);
        let now = Instant::now();
        let mut windows = self.windows.lock().unwrap_or_else(|e| e.into_inner());
        let window = windows.entry(provider).or_default();
        Self::prune(window, now, cfg.window);
        if window.len() < cfg.capacity {
            return Duration::ZERO;
        }
        window
            .front()
            .map_or(Duration::ZERO, |oldest| cfg.window.saturating_sub(now - *oldest))
    }

    /// Calls still available in the current window.
    pub fn remaining(&self, provider: ProviderId) -> usize {
        let cfg = self.config_for(provider);
        let now = Instant::now();
        let mut windows = self.windows.lock().unwrap_or_else(|e| e.into_inner());
        let window = windows.entry(provider).or_default();
        Self::prune(window, now, cfg.window);
        cfg.capacity.saturating_sub(window.len())
    }

    fn prune(window: &mut VecDeque<Instant>, now: Instant, length: Duration) {
        while let Some(oldest) = window.front() {
            if now.duration_since(*oldest) >= length {
                window.pop_front();
            } else {
                break;
            }
        }
    }
}
