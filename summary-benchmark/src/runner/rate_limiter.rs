//! Sliding-window rate limiter for requests and tokens per minute

use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

const DEFAULT_WINDOW: Duration = Duration::from_secs(60);
const WAIT_SLACK: Duration = Duration::from_millis(10);

/// Rate limiter over a sliding window. A limit of 0 disables that dimension.
pub struct RateLimiter {
    requests_per_window: u32,
    tokens_per_window: u64,
    window: Duration,
    requests: Mutex<VecDeque<Instant>>,
    token_usage: Mutex<VecDeque<(Instant, u64)>>,
}

impl RateLimiter {
    /// Create a limiter with per-minute limits
    pub fn new(requests_per_minute: u32, tokens_per_minute: u64) -> Self {
        Self {
            requests_per_window: requests_per_minute,
            tokens_per_window: tokens_per_minute,
            window: DEFAULT_WINDOW,
            requests: Mutex::new(VecDeque::new()),
            token_usage: Mutex::new(VecDeque::new()),
        }
    }

    /// No limits at all
    pub fn unlimited() -> Self {
        Self::new(0, 0)
    }

    /// Override the window length
    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    /// Wait until both a request slot and token capacity are available,
    /// then record the request.
    pub async fn acquire(&self) {
        loop {
            let wait = match self.check_token_limit().await {
                Some(wait) => Some(wait),
                None => self.try_reserve_request().await,
            };

            match wait {
                Some(wait) => {
                    tracing::debug!("Rate limit reached, waiting {:?}", wait);
                    tokio::time::sleep(wait).await;
                }
                None => return,
            }
        }
    }

    /// Reserve a request slot, or return how long to wait for one
    async fn try_reserve_request(&self) -> Option<Duration> {
        let mut requests = self.requests.lock().await;
        let now = Instant::now();

        if self.requests_per_window > 0 {
            prune(&mut requests, now, self.window, |t| *t);

            if requests.len() >= self.requests_per_window as usize {
                let oldest = requests.front().copied().unwrap_or(now);
                return Some(self.window.saturating_sub(now.duration_since(oldest)) + WAIT_SLACK);
            }
        }

        requests.push_back(now);
        None
    }

    /// How long until token usage drops below the limit, if it is reached
    async fn check_token_limit(&self) -> Option<Duration> {
        if self.tokens_per_window == 0 {
            return None;
        }

        let mut usage = self.token_usage.lock().await;
        let now = Instant::now();
        prune(&mut usage, now, self.window, |(t, _)| *t);

        let used: u64 = usage.iter().map(|(_, tokens)| tokens).sum();
        if used < self.tokens_per_window {
            return None;
        }

        let oldest = usage.front().map(|(t, _)| *t).unwrap_or(now);
        Some(self.window.saturating_sub(now.duration_since(oldest)) + WAIT_SLACK)
    }

    /// Record token usage for rate limiting
    pub async fn record_tokens(&self, tokens: u64) {
        if tokens == 0 {
            return;
        }
        let mut usage = self.token_usage.lock().await;
        let now = Instant::now();
        prune(&mut usage, now, self.window, |(t, _)| *t);
        usage.push_back((now, tokens));
    }

    /// Token usage within the current window
    pub async fn current_token_usage(&self) -> u64 {
        let mut usage = self.token_usage.lock().await;
        prune(&mut usage, Instant::now(), self.window, |(t, _)| *t);
        usage.iter().map(|(_, tokens)| tokens).sum()
    }
}

/// Drop entries older than the window
fn prune<T>(entries: &mut VecDeque<T>, now: Instant, window: Duration, at: impl Fn(&T) -> Instant) {
    while let Some(front) = entries.front() {
        if now.duration_since(at(front)) > window {
            entries.pop_front();
        } else {
            break;
        }
    }
}
