use std::sync::atomic::{AtomicU64, Ordering};

use zuvia_core::current_unix_timestamp_ms;

pub const BASE_BACKOFF_MS: u64 = 200;

static REQUEST_COUNTER: AtomicU64 = AtomicU64::new(1);

pub fn should_retry_status(status: u16) -> bool {
    status == 408 || status == 425 || status == 429 || status >= 500
}

pub fn next_backoff_ms(attempt: usize) -> u64 {
    let shift = attempt.min(6);
    BASE_BACKOFF_MS.saturating_mul(1_u64 << shift)
}

pub fn is_retryable_http_error(error: &reqwest::Error) -> bool {
    error.is_timeout() || error.is_connect() || error.is_request()
}

pub fn new_request_id() -> String {
    let millis = current_unix_timestamp_ms();
    let count = REQUEST_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("zuvia-{millis}-{count}")
}
