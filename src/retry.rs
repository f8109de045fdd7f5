use std::time::Duration;

use reqwest::StatusCode;

/// Политика повторных запросов. По умолчанию повторов нет.
///
/// Повторяются только сетевые сбои (соединение, таймаут) и ответы 429/5xx.
/// Ключ идемпотентности для всех попыток одного вызова общий, поэтому
/// повтор создания платежа не приводит к двойному списанию.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RetryPolicy {
    pub max_retries: u32,
    /// Пауза перед попыткой `n` равна `backoff * n`.
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn none() -> Self {
        RetryPolicy::default()
    }

    pub fn new(max_retries: u32, backoff: Duration) -> Self {
        RetryPolicy {
            max_retries,
            backoff,
        }
    }

    pub(crate) fn delay(&self, attempt: u32) -> Duration {
        self.backoff.saturating_mul(attempt)
    }

    pub(crate) fn should_retry_status(&self, attempt: u32, status: StatusCode) -> bool {
        attempt < self.max_retries && is_retryable_status(status)
    }

    pub(crate) fn should_retry_error(&self, attempt: u32, err: &reqwest::Error) -> bool {
        attempt < self.max_retries && (err.is_connect() || err.is_timeout())
    }
}

fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}
