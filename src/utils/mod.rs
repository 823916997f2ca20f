//! Utility modules.

pub mod retry;

pub use retry::{RetryConfig, RetryResult, Retryable, retry, with_retry};
