pub mod backoff;
pub mod client;
pub mod errors;
pub mod pipeline;
pub mod types;

pub use backoff::calculate_backoff_delay;
pub use client::{fetch, fetch_with_retry};
pub use errors::FetchError;
pub use types::{PageResponse, RetryPolicy};
