//! Concurrency primitives used by the pipeline stages
//!
//! - **fanout**: concurrent calls with per-call timeouts, one envelope per call
//! - **rate_limiter**: pacing for the quota-limited social API
//! - **prefetch**: detached background task with a memoized join

pub mod fanout;
pub mod prefetch;
pub mod rate_limiter;

pub use fanout::{
    dedup_by_key, failure_count, flatten_successes, gather_all, gather_all_paced, gather_one,
    gather_one_paced, successes, Envelope, FanoutError, FanoutTask,
};
pub use prefetch::{PrefetchError, PrefetchHandle};
pub use rate_limiter::RateLimiter;
