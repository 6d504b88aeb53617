//! Timers driving the poller
//!
//! Both timers keep a single live task and supersede it on restart.

mod poll;
mod retry;

pub use poll::PollScheduler;
pub use retry::{Backoff, RetryTimer};
