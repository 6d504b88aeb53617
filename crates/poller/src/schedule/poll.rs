//! Recurring poll timer

use log::debug;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Owns at most one recurring timer task
///
/// Each `start` aborts the previous task and bumps the generation. Ticks are
/// delivered with the generation that produced them so a receiver can drop
/// ticks that were already queued by a superseded timer.
pub struct PollScheduler {
    interval: Duration,
    generation: u64,
    timer: Option<JoinHandle<()>>,
}

impl PollScheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            generation: 0,
            timer: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// True if `generation` belongs to the live timer
    pub fn is_current(&self, generation: u64) -> bool {
        self.timer.is_some() && generation == self.generation
    }

    pub fn is_active(&self) -> bool {
        self.timer.as_ref().is_some_and(|timer| !timer.is_finished())
    }

    /// Cancel any running timer and arm a new one
    ///
    /// The first tick fires one interval from now. `on_tick` receives the
    /// timer generation and returns false to stop the timer. Ticks never wait
    /// for work triggered by earlier ticks. Must be called inside a Tokio
    /// runtime.
    pub fn start<F>(&mut self, on_tick: F)
    where
        F: Fn(u64) -> bool + Send + 'static,
    {
        self.stop();
        self.generation += 1;

        let generation = self.generation;
        let interval = self.interval;
        debug!("Arming poll timer #{} every {:?}", generation, interval);

        self.timer = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if !on_tick(generation) {
                    break;
                }
            }
        }));
    }

    /// Cancel the running timer, if any
    pub fn stop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

impl Drop for PollScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}
