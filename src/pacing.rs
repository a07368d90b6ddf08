// Copyright (c) 2026 Pegasus Heavy Industries LLC
// Licensed under the MIT License

//! Blocking waits between control-loop ticks and animation frames.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

/// Upper bound on how long a stop request can go unnoticed.
const SLICE: Duration = Duration::from_millis(100);

pub trait Pacer {
    /// Block for `duration`. Returns `false` if a stop was requested, in
    /// which case the wait may have ended early.
    fn pause(&mut self, duration: Duration) -> bool;

    fn stop_requested(&self) -> bool;
}

/// Sleeps on the calling thread, watching a flag set from a signal handler.
///
/// The flag holds the number of the signal that asked us to stop, 0 while
/// running.
#[derive(Debug, Clone)]
pub struct SleepPacer {
    stop: Arc<AtomicUsize>,
}

impl SleepPacer {
    pub fn new(stop: Arc<AtomicUsize>) -> Self {
        Self { stop }
    }

    /// Signal number that requested the stop, if any.
    pub fn stop_signal(&self) -> Option<i32> {
        match self.stop.load(Ordering::Relaxed) {
            0 => None,
            signal => i32::try_from(signal).ok(),
        }
    }
}

impl Pacer for SleepPacer {
    fn pause(&mut self, duration: Duration) -> bool {
        let mut remaining = duration;
        while !remaining.is_zero() {
            if self.stop_requested() {
                return false;
            }
            let step = remaining.min(SLICE);
            thread::sleep(step);
            remaining -= step;
        }
        !self.stop_requested()
    }

    fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::Relaxed) != 0
    }
}
