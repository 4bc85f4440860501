//! Inbound flood control for a single connection

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::config::{MAX_RATE_VIOLATIONS, RATE_LIMIT_WINDOW_MS};

/// Verdict for one inbound message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateVerdict {
    Allowed,
    /// Over the limit; drop the message
    Limited { violations: u32 },
    /// Too many violations; close the connection
    Kick,
}

/// Sliding-window message counter owned by one connection task
#[derive(Debug)]
pub struct MessageRateState {
    max_per_window: usize,
    window: Duration,
    /// Timestamps of recent messages
    message_times: VecDeque<Instant>,
    violations: u32,
}

impl MessageRateState {
    pub fn new(max_per_second: u32) -> Self {
        let max_per_window = max_per_second as usize;
        Self {
            max_per_window,
            window: Duration::from_millis(RATE_LIMIT_WINDOW_MS),
            message_times: VecDeque::with_capacity(max_per_window + 1),
            violations: 0,
        }
    }

    /// Check a message arriving now
    pub fn check(&mut self) -> RateVerdict {
        self.check_at(Instant::now())
    }

    pub fn check_at(&mut self, now: Instant) -> RateVerdict {
        // Remove old timestamps outside the window
        while let Some(front) = self.message_times.front() {
            if now.duration_since(*front) >= self.window {
                self.message_times.pop_front();
            } else {
                break;
            }
        }

        if self.message_times.len() < self.max_per_window {
            self.message_times.push_back(now);
            return RateVerdict::Allowed;
        }

        self.violations += 1;
        if self.violations >= MAX_RATE_VIOLATIONS {
            RateVerdict::Kick
        } else {
            RateVerdict::Limited {
                violations: self.violations,
            }
        }
    }

    /// Get current violation count
    pub fn violation_count(&self) -> u32 {
        self.violations
    }
}
