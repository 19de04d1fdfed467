//! Session countdown timer
//!
//! Pure countdown state. The controller owns the one-second cadence (a
//! periodic scheduler task) and feeds each wakeup into `tick()`.

/// Result of one countdown step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// Seconds left after this step
    Tick(u64),
    /// The countdown reached zero
    Expired,
}

#[derive(Debug, Clone, Default)]
pub struct SessionTimer {
    remaining: u64,
    running: bool,
}

impl SessionTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start counting down from `seconds`, replacing any running countdown.
    ///
    /// A zero duration starts nothing and returns false.
    pub fn start(&mut self, seconds: u64) -> bool {
        self.remaining = seconds;
        self.running = seconds > 0;
        self.running
    }

    /// Advance by one second
    pub fn tick(&mut self) -> Option<TimerEvent> {
        if !self.running {
            return None;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.running = false;
            Some(TimerEvent::Expired)
        } else {
            Some(TimerEvent::Tick(self.remaining))
        }
    }

    /// Halt without expiring; the remaining time is kept
    pub fn cancel(&mut self) -> bool {
        std::mem::replace(&mut self.running, false)
    }

    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    pub fn is_running(&self) -> bool {
        self.running
    }
}

/// `MM:SS`, zero-padded; minutes are not wrapped into hours
pub fn format_mmss(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
