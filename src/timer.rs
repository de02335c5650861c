use std::time::{Duration, Instant};

/// How long the mismatch flash stays up after the latest rejected keystroke.
pub const ERROR_FLASH: Duration = Duration::from_millis(500);

const ONE_SECOND: Duration = Duration::from_secs(1);

/// Turns irregular runner steps into whole elapsed seconds.
///
/// The runner yields a tick every 100ms at best and keystrokes can delay
/// it, so the countdown is derived from wall time rather than from
/// counting ticks.
#[derive(Debug, Clone, Copy)]
pub struct SecondClock {
    last: Option<Instant>,
    carry: Duration,
}

impl SecondClock {
    pub fn new() -> Self {
        Self {
            last: None,
            carry: Duration::ZERO,
        }
    }

    pub fn start(&mut self, now: Instant) {
        self.last = Some(now);
        self.carry = Duration::ZERO;
    }

    pub fn stop(&mut self) {
        self.last = None;
        self.carry = Duration::ZERO;
    }

    pub fn is_running(&self) -> bool {
        self.last.is_some()
    }

    /// Number of whole seconds elapsed since the previous call.
    pub fn due(&mut self, now: Instant) -> u32 {
        let Some(last) = self.last else {
            return 0;
        };

        let mut elapsed = self.carry + now.saturating_duration_since(last);
        self.last = Some(now);

        let mut seconds = 0;
        while elapsed >= ONE_SECOND {
            elapsed -= ONE_SECOND;
            seconds += 1;
        }
        self.carry = elapsed;
        seconds
    }
}

impl Default for SecondClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Transient error indicator. Raising it again re-arms the deadline.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorFlash {
    deadline: Option<Instant>,
}

impl ErrorFlash {
    pub fn raise(&mut self, now: Instant) {
        self.deadline = Some(now + ERROR_FLASH);
    }

    pub fn is_raised(&self) -> bool {
        self.deadline.is_some()
    }

    /// Clears the flag once its deadline has passed. Returns true if it changed.
    pub fn expire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    pub fn clear(&mut self) {
        self.deadline = None;
    }
}
