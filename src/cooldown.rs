/// Countdown started when the player API answers 429.
///
/// It has no clock of its own: the owner feeds it one `tick` per elapsed second.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CooldownTimer {
    remaining: u32,
}

impl CooldownTimer {
    pub fn new() -> Self {
        Self { remaining: 0 }
    }

    pub fn start(&mut self, seconds: u32) {
        self.remaining = seconds;
    }

    /// Advances one second. Returns true on the tick that brings the timer to zero.
    pub fn tick(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        self.remaining == 0
    }

    pub fn cancel(&mut self) {
        self.remaining = 0;
    }

    pub fn is_active(&self) -> bool {
        self.remaining > 0
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.remaining
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_down_to_inactive() {
        let mut timer = CooldownTimer::new();
        assert!(!timer.is_active());
        timer.start(3);
        assert!(timer.is_active());
        assert!(!timer.tick());
        assert!(!timer.tick());
        assert_eq!(timer.remaining_seconds(), 1);
        assert!(timer.tick());
        assert!(!timer.is_active());
        assert!(!timer.tick());
        assert_eq!(timer.remaining_seconds(), 0);
    }

    #[test]
    fn cancel_clears_remaining() {
        let mut timer = CooldownTimer::new();
        timer.start(60);
        timer.cancel();
        assert!(!timer.is_active());
    }
}
