use std::time::Duration;

/// Ease-out quadratic curve on `[0, 1]`.
pub fn ease_out_quad(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t) * (1.0 - t)
}

/// What a presence check did to the animator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Data was absent and still is.
    Idle,
    /// Data just appeared; the reveal restarted from zero.
    Started,
    /// Data was already there on the previous update.
    Settled,
    /// Data went away; nothing left to reveal.
    Cleared,
}

/// Vertical reveal driven only by whether preview data is present.
///
/// The animator always runs its clock; whether the host actually animates
/// the card is decided when the frame is built.
#[derive(Debug, Clone)]
pub struct RevealAnimator {
    duration: Duration,
    had_data: bool,
    should_animate: bool,
    elapsed: Duration,
}

impl RevealAnimator {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            had_data: false,
            should_animate: false,
            elapsed: Duration::ZERO,
        }
    }

    /// Compares the presence of data on this update with the previous one.
    pub fn observe(&mut self, has_data: bool) -> Transition {
        let transition = match (self.had_data, has_data) {
            (false, true) => {
                self.should_animate = true;
                self.elapsed = Duration::ZERO;
                Transition::Started
            }
            (true, true) => {
                self.should_animate = false;
                Transition::Settled
            }
            (true, false) => {
                self.should_animate = false;
                self.elapsed = Duration::ZERO;
                Transition::Cleared
            }
            (false, false) => Transition::Idle,
        };
        self.had_data = has_data;
        transition
    }

    pub fn should_animate(&self) -> bool {
        self.should_animate
    }

    /// True while a ticker has frames left to deliver.
    pub fn is_running(&self) -> bool {
        self.should_animate && self.elapsed < self.duration
    }

    /// Moves the clock forward; returns the new eased progress.
    pub fn advance(&mut self, by: Duration) -> f32 {
        if self.should_animate {
            self.elapsed = (self.elapsed + by).min(self.duration);
        }
        self.progress()
    }

    pub fn progress(&self) -> f32 {
        if !self.had_data {
            return 0.0;
        }
        if !self.should_animate || self.duration.is_zero() {
            return 1.0;
        }
        ease_out_quad(self.elapsed.as_secs_f32() / self.duration.as_secs_f32())
    }
}
