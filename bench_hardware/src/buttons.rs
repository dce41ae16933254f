//! Press classification shared by every physical button backend.

/// Outcome of one button poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressEvent {
    None,
    /// Released before the long-press threshold.
    Short,
    /// Held past the threshold; reported once per hold.
    Long,
}

/// Turns a sampled pressed/released level into short and long presses.
#[derive(Debug, Clone, Copy)]
pub struct PressTracker {
    long_ms: u64,
    down_since: Option<u64>,
    long_sent: bool,
}

impl PressTracker {
    pub fn new(long_ms: u64) -> Self {
        Self {
            long_ms,
            down_since: None,
            long_sent: false,
        }
    }

    pub fn update(&mut self, pressed: bool, now_ms: u64) -> PressEvent {
        match (pressed, self.down_since) {
            (true, None) => {
                self.down_since = Some(now_ms);
                self.long_sent = false;
                PressEvent::None
            }
            (true, Some(since)) => {
                if !self.long_sent && now_ms.saturating_sub(since) >= self.long_ms {
                    self.long_sent = true;
                    PressEvent::Long
                } else {
                    PressEvent::None
                }
            }
            (false, Some(_)) => {
                self.down_since = None;
                if std::mem::take(&mut self.long_sent) {
                    PressEvent::None
                } else {
                    PressEvent::Short
                }
            }
            (false, None) => PressEvent::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_press_reports_on_release() {
        let mut t = PressTracker::new(800);
        assert_eq!(t.update(true, 0), PressEvent::None);
        assert_eq!(t.update(true, 100), PressEvent::None);
        assert_eq!(t.update(false, 200), PressEvent::Short);
        assert_eq!(t.update(false, 300), PressEvent::None);
    }

    #[test]
    fn long_press_reports_once_while_held() {
        let mut t = PressTracker::new(800);
        t.update(true, 0);
        assert_eq!(t.update(true, 800), PressEvent::Long);
        assert_eq!(t.update(true, 1600), PressEvent::None);
        assert_eq!(t.update(false, 1700), PressEvent::None);
    }
}
