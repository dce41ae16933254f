/// Elapsed-time trigger pacing the fast and slow evaluation loops.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeriodicGate {
    interval_ms: f64,
    last_fire_ms: f64,
}

impl PeriodicGate {
    pub fn new(interval_ms: f64) -> Self {
        Self {
            interval_ms,
            last_fire_ms: 0.0,
        }
    }

    /// Fires when strictly more than one interval has passed since the last
    /// fire. The next window starts at `now_ms`, not at the ideal boundary.
    pub fn try_fire(&mut self, now_ms: f64) -> bool {
        if now_ms - self.last_fire_ms > self.interval_ms {
            self.last_fire_ms = now_ms;
            true
        } else {
            false
        }
    }

    /// Start a fresh window at `now_ms` without firing.
    pub fn restart(&mut self, now_ms: f64) {
        self.last_fire_ms = now_ms;
    }

    pub fn set_interval(&mut self, interval_ms: f64) {
        self.interval_ms = interval_ms;
    }

    pub fn interval_ms(&self) -> f64 {
        self.interval_ms
    }

    pub fn last_fire_ms(&self) -> f64 {
        self.last_fire_ms
    }
}

#[cfg(test)]
mod tests {
    use super::PeriodicGate;

    #[test]
    fn fires_only_after_interval_strictly_passes() {
        let mut g = PeriodicGate::new(100.0);
        assert!(!g.try_fire(50.0));
        assert!(!g.try_fire(100.0));
        assert!(g.try_fire(100.5));
        assert_eq!(g.last_fire_ms(), 100.5);
        assert!(!g.try_fire(200.0));
        assert!(g.try_fire(201.0));
    }

    #[test]
    fn restart_opens_a_fresh_window() {
        let mut g = PeriodicGate::new(1000.0);
        g.restart(5000.0);
        assert!(!g.try_fire(5999.0));
        assert!(g.try_fire(6001.0));
    }
}
