/// Running sum/count over one raw ADC channel, drained once per window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RollingAverage {
    sum: u64,
    count: u32,
}

impl RollingAverage {
    pub const fn new() -> Self {
        Self { sum: 0, count: 0 }
    }

    #[inline]
    pub fn observe(&mut self, raw: u32) {
        self.sum = self.sum.saturating_add(u64::from(raw));
        self.count = self.count.saturating_add(1);
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// Truncated mean of everything observed since the last drain, or 0 when
    /// nothing was observed. Always leaves the channel empty.
    pub fn extract_and_reset(&mut self) -> u32 {
        let result = if self.count == 0 {
            0
        } else {
            // mean of u32 samples always fits in u32
            u32::try_from(self.sum / u64::from(self.count)).unwrap_or(u32::MAX)
        };
        self.reset();
        result
    }

    pub fn reset(&mut self) {
        self.sum = 0;
        self.count = 0;
    }
}
