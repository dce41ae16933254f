//! Loop and gate period helpers.

/// Number of microseconds in one second.
pub const MICROS_PER_SEC: u64 = 1_000_000;
/// Number of milliseconds in one second.
pub const MILLIS_PER_SEC: u64 = 1_000;

/// Compute the period in microseconds for a given sampling rate in Hz.
/// - Clamps `hz` to at least 1 to avoid division by zero.
/// - Ensures result is at least 1 microsecond.
#[inline]
pub fn period_us(hz: u32) -> u64 {
    (MICROS_PER_SEC / u64::from(hz.max(1))).max(1)
}

/// Fractional gate interval for a refresh rate, e.g. 15 Hz -> 66.67 ms.
/// Non-positive or non-finite rates yield one second.
#[inline]
pub fn interval_ms_for_hz(hz: f32) -> f64 {
    if hz.is_finite() && hz > 0.0 {
        MILLIS_PER_SEC as f64 / f64::from(hz)
    } else {
        MILLIS_PER_SEC as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loop_period_clamps_degenerate_rates() {
        assert_eq!(period_us(1000), 1000);
        assert_eq!(period_us(0), MICROS_PER_SEC);
        assert_eq!(period_us(u32::MAX), 1);
    }

    #[test]
    fn fifteen_hz_is_one_frame() {
        let ms = interval_ms_for_hz(15.0);
        assert!((ms - 66.666_666).abs() < 1e-3);
    }

    #[test]
    fn degenerate_rates_fall_back_to_one_second() {
        assert_eq!(interval_ms_for_hz(0.0), 1000.0);
        assert_eq!(interval_ms_for_hz(f32::NAN), 1000.0);
        assert_eq!(interval_ms_for_hz(-3.0), 1000.0);
    }
}
