//! Maps `Box<dyn Error>` from the seam traits to typed `BenchError`.
//!
//! The traits in `bench_traits` use `Box<dyn Error + Send + Sync>`; this
//! module converts those to our typed error enum, with an optional
//! feature-gated path for `bench_hardware::HwError` downcasting.

use crate::error::BenchError;

/// Map a seam error to a typed `BenchError`.
///
/// Attempts to downcast known hardware error types first, then falls back
/// to string-based heuristics.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> BenchError {
    #[cfg(feature = "hardware-errors")]
    {
        if let Some(hw) = e.downcast_ref::<bench_hardware::error::HwError>() {
            return match hw {
                bench_hardware::error::HwError::Timeout => BenchError::Timeout,
                other => BenchError::HardwareFault(other.to_string()),
            };
        }
    }

    let s = e.to_string();
    if s.to_lowercase().contains("timeout") {
        BenchError::Timeout
    } else {
        BenchError::Hardware(s)
    }
}
