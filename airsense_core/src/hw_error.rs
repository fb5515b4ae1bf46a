//! Maps `Box<dyn Error>` from the driver trait boundary to typed `EngineError`.
//!
//! `GasSensor::poll` returns `Box<dyn Error + Send + Sync>` so any driver can
//! plug in; this module converts those to our typed error enum, with an
//! optional feature-gated path for `airsense_hardware::HwError` downcasting.

use crate::error::EngineError;

/// Map a trait-boundary error to a typed `EngineError`.
///
/// Attempts to downcast known hardware error types first, then falls back
/// to string-based heuristics.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> EngineError {
    #[cfg(feature = "hardware-errors")]
    {
        if let Some(hw) = e.downcast_ref::<airsense_hardware::HwError>() {
            return match hw {
                airsense_hardware::HwError::Timeout => EngineError::Timeout,
                other => EngineError::Driver(other.to_string()),
            };
        }
    }

    let s = e.to_string();
    if s.to_lowercase().contains("timeout") {
        EngineError::Timeout
    } else {
        EngineError::Driver(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_text_maps_to_timeout() {
        let e: Box<dyn std::error::Error + Send + Sync> = "i2c Timeout after 500ms".into();
        assert_eq!(map_hw_error(e.as_ref()), EngineError::Timeout);
    }

    #[test]
    fn other_text_maps_to_driver() {
        let e: Box<dyn std::error::Error + Send + Sync> = "nack on 0x76".into();
        assert_eq!(
            map_hw_error(e.as_ref()),
            EngineError::Driver("nack on 0x76".into())
        );
    }

    #[cfg(feature = "hardware-errors")]
    #[test]
    fn hw_error_downcasts_precisely() {
        let e: Box<dyn std::error::Error + Send + Sync> =
            Box::new(airsense_hardware::HwError::Timeout);
        assert_eq!(map_hw_error(e.as_ref()), EngineError::Timeout);

        let e: Box<dyn std::error::Error + Send + Sync> =
            Box::new(airsense_hardware::HwError::I2c("bus busy".into()));
        assert!(matches!(map_hw_error(e.as_ref()), EngineError::Driver(m) if m.contains("bus busy")));
    }
}
