use crate::core::error::{CoreError, CoreResult};

/// Shared simulation clock
///
/// Holds the current simulation time and a time-scale factor mapping
/// simulation ticks to seconds. Pure state holder; all arithmetic on
/// durations happens in the model loop.
#[derive(Debug, Clone)]
pub struct Clock {
    time: f64,
    time_scale: f64,
}

impl Clock {
    /// Create a clock at time zero with a 1:1 time scale
    pub fn new() -> Self {
        Self {
            time: 0.0,
            time_scale: 1.0,
        }
    }

    /// Get the current simulation time
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Get the tick-to-seconds multiplier
    pub fn time_scale(&self) -> f64 {
        self.time_scale
    }

    /// Set the current time; must be a finite, non-negative number
    pub fn set_time(&mut self, time: f64) -> CoreResult<()> {
        if !time.is_finite() || time < 0.0 {
            return Err(CoreError::InvalidArgument(format!(
                "Clock time must be a finite non-negative number, got {}",
                time
            )));
        }
        self.time = time;
        Ok(())
    }

    /// Set the tick-to-seconds multiplier; must be finite and positive
    pub fn set_time_scale(&mut self, time_scale: f64) -> CoreResult<()> {
        if !time_scale.is_finite() || time_scale <= 0.0 {
            return Err(CoreError::InvalidArgument(format!(
                "Clock time scale must be a finite positive number, got {}",
                time_scale
            )));
        }
        self.time_scale = time_scale;
        Ok(())
    }

    /// Advance the clock by a non-negative duration
    pub fn advance(&mut self, duration: f64) -> CoreResult<()> {
        if !duration.is_finite() || duration < 0.0 {
            return Err(CoreError::InvalidArgument(format!(
                "Clock can only advance by a finite non-negative duration, got {}",
                duration
            )));
        }
        self.time += duration;
        Ok(())
    }

    /// Reset the clock to time zero (time scale is preserved)
    pub fn reset(&mut self) {
        self.time = 0.0;
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}
