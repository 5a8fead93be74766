//! Pacing between two task executions of a simulated user.

use std::time::Duration;

use rand::Rng;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum WaitTimeError {
    #[error("wait time bound must be a finite, non-negative number of seconds, got {0}")]
    InvalidBound(f64),
    #[error("minimum wait time {min}s exceeds maximum wait time {max}s")]
    Inverted { min: f64, max: f64 },
}

/// Uniformly distributed pause, in seconds, between `min` and `max` inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitTime {
    min: Duration,
    max: Duration,
}

impl WaitTime {
    pub const DEFAULT_MIN_SECS: f64 = 1.0;
    pub const DEFAULT_MAX_SECS: f64 = 3.0;

    pub fn between(min_secs: f64, max_secs: f64) -> Result<Self, WaitTimeError> {
        for bound in [min_secs, max_secs] {
            if !bound.is_finite() || bound < 0.0 {
                return Err(WaitTimeError::InvalidBound(bound));
            }
        }
        if min_secs > max_secs {
            return Err(WaitTimeError::Inverted {
                min: min_secs,
                max: max_secs,
            });
        }
        let to_duration = |secs: f64| {
            Duration::try_from_secs_f64(secs).map_err(|_| WaitTimeError::InvalidBound(secs))
        };
        Ok(Self {
            min: to_duration(min_secs)?,
            max: to_duration(max_secs)?,
        })
    }

    #[must_use]
    pub fn constant(wait: Duration) -> Self {
        Self {
            min: wait,
            max: wait,
        }
    }

    #[inline]
    #[must_use]
    pub fn min(&self) -> Duration {
        self.min
    }

    #[inline]
    #[must_use]
    pub fn max(&self) -> Duration {
        self.max
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        if self.min == self.max {
            return self.min;
        }
        let secs = rng.random_range(self.min.as_secs_f64()..=self.max.as_secs_f64());
        Duration::from_secs_f64(secs).clamp(self.min, self.max)
    }
}

impl Default for WaitTime {
    fn default() -> Self {
        Self {
            min: Duration::from_secs(1),
            max: Duration::from_secs(3),
        }
    }
}
