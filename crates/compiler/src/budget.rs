//! Duration budget planning.
//!
//! Spreads the target runtime evenly over the clips, then inflates each share
//! by the inverse speed-up factor. The result is the amount of *source*
//! footage a clip may contribute, which keeps the final concatenation close
//! to the target regardless of how many clips there are.

use kids_timelapse_config::Config;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum BudgetError {
    #[error("Invalid duration format: '{0}'")]
    InvalidDurationFormat(String),

    #[error("Target length must be positive, got {0}s")]
    InvalidTargetLength(f64),

    #[error("Cannot budget an empty collection")]
    EmptyCollection,

    #[error("Invalid speed-up factor: {0} (must be > 0)")]
    InvalidSpeedUpFactor(f64),

    #[error("Invalid head:tail ratio {0}:{1} (parts must sum to > 0)")]
    InvalidRatio(u32, u32),
}

/// Per-clip length thresholds derived once per run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DurationBudget {
    /// Longest source clip that is sped up whole instead of split
    pub max_per_clip_length: f64,
    /// Seconds kept from the start of a split clip
    pub head_length: f64,
    /// Seconds kept from the end of a split clip
    pub tail_length: f64,
    /// Presentation-timestamp multiplier (`< 1` plays faster)
    pub speed_up_factor: f64,
}

impl DurationBudget {
    pub fn compute(
        total_length_secs: f64,
        clip_count: usize,
        speed_up_factor: f64,
        head_tail_ratio: (u32, u32),
    ) -> Result<Self, BudgetError> {
        if !(total_length_secs.is_finite() && total_length_secs > 0.0) {
            return Err(BudgetError::InvalidTargetLength(total_length_secs));
        }
        if clip_count == 0 {
            return Err(BudgetError::EmptyCollection);
        }
        if !(speed_up_factor.is_finite() && speed_up_factor > 0.0) {
            return Err(BudgetError::InvalidSpeedUpFactor(speed_up_factor));
        }
        let (head_ratio, tail_ratio) = head_tail_ratio;
        let parts = head_ratio as u64 + tail_ratio as u64;
        if parts == 0 {
            return Err(BudgetError::InvalidRatio(head_ratio, tail_ratio));
        }

        let max_per_clip_length = (total_length_secs / clip_count as f64) / speed_up_factor;
        let part_length = max_per_clip_length / parts as f64;

        Ok(Self {
            max_per_clip_length,
            head_length: part_length * head_ratio as f64,
            tail_length: part_length * tail_ratio as f64,
            speed_up_factor,
        })
    }

    /// Budget for `clip_count` clips under the configured length, speed-up and ratio
    pub fn from_config(config: &Config, clip_count: usize) -> Result<Self, BudgetError> {
        let length = &config.timelapse_video.length;
        let total_length_secs = length
            .as_secs()
            .map_err(|_| BudgetError::InvalidDurationFormat(length.to_string()))?;

        Self::compute(
            total_length_secs,
            clip_count,
            config.timelapse_options.speed_up_factor(),
            config.timelapse_options.head_tail_ratio,
        )
    }
}
