//! Per-clip transform planning.
//!
//! Clips longer than the budget keep only their head and tail; shorter clips
//! are sped up whole, but never slowed below real time.

use crate::budget::DurationBudget;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum PlanError {
    #[error("Invalid asset duration: {0}s")]
    InvalidAssetDuration(f64),

    #[error("Head ({head}s) and tail ({tail}s) overlap in a {duration}s clip")]
    OverlappingSegments { head: f64, tail: f64, duration: f64 },
}

/// Relative slack allowed when head and tail together fill the whole clip
const SEGMENT_TOLERANCE: f64 = 1e-9;

/// What to do with one clip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransformPlan {
    /// Play the entire clip with presentation timestamps scaled by `factor`.
    SpeedUpWhole { factor: f64 },
    /// Keep `[0, head_length)` and `[tail_start, tail_start + tail_length)`,
    /// both scaled by the nominal `speed_up_factor`.
    SplitHeadTail {
        head_length: f64,
        tail_start: f64,
        tail_length: f64,
        speed_up_factor: f64,
    },
}

/// Choose the transform for a clip of `duration` seconds.
pub fn plan_clip(duration: f64, budget: &DurationBudget) -> Result<TransformPlan, PlanError> {
    if !(duration.is_finite() && duration > 0.0) {
        return Err(PlanError::InvalidAssetDuration(duration));
    }

    if duration > budget.max_per_clip_length {
        // head and tail are split from the same budget and may overshoot it by rounding
        let overlap = budget.head_length + budget.tail_length - duration;
        if overlap > SEGMENT_TOLERANCE * duration {
            return Err(PlanError::OverlappingSegments {
                head: budget.head_length,
                tail: budget.tail_length,
                duration,
            });
        }

        return Ok(TransformPlan::SplitHeadTail {
            head_length: budget.head_length,
            tail_start: duration - budget.tail_length,
            tail_length: budget.tail_length,
            speed_up_factor: budget.speed_up_factor,
        });
    }

    let factor = (budget.speed_up_factor * budget.max_per_clip_length) / duration;
    Ok(TransformPlan::SpeedUpWhole {
        factor: factor.min(1.0),
    })
}
