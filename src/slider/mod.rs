//! Slide-CAPTCHA solving.
//!
//! This module provides:
//! - Gap location by differencing the intact and the gapped background
//! - Drag trajectory synthesis with acceleration, braking, and a corrective tail
//! - Image sources supplying the two backgrounds

pub mod error;
pub mod gap;
pub mod source;
pub mod tracks;

pub use error::SliderError;
pub use gap::{
    difference_mask, find_reference_point, locate_gap, locate_gap_in, DifferenceMask, GapOutcome,
    ReferencePoint,
};
pub use source::{FilePairSource, ImagePair, ImageSource};
pub use tracks::{generate_tracks, TrajectoryPlan};

use serde::Serialize;

use crate::config::{Config, TrajectoryConfig};

/// A located gap together with the drag that closes it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DragPlan {
    pub gap: GapOutcome,
    pub distance: u32,
    pub trajectory: TrajectoryPlan,
}

/// Validates the distance and synthesizes its trajectory.
pub fn plan_for_distance(
    distance: f64,
    config: &TrajectoryConfig,
) -> Result<TrajectoryPlan, SliderError> {
    if !distance.is_finite() || distance < 0.0 {
        return Err(SliderError::InvalidDistance(distance));
    }
    Ok(generate_tracks(distance, config))
}

/// Loads both images, locates the gap, and plans the drag.
///
/// A scan that finds no gap is an error here: there is nothing to drag to.
pub fn plan_drag(source: &dyn ImageSource, config: &Config) -> Result<DragPlan, SliderError> {
    let pair = source.load_pair()?;
    let gap = locate_gap(&pair.background, &pair.gap_background, &config.gap)?;

    let GapOutcome::Located { distance, .. } = gap else {
        return Err(SliderError::GapNotFound);
    };

    let trajectory = plan_for_distance(f64::from(distance), &config.trajectory)?;
    crate::log(&format!(
        "Drag plan: distance={} forward_steps={} back_steps={}",
        distance,
        trajectory.forward_tracks.len(),
        trajectory.back_tracks.len()
    ));

    Ok(DragPlan {
        gap,
        distance,
        trajectory,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slider::gap::tests::{background, encode_png, with_blocks};

    #[test]
    fn test_plan_drag_from_pair() {
        let bg = background();
        let pair = ImagePair {
            background: encode_png(&bg),
            gap_background: encode_png(&with_blocks(&bg, 12, 130)),
        };

        let plan = plan_drag(&pair, &Config::default()).unwrap();
        assert_eq!(plan.distance, 130);
        assert!(plan.gap.is_located());
        assert_eq!(plan.trajectory, generate_tracks(130.0, &TrajectoryConfig::default()));
    }

    #[test]
    fn test_plan_drag_without_gap_fails() {
        let png = encode_png(&background());
        let pair = ImagePair {
            background: png.clone(),
            gap_background: png,
        };

        let err = plan_drag(&pair, &Config::default()).unwrap_err();
        assert!(matches!(err, SliderError::GapNotFound));
        assert!(!err.is_invalid_input());
    }

    #[test]
    fn test_plan_for_distance_rejects_bad_input() {
        let config = TrajectoryConfig::default();
        assert!(matches!(
            plan_for_distance(-1.0, &config),
            Err(SliderError::InvalidDistance(_))
        ));
        assert!(plan_for_distance(f64::NAN, &config).is_err());
        assert!(plan_for_distance(f64::INFINITY, &config).is_err());
        assert!(plan_for_distance(0.0, &config).is_ok());
    }
}
