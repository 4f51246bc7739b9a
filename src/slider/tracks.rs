//! Drag trajectory synthesis.
//!
//! Simulates a drag that accelerates up to a braking point and then
//! decelerates, sampled at a fixed time step. Each sample becomes one relative
//! pointer step, so the steps start small, grow, and shrink again instead of
//! moving at constant speed. A short fixed tail of negative steps follows,
//! pulling back the deliberate overshoot.

use serde::Serialize;

use crate::config::TrajectoryConfig;

/// Relative horizontal steps for one drag.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TrajectoryPlan {
    /// Steps towards (and slightly past) the target
    pub forward_tracks: Vec<i32>,
    /// Fixed corrective steps after the overshoot
    pub back_tracks: Vec<i32>,
}

impl TrajectoryPlan {
    /// Net horizontal displacement of the whole plan.
    pub fn net_displacement(&self) -> i32 {
        self.forward_tracks.iter().chain(&self.back_tracks).sum()
    }

    /// Total number of steps, forward and back.
    pub fn len(&self) -> usize {
        self.forward_tracks.len() + self.back_tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Builds the step sequence for dragging `distance` pixels to the right.
///
/// `distance` is expected to be finite and non-negative; callers validate it.
pub fn generate_tracks(distance: f64, config: &TrajectoryConfig) -> TrajectoryPlan {
    let target = distance + config.overshoot_margin;
    let brake_at = target * config.brake_numerator / config.brake_denominator;
    let t = config.time_step;

    let mut velocity = 0.0;
    let mut current = 0.0;
    let mut forward_tracks = Vec::new();

    while current < target && forward_tracks.len() < config.max_steps {
        let a = if current < brake_at {
            config.acceleration
        } else {
            -config.braking
        };
        let step = velocity * t + 0.5 * a * (t * t);
        // Braking that ends exactly on the target can leave `current` a hair
        // short; once the drag stops moving forward it is done.
        if step <= 0.0 {
            break;
        }
        velocity += a * t;
        current += step;
        forward_tracks.push(step.round_ties_even() as i32);
    }

    TrajectoryPlan {
        forward_tracks,
        back_tracks: config.back_tracks.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BACK_TRACKS: [i32; 10] = [-3, -3, -2, -2, -2, -2, -2, -1, -1, -1];

    fn plan(distance: f64) -> TrajectoryPlan {
        generate_tracks(distance, &TrajectoryConfig::default())
    }

    fn forward_sum(plan: &TrajectoryPlan) -> i32 {
        plan.forward_tracks.iter().sum()
    }

    #[test]
    fn test_back_tracks_are_constant() {
        for distance in [0.0, 1.0, 57.0, 130.0, 400.0] {
            assert_eq!(plan(distance).back_tracks, BACK_TRACKS);
        }
    }

    #[test]
    fn test_forward_sum_reaches_target() {
        for distance in 0..=600 {
            let p = plan(distance as f64);
            assert!(
                forward_sum(&p) >= distance,
                "distance {} only moved {}",
                distance,
                forward_sum(&p)
            );
        }
    }

    #[test]
    fn test_longer_drags_take_more_steps() {
        let lengths: Vec<usize> = [0.0, 100.0, 300.0, 1000.0]
            .iter()
            .map(|&d| plan(d).forward_tracks.len())
            .collect();
        assert!(lengths.windows(2).all(|w| w[0] < w[1]), "{:?}", lengths);
    }

    #[test]
    fn test_distance_130_profile() {
        let p = plan(130.0);
        assert_eq!(forward_sum(&p), 150);
        assert_eq!(p.forward_tracks.len(), 73);
        assert!(p.forward_tracks.iter().all(|&s| s >= 0));

        // Steps rise to a single peak and then only shrink.
        let peak = p
            .forward_tracks
            .iter()
            .position(|&s| s == *p.forward_tracks.iter().max().unwrap())
            .unwrap();
        assert!(p.forward_tracks[..=peak].windows(2).all(|w| w[0] <= w[1]));
        assert!(p.forward_tracks[peak..].windows(2).all(|w| w[0] >= w[1]));
        assert_eq!(p.forward_tracks[peak], 4);
        assert_eq!(*p.forward_tracks.last().unwrap(), 1);
    }

    #[test]
    fn test_zero_distance_still_overshoots() {
        let p = plan(0.0);
        assert_eq!(p.forward_tracks.len(), 25);
        assert_eq!(forward_sum(&p), 19);
        assert_eq!(p.net_displacement(), 0);
    }

    #[test]
    fn test_braking_onto_target_terminates() {
        // Acceleration ends exactly at the braking point for a 240 px target,
        // so braking alone can only just reach it.
        let p = plan(220.0);
        assert!(p.forward_tracks.len() < 200);
        assert!(forward_sum(&p) >= 220);
    }

    #[test]
    fn test_max_steps_caps_output() {
        let config = TrajectoryConfig {
            max_steps: 10,
            ..TrajectoryConfig::default()
        };
        let p = generate_tracks(500.0, &config);
        assert_eq!(p.forward_tracks.len(), 10);
    }

    #[test]
    fn test_fractional_distance_28_6() {
        // 48.6 * 0.6 and 48.6 * 3 / 5 differ in the last bit; the braking
        // point must follow the latter.
        let p = plan(28.6);
        assert_eq!(
            p.forward_tracks,
            vec![
                0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 2, 2, 2, 2, 2, 2, 2, 2, 2,
                2, 2, 2, 2, 2, 2, 1, 1, 1, 1, 1,
            ]
        );
        assert_eq!(forward_sum(&p), 48);
    }

    #[test]
    fn test_fractional_distances_step_counts() {
        // (distance, steps, forward sum, peak step)
        let cases = [
            (1.6, 26, 20, 1),
            (81.4, 58, 102, 3),
            (174.4, 81, 193, 4),
        ];
        for (distance, steps, sum, peak) in cases {
            let p = plan(distance);
            assert_eq!(p.forward_tracks.len(), steps, "distance {}", distance);
            assert_eq!(forward_sum(&p), sum, "distance {}", distance);
            assert_eq!(p.forward_tracks.iter().max(), Some(&peak), "distance {}", distance);
        }
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(plan(87.5), plan(87.5));
    }

    #[test]
    fn test_plan_len() {
        let p = plan(130.0);
        assert_eq!(p.len(), 83);
        assert!(!p.is_empty());
    }
}
