//! The 21-point hand landmark model and pose classification.

use super::state::Gesture;

/// Number of landmarks the detector reports per hand.
pub const LANDMARK_COUNT: usize = 21;

/// Wrist landmark index.
pub const WRIST: usize = 0;

/// Wrist plus the four finger base knuckles: the palm-base region whose
/// centroid stands in for "where the hand is".
const PALM_BASE: [usize; 5] = [0, 5, 9, 13, 17];

/// (fingertip, inner joint) landmark index pairs, thumb through pinky.
const DIGITS: [(usize, usize); 5] = [(4, 2), (8, 5), (12, 9), (16, 13), (20, 17)];

/// One detected keypoint in normalized image coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// A full set of landmarks for one detected hand.
#[derive(Debug, Clone)]
pub struct HandLandmarks {
    points: [Landmark; LANDMARK_COUNT],
}

impl HandLandmarks {
    pub fn new(points: [Landmark; LANDMARK_COUNT]) -> Self {
        Self { points }
    }

    pub fn point(&self, index: usize) -> Landmark {
        self.points[index]
    }
}

/// Classify the hand pose for one frame.
///
/// A digit counts as extended when its tip sits farther from the wrist
/// than its inner joint does, measured in the image plane. Four or more
/// extended digits is an open palm, one or fewer a fist, anything else is
/// indeterminate.
pub fn classify(hand: &HandLandmarks) -> Gesture {
    let wrist = hand.point(WRIST);
    let from_wrist = |p: Landmark| (p.x - wrist.x).hypot(p.y - wrist.y);

    let extended = DIGITS
        .iter()
        .filter(|&&(tip, joint)| from_wrist(hand.point(tip)) > from_wrist(hand.point(joint)))
        .count();

    match extended {
        4.. => Gesture::Open,
        0 | 1 => Gesture::Closed,
        _ => Gesture::None,
    }
}

/// Normalized palm position: the palm-base centroid, x mirrored so that
/// moving the hand to the user's right moves the reported x right too
/// (user-facing camera convention).
pub fn palm_position(hand: &HandLandmarks) -> (f32, f32) {
    let (sum_x, sum_y) = PALM_BASE.iter().fold((0.0, 0.0), |(sx, sy), &i| {
        let p = hand.point(i);
        (sx + p.x, sy + p.y)
    });
    let n = PALM_BASE.len() as f32;
    (1.0 - sum_x / n, sum_y / n)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a hand at (cx, cy) with `extended` of the five digits
    /// stretched past their inner joints.
    fn hand(cx: f32, cy: f32, extended: usize) -> HandLandmarks {
        let mut points = [Landmark::default(); LANDMARK_COUNT];
        points[WRIST] = Landmark {
            x: cx,
            y: cy + 0.1,
            z: 0.0,
        };

        for (digit, &(tip, joint)) in DIGITS.iter().enumerate() {
            // Fan the digits out above the wrist
            let angle = std::f32::consts::PI * (0.25 + 0.125 * digit as f32);
            let (dx, dy) = (angle.cos(), -angle.sin());
            let wrist = points[WRIST];

            let joint_reach = 0.18;
            let tip_reach = if digit < extended { 0.30 } else { 0.10 };
            points[joint] = Landmark {
                x: wrist.x + dx * joint_reach,
                y: wrist.y + dy * joint_reach,
                z: 0.0,
            };
            points[tip] = Landmark {
                x: wrist.x + dx * tip_reach,
                y: wrist.y + dy * tip_reach,
                z: 0.0,
            };
        }
        HandLandmarks::new(points)
    }

    #[test]
    fn test_open_palm_needs_four_extended() {
        assert_eq!(classify(&hand(0.5, 0.5, 5)), Gesture::Open);
        assert_eq!(classify(&hand(0.5, 0.5, 4)), Gesture::Open);
    }

    #[test]
    fn test_fist_allows_one_extended() {
        assert_eq!(classify(&hand(0.5, 0.5, 0)), Gesture::Closed);
        assert_eq!(classify(&hand(0.5, 0.5, 1)), Gesture::Closed);
    }

    #[test]
    fn test_partial_hand_is_indeterminate() {
        assert_eq!(classify(&hand(0.5, 0.5, 2)), Gesture::None);
        assert_eq!(classify(&hand(0.5, 0.5, 3)), Gesture::None);
    }

    #[test]
    fn test_palm_position_is_mirrored_centroid() {
        // All palm-base points collapsed onto one spot
        let mut points = [Landmark::default(); LANDMARK_COUNT];
        for i in [0usize, 5, 9, 13, 17] {
            points[i] = Landmark {
                x: 0.2,
                y: 0.7,
                z: 0.0,
            };
        }
        let (x, y) = palm_position(&HandLandmarks::new(points));
        assert!((x - 0.8).abs() < 1e-6);
        assert!((y - 0.7).abs() < 1e-6);
    }
}
