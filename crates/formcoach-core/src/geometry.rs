//! Geometric utilities for joint-angle computations.
//!
//! Every function here is pure: the rep counters and the posture analyzer
//! must see identical angles for identical keypoints.

use nalgebra::{Vector2, Vector3};

use crate::types::Keypoint;

/// Added to the norm product so zero-length rays give a defined angle
const NORM_EPSILON: f64 = 1e-6;

fn angle_from_rays(dot: f64, norms: f64) -> f64 {
    let cosine = (dot / (norms + NORM_EPSILON)).clamp(-1.0, 1.0);
    cosine.acos().to_degrees()
}

/// Angle at vertex `b` between rays b→a and b→c, in degrees [0, 180].
///
/// Uses the 2D image-plane projection. A zero-length ray yields 90°.
pub fn angle(a: &Keypoint, b: &Keypoint, c: &Keypoint) -> f64 {
    let ba = Vector2::new(a.x - b.x, a.y - b.y);
    let bc = Vector2::new(c.x - b.x, c.y - b.y);
    angle_from_rays(ba.dot(&bc), ba.norm() * bc.norm())
}

/// Same as [`angle`] but including the relative depth coordinate
pub fn angle_3d(a: &Keypoint, b: &Keypoint, c: &Keypoint) -> f64 {
    let ba = Vector3::new(a.x - b.x, a.y - b.y, a.z - b.z);
    let bc = Vector3::new(c.x - b.x, c.y - b.y, c.z - b.z);
    angle_from_rays(ba.dot(&bc), ba.norm() * bc.norm())
}

pub fn vertical_distance(a: &Keypoint, b: &Keypoint) -> f64 {
    (a.y - b.y).abs()
}

pub fn horizontal_distance(a: &Keypoint, b: &Keypoint) -> f64 {
    (a.x - b.x).abs()
}

pub fn euclidean_distance(a: &Keypoint, b: &Keypoint) -> f64 {
    Vector2::new(a.x - b.x, a.y - b.y).norm()
}

pub fn is_visible(keypoint: &Keypoint, threshold: f64) -> bool {
    keypoint.visibility >= threshold
}

/// Midpoint of the hips in normalized coordinates
pub fn body_center(left_hip: &Keypoint, right_hip: &Keypoint) -> (f64, f64) {
    (
        (left_hip.x + right_hip.x) / 2.0,
        (left_hip.y + right_hip.y) / 2.0,
    )
}

/// Deviation of the hip→shoulder segment from vertical, in degrees.
///
/// Returns `(is_aligned, deviation)`.
pub fn body_alignment(shoulder: &Keypoint, hip: &Keypoint, max_deviation: f64) -> (bool, f64) {
    let above_hip = Keypoint::new(u8::MAX, hip.x, hip.y - 0.1, hip.z, 1.0);
    let deviation = angle(shoulder, hip, &above_hip);
    (deviation <= max_deviation, deviation)
}

pub fn knee_angle(hip: &Keypoint, knee: &Keypoint, ankle: &Keypoint) -> f64 {
    angle(hip, knee, ankle)
}

pub fn elbow_angle(shoulder: &Keypoint, elbow: &Keypoint, wrist: &Keypoint) -> f64 {
    angle(shoulder, elbow, wrist)
}

pub fn hip_angle(shoulder: &Keypoint, hip: &Keypoint, knee: &Keypoint) -> f64 {
    angle(shoulder, hip, knee)
}

/// Round half away from zero to `decimals` places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kp(x: f64, y: f64) -> Keypoint {
        Keypoint::new(0, x, y, 0.0, 1.0)
    }

    #[test]
    fn test_right_angle() {
        let a = kp(0.0, 0.0);
        let b = kp(0.0, 0.5);
        let c = kp(0.5, 0.5);
        let deg = angle(&a, &b, &c);
        assert!((85.0..=95.0).contains(&deg));
    }

    #[test]
    fn test_colinear_is_straight() {
        let deg = angle(&kp(0.0, 0.5), &kp(0.5, 0.5), &kp(1.0, 0.5));
        assert!((175.0..=180.0).contains(&deg));
    }

    #[test]
    fn test_angle_symmetry_and_range() {
        let points = [
            kp(0.1, 0.9),
            kp(0.4, 0.2),
            kp(0.7, 0.7),
            kp(0.33, 0.51),
            kp(0.9, 0.05),
        ];
        for a in &points {
            for b in &points {
                for c in &points {
                    let forward = angle(a, b, c);
                    let backward = angle(c, b, a);
                    assert!((0.0..=180.0).contains(&forward));
                    assert_eq!(forward, backward);
                }
            }
        }
    }

    #[test]
    fn test_degenerate_ray_is_defined() {
        let b = kp(0.5, 0.5);
        let deg = angle(&b, &b, &kp(0.9, 0.1));
        assert!(deg.is_finite());
        assert!((deg - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_near_colinear_does_not_nan() {
        let deg = angle(&kp(0.0, 0.0), &kp(0.5, 0.5 + 1e-12), &kp(1.0, 1.0));
        assert!(deg.is_finite());
    }

    #[test]
    fn test_angle_3d_right_angle() {
        let a = Keypoint::new(0, 0.0, 0.0, 0.0, 1.0);
        let b = Keypoint::new(0, 0.0, 0.5, 0.0, 1.0);
        let c = Keypoint::new(0, 0.5, 0.5, 0.0, 1.0);
        assert!((angle_3d(&a, &b, &c) - 90.0).abs() < 5.0);
    }

    #[test]
    fn test_distances() {
        let a = kp(0.2, 0.3);
        let b = kp(0.8, 0.7);
        assert!((vertical_distance(&a, &b) - 0.4).abs() < 1e-9);
        assert!((horizontal_distance(&a, &b) - 0.6).abs() < 1e-9);
        assert!((euclidean_distance(&a, &b) - (0.52f64).sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_visibility_threshold_is_inclusive() {
        let mut point = kp(0.5, 0.5);
        point.visibility = 0.5;
        assert!(is_visible(&point, 0.5));
        point.visibility = 0.49;
        assert!(!is_visible(&point, 0.5));
    }

    #[test]
    fn test_body_alignment_upright() {
        let shoulder = kp(0.5, 0.3);
        let hip = kp(0.5, 0.5);
        let (aligned, deviation) = body_alignment(&shoulder, &hip, 15.0);
        assert!(aligned);
        assert!(deviation < 1.0);

        let leaning = kp(0.8, 0.45);
        let (aligned, _) = body_alignment(&leaning, &hip, 15.0);
        assert!(!aligned);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(66.666, 1), 66.7);
        assert_eq!(round_to(0.256, 2), 0.26);
        assert_eq!(round_to(12.0, 1), 12.0);
    }

    #[test]
    fn test_body_center() {
        let (x, y) = body_center(&kp(0.4, 0.5), &kp(0.6, 0.7));
        assert!((x - 0.5).abs() < 1e-9);
        assert!((y - 0.6).abs() < 1e-9);
    }
}
