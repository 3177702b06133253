//! Posture quality scoring.
//!
//! Every analyzed frame starts at 100 and loses a fixed penalty per detected
//! form error. Errors are listed in detection order:
//!
//! | Exercise | Check                              | Penalty | Severity |
//! |----------|------------------------------------|---------|----------|
//! | Squat    | knee angle above depth target      | 20      | medium   |
//! | Squat    | left/right knee asymmetry          | 15      | medium   |
//! | Squat    | shoulder-hip-knee angle too closed | 25      | high     |
//! | Squat    | knee ahead of ankle                | 15      | medium   |
//! | Push-up  | elbow angle above depth target     | 20      | medium   |
//! | Push-up  | hips off the shoulder-ankle line   | 25      | high     |
//! | Push-up  | left/right elbow asymmetry         | 15      | medium   |
//! | Push-up  | hand width vs shoulder width       | 10      | low      |

use std::collections::BTreeMap;
use std::fmt;

use formcoach_core::{
    angle, horizontal_distance, Error, ExerciseKind, FrameSample, Keypoint, Landmark, Result,
    RingBuffer,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const PERFECT_SCORE: f64 = 100.0;
/// Score reported for exercises the analyzer has no rules for
pub const NEUTRAL_SCORE: f64 = 50.0;

const DEPTH_PENALTY: f64 = 20.0;
const SYMMETRY_PENALTY: f64 = 15.0;
const BACK_PENALTY: f64 = 25.0;
const KNEE_FORWARD_PENALTY: f64 = 15.0;
const HIP_PENALTY: f64 = 25.0;
const HAND_PENALTY: f64 = 10.0;

/// Ordinal ranking used to pick the error surfaced to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Form error taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Depth,
    KneeAlignment,
    BackPosture,
    KneeForward,
    HipsLow,
    HipsHigh,
    ElbowSymmetry,
    HandPosition,
    DetectionError,
    Unsupported,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Depth => "depth",
            ErrorKind::KneeAlignment => "knee_alignment",
            ErrorKind::BackPosture => "back_posture",
            ErrorKind::KneeForward => "knee_forward",
            ErrorKind::HipsLow => "hips_low",
            ErrorKind::HipsHigh => "hips_high",
            ErrorKind::ElbowSymmetry => "elbow_symmetry",
            ErrorKind::HandPosition => "hand_position",
            ErrorKind::DetectionError => "detection_error",
            ErrorKind::Unsupported => "unsupported",
        }
    }

    fn event(self) -> ErrorEvent {
        let (message, severity, icon) = match self {
            ErrorKind::Depth => ("Go lower", Severity::Medium, "⚠️"),
            ErrorKind::KneeAlignment => ("Balance your knees", Severity::Medium, "⚠️"),
            ErrorKind::BackPosture => ("Keep your back straight", Severity::High, "🔴"),
            ErrorKind::KneeForward => ("Keep your knees back", Severity::Medium, "⚠️"),
            ErrorKind::HipsLow => ("Raise your hips", Severity::High, "🔴"),
            ErrorKind::HipsHigh => ("Lower your hips", Severity::High, "🔴"),
            ErrorKind::ElbowSymmetry => ("Balance your arms", Severity::Medium, "⚠️"),
            ErrorKind::HandPosition => ("Adjust your hand width", Severity::Low, "💡"),
            ErrorKind::DetectionError => ("Position not detected", Severity::Low, "⚪"),
            ErrorKind::Unsupported => ("Exercise not analyzed", Severity::Low, "💡"),
        };
        ErrorEvent {
            kind: self,
            message: message.to_string(),
            severity,
            icon: icon.to_string(),
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEvent {
    #[serde(rename = "type")]
    pub kind: ErrorKind,
    pub message: String,
    pub severity: Severity,
    pub icon: String,
}

impl From<ErrorKind> for ErrorEvent {
    fn from(kind: ErrorKind) -> Self {
        kind.event()
    }
}

/// Result of analyzing one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    /// Always within [0, 100]
    pub quality_score: f64,
    pub errors: Vec<ErrorEvent>,
    pub angles: BTreeMap<String, f64>,
}

impl QualityReport {
    fn degraded(score: f64, kind: ErrorKind) -> Self {
        Self {
            quality_score: score,
            errors: vec![kind.into()],
            angles: BTreeMap::new(),
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn category(&self) -> QualityCategory {
        QualityCategory::from_score(self.quality_score)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityCategory {
    Excellent,
    Good,
    Fair,
    NeedsWork,
}

impl QualityCategory {
    pub fn from_score(score: f64) -> Self {
        if score >= 85.0 {
            QualityCategory::Excellent
        } else if score >= 70.0 {
            QualityCategory::Good
        } else if score >= 50.0 {
            QualityCategory::Fair
        } else {
            QualityCategory::NeedsWork
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            QualityCategory::Excellent => "Excellent",
            QualityCategory::Good => "Good",
            QualityCategory::Fair => "Fair",
            QualityCategory::NeedsWork => "Needs work",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            QualityCategory::Excellent => "green",
            QualityCategory::Good => "lightgreen",
            QualityCategory::Fair => "orange",
            QualityCategory::NeedsWork => "red",
        }
    }
}

/// Score counts per category band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QualityDistribution {
    pub excellent: u32,
    pub good: u32,
    pub medium: u32,
    pub poor: u32,
}

impl QualityDistribution {
    pub fn from_scores(scores: impl IntoIterator<Item = f64>) -> Self {
        let mut distribution = Self::default();
        for score in scores {
            distribution.add(score);
        }
        distribution
    }

    pub fn add(&mut self, score: f64) {
        match QualityCategory::from_score(score) {
            QualityCategory::Excellent => self.excellent += 1,
            QualityCategory::Good => self.good += 1,
            QualityCategory::Fair => self.medium += 1,
            QualityCategory::NeedsWork => self.poor += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.excellent + self.good + self.medium + self.poor
    }
}

/// Category and display color of a score
pub fn get_quality_category(score: f64) -> (&'static str, &'static str) {
    let category = QualityCategory::from_score(score);
    (category.label(), category.color())
}

/// Form-check tolerances
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostureThresholds {
    /// Knee angle of a full-depth squat
    pub squat_knee_angle_min: f64,
    /// Slack above `squat_knee_angle_min` before depth is flagged
    pub squat_depth_tolerance: f64,
    pub knee_symmetry_tolerance: f64,
    pub back_angle_min: f64,
    /// Horizontal knee-ankle offset, normalized
    pub knee_forward_tolerance: f64,
    pub pushup_elbow_angle_min: f64,
    pub pushup_depth_tolerance: f64,
    /// Hip offset from the shoulder-ankle midline, normalized
    pub hip_height_tolerance: f64,
    pub elbow_symmetry_tolerance: f64,
    pub hand_width_min_ratio: f64,
    pub hand_width_max_ratio: f64,
    /// Number of scores kept for averaging
    pub history_size: usize,
}

impl Default for PostureThresholds {
    fn default() -> Self {
        Self {
            squat_knee_angle_min: 80.0,
            squat_depth_tolerance: 20.0,
            knee_symmetry_tolerance: 15.0,
            back_angle_min: 150.0,
            knee_forward_tolerance: 0.1,
            pushup_elbow_angle_min: 70.0,
            pushup_depth_tolerance: 30.0,
            hip_height_tolerance: 0.1,
            elbow_symmetry_tolerance: 15.0,
            hand_width_min_ratio: 0.8,
            hand_width_max_ratio: 1.5,
            history_size: 100,
        }
    }
}

/// Accumulates penalties for one frame
struct Assessment {
    score: f64,
    errors: Vec<ErrorEvent>,
    angles: BTreeMap<String, f64>,
}

impl Assessment {
    fn new() -> Self {
        Self {
            score: PERFECT_SCORE,
            errors: Vec::new(),
            angles: BTreeMap::new(),
        }
    }

    fn flag(&mut self, kind: ErrorKind, penalty: f64) {
        self.errors.push(kind.into());
        self.score -= penalty;
    }

    fn record(&mut self, name: &str, value: f64) {
        self.angles.insert(name.to_string(), value);
    }

    fn finish(self) -> QualityReport {
        QualityReport {
            quality_score: self.score.clamp(0.0, PERFECT_SCORE),
            errors: self.errors,
            angles: self.angles,
        }
    }
}

fn joint_angle(frame: &FrameSample, a: Landmark, b: Landmark, c: Landmark) -> Result<f64> {
    let value = angle(frame.require(a)?, frame.require(b)?, frame.require(c)?);
    if value.is_finite() {
        Ok(value)
    } else {
        Err(Error::MissingLandmark(b))
    }
}

fn mean_y(points: [&Keypoint; 2]) -> f64 {
    (points[0].y + points[1].y) / 2.0
}

/// Rule-based posture scoring with rolling quality history
#[derive(Debug, Clone)]
pub struct PostureAnalyzer {
    thresholds: PostureThresholds,
    history: RingBuffer<f64>,
    error_counts: BTreeMap<ErrorKind, u32>,
}

impl PostureAnalyzer {
    pub fn new(thresholds: PostureThresholds) -> Self {
        Self {
            history: RingBuffer::new(thresholds.history_size),
            thresholds,
            error_counts: BTreeMap::new(),
        }
    }

    pub fn thresholds(&self) -> &PostureThresholds {
        &self.thresholds
    }

    /// Score one frame and record the result
    pub fn analyze(&mut self, kind: ExerciseKind, frame: &FrameSample) -> QualityReport {
        let outcome = match kind {
            ExerciseKind::Squat => self.assess_squat(frame),
            ExerciseKind::PushUp => self.assess_pushup(frame),
        };

        let report = match outcome {
            Ok(assessment) => assessment.finish(),
            Err(e) => {
                warn!(exercise = %kind, error = %e, "Posture analysis failed");
                QualityReport::degraded(0.0, ErrorKind::DetectionError)
            }
        };

        self.history.push(report.quality_score);
        for error in &report.errors {
            *self.error_counts.entry(error.kind).or_insert(0) += 1;
        }
        report
    }

    /// Score a frame for an exercise given by name.
    ///
    /// Unrecognized names yield a neutral report that is not recorded.
    pub fn analyze_named(&mut self, exercise: &str, frame: &FrameSample) -> QualityReport {
        match ExerciseKind::from_name(exercise) {
            Some(kind) => self.analyze(kind, frame),
            None => QualityReport::degraded(NEUTRAL_SCORE, ErrorKind::Unsupported),
        }
    }

    fn assess_squat(&self, frame: &FrameSample) -> Result<Assessment> {
        let t = &self.thresholds;
        let mut a = Assessment::new();

        let left_knee = joint_angle(frame, Landmark::LeftHip, Landmark::LeftKnee, Landmark::LeftAnkle)?;
        let right_knee =
            joint_angle(frame, Landmark::RightHip, Landmark::RightKnee, Landmark::RightAnkle)?;
        let knee = (left_knee + right_knee) / 2.0;
        a.record("knee", knee);

        if knee > t.squat_knee_angle_min + t.squat_depth_tolerance {
            a.flag(ErrorKind::Depth, DEPTH_PENALTY);
        }

        if (left_knee - right_knee).abs() > t.knee_symmetry_tolerance {
            a.flag(ErrorKind::KneeAlignment, SYMMETRY_PENALTY);
        }

        let back = joint_angle(frame, Landmark::LeftShoulder, Landmark::LeftHip, Landmark::LeftKnee)?;
        a.record("back", back);
        if back < t.back_angle_min {
            a.flag(ErrorKind::BackPosture, BACK_PENALTY);
        }

        let knee_kp = frame.require(Landmark::LeftKnee)?;
        let ankle_kp = frame.require(Landmark::LeftAnkle)?;
        if horizontal_distance(knee_kp, ankle_kp) > t.knee_forward_tolerance {
            a.flag(ErrorKind::KneeForward, KNEE_FORWARD_PENALTY);
        }

        Ok(a)
    }

    fn assess_pushup(&self, frame: &FrameSample) -> Result<Assessment> {
        let t = &self.thresholds;
        let mut a = Assessment::new();

        let left_elbow =
            joint_angle(frame, Landmark::LeftShoulder, Landmark::LeftElbow, Landmark::LeftWrist)?;
        let right_elbow =
            joint_angle(frame, Landmark::RightShoulder, Landmark::RightElbow, Landmark::RightWrist)?;
        let elbow = (left_elbow + right_elbow) / 2.0;
        a.record("elbow", elbow);

        if elbow > t.pushup_elbow_angle_min + t.pushup_depth_tolerance {
            a.flag(ErrorKind::Depth, DEPTH_PENALTY);
        }

        let shoulder_y = mean_y([
            frame.require(Landmark::LeftShoulder)?,
            frame.require(Landmark::RightShoulder)?,
        ]);
        let hip_y = mean_y([frame.require(Landmark::LeftHip)?, frame.require(Landmark::RightHip)?]);
        let ankle_y = mean_y([
            frame.require(Landmark::LeftAnkle)?,
            frame.require(Landmark::RightAnkle)?,
        ]);
        let offset = hip_y - (shoulder_y + ankle_y) / 2.0;
        a.record("hip_offset", offset);
        if offset.abs() > t.hip_height_tolerance {
            let kind = if hip_y < shoulder_y {
                ErrorKind::HipsLow
            } else {
                ErrorKind::HipsHigh
            };
            a.flag(kind, HIP_PENALTY);
        }

        if (left_elbow - right_elbow).abs() > t.elbow_symmetry_tolerance {
            a.flag(ErrorKind::ElbowSymmetry, SYMMETRY_PENALTY);
        }

        let hand_width = horizontal_distance(
            frame.require(Landmark::LeftWrist)?,
            frame.require(Landmark::RightWrist)?,
        );
        let shoulder_width = horizontal_distance(
            frame.require(Landmark::LeftShoulder)?,
            frame.require(Landmark::RightShoulder)?,
        );
        if hand_width < shoulder_width * t.hand_width_min_ratio
            || hand_width > shoulder_width * t.hand_width_max_ratio
        {
            a.flag(ErrorKind::HandPosition, HAND_PENALTY);
        }

        Ok(a)
    }

    /// Mean of the most recent `last_n` scores, 0 when nothing was analyzed
    pub fn get_average_quality(&self, last_n: usize) -> f64 {
        let n = last_n.min(self.history.len());
        if n == 0 {
            return 0.0;
        }
        self.history.last_n(n).sum::<f64>() / n as f64
    }

    /// Occurrences of each error kind since the last reset
    pub fn get_error_summary(&self) -> BTreeMap<ErrorKind, u32> {
        self.error_counts.clone()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn reset(&mut self) {
        self.history.clear();
        self.error_counts.clear();
    }
}

impl Default for PostureAnalyzer {
    fn default() -> Self {
        Self::new(PostureThresholds::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formcoach_core::Timestamp;

    fn blank() -> Vec<Keypoint> {
        (0..Landmark::COUNT as u8)
            .map(|id| Keypoint::new(id, 0.5, 0.5, 0.0, 1.0))
            .collect()
    }

    fn set(kps: &mut [Keypoint], lm: Landmark, x: f64, y: f64) {
        kps[lm.index()] = Keypoint::of(lm, x, y, 0.0, 1.0);
    }

    fn frame(kps: Vec<Keypoint>) -> FrameSample {
        FrameSample::new(Timestamp::from_nanos(0), kps).unwrap()
    }

    /// Side-on deep squat: knees at 90°, torso in line with the thighs, knees over ankles
    fn good_squat() -> Vec<Keypoint> {
        let mut kps = blank();
        for (x, dir, shoulder, hip, knee, ankle) in [
            (0.45, -1.0, Landmark::LeftShoulder, Landmark::LeftHip, Landmark::LeftKnee, Landmark::LeftAnkle),
            (0.55, 1.0, Landmark::RightShoulder, Landmark::RightHip, Landmark::RightKnee, Landmark::RightAnkle),
        ] {
            set(&mut kps, ankle, x, 0.9);
            set(&mut kps, knee, x, 0.7);
            set(&mut kps, hip, x + dir * 0.2, 0.7);
            set(&mut kps, shoulder, x + dir * 0.4, 0.68);
        }
        kps
    }

    /// Push-up plank: shoulders, hips and ankles on one line
    fn plank(hip_y: f64) -> Vec<Keypoint> {
        let mut kps = blank();
        set(&mut kps, Landmark::LeftShoulder, 0.3, 0.4);
        set(&mut kps, Landmark::RightShoulder, 0.5, 0.4);
        set(&mut kps, Landmark::LeftElbow, 0.3, 0.5);
        set(&mut kps, Landmark::RightElbow, 0.5, 0.5);
        set(&mut kps, Landmark::LeftWrist, 0.4, 0.5);
        set(&mut kps, Landmark::RightWrist, 0.6, 0.5);
        set(&mut kps, Landmark::LeftHip, 0.3, hip_y);
        set(&mut kps, Landmark::RightHip, 0.5, hip_y);
        set(&mut kps, Landmark::LeftAnkle, 0.3, 0.6);
        set(&mut kps, Landmark::RightAnkle, 0.5, 0.6);
        kps
    }

    #[test]
    fn test_perfect_squat() {
        let mut analyzer = PostureAnalyzer::default();
        let report = analyzer.analyze(ExerciseKind::Squat, &frame(good_squat()));
        assert!(report.errors.is_empty(), "{:?}", report.errors);
        assert_eq!(report.quality_score, 100.0);
        assert!(report.angles.contains_key("knee"));
    }

    #[test]
    fn test_squat_error_order() {
        let mut kps = blank();
        // right leg straight, left knee bent past the ankle, torso folded over
        set(&mut kps, Landmark::LeftShoulder, 0.7, 0.35);
        set(&mut kps, Landmark::LeftHip, 0.4, 0.5);
        set(&mut kps, Landmark::LeftKnee, 0.6, 0.7);
        set(&mut kps, Landmark::LeftAnkle, 0.4, 0.9);
        set(&mut kps, Landmark::RightShoulder, 0.6, 0.3);
        set(&mut kps, Landmark::RightHip, 0.6, 0.5);
        set(&mut kps, Landmark::RightKnee, 0.6, 0.7);
        set(&mut kps, Landmark::RightAnkle, 0.6, 0.9);

        let mut analyzer = PostureAnalyzer::default();
        let report = analyzer.analyze(ExerciseKind::Squat, &frame(kps));
        let kinds: Vec<ErrorKind> = report.errors.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ErrorKind::Depth,
                ErrorKind::KneeAlignment,
                ErrorKind::BackPosture,
                ErrorKind::KneeForward
            ]
        );
        assert_eq!(report.quality_score, 25.0);
    }

    #[test]
    fn test_pushup_hips_on_midline() {
        let mut analyzer = PostureAnalyzer::default();
        let report = analyzer.analyze(ExerciseKind::PushUp, &frame(plank(0.5)));
        assert!(!report
            .errors
            .iter()
            .any(|e| matches!(e.kind, ErrorKind::HipsLow | ErrorKind::HipsHigh)));
    }

    #[test]
    fn test_pushup_sagging_hips() {
        let mut analyzer = PostureAnalyzer::default();
        let baseline = analyzer.analyze(ExerciseKind::PushUp, &frame(plank(0.5)));
        let report = analyzer.analyze(ExerciseKind::PushUp, &frame(plank(0.75)));
        let hip_error = report
            .errors
            .iter()
            .find(|e| e.kind == ErrorKind::HipsHigh)
            .expect("hip error");
        assert_eq!(hip_error.severity, Severity::High);
        assert_eq!(hip_error.message, "Lower your hips");
        assert!(baseline.quality_score - report.quality_score >= 25.0);
    }

    #[test]
    fn test_pushup_hand_width() {
        let mut kps = plank(0.5);
        set(&mut kps, Landmark::LeftWrist, 0.1, 0.5);
        set(&mut kps, Landmark::RightWrist, 0.9, 0.5);
        let mut analyzer = PostureAnalyzer::default();
        let report = analyzer.analyze(ExerciseKind::PushUp, &frame(kps));
        let hand = report
            .errors
            .iter()
            .find(|e| e.kind == ErrorKind::HandPosition)
            .expect("hand error");
        assert_eq!(hand.severity, Severity::Low);
    }

    #[test]
    fn test_missing_landmark_degrades() {
        let mut kps = good_squat();
        kps[Landmark::LeftKnee.index()].x = f64::NAN;
        let mut analyzer = PostureAnalyzer::default();
        let report = analyzer.analyze(ExerciseKind::Squat, &frame(kps));
        assert_eq!(report.quality_score, 0.0);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].kind, ErrorKind::DetectionError);
        assert_eq!(report.errors[0].severity, Severity::Low);
        assert_eq!(analyzer.history_len(), 1);
    }

    #[test]
    fn test_unsupported_exercise_is_neutral() {
        let mut analyzer = PostureAnalyzer::default();
        let report = analyzer.analyze_named("jumping jacks", &frame(good_squat()));
        assert_eq!(report.quality_score, NEUTRAL_SCORE);
        assert_eq!(report.errors[0].kind, ErrorKind::Unsupported);
        assert_eq!(analyzer.history_len(), 0);

        let report = analyzer.analyze_named("Squat", &frame(good_squat()));
        assert_eq!(report.quality_score, 100.0);
    }

    #[test]
    fn test_score_stays_in_range() {
        let mut analyzer = PostureAnalyzer::default();
        let shapes = [blank(), good_squat(), plank(0.1), plank(0.9)];
        for kps in shapes {
            for kind in [ExerciseKind::Squat, ExerciseKind::PushUp] {
                let report = analyzer.analyze(kind, &frame(kps.clone()));
                assert!((0.0..=100.0).contains(&report.quality_score));
            }
        }
    }

    #[test]
    fn test_average_and_summary() {
        let mut analyzer = PostureAnalyzer::default();
        assert_eq!(analyzer.get_average_quality(10), 0.0);
        analyzer.analyze(ExerciseKind::Squat, &frame(good_squat()));
        analyzer.analyze(ExerciseKind::PushUp, &frame(plank(0.75)));
        let last = analyzer.get_average_quality(1);
        assert!(last < 100.0);
        let both = analyzer.get_average_quality(10);
        assert!((both - (100.0 + last) / 2.0).abs() < 1e-9);
        assert_eq!(analyzer.get_error_summary().get(&ErrorKind::HipsHigh), Some(&1));

        analyzer.reset();
        assert_eq!(analyzer.history_len(), 0);
        assert!(analyzer.get_error_summary().is_empty());
    }

    #[test]
    fn test_history_is_bounded() {
        let mut analyzer = PostureAnalyzer::new(PostureThresholds {
            history_size: 3,
            ..Default::default()
        });
        for _ in 0..10 {
            analyzer.analyze(ExerciseKind::Squat, &frame(good_squat()));
        }
        assert_eq!(analyzer.history_len(), 3);
    }

    #[test]
    fn test_categories() {
        assert_eq!(get_quality_category(85.0), ("Excellent", "green"));
        assert_eq!(get_quality_category(84.9), ("Good", "lightgreen"));
        assert_eq!(get_quality_category(50.0), ("Fair", "orange"));
        assert_eq!(get_quality_category(0.0), ("Needs work", "red"));
        assert_eq!(QualityCategory::from_score(70.0), QualityCategory::Good);
    }
}
