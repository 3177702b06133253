//! Fundamental types for the FormCoach system.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Session identifier for one exercise attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Timestamp wrapper with nanosecond precision (Unix epoch)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn now() -> Self {
        Self(Utc::now().timestamp_nanos_opt().unwrap_or(0))
    }

    pub fn from_nanos(nanos: i64) -> Self {
        Self(nanos)
    }

    pub fn from_secs_f64(secs: f64) -> Self {
        Self((secs * 1_000_000_000.0).round() as i64)
    }

    pub fn as_nanos(&self) -> i64 {
        self.0
    }

    pub fn as_secs_f64(&self) -> f64 {
        self.0 as f64 / 1_000_000_000.0
    }

    /// Seconds elapsed since `earlier` (negative if `earlier` is in the future)
    pub fn seconds_since(&self, earlier: Timestamp) -> f64 {
        (self.0 - earlier.0) as f64 / 1_000_000_000.0
    }

    pub fn offset_secs(&self, secs: f64) -> Self {
        Self(self.0 + (secs * 1_000_000_000.0).round() as i64)
    }

    pub fn to_datetime(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_nanos(self.0)
    }
}

/// The 33 body landmarks produced by the pose stage (BlazePose topology)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Landmark {
    Nose = 0,
    LeftEyeInner = 1,
    LeftEye = 2,
    LeftEyeOuter = 3,
    RightEyeInner = 4,
    RightEye = 5,
    RightEyeOuter = 6,
    LeftEar = 7,
    RightEar = 8,
    MouthLeft = 9,
    MouthRight = 10,
    LeftShoulder = 11,
    RightShoulder = 12,
    LeftElbow = 13,
    RightElbow = 14,
    LeftWrist = 15,
    RightWrist = 16,
    LeftPinky = 17,
    RightPinky = 18,
    LeftIndex = 19,
    RightIndex = 20,
    LeftThumb = 21,
    RightThumb = 22,
    LeftHip = 23,
    RightHip = 24,
    LeftKnee = 25,
    RightKnee = 26,
    LeftAnkle = 27,
    RightAnkle = 28,
    LeftHeel = 29,
    RightHeel = 30,
    LeftFootIndex = 31,
    RightFootIndex = 32,
}

impl Landmark {
    pub const COUNT: usize = 33;

    pub const ALL: [Landmark; Landmark::COUNT] = [
        Landmark::Nose,
        Landmark::LeftEyeInner,
        Landmark::LeftEye,
        Landmark::LeftEyeOuter,
        Landmark::RightEyeInner,
        Landmark::RightEye,
        Landmark::RightEyeOuter,
        Landmark::LeftEar,
        Landmark::RightEar,
        Landmark::MouthLeft,
        Landmark::MouthRight,
        Landmark::LeftShoulder,
        Landmark::RightShoulder,
        Landmark::LeftElbow,
        Landmark::RightElbow,
        Landmark::LeftWrist,
        Landmark::RightWrist,
        Landmark::LeftPinky,
        Landmark::RightPinky,
        Landmark::LeftIndex,
        Landmark::RightIndex,
        Landmark::LeftThumb,
        Landmark::RightThumb,
        Landmark::LeftHip,
        Landmark::RightHip,
        Landmark::LeftKnee,
        Landmark::RightKnee,
        Landmark::LeftAnkle,
        Landmark::RightAnkle,
        Landmark::LeftHeel,
        Landmark::RightHeel,
        Landmark::LeftFootIndex,
        Landmark::RightFootIndex,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(idx: u8) -> Option<Self> {
        Self::ALL.get(idx as usize).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            Landmark::Nose => "nose",
            Landmark::LeftEyeInner => "left_eye_inner",
            Landmark::LeftEye => "left_eye",
            Landmark::LeftEyeOuter => "left_eye_outer",
            Landmark::RightEyeInner => "right_eye_inner",
            Landmark::RightEye => "right_eye",
            Landmark::RightEyeOuter => "right_eye_outer",
            Landmark::LeftEar => "left_ear",
            Landmark::RightEar => "right_ear",
            Landmark::MouthLeft => "mouth_left",
            Landmark::MouthRight => "mouth_right",
            Landmark::LeftShoulder => "left_shoulder",
            Landmark::RightShoulder => "right_shoulder",
            Landmark::LeftElbow => "left_elbow",
            Landmark::RightElbow => "right_elbow",
            Landmark::LeftWrist => "left_wrist",
            Landmark::RightWrist => "right_wrist",
            Landmark::LeftPinky => "left_pinky",
            Landmark::RightPinky => "right_pinky",
            Landmark::LeftIndex => "left_index",
            Landmark::RightIndex => "right_index",
            Landmark::LeftThumb => "left_thumb",
            Landmark::RightThumb => "right_thumb",
            Landmark::LeftHip => "left_hip",
            Landmark::RightHip => "right_hip",
            Landmark::LeftKnee => "left_knee",
            Landmark::RightKnee => "right_knee",
            Landmark::LeftAnkle => "left_ankle",
            Landmark::RightAnkle => "right_ankle",
            Landmark::LeftHeel => "left_heel",
            Landmark::RightHeel => "right_heel",
            Landmark::LeftFootIndex => "left_foot_index",
            Landmark::RightFootIndex => "right_foot_index",
        }
    }
}

/// One tracked landmark in normalized image coordinates.
///
/// `x` and `y` are in [0, 1] with `y` growing downwards; `z` is relative depth.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    pub id: u8,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
    #[serde(default = "full_visibility")]
    pub visibility: f64,
}

fn full_visibility() -> f64 {
    1.0
}

impl Keypoint {
    pub fn new(id: u8, x: f64, y: f64, z: f64, visibility: f64) -> Self {
        Self {
            id,
            x,
            y,
            z,
            visibility,
        }
    }

    pub fn of(landmark: Landmark, x: f64, y: f64, z: f64, visibility: f64) -> Self {
        Self::new(landmark as u8, x, y, z, visibility)
    }

    pub fn landmark(&self) -> Option<Landmark> {
        Landmark::from_index(self.id)
    }

    /// Semantic name of the landmark, `"unknown"` for ids outside the topology
    pub fn name(&self) -> &'static str {
        self.landmark().map(Landmark::name).unwrap_or("unknown")
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// All keypoints of one instant, ordered by landmark id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "FrameRecord")]
pub struct FrameSample {
    pub timestamp: Timestamp,
    keypoints: Vec<Keypoint>,
}

#[derive(Deserialize)]
struct FrameRecord {
    timestamp: Timestamp,
    keypoints: Vec<Keypoint>,
}

impl TryFrom<FrameRecord> for FrameSample {
    type Error = Error;

    fn try_from(record: FrameRecord) -> Result<Self> {
        FrameSample::new(record.timestamp, record.keypoints)
    }
}

impl FrameSample {
    /// Build a frame from exactly 33 keypoints carrying distinct ids 0..=32.
    pub fn new(timestamp: Timestamp, mut keypoints: Vec<Keypoint>) -> Result<Self> {
        if keypoints.len() != Landmark::COUNT {
            return Err(Error::InvalidFrame {
                expected: Landmark::COUNT,
                actual: keypoints.len(),
            });
        }

        keypoints.sort_by_key(|kp| kp.id);
        if let Some((idx, kp)) = keypoints
            .iter()
            .enumerate()
            .find(|(idx, kp)| kp.id as usize != *idx)
        {
            return Err(Error::InvalidInput(format!(
                "keypoint id {} found at position {}",
                kp.id, idx
            )));
        }

        Ok(Self {
            timestamp,
            keypoints,
        })
    }

    pub fn keypoint(&self, landmark: Landmark) -> &Keypoint {
        &self.keypoints[landmark.index()]
    }

    pub fn keypoints(&self) -> &[Keypoint] {
        &self.keypoints
    }

    pub fn is_visible(&self, landmark: Landmark, threshold: f64) -> bool {
        crate::geometry::is_visible(self.keypoint(landmark), threshold)
    }

    /// Keypoint with finite coordinates, or `MissingLandmark`
    pub fn require(&self, landmark: Landmark) -> Result<&Keypoint> {
        let kp = self.keypoint(landmark);
        if kp.is_finite() {
            Ok(kp)
        } else {
            Err(Error::MissingLandmark(landmark))
        }
    }

    /// Flatten into `[x, y, visibility]` per keypoint for sequence classifiers
    pub fn to_feature_vector(&self) -> Vec<f32> {
        self.keypoints
            .iter()
            .flat_map(|kp| [kp.x as f32, kp.y as f32, kp.visibility as f32])
            .collect()
    }
}

/// Supported exercise types, resolved once when a session starts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExerciseKind {
    Squat,
    PushUp,
}

impl ExerciseKind {
    /// Resolve a free-form exercise name ("Squats", "push-up", "pompes", ...)
    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.to_lowercase();
        if lower.contains("squat") {
            Some(ExerciseKind::Squat)
        } else if lower.contains("push") || lower.contains("pompe") {
            Some(ExerciseKind::PushUp)
        } else {
            None
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ExerciseKind::Squat => "squat",
            ExerciseKind::PushUp => "push-up",
        }
    }

    /// Approximate energy expenditure per repetition (kcal)
    pub fn calories_per_rep(&self) -> f64 {
        match self {
            ExerciseKind::Squat => 0.32,
            ExerciseKind::PushUp => 0.29,
        }
    }
}

impl fmt::Display for ExerciseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for ExerciseKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s).ok_or_else(|| Error::UnknownExercise(s.to_string()))
    }
}
