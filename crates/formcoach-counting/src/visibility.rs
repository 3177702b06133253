//! Per-exercise visibility gating and body-side selection.
//!
//! A frame is only measured when at least one complete side of the body is
//! visible. When both sides are usable (frontal view) the angles of the two
//! sides are averaged; otherwise the usable profile side is used alone.

use formcoach_core::{elbow_angle, hip_angle, knee_angle, ExerciseKind, FrameSample, Landmark};
use serde::{Deserialize, Serialize};

/// Default minimum keypoint visibility
pub const DEFAULT_VISIBILITY_THRESHOLD: f64 = 0.5;

/// Required hip-y minus shoulder-y for a squat frame to count as upright
pub const MIN_UPRIGHT_MARGIN: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodySide {
    Left,
    Right,
    Both,
}

/// Why a frame was rejected, phrased as an instruction to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisibilityHint {
    /// Hips are visible but no ankle is
    StepBackShowFeet,
    /// Hips are visible but no shoulder is
    StepBackShowHead,
    /// Hips are visible but no wrist is
    StepBackShowHands,
    /// Nothing usable for a squat
    GetInFrame,
    /// Nothing usable for a push-up
    TurnToProfile,
    /// Shoulders are not above the hips during squats
    StandUp,
    /// The pose stage reported no subject at all
    NoPersonDetected,
}

impl VisibilityHint {
    pub fn message(&self) -> &'static str {
        match self {
            VisibilityHint::StepBackShowFeet => "Step back so your feet are visible",
            VisibilityHint::StepBackShowHead => "Step back so your head is visible",
            VisibilityHint::StepBackShowHands => "Step back so your hands are visible",
            VisibilityHint::GetInFrame => "Position yourself so your whole body is visible",
            VisibilityHint::TurnToProfile => "Turn sideways or face the camera",
            VisibilityHint::StandUp => "Stand up for squats",
            VisibilityHint::NoPersonDetected => "No person detected",
        }
    }
}

/// Angles measured on the selected side(s) of an accepted frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JointAngles {
    pub side: BodySide,
    /// Knee angle for squats, elbow angle for push-ups
    pub primary: f64,
    /// Hip angle for squats
    pub secondary: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VisibilityOutcome {
    Rejected(VisibilityHint),
    Accepted(JointAngles),
}

impl VisibilityOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, VisibilityOutcome::Accepted(_))
    }
}

struct SideGroup {
    shoulder: Landmark,
    elbow: Landmark,
    wrist: Landmark,
    hip: Landmark,
    knee: Landmark,
    ankle: Landmark,
}

const LEFT: SideGroup = SideGroup {
    shoulder: Landmark::LeftShoulder,
    elbow: Landmark::LeftElbow,
    wrist: Landmark::LeftWrist,
    hip: Landmark::LeftHip,
    knee: Landmark::LeftKnee,
    ankle: Landmark::LeftAnkle,
};

const RIGHT: SideGroup = SideGroup {
    shoulder: Landmark::RightShoulder,
    elbow: Landmark::RightElbow,
    wrist: Landmark::RightWrist,
    hip: Landmark::RightHip,
    knee: Landmark::RightKnee,
    ankle: Landmark::RightAnkle,
};

impl SideGroup {
    fn required(&self, kind: ExerciseKind) -> [Landmark; 4] {
        match kind {
            ExerciseKind::Squat => [self.hip, self.knee, self.ankle, self.shoulder],
            ExerciseKind::PushUp => [self.shoulder, self.elbow, self.wrist, self.hip],
        }
    }

    fn primary(&self, kind: ExerciseKind, frame: &FrameSample) -> f64 {
        match kind {
            ExerciseKind::Squat => knee_angle(
                frame.keypoint(self.hip),
                frame.keypoint(self.knee),
                frame.keypoint(self.ankle),
            ),
            ExerciseKind::PushUp => elbow_angle(
                frame.keypoint(self.shoulder),
                frame.keypoint(self.elbow),
                frame.keypoint(self.wrist),
            ),
        }
    }

    fn secondary(&self, kind: ExerciseKind, frame: &FrameSample) -> Option<f64> {
        match kind {
            ExerciseKind::Squat => Some(hip_angle(
                frame.keypoint(self.shoulder),
                frame.keypoint(self.hip),
                frame.keypoint(self.knee),
            )),
            ExerciseKind::PushUp => None,
        }
    }
}

fn side_group(side: BodySide) -> &'static SideGroup {
    match side {
        BodySide::Right => &RIGHT,
        BodySide::Left | BodySide::Both => &LEFT,
    }
}

/// Shoulder and hip landmarks of the side(s) in use
pub fn side_landmarks(side: BodySide) -> Vec<(Landmark, Landmark)> {
    match side {
        BodySide::Left => vec![(LEFT.shoulder, LEFT.hip)],
        BodySide::Right => vec![(RIGHT.shoulder, RIGHT.hip)],
        BodySide::Both => vec![(LEFT.shoulder, LEFT.hip), (RIGHT.shoulder, RIGHT.hip)],
    }
}

/// Visibility rule for one exercise
#[derive(Debug, Clone)]
pub struct VisibilityGate {
    kind: ExerciseKind,
    threshold: f64,
}

impl VisibilityGate {
    pub fn new(kind: ExerciseKind, threshold: f64) -> Self {
        Self { kind, threshold }
    }

    pub fn for_exercise(kind: ExerciseKind) -> Self {
        Self::new(kind, DEFAULT_VISIBILITY_THRESHOLD)
    }

    pub fn kind(&self) -> ExerciseKind {
        self.kind
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    fn side_usable(&self, group: &SideGroup, frame: &FrameSample) -> bool {
        group
            .required(self.kind)
            .iter()
            .all(|&lm| frame.is_visible(lm, self.threshold) && frame.keypoint(lm).is_finite())
    }

    fn any_visible(&self, frame: &FrameSample, left: Landmark, right: Landmark) -> bool {
        frame.is_visible(left, self.threshold) || frame.is_visible(right, self.threshold)
    }

    fn diagnose(&self, frame: &FrameSample) -> VisibilityHint {
        let hips = self.any_visible(frame, LEFT.hip, RIGHT.hip);
        match self.kind {
            ExerciseKind::Squat => {
                if hips && !self.any_visible(frame, LEFT.ankle, RIGHT.ankle) {
                    VisibilityHint::StepBackShowFeet
                } else if hips && !self.any_visible(frame, LEFT.shoulder, RIGHT.shoulder) {
                    VisibilityHint::StepBackShowHead
                } else {
                    VisibilityHint::GetInFrame
                }
            }
            ExerciseKind::PushUp => {
                if hips && !self.any_visible(frame, LEFT.wrist, RIGHT.wrist) {
                    VisibilityHint::StepBackShowHands
                } else {
                    VisibilityHint::TurnToProfile
                }
            }
        }
    }

    fn is_upright(&self, frame: &FrameSample, side: BodySide) -> bool {
        let pairs = side_landmarks(side);
        let n = pairs.len() as f64;
        let shoulder_y = pairs.iter().map(|(s, _)| frame.keypoint(*s).y).sum::<f64>() / n;
        let hip_y = pairs.iter().map(|(_, h)| frame.keypoint(*h).y).sum::<f64>() / n;
        hip_y - shoulder_y > MIN_UPRIGHT_MARGIN
    }

    /// Decide whether the frame can be measured and on which side
    pub fn evaluate(&self, frame: &FrameSample) -> VisibilityOutcome {
        let left = self.side_usable(&LEFT, frame);
        let right = self.side_usable(&RIGHT, frame);

        let side = match (left, right) {
            (false, false) => return VisibilityOutcome::Rejected(self.diagnose(frame)),
            (true, true) => BodySide::Both,
            (true, false) => BodySide::Left,
            (false, true) => BodySide::Right,
        };

        if self.kind == ExerciseKind::Squat && !self.is_upright(frame, side) {
            return VisibilityOutcome::Rejected(VisibilityHint::StandUp);
        }

        VisibilityOutcome::Accepted(self.measure(frame, side))
    }

    fn measure(&self, frame: &FrameSample, side: BodySide) -> JointAngles {
        match side {
            BodySide::Both => {
                let primary = (LEFT.primary(self.kind, frame) + RIGHT.primary(self.kind, frame)) / 2.0;
                let secondary = match (
                    LEFT.secondary(self.kind, frame),
                    RIGHT.secondary(self.kind, frame),
                ) {
                    (Some(l), Some(r)) => Some((l + r) / 2.0),
                    _ => None,
                };
                JointAngles {
                    side,
                    primary,
                    secondary,
                }
            }
            BodySide::Left | BodySide::Right => {
                let group = side_group(side);
                JointAngles {
                    side,
                    primary: group.primary(self.kind, frame),
                    secondary: group.secondary(self.kind, frame),
                }
            }
        }
    }
}
