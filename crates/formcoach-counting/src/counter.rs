//! Closed dispatch over the per-exercise counters and their shared outputs.

use std::collections::BTreeMap;

use formcoach_core::{round_to, ExerciseKind, FrameSample};
use serde::{Deserialize, Serialize};

use crate::phase::Stage;
use crate::pushup::{PushUpCounter, PushUpMetrics, PushUpThresholds};
use crate::squat::{SquatCounter, SquatMetrics, SquatThresholds};
use crate::visibility::{VisibilityHint, DEFAULT_VISIBILITY_THRESHOLD};

/// Snapshot of the measured angles of one frame or one completed rep
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "exercise", rename_all = "kebab-case")]
pub enum RepMetrics {
    Squat(SquatMetrics),
    PushUp(PushUpMetrics),
}

impl RepMetrics {
    pub fn is_valid(&self) -> bool {
        match self {
            RepMetrics::Squat(m) => m.is_valid,
            RepMetrics::PushUp(m) => m.is_valid,
        }
    }

    pub fn note(&self) -> &str {
        match self {
            RepMetrics::Squat(m) => &m.note,
            RepMetrics::PushUp(m) => &m.note,
        }
    }

    /// Knee angle for squats, elbow angle for push-ups
    pub fn primary_angle(&self) -> f64 {
        match self {
            RepMetrics::Squat(m) => m.knee_angle,
            RepMetrics::PushUp(m) => m.elbow_angle,
        }
    }

    /// Named angles, as stored with a session repetition
    pub fn angles(&self) -> BTreeMap<String, f64> {
        let mut angles = BTreeMap::new();
        match self {
            RepMetrics::Squat(m) => {
                angles.insert("knee".to_string(), m.knee_angle);
                angles.insert("hip".to_string(), m.hip_angle);
            }
            RepMetrics::PushUp(m) => {
                angles.insert("elbow".to_string(), m.elbow_angle);
            }
        }
        angles
    }
}

/// Outcome of feeding one frame to a counter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CounterUpdate {
    pub count: u32,
    pub phase: Option<Stage>,
    pub phase_name: String,
    /// `None` when the frame was rejected by the visibility gate
    pub metrics: Option<RepMetrics>,
    pub feedback: String,
    pub rep_completed: bool,
    pub hint: Option<VisibilityHint>,
}

impl CounterUpdate {
    pub(crate) fn rejected(
        count: u32,
        phase: Option<Stage>,
        phase_name: &str,
        hint: VisibilityHint,
    ) -> Self {
        Self {
            count,
            phase,
            phase_name: phase_name.to_string(),
            metrics: None,
            feedback: hint.message().to_string(),
            rep_completed: false,
            hint: Some(hint),
        }
    }

    pub fn is_visible(&self) -> bool {
        self.hint.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepStats {
    pub total_reps: u32,
    pub valid_reps: u32,
    /// Percentage of valid reps, 0 when nothing was counted
    pub success_rate: f64,
    /// Squats only
    pub average_depth: Option<f64>,
}

impl RepStats {
    pub(crate) fn new(total_reps: u32, valid_reps: u32, average_depth: Option<f64>) -> Self {
        let success_rate = if total_reps > 0 {
            round_to(valid_reps as f64 / total_reps as f64 * 100.0, 1)
        } else {
            0.0
        };
        Self {
            total_reps,
            valid_reps,
            success_rate,
            average_depth,
        }
    }
}

/// Phase-driven coaching line, independent of posture scoring
pub(crate) fn stage_feedback(
    stage: Stage,
    angle: f64,
    min_angle: f64,
    is_valid: bool,
    ascending: &'static str,
) -> &'static str {
    match stage {
        Stage::Top => "Ready for the next rep",
        Stage::Descending if angle > min_angle + 20.0 => "Keep going down",
        Stage::Descending => "Good descent",
        Stage::Bottom if is_valid => "Perfect! Now rise",
        Stage::Bottom if angle > min_angle => "Go a bit lower",
        Stage::Bottom => "Rise now",
        Stage::Ascending => ascending,
    }
}

/// Counting parameters for every supported exercise
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CounterSettings {
    pub visibility_threshold: f64,
    pub squat: SquatThresholds,
    pub push_up: PushUpThresholds,
}

impl Default for CounterSettings {
    fn default() -> Self {
        Self {
            visibility_threshold: DEFAULT_VISIBILITY_THRESHOLD,
            squat: SquatThresholds::default(),
            push_up: PushUpThresholds::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum RepCounter {
    Squat(SquatCounter),
    PushUp(PushUpCounter),
}

impl RepCounter {
    pub fn new(kind: ExerciseKind, settings: &CounterSettings) -> Self {
        match kind {
            ExerciseKind::Squat => {
                RepCounter::Squat(SquatCounter::new(settings.squat, settings.visibility_threshold))
            }
            ExerciseKind::PushUp => RepCounter::PushUp(PushUpCounter::new(
                settings.push_up,
                settings.visibility_threshold,
            )),
        }
    }

    pub fn kind(&self) -> ExerciseKind {
        match self {
            RepCounter::Squat(_) => ExerciseKind::Squat,
            RepCounter::PushUp(_) => ExerciseKind::PushUp,
        }
    }

    pub fn update(&mut self, frame: &FrameSample) -> CounterUpdate {
        match self {
            RepCounter::Squat(c) => c.update(frame),
            RepCounter::PushUp(c) => c.update(frame),
        }
    }

    pub fn count(&self) -> u32 {
        match self {
            RepCounter::Squat(c) => c.count(),
            RepCounter::PushUp(c) => c.count(),
        }
    }

    pub fn phase_name(&self) -> &'static str {
        match self {
            RepCounter::Squat(c) => c.phase_name(),
            RepCounter::PushUp(c) => c.phase_name(),
        }
    }

    /// Metrics of every counted rep, oldest first
    pub fn reps(&self) -> Vec<RepMetrics> {
        match self {
            RepCounter::Squat(c) => c.reps().iter().cloned().map(RepMetrics::Squat).collect(),
            RepCounter::PushUp(c) => c.reps().iter().cloned().map(RepMetrics::PushUp).collect(),
        }
    }

    pub fn last_rep(&self) -> Option<RepMetrics> {
        match self {
            RepCounter::Squat(c) => c.reps().last().cloned().map(RepMetrics::Squat),
            RepCounter::PushUp(c) => c.reps().last().cloned().map(RepMetrics::PushUp),
        }
    }

    pub fn get_stats(&self) -> RepStats {
        match self {
            RepCounter::Squat(c) => c.get_stats(),
            RepCounter::PushUp(c) => c.get_stats(),
        }
    }

    pub fn reset(&mut self) {
        match self {
            RepCounter::Squat(c) => c.reset(),
            RepCounter::PushUp(c) => c.reset(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::visibility::tests::{pushup_frame, squat_frame};

    #[test]
    fn test_dispatch_by_kind() {
        let settings = CounterSettings::default();
        let counter = RepCounter::new(ExerciseKind::Squat, &settings);
        assert_eq!(counter.kind(), ExerciseKind::Squat);
        assert_eq!(counter.phase_name(), "initializing");

        let counter = RepCounter::new(ExerciseKind::PushUp, &settings);
        assert_eq!(counter.kind(), ExerciseKind::PushUp);
    }

    #[test]
    fn test_rep_metrics_through_dispatch() {
        let mut counter = RepCounter::new(ExerciseKind::PushUp, &CounterSettings::default());
        for (i, angle) in [160.0, 90.0, 160.0].iter().enumerate() {
            counter.update(&pushup_frame(*angle, i as f64));
        }
        assert_eq!(counter.count(), 1);
        let rep = counter.last_rep().unwrap();
        assert!(rep.is_valid());
        assert!(rep.angles().contains_key("elbow"));
        assert_eq!(counter.reps().len(), 1);
    }

    #[test]
    fn test_update_carries_metrics() {
        let mut counter = RepCounter::new(ExerciseKind::Squat, &CounterSettings::default());
        let update = counter.update(&squat_frame(120.0, 0.0));
        assert!(update.is_visible());
        assert_eq!(update.phase_name, "bottom");
        let metrics = update.metrics.unwrap();
        assert_eq!(metrics.angles().len(), 2);
        assert_eq!(metrics.note(), "Good depth!");
    }

    #[test]
    fn test_reset_through_dispatch() {
        let mut counter = RepCounter::new(ExerciseKind::Squat, &CounterSettings::default());
        for (i, angle) in [175.0, 100.0, 176.0].iter().enumerate() {
            counter.update(&squat_frame(*angle, i as f64));
        }
        assert_eq!(counter.count(), 1);
        counter.reset();
        assert_eq!(counter.count(), 0);
        assert_eq!(counter.phase_name(), "standing");
        assert!(counter.reps().is_empty());
    }

    #[test]
    fn test_stage_feedback_table() {
        assert_eq!(stage_feedback(Stage::Descending, 190.0, 165.0, false, ""), "Keep going down");
        assert_eq!(stage_feedback(Stage::Descending, 170.0, 165.0, false, ""), "Good descent");
        assert_eq!(stage_feedback(Stage::Bottom, 167.0, 165.0, false, ""), "Go a bit lower");
        assert_eq!(stage_feedback(Stage::Ascending, 150.0, 100.0, true, "Good push!"), "Good push!");
    }
}
