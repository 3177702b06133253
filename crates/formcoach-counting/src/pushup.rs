//! Push-up repetition counter.

use formcoach_core::{vertical_distance, ExerciseKind, FrameSample, Timestamp};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::counter::{stage_feedback, CounterUpdate, RepMetrics, RepStats};
use crate::phase::{ExercisePhase, PhaseMachine, PhaseThresholds, PushUpPhase, INITIALIZING};
use crate::visibility::{side_landmarks, BodySide, VisibilityGate, VisibilityOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PushUpThresholds {
    pub min_elbow_angle: f64,
    pub max_elbow_angle: f64,
    pub min_time_between_reps: f64,
    pub transition_margin: f64,
    pub rise_margin: f64,
}

impl Default for PushUpThresholds {
    fn default() -> Self {
        Self {
            min_elbow_angle: 100.0,
            max_elbow_angle: 160.0,
            min_time_between_reps: 0.3,
            transition_margin: 10.0,
            rise_margin: 5.0,
        }
    }
}

impl PushUpThresholds {
    fn phase_thresholds(&self) -> PhaseThresholds {
        PhaseThresholds {
            min_angle: self.min_elbow_angle,
            max_angle: self.max_elbow_angle,
            transition_margin: self.transition_margin,
            rise_margin: self.rise_margin,
            min_time_between_reps: self.min_time_between_reps,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushUpMetrics {
    pub elbow_angle: f64,
    /// Vertical shoulder to hip distance, normalized
    pub body_height: f64,
    pub is_valid: bool,
    pub note: String,
}

impl PushUpMetrics {
    pub fn measure(elbow_angle: f64, body_height: f64, t: &PushUpThresholds) -> Self {
        let is_valid = elbow_angle <= t.min_elbow_angle;
        let note = if elbow_angle > t.min_elbow_angle + 20.0 {
            "Go lower"
        } else if is_valid {
            "Good depth!"
        } else {
            ""
        };
        Self {
            elbow_angle,
            body_height,
            is_valid,
            note: note.to_string(),
        }
    }
}

fn body_height(frame: &FrameSample, side: BodySide) -> f64 {
    let pairs = side_landmarks(side);
    pairs
        .iter()
        .map(|(s, h)| vertical_distance(frame.keypoint(*s), frame.keypoint(*h)))
        .sum::<f64>()
        / pairs.len() as f64
}

#[derive(Debug, Clone)]
pub struct PushUpCounter {
    thresholds: PushUpThresholds,
    gate: VisibilityGate,
    machine: PhaseMachine,
    count: u32,
    reps: Vec<PushUpMetrics>,
    deepest: Option<PushUpMetrics>,
}

impl PushUpCounter {
    pub fn new(thresholds: PushUpThresholds, visibility_threshold: f64) -> Self {
        Self {
            thresholds,
            gate: VisibilityGate::new(ExerciseKind::PushUp, visibility_threshold),
            machine: PhaseMachine::new(thresholds.phase_thresholds()),
            count: 0,
            reps: Vec::new(),
            deepest: None,
        }
    }

    pub fn thresholds(&self) -> &PushUpThresholds {
        &self.thresholds
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn phase(&self) -> Option<PushUpPhase> {
        self.machine.stage().map(PushUpPhase::from_stage)
    }

    pub fn phase_name(&self) -> &'static str {
        self.phase().map(|p| p.name()).unwrap_or(INITIALIZING)
    }

    pub fn reps(&self) -> &[PushUpMetrics] {
        &self.reps
    }

    pub fn update(&mut self, frame: &FrameSample) -> CounterUpdate {
        match self.gate.evaluate(frame) {
            VisibilityOutcome::Rejected(hint) => {
                CounterUpdate::rejected(self.count, self.machine.stage(), self.phase_name(), hint)
            }
            VisibilityOutcome::Accepted(angles) => {
                let height = body_height(frame, angles.side);
                self.update_angles(angles.primary, height, frame.timestamp)
            }
        }
    }

    pub fn update_angles(&mut self, elbow_angle: f64, body_height: f64, now: Timestamp) -> CounterUpdate {
        let metrics = PushUpMetrics::measure(elbow_angle, body_height, &self.thresholds);
        if self
            .deepest
            .as_ref()
            .map_or(true, |d| metrics.elbow_angle < d.elbow_angle)
        {
            self.deepest = Some(metrics.clone());
        }

        let step = self.machine.advance(elbow_angle, now);
        if step.completed {
            self.count += 1;
            let rep = self.deepest.take().unwrap_or_else(|| metrics.clone());
            info!(
                count = self.count,
                elbow_angle = rep.elbow_angle,
                valid = rep.is_valid,
                "Push-up counted"
            );
            self.reps.push(rep);
        } else if step.suppressed {
            debug!(elbow_angle, "Push-up completion inside debounce window ignored");
            self.deepest = None;
        }

        let feedback = stage_feedback(
            step.stage,
            elbow_angle,
            self.thresholds.min_elbow_angle,
            metrics.is_valid,
            "Good push!",
        );

        CounterUpdate {
            count: self.count,
            phase: Some(step.stage),
            phase_name: PushUpPhase::from_stage(step.stage).name().to_string(),
            metrics: Some(RepMetrics::PushUp(metrics)),
            feedback: feedback.to_string(),
            rep_completed: step.completed,
            hint: None,
        }
    }

    pub fn get_stats(&self) -> RepStats {
        let valid = self.reps.iter().filter(|r| r.is_valid).count() as u32;
        RepStats::new(self.count, valid, None)
    }

    pub fn reset(&mut self) {
        self.count = 0;
        self.reps.clear();
        self.deepest = None;
        self.machine.reset_to_top();
        info!("Push-up counter reset");
    }
}

impl Default for PushUpCounter {
    fn default() -> Self {
        Self::new(
            PushUpThresholds::default(),
            crate::visibility::DEFAULT_VISIBILITY_THRESHOLD,
        )
    }
}
