//! Squat repetition counter.

use formcoach_core::{round_to, ExerciseKind, FrameSample, Timestamp};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::counter::{stage_feedback, CounterUpdate, RepMetrics, RepStats};
use crate::phase::{ExercisePhase, PhaseMachine, PhaseThresholds, SquatPhase, INITIALIZING};
use crate::visibility::{VisibilityGate, VisibilityOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SquatThresholds {
    pub min_knee_angle: f64,
    pub max_knee_angle: f64,
    pub min_hip_angle: f64,
    pub min_time_between_reps: f64,
    pub transition_margin: f64,
    pub rise_margin: f64,
}

impl Default for SquatThresholds {
    fn default() -> Self {
        Self {
            min_knee_angle: 165.0,
            max_knee_angle: 175.0,
            min_hip_angle: 160.0,
            min_time_between_reps: 0.5,
            transition_margin: 10.0,
            rise_margin: 5.0,
        }
    }
}

impl SquatThresholds {
    fn phase_thresholds(&self) -> PhaseThresholds {
        PhaseThresholds {
            min_angle: self.min_knee_angle,
            max_angle: self.max_knee_angle,
            transition_margin: self.transition_margin,
            rise_margin: self.rise_margin,
            min_time_between_reps: self.min_time_between_reps,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SquatMetrics {
    pub knee_angle: f64,
    pub hip_angle: f64,
    /// 0 at full extension, 1 at or below the bottom threshold
    pub depth_score: f64,
    pub is_valid: bool,
    pub note: String,
}

impl SquatMetrics {
    pub fn measure(knee_angle: f64, hip_angle: f64, t: &SquatThresholds) -> Self {
        let span = t.max_knee_angle - t.min_knee_angle;
        let depth_score = if span > 0.0 {
            ((t.max_knee_angle - knee_angle) / span).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let is_valid = knee_angle <= t.min_knee_angle && hip_angle <= t.min_hip_angle + 20.0;

        let note = if knee_angle > t.min_knee_angle + 20.0 {
            "Go lower"
        } else if hip_angle > t.min_hip_angle + 30.0 {
            "Lean forward a bit more"
        } else if is_valid {
            "Good depth!"
        } else {
            ""
        };

        Self {
            knee_angle,
            hip_angle,
            depth_score,
            is_valid,
            note: note.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SquatCounter {
    thresholds: SquatThresholds,
    gate: VisibilityGate,
    machine: PhaseMachine,
    count: u32,
    reps: Vec<SquatMetrics>,
    deepest: Option<SquatMetrics>,
}

impl SquatCounter {
    pub fn new(thresholds: SquatThresholds, visibility_threshold: f64) -> Self {
        Self {
            thresholds,
            gate: VisibilityGate::new(ExerciseKind::Squat, visibility_threshold),
            machine: PhaseMachine::new(thresholds.phase_thresholds()),
            count: 0,
            reps: Vec::new(),
            deepest: None,
        }
    }

    pub fn thresholds(&self) -> &SquatThresholds {
        &self.thresholds
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn phase(&self) -> Option<SquatPhase> {
        self.machine.stage().map(SquatPhase::from_stage)
    }

    pub fn phase_name(&self) -> &'static str {
        self.phase().map(|p| p.name()).unwrap_or(INITIALIZING)
    }

    pub fn reps(&self) -> &[SquatMetrics] {
        &self.reps
    }

    pub fn update(&mut self, frame: &FrameSample) -> CounterUpdate {
        match self.gate.evaluate(frame) {
            VisibilityOutcome::Rejected(hint) => {
                CounterUpdate::rejected(self.count, self.machine.stage(), self.phase_name(), hint)
            }
            VisibilityOutcome::Accepted(angles) => {
                let hip = angles.secondary.unwrap_or(self.thresholds.max_knee_angle);
                self.update_angles(angles.primary, hip, frame.timestamp)
            }
        }
    }

    /// Advance with already measured angles
    pub fn update_angles(&mut self, knee_angle: f64, hip_angle: f64, now: Timestamp) -> CounterUpdate {
        let metrics = SquatMetrics::measure(knee_angle, hip_angle, &self.thresholds);
        if self
            .deepest
            .as_ref()
            .map_or(true, |d| metrics.knee_angle < d.knee_angle)
        {
            self.deepest = Some(metrics.clone());
        }

        let step = self.machine.advance(knee_angle, now);
        if step.completed {
            self.count += 1;
            let rep = self.deepest.take().unwrap_or_else(|| metrics.clone());
            info!(
                count = self.count,
                knee_angle = rep.knee_angle,
                valid = rep.is_valid,
                "Squat counted"
            );
            self.reps.push(rep);
        } else if step.suppressed {
            debug!(knee_angle, "Squat completion inside debounce window ignored");
            self.deepest = None;
        }

        let feedback = stage_feedback(
            step.stage,
            knee_angle,
            self.thresholds.min_knee_angle,
            metrics.is_valid,
            "Good ascent!",
        );

        CounterUpdate {
            count: self.count,
            phase: Some(step.stage),
            phase_name: SquatPhase::from_stage(step.stage).name().to_string(),
            metrics: Some(RepMetrics::Squat(metrics)),
            feedback: feedback.to_string(),
            rep_completed: step.completed,
            hint: None,
        }
    }

    /// Mean depth score of the recorded reps
    pub fn get_average_depth(&self) -> f64 {
        if self.reps.is_empty() {
            return 0.0;
        }
        self.reps.iter().map(|r| r.depth_score).sum::<f64>() / self.reps.len() as f64
    }

    pub fn get_stats(&self) -> RepStats {
        let valid = self.reps.iter().filter(|r| r.is_valid).count() as u32;
        RepStats::new(self.count, valid, Some(round_to(self.get_average_depth(), 2)))
    }

    pub fn reset(&mut self) {
        self.count = 0;
        self.reps.clear();
        self.deepest = None;
        self.machine.reset_to_top();
        info!("Squat counter reset");
    }
}

impl Default for SquatCounter {
    fn default() -> Self {
        Self::new(
            SquatThresholds::default(),
            crate::visibility::DEFAULT_VISIBILITY_THRESHOLD,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::visibility::tests::squat_frame;
    use crate::visibility::VisibilityHint;
    use formcoach_core::{Keypoint, Landmark};

    fn feed(counter: &mut SquatCounter, angles: &[f64], start: f64, step: f64) {
        for (i, angle) in angles.iter().enumerate() {
            counter.update(&squat_frame(*angle, start + i as f64 * step));
        }
    }

    #[test]
    fn test_single_rep_scenario() {
        let mut counter = SquatCounter::default();
        feed(
            &mut counter,
            &[175.0, 170.0, 150.0, 120.0, 90.0, 160.0, 175.0],
            0.0,
            0.5,
        );
        assert_eq!(counter.count(), 1);
        assert_eq!(counter.phase(), Some(SquatPhase::Standing));
        assert_eq!(counter.reps().len(), 1);
    }

    #[test]
    fn test_bounce_is_not_double_counted() {
        let mut counter = SquatCounter::default();
        let sequence = [175.0, 170.0, 150.0, 120.0, 90.0, 160.0, 175.0];
        feed(&mut counter, &sequence, 0.0, 0.5);
        let end = 6.0 * 0.5;
        feed(&mut counter, &sequence, end + 0.02, 0.04);
        assert_eq!(counter.count(), 1);
    }

    #[test]
    fn test_recorded_rep_keeps_deepest_point() {
        let mut counter = SquatCounter::default();
        feed(&mut counter, &[175.0, 140.0, 95.0, 150.0, 176.0], 0.0, 0.5);
        assert_eq!(counter.count(), 1);
        let rep = &counter.reps()[0];
        assert!((rep.knee_angle - 95.0).abs() < 0.5);
        assert!((rep.depth_score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_rejected_frame_is_noop() {
        let mut counter = SquatCounter::default();
        counter.update(&squat_frame(175.0, 0.0));
        let mut kps = squat_frame(120.0, 0.5).keypoints().to_vec();
        for lm in [Landmark::LeftAnkle, Landmark::RightAnkle] {
            kps[lm.index()] = Keypoint::of(lm, 0.5, 0.9, 0.0, 0.1);
        }
        let frame = FrameSample::new(Timestamp::from_secs_f64(0.5), kps).unwrap();
        let update = counter.update(&frame);
        assert!(update.metrics.is_none());
        assert_eq!(update.hint, Some(VisibilityHint::StepBackShowFeet));
        assert_eq!(update.feedback, VisibilityHint::StepBackShowFeet.message());
        assert_eq!(counter.phase(), Some(SquatPhase::Standing));
    }

    #[test]
    fn test_phase_feedback() {
        let mut counter = SquatCounter::default();
        let update = counter.update_angles(175.0, 178.0, Timestamp::from_secs_f64(0.0));
        assert_eq!(update.feedback, "Ready for the next rep");
        let update = counter.update_angles(120.0, 150.0, Timestamp::from_secs_f64(0.5));
        assert_eq!(update.phase_name, "bottom");
        assert_eq!(update.feedback, "Perfect! Now rise");
        let update = counter.update_angles(120.0, 185.0, Timestamp::from_secs_f64(1.0));
        assert_eq!(update.feedback, "Rise now");
    }

    #[test]
    fn test_metrics_validity_and_notes() {
        let t = SquatThresholds::default();
        let deep = SquatMetrics::measure(100.0, 150.0, &t);
        assert!(deep.is_valid);
        assert_eq!(deep.note, "Good depth!");

        let upright = SquatMetrics::measure(165.0, 195.0, &t);
        assert!(!upright.is_valid);
        assert_eq!(upright.note, "Lean forward a bit more");

        let shallow = SquatMetrics::measure(188.0, 150.0, &t);
        assert_eq!(shallow.note, "Go lower");
        assert_eq!(shallow.depth_score, 0.0);
    }

    #[test]
    fn test_stats_and_reset() {
        let mut counter = SquatCounter::default();
        let mut t = 0.0;
        for hip in [150.0, 190.0] {
            for knee in [175.0, 100.0, 176.0] {
                counter.update_angles(knee, hip, Timestamp::from_secs_f64(t));
                t += 0.6;
            }
        }
        let stats = counter.get_stats();
        assert_eq!(stats.total_reps, 2);
        assert_eq!(stats.valid_reps, 1);
        assert_eq!(stats.success_rate, 50.0);
        assert_eq!(stats.average_depth, Some(1.0));

        counter.reset();
        assert_eq!(counter.count(), 0);
        assert_eq!(counter.phase(), Some(SquatPhase::Standing));
        assert_eq!(counter.get_stats().success_rate, 0.0);
    }
}
