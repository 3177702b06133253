//! Four-stage rep cycle with hysteresis and debounce.
//!
//! Both counters drive the same machine; only the thresholds and the phase
//! names differ. Transitions cascade inside a single update until the stage
//! is stable, so a frame that jumps straight from the bottom back to the top
//! still completes the cycle.

use formcoach_core::Timestamp;
use serde::{Deserialize, Serialize};

/// Exercise-agnostic position inside a rep cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Top,
    Descending,
    Bottom,
    Ascending,
}

/// Exercise-specific naming of a [`Stage`]
pub trait ExercisePhase: Copy + Eq + std::fmt::Debug {
    fn from_stage(stage: Stage) -> Self;
    fn stage(&self) -> Stage;
    fn name(&self) -> &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SquatPhase {
    Standing,
    Descending,
    Bottom,
    Ascending,
}

impl ExercisePhase for SquatPhase {
    fn from_stage(stage: Stage) -> Self {
        match stage {
            Stage::Top => SquatPhase::Standing,
            Stage::Descending => SquatPhase::Descending,
            Stage::Bottom => SquatPhase::Bottom,
            Stage::Ascending => SquatPhase::Ascending,
        }
    }

    fn stage(&self) -> Stage {
        match self {
            SquatPhase::Standing => Stage::Top,
            SquatPhase::Descending => Stage::Descending,
            SquatPhase::Bottom => Stage::Bottom,
            SquatPhase::Ascending => Stage::Ascending,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            SquatPhase::Standing => "standing",
            SquatPhase::Descending => "descending",
            SquatPhase::Bottom => "bottom",
            SquatPhase::Ascending => "ascending",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PushUpPhase {
    Up,
    Descending,
    Down,
    Ascending,
}

impl ExercisePhase for PushUpPhase {
    fn from_stage(stage: Stage) -> Self {
        match stage {
            Stage::Top => PushUpPhase::Up,
            Stage::Descending => PushUpPhase::Descending,
            Stage::Bottom => PushUpPhase::Down,
            Stage::Ascending => PushUpPhase::Ascending,
        }
    }

    fn stage(&self) -> Stage {
        match self {
            PushUpPhase::Up => Stage::Top,
            PushUpPhase::Descending => Stage::Descending,
            PushUpPhase::Down => Stage::Bottom,
            PushUpPhase::Ascending => Stage::Ascending,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            PushUpPhase::Up => "up",
            PushUpPhase::Descending => "descending",
            PushUpPhase::Down => "down",
            PushUpPhase::Ascending => "ascending",
        }
    }
}

/// Name reported before the first accepted frame
pub const INITIALIZING: &str = "initializing";

/// Angle thresholds of one exercise, in degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseThresholds {
    /// Bottom of the movement
    pub min_angle: f64,
    /// Fully extended position
    pub max_angle: f64,
    /// Hysteresis band below `max_angle` and above `min_angle`
    pub transition_margin: f64,
    /// Rise above `min_angle` required to leave the bottom
    pub rise_margin: f64,
    /// Minimum seconds between two counted reps
    pub min_time_between_reps: f64,
}

/// Result of feeding one angle into the machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseStep {
    pub stage: Stage,
    /// A full cycle closed and was counted
    pub completed: bool,
    /// A full cycle closed but fell inside the debounce window
    pub suppressed: bool,
}

/// Upper bound on cascaded transitions per update; the cycle has four edges
const MAX_CASCADE: usize = 4;

#[derive(Debug, Clone)]
pub struct PhaseMachine {
    thresholds: PhaseThresholds,
    stage: Option<Stage>,
    last_rep_at: Option<Timestamp>,
}

impl PhaseMachine {
    pub fn new(thresholds: PhaseThresholds) -> Self {
        Self {
            thresholds,
            stage: None,
            last_rep_at: None,
        }
    }

    pub fn thresholds(&self) -> &PhaseThresholds {
        &self.thresholds
    }

    /// Current stage, `None` until the first angle is seen
    pub fn stage(&self) -> Option<Stage> {
        self.stage
    }

    pub fn last_rep_at(&self) -> Option<Timestamp> {
        self.last_rep_at
    }

    /// Forget the stage and the debounce clock
    pub fn reset(&mut self) {
        self.stage = None;
        self.last_rep_at = None;
    }

    /// Put the machine back at the top of the cycle
    pub fn reset_to_top(&mut self) {
        self.stage = Some(Stage::Top);
        self.last_rep_at = None;
    }

    fn initial_stage(&self, angle: f64) -> Stage {
        let t = &self.thresholds;
        if angle >= t.max_angle - t.transition_margin {
            Stage::Top
        } else if angle <= t.min_angle + t.transition_margin {
            Stage::Bottom
        } else {
            Stage::Descending
        }
    }

    fn next(&self, stage: Stage, angle: f64) -> Option<Stage> {
        let t = &self.thresholds;
        match stage {
            Stage::Top if angle < t.max_angle - t.transition_margin => Some(Stage::Descending),
            Stage::Descending if angle <= t.min_angle => Some(Stage::Bottom),
            Stage::Bottom if angle > t.min_angle + t.rise_margin => Some(Stage::Ascending),
            Stage::Ascending if angle >= t.max_angle - t.transition_margin => Some(Stage::Top),
            _ => None,
        }
    }

    fn debounce_elapsed(&self, now: Timestamp) -> bool {
        match self.last_rep_at {
            Some(last) => now.seconds_since(last) >= self.thresholds.min_time_between_reps,
            None => true,
        }
    }

    /// Feed one measured angle
    pub fn advance(&mut self, angle: f64, now: Timestamp) -> PhaseStep {
        let mut stage = match self.stage {
            Some(stage) => stage,
            None => {
                let stage = self.initial_stage(angle);
                self.stage = Some(stage);
                return PhaseStep {
                    stage,
                    completed: false,
                    suppressed: false,
                };
            }
        };

        let mut completed = false;
        let mut suppressed = false;

        for _ in 0..MAX_CASCADE {
            let Some(next) = self.next(stage, angle) else {
                break;
            };
            if stage == Stage::Ascending && next == Stage::Top {
                if self.debounce_elapsed(now) {
                    self.last_rep_at = Some(now);
                    completed = true;
                } else {
                    suppressed = true;
                }
            }
            stage = next;
        }

        self.stage = Some(stage);
        PhaseStep {
            stage,
            completed,
            suppressed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn squat_machine() -> PhaseMachine {
        PhaseMachine::new(PhaseThresholds {
            min_angle: 165.0,
            max_angle: 175.0,
            transition_margin: 10.0,
            rise_margin: 5.0,
            min_time_between_reps: 0.5,
        })
    }

    fn run(machine: &mut PhaseMachine, samples: &[(f64, f64)]) -> u32 {
        samples
            .iter()
            .filter(|(angle, t)| machine.advance(*angle, Timestamp::from_secs_f64(*t)).completed)
            .count() as u32
    }

    #[test]
    fn test_initial_stage_from_angle() {
        let mut machine = squat_machine();
        assert_eq!(machine.advance(175.0, Timestamp::from_nanos(0)).stage, Stage::Top);

        let mut machine = squat_machine();
        assert_eq!(machine.advance(90.0, Timestamp::from_nanos(0)).stage, Stage::Bottom);

        let mut machine = PhaseMachine::new(PhaseThresholds {
            min_angle: 100.0,
            max_angle: 160.0,
            transition_margin: 10.0,
            rise_margin: 5.0,
            min_time_between_reps: 0.3,
        });
        assert_eq!(
            machine.advance(130.0, Timestamp::from_nanos(0)).stage,
            Stage::Descending
        );
    }

    #[test]
    fn test_full_cycle_counts_once() {
        let mut machine = squat_machine();
        let samples: Vec<(f64, f64)> = [175.0, 170.0, 150.0, 120.0, 90.0, 160.0, 175.0]
            .iter()
            .enumerate()
            .map(|(i, a)| (*a, i as f64 * 0.5))
            .collect();
        assert_eq!(run(&mut machine, &samples), 1);
        assert_eq!(machine.stage(), Some(Stage::Top));
    }

    #[test]
    fn test_cascade_from_bottom_to_top_in_one_frame() {
        let mut machine = squat_machine();
        machine.advance(175.0, Timestamp::from_secs_f64(0.0));
        machine.advance(120.0, Timestamp::from_secs_f64(0.5));
        let step = machine.advance(176.0, Timestamp::from_secs_f64(1.0));
        assert!(step.completed);
        assert_eq!(step.stage, Stage::Top);
    }

    #[test]
    fn test_debounce_suppresses_fast_bounce() {
        let mut machine = squat_machine();
        let samples = [
            (175.0, 0.0),
            (150.0, 0.5),
            (175.0, 1.0),
            (150.0, 1.1),
            (175.0, 1.2),
        ];
        assert_eq!(run(&mut machine, &samples), 1);
        assert_eq!(machine.stage(), Some(Stage::Top));
    }

    #[test]
    fn test_suppressed_completion_is_reported() {
        let mut machine = squat_machine();
        machine.advance(175.0, Timestamp::from_secs_f64(0.0));
        machine.advance(150.0, Timestamp::from_secs_f64(0.5));
        assert!(machine.advance(175.0, Timestamp::from_secs_f64(1.0)).completed);
        machine.advance(150.0, Timestamp::from_secs_f64(1.1));
        let step = machine.advance(175.0, Timestamp::from_secs_f64(1.2));
        assert!(!step.completed);
        assert!(step.suppressed);
    }

    #[test]
    fn test_hysteresis_holds_top() {
        let mut machine = squat_machine();
        machine.advance(175.0, Timestamp::from_secs_f64(0.0));
        let step = machine.advance(166.0, Timestamp::from_secs_f64(0.1));
        assert_eq!(step.stage, Stage::Top);
    }

    #[test]
    fn test_count_never_exceeds_completed_cycles() {
        let mut machine = squat_machine();
        let mut count = 0;
        let mut t = 0.0;
        for cycle in 0..5 {
            for angle in [175.0, 140.0, 100.0, 140.0] {
                if machine.advance(angle, Timestamp::from_secs_f64(t)).completed {
                    count += 1;
                }
                t += 0.2;
            }
            assert!(count <= cycle);
        }
    }

    #[test]
    fn test_reset() {
        let mut machine = squat_machine();
        machine.advance(100.0, Timestamp::from_nanos(0));
        machine.reset_to_top();
        assert_eq!(machine.stage(), Some(Stage::Top));
        assert!(machine.last_rep_at().is_none());
        machine.reset();
        assert!(machine.stage().is_none());
    }
}
