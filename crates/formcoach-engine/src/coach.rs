//! Per-frame coaching pipeline.
//!
//! A [`Coach`] wires the stages together for one user:
//!
//! ```text
//! frame ──► ExerciseSelector ──► RepCounter ──► PostureAnalyzer ──► FeedbackArbiter
//!             (optional)           (gate)        (visible only)            │
//!                                     │                                     ▼
//!                                     └──────────► WorkoutSession ◄─────────┘
//! ```

use formcoach_core::{ExerciseKind, FrameSample, Timestamp};
use formcoach_counting::{RepCounter, RepMetrics, VisibilityHint};
use formcoach_feedback::{Feedback, FeedbackArbiter, PostureAnalyzer, QualityReport};
use formcoach_session::{SessionStatistics, WorkoutSession};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::classifier::{ExerciseSelector, SequenceClassifier};
use crate::config::CoachConfig;

/// Quality recorded for a rep when the frame could not be analyzed
pub const DEFAULT_REP_QUALITY: f64 = 50.0;

/// Shown instead of the stand-up hint while auto-detection is still deciding
pub const ANALYZING_MESSAGE: &str = "Analyzing movement...";

/// One item from the pose estimation stage
#[derive(Debug, Clone, PartialEq)]
pub enum FrameInput {
    Detected(FrameSample),
    /// No person was found in the image taken at this instant
    NoDetection(Timestamp),
}

impl FrameInput {
    pub fn timestamp(&self) -> Timestamp {
        match self {
            FrameInput::Detected(frame) => frame.timestamp,
            FrameInput::NoDetection(ts) => *ts,
        }
    }
}

/// Everything a display needs after one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameReport {
    pub exercise: ExerciseKind,
    pub rep_count: u32,
    pub phase_name: String,
    pub metrics: Option<RepMetrics>,
    /// Line to show the user for this frame
    pub feedback_message: String,
    pub quality: Option<QualityReport>,
    pub feedback: Option<Feedback>,
    pub visible: bool,
    /// Set on the frame that completed a rep
    pub rep_completed: bool,
}

struct Detector {
    selector: ExerciseSelector,
    classifier: Box<dyn SequenceClassifier>,
}

/// Stateful coaching pipeline for one user
pub struct Coach {
    config: CoachConfig,
    counter: RepCounter,
    analyzer: PostureAnalyzer,
    arbiter: FeedbackArbiter,
    session: WorkoutSession,
    detector: Option<Detector>,
    user_name: String,
    /// Counter total already recorded in the session
    recorded_count: u32,
}

impl Coach {
    pub fn new(
        config: CoachConfig,
        kind: ExerciseKind,
        user_name: impl Into<String>,
        now: Timestamp,
    ) -> Self {
        let user_name = user_name.into();
        info!(exercise = %kind, user = %user_name, "Coach started");
        Self {
            counter: RepCounter::new(kind, &config.counting),
            analyzer: PostureAnalyzer::new(config.posture),
            arbiter: FeedbackArbiter::new(config.feedback),
            session: WorkoutSession::new(kind, user_name.clone(), now),
            detector: None,
            user_name,
            recorded_count: 0,
            config,
        }
    }

    /// Enable exercise auto-detection with the given sequence model
    pub fn with_classifier(mut self, classifier: Box<dyn SequenceClassifier>) -> Self {
        self.detector = Some(Detector {
            selector: ExerciseSelector::new(self.config.classifier),
            classifier,
        });
        self
    }

    pub fn config(&self) -> &CoachConfig {
        &self.config
    }

    pub fn exercise(&self) -> ExerciseKind {
        self.counter.kind()
    }

    pub fn counter(&self) -> &RepCounter {
        &self.counter
    }

    pub fn analyzer(&self) -> &PostureAnalyzer {
        &self.analyzer
    }

    pub fn arbiter(&self) -> &FeedbackArbiter {
        &self.arbiter
    }

    pub fn session(&self) -> &WorkoutSession {
        &self.session
    }

    pub fn is_auto_detecting(&self) -> bool {
        self.detector.is_some()
    }

    /// Run one frame through every stage
    pub fn process(&mut self, input: FrameInput) -> FrameReport {
        match input {
            FrameInput::Detected(frame) => self.process_frame(&frame),
            FrameInput::NoDetection(_) => FrameReport {
                exercise: self.exercise(),
                rep_count: self.counter.count(),
                phase_name: self.counter.phase_name().to_string(),
                metrics: None,
                feedback_message: VisibilityHint::NoPersonDetected.message().to_string(),
                quality: None,
                feedback: None,
                visible: false,
                rep_completed: false,
            },
        }
    }

    fn process_frame(&mut self, frame: &FrameSample) -> FrameReport {
        let now = frame.timestamp;

        let detected = self
            .detector
            .as_mut()
            .and_then(|d| d.selector.observe(frame, d.classifier.as_mut()));
        if let Some(kind) = detected {
            if kind != self.exercise() {
                self.switch_exercise(kind, now);
            }
        }

        let update = self.counter.update(frame);
        let visible = update.is_visible();

        let mut feedback_message = update.feedback.clone();
        if update.hint == Some(VisibilityHint::StandUp) && self.is_auto_detecting() {
            feedback_message = ANALYZING_MESSAGE.to_string();
        }

        let mut quality = None;
        let mut feedback = None;
        let mut refreshed = false;
        if visible {
            let report = self.analyzer.analyze(self.exercise(), frame);
            let decision =
                self.arbiter
                    .generate(report.quality_score, &report.errors, update.count, now);
            feedback_message = decision.feedback.message.clone();
            refreshed = decision.refreshed;
            feedback = Some(decision.feedback);
            quality = Some(report);
        }

        let rep_completed = update.count > self.recorded_count;
        if rep_completed {
            let score = quality
                .as_ref()
                .map(|q| q.quality_score)
                .unwrap_or(DEFAULT_REP_QUALITY);
            let angles = self
                .counter
                .last_rep()
                .map(|m| m.angles())
                .unwrap_or_default();
            for _ in self.recorded_count..update.count {
                self.session.add_repetition(score, angles.clone(), now);
            }
            self.recorded_count = update.count;
            debug!(count = update.count, quality = score, "Rep added to session");

            if let Some(line) = self.arbiter.get_encouragement(update.count) {
                feedback_message = line.to_string();
            }
        }

        if refreshed {
            if let Some(f) = &feedback {
                self.session.add_feedback(f, now);
            }
        }

        FrameReport {
            exercise: self.exercise(),
            rep_count: update.count,
            phase_name: update.phase_name,
            metrics: update.metrics,
            feedback_message,
            quality,
            feedback,
            visible,
            rep_completed,
        }
    }

    /// Start over with another exercise.
    ///
    /// The running session is finalized and returned; a fresh one begins.
    pub fn switch_exercise(&mut self, kind: ExerciseKind, now: Timestamp) -> SessionStatistics {
        let previous = self.exercise();
        let stats = self.session.end_session(now);

        self.counter = RepCounter::new(kind, &self.config.counting);
        self.analyzer.reset();
        self.arbiter.reset();
        if let Some(d) = self.detector.as_mut() {
            d.selector.clear_buffer();
        }
        self.session = WorkoutSession::new(kind, self.user_name.clone(), now);
        self.recorded_count = 0;

        info!(from = %previous, to = %kind, reps = stats.repetitions, "Exercise switched");
        stats
    }

    pub fn pause(&mut self, now: Timestamp) {
        self.session.pause(now);
    }

    pub fn resume(&mut self, now: Timestamp) {
        self.session.resume(now);
    }

    /// End the session and return its final statistics
    pub fn finish(&mut self, now: Timestamp) -> SessionStatistics {
        self.session.end_session(now)
    }

    /// Zero the rep counter without touching the session record
    pub fn reset_counter(&mut self) {
        self.counter.reset();
        self.recorded_count = 0;
        debug!(exercise = %self.exercise(), "Counter reset");
    }
}
