//! Workout session aggregation.
//!
//! A session lives from the first frame of an exercise attempt until
//! [`WorkoutSession::end_session`]. Every time-dependent method takes the
//! current [`Timestamp`] so replays and tests are deterministic.

use std::collections::BTreeMap;

use formcoach_core::{round_to, ExerciseKind, SessionId, Timestamp};
use formcoach_feedback::{top_errors, ErrorKind, Feedback, QualityDistribution};
use tracing::{debug, info};

use crate::statistics::{format_duration, FeedbackEntry, RepDetail, SessionStatistics};

/// Calorie multiplier growth per active minute
const DURATION_FACTOR_PER_MINUTE: f64 = 0.1;
const MAX_DURATION_FACTOR: f64 = 2.0;

#[derive(Debug, Clone)]
pub struct WorkoutSession {
    id: SessionId,
    exercise: ExerciseKind,
    user_name: String,
    started_at: Timestamp,
    ended_at: Option<Timestamp>,
    paused_at: Option<Timestamp>,
    /// Seconds spent in completed pauses
    paused_secs: f64,
    rep_details: Vec<RepDetail>,
    feedback_history: Vec<FeedbackEntry>,
    /// Surfaced error kinds in the order they were recorded
    error_log: Vec<ErrorKind>,
}

impl WorkoutSession {
    pub fn new(exercise: ExerciseKind, user_name: impl Into<String>, now: Timestamp) -> Self {
        let session = Self {
            id: SessionId::new(),
            exercise,
            user_name: user_name.into(),
            started_at: now,
            ended_at: None,
            paused_at: None,
            paused_secs: 0.0,
            rep_details: Vec::new(),
            feedback_history: Vec::new(),
            error_log: Vec::new(),
        };
        info!(session = %session.id, exercise = %exercise, "Session started");
        session
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn exercise(&self) -> ExerciseKind {
        self.exercise
    }

    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    pub fn started_at(&self) -> Timestamp {
        self.started_at
    }

    pub fn is_active(&self) -> bool {
        self.ended_at.is_none()
    }

    pub fn is_paused(&self) -> bool {
        self.paused_at.is_some()
    }

    pub fn rep_count(&self) -> u32 {
        self.rep_details.len() as u32
    }

    pub fn rep_details(&self) -> &[RepDetail] {
        &self.rep_details
    }

    pub fn feedback_history(&self) -> &[FeedbackEntry] {
        &self.feedback_history
    }

    /// Record a counted repetition
    pub fn add_repetition(
        &mut self,
        quality_score: f64,
        angles: BTreeMap<String, f64>,
        now: Timestamp,
    ) {
        if !self.is_active() {
            debug!(session = %self.id, "Repetition after session end ignored");
            return;
        }
        let detail = RepDetail {
            rep_number: self.rep_count() + 1,
            timestamp: now.seconds_since(self.started_at),
            quality_score,
            angles,
        };
        debug!(rep = detail.rep_number, quality = quality_score, "Repetition recorded");
        self.rep_details.push(detail);
    }

    /// Record a message that was shown to the user
    pub fn add_feedback(&mut self, feedback: &Feedback, now: Timestamp) {
        if !self.is_active() {
            return;
        }
        self.feedback_history.push(FeedbackEntry {
            timestamp: now.seconds_since(self.started_at),
            message: feedback.message.clone(),
            priority: feedback.priority,
            quality_score: feedback.quality_score,
            error_type: feedback.error_type,
        });
        if let Some(kind) = feedback.error_type {
            self.error_log.push(kind);
        }
    }

    pub fn pause(&mut self, now: Timestamp) {
        if self.is_active() && !self.is_paused() {
            self.paused_at = Some(now);
            info!(session = %self.id, "Session paused");
        }
    }

    pub fn resume(&mut self, now: Timestamp) {
        if let Some(paused_at) = self.paused_at.take() {
            self.paused_secs += now.seconds_since(paused_at).max(0.0);
            info!(session = %self.id, "Session resumed");
        }
    }

    /// Finish the session and return its final snapshot.
    ///
    /// Calling it again returns the same snapshot.
    pub fn end_session(&mut self, now: Timestamp) -> SessionStatistics {
        if self.is_active() {
            self.resume(now);
            self.ended_at = Some(now);
            info!(
                session = %self.id,
                reps = self.rep_count(),
                duration = self.get_duration(now),
                "Session ended"
            );
        }
        self.get_statistics(now)
    }

    /// Active seconds: wall time minus pauses, never negative
    pub fn get_duration(&self, now: Timestamp) -> f64 {
        let end = self.ended_at.unwrap_or(now);
        let mut active = end.seconds_since(self.started_at) - self.paused_secs;
        if let Some(paused_at) = self.paused_at {
            active -= end.seconds_since(paused_at);
        }
        active.max(0.0)
    }

    pub fn get_average_quality(&self) -> f64 {
        if self.rep_details.is_empty() {
            return 0.0;
        }
        self.rep_details.iter().map(|r| r.quality_score).sum::<f64>() / self.rep_details.len() as f64
    }

    pub fn get_calories_estimate(&self, now: Timestamp) -> f64 {
        let minutes = self.get_duration(now) / 60.0;
        let factor = (1.0 + minutes * DURATION_FACTOR_PER_MINUTE).min(MAX_DURATION_FACTOR);
        round_to(
            self.rep_count() as f64 * self.exercise.calories_per_rep() * factor,
            1,
        )
    }

    pub fn get_reps_per_minute(&self, now: Timestamp) -> f64 {
        let duration = self.get_duration(now);
        if duration > 0.0 {
            round_to(self.rep_count() as f64 / duration * 60.0, 1)
        } else {
            0.0
        }
    }

    pub fn quality_distribution(&self) -> QualityDistribution {
        QualityDistribution::from_scores(self.rep_details.iter().map(|r| r.quality_score))
    }

    pub fn duration_formatted(&self, now: Timestamp) -> String {
        format_duration(self.get_duration(now))
    }

    pub fn get_statistics(&self, now: Timestamp) -> SessionStatistics {
        let duration = self.get_duration(now);
        SessionStatistics {
            session_id: self.id,
            user_name: self.user_name.clone(),
            exercise: self.exercise,
            date: self.started_at.to_datetime(),
            ended_at: self.ended_at.map(|t| t.to_datetime()),
            duration,
            duration_formatted: format_duration(duration),
            repetitions: self.rep_count(),
            average_quality: self.get_average_quality(),
            quality_distribution: self.quality_distribution(),
            top_errors: top_errors(self.error_log.iter().copied(), 3),
            total_feedback: self.feedback_history.len(),
            calories_estimate: self.get_calories_estimate(now),
            reps_per_minute: self.get_reps_per_minute(now),
            is_active: self.is_active(),
            rep_details: self.rep_details.clone(),
        }
    }

    pub fn summary_text(&self, now: Timestamp) -> String {
        self.get_statistics(now).summary_text()
    }
}
