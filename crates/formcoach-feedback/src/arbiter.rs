//! Feedback arbitration.
//!
//! Turns per-frame quality reports into at most one user-facing message per
//! cooldown window. When the window has elapsed, the next message is chosen
//! by priority:
//!
//! 1. score ≥ 85 with no errors: rotating success phrase
//! 2. any error: the most severe one, first detected on ties
//! 3. score ≥ 50: keep-it-up notice
//! 4. otherwise: generic form warning

use std::collections::BTreeMap;

use formcoach_core::{RingBuffer, Timestamp};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::posture::{ErrorEvent, ErrorKind, QualityDistribution, Severity};

const SUCCESS_MESSAGES: [&str; 6] = [
    "Perfect!",
    "Excellent movement!",
    "Very good!",
    "Keep it up!",
    "Great form!",
    "Flawless!",
];

const EXCELLENT_SCORE: f64 = 85.0;
const FAIR_SCORE: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayColor {
    Green,
    Orange,
    Red,
    Yellow,
    Blue,
}

impl DisplayColor {
    pub fn for_severity(severity: Severity) -> Self {
        match severity {
            Severity::High => DisplayColor::Red,
            Severity::Medium => DisplayColor::Orange,
            Severity::Low => DisplayColor::Yellow,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DisplayColor::Green => "green",
            DisplayColor::Orange => "orange",
            DisplayColor::Red => "red",
            DisplayColor::Yellow => "yellow",
            DisplayColor::Blue => "blue",
        }
    }
}

/// One outbound coaching message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    pub message: String,
    pub color: DisplayColor,
    pub icon: String,
    pub priority: Severity,
    pub quality_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<ErrorKind>,
}

/// Message returned by [`FeedbackArbiter::generate`]
#[derive(Debug, Clone, PartialEq)]
pub struct FeedbackDecision {
    pub feedback: Feedback,
    /// `false` while the cooldown holds the previous message
    pub refreshed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackConfig {
    /// Seconds a message stays on screen before it may change
    pub min_message_interval: f64,
    pub history_size: usize,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            min_message_interval: 3.0,
            history_size: 50,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutSummary {
    pub total_feedback: usize,
    pub avg_quality: f64,
    /// Percentage of messages issued at excellent quality
    pub success_rate: f64,
    /// Most frequent surfaced errors, at most three
    pub common_errors: Vec<(ErrorKind, u32)>,
    pub quality_distribution: QualityDistribution,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MessageStats {
    pub total: usize,
    pub by_priority: BTreeMap<Severity, u32>,
    pub by_color: BTreeMap<DisplayColor, u32>,
}

/// Milestone line for a rep count, if it is one
pub fn get_encouragement(rep_count: u32) -> Option<&'static str> {
    match rep_count {
        5 => Some("🎯 5 reps! Strong start!"),
        10 => Some("🔥 10 reps! Keep going!"),
        15 => Some("💪 15 reps! You've got this!"),
        20 => Some("⭐ 20 reps! Incredible!"),
        25 => Some("🏆 25 reps! Champion!"),
        30 => Some("👑 30 reps! Respect!"),
        50 => Some("🚀 50 reps! That's huge!"),
        _ => None,
    }
}

/// Highest severity wins; the first of equally severe errors is kept
pub fn most_severe(errors: &[ErrorEvent]) -> Option<&ErrorEvent> {
    errors.iter().fold(None, |best: Option<&ErrorEvent>, e| match best {
        Some(b) if b.severity >= e.severity => Some(b),
        _ => Some(e),
    })
}

#[derive(Debug, Clone)]
pub struct FeedbackArbiter {
    config: FeedbackConfig,
    current: Option<Feedback>,
    last_refresh: Option<Timestamp>,
    history: RingBuffer<Feedback>,
    success_index: usize,
}

impl FeedbackArbiter {
    pub fn new(config: FeedbackConfig) -> Self {
        Self {
            history: RingBuffer::new(config.history_size),
            config,
            current: None,
            last_refresh: None,
            success_index: 0,
        }
    }

    pub fn current(&self) -> Option<&Feedback> {
        self.current.as_ref()
    }

    pub fn history(&self) -> impl Iterator<Item = &Feedback> {
        self.history.iter()
    }

    fn cooling_down(&self, now: Timestamp) -> bool {
        match self.last_refresh {
            Some(last) => now.seconds_since(last) < self.config.min_message_interval,
            None => false,
        }
    }

    fn next_success_message(&mut self, rep_count: u32) -> String {
        let mut message = SUCCESS_MESSAGES[self.success_index].to_string();
        self.success_index = (self.success_index + 1) % SUCCESS_MESSAGES.len();
        if rep_count > 0 && rep_count % 10 == 0 {
            message.push_str(&format!(" {} reps!", rep_count));
        }
        message
    }

    fn select(&mut self, quality_score: f64, errors: &[ErrorEvent], rep_count: u32) -> Feedback {
        if let Some(error) = most_severe(errors) {
            return Feedback {
                message: error.message.clone(),
                color: DisplayColor::for_severity(error.severity),
                icon: error.icon.clone(),
                priority: error.severity,
                quality_score,
                error_type: Some(error.kind),
            };
        }

        let (message, color, icon, priority) = if quality_score >= EXCELLENT_SCORE {
            (
                self.next_success_message(rep_count),
                DisplayColor::Green,
                "✅",
                Severity::Low,
            )
        } else if quality_score >= FAIR_SCORE {
            (
                "Maintain this quality".to_string(),
                DisplayColor::Orange,
                "💡",
                Severity::Low,
            )
        } else {
            (
                "Check your form".to_string(),
                DisplayColor::Red,
                "🔴",
                Severity::High,
            )
        };

        Feedback {
            message,
            color,
            icon: icon.to_string(),
            priority,
            quality_score,
            error_type: None,
        }
    }

    /// Pick the message for this frame, honoring the cooldown
    pub fn generate(
        &mut self,
        quality_score: f64,
        errors: &[ErrorEvent],
        rep_count: u32,
        now: Timestamp,
    ) -> FeedbackDecision {
        if self.cooling_down(now) {
            if let Some(current) = &self.current {
                return FeedbackDecision {
                    feedback: current.clone(),
                    refreshed: false,
                };
            }
        }

        let feedback = self.select(quality_score, errors, rep_count);
        debug!(message = %feedback.message, priority = %feedback.priority, "Feedback refreshed");
        self.current = Some(feedback.clone());
        self.last_refresh = Some(now);
        self.history.push(feedback.clone());

        FeedbackDecision {
            feedback,
            refreshed: true,
        }
    }

    /// Show a custom message immediately and restart the cooldown
    pub fn force_message(
        &mut self,
        message: &str,
        color: DisplayColor,
        icon: &str,
        now: Timestamp,
    ) -> Feedback {
        let feedback = Feedback {
            message: message.to_string(),
            color,
            icon: icon.to_string(),
            priority: Severity::Medium,
            quality_score: FAIR_SCORE,
            error_type: None,
        };
        self.current = Some(feedback.clone());
        self.last_refresh = Some(now);
        feedback
    }

    pub fn get_encouragement(&self, rep_count: u32) -> Option<&'static str> {
        get_encouragement(rep_count)
    }

    pub fn get_workout_summary(&self) -> WorkoutSummary {
        let total = self.history.len();
        if total == 0 {
            return WorkoutSummary {
                total_feedback: 0,
                avg_quality: 0.0,
                success_rate: 0.0,
                common_errors: Vec::new(),
                quality_distribution: QualityDistribution::default(),
            };
        }

        let scores: Vec<f64> = self.history.iter().map(|f| f.quality_score).collect();
        let avg_quality = scores.iter().sum::<f64>() / total as f64;
        let successes = scores.iter().filter(|&&q| q >= EXCELLENT_SCORE).count();

        WorkoutSummary {
            total_feedback: total,
            avg_quality,
            success_rate: successes as f64 / total as f64 * 100.0,
            common_errors: top_errors(self.history.iter().filter_map(|f| f.error_type), 3),
            quality_distribution: QualityDistribution::from_scores(scores.iter().copied()),
        }
    }

    pub fn get_message_stats(&self) -> MessageStats {
        let mut stats = MessageStats {
            total: self.history.len(),
            ..Default::default()
        };
        for feedback in self.history.iter() {
            *stats.by_priority.entry(feedback.priority).or_insert(0) += 1;
            *stats.by_color.entry(feedback.color).or_insert(0) += 1;
        }
        stats
    }

    pub fn reset(&mut self) {
        self.current = None;
        self.last_refresh = None;
        self.history.clear();
        self.success_index = 0;
    }
}

impl Default for FeedbackArbiter {
    fn default() -> Self {
        Self::new(FeedbackConfig::default())
    }
}

/// Most frequent kinds, ties in first-seen order
pub fn top_errors(kinds: impl Iterator<Item = ErrorKind>, limit: usize) -> Vec<(ErrorKind, u32)> {
    let mut counts: Vec<(ErrorKind, u32)> = Vec::new();
    for kind in kinds {
        match counts.iter_mut().find(|(k, _)| *k == kind) {
            Some((_, n)) => *n += 1,
            None => counts.push((kind, 1)),
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.truncate(limit);
    counts
}
