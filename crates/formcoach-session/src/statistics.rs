//! Finalized session records.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use formcoach_core::{ExerciseKind, Result, SessionId};
use formcoach_feedback::{ErrorKind, QualityDistribution, Severity};
use serde::{Deserialize, Serialize};

/// One counted repetition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepDetail {
    pub rep_number: u32,
    /// Seconds since the session started
    pub timestamp: f64,
    pub quality_score: f64,
    pub angles: BTreeMap<String, f64>,
}

/// One message shown to the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackEntry {
    /// Seconds since the session started
    pub timestamp: f64,
    pub message: String,
    pub priority: Severity,
    pub quality_score: f64,
    pub error_type: Option<ErrorKind>,
}

/// Flat snapshot of a session, suitable for persistence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStatistics {
    pub session_id: SessionId,
    pub user_name: String,
    pub exercise: ExerciseKind,
    pub date: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    /// Active seconds, pauses excluded
    pub duration: f64,
    pub duration_formatted: String,
    pub repetitions: u32,
    pub average_quality: f64,
    pub quality_distribution: QualityDistribution,
    pub top_errors: Vec<(ErrorKind, u32)>,
    pub total_feedback: usize,
    pub calories_estimate: f64,
    pub reps_per_minute: f64,
    pub is_active: bool,
    pub rep_details: Vec<RepDetail>,
}

impl SessionStatistics {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Human-readable multi-line report
    pub fn summary_text(&self) -> String {
        let rule = "=".repeat(50);
        let d = &self.quality_distribution;

        let mut lines = vec![
            format!("WORKOUT SESSION - {}", self.exercise.label().to_uppercase()),
            rule.clone(),
            format!("User: {}", self.user_name),
            String::new(),
            "General:".to_string(),
            format!("  - Repetitions: {}", self.repetitions),
            format!("  - Duration: {}", self.duration_formatted),
            format!("  - Pace: {} reps/min", self.reps_per_minute),
            format!("  - Estimated calories: {} kcal", self.calories_estimate),
            String::new(),
            "Quality:".to_string(),
            format!("  - Average score: {:.1}/100", self.average_quality),
            format!("  - Excellent: {} reps", d.excellent),
            format!("  - Good: {} reps", d.good),
            format!("  - Fair: {} reps", d.medium),
            format!("  - Needs work: {} reps", d.poor),
            String::new(),
            "Feedback:".to_string(),
            format!("  - Messages shown: {}", self.total_feedback),
        ];

        if !self.top_errors.is_empty() {
            lines.push(String::new());
            lines.push("Frequent errors:".to_string());
            for (kind, count) in &self.top_errors {
                lines.push(format!("  - {}: {} times", kind, count));
            }
        }

        lines.push(String::new());
        lines.push(rule);
        lines.join("\n")
    }
}

/// "2m 30s" above one minute, "45s" below
pub fn format_duration(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    let minutes = total / 60;
    let secs = total % 60;
    if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}
