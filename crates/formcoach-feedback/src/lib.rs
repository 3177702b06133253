//! # FormCoach-Feedback
//!
//! Posture scoring and coaching messages.
//!
//! - [`PostureAnalyzer`] scores each frame against per-exercise form rules
//!   and keeps a rolling quality history.
//! - [`FeedbackArbiter`] turns quality reports into rate-limited messages.

pub mod arbiter;
pub mod posture;

pub use arbiter::*;
pub use posture::*;
