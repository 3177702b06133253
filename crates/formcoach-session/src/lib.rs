//! # FormCoach-Session
//!
//! Session-level aggregation of reps, quality scores and feedback, with a
//! finalized [`SessionStatistics`] snapshot for persistence.

pub mod session;
pub mod statistics;

pub use session::*;
pub use statistics::*;
