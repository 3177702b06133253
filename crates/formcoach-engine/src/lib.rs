//! # FormCoach-Engine
//!
//! The per-frame coaching pipeline and its configuration.
//!
//! A [`Coach`] owns one instance of every stage (rep counter, posture
//! analyzer, feedback arbiter, workout session) and optionally an
//! [`ExerciseSelector`] that switches exercise from classifier output.

pub mod classifier;
pub mod coach;
pub mod config;

pub use classifier::*;
pub use coach::*;
pub use config::*;
