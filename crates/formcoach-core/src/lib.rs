//! # FormCoach-Core
//!
//! Core types and utilities for the FormCoach exercise tracking pipeline:
//! pose keypoints, per-frame samples, joint-angle geometry and the bounded
//! histories shared by the counting and feedback stages.

pub mod error;
pub mod geometry;
pub mod history;
pub mod types;

pub use error::{Error, Result};
pub use geometry::*;
pub use history::*;
pub use types::*;
