//! # FormCoach-Counting
//!
//! Repetition counting for the supported exercises.
//!
//! Each frame first passes the [`VisibilityGate`], which picks the body side
//! to measure. The measured primary angle then drives a [`PhaseMachine`]
//! whose cycle completions are debounced before they count as a rep.

pub mod counter;
pub mod phase;
pub mod pushup;
pub mod squat;
pub mod visibility;

pub use counter::*;
pub use phase::*;
pub use pushup::*;
pub use squat::*;
pub use visibility::*;
