//! Exercise auto-detection.
//!
//! The sequence model itself is an external collaborator reached through
//! [`SequenceClassifier`]. [`ExerciseSelector`] feeds it a rolling window of
//! per-frame feature vectors and only switches exercise once recent
//! predictions agree with high confidence.

use std::collections::BTreeMap;

use formcoach_core::{ExerciseKind, FrameSample, Result, RingBuffer};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Output of one classifier call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub label: String,
    /// Probability of `label`, in [0, 1]
    pub confidence: f64,
    pub probabilities: BTreeMap<String, f64>,
}

/// Sequence model guessing the exercise from a window of frames.
///
/// Each window entry is one frame flattened to `[x, y, visibility]` per
/// keypoint, oldest frame first.
pub trait SequenceClassifier {
    fn classify(&mut self, window: &[Vec<f32>]) -> Result<Classification>;
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Frames kept in the rolling window
    pub window_size: usize,
    /// Frames required before the first prediction
    pub min_frames: usize,
    /// Predict once every this many frames
    pub prediction_interval: usize,
    /// Confident predictions remembered for the agreement vote
    pub history_size: usize,
    /// Votes the leading label needs out of a full history
    pub min_agreement: usize,
    pub confidence_threshold: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            window_size: 60,
            min_frames: 30,
            prediction_interval: 15,
            history_size: 10,
            min_agreement: 8,
            confidence_threshold: 0.85,
        }
    }
}

/// Smooths classifier output into a stable exercise selection
#[derive(Debug, Clone)]
pub struct ExerciseSelector {
    config: ClassifierConfig,
    window: RingBuffer<Vec<f32>>,
    predictions: RingBuffer<String>,
    frame_count: usize,
    current: Option<ExerciseKind>,
    confidence: f64,
    last: Option<Classification>,
}

impl ExerciseSelector {
    pub fn new(config: ClassifierConfig) -> Self {
        Self {
            window: RingBuffer::new(config.window_size),
            predictions: RingBuffer::new(config.history_size),
            config,
            frame_count: 0,
            current: None,
            confidence: 0.0,
            last: None,
        }
    }

    /// Exercise confirmed by the agreement vote, if any
    pub fn current(&self) -> Option<ExerciseKind> {
        self.current
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn last_classification(&self) -> Option<&Classification> {
        self.last.as_ref()
    }

    pub fn is_ready(&self) -> bool {
        self.window.len() >= self.config.min_frames
    }

    pub fn buffered_frames(&self) -> usize {
        self.window.len()
    }

    /// Add a frame and, when due, consult the classifier.
    ///
    /// Returns the newly confirmed exercise when the selection changes.
    pub fn observe(
        &mut self,
        frame: &FrameSample,
        classifier: &mut dyn SequenceClassifier,
    ) -> Option<ExerciseKind> {
        self.window.push(frame.to_feature_vector());
        self.frame_count += 1;

        let interval = self.config.prediction_interval.max(1);
        if self.frame_count % interval != 0 || !self.is_ready() {
            return None;
        }

        let window = self.window.to_vec();
        let classification = match classifier.classify(&window) {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "Exercise classification failed");
                return None;
            }
        };
        debug!(
            label = %classification.label,
            confidence = classification.confidence,
            "Exercise classified"
        );

        let changed = self.vote(&classification);
        self.last = Some(classification);
        changed
    }

    fn vote(&mut self, classification: &Classification) -> Option<ExerciseKind> {
        if classification.confidence < self.config.confidence_threshold {
            self.predictions.clear();
            return None;
        }

        self.predictions.push(classification.label.clone());
        if !self.predictions.is_full() {
            return None;
        }

        let (leader, votes) = self.leading_label()?;
        if votes < self.config.min_agreement {
            return None;
        }

        let kind = ExerciseKind::from_name(&leader)?;
        self.confidence = classification.confidence;
        if self.current == Some(kind) {
            return None;
        }

        info!(exercise = %kind, votes, "Exercise auto-detected");
        self.current = Some(kind);
        Some(kind)
    }

    fn leading_label(&self) -> Option<(String, usize)> {
        let mut votes: Vec<(&String, usize)> = Vec::new();
        for label in self.predictions.iter() {
            match votes.iter_mut().find(|(l, _)| *l == label) {
                Some((_, n)) => *n += 1,
                None => votes.push((label, 1)),
            }
        }
        votes
            .into_iter()
            .fold(None, |best: Option<(&String, usize)>, (label, n)| match best {
                Some((_, m)) if m >= n => best,
                _ => Some((label, n)),
            })
            .map(|(label, n)| (label.clone(), n))
    }

    /// Drop the window, the vote history and the current selection
    pub fn reset(&mut self) {
        self.window.clear();
        self.predictions.clear();
        self.frame_count = 0;
        self.current = None;
        self.confidence = 0.0;
        self.last = None;
    }

    /// Drop buffered frames but keep the confirmed selection
    pub fn clear_buffer(&mut self) {
        self.window.clear();
        self.predictions.clear();
        self.frame_count = 0;
    }
}

impl Default for ExerciseSelector {
    fn default() -> Self {
        Self::new(ClassifierConfig::default())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use formcoach_core::{Error, Keypoint, Landmark, Timestamp};

    /// Replays a fixed list of (label, confidence) answers, repeating the last
    pub(crate) struct ScriptedClassifier {
        answers: Vec<(&'static str, f64)>,
        pub calls: usize,
        pub window_lengths: Vec<usize>,
    }

    impl ScriptedClassifier {
        pub(crate) fn new(answers: Vec<(&'static str, f64)>) -> Self {
            Self {
                answers,
                calls: 0,
                window_lengths: Vec::new(),
            }
        }
    }

    impl SequenceClassifier for ScriptedClassifier {
        fn classify(&mut self, window: &[Vec<f32>]) -> Result<Classification> {
            self.window_lengths.push(window.len());
            let idx = self.calls.min(self.answers.len().saturating_sub(1));
            self.calls += 1;
            let (label, confidence) = self
                .answers
                .get(idx)
                .copied()
                .ok_or_else(|| Error::Classifier("no scripted answer".to_string()))?;
            Ok(Classification {
                label: label.to_string(),
                confidence,
                probabilities: BTreeMap::from([(label.to_string(), confidence)]),
            })
        }
    }

    fn frame() -> FrameSample {
        let kps = (0..Landmark::COUNT as u8)
            .map(|id| Keypoint::new(id, 0.5, 0.5, 0.0, 1.0))
            .collect();
        FrameSample::new(Timestamp::from_nanos(0), kps).unwrap()
    }

    fn feed(selector: &mut ExerciseSelector, classifier: &mut ScriptedClassifier, n: usize) -> Vec<ExerciseKind> {
        (0..n)
            .filter_map(|_| selector.observe(&frame(), &mut *classifier))
            .collect()
    }

    #[test]
    fn test_waits_for_minimum_window() {
        let mut selector = ExerciseSelector::default();
        let mut classifier = ScriptedClassifier::new(vec![("squat", 0.99)]);
        feed(&mut selector, &mut classifier, 29);
        // frame 15 is an interval boundary but the window holds only 15 frames
        assert_eq!(classifier.calls, 0);
        feed(&mut selector, &mut classifier, 1);
        assert_eq!(classifier.calls, 1);
        assert_eq!(classifier.window_lengths, vec![30]);
    }

    #[test]
    fn test_window_is_capped() {
        let mut selector = ExerciseSelector::default();
        let mut classifier = ScriptedClassifier::new(vec![("squat", 0.5)]);
        feed(&mut selector, &mut classifier, 150);
        assert_eq!(selector.buffered_frames(), 60);
        assert_eq!(classifier.window_lengths.last(), Some(&60));
    }

    #[test]
    fn test_switch_needs_full_agreeing_history() {
        let mut selector = ExerciseSelector::default();
        let mut classifier = ScriptedClassifier::new(vec![("push-up", 0.9)]);
        // predictions at frames 30, 45, ..., 165: ten calls
        let mut switches = feed(&mut selector, &mut classifier, 164);
        assert_eq!(classifier.calls, 9);
        assert!(switches.is_empty());
        switches.extend(feed(&mut selector, &mut classifier, 1));
        assert_eq!(switches, vec![ExerciseKind::PushUp]);
        assert_eq!(selector.current(), Some(ExerciseKind::PushUp));

        // same label again does not report a change
        assert!(feed(&mut selector, &mut classifier, 15).is_empty());
    }

    #[test]
    fn test_low_confidence_clears_history() {
        let mut answers = vec![("squat", 0.95); 9];
        answers.push(("squat", 0.6));
        answers.extend(vec![("squat", 0.95); 9]);
        let mut selector = ExerciseSelector::default();
        let mut classifier = ScriptedClassifier::new(answers);
        // 19 predictions: the tenth resets the vote, nine more are not enough
        let switches = feed(&mut selector, &mut classifier, 30 + 18 * 15);
        assert_eq!(classifier.calls, 19);
        assert!(switches.is_empty());
        // one more confident answer fills the history again
        let switches = feed(&mut selector, &mut classifier, 15);
        assert_eq!(switches, vec![ExerciseKind::Squat]);
    }

    #[test]
    fn test_split_vote_does_not_switch() {
        let answers: Vec<(&'static str, f64)> = (0..10)
            .map(|i| if i % 3 == 0 { ("push-up", 0.9) } else { ("squat", 0.9) })
            .collect();
        let mut selector = ExerciseSelector::default();
        let mut classifier = ScriptedClassifier::new(answers);
        // 6 squat votes out of 10
        let switches = feed(&mut selector, &mut classifier, 30 + 9 * 15);
        assert_eq!(classifier.calls, 10);
        assert!(switches.is_empty());
    }

    #[test]
    fn test_reset() {
        let mut selector = ExerciseSelector::default();
        let mut classifier = ScriptedClassifier::new(vec![("squat", 0.99)]);
        feed(&mut selector, &mut classifier, 200);
        assert_eq!(selector.current(), Some(ExerciseKind::Squat));
        selector.reset();
        assert!(selector.current().is_none());
        assert_eq!(selector.buffered_frames(), 0);
        assert!(!selector.is_ready());
    }
}
