//! # Pitch Tracking Module
//!
//! Turns a stream of per-frame frequency estimates into a stable, debounced
//! pitch class.
//!
//! ## Pieces
//! - `FrequencySmoother`: exponential smoothing, seeded by the first estimate
//! - `NoteHysteresis`: a candidate class must persist before it is shown
//! - `PitchTracker`: combines both and holds the shown note through short dropouts
//!
//! The tracker is either **Idle** (smoothed frequency 0, nothing shown) or
//! **Tracking**. The first confident frame starts tracking; running out of
//! hold frames returns it to Idle.

use log::debug;

use crate::config::AnalyzerConfig;
use crate::tuning::{self, PitchClass};

/// Exponential smoother for the tracked frequency.
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencySmoother {
    alpha: f32,
    smoothed_hz: f32,
}

impl FrequencySmoother {
    pub fn new(alpha: f32) -> Self {
        Self { alpha, smoothed_hz: 0.0 }
    }

    /// Feeds one estimate and returns the new smoothed value.
    ///
    /// While idle the estimate is taken as-is; afterwards the output moves
    /// `alpha` of the way towards each new estimate.
    pub fn update(&mut self, frequency_hz: f32) -> f32 {
        if self.is_idle() {
            self.smoothed_hz = frequency_hz;
        } else {
            self.smoothed_hz = (1.0 - self.alpha) * self.smoothed_hz + self.alpha * frequency_hz;
        }
        self.smoothed_hz
    }

    pub fn smoothed_hz(&self) -> f32 {
        self.smoothed_hz
    }

    pub fn is_idle(&self) -> bool {
        self.smoothed_hz == 0.0
    }

    pub fn reset(&mut self) {
        self.smoothed_hz = 0.0;
    }
}

/// Debounces pitch classes: a candidate replaces the current class only
/// after it has been observed `stable_frames` times in a row.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteHysteresis {
    stable_frames: u32,
    candidate: Option<PitchClass>,
    persist_count: u32,
    current: Option<PitchClass>,
}

impl NoteHysteresis {
    pub fn new(stable_frames: u32) -> Self {
        Self {
            stable_frames,
            candidate: None,
            persist_count: 0,
            current: None,
        }
    }

    /// Records one observed class and returns the current (shown) class.
    ///
    /// `None` observations take part in the candidate bookkeeping but are
    /// never promoted.
    pub fn observe(&mut self, class: Option<PitchClass>) -> Option<PitchClass> {
        if class == self.candidate {
            self.persist_count = self.persist_count.saturating_add(1);
        } else {
            self.candidate = class;
            self.persist_count = 1;
        }

        if self.persist_count >= self.stable_frames
            && self.candidate.is_some()
            && self.candidate != self.current
        {
            debug!(
                "note change: {} -> {}",
                self.current.map_or("--", PitchClass::name),
                self.candidate.map_or("--", PitchClass::name)
            );
            self.current = self.candidate;
        }
        self.current
    }

    pub fn current(&self) -> Option<PitchClass> {
        self.current
    }

    pub fn candidate(&self) -> Option<PitchClass> {
        self.candidate
    }

    pub fn persist_count(&self) -> u32 {
        self.persist_count
    }

    pub fn reset(&mut self) {
        self.candidate = None;
        self.persist_count = 0;
        self.current = None;
    }
}

/// A note ready for display.
#[derive(Debug, Clone, PartialEq)]
pub struct PitchReading {
    pub class: PitchClass,
    /// Smoothed frequency in Hz.
    pub frequency_hz: f32,
}

impl PitchReading {
    pub fn name(&self) -> &'static str {
        self.class.name()
    }
}

/// Persistent pitch state driven once per frame by the confidence gate.
#[derive(Debug, Clone, PartialEq)]
pub struct PitchTracker {
    smoother: FrequencySmoother,
    hysteresis: NoteHysteresis,
    hold_frames: u32,
    hold_counter: u32,
}

impl PitchTracker {
    pub fn new(config: &AnalyzerConfig) -> Self {
        Self {
            smoother: FrequencySmoother::new(config.smoothing_alpha),
            hysteresis: NoteHysteresis::new(config.stable_frames),
            hold_frames: config.hold_frames,
            hold_counter: 0,
        }
    }

    /// Handles a frame whose peak passed the confidence gate.
    pub fn on_confident(&mut self, frequency_hz: f32) {
        if self.smoother.is_idle() {
            debug!("pitch tracking started at {:.1} Hz", frequency_hz);
        }
        let smoothed = self.smoother.update(frequency_hz);
        self.hysteresis.observe(tuning::pitch_class_of(smoothed));
        self.hold_counter = self.hold_frames;
    }

    /// Handles a frame whose peak failed the confidence gate.
    ///
    /// The shown note survives `hold_frames - 1` such frames in a row; the
    /// next one returns the tracker to Idle.
    pub fn on_dropout(&mut self) {
        if self.hold_counter > 0 {
            self.hold_counter -= 1;
            if self.hold_counter > 0 {
                return;
            }
            debug!("pitch tracking lost, returning to idle");
        }
        self.reset();
    }

    /// Dispatches on the confidence gate outcome.
    pub fn update(&mut self, confident: bool, frequency_hz: f32) {
        if confident {
            self.on_confident(frequency_hz);
        } else {
            self.on_dropout();
        }
    }

    /// Returns the whole pitch state to Idle.
    pub fn reset(&mut self) {
        self.smoother.reset();
        self.hysteresis.reset();
        self.hold_counter = 0;
    }

    /// The shown note, if any, paired with the smoothed frequency.
    pub fn reading(&self) -> Option<PitchReading> {
        self.hysteresis.current().map(|class| PitchReading {
            class,
            frequency_hz: self.smoother.smoothed_hz(),
        })
    }

    pub fn is_tracking(&self) -> bool {
        !self.smoother.is_idle()
    }

    pub fn smoothed_hz(&self) -> f32 {
        self.smoother.smoothed_hz()
    }

    pub fn current(&self) -> Option<PitchClass> {
        self.hysteresis.current()
    }

    pub fn hold_counter(&self) -> u32 {
        self.hold_counter
    }
}
