//! # Musical Tuning Module
//!
//! Equal-temperament conversions between frequency, MIDI note numbers and
//! octave-agnostic pitch classes (A4 = 440 Hz = MIDI 69).
//!
//! ## Features
//! - Frequency to nearest MIDI note, rejecting anything outside 0..=127
//! - MIDI note back to its equal-temperament frequency
//! - Twelve chromatic pitch classes starting at C, spelled with sharps only

use std::fmt;

const A4_FREQUENCY: f32 = 440.0;
const A4_MIDI: f32 = 69.0;
const SEMITONES_PER_OCTAVE: u8 = 12;
const MIDI_MAX: f32 = 127.0;

const PITCH_CLASS_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// One of the twelve chromatic pitch classes. The octave is not tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PitchClass(u8);

impl PitchClass {
    pub const C: PitchClass = PitchClass(0);
    pub const A: PitchClass = PitchClass(9);

    /// Pitch class of a MIDI note number (`midi mod 12`).
    pub fn from_midi(midi: u8) -> Self {
        PitchClass(midi % SEMITONES_PER_OCTAVE)
    }

    /// Display name, e.g. `"C#"`.
    pub fn name(self) -> &'static str {
        PITCH_CLASS_NAMES[self.0 as usize]
    }
}

impl fmt::Display for PitchClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Rounds a frequency to its nearest MIDI note number.
///
/// Uses `round(69 + 12 * log2(f / 440))`.
///
/// # Returns
/// * `Some(midi)` - Note number in `0..=127`
/// * `None` - Non-positive or non-finite frequency, or a note outside the MIDI range
pub fn frequency_to_midi(frequency_hz: f32) -> Option<u8> {
    if !frequency_hz.is_finite() || frequency_hz <= 0.0 {
        return None;
    }
    let midi = (A4_MIDI + 12.0 * (frequency_hz / A4_FREQUENCY).log2()).round();
    if (0.0..=MIDI_MAX).contains(&midi) {
        Some(midi as u8)
    } else {
        None
    }
}

/// Equal-temperament frequency of a MIDI note number.
pub fn midi_to_frequency(midi: u8) -> f32 {
    A4_FREQUENCY * 2.0_f32.powf((midi as f32 - A4_MIDI) / 12.0)
}

/// Pitch class nearest to `frequency_hz`, or `None` outside the MIDI range.
pub fn pitch_class_of(frequency_hz: f32) -> Option<PitchClass> {
    frequency_to_midi(frequency_hz).map(PitchClass::from_midi)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn midi_round_trip_over_full_range() {
        for midi in 0..=127u8 {
            assert_eq!(frequency_to_midi(midi_to_frequency(midi)), Some(midi), "midi {midi}");
        }
    }

    #[test]
    fn reference_pitches() {
        assert_eq!(frequency_to_midi(440.0), Some(69));
        assert_eq!(frequency_to_midi(437.5), Some(69));
        assert_eq!(frequency_to_midi(261.63), Some(60));
        assert_eq!(pitch_class_of(261.63), Some(PitchClass::C));
    }

    #[test]
    fn out_of_range_frequencies_have_no_class() {
        assert_eq!(frequency_to_midi(0.0), None);
        assert_eq!(frequency_to_midi(-10.0), None);
        assert_eq!(frequency_to_midi(f32::NAN), None);
        // Below MIDI 0 (~8.18 Hz) and above MIDI 127 (~12544 Hz)
        assert_eq!(frequency_to_midi(7.0), None);
        assert_eq!(frequency_to_midi(14_000.0), None);
    }

    #[test]
    fn names_use_sharps_starting_at_c() {
        let names: Vec<&str> = (60..72).map(|m| PitchClass::from_midi(m).name()).collect();
        assert_eq!(
            names,
            ["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"]
        );
        assert_eq!(PitchClass::from_midi(69), PitchClass::A);
        assert_eq!(PitchClass::A.to_string(), "A");
    }
}
