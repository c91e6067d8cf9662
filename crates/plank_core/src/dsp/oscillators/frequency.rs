use serde::Serialize;

use crate::dsp::{
    consts::FREQ_C4,
    utils::{octaves_to_ratio, semitones_to_ratio},
};

/// How a bank turns its knobs and CV into Hz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FrequencyPolicy {
    /// `FREQ_C4 * 2^(knob + cv)`, the 1 V/octave convention.
    ExponentialPitch,
    /// Master frequency set directly in Hz, each voice detuned in semitones.
    AbsoluteWithOffset,
}

/// Per-sample snapshot of the controls feeding one voice.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ControlInputs {
    /// Octaves (knob + CV) for [`FrequencyPolicy::ExponentialPitch`],
    /// Hz for [`FrequencyPolicy::AbsoluteWithOffset`].
    pub master_pitch_or_frequency: f32,
    pub per_voice_offset: f32,
}

impl FrequencyPolicy {
    pub fn voice_frequency(self, controls: ControlInputs) -> f32 {
        match self {
            FrequencyPolicy::ExponentialPitch => {
                exponential_pitch(controls.master_pitch_or_frequency, 0.0)
                    * semitones_to_ratio(controls.per_voice_offset)
            }
            FrequencyPolicy::AbsoluteWithOffset => offset_frequency(
                controls.master_pitch_or_frequency,
                controls.per_voice_offset,
            ),
        }
    }
}

pub fn exponential_pitch(pitch_knob: f32, pitch_cv: f32) -> f32 {
    FREQ_C4 * octaves_to_ratio(pitch_knob + pitch_cv)
}

pub fn offset_frequency(master_frequency: f32, offset_semitones: f32) -> f32 {
    master_frequency * semitones_to_ratio(offset_semitones)
}
