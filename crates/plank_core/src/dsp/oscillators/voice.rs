use crate::dsp::{
    consts::SENTINEL_VOLTS,
    utils::{accumulate_phase, finite_or_sentinel, sine_voltage},
};

/// One sine voice: a phase accumulator and the last sample it emitted.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct OscillatorVoice {
    phase: f32,
    frequency_offset_semitones: f32,
    last_sample: f32,
}

impl OscillatorVoice {
    pub fn new(frequency_offset_semitones: f32) -> Self {
        OscillatorVoice {
            phase: 0.0,
            frequency_offset_semitones,
            last_sample: 0.0,
        }
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }

    pub fn frequency_offset_semitones(&self) -> f32 {
        self.frequency_offset_semitones
    }

    pub fn set_frequency_offset_semitones(&mut self, semitones: f32) {
        self.frequency_offset_semitones = semitones;
    }

    pub fn last_sample(&self) -> f32 {
        self.last_sample
    }

    /// Advance the phase by `frequency * sample_time`.
    ///
    /// A non-finite increment leaves the phase where it was and returns `false`.
    pub fn advance(&mut self, frequency: f32, sample_time: f32) -> bool {
        let increment = frequency * sample_time;
        if !increment.is_finite() {
            return false;
        }
        self.phase = accumulate_phase(self.phase, increment);
        true
    }

    /// Advance one sample and return the output voltage.
    pub fn process(&mut self, frequency: f32, sample_time: f32) -> f32 {
        self.last_sample = if self.advance(frequency, sample_time) {
            finite_or_sentinel(sine_voltage(self.phase))
        } else {
            SENTINEL_VOLTS
        };
        self.last_sample
    }
}
