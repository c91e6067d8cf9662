/// C4, the pitch of 0 V on the 1 V/octave scale.
pub const FREQ_C4: f32 = 261.6256;

/// Audio signals swing +/-5 V.
pub const OUTPUT_PEAK_VOLTS: f32 = 5.0;

pub const SEMITONES_PER_OCTAVE: f32 = 12.0;

pub const MAX_VOICES: usize = 3;

pub const DEFAULT_SAMPLE_RATE: f32 = 48000.0;

/// Emitted in place of any sample that is not a finite number.
pub const SENTINEL_VOLTS: f32 = 0.0;
