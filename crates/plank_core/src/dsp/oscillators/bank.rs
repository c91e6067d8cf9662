use anyhow::{Result, bail};
use arrayvec::ArrayVec;

use crate::{
    dsp::{
        consts::MAX_VOICES,
        oscillators::{
            frequency::{ControlInputs, FrequencyPolicy},
            voice::OscillatorVoice,
        },
        utilities::blinker::StatusBlinker,
    },
    types::{
        ConstructorMap, Module, ModuleConfig, ModuleIo, ModuleSchema, ParamConfig, PortConfig,
        ProcessArgs, Sampleable,
    },
};

/// Index of the pitch knob (exponential) or master frequency knob (absolute).
pub const MASTER_PARAM: usize = 0;
pub const MASTER_INPUT: usize = 0;
pub const BLINK_LIGHT: usize = 0;

/// Offset knob for `voice`; the master knob occupies index 0.
pub const fn voice_offset_param(voice: usize) -> usize {
    voice + 1
}

/// Everything that distinguishes one registered bank variant from another.
#[derive(Debug, Clone, Copy)]
pub struct BankLayout {
    pub module_type: &'static str,
    pub description: &'static str,
    pub policy: FrequencyPolicy,
    pub voices: usize,
    pub blinker: bool,
    pub config: fn() -> ModuleConfig,
}

impl BankLayout {
    pub fn schema(&self) -> ModuleSchema {
        ModuleSchema {
            name: self.module_type.into(),
            description: self.description.into(),
            voices: self.voices,
            config: (self.config)(),
        }
    }
}

/// Single sine voice on a 1 V/octave pitch knob + CV, with a 1 Hz status light.
pub const PLANK: BankLayout = BankLayout {
    module_type: "plank",
    description: "A 1V/octave sine oscillator with a 1 Hz status light",
    policy: FrequencyPolicy::ExponentialPitch,
    voices: 1,
    blinker: true,
    config: plank_config,
};

/// Three sine voices around a master frequency, each detuned in semitones.
pub const PLANKY: BankLayout = BankLayout {
    module_type: "planky",
    description: "Three sine oscillators detuned in semitones from a master frequency",
    policy: FrequencyPolicy::AbsoluteWithOffset,
    voices: 3,
    blinker: false,
    config: planky_config,
};

fn plank_config() -> ModuleConfig {
    ModuleConfig {
        params: vec![ParamConfig::new("freq", 0.0, 1.0, 0.0, "Frequency Knob")],
        inputs: vec![PortConfig::new("freq", "Frequency CV")],
        outputs: vec![PortConfig::new("sine", "Sine Output")],
        lights: vec![PortConfig::new("blink", "Blink")],
    }
}

fn planky_config() -> ModuleConfig {
    let mut params = vec![ParamConfig::new(
        "freq",
        20.0,
        3000.0,
        440.0,
        "Master Frequency",
    )];
    let mut outputs = Vec::with_capacity(3);
    let mut lights = Vec::with_capacity(3);
    for n in 1..=3 {
        let name = format!("osc{}", n);
        params.push(ParamConfig::new(
            &name,
            -12.0,
            12.0,
            0.0,
            &format!("Oscillator {} Offset", n),
        ));
        outputs.push(PortConfig::new(&name, &format!("Oscillator {}", n)));
        lights.push(PortConfig::new(&name, &format!("Oscillator {} Light", n)));
    }

    ModuleConfig {
        params,
        inputs: vec![PortConfig::new("freq", "Master Frequency CV")],
        outputs,
        lights,
    }
}

/// A bank variant registered under its own module type.
pub trait BankVariant {
    const LAYOUT: BankLayout;
}

/// Single exponential-pitch voice with a status light.
pub struct Plank;

/// Three voices offset in semitones from one master frequency.
pub struct Planky;

impl BankVariant for Plank {
    const LAYOUT: BankLayout = PLANK;
}

impl BankVariant for Planky {
    const LAYOUT: BankLayout = PLANKY;
}

fn construct_variant<V: BankVariant>(id: &str) -> Result<Box<dyn Sampleable>> {
    Ok(Box::new(OscillatorBank::new(id, &V::LAYOUT)?))
}

impl<V: BankVariant> Module for V {
    fn install_constructor(map: &mut ConstructorMap) {
        map.insert(V::LAYOUT.module_type, construct_variant::<V>);
    }

    fn get_schema() -> ModuleSchema {
        V::LAYOUT.schema()
    }
}

/// One to three sine voices sharing a frequency control.
///
/// The frequency policy decides how the master knob (and CV) are read:
///
/// - `ExponentialPitch`: `FREQ_C4 * 2^(knob + cv)` for every voice.
/// - `AbsoluteWithOffset`: the knob is Hz, voice `i` adds the offset knob
///   `i + 1` in semitones. The master CV jack is declared but not read.
///
/// Voice `i` writes output `i`.
pub struct OscillatorBank {
    id: String,
    module_type: &'static str,
    policy: FrequencyPolicy,
    voices: ArrayVec<OscillatorVoice, MAX_VOICES>,
    blinker: Option<StatusBlinker>,
    config: ModuleConfig,
}

impl OscillatorBank {
    pub fn new(id: &str, layout: &BankLayout) -> Result<Self> {
        let config = (layout.config)();

        if layout.voices == 0 || layout.voices > MAX_VOICES {
            bail!(
                "{} with id {}: voice count {} is outside 1..={}",
                layout.module_type,
                id,
                layout.voices,
                MAX_VOICES
            );
        }
        if config.outputs.len() < layout.voices {
            bail!(
                "{} with id {}: {} voices need {} outputs, config declares {}",
                layout.module_type,
                id,
                layout.voices,
                layout.voices,
                config.outputs.len()
            );
        }
        if config.params.is_empty() {
            bail!("{} with id {}: missing master param", layout.module_type, id);
        }
        if layout.policy == FrequencyPolicy::AbsoluteWithOffset
            && config.params.len() <= voice_offset_param(layout.voices - 1)
        {
            bail!(
                "{} with id {}: every voice needs an offset param",
                layout.module_type,
                id
            );
        }
        if layout.blinker && config.lights.len() <= BLINK_LIGHT {
            bail!("{} with id {}: blinker needs a light", layout.module_type, id);
        }

        let voices = (0..layout.voices)
            .map(|_| OscillatorVoice::new(0.0))
            .collect();

        tracing::debug!(
            module_type = layout.module_type,
            id,
            voices = layout.voices,
            "constructed oscillator bank"
        );

        Ok(OscillatorBank {
            id: id.to_string(),
            module_type: layout.module_type,
            policy: layout.policy,
            voices,
            blinker: layout.blinker.then(StatusBlinker::new),
            config,
        })
    }

    pub fn policy(&self) -> FrequencyPolicy {
        self.policy
    }

    pub fn voices(&self) -> &[OscillatorVoice] {
        &self.voices
    }

    pub fn blinker(&self) -> Option<&StatusBlinker> {
        self.blinker.as_ref()
    }

    fn master_control(&self, io: &ModuleIo) -> f32 {
        match self.policy {
            FrequencyPolicy::ExponentialPitch => io.param(MASTER_PARAM) + io.input(MASTER_INPUT),
            FrequencyPolicy::AbsoluteWithOffset => io.param(MASTER_PARAM),
        }
    }
}

impl Sampleable for OscillatorBank {
    fn get_id(&self) -> &str {
        &self.id
    }

    fn get_module_type(&self) -> &'static str {
        self.module_type
    }

    fn config(&self) -> &ModuleConfig {
        &self.config
    }

    fn process(&mut self, args: &ProcessArgs, io: &mut ModuleIo) {
        let master = self.master_control(io);
        let policy = self.policy;

        for (index, voice) in self.voices.iter_mut().enumerate() {
            if policy == FrequencyPolicy::AbsoluteWithOffset {
                voice.set_frequency_offset_semitones(io.param(voice_offset_param(index)));
            }
            let frequency = policy.voice_frequency(ControlInputs {
                master_pitch_or_frequency: master,
                per_voice_offset: voice.frequency_offset_semitones(),
            });
            let sample = voice.process(frequency, args.sample_time);
            io.set_output(index, sample);
        }

        if let Some(blinker) = self.blinker.as_mut() {
            io.set_light(BLINK_LIGHT, blinker.advance(args.sample_time));
        }
    }
}
