use anyhow::Result;
use serde::Serialize;
use std::collections::HashMap;

/// Timing for a single `process` call, supplied by the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessArgs {
    pub sample_rate: f32,
    /// Seconds elapsed since the previous call (`1 / sample_rate`).
    pub sample_time: f32,
}

impl ProcessArgs {
    pub fn new(sample_rate: f32) -> Self {
        ProcessArgs {
            sample_rate,
            sample_time: 1.0 / sample_rate,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParamConfig {
    pub name: String,
    pub min: f32,
    pub max: f32,
    pub default: f32,
    pub display_name: String,
}

impl ParamConfig {
    pub fn new(name: &str, min: f32, max: f32, default: f32, display_name: &str) -> Self {
        ParamConfig {
            name: name.into(),
            min,
            max,
            default,
            display_name: display_name.into(),
        }
    }

    pub fn clamp(&self, value: f32) -> f32 {
        value.clamp(self.min, self.max)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortConfig {
    pub name: String,
    pub display_name: String,
}

impl PortConfig {
    pub fn new(name: &str, display_name: &str) -> Self {
        PortConfig {
            name: name.into(),
            display_name: display_name.into(),
        }
    }
}

/// The configuration surface a module declares to its host: what knobs,
/// jacks and lights it has, and the range of every knob.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleConfig {
    pub params: Vec<ParamConfig>,
    pub inputs: Vec<PortConfig>,
    pub outputs: Vec<PortConfig>,
    pub lights: Vec<PortConfig>,
}

fn position(ports: &[PortConfig], name: &str) -> Option<usize> {
    ports.iter().position(|p| p.name == name)
}

impl ModuleConfig {
    pub fn param_index(&self, name: &str) -> Option<usize> {
        self.params.iter().position(|p| p.name == name)
    }

    pub fn input_index(&self, name: &str) -> Option<usize> {
        position(&self.inputs, name)
    }

    pub fn output_index(&self, name: &str) -> Option<usize> {
        position(&self.outputs, name)
    }

    pub fn light_index(&self, name: &str) -> Option<usize> {
        position(&self.lights, name)
    }
}

/// Port storage for one module instance.
///
/// The host writes params and inputs before each `process` call and reads
/// outputs and lights afterwards. Param writes are clamped to the declared
/// range; unpatched inputs read as 0 V. Out-of-range indices are ignored on
/// write and read as 0 so a module can never panic the audio thread through
/// its ports.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleIo {
    params: Vec<f32>,
    param_ranges: Vec<(f32, f32)>,
    inputs: Vec<Option<f32>>,
    outputs: Vec<f32>,
    lights: Vec<f32>,
}

impl ModuleIo {
    pub fn new(config: &ModuleConfig) -> Self {
        ModuleIo {
            params: config.params.iter().map(|p| p.default).collect(),
            param_ranges: config.params.iter().map(|p| (p.min, p.max)).collect(),
            inputs: vec![None; config.inputs.len()],
            outputs: vec![0.0; config.outputs.len()],
            lights: vec![0.0; config.lights.len()],
        }
    }

    /// Store a param value clamped to its range. Non-finite values are
    /// rejected and leave the previous value in place. Returns the stored value.
    pub fn set_param(&mut self, index: usize, value: f32) -> Option<f32> {
        let (min, max) = *self.param_ranges.get(index)?;
        let slot = self.params.get_mut(index)?;
        if value.is_finite() {
            *slot = value.clamp(min, max);
        }
        Some(*slot)
    }

    pub fn param(&self, index: usize) -> f32 {
        self.params.get(index).copied().unwrap_or(0.0)
    }

    pub fn params(&self) -> &[f32] {
        &self.params
    }

    /// Patch (`Some`) or unpatch (`None`) an input port.
    pub fn set_input(&mut self, index: usize, voltage: Option<f32>) {
        if let Some(slot) = self.inputs.get_mut(index) {
            *slot = voltage.filter(|v| v.is_finite());
        }
    }

    pub fn input(&self, index: usize) -> f32 {
        self.inputs.get(index).copied().flatten().unwrap_or(0.0)
    }

    pub fn is_connected(&self, index: usize) -> bool {
        matches!(self.inputs.get(index), Some(Some(_)))
    }

    pub fn set_output(&mut self, index: usize, voltage: f32) {
        if let Some(slot) = self.outputs.get_mut(index) {
            *slot = voltage;
        }
    }

    pub fn output(&self, index: usize) -> f32 {
        self.outputs.get(index).copied().unwrap_or(0.0)
    }

    pub fn outputs(&self) -> &[f32] {
        &self.outputs
    }

    /// Brightness is clamped to [0, 1].
    pub fn set_light(&mut self, index: usize, brightness: f32) {
        if let Some(slot) = self.lights.get_mut(index) {
            *slot = brightness.clamp(0.0, 1.0);
        }
    }

    pub fn light(&self, index: usize) -> f32 {
        self.lights.get(index).copied().unwrap_or(0.0)
    }

    pub fn lights(&self) -> &[f32] {
        &self.lights
    }
}

pub trait Sampleable: Send {
    fn get_id(&self) -> &str;
    fn get_module_type(&self) -> &'static str;
    fn config(&self) -> &ModuleConfig;
    /// Advance one sample. Runs on the audio thread: must not block,
    /// allocate or panic.
    fn process(&mut self, args: &ProcessArgs, io: &mut ModuleIo);
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleSchema {
    pub name: String,
    pub description: String,
    pub voices: usize,
    pub config: ModuleConfig,
}

pub type SampleableConstructor = fn(&str) -> Result<Box<dyn Sampleable>>;

pub type ConstructorMap = HashMap<&'static str, SampleableConstructor>;

/// The static side of a module type: how to register it and how to
/// describe it.
pub trait Module {
    fn install_constructor(map: &mut ConstructorMap);
    fn get_schema() -> ModuleSchema;
}
