//! Core patch structure for DSP processing
//!
//! A `Patch` owns a set of module instances, each with its own port storage,
//! and steps them once per sample. There are no cables: every instance reads
//! only the params and inputs the host wrote into its `ModuleIo`.

use anyhow::{Result, bail};

use crate::types::{ModuleIo, ProcessArgs, Sampleable};

/// A module together with the ports the host drives it through.
pub struct ModuleInstance {
    pub module: Box<dyn Sampleable>,
    pub io: ModuleIo,
}

impl ModuleInstance {
    pub fn new(module: Box<dyn Sampleable>) -> Self {
        let io = ModuleIo::new(module.config());
        ModuleInstance { module, io }
    }

    pub fn id(&self) -> &str {
        self.module.get_id()
    }

    pub fn process(&mut self, args: &ProcessArgs) {
        self.module.process(args, &mut self.io);
    }

    /// Read an output port by name, 0 V if it does not exist.
    pub fn output(&self, port: &str) -> f32 {
        self.module
            .config()
            .output_index(port)
            .map(|index| self.io.output(index))
            .unwrap_or_default()
    }
}

/// The core patch structure containing the DSP instances
pub struct Patch {
    args: ProcessArgs,
    instances: Vec<ModuleInstance>,
}

impl Patch {
    pub fn new(sample_rate: f32) -> Result<Self> {
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            bail!("sample rate must be a positive number, got {}", sample_rate);
        }
        Ok(Patch {
            args: ProcessArgs::new(sample_rate),
            instances: Vec::new(),
        })
    }

    pub fn args(&self) -> &ProcessArgs {
        &self.args
    }

    pub fn sample_rate(&self) -> f32 {
        self.args.sample_rate
    }

    /// Add a module. Ids must be unique within the patch.
    pub fn insert(&mut self, module: Box<dyn Sampleable>) -> Result<&mut ModuleInstance> {
        if self.get(module.get_id()).is_some() {
            bail!("duplicate module id '{}'", module.get_id());
        }
        tracing::debug!(
            id = module.get_id(),
            module_type = module.get_module_type(),
            "added module to patch"
        );
        self.instances.push(ModuleInstance::new(module));
        let last = self.instances.len() - 1;
        Ok(&mut self.instances[last])
    }

    pub fn get(&self, id: &str) -> Option<&ModuleInstance> {
        self.instances.iter().find(|i| i.id() == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut ModuleInstance> {
        self.instances.iter_mut().find(|i| i.id() == id)
    }

    pub fn instances(&self) -> &[ModuleInstance] {
        &self.instances
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Process one sample for every instance, in insertion order.
    pub fn process_frame(&mut self) {
        profiling::scope!("process_frame");
        let args = self.args;
        for instance in &mut self.instances {
            instance.process(&args);
        }
    }

    /// Get an output voltage by module id and port name.
    pub fn get_output(&self, id: &str, port: &str) -> f32 {
        self.get(id)
            .map(|instance| instance.output(port))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::construct;
    use crate::types::ModuleConfig;

    struct CountingSampleable {
        id: String,
        config: ModuleConfig,
        calls: usize,
    }

    impl Sampleable for CountingSampleable {
        fn get_id(&self) -> &str {
            &self.id
        }

        fn get_module_type(&self) -> &'static str {
            "counter"
        }

        fn config(&self) -> &ModuleConfig {
            &self.config
        }

        fn process(&mut self, _args: &ProcessArgs, io: &mut ModuleIo) {
            self.calls += 1;
            io.set_output(0, self.calls as f32);
        }
    }

    fn counter(id: &str) -> Box<dyn Sampleable> {
        Box::new(CountingSampleable {
            id: id.to_string(),
            config: ModuleConfig {
                outputs: vec![crate::types::PortConfig::new("count", "Count")],
                ..Default::default()
            },
            calls: 0,
        })
    }

    #[test]
    fn test_patch_new_empty() {
        let patch = Patch::new(48000.0).unwrap();
        assert!(patch.is_empty());
        assert_eq!(patch.sample_rate(), 48000.0);
    }

    #[test]
    fn test_patch_rejects_bad_sample_rate() {
        assert!(Patch::new(0.0).is_err());
        assert!(Patch::new(-44100.0).is_err());
        assert!(Patch::new(f32::NAN).is_err());
    }

    #[test]
    fn test_patch_get_output_missing_module() {
        let patch = Patch::new(48000.0).unwrap();
        assert_eq!(patch.get_output("nope", "output"), 0.0);
    }

    #[test]
    fn test_patch_processes_every_instance() {
        let mut patch = Patch::new(48000.0).unwrap();
        patch.insert(counter("a")).unwrap();
        patch.insert(counter("b")).unwrap();
        for _ in 0..5 {
            patch.process_frame();
        }
        assert_eq!(patch.get_output("a", "count"), 5.0);
        assert_eq!(patch.get_output("b", "count"), 5.0);
        assert_eq!(patch.get_output("b", "missing"), 0.0);
    }

    #[test]
    fn test_patch_rejects_duplicate_ids() {
        let mut patch = Patch::new(48000.0).unwrap();
        patch.insert(counter("a")).unwrap();
        let err = patch.insert(counter("a")).err().expect("expected an error");
        assert!(err.to_string().contains("duplicate"));
        assert_eq!(patch.len(), 1);
    }

    #[test]
    fn test_patch_drives_registered_module() {
        let mut patch = Patch::new(48000.0).unwrap();
        let instance = patch.insert(construct("planky", "osc").unwrap()).unwrap();
        instance.io.set_param(0, 480.0);
        for _ in 0..25 {
            patch.process_frame();
        }
        // 480 Hz at 48 kHz: a quarter cycle every 25 samples.
        let out = patch.get_output("osc", "osc1");
        assert!((out - 5.0).abs() < 1e-3, "expected peak, got {out}");
    }
}
