//! Patch files: the JSON description of which modules to build and how their
//! knobs and jacks are set.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::dsp::{consts::DEFAULT_SAMPLE_RATE, construct};
use crate::patch::Patch;

fn default_sample_rate() -> f32 {
    DEFAULT_SAMPLE_RATE
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PatchFile {
    /// Sample rate in Hz
    #[serde(default = "default_sample_rate")]
    pub sample_rate: f32,
    pub modules: Vec<ModuleState>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ModuleState {
    pub id: String,
    pub module_type: String,
    /// Param values by name; missing params keep their default
    #[serde(default)]
    pub params: BTreeMap<String, f32>,
    /// Patched input voltages by port name; missing inputs are unpatched
    #[serde(default)]
    pub inputs: BTreeMap<String, f32>,
}

impl PatchFile {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("invalid patch JSON")
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .with_context(|| format!("failed to read patch file {}", path.display()))?;
        Self::from_json_str(&json).with_context(|| format!("in patch file {}", path.display()))
    }

    /// Construct every module and apply its params and inputs.
    ///
    /// Out-of-range params are clamped to the declared range; unknown names and
    /// non-finite values are errors.
    pub fn build(&self) -> Result<Patch> {
        let mut patch = Patch::new(self.sample_rate)?;

        for state in &self.modules {
            let module = construct(&state.module_type, &state.id)
                .with_context(|| format!("failed to create module {}", state.id))?;
            let instance = patch.insert(module)?;
            let config = instance.module.config().clone();

            for (name, value) in &state.params {
                let index = config.param_index(name).ok_or_else(|| {
                    anyhow!(
                        "{} with id {} does not have param '{}'",
                        state.module_type,
                        state.id,
                        name
                    )
                })?;
                if !value.is_finite() {
                    bail!("param '{}' of module {} is not finite", name, state.id);
                }
                let stored = instance.io.set_param(index, *value).unwrap_or_default();
                if stored != *value {
                    tracing::warn!(id = %state.id, param = %name, value, stored, "param clamped");
                }
            }

            for (name, voltage) in &state.inputs {
                let index = config.input_index(name).ok_or_else(|| {
                    anyhow!(
                        "{} with id {} does not have input '{}'",
                        state.module_type,
                        state.id,
                        name
                    )
                })?;
                if !voltage.is_finite() {
                    bail!("input '{}' of module {} is not finite", name, state.id);
                }
                instance.io.set_input(index, Some(*voltage));
            }
        }

        tracing::debug!(
            modules = patch.len(),
            sample_rate = patch.sample_rate(),
            "patch built"
        );
        Ok(patch)
    }
}

/// JSON Schema for the patch file format.
pub fn patch_file_schema() -> schemars::Schema {
    schemars::schema_for!(PatchFile)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    fn parse(value: serde_json::Value) -> Result<PatchFile> {
        PatchFile::from_json_str(&value.to_string())
    }

    #[test]
    fn test_sample_rate_defaults() {
        let file = parse(json!({ "modules": [] })).unwrap();
        assert_eq!(file.sample_rate, DEFAULT_SAMPLE_RATE);
    }

    #[test]
    fn test_build_applies_params_and_inputs() {
        let file = parse(json!({
            "sampleRate": 44100,
            "modules": [
                { "id": "a", "moduleType": "plank", "params": { "freq": 0.5 }, "inputs": { "freq": 1.0 } },
                { "id": "b", "moduleType": "planky", "params": { "osc2": 7 } }
            ]
        }))
        .unwrap();
        let patch = file.build().unwrap();
        assert_eq!(patch.sample_rate(), 44100.0);

        let a = patch.get("a").unwrap();
        assert_eq!(a.io.param(0), 0.5);
        assert_eq!(a.io.input(0), 1.0);

        let b = patch.get("b").unwrap();
        assert_eq!(b.io.params(), &[440.0, 0.0, 7.0, 0.0]);
        assert!(!b.io.is_connected(0));
    }

    #[test]
    fn test_build_clamps_out_of_range_params() {
        let file = parse(json!({
            "modules": [{ "id": "b", "moduleType": "planky", "params": { "freq": 5, "osc3": 40 } }]
        }))
        .unwrap();
        let patch = file.build().unwrap();
        assert_eq!(patch.get("b").unwrap().io.params(), &[20.0, 0.0, 0.0, 12.0]);
    }

    #[test]
    fn test_build_rejects_unknown_module_type() {
        let file = parse(json!({ "modules": [{ "id": "x", "moduleType": "saw" }] })).unwrap();
        let err = file.build().err().expect("expected an error");
        assert!(format!("{:#}", err).contains("unknown module type 'saw'"));
    }

    #[test]
    fn test_build_rejects_unknown_param() {
        let file = parse(json!({
            "modules": [{ "id": "x", "moduleType": "plank", "params": { "osc1": 1 } }]
        }))
        .unwrap();
        let err = file.build().err().expect("expected an error");
        assert!(err.to_string().contains("does not have param 'osc1'"));
    }

    #[test]
    fn test_build_rejects_unknown_input() {
        let file = parse(json!({
            "modules": [{ "id": "x", "moduleType": "plank", "inputs": { "sync": 1 } }]
        }))
        .unwrap();
        assert!(file.build().is_err());
    }

    #[test]
    fn test_build_rejects_duplicate_ids() {
        let file = parse(json!({
            "modules": [
                { "id": "x", "moduleType": "plank" },
                { "id": "x", "moduleType": "planky" }
            ]
        }))
        .unwrap();
        assert!(file.build().is_err());
    }

    #[test]
    fn test_build_rejects_bad_sample_rate() {
        let file = parse(json!({ "sampleRate": 0, "modules": [] })).unwrap();
        assert!(file.build().is_err());
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        assert!(parse(json!({ "modules": [], "bpm": 120 })).is_err());
        assert!(parse(json!({ "modules": [{ "id": "x", "type": "plank" }] })).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "modules": [{{ "id": "osc", "moduleType": "planky" }}] }}"#
        )
        .unwrap();

        let patch_file = PatchFile::load(file.path()).unwrap();
        assert_eq!(patch_file.modules.len(), 1);
        assert_eq!(patch_file.modules[0].module_type, "planky");
    }

    #[test]
    fn test_load_missing_file_names_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.json");
        let err = PatchFile::load(&path).err().expect("expected an error");
        assert!(err.to_string().contains("missing.json"));
    }

    #[test]
    fn test_patch_file_schema_lists_fields() {
        let schema = serde_json::to_value(patch_file_schema()).unwrap();
        let properties = &schema["properties"];
        assert!(properties.get("sampleRate").is_some());
        assert!(properties.get("modules").is_some());
    }
}
