//! Plank oscillator core library
//!
//! This crate provides the per-sample DSP for the `plank` family of oscillator
//! modules. It is a pure library: the host owns the audio thread, the panel and
//! the persistence of parameter values. Everything here is driven through
//! [`types::Sampleable::process`], once per audio sample.

#[macro_use]
extern crate lazy_static;

extern crate serde;
extern crate serde_json;

pub mod config;
pub mod dsp;
pub mod patch;
pub mod types;

// Re-export commonly used items
pub use config::{ModuleState, PatchFile};
pub use patch::Patch;

pub use types::{
    Module, ModuleConfig, ModuleIo, ModuleSchema, ParamConfig, PortConfig, ProcessArgs, Sampleable,
    SampleableConstructor,
};
