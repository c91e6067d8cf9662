use anyhow::{Result, anyhow};

use crate::types::{ConstructorMap, ModuleSchema, Sampleable};

pub mod consts;
pub mod oscillators;
pub mod utilities;
pub mod utils;

lazy_static! {
    static ref CONSTRUCTORS: ConstructorMap = {
        let mut map = ConstructorMap::new();
        oscillators::install_constructors(&mut map);
        tracing::debug!(module_types = map.len(), "module registry initialized");
        map
    };
}

/// The process-wide module registry: `module_type` -> constructor.
///
/// Built on first access and never mutated afterwards.
pub fn get_constructors() -> &'static ConstructorMap {
    &CONSTRUCTORS
}

/// Construct a module instance by its registered type.
pub fn construct(module_type: &str, id: &str) -> Result<Box<dyn Sampleable>> {
    let constructor = get_constructors()
        .get(module_type)
        .ok_or_else(|| anyhow!("unknown module type '{}'", module_type))?;
    constructor(id)
}

pub fn schemas() -> Vec<ModuleSchema> {
    let mut schemas = oscillators::schemas();
    schemas.sort_by(|a, b| a.name.cmp(&b.name));
    schemas
}
