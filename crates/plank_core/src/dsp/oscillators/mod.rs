use crate::types::{ConstructorMap, Module, ModuleSchema};

pub mod bank;
pub mod frequency;
pub mod voice;

use bank::{Plank, Planky};

pub fn install_constructors(map: &mut ConstructorMap) {
    Plank::install_constructor(map);
    Planky::install_constructor(map);
}

pub fn schemas() -> Vec<ModuleSchema> {
    vec![Plank::get_schema(), Planky::get_schema()]
}
