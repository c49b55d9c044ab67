pub mod aggregate;
pub mod constants;
pub mod math;
mod registry;
pub mod strings;

pub use registry::{Constant, Function, Implementation, Registry};

use once_cell::sync::Lazy;
use std::sync::Arc;

/// Registry built from the default catalogue, shared by every default evaluator.
pub static DEFAULT_REGISTRY: Lazy<Arc<Registry>> = Lazy::new(|| {
    let mut registry = Registry::default();
    for function in default_functions() {
        registry.insert_function(function);
    }
    for constant in default_constants() {
        registry.insert_constant(constant);
    }
    Arc::new(registry)
});

/// Trigonometry, rounding, logarithms, aggregates and string functions.
pub fn default_functions() -> Vec<Function> {
    let mut functions = Vec::new();
    math::register(&mut functions);
    aggregate::register(&mut functions);
    strings::register(&mut functions);
    functions
}

/// `pi` and `e`.
pub fn default_constants() -> Vec<Constant> {
    let mut constants = Vec::new();
    constants::register(&mut constants);
    constants
}
