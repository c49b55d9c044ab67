use crate::ast::Value;
use crate::error::{ConfigError, FunctionError};
use log::debug;
use std::collections::HashMap;
use std::fmt;
use std::ops::RangeInclusive;
use std::sync::Arc;

pub type Implementation = Arc<dyn Fn(&[Value]) -> Result<Value, FunctionError> + Send + Sync>;

/// A named callable with an inclusive argument-count range.
#[derive(Clone)]
pub struct Function {
    name: String,
    arity: RangeInclusive<usize>,
    implementation: Implementation,
}

impl Function {
    pub fn new<F>(name: &str, arity: RangeInclusive<usize>, implementation: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, FunctionError> + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            arity,
            implementation: Arc::new(implementation),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arity(&self) -> &RangeInclusive<usize> {
        &self.arity
    }

    pub fn accepts(&self, count: usize) -> bool {
        self.arity.contains(&count)
    }

    /// Human readable arity, e.g. `2`, `2..3` or `at least 2`.
    pub fn describe_arity(&self) -> String {
        let (min, max) = (*self.arity.start(), *self.arity.end());
        if min == max {
            min.to_string()
        } else if max == usize::MAX {
            format!("at least {}", min)
        } else {
            format!("{}..{}", min, max)
        }
    }

    pub fn call(&self, args: &[Value]) -> Result<Value, FunctionError> {
        (self.implementation)(args)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish_non_exhaustive()
    }
}

/// Functions compare by signature; implementations are opaque.
impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.arity == other.arity
    }
}

/// A named value substituted into the token stream at lex time.
#[derive(Debug, Clone, PartialEq)]
pub struct Constant {
    pub name: String,
    pub value: Value,
}

impl Constant {
    pub fn new(name: &str, value: impl Into<Value>) -> Self {
        Self {
            name: name.to_string(),
            value: value.into(),
        }
    }
}

/// Name lookup for functions and constants. Immutable once built.
#[derive(Debug, Default)]
pub struct Registry {
    functions: HashMap<String, Arc<Function>>,
    constants: HashMap<String, Value>,
}

impl Registry {
    /// Builds a registry, rejecting duplicate function names and duplicate
    /// constant names. A function and a constant may share a name.
    pub fn new(functions: Vec<Function>, constants: Vec<Constant>) -> Result<Self, ConfigError> {
        let mut registry = Registry::default();

        for function in functions {
            if registry.functions.contains_key(function.name()) {
                return Err(ConfigError::DuplicateFunction(function.name));
            }
            registry.insert_function(function);
        }

        for constant in constants {
            if registry.constants.contains_key(&constant.name) {
                return Err(ConfigError::DuplicateConstant(constant.name));
            }
            registry.insert_constant(constant);
        }

        debug!(
            "Registry built with {} functions and {} constants",
            registry.functions.len(),
            registry.constants.len()
        );
        Ok(registry)
    }

    pub(crate) fn insert_function(&mut self, function: Function) {
        self.functions
            .insert(function.name.clone(), Arc::new(function));
    }

    pub(crate) fn insert_constant(&mut self, constant: Constant) {
        self.constants.insert(constant.name, constant.value);
    }

    pub fn function(&self, name: &str) -> Option<&Arc<Function>> {
        self.functions.get(name)
    }

    pub fn constant(&self, name: &str) -> Option<&Value> {
        self.constants.get(name)
    }

    pub fn function_names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }

    pub fn constant_names(&self) -> impl Iterator<Item = &str> {
        self.constants.keys().map(String::as_str)
    }
}
