//! Embeddable expression language.
//!
//! Expressions mix numbers, booleans and strings with arithmetic, comparison,
//! logical and ternary operators, plus calls into a registry of named
//! functions and constants:
//!
//! ```
//! use formulate_rs::{Bindings, Evaluator, Value};
//!
//! let evaluator = Evaluator::default();
//! let mut bindings = Bindings::new();
//! bindings.insert("price".to_string(), Value::Number(120.0));
//!
//! assert_eq!(evaluator.evaluate_boolean("price > 100 && length('ok') == 2", &bindings), Ok(true));
//! ```
//!
//! Text is lexed, reordered into postfix, built into an [`ast::Expression`]
//! and then walked. [`Evaluator::preprocess`] stops before the walk so the
//! same tree can be evaluated against many bindings.

pub mod ast;
pub mod error;
pub mod evaluator;
pub mod functions;

pub use ast::{Bindings, Expression, Value, ValueKind};
pub use error::{ConfigError, Error, FunctionError, LexError, Result, SyntaxError, TypeError};
pub use evaluator::{Config, Evaluator, Source};
pub use functions::{Constant, Function, Registry};

use once_cell::sync::Lazy;

static DEFAULT_EVALUATOR: Lazy<Evaluator> = Lazy::new(Evaluator::default);

/// One-shot evaluation with the default catalogue and separators.
pub fn evaluate_expression(expression: &str, bindings: &Bindings) -> Result<Value> {
    DEFAULT_EVALUATOR.evaluate(expression, bindings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evaluate_expression() {
        let bindings = Bindings::from([("x".to_string(), Value::Number(4.0))]);
        assert_eq!(evaluate_expression("sqrt(x) + 1", &bindings), Ok(Value::Number(3.0)));
        assert!(evaluate_expression("sqrt(", &bindings).is_err());
    }
}
