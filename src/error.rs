use crate::ast::{Value, ValueKind};
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors raised while turning source text into tokens.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LexError {
    #[error("unexpected character '{character}' at position {position}")]
    UnexpectedCharacter { character: char, position: usize },

    #[error("malformed expression: '{operator}' at position {position} requires an operand after it")]
    DanglingOperator { operator: String, position: usize },

    #[error("error parsing number '{literal}' at position {position}")]
    InvalidNumber { literal: String, position: usize },

    #[error("unterminated string literal starting at position {position}")]
    UnterminatedString { position: usize },

    #[error("invalid escape sequence '\\{character}' at position {position}")]
    InvalidEscape { character: char, position: usize },

    #[error("function not found: '{name}' at position {position}")]
    UnknownFunction { name: String, position: usize },

    #[error("function '{name}' is called with {found} arguments, expected {expected}")]
    Arity {
        name: String,
        expected: String,
        found: usize,
    },
}

/// Errors raised while reordering tokens or assembling the tree.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SyntaxError {
    #[error("mismatched parenthesis")]
    MismatchedParenthesis,

    #[error("ternary operator requires both '?' and ':'")]
    UnpairedTernary,

    #[error("operator '{operator}' is missing an operand")]
    MissingOperand { operator: String },

    #[error("unexpected token {token}")]
    UnexpectedToken { token: String },

    #[error("empty expression")]
    EmptyExpression,

    #[error("expression has {count} operands without an operator joining them")]
    DanglingOperands { count: usize },

    #[error("expression nests deeper than {limit} levels")]
    TooDeep { limit: usize },
}

/// An operand or result has the wrong kind.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TypeError {
    #[error("'{operator}' cannot be applied to {left} and {right}")]
    Operator {
        operator: &'static str,
        left: ValueKind,
        right: ValueKind,
    },

    #[error("unary '{operator}' cannot be applied to {operand}")]
    UnaryOperator {
        operator: &'static str,
        operand: ValueKind,
    },

    #[error("ternary condition must be a boolean, got {found}")]
    Condition { found: ValueKind },

    #[error("expression must evaluate to a {expected}, but got {found}")]
    Result { expected: ValueKind, found: ValueKind },
}

/// Raised by function implementations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FunctionError {
    #[error("{function} expects {expected} arguments, but got {found}")]
    ArgumentCount {
        function: String,
        expected: String,
        found: usize,
    },

    #[error("{function} argument {position} must be a {expected}, got {found}")]
    ArgumentType {
        function: String,
        position: usize,
        expected: ValueKind,
        found: ValueKind,
    },

    #[error("{function}: {message}")]
    InvalidArgument { function: String, message: String },
}

impl FunctionError {
    pub fn argument_count(function: &str, expected: impl ToString, found: usize) -> Self {
        FunctionError::ArgumentCount {
            function: function.to_string(),
            expected: expected.to_string(),
            found,
        }
    }

    pub fn argument_type(function: &str, position: usize, expected: ValueKind, found: &Value) -> Self {
        FunctionError::ArgumentType {
            function: function.to_string(),
            position,
            expected,
            found: found.kind(),
        }
    }

    pub fn expected_number(function: &str, position: usize, found: &Value) -> Self {
        Self::argument_type(function, position, ValueKind::Number, found)
    }

    pub fn expected_boolean(function: &str, position: usize, found: &Value) -> Self {
        Self::argument_type(function, position, ValueKind::Boolean, found)
    }

    pub fn expected_string(function: &str, position: usize, found: &Value) -> Self {
        Self::argument_type(function, position, ValueKind::String, found)
    }

    pub fn invalid_argument(function: &str, message: impl Into<String>) -> Self {
        FunctionError::InvalidArgument {
            function: function.to_string(),
            message: message.into(),
        }
    }
}

/// Rejected evaluator or registry configuration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("function '{0}' is registered more than once")]
    DuplicateFunction(String),

    #[error("constant '{0}' is registered more than once")]
    DuplicateConstant(String),

    #[error("decimal and argument separators must differ, both are '{0}'")]
    SeparatorConflict(char),

    #[error("'{0}' cannot be used as a separator")]
    InvalidSeparator(char),
}

/// Any failure of the lex → convert → build → evaluate pipeline.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("lex error: {0}")]
    Lex(#[from] LexError),

    #[error("syntax error: {0}")]
    Syntax(#[from] SyntaxError),

    #[error("could not resolve variable '{name}'")]
    UnresolvedVariable { name: String },

    #[error("type error: {0}")]
    Type(#[from] TypeError),

    #[error("function error: {0}")]
    Function(#[from] FunctionError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_errors_convert_into_error() {
        let err: Error = SyntaxError::MismatchedParenthesis.into();
        assert_eq!(err.to_string(), "syntax error: mismatched parenthesis");

        let err: Error = FunctionError::argument_type("length", 0, ValueKind::String, &Value::Number(1.0)).into();
        assert_eq!(
            err.to_string(),
            "function error: length argument 0 must be a string, got number"
        );
    }
}
