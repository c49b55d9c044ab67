use crate::ast::{Associativity, BinaryOperator, UnaryOperator};
use crate::functions::Function;
use std::fmt;
use std::sync::Arc;

/// Lexical unit shared by the lexer, converter and tree builder.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Operand(Operand),
    Operator(Operator),
    Bracket(Bracket),
    FunctionCall(FunctionCall),
    /// Argument separator. Only bounds arity while lexing.
    Delimiter,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Number(f64),
    Boolean(bool),
    String(String),
    /// Resolved late, against the caller's bindings.
    Variable(String),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Bracket {
    Left,
    Right,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Operator {
    Unary(UnaryOperator),
    Binary(BinaryOperator),
    /// `?` as produced by the lexer.
    TernaryIf,
    /// `:` as produced by the lexer.
    TernaryElse,
    /// `?` and `:` combined by the converter.
    Ternary,
}

impl Operator {
    pub fn precedence(&self) -> u8 {
        match self {
            Operator::Unary(op) => op.precedence(),
            Operator::Binary(op) => op.precedence(),
            Operator::TernaryIf | Operator::TernaryElse | Operator::Ternary => 1,
        }
    }

    pub fn associativity(&self) -> Associativity {
        match self {
            Operator::Unary(_) => Associativity::Right,
            Operator::Binary(op) => op.associativity(),
            Operator::TernaryIf | Operator::TernaryElse | Operator::Ternary => Associativity::Right,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Unary(op) => op.symbol(),
            Operator::Binary(op) => op.symbol(),
            Operator::TernaryIf => "?",
            Operator::TernaryElse => ":",
            Operator::Ternary => "?:",
        }
    }
}

/// A function call site: the resolved function plus the argument count
/// written at this site.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub function: Arc<Function>,
    pub arity: usize,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Operand(Operand::Number(n)) => write!(f, "{}", n),
            Token::Operand(Operand::Boolean(b)) => write!(f, "{}", b),
            Token::Operand(Operand::String(s)) => write!(f, "'{}'", s),
            Token::Operand(Operand::Variable(name)) => f.write_str(name),
            Token::Operator(op) => f.write_str(op.symbol()),
            Token::Bracket(Bracket::Left) => f.write_str("("),
            Token::Bracket(Bracket::Right) => f.write_str(")"),
            Token::FunctionCall(call) => write!(f, "{}/{}", call.function.name(), call.arity),
            Token::Delimiter => f.write_str(","),
        }
    }
}
