mod builder;
mod converter;
mod executor;
mod lexer;
mod token;
mod value;

pub use builder::{AstBuilder, MAX_DEPTH};
pub use converter::Converter;
pub use executor::Executor;
pub use lexer::Lexer;
pub use token::*;
pub use value::*;

use crate::functions::Function;
use std::sync::Arc;

/// Immutable expression tree.
///
/// Built once by [`AstBuilder`] and evaluated any number of times against
/// different bindings. It holds no reference to the text it came from.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Terminal(Operand),
    Unary {
        operator: UnaryOperator,
        operand: Box<Expression>,
    },
    Binary {
        operator: BinaryOperator,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Ternary {
        condition: Box<Expression>,
        then_branch: Box<Expression>,
        else_branch: Box<Expression>,
    },
    FunctionCall {
        function: Arc<Function>,
        arguments: Vec<Expression>,
    },
}

impl Expression {
    /// Number of nodes in the tree.
    pub fn size(&self) -> usize {
        match self {
            Expression::Terminal(_) => 1,
            Expression::Unary { operand, .. } => 1 + operand.size(),
            Expression::Binary { left, right, .. } => 1 + left.size() + right.size(),
            Expression::Ternary {
                condition,
                then_branch,
                else_branch,
            } => 1 + condition.size() + then_branch.size() + else_branch.size(),
            Expression::FunctionCall { arguments, .. } => {
                1 + arguments.iter().map(Expression::size).sum::<usize>()
            }
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Associativity {
    Left,
    Right,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    Plus,
    Minus,
    Not,
}

impl UnaryOperator {
    pub fn precedence(&self) -> u8 {
        9
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            UnaryOperator::Plus => "+",
            UnaryOperator::Minus => "-",
            UnaryOperator::Not => "!",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    Or,
    And,
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Power,
}

impl BinaryOperator {
    /// Binding strength, higher binds tighter. Ternary sits below all of these at 1.
    pub fn precedence(&self) -> u8 {
        match self {
            BinaryOperator::Or => 2,
            BinaryOperator::And => 3,
            BinaryOperator::Equal | BinaryOperator::NotEqual => 4,
            BinaryOperator::LessThan
            | BinaryOperator::LessThanOrEqual
            | BinaryOperator::GreaterThan
            | BinaryOperator::GreaterThanOrEqual => 5,
            BinaryOperator::Add | BinaryOperator::Subtract => 6,
            BinaryOperator::Multiply | BinaryOperator::Divide | BinaryOperator::Modulo => 7,
            BinaryOperator::Power => 8,
        }
    }

    pub fn associativity(&self) -> Associativity {
        match self {
            BinaryOperator::Power => Associativity::Right,
            _ => Associativity::Left,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOperator::Or => "||",
            BinaryOperator::And => "&&",
            BinaryOperator::Equal => "==",
            BinaryOperator::NotEqual => "!=",
            BinaryOperator::LessThan => "<",
            BinaryOperator::LessThanOrEqual => "<=",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::GreaterThanOrEqual => ">=",
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Modulo => "%",
            BinaryOperator::Power => "^",
        }
    }
}

impl TryFrom<&str> for BinaryOperator {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "||" => Ok(BinaryOperator::Or),
            "&&" => Ok(BinaryOperator::And),
            "==" => Ok(BinaryOperator::Equal),
            "!=" => Ok(BinaryOperator::NotEqual),
            "<" => Ok(BinaryOperator::LessThan),
            "<=" => Ok(BinaryOperator::LessThanOrEqual),
            ">" => Ok(BinaryOperator::GreaterThan),
            ">=" => Ok(BinaryOperator::GreaterThanOrEqual),
            "+" => Ok(BinaryOperator::Add),
            "-" => Ok(BinaryOperator::Subtract),
            "*" => Ok(BinaryOperator::Multiply),
            "/" => Ok(BinaryOperator::Divide),
            "%" => Ok(BinaryOperator::Modulo),
            "^" => Ok(BinaryOperator::Power),
            _ => Err(format!("Unknown operator: {}", value)),
        }
    }
}
