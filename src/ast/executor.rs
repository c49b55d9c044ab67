use crate::ast::{BinaryOperator, Bindings, Expression, Operand, UnaryOperator, Value, ValueKind};
use crate::error::{Error, Result, TypeError};
use log::trace;

/// Walks an [`Expression`] against one set of variable bindings.
pub struct Executor<'a> {
    bindings: &'a Bindings,
}

impl<'a> Executor<'a> {
    pub fn new(bindings: &'a Bindings) -> Self {
        Self { bindings }
    }

    pub fn evaluate(&self, expression: &Expression) -> Result<Value> {
        match expression {
            Expression::Terminal(operand) => self.resolve(operand),

            Expression::Unary { operator, operand } => {
                let value = self.evaluate(operand)?;
                Ok(apply_unary(*operator, value)?)
            }

            Expression::Binary {
                operator,
                left,
                right,
            } => {
                let left_value = self.evaluate(left)?;
                let right_value = self.evaluate(right)?;
                Ok(apply_binary(*operator, left_value, right_value)?)
            }

            // Only the selected branch is evaluated.
            Expression::Ternary {
                condition,
                then_branch,
                else_branch,
            } => match self.evaluate(condition)? {
                Value::Boolean(true) => self.evaluate(then_branch),
                Value::Boolean(false) => self.evaluate(else_branch),
                other => Err(TypeError::Condition {
                    found: other.kind(),
                }
                .into()),
            },

            Expression::FunctionCall {
                function,
                arguments,
            } => {
                let values = arguments
                    .iter()
                    .map(|argument| self.evaluate(argument))
                    .collect::<Result<Vec<_>>>()?;
                trace!("Calling {} with {:?}", function.name(), values);
                Ok(function.call(&values)?)
            }
        }
    }

    pub fn evaluate_number(&self, expression: &Expression) -> Result<f64> {
        match self.evaluate(expression)? {
            Value::Number(n) => Ok(n),
            other => Err(unexpected_result(ValueKind::Number, &other)),
        }
    }

    pub fn evaluate_boolean(&self, expression: &Expression) -> Result<bool> {
        match self.evaluate(expression)? {
            Value::Boolean(b) => Ok(b),
            other => Err(unexpected_result(ValueKind::Boolean, &other)),
        }
    }

    pub fn evaluate_string(&self, expression: &Expression) -> Result<String> {
        match self.evaluate(expression)? {
            Value::String(s) => Ok(s),
            other => Err(unexpected_result(ValueKind::String, &other)),
        }
    }

    fn resolve(&self, operand: &Operand) -> Result<Value> {
        match operand {
            Operand::Number(n) => Ok(Value::Number(*n)),
            Operand::Boolean(b) => Ok(Value::Boolean(*b)),
            Operand::String(s) => Ok(Value::String(s.clone())),
            Operand::Variable(name) => {
                trace!("Resolving variable {}", name);
                self.bindings
                    .get(name)
                    .cloned()
                    .ok_or_else(|| Error::UnresolvedVariable { name: name.clone() })
            }
        }
    }
}

fn unexpected_result(expected: ValueKind, found: &Value) -> Error {
    TypeError::Result {
        expected,
        found: found.kind(),
    }
    .into()
}

fn apply_unary(operator: UnaryOperator, value: Value) -> Result<Value, TypeError> {
    match (operator, value) {
        (UnaryOperator::Plus, Value::Number(n)) => Ok(Value::Number(n)),
        (UnaryOperator::Minus, Value::Number(n)) => Ok(Value::Number(-n)),
        (UnaryOperator::Not, Value::Boolean(b)) => Ok(Value::Boolean(!b)),
        (operator, value) => Err(TypeError::UnaryOperator {
            operator: operator.symbol(),
            operand: value.kind(),
        }),
    }
}

fn apply_binary(operator: BinaryOperator, left: Value, right: Value) -> Result<Value, TypeError> {
    let mismatch = || TypeError::Operator {
        operator: operator.symbol(),
        left: left.kind(),
        right: right.kind(),
    };

    match operator {
        BinaryOperator::Add => match (&left, &right) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
            (Value::String(_), _) | (_, Value::String(_)) => {
                Ok(Value::String(format!("{}{}", left, right)))
            }
            _ => Err(mismatch()),
        },

        BinaryOperator::Subtract
        | BinaryOperator::Multiply
        | BinaryOperator::Divide
        | BinaryOperator::Modulo
        | BinaryOperator::Power => {
            let (Value::Number(a), Value::Number(b)) = (&left, &right) else {
                return Err(mismatch());
            };
            let result = match operator {
                BinaryOperator::Subtract => a - b,
                BinaryOperator::Multiply => a * b,
                BinaryOperator::Divide => a / b,
                BinaryOperator::Modulo => a % b,
                _ => a.powf(*b),
            };
            Ok(Value::Number(result))
        }

        BinaryOperator::LessThan
        | BinaryOperator::LessThanOrEqual
        | BinaryOperator::GreaterThan
        | BinaryOperator::GreaterThanOrEqual => match (&left, &right) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Boolean(compare(operator, a, b))),
            (Value::String(a), Value::String(b)) => Ok(Value::Boolean(compare(operator, a, b))),
            _ => Err(mismatch()),
        },

        BinaryOperator::Equal => Ok(Value::Boolean(left == right)),
        BinaryOperator::NotEqual => Ok(Value::Boolean(left != right)),

        BinaryOperator::And | BinaryOperator::Or => match (&left, &right) {
            (Value::Boolean(a), Value::Boolean(b)) => Ok(Value::Boolean(
                if operator == BinaryOperator::And {
                    *a && *b
                } else {
                    *a || *b
                },
            )),
            _ => Err(mismatch()),
        },
    }
}

fn compare<T: PartialOrd + ?Sized>(operator: BinaryOperator, a: &T, b: &T) -> bool {
    match operator {
        BinaryOperator::LessThan => a < b,
        BinaryOperator::LessThanOrEqual => a <= b,
        BinaryOperator::GreaterThan => a > b,
        _ => a >= b,
    }
}
