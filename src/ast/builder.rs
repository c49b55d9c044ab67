use crate::ast::{Expression, FunctionCall, Operator, Token};
use crate::error::SyntaxError;
use log::debug;

/// Deepest tree the builder accepts. Evaluation recurses once per level.
pub const MAX_DEPTH: usize = 256;

/// Assembles an [`Expression`] from postfix tokens with a node stack.
pub struct AstBuilder;

/// A finished subtree and its depth.
struct Node {
    expression: Expression,
    depth: usize,
}

impl AstBuilder {
    pub fn build(postfix: Vec<Token>) -> Result<Expression, SyntaxError> {
        let mut stack: Vec<Node> = Vec::with_capacity(postfix.len());

        for token in postfix {
            let node = match token {
                Token::Operand(operand) => Node {
                    expression: Expression::Terminal(operand),
                    depth: 1,
                },
                Token::Operator(Operator::Unary(operator)) => {
                    let operand = Self::pop(&mut stack, operator.symbol())?;
                    Node {
                        depth: operand.depth + 1,
                        expression: Expression::Unary {
                            operator,
                            operand: Box::new(operand.expression),
                        },
                    }
                }
                Token::Operator(Operator::Binary(operator)) => {
                    let right = Self::pop(&mut stack, operator.symbol())?;
                    let left = Self::pop(&mut stack, operator.symbol())?;
                    Node {
                        depth: left.depth.max(right.depth) + 1,
                        expression: Expression::Binary {
                            operator,
                            left: Box::new(left.expression),
                            right: Box::new(right.expression),
                        },
                    }
                }
                Token::Operator(Operator::Ternary) => {
                    let symbol = Operator::Ternary.symbol();
                    let else_branch = Self::pop(&mut stack, symbol)?;
                    let then_branch = Self::pop(&mut stack, symbol)?;
                    let condition = Self::pop(&mut stack, symbol)?;
                    Node {
                        depth: condition.depth.max(then_branch.depth).max(else_branch.depth) + 1,
                        expression: Expression::Ternary {
                            condition: Box::new(condition.expression),
                            then_branch: Box::new(then_branch.expression),
                            else_branch: Box::new(else_branch.expression),
                        },
                    }
                }
                Token::FunctionCall(FunctionCall { function, arity }) => {
                    if stack.len() < arity {
                        return Err(SyntaxError::MissingOperand {
                            operator: function.name().to_string(),
                        });
                    }
                    let arguments = stack.split_off(stack.len() - arity);
                    let depth = arguments.iter().map(|node| node.depth).max().unwrap_or(0) + 1;
                    Node {
                        depth,
                        expression: Expression::FunctionCall {
                            function,
                            arguments: arguments.into_iter().map(|node| node.expression).collect(),
                        },
                    }
                }
                other => {
                    return Err(SyntaxError::UnexpectedToken {
                        token: other.to_string(),
                    })
                }
            };

            if node.depth > MAX_DEPTH {
                return Err(SyntaxError::TooDeep { limit: MAX_DEPTH });
            }
            stack.push(node);
        }

        let root = stack.pop().ok_or(SyntaxError::EmptyExpression)?;
        if !stack.is_empty() {
            return Err(SyntaxError::DanglingOperands {
                count: stack.len() + 1,
            });
        }

        debug!("Built tree with {} nodes, depth {}", root.expression.size(), root.depth);
        Ok(root.expression)
    }

    fn pop(stack: &mut Vec<Node>, operator: &str) -> Result<Node, SyntaxError> {
        stack.pop().ok_or_else(|| SyntaxError::MissingOperand {
            operator: operator.to_string(),
        })
    }
}
