use crate::ast::{Associativity, Bracket, FunctionCall, Operator, Token};
use crate::error::SyntaxError;
use log::debug;

/// Shunting-yard reordering of infix tokens into postfix order.
///
/// Delimiters close the pending operators of an argument and are then
/// dropped, a function call is emitted right after its
/// closing bracket, and each `?` is paired with its `:` into a single
/// ternary operator.
pub struct Converter;

/// Postfix output plus the net number of values it leaves on an evaluation stack.
struct Output {
    tokens: Vec<Token>,
    values: isize,
}

impl Output {
    fn push(&mut self, token: Token) {
        self.values += match &token {
            Token::Operand(_) => 1,
            Token::Operator(Operator::Binary(_)) => -1,
            Token::Operator(Operator::Ternary) => -2,
            Token::FunctionCall(call) => 1 - call.arity as isize,
            _ => 0,
        };
        self.tokens.push(token);
    }
}

impl Converter {
    pub fn to_postfix(tokens: Vec<Token>) -> Result<Vec<Token>, SyntaxError> {
        Self::check_brackets(&tokens)?;

        let mut output = Output {
            tokens: Vec::with_capacity(tokens.len()),
            values: 0,
        };
        let mut stack: Vec<Token> = Vec::new();
        // Value count at each open call bracket.
        let mut call_marks: Vec<isize> = Vec::new();

        for token in tokens {
            match token {
                Token::Operand(_) => output.push(token),
                Token::FunctionCall(_) => stack.push(token),
                Token::Bracket(Bracket::Left) => {
                    if matches!(stack.last(), Some(Token::FunctionCall(_))) {
                        call_marks.push(output.values);
                    }
                    stack.push(token);
                }
                Token::Bracket(Bracket::Right) => {
                    loop {
                        match stack.pop() {
                            Some(Token::Bracket(Bracket::Left)) => break,
                            Some(top) => output.push(Self::emit(top)?),
                            None => return Err(SyntaxError::MismatchedParenthesis),
                        }
                    }
                    if let Some(Token::FunctionCall(call)) = stack.last() {
                        if let Some(mark) = call_marks.pop() {
                            Self::check_arguments(call, output.values - mark)?;
                        }
                        if let Some(call) = stack.pop() {
                            output.push(call);
                        }
                    }
                }
                // An argument ends here; its pending operators belong to it.
                Token::Delimiter => {
                    while let Some(Token::Operator(_)) = stack.last() {
                        if let Some(top) = stack.pop() {
                            output.push(Self::emit(top)?);
                        }
                    }
                }
                Token::Operator(Operator::TernaryElse) => {
                    loop {
                        match stack.pop() {
                            Some(Token::Operator(Operator::TernaryIf)) => break,
                            Some(Token::Operator(operator)) => output.push(Token::Operator(operator)),
                            _ => return Err(SyntaxError::UnpairedTernary),
                        }
                    }
                    stack.push(Token::Operator(Operator::Ternary));
                }
                Token::Operator(incoming) => {
                    while let Some(Token::Operator(top)) = stack.last() {
                        let yields = top.precedence() > incoming.precedence()
                            || (top.precedence() == incoming.precedence()
                                && incoming.associativity() == Associativity::Left);
                        if !yields {
                            break;
                        }
                        if let Some(top) = stack.pop() {
                            output.push(Self::emit(top)?);
                        }
                    }
                    stack.push(Token::Operator(incoming));
                }
            }
        }

        while let Some(top) = stack.pop() {
            output.push(Self::emit(top)?);
        }

        debug!("Postfix: {:?}", output.tokens);
        Ok(output.tokens)
    }

    /// A call's brackets must produce exactly one value per argument.
    fn check_arguments(call: &FunctionCall, produced: isize) -> Result<(), SyntaxError> {
        let arity = call.arity as isize;
        if produced < arity {
            return Err(SyntaxError::MissingOperand {
                operator: call.function.name().to_string(),
            });
        }
        if produced > arity {
            return Err(SyntaxError::DanglingOperands {
                count: (produced - arity + 1) as usize,
            });
        }
        Ok(())
    }

    fn check_brackets(tokens: &[Token]) -> Result<(), SyntaxError> {
        let mut depth = 0i64;
        for token in tokens {
            match token {
                Token::Bracket(Bracket::Left) => depth += 1,
                Token::Bracket(Bracket::Right) => {
                    depth -= 1;
                    if depth < 0 {
                        return Err(SyntaxError::MismatchedParenthesis);
                    }
                }
                _ => {}
            }
        }
        if depth != 0 {
            return Err(SyntaxError::MismatchedParenthesis);
        }
        Ok(())
    }

    /// Only complete operators may leave the stack for the output.
    fn emit(token: Token) -> Result<Token, SyntaxError> {
        match token {
            Token::Operator(Operator::TernaryIf) | Token::Operator(Operator::TernaryElse) => {
                Err(SyntaxError::UnpairedTernary)
            }
            Token::Operator(_) => Ok(token),
            other => Err(SyntaxError::UnexpectedToken {
                token: other.to_string(),
            }),
        }
    }
}
