use crate::ast::{BinaryOperator, Bracket, FunctionCall, Operand, Operator, Token, UnaryOperator, Value};
use crate::error::LexError;
use crate::functions::Registry;
use log::{debug, trace};
use std::sync::Arc;

const TWO_CHAR_OPERATORS: [&str; 6] = ["&&", "||", "<=", ">=", "==", "!="];

/// Turns expression text into tokens.
///
/// Function names and constants are resolved against the registry while
/// lexing; variables stay symbolic until evaluation. The lexer holds no
/// per-call state and can be shared between threads.
#[derive(Debug, Clone)]
pub struct Lexer {
    registry: Arc<Registry>,
    decimal_separator: char,
    argument_separator: char,
    skip_unknown_characters: bool,
}

impl Lexer {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self {
            registry,
            decimal_separator: '.',
            argument_separator: ',',
            skip_unknown_characters: false,
        }
    }

    pub fn with_decimal_separator(mut self, separator: char) -> Self {
        self.decimal_separator = separator;
        self
    }

    pub fn with_argument_separator(mut self, separator: char) -> Self {
        self.argument_separator = separator;
        self
    }

    /// Lenient mode: characters that start no token are dropped instead of
    /// failing the lex.
    pub fn skip_unknown_characters(mut self, skip: bool) -> Self {
        self.skip_unknown_characters = skip;
        self
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn tokenize(&self, expression: &str) -> Result<Vec<Token>, LexError> {
        debug!("Tokenizing expression: {}", expression);
        let mut scan = Scan {
            lexer: self,
            input: expression.chars().collect(),
            position: 0,
            tokens: Vec::new(),
        };
        scan.run()?;
        debug!("Tokens: {:?}", scan.tokens);
        Ok(scan.tokens)
    }
}

/// State of a single `tokenize` call.
struct Scan<'a> {
    lexer: &'a Lexer,
    input: Vec<char>,
    position: usize,
    tokens: Vec<Token>,
}

impl Scan<'_> {
    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_char(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    fn run(&mut self) -> Result<(), LexError> {
        while let Some(ch) = self.current_char() {
            if ch.is_whitespace() {
                self.position += 1;
                continue;
            }

            if let Some(operator) = self.two_char_operator() {
                self.push_operator(Operator::Binary(operator), 2)?;
                continue;
            }

            match ch {
                c if c.is_ascii_digit() => self.read_number()?,
                c if c.is_alphabetic() || c == '_' => self.read_identifier()?,
                '\'' | '"' => self.read_string(ch)?,
                c if c == self.lexer.argument_separator => self.push(Token::Delimiter, 1),
                '+' => {
                    let operator = if self.expects_unary() {
                        Operator::Unary(UnaryOperator::Plus)
                    } else {
                        Operator::Binary(BinaryOperator::Add)
                    };
                    self.push_operator(operator, 1)?;
                }
                '-' => {
                    let operator = if self.expects_unary() {
                        Operator::Unary(UnaryOperator::Minus)
                    } else {
                        Operator::Binary(BinaryOperator::Subtract)
                    };
                    self.push_operator(operator, 1)?;
                }
                '*' | '/' | '%' | '^' | '<' | '>' => {
                    let symbol = ch.to_string();
                    let operator = BinaryOperator::try_from(symbol.as_str()).map_err(|_| {
                        LexError::UnexpectedCharacter {
                            character: ch,
                            position: self.position,
                        }
                    })?;
                    self.push_operator(Operator::Binary(operator), 1)?;
                }
                '!' => self.push_operator(Operator::Unary(UnaryOperator::Not), 1)?,
                '?' => self.push_operator(Operator::TernaryIf, 1)?,
                ':' => self.push_operator(Operator::TernaryElse, 1)?,
                '(' => {
                    self.require_operand_after("(", 1)?;
                    self.push(Token::Bracket(Bracket::Left), 1);
                }
                ')' => self.push(Token::Bracket(Bracket::Right), 1),
                _ if self.lexer.skip_unknown_characters => {
                    trace!("Skipping '{}' at {}", ch, self.position);
                    self.position += 1;
                }
                _ => {
                    return Err(LexError::UnexpectedCharacter {
                        character: ch,
                        position: self.position,
                    })
                }
            }
        }
        Ok(())
    }

    fn push(&mut self, token: Token, width: usize) {
        trace!("Matched {} at {}", token, self.position);
        self.tokens.push(token);
        self.position += width;
    }

    fn push_operator(&mut self, operator: Operator, width: usize) -> Result<(), LexError> {
        self.require_operand_after(operator.symbol(), width)?;
        self.push(Token::Operator(operator), width);
        Ok(())
    }

    /// An operator may not be the last character of the input.
    fn require_operand_after(&self, symbol: &str, width: usize) -> Result<(), LexError> {
        if self.position + width >= self.input.len() {
            return Err(LexError::DanglingOperator {
                operator: symbol.to_string(),
                position: self.position,
            });
        }
        Ok(())
    }

    fn two_char_operator(&self) -> Option<BinaryOperator> {
        let pair: String = [self.current_char()?, self.peek_char(1)?].iter().collect();
        if TWO_CHAR_OPERATORS.contains(&pair.as_str()) {
            BinaryOperator::try_from(pair.as_str()).ok()
        } else {
            None
        }
    }

    /// `+`/`-` are unary unless they follow an operand or a closing bracket.
    fn expects_unary(&self) -> bool {
        !matches!(
            self.tokens.last(),
            Some(Token::Operand(_)) | Some(Token::Bracket(Bracket::Right))
        )
    }

    fn read_number(&mut self) -> Result<(), LexError> {
        let start = self.position;
        let mut literal = String::new();
        while let Some(ch) = self.current_char() {
            if ch.is_ascii_digit() {
                literal.push(ch);
            } else if ch == self.lexer.decimal_separator {
                literal.push('.');
            } else {
                break;
            }
            self.position += 1;
        }

        let value = literal.parse::<f64>().map_err(|_| LexError::InvalidNumber {
            literal: self.input[start..self.position].iter().collect(),
            position: start,
        })?;
        trace!("Matched number {} at {}", value, start);
        self.tokens.push(Token::Operand(Operand::Number(value)));
        Ok(())
    }

    fn read_identifier(&mut self) -> Result<(), LexError> {
        let start = self.position;
        let mut name = String::new();
        while let Some(ch) = self.current_char() {
            if ch.is_alphanumeric() || ch == '_' {
                name.push(ch);
                self.position += 1;
            } else {
                break;
            }
        }

        if self.current_char() == Some('(') {
            return self.function_call(name, start);
        }

        let operand = match name.as_str() {
            "true" => Operand::Boolean(true),
            "false" => Operand::Boolean(false),
            _ => match self.lexer.registry.constant(&name) {
                Some(Value::Number(n)) => Operand::Number(*n),
                Some(Value::Boolean(b)) => Operand::Boolean(*b),
                Some(Value::String(s)) => Operand::String(s.clone()),
                None => Operand::Variable(name),
            },
        };
        trace!("Matched operand {:?} at {}", operand, start);
        self.tokens.push(Token::Operand(operand));
        Ok(())
    }

    fn function_call(&mut self, name: String, start: usize) -> Result<(), LexError> {
        let function = self
            .lexer
            .registry
            .function(&name)
            .cloned()
            .ok_or_else(|| LexError::UnknownFunction {
                name: name.clone(),
                position: start,
            })?;

        let arity = self.count_arguments();
        if !function.accepts(arity) {
            return Err(LexError::Arity {
                name,
                expected: function.describe_arity(),
                found: arity,
            });
        }

        trace!("Matched call {}/{} at {}", name, arity, start);
        self.tokens
            .push(Token::FunctionCall(FunctionCall { function, arity }));
        Ok(())
    }

    /// Counts the arguments of the call whose `(` is at the current position.
    ///
    /// Separators count only at the call's own nesting level and never inside
    /// string literals. Empty parentheses mean zero arguments.
    fn count_arguments(&self) -> usize {
        let mut depth = 0usize;
        let mut delimiters = 0;
        let mut has_arguments = false;
        let mut quote: Option<char> = None;
        let mut escaped = false;

        for (offset, &ch) in self.input[self.position..].iter().enumerate() {
            if let Some(q) = quote {
                if escaped {
                    escaped = false;
                } else if ch == '\\' {
                    escaped = true;
                } else if ch == q {
                    quote = None;
                }
                continue;
            }

            match ch {
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                '\'' | '"' => quote = Some(ch),
                c if c == self.lexer.argument_separator && depth == 1 => delimiters += 1,
                _ => {}
            }

            if offset > 0 && !ch.is_whitespace() {
                has_arguments = true;
            }
        }

        if has_arguments {
            delimiters + 1
        } else {
            0
        }
    }

    fn read_string(&mut self, quote: char) -> Result<(), LexError> {
        let start = self.position;
        let mut result = String::new();
        self.position += 1;

        while let Some(ch) = self.current_char() {
            match ch {
                c if c == quote => {
                    self.position += 1;
                    trace!("Matched string '{}' at {}", result, start);
                    self.tokens.push(Token::Operand(Operand::String(result)));
                    return Ok(());
                }
                '\\' => {
                    let escaped = match self.peek_char(1) {
                        Some('n') => '\n',
                        Some('t') => '\t',
                        Some('r') => '\r',
                        Some('\\') => '\\',
                        Some('\'') => '\'',
                        Some('"') => '"',
                        Some(other) => {
                            return Err(LexError::InvalidEscape {
                                character: other,
                                position: self.position,
                            })
                        }
                        None => break,
                    };
                    result.push(escaped);
                    self.position += 2;
                }
                _ => {
                    result.push(ch);
                    self.position += 1;
                }
            }
        }

        Err(LexError::UnterminatedString { position: start })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::{default_constants, default_functions, Function, DEFAULT_REGISTRY};

    fn lexer() -> Lexer {
        Lexer::new(DEFAULT_REGISTRY.clone())
    }

    fn number(n: f64) -> Token {
        Token::Operand(Operand::Number(n))
    }

    fn binary(op: BinaryOperator) -> Token {
        Token::Operator(Operator::Binary(op))
    }

    fn unary(op: UnaryOperator) -> Token {
        Token::Operator(Operator::Unary(op))
    }

    #[test]
    fn test_simple_binary_expression() {
        let tokens = lexer().tokenize("price > 100").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Operand(Operand::Variable("price".to_string())),
                binary(BinaryOperator::GreaterThan),
                number(100.0),
            ]
        );
    }

    #[test]
    fn test_two_char_operators_win_over_prefixes() {
        let tokens = lexer().tokenize("a<=b&&c!=d||e>=f==g").unwrap();
        let operators: Vec<_> = tokens
            .into_iter()
            .filter(|t| matches!(t, Token::Operator(_)))
            .collect();
        assert_eq!(
            operators,
            vec![
                binary(BinaryOperator::LessThanOrEqual),
                binary(BinaryOperator::And),
                binary(BinaryOperator::NotEqual),
                binary(BinaryOperator::Or),
                binary(BinaryOperator::GreaterThanOrEqual),
                binary(BinaryOperator::Equal),
            ]
        );
    }

    #[test]
    fn test_unary_disambiguation() {
        assert_eq!(
            lexer().tokenize("-3 + 4").unwrap(),
            vec![
                unary(UnaryOperator::Minus),
                number(3.0),
                binary(BinaryOperator::Add),
                number(4.0),
            ]
        );
        assert_eq!(
            lexer().tokenize("4 - -3").unwrap(),
            vec![
                number(4.0),
                binary(BinaryOperator::Subtract),
                unary(UnaryOperator::Minus),
                number(3.0),
            ]
        );
        assert_eq!(
            lexer().tokenize("(1) -2").unwrap()[3],
            binary(BinaryOperator::Subtract)
        );
        assert_eq!(lexer().tokenize("'a' + 'b'").unwrap()[1], binary(BinaryOperator::Add));
    }

    #[test]
    fn test_decimal_numbers() {
        assert_eq!(lexer().tokenize("3.25").unwrap(), vec![number(3.25)]);
        assert!(matches!(
            lexer().tokenize("1.2.3"),
            Err(LexError::InvalidNumber { position: 0, .. })
        ));
    }

    #[test]
    fn test_custom_separators() {
        let lexer = lexer()
            .with_decimal_separator(',')
            .with_argument_separator(';');
        let tokens = lexer.tokenize("max(1,5; 2)").unwrap();
        assert!(matches!(&tokens[0], Token::FunctionCall(call) if call.arity == 2));
        assert_eq!(tokens[2], number(1.5));
        assert_eq!(tokens[3], Token::Delimiter);
    }

    #[test]
    fn test_keywords_and_constants() {
        let tokens = lexer().tokenize("true || trueish || pi").unwrap();
        assert_eq!(tokens[0], Token::Operand(Operand::Boolean(true)));
        assert_eq!(tokens[2], Token::Operand(Operand::Variable("trueish".to_string())));
        assert_eq!(tokens[4], number(std::f64::consts::PI));
    }

    #[test]
    fn test_string_constants_become_string_operands() {
        let mut constants = default_constants();
        constants.push(crate::functions::Constant::new("greeting", "hi"));
        let registry = Registry::new(default_functions(), constants).unwrap();
        let tokens = Lexer::new(Arc::new(registry)).tokenize("greeting").unwrap();
        assert_eq!(tokens, vec![Token::Operand(Operand::String("hi".to_string()))]);
    }

    #[test]
    fn test_string_literals() {
        let tokens = lexer().tokenize(r#"'it\'s' + "a \"b\"\n""#).unwrap();
        assert_eq!(tokens[0], Token::Operand(Operand::String("it's".to_string())));
        assert_eq!(tokens[2], Token::Operand(Operand::String("a \"b\"\n".to_string())));
        assert!(matches!(
            lexer().tokenize("'open"),
            Err(LexError::UnterminatedString { position: 0 })
        ));
        assert!(matches!(
            lexer().tokenize(r"'\q'"),
            Err(LexError::InvalidEscape { character: 'q', .. })
        ));
    }

    #[test]
    fn test_function_call_arity_counts_top_level_delimiters() {
        let tokens = lexer().tokenize("max(1, min(2, 3), (4), 'a,b')").unwrap();
        let Token::FunctionCall(call) = &tokens[0] else {
            panic!("expected a call, got {:?}", tokens[0]);
        };
        assert_eq!(call.function.name(), "max");
        assert_eq!(call.arity, 4);
    }

    #[test]
    fn test_empty_call_has_no_arguments() {
        let registry = Registry::new(
            vec![Function::new("now", 0..=0, |_| Ok(Value::Number(0.0)))],
            vec![],
        )
        .unwrap();
        let tokens = Lexer::new(Arc::new(registry)).tokenize("now( )").unwrap();
        assert!(matches!(&tokens[0], Token::FunctionCall(call) if call.arity == 0));
    }

    #[test]
    fn test_wrong_arity_fails_at_lex_time() {
        assert!(matches!(
            lexer().tokenize("log(8)"),
            Err(LexError::Arity { found: 1, .. })
        ));
        assert!(matches!(
            lexer().tokenize("log(8, 2, 1)"),
            Err(LexError::Arity { found: 3, .. })
        ));
    }

    #[test]
    fn test_unknown_function() {
        assert!(matches!(
            lexer().tokenize("undefined_function(3)"),
            Err(LexError::UnknownFunction { position: 0, .. })
        ));
    }

    #[test]
    fn test_trailing_operator_is_rejected() {
        assert!(matches!(
            lexer().tokenize("1 +"),
            Err(LexError::DanglingOperator { position: 2, .. })
        ));
        assert!(matches!(
            lexer().tokenize("a &&"),
            Err(LexError::DanglingOperator { .. })
        ));
        assert!(lexer().tokenize("(1)").is_ok());
    }

    #[test]
    fn test_unknown_characters() {
        assert!(matches!(
            lexer().tokenize("1 # 2"),
            Err(LexError::UnexpectedCharacter { character: '#', position: 2 })
        ));
        let lenient = lexer().skip_unknown_characters(true);
        assert_eq!(
            lenient.tokenize("1 # + 2").unwrap(),
            vec![number(1.0), binary(BinaryOperator::Add), number(2.0)]
        );
    }
}
