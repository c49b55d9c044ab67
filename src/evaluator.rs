use crate::ast::{AstBuilder, Bindings, Converter, Executor, Expression, Lexer, Value};
use crate::error::{ConfigError, Result};
use crate::functions::{default_constants, default_functions, Constant, Function, Registry, DEFAULT_REGISTRY};
use log::debug;
use lru::LruCache;
use parking_lot::Mutex;
use rayon::prelude::*;
use std::num::NonZeroUsize;
use std::sync::Arc;

const RESERVED_CHARACTERS: &str = "+-*/%^<>=!&|?:()'\"";

/// Options for building an [`Evaluator`].
#[derive(Debug, Clone)]
pub struct Config {
    pub functions: Vec<Function>,
    pub constants: Vec<Constant>,
    pub decimal_separator: char,
    pub argument_separator: char,
    /// Drop characters that start no token instead of failing.
    pub skip_unknown_characters: bool,
    /// Maximum number of preprocessed expressions kept; `0` disables the cache.
    ///
    /// Text lookups take a short lock on the cache. With the cache disabled, or
    /// when evaluating trees from [`Evaluator::preprocess`], no lock is taken.
    pub cache_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            functions: default_functions(),
            constants: default_constants(),
            decimal_separator: '.',
            argument_separator: ',',
            skip_unknown_characters: false,
            cache_size: 100,
        }
    }
}

impl Config {
    fn validate(&self) -> Result<(), ConfigError> {
        for separator in [self.decimal_separator, self.argument_separator] {
            if separator.is_alphanumeric()
                || separator == '_'
                || separator.is_whitespace()
                || RESERVED_CHARACTERS.contains(separator)
            {
                return Err(ConfigError::InvalidSeparator(separator));
            }
        }
        if self.decimal_separator == self.argument_separator {
            return Err(ConfigError::SeparatorConflict(self.decimal_separator));
        }
        Ok(())
    }
}

/// Something an evaluator can run: expression text, or a tree returned by
/// [`Evaluator::preprocess`].
#[derive(Debug, Clone, Copy)]
pub enum Source<'a> {
    Text(&'a str),
    Parsed(&'a Expression),
}

impl<'a> From<&'a str> for Source<'a> {
    fn from(text: &'a str) -> Self {
        Source::Text(text)
    }
}

impl<'a> From<&'a String> for Source<'a> {
    fn from(text: &'a String) -> Self {
        Source::Text(text)
    }
}

impl<'a> From<&'a Expression> for Source<'a> {
    fn from(expression: &'a Expression) -> Self {
        Source::Parsed(expression)
    }
}

impl<'a> From<&'a Arc<Expression>> for Source<'a> {
    fn from(expression: &'a Arc<Expression>) -> Self {
        Source::Parsed(expression)
    }
}

/// Entry point of the pipeline: text → tokens → postfix → tree → value.
///
/// An evaluator is immutable after construction apart from its parse cache
/// and can be shared across threads.
pub struct Evaluator {
    lexer: Lexer,
    cache: Option<Mutex<LruCache<String, Arc<Expression>>>>,
}

impl Default for Evaluator {
    /// Default catalogue and separators, sharing the global registry.
    fn default() -> Self {
        Self::with_registry(DEFAULT_REGISTRY.clone(), Lexer::new, 100)
    }
}

impl Evaluator {
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        config.validate()?;
        let registry = Arc::new(Registry::new(config.functions, config.constants)?);
        let decimal_separator = config.decimal_separator;
        let argument_separator = config.argument_separator;
        let skip = config.skip_unknown_characters;
        Ok(Self::with_registry(
            registry,
            |registry| {
                Lexer::new(registry)
                    .with_decimal_separator(decimal_separator)
                    .with_argument_separator(argument_separator)
                    .skip_unknown_characters(skip)
            },
            config.cache_size,
        ))
    }

    fn with_registry(
        registry: Arc<Registry>,
        lexer: impl FnOnce(Arc<Registry>) -> Lexer,
        cache_size: usize,
    ) -> Self {
        Self {
            lexer: lexer(registry),
            cache: NonZeroUsize::new(cache_size).map(|size| Mutex::new(LruCache::new(size))),
        }
    }

    pub fn registry(&self) -> &Registry {
        self.lexer.registry()
    }

    /// Lexes, converts and builds `expression` into a reusable tree.
    ///
    /// Successful results are cached by expression text; failures are not.
    pub fn preprocess(&self, expression: &str) -> Result<Arc<Expression>> {
        if let Some(cache) = &self.cache {
            if let Some(tree) = cache.lock().get(expression) {
                debug!("Cache hit for: {}", expression);
                return Ok(Arc::clone(tree));
            }
        }

        let tokens = self.lexer.tokenize(expression)?;
        let postfix = Converter::to_postfix(tokens)?;
        let tree = Arc::new(AstBuilder::build(postfix)?);
        debug!("Preprocessed: {}", expression);

        if let Some(cache) = &self.cache {
            cache.lock().put(expression.to_string(), Arc::clone(&tree));
        }
        Ok(tree)
    }

    pub fn evaluate<'a>(&self, source: impl Into<Source<'a>>, bindings: &Bindings) -> Result<Value> {
        self.with_tree(source.into(), |tree| Executor::new(bindings).evaluate(tree))
    }

    pub fn evaluate_number<'a>(&self, source: impl Into<Source<'a>>, bindings: &Bindings) -> Result<f64> {
        self.with_tree(source.into(), |tree| Executor::new(bindings).evaluate_number(tree))
    }

    pub fn evaluate_boolean<'a>(&self, source: impl Into<Source<'a>>, bindings: &Bindings) -> Result<bool> {
        self.with_tree(source.into(), |tree| Executor::new(bindings).evaluate_boolean(tree))
    }

    pub fn evaluate_string<'a>(&self, source: impl Into<Source<'a>>, bindings: &Bindings) -> Result<String> {
        self.with_tree(source.into(), |tree| Executor::new(bindings).evaluate_string(tree))
    }

    /// Evaluates one expression against many binding sets in parallel.
    ///
    /// The expression is preprocessed once; a preprocessing failure fails the
    /// whole batch, evaluation failures are reported per binding set.
    pub fn evaluate_batch<'a>(
        &self,
        source: impl Into<Source<'a>>,
        contexts: &[Bindings],
    ) -> Result<Vec<Result<Value>>> {
        self.with_tree(source.into(), |tree| {
            Ok(contexts
                .par_iter()
                .map(|bindings| Executor::new(bindings).evaluate(tree))
                .collect())
        })
    }

    fn with_tree<T>(&self, source: Source<'_>, run: impl FnOnce(&Expression) -> Result<T>) -> Result<T> {
        match source {
            Source::Text(text) => {
                let tree = self.preprocess(text)?;
                run(&tree)
            }
            Source::Parsed(tree) => run(tree),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::ValueKind;
    use crate::error::{Error, FunctionError, LexError, SyntaxError, TypeError};
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, Value)]) -> Bindings {
        pairs
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn test_evaluator_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Evaluator>();
    }

    #[test]
    fn test_precedence() {
        let evaluator = Evaluator::default();
        let empty = Bindings::new();
        assert_eq!(evaluator.evaluate_number("2 + 3 * 4", &empty), Ok(14.0));
        assert_eq!(evaluator.evaluate_number("(2 + 3) * 4", &empty), Ok(20.0));
        assert_eq!(evaluator.evaluate_number("2 ^ 3 ^ 2", &empty), Ok(512.0));
    }

    #[test]
    fn test_unary_operators() {
        let evaluator = Evaluator::default();
        let empty = Bindings::new();
        assert_eq!(evaluator.evaluate_number("-3 + 4", &empty), Ok(1.0));
        assert_eq!(evaluator.evaluate_number("4 - -3", &empty), Ok(7.0));
        assert_eq!(evaluator.evaluate_boolean("!(1 > 2)", &empty), Ok(true));
    }

    #[test]
    fn test_ternary_is_lazy() {
        let evaluator = Evaluator::default();
        let empty = Bindings::new();
        assert_eq!(evaluator.evaluate_number("true ? 1 : x", &empty), Ok(1.0));
        assert_eq!(evaluator.evaluate_number("true ? 1 : (1/0)", &empty), Ok(1.0));
        assert_eq!(
            evaluator.evaluate_string("score >= 50 ? 'pass' : 'fail'", &vars(&[("score", Value::Number(42.0))])),
            Ok("fail".to_string())
        );
    }

    #[test]
    fn test_string_domain() {
        let evaluator = Evaluator::default();
        let empty = Bindings::new();
        assert_eq!(evaluator.evaluate_number("length('hello')", &empty), Ok(5.0));
        assert_eq!(evaluator.evaluate_string("'hello' + ' world'", &empty), Ok("hello world".to_string()));
        assert_eq!(evaluator.evaluate_string("'a' + 'b' + 1", &empty), Ok("ab1.0".to_string()));
        assert_eq!(evaluator.evaluate_boolean("contains('hello world','world')", &empty), Ok(true));
        assert_eq!(evaluator.evaluate_string("substring('hello', 1, 4)", &empty), Ok("ell".to_string()));
    }

    #[test]
    fn test_type_errors() {
        let evaluator = Evaluator::default();
        let empty = Bindings::new();
        assert!(matches!(
            evaluator.evaluate("true + 1", &empty),
            Err(Error::Type(TypeError::Operator { .. }))
        ));
        assert!(matches!(
            evaluator.evaluate("1 + true", &empty),
            Err(Error::Type(TypeError::Operator { .. }))
        ));
        assert_eq!(
            evaluator.evaluate_boolean("1 + 1", &empty),
            Err(Error::Type(TypeError::Result {
                expected: ValueKind::Boolean,
                found: ValueKind::Number,
            }))
        );
        assert!(matches!(
            evaluator.evaluate("length(1)", &empty),
            Err(Error::Function(FunctionError::ArgumentType { .. }))
        ));
    }

    #[test]
    fn test_unresolved_variable() {
        let evaluator = Evaluator::default();
        assert_eq!(
            evaluator.evaluate_number("x + 1", &Bindings::new()),
            Err(Error::UnresolvedVariable {
                name: "x".to_string()
            })
        );
    }

    #[test]
    fn test_arity_is_checked_before_evaluation() {
        let evaluator = Evaluator::default();
        assert!(matches!(
            evaluator.preprocess("sqrt(1, 2)"),
            Err(Error::Lex(LexError::Arity { found: 2, .. }))
        ));
        assert!(matches!(
            evaluator.preprocess("nope(1)"),
            Err(Error::Lex(LexError::UnknownFunction { .. }))
        ));
    }

    #[test]
    fn test_syntax_errors_surface() {
        let evaluator = Evaluator::default();
        let empty = Bindings::new();
        assert_eq!(
            evaluator.evaluate("(1 + 2", &empty),
            Err(Error::Syntax(SyntaxError::MismatchedParenthesis))
        );
        assert_eq!(
            evaluator.evaluate("a ? 1", &empty),
            Err(Error::Syntax(SyntaxError::UnpairedTernary))
        );
        assert_eq!(
            evaluator.evaluate("", &empty),
            Err(Error::Syntax(SyntaxError::EmptyExpression))
        );
    }

    #[test]
    fn test_deeply_nested_input_fails_instead_of_overflowing() {
        let evaluator = Evaluator::default();
        let text = format!("{}1", "-".repeat(5_000));
        assert!(matches!(
            evaluator.evaluate_number(text.as_str(), &Bindings::new()),
            Err(Error::Syntax(SyntaxError::TooDeep { .. }))
        ));
        assert!(evaluator.preprocess(&text).is_err());
    }

    #[test]
    fn test_call_does_not_borrow_operands_from_outside() {
        let evaluator = Evaluator::default();
        assert!(matches!(
            evaluator.evaluate_number("2 max(1,)", &Bindings::new()),
            Err(Error::Syntax(SyntaxError::MissingOperand { .. }))
        ));
        assert_eq!(evaluator.evaluate_number("max(1 + 2, 3 * 0)", &Bindings::new()), Ok(3.0));
    }

    #[test]
    fn test_preprocessed_tree_is_reusable() {
        let evaluator = Evaluator::default();
        let tree = evaluator.preprocess("price * quantity").unwrap();
        let first = vars(&[("price", Value::Number(2.0)), ("quantity", Value::Number(3.0))]);
        let second = vars(&[("price", Value::Number(5.0)), ("quantity", Value::Number(4.0))]);

        assert_eq!(evaluator.evaluate_number(&tree, &first), Ok(6.0));
        assert_eq!(evaluator.evaluate_number(&tree, &second), Ok(20.0));
        assert_eq!(evaluator.evaluate_number(&tree, &first), Ok(6.0));
        assert_eq!(
            evaluator.evaluate_number("price * quantity", &second),
            evaluator.evaluate_number(tree.as_ref(), &second)
        );
    }

    #[test]
    fn test_cache_returns_the_same_tree() {
        let evaluator = Evaluator::default();
        let first = evaluator.preprocess("1 + x").unwrap();
        let second = evaluator.preprocess("1 + x").unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        let uncached = Evaluator::new(Config {
            cache_size: 0,
            ..Config::default()
        })
        .unwrap();
        let first = uncached.preprocess("1 + x").unwrap();
        let second = uncached.preprocess("1 + x").unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(first, second);
    }

    #[test]
    fn test_batch_evaluation() {
        let evaluator = Evaluator::default();
        let contexts = vec![
            vars(&[("price", Value::Number(120.0))]),
            vars(&[("price", Value::Number(80.0))]),
            HashMap::new(),
        ];
        let results = evaluator.evaluate_batch("price > 100", &contexts).unwrap();
        assert_eq!(results[0], Ok(Value::Boolean(true)));
        assert_eq!(results[1], Ok(Value::Boolean(false)));
        assert!(matches!(results[2], Err(Error::UnresolvedVariable { .. })));

        assert!(evaluator.evaluate_batch("price >", &contexts).is_err());
    }

    #[test]
    fn test_custom_separators() {
        let evaluator = Evaluator::new(Config {
            decimal_separator: ',',
            argument_separator: ';',
            ..Config::default()
        })
        .unwrap();
        assert_eq!(evaluator.evaluate_number("max(1,5; 2,25)", &Bindings::new()), Ok(2.25));
    }

    #[test]
    fn test_config_validation() {
        let conflict = Evaluator::new(Config {
            decimal_separator: ';',
            argument_separator: ';',
            ..Config::default()
        });
        assert_eq!(conflict.err(), Some(ConfigError::SeparatorConflict(';')));

        for separator in ['a', '7', '_', ' ', '+', '(', '\''] {
            let invalid = Evaluator::new(Config {
                argument_separator: separator,
                ..Config::default()
            });
            assert_eq!(invalid.err(), Some(ConfigError::InvalidSeparator(separator)));
        }

        let mut functions = default_functions();
        functions.extend(default_functions().into_iter().take(1));
        let duplicate = Evaluator::new(Config {
            functions,
            ..Config::default()
        });
        assert!(matches!(duplicate.err(), Some(ConfigError::DuplicateFunction(_))));
    }

    #[test]
    fn test_custom_functions_and_constants() {
        let evaluator = Evaluator::new(Config {
            functions: vec![Function::new("double", 1..=1, |args| match args {
                [Value::Number(n)] => Ok(Value::Number(n * 2.0)),
                [other] => Err(FunctionError::expected_number("double", 0, other)),
                _ => Err(FunctionError::argument_count("double", 1, args.len())),
            })],
            constants: vec![Constant::new("limit", 10.0)],
            ..Config::default()
        })
        .unwrap();
        let empty = Bindings::new();
        assert_eq!(evaluator.evaluate_number("double(limit)", &empty), Ok(20.0));
        assert!(evaluator.registry().function("sin").is_none());
        assert!(matches!(
            evaluator.evaluate("sin(1)", &empty),
            Err(Error::Lex(LexError::UnknownFunction { .. }))
        ));
    }

    #[test]
    fn test_lenient_lexing() {
        let evaluator = Evaluator::new(Config {
            skip_unknown_characters: true,
            ..Config::default()
        })
        .unwrap();
        assert_eq!(evaluator.evaluate_number("1 + 2 #", &Bindings::new()), Ok(3.0));
        assert!(matches!(
            Evaluator::default().evaluate("1 + 2 #", &Bindings::new()),
            Err(Error::Lex(LexError::UnexpectedCharacter { character: '#', .. }))
        ));
    }
}
