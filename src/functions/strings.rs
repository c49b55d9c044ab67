use crate::ast::Value;
use crate::error::FunctionError;
use crate::functions::Function;
use formulate_macros::formulate_fn;

pub fn register(functions: &mut Vec<Function>) {
    functions.push(Function::new("length", 1..=1, length));
    functions.push(Function::new("concat", 2..=usize::MAX, concat));
    functions.push(Function::new("contains", 2..=2, contains));
    functions.push(Function::new("substring", 2..=3, substring));
    functions.push(Function::new("upper", 1..=1, upper));
    functions.push(Function::new("lower", 1..=1, lower));
    functions.push(Function::new("trim", 1..=1, trim));
    functions.push(Function::new("starts_with", 2..=2, starts_with));
    functions.push(Function::new("ends_with", 2..=2, ends_with));
}

/// Length in characters.
#[formulate_fn]
fn length(text: String) -> Result<Value, FunctionError> {
    Ok(Value::Number(text.chars().count() as f64))
}

/// Joins the textual rendering of every argument, whatever its kind.
fn concat(args: &[Value]) -> Result<Value, FunctionError> {
    if args.len() < 2 {
        return Err(FunctionError::argument_count("concat", "at least 2", args.len()));
    }
    Ok(Value::String(args.iter().map(Value::to_string).collect()))
}

#[formulate_fn]
fn contains(text: String, needle: String) -> Result<Value, FunctionError> {
    Ok(Value::Boolean(text.contains(&needle)))
}

/// Fractional indices are truncated toward zero.
fn char_index(function: &str, value: f64) -> Result<usize, FunctionError> {
    let index = value.trunc();
    if index < 0.0 || !index.is_finite() {
        return Err(FunctionError::invalid_argument(
            function,
            format!("index {} is not a non-negative number", value),
        ));
    }
    Ok(index as usize)
}

/// Characters in `[start, end)`; `end` defaults to the end of the text.
#[formulate_fn]
fn substring(text: String, start: f64, end: Option<f64>) -> Result<Value, FunctionError> {
    let chars: Vec<char> = text.chars().collect();
    let start = char_index("substring", start)?;
    let end = match end {
        Some(end) => char_index("substring", end)?,
        None => chars.len(),
    };
    if start > end || end > chars.len() {
        return Err(FunctionError::invalid_argument(
            "substring",
            format!("range {}..{} is out of bounds for length {}", start, end, chars.len()),
        ));
    }
    Ok(Value::String(chars[start..end].iter().collect()))
}

#[formulate_fn]
fn upper(text: String) -> Result<Value, FunctionError> {
    Ok(Value::String(text.to_uppercase()))
}

#[formulate_fn]
fn lower(text: String) -> Result<Value, FunctionError> {
    Ok(Value::String(text.to_lowercase()))
}

#[formulate_fn]
fn trim(text: String) -> Result<Value, FunctionError> {
    Ok(Value::String(text.trim().to_string()))
}

#[formulate_fn]
fn starts_with(text: String, prefix: String) -> Result<Value, FunctionError> {
    Ok(Value::Boolean(text.starts_with(&prefix)))
}

#[formulate_fn]
fn ends_with(text: String, suffix: String) -> Result<Value, FunctionError> {
    Ok(Value::Boolean(text.ends_with(&suffix)))
}
