use crate::ast::Value;
use crate::error::FunctionError;
use crate::functions::Function;
use formulate_macros::formulate_fn;

pub fn register(functions: &mut Vec<Function>) {
    functions.push(Function::new("min", 2..=usize::MAX, min));
    functions.push(Function::new("max", 2..=usize::MAX, max));
    functions.push(Function::new("avg", 2..=usize::MAX, avg));
    functions.push(Function::new("sum", 2..=usize::MAX, sum));
}

#[formulate_fn(min = 2)]
fn min(values: Vec<f64>) -> Result<Value, FunctionError> {
    Ok(Value::Number(values.iter().cloned().fold(f64::INFINITY, f64::min)))
}

#[formulate_fn(min = 2)]
fn max(values: Vec<f64>) -> Result<Value, FunctionError> {
    Ok(Value::Number(values.iter().cloned().fold(f64::NEG_INFINITY, f64::max)))
}

#[formulate_fn(min = 2)]
fn avg(values: Vec<f64>) -> Result<Value, FunctionError> {
    Ok(Value::Number(values.iter().sum::<f64>() / values.len() as f64))
}

#[formulate_fn(min = 2)]
fn sum(values: Vec<f64>) -> Result<Value, FunctionError> {
    Ok(Value::Number(values.iter().sum()))
}
