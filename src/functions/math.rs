use crate::ast::Value;
use crate::error::FunctionError;
use crate::functions::Function;
use formulate_macros::formulate_fn;

pub fn register(functions: &mut Vec<Function>) {
    functions.push(Function::new("abs", 1..=1, abs));
    functions.push(Function::new("acos", 1..=1, acos));
    functions.push(Function::new("asin", 1..=1, asin));
    functions.push(Function::new("atan", 1..=1, atan));
    functions.push(Function::new("cos", 1..=1, cos));
    functions.push(Function::new("cosh", 1..=1, cosh));
    functions.push(Function::new("sin", 1..=1, sin));
    functions.push(Function::new("sinh", 1..=1, sinh));
    functions.push(Function::new("tan", 1..=1, tan));
    functions.push(Function::new("tanh", 1..=1, tanh));
    functions.push(Function::new("ceil", 1..=1, ceil));
    functions.push(Function::new("floor", 1..=1, floor));
    functions.push(Function::new("round", 1..=1, round));
    functions.push(Function::new("sqrt", 1..=1, sqrt));
    functions.push(Function::new("exp", 1..=1, exp));
    functions.push(Function::new("ln", 1..=1, ln));
    functions.push(Function::new("log", 2..=2, log));
    functions.push(Function::new("pow", 2..=2, pow));
}

macro_rules! unary_math {
    ($($name:ident => $method:ident),* $(,)?) => {
        $(
            #[formulate_fn]
            fn $name(x: f64) -> Result<Value, FunctionError> {
                Ok(Value::Number(x.$method()))
            }
        )*
    };
}

unary_math!(
    abs => abs,
    acos => acos,
    asin => asin,
    atan => atan,
    cos => cos,
    cosh => cosh,
    sin => sin,
    sinh => sinh,
    tan => tan,
    tanh => tanh,
    ceil => ceil,
    floor => floor,
    sqrt => sqrt,
    exp => exp,
    ln => ln,
);

/// Rounds half to even, so `round(2.5)` is `2`.
#[formulate_fn]
fn round(x: f64) -> Result<Value, FunctionError> {
    Ok(Value::Number(x.round_ties_even()))
}

/// Logarithm of `x` in the given `base`; `NaN` when the base is not positive or is `1`.
#[formulate_fn]
fn log(x: f64, base: f64) -> Result<Value, FunctionError> {
    if base <= 0.0 || base == 1.0 {
        return Ok(Value::Number(f64::NAN));
    }
    Ok(Value::Number(x.ln() / base.ln()))
}

#[formulate_fn]
fn pow(base: f64, exponent: f64) -> Result<Value, FunctionError> {
    Ok(Value::Number(base.powf(exponent)))
}
