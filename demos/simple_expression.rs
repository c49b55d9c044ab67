use formulate_macros::formulate_fn;
use formulate_rs::{Bindings, Config, Evaluator, Function, FunctionError, Value};

#[formulate_fn]
fn square(a: f64) -> Result<Value, FunctionError> {
    Ok(Value::Number(a * a))
}

#[formulate_fn]
fn clamp(value: f64, low: f64, high: f64) -> Result<Value, FunctionError> {
    Ok(Value::Number(value.max(low).min(high)))
}

fn main() {
    pretty_env_logger::init();

    let mut config = Config::default();
    config.functions.push(Function::new("square", 1..=1, square));
    config.functions.push(Function::new("clamp", 3..=3, clamp));
    let evaluator = Evaluator::new(config).expect("valid configuration");

    let bindings = Bindings::from([
        ("price".to_string(), Value::Number(120.0)),
        ("volume".to_string(), Value::Number(3000.0)),
        ("ticker".to_string(), Value::from("ACME")),
    ]);

    let expressions = [
        "2 + 3 * 4",
        "square(price) / 100",
        "clamp(volume, 0, 2500)",
        "price > 100 && volume < 5000",
        "ticker + ' @ ' + price",
        "volume >= 5000 ? 'heavy' : 'light'",
        "upper(substring(ticker, 0, 2))",
        "price * missing",
    ];

    for expression in expressions {
        match evaluator.evaluate(expression, &bindings) {
            Ok(result) => println!("{} => {}", expression, result),
            Err(err) => println!("{} => error: {}", expression, err),
        }
    }
}
