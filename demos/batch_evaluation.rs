use formulate_rs::{Bindings, Evaluator, Value};

fn main() {
    pretty_env_logger::init();

    let contexts = vec![
        Bindings::from([
            ("price".to_string(), Value::Number(120.0)),
            ("volume".to_string(), Value::Number(3000.0)),
        ]),
        Bindings::from([
            ("price".to_string(), Value::Number(80.0)),
            ("volume".to_string(), Value::Number(6000.0)),
        ]),
        Bindings::from([("price".to_string(), Value::Number(101.0))]),
    ];

    let expression = "price > 100 && volume < 5000";

    let evaluator = Evaluator::default();
    let results = evaluator
        .evaluate_batch(expression, &contexts)
        .expect("Failed to parse");
    for (i, result) in results.iter().enumerate() {
        println!("Result {}: {:?}", i, result);
    }
}
