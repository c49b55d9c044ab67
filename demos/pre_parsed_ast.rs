use formulate_rs::{Bindings, Evaluator, Value};

fn main() {
    pretty_env_logger::init();

    let evaluator = Evaluator::default();

    let expression = "price > 50 && volume < 5000";
    let tree = evaluator
        .preprocess(expression)
        .expect("Failed to parse");
    println!("{} parsed into {} nodes", expression, tree.size());

    for (price, volume) in [(120.0, 3000.0), (40.0, 3000.0), (120.0, 8000.0)] {
        let bindings = Bindings::from([
            ("price".to_string(), Value::Number(price)),
            ("volume".to_string(), Value::Number(volume)),
        ]);

        match evaluator.evaluate_boolean(&tree, &bindings) {
            Ok(result) => println!("price={} volume={} => {}", price, volume, result),
            Err(err) => println!("Error: {}", err),
        }
    }
}
