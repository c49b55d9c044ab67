use crate::functions::Constant;
use std::f64::consts;

pub fn register(constants: &mut Vec<Constant>) {
    constants.push(Constant::new("pi", consts::PI));
    constants.push(Constant::new("e", consts::E));
}
