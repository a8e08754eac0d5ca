//! Filters operating on numbers
use crate::value::Value;

/// A filter operand once coerced to a number
#[derive(Clone, Copy, Debug, PartialEq)]
enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    fn as_f64(self) -> f64 {
        match self {
            Num::Int(i) => i as f64,
            Num::Float(f) => f,
        }
    }
}

/// Numbers are taken as is and numeric strings are parsed. Anything else is `0`.
fn coerce(value: Option<&Value>) -> Num {
    match value {
        Some(Value::Number(n)) => match n.as_i64() {
            Some(i) => Num::Int(i),
            None => Num::Float(n.as_f64().unwrap_or(0.0)),
        },
        Some(v @ Value::String(_)) | Some(v @ Value::Object(_)) => parse_number(&v.render()),
        _ => Num::Int(0),
    }
}

fn parse_number(s: &str) -> Num {
    let s = s.trim();
    if let Ok(i) = s.parse::<i64>() {
        Num::Int(i)
    } else if let Ok(f) = s.parse::<f64>() {
        Num::Float(f)
    } else {
        Num::Int(0)
    }
}

/// Integer arithmetic when both sides are integers, falling back to floats on overflow
fn arithmetic(
    value: &Value,
    arg: Option<&Value>,
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
) -> Value {
    let (lhs, rhs) = (coerce(Some(value)), coerce(arg));
    if let (Num::Int(a), Num::Int(b)) = (lhs, rhs) {
        if let Some(result) = int_op(a, b) {
            return Value::from(result);
        }
    }
    Value::from_f64(float_op(lhs.as_f64(), rhs.as_f64()))
}

/// Adds the argument to the value
pub fn plus(value: &Value, arg: Option<&Value>) -> Value {
    arithmetic(value, arg, i64::checked_add, |a, b| a + b)
}

/// Subtracts the argument from the value
pub fn minus(value: &Value, arg: Option<&Value>) -> Value {
    arithmetic(value, arg, i64::checked_sub, |a, b| a - b)
}

/// Multiplies the value by the argument
pub fn times(value: &Value, arg: Option<&Value>) -> Value {
    arithmetic(value, arg, i64::checked_mul, |a, b| a * b)
}

/// Divides the value by the argument, rounding down when both are integers.
/// Dividing by zero returns the value untouched.
pub fn divided_by(value: &Value, arg: Option<&Value>) -> Value {
    if coerce(arg).as_f64() == 0.0 {
        return value.clone();
    }
    arithmetic(value, arg, floor_div, |a, b| a / b)
}

/// The remainder of the division of the value by the argument, with the sign of the argument.
/// A zero argument returns the value untouched.
pub fn modulo(value: &Value, arg: Option<&Value>) -> Value {
    if coerce(arg).as_f64() == 0.0 {
        return value.clone();
    }
    arithmetic(value, arg, floor_mod, |a, b| a - b * (a / b).floor())
}

fn floor_div(a: i64, b: i64) -> Option<i64> {
    let q = a.checked_div(b)?;
    if a % b != 0 && ((a < 0) != (b < 0)) {
        Some(q - 1)
    } else {
        Some(q)
    }
}

fn floor_mod(a: i64, b: i64) -> Option<i64> {
    let r = a.checked_rem(b)?;
    if r != 0 && ((r < 0) != (b < 0)) {
        Some(r + b)
    } else {
        Some(r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n<T: Into<Value>>(v: T) -> Value {
        v.into()
    }

    #[test]
    fn test_plus() {
        assert_eq!(plus(&n(67), Some(&n(1))), n(68));
        assert_eq!(plus(&n(1.5), Some(&n(1))), n(2.5));
        assert_eq!(plus(&n(67), None), n(67));
    }

    #[test]
    fn test_plus_stays_an_integer() {
        assert_eq!(plus(&n(67), Some(&n(1))).render(), "68");
    }

    #[test]
    fn test_plus_coerces() {
        assert_eq!(plus(&n("41"), Some(&n(1))), n(42));
        assert_eq!(plus(&n(" 1.5 "), Some(&n("1"))), n(2.5));
        assert_eq!(plus(&n("leto"), Some(&n(1))), n(1));
        assert_eq!(plus(&Value::Nil, Some(&n(1))), n(1));
        assert_eq!(plus(&Value::Bool(true), Some(&n(1))), n(1));
    }

    #[test]
    fn test_plus_overflow_goes_to_float() {
        let result = plus(&n(i64::max_value()), Some(&n(1)));
        assert_eq!(result, n(i64::max_value() as f64 + 1.0));
    }

    #[test]
    fn test_minus_times() {
        assert_eq!(minus(&n(4), Some(&n(6))), n(-2));
        assert_eq!(times(&n(3), Some(&n(2.5))), n(7.5));
        assert_eq!(times(&n(3), Some(&n(4))), n(12));
    }

    #[test]
    fn test_divided_by() {
        assert_eq!(divided_by(&n(7), Some(&n(2))), n(3));
        assert_eq!(divided_by(&n(-7), Some(&n(2))), n(-4));
        assert_eq!(divided_by(&n(7), Some(&n(2.0))), n(3.5));
        assert_eq!(divided_by(&n(7.0), Some(&n(2))), n(3.5));
    }

    #[test]
    fn test_divided_by_zero() {
        assert_eq!(divided_by(&n(7), Some(&n(0))), n(7));
        assert_eq!(divided_by(&n("abc"), None), n("abc"));
    }

    #[test]
    fn test_modulo() {
        assert_eq!(modulo(&n(7), Some(&n(3))), n(1));
        assert_eq!(modulo(&n(-7), Some(&n(3))), n(2));
        assert_eq!(modulo(&n(7.5), Some(&n(2))), n(1.5));
        assert_eq!(modulo(&n(7), Some(&n(0))), n(7));
    }
}
