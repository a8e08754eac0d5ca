//! Filters operating on array
use std::borrow::Cow;
use std::cmp::Ordering;

use crate::value::Value;

/// Returns the first value of an array
/// If the array is empty or the value isn't an array, returns nil
pub fn first(value: &Value, _: Option<&Value>) -> Value {
    value.as_sequence().and_then(|items| items.first()).cloned().unwrap_or(Value::Nil)
}

/// Returns the last value of an array
/// If the array is empty or the value isn't an array, returns nil
pub fn last(value: &Value, _: Option<&Value>) -> Value {
    value.as_sequence().and_then(|items| items.last()).cloned().unwrap_or(Value::Nil)
}

/// Joins all values in the array by the separator given
/// If no separator is given, it will use `" "` as separator
pub fn join(value: &Value, arg: Option<&Value>) -> Value {
    let items = match value.as_sequence() {
        Some(items) => items,
        None => return value.clone(),
    };
    let sep = match arg {
        None | Some(Value::Nil) => Cow::Borrowed(" "),
        Some(sep) => sep.render(),
    };

    // Convert all the values to strings before we join them together.
    let rendered = items.iter().map(|v| v.render().into_owned()).collect::<Vec<_>>();
    Value::from(rendered.join(&*sep))
}

/// Reverses the order of an array
pub fn reverse(value: &Value, _: Option<&Value>) -> Value {
    match value {
        Value::Sequence(items) => Value::Sequence(items.iter().rev().cloned().collect()),
        _ => value.clone(),
    }
}

/// Sorts the array in ascending order.
/// Numbers sort among numbers and strings among strings, values that can't be
/// ordered against each other keep their relative order.
pub fn sort(value: &Value, _: Option<&Value>) -> Value {
    match value {
        Value::Sequence(items) => {
            let mut sorted = items.clone();
            sorted.sort_by(|a, b| a.partial_order(b).unwrap_or(Ordering::Equal));
            Value::Sequence(sorted)
        }
        _ => value.clone(),
    }
}

/// Remove duplicates from an array, keeping the first occurrence
pub fn uniq(value: &Value, _: Option<&Value>) -> Value {
    match value {
        Value::Sequence(items) => {
            let mut unique: Vec<Value> = Vec::with_capacity(items.len());
            for item in items {
                if !unique.contains(item) {
                    unique.push(item.clone());
                }
            }
            Value::Sequence(unique)
        }
        _ => value.clone(),
    }
}
