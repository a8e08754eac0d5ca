use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use lazy_static::lazy_static;

use crate::value::Value;

pub mod array;
pub mod common;
pub mod number;
pub mod string;

/// The filter function type definition.
///
/// Filters never fail: when the input or the argument doesn't make sense for a filter,
/// it returns the input unchanged (or its closest meaningful conversion).
pub trait Filter: Sync + Send {
    /// The filter function type definition
    fn filter(&self, value: &Value, arg: Option<&Value>) -> Value;
}

impl<F> Filter for F
where
    F: Fn(&Value, Option<&Value>) -> Value + Sync + Send,
{
    fn filter(&self, value: &Value, arg: Option<&Value>) -> Value {
        self(value, arg)
    }
}

lazy_static! {
    static ref GLOBAL_FILTERS: RwLock<HashMap<String, Arc<dyn Filter>>> = RwLock::new(HashMap::new());
}

/// Registers a filter for every `Config` created with `Config::default()` from now on.
///
/// Configs that already exist are not affected. A filter registered with the same name as
/// a built-in one replaces it.
pub fn register_filter<F: Filter + 'static>(name: &str, filter: F) {
    tracing::debug!(name, "registering global filter");
    GLOBAL_FILTERS
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(name.to_string(), Arc::new(filter));
}

/// A snapshot of the globally registered filters
pub(crate) fn global_filters() -> Vec<(String, Arc<dyn Filter>)> {
    GLOBAL_FILTERS
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .iter()
        .map(|(name, filter)| (name.clone(), Arc::clone(filter)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closures_are_filters() {
        let twice = |value: &Value, _: Option<&Value>| Value::from(value.render().repeat(2));
        assert_eq!(twice.filter(&Value::from("ab"), None), Value::from("abab"));
    }

    #[test]
    fn global_filters_are_snapshotted() {
        register_filter("filters_mod_test_shout", |value: &Value, _: Option<&Value>| {
            Value::from(value.render().to_uppercase() + "!")
        });
        let filters = global_filters();
        let (_, filter) = filters.iter().find(|(name, _)| name == "filters_mod_test_shout").unwrap();
        assert_eq!(filter.filter(&Value::from("hey"), None), Value::from("HEY!"));
    }
}
