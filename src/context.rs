use std::collections::BTreeMap;

use serde::ser::Serialize;

use crate::errors::{Error, Result};
use crate::value::{to_value, Resolvable, Value};

/// The struct that holds the context of a template rendering.
///
/// Light wrapper around a `BTreeMap` for easier insertions of Serializable
/// values
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context {
    data: BTreeMap<String, Value>,
}

impl Context {
    /// Initializes an empty context
    pub fn new() -> Self {
        Context { data: BTreeMap::new() }
    }

    /// Converts the `val` parameter to `Value` and insert it into the context.
    ///
    /// If the serialization fails, the failure is logged and the key is bound to nil.
    ///
    /// ```rust
    /// # use droplet::Context;
    /// let mut context = droplet::Context::new();
    /// context.insert("number_users", &42);
    /// ```
    pub fn insert<T: Serialize + ?Sized, S: Into<String>>(&mut self, key: S, val: &T) {
        let key = key.into();
        let value = match to_value(val) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "could not serialize context value, using nil");
                Value::Nil
            }
        };
        self.data.insert(key, value);
    }

    /// Converts the `val` parameter to `Value` and insert it into the context.
    ///
    /// Returns an error if the serialization fails.
    ///
    /// ```rust
    /// # use droplet::Context;
    /// # struct CannotBeSerialized;
    /// # impl serde::Serialize for CannotBeSerialized {
    /// #     fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    /// #         Err(serde::ser::Error::custom("Error"))
    /// #     }
    /// # }
    /// let mut context = Context::new();
    /// context.try_insert("number_users", &42)?;
    /// assert!(context.try_insert("invalid", &CannotBeSerialized).is_err());
    /// # Ok::<(), droplet::Error>(())
    /// ```
    pub fn try_insert<T: Serialize + ?Sized, S: Into<String>>(&mut self, key: S, val: &T) -> Result<()> {
        self.data.insert(key.into(), to_value(val)?);
        Ok(())
    }

    /// Inserts an already built `Value`, or anything that converts into one
    pub fn insert_value<S: Into<String>, V: Into<Value>>(&mut self, key: S, value: V) {
        self.data.insert(key.into(), value.into());
    }

    /// Inserts a host object, its fields and methods are looked up while rendering
    pub fn insert_object<S: Into<String>, T: Resolvable + 'static>(&mut self, key: S, object: T) {
        self.data.insert(key.into(), Value::object(object));
    }

    /// Appends the data of the `source` parameter to `self`, overwriting existing keys.
    /// The source context will be dropped.
    ///
    /// ```rust
    /// # use droplet::Context;
    /// let mut target = Context::new();
    /// target.insert("a", &1);
    /// target.insert("b", &2);
    /// let mut source = Context::new();
    /// source.insert("b", &3);
    /// source.insert("d", &4);
    /// target.extend(source);
    /// ```
    pub fn extend(&mut self, mut source: Context) {
        self.data.append(&mut source.data);
    }

    /// Takes a `Value` mapping and convert it into a `Context` with no overhead/cloning.
    pub fn from_value(obj: Value) -> Result<Self> {
        match obj {
            Value::Mapping(data) => Ok(Context { data }),
            _ => Err(Error::msg("Creating a Context from a Value/Serialize requires it being a JSON object")),
        }
    }

    /// Takes something that impl Serialize and create a context with it.
    /// Meant to be used if you have a hashmap or a struct and don't want to insert values
    /// one by one in the context.
    pub fn from_serialize(value: impl Serialize) -> Result<Self> {
        let obj = to_value(&value)?;
        Context::from_value(obj)
    }

    /// Returns the value at a given key index.
    pub fn get(&self, index: &str) -> Option<&Value> {
        self.data.get(index)
    }

    /// Remove a key from the context, returning the value at the key if the key was previously inserted into the context.
    pub fn remove(&mut self, index: &str) -> Option<Value> {
        self.data.remove(index)
    }

    /// Checks if a value exists at a specific index.
    pub fn contains_key(&self, index: &str) -> bool {
        self.data.contains_key(index)
    }

    /// Converts the context to a `Value` mapping
    pub fn into_value(self) -> Value {
        Value::Mapping(self.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_derive::Serialize;
    use std::collections::HashMap;

    #[derive(Debug)]
    struct Person;

    impl Resolvable for Person {
        fn field(&self, name: &str) -> Option<Value> {
            if name == "name" {
                Some(Value::from("Duncan"))
            } else {
                None
            }
        }
    }

    struct CannotBeSerialized;

    impl Serialize for CannotBeSerialized {
        fn serialize<S: serde::Serializer>(&self, _: S) -> ::std::result::Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("Error"))
        }
    }

    #[test]
    fn can_extend_context() {
        let mut target = Context::new();
        target.insert("a", &1);
        target.insert("b", &2);
        let mut source = Context::new();
        source.insert("b", &3);
        source.insert("c", &4);
        target.extend(source);
        assert_eq!(*target.data.get("a").unwrap(), Value::from(1));
        assert_eq!(*target.data.get("b").unwrap(), Value::from(3));
        assert_eq!(*target.data.get("c").unwrap(), Value::from(4));
    }

    #[test]
    fn failed_insert_binds_nil() {
        let mut context = Context::new();
        context.insert("bad", &CannotBeSerialized);
        assert!(context.contains_key("bad"));
        assert!(context.get("bad").unwrap().is_nil());
    }

    #[test]
    fn try_insert_reports_errors() {
        let mut context = Context::new();
        assert!(context.try_insert("ok", &"fine").is_ok());
        assert!(context.try_insert("bad", &CannotBeSerialized).is_err());
        assert!(!context.contains_key("bad"));
    }

    #[test]
    fn can_create_context_from_value() {
        let mut map = HashMap::new();
        map.insert("name".to_string(), Value::from("leto"));
        let context = Context::from_value(Value::from(map)).unwrap();
        assert_eq!(context.get("name"), Some(&Value::from("leto")));
    }

    #[test]
    fn can_create_context_from_impl_serialize() {
        #[derive(Serialize)]
        struct Ghola {
            name: &'static str,
            incarnations: i64,
        }
        let context = Context::from_serialize(Ghola { name: "Duncan", incarnations: 67 }).unwrap();
        assert_eq!(context.get("incarnations"), Some(&Value::from(67)));
    }

    #[test]
    fn from_serialize_requires_a_map() {
        assert!(Context::from_serialize(vec![1, 2]).is_err());
    }

    #[test]
    fn can_insert_objects_and_values() {
        let mut context = Context::new();
        context.insert_object("ghola", Person);
        context.insert_value("colors", vec!["brown", "blue"]);
        match context.get("ghola") {
            Some(Value::Object(o)) => assert_eq!(o.field("name"), Some(Value::from("Duncan"))),
            other => panic!("expected an object, got {:?}", other),
        }
        assert_eq!(context.get("colors").and_then(Value::size), Some(2));
    }

    #[test]
    fn remove_a_key() {
        let mut context = Context::new();
        context.insert("name", "leto");
        assert_eq!(context.remove("name"), Some(Value::from("leto")));
        assert_eq!(context.remove("name"), None);
    }

    #[test]
    fn into_value_is_a_mapping() {
        let mut context = Context::new();
        context.insert("a", &1);
        assert_eq!(context.into_value().size(), Some(1));
    }
}
