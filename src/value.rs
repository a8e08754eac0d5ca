//! The dynamic values templates operate on.

use std::borrow::Cow;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::Number;

use crate::errors::{Error, Result};

/// The mapping variant of a `Value`
pub type Map = BTreeMap<String, Value>;

/// Gives templates access to host objects that aren't plain data.
///
/// Paths like `person.master.name` step into an object by asking it for a field first
/// and a zero-argument method second. Returning `None` from both means the object has no
/// such member, which renders as a `{{PERSON.MASTER}}` placeholder in outputs.
/// A member that exists but holds nothing (an empty `Option`, a null pointer...) should
/// be returned as `Some(Value::Nil)`.
///
/// ```rust
/// use droplet::{Resolvable, Value};
///
/// #[derive(Debug)]
/// struct Person {
///     name: String,
///     incarnations: i64,
/// }
///
/// impl Resolvable for Person {
///     fn field(&self, name: &str) -> Option<Value> {
///         match name {
///             "name" => Some(self.name.clone().into()),
///             "incarnations" => Some(self.incarnations.into()),
///             _ => None,
///         }
///     }
///
///     fn to_display_string(&self) -> Option<String> {
///         Some(self.name.clone())
///     }
/// }
/// ```
pub trait Resolvable: fmt::Debug + Send + Sync {
    /// Looks up a field by name
    fn field(&self, _name: &str) -> Option<Value> {
        None
    }

    /// Calls a method taking no argument by name
    fn call_method(&self, _name: &str) -> Option<Value> {
        None
    }

    /// The custom string conversion of the object, if it has one
    fn to_display_string(&self) -> Option<String> {
        None
    }
}

/// A value in a template context or produced while rendering
#[derive(Clone, Debug)]
pub enum Value {
    Nil,
    Bool(bool),
    /// Integers and floats alike
    Number(Number),
    String(String),
    Sequence(Vec<Value>),
    Mapping(Map),
    /// A host object resolved through `Resolvable`
    Object(Arc<dyn Resolvable>),
}

impl Default for Value {
    fn default() -> Self {
        Value::Nil
    }
}

impl Value {
    /// Wraps a host object
    pub fn object<T: Resolvable + 'static>(object: T) -> Value {
        Value::Object(Arc::new(object))
    }

    /// Builds a number from a float, `NaN` and infinities become `Nil`
    pub fn from_f64(n: f64) -> Value {
        Number::from_f64(n).map(Value::Number).unwrap_or(Value::Nil)
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// Only `nil` and `false` are falsy: `0`, `""` and `[]` are all truthy
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&Map> {
        match self {
            Value::Mapping(map) => Some(map),
            _ => None,
        }
    }

    /// Character count of a string, number of items of a sequence or mapping
    pub fn size(&self) -> Option<usize> {
        match self {
            Value::String(s) => Some(s.chars().count()),
            Value::Sequence(items) => Some(items.len()),
            Value::Mapping(map) => Some(map.len()),
            _ => None,
        }
    }

    /// Name of the variant, used in log messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Sequence(_) => "sequence",
            Value::Mapping(_) => "mapping",
            Value::Object(_) => "object",
        }
    }

    /// The text written to the output for that value
    pub fn render(&self) -> Cow<'_, str> {
        match self {
            Value::Nil => Cow::Borrowed(""),
            Value::Bool(true) => Cow::Borrowed("true"),
            Value::Bool(false) => Cow::Borrowed("false"),
            Value::Number(n) => Cow::Owned(render_number(n)),
            Value::String(s) => Cow::Borrowed(s),
            Value::Sequence(items) => Cow::Owned(items.iter().map(|v| v.render()).collect()),
            Value::Mapping(_) => Cow::Owned(serde_json::to_string(self).unwrap_or_default()),
            Value::Object(object) => Cow::Owned(render_object(object.as_ref())),
        }
    }

    /// Objects with a custom string conversion take part in comparisons as that string
    pub(crate) fn comparable(&self) -> Cow<'_, Value> {
        match self {
            Value::Object(object) => match object.to_display_string() {
                Some(s) => Cow::Owned(Value::String(s)),
                None => Cow::Borrowed(self),
            },
            _ => Cow::Borrowed(self),
        }
    }

    /// Ordering used by `<`, `<=`, `>` and `>=`: numbers with numbers, strings with strings.
    /// Everything else can't be ordered.
    pub fn partial_order(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => compare_numbers(a, b),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Whether a string holds a substring, a sequence an element or a mapping a key
    pub fn contains(&self, needle: &Value) -> bool {
        match self {
            Value::String(s) => s.contains(needle.render().as_ref()),
            Value::Sequence(items) => items.iter().any(|item| item == needle),
            Value::Mapping(map) => map.contains_key(needle.render().as_ref()),
            _ => false,
        }
    }
}

fn render_number(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        i.to_string()
    } else if let Some(u) = n.as_u64() {
        u.to_string()
    } else {
        // f64 Display drops the fractional part of integral values: 68.0 -> "68"
        n.as_f64().map(|f| f.to_string()).unwrap_or_default()
    }
}

fn render_object(object: &dyn Resolvable) -> String {
    object.to_display_string().unwrap_or_else(|| format!("{:?}", object))
}

fn numbers_equal(a: &Number, b: &Number) -> bool {
    match (a.as_i64(), b.as_i64()) {
        (Some(x), Some(y)) => x == y,
        _ => match (a.as_u64(), b.as_u64()) {
            (Some(x), Some(y)) => x == y,
            _ => a.as_f64() == b.as_f64(),
        },
    }
}

fn compare_numbers(a: &Number, b: &Number) -> Option<Ordering> {
    match (a.as_i64(), b.as_i64()) {
        (Some(x), Some(y)) => Some(x.cmp(&y)),
        _ => a.as_f64()?.partial_cmp(&b.as_f64()?),
    }
}

/// Different variants are never equal, except numbers which compare numerically
impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => numbers_equal(a, b),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Sequence(a), Value::Sequence(b)) => a == b,
            (Value::Mapping(a), Value::Mapping(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => {
                Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
            }
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> ::std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Nil => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) => n.serialize(serializer),
            Value::String(s) => serializer.serialize_str(s),
            Value::Sequence(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Mapping(map) => {
                let mut m = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map {
                    m.serialize_entry(k, v)?;
                }
                m.end()
            }
            Value::Object(object) => serializer.serialize_str(&render_object(object.as_ref())),
        }
    }
}

/// Converts anything serializable into a `Value`, going through `serde_json`
pub fn to_value<T: Serialize + ?Sized>(value: &T) -> Result<Value> {
    serde_json::to_value(value).map(Value::from).map_err(Error::json)
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Nil,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Sequence(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Value::Mapping(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

macro_rules! impl_from_integer {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(n: $ty) -> Self {
                    Value::Number(Number::from(n))
                }
            }
        )*
    };
}

impl_from_integer!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::from_f64(n)
    }
}

impl From<f32> for Value {
    fn from(n: f32) -> Self {
        Value::from_f64(f64::from(n))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Sequence(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map(Into::into).unwrap_or(Value::Nil)
    }
}

impl<T: Into<Value>> From<HashMap<String, T>> for Value {
    fn from(map: HashMap<String, T>) -> Self {
        Value::Mapping(map.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

impl<T: Into<Value>> From<BTreeMap<String, T>> for Value {
    fn from(map: BTreeMap<String, T>) -> Self {
        Value::Mapping(map.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

impl From<Arc<dyn Resolvable>> for Value {
    fn from(object: Arc<dyn Resolvable>) -> Self {
        Value::Object(object)
    }
}
