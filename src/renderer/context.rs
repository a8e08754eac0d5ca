use std::borrow::Cow;
use std::collections::HashMap;

use crate::context::Context;
use crate::value::Value;

/// Result of looking up a dotted path
#[derive(Debug)]
pub(crate) enum Lookup<'a> {
    /// The path led somewhere, possibly to nil
    Found(Cow<'a, Value>),
    /// An object along the path has no member with the next segment's name
    Unresolved,
}

/// What a template sees while being rendered: the data it was given plus the variables
/// set by `capture` and `assign`, which shadow the data.
///
/// Custom tags get read access to it.
#[derive(Debug)]
pub struct RenderContext<'a> {
    data: &'a Context,
    locals: HashMap<String, Value>,
}

impl<'a> RenderContext<'a> {
    pub(crate) fn new(data: &'a Context) -> RenderContext<'a> {
        RenderContext { data, locals: HashMap::new() }
    }

    /// A top-level variable
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.locals.get(name).or_else(|| self.data.get(name))
    }

    /// Resolves a dotted path like `ghola.master.name`. Anything that can't be found is nil.
    pub fn resolve(&self, path: &str) -> Value {
        let segments = path.split('.').map(str::trim).map(ToString::to_string).collect::<Vec<_>>();
        match self.lookup(&segments) {
            Lookup::Found(value) => value.into_owned(),
            Lookup::Unresolved => Value::Nil,
        }
    }

    pub(crate) fn set(&mut self, name: String, value: Value) {
        self.locals.insert(name, value);
    }

    /// Follows `path` one segment at a time. A missing variable or mapping key is nil and
    /// stepping into nil stays nil, but a member an object doesn't have makes the whole
    /// path unresolved.
    pub(crate) fn lookup(&self, path: &[String]) -> Lookup<'_> {
        let (root, rest) = match path.split_first() {
            Some(split) => split,
            None => return Lookup::Found(Cow::Owned(Value::Nil)),
        };

        let mut current = match self.get(root) {
            Some(value) => Cow::Borrowed(value),
            None => return Lookup::Found(Cow::Owned(Value::Nil)),
        };

        for segment in rest {
            if current.is_nil() {
                break;
            }

            let next = match current {
                Cow::Borrowed(value) => step(value, segment),
                Cow::Owned(ref value) => step(value, segment).map(|v| Cow::Owned(v.into_owned())),
            };

            current = match next {
                Some(value) => value,
                None => {
                    tracing::debug!(path = %path.join("."), segment = %segment, "member not found on object");
                    return Lookup::Unresolved;
                }
            };
        }

        Lookup::Found(current)
    }
}

/// One segment of a path: `None` only when an object has no such member
fn step<'v>(value: &'v Value, segment: &str) -> Option<Cow<'v, Value>> {
    let nil = || Some(Cow::Owned(Value::Nil));
    match value {
        Value::Mapping(map) => map.get(segment).map(Cow::Borrowed).or_else(nil),
        Value::Sequence(items) => match segment {
            "size" => Some(Cow::Owned(Value::from(items.len()))),
            "first" => items.first().map(Cow::Borrowed).or_else(nil),
            "last" => items.last().map(Cow::Borrowed).or_else(nil),
            _ => segment.parse::<usize>().ok().and_then(|i| items.get(i)).map(Cow::Borrowed).or_else(nil),
        },
        Value::String(s) if segment == "size" => Some(Cow::Owned(Value::from(s.chars().count()))),
        Value::Object(object) => object.field(segment).or_else(|| object.call_method(segment)).map(Cow::Owned),
        _ => nil(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Resolvable;

    #[derive(Debug)]
    struct Ghola {
        master: Option<&'static str>,
    }

    impl Resolvable for Ghola {
        fn field(&self, name: &str) -> Option<Value> {
            match name {
                "master" => Some(self.master.into()),
                _ => None,
            }
        }

        fn call_method(&self, name: &str) -> Option<Value> {
            match name {
                "name" => Some(Value::from("Duncan")),
                _ => None,
            }
        }
    }

    fn path(p: &str) -> Vec<String> {
        p.split('.').map(ToString::to_string).collect()
    }

    fn found(lookup: Lookup) -> Value {
        match lookup {
            Lookup::Found(value) => value.into_owned(),
            Lookup::Unresolved => panic!("path should have been resolved"),
        }
    }

    fn context() -> Context {
        let mut data = Context::new();
        data.insert("colors", &vec!["brown", "blue"]);
        data.insert("name", "leto");
        data.insert_object("ghola", Ghola { master: Some("Leto") });
        data.insert_object("orphan", Ghola { master: None });
        data
    }

    #[test]
    fn missing_variables_are_nil() {
        let data = context();
        let ctx = RenderContext::new(&data);
        assert!(found(ctx.lookup(&path("nope"))).is_nil());
        assert!(found(ctx.lookup(&path("nope.deeper.still"))).is_nil());
    }

    #[test]
    fn sequence_members() {
        let data = context();
        let ctx = RenderContext::new(&data);
        assert_eq!(found(ctx.lookup(&path("colors.first"))), Value::from("brown"));
        assert_eq!(found(ctx.lookup(&path("colors.last"))), Value::from("blue"));
        assert_eq!(found(ctx.lookup(&path("colors.1"))), Value::from("blue"));
        assert_eq!(found(ctx.lookup(&path("colors.size"))), Value::from(2));
        assert!(found(ctx.lookup(&path("colors.7"))).is_nil());
        assert_eq!(found(ctx.lookup(&path("name.size"))), Value::from(4));
    }

    #[test]
    fn object_fields_and_methods() {
        let data = context();
        let ctx = RenderContext::new(&data);
        assert_eq!(found(ctx.lookup(&path("ghola.master"))), Value::from("Leto"));
        assert_eq!(found(ctx.lookup(&path("ghola.name"))), Value::from("Duncan"));
        assert!(found(ctx.lookup(&path("orphan.master"))).is_nil());
        assert!(found(ctx.lookup(&path("orphan.master.name"))).is_nil());
    }

    #[test]
    fn unknown_object_member_is_unresolved() {
        let data = context();
        let ctx = RenderContext::new(&data);
        assert!(matches!(ctx.lookup(&path("ghola.eyes")), Lookup::Unresolved));
        assert!(matches!(ctx.lookup(&path("ghola.eyes.color")), Lookup::Unresolved));
        assert!(ctx.resolve("ghola.eyes").is_nil());
    }

    #[test]
    fn locals_shadow_data() {
        let data = context();
        let mut ctx = RenderContext::new(&data);
        ctx.set("name".to_string(), Value::from("paul"));
        assert_eq!(ctx.get("name"), Some(&Value::from("paul")));
        assert_eq!(ctx.resolve("name"), Value::from("paul"));
        assert_eq!(ctx.resolve("colors.first"), Value::from("brown"));
    }
}
