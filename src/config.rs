use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::builtins::filters::{array, common, global_filters, number, string, Filter};
use crate::builtins::tags::Tag;

/// Tag names handled by the parser itself, they can't be registered as custom tags
const RESERVED_TAGS: &[&str] = &[
    "if", "elseif", "elsif", "else", "endif", "unless", "endunless", "case", "when", "endcase",
    "capture", "endcapture", "assign", "comment", "endcomment", "raw", "endraw",
];

/// The filters and custom tags available to templates.
///
/// A template keeps its own copy of the `Config` it was compiled with: registering something
/// afterwards only affects templates compiled after that.
///
/// ```rust
/// use droplet::{Config, Context, Value};
///
/// let mut config = Config::default();
/// config.register_filter("shout", |value: &Value, _: Option<&Value>| {
///     Value::from(format!("{}!", value.render().to_uppercase()))
/// });
/// let template = droplet::parse("{{ name | shout }}", Some(&config)).unwrap();
///
/// let mut context = Context::new();
/// context.insert("name", "duncan");
/// assert_eq!(template.render_to_string(&context), "DUNCAN!");
/// ```
#[derive(Clone)]
pub struct Config {
    filters: HashMap<String, Arc<dyn Filter>>,
    tags: HashMap<String, Arc<dyn Tag>>,
}

impl Config {
    /// A config without any filter or tag, not even the built-in ones
    pub fn empty() -> Config {
        Config { filters: HashMap::new(), tags: HashMap::new() }
    }

    /// Register a filter with Droplet.
    ///
    /// If a filter with that name already exists, it will be overwritten
    pub fn register_filter<F: Filter + 'static>(&mut self, name: &str, filter: F) -> &mut Self {
        self.filters.insert(name.to_string(), Arc::new(filter));
        self
    }

    /// Register a custom tag with Droplet.
    ///
    /// If a tag with that name already exists, it will be overwritten.
    ///
    /// # Panics
    ///
    /// If `name` is one of the tags built into the language, like `if` or `capture`.
    pub fn register_tag<T: Tag + 'static>(&mut self, name: &str, tag: T) -> &mut Self {
        assert!(!RESERVED_TAGS.contains(&name), "`{}` is a built-in tag and can't be replaced", name);
        self.tags.insert(name.to_string(), Arc::new(tag));
        self
    }

    pub fn has_filter(&self, name: &str) -> bool {
        self.filters.contains_key(name)
    }

    pub fn has_tag(&self, name: &str) -> bool {
        self.tags.contains_key(name)
    }

    pub(crate) fn get_filter(&self, name: &str) -> Option<&dyn Filter> {
        self.filters.get(name).map(|f| &**f)
    }

    pub(crate) fn get_tag(&self, name: &str) -> Option<&dyn Tag> {
        self.tags.get(name).map(|t| &**t)
    }

    fn register_builtin_filters(&mut self) {
        self.register_filter("capitalize", string::capitalize);
        self.register_filter("upcase", string::upcase);
        self.register_filter("downcase", string::downcase);
        self.register_filter("append", string::append);
        self.register_filter("prepend", string::prepend);
        self.register_filter("remove", string::remove);
        self.register_filter("remove_first", string::remove_first);
        self.register_filter("split", string::split);
        self.register_filter("strip", string::strip);
        self.register_filter("lstrip", string::lstrip);
        self.register_filter("rstrip", string::rstrip);
        self.register_filter("truncate", string::truncate);
        self.register_filter("strip_html", string::strip_html);
        self.register_filter("newline_to_br", string::newline_to_br);
        #[cfg(feature = "urlencode")]
        self.register_filter("url_encode", string::url_encode);

        self.register_filter("first", array::first);
        self.register_filter("last", array::last);
        self.register_filter("join", array::join);
        self.register_filter("reverse", array::reverse);
        self.register_filter("sort", array::sort);
        self.register_filter("uniq", array::uniq);

        self.register_filter("plus", number::plus);
        self.register_filter("minus", number::minus);
        self.register_filter("times", number::times);
        self.register_filter("divided_by", number::divided_by);
        self.register_filter("modulo", number::modulo);

        self.register_filter("size", common::size);
        self.register_filter("default", common::default);
        #[cfg(feature = "date")]
        self.register_filter("date", common::date);
    }
}

impl Default for Config {
    /// The built-in filters plus the ones registered with `droplet::register_filter`
    fn default() -> Config {
        let mut config = Config::empty();
        config.register_builtin_filters();
        for (name, filter) in global_filters() {
            config.filters.insert(name, filter);
        }
        config
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut filters = self.filters.keys().collect::<Vec<_>>();
        filters.sort();
        let mut tags = self.tags.keys().collect::<Vec<_>>();
        tags.sort();
        f.debug_struct("Config").field("filters", &filters).field("tags", &tags).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::RenderContext;
    use crate::value::Value;

    fn shrug(_: &str, _: &RenderContext, output: &mut String) {
        output.push_str("meh");
    }

    #[test]
    fn default_has_the_builtins() {
        let config = Config::default();
        for name in &["capitalize", "upcase", "downcase", "first", "plus", "size", "default"] {
            assert!(config.has_filter(name), "missing {}", name);
        }
        assert!(!config.has_filter("hello"));
    }

    #[test]
    fn empty_has_nothing() {
        let config = Config::empty();
        assert!(!config.has_filter("upcase"));
        assert!(!config.has_tag("anything"));
    }

    #[test]
    fn can_register_and_override_filters() {
        let mut config = Config::default();
        config
            .register_filter("upcase", |_: &Value, _: Option<&Value>| Value::from("nope"))
            .register_filter("hello", |_: &Value, _: Option<&Value>| Value::from("hello"));
        assert_eq!(config.get_filter("upcase").unwrap().filter(&Value::from("a"), None), Value::from("nope"));
        assert!(config.has_filter("hello"));
    }

    #[test]
    fn can_register_tags() {
        let mut config = Config::empty();
        config.register_tag("shrug", shrug);
        assert!(config.has_tag("shrug"));
        assert!(config.get_tag("shrug").is_some());
    }

    #[test]
    #[should_panic]
    fn cannot_replace_builtin_tags() {
        let mut config = Config::empty();
        config.register_tag("if", shrug);
    }

    #[test]
    fn debug_lists_names() {
        let mut config = Config::empty();
        config.register_filter("b", |v: &Value, _: Option<&Value>| v.clone());
        config.register_filter("a", |v: &Value, _: Option<&Value>| v.clone());
        assert_eq!(format!("{:?}", config), r#"Config { filters: ["a", "b"], tags: [] }"#);
    }
}
