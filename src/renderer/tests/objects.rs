use std::sync::Arc;

use crate::config::Config;
use crate::context::Context;
use crate::renderer::RenderContext;
use crate::template::Template;
use crate::value::{Resolvable, Value};

use super::render_template;

#[derive(Debug)]
struct Person {
    name: String,
    incarnations: i64,
    master: Option<Arc<Person>>,
}

impl Person {
    fn new(name: &str, incarnations: i64, master: Option<Person>) -> Person {
        Person { name: name.to_string(), incarnations, master: master.map(Arc::new) }
    }
}

impl Resolvable for Person {
    fn field(&self, name: &str) -> Option<Value> {
        match name {
            "name" => Some(Value::from(self.name.as_str())),
            "incarnations" => Some(Value::from(self.incarnations)),
            "master" => Some(match &self.master {
                Some(master) => Value::Object(master.clone()),
                None => Value::Nil,
            }),
            _ => None,
        }
    }

    fn call_method(&self, name: &str) -> Option<Value> {
        match name {
            "next_incarnation" => Some(Value::from(self.incarnations + 1)),
            _ => None,
        }
    }

    fn to_display_string(&self) -> Option<String> {
        Some(self.name.clone())
    }
}

/// Same as a person but without any notion of master
#[derive(Debug)]
struct Orphan {
    name: String,
}

impl Resolvable for Orphan {
    fn field(&self, name: &str) -> Option<Value> {
        match name {
            "name" => Some(Value::from(self.name.as_str())),
            _ => None,
        }
    }
}

fn context() -> Context {
    let mut context = Context::new();
    context.insert_object("ghola", Person::new("duncan", 67, Some(Person::new("leto", 1, None))));
    context.insert_object("orphan", Orphan { name: "hayt".to_string() });
    context
}

#[test]
fn render_object_fields_and_methods() {
    let result = render_template(
        "{{ ghola.name }}, next is {{ ghola.incarnations | plus: 1 }}th. Your master is {{ ghola.master.name | upcase }}",
        &context(),
    );
    assert_eq!(result, "duncan, next is 68th. Your master is LETO");
}

#[test]
fn render_object_method() {
    assert_eq!(render_template("{{ ghola.next_incarnation }}", &context()), "68");
}

#[test]
fn render_object_through_its_display_string() {
    assert_eq!(render_template("{{ ghola }} serves {{ ghola.master }}", &context()), "duncan serves leto");
}

#[test]
fn missing_object_member_renders_a_placeholder() {
    let inputs = vec![
        ("{{ orphan.master }}", "{{ORPHAN.MASTER}}"),
        ("{{ orphan.master.name }}", "{{ORPHAN.MASTER.NAME}}"),
        ("{{ orphan.master | upcase | append: '!' }}", "{{ORPHAN.MASTER}}"),
        ("{{ orphan.name }}", "hayt"),
    ];

    for (input, expected) in inputs {
        println!("{:?} -> {:?}", input, expected);
        assert_eq!(render_template(input, &context()), expected);
    }
}

#[test]
fn placeholder_holds_the_whole_path_when_resolution_stops_midway() {
    let inputs = vec![
        ("{{ ghola.eyes.color }}", "{{GHOLA.EYES.COLOR}}"),
        ("{{ ghola.master.eyes.color | upcase }}", "{{GHOLA.MASTER.EYES.COLOR}}"),
        ("[{% if ghola.eyes.color %}x{% endif %}]", "[]"),
    ];

    for (input, expected) in inputs {
        println!("{:?} -> {:?}", input, expected);
        assert_eq!(render_template(input, &context()), expected);
    }
}

#[test]
fn nil_member_renders_nothing() {
    assert_eq!(render_template("[{{ ghola.master.master }}]", &context()), "[]");
    assert_eq!(render_template("[{{ ghola.master.master.name }}]", &context()), "[]");
}

#[test]
fn missing_object_member_is_nil_in_conditions() {
    let result = render_template(
        "{% if orphan.master %}bound{% else %}free{% endif %}{% unless orphan.master %}!{% endunless %}",
        &context(),
    );
    assert_eq!(result, "free!");
}

#[test]
fn objects_compare_through_their_display_string() {
    let result = render_template(
        "{% if ghola == 'duncan' %}yes{% endif %}{% case ghola.master %}{% when 'leto' %}-leto{% endcase %}",
        &context(),
    );
    assert_eq!(result, "yes-leto");
}

#[test]
fn assign_an_object() {
    let result = render_template("{% assign master = ghola.master %}{{ master.name }}", &context());
    assert_eq!(result, "leto");
}

fn master_of(markup: &str, context: &RenderContext, output: &mut String) {
    let value = context.resolve(&format!("{}.master.name", markup));
    output.push_str(&value.render());
}

#[test]
fn custom_tag_resolves_paths() {
    let mut config = Config::default();
    config.register_tag("master_of", master_of);
    let template = Template::new("[{% master_of ghola %}][{% master_of orphan %}]", &config).unwrap();
    assert_eq!(template.render_to_string(&context()), "[leto][]");
}

fn show_local(markup: &str, context: &RenderContext, output: &mut String) {
    if let Some(value) = context.get(markup) {
        output.push_str(&value.render());
    }
}

#[test]
fn custom_tag_sees_assigned_variables() {
    let mut config = Config::default();
    config.register_tag("show", show_local);
    let template = Template::new("{% assign x = 'local' %}{% show x %}", &config).unwrap();
    assert_eq!(template.render_to_string(&Context::new()), "local");
}
