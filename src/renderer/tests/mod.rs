use crate::context::Context;
use crate::template::Template;

mod objects;

pub fn render_template(content: &str, context: &Context) -> String {
    let template = Template::parse(content).unwrap();
    template.render_to_string(context)
}
