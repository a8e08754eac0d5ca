use std::io::Write;
use std::sync::Arc;

use crate::config::Config;
use crate::context::Context;
use crate::errors::{Error, Result};
use crate::parser::ast::Node;
use crate::parser::parse;
use crate::renderer::Processor;

/// This is the parsed equivalent of a template source.
///
/// A template is immutable once compiled and can be rendered any number of times,
/// from any number of threads at once.
#[derive(Debug, Clone)]
pub struct Template {
    /// The top-level nodes
    code: Vec<Node>,
    /// The filters and tags it was compiled with
    config: Arc<Config>,
}

impl Template {
    /// Compiles a template with the default config, see `droplet::parse`
    pub fn parse(source: &str) -> Result<Template> {
        Template::new(source, &Config::default())
    }

    pub(crate) fn new(source: &str, config: &Config) -> Result<Template> {
        let code = parse(source, config)?;
        Ok(Template { code, config: Arc::new(config.clone()) })
    }

    /// The top-level nodes of the template, in order
    pub fn code(&self) -> &[Node] {
        &self.code
    }

    pub(crate) fn config(&self) -> &Config {
        &self.config
    }

    /// Renders the template against `data`, never fails.
    ///
    /// Missing variables render as nothing and members objects don't have render as
    /// a `{{UPPER.CASED.PATH}}` placeholder.
    pub fn render(&self, data: &Context) -> Vec<u8> {
        self.render_to_string(data).into_bytes()
    }

    /// Same as `render` but as a `String`
    pub fn render_to_string(&self, data: &Context) -> String {
        let mut processor = Processor::new(self, data);
        processor.render()
    }

    /// Renders the template and writes the result to `write`.
    /// Only writing can fail.
    pub fn render_to(&self, data: &Context, mut write: impl Write) -> Result<()> {
        write.write_all(self.render_to_string(data).as_bytes()).map_err(Error::io_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io;

    use crate::parser::ast::{Expr, Output};

    struct Failing;

    impl Write for Failing {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "nope"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn code_exposes_the_top_level_nodes() {
        let template = Template::parse("hello {{ name }}").unwrap();
        assert_eq!(
            template.code(),
            &[
                Node::Literal("hello ".to_string()),
                Node::Output(Output { expr: Expr::path(vec!["name"]), filters: vec![] }),
            ][..]
        );
    }

    #[test]
    fn render_to_writes_everything() {
        let template = Template::parse("it's over {{ 9000 }}").unwrap();
        let mut buffer = Vec::new();
        template.render_to(&Context::new(), &mut buffer).unwrap();
        assert_eq!(buffer, b"it's over 9000".to_vec());
    }

    #[test]
    fn render_to_reports_io_errors() {
        let template = Template::parse("hello").unwrap();
        let err = template.render_to(&Context::new(), Failing).unwrap_err();
        match err.kind {
            crate::errors::ErrorKind::Io(kind) => assert_eq!(kind, io::ErrorKind::PermissionDenied),
            _ => panic!("expected an io error, got {:?}", err),
        }
    }

    #[test]
    fn templates_keep_the_config_they_were_compiled_with() {
        let mut config = Config::empty();
        config.register_filter("x", |v: &crate::value::Value, _: Option<&crate::value::Value>| v.clone());
        let template = Template::new("{{ 1 | x }}", &config).unwrap();
        config.register_filter("y", |v: &crate::value::Value, _: Option<&crate::value::Value>| v.clone());
        assert!(template.config().has_filter("x"));
        assert!(!template.config().has_filter("y"));
    }

    #[test]
    fn template_is_send_and_sync() {
        fn test_send_sync<T: Send + Sync>() {}

        test_send_sync::<Template>();
    }
}
