use crate::errors::Result;
use crate::renderer::RenderContext;

/// A tag registered in a `Config` and used as `{% name markup %}`.
///
/// Custom tags don't have a body: everything between the name and `%}` is handed to
/// the tag as its markup, trimmed.
pub trait Tag: Sync + Send {
    /// Validates the markup when the template is compiled.
    /// An error here makes the whole compilation fail, defaults to accepting anything.
    fn parse(&self, _markup: &str) -> Result<()> {
        Ok(())
    }

    /// Writes the tag output. Lookups in the data being rendered go through `context`.
    fn render(&self, markup: &str, context: &RenderContext, output: &mut String);
}

impl<F> Tag for F
where
    F: Fn(&str, &RenderContext, &mut String) + Sync + Send,
{
    fn render(&self, markup: &str, context: &RenderContext, output: &mut String) {
        self(markup, context, output)
    }
}
