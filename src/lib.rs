#![doc(html_root_url = "https://docs.rs/droplet")]
//! # Droplet
//!
//! A Liquid-flavoured template engine: compile a template once, render it many times
//! against different data.
//!
//! ## Features
//!
//! - `{{ expr | filter: arg }}` outputs with a registry of filters
//! - `if`/`elseif`/`else`, `unless`, `case`/`when`, `capture` and `assign` tags
//! - Custom filters and tags
//! - Host objects exposed through the `Resolvable` trait, with fields and methods looked up
//!   by name while rendering
//! - Rendering never fails: missing data renders as nothing
//!
//! ## Example
//!
//! ```rust
//! use droplet::Context;
//!
//! let template = droplet::parse("hello {{ name | capitalize }}", None).unwrap();
//!
//! let mut context = Context::new();
//! context.insert("name", "leto atreides");
//!
//! assert_eq!(template.render(&context), b"hello Leto Atreides");
//! ```

mod builtins;
mod config;
mod context;
mod errors;
mod lexer;
mod parser;
mod renderer;
mod template;
mod value;

// Library exports.

pub use crate::builtins::filters::{register_filter, Filter};
pub use crate::builtins::tags::Tag;
pub use crate::config::Config;
pub use crate::context::Context;
pub use crate::errors::{Error, ErrorKind, LexError, ParseError, ParseErrorKind, Result};
pub use crate::renderer::RenderContext;
pub use crate::template::Template;
pub use crate::value::{to_value, Map, Resolvable, Value};
/// The nodes a `Template` is made of, see `Template::code`
pub use crate::parser::ast;

/// Compiles a template source.
///
/// Filters and custom tags are taken from `options`, or from `Config::default()` when
/// it's `None`: the built-in filters plus those registered with `register_filter`.
///
/// ```rust
/// let err = droplet::parse("{% if true %}never closed", None).unwrap_err();
/// assert!(err.as_parse_error().is_some());
/// ```
pub fn parse(source: &str, options: Option<&Config>) -> Result<Template> {
    match options {
        Some(config) => Template::new(source, config),
        None => Template::parse(source),
    }
}
