//! Responsible for rendering droplet templates

pub use self::context::RenderContext;
pub(crate) use self::processor::Processor;

mod context;
mod processor;

#[cfg(test)]
mod tests;
