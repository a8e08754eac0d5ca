use std::borrow::Cow;
use std::cmp::Ordering;

use crate::context::Context;
use crate::parser::ast::*;
use crate::renderer::context::{Lookup, RenderContext};
use crate::template::Template;
use crate::value::Value;

/// What an unresolved path renders as in an output: `ghola.master` gives `{{GHOLA.MASTER}}`
fn placeholder(path: &[String]) -> String {
    format!("{{{{{}}}}}", path.join(".").to_uppercase())
}

/// Walks the nodes of a template, appending to an output buffer
pub struct Processor<'a> {
    template: &'a Template,
    context: RenderContext<'a>,
}

impl<'a> Processor<'a> {
    /// Create a new `Processor` that will do the rendering
    pub fn new(template: &'a Template, data: &'a Context) -> Self {
        Processor { template, context: RenderContext::new(data) }
    }

    fn render_body(&mut self, body: &'a [Node], buffer: &mut String) {
        for node in body {
            self.render_node(node, buffer);
        }
    }

    fn render_node(&mut self, node: &'a Node, buffer: &mut String) {
        match node {
            Node::Literal(text) => buffer.push_str(text),
            Node::Output(output) => self.render_output(output, buffer),
            Node::Conditional(conditional) => self.render_conditional(conditional, buffer),
            Node::Switch(switch) => self.render_switch(switch, buffer),
            Node::Capture(capture) => {
                let mut captured = String::new();
                self.render_body(&capture.body, &mut captured);
                self.context.set(capture.name.clone(), Value::String(captured));
            }
            Node::Assign(assign) => {
                let value = self.eval_output(&assign.value).map(Cow::into_owned).unwrap_or(Value::Nil);
                self.context.set(assign.name.clone(), value);
            }
            Node::Custom(tag) => match self.template.config().get_tag(&tag.name) {
                Some(custom) => custom.render(&tag.markup, &self.context, buffer),
                None => tracing::debug!(name = %tag.name, "tag is not registered, skipping it"),
            },
        }
    }

    fn render_output(&self, output: &'a Output, buffer: &mut String) {
        match self.eval_output(output) {
            Some(value) => buffer.push_str(&value.render()),
            None => {
                if let Expr::Path(path) = &output.expr {
                    buffer.push_str(&placeholder(path));
                }
            }
        }
    }

    fn render_conditional(&mut self, conditional: &'a Conditional, buffer: &mut String) {
        for branch in &conditional.branches {
            let taken = match &branch.condition {
                Some(condition) => self.eval_expr(condition).is_truthy(),
                None => true,
            };
            if taken {
                self.render_body(&branch.body, buffer);
                return;
            }
        }
    }

    fn render_switch(&mut self, switch: &'a Switch, buffer: &mut String) {
        let body = {
            let subject = self.eval_expr(&switch.subject);
            let subject = subject.comparable();
            switch
                .cases
                .iter()
                .find(|case| case.values.iter().any(|v| *self.eval_expr(v).comparable() == *subject))
                .map(|case| &case.body)
                .or_else(|| switch.otherwise.as_ref())
        };

        if let Some(body) = body {
            self.render_body(body, buffer);
        }
    }

    /// The value of an output or assign, filters applied.
    /// `None` when the expression is a path that couldn't be resolved, in which case the
    /// filters are not applied either.
    fn eval_output(&self, output: &'a Output) -> Option<Cow<'_, Value>> {
        let mut value = match &output.expr {
            Expr::Path(path) => match self.context.lookup(path) {
                Lookup::Found(value) => value,
                Lookup::Unresolved => return None,
            },
            expr => self.eval_expr(expr),
        };

        for call in &output.filters {
            let filter = match self.template.config().get_filter(&call.name) {
                Some(filter) => filter,
                None => {
                    tracing::debug!(name = %call.name, "filter is not registered, skipping it");
                    continue;
                }
            };
            let arg = call.arg.as_ref().map(|arg| self.eval_expr(arg));
            value = Cow::Owned(filter.filter(&value, arg.as_deref()));
        }

        Some(value)
    }

    fn eval_expr(&self, expr: &'a Expr) -> Cow<'_, Value> {
        match expr {
            Expr::Literal(value) => Cow::Borrowed(value),
            Expr::Path(path) => match self.context.lookup(path) {
                Lookup::Found(value) => value,
                Lookup::Unresolved => Cow::Owned(Value::Nil),
            },
            Expr::Comparison { operator, lhs, rhs } => {
                Cow::Owned(Value::Bool(self.eval_comparison(*operator, lhs, rhs)))
            }
            Expr::Logic { operator, lhs, rhs } => {
                let result = match operator {
                    LogicOperator::And => {
                        self.eval_expr(lhs).is_truthy() && self.eval_expr(rhs).is_truthy()
                    }
                    LogicOperator::Or => {
                        self.eval_expr(lhs).is_truthy() || self.eval_expr(rhs).is_truthy()
                    }
                };
                Cow::Owned(Value::Bool(result))
            }
            Expr::Not(inner) => Cow::Owned(Value::Bool(!self.eval_expr(inner).is_truthy())),
        }
    }

    fn eval_comparison(&self, operator: CompareOperator, lhs: &'a Expr, rhs: &'a Expr) -> bool {
        let lhs_value = self.eval_expr(lhs);
        let rhs_value = self.eval_expr(rhs);
        let (lhs, rhs) = (lhs_value.comparable(), rhs_value.comparable());

        match operator {
            CompareOperator::Eq => lhs == rhs,
            CompareOperator::NotEq => lhs != rhs,
            CompareOperator::Lt => lhs.partial_order(&rhs) == Some(Ordering::Less),
            CompareOperator::Lte => {
                matches!(lhs.partial_order(&rhs), Some(Ordering::Less) | Some(Ordering::Equal))
            }
            CompareOperator::Gt => lhs.partial_order(&rhs) == Some(Ordering::Greater),
            CompareOperator::Gte => {
                matches!(lhs.partial_order(&rhs), Some(Ordering::Greater) | Some(Ordering::Equal))
            }
            CompareOperator::Contains => lhs.contains(&rhs),
        }
    }

    /// Entry point for the rendering
    pub fn render(&mut self) -> String {
        let template = self.template;
        let mut output = String::new();
        self.render_body(template.code(), &mut output);
        output
    }
}
