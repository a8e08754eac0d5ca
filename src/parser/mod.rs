use std::vec::IntoIter;

use pest::error::InputLocation;
use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;

use crate::config::Config;
use crate::errors::{Error, ParseErrorKind, Result};
use crate::lexer::{line_col, tokenize, Segment};
use crate::value::Value;

// This include forces recompiling this source file if the grammar file changes.
const _GRAMMAR: &str = include_str!("droplet.pest");

#[derive(Parser)]
#[grammar = "parser/droplet.pest"]
pub struct DropletParser;

/// The AST of Droplet
pub mod ast;


use self::ast::*;

const IF_TERMINATORS: &[&str] = &["elseif", "elsif", "else", "endif"];
const UNLESS_TERMINATORS: &[&str] = &["else", "endunless"];
const CASE_TERMINATORS: &[&str] = &["when", "else", "endcase"];
const CAPTURE_TERMINATORS: &[&str] = &["endcapture"];

/// Strings are delimited by double or single quotes, we need to remove those
/// before putting them in the AST
fn replace_string_markers(input: &str) -> String {
    input[1..input.len() - 1].to_string()
}

/// A `{% %}` split between its keyword and the rest
#[derive(Debug, Clone, Copy)]
struct Tag<'s> {
    keyword: &'s str,
    /// Everything after the keyword, already trimmed
    args: &'s str,
    /// Byte offset of the keyword in the source
    position: usize,
    /// Byte offset of `args` in the source
    args_position: usize,
}

impl<'s> Tag<'s> {
    fn split(inner: &'s str, position: usize) -> Tag<'s> {
        let keyword_len = inner.find(char::is_whitespace).unwrap_or_else(|| inner.len());
        let args = inner[keyword_len..].trim_start();
        Tag {
            keyword: &inner[..keyword_len],
            args,
            position,
            args_position: position + inner.len() - args.len(),
        }
    }
}

/// Human friendly names of the grammar rules, used in error messages
fn describe_rule(rule: &Rule) -> String {
    match *rule {
        Rule::EOI => "end of tag".to_string(),
        Rule::int => "an integer".to_string(),
        Rule::float => "a float".to_string(),
        Rule::string | Rule::double_quoted_string | Rule::single_quoted_string => {
            "a string".to_string()
        }
        Rule::boolean => "`true` or `false`".to_string(),
        Rule::nil => "`nil`".to_string(),
        Rule::literal => "a literal".to_string(),
        Rule::ident => "an identifier (must start with a-z or _)".to_string(),
        Rule::path => "a variable (identifiers separated by `.`)".to_string(),
        Rule::primary => "a value".to_string(),
        Rule::op_eq => "`==`".to_string(),
        Rule::op_ineq => "`!=`".to_string(),
        Rule::op_lte => "`<=`".to_string(),
        Rule::op_gte => "`>=`".to_string(),
        Rule::op_lt => "`<`".to_string(),
        Rule::op_gt => "`>`".to_string(),
        Rule::op_contains => "`contains`".to_string(),
        Rule::op_and => "`and`".to_string(),
        Rule::op_or => "`or`".to_string(),
        Rule::comparison => "a comparison".to_string(),
        Rule::condition => "a condition".to_string(),
        Rule::filter => "a filter".to_string(),
        _ => format!("{:?}", rule),
    }
}

fn parse_literal(pair: Pair<Rule>) -> Result<Value> {
    let lit = match pair.into_inner().next() {
        Some(p) => p,
        None => unreachable!("a literal always has an inner rule"),
    };
    let position = lit.as_span().start();
    let value = match lit.as_rule() {
        Rule::int => match lit.as_str().parse::<i64>() {
            Ok(i) => Value::from(i),
            Err(_) => {
                return Err(Error::parse(
                    ParseErrorKind::MalformedExpression,
                    position,
                    format!("Integer out of bounds: `{}`", lit.as_str()),
                ))
            }
        },
        Rule::float => match lit.as_str().parse::<f64>() {
            Ok(f) => Value::from(f),
            Err(_) => {
                return Err(Error::parse(
                    ParseErrorKind::MalformedExpression,
                    position,
                    format!("Invalid float: `{}`", lit.as_str()),
                ))
            }
        },
        Rule::string => Value::String(replace_string_markers(lit.as_str())),
        Rule::boolean => Value::Bool(lit.as_str() == "true"),
        Rule::nil => Value::Nil,
        _ => unreachable!("{:?} not supposed to get there (parse_literal)!", lit.as_rule()),
    };
    Ok(value)
}

fn parse_primary(pair: Pair<Rule>) -> Result<Expr> {
    let p = match pair.into_inner().next() {
        Some(p) => p,
        None => unreachable!("a primary always has an inner rule"),
    };
    match p.as_rule() {
        Rule::literal => Ok(Expr::Literal(parse_literal(p)?)),
        Rule::path => Ok(Expr::Path(p.as_str().split('.').map(ToString::to_string).collect())),
        _ => unreachable!("{:?} not supposed to get there (parse_primary)!", p.as_rule()),
    }
}

fn parse_compare_operator(pair: &Pair<Rule>) -> CompareOperator {
    match pair.as_rule() {
        Rule::op_eq => CompareOperator::Eq,
        Rule::op_ineq => CompareOperator::NotEq,
        Rule::op_lt => CompareOperator::Lt,
        Rule::op_lte => CompareOperator::Lte,
        Rule::op_gt => CompareOperator::Gt,
        Rule::op_gte => CompareOperator::Gte,
        Rule::op_contains => CompareOperator::Contains,
        _ => unreachable!("{:?} is not a comparison operator", pair.as_rule()),
    }
}

fn parse_comparison(pair: Pair<Rule>) -> Result<Expr> {
    let mut lhs = None;
    let mut operator = None;
    let mut rhs = None;

    for p in pair.into_inner() {
        match p.as_rule() {
            Rule::primary if lhs.is_none() => lhs = Some(parse_primary(p)?),
            Rule::primary => rhs = Some(parse_primary(p)?),
            _ => operator = Some(parse_compare_operator(&p)),
        }
    }

    match (lhs, operator, rhs) {
        (Some(lhs), Some(operator), Some(rhs)) => Ok(Expr::comparison(operator, lhs, rhs)),
        (Some(lhs), None, None) => Ok(lhs),
        _ => unreachable!("comparisons have one or two operands"),
    }
}

/// `and`/`or` have no precedence over each other: `a or b and c` is `a or (b and c)`
fn parse_condition(pair: Pair<Rule>) -> Result<Expr> {
    let mut operands = vec![];
    let mut operators = vec![];

    for p in pair.into_inner() {
        match p.as_rule() {
            Rule::comparison => operands.push(parse_comparison(p)?),
            Rule::op_and => operators.push(LogicOperator::And),
            Rule::op_or => operators.push(LogicOperator::Or),
            _ => unreachable!("{:?} not supposed to get there (parse_condition)!", p.as_rule()),
        }
    }

    let mut expr = match operands.pop() {
        Some(e) => e,
        None => unreachable!("a condition has at least one operand"),
    };
    while let (Some(operator), Some(lhs)) = (operators.pop(), operands.pop()) {
        expr = Expr::logic(operator, lhs, expr);
    }
    Ok(expr)
}

/// Recursive descent over the lexer segments
struct TagParser<'s, 'c> {
    source: &'s str,
    segments: IntoIter<Segment<'s>>,
    config: &'c Config,
}

impl<'s, 'c> TagParser<'s, 'c> {
    fn new(source: &'s str, segments: Vec<Segment<'s>>, config: &'c Config) -> Self {
        TagParser { source, segments: segments.into_iter(), config }
    }

    fn error(&self, kind: ParseErrorKind, position: usize, message: impl AsRef<str>) -> Error {
        let (line, column) = line_col(self.source, position);
        Error::parse(kind, position, format!("{}:{}: {}", line, column, message.as_ref()))
    }

    /// Runs a grammar rule over the content of a tag located at `offset` in the source
    fn parse_rule(&self, rule: Rule, input: &'s str, offset: usize) -> Result<Pair<'s, Rule>> {
        match DropletParser::parse(rule, input) {
            Ok(mut pairs) => match pairs.next() {
                Some(pair) => Ok(pair),
                None => unreachable!("a successful parse yields the top rule"),
            },
            Err(e) => {
                let position = match e.location {
                    InputLocation::Pos(p) => p,
                    InputLocation::Span((start, _)) => start,
                };
                let e = e.renamed_rules(describe_rule);
                Err(self.error(
                    ParseErrorKind::MalformedExpression,
                    offset + position,
                    e.variant.message(),
                ))
            }
        }
    }

    /// Re-positions errors raised on a single pair of a tag parsed at `offset`
    fn locate<T>(&self, result: Result<T>, offset: usize) -> Result<T> {
        result.map_err(|e| {
            let relocated =
                e.as_parse_error().map(|pe| self.error(pe.kind, offset + pe.position, &pe.message));
            relocated.unwrap_or(e)
        })
    }

    fn parse_filter(&self, pair: Pair<Rule>, offset: usize) -> Result<FilterCall> {
        let position = offset + pair.as_span().start();
        let mut name = None;
        let mut arg = None;

        for p in pair.into_inner() {
            match p.as_rule() {
                Rule::ident => name = Some(p.as_str().to_string()),
                Rule::primary => arg = Some(self.locate(parse_primary(p), offset)?),
                _ => unreachable!("{:?} not supposed to get there (parse_filter)!", p.as_rule()),
            }
        }

        let name = match name {
            Some(n) => n,
            None => unreachable!("a filter always has a name"),
        };
        if !self.config.has_filter(&name) {
            return Err(self.error(
                ParseErrorKind::UnknownFilter,
                position,
                format!("Filter `{}` is not registered", name),
            ));
        }

        Ok(FilterCall { name, arg })
    }

    /// Parses `expr | filter | filter: arg`, from either an output or an assign
    fn parse_output_pairs(&self, pair: Pair<'s, Rule>, offset: usize) -> Result<(Option<String>, Output)> {
        let mut name = None;
        let mut expr = None;
        let mut filters = vec![];

        for p in pair.into_inner() {
            match p.as_rule() {
                Rule::ident => name = Some(p.as_str().to_string()),
                Rule::comparison => expr = Some(self.locate(parse_comparison(p), offset)?),
                Rule::filter => filters.push(self.parse_filter(p, offset)?),
                Rule::EOI => (),
                _ => unreachable!("{:?} not supposed to get there (parse_output)!", p.as_rule()),
            }
        }

        match expr {
            Some(expr) => Ok((name, Output { expr, filters })),
            None => unreachable!("outputs always have an expression"),
        }
    }

    fn parse_output(&self, inner: &'s str, position: usize) -> Result<Output> {
        let pair = self.parse_rule(Rule::output_tag, inner, position)?;
        let (_, output) = self.parse_output_pairs(pair, position)?;
        Ok(output)
    }

    fn parse_condition(&self, tag: &Tag<'s>) -> Result<Expr> {
        let pair = self.parse_rule(Rule::condition_tag, tag.args, tag.args_position)?;
        for p in pair.into_inner() {
            if p.as_rule() == Rule::condition {
                return self.locate(parse_condition(p), tag.args_position);
            }
        }
        unreachable!("condition tags always contain a condition")
    }

    fn expect_no_args(&self, tag: &Tag<'s>) -> Result<()> {
        if tag.args.is_empty() {
            Ok(())
        } else {
            Err(self.error(
                ParseErrorKind::UnexpectedToken,
                tag.args_position,
                format!("`{}` doesn't take any argument, found `{}`", tag.keyword, tag.args),
            ))
        }
    }

    fn unclosed(&self, opener: &Tag<'s>, closer: &str) -> Error {
        self.error(
            ParseErrorKind::UnmatchedTag,
            opener.position,
            format!("`{}` is never closed: expected `{}` before the end of the template", opener.keyword, closer),
        )
    }

    /// Parses sibling nodes until one of the `terminators` tags is found at this depth, or
    /// the end of the input. The terminator found, if any, is returned along with the nodes.
    fn parse_body(
        &mut self,
        terminators: &[&str],
        within: Option<&Tag<'s>>,
    ) -> Result<(Vec<Node>, Option<Tag<'s>>)> {
        let mut nodes = vec![];

        while let Some(segment) = self.segments.next() {
            match segment {
                Segment::Text(text) => nodes.push(Node::Literal(text.to_string())),
                Segment::Output(inner, position) => {
                    nodes.push(Node::Output(self.parse_output(inner, position)?))
                }
                Segment::Block(inner, position) => {
                    let tag = Tag::split(inner, position);
                    if terminators.contains(&tag.keyword) {
                        return Ok((nodes, Some(tag)));
                    }

                    match tag.keyword {
                        "if" => nodes.push(self.parse_conditional(tag, false)?),
                        "unless" => nodes.push(self.parse_conditional(tag, true)?),
                        "case" => nodes.push(self.parse_switch(tag)?),
                        "capture" => nodes.push(self.parse_capture(tag)?),
                        "assign" => nodes.push(self.parse_assign(tag)?),
                        "" => {
                            return Err(self.error(
                                ParseErrorKind::UnexpectedToken,
                                tag.position,
                                "Empty tag",
                            ))
                        }
                        "elseif" | "elsif" | "else" | "when" => {
                            let message = match within {
                                Some(opener) => {
                                    format!("`{}` is not allowed inside `{}`", tag.keyword, opener.keyword)
                                }
                                None => format!("`{}` is not allowed outside of a block", tag.keyword),
                            };
                            return Err(self.error(ParseErrorKind::UnexpectedToken, tag.position, message));
                        }
                        keyword if self.config.has_tag(keyword) => nodes.push(self.parse_custom(tag)?),
                        keyword if keyword.starts_with("end") => {
                            let message = match within {
                                Some(opener) => format!("`{}` doesn't close `{}`", keyword, opener.keyword),
                                None => format!("`{}` has no matching opening tag", keyword),
                            };
                            return Err(self.error(ParseErrorKind::UnmatchedTag, tag.position, message));
                        }
                        keyword => {
                            return Err(self.error(
                                ParseErrorKind::UnexpectedToken,
                                tag.position,
                                format!("Unknown tag `{}`", keyword),
                            ))
                        }
                    }
                }
            }
        }

        Ok((nodes, None))
    }

    /// `if`/`elseif`/`else`/`endif` and `unless`/`else`/`endunless`
    fn parse_conditional(&mut self, opener: Tag<'s>, negated: bool) -> Result<Node> {
        let first = self.parse_condition(&opener)?;
        let (terminators, closer) =
            if negated { (UNLESS_TERMINATORS, "endunless") } else { (IF_TERMINATORS, "endif") };

        let mut branches = vec![];
        let mut condition = Some(if negated { Expr::Not(Box::new(first)) } else { first });
        let mut seen_else = false;

        loop {
            let (body, end) = self.parse_body(terminators, Some(&opener))?;
            branches.push(Branch { condition: condition.take(), body });
            let end = end.ok_or_else(|| self.unclosed(&opener, closer))?;

            match end.keyword {
                "elseif" | "elsif" | "else" if seen_else => {
                    return Err(self.error(
                        ParseErrorKind::UnexpectedToken,
                        end.position,
                        format!("`{}` found after the `else` of `{}`", end.keyword, opener.keyword),
                    ));
                }
                "elseif" | "elsif" => condition = Some(self.parse_condition(&end)?),
                "else" => {
                    self.expect_no_args(&end)?;
                    seen_else = true;
                }
                _ => {
                    self.expect_no_args(&end)?;
                    return Ok(Node::Conditional(Conditional { branches }));
                }
            }
        }
    }

    /// `case`/`when`/`else`/`endcase`
    fn parse_switch(&mut self, opener: Tag<'s>) -> Result<Node> {
        let pair = self.parse_rule(Rule::case_tag, opener.args, opener.args_position)?;
        let subject = match pair.into_inner().find(|p| p.as_rule() == Rule::primary) {
            Some(p) => self.locate(parse_primary(p), opener.args_position)?,
            None => unreachable!("case tags always have a subject"),
        };

        // Only text, which is dropped, can sit between the `case` and its first `when`
        let (preamble, end) = self.parse_body(CASE_TERMINATORS, Some(&opener))?;
        if preamble.iter().any(|n| !matches!(n, Node::Literal(_))) {
            return Err(self.error(
                ParseErrorKind::UnexpectedToken,
                opener.position,
                "Only `when` or `else` can follow a `case` tag",
            ));
        }

        let mut cases = vec![];
        let mut otherwise = None;
        let mut end = end.ok_or_else(|| self.unclosed(&opener, "endcase"))?;

        loop {
            match end.keyword {
                "when" | "else" if otherwise.is_some() => {
                    return Err(self.error(
                        ParseErrorKind::UnexpectedToken,
                        end.position,
                        format!("`{}` found after the `else` of `case`", end.keyword),
                    ));
                }
                "when" => {
                    let values = self.parse_when_values(&end)?;
                    let (body, next) = self.parse_body(CASE_TERMINATORS, Some(&opener))?;
                    cases.push(When { values, body });
                    end = next.ok_or_else(|| self.unclosed(&opener, "endcase"))?;
                }
                "else" => {
                    self.expect_no_args(&end)?;
                    let (body, next) = self.parse_body(CASE_TERMINATORS, Some(&opener))?;
                    otherwise = Some(body);
                    end = next.ok_or_else(|| self.unclosed(&opener, "endcase"))?;
                }
                _ => {
                    self.expect_no_args(&end)?;
                    return Ok(Node::Switch(Switch { subject, cases, otherwise }));
                }
            }
        }
    }

    fn parse_when_values(&self, tag: &Tag<'s>) -> Result<Vec<Expr>> {
        let pair = self.parse_rule(Rule::when_tag, tag.args, tag.args_position)?;
        let mut values = vec![];
        for p in pair.into_inner() {
            if p.as_rule() == Rule::primary {
                values.push(self.locate(parse_primary(p), tag.args_position)?);
            }
        }
        Ok(values)
    }

    fn parse_capture(&mut self, opener: Tag<'s>) -> Result<Node> {
        let pair = self.parse_rule(Rule::capture_tag, opener.args, opener.args_position)?;
        let name = match pair.into_inner().find(|p| p.as_rule() == Rule::ident) {
            Some(p) => p.as_str().to_string(),
            None => unreachable!("capture tags always have a name"),
        };

        let (body, end) = self.parse_body(CAPTURE_TERMINATORS, Some(&opener))?;
        let end = end.ok_or_else(|| self.unclosed(&opener, "endcapture"))?;
        self.expect_no_args(&end)?;

        Ok(Node::Capture(Capture { name, body }))
    }

    fn parse_assign(&mut self, tag: Tag<'s>) -> Result<Node> {
        let pair = self.parse_rule(Rule::assign_tag, tag.args, tag.args_position)?;
        let (name, value) = self.parse_output_pairs(pair, tag.args_position)?;
        match name {
            Some(name) => Ok(Node::Assign(Assign { name, value })),
            None => unreachable!("assign tags always have a name"),
        }
    }

    fn parse_custom(&mut self, tag: Tag<'s>) -> Result<Node> {
        if let Some(custom) = self.config.get_tag(tag.keyword) {
            if let Err(e) = custom.parse(tag.args) {
                return Err(self.error(
                    ParseErrorKind::MalformedExpression,
                    tag.args_position,
                    format!("Invalid `{}` tag: {}", tag.keyword, e),
                ));
            }
        }
        Ok(Node::Custom(CustomTag { name: tag.keyword.to_string(), markup: tag.args.to_string() }))
    }
}

/// Compiles a template source into its top-level nodes.
/// Filters and custom tags are checked against the given config.
#[tracing::instrument(level = "debug", skip_all, fields(len = source.len()))]
pub fn parse(source: &str, config: &Config) -> Result<Vec<Node>> {
    let segments = tokenize(source)?;
    let mut parser = TagParser::new(source, segments, config);
    // Nothing terminates the top level: stray closers are reported by `parse_body`
    let (nodes, _) = parser.parse_body(&[], None)?;
    tracing::trace!(nodes = nodes.len(), "parsed template");
    Ok(nodes)
}
