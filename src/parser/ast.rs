use std::fmt;

use crate::value::Value;

/// All comparison operators
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum CompareOperator {
    /// ==
    Eq,
    /// != or <>
    NotEq,
    /// <
    Lt,
    /// <=
    Lte,
    /// >
    Gt,
    /// >=
    Gte,
    /// contains
    Contains,
}

impl fmt::Display for CompareOperator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}",
            match *self {
                CompareOperator::Eq => "==",
                CompareOperator::NotEq => "!=",
                CompareOperator::Lt => "<",
                CompareOperator::Lte => "<=",
                CompareOperator::Gt => ">",
                CompareOperator::Gte => ">=",
                CompareOperator::Contains => "contains",
            }
        )
    }
}

/// `and` / `or`
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum LogicOperator {
    And,
    Or,
}

impl fmt::Display for LogicOperator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}",
            match *self {
                LogicOperator::And => "and",
                LogicOperator::Or => "or",
            }
        )
    }
}

/// An expression is what is found in outputs, conditions and filter arguments.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// A literal value: `1`, `"hey"`, `true`, `nil`...
    Literal(Value),
    /// A dotted variable path, resolved when rendering: `ghola.master` is `["ghola", "master"]`
    Path(Vec<String>),
    /// `lhs op rhs`
    Comparison {
        operator: CompareOperator,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// `lhs and rhs`, `lhs or rhs`
    Logic {
        operator: LogicOperator,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// Truthiness inverted, used by `unless`
    Not(Box<Expr>),
}

impl Expr {
    pub fn path<S: Into<String>>(segments: Vec<S>) -> Expr {
        Expr::Path(segments.into_iter().map(Into::into).collect())
    }

    pub fn literal<V: Into<Value>>(value: V) -> Expr {
        Expr::Literal(value.into())
    }

    pub fn comparison(operator: CompareOperator, lhs: Expr, rhs: Expr) -> Expr {
        Expr::Comparison { operator, lhs: Box::new(lhs), rhs: Box::new(rhs) }
    }

    pub fn logic(operator: LogicOperator, lhs: Expr, rhs: Expr) -> Expr {
        Expr::Logic { operator, lhs: Box::new(lhs), rhs: Box::new(rhs) }
    }
}

/// A filter in a pipeline: `| name` or `| name: arg`
#[derive(Clone, Debug, PartialEq)]
pub struct FilterCall {
    pub name: String,
    pub arg: Option<Expr>,
}

/// A `{{ expr | filter }}`
#[derive(Clone, Debug, PartialEq)]
pub struct Output {
    pub expr: Expr,
    pub filters: Vec<FilterCall>,
}

/// One arm of a conditional: no condition means `else`
#[derive(Clone, Debug, PartialEq)]
pub struct Branch {
    pub condition: Option<Expr>,
    pub body: Vec<Node>,
}

/// `if`/`elseif`/`else` or `unless`/`else`
#[derive(Clone, Debug, PartialEq)]
pub struct Conditional {
    /// Tried in order, the first truthy one (or the unconditioned `else`) is rendered
    pub branches: Vec<Branch>,
}

/// A `{% when a or b %}` and what it renders
#[derive(Clone, Debug, PartialEq)]
pub struct When {
    pub values: Vec<Expr>,
    pub body: Vec<Node>,
}

/// `case`/`when`/`else`
#[derive(Clone, Debug, PartialEq)]
pub struct Switch {
    pub subject: Expr,
    pub cases: Vec<When>,
    pub otherwise: Option<Vec<Node>>,
}

/// `{% capture name %}...{% endcapture %}`
#[derive(Clone, Debug, PartialEq)]
pub struct Capture {
    pub name: String,
    pub body: Vec<Node>,
}

/// `{% assign name = expr | filter %}`
#[derive(Clone, Debug, PartialEq)]
pub struct Assign {
    pub name: String,
    pub value: Output,
}

/// A call to a tag registered in the `Config`
#[derive(Clone, Debug, PartialEq)]
pub struct CustomTag {
    pub name: String,
    /// Everything after the tag name, trimmed
    pub markup: String,
}

/// All the nodes a template can be made of
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    /// Some text, copied as is
    Literal(String),
    /// A `{{ }}` block
    Output(Output),
    /// An `if` or `unless` block
    Conditional(Conditional),
    /// A `case` block
    Switch(Switch),
    /// A `capture` block
    Capture(Capture),
    /// An `assign` tag
    Assign(Assign),
    /// A registered custom tag
    Custom(CustomTag),
}
