//! Syntax tree for the BUILD file subset of Starlark.

use std::fmt;

/// A 1-based line and column in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A top-level statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `load("//pkg:defs.bzl", "sym", alias = "other")`
    Load(Load),
    /// `target = value` or `target += value`
    Assign {
        target: Expr,
        op: AssignOp,
        value: Expr,
        pos: Position,
    },
    /// A bare expression, usually a rule call.
    Expr(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Load {
    pub module: String,
    /// `(local name, exported name)` pairs.
    pub symbols: Vec<(String, String)>,
    pub pos: Position,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    BitOr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    In,
    NotIn,
    BitOr,
    BitXor,
    BitAnd,
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
    Pos,
    Invert,
}

/// An expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Ident(String),
    String(String),
    /// Numeric literal, kept as written.
    Number(String),
    List(Vec<Expr>),
    Tuple(Vec<Expr>),
    Dict(Vec<(Expr, Expr)>),
    Call(Call),
    Dot {
        value: Box<Expr>,
        name: String,
    },
    Index {
        value: Box<Expr>,
        index: Box<Expr>,
    },
    Slice {
        value: Box<Expr>,
        start: Option<Box<Expr>>,
        stop: Option<Box<Expr>>,
        step: Option<Box<Expr>>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Conditional {
        then: Box<Expr>,
        cond: Box<Expr>,
        otherwise: Box<Expr>,
    },
    ListComprehension {
        body: Box<Expr>,
        clauses: Vec<Clause>,
    },
    DictComprehension {
        key: Box<Expr>,
        value: Box<Expr>,
        clauses: Vec<Clause>,
    },
}

impl Expr {
    /// The string value if this is a string literal.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Expr::String(s) => Some(s),
            _ => None,
        }
    }

    /// Dotted name for `a` or `a.b.c`, used as a rule kind.
    pub fn dotted_name(&self) -> Option<String> {
        match self {
            Expr::Ident(name) => Some(name.clone()),
            Expr::Dot { value, name } => value.dotted_name().map(|base| format!("{base}.{name}")),
            _ => None,
        }
    }
}

/// A `for` or `if` clause of a comprehension.
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    For { vars: Vec<Expr>, iter: Expr },
    If(Expr),
}

/// A call expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub func: Box<Expr>,
    pub args: Vec<Arg>,
    pub pos: Position,
}

impl Call {
    /// First keyword argument named `key`.
    pub fn keyword(&self, key: &str) -> Option<&Expr> {
        self.args.iter().find_map(|arg| match arg {
            Arg::Keyword { name, value } if name == key => Some(value),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Positional(Expr),
    Keyword { name: String, value: Expr },
    Star(Expr),
    StarStar(Expr),
}
