//! Rule-level view of a parsed BUILD file.

use crate::parser;
use crate::syntax::{Call, Expr, Stmt};
use crate::Result;

/// A parsed BUILD file.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildFile {
    name: String,
    stmts: Vec<Stmt>,
}

impl BuildFile {
    /// Parse BUILD file `content`. `name` is only used for diagnostics.
    pub fn parse(name: impl Into<String>, content: &str) -> Result<Self> {
        let name = name.into();
        let stmts = parser::parse(content)?;
        tracing::trace!(file = %name, statements = stmts.len(), "parsed BUILD file");
        Ok(Self { name, stmts })
    }

    /// The name given at parse time.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All top-level statements.
    pub fn statements(&self) -> &[Stmt] {
        &self.stmts
    }

    /// Every top-level rule call, in file order.
    ///
    /// A rule is an expression statement calling a plain or dotted name,
    /// such as `go_library(...)` or `native.proto_library(...)`.
    pub fn rules(&self) -> impl Iterator<Item = Rule<'_>> {
        self.stmts.iter().filter_map(|stmt| match stmt {
            Stmt::Expr(Expr::Call(call)) => Rule::new(call),
            _ => None,
        })
    }

    /// Rules whose kind is exactly `kind`.
    pub fn rules_of_kind<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = Rule<'a>> + 'a {
        self.rules().filter(move |rule| rule.kind() == kind)
    }
}

/// One rule call with attribute accessors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rule<'a> {
    call: &'a Call,
}

impl<'a> Rule<'a> {
    fn new(call: &'a Call) -> Option<Self> {
        call.func.dotted_name()?;
        Some(Self { call })
    }

    /// The rule kind: the called name, e.g. `proto_library`.
    pub fn kind(&self) -> String {
        self.call.func.dotted_name().unwrap_or_default()
    }

    /// The `name` attribute, or an empty string when absent.
    pub fn name(&self) -> &'a str {
        self.attr_string("name").unwrap_or_default()
    }

    /// The raw expression of attribute `key`.
    pub fn attr(&self, key: &str) -> Option<&'a Expr> {
        self.call.keyword(key)
    }

    /// Attribute `key` if it is a string literal.
    pub fn attr_string(&self, key: &str) -> Option<&'a str> {
        self.attr(key)?.as_str()
    }

    /// Attribute `key` if it is a list literal, keeping its string elements.
    ///
    /// Returns `None` when the attribute is absent or is not a list literal
    /// (for example a `glob(...)` call or a variable).
    pub fn attr_strings(&self, key: &str) -> Option<Vec<&'a str>> {
        match self.attr(key)? {
            Expr::List(items) => Some(items.iter().filter_map(Expr::as_str).collect()),
            _ => None,
        }
    }

    /// Where the rule call starts.
    pub fn position(&self) -> crate::Position {
        self.call.pos
    }

    /// The underlying call expression.
    pub fn call(&self) -> &'a Call {
        self.call
    }
}
