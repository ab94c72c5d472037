//! Recursive-descent parser producing [`Stmt`]s from tokens.
//!
//! Only the statement forms that may appear in a BUILD file are accepted:
//! `load(...)`, assignments and expression statements. Block statements
//! (`def`, `if`, `for`) are rejected with a syntax error.

use crate::lexer::{Token, TokenKind, tokenize};
use crate::syntax::{
    Arg, AssignOp, BinaryOp, Call, Clause, Expr, Load, Position, Stmt, UnaryOp,
};
use crate::{Error, Result};

/// Keywords that start block statements, which BUILD files forbid.
const BLOCK_KEYWORDS: &[&str] = &[
    "def", "if", "for", "while", "return", "class", "try", "with", "elif", "else", "lambda",
];

/// Deepest expression nesting accepted before giving up.
///
/// Parsing recurses once per level, and BUILD files are parsed on worker
/// threads with default-sized stacks.
pub const MAX_NESTING: usize = 64;

/// Parse `src` into statements.
pub fn parse(src: &str) -> Result<Vec<Stmt>> {
    let tokens = tokenize(src)?;
    Parser {
        tokens,
        i: 0,
        depth: 0,
    }
    .file()
}

struct Parser {
    tokens: Vec<Token>,
    i: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> &TokenKind {
        &self.tokens[self.i.min(self.tokens.len() - 1)].kind
    }

    fn pos(&self) -> Position {
        self.tokens[self.i.min(self.tokens.len() - 1)].pos
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens[self.i.min(self.tokens.len() - 1)].clone();
        if self.i < self.tokens.len() - 1 {
            self.i += 1;
        }
        token
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek() == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind, context: &str) -> Result<()> {
        if self.eat(kind) {
            Ok(())
        } else {
            Err(self.unexpected(&format!("{} {context}", kind.describe())))
        }
    }

    fn unexpected(&self, wanted: &str) -> Error {
        Error::syntax(
            self.pos(),
            format!("expected {wanted}, found {}", self.peek().describe()),
        )
    }

    /// Run `f` one nesting level deeper.
    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.depth >= MAX_NESTING {
            return Err(Error::syntax(self.pos(), "expression nested too deeply"));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    fn at_keyword(&self, keyword: &str) -> bool {
        matches!(self.peek(), TokenKind::Ident(name) if name == keyword)
    }

    fn next_is_keyword(&self, keyword: &str) -> bool {
        matches!(
            self.tokens.get(self.i + 1).map(|t| &t.kind),
            Some(TokenKind::Ident(name)) if name == keyword
        )
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if self.at_keyword(keyword) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn file(mut self) -> Result<Vec<Stmt>> {
        let mut stmts = Vec::new();
        loop {
            while self.eat(&TokenKind::Newline) || self.eat(&TokenKind::Semicolon) {}
            if self.peek() == &TokenKind::Eof {
                return Ok(stmts);
            }

            stmts.push(self.statement()?);

            match self.peek() {
                TokenKind::Newline | TokenKind::Semicolon | TokenKind::Eof => {}
                _ => return Err(self.unexpected("end of statement")),
            }
        }
    }

    fn statement(&mut self) -> Result<Stmt> {
        if let TokenKind::Ident(name) = self.peek()
            && BLOCK_KEYWORDS.contains(&name.as_str())
        {
            return Err(Error::syntax(
                self.pos(),
                format!("`{name}` statements are not allowed in BUILD files"),
            ));
        }

        let pos = self.pos();
        let target = self.expr_list()?;

        let op = match self.peek() {
            TokenKind::Assign => Some(AssignOp::Assign),
            TokenKind::AugAssign(op) => Some(*op),
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            let value = self.expr_list()?;
            return Ok(Stmt::Assign {
                target,
                op,
                value,
                pos,
            });
        }

        match target {
            Expr::Call(call) if is_load(&call) => load(call).map(Stmt::Load),
            other => Ok(Stmt::Expr(other)),
        }
    }

    /// `test (',' test)* [',']`, producing a tuple when a comma is present.
    fn expr_list(&mut self) -> Result<Expr> {
        let first = self.test()?;
        if self.peek() != &TokenKind::Comma {
            return Ok(first);
        }

        let mut items = vec![first];
        while self.eat(&TokenKind::Comma) {
            if self.at_expr_end() {
                break;
            }
            items.push(self.test()?);
        }
        Ok(Expr::Tuple(items))
    }

    fn at_expr_end(&self) -> bool {
        matches!(
            self.peek(),
            TokenKind::Newline
                | TokenKind::Eof
                | TokenKind::Semicolon
                | TokenKind::Assign
                | TokenKind::AugAssign(_)
                | TokenKind::RParen
                | TokenKind::RBracket
                | TokenKind::RBrace
        )
    }

    /// Conditional expression: `or_expr ['if' or_expr 'else' test]`.
    fn test(&mut self) -> Result<Expr> {
        self.nested(Self::conditional)
    }

    fn conditional(&mut self) -> Result<Expr> {
        if self.at_keyword("lambda") {
            return Err(Error::syntax(
                self.pos(),
                "lambda expressions are not supported in BUILD files",
            ));
        }

        let then = self.or_expr()?;
        if !self.eat_keyword("if") {
            return Ok(then);
        }

        let cond = self.or_expr()?;
        if !self.eat_keyword("else") {
            return Err(self.unexpected("`else` in conditional expression"));
        }
        let otherwise = self.test()?;
        Ok(Expr::Conditional {
            then: Box::new(then),
            cond: Box::new(cond),
            otherwise: Box::new(otherwise),
        })
    }

    fn or_expr(&mut self) -> Result<Expr> {
        let mut lhs = self.and_expr()?;
        while self.eat_keyword("or") {
            let rhs = self.and_expr()?;
            lhs = binary(BinaryOp::Or, lhs, rhs);
        }
        Ok(lhs)
    }

    fn and_expr(&mut self) -> Result<Expr> {
        let mut lhs = self.not_expr()?;
        while self.eat_keyword("and") {
            let rhs = self.not_expr()?;
            lhs = binary(BinaryOp::And, lhs, rhs);
        }
        Ok(lhs)
    }

    fn not_expr(&mut self) -> Result<Expr> {
        if self.eat_keyword("not") {
            let operand = self.nested(Self::not_expr)?;
            return Ok(Expr::Unary {
                op: UnaryOp::Not,
                operand: Box::new(operand),
            });
        }
        self.comparison()
    }

    fn comparison(&mut self) -> Result<Expr> {
        let mut lhs = self.bit_or()?;
        loop {
            let op = match self.peek() {
                TokenKind::EqEq => BinaryOp::Eq,
                TokenKind::NotEq => BinaryOp::NotEq,
                TokenKind::Lt => BinaryOp::Lt,
                TokenKind::LtEq => BinaryOp::LtEq,
                TokenKind::Gt => BinaryOp::Gt,
                TokenKind::GtEq => BinaryOp::GtEq,
                TokenKind::Ident(k) if k == "in" => BinaryOp::In,
                TokenKind::Ident(k) if k == "not" && self.next_is_keyword("in") => {
                    BinaryOp::NotIn
                }
                _ => return Ok(lhs),
            };
            if op == BinaryOp::NotIn {
                self.advance();
            }
            self.advance();
            let rhs = self.bit_or()?;
            lhs = binary(op, lhs, rhs);
        }
    }

    fn bit_or(&mut self) -> Result<Expr> {
        let mut lhs = self.bit_xor()?;
        while self.eat(&TokenKind::Pipe) {
            let rhs = self.bit_xor()?;
            lhs = binary(BinaryOp::BitOr, lhs, rhs);
        }
        Ok(lhs)
    }

    fn bit_xor(&mut self) -> Result<Expr> {
        let mut lhs = self.bit_and()?;
        while self.eat(&TokenKind::Caret) {
            let rhs = self.bit_and()?;
            lhs = binary(BinaryOp::BitXor, lhs, rhs);
        }
        Ok(lhs)
    }

    fn bit_and(&mut self) -> Result<Expr> {
        let mut lhs = self.arith()?;
        while self.eat(&TokenKind::Amp) {
            let rhs = self.arith()?;
            lhs = binary(BinaryOp::BitAnd, lhs, rhs);
        }
        Ok(lhs)
    }

    fn arith(&mut self) -> Result<Expr> {
        let mut lhs = self.term()?;
        loop {
            let op = match self.peek() {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => return Ok(lhs),
            };
            self.advance();
            let rhs = self.term()?;
            lhs = binary(op, lhs, rhs);
        }
    }

    fn term(&mut self) -> Result<Expr> {
        let mut lhs = self.unary()?;
        loop {
            let op = match self.peek() {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::SlashSlash => BinaryOp::FloorDiv,
                TokenKind::Percent => BinaryOp::Mod,
                _ => return Ok(lhs),
            };
            self.advance();
            let rhs = self.unary()?;
            lhs = binary(op, lhs, rhs);
        }
    }

    fn unary(&mut self) -> Result<Expr> {
        let op = match self.peek() {
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Plus => UnaryOp::Pos,
            TokenKind::Tilde => UnaryOp::Invert,
            _ => return self.postfix(),
        };
        self.advance();
        let operand = self.nested(Self::unary)?;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn postfix(&mut self) -> Result<Expr> {
        let mut expr = self.primary()?;
        loop {
            match self.peek() {
                TokenKind::LParen => {
                    let pos = self.pos();
                    self.advance();
                    let args = self.call_args()?;
                    expr = Expr::Call(Call {
                        func: Box::new(expr),
                        args,
                        pos,
                    });
                }
                TokenKind::Dot => {
                    self.advance();
                    let TokenKind::Ident(name) = self.peek().clone() else {
                        return Err(self.unexpected("attribute name after `.`"));
                    };
                    self.advance();
                    expr = Expr::Dot {
                        value: Box::new(expr),
                        name,
                    };
                }
                TokenKind::LBracket => {
                    self.advance();
                    expr = self.subscript(expr)?;
                }
                _ => return Ok(expr),
            }
        }
    }

    fn subscript(&mut self, value: Expr) -> Result<Expr> {
        let start = if self.peek() == &TokenKind::Colon {
            None
        } else {
            Some(Box::new(self.test()?))
        };

        if self.eat(&TokenKind::RBracket) {
            let index = start.ok_or_else(|| self.unexpected("index expression"))?;
            return Ok(Expr::Index {
                value: Box::new(value),
                index,
            });
        }

        self.expect(&TokenKind::Colon, "in slice")?;
        let stop = self.optional_slice_part()?;
        let step = if self.eat(&TokenKind::Colon) {
            self.optional_slice_part()?
        } else {
            None
        };
        self.expect(&TokenKind::RBracket, "to close slice")?;

        Ok(Expr::Slice {
            value: Box::new(value),
            start,
            stop,
            step,
        })
    }

    fn optional_slice_part(&mut self) -> Result<Option<Box<Expr>>> {
        if matches!(self.peek(), TokenKind::Colon | TokenKind::RBracket) {
            Ok(None)
        } else {
            Ok(Some(Box::new(self.test()?)))
        }
    }

    /// Arguments after the opening parenthesis, consuming the closing one.
    fn call_args(&mut self) -> Result<Vec<Arg>> {
        let mut args = Vec::new();
        loop {
            if self.eat(&TokenKind::RParen) {
                return Ok(args);
            }

            let arg = match self.peek().clone() {
                TokenKind::Star => {
                    self.advance();
                    Arg::Star(self.test()?)
                }
                TokenKind::StarStar => {
                    self.advance();
                    Arg::StarStar(self.test()?)
                }
                TokenKind::Ident(name)
                    if self.tokens.get(self.i + 1).map(|t| &t.kind)
                        == Some(&TokenKind::Assign) =>
                {
                    self.advance();
                    self.advance();
                    Arg::Keyword {
                        name,
                        value: self.test()?,
                    }
                }
                _ => Arg::Positional(self.test()?),
            };
            args.push(arg);

            if !self.eat(&TokenKind::Comma) {
                self.expect(&TokenKind::RParen, "to close argument list")?;
                return Ok(args);
            }
        }
    }

    fn primary(&mut self) -> Result<Expr> {
        match self.peek().clone() {
            TokenKind::Ident(name) => {
                if is_reserved(&name) {
                    return Err(self.unexpected("expression"));
                }
                self.advance();
                Ok(Expr::Ident(name))
            }
            TokenKind::Str(s) => {
                self.advance();
                Ok(Expr::String(s))
            }
            TokenKind::Number(n) => {
                self.advance();
                Ok(Expr::Number(n))
            }
            TokenKind::LParen => {
                self.advance();
                self.paren()
            }
            TokenKind::LBracket => {
                self.advance();
                self.list()
            }
            TokenKind::LBrace => {
                self.advance();
                self.dict()
            }
            _ => Err(self.unexpected("expression")),
        }
    }

    /// Parenthesized expression or tuple, after `(`.
    fn paren(&mut self) -> Result<Expr> {
        if self.eat(&TokenKind::RParen) {
            return Ok(Expr::Tuple(Vec::new()));
        }

        let first = self.test()?;
        if self.eat(&TokenKind::RParen) {
            return Ok(first);
        }

        let mut items = vec![first];
        while self.eat(&TokenKind::Comma) {
            if self.peek() == &TokenKind::RParen {
                break;
            }
            items.push(self.test()?);
        }
        self.expect(&TokenKind::RParen, "to close tuple")?;
        Ok(Expr::Tuple(items))
    }

    /// List literal or list comprehension, after `[`.
    fn list(&mut self) -> Result<Expr> {
        if self.eat(&TokenKind::RBracket) {
            return Ok(Expr::List(Vec::new()));
        }

        let first = self.test()?;
        if self.at_keyword("for") {
            let clauses = self.clauses()?;
            self.expect(&TokenKind::RBracket, "to close list comprehension")?;
            return Ok(Expr::ListComprehension {
                body: Box::new(first),
                clauses,
            });
        }

        let mut items = vec![first];
        while self.eat(&TokenKind::Comma) {
            if self.peek() == &TokenKind::RBracket {
                break;
            }
            items.push(self.test()?);
        }
        self.expect(&TokenKind::RBracket, "to close list")?;
        Ok(Expr::List(items))
    }

    /// Dict literal or dict comprehension, after `{`.
    fn dict(&mut self) -> Result<Expr> {
        if self.eat(&TokenKind::RBrace) {
            return Ok(Expr::Dict(Vec::new()));
        }

        let key = self.test()?;
        self.expect(&TokenKind::Colon, "after dict key")?;
        let value = self.test()?;

        if self.at_keyword("for") {
            let clauses = self.clauses()?;
            self.expect(&TokenKind::RBrace, "to close dict comprehension")?;
            return Ok(Expr::DictComprehension {
                key: Box::new(key),
                value: Box::new(value),
                clauses,
            });
        }

        let mut entries = vec![(key, value)];
        while self.eat(&TokenKind::Comma) {
            if self.peek() == &TokenKind::RBrace {
                break;
            }
            let key = self.test()?;
            self.expect(&TokenKind::Colon, "after dict key")?;
            let value = self.test()?;
            entries.push((key, value));
        }
        self.expect(&TokenKind::RBrace, "to close dict")?;
        Ok(Expr::Dict(entries))
    }

    /// One or more `for ... in ...` / `if ...` clauses.
    fn clauses(&mut self) -> Result<Vec<Clause>> {
        let mut clauses = Vec::new();
        loop {
            if self.eat_keyword("for") {
                // Loop variables are parsed below the comparison level so
                // that `in` is left for the clause itself.
                let mut vars = vec![self.bit_or()?];
                while self.eat(&TokenKind::Comma) {
                    vars.push(self.bit_or()?);
                }
                if !self.eat_keyword("in") {
                    return Err(self.unexpected("`in` in comprehension"));
                }
                let iter = self.or_expr()?;
                clauses.push(Clause::For { vars, iter });
            } else if self.eat_keyword("if") {
                clauses.push(Clause::If(self.or_expr()?));
            } else {
                return Ok(clauses);
            }
        }
    }
}

fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
    Expr::Binary {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    }
}

fn is_reserved(name: &str) -> bool {
    matches!(
        name,
        "and" | "or" | "not" | "in" | "if" | "else" | "for" | "lambda" | "def" | "return"
    )
}

/// Validate a `load(...)` call and convert it to a [`Load`].
fn is_load(call: &Call) -> bool {
    matches!(call.func.as_ref(), Expr::Ident(name) if name == "load")
}

fn load(call: Call) -> Result<Load> {
    let mut args = call.args.into_iter();

    let module = match args.next() {
        Some(Arg::Positional(Expr::String(module))) => module,
        _ => {
            return Err(Error::syntax(
                call.pos,
                "load() requires a module string as its first argument",
            ));
        }
    };

    let mut symbols = Vec::new();
    for arg in args {
        match arg {
            Arg::Positional(Expr::String(sym)) => symbols.push((sym.clone(), sym)),
            Arg::Keyword {
                name,
                value: Expr::String(sym),
            } => symbols.push((name, sym)),
            _ => {
                return Err(Error::syntax(
                    call.pos,
                    "load() symbols must be string literals",
                ));
            }
        }
    }

    if symbols.is_empty() {
        return Err(Error::syntax(call.pos, "load() requires at least one symbol"));
    }

    Ok(Load {
        module,
        symbols,
        pos: call.pos,
    })
}
