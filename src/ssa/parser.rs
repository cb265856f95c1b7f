use super::ast::*;
use super::lexer::*;
use crate::error::{Error, Result};
use crate::program::function::{BasicKind, BinToken, Literal, UnToken};
use crate::symbol::nstring::NString;

/// Parse source text into an AST module.
pub fn parse(source: &str) -> Result<Module> {
    let tokens = tokenize(source)?;
    let mut parser = Parser { tokens, at: 0 };
    let mut functions = Vec::new();
    while parser.peek().tok != Tok::Eof {
        functions.push(parser.function()?);
    }
    Ok(Module { functions })
}

struct Parser {
    tokens: Vec<Token>,
    at: usize,
}

fn bin_prec(tok: &Tok) -> Option<(BinToken, u8)> {
    match tok {
        Tok::OrOr => Some((BinToken::OrOr, 1)),
        Tok::AndAnd => Some((BinToken::AndAnd, 2)),
        Tok::Pipe => Some((BinToken::BitOr, 3)),
        Tok::Caret => Some((BinToken::BitXor, 4)),
        Tok::Amp => Some((BinToken::BitAnd, 5)),
        Tok::EqEq => Some((BinToken::EqEq, 6)),
        Tok::NotEq => Some((BinToken::NotEq, 6)),
        Tok::Lt => Some((BinToken::Lt, 7)),
        Tok::Le => Some((BinToken::Le, 7)),
        Tok::Gt => Some((BinToken::Gt, 7)),
        Tok::Ge => Some((BinToken::Ge, 7)),
        Tok::Shl => Some((BinToken::Shl, 8)),
        Tok::Shr => Some((BinToken::Shr, 8)),
        Tok::Plus => Some((BinToken::Add, 9)),
        Tok::Minus => Some((BinToken::Sub, 9)),
        Tok::Star => Some((BinToken::Mul, 10)),
        Tok::Slash => Some((BinToken::Div, 10)),
        Tok::Percent => Some((BinToken::Rem, 10)),
        _ => None,
    }
}

impl Parser {
    fn peek(&self) -> &Token {
        &self.tokens[self.at]
    }

    fn bump(&mut self) -> Token {
        let token = self.tokens[self.at].clone();
        if self.at + 1 < self.tokens.len() {
            self.at += 1;
        }
        token
    }

    fn eat(&mut self, tok: &Tok) -> bool {
        if &self.peek().tok == tok {
            self.bump();
            return true;
        }
        false
    }

    fn expect(&mut self, tok: Tok, what: &str) -> Result<Token> {
        if self.peek().tok == tok {
            return Ok(self.bump());
        }
        self.fail(format!("expected {what}, found {:?}", self.peek().tok))
    }

    fn fail<T>(&self, msg: String) -> Result<T> {
        let pos = self.peek().pos;
        Err(Error::Parse { line: pos.line, col: pos.col, msg })
    }

    fn ident(&mut self, what: &str) -> Result<NString> {
        match self.peek().tok {
            Tok::Ident(name) => {
                self.bump();
                Ok(name)
            }
            _ => self.fail(format!("expected {what}, found {:?}", self.peek().tok)),
        }
    }

    fn function(&mut self) -> Result<FunctionDecl> {
        let name = self.ident("function name")?;
        self.expect(Tok::LParen, "(")?;
        let mut params = Vec::new();
        if self.peek().tok != Tok::RParen {
            loop {
                params.push(self.param()?);
                if !self.eat(&Tok::Comma) {
                    break;
                }
            }
        }
        self.expect(Tok::RParen, ")")?;
        let body = self.block()?;
        Ok(FunctionDecl { name, params, body })
    }

    /// `name [: type]`, defaulting to `int`
    fn param(&mut self) -> Result<(NString, BasicKind)> {
        let name = self.ident("parameter name")?;
        let mut ty = BasicKind::Int;
        if self.eat(&Tok::Colon) {
            let type_name = self.ident("type name")?;
            ty = if type_name == "int" {
                BasicKind::Int
            } else if type_name == "bool" {
                BasicKind::Bool
            } else if type_name == "float" {
                BasicKind::Float
            } else {
                return self.fail(format!("unknown type {type_name:?}"));
            };
        }
        Ok((name, ty))
    }

    fn block(&mut self) -> Result<Vec<Stmt>> {
        self.expect(Tok::LBrace, "{")?;
        let mut stmts = Vec::new();
        while self.peek().tok != Tok::RBrace {
            if self.peek().tok == Tok::Eof {
                return self.fail("unclosed block".to_string());
            }
            stmts.push(self.stmt()?);
        }
        self.bump();
        Ok(stmts)
    }

    fn stmt(&mut self) -> Result<Stmt> {
        let pos = self.peek().pos;
        match self.peek().tok {
            Tok::KwIf => self.if_stmt(),
            Tok::KwWhile => {
                self.bump();
                self.expect(Tok::LParen, "(")?;
                let cond = self.expr(1)?;
                self.expect(Tok::RParen, ")")?;
                let body = self.block()?;
                Ok(Stmt::While { cond, body })
            }
            Tok::KwFor => {
                self.bump();
                self.expect(Tok::LParen, "(")?;
                let init = if self.peek().tok == Tok::Semi { None } else { Some(self.assign()?) };
                self.expect(Tok::Semi, ";")?;
                let cond = if self.peek().tok == Tok::Semi { None } else { Some(self.expr(1)?) };
                self.expect(Tok::Semi, ";")?;
                let post =
                    if self.peek().tok == Tok::RParen { None } else { Some(self.assign()?) };
                self.expect(Tok::RParen, ")")?;
                let body = self.block()?;
                Ok(Stmt::For { init, cond, post, body })
            }
            Tok::KwReturn => {
                self.bump();
                let mut values = Vec::new();
                if self.peek().tok != Tok::Semi {
                    loop {
                        values.push(self.expr(1)?);
                        if !self.eat(&Tok::Comma) {
                            break;
                        }
                    }
                }
                self.expect(Tok::Semi, ";")?;
                Ok(Stmt::Return { values })
            }
            Tok::KwBreak => {
                self.bump();
                self.expect(Tok::Semi, ";")?;
                Ok(Stmt::Break(pos))
            }
            Tok::KwContinue => {
                self.bump();
                self.expect(Tok::Semi, ";")?;
                Ok(Stmt::Continue(pos))
            }
            Tok::LBrace => Ok(Stmt::Block(self.block()?)),
            Tok::Ident(_) => {
                let (name, value) = self.assign()?;
                self.expect(Tok::Semi, ";")?;
                Ok(Stmt::Assign { name, value })
            }
            _ => self.fail(format!("expected statement, found {:?}", self.peek().tok)),
        }
    }

    fn if_stmt(&mut self) -> Result<Stmt> {
        self.expect(Tok::KwIf, "if")?;
        self.expect(Tok::LParen, "(")?;
        let cond = self.expr(1)?;
        self.expect(Tok::RParen, ")")?;
        let then_body = self.block()?;
        let else_body = if self.eat(&Tok::KwElse) {
            if self.peek().tok == Tok::KwIf {
                Some(vec![self.if_stmt()?])
            } else {
                Some(self.block()?)
            }
        } else {
            None
        };
        Ok(Stmt::If { cond, then_body, else_body })
    }

    fn assign(&mut self) -> Result<(NString, ExprAst)> {
        let name = self.ident("variable name")?;
        self.expect(Tok::Assign, "=")?;
        let value = self.expr(1)?;
        Ok((name, value))
    }

    fn expr(&mut self, min_prec: u8) -> Result<ExprAst> {
        let mut lhs = self.unary_expr()?;
        while let Some((op, prec)) = bin_prec(&self.peek().tok) {
            if prec < min_prec {
                break;
            }
            self.bump();
            let rhs = self.expr(prec + 1)?;
            lhs = ExprAst::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs) };
        }
        Ok(lhs)
    }

    fn unary_expr(&mut self) -> Result<ExprAst> {
        let op = match self.peek().tok {
            Tok::Minus => Some(UnToken::Neg),
            Tok::Bang => Some(UnToken::Not),
            Tok::Tilde => Some(UnToken::BitNot),
            _ => None,
        };
        if let Some(op) = op {
            self.bump();
            let operand = self.unary_expr()?;
            return Ok(ExprAst::Unary { op, operand: Box::new(operand) });
        }
        self.primary_expr()
    }

    fn primary_expr(&mut self) -> Result<ExprAst> {
        let pos = self.peek().pos;
        match self.peek().tok {
            Tok::Int(v) => {
                self.bump();
                Ok(ExprAst::Literal(Literal::Int(v)))
            }
            Tok::Float(v) => {
                self.bump();
                Ok(ExprAst::Literal(Literal::Float(v)))
            }
            Tok::KwTrue => {
                self.bump();
                Ok(ExprAst::Literal(Literal::Bool(true)))
            }
            Tok::KwFalse => {
                self.bump();
                Ok(ExprAst::Literal(Literal::Bool(false)))
            }
            Tok::Ident(name) => {
                self.bump();
                Ok(ExprAst::Var { name, pos })
            }
            Tok::LParen => {
                self.bump();
                let inner = self.expr(1)?;
                self.expect(Tok::RParen, ")")?;
                Ok(inner)
            }
            _ => self.fail(format!("expected expression, found {:?}", self.peek().tok)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_function() {
        let module = parse("f(x) { return x + 1; }").unwrap();
        assert_eq!(module.functions.len(), 1);
        let f = &module.functions[0];
        assert_eq!(f.name, "f");
        assert_eq!(f.params, vec![(NString::from("x"), BasicKind::Int)]);
        assert_eq!(f.body.len(), 1);
    }

    #[test]
    fn precedence() {
        let module = parse("f(x, y) { z = x + y * 2 == 6 && y > 0; return z; }").unwrap();
        let Stmt::Assign { value, .. } = &module.functions[0].body[0] else {
            panic!("expected assignment");
        };
        // && at the root, == on its left
        let ExprAst::Binary { op: BinToken::AndAnd, lhs, .. } = value else {
            panic!("expected &&, got {value:?}");
        };
        assert!(matches!(**lhs, ExprAst::Binary { op: BinToken::EqEq, .. }));
    }

    #[test]
    fn typed_and_defaulted_params() {
        let module = parse("g(a: bool, b, c: float) { return a; }").unwrap();
        let params = &module.functions[0].params;
        assert_eq!(params[0].1, BasicKind::Bool);
        assert_eq!(params[1].1, BasicKind::Int);
        assert_eq!(params[2].1, BasicKind::Float);
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(parse("f(x) { return ; ; }"), Err(Error::Parse { .. })));
        assert!(matches!(parse("f(x { }"), Err(Error::Parse { .. })));
        assert!(matches!(parse("f() { x = $; }"), Err(Error::Parse { .. })));
    }

    #[test]
    fn comments_are_skipped() {
        let module = parse("// leading\nf() { return 1; // trailing\n}").unwrap();
        assert_eq!(module.functions.len(), 1);
    }
}
