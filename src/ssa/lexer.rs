use crate::error::{Error, Result};
use crate::symbol::nstring::NString;

/// Source position, 1-based.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pos {
    pub line: usize,
    pub col: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Tok {
    Ident(NString),
    Int(i64),
    Float(f64),
    KwIf,
    KwElse,
    KwWhile,
    KwFor,
    KwReturn,
    KwBreak,
    KwContinue,
    KwTrue,
    KwFalse,
    LParen,
    RParen,
    LBrace,
    RBrace,
    Comma,
    Semi,
    Colon,
    Assign,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    AndAnd,
    OrOr,
    Amp,
    Pipe,
    Caret,
    Shl,
    Shr,
    Bang,
    Tilde,
    Eof,
}

#[derive(Clone, Debug)]
pub struct Token {
    pub tok: Tok,
    pub pos: Pos,
}

struct Lexer<'src> {
    src: &'src [u8],
    at: usize,
    line: usize,
    col: usize,
}

/// Tokenize the whole source. `//` comments run to end of line.
pub fn tokenize(source: &str) -> Result<Vec<Token>> {
    let mut lexer = Lexer { src: source.as_bytes(), at: 0, line: 1, col: 1 };
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token()?;
        let done = token.tok == Tok::Eof;
        tokens.push(token);
        if done {
            return Ok(tokens);
        }
    }
}

impl<'src> Lexer<'src> {
    fn peek(&self) -> Option<u8> {
        self.src.get(self.at).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let c = self.peek()?;
        self.at += 1;
        if c == b'\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(c)
    }

    fn pos(&self) -> Pos {
        Pos { line: self.line, col: self.col }
    }

    fn skip_trivia(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_ascii_whitespace() {
                self.bump();
            } else if c == b'/' && self.src.get(self.at + 1) == Some(&b'/') {
                while let Some(c) = self.peek() {
                    if c == b'\n' {
                        break;
                    }
                    self.bump();
                }
            } else {
                break;
            }
        }
    }

    fn next_token(&mut self) -> Result<Token> {
        self.skip_trivia();
        let pos = self.pos();
        let c = match self.bump() {
            Some(c) => c,
            None => return Ok(Token { tok: Tok::Eof, pos }),
        };

        let tok = match c {
            b'(' => Tok::LParen,
            b')' => Tok::RParen,
            b'{' => Tok::LBrace,
            b'}' => Tok::RBrace,
            b',' => Tok::Comma,
            b';' => Tok::Semi,
            b':' => Tok::Colon,
            b'+' => Tok::Plus,
            b'-' => Tok::Minus,
            b'*' => Tok::Star,
            b'/' => Tok::Slash,
            b'%' => Tok::Percent,
            b'^' => Tok::Caret,
            b'~' => Tok::Tilde,
            b'=' => {
                if self.peek() == Some(b'=') {
                    self.bump();
                    Tok::EqEq
                } else {
                    Tok::Assign
                }
            }
            b'!' => {
                if self.peek() == Some(b'=') {
                    self.bump();
                    Tok::NotEq
                } else {
                    Tok::Bang
                }
            }
            b'<' => match self.peek() {
                Some(b'=') => {
                    self.bump();
                    Tok::Le
                }
                Some(b'<') => {
                    self.bump();
                    Tok::Shl
                }
                _ => Tok::Lt,
            },
            b'>' => match self.peek() {
                Some(b'=') => {
                    self.bump();
                    Tok::Ge
                }
                Some(b'>') => {
                    self.bump();
                    Tok::Shr
                }
                _ => Tok::Gt,
            },
            b'&' => {
                if self.peek() == Some(b'&') {
                    self.bump();
                    Tok::AndAnd
                } else {
                    Tok::Amp
                }
            }
            b'|' => {
                if self.peek() == Some(b'|') {
                    self.bump();
                    Tok::OrOr
                } else {
                    Tok::Pipe
                }
            }
            c if c.is_ascii_digit() => self.number(c, pos)?,
            c if c.is_ascii_alphabetic() || c == b'_' => self.word(c),
            c => {
                return Err(Error::Parse {
                    line: pos.line,
                    col: pos.col,
                    msg: format!("unexpected character {:?}", c as char),
                })
            }
        };
        Ok(Token { tok, pos })
    }

    fn number(&mut self, first: u8, pos: Pos) -> Result<Tok> {
        let mut text = String::new();
        text.push(first as char);
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                text.push(c as char);
                self.bump();
            } else {
                break;
            }
        }
        let is_float = self.peek() == Some(b'.')
            && self.src.get(self.at + 1).is_some_and(|c| c.is_ascii_digit());
        if is_float {
            text.push('.');
            self.bump();
            while let Some(c) = self.peek() {
                if c.is_ascii_digit() {
                    text.push(c as char);
                    self.bump();
                } else {
                    break;
                }
            }
            return text.parse::<f64>().map(Tok::Float).map_err(|_| Error::Parse {
                line: pos.line,
                col: pos.col,
                msg: format!("bad float literal {text}"),
            });
        }
        text.parse::<i64>().map(Tok::Int).map_err(|_| Error::Parse {
            line: pos.line,
            col: pos.col,
            msg: format!("integer literal {text} out of range"),
        })
    }

    fn word(&mut self, first: u8) -> Tok {
        let mut text = String::new();
        text.push(first as char);
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == b'_' {
                text.push(c as char);
                self.bump();
            } else {
                break;
            }
        }
        match text.as_str() {
            "if" => Tok::KwIf,
            "else" => Tok::KwElse,
            "while" => Tok::KwWhile,
            "for" => Tok::KwFor,
            "return" => Tok::KwReturn,
            "break" => Tok::KwBreak,
            "continue" => Tok::KwContinue,
            "true" => Tok::KwTrue,
            "false" => Tok::KwFalse,
            _ => Tok::Ident(NString::from(text)),
        }
    }
}
