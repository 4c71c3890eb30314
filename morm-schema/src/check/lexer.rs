//! Tokenizer for the CHECK expression mini-language.

use super::CheckError;

/// A token in a CHECK expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Column name or function name.
    Ident(String),
    /// Number literal, kept as its lexeme.
    Number(String),
    /// String literal, unescaped.
    Str(String),
    True,
    False,
    Null,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Plus,
    Minus,
    Star,
    Slash,
    Gt,
    GtEq,
    Lt,
    LtEq,
    /// `==` or `===`.
    Eq,
    /// `!=` or `!==`.
    NotEq,
    /// `&&` or the `AND` keyword.
    AndAnd,
    /// `||` or the `OR` keyword.
    OrOr,
    /// `!`.
    Bang,
}

/// A lexer over a CHECK expression source.
pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    /// Create a lexer for the given input.
    pub fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    /// Tokenize the whole input.
    pub fn tokenize(mut self) -> Result<Vec<Token>, CheckError> {
        let mut tokens = Vec::new();
        loop {
            self.skip_whitespace();
            let Some(c) = self.peek() else { break };
            let token = match c {
                '(' => self.single(Token::LParen),
                ')' => self.single(Token::RParen),
                '[' => self.single(Token::LBracket),
                ']' => self.single(Token::RBracket),
                ',' => self.single(Token::Comma),
                '+' => self.single(Token::Plus),
                '-' => self.single(Token::Minus),
                '*' => self.single(Token::Star),
                '/' => self.single(Token::Slash),
                '>' => {
                    self.advance();
                    if self.eat('=') {
                        Token::GtEq
                    } else {
                        Token::Gt
                    }
                }
                '<' => {
                    self.advance();
                    if self.eat('=') {
                        Token::LtEq
                    } else {
                        Token::Lt
                    }
                }
                '=' => {
                    self.advance();
                    if !self.eat('=') {
                        return Err(CheckError::new("unexpected character `=`"));
                    }
                    self.eat('=');
                    Token::Eq
                }
                '!' => {
                    self.advance();
                    if self.eat('=') {
                        self.eat('=');
                        Token::NotEq
                    } else {
                        Token::Bang
                    }
                }
                '&' => {
                    self.advance();
                    if !self.eat('&') {
                        return Err(CheckError::new("unexpected character `&`"));
                    }
                    Token::AndAnd
                }
                '|' => {
                    self.advance();
                    if !self.eat('|') {
                        return Err(CheckError::new("unexpected character `|`"));
                    }
                    Token::OrOr
                }
                '\'' | '"' => self.scan_string(c)?,
                c if c.is_ascii_digit() => self.scan_number(),
                c if c.is_alphabetic() || c == '_' => self.scan_ident(),
                c => return Err(CheckError::new(format!("unexpected character `{c}`"))),
            };
            tokens.push(token);
        }
        Ok(tokens)
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn single(&mut self, token: Token) -> Token {
        self.advance();
        token
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|c| c.is_whitespace()) {
            self.advance();
        }
    }

    fn scan_number(&mut self) -> Token {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
        if self.peek() == Some('.') {
            self.advance();
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
        }
        Token::Number(self.input[start..self.pos].to_string())
    }

    fn scan_ident(&mut self) -> Token {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_alphanumeric() || c == '_') {
            self.advance();
        }
        let text = &self.input[start..self.pos];
        match text.to_lowercase().as_str() {
            "and" => Token::AndAnd,
            "or" => Token::OrOr,
            "true" => Token::True,
            "false" => Token::False,
            "null" => Token::Null,
            _ => Token::Ident(text.to_string()),
        }
    }

    fn scan_string(&mut self, quote: char) -> Result<Token, CheckError> {
        self.advance();
        let mut value = String::new();
        loop {
            match self.advance() {
                Some(c) if c == quote => break,
                Some('\\') => match self.advance() {
                    Some(escaped) => value.push(escaped),
                    None => return Err(CheckError::new("unterminated string literal")),
                },
                Some(c) => value.push(c),
                None => return Err(CheckError::new("unterminated string literal")),
            }
        }
        Ok(Token::Str(value))
    }
}
