//! Lexer for letc
//!
//! Converts source code into a stream of tokens. Malformed input produces a
//! [`TokenKind::Error`] token and a recorded diagnostic; scanning always
//! continues to the end of the file.

use crate::frontend::token::{Token, TokenKind};
use crate::utils::{Diagnostics, Error, Span};

/// The lexer state
pub struct Lexer {
    /// Source code as characters
    source: Vec<char>,
    /// Current position in source
    pos: usize,
    /// Start position of current token
    start: usize,
    /// Current line and column (1-based)
    line: usize,
    col: usize,
    /// Location of the first character of the current token
    start_span: Span,
    diagnostics: Diagnostics,
}

impl Lexer {
    /// Create a new lexer for the given source code
    pub fn new(source: &str) -> Self {
        Self {
            source: source.chars().collect(),
            pos: 0,
            start: 0,
            line: 1,
            col: 1,
            start_span: Span::new(1, 1),
            diagnostics: Diagnostics::new(),
        }
    }

    /// Diagnostics recorded so far
    pub fn take_diagnostics(&mut self) -> Diagnostics {
        std::mem::take(&mut self.diagnostics)
    }

    fn peek(&self) -> Option<char> {
        self.source.get(self.pos).copied()
    }

    fn peek_next(&self) -> Option<char> {
        self.source.get(self.pos + 1).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(c)
    }

    /// Consume the next character if it matches
    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    fn make_token(&self, kind: TokenKind) -> Token {
        Token::new(kind, self.start_span)
    }

    fn error_token(&mut self, error: Error) -> Token {
        self.diagnostics.report(error);
        self.make_token(TokenKind::Error)
    }

    /// Skip whitespace and comments
    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            match c {
                ' ' | '\t' | '\r' | '\n' => {
                    self.advance();
                }
                // Line comment
                '/' if self.peek_next() == Some('/') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                // Block comment, nesting allowed
                '/' if self.peek_next() == Some('*') => {
                    self.advance();
                    self.advance();
                    let mut depth = 1;
                    while depth > 0 && !self.is_at_end() {
                        match (self.peek(), self.peek_next()) {
                            (Some('*'), Some('/')) => {
                                self.advance();
                                self.advance();
                                depth -= 1;
                            }
                            (Some('/'), Some('*')) => {
                                self.advance();
                                self.advance();
                                depth += 1;
                            }
                            _ => {
                                self.advance();
                            }
                        }
                    }
                }
                _ => break,
            }
        }
    }

    /// Read an identifier or keyword
    fn read_identifier(&mut self) -> Token {
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                self.advance();
            } else {
                break;
            }
        }

        let text: String = self.source[self.start..self.pos].iter().collect();
        let kind = TokenKind::keyword_from_str(&text).unwrap_or(TokenKind::Ident(text));
        self.make_token(kind)
    }

    /// Read a decimal or hexadecimal integer literal
    fn read_number(&mut self) -> Token {
        let radix = if self.peek() == Some('0') && matches!(self.peek_next(), Some('x') | Some('X')) {
            self.advance();
            self.advance();
            16
        } else {
            10
        };

        while let Some(c) = self.peek() {
            if c.is_digit(radix) || c == '_' {
                self.advance();
            } else {
                break;
            }
        }

        let text: String = self.source[self.start..self.pos].iter().collect();
        let digits: String = text
            .chars()
            .skip(if radix == 16 { 2 } else { 0 })
            .filter(|&c| c != '_')
            .collect();

        match i64::from_str_radix(&digits, radix) {
            Ok(value) => self.make_token(TokenKind::IntLit(value)),
            Err(_) => {
                let span = self.start_span;
                self.error_token(Error::InvalidIntLiteral { text, span })
            }
        }
    }

    /// Read the character after a backslash
    fn read_escape(&mut self, quote: char) -> Result<char, Error> {
        let span = Span::new(self.line, self.col);
        match self.advance() {
            Some('n') => Ok('\n'),
            Some('r') => Ok('\r'),
            Some('t') => Ok('\t'),
            Some('0') => Ok('\0'),
            Some('\\') => Ok('\\'),
            Some(c) if c == quote => Ok(c),
            Some(c) => Err(Error::InvalidEscape { ch: c, span }),
            None => Err(Error::InvalidEscape { ch: ' ', span }),
        }
    }

    /// Read a string literal
    fn read_string(&mut self) -> Token {
        self.advance(); // opening quote

        let mut value = String::new();
        let mut failed = false;

        loop {
            match self.peek() {
                Some('"') => {
                    self.advance();
                    break;
                }
                Some('\\') => {
                    self.advance();
                    match self.read_escape('"') {
                        Ok(c) => value.push(c),
                        Err(err) => {
                            self.diagnostics.report(err);
                            failed = true;
                        }
                    }
                }
                None | Some('\n') => {
                    let span = self.start_span;
                    return self.error_token(Error::UnterminatedString { span });
                }
                Some(c) if !c.is_ascii() => {
                    let span = Span::new(self.line, self.col);
                    self.advance();
                    self.diagnostics.report(Error::NonAsciiLiteral { ch: c, span });
                    failed = true;
                }
                Some(c) => {
                    value.push(c);
                    self.advance();
                }
            }
        }

        if failed {
            self.make_token(TokenKind::Error)
        } else {
            self.make_token(TokenKind::StringLit(value))
        }
    }

    /// Read a character literal
    fn read_char(&mut self) -> Token {
        self.advance(); // opening quote
        let span = self.start_span;

        let value = match self.peek() {
            Some('\\') => {
                self.advance();
                match self.read_escape('\'') {
                    Ok(c) => c,
                    Err(err) => return self.error_token(err),
                }
            }
            Some(c) if !c.is_ascii() => {
                let ch_span = Span::new(self.line, self.col);
                self.advance();
                self.eat('\'');
                return self.error_token(Error::NonAsciiLiteral { ch: c, span: ch_span });
            }
            Some(c) if c != '\'' && c != '\n' => {
                self.advance();
                c
            }
            _ => return self.error_token(Error::InvalidCharLiteral { span }),
        };

        if !self.eat('\'') {
            return self.error_token(Error::InvalidCharLiteral { span });
        }

        self.make_token(TokenKind::CharLit(value))
    }

    /// Get the next token
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();
        self.start = self.pos;
        self.start_span = Span::new(self.line, self.col);

        let Some(c) = self.peek() else {
            return Token::eof(self.start_span);
        };

        if c.is_alphabetic() || c == '_' {
            return self.read_identifier();
        }
        if c.is_ascii_digit() {
            return self.read_number();
        }
        if c == '"' {
            return self.read_string();
        }
        if c == '\'' {
            return self.read_char();
        }

        self.advance();

        // Operators and punctuation
        let kind = match c {
            '+' => {
                if self.eat('+') {
                    TokenKind::PlusPlus
                } else if self.eat('=') {
                    TokenKind::PlusEq
                } else {
                    TokenKind::Plus
                }
            }
            '-' => {
                if self.eat('-') {
                    TokenKind::MinusMinus
                } else if self.eat('>') {
                    TokenKind::Arrow
                } else if self.eat('=') {
                    TokenKind::MinusEq
                } else {
                    TokenKind::Minus
                }
            }
            '*' => {
                if self.eat('=') {
                    TokenKind::StarEq
                } else {
                    TokenKind::Star
                }
            }
            '/' => {
                if self.eat('=') {
                    TokenKind::SlashEq
                } else {
                    TokenKind::Slash
                }
            }
            '%' => {
                if self.eat('=') {
                    TokenKind::PercentEq
                } else {
                    TokenKind::Percent
                }
            }
            '=' => {
                if self.eat('=') {
                    TokenKind::EqEq
                } else {
                    TokenKind::Eq
                }
            }
            '!' => {
                if self.eat('=') {
                    TokenKind::Ne
                } else {
                    TokenKind::Not
                }
            }
            '<' => {
                if self.eat('=') {
                    TokenKind::Le
                } else if self.eat('<') {
                    TokenKind::Shl
                } else {
                    TokenKind::Lt
                }
            }
            '>' => {
                if self.eat('=') {
                    TokenKind::Ge
                } else if self.eat('>') {
                    TokenKind::Shr
                } else {
                    TokenKind::Gt
                }
            }
            '&' => {
                if self.eat('&') {
                    TokenKind::AndAnd
                } else if self.eat('=') {
                    TokenKind::AndEq
                } else {
                    TokenKind::And
                }
            }
            '|' => {
                if self.eat('|') {
                    TokenKind::OrOr
                } else if self.eat('=') {
                    TokenKind::OrEq
                } else {
                    TokenKind::Or
                }
            }
            '^' => {
                if self.eat('=') {
                    TokenKind::CaretEq
                } else {
                    TokenKind::Caret
                }
            }
            '~' => TokenKind::Tilde,
            '.' => TokenKind::Dot,
            ':' => TokenKind::Colon,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            '@' => TokenKind::At,
            _ => {
                let span = self.start_span;
                return self.error_token(Error::UnexpectedChar { ch: c, span });
            }
        };

        self.make_token(kind)
    }

    /// Tokenize the entire source and return all tokens
    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let is_eof = token.kind == TokenKind::Eof;
            log::trace!("token {} at {}", token.kind, token.span);
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        tokens
    }
}
