use crate::error::{CypeError, Span};
use std::fmt;

const KEYWORDS: [&str; 12] = [
    "let", "const", "var", "if", "else", "while", "for", "do", "i32", "f64", "string", "boolean",
];

const TWO_CHAR_OPERATORS: [&str; 8] = ["==", "!=", "<=", ">=", "&&", "||", "++", "--"];

const SINGLE_CHAR_OPERATORS: &str = "<>+-*/%!&|(){}[];:,.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Keyword,
    Identifier,
    Number,
    String,
    Boolean,
    Operator,
    /// A lone `=`, kept apart from the other operators.
    Assign,
}

/// Token payload. Keywords, identifiers and operators carry their text.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(f64),
    Text(String),
    Boolean(bool),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Literal::Number(n) => write!(f, "{}", n),
            Literal::Text(s) => write!(f, "{}", s),
            Literal::Boolean(b) => write!(f, "{}", b),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: Literal,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, value: Literal, span: Span) -> Self {
        Self { kind, value, span }
    }

    pub fn text(&self) -> Option<&str> {
        match &self.value {
            Literal::Text(s) => Some(s),
            _ => None,
        }
    }

    /// True for a keyword, identifier, operator or assign token spelled `text`.
    pub fn is(&self, kind: TokenKind, text: &str) -> bool {
        self.kind == kind && self.text() == Some(text)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{:?} {:?} @{}..{}",
            self.kind,
            self.value.to_string(),
            self.span.start,
            self.span.end
        )
    }
}

/// Tokenize leniently. Never fails: anomalies are skipped.
pub fn tokenize(source: &str) -> Vec<Token> {
    let mut lexer = Lexer::new(source);
    lexer.scan();
    lexer.tokens
}

pub struct Lexer {
    source: Vec<char>,
    tokens: Vec<Token>,
    anomalies: Vec<CypeError>,
    start: usize,
    current: usize,
    strict: bool,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Self {
            source: source.chars().collect(),
            tokens: Vec::new(),
            anomalies: Vec::new(),
            start: 0,
            current: 0,
            strict: false,
        }
    }

    /// In strict mode the first anomaly fails `scan_tokens`.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn scan_tokens(&mut self) -> Result<Vec<Token>, CypeError> {
        self.scan();

        if self.strict {
            if let Some(anomaly) = self.anomalies.first() {
                return Err(anomaly.clone());
            }
        }

        Ok(self.tokens.clone())
    }

    /// Anomalies found by the last scan, in source order.
    pub fn anomalies(&self) -> &[CypeError] {
        &self.anomalies
    }

    fn scan(&mut self) {
        self.tokens.clear();
        self.anomalies.clear();
        self.current = 0;

        while !self.is_at_end() {
            self.start = self.current;
            self.scan_token();
        }
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    fn scan_token(&mut self) {
        let c = self.advance();

        match c {
            c if c.is_whitespace() => {}
            '/' if self.peek() == '/' => {
                while self.peek() != '\n' && !self.is_at_end() {
                    self.advance();
                }
            }
            '/' if self.peek() == '*' => self.block_comment(),
            '"' => self.string(),
            c if c.is_ascii_digit() => self.number(),
            c if c.is_ascii_alphabetic() || c == '_' => self.identifier(),
            '=' if self.peek() != '=' => {
                self.add_token(TokenKind::Assign, Literal::Text("=".to_string()));
            }
            c => {
                let pair: String = [c, self.peek()].iter().collect();
                if TWO_CHAR_OPERATORS.contains(&pair.as_str()) {
                    self.advance();
                    self.add_token(TokenKind::Operator, Literal::Text(pair));
                } else if SINGLE_CHAR_OPERATORS.contains(c) {
                    self.add_token(TokenKind::Operator, Literal::Text(c.to_string()));
                } else {
                    self.anomaly(format!("Unexpected character: '{}'", c));
                }
            }
        }
    }

    fn advance(&mut self) -> char {
        let c = self.peek();
        if !self.is_at_end() {
            self.current += 1;
        }
        c
    }

    fn peek(&self) -> char {
        self.source.get(self.current).copied().unwrap_or('\0')
    }

    fn peek_next(&self) -> char {
        self.source.get(self.current + 1).copied().unwrap_or('\0')
    }

    fn block_comment(&mut self) {
        self.advance(); // the '*'

        while !self.is_at_end() {
            if self.peek() == '*' && self.peek_next() == '/' {
                self.advance();
                self.advance();
                return;
            }
            self.advance();
        }

        self.anomaly("Unterminated block comment".to_string());
    }

    fn string(&mut self) {
        let mut text = String::new();

        while self.peek() != '"' && !self.is_at_end() {
            let c = self.advance();
            if c == '\\' && !self.is_at_end() {
                text.push(match self.advance() {
                    'n' => '\n',
                    't' => '\t',
                    'r' => '\r',
                    other => other,
                });
            } else {
                text.push(c);
            }
        }

        if self.is_at_end() {
            self.anomaly("Unterminated string".to_string());
        } else {
            self.advance(); // closing quote
        }

        self.add_token(TokenKind::String, Literal::Text(text));
    }

    fn number(&mut self) {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        if self.peek() == '.' {
            self.advance();
            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        let text: String = self.source[self.start..self.current].iter().collect();
        // Only ASCII digits and at most one '.' were consumed, so this parses.
        let value = text.parse::<f64>().unwrap_or(f64::NAN);
        self.add_token(TokenKind::Number, Literal::Number(value));
    }

    fn identifier(&mut self) {
        while self.peek().is_ascii_alphanumeric() || self.peek() == '_' {
            self.advance();
        }

        let text: String = self.source[self.start..self.current].iter().collect();
        let (kind, value) = if text == "true" || text == "false" {
            (TokenKind::Boolean, Literal::Boolean(text == "true"))
        } else if KEYWORDS.contains(&text.as_str()) {
            (TokenKind::Keyword, Literal::Text(text))
        } else {
            (TokenKind::Identifier, Literal::Text(text))
        };
        self.add_token(kind, value);
    }

    fn anomaly(&mut self, message: String) {
        self.anomalies
            .push(CypeError::lex_error(Span::new(self.start, self.current), message));
    }

    fn add_token(&mut self, kind: TokenKind, value: Literal) {
        self.tokens
            .push(Token::new(kind, value, Span::new(self.start, self.current)));
    }
}
