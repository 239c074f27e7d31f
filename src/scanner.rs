use crate::errors::ScanError;
use std::fmt;
use std::iter::Peekable;
use std::str::CharIndices;

pub struct Scanner<'a> {
    pub source: &'a str,
    pub chars: Peekable<CharIndices<'a>>,
    pub line: usize,
    pub tokens: Vec<Token>,
    start: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str) -> Scanner<'a> {
        Scanner {
            source,
            chars: source.char_indices().peekable(),
            line: 1,
            tokens: Vec::new(),
            start: 0,
        }
    }

    /// Scans the whole source in one pass. The first malformed character
    /// aborts the scan.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn scan_tokens(&mut self) -> Result<Vec<Token>, ScanError> {
        while let Some((start, ch)) = self.chars.next() {
            self.start = start;
            match ch {
                '(' => self.make_token(TokenType::LeftParen, None),
                ')' => self.make_token(TokenType::RightParen, None),
                '{' => self.make_token(TokenType::LeftBrace, None),
                '}' => self.make_token(TokenType::RightBrace, None),
                '[' => self.make_token(TokenType::LeftBracket, None),
                ']' => self.make_token(TokenType::RightBracket, None),
                ';' => self.make_token(TokenType::Semicolon, None),
                ',' => self.make_token(TokenType::Comma, None),
                '-' => self.make_token(TokenType::Minus, None),
                '+' => self.make_token(TokenType::Plus, None),
                '*' => self.make_token(TokenType::Star, None),
                '<' => self.make_token(TokenType::Less, None),
                '=' => {
                    if self.match_char('=') {
                        self.make_token(TokenType::EqualEqual, None);
                    } else {
                        self.make_token(TokenType::Equal, None);
                    }
                }
                '/' => {
                    if self.match_char('/') {
                        while let Some(&(_, ch)) = self.chars.peek() {
                            if ch == '\n' {
                                break;
                            }
                            self.chars.next();
                        }
                    } else {
                        self.make_token(TokenType::Slash, None);
                    }
                }
                '"' => self.string()?,
                ' ' | '\r' | '\t' => (),
                '\n' => self.line += 1,
                _ => {
                    if ch.is_ascii_digit() {
                        if ch == '0' && self.peek() == Some('x') {
                            self.hex_number()?;
                        } else {
                            self.number();
                        }
                    } else if is_alpha(ch) {
                        self.identifier();
                    } else {
                        return Err(self.error("Unexpected character."));
                    }
                }
            }
        }
        self.start = self.source.len();
        self.make_token(TokenType::Eof, None);
        tracing::debug!(count = self.tokens.len(), "scanned tokens");
        Ok(std::mem::take(&mut self.tokens))
    }

    fn string(&mut self) -> Result<(), ScanError> {
        while let Some(&(_, ch)) = self.chars.peek() {
            if ch == '"' {
                self.chars.next();
                let text = &self.source[self.start + 1..self.current() - 1];
                self.make_token(TokenType::String, Some(Literal::String(text.to_string())));
                return Ok(());
            }
            if ch == '\n' {
                self.line += 1;
            }
            self.chars.next();
        }
        Err(self.error("Unterminated string."))
    }

    fn number(&mut self) {
        self.skip_while(|ch| ch.is_ascii_digit());
        if self.peek() == Some('.') && self.peek_next().is_some_and(|ch| ch.is_ascii_digit()) {
            self.chars.next();
            self.skip_while(|ch| ch.is_ascii_digit());
        }
        let text = &self.source[self.start..self.current()];
        // a run of ascii digits with an optional fraction always parses
        let value = text.parse::<f64>().unwrap_or_default();
        self.make_token(TokenType::Number, Some(Literal::Number(value)));
    }

    fn hex_number(&mut self) -> Result<(), ScanError> {
        self.chars.next(); // x
        self.skip_while(|ch| ch.is_ascii_hexdigit());
        let digits = &self.source[self.start + 2..self.current()];
        match u64::from_str_radix(digits, 16) {
            Ok(value) => {
                self.make_token(TokenType::Number, Some(Literal::Number(value as f64)));
                Ok(())
            }
            Err(_) => Err(self.error("Invalid hexadecimal literal.")),
        }
    }

    fn identifier(&mut self) {
        self.skip_while(is_alpha_numeric);
        let text = &self.source[self.start..self.current()];
        let tt = keyword(text).unwrap_or(TokenType::Identifier);
        self.make_token(tt, None);
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.chars.next();
            return true;
        }
        false
    }

    fn skip_while(&mut self, predicate: impl Fn(char) -> bool) {
        while let Some(&(_, ch)) = self.chars.peek() {
            if !predicate(ch) {
                break;
            }
            self.chars.next();
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, ch)| ch)
    }

    fn peek_next(&self) -> Option<char> {
        let mut ahead = self.chars.clone();
        ahead.next();
        ahead.next().map(|(_, ch)| ch)
    }

    /// Byte offset just past the last consumed character.
    fn current(&self) -> usize {
        self.chars.clone().next().map_or(self.source.len(), |(i, _)| i)
    }

    fn make_token(&mut self, tt: TokenType, literal: Option<Literal>) {
        let end = self.current().max(self.start);
        self.tokens.push(Token {
            tt,
            lexeme: self.source[self.start..end].to_string(),
            literal,
            line: self.line,
        });
    }

    fn error(&self, msg: &str) -> ScanError {
        ScanError::new(msg, self.line)
    }
}

fn keyword(text: &str) -> Option<TokenType> {
    let tt = match text {
        "and" => TokenType::And,
        "do" => TokenType::Do,
        "else" => TokenType::Else,
        "false" => TokenType::False,
        "fun" => TokenType::Fun,
        "if" => TokenType::If,
        "nil" => TokenType::Nil,
        "not" => TokenType::Not,
        "or" => TokenType::Or,
        "return" => TokenType::Return,
        "then" => TokenType::Then,
        "true" => TokenType::True,
        "var" => TokenType::Var,
        "while" => TokenType::While,
        _ => return None,
    };
    Some(tt)
}

fn is_alpha(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_'
}

fn is_alpha_numeric(ch: char) -> bool {
    is_alpha(ch) || ch.is_ascii_digit()
}

/// Decoded payload of a literal. Tokens only ever carry `Number` and
/// `String`; the parser produces the other variants from keywords.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Nil,
    Bool(bool),
    Number(f64),
    String(String),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Nil => write!(f, "nil"),
            Literal::Bool(b) => write!(f, "{b}"),
            Literal::Number(n) => write!(f, "{n:?}"),
            Literal::String(s) => write!(f, "{s}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub tt: TokenType,
    pub lexeme: String,
    pub literal: Option<Literal>,
    pub line: usize,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let literal = self.literal.as_ref().map_or_else(|| "nil".to_string(), ToString::to_string);
        write!(f, "TOKEN({}, {}, {literal}) on line {}", self.tt, self.lexeme, self.line)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Copy)]
pub enum TokenType {
    // keywords
    Fun,
    Var,
    If,
    Then,
    Else,
    While,
    Do,
    Return,
    And,
    Or,
    Not,
    True,
    False,
    Nil,

    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    Comma,
    Minus,
    Plus,
    Star,
    Slash,
    Semicolon,
    Equal,
    EqualEqual,
    Less,
    // reserved, never produced by the scanner nor consumed by the parser
    NotEqual,
    More,
    LessThan,
    MoreThan,

    Identifier,
    Number,
    String,

    Eof,
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenType::Fun => "FUN",
            TokenType::Var => "VAR",
            TokenType::If => "IF",
            TokenType::Then => "THEN",
            TokenType::Else => "ELSE",
            TokenType::While => "WHILE",
            TokenType::Do => "DO",
            TokenType::Return => "RETURN",
            TokenType::And => "AND",
            TokenType::Or => "OR",
            TokenType::Not => "NOT",
            TokenType::True => "TRUE",
            TokenType::False => "FALSE",
            TokenType::Nil => "NIL",
            TokenType::LeftParen => "LEFT_PAREN",
            TokenType::RightParen => "RIGHT_PAREN",
            TokenType::LeftBrace => "LEFT_BRACE",
            TokenType::RightBrace => "RIGHT_BRACE",
            TokenType::LeftBracket => "LEFT_BRACKET",
            TokenType::RightBracket => "RIGHT_BRACKET",
            TokenType::Comma => "COMMA",
            TokenType::Minus => "MINUS",
            TokenType::Plus => "PLUS",
            TokenType::Star => "STAR",
            TokenType::Slash => "SLASH",
            TokenType::Semicolon => "SEMICOLON",
            TokenType::Equal => "EQUAL",
            TokenType::EqualEqual => "EQUAL_EQUAL",
            TokenType::Less => "LESS",
            TokenType::NotEqual => "NOT_EQUAL",
            TokenType::More => "MORE",
            TokenType::LessThan => "LESS_THAN",
            TokenType::MoreThan => "MORE_THAN",
            TokenType::Identifier => "IDENTIFIER",
            TokenType::Number => "NUMBER",
            TokenType::String => "STRING",
            TokenType::Eof => "EOF",
        };
        f.write_str(name)
    }
}
