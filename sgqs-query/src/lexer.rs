use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenType {
    // Keywords
    Match,
    Where,
    Return,
    And,
    Or,
    Not,
    As,
    Distinct,
    Contains,
    Starts,
    With,
    Ends,
    Is,
    Null,
    True,
    False,
    Count,
    Collect,

    // Literals and names
    Identifier,
    Label,
    String,
    Integer,

    // Symbols
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    LeftBrace,
    RightBrace,
    Colon,
    Comma,
    Dot,
    DotDot,
    Asterisk,

    // Relationships
    Dash,
    RightArrow,
    LeftArrow,

    // Operators
    Equals,
    NotEquals,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,

    Eof,
}

impl TokenType {
    /// Case-insensitive keyword lookup.
    pub fn keyword(word: &str) -> Option<TokenType> {
        let token_type = match word.to_ascii_uppercase().as_str() {
            "MATCH" => TokenType::Match,
            "WHERE" => TokenType::Where,
            "RETURN" => TokenType::Return,
            "AND" => TokenType::And,
            "OR" => TokenType::Or,
            "NOT" => TokenType::Not,
            "AS" => TokenType::As,
            "DISTINCT" => TokenType::Distinct,
            "CONTAINS" => TokenType::Contains,
            "STARTS" => TokenType::Starts,
            "WITH" => TokenType::With,
            "ENDS" => TokenType::Ends,
            "IS" => TokenType::Is,
            "NULL" => TokenType::Null,
            "TRUE" => TokenType::True,
            "FALSE" => TokenType::False,
            "COUNT" => TokenType::Count,
            "COLLECT" => TokenType::Collect,
            _ => return None,
        };
        Some(token_type)
    }

    pub fn is_keyword(self) -> bool {
        matches!(
            self,
            TokenType::Match
                | TokenType::Where
                | TokenType::Return
                | TokenType::And
                | TokenType::Or
                | TokenType::Not
                | TokenType::As
                | TokenType::Distinct
                | TokenType::Contains
                | TokenType::Starts
                | TokenType::With
                | TokenType::Ends
                | TokenType::Is
                | TokenType::Null
                | TokenType::True
                | TokenType::False
                | TokenType::Count
                | TokenType::Collect
        )
    }

    fn closes_pattern(self) -> bool {
        matches!(self, TokenType::RightParen | TokenType::RightBracket)
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            TokenType::Match => "MATCH",
            TokenType::Where => "WHERE",
            TokenType::Return => "RETURN",
            TokenType::And => "AND",
            TokenType::Or => "OR",
            TokenType::Not => "NOT",
            TokenType::As => "AS",
            TokenType::Distinct => "DISTINCT",
            TokenType::Contains => "CONTAINS",
            TokenType::Starts => "STARTS",
            TokenType::With => "WITH",
            TokenType::Ends => "ENDS",
            TokenType::Is => "IS",
            TokenType::Null => "NULL",
            TokenType::True => "TRUE",
            TokenType::False => "FALSE",
            TokenType::Count => "COUNT",
            TokenType::Collect => "COLLECT",
            TokenType::Identifier => "identifier",
            TokenType::Label => "label",
            TokenType::String => "string",
            TokenType::Integer => "integer",
            TokenType::LeftParen => "'('",
            TokenType::RightParen => "')'",
            TokenType::LeftBracket => "'['",
            TokenType::RightBracket => "']'",
            TokenType::LeftBrace => "'{'",
            TokenType::RightBrace => "'}'",
            TokenType::Colon => "':'",
            TokenType::Comma => "','",
            TokenType::Dot => "'.'",
            TokenType::DotDot => "'..'",
            TokenType::Asterisk => "'*'",
            TokenType::Dash => "'-'",
            TokenType::RightArrow => "'->'",
            TokenType::LeftArrow => "'<-'",
            TokenType::Equals => "'='",
            TokenType::NotEquals => "'<>'",
            TokenType::LessThan => "'<'",
            TokenType::LessEqual => "'<='",
            TokenType::GreaterThan => "'>'",
            TokenType::GreaterEqual => "'>='",
            TokenType::Eof => "end of input",
        };
        f.write_str(text)
    }
}

/// Location in the query source. `offset` is a byte offset; `line` and
/// `column` are 1-based, with columns counted in characters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub token_type: TokenType,
    /// Source text, except for strings (unescaped contents) and labels
    /// (the name without its colon).
    pub text: String,
    pub position: Position,
}

impl Token {
    /// Short description used in "expected X, found Y" messages.
    pub fn describe(&self) -> String {
        match self.token_type {
            TokenType::Eof => "end of input".to_string(),
            TokenType::String => format!("string \"{}\"", self.text),
            TokenType::Label => format!("label :{}", self.text),
            _ => format!("'{}'", self.text),
        }
    }
}

/// Converts query text into tokens.
///
/// The scanner keeps just enough state about what it already emitted (open
/// scopes and the previous token) to tell labels from colons, arrows from
/// dashes and comparisons, and comments from relationship dashes.
pub struct Lexer<'a> {
    source: &'a str,
    chars: Peekable<Chars<'a>>,
    offset: usize,
    line: usize,
    column: usize,
    paren_depth: usize,
    bracket_depth: usize,
    brace_depth: usize,
    last: Option<TokenType>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.chars().peekable(),
            offset: 0,
            line: 1,
            column: 1,
            paren_depth: 0,
            bracket_depth: 0,
            brace_depth: 0,
            last: None,
        }
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token()? {
            self.track(token.token_type);
            tokens.push(token);
        }
        tokens.push(Token {
            token_type: TokenType::Eof,
            text: String::new(),
            position: self.position(),
        });
        Ok(tokens)
    }

    fn track(&mut self, token_type: TokenType) {
        match token_type {
            TokenType::LeftParen => self.paren_depth += 1,
            TokenType::RightParen => self.paren_depth = self.paren_depth.saturating_sub(1),
            TokenType::LeftBracket => self.bracket_depth += 1,
            TokenType::RightBracket => self.bracket_depth = self.bracket_depth.saturating_sub(1),
            TokenType::LeftBrace => self.brace_depth += 1,
            TokenType::RightBrace => self.brace_depth = self.brace_depth.saturating_sub(1),
            _ => {}
        }
        self.last = Some(token_type);
    }

    fn after_pattern_close(&self) -> bool {
        self.last.is_some_and(TokenType::closes_pattern)
    }

    fn next_token(&mut self) -> Result<Option<Token>> {
        loop {
            self.skip_whitespace();
            if self.chars.peek() == Some(&'-')
                && self.peek_second() == Some('-')
                && !self.after_pattern_close()
                && self.bracket_depth == 0
            {
                self.skip_line_comment();
                continue;
            }
            break;
        }

        let start = self.position();
        let Some(char) = self.advance() else {
            return Ok(None);
        };

        // String literals
        if char == '"' {
            return self.read_string(start).map(Some);
        }

        // Integer literals
        if char.is_ascii_digit() {
            return Ok(Some(self.read_integer(start)));
        }

        // Identifiers and keywords
        if is_ident_start(char) {
            return Ok(Some(self.read_identifier(start)));
        }

        let token_type = match char {
            '(' => TokenType::LeftParen,
            ')' => TokenType::RightParen,
            '[' => TokenType::LeftBracket,
            ']' => TokenType::RightBracket,
            '{' => TokenType::LeftBrace,
            '}' => TokenType::RightBrace,
            ',' => TokenType::Comma,
            '*' => TokenType::Asterisk,
            '=' => TokenType::Equals,
            ':' => {
                let in_scope = self.paren_depth + self.bracket_depth > 0 && self.brace_depth == 0;
                if in_scope && self.chars.peek().copied().is_some_and(is_ident_start) {
                    return Ok(Some(self.read_label(start)));
                }
                TokenType::Colon
            }
            '.' => {
                if let Some(&'.') = self.chars.peek() {
                    self.advance();
                    TokenType::DotDot
                } else {
                    TokenType::Dot
                }
            }
            '-' => {
                if self.chars.peek() == Some(&'>') && self.after_pattern_close() {
                    self.advance();
                    TokenType::RightArrow
                } else {
                    TokenType::Dash
                }
            }
            '<' => match self.chars.peek().copied() {
                Some('-') if self.after_pattern_close() => {
                    self.advance();
                    TokenType::LeftArrow
                }
                Some('=') => {
                    self.advance();
                    TokenType::LessEqual
                }
                Some('>') => {
                    self.advance();
                    TokenType::NotEquals
                }
                _ => TokenType::LessThan,
            },
            '>' => {
                if let Some(&'=') = self.chars.peek() {
                    self.advance();
                    TokenType::GreaterEqual
                } else {
                    TokenType::GreaterThan
                }
            }
            ch => {
                return Err(Error::UnexpectedCharacter {
                    ch,
                    position: start,
                });
            }
        };

        Ok(Some(self.token(token_type, start)))
    }

    fn token(&self, token_type: TokenType, start: Position) -> Token {
        Token {
            token_type,
            text: self.source[start.offset..self.offset].to_string(),
            position: start,
        }
    }

    fn position(&self) -> Position {
        Position {
            offset: self.offset,
            line: self.line,
            column: self.column,
        }
    }

    fn peek_second(&self) -> Option<char> {
        self.chars.clone().nth(1)
    }

    fn advance(&mut self) -> Option<char> {
        let char = self.chars.next();
        if let Some(c) = char {
            self.offset += c.len_utf8();
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        char
    }

    fn skip_whitespace(&mut self) {
        while let Some(&char) = self.chars.peek() {
            if matches!(char, ' ' | '\t' | '\r' | '\n') {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn skip_line_comment(&mut self) {
        while let Some(&char) = self.chars.peek() {
            if char == '\n' {
                break;
            }
            self.advance();
        }
    }

    fn read_string(&mut self, start: Position) -> Result<Token> {
        let mut value = String::new();
        loop {
            match self.advance() {
                None => return Err(Error::UnterminatedString { position: start }),
                Some('"') => break,
                Some('\\') => match self.chars.peek() {
                    Some(&'"') | Some(&'\\') => {
                        if let Some(escaped) = self.advance() {
                            value.push(escaped);
                        }
                    }
                    _ => value.push('\\'),
                },
                Some(char) => value.push(char),
            }
        }
        Ok(Token {
            token_type: TokenType::String,
            text: value,
            position: start,
        })
    }

    fn read_integer(&mut self, start: Position) -> Token {
        while self.chars.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
        self.token(TokenType::Integer, start)
    }

    fn read_identifier(&mut self, start: Position) -> Token {
        self.consume_ident_tail();
        let word = &self.source[start.offset..self.offset];
        // A name right after a dot is a property, even when it spells a keyword.
        let token_type = if self.last == Some(TokenType::Dot) {
            TokenType::Identifier
        } else {
            TokenType::keyword(word).unwrap_or(TokenType::Identifier)
        };
        self.token(token_type, start)
    }

    fn read_label(&mut self, start: Position) -> Token {
        let name_start = self.offset;
        self.advance();
        self.consume_ident_tail();
        Token {
            token_type: TokenType::Label,
            text: self.source[name_start..self.offset].to_string(),
            position: start,
        }
    }

    fn consume_ident_tail(&mut self) {
        while self.chars.peek().copied().is_some_and(is_ident_part) {
            self.advance();
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_part(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// Tokenizes `source`; the last token is always [`TokenType::Eof`].
pub fn tokenize(source: &str) -> Result<Vec<Token>> {
    Lexer::new(source).tokenize()
}
