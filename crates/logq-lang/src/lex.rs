//! Tokenizer for query fragments.

use crate::error::{ParseError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Bare identifier or keyword.
    Word(String),
    /// Decoded double-quoted string.
    Quoted(String),
    LParen,
    RParen,
    Comma,
}

impl Token {
    /// Case-insensitive keyword check. Quoted strings never match keywords.
    pub fn is_keyword(&self, kw: &str) -> bool {
        matches!(self, Token::Word(w) if w.eq_ignore_ascii_case(kw))
    }

    /// Render the token for error messages.
    pub fn describe(&self) -> String {
        match self {
            Token::Word(w) => format!("{w:?}"),
            Token::Quoted(q) => format!("{q:?}"),
            Token::LParen => "'('".to_string(),
            Token::RParen => "')'".to_string(),
            Token::Comma => "','".to_string(),
        }
    }
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '.'
}

pub fn tokenize(input: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut rest = input;

    loop {
        rest = rest.trim_start();
        let Some(c) = rest.chars().next() else {
            return Ok(tokens);
        };
        match c {
            '(' => {
                tokens.push(Token::LParen);
                rest = &rest[1..];
            }
            ')' => {
                tokens.push(Token::RParen);
                rest = &rest[1..];
            }
            ',' => {
                tokens.push(Token::Comma);
                rest = &rest[1..];
            }
            '"' => {
                let (decoded, tail) = scan_quoted(rest)?;
                tokens.push(Token::Quoted(decoded));
                rest = tail;
            }
            c if is_word_char(c) => {
                let end = rest.find(|c| !is_word_char(c)).unwrap_or(rest.len());
                tokens.push(Token::Word(rest[..end].to_string()));
                rest = &rest[end..];
            }
            other => return Err(ParseError::UnexpectedChar(other)),
        }
    }
}

/// Scan a double-quoted string (JSON escapes) off the front of `rest`.
/// Returns the decoded string and the remaining input.
fn scan_quoted(rest: &str) -> Result<(String, &str)> {
    let bytes = rest.as_bytes();
    let mut i = 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'"' => {
                let raw = &rest[..i + 1];
                let decoded = serde_json::from_str::<String>(raw)
                    .map_err(|e| ParseError::InvalidString(e.to_string()))?;
                return Ok((decoded, &rest[i + 1..]));
            }
            _ => i += 1,
        }
    }
    Err(ParseError::InvalidString(
        "missing terminating '\"'".to_string(),
    ))
}
