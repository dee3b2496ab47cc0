//! Parser for the `sort [by (field [desc], ...)] [desc]` fragment.

use logq_core::sort_expr::{SortConfig, SortKey};

use crate::error::{ParseError, Result};
use crate::lex::{tokenize, Token};

struct Cursor {
    tokens: Vec<Token>,
    pos: usize,
}

impl Cursor {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self, expected: &str) -> Result<&Token> {
        let tok = self
            .tokens
            .get(self.pos)
            .ok_or_else(|| ParseError::UnexpectedEnd(expected.to_string()))?;
        self.pos += 1;
        Ok(tok)
    }

    /// Consume the next token if it matches the keyword.
    fn eat_keyword(&mut self, kw: &str) -> bool {
        if self.peek().is_some_and(|t| t.is_keyword(kw)) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat(&mut self, tok: &Token) -> bool {
        if self.peek() == Some(tok) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_keyword(&mut self, kw: &str) -> Result<()> {
        let expected = format!("'{kw}'");
        let tok = self.next(&expected)?;
        if tok.is_keyword(kw) {
            Ok(())
        } else {
            Err(ParseError::Expected {
                expected,
                got: tok.describe(),
            })
        }
    }
}

/// Parse a complete sort clause into its config record.
///
/// `sort by ()` is accepted and equivalent to a bare `sort` (all-columns
/// mode).
pub fn parse_sort_clause(input: &str) -> Result<SortConfig> {
    let mut cur = Cursor {
        tokens: tokenize(input)?,
        pos: 0,
    };

    cur.expect_keyword("sort")?;

    let mut cfg = SortConfig::default();
    if cur.eat_keyword("by") {
        cfg.by_fields = parse_by_fields(&mut cur)?;
    }
    if cur.eat_keyword("desc") {
        cfg.desc = true;
    }

    match cur.peek() {
        None => Ok(cfg),
        Some(tok) => Err(ParseError::Trailing(tok.describe())),
    }
}

fn parse_by_fields(cur: &mut Cursor) -> Result<Vec<SortKey>> {
    let open = cur.next("'('")?;
    if open != &Token::LParen {
        return Err(ParseError::Expected {
            expected: "'('".to_string(),
            got: open.describe(),
        });
    }

    let mut keys = Vec::new();
    if cur.eat(&Token::RParen) {
        // `by ()` sorts by all columns.
        return Ok(keys);
    }
    loop {
        let name = match cur.next("field name")? {
            Token::Word(w) => w.clone(),
            Token::Quoted(q) => q.clone(),
            other => {
                return Err(ParseError::Expected {
                    expected: "field name".to_string(),
                    got: other.describe(),
                })
            }
        };
        let desc = cur.eat_keyword("desc");
        keys.push(SortKey { name, desc });

        if cur.eat(&Token::RParen) {
            return Ok(keys);
        }
        if !cur.eat(&Token::Comma) {
            return match cur.peek() {
                Some(tok) => Err(ParseError::Expected {
                    expected: "',' or ')'".to_string(),
                    got: tok.describe(),
                }),
                None => Err(ParseError::UnexpectedEnd("',' or ')'".to_string())),
            };
        }
    }
}
