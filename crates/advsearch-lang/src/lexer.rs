//! Lexer for search questions using logos.

use chrono::NaiveDate;
use logos::Logos;

use crate::span::Span;

/// Token types of a search question.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
pub enum Token {
    // Comparison symbols
    #[token(">=")]
    Ge,
    #[token("<=")]
    Le,
    #[token(">")]
    Gt,
    #[token("<")]
    Lt,
    #[token("=")]
    Eq,

    /// ISO calendar date (`2026-09-30`).
    #[regex(r"[0-9]{4}-[0-9]{2}-[0-9]{2}", |lex| NaiveDate::parse_from_str(lex.slice(), "%Y-%m-%d").ok())]
    Date(NaiveDate),

    /// Number, thousands separators allowed (`1,250.50`).
    #[regex(r"[0-9][0-9,]*(\.[0-9]+)?", |lex| lex.slice().replace(',', "").parse::<f64>().ok())]
    Number(f64),

    /// Word, original casing kept.
    #[regex(r"\p{L}[\p{L}\p{N}_\-]*", |lex| lex.slice().to_string())]
    Word(String),

    /// Double-quoted string.
    #[regex(r#""[^"]*""#, |lex| unquote(lex.slice()))]
    #[regex(r"“[^”]*”", |lex| unquote(lex.slice()))]
    Quoted(String),

    /// Single-quoted string.
    #[regex(r"'[^']*'", |lex| unquote(lex.slice()))]
    QuotedSingle(String),

    // Punctuation
    #[regex(r"[.,;:!?()\[\]/$€£%&+*#@]")]
    Punct,
}

fn unquote(s: &str) -> String {
    let mut chars = s.chars();
    chars.next();
    chars.next_back();
    chars.as_str().trim().to_string()
}

/// A token with its span in the question.
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken {
    pub token: Token,
    pub span: Span,
}

/// Lexer that produces spanned tokens.
pub struct Lexer<'source> {
    inner: logos::Lexer<'source, Token>,
}

impl<'source> Lexer<'source> {
    /// Create a new lexer for the given question.
    pub fn new(source: &'source str) -> Self {
        Self {
            inner: Token::lexer(source),
        }
    }

    /// Get the source string.
    pub fn source(&self) -> &'source str {
        self.inner.source()
    }
}

impl Iterator for Lexer<'_> {
    type Item = SpannedToken;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.inner.next()? {
                Ok(token) => {
                    return Some(SpannedToken {
                        token,
                        span: self.inner.span().into(),
                    })
                }
                // Characters no rule accepts carry no meaning in a question.
                Err(()) => continue,
            }
        }
    }
}

/// Tokenize a question into a vector of spanned tokens.
pub fn tokenize(source: &str) -> Vec<SpannedToken> {
    Lexer::new(source).collect()
}
