//! Token types
//!
//! Tokens are produced by an external lexer/layout engine. The engine only
//! needs their kind, literal text and span; it never re-scans characters.

use serde::{Deserialize, Serialize};

use crate::util::span::{Position, Span};

/// Token kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    /// Alphanumeric name; may double as a pronounceable operator keyword
    Identifier,
    /// Numeric literal
    Numeral,
    /// Symbolic keyword fragment (`+`, `~~`, `<=`, ...)
    Keyword,
    /// `[`
    OpenBracket,
    /// `]`
    CloseBracket,
    /// `,`
    Comma,
    /// `:`
    Colon,
    /// `(`
    OpenParen,
    /// `)`
    CloseParen,
}

impl TokenKind {
    /// Tokens that can spell an operator keyword
    pub fn is_keyword_like(&self) -> bool {
        matches!(self, TokenKind::Identifier | TokenKind::Keyword)
    }

    /// Tokens that can stand alone as an atom
    pub fn is_atomic(&self) -> bool {
        matches!(self, TokenKind::Identifier | TokenKind::Numeral)
    }
}

/// Token
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub span: Span,
}

impl Token {
    pub fn new(
        kind: TokenKind,
        text: impl Into<String>,
        span: Span,
    ) -> Self {
        Self {
            kind,
            text: text.into(),
            span,
        }
    }

    /// Token without a source location
    pub fn synthetic(
        kind: TokenKind,
        text: impl Into<String>,
    ) -> Self {
        Self::new(kind, text, Span::dummy())
    }
}

/// Classify a whole, already separated word
pub fn classify_word(word: &str) -> TokenKind {
    match word {
        "(" => return TokenKind::OpenParen,
        ")" => return TokenKind::CloseParen,
        "[" => return TokenKind::OpenBracket,
        "]" => return TokenKind::CloseBracket,
        "," => return TokenKind::Comma,
        ":" => return TokenKind::Colon,
        _ => {}
    }

    let mut chars = word.chars();
    match chars.next() {
        Some(first) if first.is_ascii_digit() => {
            if word.chars().all(|c| c.is_ascii_digit() || c == '.' || c == '_') {
                TokenKind::Numeral
            } else {
                TokenKind::Keyword
            }
        }
        Some(first) if first == '_' || unicode_ident::is_xid_start(first) => {
            if chars.all(unicode_ident::is_xid_continue) {
                TokenKind::Identifier
            } else {
                TokenKind::Keyword
            }
        }
        _ => TokenKind::Keyword,
    }
}

/// Build a token stream from whitespace-separated words
///
/// Each word becomes exactly one token; punctuation must be separated by
/// spaces (`[ tension : 1.5 ]`). Spans are computed against `source`, so the
/// same text can back a [`SourceFile`](crate::util::span::SourceFile) when
/// rendering diagnostics.
pub fn from_words(source: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut line = 1;
    let mut column = 1;
    let mut start: Option<(usize, Position)> = None;

    for (offset, ch) in source.char_indices() {
        if ch.is_whitespace() {
            if let Some((begin, pos)) = start.take() {
                let word = &source[begin..offset];
                let end = Position::with_offset(line, column, offset);
                tokens.push(Token::new(classify_word(word), word, Span::new(pos, end)));
            }
            if ch == '\n' {
                line += 1;
                column = 1;
            } else {
                column += 1;
            }
            continue;
        }
        if start.is_none() {
            start = Some((offset, Position::with_offset(line, column, offset)));
        }
        column += 1;
    }

    if let Some((begin, pos)) = start {
        let word = &source[begin..];
        let end = Position::with_offset(line, column, source.len());
        tokens.push(Token::new(classify_word(word), word, Span::new(pos, end)));
    }

    tokens
}

/// Span covering a run of tokens
pub fn span_of(tokens: &[Token]) -> Span {
    tokens
        .iter()
        .fold(Span::dummy(), |acc, token| acc.merge(token.span))
}
