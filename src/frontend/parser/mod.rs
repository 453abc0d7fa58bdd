//! Mixfix parser
//!
//! Parses one expression at a time against a compiled [`Grammar`]:
//!
//! 1. Symbolic keywords that no visible operator declares are rejected up
//!    front.
//! 2. A span chart collects every local derivation under strict tightness.
//! 3. One root derivation is extracted into a [`ParseNode`]; ambiguous
//!    cells go through the chain rewriter.
//! 4. With no root derivation the chart is rebuilt in relaxed mode. If
//!    incomparable categories were the obstacle, the clashing operators are
//!    reported as an ambiguity; otherwise the failure is a plain no-parse.
//!
//! Each expression fails or succeeds on its own; nothing carries over
//! between parses.

pub(crate) mod chart;
pub(crate) mod extract;
pub(crate) mod params;

#[cfg(test)]
mod tests;

use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;

use crate::frontend::category::BitSet;
use crate::frontend::grammar::{Grammar, Mode, Requirement};
use crate::frontend::registry::{OperatorId, ScopeId};
use crate::frontend::tokens::{span_of, Token, TokenKind};
use crate::frontend::tree::ParseNode;
use crate::util::diagnostic::suggest::closest_match;
use crate::util::diagnostic::{Diagnostic, ErrorCodeDefinition, ToDiagnostic};
use crate::util::span::Span;

use chart::Chart;
use extract::Extractor;

/// Parser switches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Adjacent primaries form an application (`f x y`)
    pub juxtaposition: bool,
}

/// One side of an ambiguity
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Competitor {
    /// `None` for juxtaposition
    pub operator: Option<OperatorId>,
    pub name: String,
    /// Keywords of this operator in the expression
    pub span: Span,
}

/// Parse failure for one expression
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("operator symbol '{symbol}' is {}", symbol_reason(.declared_by))]
    UndeclaredOperatorSymbol {
        symbol: String,
        /// Operators that declare the symbol but are not imported here
        declared_by: Vec<String>,
        suggestion: Option<String>,
        span: Span,
    },

    #[error("no valid parse: {reason}")]
    NoParse { reason: String, span: Span },

    #[error("ambiguous expression: competing operators {}", competitor_names(.competitors))]
    AmbiguousExpression {
        competitors: Vec<Competitor>,
        span: Span,
    },

    #[error("operator '{operator}' has no parameter named '{label}'")]
    UnknownParameter {
        operator: String,
        label: String,
        expected: Vec<String>,
        span: Span,
    },

    #[error("invalid parameter list for '{operator}': {reason}")]
    ParameterArity {
        operator: String,
        reason: String,
        expected: Vec<String>,
        span: Span,
    },
}

fn symbol_reason(declared_by: &[String]) -> &'static str {
    if declared_by.is_empty() {
        "not declared"
    } else {
        "not imported"
    }
}

fn competitor_names(competitors: &[Competitor]) -> String {
    competitors
        .iter()
        .map(|c| format!("'{}'", c.name))
        .collect::<Vec<_>>()
        .join(", ")
}

impl ParseError {
    pub fn span(&self) -> Span {
        match self {
            ParseError::UndeclaredOperatorSymbol { span, .. }
            | ParseError::NoParse { span, .. }
            | ParseError::AmbiguousExpression { span, .. }
            | ParseError::UnknownParameter { span, .. }
            | ParseError::ParameterArity { span, .. } => *span,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ParseError::UndeclaredOperatorSymbol { .. } => "E0301",
            ParseError::NoParse { .. } => "E0302",
            ParseError::AmbiguousExpression { .. } => "E0303",
            ParseError::UnknownParameter { .. } => "E0304",
            ParseError::ParameterArity { .. } => "E0305",
        }
    }
}

impl ToDiagnostic for ParseError {
    fn to_diagnostic(&self) -> Diagnostic {
        let Some(definition) = ErrorCodeDefinition::find(self.code()) else {
            return Diagnostic::note(self.to_string(), self.span());
        };
        let builder = definition.builder().at(self.span());
        let builder = match self {
            ParseError::UndeclaredOperatorSymbol {
                symbol,
                declared_by,
                suggestion,
                span,
            } => {
                let mut related: Vec<Diagnostic> = declared_by
                    .iter()
                    .map(|name| Diagnostic::note(format!("declared by operator '{}'", name), *span))
                    .collect();
                if let Some(suggestion) = suggestion {
                    related.push(Diagnostic::note(
                        format!("did you mean '{}'?", suggestion),
                        *span,
                    ));
                }
                builder
                    .param("symbol", symbol.clone())
                    .param("reason", symbol_reason(declared_by))
                    .with_related(related)
            }
            ParseError::NoParse { reason, .. } => builder.param("reason", reason.clone()),
            ParseError::AmbiguousExpression { competitors, .. } => builder
                .param("operators", competitor_names(competitors))
                .with_related(
                    competitors
                        .iter()
                        .map(|c| Diagnostic::note(format!("'{}' here", c.name), c.span))
                        .collect(),
                ),
            ParseError::UnknownParameter {
                operator,
                label,
                expected,
                span,
            } => {
                let builder = builder
                    .param("operator", operator.clone())
                    .param("label", label.clone())
                    .param("expected", expected.join(", "));
                match closest_match(label, expected.iter().map(String::as_str)) {
                    Some(near) => builder.with_related(vec![Diagnostic::note(
                        format!("did you mean '{}'?", near),
                        *span,
                    )]),
                    None => builder,
                }
            }
            ParseError::ParameterArity {
                operator,
                reason,
                expected,
                ..
            } => builder
                .param("operator", operator.clone())
                .param("reason", reason.clone())
                .param("expected", expected.join(", ")),
        };
        builder.build()
    }
}

/// An expression to parse, with the scope it appears in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expression {
    pub tokens: Vec<Token>,
    pub scope: ScopeId,
}

impl Expression {
    pub fn new(
        tokens: Vec<Token>,
        scope: ScopeId,
    ) -> Self {
        Self { tokens, scope }
    }
}

/// Result of parsing one expression
pub type ParseResult = Result<ParseNode, Vec<ParseError>>;

/// Parse a single expression
pub fn parse(
    tokens: &[Token],
    grammar: &Grammar,
    scope: ScopeId,
    options: &ParseOptions,
) -> ParseResult {
    let Some(first) = tokens.first() else {
        return Err(vec![ParseError::NoParse {
            reason: "empty expression".to_string(),
            span: Span::dummy(),
        }]);
    };
    tracing::trace!(tokens = tokens.len(), start = %first.span.start, "parsing expression");

    let visible = grammar.visible(scope);
    let undeclared = check_symbols(tokens, grammar, &visible);
    if !undeclared.is_empty() {
        return Err(undeclared);
    }
    let partner = match_brackets(tokens).map_err(|e| vec![e])?;
    let n = tokens.len();

    let strict = Chart::build(
        grammar,
        tokens,
        &partner,
        visible.clone(),
        Mode::Strict,
        options.juxtaposition,
    );
    if strict.admits(0, n, Requirement::Any) {
        return Extractor::new(&strict)
            .node(0, n, Requirement::Any)
            .map_err(|e| vec![e]);
    }

    let relaxed = Chart::build(
        grammar,
        tokens,
        &partner,
        visible,
        Mode::Relaxed,
        options.juxtaposition,
    );
    if relaxed.admits(0, n, Requirement::Any) {
        let competitors = extract::contested(&relaxed);
        if !competitors.is_empty() {
            return Err(vec![ParseError::AmbiguousExpression {
                competitors,
                span: span_of(tokens),
            }]);
        }
    }
    Err(vec![extract::diagnose(&strict)])
}

/// Parse expressions one after another
pub fn parse_all(
    expressions: &[Expression],
    grammar: &Grammar,
    options: &ParseOptions,
) -> Vec<ParseResult> {
    expressions
        .iter()
        .map(|e| parse(&e.tokens, grammar, e.scope, options))
        .collect()
}

/// Parse expressions on the rayon pool; results keep input order
pub fn parse_all_parallel(
    expressions: &[Expression],
    grammar: &Grammar,
    options: &ParseOptions,
) -> Vec<ParseResult> {
    expressions
        .par_iter()
        .map(|e| parse(&e.tokens, grammar, e.scope, options))
        .collect()
}

/// Every symbolic keyword must belong to a visible operator
fn check_symbols(
    tokens: &[Token],
    grammar: &Grammar,
    visible: &BitSet,
) -> Vec<ParseError> {
    let table = grammar.table();
    let mut errors = Vec::new();

    for token in tokens.iter().filter(|t| t.kind == TokenKind::Keyword) {
        let users = grammar.keyword_users(&token.text);
        if users.iter().any(|op| visible.contains(op.index())) {
            continue;
        }
        let declared_by: Vec<String> = users
            .iter()
            .map(|op| table.operator_name(*op).to_string())
            .collect();
        let suggestion = if declared_by.is_empty() {
            let known: Vec<&str> = table
                .operators()
                .iter()
                .filter(|op| visible.contains(op.id.index()))
                .flat_map(|op| op.keywords())
                .collect();
            closest_match(&token.text, known).map(str::to_string)
        } else {
            None
        };
        errors.push(ParseError::UndeclaredOperatorSymbol {
            symbol: token.text.clone(),
            declared_by,
            suggestion,
            span: token.span,
        });
    }
    errors
}

/// Partner index of every bracket and parenthesis
fn match_brackets(tokens: &[Token]) -> Result<Vec<Option<usize>>, ParseError> {
    let mut partner = vec![None; tokens.len()];
    let mut open: Vec<usize> = Vec::new();

    for (index, token) in tokens.iter().enumerate() {
        match token.kind {
            TokenKind::OpenParen | TokenKind::OpenBracket => open.push(index),
            TokenKind::CloseParen | TokenKind::CloseBracket => {
                let expected = if token.kind == TokenKind::CloseParen {
                    TokenKind::OpenParen
                } else {
                    TokenKind::OpenBracket
                };
                match open.pop() {
                    Some(start) if tokens[start].kind == expected => {
                        partner[start] = Some(index);
                        partner[index] = Some(start);
                    }
                    Some(start) => {
                        return Err(ParseError::NoParse {
                            reason: format!(
                                "'{}' is closed by '{}'",
                                tokens[start].text, token.text
                            ),
                            span: tokens[start].span.merge(token.span),
                        })
                    }
                    None => {
                        return Err(ParseError::NoParse {
                            reason: format!("unmatched '{}'", token.text),
                            span: token.span,
                        })
                    }
                }
            }
            _ => {}
        }
    }

    match open.pop() {
        Some(start) => Err(ParseError::NoParse {
            reason: format!("unclosed '{}'", tokens[start].text),
            span: tokens[start].span,
        }),
        None => Ok(partner),
    }
}
