//! Tree extraction and failure diagnosis

use smallvec::SmallVec;
use std::collections::HashSet;

use super::chart::{AltKind, Alternative, Chart, OperatorMatch};
use super::{params, Competitor, ParseError};
use crate::frontend::chain;
use crate::frontend::grammar::{Grammar, Mode, Requirement};
use crate::frontend::tokens::{span_of, TokenKind};
use crate::frontend::tree::ParseNode;
use crate::util::span::Span;

/// Walks a finished chart top-down, building the unique tree or handing
/// ambiguous cells to the chain rewriter
pub(crate) struct Extractor<'c, 'g> {
    pub chart: &'c Chart<'g>,
}

impl<'c, 'g> Extractor<'c, 'g> {
    pub fn new(chart: &'c Chart<'g>) -> Self {
        Self { chart }
    }

    pub fn grammar(&self) -> &'g Grammar {
        self.chart.grammar
    }

    pub fn span(
        &self,
        i: usize,
        j: usize,
    ) -> Span {
        span_of(&self.chart.tokens[i..j])
    }

    /// Span of the keywords an operator match consumed
    pub fn keyword_span(
        &self,
        m: &OperatorMatch,
    ) -> Span {
        m.keywords
            .iter()
            .fold(Span::dummy(), |acc, k| acc.merge(self.chart.tokens[*k].span))
    }

    pub fn competitor(
        &self,
        m: &OperatorMatch,
    ) -> Competitor {
        Competitor {
            operator: Some(m.op),
            name: self.grammar().table().operator_name(m.op).to_string(),
            span: self.keyword_span(m),
        }
    }

    /// The unique tree for `(i, j)` under `req`
    pub fn node(
        &self,
        i: usize,
        j: usize,
        req: Requirement,
    ) -> Result<ParseNode, ParseError> {
        let alternatives: SmallVec<[&Alternative; 2]> = self.chart.admitted(i, j, req).collect();
        match alternatives.as_slice() {
            [] => Err(ParseError::NoParse {
                reason: "no derivation for this operand".to_string(),
                span: self.span(i, j),
            }),
            [single] => self.build(i, j, single),
            many => chain::rewrite(self, i, j, many),
        }
    }

    /// Tree for one specific alternative of `(i, j)`
    pub fn build(
        &self,
        i: usize,
        j: usize,
        alternative: &Alternative,
    ) -> Result<ParseNode, ParseError> {
        let tokens = self.chart.tokens;
        match &alternative.kind {
            AltKind::Atom(k) => Ok(ParseNode::Atom(tokens[*k].clone())),
            AltKind::Group { open, close } => self.node(open + 1, *close, Requirement::Any),
            AltKind::Operator(m) => {
                let grammar = self.grammar();
                let (Some(op), Some(compiled)) = (grammar.operator(m.op), grammar.compiled(m.op))
                else {
                    return Err(ParseError::NoParse {
                        reason: "operator vanished from the grammar".to_string(),
                        span: self.span(i, j),
                    });
                };
                let operands = m
                    .holes
                    .iter()
                    .zip(compiled.requirements())
                    .map(|(&(a, b), req)| self.node(a, b, req))
                    .collect::<Result<Vec<_>, _>>()?;
                let params = params::bind(op, m.params, tokens, self.keyword_span(m))?;
                Ok(ParseNode::Apply {
                    operator: m.op,
                    operands,
                    params,
                    span: self.span(i, j),
                })
            }
            AltKind::Juxtapose { split } => {
                let head = self.node(i, *split, Requirement::Head)?;
                let arg = self.node(*split, j, Requirement::Argument)?;
                let span = self.span(i, j);
                Ok(match head {
                    ParseNode::Application { head, mut args, .. } => {
                        args.push(arg);
                        ParseNode::Application { head, args, span }
                    }
                    head => ParseNode::Application {
                        head: Box::new(head),
                        args: vec![arg],
                        span,
                    },
                })
            }
        }
    }
}

/// Operators whose operands were only admitted because their categories
/// are incomparable. `chart` must be built in relaxed mode.
pub(crate) fn contested(chart: &Chart<'_>) -> Vec<Competitor> {
    let extractor = Extractor::new(chart);
    let mut visited = HashSet::new();
    let mut found = Vec::new();
    collect_contested(
        &extractor,
        0,
        chart.len(),
        Requirement::Any,
        &mut visited,
        &mut found,
    );
    normalize(found)
}

fn collect_contested(
    ex: &Extractor<'_, '_>,
    i: usize,
    j: usize,
    req: Requirement,
    visited: &mut HashSet<(usize, usize, Requirement)>,
    found: &mut Vec<Competitor>,
) {
    if !visited.insert((i, j, req)) {
        return;
    }
    let grammar = ex.grammar();
    for alternative in ex.chart.admitted(i, j, req) {
        match &alternative.kind {
            AltKind::Atom(_) => {}
            AltKind::Group { open, close } => {
                collect_contested(ex, open + 1, *close, Requirement::Any, visited, found)
            }
            AltKind::Juxtapose { split } => {
                collect_contested(ex, i, *split, Requirement::Head, visited, found);
                collect_contested(ex, *split, j, Requirement::Argument, visited, found);
            }
            AltKind::Operator(m) => {
                let Some(compiled) = grammar.compiled(m.op) else {
                    continue;
                };
                for (&(a, b), hole) in m.holes.iter().zip(compiled.requirements()) {
                    for child in ex.chart.admitted(a, b, hole) {
                        if grammar.admits(hole, child.tier, Mode::Strict) {
                            continue;
                        }
                        found.push(ex.competitor(m));
                        if let AltKind::Operator(inner) = &child.kind {
                            found.push(ex.competitor(inner));
                        }
                    }
                    collect_contested(ex, a, b, hole, visited, found);
                }
            }
        }
    }
}

/// Deduplicate and order competitors by position
pub(crate) fn normalize(mut competitors: Vec<Competitor>) -> Vec<Competitor> {
    competitors.sort_by_key(|c| (c.span.start.offset, c.span.end.offset, c.operator));
    competitors.dedup_by(|a, b| a.operator == b.operator && a.span == b.span);
    competitors
}

/// Explain a strict chart with no derivation for the whole input: point at
/// the first token after the longest parseable prefix.
pub(crate) fn diagnose(chart: &Chart<'_>) -> ParseError {
    let tokens = chart.tokens;
    let n = tokens.len();
    let prefix = (1..n)
        .rev()
        .find(|&k| chart.admits(0, k, Requirement::Any));

    match prefix {
        Some(k) => {
            let token = &tokens[k];
            let reason = match token.kind {
                TokenKind::Identifier | TokenKind::Numeral if chart.cell(k, k + 1).is_empty() => {
                    format!("unexpected '{}'", token.text)
                }
                TokenKind::Identifier | TokenKind::Numeral | TokenKind::OpenParen => format!(
                    "no operator connects the expression to '{}'",
                    token.text
                ),
                TokenKind::Keyword => format!("operator '{}' is missing an operand", token.text),
                _ => format!("unexpected '{}'", token.text),
            };
            ParseError::NoParse {
                reason,
                span: span_of(&tokens[k..]),
            }
        }
        None => {
            let reason = match tokens.last() {
                Some(last) if last.kind == TokenKind::Keyword && n > 1 => {
                    format!("operator '{}' is missing an operand", last.text)
                }
                _ => format!("expression cannot start with '{}'", tokens[0].text),
            };
            ParseError::NoParse {
                reason,
                span: span_of(tokens),
            }
        }
    }
}
