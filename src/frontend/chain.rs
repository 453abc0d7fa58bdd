//! Chain rewriting
//!
//! Infix operators of a category with a chain policy do not associate;
//! `a < b <= c` has several chart derivations that all end in the same
//! category. When that happens the span is re-read as a flat run
//! `x0 r1 x1 ... rn xn` whose operands are strictly tighter than the
//! category. Exactly one such segmentation becomes a [`ParseNode::Chain`];
//! anything else is reported as ambiguous.

use smallvec::SmallVec;

use crate::frontend::category::CategoryId;
use crate::frontend::grammar::{CompiledOperator, Requirement};
use crate::frontend::parser::chart::{AltKind, Alternative, MiddleMatch};
use crate::frontend::parser::extract::{normalize, Extractor};
use crate::frontend::parser::{params, Competitor, ParseError};
use crate::frontend::registry::Shape;
use crate::frontend::tree::{ParseNode, Relation};

/// Resolve a cell with several admitted alternatives
pub(crate) fn rewrite(
    ex: &Extractor<'_, '_>,
    i: usize,
    j: usize,
    alternatives: &[&Alternative],
) -> Result<ParseNode, ParseError> {
    if let Some(category) = shared_chain_category(ex, alternatives) {
        if let Some(node) = segment(ex, i, j, category)? {
            return Ok(node);
        }
    }
    Err(ambiguity(ex, i, j, alternatives))
}

/// The category all alternatives are infix operators of, if it chains
fn shared_chain_category(
    ex: &Extractor<'_, '_>,
    alternatives: &[&Alternative],
) -> Option<CategoryId> {
    let grammar = ex.grammar();
    let mut category = None;
    for alternative in alternatives {
        let AltKind::Operator(m) = &alternative.kind else {
            return None;
        };
        let op = grammar.operator(m.op)?;
        if op.shape != Shape::Infix || category.is_some_and(|c| c != op.category) {
            return None;
        }
        category = Some(op.category);
    }
    let category = category?;
    grammar.categories().get(category)?.chain?;
    Some(category)
}

enum Back<'g> {
    Start,
    Link {
        from: usize,
        op: &'g CompiledOperator,
        middle: MiddleMatch,
    },
}

/// Count segmentations of `i..j` into operands joined by relations of
/// `category`, keeping one back pointer per end position. Counts saturate
/// at 2 since only "exactly one" matters.
fn segment(
    ex: &Extractor<'_, '_>,
    i: usize,
    j: usize,
    category: CategoryId,
) -> Result<Option<ParseNode>, ParseError> {
    let chart = ex.chart;
    let grammar = ex.grammar();
    let below = Requirement::Below(category);
    let relations: Vec<&CompiledOperator> = grammar
        .members(category)
        .iter()
        .filter(|id| chart.is_visible(**id))
        .filter(|id| grammar.operator(**id).is_some_and(|op| op.shape == Shape::Infix))
        .filter_map(|id| grammar.compiled(*id))
        .collect();

    let width = j - i + 1;
    let mut ways = vec![0u8; width];
    let mut back: Vec<Option<Back<'_>>> = (0..width).map(|_| None).collect();

    for p in i + 1..=j {
        let mut count = 0u8;
        if chart.admits(i, p, below) {
            count = 1;
            back[p - i] = Some(Back::Start);
        }
        for from in i + 1..p {
            let reach = ways[from - i];
            if reach == 0 {
                continue;
            }
            for &op in &relations {
                let Some(middle) = chart.match_middle(op, from, p) else {
                    continue;
                };
                if middle.next < p && chart.admits(middle.next, p, below) {
                    count = count.saturating_add(reach).min(2);
                    back[p - i] = Some(Back::Link { from, op, middle });
                }
            }
        }
        ways[p - i] = count;
    }

    if ways[j - i] != 1 {
        return Ok(None);
    }

    // Walk the back pointers from the end
    let mut operand_spans = Vec::new();
    let mut links = Vec::new();
    let mut p = j;
    loop {
        match back[p - i].take() {
            Some(Back::Start) => {
                operand_spans.push((i, p));
                break;
            }
            Some(Back::Link { from, op, middle }) => {
                operand_spans.push((middle.next, p));
                links.push((op, middle));
                p = from;
            }
            None => return Ok(None),
        }
    }
    if links.len() < 2 {
        return Ok(None);
    }
    operand_spans.reverse();
    links.reverse();

    let operands = operand_spans
        .into_iter()
        .map(|(a, b)| ex.node(a, b, below))
        .collect::<Result<Vec<_>, _>>()?;
    let relations = links
        .into_iter()
        .map(|(op, middle)| relation(ex, op, &middle))
        .collect::<Result<Vec<_>, _>>()?;
    let Some(policy) = grammar.categories().get(category).and_then(|c| c.chain) else {
        return Ok(None);
    };

    tracing::trace!(
        category = %grammar.categories().name(category),
        operands = operands.len(),
        "folded chain"
    );
    Ok(Some(ParseNode::Chain {
        category,
        combinator: policy.combinator,
        operands,
        relations,
        span: ex.span(i, j),
    }))
}

fn relation(
    ex: &Extractor<'_, '_>,
    op: &CompiledOperator,
    middle: &MiddleMatch,
) -> Result<Relation, ParseError> {
    let tokens = ex.chart.tokens;
    let span = middle
        .keywords
        .iter()
        .fold(crate::util::span::Span::dummy(), |acc, k| {
            acc.merge(tokens[*k].span)
        });
    let params = match ex.grammar().operator(op.id) {
        Some(definition) => params::bind(definition, middle.params, tokens, span)?,
        None => Default::default(),
    };
    Ok(Relation {
        operator: op.id,
        params,
        span,
    })
}

fn ambiguity(
    ex: &Extractor<'_, '_>,
    i: usize,
    j: usize,
    alternatives: &[&Alternative],
) -> ParseError {
    let span = ex.span(i, j);
    let competitors: SmallVec<[Competitor; 4]> = alternatives
        .iter()
        .map(|alternative| match &alternative.kind {
            AltKind::Operator(m) => ex.competitor(m),
            _ => Competitor {
                operator: None,
                name: "application".to_string(),
                span,
            },
        })
        .collect();
    ParseError::AmbiguousExpression {
        competitors: normalize(competitors.into_vec()),
        span,
    }
}
