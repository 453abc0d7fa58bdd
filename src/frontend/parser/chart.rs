//! Span chart
//!
//! Cell `(i, j)` holds every local way the tokens `i..j` can form one
//! expression. Cells are filled bottom-up by span length, so an operator
//! match only consults strictly shorter spans for its operands. Each
//! alternative records its tier; whether it may fill a placeholder is a
//! question asked of the grammar, memoised per `(span, requirement)`.

use smallvec::SmallVec;
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

use crate::frontend::category::BitSet;
use crate::frontend::grammar::{CompiledOperator, Grammar, Mode, Part, Requirement, Tier};
use crate::frontend::registry::OperatorId;
use crate::frontend::tokens::{Token, TokenKind};

/// A complete match of one operator over a span
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct OperatorMatch {
    pub op: OperatorId,
    /// Operand spans in form order
    pub holes: SmallVec<[(usize, usize); 3]>,
    /// Token indices of the matched keywords
    pub keywords: SmallVec<[usize; 3]>,
    /// Bracket indices of the inner-parameter list, if written
    pub params: Option<(usize, usize)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum AltKind {
    Atom(usize),
    /// `( ... )`; the content spans `open + 1 .. close`
    Group { open: usize, close: usize },
    Operator(OperatorMatch),
    /// Head spans `i .. split`, argument `split .. j`
    Juxtapose { split: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Alternative {
    pub tier: Tier,
    pub kind: AltKind,
}

/// Keyword run of an infix operator matched between two operands
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MiddleMatch {
    pub next: usize,
    pub keywords: SmallVec<[usize; 3]>,
    pub params: Option<(usize, usize)>,
}

#[derive(Default)]
struct Partial {
    holes: SmallVec<[(usize, usize); 3]>,
    keywords: SmallVec<[usize; 3]>,
    params: Option<(usize, usize)>,
}

pub(crate) struct Chart<'g> {
    pub grammar: &'g Grammar,
    pub tokens: &'g [Token],
    pub mode: Mode,
    partner: &'g [Option<usize>],
    visible: Arc<BitSet>,
    juxtaposition: bool,
    cells: Vec<Vec<Alternative>>,
    memo: RefCell<HashMap<(usize, usize, Requirement), bool>>,
}

impl<'g> Chart<'g> {
    pub fn build(
        grammar: &'g Grammar,
        tokens: &'g [Token],
        partner: &'g [Option<usize>],
        visible: Arc<BitSet>,
        mode: Mode,
        juxtaposition: bool,
    ) -> Self {
        let n = tokens.len();
        let mut chart = Self {
            grammar,
            tokens,
            mode,
            partner,
            visible,
            juxtaposition,
            cells: vec![Vec::new(); (n + 1) * (n + 1)],
            memo: RefCell::new(HashMap::new()),
        };

        for len in 1..=n {
            for i in 0..=n - len {
                let j = i + len;
                let alternatives = chart.fill(i, j);
                let index = chart.index(i, j);
                chart.cells[index] = alternatives;
            }
        }

        tracing::trace!(
            tokens = n,
            mode = ?mode,
            alternatives = chart.cells.iter().map(Vec::len).sum::<usize>(),
            "chart built"
        );
        chart
    }

    #[inline]
    fn index(
        &self,
        i: usize,
        j: usize,
    ) -> usize {
        i * (self.tokens.len() + 1) + j
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// All alternatives of a cell
    pub fn cell(
        &self,
        i: usize,
        j: usize,
    ) -> &[Alternative] {
        self.cells
            .get(self.index(i, j))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Alternatives of a cell that `req` accepts under the chart's mode
    pub fn admitted(
        &self,
        i: usize,
        j: usize,
        req: Requirement,
    ) -> impl Iterator<Item = &Alternative> + '_ {
        self.cell(i, j)
            .iter()
            .filter(move |alt| self.grammar.admits(req, alt.tier, self.mode))
    }

    /// Whether any alternative of `(i, j)` satisfies `req`
    pub fn admits(
        &self,
        i: usize,
        j: usize,
        req: Requirement,
    ) -> bool {
        if i >= j {
            return false;
        }
        if let Some(&known) = self.memo.borrow().get(&(i, j, req)) {
            return known;
        }
        let result = self.admitted(i, j, req).next().is_some();
        self.memo.borrow_mut().insert((i, j, req), result);
        result
    }

    pub fn is_visible(
        &self,
        op: OperatorId,
    ) -> bool {
        self.visible.contains(op.index())
    }

    /// Token `k` spells keyword `text`
    fn keyword_at(
        &self,
        k: usize,
        text: &str,
    ) -> bool {
        self.tokens
            .get(k)
            .is_some_and(|t| t.kind.is_keyword_like() && t.text == text)
    }

    /// Identifiers and numerals stand alone unless they spell a keyword of
    /// a visible operator
    fn is_atom(
        &self,
        k: usize,
    ) -> bool {
        let token = &self.tokens[k];
        token.kind.is_atomic()
            && !self
                .grammar
                .keyword_users(&token.text)
                .iter()
                .any(|op| self.is_visible(*op))
    }

    fn fill(
        &self,
        i: usize,
        j: usize,
    ) -> Vec<Alternative> {
        let mut out = Vec::new();

        if j - i == 1 && self.is_atom(i) {
            out.push(Alternative {
                tier: Tier::Primary,
                kind: AltKind::Atom(i),
            });
        }

        if j - i >= 3
            && self.tokens[i].kind == TokenKind::OpenParen
            && self.partner[i] == Some(j - 1)
            && self.admits(i + 1, j - 1, Requirement::Any)
        {
            out.push(Alternative {
                tier: Tier::Primary,
                kind: AltKind::Group {
                    open: i,
                    close: j - 1,
                },
            });
        }

        for op in self.candidates(i, j) {
            if let Some(compiled) = self.grammar.compiled(op) {
                let mut partial = Partial::default();
                self.match_parts(compiled, 0, i, j, &mut partial, &mut out);
            }
        }

        if self.juxtaposition {
            for split in i + 1..j {
                if self.admits(i, split, Requirement::Head)
                    && self.admits(split, j, Requirement::Argument)
                {
                    out.push(Alternative {
                        tier: Tier::Application,
                        kind: AltKind::Juxtapose { split },
                    });
                }
            }
        }

        out
    }

    /// Visible operators whose first keyword occurs where a match over
    /// `(i, j)` could put it
    fn candidates(
        &self,
        i: usize,
        j: usize,
    ) -> SmallVec<[OperatorId; 8]> {
        let mut candidates = SmallVec::new();
        for k in i..j {
            let token = &self.tokens[k];
            if !token.kind.is_keyword_like() {
                continue;
            }
            for &op in self.grammar.lookup(&token.text) {
                let Some(compiled) = self.grammar.compiled(op) else {
                    continue;
                };
                let placed = if compiled.leading_hole { k > i } else { k == i };
                if placed && self.is_visible(op) && !candidates.contains(&op) {
                    candidates.push(op);
                }
            }
        }
        candidates
    }

    fn match_parts(
        &self,
        op: &CompiledOperator,
        part: usize,
        pos: usize,
        end: usize,
        acc: &mut Partial,
        out: &mut Vec<Alternative>,
    ) {
        match op.parts.get(part) {
            None => {
                if pos == end {
                    out.push(Alternative {
                        tier: op.tier,
                        kind: AltKind::Operator(OperatorMatch {
                            op: op.id,
                            holes: acc.holes.clone(),
                            keywords: acc.keywords.clone(),
                            params: acc.params,
                        }),
                    });
                }
            }
            Some(Part::Keyword(text)) => {
                if pos >= end || !self.keyword_at(pos, text) {
                    return;
                }
                acc.keywords.push(pos);
                if matches!(op.parts.get(part + 1), Some(Part::Params)) {
                    match self.param_list(pos + 1, end) {
                        Some(Some(bracket)) => {
                            acc.params = Some(bracket);
                            self.match_parts(op, part + 2, bracket.1 + 1, end, acc, out);
                            acc.params = None;
                        }
                        Some(None) => self.match_parts(op, part + 2, pos + 1, end, acc, out),
                        None => {}
                    }
                } else {
                    self.match_parts(op, part + 1, pos + 1, end, acc, out);
                }
                acc.keywords.pop();
            }
            Some(Part::Hole(req)) => {
                let req = *req;
                match op.parts.get(part + 1) {
                    None => {
                        if pos < end && self.admits(pos, end, req) {
                            acc.holes.push((pos, end));
                            self.match_parts(op, part + 1, end, end, acc, out);
                            acc.holes.pop();
                        }
                    }
                    Some(Part::Keyword(next)) => {
                        for q in pos + 1..end {
                            if self.keyword_at(q, next) && self.admits(pos, q, req) {
                                acc.holes.push((pos, q));
                                self.match_parts(op, part + 1, q, end, acc, out);
                                acc.holes.pop();
                            }
                        }
                    }
                    // a placeholder is always followed by a keyword or ends the form
                    Some(_) => {}
                }
            }
            Some(Part::Params) => self.match_parts(op, part + 1, pos, end, acc, out),
        }
    }

    /// Parameter list starting at `pos`: `Some(Some(bracket))` when a
    /// bracket list fits before `end`, `Some(None)` when none is written,
    /// `None` when a list is opened but does not close in range
    fn param_list(
        &self,
        pos: usize,
        end: usize,
    ) -> Option<Option<(usize, usize)>> {
        match self.tokens.get(pos) {
            Some(token) if pos < end && token.kind == TokenKind::OpenBracket => {
                match self.partner.get(pos).copied().flatten() {
                    Some(close) if close < end => Some(Some((pos, close))),
                    _ => None,
                }
            }
            _ => Some(None),
        }
    }

    /// Match the keywords (and parameter list) between the two operands of
    /// an infix operator, starting at `pos`
    pub fn match_middle(
        &self,
        op: &CompiledOperator,
        pos: usize,
        end: usize,
    ) -> Option<MiddleMatch> {
        let inner = op.parts.get(1..op.parts.len().saturating_sub(1))?;
        let mut next = pos;
        let mut keywords = SmallVec::new();
        let mut params = None;
        for part in inner {
            match part {
                Part::Keyword(text) => {
                    if next >= end || !self.keyword_at(next, text) {
                        return None;
                    }
                    keywords.push(next);
                    next += 1;
                }
                Part::Params => {
                    if let Some(bracket) = self.param_list(next, end)? {
                        params = Some(bracket);
                        next = bracket.1 + 1;
                    }
                }
                Part::Hole(_) => return None,
            }
        }
        Some(MiddleMatch {
            next,
            keywords,
            params,
        })
    }
}
