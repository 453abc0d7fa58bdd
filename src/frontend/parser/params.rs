//! Inner-parameter lists
//!
//! The bracket list after a parameterised keyword is a comma separated
//! sequence of `label : value` or bare `value` entries. A label opens its
//! slot and takes the next `arity` values; bare values fill the next unfilled
//! slot in declaration order. Omitted optional slots take their defaults.

use crate::frontend::registry::{Operator, ParamSpec};
use crate::frontend::tokens::{span_of, Token, TokenKind};
use crate::frontend::tree::{ParamMap, ParamValue};
use crate::util::span::Span;

use super::ParseError;

/// Bind the parameter list of `op`. `bracket` holds the indices of `[` and
/// `]` in `tokens`; `anchor` locates errors when no list was written.
pub(crate) fn bind(
    op: &Operator,
    bracket: Option<(usize, usize)>,
    tokens: &[Token],
    anchor: Span,
) -> Result<ParamMap, ParseError> {
    let Some(spec) = op.params() else {
        return Ok(ParamMap::new());
    };
    let binder = Binder { op, spec };

    let mut filled: Vec<Option<Vec<Token>>> = vec![None; spec.slots.len()];
    let mut anchor = anchor;
    if let Some((open, close)) = bracket {
        anchor = span_of(&tokens[open..=close]);
        let entries = binder.entries(&tokens[open + 1..close], anchor)?;
        binder.assign(entries, &mut filled)?;
    }

    spec.slots
        .iter()
        .zip(filled)
        .map(|(slot, value)| {
            let value = match (value, &slot.default) {
                (Some(tokens), _) => ParamValue::Supplied(tokens),
                (None, Some(default)) => ParamValue::Default(default.clone()),
                (None, None) => {
                    return Err(binder.arity(
                        format!("missing mandatory parameter '{}'", slot.name),
                        anchor,
                    ))
                }
            };
            Ok((slot.name.clone(), value))
        })
        .collect()
}

struct Entry<'t> {
    label: Option<&'t Token>,
    value: &'t Token,
}

struct Binder<'a> {
    op: &'a Operator,
    spec: &'a ParamSpec,
}

impl Binder<'_> {
    fn expected(&self) -> Vec<String> {
        self.spec.slots.iter().map(|s| s.name.clone()).collect()
    }

    fn arity(
        &self,
        reason: String,
        span: Span,
    ) -> ParseError {
        ParseError::ParameterArity {
            operator: self.op.name.clone(),
            reason,
            expected: self.expected(),
            span,
        }
    }

    /// Split the bracket contents into entries
    fn entries<'t>(
        &self,
        inner: &'t [Token],
        bracket: Span,
    ) -> Result<Vec<Entry<'t>>, ParseError> {
        let mut entries = Vec::new();
        if inner.is_empty() {
            return Ok(entries);
        }

        let mut k = 0;
        loop {
            let label = match (inner.get(k), inner.get(k + 1)) {
                (Some(name), Some(colon))
                    if name.kind == TokenKind::Identifier && colon.kind == TokenKind::Colon =>
                {
                    k += 2;
                    Some(name)
                }
                _ => None,
            };

            let Some(value) = inner.get(k) else {
                let reason = match label {
                    Some(name) => format!("expected a value after '{} :'", name.text),
                    None => "expected a value after ','".to_string(),
                };
                return Err(self.arity(reason, bracket));
            };
            if !value.kind.is_atomic() {
                return Err(self.arity(
                    format!("unexpected '{}' in parameter list", value.text),
                    value.span,
                ));
            }
            entries.push(Entry { label, value });
            k += 1;

            match inner.get(k) {
                None => break,
                Some(token) if token.kind == TokenKind::Comma => k += 1,
                Some(token) => {
                    return Err(self.arity(
                        format!("expected ',' before '{}'", token.text),
                        token.span,
                    ))
                }
            }
        }
        Ok(entries)
    }

    fn assign(
        &self,
        entries: Vec<Entry<'_>>,
        filled: &mut [Option<Vec<Token>>],
    ) -> Result<(), ParseError> {
        let slots = &self.spec.slots;
        let incomplete = |index: usize, filled: &[Option<Vec<Token>>]| {
            filled[index]
                .as_ref()
                .is_some_and(|values| values.len() < slots[index].arity)
        };
        let mut current: Option<usize> = None;

        for entry in entries {
            let slot = if let Some(label) = entry.label {
                if let Some(open) = current.filter(|c| incomplete(*c, &*filled)) {
                    return Err(self.short(open, filled, label.span));
                }
                let Some(index) = self.spec.find(&label.text) else {
                    return Err(ParseError::UnknownParameter {
                        operator: self.op.name.clone(),
                        label: label.text.clone(),
                        expected: self.expected(),
                        span: label.span,
                    });
                };
                if filled[index].is_some() {
                    return Err(self.arity(
                        format!("parameter '{}' is given more than once", label.text),
                        label.span,
                    ));
                }
                filled[index] = Some(Vec::new());
                index
            } else if let Some(open) = current.filter(|c| incomplete(*c, &*filled)) {
                open
            } else {
                let Some(index) = filled.iter().position(Option::is_none) else {
                    return Err(self.arity(
                        format!(
                            "too many values: {} parameter(s) already filled",
                            slots.len()
                        ),
                        entry.value.span,
                    ));
                };
                filled[index] = Some(Vec::new());
                index
            };

            current = Some(slot);
            if let Some(values) = filled[slot].as_mut() {
                values.push(entry.value.clone());
            }
        }

        match current {
            Some(open) if incomplete(open, &*filled) => {
                let span = filled[open]
                    .as_ref()
                    .map_or_else(Span::dummy, |values| span_of(values));
                Err(self.short(open, filled, span))
            }
            _ => Ok(()),
        }
    }

    fn short(
        &self,
        index: usize,
        filled: &[Option<Vec<Token>>],
        span: Span,
    ) -> ParseError {
        let slot = &self.spec.slots[index];
        let got = filled[index].as_ref().map_or(0, Vec::len);
        self.arity(
            format!(
                "parameter '{}' expects {} value(s), got {}",
                slot.name, slot.arity, got
            ),
            span,
        )
    }
}
