//! Parse trees
//!
//! [`ParseNode`] is the only output of a successful parse. Nodes refer to
//! operators by handle, so rendering needs the [`OperatorTable`] the tree
//! was parsed against.

use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

use crate::frontend::category::CategoryId;
use crate::frontend::registry::{FormPart, Operator, OperatorId, OperatorTable, Shape};
use crate::frontend::tokens::Token;
use crate::util::span::Span;

/// Bound value of an inner parameter
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ParamValue {
    /// Written in the bracket list
    Supplied(Vec<Token>),
    /// Taken from the declaration
    Default(Vec<String>),
}

impl ParamValue {
    pub fn texts(&self) -> Vec<&str> {
        match self {
            ParamValue::Supplied(tokens) => tokens.iter().map(|t| t.text.as_str()).collect(),
            ParamValue::Default(values) => values.iter().map(String::as_str).collect(),
        }
    }

    pub fn is_default(&self) -> bool {
        matches!(self, ParamValue::Default(_))
    }
}

/// Parameter name -> bound value, in declaration order
pub type ParamMap = IndexMap<String, ParamValue>;

/// One relation of a chain, with its own parameters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Relation {
    pub operator: OperatorId,
    pub params: ParamMap,
    pub span: Span,
}

/// Parse tree node
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ParseNode {
    Atom(Token),
    Apply {
        operator: OperatorId,
        operands: Vec<ParseNode>,
        params: ParamMap,
        span: Span,
    },
    /// `x0 r1 x1 ... rn xn` for a chain-enabled category
    Chain {
        category: CategoryId,
        combinator: OperatorId,
        operands: Vec<ParseNode>,
        relations: Vec<Relation>,
        span: Span,
    },
    /// Juxtaposition `f x y`
    Application {
        head: Box<ParseNode>,
        args: Vec<ParseNode>,
        span: Span,
    },
}

impl ParseNode {
    pub fn span(&self) -> Span {
        match self {
            ParseNode::Atom(token) => token.span,
            ParseNode::Apply { span, .. }
            | ParseNode::Chain { span, .. }
            | ParseNode::Application { span, .. } => *span,
        }
    }

    /// Equality ignoring source locations
    pub fn same_structure(
        &self,
        other: &ParseNode,
    ) -> bool {
        match (self, other) {
            (ParseNode::Atom(a), ParseNode::Atom(b)) => a.kind == b.kind && a.text == b.text,
            (
                ParseNode::Apply {
                    operator: op_a,
                    operands: xs,
                    params: pa,
                    ..
                },
                ParseNode::Apply {
                    operator: op_b,
                    operands: ys,
                    params: pb,
                    ..
                },
            ) => op_a == op_b && all_same(xs, ys) && same_params(pa, pb),
            (
                ParseNode::Chain {
                    category: ca,
                    combinator: ka,
                    operands: xs,
                    relations: ra,
                    ..
                },
                ParseNode::Chain {
                    category: cb,
                    combinator: kb,
                    operands: ys,
                    relations: rb,
                    ..
                },
            ) => {
                ca == cb
                    && ka == kb
                    && all_same(xs, ys)
                    && ra.len() == rb.len()
                    && ra
                        .iter()
                        .zip(rb)
                        .all(|(a, b)| a.operator == b.operator && same_params(&a.params, &b.params))
            }
            (
                ParseNode::Application {
                    head: ha,
                    args: xs,
                    ..
                },
                ParseNode::Application {
                    head: hb,
                    args: ys,
                    ..
                },
            ) => ha.same_structure(hb) && all_same(xs, ys),
            _ => false,
        }
    }

    /// S-expression view: `(+ (! n))`, `(~~ a b {tension: 1.5 1})`
    pub fn sexp<'a>(
        &'a self,
        table: &'a OperatorTable,
    ) -> Sexp<'a> {
        Sexp { node: self, table }
    }

    /// Source text that parses back to a tree with the same structure.
    /// Compound operands are parenthesised; parameters are always labeled.
    pub fn to_source(
        &self,
        table: &OperatorTable,
    ) -> String {
        let mut words = Vec::new();
        print_node(self, table, &mut words);
        words.join(" ")
    }

    /// Replace every chain by pairwise relation applications folded
    /// left-nested with the chain's combinator:
    /// `a < b < c` becomes `(and (< a b) (< b c))`.
    pub fn desugar_chains(
        &self,
        table: &OperatorTable,
    ) -> ParseNode {
        match self {
            ParseNode::Atom(_) => self.clone(),
            ParseNode::Apply {
                operator,
                operands,
                params,
                span,
            } => ParseNode::Apply {
                operator: *operator,
                operands: operands.iter().map(|x| x.desugar_chains(table)).collect(),
                params: params.clone(),
                span: *span,
            },
            ParseNode::Application { head, args, span } => ParseNode::Application {
                head: Box::new(head.desugar_chains(table)),
                args: args.iter().map(|x| x.desugar_chains(table)).collect(),
                span: *span,
            },
            ParseNode::Chain {
                combinator,
                operands,
                relations,
                span,
                ..
            } => {
                let operands: Vec<ParseNode> =
                    operands.iter().map(|x| x.desugar_chains(table)).collect();
                let pairs: Vec<ParseNode> = relations
                    .iter()
                    .zip(operands.windows(2))
                    .map(|(rel, pair)| ParseNode::Apply {
                        operator: rel.operator,
                        span: pair[0].span().merge(pair[1].span()),
                        operands: pair.to_vec(),
                        params: rel.params.clone(),
                    })
                    .collect();
                let mut pairs = pairs.into_iter();
                let Some(first) = pairs.next() else {
                    return operands.into_iter().next().unwrap_or_else(|| self.clone());
                };
                let combinator_params = default_params(table.operator(*combinator));
                pairs.fold(first, |acc, next| ParseNode::Apply {
                    operator: *combinator,
                    span: acc.span().merge(next.span()).merge(*span),
                    operands: vec![acc, next],
                    params: combinator_params.clone(),
                })
            }
        }
    }
}

fn all_same(
    xs: &[ParseNode],
    ys: &[ParseNode],
) -> bool {
    xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| x.same_structure(y))
}

fn same_params(
    a: &ParamMap,
    b: &ParamMap,
) -> bool {
    a.len() == b.len()
        && a.iter().zip(b).all(|((ka, va), (kb, vb))| {
            ka == kb && va.is_default() == vb.is_default() && va.texts() == vb.texts()
        })
}

/// Declared defaults of an operator's parameters
pub(crate) fn default_params(op: Option<&Operator>) -> ParamMap {
    op.and_then(|op| op.params())
        .map(|spec| {
            spec.slots
                .iter()
                .filter_map(|slot| {
                    slot.default
                        .clone()
                        .map(|values| (slot.name.clone(), ParamValue::Default(values)))
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Display adapter returned by [`ParseNode::sexp`]
pub struct Sexp<'a> {
    node: &'a ParseNode,
    table: &'a OperatorTable,
}

impl fmt::Display for Sexp<'_> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let table = self.table;
        match self.node {
            ParseNode::Atom(token) => write!(f, "{}", token.text),
            ParseNode::Apply {
                operator,
                operands,
                params,
                ..
            } => {
                write!(f, "({}", table.operator_name(*operator))?;
                for operand in operands {
                    write!(f, " {}", operand.sexp(table))?;
                }
                if !params.is_empty() {
                    write!(f, " {}", SexpParams(params))?;
                }
                write!(f, ")")
            }
            ParseNode::Chain {
                combinator,
                operands,
                relations,
                ..
            } => {
                write!(f, "(chain {}", table.operator_name(*combinator))?;
                for (index, operand) in operands.iter().enumerate() {
                    if index > 0 {
                        if let Some(relation) = relations.get(index - 1) {
                            write!(f, " {}", table.operator_name(relation.operator))?;
                            if !relation.params.is_empty() {
                                write!(f, "{}", SexpParams(&relation.params))?;
                            }
                        }
                    }
                    write!(f, " {}", operand.sexp(table))?;
                }
                write!(f, ")")
            }
            ParseNode::Application { head, args, .. } => {
                write!(f, "(apply {}", head.sexp(table))?;
                for arg in args {
                    write!(f, " {}", arg.sexp(table))?;
                }
                write!(f, ")")
            }
        }
    }
}

struct SexpParams<'a>(&'a ParamMap);

impl fmt::Display for SexpParams<'_> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let entries: Vec<String> = self
            .0
            .iter()
            .map(|(name, value)| format!("{}: {}", name, value.texts().join(" ")))
            .collect();
        write!(f, "{{{}}}", entries.join(", "))
    }
}

fn is_compound(
    node: &ParseNode,
    table: &OperatorTable,
) -> bool {
    match node {
        ParseNode::Atom(_) => false,
        ParseNode::Apply { operator, .. } => table
            .operator(*operator)
            .map_or(true, |op| op.shape != Shape::Closed),
        ParseNode::Chain { .. } | ParseNode::Application { .. } => true,
    }
}

fn print_operand(
    node: &ParseNode,
    table: &OperatorTable,
    words: &mut Vec<String>,
) {
    if is_compound(node, table) {
        words.push("(".to_string());
        print_node(node, table, words);
        words.push(")".to_string());
    } else {
        print_node(node, table, words);
    }
}

fn print_params(
    params: &ParamMap,
    words: &mut Vec<String>,
) {
    let supplied: Vec<(&String, &Vec<Token>)> = params
        .iter()
        .filter_map(|(name, value)| match value {
            ParamValue::Supplied(tokens) => Some((name, tokens)),
            ParamValue::Default(_) => None,
        })
        .collect();
    if supplied.is_empty() {
        return;
    }
    words.push("[".to_string());
    for (index, (name, tokens)) in supplied.into_iter().enumerate() {
        if index > 0 {
            words.push(",".to_string());
        }
        words.push(name.clone());
        words.push(":".to_string());
        for (position, token) in tokens.iter().enumerate() {
            if position > 0 {
                words.push(",".to_string());
            }
            words.push(token.text.clone());
        }
    }
    words.push("]".to_string());
}

/// Keywords and parameter list between the two operands of an infix form
fn print_infix_middle(
    op: &Operator,
    params: &ParamMap,
    words: &mut Vec<String>,
) {
    for part in &op.form {
        match part {
            FormPart::Keyword(text) => words.push(text.clone()),
            FormPart::Params(_) => print_params(params, words),
            FormPart::Placeholder(_) => {}
        }
    }
}

fn print_node(
    node: &ParseNode,
    table: &OperatorTable,
    words: &mut Vec<String>,
) {
    match node {
        ParseNode::Atom(token) => words.push(token.text.clone()),
        ParseNode::Apply {
            operator,
            operands,
            params,
            ..
        } => {
            let Some(op) = table.operator(*operator) else {
                return;
            };
            let mut operands = operands.iter();
            for part in &op.form {
                match part {
                    FormPart::Keyword(text) => words.push(text.clone()),
                    FormPart::Params(_) => print_params(params, words),
                    FormPart::Placeholder(_) => {
                        if let Some(operand) = operands.next() {
                            print_operand(operand, table, words);
                        }
                    }
                }
            }
        }
        ParseNode::Chain {
            operands,
            relations,
            ..
        } => {
            for (index, operand) in operands.iter().enumerate() {
                if index > 0 {
                    if let Some(relation) = relations.get(index - 1) {
                        if let Some(op) = table.operator(relation.operator) {
                            print_infix_middle(op, &relation.params, words);
                        }
                    }
                }
                print_operand(operand, table, words);
            }
        }
        ParseNode::Application { head, args, .. } => {
            print_operand(head, table, words);
            for arg in args {
                print_operand(arg, table, words);
            }
        }
    }
}
