//! Grammar compilation
//!
//! Turns an operator table into what the chart parser consumes: for every
//! operator a sequence of parts where each placeholder carries the
//! tightness requirement its operand must satisfy, plus per-category
//! admission sets and members, and the visible operators of every scope.
//! Nothing is computed lazily, so parsing shares a grammar without locks.

use smallvec::SmallVec;
use std::collections::HashMap;
use std::sync::Arc;

use crate::frontend::category::{BitSet, CategoryGraph, CategoryId};
use crate::frontend::registry::{
    FormPart, Operator, OperatorId, OperatorTable, ScopeId, Shape, Tightness,
};

/// What a placeholder accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Requirement {
    /// Any expression (interior placeholders, whole expressions, groups)
    Any,
    /// Operator category at most as weak as the given one
    AtMost(CategoryId),
    /// Operator category strictly tighter than the given one
    Below(CategoryId),
    /// Function position of an application
    Head,
    /// Argument position of an application
    Argument,
}

/// Binding level of a chart alternative
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    /// Atoms, parenthesised groups and closed operators
    Primary,
    /// Juxtaposition of primaries
    Application,
    /// Result of an open operator of this category
    Category(CategoryId),
}

/// How strictly tightness is enforced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Incomparable categories are rejected
    Strict,
    /// Incomparable categories are accepted; used to explain failures
    Relaxed,
}

/// Operator form as the matcher sees it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
    Keyword(String),
    Hole(Requirement),
    Params,
}

#[derive(Debug, Clone)]
pub struct CompiledOperator {
    pub id: OperatorId,
    pub parts: Vec<Part>,
    pub tier: Tier,
    pub leading_hole: bool,
}

impl CompiledOperator {
    /// Requirements of the placeholders in form order
    pub fn requirements(&self) -> impl Iterator<Item = Requirement> + '_ {
        self.parts.iter().filter_map(|part| match part {
            Part::Hole(req) => Some(*req),
            _ => None,
        })
    }
}

/// Compiled grammar for one snapshot
#[derive(Debug)]
pub struct Grammar {
    table: Arc<OperatorTable>,
    operators: Vec<CompiledOperator>,
    /// Every keyword text -> operators that use it anywhere in their form
    keywords: HashMap<String, Vec<OperatorId>>,
    /// `at_most[c]`: categories at most as weak as `c`
    at_most: Vec<BitSet>,
    /// `by_category[c]`: operators declared in `c`, in declaration order
    by_category: Vec<SmallVec<[OperatorId; 4]>>,
    /// `visible[s]`: operators visible from scope `s`
    visible: Vec<Arc<BitSet>>,
    /// Pronounceable operators, the only ones visible from an unknown scope
    pronounceable: Arc<BitSet>,
}

impl Grammar {
    pub fn compile(table: Arc<OperatorTable>) -> Self {
        let graph = table.categories();
        let operators: Vec<CompiledOperator> = table.operators().iter().map(compile_operator).collect();

        let mut keywords: HashMap<String, Vec<OperatorId>> = HashMap::new();
        for op in table.operators() {
            for keyword in op.keywords() {
                let users = keywords.entry(keyword.to_string()).or_default();
                if !users.contains(&op.id) {
                    users.push(op.id);
                }
            }
        }

        let at_most = graph
            .iter()
            .map(|category| {
                let mut set = graph.closure().row(category.id).cloned().unwrap_or_default();
                set.insert(category.id.index());
                set
            })
            .collect();

        let mut by_category: Vec<SmallVec<[OperatorId; 4]>> = vec![SmallVec::new(); graph.len()];
        for op in table.operators() {
            if let Some(members) = by_category.get_mut(op.category.index()) {
                members.push(op.id);
            }
        }

        let visible: Vec<Arc<BitSet>> = table
            .scopes()
            .map(|scope| {
                let mut set = BitSet::with_capacity(operators.len());
                for op in table.operators() {
                    if table.is_visible(op.id, scope) {
                        set.insert(op.id.index());
                    }
                }
                Arc::new(set)
            })
            .collect();

        let mut pronounceable = BitSet::with_capacity(operators.len());
        for op in table.operators().iter().filter(|op| op.pronounceable) {
            pronounceable.insert(op.id.index());
        }

        tracing::debug!(
            operators = operators.len(),
            categories = graph.len(),
            scopes = visible.len(),
            generation = table.generation(),
            "compiled grammar"
        );

        Self {
            table,
            operators,
            keywords,
            at_most,
            by_category,
            visible,
            pronounceable: Arc::new(pronounceable),
        }
    }

    pub fn table(&self) -> &OperatorTable {
        &self.table
    }

    pub fn categories(&self) -> &CategoryGraph {
        self.table.categories()
    }

    pub fn compiled(
        &self,
        id: OperatorId,
    ) -> Option<&CompiledOperator> {
        self.operators.get(id.index())
    }

    pub fn operator(
        &self,
        id: OperatorId,
    ) -> Option<&Operator> {
        self.table.operator(id)
    }

    /// Operators whose first keyword is `text`
    pub fn lookup(
        &self,
        text: &str,
    ) -> &[OperatorId] {
        self.table.lookup(text)
    }

    /// Operators using `text` as any of their keywords
    pub fn keyword_users(
        &self,
        text: &str,
    ) -> &[OperatorId] {
        self.keywords.get(text).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_keyword(
        &self,
        text: &str,
    ) -> bool {
        self.keywords.contains_key(text)
    }

    /// Operators declared in `category`
    pub fn members(
        &self,
        category: CategoryId,
    ) -> &[OperatorId] {
        self.by_category
            .get(category.index())
            .map(SmallVec::as_slice)
            .unwrap_or(&[])
    }

    /// Operators visible from `scope`
    pub fn visible(
        &self,
        scope: ScopeId,
    ) -> Arc<BitSet> {
        Arc::clone(
            self.visible
                .get(scope.0 as usize)
                .unwrap_or(&self.pronounceable),
        )
    }

    /// Whether an alternative of `tier` may fill a placeholder with `req`
    pub fn admits(
        &self,
        req: Requirement,
        tier: Tier,
        mode: Mode,
    ) -> bool {
        match (req, tier) {
            (Requirement::Head, Tier::Primary | Tier::Application) => true,
            (Requirement::Head, Tier::Category(_)) => false,
            (Requirement::Argument, Tier::Primary) => true,
            (Requirement::Argument, _) => false,
            (_, Tier::Primary | Tier::Application) => true,
            (Requirement::Any, Tier::Category(_)) => true,
            (Requirement::AtMost(bound), Tier::Category(actual)) => {
                self.at_most(actual, bound)
                    || (mode == Mode::Relaxed && !self.categories().tighter_than(bound, actual))
            }
            (Requirement::Below(bound), Tier::Category(actual)) => {
                self.categories().tighter_than(actual, bound)
                    || (mode == Mode::Relaxed
                        && actual != bound
                        && !self.categories().tighter_than(bound, actual))
            }
        }
    }

    fn at_most(
        &self,
        actual: CategoryId,
        bound: CategoryId,
    ) -> bool {
        self.at_most
            .get(bound.index())
            .is_some_and(|set| set.contains(actual.index()))
    }
}

fn compile_operator(op: &Operator) -> CompiledOperator {
    let last = op.form.len().saturating_sub(1);
    let parts = op
        .form
        .iter()
        .enumerate()
        .map(|(index, part)| match part {
            FormPart::Keyword(text) => Part::Keyword(text.clone()),
            FormPart::Params(_) => Part::Params,
            FormPart::Placeholder(_) if index == 0 => Part::Hole(outer(op.category, op.left)),
            FormPart::Placeholder(_) if index == last => Part::Hole(outer(op.category, op.right)),
            FormPart::Placeholder(_) => Part::Hole(Requirement::Any),
        })
        .collect();

    let tier = match op.shape {
        Shape::Closed => Tier::Primary,
        _ => Tier::Category(op.category),
    };

    CompiledOperator {
        id: op.id,
        parts,
        tier,
        leading_hole: op.has_leading_hole(),
    }
}

fn outer(
    category: CategoryId,
    tightness: Option<Tightness>,
) -> Requirement {
    match tightness {
        Some(Tightness::Strict) => Requirement::Below(category),
        Some(Tightness::Same) | None => Requirement::AtMost(category),
    }
}
