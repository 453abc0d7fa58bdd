//! Operator registry
//!
//! Holds the category graph, every declared operator and the scope tree
//! used for import visibility. Mutations go through [`Registry`]; parsing
//! works on an immutable [`Snapshot`] so declarations and parses never
//! interleave within one grammar.

mod error;
pub mod operator;

pub use error::RegistryError;
pub use operator::{
    FormPart, Operator, OperatorDefinition, ParamSlot, ParamSpec, Shape, Skeleton, Tightness,
};

use indexmap::{IndexMap, IndexSet};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::HashMap;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use crate::frontend::category::{CategoryGraph, CategoryId, ChainPolicy};
use crate::frontend::grammar::Grammar;

/// Operator handle, dense index into the table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OperatorId(pub(crate) u32);

impl OperatorId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Scope handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ScopeId(pub(crate) u32);

impl ScopeId {
    /// Scope every registry starts with
    pub const ROOT: ScopeId = ScopeId(0);
}

impl fmt::Display for ScopeId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "scope#{}", self.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Scope {
    parent: Option<ScopeId>,
    imports: IndexSet<OperatorId>,
}

/// Category declaration
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CategoryDeclaration {
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub tighter_than: Vec<String>,
    #[serde(default)]
    pub weaker_than: Vec<String>,
    /// Name of the infix operator joining chained relations
    #[serde(default)]
    pub chain: Option<String>,
}

impl CategoryDeclaration {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn label(
        mut self,
        label: impl Into<String>,
    ) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn tighter_than<I, S>(
        mut self,
        names: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tighter_than.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn weaker_than<I, S>(
        mut self,
        names: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.weaker_than.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn chain(
        mut self,
        combinator: impl Into<String>,
    ) -> Self {
        self.chain = Some(combinator.into());
        self
    }
}

/// Everything declared so far. Shared read-only between [`Registry`] and
/// its snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorTable {
    categories: CategoryGraph,
    operators: Vec<Operator>,
    by_name: IndexMap<String, OperatorId>,
    by_skeleton: HashMap<Skeleton, OperatorId>,
    /// First keyword text -> operators starting their keyword run with it
    dispatch: IndexMap<String, SmallVec<[OperatorId; 2]>>,
    scopes: Vec<Scope>,
    generation: u64,
}

impl Default for OperatorTable {
    fn default() -> Self {
        Self {
            categories: CategoryGraph::new(),
            operators: Vec::new(),
            by_name: IndexMap::new(),
            by_skeleton: HashMap::new(),
            dispatch: IndexMap::new(),
            scopes: vec![Scope::default()],
            generation: 0,
        }
    }
}

impl OperatorTable {
    pub fn categories(&self) -> &CategoryGraph {
        &self.categories
    }

    pub fn operators(&self) -> &[Operator] {
        &self.operators
    }

    pub fn operator(
        &self,
        id: OperatorId,
    ) -> Option<&Operator> {
        self.operators.get(id.index())
    }

    pub fn find_operator(
        &self,
        name: &str,
    ) -> Option<&Operator> {
        self.by_name.get(name).and_then(|id| self.operator(*id))
    }

    /// Operators whose first keyword is `text`
    pub fn lookup(
        &self,
        text: &str,
    ) -> &[OperatorId] {
        self.dispatch.get(text).map(|ids| ids.as_slice()).unwrap_or(&[])
    }

    /// Operator name, `?` for unknown handles
    pub fn operator_name(
        &self,
        id: OperatorId,
    ) -> &str {
        self.operator(id).map_or("?", |op| op.name.as_str())
    }

    /// Incremented by every successful declaration
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn has_scope(
        &self,
        scope: ScopeId,
    ) -> bool {
        (scope.0 as usize) < self.scopes.len()
    }

    /// Every declared scope, the root first
    pub fn scopes(&self) -> impl Iterator<Item = ScopeId> {
        (0..self.scopes.len() as u32).map(ScopeId)
    }

    pub fn scope_parent(
        &self,
        scope: ScopeId,
    ) -> Option<ScopeId> {
        self.scopes.get(scope.0 as usize).and_then(|s| s.parent)
    }

    /// Pronounceable operators are visible everywhere; symbolic ones only
    /// where the scope or one of its ancestors imports them.
    pub fn is_visible(
        &self,
        op: OperatorId,
        scope: ScopeId,
    ) -> bool {
        let Some(operator) = self.operator(op) else {
            return false;
        };
        if operator.pronounceable {
            return true;
        }
        let mut current = Some(scope);
        while let Some(id) = current {
            let Some(entry) = self.scopes.get(id.0 as usize) else {
                return false;
            };
            if entry.imports.contains(&op) {
                return true;
            }
            current = entry.parent;
        }
        false
    }
}

/// Mutable operator registry
#[derive(Debug, Default)]
pub struct Registry {
    table: Arc<OperatorTable>,
    snapshot: OnceCell<Snapshot>,
}

impl Deref for Registry {
    type Target = OperatorTable;

    fn deref(&self) -> &Self::Target {
        &self.table
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write access; copies the table only while a snapshot still shares it
    fn table_mut(&mut self) -> &mut OperatorTable {
        self.snapshot.take();
        Arc::make_mut(&mut self.table)
    }

    /// Declare a category, optionally with a chain policy whose combinator
    /// must be an existing infix operator.
    pub fn declare_category(
        &mut self,
        decl: CategoryDeclaration,
    ) -> Result<CategoryId, RegistryError> {
        let policy = match &decl.chain {
            Some(name) => {
                let op = self
                    .find_operator(name)
                    .ok_or_else(|| RegistryError::UnknownOperator { name: name.clone() })?;
                if op.shape != Shape::Infix {
                    return Err(RegistryError::InvalidForm {
                        name: name.clone(),
                        reason: "a chain combinator must be an infix operator".to_string(),
                    });
                }
                Some(ChainPolicy { combinator: op.id })
            }
            None => None,
        };

        let table = self.table_mut();
        let id = table.categories.declare(
            &decl.name,
            decl.label,
            &decl.tighter_than,
            &decl.weaker_than,
        )?;
        if let Some(policy) = policy {
            table.categories.set_chain(id, policy);
        }
        table.generation += 1;
        Ok(id)
    }

    /// Add a tightness edge between existing categories
    pub fn relate(
        &mut self,
        tighter: &str,
        weaker: &str,
    ) -> Result<(), RegistryError> {
        let table = self.table_mut();
        table.categories.relate(tighter, weaker)?;
        table.generation += 1;
        Ok(())
    }

    /// Register an operator in `category`
    pub fn declare_operator(
        &mut self,
        def: OperatorDefinition,
        category: &str,
    ) -> Result<OperatorId, RegistryError> {
        let (shape, skeleton) = def.validate()?;
        let category_id =
            self.categories
                .find(category)
                .ok_or_else(|| RegistryError::UnknownCategory {
                    category: category.to_string(),
                })?;

        let chains = self.categories.get(category_id).is_some_and(|c| c.chain.is_some());
        let strict = [def.left, def.right].contains(&Some(Tightness::Strict));
        if chains && shape == Shape::Infix && strict {
            return Err(RegistryError::InvalidForm {
                name: def.name,
                reason: format!(
                    "relations of the chaining category '{}' cannot be strict on either side",
                    category
                ),
            });
        }

        if self.by_name.contains_key(&def.name) {
            return Err(RegistryError::DuplicateOperator {
                name: def.name.clone(),
                existing: def.name,
                reason: "an operator with this name already exists".to_string(),
            });
        }
        if let Some(existing) = self.by_skeleton.get(&skeleton) {
            return Err(RegistryError::DuplicateOperator {
                name: def.name,
                existing: self.operator_name(*existing).to_string(),
                reason: format!("both have the skeleton '{}'", skeleton),
            });
        }

        let table = self.table_mut();
        let id = OperatorId(table.operators.len() as u32);
        let operator = Operator::new(id, def, shape, skeleton.clone(), category_id);
        tracing::debug!(
            operator = %operator.name,
            form = %operator.notation(),
            shape = ?operator.shape,
            "declared operator"
        );
        if let Some(first) = operator.first_keyword() {
            table
                .dispatch
                .entry(first.to_string())
                .or_default()
                .push(id);
        }
        table.by_name.insert(operator.name.clone(), id);
        table.by_skeleton.insert(skeleton, id);
        table.operators.push(operator);
        table.generation += 1;
        Ok(id)
    }

    /// Open a nested scope
    pub fn declare_scope(
        &mut self,
        parent: ScopeId,
    ) -> Result<ScopeId, RegistryError> {
        if !self.has_scope(parent) {
            return Err(RegistryError::UnknownScope {
                scope: parent.to_string(),
            });
        }
        let table = self.table_mut();
        let id = ScopeId(table.scopes.len() as u32);
        table.scopes.push(Scope {
            parent: Some(parent),
            imports: IndexSet::new(),
        });
        table.generation += 1;
        Ok(id)
    }

    /// Make a symbolic operator usable in `scope` and its descendants
    pub fn import_operator(
        &mut self,
        scope: ScopeId,
        name: &str,
    ) -> Result<OperatorId, RegistryError> {
        if !self.has_scope(scope) {
            return Err(RegistryError::UnknownScope {
                scope: scope.to_string(),
            });
        }
        let id = self
            .find_operator(name)
            .map(|op| op.id)
            .ok_or_else(|| RegistryError::UnknownOperator {
                name: name.to_string(),
            })?;

        let table = self.table_mut();
        if table.scopes[scope.0 as usize].imports.insert(id) {
            table.generation += 1;
        }
        Ok(id)
    }

    /// Freeze the current declarations. Repeated calls without an
    /// intervening mutation return the same snapshot, compiled grammar
    /// included.
    pub fn snapshot(&self) -> Snapshot {
        self.snapshot
            .get_or_init(|| Snapshot::new(Arc::clone(&self.table)))
            .clone()
    }
}

/// Immutable view of a registry, safe to share across threads
#[derive(Debug, Clone)]
pub struct Snapshot {
    table: Arc<OperatorTable>,
    grammar: Arc<OnceCell<Arc<Grammar>>>,
}

impl Deref for Snapshot {
    type Target = OperatorTable;

    fn deref(&self) -> &Self::Target {
        &self.table
    }
}

impl Snapshot {
    fn new(table: Arc<OperatorTable>) -> Self {
        Self {
            table,
            grammar: Arc::new(OnceCell::new()),
        }
    }

    /// Compiled grammar, built on first use
    pub fn grammar(&self) -> Arc<Grammar> {
        Arc::clone(
            self.grammar
                .get_or_init(|| Arc::new(Grammar::compile(Arc::clone(&self.table)))),
        )
    }

    pub fn table(&self) -> &Arc<OperatorTable> {
        &self.table
    }
}
