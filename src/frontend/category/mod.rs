//! Tightness categories
//!
//! Operators are grouped into categories, and categories are ordered by a
//! user-declared "binds tighter than" relation. The relation is kept as a
//! strict partial order: every declaration that would close a cycle is
//! rejected and leaves the graph untouched. Unrelated categories are
//! incomparable, which the parser reports as ambiguity rather than guessing.

mod closure;

#[cfg(test)]
mod tests;

pub use closure::{BitSet, Closure};

use indexmap::IndexMap;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::VecDeque;
use std::fmt;

use crate::frontend::registry::{OperatorId, RegistryError};

/// Category handle, dense index into the graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CategoryId(pub(crate) u32);

impl CategoryId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for CategoryId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Same-category infix runs fold into one chain node joined by `combinator`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainPolicy {
    pub combinator: OperatorId,
}

/// A declared category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorCategory {
    pub id: CategoryId,
    pub name: String,
    pub label: Option<String>,
    /// Categories this one was declared tighter than
    pub tighter_than: Vec<CategoryId>,
    /// Categories this one was declared weaker than
    pub weaker_than: Vec<CategoryId>,
    pub chain: Option<ChainPolicy>,
}

impl OperatorCategory {
    /// Label for messages, falling back to the name
    pub fn display_name(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }
}

type Edges = SmallVec<[CategoryId; 4]>;

/// Category graph with a lazily computed transitive closure
#[derive(Debug, Clone, Default)]
pub struct CategoryGraph {
    categories: Vec<OperatorCategory>,
    by_name: IndexMap<String, CategoryId>,
    /// `above[b]`: categories directly tighter than `b`
    above: Vec<Edges>,
    closure: OnceCell<Closure>,
}

impl PartialEq for CategoryGraph {
    fn eq(
        &self,
        other: &Self,
    ) -> bool {
        self.categories == other.categories && self.above == other.above
    }
}

impl Eq for CategoryGraph {}

impl CategoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn get(
        &self,
        id: CategoryId,
    ) -> Option<&OperatorCategory> {
        self.categories.get(id.index())
    }

    pub fn find(
        &self,
        name: &str,
    ) -> Option<CategoryId> {
        self.by_name.get(name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &OperatorCategory> {
        self.categories.iter()
    }

    /// Display name of a category, `#n` for unknown handles
    pub fn name(
        &self,
        id: CategoryId,
    ) -> String {
        self.get(id)
            .map(|c| c.name.clone())
            .unwrap_or_else(|| id.to_string())
    }

    fn resolve(
        &self,
        name: &str,
    ) -> Result<CategoryId, RegistryError> {
        self.find(name)
            .ok_or_else(|| RegistryError::UnknownCategory {
                category: name.to_string(),
            })
    }

    /// Declare a new category placed tighter than every category in
    /// `tighter_than` and weaker than every category in `weaker_than`.
    ///
    /// Atomic: on error nothing is added.
    pub fn declare(
        &mut self,
        name: &str,
        label: Option<String>,
        tighter_than: &[String],
        weaker_than: &[String],
    ) -> Result<CategoryId, RegistryError> {
        if self.by_name.contains_key(name) {
            return Err(RegistryError::DuplicateCategory {
                category: name.to_string(),
            });
        }
        if tighter_than.iter().chain(weaker_than).any(|n| n == name) {
            return Err(RegistryError::CategoryCycle {
                category: name.to_string(),
                cycle: vec![name.to_string(), name.to_string()],
            });
        }

        let tighter_than = tighter_than
            .iter()
            .map(|n| self.resolve(n))
            .collect::<Result<Vec<_>, _>>()?;
        let weaker_than = weaker_than
            .iter()
            .map(|n| self.resolve(n))
            .collect::<Result<Vec<_>, _>>()?;

        // The new node sits between W (above) and T (below). A cycle exists
        // iff some t is already at least as tight as some w.
        for &t in &tighter_than {
            for &w in &weaker_than {
                if t == w || self.tighter_than(t, w) {
                    let mut cycle = self.path_names(t, w);
                    cycle.push(name.to_string());
                    cycle.push(self.name(t));
                    return Err(RegistryError::CategoryCycle {
                        category: name.to_string(),
                        cycle,
                    });
                }
            }
        }

        let id = CategoryId(self.categories.len() as u32);
        self.categories.push(OperatorCategory {
            id,
            name: name.to_string(),
            label,
            tighter_than: tighter_than.clone(),
            weaker_than: weaker_than.clone(),
            chain: None,
        });
        self.by_name.insert(name.to_string(), id);
        self.above.push(weaker_than.iter().copied().collect());
        for t in tighter_than {
            push_unique(&mut self.above[t.index()], id);
        }
        self.invalidate();

        tracing::debug!(category = name, id = id.0, "declared category");
        Ok(id)
    }

    /// Add a `tighter` binds-tighter-than `weaker` edge between existing
    /// categories
    pub fn relate(
        &mut self,
        tighter: &str,
        weaker: &str,
    ) -> Result<(), RegistryError> {
        let a = self.resolve(tighter)?;
        let b = self.resolve(weaker)?;
        if a == b || self.tighter_than(b, a) {
            let mut cycle = self.path_names(b, a);
            cycle.push(self.name(b));
            return Err(RegistryError::CategoryCycle {
                category: tighter.to_string(),
                cycle,
            });
        }

        if push_unique(&mut self.above[b.index()], a) {
            self.categories[a.index()].weaker_than.push(b);
            self.categories[b.index()].tighter_than.push(a);
            self.invalidate();
        }
        Ok(())
    }

    /// Attach a chain policy. The combinator is validated by the registry.
    pub(crate) fn set_chain(
        &mut self,
        id: CategoryId,
        policy: ChainPolicy,
    ) {
        if let Some(category) = self.categories.get_mut(id.index()) {
            category.chain = Some(policy);
        }
    }

    /// Transitive closure, computed on first use after a mutation
    pub fn closure(&self) -> &Closure {
        self.closure.get_or_init(|| {
            tracing::trace!(categories = self.categories.len(), "computing tightness closure");
            Closure::compute(&self.above)
        })
    }

    /// `a` binds strictly tighter than `b` (transitively)
    pub fn tighter_than(
        &self,
        a: CategoryId,
        b: CategoryId,
    ) -> bool {
        self.closure().tighter(a, b)
    }

    /// Equal, or ordered one way or the other
    pub fn comparable(
        &self,
        a: CategoryId,
        b: CategoryId,
    ) -> bool {
        a == b || self.tighter_than(a, b) || self.tighter_than(b, a)
    }

    pub fn incomparable(
        &self,
        a: CategoryId,
        b: CategoryId,
    ) -> bool {
        !self.comparable(a, b)
    }

    fn invalidate(&mut self) {
        self.closure = OnceCell::new();
    }

    /// Names along a tightness path from `top` down to `bottom`, assuming
    /// `top == bottom` or `top` is tighter than `bottom`
    fn path_names(
        &self,
        top: CategoryId,
        bottom: CategoryId,
    ) -> Vec<String> {
        // Breadth-first search upwards from `bottom`, then walk back.
        let mut parent: IndexMap<CategoryId, CategoryId> = IndexMap::new();
        let mut queue = VecDeque::from([bottom]);
        while let Some(node) = queue.pop_front() {
            if node == top {
                break;
            }
            for &next in &self.above[node.index()] {
                if next != bottom && !parent.contains_key(&next) {
                    parent.insert(next, node);
                    queue.push_back(next);
                }
            }
        }

        let mut path = vec![self.name(top)];
        let mut node = top;
        while node != bottom {
            match parent.get(&node) {
                Some(&below) => {
                    path.push(self.name(below));
                    node = below;
                }
                None => break,
            }
        }
        path
    }
}

fn push_unique(
    edges: &mut Edges,
    id: CategoryId,
) -> bool {
    if edges.contains(&id) {
        false
    } else {
        edges.push(id);
        true
    }
}
