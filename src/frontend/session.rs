//! Declaration sessions
//!
//! A unit is an ordered list of directives followed by the expressions to
//! parse against them. Directives are applied one by one; the first failure
//! aborts the unit and no snapshot is produced. Once all directives are in,
//! the registry is frozen and every expression is parsed against the same
//! snapshot, sequentially or on the rayon pool.
//!
//! Units are plain serde data, so hosts can build them in code and the CLI
//! reads them from RON:
//!
//! ```text
//! (
//!     directives: [
//!         Category((name: "Add")),
//!         Operator(name: "plus", form: "$a + $b", category: "Add", right: Some(strict)),
//!         Import(operator: "plus"),
//!     ],
//!     expressions: [(text: "a + b + c")],
//! )
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;

use crate::frontend::parser::{self, Expression, ParseOptions, ParseResult};
use crate::frontend::registry::{
    CategoryDeclaration, OperatorDefinition, ParamSlot, ParamSpec, Registry, RegistryError,
    ScopeId, Snapshot, Tightness,
};
use crate::frontend::tokens::from_words;
use crate::util::diagnostic::{Diagnostic, ToDiagnostic};

/// Name of the implicit outermost scope
pub const ROOT_SCOPE: &str = "root";

/// One declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Directive {
    Category(CategoryDeclaration),
    /// `tighter` binds tighter than `weaker`
    Relate { tighter: String, weaker: String },
    Operator {
        name: String,
        /// Display form, e.g. `$a ~~ [] ~~ $b`
        form: String,
        category: String,
        #[serde(default)]
        left: Option<Tightness>,
        #[serde(default)]
        right: Option<Tightness>,
        #[serde(default)]
        params: Vec<ParamSlot>,
    },
    Scope {
        name: String,
        /// Defaults to the root scope
        #[serde(default)]
        parent: Option<String>,
    },
    Import {
        /// Defaults to the root scope
        #[serde(default)]
        scope: Option<String>,
        operator: String,
    },
}

/// An expression as written in a unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpressionSource {
    /// Whitespace-separated tokens
    pub text: String,
    #[serde(default)]
    pub scope: Option<String>,
}

impl ExpressionSource {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            scope: None,
        }
    }

    pub fn in_scope(
        mut self,
        scope: impl Into<String>,
    ) -> Self {
        self.scope = Some(scope.into());
        self
    }
}

/// Directives plus expressions
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitSource {
    #[serde(default)]
    pub directives: Vec<Directive>,
    #[serde(default)]
    pub expressions: Vec<ExpressionSource>,
}

impl UnitSource {
    pub fn from_ron(text: &str) -> Result<Self, SessionError> {
        ron::from_str(text).map_err(|source| SessionError::Syntax {
            path: None,
            message: source.to_string(),
        })
    }

    pub fn load(path: &Path) -> Result<Self, SessionError> {
        let text = std::fs::read_to_string(path).map_err(|source| SessionError::Io {
            path: path.to_path_buf(),
            message: source.to_string(),
        })?;
        ron::from_str(&text).map_err(|source| SessionError::Syntax {
            path: Some(path.to_path_buf()),
            message: source.to_string(),
        })
    }
}

/// Unit-level failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("cannot read {}: {message}", path.display())]
    Io { path: PathBuf, message: String },

    #[error("malformed unit{}: {message}", path.as_ref().map(|p| format!(" {}", p.display())).unwrap_or_default())]
    Syntax {
        path: Option<PathBuf>,
        message: String,
    },

    #[error("directive {index}: {error}")]
    Declaration {
        /// Position of the failing directive
        index: usize,
        #[source]
        error: RegistryError,
    },

    #[error("directive {index}: scope '{name}' is already declared")]
    DuplicateScope { index: usize, name: String },

    #[error("expression {index}: unknown scope '{scope}'")]
    ExpressionScope { index: usize, scope: String },
}

impl SessionError {
    /// Declaration failures carry a registered diagnostic
    pub fn diagnostic(&self) -> Option<Diagnostic> {
        match self {
            SessionError::Declaration { error, .. } => Some(error.to_diagnostic()),
            _ => None,
        }
    }
}

/// Registry under construction plus the unit's scope names
#[derive(Debug)]
pub struct Session {
    registry: Registry,
    scopes: IndexMap<String, ScopeId>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        let mut scopes = IndexMap::new();
        scopes.insert(ROOT_SCOPE.to_string(), ScopeId::ROOT);
        Self {
            registry: Registry::new(),
            scopes,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Handle of a named scope
    pub fn scope(
        &self,
        name: &str,
    ) -> Result<ScopeId, RegistryError> {
        self.scopes
            .get(name)
            .copied()
            .ok_or_else(|| RegistryError::UnknownScope {
                scope: name.to_string(),
            })
    }

    fn scope_or_root(
        &self,
        name: Option<&str>,
    ) -> Result<ScopeId, RegistryError> {
        name.map_or(Ok(ScopeId::ROOT), |name| self.scope(name))
    }

    /// Apply one directive; `index` is only used for error reporting
    pub fn apply(
        &mut self,
        index: usize,
        directive: &Directive,
    ) -> Result<(), SessionError> {
        let declaration = |error| SessionError::Declaration { index, error };
        match directive {
            Directive::Category(decl) => {
                self.registry
                    .declare_category(decl.clone())
                    .map_err(declaration)?;
            }
            Directive::Relate { tighter, weaker } => {
                self.registry.relate(tighter, weaker).map_err(declaration)?;
            }
            Directive::Operator {
                name,
                form,
                category,
                left,
                right,
                params,
            } => {
                let mut def = OperatorDefinition::from_notation(name.clone(), form)
                    .map_err(declaration)?;
                def.left = *left;
                def.right = *right;
                if !params.is_empty() {
                    def = def.params(ParamSpec {
                        slots: params.clone(),
                    });
                }
                self.registry
                    .declare_operator(def, category)
                    .map_err(declaration)?;
            }
            Directive::Scope { name, parent } => {
                if self.scopes.contains_key(name) {
                    return Err(SessionError::DuplicateScope {
                        index,
                        name: name.clone(),
                    });
                }
                let parent = self
                    .scope_or_root(parent.as_deref())
                    .map_err(declaration)?;
                let id = self.registry.declare_scope(parent).map_err(declaration)?;
                self.scopes.insert(name.clone(), id);
            }
            Directive::Import { scope, operator } => {
                let scope = self
                    .scope_or_root(scope.as_deref())
                    .map_err(declaration)?;
                self.registry
                    .import_operator(scope, operator)
                    .map_err(declaration)?;
            }
        }
        Ok(())
    }

    /// Apply directives in order, stopping at the first failure
    pub fn apply_all(
        &mut self,
        directives: &[Directive],
    ) -> Result<(), SessionError> {
        for (index, directive) in directives.iter().enumerate() {
            if let Err(error) = self.apply(index, directive) {
                tracing::debug!(index, %error, "unit aborted");
                return Err(error);
            }
        }
        Ok(())
    }

    /// Freeze the declarations
    pub fn finish(self) -> FrozenUnit {
        FrozenUnit {
            snapshot: self.registry.snapshot(),
            scopes: self.scopes,
        }
    }
}

/// A finished unit: frozen snapshot plus scope names
#[derive(Debug, Clone)]
pub struct FrozenUnit {
    pub snapshot: Snapshot,
    scopes: IndexMap<String, ScopeId>,
}

/// Outcome of one expression
#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionReport {
    pub text: String,
    pub scope: ScopeId,
    pub result: ParseResult,
}

impl FrozenUnit {
    pub fn scope(
        &self,
        name: &str,
    ) -> Option<ScopeId> {
        self.scopes.get(name).copied()
    }

    /// Parse every expression; results keep input order
    pub fn parse(
        &self,
        expressions: &[ExpressionSource],
        options: &ParseOptions,
        parallel: bool,
    ) -> Result<Vec<ExpressionReport>, SessionError> {
        let prepared = expressions
            .iter()
            .enumerate()
            .map(|(index, source)| {
                let scope = match source.scope.as_deref() {
                    None => ScopeId::ROOT,
                    Some(name) => self.scope(name).ok_or_else(|| SessionError::ExpressionScope {
                        index,
                        scope: name.to_string(),
                    })?,
                };
                Ok(Expression::new(from_words(&source.text), scope))
            })
            .collect::<Result<Vec<_>, SessionError>>()?;

        let started = Instant::now();
        let grammar = self.snapshot.grammar();
        let results = if parallel {
            parser::parse_all_parallel(&prepared, &grammar, options)
        } else {
            parser::parse_all(&prepared, &grammar, options)
        };

        let failed = results.iter().filter(|r| r.is_err()).count();
        tracing::info!(
            expressions = results.len(),
            failed,
            parallel,
            elapsed_us = started.elapsed().as_micros() as u64,
            "parsed unit"
        );

        Ok(expressions
            .iter()
            .zip(prepared)
            .zip(results)
            .map(|((source, expression), result)| ExpressionReport {
                text: source.text.clone(),
                scope: expression.scope,
                result,
            })
            .collect())
    }
}

/// Declare everything in `unit`, then parse its expressions
pub fn run_unit(
    unit: &UnitSource,
    options: &ParseOptions,
    parallel: bool,
) -> Result<(FrozenUnit, Vec<ExpressionReport>), SessionError> {
    let mut session = Session::new();
    session.apply_all(&unit.directives)?;
    let frozen = session.finish();
    tracing::debug!(
        directives = unit.directives.len(),
        operators = frozen.snapshot.operators().len(),
        categories = frozen.snapshot.categories().len(),
        "unit declared"
    );
    let reports = frozen.parse(&unit.expressions, options, parallel)?;
    Ok((frozen, reports))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::parser::ParseError;

    const UNIT: &str = r#"(
        directives: [
            Category((name: "Add")),
            Category((name: "Mul", tighter_than: ["Add"])),
            Operator(name: "plus", form: "$a + $b", category: "Add", right: Some(strict)),
            Operator(name: "times", form: "$a * $b", category: "Mul", right: Some(strict)),
            Operator(
                name: "spring",
                form: "$a ~~ [] ~~ $b",
                category: "Add",
                params: [(name: "tension", arity: 2, default: Some(["1", "1"]))],
            ),
            Import(operator: "plus"),
            Scope(name: "inner"),
            Import(scope: Some("inner"), operator: "times"),
            Import(scope: Some("inner"), operator: "spring"),
        ],
        expressions: [
            (text: "a + b * c", scope: Some("inner")),
            (text: "a + b * c"),
            (text: "a ~~ [ tension : 2 , 3 ] ~~ b", scope: Some("inner")),
        ],
    )"#;

    #[test]
    fn test_unit_from_ron() {
        let unit = UnitSource::from_ron(UNIT).unwrap();
        assert_eq!(unit.directives.len(), 9);
        assert_eq!(unit.expressions.len(), 3);

        let (frozen, reports) = run_unit(&unit, &ParseOptions::default(), false).unwrap();
        assert_eq!(
            reports[0].result.as_ref().unwrap().sexp(&frozen.snapshot).to_string(),
            "(plus a (times b c))"
        );
        assert!(matches!(
            reports[1].result.as_ref().unwrap_err()[0],
            ParseError::UndeclaredOperatorSymbol { .. }
        ));
        assert_eq!(
            reports[2].result.as_ref().unwrap().sexp(&frozen.snapshot).to_string(),
            "(spring a b {tension: 2 3})"
        );
        assert_eq!(frozen.scope("inner"), Some(reports[0].scope));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let unit = UnitSource::from_ron(UNIT).unwrap();
        let (_, sequential) = run_unit(&unit, &ParseOptions::default(), false).unwrap();
        let (_, parallel) = run_unit(&unit, &ParseOptions::default(), true).unwrap();
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_first_failure_aborts() {
        let unit = UnitSource {
            directives: vec![
                Directive::Category(CategoryDeclaration::new("A")),
                Directive::Category(CategoryDeclaration::new("B").tighter_than(["A"])),
                Directive::Relate {
                    tighter: "A".to_string(),
                    weaker: "B".to_string(),
                },
                Directive::Category(CategoryDeclaration::new("C")),
            ],
            expressions: vec![ExpressionSource::new("x")],
        };
        let err = run_unit(&unit, &ParseOptions::default(), false).unwrap_err();
        match &err {
            SessionError::Declaration { index, error } => {
                assert_eq!(*index, 2);
                assert!(matches!(error, RegistryError::CategoryCycle { .. }));
            }
            other => panic!("unexpected: {:?}", other),
        }
        assert_eq!(err.diagnostic().unwrap().code, "E0101");
    }

    #[test]
    fn test_scope_errors() {
        let mut session = Session::new();
        session
            .apply(
                0,
                &Directive::Scope {
                    name: "a".to_string(),
                    parent: None,
                },
            )
            .unwrap();
        let err = session
            .apply(
                1,
                &Directive::Scope {
                    name: "a".to_string(),
                    parent: None,
                },
            )
            .unwrap_err();
        assert!(matches!(err, SessionError::DuplicateScope { index: 1, .. }));

        let err = session
            .apply(
                2,
                &Directive::Import {
                    scope: Some("nope".to_string()),
                    operator: "x".to_string(),
                },
            )
            .unwrap_err();
        assert_eq!(err.diagnostic().unwrap().code, "E0204");

        let frozen = session.finish();
        let err = frozen
            .parse(
                &[ExpressionSource::new("x").in_scope("missing")],
                &ParseOptions::default(),
                false,
            )
            .unwrap_err();
        assert_eq!(err.to_string(), "expression 0: unknown scope 'missing'");
    }

    #[test]
    fn test_malformed_unit() {
        let err = UnitSource::from_ron("(directives: [Category(").unwrap_err();
        assert!(matches!(err, SessionError::Syntax { path: None, .. }));
    }
}
