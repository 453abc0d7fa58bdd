//! Parser tests module

mod errors;
mod inner_params;

use crate::frontend::parser::{parse, ParseError, ParseOptions, ParseResult};
use crate::frontend::registry::{
    CategoryDeclaration, OperatorDefinition, Registry, ScopeId, Snapshot,
};
use crate::frontend::tokens::from_words;
use crate::frontend::tree::ParseNode;

/// Registry under construction plus parse helpers
pub(super) struct Fixture {
    pub registry: Registry,
    pub options: ParseOptions,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
            options: ParseOptions::default(),
        }
    }

    pub fn category(
        mut self,
        name: &str,
        tighter_than: &[&str],
    ) -> Self {
        self.registry
            .declare_category(CategoryDeclaration::new(name).tighter_than(tighter_than.iter().copied()))
            .unwrap();
        self
    }

    pub fn declare(
        mut self,
        decl: CategoryDeclaration,
    ) -> Self {
        self.registry.declare_category(decl).unwrap();
        self
    }

    /// Declare an operator and import it into the root scope
    pub fn operator(
        self,
        name: &str,
        notation: &str,
        category: &str,
    ) -> Self {
        self.define(OperatorDefinition::from_notation(name, notation).unwrap(), category)
    }

    pub fn define(
        mut self,
        def: OperatorDefinition,
        category: &str,
    ) -> Self {
        let name = def.name.clone();
        self.registry.declare_operator(def, category).unwrap();
        self.registry.import_operator(ScopeId::ROOT, &name).unwrap();
        self
    }

    pub fn juxtaposition(mut self) -> Self {
        self.options.juxtaposition = true;
        self
    }

    pub fn snapshot(&self) -> Snapshot {
        self.registry.snapshot()
    }

    pub fn parse_in(
        &self,
        source: &str,
        scope: ScopeId,
    ) -> ParseResult {
        let snapshot = self.snapshot();
        parse(&from_words(source), &snapshot.grammar(), scope, &self.options)
    }

    pub fn parse(
        &self,
        source: &str,
    ) -> ParseResult {
        self.parse_in(source, ScopeId::ROOT)
    }

    pub fn node(
        &self,
        source: &str,
    ) -> ParseNode {
        match self.parse(source) {
            Ok(node) => node,
            Err(errors) => panic!("'{}' failed to parse: {:?}", source, errors),
        }
    }

    pub fn sexp(
        &self,
        source: &str,
    ) -> String {
        let snapshot = self.snapshot();
        self.node(source).sexp(&snapshot).to_string()
    }

    /// The single error reported for `source`
    pub fn error(
        &self,
        source: &str,
    ) -> ParseError {
        match self.parse(source) {
            Ok(node) => panic!(
                "'{}' unexpectedly parsed as {}",
                source,
                node.sexp(&self.snapshot())
            ),
            Err(mut errors) => {
                assert_eq!(errors.len(), 1, "{:?}", errors);
                errors.remove(0)
            }
        }
    }
}

/// Names of the operators an ambiguity error reports
pub(super) fn competitor_names(error: &ParseError) -> Vec<String> {
    match error {
        ParseError::AmbiguousExpression { competitors, .. } => {
            competitors.iter().map(|c| c.name.clone()).collect()
        }
        other => panic!("expected an ambiguity, got {:?}", other),
    }
}

/// `Add < Mul`, with plus and times both folding left
pub(super) fn arithmetic() -> Fixture {
    use crate::frontend::registry::Tightness;

    Fixture::new()
        .category("Add", &[])
        .category("Mul", &["Add"])
        .define(
            OperatorDefinition::from_notation("plus", "$a + $b")
                .unwrap()
                .right(Tightness::Strict),
            "Add",
        )
        .define(
            OperatorDefinition::from_notation("times", "$a * $b")
                .unwrap()
                .right(Tightness::Strict),
            "Mul",
        )
}
