//! End-to-end tests through the public API

use mixfix::frontend::registry::{ParamSlot, ParamSpec, Tightness};
use mixfix::frontend::session::{run_unit, ExpressionSource};
use mixfix::frontend::tokens::from_words;
use mixfix::util::diagnostic::ToDiagnostic;
use mixfix::{
    parse, CategoryDeclaration, Directive, OperatorDefinition, ParseError, ParseOptions, Registry,
    RegistryError, ScopeId, UnitSource,
};

fn sexp(
    registry: &Registry,
    source: &str,
) -> Result<String, Vec<ParseError>> {
    let snapshot = registry.snapshot();
    parse(
        &from_words(source),
        &snapshot.grammar(),
        ScopeId::ROOT,
        &ParseOptions::default(),
    )
    .map(|node| node.sexp(&snapshot).to_string())
}

fn declare(
    registry: &mut Registry,
    name: &str,
    notation: &str,
    category: &str,
) {
    registry
        .declare_operator(
            OperatorDefinition::from_notation(name, notation).unwrap(),
            category,
        )
        .unwrap();
    registry.import_operator(ScopeId::ROOT, name).unwrap();
}

#[test]
fn test_snapshots_are_isolated_from_later_declarations() {
    let mut registry = Registry::new();
    registry
        .declare_category(CategoryDeclaration::new("Add"))
        .unwrap();
    declare(&mut registry, "plus", "$a + $b", "Add");

    let before = registry.snapshot();
    let generation = before.generation();
    declare(&mut registry, "minus", "$a - $b", "Add");
    let after = registry.snapshot();

    assert!(after.generation() > generation);
    assert_eq!(before.operators().len(), 1);
    assert_eq!(after.operators().len(), 2);

    let tokens = from_words("a - b");
    let options = ParseOptions::default();
    assert!(parse(&tokens, &before.grammar(), ScopeId::ROOT, &options).is_err());
    assert!(parse(&tokens, &after.grammar(), ScopeId::ROOT, &options).is_ok());
}

#[test]
fn test_snapshot_shared_across_threads() {
    let mut registry = Registry::new();
    registry
        .declare_category(CategoryDeclaration::new("Add"))
        .unwrap();
    registry
        .declare_category(CategoryDeclaration::new("Mul").tighter_than(["Add"]))
        .unwrap();
    declare(&mut registry, "plus", "$a + $b", "Add");
    declare(&mut registry, "times", "$a * $b", "Mul");

    let snapshot = registry.snapshot();
    let grammar = snapshot.grammar();
    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let grammar = &grammar;
                let snapshot = &snapshot;
                scope.spawn(move || {
                    let source = format!("x{} + y * z", i);
                    let node = parse(
                        &from_words(&source),
                        grammar,
                        ScopeId::ROOT,
                        &ParseOptions::default(),
                    )
                    .unwrap();
                    node.sexp(snapshot).to_string()
                })
            })
            .collect();
        for (i, handle) in handles.into_iter().enumerate() {
            assert_eq!(
                handle.join().unwrap(),
                format!("(plus x{} (times y z))", i)
            );
        }
    });
}

#[test]
fn test_declaration_cycle_leaves_registry_usable() {
    let mut registry = Registry::new();
    registry
        .declare_category(CategoryDeclaration::new("Add"))
        .unwrap();
    registry
        .declare_category(CategoryDeclaration::new("Mul").tighter_than(["Add"]))
        .unwrap();
    declare(&mut registry, "plus", "$a + $b", "Add");
    declare(&mut registry, "times", "$a * $b", "Mul");
    let generation = registry.generation();

    let error = registry.relate("Add", "Mul").unwrap_err();
    match &error {
        RegistryError::CategoryCycle { cycle, .. } => {
            assert_eq!(cycle.first(), cycle.last());
            assert!(cycle.contains(&"Add".to_string()));
            assert!(cycle.contains(&"Mul".to_string()));
        }
        other => panic!("unexpected: {:?}", other),
    }
    assert_eq!(error.to_diagnostic().code, "E0101");
    assert_eq!(registry.generation(), generation);
    assert_eq!(sexp(&registry, "a * b + c").unwrap(), "(plus (times a b) c)");
}

#[test]
fn test_relation_chain_scenario() {
    let mut registry = Registry::new();
    registry
        .declare_category(CategoryDeclaration::new("Conj"))
        .unwrap();
    declare(&mut registry, "and", "$a and $b", "Conj");
    registry
        .declare_category(
            CategoryDeclaration::new("EqRel")
                .tighter_than(["Conj"])
                .chain("and"),
        )
        .unwrap();
    declare(&mut registry, "lt", "$a < $b", "EqRel");
    declare(&mut registry, "le", "$a <= $b", "EqRel");

    assert_eq!(sexp(&registry, "a < b < c").unwrap(), "(chain and a lt b lt c)");
    assert_eq!(
        sexp(&registry, "a < b and b <= c").unwrap(),
        "(and (lt a b) (le b c))"
    );

    let snapshot = registry.snapshot();
    let node = parse(
        &from_words("a < b <= c"),
        &snapshot.grammar(),
        ScopeId::ROOT,
        &ParseOptions::default(),
    )
    .unwrap();
    assert_eq!(
        node.desugar_chains(&snapshot).sexp(&snapshot).to_string(),
        "(and (lt a b) (le b c))"
    );
}

#[test]
fn test_spring_parameters_scenario() {
    let mut registry = Registry::new();
    registry
        .declare_category(CategoryDeclaration::new("Spring"))
        .unwrap();
    registry
        .declare_operator(
            OperatorDefinition::from_notation("~~", "$a ~~ [] ~~ $b")
                .unwrap()
                .right(Tightness::Strict)
                .params(ParamSpec::new().with(ParamSlot::optional("tension", &["1", "1"]))),
            "Spring",
        )
        .unwrap();
    registry.import_operator(ScopeId::ROOT, "~~").unwrap();

    assert_eq!(
        sexp(&registry, "a ~~ [ tension : 1.5 , 1 ] ~~ b").unwrap(),
        "(~~ a b {tension: 1.5 1})"
    );
    assert_eq!(sexp(&registry, "a ~~ ~~ b").unwrap(), "(~~ a b {tension: 1 1})");
}

#[test]
fn test_unit_built_in_code() {
    let unit = UnitSource {
        directives: vec![
            Directive::Category(CategoryDeclaration::new("Sign")),
            Directive::Category(CategoryDeclaration::new("Fact").tighter_than(["Sign"])),
            Directive::Operator {
                name: "pos".to_string(),
                form: "+ $x".to_string(),
                category: "Sign".to_string(),
                left: None,
                right: None,
                params: Vec::new(),
            },
            Directive::Operator {
                name: "fact".to_string(),
                form: "$x !".to_string(),
                category: "Fact".to_string(),
                left: None,
                right: None,
                params: Vec::new(),
            },
            Directive::Import {
                scope: None,
                operator: "pos".to_string(),
            },
            Directive::Import {
                scope: None,
                operator: "fact".to_string(),
            },
        ],
        expressions: vec![
            ExpressionSource::new("+ n !"),
            ExpressionSource::new("n ! !"),
            ExpressionSource::new("n m"),
        ],
    };

    let (frozen, reports) = run_unit(&unit, &ParseOptions::default(), true).unwrap();
    let printed: Vec<String> = reports
        .iter()
        .map(|report| match &report.result {
            Ok(node) => node.sexp(&frozen.snapshot).to_string(),
            Err(errors) => errors[0].code().to_string(),
        })
        .collect();
    assert_eq!(printed, vec!["(pos (fact n))", "(fact (fact n))", "E0302"]);
}
